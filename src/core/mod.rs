pub mod cnpj;
pub mod guard;
pub mod step;
pub mod value;

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepKey(String);

impl StepKey {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Borrow<str> for StepKey {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for StepKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<String> for StepKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for StepKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<&String> for StepKey {
    fn from(value: &String) -> Self {
        Self(value.clone())
    }
}
