use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Attachment {
    pub name: String,
    pub mime: String,
    pub size: u64,
}

/// A field value collected by a wizard. Serialized without tags so that
/// submissions read as plain JSON/YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(i64),
    Decimal(f64),
    Text(String),
    List(Vec<String>),
    Attachment(Attachment),
    Record(IndexMap<String, Value>),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(v) => v.trim().is_empty(),
            Self::List(v) => v.is_empty(),
            Self::Record(v) => v.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_attachment(&self) -> Option<&Attachment> {
        match self {
            Self::Attachment(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Record(v) => Some(v),
            _ => None,
        }
    }

    /// Text used by pattern and length guards. Numbers and booleans are
    /// rendered, structured values have no text form.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Text(v) => Some(v.clone()),
            Self::Number(v) => Some(v.to_string()),
            Self::Decimal(v) => Some(v.to_string()),
            Self::Bool(v) => Some(v.to_string()),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Attachment> for Value {
    fn from(value: Attachment) -> Self {
        Self::Attachment(value)
    }
}
