use serde::Serialize;

pub const DEFAULT_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CredentialCheck {
    pub valid: bool,
    pub attempts_remaining: u32,
}

/// Remote password check. The wizard only ever sees the resulting flag.
pub trait CredentialValidator {
    fn validate(&mut self, secret: &str) -> CredentialCheck;
}

impl<F> CredentialValidator for F
where
    F: FnMut(&str) -> CredentialCheck,
{
    fn validate(&mut self, secret: &str) -> CredentialCheck {
        self(secret)
    }
}

/// Compares against a fixed secret and blocks after a number of failures.
#[derive(Debug, Clone)]
pub struct StaticCredentialValidator {
    expected: String,
    attempts_remaining: u32,
}

impl StaticCredentialValidator {
    pub fn new(expected: impl Into<String>) -> Self {
        Self::with_attempts(expected, DEFAULT_ATTEMPTS)
    }

    pub fn with_attempts(expected: impl Into<String>, attempts: u32) -> Self {
        Self {
            expected: expected.into(),
            attempts_remaining: attempts,
        }
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }
}

impl CredentialValidator for StaticCredentialValidator {
    fn validate(&mut self, secret: &str) -> CredentialCheck {
        if self.attempts_remaining == 0 {
            return CredentialCheck {
                valid: false,
                attempts_remaining: 0,
            };
        }

        if secret == self.expected {
            return CredentialCheck {
                valid: true,
                attempts_remaining: self.attempts_remaining,
            };
        }

        self.attempts_remaining -= 1;
        CredentialCheck {
            valid: false,
            attempts_remaining: self.attempts_remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CredentialCheck, CredentialValidator, StaticCredentialValidator};

    #[test]
    fn counts_down_and_locks_out() {
        let mut validator = StaticCredentialValidator::with_attempts("s3cret", 2);
        assert_eq!(
            validator.validate("nope"),
            CredentialCheck {
                valid: false,
                attempts_remaining: 1
            }
        );
        assert!(validator.validate("s3cret").valid);
        assert!(!validator.validate("again").valid);
        assert_eq!(validator.attempts_remaining(), 0);

        let locked = validator.validate("s3cret");
        assert!(!locked.valid);
        assert_eq!(locked.attempts_remaining, 0);
    }

    #[test]
    fn closures_act_as_validators() {
        let mut calls = 0;
        let mut validator = |secret: &str| {
            calls += 1;
            CredentialCheck {
                valid: secret.len() > 3,
                attempts_remaining: 5,
            }
        };
        assert!(validator.validate("long enough").valid);
        assert!(!validator.validate("no").valid);
        assert_eq!(calls, 2);
    }
}
