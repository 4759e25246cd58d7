use crate::core::value::Attachment;
use crate::error::ConfigError;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_MIME_PATTERNS: &[&str] = &["application/pdf", "image/*"];

/// A file offered by the user, before the policy has looked at it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Upload {
    pub name: String,
    pub mime: String,
    pub size: u64,
}

impl Upload {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            size,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("file '{name}' has unsupported type {mime}")]
    UnsupportedType { name: String, mime: String },

    #[error("file '{name}' is {size} bytes, limit is {max}")]
    TooLarge { name: String, size: u64, max: u64 },

    #[error("file '{name}' is empty")]
    Empty { name: String },
}

#[derive(Debug, Clone)]
pub struct AttachmentPolicy {
    patterns: Vec<String>,
    allowed: GlobSet,
    max_bytes: u64,
}

impl AttachmentPolicy {
    pub fn new<I, S>(patterns: I, max_bytes: u64) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = GlobBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| ConfigError::MimePattern {
                    pattern: pattern.clone(),
                    source,
                })?;
            builder.add(glob);
        }
        let allowed = builder.build().map_err(|source| ConfigError::MimePattern {
            pattern: patterns.join(","),
            source,
        })?;
        Ok(Self {
            patterns,
            allowed,
            max_bytes,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn accept(&self, upload: &Upload) -> Result<Attachment, AttachmentError> {
        let rejected = if upload.size == 0 {
            Some(AttachmentError::Empty {
                name: upload.name.clone(),
            })
        } else if !self.allowed.is_match(upload.mime.trim()) {
            Some(AttachmentError::UnsupportedType {
                name: upload.name.clone(),
                mime: upload.mime.clone(),
            })
        } else if upload.size > self.max_bytes {
            Some(AttachmentError::TooLarge {
                name: upload.name.clone(),
                size: upload.size,
                max: self.max_bytes,
            })
        } else {
            None
        };

        if let Some(err) = rejected {
            warn!(file = %upload.name, error = %err, "attachment rejected");
            return Err(err);
        }

        Ok(Attachment {
            name: upload.name.clone(),
            mime: upload.mime.trim().to_ascii_lowercase(),
            size: upload.size,
        })
    }
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        // Built-in patterns are literals; they always compile.
        let mut builder = GlobSetBuilder::new();
        for pattern in DEFAULT_MIME_PATTERNS {
            if let Ok(glob) = GlobBuilder::new(pattern).case_insensitive(true).build() {
                builder.add(glob);
            }
        }
        Self {
            patterns: DEFAULT_MIME_PATTERNS.iter().map(|p| p.to_string()).collect(),
            allowed: builder.build().unwrap_or_else(|_| GlobSet::empty()),
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AttachmentError, AttachmentPolicy, Upload};

    #[test]
    fn default_policy_takes_pdf_and_images() {
        let policy = AttachmentPolicy::default();
        let pdf = policy
            .accept(&Upload::new("contrato.pdf", "application/pdf", 2048))
            .expect("pdf accepted");
        assert_eq!(pdf.mime, "application/pdf");
        assert!(policy.accept(&Upload::new("logo.png", "IMAGE/PNG", 10)).is_ok());
    }

    #[test]
    fn rejects_type_size_and_empty() {
        let policy = AttachmentPolicy::new(["application/pdf"], 100).expect("policy");
        assert!(matches!(
            policy.accept(&Upload::new("a.exe", "application/x-msdownload", 10)),
            Err(AttachmentError::UnsupportedType { .. })
        ));
        assert_eq!(
            policy.accept(&Upload::new("big.pdf", "application/pdf", 101)),
            Err(AttachmentError::TooLarge {
                name: "big.pdf".to_string(),
                size: 101,
                max: 100,
            })
        );
        assert!(matches!(
            policy.accept(&Upload::new("empty.pdf", "application/pdf", 0)),
            Err(AttachmentError::Empty { .. })
        ));
    }

    #[test]
    fn bad_pattern_is_config_error() {
        assert!(AttachmentPolicy::new(["image/[png"], 10).is_err());
    }
}
