//! Error types for envelope construction and conversion

use thiserror::Error;

/// Error type for envelope operations
///
/// Callers are expected to branch on the variant, not on the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("missing required fields: {0}")]
    MissingRequiredFields(String),
    #[error("invalid required fields: {0}")]
    InvalidRequiredFields(String),
    #[error("invalid structured json: {0}")]
    InvalidStructuredJson(String),
    #[error("failed to marshal data: {0}")]
    DataMarshaller(String),
    #[error("failed to unmarshal data: {0}")]
    DataUnmarshaller(String),
    #[error("unsupported event: {0}")]
    UnsupportedEvent(String),
    #[error("incompatible arguments: {0}")]
    IncompatibleArguments(String),
    #[error("invalid attribute {0}: {1}")]
    InvalidAttribute(String, String), // name, reason
    #[error("attribute not found: {0}")]
    AttributeNotFound(String),
}

impl Error {
    /// Returns the error raised when a `specversion` token is not recognized.
    pub fn invalid_specversion(token: impl std::fmt::Display) -> Self {
        Self::InvalidRequiredFields(format!("found invalid specversion {token}"))
    }
}
