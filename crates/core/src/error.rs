use thiserror::Error;

/// A business rule rejected a value. Transport failures belong to the
/// gateway's own error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input, such as a sale with no items.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Amounts that do not add up.
    #[error("amounts do not add up: {0}")]
    Inconsistent(String),

    #[error("malformed id: {0}")]
    MalformedId(String),
}

impl DomainError {
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    pub fn inconsistent(msg: impl Into<String>) -> Self {
        Self::Inconsistent(msg.into())
    }
}
