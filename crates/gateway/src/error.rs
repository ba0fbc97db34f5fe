use thiserror::Error;

use kasir_core::DomainError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),

    #[error("API error ({0}): {1}")]
    Api(u16, String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl GatewayError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Classify a non-success HTTP response.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Unauthorized(body),
            404 | 406 => Self::NotFound(body),
            _ => Self::Api(status, body),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(matches!(
            GatewayError::from_status(401, "jwt expired".into()),
            GatewayError::Unauthorized(_)
        ));
        assert!(matches!(
            GatewayError::from_status(406, String::new()),
            GatewayError::NotFound(_)
        ));
        assert!(matches!(
            GatewayError::from_status(500, "boom".into()),
            GatewayError::Api(500, _)
        ));
    }
}
