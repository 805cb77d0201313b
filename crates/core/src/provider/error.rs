use thiserror::Error;

use crate::fetch::FetchError;
use crate::policing::PolicingError;

/// Failure of one provider step.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    /// Credentials rejected (HTTP 401/403).
    #[error("Authentication rejected (HTTP {status})")]
    Authentication { status: u16 },

    #[error("Unexpected response: {0}")]
    Parsing(String),

    /// Non-success status that was not retried.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Policed(#[from] PolicingError),
}

impl ProviderError {
    /// Map a non-success response status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 | 403 => ProviderError::Authentication { status },
            _ => ProviderError::Http {
                status,
                message: message.into(),
            },
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Authentication { status } | ProviderError::Http { status, .. } => {
                Some(*status)
            }
            ProviderError::Fetch(FetchError::RetriesExhausted { last_status, .. }) => *last_status,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert_eq!(
            ProviderError::from_status(401, "nope"),
            ProviderError::Authentication { status: 401 }
        );
        assert_eq!(
            ProviderError::from_status(403, "nope"),
            ProviderError::Authentication { status: 403 }
        );
        let err = ProviderError::from_status(404, "missing");
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "HTTP 404: missing");
    }

    #[test]
    fn test_status_of_exhausted_fetch() {
        let err = ProviderError::Fetch(FetchError::RetriesExhausted {
            attempts: 3,
            last_status: Some(503),
            last_error: "HTTP 503".to_string(),
        });
        assert_eq!(err.status(), Some(503));
        assert_eq!(ProviderError::Parsing("bad".into()).status(), None);
    }
}
