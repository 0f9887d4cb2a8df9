use thiserror::Error;

use super::provider::StorageProviderType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Remote resource '{resource}' does not exist")]
    NotFound { resource: String },

    #[error("Credentials were rejected by the remote (HTTP {status})")]
    Auth { status: u16 },

    #[error("Remote payload could not be read: {0}")]
    MalformedRemote(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Operation '{operation}' is not supported by the {provider} provider")]
    Unsupported {
        provider: StorageProviderType,
        operation: &'static str,
    },
}

impl StorageError {
    /// Maps a non-success HTTP status to the matching error.
    pub fn from_status(status: reqwest::StatusCode, resource: &str) -> Self {
        match status.as_u16() {
            404 => StorageError::NotFound {
                resource: resource.to_string(),
            },
            code @ (401 | 403) => StorageError::Auth { status: code },
            code => StorageError::Network(format!("unexpected HTTP status {} for {}", code, resource)),
        }
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StorageError::MalformedRemote(err.to_string())
        } else {
            StorageError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            StorageError::from_status(StatusCode::NOT_FOUND, "bin 42"),
            StorageError::NotFound {
                resource: "bin 42".into()
            }
        );
        assert_eq!(
            StorageError::from_status(StatusCode::FORBIDDEN, "bin 42"),
            StorageError::Auth { status: 403 }
        );
        assert!(matches!(
            StorageError::from_status(StatusCode::BAD_GATEWAY, "bin 42"),
            StorageError::Network(_)
        ));
    }

    #[test]
    fn test_unsupported_display() {
        let err = StorageError::Unsupported {
            provider: StorageProviderType::Url,
            operation: "save",
        };
        assert_eq!(err.to_string(), "Operation 'save' is not supported by the url provider");
    }
}
