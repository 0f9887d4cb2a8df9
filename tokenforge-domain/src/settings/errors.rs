use thiserror::Error;
use tokenforge_core::error::CoreError;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Persistence error during operation '{operation}': {message}")]
    PersistenceError {
        operation: String,
        message: String,
        #[source]
        source: Option<CoreError>,
    },

    #[error("Serialization error for key '{key}': {source}")]
    SerializationError {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Deserialization error for key '{key}': {source}")]
    DeserializationError {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Stored value for key '{key}' is not a JSON object")]
    NotAnObject { key: String },
}

impl SettingsError {
    pub fn persistence_error_from_core(operation: &str, message: String, core_error: CoreError) -> Self {
        SettingsError::PersistenceError {
            operation: operation.to_string(),
            message,
            source: Some(core_error),
        }
    }
}
