use thiserror::Error;

use crate::tokens::ThemeId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Token set '{set}' not found")]
    TokenSetNotFound { set: String },

    #[error("Token set '{set}' already exists")]
    TokenSetExists { set: String },

    #[error("Token '{name}' not found in set '{set}'")]
    TokenNotFound { set: String, name: String },

    #[error("Token '{name}' already exists in set '{set}'")]
    TokenExists { set: String, name: String },

    #[error("No tokens of type '{token_type}' under group '{group}' in set '{set}'")]
    GroupNotFound { set: String, group: String, token_type: String },

    #[error("Theme with ID '{theme_id}' not found")]
    ThemeNotFound { theme_id: ThemeId },

    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("The document is read-only and cannot be edited")]
    EditProhibited,
}
