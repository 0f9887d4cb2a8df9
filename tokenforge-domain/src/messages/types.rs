use serde::Serialize;
use serde_json::Value;

use crate::settings::{UiSettings, UpdateMode};
use crate::storage::StorageCredentials;
use crate::tokens::{ResolvedToken, TokenType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotifyLevel {
    #[default]
    Info,
    Error,
}

/// Side of the node an annotation is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationDirection {
    #[default]
    Left,
    Right,
    Top,
    Bottom,
}

/// Style kinds to import from the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PullStyleOptions {
    pub text_styles: bool,
    pub color_styles: bool,
    pub effect_styles: bool,
}

impl PullStyleOptions {
    pub fn any(&self) -> bool {
        self.text_styles || self.color_styles || self.effect_styles
    }
}

/// A token applied somewhere in the host document, identified by its value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedToken {
    pub name: String,
    pub value: Value,
}

/// Outbound message to the host. Serializes as `{type, payload}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum HostMessage {
    #[serde(rename_all = "camelCase")]
    CreateAnnotation {
        token: ResolvedToken,
        direction: AnnotationDirection,
    },
    #[serde(rename_all = "camelCase")]
    CreateStyles {
        tokens: Vec<ResolvedToken>,
        settings: UiSettings,
    },
    #[serde(rename_all = "camelCase")]
    RemapTokens {
        old_name: String,
        new_name: String,
        category: TokenType,
        update_mode: UpdateMode,
    },
    #[serde(rename_all = "camelCase")]
    PullStyles {
        style_types: PullStyleOptions,
    },
    RemoveTokensByValue {
        tokens: Vec<AppliedToken>,
    },
    Credentials(StorageCredentials),
    Notify {
        message: String,
        level: NotifyLevel,
    },
    UiSettings(UiSettings),
}

impl HostMessage {
    pub fn info(message: impl Into<String>) -> Self {
        HostMessage::Notify {
            message: message.into(),
            level: NotifyLevel::Info,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        HostMessage::Notify {
            message: message.into(),
            level: NotifyLevel::Error,
        }
    }

    /// Wire name of the message kind.
    pub fn kind(&self) -> &'static str {
        match self {
            HostMessage::CreateAnnotation { .. } => "createAnnotation",
            HostMessage::CreateStyles { .. } => "createStyles",
            HostMessage::RemapTokens { .. } => "remapTokens",
            HostMessage::PullStyles { .. } => "pullStyles",
            HostMessage::RemoveTokensByValue { .. } => "removeTokensByValue",
            HostMessage::Credentials(_) => "credentials",
            HostMessage::Notify { .. } => "notify",
            HostMessage::UiSettings(_) => "uiSettings",
        }
    }
}
