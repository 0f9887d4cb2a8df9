//! The normalized document exchanged with storage providers.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::tokens::{Theme, TokenSet, TokenSets};

pub const THEMES_FILE: &str = "$themes.json";

/// `metadata` block of a persisted document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Missing or unreadable timestamps read as `None`.
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_timestamp))
}

/// Reads an RFC 3339 string or a millisecond epoch number.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

/// `{ tokens, themes, metadata }`, the shape every provider reads and writes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedDocument {
    #[serde(default)]
    pub tokens: TokenSets,
    #[serde(default)]
    pub themes: Vec<Theme>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

/// One resource of the file-level document layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DocumentFile {
    Themes { path: String, data: Vec<Theme> },
    TokenSet { name: String, path: String, data: TokenSet },
}

impl NormalizedDocument {
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.metadata.updated_at
    }

    /// Reads any accepted remote shape:
    ///
    /// - `{tokens, themes, metadata}`
    /// - `{values, $themes, updatedAt?, version?}` (older exports and static URLs)
    pub fn from_json(value: Value) -> Result<Self, String> {
        let mut root = match value {
            Value::Object(root) => root,
            other => return Err(format!("expected a JSON object, found {}", value_kind(&other))),
        };

        let tokens_value = root
            .remove("tokens")
            .or_else(|| root.remove("values"))
            .ok_or_else(|| "document has neither 'tokens' nor 'values'".to_string())?;
        let tokens = match tokens_value {
            Value::Object(sets) => {
                let mut tokens = TokenSets::new();
                for (name, set) in sets {
                    let set = TokenSet::from_json(set).map_err(|e| format!("token set '{}': {}", name, e))?;
                    tokens.insert(name, set);
                }
                tokens
            }
            other => return Err(format!("'tokens' must be an object, found {}", value_kind(&other))),
        };

        let themes = match root.remove("themes").or_else(|| root.remove("$themes")) {
            None | Some(Value::Null) => Vec::new(),
            Some(themes) => serde_json::from_value(themes).map_err(|e| format!("themes: {}", e))?,
        };

        let metadata = match root.remove("metadata") {
            Some(Value::Object(meta)) => {
                serde_json::from_value(Value::Object(meta)).map_err(|e| format!("metadata: {}", e))?
            }
            _ => DocumentMetadata {
                updated_at: root.get("updatedAt").and_then(parse_timestamp),
                version: root.get("version").and_then(Value::as_str).map(str::to_string),
            },
        };

        Ok(Self {
            tokens,
            themes,
            metadata,
        })
    }

    /// `$themes.json` followed by one `<set>.json` per token set.
    pub fn files(&self) -> Vec<DocumentFile> {
        let mut files = Vec::with_capacity(self.tokens.len() + 1);
        files.push(DocumentFile::Themes {
            path: THEMES_FILE.to_string(),
            data: self.themes.clone(),
        });
        files.extend(self.tokens.iter().map(|(name, set)| DocumentFile::TokenSet {
            name: name.clone(),
            path: format!("{}.json", name),
            data: set.clone(),
        }));
        files
    }

    /// The `[tokens, themes]` snapshot used to detect unsynced local edits.
    pub fn snapshot(tokens: &TokenSets, themes: &[Theme]) -> String {
        serde_json::to_string_pretty(&(tokens, themes)).unwrap_or_default()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
