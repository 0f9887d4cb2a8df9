//! Core data structures of the token model.
//!
//! Token sets are ordered (`IndexMap`) so that merge output, exports and the
//! persisted document keep the declaration order of the author.

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::value::TokenValue;

/// Category of a design token. Unknown categories read as [`TokenType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TokenType {
    Sizing,
    Spacing,
    Color,
    BorderRadius,
    BorderWidth,
    Opacity,
    FontFamilies,
    FontWeights,
    FontSizes,
    LineHeights,
    LetterSpacing,
    ParagraphSpacing,
    Typography,
    BoxShadow,
    Border,
    Dimension,
    #[default]
    #[serde(other)]
    Other,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Sizing => "sizing",
            TokenType::Spacing => "spacing",
            TokenType::Color => "color",
            TokenType::BorderRadius => "borderRadius",
            TokenType::BorderWidth => "borderWidth",
            TokenType::Opacity => "opacity",
            TokenType::FontFamilies => "fontFamilies",
            TokenType::FontWeights => "fontWeights",
            TokenType::FontSizes => "fontSizes",
            TokenType::LineHeights => "lineHeights",
            TokenType::LetterSpacing => "letterSpacing",
            TokenType::ParagraphSpacing => "paragraphSpacing",
            TokenType::Typography => "typography",
            TokenType::BoxShadow => "boxShadow",
            TokenType::Border => "border",
            TokenType::Dimension => "dimension",
            TokenType::Other => "other",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Participation of a token set in a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenSetStatus {
    Enabled,
    /// Resolvable as an alias target but never emitted as a style.
    Source,
    /// Skipped entirely. Sets missing from a selection are disabled.
    #[default]
    Disabled,
}

/// Unique identifier of a theme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ThemeId(String);

impl ThemeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random identifier for themes created locally.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ThemeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named selection of token-set statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub id: ThemeId,
    pub name: String,
    /// Precedence order is the declaration order of this map.
    #[serde(default)]
    pub selected_token_sets: IndexMap<String, TokenSetStatus>,
}

impl Theme {
    pub fn new(id: impl Into<ThemeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            selected_token_sets: IndexMap::new(),
        }
    }

    pub fn with_set(mut self, set: impl Into<String>, status: TokenSetStatus) -> Self {
        self.selected_token_sets.insert(set.into(), status);
        self
    }

    pub fn status_of(&self, set: &str) -> TokenSetStatus {
        self.selected_token_sets.get(set).copied().unwrap_or_default()
    }
}

/// A single design token. `name` is a dotted path unique within its set.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub name: String,
    pub value: TokenValue,
    pub token_type: TokenType,
    pub description: Option<String>,
}

impl Token {
    pub fn new(name: impl Into<String>, token_type: TokenType, value: TokenValue) -> Self {
        Self {
            name: name.into(),
            value,
            token_type,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether this token lives at or below the dotted `group` path.
    pub fn is_under(&self, group: &str) -> bool {
        is_path_under(&self.name, group)
    }
}

pub(crate) fn is_path_under(name: &str, group: &str) -> bool {
    name == group || (name.len() > group.len() && name.starts_with(group) && name.as_bytes()[group.len()] == b'.')
}

/// Wire form of a token inside a set: `{type, value, description?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TokenDefinition {
    #[serde(rename = "type", default)]
    pub token_type: TokenType,
    pub value: TokenValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TokenDefinition {
    fn from_token(token: &Token) -> Self {
        Self {
            token_type: token.token_type,
            value: token.value.clone(),
            description: token.description.clone(),
        }
    }

    fn into_token(self, name: String) -> Token {
        Token {
            name,
            value: self.value,
            token_type: self.token_type,
            description: self.description,
        }
    }
}

/// Ordered mapping of token name to token.
///
/// Serializes as a flat object `name -> {type, value, description?}`. Reading
/// also accepts nested groups and the legacy `[{name, type, value}]` array.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenSet {
    tokens: IndexMap<String, Token>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tokens(tokens: impl IntoIterator<Item = Token>) -> Self {
        let mut set = Self::new();
        for token in tokens {
            set.insert(token);
        }
        set
    }

    /// Inserts or replaces a token, keeping the position of a replaced name.
    pub fn insert(&mut self, token: Token) -> Option<Token> {
        self.tokens.insert(token.name.clone(), token)
    }

    /// Replaces the token named `old_name` in place, possibly under a new name.
    pub fn replace(&mut self, old_name: &str, token: Token) -> Option<Token> {
        let index = self.tokens.get_index_of(old_name)?;
        let previous = self.tokens.shift_remove_index(index).map(|(_, previous)| previous);
        self.tokens.shift_insert(index, token.name.clone(), token);
        previous
    }

    pub fn get(&self, name: &str) -> Option<&Token> {
        self.tokens.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Token> {
        self.tokens.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Token> {
        self.tokens.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tokens.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Token> {
        self.tokens.values_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }

    /// Keeps only the tokens for which `keep` returns true, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(&Token) -> bool) {
        self.tokens.retain(|_, token| keep(token));
    }

    /// Rebuilds the set with renamed keys, preserving order. Tokens for which
    /// `rename` returns `None` keep their name.
    pub(crate) fn rename_where(&mut self, mut rename: impl FnMut(&Token) -> Option<String>) {
        let tokens = std::mem::take(&mut self.tokens);
        for (_, mut token) in tokens {
            if let Some(new_name) = rename(&token) {
                token.name = new_name;
            }
            self.tokens.insert(token.name.clone(), token);
        }
    }

    /// Builds a set from any accepted wire shape.
    pub fn from_json(value: Value) -> Result<Self, String> {
        let mut set = TokenSet::new();
        match value {
            Value::Array(items) => {
                for item in items {
                    let name = item
                        .get("name")
                        .and_then(Value::as_str)
                        .ok_or_else(|| "token entry without a name".to_string())?
                        .to_string();
                    let definition: TokenDefinition =
                        serde_json::from_value(item).map_err(|e| format!("token '{}': {}", name, e))?;
                    set.insert(definition.into_token(name));
                }
            }
            Value::Object(map) => collect_group(&mut set, None, map)?,
            Value::Null => {}
            other => return Err(format!("expected an object or array of tokens, found {}", other)),
        }
        Ok(set)
    }
}

fn collect_group(set: &mut TokenSet, prefix: Option<&str>, map: serde_json::Map<String, Value>) -> Result<(), String> {
    for (key, value) in map {
        let name = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key,
        };
        match value {
            Value::Object(inner) if inner.contains_key("value") => {
                let definition: TokenDefinition =
                    serde_json::from_value(Value::Object(inner)).map_err(|e| format!("token '{}': {}", name, e))?;
                set.insert(definition.into_token(name));
            }
            Value::Object(inner) => collect_group(set, Some(&name), inner)?,
            other => return Err(format!("token '{}' is not an object: {}", name, other)),
        }
    }
    Ok(())
}

impl Serialize for TokenSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tokens.len()))?;
        for (name, token) in &self.tokens {
            map.serialize_entry(name, &TokenDefinition::from_token(token))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TokenSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        TokenSet::from_json(value).map_err(de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a TokenSet {
    type Item = &'a Token;
    type IntoIter = indexmap::map::Values<'a, String, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.values()
    }
}

/// All token sets of a document, in natural (declaration) order.
pub type TokenSets = IndexMap<String, TokenSet>;

/// Manually selected set statuses, used when no theme is active.
pub type UsedTokenSets = IndexMap<String, TokenSetStatus>;
