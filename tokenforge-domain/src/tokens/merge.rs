//! Token set merging.
//!
//! Sets are folded in caller order into one flat mapping; later sets override
//! earlier ones. Every token is then resolved against that whole mapping, so
//! forward references across sets work regardless of declaration order.

use indexmap::IndexMap;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::alias::{AliasResolver, ResolvedValue, TokenLookup};
use super::types::{Token, TokenSet, TokenSetStatus, TokenType};
use super::value::TokenValue;

/// Prefix marking a path segment as private (never emitted as a style).
pub const PRIVATE_SEGMENT_MARKER: char = '_';

/// One set taking part in a merge.
#[derive(Debug, Clone, Copy)]
pub struct MergeInput<'a> {
    pub name: &'a str,
    pub tokens: &'a TokenSet,
    pub status: TokenSetStatus,
}

impl<'a> MergeInput<'a> {
    pub fn new(name: &'a str, tokens: &'a TokenSet, status: TokenSetStatus) -> Self {
        Self { name, tokens, status }
    }
}

/// A token after merging, with its resolved value and origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedToken {
    pub name: String,
    pub token_type: TokenType,
    pub raw_value: TokenValue,
    pub description: Option<String>,
    pub value: ResolvedValue,
    /// Set that last defined this token.
    pub parent: String,
    pub parent_status: TokenSetStatus,
}

impl ResolvedToken {
    pub fn is_resolved(&self) -> bool {
        self.value.is_resolved()
    }

    pub fn is_private(&self) -> bool {
        self.name.split('.').any(|segment| segment.starts_with(PRIVATE_SEGMENT_MARKER))
    }

    /// Whether this token should be turned into a host style.
    pub fn is_style_token(&self) -> bool {
        !self.is_private() && self.parent_status == TokenSetStatus::Enabled
    }
}

impl Serialize for ResolvedToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("type", &self.token_type)?;
        match &self.value {
            ResolvedValue::Resolved(value) => map.serialize_entry("value", value)?,
            ResolvedValue::Unresolved(err) => {
                map.serialize_entry("value", &self.raw_value)?;
                map.serialize_entry("failedToResolve", &true)?;
                map.serialize_entry("error", &err.to_string())?;
            }
        }
        map.serialize_entry("rawValue", &self.raw_value)?;
        if let Some(description) = &self.description {
            map.serialize_entry("description", description)?;
        }
        map.serialize_entry("internal__Parent", &self.parent)?;
        map.end()
    }
}

/// Ordered result of a merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedTokens {
    tokens: IndexMap<String, ResolvedToken>,
}

impl MergedTokens {
    pub fn get(&self, name: &str) -> Option<&ResolvedToken> {
        self.tokens.get(name)
    }

    /// Resolved value of `name`, if it resolved.
    pub fn token_value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(|token| token.value.value())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedToken> {
        self.tokens.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }

    /// Tokens eligible for style generation, in merge order.
    pub fn style_tokens(&self) -> Vec<&ResolvedToken> {
        self.iter().filter(|token| token.is_style_token()).collect()
    }

    /// Whether `value` is an alias whose every target is present in this merge.
    pub fn is_alias(&self, value: &TokenValue) -> bool {
        let references = value.references();
        !references.is_empty() && references.iter().all(|name| self.tokens.contains_key(*name))
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &ResolvedToken> {
        self.iter().filter(|token| !token.is_resolved())
    }

    pub fn into_vec(self) -> Vec<ResolvedToken> {
        self.tokens.into_values().collect()
    }
}

impl Serialize for MergedTokens {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.tokens.values())
    }
}

struct MergeEntry<'a> {
    token: &'a Token,
    parent: &'a str,
    status: TokenSetStatus,
}

struct FlatTokens<'a>(IndexMap<&'a str, MergeEntry<'a>>);

impl TokenLookup for FlatTokens<'_> {
    fn lookup(&self, name: &str) -> Option<&TokenValue> {
        self.0.get(name).map(|entry| &entry.token.value)
    }
}

fn flatten<'a>(inputs: &[MergeInput<'a>]) -> FlatTokens<'a> {
    let mut flat: IndexMap<&'a str, MergeEntry<'a>> = IndexMap::new();
    for input in inputs {
        if input.status == TokenSetStatus::Disabled {
            debug!("Skipping disabled token set '{}'", input.name);
            continue;
        }
        for token in input.tokens {
            // Re-inserting moves an overridden token to the overriding set's position.
            flat.shift_remove(token.name.as_str());
            flat.insert(
                token.name.as_str(),
                MergeEntry {
                    token,
                    parent: input.name,
                    status: input.status,
                },
            );
        }
    }
    FlatTokens(flat)
}

/// Merges `inputs` in order and resolves every resulting token.
pub fn merge(inputs: &[MergeInput<'_>]) -> MergedTokens {
    let flat = flatten(inputs);
    let mut resolver = AliasResolver::new(&flat);
    let mut tokens = IndexMap::with_capacity(flat.0.len());

    for entry in flat.0.values() {
        let value = resolver.resolve(entry.token);
        if let ResolvedValue::Unresolved(err) = &value {
            warn!("Failed to resolve token '{}' from set '{}': {}", entry.token.name, entry.parent, err);
        }
        tokens.insert(
            entry.token.name.clone(),
            ResolvedToken {
                name: entry.token.name.clone(),
                token_type: entry.token.token_type,
                raw_value: entry.token.value.clone(),
                description: entry.token.description.clone(),
                value,
                parent: entry.parent.to_string(),
                parent_status: entry.status,
            },
        );
    }

    debug!("Merged {} token sets into {} tokens", inputs.len(), tokens.len());
    MergedTokens { tokens }
}
