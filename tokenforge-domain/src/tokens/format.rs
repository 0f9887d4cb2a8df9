//! Export of token sets as nested JSON.

use serde_json::{Map, Value};

use super::types::{Token, TokenSet, TokenSets, TokenType};
use super::value::TokenValue;

/// Options for [`format_tokens`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// Export every set instead of only the active one.
    pub include_all_sets: bool,
    /// Nest each set's tokens under the set name.
    pub include_parent: bool,
    /// Split typography values into one token per field.
    pub expand_typography: bool,
    /// Split box shadows into one token per field (and per layer).
    pub expand_shadow: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            include_all_sets: false,
            include_parent: true,
            expand_typography: false,
            expand_shadow: false,
        }
    }
}

/// Nested export of `sets`, ready for style-dictionary style tooling.
pub fn format_tokens(sets: &TokenSets, active_set: &str, options: &FormatOptions) -> Value {
    let mut root = Map::new();
    for (set_name, set) in sets {
        if !options.include_all_sets && set_name != active_set {
            continue;
        }
        let target = if options.include_parent {
            match root
                .entry(set_name.clone())
                .or_insert_with(|| Value::Object(Map::new()))
            {
                Value::Object(map) => map,
                _ => continue,
            }
        } else {
            &mut root
        };
        for token in set {
            insert_nested(target, &token.name, token_entry(token, options));
        }
    }
    Value::Object(root)
}

/// The active set as pretty-printed nested JSON, as shown in the JSON editor.
pub fn stringify_tokens(sets: &TokenSets, active_set: &str) -> serde_json::Result<String> {
    let nested = sets.get(active_set).map(nest_set).unwrap_or_else(|| Value::Object(Map::new()));
    serde_json::to_string_pretty(&nested)
}

fn nest_set(set: &TokenSet) -> Value {
    let mut root = Map::new();
    let options = FormatOptions::default();
    for token in set {
        insert_nested(&mut root, &token.name, token_entry(token, &options));
    }
    Value::Object(root)
}

fn leaf(value: Value, token_type: &str, description: Option<&str>) -> Value {
    let mut entry = Map::new();
    entry.insert("value".to_string(), value);
    entry.insert("type".to_string(), Value::String(token_type.to_string()));
    if let Some(description) = description {
        entry.insert("description".to_string(), Value::String(description.to_string()));
    }
    Value::Object(entry)
}

fn expand_fields(fields: &indexmap::IndexMap<String, TokenValue>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(field, value)| (field.clone(), leaf(value.to_json(), field, None)))
        .collect()
}

fn token_entry(token: &Token, options: &FormatOptions) -> Value {
    match (&token.value, token.token_type) {
        (TokenValue::Composite(fields), TokenType::Typography) if options.expand_typography => {
            Value::Object(expand_fields(fields))
        }
        (TokenValue::Composite(fields), TokenType::BoxShadow) if options.expand_shadow => {
            Value::Object(expand_fields(fields))
        }
        (TokenValue::List(layers), TokenType::BoxShadow) if options.expand_shadow => {
            let mut expanded = Map::new();
            for (index, layer) in layers.iter().enumerate() {
                let entry = match layer {
                    TokenValue::Composite(fields) => Value::Object(expand_fields(fields)),
                    other => leaf(other.to_json(), TokenType::BoxShadow.as_str(), None),
                };
                expanded.insert((index + 1).to_string(), entry);
            }
            Value::Object(expanded)
        }
        (value, token_type) => leaf(value.to_json(), token_type.as_str(), token.description.as_deref()),
    }
}

fn insert_nested(root: &mut Map<String, Value>, name: &str, entry: Value) {
    let mut segments: Vec<&str> = name.split('.').collect();
    let last = segments.pop().unwrap_or(name);
    let mut current = root;
    for segment in segments {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => return,
        };
    }
    current.insert(last.to_string(), entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_sets() -> TokenSets {
        let mut sets = TokenSets::new();
        sets.insert(
            "global".to_string(),
            TokenSet::from_json(json!({
                "colors.red": {"type": "color", "value": "#f00", "description": "Alarm"},
                "type.body": {"type": "typography", "value": {"fontFamily": "Inter", "fontSize": "$size.md"}}
            }))
            .unwrap(),
        );
        sets.insert(
            "light".to_string(),
            TokenSet::from_json(json!({
                "shadow.card": {"type": "boxShadow", "value": [{"x": 0, "blur": 4}, {"x": 1, "blur": 8}]}
            }))
            .unwrap(),
        );
        sets
    }

    #[test]
    fn test_format_active_set_with_parent() {
        let formatted = format_tokens(&sample_sets(), "global", &FormatOptions::default());
        assert_eq!(
            formatted,
            json!({
                "global": {
                    "colors": {"red": {"value": "#f00", "type": "color", "description": "Alarm"}},
                    "type": {"body": {"value": {"fontFamily": "Inter", "fontSize": "$size.md"}, "type": "typography"}}
                }
            })
        );
    }

    #[test]
    fn test_format_all_sets_expanded_without_parent() {
        let options = FormatOptions {
            include_all_sets: true,
            include_parent: false,
            expand_typography: true,
            expand_shadow: true,
        };
        let formatted = format_tokens(&sample_sets(), "global", &options);

        assert_eq!(
            formatted["type"]["body"],
            json!({
                "fontFamily": {"value": "Inter", "type": "fontFamily"},
                "fontSize": {"value": "$size.md", "type": "fontSize"}
            })
        );
        assert_eq!(formatted["shadow"]["card"]["2"]["blur"], json!({"value": 8, "type": "blur"}));
    }

    #[test]
    fn test_stringify_unknown_set_is_empty_object() {
        assert_eq!(stringify_tokens(&sample_sets(), "missing").unwrap(), "{}");
        let text = stringify_tokens(&sample_sets(), "global").unwrap();
        assert!(text.contains("\"colors\": {"));
    }
}
