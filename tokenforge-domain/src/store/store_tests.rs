use super::*;
use crate::tokens::TokenValue;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn token(name: &str, token_type: TokenType, value: Value) -> Token {
    Token::new(name, token_type, TokenValue::from(value))
}

fn sizing(name: &str, value: Value) -> Token {
    token(name, TokenType::Sizing, value)
}

fn store_with(sets: &[(&str, Vec<Token>)]) -> TokenStore {
    let mut store = TokenStore::new();
    let values: TokenSets = sets
        .iter()
        .map(|(name, tokens)| (name.to_string(), TokenSet::from_tokens(tokens.clone())))
        .collect();
    let used = sets
        .iter()
        .map(|(name, _)| (name.to_string(), TokenSetStatus::Enabled))
        .collect();
    store
        .set_token_data(TokenData {
            values,
            themes: Vec::new(),
            used_token_set: Some(used),
            active_theme: None,
        })
        .unwrap();
    store
}

fn resolved(store: &TokenStore, name: &str) -> Option<Value> {
    store.resolve_tokens().get(name).and_then(|t| t.value.value().cloned())
}

fn names(store: &TokenStore, set: &str) -> Vec<String> {
    store.token_set(set).unwrap().names().map(str::to_string).collect()
}

#[test]
fn test_default_store_has_enabled_global_set() {
    let store = TokenStore::new();
    assert_eq!(store.active_token_set(), DEFAULT_TOKEN_SET);
    assert_eq!(store.used_token_set().get(DEFAULT_TOKEN_SET), Some(&TokenSetStatus::Enabled));
    assert!(store.active_theme().is_none());
}

#[test]
fn test_arithmetic_alias_becomes_unresolved_after_delete() {
    let mut store = store_with(&[(
        "global",
        vec![sizing("sizing.sm", json!(4)), sizing("sizing.md", json!("$sizing.sm * 2"))],
    )]);
    assert_eq!(resolved(&store, "sizing.md"), Some(json!(8)));

    store.delete_token("global", "sizing.sm").unwrap();
    let merged = store.resolve_tokens();
    let md = merged.get("sizing.md").unwrap();
    assert!(!md.is_resolved());
    assert!(matches!(
        md.value.error(),
        Some(crate::tokens::ResolutionError::MissingReference { .. })
    ));
}

#[test]
fn test_disabling_a_set_changes_the_winner() {
    let mut store = store_with(&[
        ("global", vec![sizing("sizing.xs", json!(4))]),
        ("light", vec![sizing("sizing.xs", json!(8))]),
    ]);
    assert_eq!(resolved(&store, "sizing.xs"), Some(json!(8)));

    let mut used = store.used_token_set().clone();
    used.insert("light".to_string(), TokenSetStatus::Disabled);
    store.set_used_token_set(used);
    assert_eq!(resolved(&store, "sizing.xs"), Some(json!(4)));
}

#[test]
fn test_updated_at_strictly_increases() {
    let mut store = TokenStore::new();
    let mut previous = store.updated_at();
    for i in 0..20 {
        store.create_token("global", sizing(&format!("sizing.s{}", i), json!(i))).unwrap();
        assert!(store.updated_at() > previous);
        previous = store.updated_at();
    }
    store.set_last_synced_state("[]".to_string(), None);
    assert!(store.updated_at() > previous);
}

#[test]
fn test_failed_mutation_does_not_bump_timestamp() {
    let mut store = TokenStore::new();
    let before = store.updated_at();
    assert!(matches!(
        store.delete_token("global", "missing"),
        Err(StoreError::TokenNotFound { .. })
    ));
    assert!(matches!(
        store.create_token("nope", sizing("a", json!(1))),
        Err(StoreError::TokenSetNotFound { .. })
    ));
    assert_eq!(store.updated_at(), before);
}

#[test]
fn test_create_token_validates_name_and_uniqueness() {
    let mut store = TokenStore::new();
    store.create_token("global", sizing("sizing.xs", json!(4))).unwrap();
    assert!(matches!(
        store.create_token("global", sizing("sizing.xs", json!(5))),
        Err(StoreError::TokenExists { .. })
    ));
    assert!(matches!(
        store.create_token("global", sizing("sizing..xs", json!(5))),
        Err(StoreError::InvalidName { .. })
    ));
    assert!(matches!(
        store.create_token("global", sizing("", json!(5))),
        Err(StoreError::InvalidName { .. })
    ));
}

#[test]
fn test_edit_token_keeps_position() {
    let mut store = store_with(&[(
        "global",
        vec![sizing("a", json!(1)), sizing("b", json!(2)), sizing("c", json!(3))],
    )]);
    store.edit_token("global", "b", sizing("renamed", json!(20))).unwrap();
    assert_eq!(names(&store, "global"), vec!["a", "renamed", "c"]);
    assert!(matches!(
        store.edit_token("global", "a", sizing("c", json!(1))),
        Err(StoreError::TokenExists { .. })
    ));
}

#[test]
fn test_rename_group_rewrites_aliases_across_sets() {
    let mut store = store_with(&[
        (
            "global",
            vec![
                sizing("sizing.base.sm", json!(4)),
                sizing("sizing.base.md", json!("$sizing.base.sm * 2")),
                token("sizing.base.note", TokenType::Other, json!("untouched")),
            ],
        ),
        (
            "light",
            vec![
                sizing("sizing.card", json!("{sizing.base.md}")),
                token("border.card", TokenType::Border, json!("$sizing.base.sm solid #000")),
            ],
        ),
    ]);

    let renames = store
        .rename_group("global", "sizing.base", "core", TokenType::Sizing)
        .unwrap();
    assert_eq!(
        renames,
        vec![
            ("sizing.base.sm".to_string(), "sizing.core.sm".to_string()),
            ("sizing.base.md".to_string(), "sizing.core.md".to_string()),
        ]
    );
    assert_eq!(
        names(&store, "global"),
        vec!["sizing.core.sm", "sizing.core.md", "sizing.base.note"]
    );

    let light = store.token_set("light").unwrap();
    assert_eq!(light.get("sizing.card").unwrap().value.to_json(), json!("{sizing.core.md}"));
    assert_eq!(
        light.get("border.card").unwrap().value.to_json(),
        json!("$sizing.core.sm solid #000")
    );
    assert_eq!(resolved(&store, "sizing.card"), Some(json!(8)));
}

#[test]
fn test_rename_group_to_same_name_is_noop() {
    let mut store = store_with(&[("global", vec![sizing("sizing.base.sm", json!(4))])]);
    let before = store.updated_at();
    let renames = store
        .rename_group("global", "sizing.base", "base", TokenType::Sizing)
        .unwrap();
    assert!(renames.is_empty());
    assert_eq!(store.updated_at(), before);
}

#[test]
fn test_rename_group_refuses_collisions() {
    let mut store = store_with(&[(
        "global",
        vec![sizing("sizing.base.sm", json!(4)), sizing("sizing.core.sm", json!(6))],
    )]);
    assert!(matches!(
        store.rename_group("global", "sizing.base", "core", TokenType::Sizing),
        Err(StoreError::TokenExists { .. })
    ));
    assert_eq!(names(&store, "global"), vec!["sizing.base.sm", "sizing.core.sm"]);
    assert!(matches!(
        store.rename_group("global", "spacing", "gap", TokenType::Spacing),
        Err(StoreError::GroupNotFound { .. })
    ));
}

#[test]
fn test_duplicate_group_picks_free_suffix() {
    let mut store = store_with(&[(
        "global",
        vec![
            token("colors.brand.primary", TokenType::Color, json!("#ff0000")),
            token("colors.brand.secondary", TokenType::Color, json!("$colors.brand.primary")),
        ],
    )]);

    let first = store
        .duplicate_group("global", "colors.brand", TokenType::Color)
        .unwrap();
    assert_eq!(first, "colors.brand-copy");
    let second = store
        .duplicate_group("global", "colors.brand", TokenType::Color)
        .unwrap();
    assert_eq!(second, "colors.brand-copy-2");
    let third = store
        .duplicate_group("global", "colors.brand", TokenType::Color)
        .unwrap();
    assert_eq!(third, "colors.brand-copy-3");

    let set = store.token_set("global").unwrap();
    assert_eq!(set.len(), 8);
    assert_eq!(
        set.get("colors.brand-copy-2.secondary").unwrap().value.to_json(),
        json!("$colors.brand.primary")
    );
}

#[test]
fn test_delete_group_removes_subtree_only() {
    let mut store = store_with(&[(
        "global",
        vec![
            sizing("sizing", json!(1)),
            sizing("sizing.sm", json!(4)),
            sizing("sizing.sm.x", json!(5)),
            sizing("sizingextra", json!(6)),
        ],
    )]);
    let before = store.updated_at();
    assert_eq!(store.delete_group("global", "sizing.missing").unwrap(), 0);
    assert_eq!(store.updated_at(), before);

    assert_eq!(store.delete_group("global", "sizing").unwrap(), 3);
    assert_eq!(names(&store, "global"), vec!["sizingextra"]);
}

#[test]
fn test_active_theme_drives_selection_and_order() {
    let mut store = store_with(&[
        ("global", vec![sizing("sizing.xs", json!(4))]),
        ("light", vec![sizing("sizing.xs", json!(8))]),
    ]);
    let theme = Theme::new("compact", "Compact")
        .with_set("light", TokenSetStatus::Source)
        .with_set("missing", TokenSetStatus::Enabled)
        .with_set("global", TokenSetStatus::Enabled);
    store.save_theme(theme).unwrap();
    store.set_active_theme(Some(ThemeId::from("compact"))).unwrap();

    assert_eq!(store.used_token_set().get("light"), Some(&TokenSetStatus::Source));
    let inputs: Vec<&str> = store.merge_inputs().iter().map(|input| input.name).collect();
    assert_eq!(inputs, vec!["light", "global"]);
    assert_eq!(resolved(&store, "sizing.xs"), Some(json!(4)));

    assert!(matches!(
        store.set_active_theme(Some(ThemeId::from("unknown"))),
        Err(StoreError::ThemeNotFound { .. })
    ));
    assert_eq!(store.active_theme(), Some(&ThemeId::from("compact")));

    store.set_used_token_set(store.used_token_set().clone());
    assert!(store.active_theme().is_none());
}

#[test]
fn test_rename_and_delete_token_set_update_themes() {
    let mut store = store_with(&[("global", vec![]), ("light", vec![])]);
    store
        .save_theme(Theme::new("t", "Theme").with_set("light", TokenSetStatus::Enabled))
        .unwrap();

    store.rename_token_set("light", "day").unwrap();
    assert_eq!(store.token_sets().keys().collect::<Vec<_>>(), vec!["global", "day"]);
    assert_eq!(store.themes()[0].status_of("day"), TokenSetStatus::Enabled);
    assert_eq!(store.used_token_set().get("day"), Some(&TokenSetStatus::Enabled));

    store.delete_token_set("day").unwrap();
    assert!(store.themes()[0].selected_token_sets.is_empty());
    store.delete_token_set("global").unwrap();
    assert_eq!(store.token_sets().keys().collect::<Vec<_>>(), vec![DEFAULT_TOKEN_SET]);
}

#[test]
fn test_duplicate_token_set() {
    let mut store = store_with(&[("global", vec![sizing("a", json!(1))])]);
    assert_eq!(store.duplicate_token_set("global").unwrap(), "global-copy");
    assert_eq!(store.duplicate_token_set("global").unwrap(), "global-copy-2");
    assert_eq!(store.token_set("global-copy-2").unwrap().len(), 1);
}

#[test]
fn test_edit_prohibited_blocks_edits_but_not_selection() {
    let mut store = store_with(&[("global", vec![sizing("a", json!(1))])]);
    store.save_theme(Theme::new("t", "Theme")).unwrap();
    store.set_edit_prohibited(true);

    assert_eq!(
        store.create_token("global", sizing("b", json!(2))),
        Err(StoreError::EditProhibited)
    );
    assert_eq!(store.delete_group("global", "a"), Err(StoreError::EditProhibited));
    assert_eq!(store.add_token_set("x"), Err(StoreError::EditProhibited));
    assert!(store.set_active_theme(Some(ThemeId::from("t"))).is_ok());
    store.set_used_token_set(UsedTokenSets::new());
}

#[test]
fn test_unsynced_changes_follow_snapshot() {
    let mut store = TokenStore::new();
    assert!(store.has_unsynced_changes());
    store.mark_synced(None);
    assert!(!store.has_unsynced_changes());
    store.create_token("global", sizing("a", json!(1))).unwrap();
    assert!(store.has_unsynced_changes());
}

#[test]
fn test_set_token_data_keeps_selection_and_validates_theme() {
    let mut store = store_with(&[("global", vec![]), ("light", vec![])]);
    let mut used = UsedTokenSets::new();
    used.insert("light".to_string(), TokenSetStatus::Source);
    store.set_used_token_set(used);

    let mut values = TokenSets::new();
    values.insert("light".to_string(), TokenSet::new());
    values.insert("dark".to_string(), TokenSet::new());
    store
        .set_token_data(TokenData {
            values: values.clone(),
            ..TokenData::default()
        })
        .unwrap();
    assert_eq!(store.used_token_set().get("light"), Some(&TokenSetStatus::Source));
    assert_eq!(store.used_token_set().get("dark"), None);
    assert_eq!(store.active_token_set(), "light");

    let result = store.set_token_data(TokenData {
        values,
        active_theme: Some(ThemeId::from("ghost")),
        ..TokenData::default()
    });
    assert!(matches!(result, Err(StoreError::ThemeNotFound { .. })));
}

#[test]
fn test_to_document_and_load_round_trip() {
    let mut store = store_with(&[("global", vec![sizing("sizing.xs", json!(4))])]);
    store
        .save_theme(Theme::new("t", "Theme").with_set("global", TokenSetStatus::Enabled))
        .unwrap();
    let document = store.to_document("1.0.0");
    assert_eq!(document.updated_at(), Some(store.updated_at()));
    assert_eq!(document.metadata.version.as_deref(), Some("1.0.0"));

    let mut other = TokenStore::new();
    other.load_document(document.clone(), true).unwrap();
    assert!(other.is_edit_prohibited());
    assert_eq!(other.token_sets(), &document.tokens);
    assert_eq!(other.themes(), document.themes.as_slice());
    assert_eq!(resolved(&other, "sizing.xs"), Some(json!(4)));
}

#[test]
fn test_load_document_moves_past_remote_timestamp() {
    let remote_updated_at = Utc::now() + Duration::hours(1);
    let mut document = store_with(&[("global", vec![sizing("sizing.xs", json!(4))])]).to_document("1.0.0");
    document.metadata.updated_at = Some(remote_updated_at);

    let mut store = TokenStore::new();
    store.load_document(document, false).unwrap();
    assert!(store.updated_at() > remote_updated_at);

    store.mark_synced(Some(remote_updated_at));
    assert!(store.to_document("1.0.0").updated_at().unwrap() > remote_updated_at);
}
