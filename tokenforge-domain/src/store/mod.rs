//! The token document store.
//!
//! `TokenStore` owns the token sets, themes and selection state of one
//! document. Every mutation computes its result fully before committing it,
//! and every committed mutation moves `updated_at` strictly forward. The store
//! never persists anything itself; the sync service reads `to_document` and
//! feeds remote documents back through `set_token_data`.

pub mod errors;
#[cfg(test)]
mod store_tests;

pub use errors::StoreError;

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::storage::{DocumentMetadata, NormalizedDocument};
use crate::tokens::types::is_path_under;
use crate::tokens::{
    merge, MergeInput, MergedTokens, Theme, ThemeId, Token, TokenSet, TokenSetStatus, TokenSets, TokenType,
    UsedTokenSets,
};

/// Name of the set a fresh document starts with.
pub const DEFAULT_TOKEN_SET: &str = "global";

const COPY_SUFFIX: &str = "-copy";

/// Document data handed to [`TokenStore::set_token_data`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenData {
    pub values: TokenSets,
    pub themes: Vec<Theme>,
    /// `None` keeps the current selection for sets that still exist.
    pub used_token_set: Option<UsedTokenSets>,
    pub active_theme: Option<ThemeId>,
}

impl From<NormalizedDocument> for TokenData {
    fn from(document: NormalizedDocument) -> Self {
        Self {
            values: document.tokens,
            themes: document.themes,
            used_token_set: None,
            active_theme: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenStore {
    token_sets: TokenSets,
    themes: Vec<Theme>,
    active_theme: Option<ThemeId>,
    active_token_set: String,
    used_token_set: UsedTokenSets,
    last_synced_state: Option<String>,
    last_synced_updated_at: Option<DateTime<Utc>>,
    edit_prohibited: bool,
    updated_at: DateTime<Utc>,
}

impl Default for TokenStore {
    fn default() -> Self {
        let mut token_sets = TokenSets::new();
        token_sets.insert(DEFAULT_TOKEN_SET.to_string(), TokenSet::new());
        let mut used_token_set = UsedTokenSets::new();
        used_token_set.insert(DEFAULT_TOKEN_SET.to_string(), TokenSetStatus::Enabled);
        Self {
            token_sets,
            themes: Vec::new(),
            active_theme: None,
            active_token_set: DEFAULT_TOKEN_SET.to_string(),
            used_token_set,
            last_synced_state: None,
            last_synced_updated_at: None,
            edit_prohibited: false,
            updated_at: Utc::now(),
        }
    }
}

fn validate_token_name(name: &str) -> Result<(), StoreError> {
    let invalid = |reason: &str| StoreError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if name.trim().is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if name.split('.').any(|segment| segment.trim().is_empty()) {
        return Err(invalid("name must not contain empty path segments"));
    }
    Ok(())
}

fn validate_set_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidName {
            name: name.to_string(),
            reason: "token set name must not be empty".to_string(),
        });
    }
    Ok(())
}

/// `<base>-copy`, then `<base>-copy-2`, `<base>-copy-3`, ... until `taken`
/// rejects the candidate.
fn unique_copy_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    let mut candidate = format!("{}{}", base, COPY_SUFFIX);
    let mut counter = 2;
    while taken(&candidate) {
        candidate = format!("{}{}-{}", base, COPY_SUFFIX, counter);
        counter += 1;
    }
    candidate
}

/// Rebuilds an ordered map with one key renamed in place.
fn rename_key<V>(map: &mut indexmap::IndexMap<String, V>, old: &str, new: &str) {
    if let Some(index) = map.get_index_of(old) {
        if let Some((_, value)) = map.shift_remove_index(index) {
            map.shift_insert(index, new.to_string(), value);
        }
    }
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token_sets(&self) -> &TokenSets {
        &self.token_sets
    }

    pub fn token_set(&self, name: &str) -> Option<&TokenSet> {
        self.token_sets.get(name)
    }

    pub fn themes(&self) -> &[Theme] {
        &self.themes
    }

    pub fn theme(&self, id: &ThemeId) -> Option<&Theme> {
        self.themes.iter().find(|theme| &theme.id == id)
    }

    pub fn active_theme(&self) -> Option<&ThemeId> {
        self.active_theme.as_ref()
    }

    pub fn active_token_set(&self) -> &str {
        &self.active_token_set
    }

    pub fn used_token_set(&self) -> &UsedTokenSets {
        &self.used_token_set
    }

    pub fn last_synced_state(&self) -> Option<&str> {
        self.last_synced_state.as_deref()
    }

    pub fn last_synced_updated_at(&self) -> Option<DateTime<Utc>> {
        self.last_synced_updated_at
    }

    pub fn is_edit_prohibited(&self) -> bool {
        self.edit_prohibited
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::milliseconds(1)
        };
    }

    fn ensure_editable(&self) -> Result<(), StoreError> {
        if self.edit_prohibited {
            return Err(StoreError::EditProhibited);
        }
        Ok(())
    }

    fn set_mut(&mut self, set: &str) -> Result<&mut TokenSet, StoreError> {
        self.token_sets.get_mut(set).ok_or_else(|| StoreError::TokenSetNotFound {
            set: set.to_string(),
        })
    }

    fn set_ref(&self, set: &str) -> Result<&TokenSet, StoreError> {
        self.token_sets.get(set).ok_or_else(|| StoreError::TokenSetNotFound {
            set: set.to_string(),
        })
    }

    // --- Document replacement ---

    /// Replaces the whole document, typically after a pull.
    ///
    /// An explicit `active_theme` must exist in the new themes. Without one,
    /// the current active theme is kept if it still exists. The used-set map
    /// comes from the data, else from the active theme, else from the current
    /// selection restricted to the new sets.
    pub fn set_token_data(&mut self, data: TokenData) -> Result<(), StoreError> {
        let TokenData {
            mut values,
            themes,
            used_token_set,
            active_theme,
        } = data;

        if values.is_empty() {
            values.insert(DEFAULT_TOKEN_SET.to_string(), TokenSet::new());
        }

        let active_theme = match active_theme {
            Some(id) => {
                if !themes.iter().any(|theme| theme.id == id) {
                    return Err(StoreError::ThemeNotFound { theme_id: id });
                }
                Some(id)
            }
            None => self
                .active_theme
                .clone()
                .filter(|id| themes.iter().any(|theme| &theme.id == id)),
        };

        let used_token_set = match (used_token_set, &active_theme) {
            (Some(used), _) => used,
            (None, Some(id)) => themes
                .iter()
                .find(|theme| &theme.id == id)
                .map(|theme| theme.selected_token_sets.clone())
                .unwrap_or_default(),
            (None, None) => {
                let mut used: UsedTokenSets = values
                    .keys()
                    .filter_map(|name| self.used_token_set.get(name).map(|status| (name.clone(), *status)))
                    .collect();
                if used.is_empty() {
                    if let Some(first) = values.keys().next() {
                        used.insert(first.clone(), TokenSetStatus::Enabled);
                    }
                }
                used
            }
        };

        let active_token_set = if values.contains_key(&self.active_token_set) {
            self.active_token_set.clone()
        } else {
            values.keys().next().cloned().unwrap_or_else(|| DEFAULT_TOKEN_SET.to_string())
        };

        debug!(
            "Replacing document: {} token sets, {} themes",
            values.len(),
            themes.len()
        );
        self.token_sets = values;
        self.themes = themes;
        self.active_theme = active_theme;
        self.used_token_set = used_token_set;
        self.active_token_set = active_token_set;
        self.touch();
        Ok(())
    }

    /// Loads a document pulled from a provider. Read-only providers mark the
    /// store as not editable.
    ///
    /// `updated_at` ends up later than the document's own timestamp, so the
    /// next push never stamps a remote with an older time than it replaces.
    pub fn load_document(&mut self, document: NormalizedDocument, read_only: bool) -> Result<(), StoreError> {
        let remote_updated_at = document.updated_at();
        self.set_token_data(TokenData::from(document))?;
        if let Some(remote) = remote_updated_at {
            if self.updated_at <= remote {
                self.updated_at = remote + Duration::milliseconds(1);
            }
        }
        self.edit_prohibited = read_only;
        Ok(())
    }

    // --- Tokens ---

    pub fn create_token(&mut self, set: &str, token: Token) -> Result<(), StoreError> {
        self.ensure_editable()?;
        validate_token_name(&token.name)?;
        let tokens = self.set_mut(set)?;
        if tokens.contains(&token.name) {
            return Err(StoreError::TokenExists {
                set: set.to_string(),
                name: token.name,
            });
        }
        debug!("Creating token '{}' in set '{}'", token.name, set);
        tokens.insert(token);
        self.touch();
        Ok(())
    }

    /// Replaces `old_name` with `token` in place. The token may carry a new
    /// name; references to the old name are not rewritten.
    pub fn edit_token(&mut self, set: &str, old_name: &str, token: Token) -> Result<(), StoreError> {
        self.ensure_editable()?;
        validate_token_name(&token.name)?;
        let tokens = self.set_mut(set)?;
        if !tokens.contains(old_name) {
            return Err(StoreError::TokenNotFound {
                set: set.to_string(),
                name: old_name.to_string(),
            });
        }
        if token.name != old_name && tokens.contains(&token.name) {
            return Err(StoreError::TokenExists {
                set: set.to_string(),
                name: token.name,
            });
        }
        tokens.replace(old_name, token);
        self.touch();
        Ok(())
    }

    pub fn delete_token(&mut self, set: &str, name: &str) -> Result<Token, StoreError> {
        self.ensure_editable()?;
        let removed = self.set_mut(set)?.remove(name).ok_or_else(|| StoreError::TokenNotFound {
            set: set.to_string(),
            name: name.to_string(),
        })?;
        self.touch();
        Ok(removed)
    }

    // --- Token sets ---

    /// Adds an empty set. New sets are not part of the selection.
    pub fn add_token_set(&mut self, name: &str) -> Result<(), StoreError> {
        self.ensure_editable()?;
        validate_set_name(name)?;
        if self.token_sets.contains_key(name) {
            return Err(StoreError::TokenSetExists { set: name.to_string() });
        }
        self.token_sets.insert(name.to_string(), TokenSet::new());
        self.touch();
        Ok(())
    }

    /// Renames a set in place, along with its entries in the selection and
    /// in every theme.
    pub fn rename_token_set(&mut self, old_name: &str, new_name: &str) -> Result<(), StoreError> {
        self.ensure_editable()?;
        validate_set_name(new_name)?;
        self.set_ref(old_name)?;
        if old_name == new_name {
            return Ok(());
        }
        if self.token_sets.contains_key(new_name) {
            return Err(StoreError::TokenSetExists {
                set: new_name.to_string(),
            });
        }

        rename_key(&mut self.token_sets, old_name, new_name);
        rename_key(&mut self.used_token_set, old_name, new_name);
        for theme in &mut self.themes {
            rename_key(&mut theme.selected_token_sets, old_name, new_name);
        }
        if self.active_token_set == old_name {
            self.active_token_set = new_name.to_string();
        }
        info!("Renamed token set '{}' to '{}'", old_name, new_name);
        self.touch();
        Ok(())
    }

    /// Copies a set to `<name>-copy` (or the next free suffix) and returns the
    /// new name.
    pub fn duplicate_token_set(&mut self, name: &str) -> Result<String, StoreError> {
        self.ensure_editable()?;
        let copy = self.set_ref(name)?.clone();
        let new_name = unique_copy_name(name, |candidate| self.token_sets.contains_key(candidate));
        self.token_sets.insert(new_name.clone(), copy);
        self.touch();
        Ok(new_name)
    }

    /// Removes a set and every reference to it. A document always keeps at
    /// least one set.
    pub fn delete_token_set(&mut self, name: &str) -> Result<(), StoreError> {
        self.ensure_editable()?;
        self.set_ref(name)?;
        self.token_sets.shift_remove(name);
        self.used_token_set.shift_remove(name);
        for theme in &mut self.themes {
            theme.selected_token_sets.shift_remove(name);
        }
        if self.token_sets.is_empty() {
            self.token_sets.insert(DEFAULT_TOKEN_SET.to_string(), TokenSet::new());
        }
        if !self.token_sets.contains_key(&self.active_token_set) {
            self.active_token_set = self
                .token_sets
                .keys()
                .next()
                .cloned()
                .unwrap_or_else(|| DEFAULT_TOKEN_SET.to_string());
        }
        info!("Deleted token set '{}'", name);
        self.touch();
        Ok(())
    }

    /// Selects the set shown for editing.
    pub fn set_active_token_set(&mut self, name: &str) -> Result<(), StoreError> {
        self.set_ref(name)?;
        self.active_token_set = name.to_string();
        self.touch();
        Ok(())
    }

    // --- Groups ---

    /// Renames the last segment of `group` for tokens of `token_type` in `set`
    /// and rewrites aliases pointing at them in every set.
    ///
    /// Returns the `(old, new)` name pairs. Renaming a group to its current
    /// name returns an empty list and leaves the store untouched.
    pub fn rename_group(
        &mut self,
        set: &str,
        group: &str,
        new_segment: &str,
        token_type: TokenType,
    ) -> Result<Vec<(String, String)>, StoreError> {
        self.ensure_editable()?;
        if new_segment.trim().is_empty() || new_segment.contains('.') {
            return Err(StoreError::InvalidName {
                name: new_segment.to_string(),
                reason: "group segment must be non-empty and contain no '.'".to_string(),
            });
        }
        let new_group = match group.rsplit_once('.') {
            Some((parent, _)) => format!("{}.{}", parent, new_segment),
            None => new_segment.to_string(),
        };
        if new_group == group {
            return Ok(Vec::new());
        }

        let tokens = self.set_ref(set)?;
        let renames: Vec<(String, String)> = tokens
            .iter()
            .filter(|token| token.token_type == token_type && token.is_under(group))
            .map(|token| {
                let new_name = format!("{}{}", new_group, &token.name[group.len()..]);
                (token.name.clone(), new_name)
            })
            .collect();
        if renames.is_empty() {
            return Err(StoreError::GroupNotFound {
                set: set.to_string(),
                group: group.to_string(),
                token_type: token_type.to_string(),
            });
        }
        if let Some((_, taken)) = renames.iter().find(|(_, new_name)| tokens.contains(new_name)) {
            return Err(StoreError::TokenExists {
                set: set.to_string(),
                name: taken.clone(),
            });
        }

        let mapping: HashMap<String, String> = renames.iter().cloned().collect();
        self.set_mut(set)?.rename_where(|token| mapping.get(&token.name).cloned());
        let rename = |name: &str| mapping.get(name).cloned();
        let mut rewritten = 0;
        for tokens in self.token_sets.values_mut() {
            for token in tokens.iter_mut() {
                if token.value.rename_references(&rename) {
                    rewritten += 1;
                }
            }
        }

        info!(
            "Renamed group '{}' to '{}' in set '{}' ({} tokens, {} references)",
            group,
            new_group,
            set,
            renames.len(),
            rewritten
        );
        self.touch();
        Ok(renames)
    }

    /// Copies the tokens of `token_type` under `group` to the first free
    /// `<group>-copy` path and returns that path.
    pub fn duplicate_group(&mut self, set: &str, group: &str, token_type: TokenType) -> Result<String, StoreError> {
        self.ensure_editable()?;
        let tokens = self.set_ref(set)?;
        let copies: Vec<Token> = tokens
            .iter()
            .filter(|token| token.token_type == token_type && token.is_under(group))
            .cloned()
            .collect();
        if copies.is_empty() {
            return Err(StoreError::GroupNotFound {
                set: set.to_string(),
                group: group.to_string(),
                token_type: token_type.to_string(),
            });
        }
        let new_group = unique_copy_name(group, |candidate| tokens.names().any(|name| is_path_under(name, candidate)));

        let tokens = self.set_mut(set)?;
        for mut token in copies {
            token.name = format!("{}{}", new_group, &token.name[group.len()..]);
            tokens.insert(token);
        }
        debug!("Duplicated group '{}' to '{}' in set '{}'", group, new_group, set);
        self.touch();
        Ok(new_group)
    }

    /// Removes every token at or under `group` and returns how many were
    /// removed.
    pub fn delete_group(&mut self, set: &str, group: &str) -> Result<usize, StoreError> {
        self.ensure_editable()?;
        let tokens = self.set_mut(set)?;
        let before = tokens.len();
        tokens.retain(|token| !token.is_under(group));
        let removed = before - tokens.len();
        if removed > 0 {
            debug!("Deleted {} tokens under '{}' in set '{}'", removed, group, set);
            self.touch();
        }
        Ok(removed)
    }

    // --- Themes and selection ---

    /// Creates the theme or replaces the one with the same id.
    pub fn save_theme(&mut self, theme: Theme) -> Result<(), StoreError> {
        self.ensure_editable()?;
        if theme.name.trim().is_empty() {
            return Err(StoreError::InvalidName {
                name: theme.name,
                reason: "theme name must not be empty".to_string(),
            });
        }
        if self.active_theme.as_ref() == Some(&theme.id) {
            self.used_token_set = theme.selected_token_sets.clone();
        }
        match self.themes.iter_mut().find(|existing| existing.id == theme.id) {
            Some(existing) => *existing = theme,
            None => self.themes.push(theme),
        }
        self.touch();
        Ok(())
    }

    pub fn delete_theme(&mut self, id: &ThemeId) -> Result<Theme, StoreError> {
        self.ensure_editable()?;
        let position = self
            .themes
            .iter()
            .position(|theme| &theme.id == id)
            .ok_or_else(|| StoreError::ThemeNotFound { theme_id: id.clone() })?;
        let removed = self.themes.remove(position);
        if self.active_theme.as_ref() == Some(id) {
            self.active_theme = None;
        }
        self.touch();
        Ok(removed)
    }

    /// Activates a theme, copying its selection into the used-set map, or
    /// clears the active theme with `None`.
    pub fn set_active_theme(&mut self, id: Option<ThemeId>) -> Result<(), StoreError> {
        match id {
            Some(id) => {
                let selection = self
                    .theme(&id)
                    .map(|theme| theme.selected_token_sets.clone())
                    .ok_or_else(|| StoreError::ThemeNotFound { theme_id: id.clone() })?;
                debug!("Activating theme '{}'", id);
                self.used_token_set = selection;
                self.active_theme = Some(id);
            }
            None => self.active_theme = None,
        }
        self.touch();
        Ok(())
    }

    /// Replaces the manual selection. A manual selection deactivates the
    /// current theme.
    pub fn set_used_token_set(&mut self, used: UsedTokenSets) {
        self.used_token_set = used;
        self.active_theme = None;
        self.touch();
    }

    // --- Sync bookkeeping ---

    /// Serialized `[tokens, themes]` of the current document.
    pub fn snapshot(&self) -> String {
        NormalizedDocument::snapshot(&self.token_sets, &self.themes)
    }

    pub fn set_last_synced_state(&mut self, state: String, updated_at: Option<DateTime<Utc>>) {
        self.last_synced_state = Some(state);
        self.last_synced_updated_at = updated_at;
        self.touch();
    }

    /// Records the current document as the synced baseline.
    pub fn mark_synced(&mut self, updated_at: Option<DateTime<Utc>>) {
        let state = self.snapshot();
        self.set_last_synced_state(state, updated_at);
    }

    pub fn has_unsynced_changes(&self) -> bool {
        self.last_synced_state.as_deref() != Some(self.snapshot().as_str())
    }

    pub fn set_edit_prohibited(&mut self, prohibited: bool) {
        self.edit_prohibited = prohibited;
        self.touch();
    }

    /// The document to persist, stamped with the store's `updated_at`.
    pub fn to_document(&self, version: &str) -> NormalizedDocument {
        NormalizedDocument {
            tokens: self.token_sets.clone(),
            themes: self.themes.clone(),
            metadata: DocumentMetadata {
                updated_at: Some(self.updated_at),
                version: Some(version.to_string()),
            },
        }
    }

    // --- Resolution ---

    /// Merge precedence: the active theme's declared order, else natural set
    /// order with the used-set statuses. Sets a theme names but the document
    /// lacks are skipped.
    pub fn merge_inputs(&self) -> Vec<MergeInput<'_>> {
        match self.active_theme.as_ref().and_then(|id| self.theme(id)) {
            Some(theme) => theme
                .selected_token_sets
                .iter()
                .filter_map(|(name, status)| match self.token_sets.get_key_value(name) {
                    Some((name, tokens)) => Some(MergeInput::new(name, tokens, *status)),
                    None => {
                        debug!("Theme '{}' references missing token set '{}'", theme.id, name);
                        None
                    }
                })
                .collect(),
            None => self
                .token_sets
                .iter()
                .map(|(name, tokens)| {
                    let status = self.used_token_set.get(name).copied().unwrap_or_default();
                    MergeInput::new(name, tokens, status)
                })
                .collect(),
        }
    }

    pub fn resolve_tokens(&self) -> MergedTokens {
        merge(&self.merge_inputs())
    }
}
