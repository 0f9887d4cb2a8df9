//! Builders for host intents derived from store state.

use tracing::debug;

use super::types::{AnnotationDirection, AppliedToken, HostMessage, PullStyleOptions};
use crate::settings::{UiSettings, UpdateMode};
use crate::store::TokenStore;
use crate::tokens::{ResolvedToken, TokenType};

/// Styles for every resolved token of an enabled set, private paths excluded.
pub fn create_styles(store: &TokenStore, settings: &UiSettings) -> HostMessage {
    let merged = store.resolve_tokens();
    let tokens: Vec<ResolvedToken> = merged
        .iter()
        .filter(|token| token.is_style_token() && token.is_resolved())
        .cloned()
        .collect();
    debug!("Building styles for {} of {} tokens", tokens.len(), merged.len());
    HostMessage::CreateStyles {
        tokens,
        settings: settings.clone(),
    }
}

/// One remap per renamed token, in rename order.
pub fn remap_tokens(renames: &[(String, String)], category: TokenType, update_mode: UpdateMode) -> Vec<HostMessage> {
    renames
        .iter()
        .map(|(old_name, new_name)| HostMessage::RemapTokens {
            old_name: old_name.clone(),
            new_name: new_name.clone(),
            category,
            update_mode,
        })
        .collect()
}

/// `None` when no style kind is selected.
pub fn pull_styles(options: PullStyleOptions) -> Option<HostMessage> {
    options.any().then_some(HostMessage::PullStyles { style_types: options })
}

pub fn create_annotation(store: &TokenStore, name: &str, direction: AnnotationDirection) -> Option<HostMessage> {
    let token = store.resolve_tokens().get(name).cloned()?;
    Some(HostMessage::CreateAnnotation { token, direction })
}

/// Asks the host to detach the given tokens wherever their resolved value is
/// applied. Names that do not resolve are skipped.
pub fn remove_tokens_by_value<'a>(store: &TokenStore, names: impl IntoIterator<Item = &'a str>) -> HostMessage {
    let merged = store.resolve_tokens();
    let tokens = names
        .into_iter()
        .filter_map(|name| {
            merged.token_value(name).map(|value| AppliedToken {
                name: name.to_string(),
                value: value.clone(),
            })
        })
        .collect();
    HostMessage::RemoveTokensByValue { tokens }
}
