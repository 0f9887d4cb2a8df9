//! Token model, alias resolution and set merging.
//!
//! - [`types`]: tokens, token sets, themes and set statuses.
//! - [`value`]: the tagged [`TokenValue`] and its parser.
//! - [`alias`]: [`AliasResolver`], cycle-safe alias and arithmetic resolution.
//! - [`merge`]: [`merge`](merge::merge), which folds ordered sets into [`MergedTokens`].
//! - [`format`]: nested JSON export.

pub mod alias;
pub mod errors;
pub mod format;
pub mod merge;
pub mod types;
pub mod value;

pub use alias::{resolve, AliasResolver, ResolvedValue, TokenLookup, MAX_ALIAS_DEPTH};
pub use errors::ResolutionError;
pub use format::{format_tokens, stringify_tokens, FormatOptions};
pub use merge::{merge, MergeInput, MergedTokens, ResolvedToken};
pub use types::{Theme, ThemeId, Token, TokenSet, TokenSetStatus, TokenSets, TokenType, UsedTokenSets};
pub use value::{Expr, Expression, ExpressionBody, Literal, Operator, TemplatePart, TokenValue};
