//! Outbound messages to the host document.
//!
//! The engine never calls the host directly. It produces [`HostMessage`]s and
//! pushes them into a [`MessageChannel`]; [`intents`] builds them from store
//! state.

pub mod channel;
pub mod intents;
pub mod types;

pub use channel::{drain, MessageChannel, QueuedMessageChannel};
pub use types::{AnnotationDirection, AppliedToken, HostMessage, NotifyLevel, PullStyleOptions};
