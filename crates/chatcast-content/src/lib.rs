//! # chatcast content
//!
//! Turning a chat site's DOM into a shareable document.
//!
//! - [`extract`] - read a conversation out of a frame snapshot
//! - [`to_markdown`] / [`format_conversation`] / [`format_all_conversations`] - Markdown export
//! - [`canonical_url`] - conversation URL clean-up for history entries

pub mod extractor;
pub mod markdown;
pub mod conversation_url;

pub use extractor::{extract, is_ui_artifact};
pub use markdown::{
    collapse_whitespace, format_all_conversations, format_all_conversations_at,
    format_conversation, to_markdown, NO_CONTENT_MARKER,
};
pub use conversation_url::canonical_url;
