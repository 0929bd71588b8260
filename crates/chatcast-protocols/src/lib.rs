//! # chatcast protocols
//!
//! Data model and wire types shared by every chatcast crate.
//!
//! - [`SiteConfig`] / [`SiteHandlersConfig`] - per-site automation and extraction rules
//! - [`Step`] - one declarative automation instruction
//! - [`ConversationData`] - messages extracted from a site frame
//! - [`HistoryEntry`] / [`ExportHistoryEntry`] - persisted records
//! - [`RuntimeCommand`] / [`WindowMessage`] - the two message planes
//! - [`matches_host`] - subdomain tolerant host comparison used for frame targeting

pub mod conversation;
pub mod error;
pub mod float;
pub mod history;
pub mod host;
pub mod message;
pub mod settings;
pub mod site;

pub use conversation::{ConversationData, ConversationMessage, Role, SiteConversation, ThinkingBlock};
pub use error::ProtocolError;
pub use float::FloatState;
pub use history::{ExportHistoryEntry, ExportType, HistoryEntry, SiteResult, ALL_SITES};
pub use host::{host_of, matches_host, normalize_hostname, url_matches_host};
pub use message::{
    CommandResponse, FilePayload, FrameStatus, QueryPhase, RuntimeCommand, WindowMessage,
    FRAME_SITE_MISMATCH,
};
pub use settings::{GridLayout, PromptTemplate, UserSettings};
pub use site::{
    ContentExtractorConfig, HistoryHandler, InputType, SelectorList, SiteConfig,
    SiteHandlersConfig, Step, StepAction, StepHandler, UrlExtractor, UserPromptButton,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_INTERVAL_MS,
};
