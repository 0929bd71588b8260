//! # chatcast router
//!
//! Gets commands from the batch page to the site frames and back.
//!
//! - [`FrameAgent`] - frame-side handlers for both message planes
//! - [`RuntimeRouter`] / [`CommandHandler`] - background routing of runtime commands
//! - [`SiteMessenger`] - window plane first, runtime plane as fallback
//! - [`Broadcaster`] - staggered multi-site send with history and URL capture
//! - [`ShareService`] - conversation export as Markdown
//! - [`render_batch_page`] - the iframe grid itself

pub mod agent;
pub mod background;
pub mod broadcast;
pub mod capture;
pub mod error;
pub mod local;
pub mod messenger;
pub mod page;
pub mod router;
pub mod share;
pub mod status;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use agent::FrameAgent;
pub use background::CommandHandler;
pub use broadcast::{BroadcastReport, Broadcaster, Pacing, SendOutcome};
pub use capture::{start_capture, CaptureHandle, CaptureSlot, CaptureTarget};
pub use error::RouteError;
pub use local::{LocalTabs, LocalWindowHost};
pub use messenger::SiteMessenger;
pub use page::{batch_page_url, query_from_url, render_batch_page};
pub use router::RuntimeRouter;
pub use share::{ShareService, SharedConversation};
pub use status::{SiteState, SiteStatus, StatusBoard};
pub use transport::{FrameInfo, FrameTabs, IframeInfo, TabInfo, WindowBus, WindowHost};
