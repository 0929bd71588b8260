//! Chrome DevTools Protocol (CDP) client.
//!
//! One WebSocket to the browser; tabs and out-of-process iframes are reached
//! through flattened sessions multiplexed on it.
//!
//! ```rust,ignore
//! let client = CdpClient::connect("http://localhost:9222").await?;
//! let session = client.attach(&target_id).await?;
//! let root = session.get_document().await?;
//! ```

mod client;
mod error;
mod protocol;
mod session;

pub use client::{discover, list_pages, CdpClient};
pub use error::CdpError;
pub use protocol::*;
pub use session::PageSession;
