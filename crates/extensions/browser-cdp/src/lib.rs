//! Live browser transport for chatcast.
//!
//! ```text
//! ┌──────────────────┐    WebSocket     ┌──────────────────────────────┐
//! │  chatcast        │ ◄──────────────► │  Chrome: batch tab           │
//! │  (this crate)    │       CDP        │   ├─ iframe chatgpt.com      │
//! └──────────────────┘                  │   ├─ iframe gemini.google... │
//!                                       │   └─ ...                     │
//!                                       └──────────────────────────────┘
//! ```
//!
//! - [`BrowserManager`] - attach to or launch Chrome, open the batch tab
//! - [`CdpFrame`] - a [`FrameDriver`](chatcast_automation::FrameDriver) running
//!   automation in an isolated world of one site frame
//! - [`CdpTabs`] / [`CdpWindowHost`] - the runtime and window message planes
//! - frame guard - keeps site pages frameable (main-world script plus
//!   response header filtering)
//!
//! Start Chrome with remote debugging to reuse an existing profile:
//!
//! ```bash
//! google-chrome --remote-debugging-port=9222
//! ```

#![recursion_limit = "256"]

pub mod cdp;
mod frame;
mod guard;
pub mod headers;
pub mod manager;
mod scripts;
pub mod snapshot;
mod tabs;

pub use cdp::{CdpClient, CdpError, PageSession};
pub use frame::CdpFrame;
pub use guard::guard_tab;
pub use headers::strip_frame_headers;
pub use manager::{BatchTab, BrowserError, BrowserManager, BrowserManagerConfig, OpenMode};
pub use tabs::{CdpTabs, CdpWindowHost, FrameRegistry};
