//! Browser-facing seams of the two message planes.
//!
//! The runtime plane reaches frames through [`FrameTabs`]; the window plane
//! posts into the batch page's iframes through [`WindowHost`] and hears back on
//! a [`WindowBus`].

use async_trait::async_trait;
use chatcast_protocols::{url_matches_host, CommandResponse, FloatState, RuntimeCommand, WindowMessage};
use tokio::sync::broadcast;
use tracing::trace;

use crate::error::RouteError;

const BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabInfo {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    pub id: String,
    pub url: String,
    /// The tab's own document rather than an embedded frame.
    pub is_top: bool,
}

/// An `<iframe>` element of the batch page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IframeInfo {
    pub src: String,
    /// Frame the element hosts; posts are delivered here.
    pub frame_id: String,
}

/// Tabs, frames and runtime-plane delivery.
#[async_trait]
pub trait FrameTabs: Send + Sync {
    async fn tabs(&self) -> Result<Vec<TabInfo>, RouteError>;

    async fn frames(&self, tab_id: &str) -> Result<Vec<FrameInfo>, RouteError>;

    /// Hand `command` to the agent running in `frame_id`.
    async fn deliver(
        &self,
        tab_id: &str,
        frame_id: &str,
        command: &RuntimeCommand,
    ) -> Result<CommandResponse, RouteError>;

    async fn tab(&self, tab_id: &str) -> Result<Option<TabInfo>, RouteError> {
        Ok(self.tabs().await?.into_iter().find(|t| t.id == tab_id))
    }

    /// Move `tab_id` into a window of its own.
    async fn detach_tab(&self, tab_id: &str) -> Result<FloatState, RouteError> {
        Err(RouteError::Unsupported(format!("detaching tab {}", tab_id)))
    }
}

/// The batch page, as seen by code running in it.
#[async_trait]
pub trait WindowHost: Send + Sync {
    async fn iframes(&self) -> Result<Vec<IframeInfo>, RouteError>;

    /// `postMessage` into the frame; replies arrive on [`WindowHost::bus`].
    async fn post(&self, frame_id: &str, message: WindowMessage) -> Result<(), RouteError>;

    fn bus(&self) -> &WindowBus;

    /// First iframe whose `src` belongs to `site_url`.
    async fn iframe_for(&self, site_url: &str) -> Result<Option<IframeInfo>, RouteError> {
        Ok(self
            .iframes()
            .await?
            .into_iter()
            .find(|f| url_matches_host(&f.src, site_url)))
    }
}

/// Messages posted back to the batch page.
#[derive(Clone)]
pub struct WindowBus {
    tx: broadcast::Sender<WindowMessage>,
}

impl WindowBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, message: WindowMessage) {
        trace!(site = message.site_name(), "window bus message");
        // Nobody listening is fine.
        let _ = self.tx.send(message);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WindowMessage> {
        self.tx.subscribe()
    }
}

impl Default for WindowBus {
    fn default() -> Self {
        Self::new()
    }
}
