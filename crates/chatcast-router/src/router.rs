//! Runtime-plane routing from the background to site frames.
//!
//! A frame-bound command first goes to the frame whose URL matches the site.
//! When that does not succeed it is broadcast to every embedded frame of the
//! batch tab; frames showing another site answer `FRAME_SITE_MISMATCH` and
//! are ignored, the first success wins.

use std::sync::Arc;

use chatcast_protocols::{url_matches_host, CommandResponse, RuntimeCommand, SiteHandlersConfig};
use chatcast_store::FloatStateStore;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::error::RouteError;
use crate::transport::{FrameInfo, FrameTabs, TabInfo};

pub struct RuntimeRouter {
    tabs: Arc<dyn FrameTabs>,
    floats: Arc<FloatStateStore>,
    catalog: Arc<SiteHandlersConfig>,
    batch_url: String,
}

impl RuntimeRouter {
    pub fn new(
        tabs: Arc<dyn FrameTabs>,
        floats: Arc<FloatStateStore>,
        catalog: Arc<SiteHandlersConfig>,
        batch_url: impl Into<String>,
    ) -> Self {
        Self {
            tabs,
            floats,
            catalog,
            batch_url: batch_url.into(),
        }
    }

    pub fn tabs(&self) -> &Arc<dyn FrameTabs> {
        &self.tabs
    }

    pub fn batch_url(&self) -> &str {
        &self.batch_url
    }

    /// The tab hosting the batch page. A floating tab that still exists is
    /// preferred; a stale float state is cleared.
    pub async fn find_batch_tab(&self) -> Result<TabInfo, RouteError> {
        if let Some(float) = self.floats.get().await? {
            if float.active {
                match self.tabs.tab(&float.tab_id).await? {
                    Some(tab) => return Ok(tab),
                    None => {
                        info!(tab = %float.tab_id, "floating batch tab is gone");
                        self.floats.clear().await?;
                    }
                }
            }
        }
        self.tabs
            .tabs()
            .await?
            .into_iter()
            .find(|t| t.url.starts_with(&self.batch_url))
            .ok_or(RouteError::NoBatchTab)
    }

    /// Deliver a frame-bound command and return the winning response.
    pub async fn route(&self, command: &RuntimeCommand) -> Result<CommandResponse, RouteError> {
        let Some(site_name) = command.frame_target() else {
            return Err(RouteError::Unsupported(format!(
                "{} is not routed to frames",
                command.kind()
            )));
        };
        let site = self
            .catalog
            .find(site_name)
            .ok_or_else(|| RouteError::UnknownSite(site_name.to_string()))?;

        let tab = self.find_batch_tab().await?;
        let frames: Vec<FrameInfo> = self
            .tabs
            .frames(&tab.id)
            .await?
            .into_iter()
            .filter(|f| !f.is_top)
            .collect();
        if frames.is_empty() {
            return Err(RouteError::NoFrames);
        }

        let mut last_error = None;
        if let Some(frame) = frames.iter().find(|f| url_matches_host(&f.url, &site.url)) {
            debug!(site = site_name, frame = %frame.id, "direct delivery");
            match self.tabs.deliver(&tab.id, &frame.id, command).await {
                Ok(response) if response.success => return Ok(response),
                Ok(response) if response.is_mismatch() => {}
                Ok(response) => last_error = response.error,
                Err(e) => last_error = Some(e.to_string()),
            }
        }

        debug!(site = site_name, frames = frames.len(), "broadcasting to all frames");
        let replies = join_all(
            frames
                .iter()
                .map(|f| self.tabs.deliver(&tab.id, &f.id, command)),
        )
        .await;
        for reply in replies {
            match reply {
                Ok(response) if response.success => return Ok(response),
                Ok(response) if response.is_mismatch() => {}
                Ok(response) => last_error = response.error.or(last_error),
                Err(e) => last_error = Some(e.to_string()),
            }
        }

        let error = last_error.unwrap_or_else(|| format!("No frame handled {} for {}", command.kind(), site_name));
        warn!(site = site_name, "routing failed: {}", error);
        Ok(CommandResponse::fail(error))
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
