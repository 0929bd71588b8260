//! Opening and driving the batch tab.

use std::sync::Arc;
use std::time::Duration;

use chatcast_protocols::SiteHandlersConfig;
use chatcast_router::WindowHost;
use tracing::{debug, info};

use super::{BrowserError, BrowserManager};
use crate::guard::guard_tab;
use crate::tabs::{CdpTabs, CdpWindowHost, FrameRegistry};

const READY_POLL: Duration = Duration::from_millis(500);

/// What to do when the batch page is already open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Focus it and leave its frames alone.
    Reuse,
    /// Navigate it to the new page URL.
    Reload,
}

/// The batch tab with both message planes wired to it.
pub struct BatchTab {
    tab_id: String,
    registry: Arc<FrameRegistry>,
    tabs: Arc<CdpTabs>,
    host: Arc<CdpWindowHost>,
}

impl BatchTab {
    fn new(tab_id: String, registry: Arc<FrameRegistry>) -> Self {
        Self {
            tabs: Arc::new(CdpTabs::new(registry.clone())),
            host: Arc::new(CdpWindowHost::new(registry.clone(), tab_id.clone())),
            tab_id,
            registry,
        }
    }

    pub fn tab_id(&self) -> &str {
        &self.tab_id
    }

    pub fn registry(&self) -> &Arc<FrameRegistry> {
        &self.registry
    }

    /// Runtime plane.
    pub fn tabs(&self) -> Arc<CdpTabs> {
        self.tabs.clone()
    }

    /// Window plane.
    pub fn host(&self) -> Arc<CdpWindowHost> {
        self.host.clone()
    }

    /// Wait until the page hosts at least `expected` site frames.
    pub async fn wait_ready(&self, expected: usize, timeout: Duration) -> Result<usize, BrowserError> {
        let poll = async {
            loop {
                match self.host.iframes().await {
                    Ok(frames) if frames.len() >= expected => return frames.len(),
                    Ok(frames) => debug!(loaded = frames.len(), expected, "waiting for site frames"),
                    Err(e) => debug!("batch page not readable yet: {}", e),
                }
                tokio::time::sleep(READY_POLL).await;
            }
        };
        tokio::time::timeout(timeout, poll).await.map_err(|_| {
            BrowserError::BatchNotReady(format!("fewer than {} site frames after {:?}", expected, timeout))
        })
    }
}

impl BrowserManager {
    /// Open the batch page at `page_url`, or focus the tab already showing it.
    pub async fn open_batch(
        &self,
        page_url: &str,
        catalog: Arc<SiteHandlersConfig>,
        bridge_timeout: Duration,
        file_focus: Duration,
        mode: OpenMode,
    ) -> Result<BatchTab, BrowserError> {
        self.ensure_connected().await?;
        let client = self.client().await?;
        let registry = Arc::new(
            FrameRegistry::new(client.clone(), catalog).with_timeouts(bridge_timeout, file_focus),
        );

        let base = page_url.split('#').next().unwrap_or(page_url);
        let existing = client
            .get_targets()
            .await?
            .into_iter()
            .find(|t| t.is_page() && t.url.starts_with(base));

        let (tab_id, navigate) = match existing {
            Some(tab) => {
                client.activate_target(&tab.target_id).await?;
                (tab.target_id, mode == OpenMode::Reload)
            }
            None => (client.create_target("about:blank", false).await?, true),
        };

        let session = guard_tab(&registry, &tab_id).await?;
        if navigate {
            session.navigate(page_url).await?;
        }
        info!(tab = %tab_id, navigated = navigate, "batch tab open");
        Ok(BatchTab::new(tab_id, registry))
    }
}
