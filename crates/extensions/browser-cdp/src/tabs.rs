//! Both message planes over a live browser.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chatcast_protocols::{CommandResponse, FloatState, RuntimeCommand, SiteHandlersConfig, WindowMessage};
use chatcast_router::{
    FrameAgent, FrameInfo, FrameTabs, IframeInfo, RouteError, TabInfo, WindowBus, WindowHost,
};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::cdp::{CdpClient, CdpError, PageSession};
use crate::frame::CdpFrame;
use crate::guard::guard_tab;
use crate::snapshot::iframe_owners;

/// Sessions and frame agents of one browser connection.
pub struct FrameRegistry {
    client: Arc<CdpClient>,
    catalog: Arc<SiteHandlersConfig>,
    bridge_timeout: Option<Duration>,
    file_focus: Option<Duration>,
    /// By target id.
    sessions: RwLock<HashMap<String, Arc<PageSession>>>,
    /// Out-of-process iframe target → tab it was attached under.
    owners: RwLock<HashMap<String, String>>,
    /// By frame id.
    agents: RwLock<HashMap<String, Arc<FrameAgent>>>,
}

impl FrameRegistry {
    pub fn new(client: Arc<CdpClient>, catalog: Arc<SiteHandlersConfig>) -> Self {
        Self {
            client,
            catalog,
            bridge_timeout: None,
            file_focus: None,
            sessions: RwLock::new(HashMap::new()),
            owners: RwLock::new(HashMap::new()),
            agents: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_timeouts(mut self, bridge: Duration, file_focus: Duration) -> Self {
        self.bridge_timeout = Some(bridge);
        self.file_focus = Some(file_focus);
        self
    }

    pub fn client(&self) -> &Arc<CdpClient> {
        &self.client
    }

    /// Session for `target_id`, attaching on first use.
    pub async fn session(&self, target_id: &str) -> Result<Arc<PageSession>, CdpError> {
        if let Some(session) = self.sessions.read().get(target_id).cloned() {
            return Ok(session);
        }
        let session = Arc::new(self.client.attach(target_id).await?);
        session.enable_domains().await?;
        let session = self
            .sessions
            .write()
            .entry(target_id.to_string())
            .or_insert(session)
            .clone();
        Ok(session)
    }

    /// Record a session the browser attached for an iframe of `tab_id`.
    pub fn adopt(&self, tab_id: &str, session: Arc<PageSession>) {
        let target = session.target_id().to_string();
        debug!(tab = tab_id, frame = %target, "iframe target adopted");
        self.owners.write().insert(target.clone(), tab_id.to_string());
        self.agents.write().remove(&target);
        self.sessions.write().insert(target, session);
    }

    /// Drop everything known about a target that went away.
    pub fn forget(&self, target_id: &str) {
        if let Some(session) = self.sessions.write().remove(target_id) {
            session.detach_events();
        }
        self.owners.write().remove(target_id);
        self.agents.write().remove(target_id);
    }

    /// Out-of-process iframe targets attached under `tab_id`.
    pub fn iframe_targets(&self, tab_id: &str) -> Vec<String> {
        self.owners
            .read()
            .iter()
            .filter(|(_, owner)| owner.as_str() == tab_id)
            .map(|(target, _)| target.clone())
            .collect()
    }

    /// Agent for `frame_id`, a frame of `tab_id`.
    pub async fn agent(&self, tab_id: &str, frame_id: &str) -> Result<Arc<FrameAgent>, CdpError> {
        if let Some(agent) = self.agents.read().get(frame_id).cloned() {
            return Ok(agent);
        }
        let own = self.sessions.read().get(frame_id).cloned();
        let session = match own {
            Some(session) => session,
            None => self.session(tab_id).await?,
        };
        let frame = Arc::new(CdpFrame::new(session, frame_id));
        let mut agent = FrameAgent::new(frame, self.catalog.clone());
        if let Some(timeout) = self.bridge_timeout {
            agent = agent.with_bridge_timeout(timeout);
        }
        if let Some(pause) = self.file_focus {
            agent = agent.with_file_focus(pause);
        }
        let agent = Arc::new(agent);
        self.agents
            .write()
            .insert(frame_id.to_string(), agent.clone());
        Ok(agent)
    }
}

/// Runtime plane: browser tabs and their frames.
pub struct CdpTabs {
    registry: Arc<FrameRegistry>,
}

impl CdpTabs {
    pub fn new(registry: Arc<FrameRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl FrameTabs for CdpTabs {
    async fn tabs(&self) -> Result<Vec<TabInfo>, RouteError> {
        let targets = self.registry.client().get_targets().await?;
        Ok(targets
            .into_iter()
            .filter(|t| t.is_page())
            .map(|t| TabInfo {
                id: t.target_id,
                url: t.url,
            })
            .collect())
    }

    async fn frames(&self, tab_id: &str) -> Result<Vec<FrameInfo>, RouteError> {
        let session = self.registry.session(tab_id).await?;
        let mut frames: Vec<FrameInfo> = session
            .frame_tree()
            .await?
            .flatten()
            .into_iter()
            .map(|f| FrameInfo {
                is_top: f.parent_id.is_none(),
                id: f.id,
                url: f.url,
            })
            .collect();

        let remote = self.registry.iframe_targets(tab_id);
        if !remote.is_empty() {
            for target in self.registry.client().get_targets().await? {
                if target.is_iframe()
                    && remote.contains(&target.target_id)
                    && frames.iter().all(|f| f.id != target.target_id)
                {
                    frames.push(FrameInfo {
                        id: target.target_id,
                        url: target.url,
                        is_top: false,
                    });
                }
            }
        }
        Ok(frames)
    }

    async fn deliver(
        &self,
        tab_id: &str,
        frame_id: &str,
        command: &RuntimeCommand,
    ) -> Result<CommandResponse, RouteError> {
        let agent = self.registry.agent(tab_id, frame_id).await?;
        Ok(agent.handle_runtime(command).await)
    }

    /// Reopen the tab's page in a window of its own and close the original.
    async fn detach_tab(&self, tab_id: &str) -> Result<FloatState, RouteError> {
        let client = self.registry.client();
        let tab = self
            .tab(tab_id)
            .await?
            .ok_or_else(|| RouteError::Transport(format!("No tab with id: {}", tab_id)))?;
        let original_window = client.window_for_target(tab_id).await?;

        let floating = client.create_target("about:blank", true).await?;
        let session = guard_tab(&self.registry, &floating).await?;
        session.navigate(&tab.url).await?;
        let window = client.window_for_target(&floating).await?;

        client.close_target(tab_id).await?;
        self.registry.forget(tab_id);
        info!(tab = %floating, window, "batch tab detached");
        Ok(FloatState::new(&floating, window, original_window))
    }
}

/// Window plane: the batch page's iframes.
pub struct CdpWindowHost {
    registry: Arc<FrameRegistry>,
    tab_id: String,
    bus: WindowBus,
}

impl CdpWindowHost {
    pub fn new(registry: Arc<FrameRegistry>, tab_id: impl Into<String>) -> Self {
        Self {
            registry,
            tab_id: tab_id.into(),
            bus: WindowBus::new(),
        }
    }

    pub fn tab_id(&self) -> &str {
        &self.tab_id
    }
}

#[async_trait]
impl WindowHost for CdpWindowHost {
    async fn iframes(&self) -> Result<Vec<IframeInfo>, RouteError> {
        let session = self.registry.session(&self.tab_id).await?;
        let root = session.get_document().await?;
        Ok(iframe_owners(&root))
    }

    async fn post(&self, frame_id: &str, message: WindowMessage) -> Result<(), RouteError> {
        let agent = self.registry.agent(&self.tab_id, frame_id).await?;
        let bus = self.bus.clone();
        tokio::spawn(async move {
            if let Some(reply) = agent.handle_window(message).await {
                bus.publish(reply);
            }
        });
        Ok(())
    }

    fn bus(&self) -> &WindowBus {
        &self.bus
    }
}
