//! In-process transports wired straight to [`FrameAgent`]s.
//!
//! Used for dry runs against saved pages and by the tests; the browser
//! transports live in the CDP extension.

use std::sync::Arc;

use async_trait::async_trait;
use chatcast_protocols::{CommandResponse, FloatState, RuntimeCommand, WindowMessage};
use parking_lot::{Mutex, RwLock};

use crate::agent::FrameAgent;
use crate::error::RouteError;
use crate::transport::{FrameInfo, FrameTabs, IframeInfo, TabInfo, WindowBus, WindowHost};

const NO_RECEIVER: &str = "Could not establish connection. Receiving end does not exist.";

struct LocalFrame {
    info: FrameInfo,
    agent: Option<Arc<FrameAgent>>,
}

struct LocalTab {
    info: TabInfo,
    frames: Vec<LocalFrame>,
}

/// Tabs and frames held in memory.
#[derive(Default)]
pub struct LocalTabs {
    tabs: RwLock<Vec<LocalTab>>,
    deliveries: Mutex<Vec<String>>,
    next_window: Mutex<i64>,
}

impl LocalTabs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tab with its top frame.
    pub fn add_tab(&self, id: &str, url: &str) {
        self.tabs.write().push(LocalTab {
            info: TabInfo {
                id: id.to_string(),
                url: url.to_string(),
            },
            frames: vec![LocalFrame {
                info: FrameInfo {
                    id: format!("{}:top", id),
                    url: url.to_string(),
                    is_top: true,
                },
                agent: None,
            }],
        });
    }

    /// Embed a frame at `url`; `agent` is None for frames without a content script.
    pub fn add_frame(&self, tab_id: &str, frame_id: &str, url: &str, agent: Option<Arc<FrameAgent>>) {
        let mut tabs = self.tabs.write();
        if let Some(tab) = tabs.iter_mut().find(|t| t.info.id == tab_id) {
            tab.frames.push(LocalFrame {
                info: FrameInfo {
                    id: frame_id.to_string(),
                    url: url.to_string(),
                    is_top: false,
                },
                agent,
            });
        }
    }

    pub fn remove_tab(&self, id: &str) {
        self.tabs.write().retain(|t| t.info.id != id);
    }

    /// Frame ids in delivery order.
    pub fn deliveries(&self) -> Vec<String> {
        self.deliveries.lock().clone()
    }
}

#[async_trait]
impl FrameTabs for LocalTabs {
    async fn tabs(&self) -> Result<Vec<TabInfo>, RouteError> {
        Ok(self.tabs.read().iter().map(|t| t.info.clone()).collect())
    }

    async fn frames(&self, tab_id: &str) -> Result<Vec<FrameInfo>, RouteError> {
        let tabs = self.tabs.read();
        let tab = tabs
            .iter()
            .find(|t| t.info.id == tab_id)
            .ok_or_else(|| RouteError::Transport(format!("No tab with id: {}", tab_id)))?;
        Ok(tab.frames.iter().map(|f| f.info.clone()).collect())
    }

    async fn deliver(
        &self,
        tab_id: &str,
        frame_id: &str,
        command: &RuntimeCommand,
    ) -> Result<CommandResponse, RouteError> {
        let agent = {
            let tabs = self.tabs.read();
            tabs.iter()
                .find(|t| t.info.id == tab_id)
                .and_then(|t| t.frames.iter().find(|f| f.info.id == frame_id))
                .and_then(|f| f.agent.clone())
        };
        self.deliveries.lock().push(frame_id.to_string());
        match agent {
            Some(agent) => Ok(agent.handle_runtime(command).await),
            None => Err(RouteError::Transport(NO_RECEIVER.to_string())),
        }
    }

    async fn detach_tab(&self, tab_id: &str) -> Result<FloatState, RouteError> {
        if self.tabs.read().iter().all(|t| t.info.id != tab_id) {
            return Err(RouteError::Transport(format!("No tab with id: {}", tab_id)));
        }
        let mut next = self.next_window.lock();
        *next += 1;
        Ok(FloatState::new(tab_id, *next + 1, 1))
    }
}

/// A batch page whose iframes are local agents.
#[derive(Default)]
pub struct LocalWindowHost {
    iframes: RwLock<Vec<(IframeInfo, Arc<FrameAgent>)>>,
    bus: WindowBus,
    posts: Mutex<Vec<WindowMessage>>,
}

impl LocalWindowHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_iframe(&self, frame_id: &str, src: &str, agent: Arc<FrameAgent>) {
        self.iframes.write().push((
            IframeInfo {
                src: src.to_string(),
                frame_id: frame_id.to_string(),
            },
            agent,
        ));
    }

    /// Everything posted so far.
    pub fn posts(&self) -> Vec<WindowMessage> {
        self.posts.lock().clone()
    }
}

#[async_trait]
impl WindowHost for LocalWindowHost {
    async fn iframes(&self) -> Result<Vec<IframeInfo>, RouteError> {
        Ok(self.iframes.read().iter().map(|(info, _)| info.clone()).collect())
    }

    async fn post(&self, frame_id: &str, message: WindowMessage) -> Result<(), RouteError> {
        let agent = self
            .iframes
            .read()
            .iter()
            .find(|(info, _)| info.frame_id == frame_id)
            .map(|(_, agent)| agent.clone())
            .ok_or_else(|| RouteError::Transport(format!("No iframe {}", frame_id)))?;
        self.posts.lock().push(message.clone());
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
