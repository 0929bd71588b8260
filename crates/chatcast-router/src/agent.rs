//! Frame-side command handlers.
//!
//! One [`FrameAgent`] runs per site frame. Runtime-plane handlers first check
//! that the frame actually belongs to the addressed site and answer
//! `FRAME_SITE_MISMATCH` otherwise, which lets the router broadcast to every
//! frame and keep the first real answer. Window-plane handlers trust the
//! caller's iframe targeting.

use std::sync::Arc;
use std::time::Duration;

use chatcast_automation::{DispatchTarget, DriverError, FrameDriver, StepInterpreter, SyntheticEvent};
use chatcast_content::extract;
use chatcast_dom::find;
use chatcast_protocols::{
    url_matches_host, CommandResponse, ContentExtractorConfig, FilePayload, FrameStatus, RuntimeCommand, SelectorList,
    SiteConfig, SiteHandlersConfig, Step, WindowMessage,
};
use tracing::{debug, error, warn};

use crate::error::RouteError;

const DEFAULT_BRIDGE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_FILE_FOCUS: Duration = Duration::from_millis(200);

pub struct FrameAgent {
    driver: Arc<dyn FrameDriver>,
    catalog: Arc<SiteHandlersConfig>,
    bridge_timeout: Duration,
    file_focus: Duration,
}

impl FrameAgent {
    pub fn new(driver: Arc<dyn FrameDriver>, catalog: Arc<SiteHandlersConfig>) -> Self {
        Self {
            driver,
            catalog,
            bridge_timeout: DEFAULT_BRIDGE_TIMEOUT,
            file_focus: DEFAULT_FILE_FOCUS,
        }
    }

    pub fn with_bridge_timeout(mut self, timeout: Duration) -> Self {
        self.bridge_timeout = timeout;
        self
    }

    pub fn with_file_focus(mut self, pause: Duration) -> Self {
        self.file_focus = pause;
        self
    }

    pub fn driver(&self) -> &Arc<dyn FrameDriver> {
        &self.driver
    }

    async fn run_steps(&self, steps: &[Step], payload: &str) -> bool {
        StepInterpreter::new(self.driver.as_ref())
            .with_bridge_timeout(self.bridge_timeout)
            .run(steps, payload)
            .await
    }

    /// The addressed site, if this frame is showing it.
    async fn resolve_site(&self, site_name: &str) -> Result<&SiteConfig, CommandResponse> {
        let Some(site) = self.catalog.find(site_name) else {
            return Err(CommandResponse::fail(format!("Site {} not found", site_name)));
        };
        let location = self
            .driver
            .location()
            .await
            .map_err(|e| CommandResponse::fail(e.to_string()))?;
        if !url_matches_host(&location, &site.url) {
            return Err(CommandResponse::mismatch());
        }
        Ok(site)
    }

    /// Runtime plane: `INJECT_QUERY`, `INJECT_FILE` and `EXTRACT_CONTENT`.
    pub async fn handle_runtime(&self, command: &RuntimeCommand) -> CommandResponse {
        match command {
            RuntimeCommand::InjectQuery { site_name, query } => {
                let site = match self.resolve_site(site_name).await {
                    Ok(site) => site,
                    Err(response) => return response,
                };
                if self.run_steps(&site.search_handler.steps, query).await {
                    CommandResponse::ok()
                } else {
                    CommandResponse::fail("Failed to execute search steps")
                }
            }
            RuntimeCommand::InjectFile {
                site_name,
                file_data,
                files,
            } => {
                let site = match self.resolve_site(site_name).await {
                    Ok(site) => site,
                    Err(response) => return response,
                };
                let Some(handler) = site.file_upload_handler.as_ref() else {
                    return CommandResponse::fail(format!("Site {} file handler not found", site_name));
                };
                let payload = file_data.as_deref().unwrap_or("");
                if !self.run_steps(&handler.steps, payload).await {
                    return CommandResponse::fail("Failed to execute file steps");
                }
                if !files.is_empty() {
                    let focus = handler.steps.iter().find_map(|s| s.selector.as_ref());
                    if let Err(e) = self.paste_files(focus, files).await {
                        return CommandResponse::fail(e.to_string());
                    }
                }
                CommandResponse::ok()
            }
            RuntimeCommand::ExtractContent { site_name } => {
                let site = match self.resolve_site(site_name).await {
                    Ok(site) => site,
                    Err(response) => return response,
                };
                let Some(extractor) = site.content_extractor.as_ref() else {
                    return CommandResponse::fail(format!(
                        "Site {} content extractor not found",
                        site_name
                    ));
                };
                match self.extract_value(extractor).await {
                    Ok(data) => CommandResponse::ok_with(data),
                    Err(e) => CommandResponse::fail(e.to_string()),
                }
            }
            other => CommandResponse::fail(format!("Invalid message type {}", other.kind())),
        }
    }

    async fn extract_value(
        &self,
        extractor: &ContentExtractorConfig,
    ) -> Result<serde_json::Value, RouteError> {
        let doc = self.driver.snapshot().await?;
        let data = extract(&doc, extractor).map_err(DriverError::from)?;
        Ok(serde_json::to_value(data)?)
    }

    /// Window plane: answer a message posted into this frame, if it warrants one.
    pub async fn handle_window(&self, message: WindowMessage) -> Option<WindowMessage> {
        match message {
            WindowMessage::InjectQueryViaPost {
                site_name,
                query,
                search_handler,
            } => {
                let ok = !query.is_empty()
                    && !search_handler.steps.is_empty()
                    && self.run_steps(&search_handler.steps, &query).await;
                Some(WindowMessage::QueryStatus {
                    site_name,
                    status: if ok { FrameStatus::Done } else { FrameStatus::Error },
                })
            }
            WindowMessage::InjectFileViaPost {
                site_name,
                files,
                focus_selector,
            } => {
                let status = if files.is_empty() {
                    FrameStatus::Error
                } else {
                    match self.paste_files(focus_selector.as_ref(), &files).await {
                        Ok(()) => FrameStatus::Done,
                        Err(e) => {
                            error!(site = %site_name, error = %e, "file paste failed");
                            FrameStatus::Error
                        }
                    }
                };
                Some(WindowMessage::FileUploadStatus { site_name, status })
            }
            WindowMessage::GetUrlViaPost { site_name } => match self.driver.location().await {
                Ok(url) => Some(WindowMessage::CurrentUrl { site_name, url }),
                Err(e) => {
                    warn!(site = %site_name, error = %e, "frame location unavailable");
                    None
                }
            },
            WindowMessage::ExtractContentViaPost {
                site_name,
                content_extractor,
            } => {
                let doc = match self.driver.snapshot().await {
                    Ok(doc) => doc,
                    Err(e) => {
                        error!(site = %site_name, error = %e, "snapshot failed");
                        return None;
                    }
                };
                match extract(&doc, &content_extractor) {
                    Ok(data) => Some(WindowMessage::ExtractedContent {
                        site_name,
                        success: true,
                        data: Some(data),
                    }),
                    Err(e) => {
                        error!(site = %site_name, error = %e, "extraction failed");
                        None
                    }
                }
            }
            reply => {
                debug!(site = reply.site_name(), "ignoring reply posted into a site frame");
                None
            }
        }
    }

    /// Focus the drop target (when one resolves), pause, then paste `files`.
    async fn paste_files(
        &self,
        focus: Option<&SelectorList>,
        files: &[FilePayload],
    ) -> Result<(), RouteError> {
        let mut target = DispatchTarget::ActiveElement;
        if let Some(selector) = focus {
            let doc = self.driver.snapshot().await?;
            let found = find(&doc, selector, doc.root()).map_err(DriverError::from)?;
            if let Some(node) = found {
                let element = doc.element_ref(node);
                self.driver.focus(&element).await?;
                tokio::time::sleep(self.file_focus).await;
                target = DispatchTarget::Element(element);
            }
        }
        let event = SyntheticEvent::PasteFiles {
            files: files.to_vec(),
        };
        self.driver.dispatch(&target, &event).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
