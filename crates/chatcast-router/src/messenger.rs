//! "Send command to site" as seen from the batch page.
//!
//! The window plane is tried first: subscribe to the bus, post into the
//! site's iframe, wait for the matching reply. The runtime plane is used only
//! when no iframe matches the site or the post itself fails. A reply timeout
//! is reported as such and never retried on the other plane, since the frame
//! may already have acted on the message.

use std::sync::Arc;
use std::time::Duration;

use chatcast_protocols::{
    CommandResponse, ConversationData, FilePayload, FrameStatus, RuntimeCommand, SiteConfig,
    WindowMessage,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::background::CommandHandler;
use crate::error::RouteError;
use crate::transport::WindowHost;

const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_INJECT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SiteMessenger {
    host: Arc<dyn WindowHost>,
    fallback: Option<Arc<CommandHandler>>,
    reply_timeout: Duration,
    inject_timeout: Duration,
}

impl SiteMessenger {
    pub fn new(host: Arc<dyn WindowHost>) -> Self {
        Self {
            host,
            fallback: None,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            inject_timeout: DEFAULT_INJECT_TIMEOUT,
        }
    }

    pub fn with_runtime_fallback(mut self, handler: Arc<CommandHandler>) -> Self {
        self.fallback = Some(handler);
        self
    }

    pub fn with_timeouts(mut self, reply: Duration, inject: Duration) -> Self {
        self.reply_timeout = reply;
        self.inject_timeout = inject;
        self
    }

    pub fn host(&self) -> &Arc<dyn WindowHost> {
        &self.host
    }

    /// Post `message` to the site's iframe and wait for the first reply `accept`s.
    /// `Ok(None)` means the window plane could not be used.
    async fn request(
        &self,
        site: &SiteConfig,
        message: WindowMessage,
        timeout: Duration,
        accept: impl Fn(&WindowMessage) -> bool,
    ) -> Result<Option<WindowMessage>, RouteError> {
        let iframe = match self.host.iframe_for(&site.url).await {
            Ok(Some(iframe)) => iframe,
            Ok(None) => {
                debug!(site = %site.name, "no iframe for site");
                return Ok(None);
            }
            Err(e) => {
                warn!(site = %site.name, error = %e, "iframe lookup failed");
                return Ok(None);
            }
        };

        let mut rx = self.host.bus().subscribe();
        if let Err(e) = self.host.post(&iframe.frame_id, message).await {
            warn!(site = %site.name, error = %e, "post failed");
            return Ok(None);
        }

        let wait = async {
            loop {
                match rx.recv().await {
                    Ok(reply) if reply.site_name() == site.name && accept(&reply) => return Some(reply),
                    Ok(_) | Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => return None,
                }
            }
        };
        match tokio::time::timeout(timeout, wait).await {
            Ok(Some(reply)) => Ok(Some(reply)),
            Ok(None) => Err(RouteError::Transport("window bus closed".into())),
            Err(_) => Err(RouteError::Timeout(format!("{} reply", site.name))),
        }
    }

    async fn runtime(&self, command: RuntimeCommand) -> Result<CommandResponse, RouteError> {
        match &self.fallback {
            Some(handler) => Ok(handler.handle(&command).await),
            None => Err(RouteError::Unsupported(format!(
                "no frame reachable for {}",
                command.kind()
            ))),
        }
    }

    /// Run the site's search steps with `query`.
    pub async fn inject_query(&self, site: &SiteConfig, query: &str) -> Result<(), RouteError> {
        let message = WindowMessage::InjectQueryViaPost {
            site_name: site.name.clone(),
            query: query.to_string(),
            search_handler: site.search_handler.clone(),
        };
        let reply = self
            .request(site, message, self.inject_timeout, |m| {
                matches!(m, WindowMessage::QueryStatus { .. })
            })
            .await?;
        match reply {
            Some(WindowMessage::QueryStatus {
                status: FrameStatus::Done,
                ..
            }) => Ok(()),
            Some(_) => Err(RouteError::Failed("Failed to execute search steps".into())),
            None => {
                let response = self
                    .runtime(RuntimeCommand::InjectQuery {
                        site_name: site.name.clone(),
                        query: query.to_string(),
                    })
                    .await?;
                into_result(response).map(|_| ())
            }
        }
    }

    /// Paste `files` into the site's composer.
    pub async fn upload(&self, site: &SiteConfig, files: Vec<FilePayload>) -> Result<(), RouteError> {
        let focus_selector = site
            .file_upload_handler
            .as_ref()
            .and_then(|h| h.steps.iter().find_map(|s| s.selector.clone()));
        let message = WindowMessage::InjectFileViaPost {
            site_name: site.name.clone(),
            files: files.clone(),
            focus_selector,
        };
        let reply = self
            .request(site, message, self.inject_timeout, |m| {
                matches!(m, WindowMessage::FileUploadStatus { .. })
            })
            .await?;
        match reply {
            Some(WindowMessage::FileUploadStatus {
                status: FrameStatus::Done,
                ..
            }) => Ok(()),
            Some(_) => Err(RouteError::Failed("Failed to execute file steps".into())),
            None => {
                let response = self
                    .runtime(RuntimeCommand::InjectFile {
                        site_name: site.name.clone(),
                        file_data: None,
                        files,
                    })
                    .await?;
                into_result(response).map(|_| ())
            }
        }
    }

    /// The site's conversation; `None` when the site has no extractor, the
    /// frame did not answer in time, or extraction failed.
    pub async fn extract(&self, site: &SiteConfig) -> Result<Option<ConversationData>, RouteError> {
        let Some(extractor) = site.content_extractor.clone() else {
            return Ok(None);
        };
        let message = WindowMessage::ExtractContentViaPost {
            site_name: site.name.clone(),
            content_extractor: extractor,
        };
        let reply = match self
            .request(site, message, self.reply_timeout, |m| {
                matches!(m, WindowMessage::ExtractedContent { .. })
            })
            .await
        {
            Ok(reply) => reply,
            Err(RouteError::Timeout(what)) => {
                warn!(site = %site.name, "no extraction reply: timed out waiting for {}", what);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        match reply {
            Some(WindowMessage::ExtractedContent { success, data, .. }) => {
                Ok(if success { data } else { None })
            }
            Some(_) => Ok(None),
            None => {
                let response = self
                    .runtime(RuntimeCommand::ExtractContent {
                        site_name: site.name.clone(),
                    })
                    .await?;
                match into_result(response) {
                    Ok(Some(data)) => Ok(Some(serde_json::from_value(data)?)),
                    Ok(None) => Ok(None),
                    Err(e) => {
                        warn!(site = %site.name, error = %e, "runtime extraction failed");
                        Ok(None)
                    }
                }
            }
        }
    }
}

fn into_result(response: CommandResponse) -> Result<Option<serde_json::Value>, RouteError> {
    if response.success {
        Ok(response.data)
    } else {
        Err(RouteError::Failed(
            response.error.unwrap_or_else(|| "Unknown error".to_string()),
        ))
    }
}

#[cfg(test)]
#[path = "messenger_tests.rs"]
mod tests;
