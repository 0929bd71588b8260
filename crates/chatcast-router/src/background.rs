//! The background command handler.
//!
//! Every runtime-plane command lands here. Frame-bound commands go through the
//! [`RuntimeRouter`]; the rest are answered from the stores.

use std::sync::Arc;

use chatcast_protocols::{CommandResponse, RuntimeCommand, SiteHandlersConfig};
use chatcast_store::{FloatStateStore, SettingsStore};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::RouteError;
use crate::router::RuntimeRouter;
use crate::status::StatusBoard;

pub struct CommandHandler {
    router: Arc<RuntimeRouter>,
    catalog: Arc<SiteHandlersConfig>,
    settings: Arc<SettingsStore>,
    floats: Arc<FloatStateStore>,
    status: StatusBoard,
}

impl CommandHandler {
    pub fn new(
        router: Arc<RuntimeRouter>,
        catalog: Arc<SiteHandlersConfig>,
        settings: Arc<SettingsStore>,
        floats: Arc<FloatStateStore>,
        status: StatusBoard,
    ) -> Self {
        Self {
            router,
            catalog,
            settings,
            floats,
            status,
        }
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    pub async fn handle(&self, command: &RuntimeCommand) -> CommandResponse {
        debug!(kind = command.kind(), "runtime command");
        match self.dispatch(command).await {
            Ok(response) => response,
            Err(e) => CommandResponse::fail(e.to_string()),
        }
    }

    async fn dispatch(&self, command: &RuntimeCommand) -> Result<CommandResponse, RouteError> {
        match command {
            RuntimeCommand::InjectQuery { .. }
            | RuntimeCommand::InjectFile { .. }
            | RuntimeCommand::ExtractContent { .. } => self.router.route(command).await,
            RuntimeCommand::GetSiteConfig { site_name } => {
                let data = match site_name {
                    Some(name) => match self.catalog.find(name) {
                        Some(site) => serde_json::to_value(site)?,
                        None => return Ok(CommandResponse::fail(format!("Site {} not found", name))),
                    },
                    None => serde_json::to_value(self.catalog.as_ref())?,
                };
                Ok(CommandResponse::ok_with(data))
            }
            RuntimeCommand::GetSettings => {
                let settings = self.settings.get().await?;
                Ok(CommandResponse::ok_with(serde_json::to_value(settings)?))
            }
            RuntimeCommand::UpdateSettings { settings } => {
                let merged = self.settings.update(settings).await?;
                Ok(CommandResponse::ok_with(serde_json::to_value(merged)?))
            }
            RuntimeCommand::QueryStatus { .. } | RuntimeCommand::SiteReady { .. } => {
                self.status.apply_runtime(command);
                Ok(CommandResponse::ok())
            }
            RuntimeCommand::DetachBatchSearch => {
                let tab = self.router.find_batch_tab().await?;
                let state = self.router.tabs().detach_tab(&tab.id).await?;
                self.floats.set(&state).await?;
                info!(tab = %tab.id, window = state.window_id, "batch page detached");
                Ok(CommandResponse::ok_with(serde_json::to_value(state)?))
            }
        }
    }

    /// Handle a command given as JSON, as it arrives from a page.
    pub async fn handle_json(&self, raw: &Value) -> CommandResponse {
        match serde_json::from_value::<RuntimeCommand>(raw.clone()) {
            Ok(command) => self.handle(&command).await,
            Err(e) => CommandResponse::fail(format!("Invalid message: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{batch_tabs, catalog, kv, BATCH_URL};
    use crate::status::SiteStatus;
    use chatcast_protocols::{QueryPhase, UserSettings};
    use serde_json::json;

    fn handler() -> (CommandHandler, Arc<FloatStateStore>) {
        let (tabs, _, _) = batch_tabs();
        let store = kv();
        let floats = Arc::new(FloatStateStore::new(store.clone()));
        let router = Arc::new(RuntimeRouter::new(tabs, floats.clone(), catalog(), BATCH_URL));
        let handler = CommandHandler::new(
            router,
            catalog(),
            Arc::new(SettingsStore::new(store)),
            floats.clone(),
            StatusBoard::new(),
        );
        (handler, floats)
    }

    #[tokio::test]
    async fn test_site_config_lookup() {
        let (handler, _) = handler();
        let all = handler
            .handle(&RuntimeCommand::GetSiteConfig { site_name: None })
            .await;
        assert_eq!(all.data.unwrap()["sites"].as_array().unwrap().len(), 2);

        let one = handler
            .handle(&RuntimeCommand::GetSiteConfig {
                site_name: Some("Qwen".into()),
            })
            .await;
        assert_eq!(one.data.unwrap()["url"], "https://chat.qwen.ai/");

        let missing = handler
            .handle(&RuntimeCommand::GetSiteConfig {
                site_name: Some("Nope".into()),
            })
            .await;
        assert_eq!(missing.error.as_deref(), Some("Site Nope not found"));
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let (handler, _) = handler();
        let defaults = handler.handle(&RuntimeCommand::GetSettings).await;
        let defaults: UserSettings = serde_json::from_value(defaults.data.unwrap()).unwrap();
        assert_eq!(defaults, UserSettings::default());

        let mut partial = serde_json::Map::new();
        partial.insert("gridColumns".into(), json!(3));
        let updated = handler
            .handle(&RuntimeCommand::UpdateSettings { settings: partial })
            .await;
        assert!(updated.success);
        let stored = handler.handle(&RuntimeCommand::GetSettings).await;
        assert_eq!(stored.data.unwrap()["gridColumns"], 3);
    }

    #[tokio::test]
    async fn test_inject_is_routed() {
        let (handler, _) = handler();
        let response = handler
            .handle_json(&json!({"type": "INJECT_QUERY", "siteName": "Grok", "query": "hi"}))
            .await;
        assert!(response.success, "{:?}", response.error);
    }

    #[tokio::test]
    async fn test_status_reports() {
        let (handler, _) = handler();
        handler
            .handle(&RuntimeCommand::QueryStatus {
                site_name: "Grok".into(),
                status: QueryPhase::Completed,
                error: None,
            })
            .await;
        assert_eq!(handler.status().get("Grok").unwrap().status, SiteStatus::Done);
    }

    #[tokio::test]
    async fn test_detach_records_float_state() {
        let (handler, floats) = handler();
        let response = handler.handle(&RuntimeCommand::DetachBatchSearch).await;
        assert!(response.success, "{:?}", response.error);
        let state = floats.get().await.unwrap().unwrap();
        assert_eq!(state.tab_id, "batch");
        assert!(state.active);
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let (handler, _) = handler();
        let response = handler.handle_json(&json!({"type": "NOPE"})).await;
        assert!(response.error.unwrap().starts_with("Invalid message"));
    }
}
