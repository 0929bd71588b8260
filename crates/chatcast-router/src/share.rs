//! Conversation sharing and exports.

use std::sync::Arc;

use chatcast_content::{format_all_conversations, format_conversation};
use chatcast_protocols::{
    ConversationData, ExportHistoryEntry, SiteConversation, SiteHandlersConfig, ALL_SITES,
};
use chatcast_store::{ExportHistoryStore, SettingsStore};
use chrono::Local;
use tracing::info;

use crate::error::RouteError;
use crate::messenger::SiteMessenger;

const NO_EXTRACTOR: &str = "No content extractor configured for this site.";
const NO_CONTENT: &str = "No conversation content extracted yet.";

/// Markdown ready to copy or save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedConversation {
    pub site_name: String,
    pub markdown: String,
}

pub struct ShareService {
    catalog: Arc<SiteHandlersConfig>,
    messenger: Arc<SiteMessenger>,
    settings: Arc<SettingsStore>,
    exports: Arc<ExportHistoryStore>,
}

impl ShareService {
    pub fn new(
        catalog: Arc<SiteHandlersConfig>,
        messenger: Arc<SiteMessenger>,
        settings: Arc<SettingsStore>,
        exports: Arc<ExportHistoryStore>,
    ) -> Self {
        Self {
            catalog,
            messenger,
            settings,
            exports,
        }
    }

    pub async fn share_site(&self, site_name: &str) -> Result<SharedConversation, RouteError> {
        let site = self
            .catalog
            .find(site_name)
            .ok_or_else(|| RouteError::UnknownSite(site_name.to_string()))?;
        if site.content_extractor.is_none() {
            return Err(RouteError::Failed(NO_EXTRACTOR.into()));
        }
        let data = match self.messenger.extract(site).await? {
            Some(data) if !data.is_empty() => data,
            _ => return Err(RouteError::Failed(NO_CONTENT.into())),
        };
        Ok(SharedConversation {
            site_name: site.name.clone(),
            markdown: format_conversation(&data),
        })
    }

    /// Every enabled site in catalog order; sites without content still get a section.
    pub async fn share_all(&self) -> Result<SharedConversation, RouteError> {
        let settings = self.settings.get().await?;
        let mut conversations = Vec::new();
        for site in self.catalog.select(&settings.enabled_sites) {
            let data = if site.content_extractor.is_some() {
                self.messenger.extract(site).await?.unwrap_or_default()
            } else {
                ConversationData::default()
            };
            conversations.push(SiteConversation::new(site.name.clone(), data));
        }
        Ok(SharedConversation {
            site_name: ALL_SITES.to_string(),
            markdown: format_all_conversations(&conversations),
        })
    }

    /// Keep `shared` in the export history. The name falls back to the
    /// configured default export name, then to `<site> <date>`.
    pub async fn save_export(
        &self,
        shared: &SharedConversation,
        name: Option<&str>,
    ) -> Result<ExportHistoryEntry, RouteError> {
        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => {
                let settings = self.settings.get().await?;
                if settings.default_export_name.trim().is_empty() {
                    format!("{} {}", shared.site_name, Local::now().format("%Y-%m-%d"))
                } else {
                    settings.default_export_name
                }
            }
        };
        let entry = ExportHistoryEntry::new(name, shared.site_name.clone(), shared.markdown.clone());
        self.exports.add(entry.clone()).await?;
        info!(export = %entry.id, name = %entry.name, "export saved");
        Ok(entry)
    }
}
