//! One query to every enabled site.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chatcast_content::canonical_url;
use chatcast_protocols::{HistoryEntry, SiteConfig, SiteHandlersConfig, SiteResult, UrlExtractor};
use chatcast_store::{HistoryStore, SettingsStore};
use futures::future::join_all;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::capture::{start_capture, CaptureSlot, CaptureTarget};
use crate::error::RouteError;
use crate::messenger::SiteMessenger;
use crate::status::{SiteStatus, StatusBoard};

/// Timing of a broadcast and of the URL capture that follows it.
#[derive(Debug, Clone)]
pub struct Pacing {
    pub stagger: Duration,
    pub capture_delays: Vec<Duration>,
    pub capture_collect: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            stagger: Duration::from_millis(200),
            capture_delays: vec![Duration::from_secs(5), Duration::from_secs(12)],
            capture_collect: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome", content = "error")]
pub enum SendOutcome {
    Sent,
    /// No search steps, or automation is disabled for the site.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastReport {
    pub entry_id: String,
    pub sites: Vec<(String, SendOutcome)>,
}

impl BroadcastReport {
    pub fn sent(&self) -> usize {
        self.sites.iter().filter(|(_, o)| *o == SendOutcome::Sent).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sites.iter().filter_map(|(name, outcome)| match outcome {
            SendOutcome::Failed(e) => Some((name.as_str(), e.as_str())),
            _ => None,
        })
    }
}

pub struct Broadcaster {
    catalog: Arc<SiteHandlersConfig>,
    messenger: Arc<SiteMessenger>,
    history: Arc<HistoryStore>,
    settings: Arc<SettingsStore>,
    status: StatusBoard,
    pacing: Pacing,
    capture: CaptureSlot,
}

impl Broadcaster {
    pub fn new(
        catalog: Arc<SiteHandlersConfig>,
        messenger: Arc<SiteMessenger>,
        history: Arc<HistoryStore>,
        settings: Arc<SettingsStore>,
        status: StatusBoard,
    ) -> Self {
        Self {
            catalog,
            messenger,
            history,
            settings,
            status,
            pacing: Pacing::default(),
            capture: CaptureSlot::new(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    /// Whether URL capture for the last broadcast is still running.
    pub fn capturing(&self) -> bool {
        self.capture.is_active()
    }

    /// Stop the URL capture of the last broadcast.
    pub fn cancel_capture(&self) {
        self.capture.cancel();
    }

    /// Send `query` to every enabled site.
    ///
    /// The history entry is written before anything is sent; conversation
    /// URLs are filled in later by the capture rounds. Sites are injected
    /// `stagger × index` apart and one site failing never stops the others.
    pub async fn send(&self, query: &str) -> Result<BroadcastReport, RouteError> {
        if query.trim().is_empty() {
            return Err(RouteError::EmptyQuery);
        }
        let settings = self.settings.get().await?;
        let enabled = self.catalog.select(&settings.enabled_sites);
        if enabled.is_empty() {
            return Err(RouteError::Failed("No sites are enabled".into()));
        }

        let entry = HistoryEntry::new(query, enabled.iter().map(|s| s.name.clone()));
        let entry_id = entry.id.clone();
        self.history.add(entry).await?;
        info!(entry = %entry_id, sites = enabled.len(), "broadcasting query");

        self.start_url_capture(&entry_id, &enabled);

        let sends = enabled.iter().enumerate().map(|(index, site)| {
            let skip = site.search_handler.steps.is_empty() || settings.is_automation_disabled(&site.name);
            async move {
                if skip {
                    return (site.name.clone(), SendOutcome::Skipped);
                }
                tokio::time::sleep(self.pacing.stagger * index as u32).await;
                (site.name.clone(), self.send_one(site, query).await)
            }
        });
        let sites = join_all(sends).await;
        Ok(BroadcastReport { entry_id, sites })
    }

    async fn send_one(&self, site: &SiteConfig, query: &str) -> SendOutcome {
        self.status.set(&site.name, SiteStatus::Querying, None);
        match self.messenger.inject_query(site, query).await {
            Ok(()) => {
                self.status.set(&site.name, SiteStatus::Done, None);
                SendOutcome::Sent
            }
            Err(e) => {
                error!(site = %site.name, error = %e, "send failed");
                self.status.set(&site.name, SiteStatus::Error, Some(e.to_string()));
                SendOutcome::Failed(e.to_string())
            }
        }
    }

    fn start_url_capture(&self, entry_id: &str, sites: &[&SiteConfig]) {
        let targets = sites
            .iter()
            .map(|s| CaptureTarget::new(s.name.clone(), s.url.clone()))
            .collect();
        let extractors: Arc<HashMap<String, UrlExtractor>> = Arc::new(
            sites
                .iter()
                .filter_map(|s| {
                    let extractor = s.content_extractor.as_ref()?.url_extractor.clone()?;
                    Some((s.name.clone(), extractor))
                })
                .collect(),
        );
        let history = self.history.clone();
        let entry_id = entry_id.to_string();

        let handle = start_capture(
            self.messenger.host().clone(),
            targets,
            self.pacing.capture_delays.clone(),
            self.pacing.capture_collect,
            move |results: Vec<SiteResult>| {
                let history = history.clone();
                let extractors = extractors.clone();
                let entry_id = entry_id.clone();
                async move {
                    let results = canonicalize(results, &extractors);
                    if results.iter().all(|r| r.conversation_url.is_none()) {
                        return;
                    }
                    match history.record_urls(&entry_id, &results).await {
                        Ok(true) => info!(entry = %entry_id, "conversation urls recorded"),
                        Ok(false) => warn!(entry = %entry_id, "history entry is gone"),
                        Err(e) => error!(entry = %entry_id, error = %e, "recording urls failed"),
                    }
                }
            },
        );
        self.capture.replace(handle);
    }
}

fn canonicalize(results: Vec<SiteResult>, extractors: &HashMap<String, UrlExtractor>) -> Vec<SiteResult> {
    results
        .into_iter()
        .map(|mut result| {
            if let (Some(url), Some(extractor)) = (&result.conversation_url, extractors.get(&result.site_name)) {
                result.conversation_url = Some(canonical_url(url, None, extractor));
            }
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_only_touches_configured_sites() {
        let mut extractors = HashMap::new();
        extractors.insert(
            "Grok".to_string(),
            UrlExtractor {
                alternate_link_selector: None,
                url_pattern: None,
                remove_params: vec!["ref".into()],
            },
        );
        let results = canonicalize(
            vec![
                SiteResult::new("Grok").with_url("https://grok.com/c/1?ref=x"),
                SiteResult::new("Qwen").with_url("https://chat.qwen.ai/c/2?ref=x"),
                SiteResult::new("Gemini"),
            ],
            &extractors,
        );
        assert_eq!(results[0].conversation_url.as_deref(), Some("https://grok.com/c/1"));
        assert_eq!(results[1].conversation_url.as_deref(), Some("https://chat.qwen.ai/c/2?ref=x"));
        assert_eq!(results[2].conversation_url, None);
    }

    #[test]
    fn test_report_counts() {
        let report = BroadcastReport {
            entry_id: "e".into(),
            sites: vec![
                ("A".into(), SendOutcome::Sent),
                ("B".into(), SendOutcome::Skipped),
                ("C".into(), SendOutcome::Failed("boom".into())),
            ],
        };
        assert_eq!(report.sent(), 1);
        assert_eq!(report.failures().collect::<Vec<_>>(), vec![("C", "boom")]);
    }
}
