//! Per-site progress shown on the batch page.

use std::sync::Arc;

use chatcast_protocols::{QueryPhase, RuntimeCommand};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    Loading,
    Ready,
    Querying,
    Done,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteState {
    pub site_name: String,
    pub status: SiteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Latest status of every site, in first-seen order.
#[derive(Clone)]
pub struct StatusBoard {
    states: Arc<DashMap<String, SiteState>>,
    order: Arc<Mutex<Vec<String>>>,
    tx: broadcast::Sender<SiteState>,
}

impl StatusBoard {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            states: Arc::new(DashMap::new()),
            order: Arc::new(Mutex::new(Vec::new())),
            tx,
        }
    }

    pub fn set(&self, site_name: &str, status: SiteStatus, error: Option<String>) {
        let state = SiteState {
            site_name: site_name.to_string(),
            status,
            error,
        };
        if self.states.insert(site_name.to_string(), state.clone()).is_none() {
            self.order.lock().push(site_name.to_string());
        }
        debug!(site = site_name, ?status, "site status");
        let _ = self.tx.send(state);
    }

    /// Fold a `QUERY_STATUS` or `SITE_READY` report in. Returns false for
    /// commands that carry no status.
    pub fn apply_runtime(&self, command: &RuntimeCommand) -> bool {
        match command {
            RuntimeCommand::QueryStatus {
                site_name,
                status,
                error,
            } => {
                let status = match status {
                    QueryPhase::Started => SiteStatus::Querying,
                    QueryPhase::Completed => SiteStatus::Done,
                    QueryPhase::Error => SiteStatus::Error,
                };
                self.set(site_name, status, error.clone());
                true
            }
            RuntimeCommand::SiteReady { site_name } => {
                self.set(site_name, SiteStatus::Ready, None);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, site_name: &str) -> Option<SiteState> {
        self.states.get(site_name).map(|s| s.clone())
    }

    pub fn snapshot(&self) -> Vec<SiteState> {
        self.order
            .lock()
            .iter()
            .filter_map(|name| self.get(name))
            .collect()
    }

    /// Whether any site is still working on a query.
    pub fn is_querying(&self) -> bool {
        self.states.iter().any(|s| s.status == SiteStatus::Querying)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SiteState> {
        self.tx.subscribe()
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_reports() {
        let board = StatusBoard::new();
        assert!(board.apply_runtime(&RuntimeCommand::SiteReady {
            site_name: "Grok".into()
        }));
        assert!(board.apply_runtime(&RuntimeCommand::QueryStatus {
            site_name: "Qwen".into(),
            status: QueryPhase::Started,
            error: None,
        }));
        assert!(board.is_querying());
        assert!(board.apply_runtime(&RuntimeCommand::QueryStatus {
            site_name: "Qwen".into(),
            status: QueryPhase::Error,
            error: Some("boom".into()),
        }));
        assert!(!board.is_querying());
        assert!(!board.apply_runtime(&RuntimeCommand::GetSettings));

        let snapshot = board.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].status, SiteStatus::Ready);
        assert_eq!(snapshot[1].status, SiteStatus::Error);
        assert_eq!(snapshot[1].error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_updates_are_broadcast() {
        let board = StatusBoard::new();
        let mut rx = board.subscribe();
        board.set("Grok", SiteStatus::Done, None);
        let state = rx.recv().await.unwrap();
        assert_eq!(state.site_name, "Grok");
        assert_eq!(state.status, SiteStatus::Done);
    }
}
