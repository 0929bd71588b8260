//! `send` and `open`.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chatcast_browser_cdp::OpenMode;
use chatcast_protocols::UserSettings;
use chatcast_router::{query_from_url, BroadcastReport, Broadcaster, SendOutcome};
use tracing::{info, warn};

use crate::app::{App, Live};

const CAPTURE_POLL: Duration = Duration::from_millis(250);

/// Wrap `query` in the named prompt template, if any.
pub(crate) fn apply_template(settings: &UserSettings, query: &str, template: Option<&str>) -> Result<String> {
    match template {
        None => Ok(query.to_string()),
        Some(name) => settings
            .find_template(name)
            .map(|t| t.apply(query))
            .ok_or_else(|| anyhow!("No prompt template named {}", name)),
    }
}

pub(crate) async fn handle_send(app: &App, query: &str, template: Option<&str>, capture: bool) -> Result<()> {
    let settings = app.settings.get().await?;
    let query = apply_template(&settings, query, template)?;
    let live = app.open(None, &HashMap::new(), OpenMode::Reuse).await?;
    broadcast(app, &live, &query, capture).await?;
    live.close().await
}

pub(crate) async fn handle_open(app: &App, query: Option<&str>) -> Result<()> {
    let live = app.open(query, &HashMap::new(), OpenMode::Reuse).await?;
    println!("Batch page: {}", live.page_url);
    if let Some(query) = query_from_url(&live.page_url) {
        let delay = app.config.batch.auto_send_delay();
        info!(?delay, "sending the query once the sites settle");
        tokio::time::sleep(delay).await;
        broadcast(app, &live, &query, true).await?;
    }
    live.close().await
}

/// Send `query` from an open batch page and report per site.
pub(crate) async fn broadcast(app: &App, live: &Live, query: &str, capture: bool) -> Result<()> {
    let broadcaster = live.broadcaster(app);
    let report = broadcaster.send(query).await?;
    print_report(&report);

    if capture {
        wait_for_capture(app, &broadcaster).await;
        if let Some(entry) = app.history.get(&report.entry_id).await? {
            for result in &entry.site_results {
                if let Some(url) = &result.conversation_url {
                    println!("  {:<16} {}", result.site_name, url);
                }
            }
        }
    } else {
        broadcaster.cancel_capture();
    }
    Ok(())
}

fn print_report(report: &BroadcastReport) {
    println!("Sent to {} of {} sites (history {})", report.sent(), report.sites.len(), report.entry_id);
    for (site, outcome) in &report.sites {
        match outcome {
            SendOutcome::Sent => println!("  {:<16} sent", site),
            SendOutcome::Skipped => println!("  {:<16} skipped", site),
            SendOutcome::Failed(e) => println!("  {:<16} failed: {}", site, e),
        }
    }
}

/// Block until the URL capture rounds are over, bounded by their schedule.
async fn wait_for_capture(app: &App, broadcaster: &Broadcaster) {
    let capture = &app.config.capture;
    let budget = capture.delays().into_iter().max().unwrap_or_default()
        + capture.collect()
        + Duration::from_secs(5);
    let wait = async {
        while broadcaster.capturing() {
            tokio::time::sleep(CAPTURE_POLL).await;
        }
    };
    if tokio::time::timeout(budget, wait).await.is_err() {
        warn!("conversation url capture did not finish in {:?}", budget);
        broadcaster.cancel_capture();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatcast_protocols::PromptTemplate;

    fn settings_with_template() -> UserSettings {
        let mut settings = UserSettings::default();
        settings.prompt_templates.push(PromptTemplate {
            id: "t1".into(),
            name: "translate".into(),
            template: "Translate to French: {query}".into(),
            order: 0,
        });
        settings
    }

    #[test]
    fn test_apply_template_by_name() {
        let settings = settings_with_template();
        let query = apply_template(&settings, "good morning", Some("translate")).unwrap();
        assert_eq!(query, "Translate to French: good morning");
    }

    #[test]
    fn test_no_template_keeps_query() {
        let settings = UserSettings::default();
        assert_eq!(apply_template(&settings, "hi", None).unwrap(), "hi");
    }

    #[test]
    fn test_unknown_template_is_an_error() {
        let settings = settings_with_template();
        let err = apply_template(&settings, "hi", Some("missing")).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
