//! `history`.

use anyhow::{anyhow, Result};
use chatcast_browser_cdp::OpenMode;
use chatcast_protocols::HistoryEntry;

use crate::app::App;
use crate::cli::HistoryAction;
use crate::cmd_share::format_timestamp;

pub(crate) async fn handle_history(app: &App, action: HistoryAction) -> Result<()> {
    match action {
        HistoryAction::List { limit } => {
            let entries = app.history.list().await?;
            print_entries(entries.iter().take(limit));
        }
        HistoryAction::Search { text } => {
            let entries = app.history.search(&text).await?;
            print_entries(entries.iter());
        }
        HistoryAction::Show { id } => {
            let entry = find(app, &id).await?;
            println!("{}", entry.query);
            println!("{}", format_timestamp(entry.timestamp));
            for result in &entry.site_results {
                println!(
                    "  {:<16} {}",
                    result.site_name,
                    result.conversation_url.as_deref().unwrap_or("-")
                );
            }
        }
        HistoryAction::Delete { id } => {
            app.history.delete(&id).await?;
            println!("Deleted {}", id);
        }
        HistoryAction::Clear => {
            app.history.clear().await?;
            println!("History cleared");
        }
        HistoryAction::Restore { id } => {
            let entry = find(app, &id).await?;
            let overrides = entry.restore_overrides();
            if overrides.is_empty() {
                println!("No conversation urls were captured for this entry; opening the sites' home pages");
            }
            let live = app.open(None, &overrides, OpenMode::Reload).await?;
            println!("Restored {} conversation(s) in {}", overrides.len(), live.page_url);
            live.close().await?;
        }
    }
    Ok(())
}

async fn find(app: &App, id: &str) -> Result<HistoryEntry> {
    app.history
        .get(id)
        .await?
        .ok_or_else(|| anyhow!("No history entry with id {}", id))
}

fn print_entries<'a>(entries: impl Iterator<Item = &'a HistoryEntry>) {
    let mut empty = true;
    for entry in entries {
        empty = false;
        let captured = entry
            .site_results
            .iter()
            .filter(|r| r.conversation_url.is_some())
            .count();
        println!(
            "{}  {}  [{}/{}]  {}",
            entry.id,
            format_timestamp(entry.timestamp),
            captured,
            entry.site_results.len(),
            entry.query.lines().next().unwrap_or_default()
        );
    }
    if empty {
        println!("No history entries.");
    }
}
