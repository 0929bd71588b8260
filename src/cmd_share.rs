//! `share` and `exports`.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chatcast_browser_cdp::OpenMode;
use chrono::{Local, TimeZone};

use crate::app::App;
use crate::cli::ExportAction;

pub(crate) async fn handle_share(
    app: &App,
    site: Option<&str>,
    save: Option<&str>,
    out: Option<&Path>,
) -> Result<()> {
    let live = app.open(None, &HashMap::new(), OpenMode::Reuse).await?;
    let service = live.share(app);
    let shared = match site {
        Some(name) => {
            let site = app.site(name)?;
            service.share_site(&site.name).await?
        }
        None => service.share_all().await?,
    };

    match out {
        Some(path) => {
            tokio::fs::write(path, &shared.markdown)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", shared.markdown),
    }

    if let Some(name) = save {
        let entry = service.save_export(&shared, Some(name)).await?;
        eprintln!("Saved export \"{}\" ({})", entry.name, entry.id);
    }
    live.close().await
}

pub(crate) async fn handle_exports(app: &App, action: ExportAction) -> Result<()> {
    match action {
        ExportAction::List => {
            let exports = app.exports.list().await?;
            if exports.is_empty() {
                println!("No saved exports.");
            }
            for entry in exports {
                println!(
                    "{}  {}  {:<10} {}",
                    entry.id,
                    format_timestamp(entry.timestamp),
                    entry.site_name,
                    entry.name
                );
            }
        }
        ExportAction::Show { id } => {
            let entry = app
                .exports
                .get(&id)
                .await?
                .ok_or_else(|| anyhow!("No export with id {}", id))?;
            println!("{}", entry.content);
        }
        ExportAction::Delete { id } => {
            app.exports.delete(&id).await?;
            println!("Deleted export {}", id);
        }
        ExportAction::Clear => {
            app.exports.clear().await?;
            println!("Export history cleared");
        }
    }
    Ok(())
}

/// Local time of a millisecond timestamp.
pub(crate) fn format_timestamp(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
