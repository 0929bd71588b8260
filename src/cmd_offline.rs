//! Commands that work on saved pages, without a browser.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chatcast_automation::{FrameAction, SnapshotFrame, StepInterpreter};
use chatcast_content::{extract, format_conversation, to_markdown};
use chatcast_dom::parse_html;
use chatcast_protocols::Step;

use crate::app::App;

async fn read_html(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

pub(crate) async fn handle_extract_file(app: &App, html: &Path, site: &str, markdown: bool) -> Result<()> {
    let site = app.site(site)?;
    let config = site
        .content_extractor
        .as_ref()
        .ok_or_else(|| anyhow!("No content extractor configured for {}", site.name))?;
    let doc = parse_html(&read_html(html).await?);
    let data = extract(&doc, config)?;
    if markdown {
        println!("{}", format_conversation(&data));
    } else {
        println!("{}", serde_json::to_string_pretty(&data)?);
    }
    Ok(())
}

pub(crate) async fn handle_markdown(html: &Path) -> Result<()> {
    println!("{}", to_markdown(&read_html(html).await?));
    Ok(())
}

pub(crate) async fn handle_dry_run(app: &App, html: &Path, site: &str, query: &str) -> Result<()> {
    let site = app.site(site)?;
    let steps = &site.search_handler.steps;
    let page = read_html(html).await?;
    let (ok, journal) = dry_run(&site.url, &page, steps, query, app.config.timeouts.bridge()).await;
    for action in &journal {
        println!("{}", serde_json::to_string(action)?);
    }
    println!(
        "{}: {} step(s) {}",
        site.name,
        steps.len(),
        if ok { "completed" } else { "stopped early" }
    );
    Ok(())
}

/// Run `steps` against a page snapshot and return what they wrote.
async fn dry_run(
    location: &str,
    html: &str,
    steps: &[Step],
    query: &str,
    bridge: Duration,
) -> (bool, Vec<FrameAction>) {
    let frame = SnapshotFrame::from_html(location, html);
    let ok = StepInterpreter::new(&frame)
        .with_bridge_timeout(bridge)
        .run(steps, query)
        .await;
    (ok, frame.journal())
}
