//! `settings` and `sites`.

use anyhow::{anyhow, bail, Result};
use chatcast_protocols::UserSettings;
use serde_json::{Map, Value};

use crate::app::App;
use crate::cli::SettingsAction;

pub(crate) async fn handle_settings(app: &App, action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Get { key } => {
            let settings = serde_json::to_value(app.settings.get().await?)?;
            let value = match key {
                Some(key) => settings
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| anyhow!("Unknown setting: {}", key))?,
                None => settings,
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        SettingsAction::Set { pairs } => {
            let partial = parse_pairs(&pairs)?;
            let merged = app.settings.update(&partial).await?;
            println!("{}", serde_json::to_string_pretty(&merged)?);
        }
        SettingsAction::Reset => {
            app.settings.replace(&UserSettings::default()).await?;
            println!("Settings reset to defaults");
        }
    }
    Ok(())
}

/// `key=value` pairs as a partial settings object. Values that parse as JSON
/// keep their type; anything else is a string.
pub(crate) fn parse_pairs(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut partial = Map::new();
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            bail!("Expected key=value, got {}", pair);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Missing key in {}", pair);
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        partial.insert(key.to_string(), value);
    }
    Ok(partial)
}

pub(crate) async fn handle_sites(app: &App, format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(app.catalog.as_ref())?);
        return Ok(());
    }
    let settings = app.settings.get().await?;
    println!("{:<16} {:<8} {:<10} {:<9} URL", "NAME", "ENABLED", "AUTOMATION", "EXTRACT");
    for site in app.catalog.sites.iter().filter(|s| !s.hidden) {
        let automation = if site.search_handler.steps.is_empty() {
            "none"
        } else if settings.is_automation_disabled(&site.name) {
            "off"
        } else {
            "on"
        };
        println!(
            "{:<16} {:<8} {:<10} {:<9} {}",
            site.name,
            if settings.is_site_enabled(&site.name) { "yes" } else { "no" },
            automation,
            if site.content_extractor.is_some() { "yes" } else { "no" },
            site.url
        );
    }
    Ok(())
}
