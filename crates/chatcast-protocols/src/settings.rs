//! User settings shared by every surface.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProtocolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GridLayout {
    #[default]
    SideBySide,
    Grid,
}

/// A reusable query wrapper; `{query}` marks where the query goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: String,
    pub name: String,
    pub template: String,
    #[serde(default)]
    pub order: u32,
}

impl PromptTemplate {
    /// Substitute the first `{query}` placeholder.
    pub fn apply(&self, query: &str) -> String {
        self.template.replacen("{query}", query, 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(default = "default_enabled_sites")]
    pub enabled_sites: Vec<String>,
    #[serde(default)]
    pub grid_layout: GridLayout,
    #[serde(default = "default_grid_columns")]
    pub grid_columns: u8,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub prompt_templates: Vec<PromptTemplate>,
    #[serde(default)]
    pub export_all_templates: Vec<PromptTemplate>,
    #[serde(default)]
    pub default_export_name: String,
    #[serde(default)]
    pub disabled_automation_sites: Vec<String>,
}

fn default_enabled_sites() -> Vec<String> {
    vec!["ChatGPT".to_string(), "Gemini".to_string(), "Grok".to_string()]
}

fn default_grid_columns() -> u8 {
    2
}

fn default_language() -> String {
    "en".to_string()
}

fn default_theme() -> String {
    "midnight".to_string()
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            enabled_sites: default_enabled_sites(),
            grid_layout: GridLayout::default(),
            grid_columns: default_grid_columns(),
            language: default_language(),
            theme: default_theme(),
            prompt_templates: Vec::new(),
            export_all_templates: Vec::new(),
            default_export_name: String::new(),
            disabled_automation_sites: Vec::new(),
        }
    }
}

impl UserSettings {
    /// Overlay top-level keys of `partial` onto these settings.
    pub fn merge_partial(&self, partial: &Map<String, Value>) -> Result<UserSettings, ProtocolError> {
        let mut current = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in partial {
            current.insert(key.clone(), value.clone());
        }
        let merged: UserSettings = serde_json::from_value(Value::Object(current))
            .map_err(|e| ProtocolError::InvalidSettings(e.to_string()))?;
        merged.check()?;
        Ok(merged)
    }

    pub fn check(&self) -> Result<(), ProtocolError> {
        if !(1..=4).contains(&self.grid_columns) {
            return Err(ProtocolError::InvalidSettings(format!(
                "gridColumns must be between 1 and 4, got {}",
                self.grid_columns
            )));
        }
        Ok(())
    }

    pub fn is_site_enabled(&self, name: &str) -> bool {
        self.enabled_sites.iter().any(|s| s == name)
    }

    pub fn is_automation_disabled(&self, name: &str) -> bool {
        self.disabled_automation_sites.iter().any(|s| s == name)
    }

    /// Templates ordered for display.
    pub fn templates(&self) -> Vec<&PromptTemplate> {
        let mut list: Vec<_> = self.prompt_templates.iter().collect();
        list.sort_by_key(|t| t.order);
        list
    }

    pub fn find_template(&self, name_or_id: &str) -> Option<&PromptTemplate> {
        self.prompt_templates
            .iter()
            .find(|t| t.id == name_or_id || t.name.eq_ignore_ascii_case(name_or_id))
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
