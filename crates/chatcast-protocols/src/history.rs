//! Query history and saved exports.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Site name used for combined exports.
pub const ALL_SITES: &str = "All Sites";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteResult {
    pub site_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_preview: Option<String>,
}

impl SiteResult {
    pub fn new(site_name: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            conversation_url: None,
            response_preview: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.conversation_url = Some(url.into());
        self
    }
}

/// One broadcast query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub query: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub site_results: Vec<SiteResult>,
}

impl HistoryEntry {
    pub fn new<I, S>(query: impl Into<String>, site_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: Uuid::new_v4().to_string(),
            query: query.into(),
            timestamp: Utc::now().timestamp_millis(),
            site_results: site_names.into_iter().map(SiteResult::new).collect(),
        }
    }

    /// Merge captured conversation URLs into this entry.
    ///
    /// Only sites with a captured URL are touched. Returns whether anything changed.
    pub fn apply_captured(&mut self, captured: &[SiteResult]) -> bool {
        let mut changed = false;
        for result in captured {
            let Some(url) = result.conversation_url.as_ref() else {
                continue;
            };
            match self
                .site_results
                .iter_mut()
                .find(|r| r.site_name == result.site_name)
            {
                Some(existing) => {
                    if existing.conversation_url.as_ref() != Some(url) {
                        existing.conversation_url = Some(url.clone());
                        changed = true;
                    }
                }
                None => {
                    self.site_results.push(result.clone());
                    changed = true;
                }
            }
        }
        changed
    }

    /// Site name → conversation URL, for reopening the batch page on this entry.
    pub fn restore_overrides(&self) -> HashMap<String, String> {
        self.site_results
            .iter()
            .filter_map(|r| {
                r.conversation_url
                    .as_ref()
                    .map(|url| (r.site_name.clone(), url.clone()))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportType {
    Single,
    All,
}

/// An export the user chose to keep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportHistoryEntry {
    pub id: String,
    pub name: String,
    pub site_name: String,
    pub content: String,
    pub timestamp: i64,
    pub export_type: ExportType,
}

impl ExportHistoryEntry {
    pub fn new(
        name: impl Into<String>,
        site_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let site_name = site_name.into();
        let export_type = if site_name == ALL_SITES {
            ExportType::All
        } else {
            ExportType::Single
        };
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            site_name,
            content: content.into(),
            timestamp: Utc::now().timestamp_millis(),
            export_type,
        }
    }
}
