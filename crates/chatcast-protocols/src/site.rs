//! Site configuration: automation steps and extraction rules per chat site.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::host;

/// Poll attempts used when a step does not set `maxAttempts`.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Poll interval used when a step does not set `retryInterval`.
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 300;

/// One selector or an ordered list of alternatives; the first DOM match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorList {
    One(String),
    Many(Vec<String>),
}

impl SelectorList {
    /// Candidate selectors in priority order.
    pub fn candidates(&self) -> &[String] {
        match self {
            SelectorList::One(s) => std::slice::from_ref(s),
            SelectorList::Many(list) => list,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates().iter().all(|s| s.trim().is_empty())
    }
}

impl From<&str> for SelectorList {
    fn from(s: &str) -> Self {
        SelectorList::One(s.to_string())
    }
}

impl From<String> for SelectorList {
    fn from(s: String) -> Self {
        SelectorList::One(s)
    }
}

impl From<Vec<&str>> for SelectorList {
    fn from(list: Vec<&str>) -> Self {
        SelectorList::Many(list.into_iter().map(String::from).collect())
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.candidates().join(" | "))
    }
}

/// Step action tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepAction {
    Focus,
    SetValue,
    TriggerEvents,
    Click,
    Wait,
    SendKeys,
    Paste,
    Custom,
}

impl StepAction {
    /// Actions that operate on a resolved element.
    pub fn needs_element(self) -> bool {
        matches!(
            self,
            StepAction::Focus
                | StepAction::SetValue
                | StepAction::TriggerEvents
                | StepAction::Click
                | StepAction::SendKeys
                | StepAction::Paste
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepAction::Focus => "focus",
            StepAction::SetValue => "setValue",
            StepAction::TriggerEvents => "triggerEvents",
            StepAction::Click => "click",
            StepAction::Wait => "wait",
            StepAction::SendKeys => "sendKeys",
            StepAction::Paste => "paste",
            StepAction::Custom => "custom",
        }
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How `setValue` commits text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Contenteditable,
    Angular,
    Special,
    /// Plain `<textarea>` / `<input>`; also covers unknown values.
    #[serde(other)]
    Plain,
}

/// A declarative automation instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub action: StepAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<SelectorList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_interval: Option<u64>,
    #[serde(default)]
    pub wait_for_element: bool,
    #[serde(default)]
    pub retry_on_disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_set_value: Option<String>,
}

impl Step {
    pub fn new(action: StepAction) -> Self {
        Self {
            action,
            selector: None,
            input_type: None,
            events: Vec::new(),
            keys: None,
            duration: None,
            max_attempts: None,
            retry_interval: None,
            wait_for_element: false,
            retry_on_disabled: false,
            description: None,
            custom_action: None,
            custom_set_value: None,
        }
    }

    pub fn with_selector(mut self, selector: impl Into<SelectorList>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_input_type(mut self, input_type: InputType) -> Self {
        self.input_type = Some(input_type);
        self
    }

    pub fn with_events(mut self, events: &[&str]) -> Self {
        self.events = events.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_keys(mut self, keys: impl Into<String>) -> Self {
        self.keys = Some(keys.into());
        self
    }

    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration = Some(ms);
        self
    }

    pub fn with_retry(mut self, max_attempts: u32, interval_ms: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self.retry_interval = Some(interval_ms);
        self
    }

    pub fn with_custom_value(mut self, value: impl Into<String>) -> Self {
        self.custom_set_value = Some(value.into());
        self
    }

    pub fn waiting_for_element(mut self) -> Self {
        self.wait_for_element = true;
        self
    }

    pub fn retrying_on_disabled(mut self) -> Self {
        self.retry_on_disabled = true;
        self
    }

    /// Poll attempts, falling back to the default when unset or zero.
    pub fn max_attempts(&self) -> u32 {
        match self.max_attempts {
            Some(n) if n > 0 => n,
            _ => DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Poll interval, falling back to the default when unset or zero.
    pub fn retry_interval(&self) -> Duration {
        match self.retry_interval {
            Some(ms) if ms > 0 => Duration::from_millis(ms),
            _ => Duration::from_millis(DEFAULT_RETRY_INTERVAL_MS),
        }
    }

    /// Text a value-committing step should write.
    pub fn value_for<'a>(&'a self, payload: &'a str) -> &'a str {
        match self.custom_set_value.as_deref() {
            Some(v) if !v.is_empty() => v,
            _ => payload,
        }
    }
}

/// An ordered list of steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepHandler {
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl From<Vec<Step>> for StepHandler {
    fn from(steps: Vec<Step>) -> Self {
        Self { steps }
    }
}

/// Rules for deriving a canonical conversation URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlExtractor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_link_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_params: Vec<String>,
}

/// Declarative description of a site's message DOM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentExtractorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_container: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_selectors: Option<Vec<String>>,
    /// Older name for `contentSelectors`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_selectors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_selector: Option<String>,
    #[serde(default)]
    pub extract_thinking: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thinking_block_filters: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_selectors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_extractor: Option<UrlExtractor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_message_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_mode_check: Option<String>,
}

impl ContentExtractorConfig {
    /// `contentSelectors`, else `selectors`, else nothing.
    pub fn content_selectors(&self) -> &[String] {
        self.content_selectors
            .as_deref()
            .or(self.selectors.as_deref())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryHandler {
    pub url_feature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPromptButton {
    pub container_selector: String,
    pub text_selector: String,
}

/// One configured chat destination. `name` is the join key everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub name: String,
    pub url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub support_url_query: bool,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default = "default_true")]
    pub support_iframe: bool,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub search_handler: StepHandler,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_upload_handler: Option<StepHandler>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_extractor: Option<ContentExtractorConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_handler: Option<HistoryHandler>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_prompt_button: Option<UserPromptButton>,
}

fn default_true() -> bool {
    true
}

impl SiteConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            enabled: true,
            support_url_query: false,
            region: String::new(),
            hidden: false,
            support_iframe: true,
            note: String::new(),
            search_handler: StepHandler::default(),
            file_upload_handler: None,
            content_extractor: None,
            history_handler: None,
            user_prompt_button: None,
        }
    }

    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.search_handler = StepHandler::from(steps);
        self
    }

    pub fn with_extractor(mut self, extractor: ContentExtractorConfig) -> Self {
        self.content_extractor = Some(extractor);
        self
    }

    pub fn with_file_steps(mut self, steps: Vec<Step>) -> Self {
        self.file_upload_handler = Some(StepHandler::from(steps));
        self
    }

    /// Hostname of the configured URL.
    pub fn host(&self) -> Option<String> {
        host::host_of(&self.url)
    }

    /// Whether a frame at `location` belongs to this site.
    pub fn matches_url(&self, location: &str) -> bool {
        host::url_matches_host(location, &self.url)
    }
}

/// The versioned site catalog document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteHandlersConfig {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
}

impl SiteHandlersConfig {
    /// Parse and sanity check a catalog document.
    pub fn from_json(content: &str) -> Result<Self, ProtocolError> {
        let catalog: SiteHandlersConfig = serde_json::from_str(content)?;
        catalog.check()?;
        Ok(catalog)
    }

    /// Reject duplicate names and sites without a usable URL.
    pub fn check(&self) -> Result<(), ProtocolError> {
        let mut seen = std::collections::HashSet::new();
        for site in &self.sites {
            if site.name.trim().is_empty() {
                return Err(ProtocolError::InvalidSiteConfig(
                    "site with empty name".to_string(),
                ));
            }
            if !seen.insert(site.name.as_str()) {
                return Err(ProtocolError::InvalidSiteConfig(format!(
                    "duplicate site name {}",
                    site.name
                )));
            }
            if site.host().is_none() {
                return Err(ProtocolError::InvalidSiteConfig(format!(
                    "site {} has no host in url {}",
                    site.name, site.url
                )));
            }
        }
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|s| s.name == name)
    }

    /// Sites named in `names`, in catalog order.
    pub fn select<'a>(&'a self, names: &[String]) -> Vec<&'a SiteConfig> {
        self.sites
            .iter()
            .filter(|s| names.iter().any(|n| n == &s.name))
            .collect()
    }

    /// The configured site whose URL matches `location`.
    pub fn site_for_url(&self, location: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|s| s.matches_url(location))
    }
}

#[cfg(test)]
#[path = "site_tests.rs"]
mod tests;
