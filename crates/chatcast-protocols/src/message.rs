//! Messages of the runtime plane and the window plane.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::conversation::ConversationData;
use crate::site::{ContentExtractorConfig, SelectorList, StepHandler};

/// Error a frame reports when a command targets another site.
pub const FRAME_SITE_MISMATCH: &str = "FRAME_SITE_MISMATCH";

/// A file carried inside an upload command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePayload {
    pub file_name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Base64 encoded bytes.
    pub data: String,
}

/// Progress reported by a site frame over the runtime plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryPhase {
    Started,
    Completed,
    Error,
}

/// Outcome posted back over the window plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameStatus {
    Done,
    Error,
}

/// Commands handled by the background router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuntimeCommand {
    #[serde(rename_all = "camelCase")]
    InjectQuery { site_name: String, query: String },
    #[serde(rename_all = "camelCase")]
    InjectFile {
        site_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_data: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        files: Vec<FilePayload>,
    },
    #[serde(rename_all = "camelCase")]
    ExtractContent { site_name: String },
    #[serde(rename_all = "camelCase")]
    GetSiteConfig {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        site_name: Option<String>,
    },
    GetSettings,
    UpdateSettings { settings: Map<String, Value> },
    #[serde(rename_all = "camelCase")]
    QueryStatus {
        site_name: String,
        status: QueryPhase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    SiteReady { site_name: String },
    DetachBatchSearch,
}

impl RuntimeCommand {
    /// Target site for commands that must be delivered to a site frame.
    pub fn frame_target(&self) -> Option<&str> {
        match self {
            RuntimeCommand::InjectQuery { site_name, .. }
            | RuntimeCommand::InjectFile { site_name, .. }
            | RuntimeCommand::ExtractContent { site_name } => Some(site_name),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeCommand::InjectQuery { .. } => "INJECT_QUERY",
            RuntimeCommand::InjectFile { .. } => "INJECT_FILE",
            RuntimeCommand::ExtractContent { .. } => "EXTRACT_CONTENT",
            RuntimeCommand::GetSiteConfig { .. } => "GET_SITE_CONFIG",
            RuntimeCommand::GetSettings => "GET_SETTINGS",
            RuntimeCommand::UpdateSettings { .. } => "UPDATE_SETTINGS",
            RuntimeCommand::QueryStatus { .. } => "QUERY_STATUS",
            RuntimeCommand::SiteReady { .. } => "SITE_READY",
            RuntimeCommand::DetachBatchSearch => "DETACH_BATCH_SEARCH",
        }
    }
}

/// Uniform reply of the runtime plane.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CommandResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            data: None,
        }
    }

    pub fn ok_with(data: Value) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: None,
        }
    }

    pub fn mismatch() -> Self {
        Self::fail(FRAME_SITE_MISMATCH)
    }

    pub fn is_mismatch(&self) -> bool {
        !self.success && self.error.as_deref() == Some(FRAME_SITE_MISMATCH)
    }
}

/// Messages posted between the batch page and a site iframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindowMessage {
    #[serde(rename_all = "camelCase")]
    InjectQueryViaPost {
        site_name: String,
        query: String,
        search_handler: StepHandler,
    },
    #[serde(rename_all = "camelCase")]
    InjectFileViaPost {
        site_name: String,
        #[serde(default)]
        files: Vec<FilePayload>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        focus_selector: Option<SelectorList>,
    },
    #[serde(rename_all = "camelCase")]
    ExtractContentViaPost {
        site_name: String,
        content_extractor: ContentExtractorConfig,
    },
    #[serde(rename_all = "camelCase")]
    GetUrlViaPost { site_name: String },
    #[serde(rename_all = "camelCase")]
    QueryStatus { site_name: String, status: FrameStatus },
    #[serde(rename_all = "camelCase")]
    FileUploadStatus { site_name: String, status: FrameStatus },
    #[serde(rename_all = "camelCase")]
    ExtractedContent {
        site_name: String,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<ConversationData>,
    },
    #[serde(rename_all = "camelCase")]
    CurrentUrl { site_name: String, url: String },
}

impl WindowMessage {
    pub fn site_name(&self) -> &str {
        match self {
            WindowMessage::InjectQueryViaPost { site_name, .. }
            | WindowMessage::InjectFileViaPost { site_name, .. }
            | WindowMessage::ExtractContentViaPost { site_name, .. }
            | WindowMessage::GetUrlViaPost { site_name }
            | WindowMessage::QueryStatus { site_name, .. }
            | WindowMessage::FileUploadStatus { site_name, .. }
            | WindowMessage::ExtractedContent { site_name, .. }
            | WindowMessage::CurrentUrl { site_name, .. } => site_name,
        }
    }

    /// Replies travel frame → batch page; requests the other way.
    pub fn is_reply(&self) -> bool {
        matches!(
            self,
            WindowMessage::QueryStatus { .. }
                | WindowMessage::FileUploadStatus { .. }
                | WindowMessage::ExtractedContent { .. }
                | WindowMessage::CurrentUrl { .. }
        )
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
