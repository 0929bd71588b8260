//! The frame driver seam.

use std::time::Duration;

use async_trait::async_trait;
use chatcast_dom::{Document, ElementRef};
use chatcast_protocols::FilePayload;
use serde::Serialize;

use crate::error::DriverError;
use crate::keys::KeyStroke;

/// Where a synthetic event is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchTarget {
    Element(ElementRef),
    /// `document.activeElement`; dispatch is a no-op when nothing has focus.
    ActiveElement,
}

/// A DOM event built and dispatched inside the frame. All events bubble and
/// are cancelable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SyntheticEvent {
    /// `new Event(name)`.
    Event { name: String },
    /// `new InputEvent(name, {inputType, data})`.
    #[serde(rename_all = "camelCase")]
    Input {
        name: String,
        input_type: String,
        data: String,
    },
    /// `new CompositionEvent(name, {data})`.
    Composition { name: String, data: Option<String> },
    /// `new KeyboardEvent(name, init)`.
    Key { name: String, stroke: KeyStroke },
    /// `paste` carrying a `text/plain` DataTransfer.
    PasteText { text: String },
    /// `paste` carrying files.
    PasteFiles { files: Vec<FilePayload> },
}

impl SyntheticEvent {
    pub fn event(name: impl Into<String>) -> Self {
        Self::Event { name: name.into() }
    }

    pub fn input(input_type: &str, data: impl Into<String>) -> Self {
        Self::Input {
            name: "input".to_string(),
            input_type: input_type.to_string(),
            data: data.into(),
        }
    }

    pub fn before_input(input_type: &str, data: impl Into<String>) -> Self {
        Self::Input {
            name: "beforeinput".to_string(),
            input_type: input_type.to_string(),
            data: data.into(),
        }
    }

    pub fn composition(name: &str, data: Option<&str>) -> Self {
        Self::Composition {
            name: name.to_string(),
            data: data.map(String::from),
        }
    }

    pub fn key(name: &str, stroke: KeyStroke) -> Self {
        Self::Key {
            name: name.to_string(),
            stroke,
        }
    }

    /// DOM event type.
    pub fn name(&self) -> &str {
        match self {
            Self::Event { name }
            | Self::Input { name, .. }
            | Self::Composition { name, .. }
            | Self::Key { name, .. } => name,
            Self::PasteText { .. } | Self::PasteFiles { .. } => "paste",
        }
    }
}

/// How a plain input receives its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueSetter {
    /// The prototype's native `value` setter, bypassing framework-installed setters.
    Native,
    /// A plain `element.value = v` assignment.
    Assign,
}

/// DOM rewrite applied to a contenteditable before text is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentReset {
    /// Keep the first `<p>`, empty it, append a `data-lexical-text` span.
    Lexical,
    /// Keep the first `<p>` and set its text, or rebuild a single `<p>`.
    Paragraph,
}

/// One frame of a chat site, as seen by the automation layer.
///
/// Reads happen on a [`Document`] snapshot; writes address elements through
/// [`ElementRef`]s taken from a snapshot.
#[async_trait]
pub trait FrameDriver: Send + Sync {
    /// Current DOM of the frame, open shadow roots included.
    async fn snapshot(&self) -> Result<Document, DriverError>;

    /// The frame's `location.href`.
    async fn location(&self) -> Result<String, DriverError>;

    async fn focus(&self, element: &ElementRef) -> Result<(), DriverError>;

    async fn click(&self, element: &ElementRef) -> Result<(), DriverError>;

    /// The element's `disabled` property.
    async fn is_disabled(&self, element: &ElementRef) -> Result<bool, DriverError>;

    async fn set_value(
        &self,
        element: &ElementRef,
        value: &str,
        setter: ValueSetter,
    ) -> Result<(), DriverError>;

    /// `value`, falling back to `innerText`, falling back to "".
    async fn read_value(&self, element: &ElementRef) -> Result<String, DriverError>;

    async fn dispatch(
        &self,
        target: &DispatchTarget,
        event: &SyntheticEvent,
    ) -> Result<(), DriverError>;

    /// Select the element's contents and run `execCommand("insertText")`.
    async fn exec_insert_text(&self, element: &ElementRef, text: &str) -> Result<bool, DriverError>;

    async fn reset_content(
        &self,
        element: &ElementRef,
        reset: ContentReset,
        text: &str,
    ) -> Result<(), DriverError>;

    /// Ask the page's main world to commit `text` through its Quill instance
    /// and press send. `false` when no reply arrives within `timeout`.
    async fn quill_bridge(&self, text: &str, timeout: Duration) -> Result<bool, DriverError>;
}
