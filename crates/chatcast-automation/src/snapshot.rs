//! An in-memory frame backed by a [`Document`].
//!
//! Used for dry runs against saved pages and as the frame in tests. Every
//! write is recorded in a journal of [`FrameAction`]s.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chatcast_dom::{Document, ElementRef, NodeId};
use parking_lot::Mutex;
use serde::Serialize;

use crate::driver::{ContentReset, DispatchTarget, FrameDriver, SyntheticEvent, ValueSetter};
use crate::editor::apply_content_reset;
use crate::error::DriverError;

/// A recorded write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum FrameAction {
    Focus { target: String },
    Click { target: String },
    SetValue { target: String, value: String, setter: ValueSetter },
    Dispatch { target: String, event: SyntheticEvent },
    ExecInsertText { target: String, text: String },
    ResetContent { target: String, reset: ContentReset, text: String },
    QuillBridge { text: String },
}

struct FrameState {
    doc: Document,
    active: Option<NodeId>,
    values: HashMap<NodeId, String>,
    journal: Vec<FrameAction>,
}

pub struct SnapshotFrame {
    location: String,
    exec_command_works: bool,
    quill_reply: Option<bool>,
    state: Mutex<FrameState>,
}

impl SnapshotFrame {
    pub fn new(location: impl Into<String>, doc: Document) -> Self {
        Self {
            location: location.into(),
            exec_command_works: true,
            quill_reply: None,
            state: Mutex::new(FrameState {
                doc,
                active: None,
                values: HashMap::new(),
                journal: Vec::new(),
            }),
        }
    }

    /// Parse `html` into a new frame.
    pub fn from_html(location: impl Into<String>, html: &str) -> Self {
        Self::new(location, chatcast_dom::parse_html(html))
    }

    /// Make `execCommand("insertText")` report failure, as in pages that block it.
    pub fn without_exec_command(mut self) -> Self {
        self.exec_command_works = false;
        self
    }

    /// Reply the main-world Quill bridge gives; no reply (timeout) by default.
    pub fn with_quill_reply(mut self, success: bool) -> Self {
        self.quill_reply = Some(success);
        self
    }

    /// Mutate the live document, as page scripts would.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        f(&mut self.state.lock().doc)
    }

    pub fn journal(&self) -> Vec<FrameAction> {
        self.state.lock().journal.clone()
    }

    pub fn value_of(&self, node: NodeId) -> Option<String> {
        self.state.lock().values.get(&node).cloned()
    }

    pub fn active_element(&self) -> Option<NodeId> {
        self.state.lock().active
    }

    pub fn document(&self) -> Document {
        self.state.lock().doc.clone()
    }

    fn resolve(state: &FrameState, element: &ElementRef) -> Result<NodeId, DriverError> {
        state
            .doc
            .lookup(element)
            .filter(|n| state.doc.is_element(*n))
            .ok_or_else(|| DriverError::ElementGone(element.node.to_string()))
    }
}

/// Short description of an element for the journal (`tag#id.class`).
pub fn describe(doc: &Document, node: NodeId) -> String {
    let mut out = doc.tag(node).unwrap_or("#node").to_string();
    if let Some(id) = doc.attr(node, "id").filter(|v| !v.is_empty()) {
        out.push('#');
        out.push_str(id);
    }
    for class in doc.class_name(node).split_ascii_whitespace().take(2) {
        out.push('.');
        out.push_str(class);
    }
    out
}

#[async_trait]
impl FrameDriver for SnapshotFrame {
    async fn snapshot(&self) -> Result<Document, DriverError> {
        Ok(self.state.lock().doc.clone())
    }

    async fn location(&self) -> Result<String, DriverError> {
        Ok(self.location.clone())
    }

    async fn focus(&self, element: &ElementRef) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        let node = Self::resolve(&state, element)?;
        state.active = Some(node);
        let target = describe(&state.doc, node);
        state.journal.push(FrameAction::Focus { target });
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        let node = Self::resolve(&state, element)?;
        let target = describe(&state.doc, node);
        state.journal.push(FrameAction::Click { target });
        Ok(())
    }

    async fn is_disabled(&self, element: &ElementRef) -> Result<bool, DriverError> {
        let state = self.state.lock();
        let node = Self::resolve(&state, element)?;
        Ok(state.doc.has_attr(node, "disabled"))
    }

    async fn set_value(
        &self,
        element: &ElementRef,
        value: &str,
        setter: ValueSetter,
    ) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        let node = Self::resolve(&state, element)?;
        state.values.insert(node, value.to_string());
        let target = describe(&state.doc, node);
        state.journal.push(FrameAction::SetValue {
            target,
            value: value.to_string(),
            setter,
        });
        Ok(())
    }

    async fn read_value(&self, element: &ElementRef) -> Result<String, DriverError> {
        let state = self.state.lock();
        let node = Self::resolve(&state, element)?;
        if let Some(v) = state.values.get(&node) {
            return Ok(v.clone());
        }
        let doc = &state.doc;
        let is_form_control = matches!(doc.tag(node), Some("input" | "textarea" | "select"));
        Ok(match doc.attr(node, "value") {
            Some(v) if is_form_control => v.to_string(),
            _ => doc.text_content(node),
        })
    }

    async fn dispatch(
        &self,
        target: &DispatchTarget,
        event: &SyntheticEvent,
    ) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        let node = match target {
            DispatchTarget::Element(el) => Self::resolve(&state, el)?,
            DispatchTarget::ActiveElement => match state.active {
                Some(n) => n,
                None => return Ok(()),
            },
        };
        let target = describe(&state.doc, node);
        state.journal.push(FrameAction::Dispatch {
            target,
            event: event.clone(),
        });
        Ok(())
    }

    async fn exec_insert_text(&self, element: &ElementRef, text: &str) -> Result<bool, DriverError> {
        let mut state = self.state.lock();
        let node = Self::resolve(&state, element)?;
        if !self.exec_command_works {
            return Ok(false);
        }
        let target = describe(&state.doc, node);
        state.journal.push(FrameAction::ExecInsertText {
            target,
            text: text.to_string(),
        });
        Ok(true)
    }

    async fn reset_content(
        &self,
        element: &ElementRef,
        reset: ContentReset,
        text: &str,
    ) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        let node = Self::resolve(&state, element)?;
        apply_content_reset(&mut state.doc, node, reset, text);
        let target = describe(&state.doc, node);
        state.journal.push(FrameAction::ResetContent {
            target,
            reset,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn quill_bridge(&self, text: &str, timeout: Duration) -> Result<bool, DriverError> {
        self.state.lock().journal.push(FrameAction::QuillBridge {
            text: text.to_string(),
        });
        match self.quill_reply {
            Some(reply) => Ok(reply),
            None => {
                tokio::time::sleep(timeout).await;
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_focus_tracks_active_element() {
        let frame = SnapshotFrame::from_html("https://a.test/", r#"<textarea id="q"></textarea>"#);
        let doc = frame.snapshot().await.unwrap();
        let q = doc.first_by_tag("textarea").unwrap();
        frame.focus(&doc.element_ref(q)).await.unwrap();
        assert_eq!(frame.active_element(), Some(q));
        assert_eq!(
            frame.journal(),
            vec![FrameAction::Focus { target: "textarea#q".into() }]
        );
    }

    #[tokio::test]
    async fn test_dispatch_to_missing_active_element_is_noop() {
        let frame = SnapshotFrame::from_html("https://a.test/", "<div></div>");
        frame
            .dispatch(&DispatchTarget::ActiveElement, &SyntheticEvent::event("paste"))
            .await
            .unwrap();
        assert!(frame.journal().is_empty());
    }

    #[tokio::test]
    async fn test_read_value_prefers_value_then_text() {
        let frame = SnapshotFrame::from_html(
            "https://a.test/",
            r#"<input id="i" value="typed"><div id="d">text</div>"#,
        );
        let doc = frame.snapshot().await.unwrap();
        let input = doc.first_by_tag("input").unwrap();
        let div = doc.query_selector(doc.root(), "#d").unwrap().unwrap();
        assert_eq!(frame.read_value(&doc.element_ref(input)).await.unwrap(), "typed");
        assert_eq!(frame.read_value(&doc.element_ref(div)).await.unwrap(), "text");

        frame
            .set_value(&doc.element_ref(input), "new", ValueSetter::Native)
            .await
            .unwrap();
        assert_eq!(frame.read_value(&doc.element_ref(input)).await.unwrap(), "new");
    }

    #[tokio::test]
    async fn test_stale_reference_is_error() {
        let frame = SnapshotFrame::from_html("https://a.test/", "<div></div>");
        let stale = ElementRef {
            node: chatcast_dom::Document::new().root(),
            backend_id: Some(99),
        };
        assert!(matches!(
            frame.click(&stale).await,
            Err(DriverError::ElementGone(_))
        ));
    }
}
