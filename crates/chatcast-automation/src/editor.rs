//! Committing text into page editors.

use std::time::Duration;

use chatcast_dom::{Document, NodeId};
use chatcast_protocols::InputType;
use tracing::{debug, warn};

use crate::driver::{ContentReset, DispatchTarget, FrameDriver, SyntheticEvent, ValueSetter};
use crate::error::DriverError;

/// Bridge timeout used when none is configured.
pub const DEFAULT_BRIDGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Rich-text editor family of a contenteditable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    /// A Quill editor is present in the frame; committed through the main-world bridge.
    Quill,
    Lexical,
    /// Tiptap / ProseMirror: DOM mutation only.
    Tiptap,
    Generic,
}

impl EditorKind {
    /// Editor family for `element`, giving priority to a Quill editor anywhere in the frame.
    pub fn detect(doc: &Document, element: NodeId) -> Self {
        let has_quill = doc
            .query_selector(doc.root(), ".ql-editor")
            .ok()
            .flatten()
            .is_some();
        if has_quill {
            EditorKind::Quill
        } else {
            Self::of_element(doc, element)
        }
    }

    /// Editor family from the element alone.
    pub fn of_element(doc: &Document, element: NodeId) -> Self {
        if doc.has_attr(element, "data-lexical-editor") {
            EditorKind::Lexical
        } else if doc.has_class(element, "tiptap") || doc.has_class(element, "ProseMirror") {
            EditorKind::Tiptap
        } else {
            EditorKind::Generic
        }
    }
}

/// Apply a [`ContentReset`] to an in-memory document.
pub fn apply_content_reset(doc: &mut Document, element: NodeId, reset: ContentReset, text: &str) {
    let paragraphs: Vec<NodeId> = doc
        .descendant_elements(element)
        .into_iter()
        .filter(|n| doc.is_tag(*n, "p"))
        .collect();
    for extra in paragraphs.iter().skip(1) {
        doc.detach(*extra);
    }

    match reset {
        ContentReset::Lexical => {
            let p = match paragraphs.first() {
                Some(p) => *p,
                None => {
                    let p = doc.create_element("p");
                    doc.append_child(element, p);
                    p
                }
            };
            doc.remove_children(p);
            if !text.trim().is_empty() {
                let span = doc.create_element("span");
                doc.set_attr(span, "data-lexical-text", "true");
                doc.set_text(span, text);
                doc.append_child(p, span);
            }
        }
        ContentReset::Paragraph => match paragraphs.first() {
            Some(p) => {
                doc.remove_class(*p, "is-empty");
                doc.remove_class(*p, "is-editor-empty");
                doc.set_text(*p, text);
            }
            None => {
                doc.remove_children(element);
                let p = doc.create_element("p");
                doc.set_text(p, text);
                doc.append_child(element, p);
            }
        },
    }
}

/// Commits text into the element a `setValue` step resolved.
pub struct EditorAdapter<'a> {
    driver: &'a dyn FrameDriver,
    bridge_timeout: Duration,
}

impl<'a> EditorAdapter<'a> {
    pub fn new(driver: &'a dyn FrameDriver) -> Self {
        Self {
            driver,
            bridge_timeout: DEFAULT_BRIDGE_TIMEOUT,
        }
    }

    pub fn with_bridge_timeout(mut self, timeout: Duration) -> Self {
        self.bridge_timeout = timeout;
        self
    }

    /// Commit `text` according to the step's input type.
    pub async fn commit(
        &self,
        doc: &Document,
        element: NodeId,
        input_type: Option<InputType>,
        text: &str,
    ) -> Result<(), DriverError> {
        match input_type {
            Some(InputType::Contenteditable) => self.commit_contenteditable(doc, element, text).await,
            Some(InputType::Angular) => self.commit_angular(doc, element, text).await,
            _ => self.commit_plain(doc, element, text).await,
        }
    }

    async fn commit_plain(&self, doc: &Document, element: NodeId, text: &str) -> Result<(), DriverError> {
        let el = doc.element_ref(element);
        self.driver.set_value(&el, text, ValueSetter::Native).await?;
        self.dispatch_input_change(&el, text).await
    }

    async fn commit_angular(&self, doc: &Document, element: NodeId, text: &str) -> Result<(), DriverError> {
        let el = doc.element_ref(element);
        self.driver.focus(&el).await?;
        self.driver.set_value(&el, text, ValueSetter::Assign).await?;
        self.dispatch_input_change(&el, text).await?;
        self.driver.focus(&el).await
    }

    async fn dispatch_input_change(
        &self,
        el: &chatcast_dom::ElementRef,
        text: &str,
    ) -> Result<(), DriverError> {
        let target = DispatchTarget::Element(*el);
        self.driver
            .dispatch(&target, &SyntheticEvent::input("insertText", text))
            .await?;
        self.driver.dispatch(&target, &SyntheticEvent::event("change")).await
    }

    async fn commit_contenteditable(
        &self,
        doc: &Document,
        element: NodeId,
        text: &str,
    ) -> Result<(), DriverError> {
        let el = doc.element_ref(element);
        self.driver.focus(&el).await?;

        let mut kind = EditorKind::detect(doc, element);
        if kind == EditorKind::Quill {
            match self.driver.quill_bridge(text, self.bridge_timeout).await {
                Ok(true) => {
                    debug!("committed through quill bridge");
                    return Ok(());
                }
                Ok(false) => warn!("quill bridge did not confirm, falling back"),
                Err(e) => warn!("quill bridge failed: {}, falling back", e),
            }
            kind = EditorKind::of_element(doc, element);
        }
        debug!(?kind, "committing contenteditable");

        match kind {
            EditorKind::Tiptap => {
                self.driver
                    .reset_content(&el, ContentReset::Paragraph, text)
                    .await
            }
            EditorKind::Lexical => {
                self.driver.reset_content(&el, ContentReset::Lexical, text).await?;
                self.simulate_typing(&el, text).await
            }
            EditorKind::Generic | EditorKind::Quill => {
                self.driver
                    .reset_content(&el, ContentReset::Paragraph, text)
                    .await?;
                self.simulate_typing(&el, text).await
            }
        }
    }

    /// Input/composition events, then execCommand, then a paste as last resort.
    async fn simulate_typing(
        &self,
        el: &chatcast_dom::ElementRef,
        text: &str,
    ) -> Result<(), DriverError> {
        let target = DispatchTarget::Element(*el);
        let events = [
            SyntheticEvent::input("insertText", text),
            SyntheticEvent::before_input("insertText", text),
            SyntheticEvent::composition("compositionstart", None),
            SyntheticEvent::composition("compositionupdate", Some(text)),
            SyntheticEvent::composition("compositionend", Some(text)),
            SyntheticEvent::event("change"),
        ];
        for event in &events {
            self.driver.dispatch(&target, event).await?;
        }

        let inserted = self
            .driver
            .exec_insert_text(el, text)
            .await
            .unwrap_or_else(|e| {
                debug!("execCommand failed: {}", e);
                false
            });
        if !inserted && !text.trim().is_empty() {
            let paste = [
                SyntheticEvent::before_input("insertFromPaste", text),
                SyntheticEvent::PasteText {
                    text: text.to_string(),
                },
            ];
            for event in &paste {
                if let Err(e) = self.driver.dispatch(&target, event).await {
                    debug!("paste simulation failed: {}", e);
                    break;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod tests;
