//! Arena document tree.
//!
//! Nodes live in a flat arena and are addressed by [`NodeId`]. Detached nodes
//! stay in the arena; they are simply unreachable from the root.

use std::fmt;

use crate::error::SelectorError;
use crate::selector::Selector;
use crate::serialize;

/// Index of a node in its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tag name (lowercase) and attributes in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
    /// An open shadow root; its host is recorded on the slot.
    ShadowRoot,
}

/// A handle to an element that survives re-snapshotting a live frame.
///
/// `backend_id` is the browser's stable node id when the snapshot came from a
/// live page; snapshots parsed from HTML leave it empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef {
    pub node: NodeId,
    pub backend_id: Option<i64>,
}

#[derive(Debug, Clone)]
struct Slot {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    shadow_root: Option<NodeId>,
    host: Option<NodeId>,
    backend_id: Option<i64>,
}

impl Slot {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            shadow_root: None,
            host: None,
            backend_id: None,
        }
    }
}

/// A DOM snapshot.
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only its root node.
    pub fn new() -> Self {
        Self {
            slots: vec![Slot::new(NodeKind::Document)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.len() <= 1
    }

    fn slot(&self, id: NodeId) -> &Slot {
        &self.slots[id.0]
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut Slot {
        &mut self.slots[id.0]
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.slots.push(Slot::new(kind));
        NodeId(self.slots.len() - 1)
    }

    // ---- construction ----

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Comment(text.to_string()))
    }

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.slot_mut(child).parent = Some(parent);
        self.slot_mut(parent).children.push(child);
    }

    /// Attach an open shadow root to `host`, returning the existing one if present.
    pub fn attach_shadow(&mut self, host: NodeId) -> NodeId {
        if let Some(existing) = self.slot(host).shadow_root {
            return existing;
        }
        let root = self.push(NodeKind::ShadowRoot);
        self.slot_mut(root).host = Some(host);
        self.slot_mut(host).shadow_root = Some(root);
        root
    }

    /// Remove `node` from its parent. The subtree stays intact.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.slot_mut(node).parent.take() {
            self.slot_mut(parent).children.retain(|c| *c != node);
        }
    }

    pub fn remove_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.slot_mut(node).children);
        for child in children {
            self.slot_mut(child).parent = None;
        }
    }

    /// Replace all children with a single text node (`textContent = text`).
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.remove_children(node);
        if !text.is_empty() {
            let t = self.create_text(text);
            self.append_child(node, t);
        }
    }

    // ---- node access ----

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.slot(node).kind
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.slot(node).kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match &mut self.slot_mut(node).kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag.as_str())
    }

    pub fn is_tag(&self, node: NodeId, tag: &str) -> bool {
        self.tag(node) == Some(tag)
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?
            .attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.attr(node, name).is_some()
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(node) {
            match el.attrs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
                Some((_, v)) => *v = value.to_string(),
                None => el.attrs.push((name.to_ascii_lowercase(), value.to_string())),
            }
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let Some(el) = self.element_mut(node) {
            el.attrs.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        }
    }

    /// The raw `class` attribute, or "".
    pub fn class_name(&self, node: NodeId) -> &str {
        self.attr(node, "class").unwrap_or("")
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.class_name(node).split_ascii_whitespace().any(|c| c == class)
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if !self.has_class(node, class) {
            return;
        }
        let kept: Vec<&str> = self
            .class_name(node)
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect();
        let joined = kept.join(" ");
        self.set_attr(node, "class", &joined);
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slot(node).parent
    }

    /// Parent when it is an element.
    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node).filter(|p| self.is_element(*p))
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.slot(node).children
    }

    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
            .collect()
    }

    pub fn shadow_root(&self, node: NodeId) -> Option<NodeId> {
        self.slot(node).shadow_root
    }

    /// Host element of a shadow root.
    pub fn host(&self, shadow_root: NodeId) -> Option<NodeId> {
        self.slot(shadow_root).host
    }

    pub fn backend_id(&self, node: NodeId) -> Option<i64> {
        self.slot(node).backend_id
    }

    pub fn set_backend_id(&mut self, node: NodeId, id: i64) {
        self.slot_mut(node).backend_id = Some(id);
    }

    pub fn element_ref(&self, node: NodeId) -> ElementRef {
        ElementRef {
            node,
            backend_id: self.backend_id(node),
        }
    }

    /// Locate an element by its reference, preferring the backend id.
    pub fn lookup(&self, element: &ElementRef) -> Option<NodeId> {
        if let Some(id) = element.backend_id {
            return self
                .slots
                .iter()
                .position(|s| s.backend_id == Some(id))
                .map(NodeId);
        }
        (element.node.0 < self.slots.len()).then_some(element.node)
    }

    /// Descendants of `node` in document order, excluding `node`.
    ///
    /// Shadow roots are not entered.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Element descendants of `node` in document order.
    pub fn descendant_elements(&self, node: NodeId) -> Vec<NodeId> {
        self.descendants(node)
            .into_iter()
            .filter(|n| self.is_element(*n))
            .collect()
    }

    /// Whether `node` is `ancestor` or lies below it in the same tree.
    pub fn is_inclusive_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Concatenated text of all descendant text nodes (`textContent`).
    pub fn text_content(&self, node: NodeId) -> String {
        if let NodeKind::Text(t) = self.kind(node) {
            return t.clone();
        }
        let mut out = String::new();
        for id in self.descendants(node) {
            if let NodeKind::Text(t) = self.kind(id) {
                out.push_str(t);
            }
        }
        out
    }

    /// First element with the given tag in document order.
    pub fn first_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|n| self.is_tag(*n, tag))
    }

    /// `<body>`, or the root for documents without one.
    pub fn body(&self) -> NodeId {
        self.first_by_tag("body").unwrap_or(self.root())
    }

    // ---- cloning ----

    /// Deep copy `node` into a new document, appended under its root.
    ///
    /// Shadow roots are not copied, like `cloneNode(true)`.
    pub fn clone_subtree(&self, node: NodeId) -> (Document, NodeId) {
        let mut out = Document::new();
        let root = out.root();
        let top = self.copy_into(&mut out, node, root);
        (out, top)
    }

    /// Copy `node` and its light-tree descendants into `target` under `parent`.
    pub fn copy_into(&self, target: &mut Document, node: NodeId, parent: NodeId) -> NodeId {
        let top = target.push(self.slot(node).kind.clone());
        target.slot_mut(top).backend_id = self.slot(node).backend_id;
        target.append_child(parent, top);

        let mut stack: Vec<(NodeId, NodeId)> = self
            .children(node)
            .iter()
            .rev()
            .map(|c| (*c, top))
            .collect();
        while let Some((src, dst_parent)) = stack.pop() {
            let copy = target.push(self.slot(src).kind.clone());
            target.slot_mut(copy).backend_id = self.slot(src).backend_id;
            target.append_child(dst_parent, copy);
            stack.extend(self.children(src).iter().rev().map(|c| (*c, copy)));
        }
        top
    }

    // ---- selectors ----

    /// First descendant of `root` matching `selector` (`querySelector`).
    pub fn query_selector(
        &self,
        root: NodeId,
        selector: &str,
    ) -> Result<Option<NodeId>, SelectorError> {
        let parsed = Selector::parse(selector)?;
        Ok(self.query_compiled(root, &parsed))
    }

    /// All descendants of `root` matching `selector`, in document order.
    pub fn query_selector_all(
        &self,
        root: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>, SelectorError> {
        let parsed = Selector::parse(selector)?;
        Ok(self.query_all_compiled(root, &parsed))
    }

    /// Whether `node` itself matches `selector`.
    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool, SelectorError> {
        let parsed = Selector::parse(selector)?;
        Ok(parsed.matches(self, node))
    }

    pub fn query_compiled(&self, root: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|n| selector.matches(self, *n))
    }

    pub fn query_all_compiled(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    // ---- serialization ----

    pub fn inner_html(&self, node: NodeId) -> String {
        serialize::inner_html(self, node)
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        serialize::outer_html(self, node)
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
