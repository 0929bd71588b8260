//! Turning `DOM.getDocument` trees into arena snapshots.

use chatcast_dom::{Document, NodeId};
use chatcast_router::IframeInfo;

use crate::cdp::DomNode;

/// Arena copy of a document node. Open shadow roots are kept; nested frame
/// documents are not, each frame gets its own snapshot.
pub fn document_from_node(root: &DomNode) -> Document {
    let mut doc = Document::new();
    let top = doc.root();
    if root.node_type == DomNode::DOCUMENT {
        if let Some(children) = &root.children {
            for child in children {
                copy_node(&mut doc, top, child);
            }
        }
    } else {
        copy_node(&mut doc, top, root);
    }
    doc
}

fn copy_node(doc: &mut Document, parent: NodeId, node: &DomNode) {
    let id = match node.node_type {
        DomNode::ELEMENT => {
            let id = doc.create_element(&node.tag());
            if let Some(attrs) = &node.attributes {
                for pair in attrs.chunks(2) {
                    if let [name, value] = pair {
                        doc.set_attr(id, name, value);
                    }
                }
            }
            id
        }
        DomNode::TEXT => doc.create_text(node.node_value.as_deref().unwrap_or("")),
        DomNode::COMMENT => doc.create_comment(node.node_value.as_deref().unwrap_or("")),
        // Doctype and friends carry nothing the resolver needs.
        _ => return,
    };
    doc.set_backend_id(id, node.backend_node_id);
    doc.append_child(parent, id);

    if let Some(shadows) = &node.shadow_roots {
        for shadow in shadows {
            if shadow.shadow_root_type.as_deref() != Some("open") {
                continue;
            }
            let root = doc.attach_shadow(id);
            for child in shadow.children.iter().flatten() {
                copy_node(doc, root, child);
            }
        }
    }
    for child in node.children.iter().flatten() {
        copy_node(doc, id, child);
    }
}

/// Document of the same-process frame `frame_id`, searched below `root`.
pub fn frame_document<'a>(root: &'a DomNode, frame_id: &str) -> Option<&'a DomNode> {
    if root.frame_id.as_deref() == Some(frame_id) && root.node_type == DomNode::ELEMENT {
        if let Some(content) = root.content_document.as_deref() {
            return Some(content);
        }
    }
    let shadows = root.shadow_roots.iter().flatten();
    let children = root.children.iter().flatten();
    let nested = root.content_document.as_deref().into_iter();
    shadows
        .chain(children)
        .chain(nested)
        .find_map(|n| frame_document(n, frame_id))
}

/// `<iframe>` elements of a page document that host a frame, in document order.
pub fn iframe_owners(root: &DomNode) -> Vec<IframeInfo> {
    let mut out = Vec::new();
    collect_iframes(root, &mut out);
    out
}

fn collect_iframes(node: &DomNode, out: &mut Vec<IframeInfo>) {
    if node.node_type == DomNode::ELEMENT && node.tag() == "iframe" {
        if let (Some(src), Some(frame_id)) = (node.attribute("src"), node.frame_id.as_deref()) {
            out.push(IframeInfo {
                src: src.to_string(),
                frame_id: frame_id.to_string(),
            });
        }
    }
    for shadow in node.shadow_roots.iter().flatten() {
        collect_iframes(shadow, out);
    }
    for child in node.children.iter().flatten() {
        collect_iframes(child, out);
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
