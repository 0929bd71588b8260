//! HTML serialization (`innerHTML` / `outerHTML`).

use crate::node::{Document, NodeId, NodeKind};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

pub(crate) fn inner_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    let raw = doc.tag(node).is_some_and(|t| RAW_TEXT_ELEMENTS.contains(&t));
    for child in doc.children(node) {
        write_node(doc, *child, raw, &mut out);
    }
    out
}

pub(crate) fn outer_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, false, &mut out);
    out
}

enum Work {
    Open(NodeId, bool),
    Close(String),
}

fn write_node(doc: &Document, node: NodeId, raw_parent: bool, out: &mut String) {
    let mut stack = vec![Work::Open(node, raw_parent)];
    while let Some(work) = stack.pop() {
        let (id, raw) = match work {
            Work::Close(tag) => {
                out.push_str("</");
                out.push_str(&tag);
                out.push('>');
                continue;
            }
            Work::Open(id, raw) => (id, raw),
        };
        match doc.kind(id) {
            NodeKind::Text(text) => {
                if raw {
                    out.push_str(text);
                } else {
                    escape_text(text, out);
                }
            }
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::Document | NodeKind::ShadowRoot => {
                for child in doc.children(id).iter().rev() {
                    stack.push(Work::Open(*child, false));
                }
            }
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_attr(value, out);
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                    continue;
                }
                let child_raw = RAW_TEXT_ELEMENTS.contains(&el.tag.as_str());
                stack.push(Work::Close(el.tag.clone()));
                for child in doc.children(id).iter().rev() {
                    stack.push(Work::Open(*child, child_raw));
                }
            }
        }
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}
