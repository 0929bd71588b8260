//! HTML parsing into the arena [`Document`].

use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tracing::trace;

use crate::node::{Document, NodeId};

/// Parse a full document or a fragment (fragments land in `<body>`).
///
/// `<template shadowrootmode="open">` (or the older `shadowroot="open"`)
/// becomes an open shadow root of its parent element. Closed declarative
/// roots are dropped, as they are unreachable from page scripts.
pub fn parse_html(html: &str) -> Document {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
    let mut doc = Document::new();
    let root = doc.root();

    let mut stack: Vec<(Handle, NodeId)> = dom
        .document
        .children
        .borrow()
        .iter()
        .rev()
        .map(|c| (c.clone(), root))
        .collect();

    while let Some((handle, parent)) = stack.pop() {
        match &handle.data {
            NodeData::Element {
                name,
                attrs,
                template_contents,
                ..
            } => {
                let tag = name.local.as_ref();
                let attrs = attrs.borrow();
                let attr = |key: &str| {
                    attrs
                        .iter()
                        .find(|a| a.name.local.as_ref() == key)
                        .map(|a| a.value.to_string())
                };

                if tag == "template" {
                    let mode = attr("shadowrootmode").or_else(|| attr("shadowroot"));
                    if let Some(mode) = mode {
                        if mode.eq_ignore_ascii_case("open")
                            && doc.is_element(parent)
                            && doc.shadow_root(parent).is_none()
                        {
                            let shadow = doc.attach_shadow(parent);
                            trace!("attached declarative shadow root to {}", parent);
                            if let Some(contents) = template_contents.borrow().as_ref() {
                                push_children(&mut stack, contents, shadow);
                            }
                        }
                        continue;
                    }
                }

                let id = doc.create_element(tag);
                for a in attrs.iter() {
                    doc.set_attr(id, a.name.local.as_ref(), &a.value);
                }
                doc.append_child(parent, id);
                if tag != "template" {
                    push_children(&mut stack, &handle, id);
                }
            }
            NodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                let id = doc.create_text(&text);
                doc.append_child(parent, id);
            }
            NodeData::Comment { contents } => {
                let id = doc.create_comment(&contents.to_string());
                doc.append_child(parent, id);
            }
            NodeData::Document => push_children(&mut stack, &handle, parent),
            _ => {}
        }
    }

    doc
}

fn push_children(stack: &mut Vec<(Handle, NodeId)>, handle: &Handle, parent: NodeId) {
    for child in handle.children.borrow().iter().rev() {
        stack.push((child.clone(), parent));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_lands_in_body() {
        let doc = parse_html("<p>Hello <b>world</b></p>");
        let body = doc.body();
        assert!(doc.is_tag(body, "body"));
        let p = doc.element_children(body)[0];
        assert!(doc.is_tag(p, "p"));
        assert_eq!(doc.text_content(p), "Hello world");
    }

    #[test]
    fn test_attributes_kept_in_order() {
        let doc = parse_html(r#"<div id="a" class="x y" data-role="msg"></div>"#);
        let div = doc.first_by_tag("div").unwrap();
        let attrs = &doc.element(div).unwrap().attrs;
        assert_eq!(attrs[0], ("id".to_string(), "a".to_string()));
        assert_eq!(doc.attr(div, "data-role"), Some("msg"));
        assert!(doc.has_class(div, "y"));
    }

    #[test]
    fn test_declarative_shadow_root() {
        let doc = parse_html(
            r#"<chat-app><template shadowrootmode="open"><textarea id="q"></textarea></template><span>light</span></chat-app>"#,
        );
        let host = doc.first_by_tag("chat-app").unwrap();
        let shadow = doc.shadow_root(host).expect("shadow root attached");
        assert_eq!(doc.host(shadow), Some(host));
        let inner = doc.element_children(shadow);
        assert_eq!(inner.len(), 1);
        assert!(doc.is_tag(inner[0], "textarea"));
        // The light tree does not contain the shadow content.
        assert!(doc.first_by_tag("textarea").is_none());
        assert_eq!(doc.element_children(host).len(), 1);
    }

    #[test]
    fn test_closed_shadow_root_dropped() {
        let doc = parse_html(
            r#"<x-box><template shadowrootmode="closed"><b>secret</b></template></x-box>"#,
        );
        let host = doc.first_by_tag("x-box").unwrap();
        assert!(doc.shadow_root(host).is_none());
        assert!(doc.first_by_tag("b").is_none());
    }

    #[test]
    fn test_plain_template_is_inert() {
        let doc = parse_html("<template><p>inert</p></template>");
        assert!(doc.first_by_tag("template").is_some());
        assert!(doc.first_by_tag("p").is_none());
    }

    #[test]
    fn test_comments_preserved() {
        let doc = parse_html("<div><!-- note --></div>");
        let div = doc.first_by_tag("div").unwrap();
        assert_eq!(doc.inner_html(div), "<!-- note -->");
    }
}
