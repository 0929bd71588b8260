//! HTML to Markdown conversion and conversation formatting.

use chatcast_dom::{parse_html, Document, NodeId, NodeKind};
use chatcast_protocols::{ConversationData, SiteConversation};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::extractor::is_ui_artifact;

/// Body of a site section that produced no messages.
pub const NO_CONTENT_MARKER: &str = "*No content extracted*";

const DROPPED_TAGS: &[&str] = &[
    "input", "textarea", "select", "form", "label", "fieldset", "legend", "datalist", "output",
    "progress", "meter", "details", "summary", "dialog", "menu", "menuitem", "script", "style",
    "noscript", "iframe", "object", "embed", "video", "audio", "source", "canvas", "svg",
];

/// Squeeze runs of blank lines and trim leading newlines; the result ends in
/// at most one newline.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;
    for c in text.chars() {
        if c == '\n' {
            newlines += 1;
            continue;
        }
        if newlines > 0 {
            if !out.is_empty() {
                out.push_str(if newlines >= 2 { "\n\n" } else { "\n" });
            }
            newlines = 0;
        }
        out.push(c);
    }
    if newlines > 0 && !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Convert an HTML fragment to Markdown.
pub fn to_markdown(html: &str) -> String {
    let doc = parse_html(html);
    let converter = Converter { doc: &doc };
    collapse_whitespace(&converter.node(doc.body(), 0, 0))
}

struct Converter<'a> {
    doc: &'a Document,
}

impl Converter<'_> {
    fn children(&self, node: NodeId, depth: usize) -> String {
        self.doc
            .children(node)
            .iter()
            .map(|c| self.node(*c, depth, 0))
            .collect()
    }

    fn node(&self, node: NodeId, depth: usize, ordered_index: usize) -> String {
        let doc = self.doc;
        let tag = match doc.kind(node) {
            NodeKind::Text(text) => return text.clone(),
            NodeKind::Element(el) => el.tag.as_str(),
            _ => return String::new(),
        };
        if is_ui_artifact(doc, node) || DROPPED_TAGS.contains(&tag) {
            return String::new();
        }

        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = usize::from(tag.as_bytes()[1] - b'0');
                format!(
                    "\n\n{} {}\n\n",
                    "#".repeat(level),
                    self.children(node, depth).trim()
                )
            }
            "strong" | "b" => format!("**{}**", self.children(node, depth)),
            "em" | "i" => format!("*{}*", self.children(node, depth)),
            "del" | "s" => format!("~~{}~~", self.children(node, depth)),
            "code" => {
                if doc.parent(node).is_some_and(|p| doc.is_tag(p, "pre")) {
                    self.children(node, depth)
                } else {
                    format!("`{}`", self.children(node, depth))
                }
            }
            "pre" => self.code_block(node),
            "ul" | "ol" => {
                let ordered = tag == "ol";
                let items: String = doc
                    .element_children(node)
                    .into_iter()
                    .enumerate()
                    .map(|(i, li)| self.node(li, depth + 1, if ordered { i + 1 } else { 0 }))
                    .collect();
                format!("\n{}\n", items)
            }
            "li" => {
                let indent = "  ".repeat(depth.saturating_sub(1));
                let prefix = if ordered_index > 0 {
                    format!("{}. ", ordered_index)
                } else {
                    "- ".to_string()
                };
                format!("{}{}{}\n", indent, prefix, self.children(node, depth).trim())
            }
            "a" => {
                let text = self.children(node, depth);
                let text = text.trim();
                match doc.attr(node, "href").filter(|h| !h.is_empty()) {
                    Some(href) => format!("[{}]({})", text, href),
                    None => text.to_string(),
                }
            }
            "img" => format!(
                "![{}]({})",
                doc.attr(node, "alt").unwrap_or(""),
                doc.attr(node, "src").unwrap_or("")
            ),
            "br" => "\n".to_string(),
            "p" => format!("\n\n{}\n\n", self.children(node, depth).trim()),
            "blockquote" => {
                let inner = self.children(node, depth);
                let quoted: Vec<String> = inner.trim().split('\n').map(|l| format!("> {}", l)).collect();
                format!("\n\n{}\n\n", quoted.join("\n"))
            }
            "table" => format!("\n\n{}\n\n", self.table(node)),
            "hr" => "\n\n---\n\n".to_string(),
            _ => self.children(node, depth),
        }
    }

    fn code_block(&self, pre: NodeId) -> String {
        let doc = self.doc;
        let code = doc
            .descendant_elements(pre)
            .into_iter()
            .find(|n| doc.is_tag(*n, "code"));
        match code {
            Some(code) if is_ui_artifact(doc, code) => String::new(),
            Some(code) => {
                let lang = language_of(doc.class_name(code))
                    .or_else(|| language_of(doc.class_name(pre)))
                    .unwrap_or_default();
                format!("\n\n```{}\n{}\n```\n\n", lang, doc.text_content(code))
            }
            None => format!("\n\n```\n{}\n```\n\n", doc.text_content(pre)),
        }
    }

    fn table(&self, table: NodeId) -> String {
        let doc = self.doc;
        let thead = self.first_tag(table, "thead");

        let mut header: Vec<String> = Vec::new();
        if let Some(thead) = thead {
            if let Some(row) = self.first_tag(thead, "tr") {
                header = self.cells(row);
            }
        }

        let body = self.first_tag(table, "tbody").unwrap_or(table);
        let mut rows: Vec<Vec<String>> = doc
            .descendant_elements(body)
            .into_iter()
            .filter(|n| doc.is_tag(*n, "tr"))
            .filter(|tr| thead.is_none() || !self.inside_tag(*tr, "thead"))
            .map(|tr| self.cells(tr))
            .filter(|cells| !cells.is_empty())
            .collect();

        if header.is_empty() && !rows.is_empty() {
            header = rows.remove(0);
        }
        if header.is_empty() {
            return String::new();
        }

        let columns = rows.iter().map(Vec::len).chain([header.len()]).max().unwrap_or(0);
        let line = |cells: &[String]| {
            let mut padded: Vec<&str> = cells.iter().map(String::as_str).collect();
            padded.resize(columns, "");
            format!("| {} |", padded.join(" | "))
        };

        let mut lines = vec![line(header.as_slice()), format!("| {} |", vec!["---"; columns].join(" | "))];
        lines.extend(rows.iter().map(|r| line(r.as_slice())));
        lines.join("\n")
    }

    fn cells(&self, row: NodeId) -> Vec<String> {
        self.doc
            .descendant_elements(row)
            .into_iter()
            .filter(|n| self.doc.is_tag(*n, "td") || self.doc.is_tag(*n, "th"))
            .map(|cell| self.node(cell, 0, 0).trim().to_string())
            .collect()
    }

    fn first_tag(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        self.doc
            .descendant_elements(root)
            .into_iter()
            .find(|n| self.doc.is_tag(*n, tag))
    }

    /// `closest(tag)`: the node itself or an ancestor has `tag`.
    fn inside_tag(&self, node: NodeId, tag: &str) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.doc.is_tag(id, tag) {
                return true;
            }
            current = self.doc.parent(id);
        }
        false
    }
}

/// Language from `language-xxx` / `lang-xxx` class names.
fn language_of(class: &str) -> Option<String> {
    let mut rest = class;
    while !rest.is_empty() {
        let hit = ["language-", "lang-"]
            .iter()
            .filter_map(|p| rest.find(p).map(|i| (i, p.len())))
            .min_by_key(|(i, _)| *i);
        let Some((at, len)) = hit else {
            return None;
        };
        let after = &rest[at + len..];
        let word: String = after
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if !word.is_empty() {
            return Some(word);
        }
        rest = &rest[at + 1..];
    }
    None
}

/// Render one site's conversation.
pub fn format_conversation(data: &ConversationData) -> String {
    let mut parts: Vec<String> = Vec::new();
    for message in &data.messages {
        let role = format!("**{}**", message.role);
        if let Some(thinking) = &message.thinking {
            parts.push(format!("{} *(thinking)*: {}", role, thinking.content));
            parts.push(String::new());
        }
        let md = to_markdown(&message.content_html);
        parts.push(format!("{}: {}", role, md.trim()));
        parts.push("\n---\n".to_string());
    }
    collapse_whitespace(&parts.join("\n"))
}

/// Render every site's conversation under one export header, stamped now.
pub fn format_all_conversations(sites: &[SiteConversation]) -> String {
    format_all_conversations_at(sites, Utc::now())
}

pub fn format_all_conversations_at(sites: &[SiteConversation], at: DateTime<Utc>) -> String {
    let mut parts = vec![
        "# Conversation export".to_string(),
        String::new(),
        format!("*Exported: {}*", at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        String::new(),
    ];
    for site in sites {
        parts.push(format!("## {}", site.site_name));
        parts.push(String::new());
        if site.data.is_empty() {
            parts.push(NO_CONTENT_MARKER.to_string());
        } else {
            parts.push(format_conversation(&site.data).trim_end().to_string());
        }
        parts.push(String::new());
    }
    collapse_whitespace(&parts.join("\n"))
}

#[cfg(test)]
#[path = "markdown_tests.rs"]
mod tests;
