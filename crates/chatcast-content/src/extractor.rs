//! Conversation extraction from a document snapshot.
//!
//! Extraction is a pure read: containers are cloned before anything is removed.

use chatcast_dom::{Document, NodeId, Selector, SelectorError};
use chatcast_protocols::{ContentExtractorConfig, ConversationData, ConversationMessage, Role, ThinkingBlock};
use tracing::debug;

const UI_CLASS_PATTERNS: &[&str] = &["copy", "action", "feedback", "button"];

/// Whether an element is page chrome (copy buttons, feedback bars and the like).
pub fn is_ui_artifact(doc: &Document, node: NodeId) -> bool {
    let class = doc.class_name(node).to_lowercase();
    UI_CLASS_PATTERNS.iter().any(|p| class.contains(p))
}

struct Compiled {
    container: Selector,
    content: Vec<Selector>,
    exclude: Vec<Selector>,
    edit_mode: Option<Selector>,
    user: Option<Selector>,
    thinking: Option<Selector>,
    thinking_filters: Vec<Selector>,
}

fn parse_all<'a>(list: impl IntoIterator<Item = &'a String>) -> Result<Vec<Selector>, SelectorError> {
    list.into_iter().map(|s| Selector::parse(s)).collect()
}

fn parse_opt(selector: Option<&String>) -> Result<Option<Selector>, SelectorError> {
    selector
        .filter(|s| !s.trim().is_empty())
        .map(|s| Selector::parse(s))
        .transpose()
}

/// Extract the conversation visible in `doc`.
///
/// No `messageContainer`, or no container on the page, yields an empty
/// conversation. Only malformed selectors are errors.
pub fn extract(doc: &Document, config: &ContentExtractorConfig) -> Result<ConversationData, SelectorError> {
    let Some(container) = parse_opt(config.message_container.as_ref())? else {
        return Ok(ConversationData::default());
    };
    let compiled = Compiled {
        container,
        content: parse_all(
            config
                .content_selectors()
                .iter()
                .chain(config.fallback_selectors.iter()),
        )?,
        exclude: parse_all(&config.exclude_selectors)?,
        edit_mode: parse_opt(config.edit_mode_check.as_ref())?,
        user: parse_opt(config.user_message_selector.as_ref())?,
        thinking: if config.extract_thinking {
            parse_opt(config.thinking_selector.as_ref())?
        } else {
            None
        },
        thinking_filters: parse_all(&config.thinking_block_filters)?,
    };

    let containers = doc.query_all_compiled(doc.root(), &compiled.container);
    let mut data = ConversationData::default();

    for (index, container) in containers.into_iter().enumerate() {
        if let Some(edit) = &compiled.edit_mode {
            if query_shadow(doc, container, edit).is_some() {
                debug!(index, "skipping container in edit mode");
                continue;
            }
        }

        let role = determine_role(doc, container, index, compiled.user.as_ref());
        let Some(content_html) = container_content(doc, container, &compiled) else {
            continue;
        };

        let mut message = ConversationMessage::new(role, content_html);
        if role == Role::Assistant {
            if let Some(selector) = &compiled.thinking {
                message.thinking = thinking_block(doc, container, selector, &compiled.thinking_filters);
            }
        }
        data.messages.push(message);
    }

    Ok(data)
}

/// `querySelector` on the container, then on its own shadow root.
fn query_shadow(doc: &Document, container: NodeId, selector: &Selector) -> Option<NodeId> {
    doc.query_compiled(container, selector).or_else(|| {
        doc.shadow_root(container)
            .and_then(|shadow| doc.query_compiled(shadow, selector))
    })
}

/// Role from the user selector, else by position (even index = user).
///
/// The positional rule assumes strict alternation and breaks on pages that
/// render consecutive messages from the same author.
fn determine_role(doc: &Document, container: NodeId, index: usize, user: Option<&Selector>) -> Role {
    match user {
        Some(selector) => {
            if selector.matches(doc, container) || query_shadow(doc, container, selector).is_some() {
                Role::User
            } else {
                Role::Assistant
            }
        }
        None if index % 2 == 0 => Role::User,
        None => Role::Assistant,
    }
}

fn container_content(doc: &Document, container: NodeId, compiled: &Compiled) -> Option<String> {
    for selector in &compiled.content {
        if let Some(found) = query_shadow(doc, container, selector) {
            let (clean, top) = cleaned_clone(doc, found, &compiled.exclude);
            return Some(clean.inner_html(top));
        }
    }
    let (clean, top) = cleaned_clone(doc, container, &compiled.exclude);
    if clean.text_content(top).trim().is_empty() {
        None
    } else {
        Some(clean.inner_html(top))
    }
}

/// Clone `node`, drop excluded elements, then drop UI artifacts below it.
fn cleaned_clone(doc: &Document, node: NodeId, exclude: &[Selector]) -> (Document, NodeId) {
    let (mut clone, top) = doc.clone_subtree(node);
    remove_matching(&mut clone, top, exclude);
    let artifacts: Vec<NodeId> = clone
        .descendant_elements(top)
        .into_iter()
        .filter(|n| is_ui_artifact(&clone, *n))
        .collect();
    for node in artifacts {
        clone.detach(node);
    }
    (clone, top)
}

fn remove_matching(doc: &mut Document, top: NodeId, selectors: &[Selector]) {
    for selector in selectors {
        for node in doc.query_all_compiled(top, selector) {
            doc.detach(node);
        }
    }
}

fn thinking_block(
    doc: &Document,
    container: NodeId,
    selector: &Selector,
    filters: &[Selector],
) -> Option<ThinkingBlock> {
    let found = query_shadow(doc, container, selector)?;
    let (mut clone, top) = doc.clone_subtree(found);
    remove_matching(&mut clone, top, filters);
    let content = clone.text_content(top).trim().to_string();
    (!content.is_empty()).then_some(ThinkingBlock { content })
}

#[cfg(test)]
#[path = "extractor_tests.rs"]
mod tests;
