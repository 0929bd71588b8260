//! Shadow-piercing element resolution.

use chatcast_protocols::SelectorList;
use tracing::trace;

use crate::error::SelectorError;
use crate::node::{Document, NodeId};
use crate::selector::Selector;

/// Resolve the first element matching any candidate of `selectors` under `root`.
///
/// Candidates are tried in order against `root`; the first candidate with a
/// match wins. When nothing matches, every open shadow root below `root` is
/// searched the same way, hosts visited breadth first and nested roots before
/// later siblings. Blank candidates are ignored.
pub fn find(
    doc: &Document,
    selectors: &SelectorList,
    root: NodeId,
) -> Result<Option<NodeId>, SelectorError> {
    let compiled = compile(selectors.candidates())?;
    Ok(find_compiled(doc, &compiled, root))
}

/// [`find`] for a single selector string.
pub fn find_str(doc: &Document, selector: &str, root: NodeId) -> Result<Option<NodeId>, SelectorError> {
    find(doc, &SelectorList::from(selector), root)
}

pub(crate) fn compile(candidates: &[String]) -> Result<Vec<Selector>, SelectorError> {
    candidates
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| Selector::parse(s))
        .collect()
}

/// [`find`] over already parsed selectors.
pub fn find_compiled(doc: &Document, selectors: &[Selector], root: NodeId) -> Option<NodeId> {
    if selectors.is_empty() {
        return None;
    }
    let mut worklist = vec![root];
    while let Some(scope) = worklist.pop() {
        for selector in selectors {
            if let Some(found) = doc.query_compiled(scope, selector) {
                trace!(selector = %selector, "resolved {}", found);
                return Some(found);
            }
        }
        let shadow_roots = shadow_roots_breadth_first(doc, scope);
        worklist.extend(shadow_roots.into_iter().rev());
    }
    None
}

/// Open shadow roots hosted by elements under `scope`, hosts in breadth-first order.
fn shadow_roots_breadth_first(doc: &Document, scope: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut queue = std::collections::VecDeque::from(doc.element_children(scope));
    while let Some(el) = queue.pop_front() {
        if let Some(shadow) = doc.shadow_root(el) {
            out.push(shadow);
        }
        queue.extend(doc.element_children(el));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_html;

    #[test]
    fn test_light_dom_match() {
        let doc = parse_html(r#"<textarea id="a"></textarea><div id="b"></div>"#);
        let found = find(&doc, &SelectorList::from("#b"), doc.root()).unwrap().unwrap();
        assert_eq!(doc.attr(found, "id"), Some("b"));
    }

    #[test]
    fn test_candidate_order_beats_document_order() {
        let doc = parse_html(r#"<div id="first" class="x"></div><p id="second"></p>"#);
        let list = SelectorList::from(vec!["p", "div.x"]);
        let found = find(&doc, &list, doc.root()).unwrap().unwrap();
        assert_eq!(doc.attr(found, "id"), Some("second"));
    }

    #[test]
    fn test_pierces_open_shadow_root() {
        let doc = parse_html(
            r#"<app-root><template shadowrootmode="open"><chat-input><template shadowrootmode="open"><textarea id="deep"></textarea></template></chat-input></template></app-root>"#,
        );
        let found = find_str(&doc, "textarea", doc.root()).unwrap().unwrap();
        assert_eq!(doc.attr(found, "id"), Some("deep"));
    }

    #[test]
    fn test_nested_root_searched_before_later_sibling() {
        let doc = parse_html(concat!(
            r#"<x-a><template shadowrootmode="open"><x-b><template shadowrootmode="open"><p id="nested"></p></template></x-b></template></x-a>"#,
            r#"<x-c><template shadowrootmode="open"><p id="sibling"></p></template></x-c>"#,
        ));
        let found = find_str(&doc, "p", doc.root()).unwrap().unwrap();
        assert_eq!(doc.attr(found, "id"), Some("nested"));
    }

    #[test]
    fn test_light_match_preferred_over_shadow() {
        let doc = parse_html(
            r#"<x-a><template shadowrootmode="open"><p id="shadow"></p></template></x-a><p id="light"></p>"#,
        );
        let found = find_str(&doc, "p", doc.root()).unwrap().unwrap();
        assert_eq!(doc.attr(found, "id"), Some("light"));
    }

    #[test]
    fn test_not_found_is_none() {
        let doc = parse_html("<div></div>");
        assert_eq!(find_str(&doc, "textarea", doc.root()).unwrap(), None);
        assert_eq!(find(&doc, &SelectorList::Many(vec![]), doc.root()).unwrap(), None);
        assert_eq!(find(&doc, &SelectorList::from("  "), doc.root()).unwrap(), None);
    }

    #[test]
    fn test_invalid_selector_is_error() {
        let doc = parse_html("<div></div>");
        assert!(find_str(&doc, "div[", doc.root()).is_err());
    }

    #[test]
    fn test_scoped_to_root() {
        let doc = parse_html(r#"<div id="a"><span id="in"></span></div><span id="out"></span>"#);
        let a = doc.query_selector(doc.root(), "#a").unwrap().unwrap();
        let found = find_str(&doc, "span", a).unwrap().unwrap();
        assert_eq!(doc.attr(found, "id"), Some("in"));
    }
}
