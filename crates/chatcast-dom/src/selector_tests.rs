use super::*;
use crate::parse::parse_html;

fn first(html: &str, selector: &str) -> Option<String> {
    let doc = parse_html(html);
    doc.query_selector(doc.root(), selector)
        .unwrap()
        .map(|n| doc.attr(n, "id").unwrap_or("").to_string())
}

fn all(html: &str, selector: &str) -> Vec<String> {
    let doc = parse_html(html);
    doc.query_selector_all(doc.root(), selector)
        .unwrap()
        .into_iter()
        .map(|n| doc.attr(n, "id").unwrap_or("").to_string())
        .collect()
}

const PAGE: &str = r#"
<main id="main">
  <div id="d1" class="msg user" data-role="user" lang="en-US">
    <p id="p1" class="text">one</p>
    <p id="p2">two</p>
  </div>
  <div id="d2" class="msg" data-testid="send-button" aria-label="Send message">
    <span id="s1"><b id="b1">x</b></span>
  </div>
  <textarea id="prompt-textarea"></textarea>
</main>
"#;

#[test]
fn test_type_id_class() {
    assert_eq!(first(PAGE, "textarea").as_deref(), Some("prompt-textarea"));
    assert_eq!(first(PAGE, "#d2").as_deref(), Some("d2"));
    assert_eq!(first(PAGE, "textarea#prompt-textarea").as_deref(), Some("prompt-textarea"));
    assert_eq!(all(PAGE, ".msg"), vec!["d1", "d2"]);
    assert_eq!(all(PAGE, "div.msg.user"), vec!["d1"]);
    assert_eq!(first(PAGE, "span.msg"), None);
}

#[test]
fn test_universal() {
    assert_eq!(all(PAGE, "#d1 > *"), vec!["p1", "p2"]);
}

#[test]
fn test_attribute_operators() {
    assert_eq!(all(PAGE, "[data-role]"), vec!["d1"]);
    assert_eq!(all(PAGE, r#"[data-testid="send-button"]"#), vec!["d2"]);
    assert_eq!(all(PAGE, "[data-testid=send-button]"), vec!["d2"]);
    assert_eq!(all(PAGE, "[class~=user]"), vec!["d1"]);
    assert_eq!(all(PAGE, "[aria-label^='Send']"), vec!["d2"]);
    assert_eq!(all(PAGE, "[aria-label$=message]"), vec!["d2"]);
    assert_eq!(all(PAGE, "[aria-label*=\"d m\"]"), vec!["d2"]);
    assert_eq!(all(PAGE, "[lang|=en]"), vec!["d1"]);
    assert_eq!(all(PAGE, "[aria-label='send message' i]"), vec!["d2"]);
    assert!(all(PAGE, "[aria-label='send message']").is_empty());
}

#[test]
fn test_combinators() {
    assert_eq!(all(PAGE, "main p"), vec!["p1", "p2"]);
    assert_eq!(all(PAGE, "div > b"), Vec::<String>::new());
    assert_eq!(all(PAGE, "div b"), vec!["b1"]);
    assert_eq!(all(PAGE, "span > b"), vec!["b1"]);
    assert_eq!(all(PAGE, "#p1 + p"), vec!["p2"]);
    assert_eq!(all(PAGE, "#d1 ~ textarea"), vec!["prompt-textarea"]);
}

#[test]
fn test_pseudo_classes() {
    assert_eq!(all(PAGE, "#d1 p:first-child"), vec!["p1"]);
    assert_eq!(all(PAGE, "#d1 p:last-child"), vec!["p2"]);
    assert_eq!(all(PAGE, "span:only-child"), vec!["s1"]);
    assert_eq!(all(PAGE, "div:not(.user)"), vec!["d2"]);
    assert_eq!(all(PAGE, "p:not(.text, #nope)"), vec!["p2"]);
}

#[test]
fn test_comma_list_is_document_order() {
    assert_eq!(all(PAGE, "textarea, #d1"), vec!["d1", "prompt-textarea"]);
}

#[test]
fn test_escaped_class() {
    let html = r#"<div id="x" class="md:text-lg"></div>"#;
    assert_eq!(first(html, r".md\:text-lg").as_deref(), Some("x"));
}

#[test]
fn test_invalid_selectors() {
    assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
    assert!(matches!(Selector::parse("div["), Err(SelectorError::Invalid { .. })));
    assert!(matches!(Selector::parse("a >"), Err(SelectorError::Invalid { .. })));
    assert!(matches!(Selector::parse("a,,b"), Err(SelectorError::Invalid { .. })));
    assert!(matches!(Selector::parse("[x='open"), Err(SelectorError::Invalid { .. })));
}

#[test]
fn test_unsupported_selectors() {
    assert!(matches!(Selector::parse("a:has(b)"), Err(SelectorError::Unsupported { .. })));
    assert!(matches!(Selector::parse("p::before"), Err(SelectorError::Unsupported { .. })));
}

#[test]
fn test_matching_does_not_cross_shadow_roots() {
    let doc = parse_html(
        r#"<div class="outer"><x-host><template shadowrootmode="open"><p id="inner">in</p></template></x-host></div>"#,
    );
    let host = doc.first_by_tag("x-host").unwrap();
    let shadow = doc.shadow_root(host).unwrap();
    // Light-tree query does not see shadow content.
    assert_eq!(doc.query_selector(doc.root(), "#inner").unwrap(), None);
    // Inside the shadow tree, ancestors stop at the shadow root.
    assert!(doc.query_selector(shadow, "#inner").unwrap().is_some());
    assert_eq!(doc.query_selector(shadow, ".outer p").unwrap(), None);
}

#[test]
fn test_display_is_trimmed_source() {
    let sel = Selector::parse("  div > p ").unwrap();
    assert_eq!(sel.to_string(), "div > p");
    let parsed: Selector = "a.b".parse().unwrap();
    assert_eq!(parsed.source(), "a.b");
}
