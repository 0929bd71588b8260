use super::*;
use chatcast_protocols::{ConversationMessage, Role};
use chrono::TimeZone;

#[test]
fn test_paragraph_spacing() {
    assert_eq!(to_markdown("<p>Hello</p><p>World</p>"), "Hello\n\nWorld\n");
}

#[test]
fn test_headings() {
    assert_eq!(to_markdown("<h2> Title </h2><p>x</p>"), "## Title\n\nx\n");
    assert_eq!(to_markdown("<h6>deep</h6>"), "###### deep\n");
}

#[test]
fn test_inline_formatting() {
    assert_eq!(
        to_markdown("<p>a <strong>b</strong> <em>c</em> <code>d</code> <del>e</del> <i>f</i></p>"),
        "a **b** *c* `d` ~~e~~ *f*\n"
    );
}

#[test]
fn test_nested_unordered_list() {
    assert_eq!(
        to_markdown("<ul><li>one</li><li>two<ul><li>nested</li></ul></li></ul>"),
        "- one\n- two\n  - nested\n"
    );
}

#[test]
fn test_ordered_list_numbering() {
    assert_eq!(to_markdown("<ol><li>a</li><li>b</li></ol>"), "1. a\n2. b\n");
}

#[test]
fn test_code_block_language() {
    assert_eq!(
        to_markdown(r#"<pre><code class="hljs language-rust">fn main() {}</code></pre>"#),
        "```rust\nfn main() {}\n```\n"
    );
    assert_eq!(
        to_markdown(r#"<pre class="lang-py"><code>x = 1</code></pre>"#),
        "```py\nx = 1\n```\n"
    );
    assert_eq!(to_markdown("<pre>plain</pre>"), "```\nplain\n```\n");
}

#[test]
fn test_artifact_code_block_dropped() {
    assert_eq!(
        to_markdown(r#"<p>a</p><pre><code class="copy-code">x</code></pre>"#),
        "a\n"
    );
}

#[test]
fn test_table_with_header() {
    let html = "<table><thead><tr><th>A</th><th>B</th></tr></thead>\
                <tbody><tr><td>1</td><td>2</td></tr></tbody></table>";
    assert_eq!(to_markdown(html), "| A | B |\n| --- | --- |\n| 1 | 2 |\n");
}

#[test]
fn test_table_header_from_first_row_and_padding() {
    let html = "<table><tr><td>h1</td><td>h2</td></tr><tr><td>x</td></tr></table>";
    assert_eq!(to_markdown(html), "| h1 | h2 |\n| --- | --- |\n| x |  |\n");
}

#[test]
fn test_empty_table_renders_nothing() {
    assert_eq!(to_markdown("<p>a</p><table></table>"), "a\n");
}

#[test]
fn test_links_and_images() {
    assert_eq!(
        to_markdown(r#"<p><a href="https://x.y">site</a> <a>bare</a> <img alt="pic" src="i.png"></p>"#),
        "[site](https://x.y) bare ![pic](i.png)\n"
    );
}

#[test]
fn test_blockquote_lines() {
    assert_eq!(
        to_markdown("<blockquote><p>line1<br>line2</p></blockquote>"),
        "> line1\n> line2\n"
    );
}

#[test]
fn test_ui_artifacts_and_form_controls_dropped() {
    let html = r#"<div><p>keep</p><button class="copy-button">Copy</button>
        <div class="message-Actions">x</div><script>alert(1)</script><form><input></form></div>"#;
    assert_eq!(to_markdown(html).trim(), "keep");
}

#[test]
fn test_horizontal_rule() {
    assert_eq!(to_markdown("<p>a</p><hr><p>b</p>"), "a\n\n---\n\nb\n");
}

#[test]
fn test_collapse_whitespace() {
    assert_eq!(collapse_whitespace("\n\n\na\n\n\n\nb\n\n\n"), "a\n\nb\n");
    assert_eq!(collapse_whitespace("a\nb"), "a\nb");
    assert_eq!(collapse_whitespace("\n\n"), "");
}

#[test]
fn test_language_of() {
    assert_eq!(language_of("hljs language-ts"), Some("ts".to_string()));
    assert_eq!(language_of("lang- lang-go"), Some("go".to_string()));
    assert_eq!(language_of("plain"), None);
}

#[test]
fn test_format_conversation() {
    let data = ConversationData {
        messages: vec![
            ConversationMessage::new(Role::User, "<p>Hi</p>"),
            ConversationMessage::new(Role::Assistant, "<p>Hello <b>there</b></p>")
                .with_thinking("pondering"),
        ],
    };
    assert_eq!(
        format_conversation(&data),
        "**user**: Hi\n\n---\n\n**assistant** *(thinking)*: pondering\n\n\
         **assistant**: Hello **there**\n\n---\n"
    );
}

#[test]
fn test_format_empty_conversation() {
    assert_eq!(format_conversation(&ConversationData::default()), "");
}

#[test]
fn test_format_all_conversations() {
    let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    let sites = vec![
        SiteConversation::new(
            "Grok",
            ConversationData {
                messages: vec![ConversationMessage::new(Role::User, "<p>q</p>")],
            },
        ),
        SiteConversation::new("Qwen", ConversationData::default()),
    ];
    assert_eq!(
        format_all_conversations_at(&sites, at),
        "# Conversation export\n\n*Exported: 2026-01-02T03:04:05Z*\n\n\
         ## Grok\n\n**user**: q\n\n---\n\n\
         ## Qwen\n\n*No content extracted*\n"
    );
}
