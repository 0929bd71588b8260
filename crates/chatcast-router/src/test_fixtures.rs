//! Shared test setup: a two-site catalog and a batch tab embedding both sites.

use std::sync::Arc;

use chatcast_automation::SnapshotFrame;
use chatcast_protocols::{
    ContentExtractorConfig, SiteConfig, SiteHandlersConfig, Step, StepAction, UrlExtractor,
};
use chatcast_store::{FloatStateStore, KeyValueStore, MemoryStore};

use crate::agent::FrameAgent;
use crate::local::LocalTabs;

pub const BATCH_URL: &str = "file:///tmp/chatcast/batch-search.html";

pub const GROK_URL: &str = "https://grok.com/";
pub const QWEN_URL: &str = "https://chat.qwen.ai/";

pub const GROK_PAGE: &str = r#"
<textarea id="ask"></textarea><button id="go">Send</button>
<div class="msg">What is Rust?</div>
<div class="msg"><p>A language.</p></div>
"#;

pub const QWEN_PAGE: &str = r#"
<div contenteditable="true" id="chat-input"></div><button id="send-message-button">Send</button>
"#;

pub fn catalog() -> Arc<SiteHandlersConfig> {
    let grok = SiteConfig::new("Grok", GROK_URL)
        .with_steps(vec![
            Step::new(StepAction::SetValue).with_selector("#ask"),
            Step::new(StepAction::Click).with_selector("#go"),
        ])
        .with_file_steps(vec![Step::new(StepAction::Focus).with_selector("#ask")])
        .with_extractor(ContentExtractorConfig {
            message_container: Some(".msg".into()),
            url_extractor: Some(UrlExtractor {
                alternate_link_selector: None,
                url_pattern: None,
                remove_params: vec!["utm_source".into()],
            }),
            ..Default::default()
        });
    let qwen = SiteConfig::new("Qwen", QWEN_URL).with_steps(vec![
        Step::new(StepAction::Focus).with_selector("#chat-input"),
        Step::new(StepAction::Click).with_selector("#send-message-button"),
    ]);
    Arc::new(SiteHandlersConfig {
        version: "1".into(),
        last_updated: None,
        description: None,
        author: None,
        sites: vec![grok, qwen],
    })
}

pub fn agent(location: &str, html: &str) -> (Arc<SnapshotFrame>, Arc<FrameAgent>) {
    let frame = Arc::new(SnapshotFrame::from_html(location, html));
    let agent = Arc::new(FrameAgent::new(frame.clone(), catalog()));
    (frame, agent)
}

pub fn kv() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::new())
}

pub fn floats() -> Arc<FloatStateStore> {
    Arc::new(FloatStateStore::new(kv()))
}

/// Tab `batch` embedding Grok (`f-grok`) and Qwen (`f-qwen`).
pub fn batch_tabs() -> (Arc<LocalTabs>, Arc<SnapshotFrame>, Arc<SnapshotFrame>) {
    let tabs = Arc::new(LocalTabs::new());
    tabs.add_tab("other", "https://example.com/");
    tabs.add_tab("batch", &format!("{}#/?q=", BATCH_URL));
    let (grok_frame, grok) = agent("https://grok.com/c/1", GROK_PAGE);
    let (qwen_frame, qwen) = agent(QWEN_URL, QWEN_PAGE);
    tabs.add_frame("batch", "f-grok", "https://grok.com/c/1", Some(grok));
    tabs.add_frame("batch", "f-qwen", QWEN_URL, Some(qwen));
    (tabs, grok_frame, qwen_frame)
}
