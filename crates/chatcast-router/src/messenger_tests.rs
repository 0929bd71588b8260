use super::*;
use crate::local::LocalWindowHost;
use crate::router::RuntimeRouter;
use crate::status::StatusBoard;
use crate::test_fixtures::{agent, batch_tabs, catalog, floats, kv, BATCH_URL, GROK_PAGE, GROK_URL};
use chatcast_automation::FrameAction;
use chatcast_protocols::{ContentExtractorConfig, SiteConfig};
use chatcast_store::SettingsStore;
use tokio::time::Instant;

fn grok() -> SiteConfig {
    catalog().find("Grok").unwrap().clone()
}

fn window_with_grok() -> (Arc<LocalWindowHost>, Arc<chatcast_automation::SnapshotFrame>) {
    let host = Arc::new(LocalWindowHost::new());
    let (frame, agent) = agent("https://grok.com/c/1", GROK_PAGE);
    host.add_iframe("f-grok", GROK_URL, agent);
    (host, frame)
}

fn runtime_handler() -> Arc<CommandHandler> {
    let (tabs, _, _) = batch_tabs();
    let store = kv();
    let floats = floats();
    let router = Arc::new(RuntimeRouter::new(tabs, floats.clone(), catalog(), BATCH_URL));
    Arc::new(CommandHandler::new(
        router,
        catalog(),
        Arc::new(SettingsStore::new(store)),
        floats,
        StatusBoard::new(),
    ))
}

#[tokio::test]
async fn test_inject_over_window_plane() {
    let (host, frame) = window_with_grok();
    let messenger = SiteMessenger::new(host.clone());
    messenger.inject_query(&grok(), "hello").await.unwrap();
    assert!(frame
        .journal()
        .iter()
        .any(|a| matches!(a, FrameAction::SetValue { value, .. } if value == "hello")));
    assert!(matches!(
        host.posts().as_slice(),
        [WindowMessage::InjectQueryViaPost { .. }]
    ));
}

#[tokio::test]
async fn test_window_error_status_is_failure() {
    let host = Arc::new(LocalWindowHost::new());
    let (_, agent) = agent(GROK_URL, GROK_PAGE);
    host.add_iframe("f-grok", GROK_URL, agent);
    let mut site = grok();
    site.search_handler.steps.clear();
    let err = SiteMessenger::new(host).inject_query(&site, "q").await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to execute search steps");
}

#[tokio::test]
async fn test_falls_back_to_runtime_without_iframe() {
    let host = Arc::new(LocalWindowHost::new());
    let messenger = SiteMessenger::new(host).with_runtime_fallback(runtime_handler());
    messenger.inject_query(&grok(), "hello").await.unwrap();
}

#[tokio::test]
async fn test_no_plane_available() {
    let host = Arc::new(LocalWindowHost::new());
    let err = SiteMessenger::new(host).inject_query(&grok(), "q").await.unwrap_err();
    assert!(matches!(err, RouteError::Unsupported(_)));
}

#[tokio::test]
async fn test_extract_over_window_plane() {
    let (host, _) = window_with_grok();
    let data = SiteMessenger::new(host).extract(&grok()).await.unwrap().unwrap();
    assert_eq!(data.messages.len(), 2);
}

#[tokio::test]
async fn test_extract_over_runtime_plane() {
    let host = Arc::new(LocalWindowHost::new());
    let messenger = SiteMessenger::new(host).with_runtime_fallback(runtime_handler());
    let data = messenger.extract(&grok()).await.unwrap().unwrap();
    assert_eq!(data.messages[1].content_html, "<p>A language.</p>");
}

#[tokio::test(start_paused = true)]
async fn test_extract_timeout_is_none() {
    let (host, _) = window_with_grok();
    let mut site = grok();
    site.content_extractor = Some(ContentExtractorConfig {
        message_container: Some("div[".into()),
        ..Default::default()
    });
    let start = Instant::now();
    let data = SiteMessenger::new(host)
        .with_timeouts(Duration::from_secs(5), Duration::from_secs(30))
        .extract(&site)
        .await
        .unwrap();
    assert_eq!(data, None);
    assert!(start.elapsed() >= Duration::from_secs(5));
}

#[tokio::test]
async fn test_extract_without_extractor() {
    let (host, _) = window_with_grok();
    let qwen = catalog().find("Qwen").unwrap().clone();
    assert_eq!(SiteMessenger::new(host).extract(&qwen).await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_upload_over_window_plane() {
    let (host, frame) = window_with_grok();
    let file = FilePayload {
        file_name: "notes.txt".into(),
        mime_type: "text/plain".into(),
        data: "aGk=".into(),
    };
    SiteMessenger::new(host.clone()).upload(&grok(), vec![file]).await.unwrap();
    match host.posts().as_slice() {
        [WindowMessage::InjectFileViaPost { focus_selector, .. }] => {
            assert_eq!(focus_selector.as_ref().map(|s| s.to_string()), Some("#ask".to_string()));
        }
        other => panic!("unexpected posts {:?}", other),
    }
    assert!(frame
        .journal()
        .iter()
        .any(|a| matches!(a, FrameAction::Dispatch { target, .. } if target == "textarea#ask")));
}
