use super::*;
use crate::local::LocalTabs;
use crate::test_fixtures::{agent, batch_tabs, catalog, floats, BATCH_URL, GROK_PAGE};
use chatcast_protocols::FloatState;

fn router(tabs: Arc<LocalTabs>) -> (RuntimeRouter, Arc<FloatStateStore>) {
    let floats = floats();
    let router = RuntimeRouter::new(tabs, floats.clone(), catalog(), BATCH_URL);
    (router, floats)
}

fn inject(site: &str) -> RuntimeCommand {
    RuntimeCommand::InjectQuery {
        site_name: site.into(),
        query: "hello".into(),
    }
}

#[tokio::test]
async fn test_find_batch_tab_by_url_prefix() {
    let (tabs, _, _) = batch_tabs();
    let (router, _) = router(tabs);
    assert_eq!(router.find_batch_tab().await.unwrap().id, "batch");
}

#[tokio::test]
async fn test_find_batch_tab_prefers_float() {
    let (tabs, _, _) = batch_tabs();
    tabs.add_tab("floating", &format!("{}#/", BATCH_URL));
    let (router, floats) = router(tabs);
    floats.set(&FloatState::new("floating", 7, 1)).await.unwrap();
    assert_eq!(router.find_batch_tab().await.unwrap().id, "floating");
}

#[tokio::test]
async fn test_stale_float_is_cleared() {
    let (tabs, _, _) = batch_tabs();
    let (router, floats) = router(tabs);
    floats.set(&FloatState::new("vanished", 7, 1)).await.unwrap();
    assert_eq!(router.find_batch_tab().await.unwrap().id, "batch");
    assert_eq!(floats.get().await.unwrap(), None);
}

#[tokio::test]
async fn test_no_batch_tab() {
    let tabs = Arc::new(LocalTabs::new());
    tabs.add_tab("other", "https://example.com/");
    let (router, _) = router(tabs);
    let err = router.route(&inject("Grok")).await.unwrap_err();
    assert_eq!(err.to_string(), "No batch-search tab found");
}

#[tokio::test]
async fn test_no_site_frames() {
    let tabs = Arc::new(LocalTabs::new());
    tabs.add_tab("batch", BATCH_URL);
    let (router, _) = router(tabs);
    assert!(matches!(
        router.route(&inject("Grok")).await,
        Err(RouteError::NoFrames)
    ));
}

#[tokio::test]
async fn test_direct_delivery_to_matching_frame() {
    let (tabs, grok, qwen) = batch_tabs();
    let (router, _) = router(tabs.clone());
    let response = router.route(&inject("Grok")).await.unwrap();
    assert!(response.success);
    assert_eq!(tabs.deliveries(), vec!["f-grok".to_string()]);
    assert!(!grok.journal().is_empty());
    assert!(qwen.journal().is_empty());
}

#[tokio::test]
async fn test_broadcast_when_frame_url_is_stale() {
    // Frame list still reports the login redirect for the Grok frame.
    let tabs = Arc::new(LocalTabs::new());
    tabs.add_tab("batch", BATCH_URL);
    let (_, qwen) = agent("https://chat.qwen.ai/", "");
    let (grok_frame, grok) = agent("https://grok.com/", GROK_PAGE);
    tabs.add_frame("batch", "f-qwen", "https://chat.qwen.ai/", Some(qwen));
    tabs.add_frame("batch", "f-grok", "https://accounts.x.ai/login", Some(grok));
    let (router, _) = router(tabs.clone());

    let response = router.route(&inject("Grok")).await.unwrap();
    assert!(response.success);
    assert_eq!(tabs.deliveries(), vec!["f-qwen".to_string(), "f-grok".to_string()]);
    assert!(!grok_frame.journal().is_empty());
}

#[tokio::test]
async fn test_mismatch_is_never_the_reported_error() {
    let tabs = Arc::new(LocalTabs::new());
    tabs.add_tab("batch", BATCH_URL);
    let (_, qwen) = agent("https://chat.qwen.ai/", "");
    tabs.add_frame("batch", "f-qwen", "https://chat.qwen.ai/", Some(qwen));
    tabs.add_frame("batch", "f-dead", "https://grok.com/", None);
    let (router, _) = router(tabs);

    let response = router.route(&inject("Grok")).await.unwrap();
    assert!(!response.success);
    assert!(!response.is_mismatch());
    assert!(response.error.unwrap().contains("Receiving end does not exist"));
}

#[tokio::test]
async fn test_unknown_site_and_non_frame_commands() {
    let (tabs, _, _) = batch_tabs();
    let (router, _) = router(tabs);
    assert!(matches!(
        router.route(&inject("Nope")).await,
        Err(RouteError::UnknownSite(_))
    ));
    assert!(matches!(
        router.route(&RuntimeCommand::GetSettings).await,
        Err(RouteError::Unsupported(_))
    ));
}
