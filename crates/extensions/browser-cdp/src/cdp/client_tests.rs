use super::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_discover_reads_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Browser": "Chrome/126.0.6478.126",
            "Protocol-Version": "1.3",
            "User-Agent": "Mozilla/5.0",
            "V8-Version": "12.6.228.28",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/browser/abc"
        })))
        .mount(&server)
        .await;

    // A trailing slash on the endpoint is tolerated.
    let version = discover(&format!("{}/", server.uri())).await.unwrap();
    assert_eq!(version.browser, "Chrome/126.0.6478.126");
    assert_eq!(
        version.web_socket_debugger_url,
        "ws://127.0.0.1:9222/devtools/browser/abc"
    );
}

#[tokio::test]
async fn test_discover_reports_missing_browser() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = discover(&server.uri()).await.unwrap_err();
    assert!(matches!(err, CdpError::ChromeNotAvailable(_)));
}

#[tokio::test]
async fn test_list_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": "T1",
                "type": "page",
                "title": "chatcast",
                "url": "file:///home/u/.chatcast/batch-search.html",
                "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/page/T1"
            },
            {
                "id": "T2",
                "type": "iframe",
                "title": "Grok",
                "url": "https://grok.com/"
            }
        ])))
        .mount(&server)
        .await;

    let pages = list_pages(&server.uri()).await.unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].id, "T1");
    assert_eq!(pages[1].page_type, "iframe");
    assert!(pages[1].web_socket_debugger_url.is_none());
}
