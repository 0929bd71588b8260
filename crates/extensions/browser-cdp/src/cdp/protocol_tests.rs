use super::*;

#[test]
fn test_cdp_request_serialize() {
    let req = CdpRequest {
        id: 7,
        method: "Runtime.callFunctionOn".to_string(),
        params: Some(serde_json::json!({"objectId": "obj-1"})),
        session_id: Some("S1".to_string()),
    };
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["method"], "Runtime.callFunctionOn");
    assert_eq!(json["sessionId"], "S1");

    let bare = CdpRequest {
        id: 8,
        method: "Target.getTargets".to_string(),
        params: None,
        session_id: None,
    };
    let json = serde_json::to_string(&bare).unwrap();
    assert!(!json.contains("params"));
    assert!(!json.contains("sessionId"));
}

#[test]
fn test_event_deserialize() {
    let json = r#"{"method": "Fetch.requestPaused", "params": {"requestId": "r1"}, "sessionId": "S1"}"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.id, None);
    assert_eq!(resp.method.as_deref(), Some("Fetch.requestPaused"));
    assert_eq!(resp.session_id.as_deref(), Some("S1"));
}

#[test]
fn test_dom_node_attributes() {
    let json = r#"{
        "nodeId": 5, "backendNodeId": 42, "nodeType": 1, "nodeName": "IFRAME",
        "localName": "iframe", "attributes": ["data-site", "Grok", "src", "https://grok.com/"],
        "frameId": "F1"
    }"#;
    let node: DomNode = serde_json::from_str(json).unwrap();
    assert_eq!(node.tag(), "iframe");
    assert_eq!(node.attribute("src"), Some("https://grok.com/"));
    assert_eq!(node.attribute("data-site"), Some("Grok"));
    assert_eq!(node.attribute("title"), None);
    assert_eq!(node.frame_id.as_deref(), Some("F1"));
}

#[test]
fn test_frame_tree_flatten() {
    let json = r#"{
        "frame": {"id": "top", "url": "file:///tmp/batch-search.html"},
        "childFrames": [
            {"frame": {"id": "a", "parentId": "top", "url": "https://grok.com/"},
             "childFrames": [{"frame": {"id": "a1", "parentId": "a", "url": "about:blank"}}]},
            {"frame": {"id": "b", "parentId": "top", "url": "https://chat.qwen.ai/"}}
        ]
    }"#;
    let tree: FrameTree = serde_json::from_str(json).unwrap();
    let ids: Vec<String> = tree.flatten().into_iter().map(|f| f.id).collect();
    assert_eq!(ids, vec!["top", "a", "a1", "b"]);
}

#[test]
fn test_request_paused_deserialize() {
    let json = r#"{
        "requestId": "interception-1", "frameId": "F1", "resourceType": "Document",
        "responseStatusCode": 200,
        "responseHeaders": [{"name": "X-Frame-Options", "value": "DENY"}]
    }"#;
    let paused: RequestPaused = serde_json::from_str(json).unwrap();
    assert_eq!(paused.request_id, "interception-1");
    assert_eq!(
        paused.response_headers,
        Some(vec![HeaderEntry::new("X-Frame-Options", "DENY")])
    );
}

#[test]
fn test_document_pattern_serialize() {
    let json = serde_json::to_value(RequestPattern::documents()).unwrap();
    assert_eq!(json["resourceType"], "Document");
    assert_eq!(json["requestStage"], "Response");
}
