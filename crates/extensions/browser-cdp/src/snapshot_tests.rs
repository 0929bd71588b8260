use super::*;
use chatcast_dom::find_str;
use serde_json::json;

fn node(value: serde_json::Value) -> DomNode {
    serde_json::from_value(value).unwrap()
}

/// A page with an open shadow host, a closed one and a same-process iframe.
fn page() -> DomNode {
    node(json!({
        "nodeId": 1, "backendNodeId": 1, "nodeType": 9, "nodeName": "#document",
        "children": [
            {"nodeId": 2, "backendNodeId": 2, "nodeType": 10, "nodeName": "html"},
            {"nodeId": 3, "backendNodeId": 3, "nodeType": 1, "nodeName": "HTML", "localName": "html",
             "attributes": [], "children": [
                {"nodeId": 4, "backendNodeId": 4, "nodeType": 1, "nodeName": "BODY", "localName": "body",
                 "attributes": [], "children": [
                    {"nodeId": 5, "backendNodeId": 50, "nodeType": 1, "nodeName": "CHAT-APP",
                     "localName": "chat-app", "attributes": [],
                     "shadowRoots": [
                        {"nodeId": 6, "backendNodeId": 6, "nodeType": 11, "nodeName": "#document-fragment",
                         "shadowRootType": "open", "children": [
                            {"nodeId": 7, "backendNodeId": 70, "nodeType": 1, "nodeName": "TEXTAREA",
                             "localName": "textarea", "attributes": ["id", "prompt"]}
                        ]}
                     ]},
                    {"nodeId": 8, "backendNodeId": 80, "nodeType": 1, "nodeName": "SECRET-BOX",
                     "localName": "secret-box", "attributes": [],
                     "shadowRoots": [
                        {"nodeId": 9, "backendNodeId": 9, "nodeType": 11, "nodeName": "#document-fragment",
                         "shadowRootType": "closed", "children": [
                            {"nodeId": 10, "backendNodeId": 100, "nodeType": 1, "nodeName": "BUTTON",
                             "localName": "button", "attributes": ["id", "hidden"]}
                        ]}
                     ]},
                    {"nodeId": 11, "backendNodeId": 110, "nodeType": 1, "nodeName": "P", "localName": "p",
                     "attributes": ["class", "note"], "children": [
                        {"nodeId": 12, "backendNodeId": 120, "nodeType": 3, "nodeName": "#text", "nodeValue": "hello"}
                     ]},
                    {"nodeId": 13, "backendNodeId": 130, "nodeType": 1, "nodeName": "IFRAME",
                     "localName": "iframe", "attributes": ["data-site", "Grok", "src", "https://grok.com/"],
                     "frameId": "F-grok",
                     "contentDocument": {
                        "nodeId": 14, "backendNodeId": 140, "nodeType": 9, "nodeName": "#document",
                        "children": [
                            {"nodeId": 15, "backendNodeId": 150, "nodeType": 1, "nodeName": "DIV",
                             "localName": "div", "attributes": ["class", "msg"]}
                        ]
                     }},
                    {"nodeId": 16, "backendNodeId": 160, "nodeType": 1, "nodeName": "IFRAME",
                     "localName": "iframe", "attributes": ["src", "https://chat.qwen.ai/"],
                     "frameId": "F-qwen"},
                    {"nodeId": 17, "backendNodeId": 170, "nodeType": 1, "nodeName": "IFRAME",
                     "localName": "iframe", "attributes": ["srcdoc", "<p>x</p>"], "frameId": "F-inline"}
                 ]}
             ]}
        ]
    }))
}

#[test]
fn test_open_shadow_roots_are_searchable() {
    let doc = document_from_node(&page());
    let textarea = find_str(&doc, "#prompt", doc.root()).unwrap().unwrap();
    assert_eq!(doc.backend_id(textarea), Some(70));
    assert_eq!(doc.element_ref(textarea).backend_id, Some(70));
}

#[test]
fn test_closed_shadow_roots_are_dropped() {
    let doc = document_from_node(&page());
    assert_eq!(find_str(&doc, "#hidden", doc.root()).unwrap(), None);
}

#[test]
fn test_text_and_attributes_survive() {
    let doc = document_from_node(&page());
    let p = doc.query_selector(doc.root(), "p.note").unwrap().unwrap();
    assert_eq!(doc.text_content(p), "hello");
    assert_eq!(doc.backend_id(p), Some(110));
}

#[test]
fn test_frame_documents_are_not_inlined() {
    let doc = document_from_node(&page());
    assert_eq!(doc.query_selector(doc.root(), ".msg").unwrap(), None);

    let root = page();
    let grok = frame_document(&root, "F-grok").unwrap();
    let frame_doc = document_from_node(grok);
    let msg = frame_doc.query_selector(frame_doc.root(), ".msg").unwrap().unwrap();
    assert_eq!(frame_doc.backend_id(msg), Some(150));
    assert!(frame_document(&root, "F-qwen").is_none());
}

#[test]
fn test_iframe_owners() {
    let owners = iframe_owners(&page());
    assert_eq!(
        owners,
        vec![
            IframeInfo {
                src: "https://grok.com/".into(),
                frame_id: "F-grok".into(),
            },
            IframeInfo {
                src: "https://chat.qwen.ai/".into(),
                frame_id: "F-qwen".into(),
            },
        ]
    );
}
