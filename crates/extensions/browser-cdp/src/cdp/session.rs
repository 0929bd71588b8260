//! CDP session attached to one target (a tab or an out-of-process iframe).

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::debug;

use super::client::Wire;
use super::error::CdpError;
use super::protocol::{CdpEvent, DomNode, FrameTree, HeaderEntry, RequestPattern};

/// Name of the isolated world automation runs in.
const WORLD_NAME: &str = "chatcast";

/// A session attached to a single target.
pub struct PageSession {
    target_id: String,
    session_id: String,
    wire: Arc<Wire>,
    events: Mutex<Option<mpsc::UnboundedReceiver<CdpEvent>>>,
}

impl PageSession {
    pub(crate) fn new(
        target_id: String,
        session_id: String,
        wire: Arc<Wire>,
        events: mpsc::UnboundedReceiver<CdpEvent>,
    ) -> Self {
        Self {
            target_id,
            session_id,
            wire,
            events: Mutex::new(Some(events)),
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Events for this session. Only the first caller gets the receiver.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<CdpEvent>> {
        self.events.lock().take()
    }

    /// Send a CDP command to this session.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.wire.call(method, params, Some(&self.session_id)).await
    }

    pub async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("DOM.enable", None).await?;
        self.call("Runtime.enable", None).await?;

        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    pub async fn navigate(&self, url: &str) -> Result<(), CdpError> {
        let result = self.call("Page.navigate", Some(json!({"url": url}))).await?;
        if let Some(error) = result["errorText"].as_str().filter(|e| !e.is_empty()) {
            return Err(CdpError::InvalidResponse(format!("Navigation to {} failed: {}", url, error)));
        }
        Ok(())
    }

    // ========================================================================
    // Frames and DOM
    // ========================================================================

    pub async fn frame_tree(&self) -> Result<FrameTree, CdpError> {
        let result = self.call("Page.getFrameTree", None).await?;
        Ok(serde_json::from_value(result["frameTree"].clone())?)
    }

    /// Whole document, piercing shadow roots and same-process frames.
    pub async fn get_document(&self) -> Result<DomNode, CdpError> {
        let result = self
            .call("DOM.getDocument", Some(json!({"depth": -1, "pierce": true})))
            .await?;
        Ok(serde_json::from_value(result["root"].clone())?)
    }

    /// Remote object id of a node, bound to `context_id`.
    pub async fn resolve_node(&self, backend_node_id: i64, context_id: i64) -> Result<String, CdpError> {
        let result = self
            .call(
                "DOM.resolveNode",
                Some(json!({
                    "backendNodeId": backend_node_id,
                    "executionContextId": context_id,
                })),
            )
            .await?;
        result["object"]["objectId"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CdpError::InvalidResponse("Missing objectId".to_string()))
    }

    // ========================================================================
    // Runtime
    // ========================================================================

    /// Isolated world in `frame_id`; returns its execution context id.
    pub async fn create_isolated_world(&self, frame_id: &str) -> Result<i64, CdpError> {
        let result = self
            .call(
                "Page.createIsolatedWorld",
                Some(json!({
                    "frameId": frame_id,
                    "worldName": WORLD_NAME,
                    "grantUniveralAccess": true,
                })),
            )
            .await?;
        result["executionContextId"]
            .as_i64()
            .ok_or_else(|| CdpError::InvalidResponse("Missing executionContextId".to_string()))
    }

    /// Evaluate an expression in `context_id`, awaiting promises.
    pub async fn evaluate_in(&self, context_id: i64, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "contextId": context_id,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;
        unwrap_result(result)
    }

    /// Call `function` with `this` bound to a remote object.
    pub async fn call_function_on(
        &self,
        object_id: &str,
        function: &str,
        args: Vec<Value>,
    ) -> Result<Value, CdpError> {
        let params = json!({
            "objectId": object_id,
            "functionDeclaration": function,
            "arguments": args.into_iter().map(|v| json!({"value": v})).collect::<Vec<_>>(),
            "returnByValue": true,
            "awaitPromise": true,
        });
        let result = self.call("Runtime.callFunctionOn", Some(params)).await?;
        unwrap_result(result)
    }

    /// Call `function` in a context, with `this` left as the global object.
    pub async fn call_function_in(
        &self,
        context_id: i64,
        function: &str,
        args: Vec<Value>,
    ) -> Result<Value, CdpError> {
        let params = json!({
            "executionContextId": context_id,
            "functionDeclaration": function,
            "arguments": args.into_iter().map(|v| json!({"value": v})).collect::<Vec<_>>(),
            "returnByValue": true,
            "awaitPromise": true,
        });
        let result = self.call("Runtime.callFunctionOn", Some(params)).await?;
        unwrap_result(result)
    }

    pub async fn release_object(&self, object_id: &str) -> Result<(), CdpError> {
        self.call("Runtime.releaseObject", Some(json!({"objectId": object_id})))
            .await?;
        Ok(())
    }

    /// Let a target paused by auto-attach start running.
    pub async fn run_if_waiting(&self) -> Result<(), CdpError> {
        self.call("Runtime.runIfWaitingForDebugger", None).await?;
        Ok(())
    }

    // ========================================================================
    // Frame guard plumbing
    // ========================================================================

    /// Main-world script run before any page script of every new document.
    pub async fn add_script_on_new_document(&self, source: &str) -> Result<(), CdpError> {
        self.call(
            "Page.addScriptToEvaluateOnNewDocument",
            Some(json!({"source": source})),
        )
        .await?;
        Ok(())
    }

    /// Auto-attach child targets (out-of-process iframes), paused until set up.
    pub async fn auto_attach(&self) -> Result<(), CdpError> {
        self.call(
            "Target.setAutoAttach",
            Some(json!({
                "autoAttach": true,
                "waitForDebuggerOnStart": true,
                "flatten": true,
            })),
        )
        .await?;
        Ok(())
    }

    pub async fn enable_fetch(&self, patterns: &[RequestPattern]) -> Result<(), CdpError> {
        self.call("Fetch.enable", Some(json!({"patterns": patterns})))
            .await?;
        Ok(())
    }

    /// Continue a paused response, replacing its headers when given.
    pub async fn continue_response(
        &self,
        request_id: &str,
        headers: Option<&[HeaderEntry]>,
    ) -> Result<(), CdpError> {
        match headers {
            Some(headers) => {
                self.call(
                    "Fetch.continueResponse",
                    Some(json!({"requestId": request_id, "responseHeaders": headers})),
                )
                .await?;
            }
            None => {
                self.call("Fetch.continueRequest", Some(json!({"requestId": request_id})))
                    .await?;
            }
        }
        Ok(())
    }

    /// Stop routing events for this session.
    pub fn detach_events(&self) {
        self.wire.unsubscribe(&self.session_id);
    }
}

/// `Runtime.evaluate` / `callFunctionOn` result value, or the thrown error.
fn unwrap_result(result: Value) -> Result<Value, CdpError> {
    if let Some(exception) = result.get("exceptionDetails") {
        let text = exception["exception"]["description"]
            .as_str()
            .or_else(|| exception["text"].as_str())
            .unwrap_or("Unknown error");
        return Err(CdpError::JavaScript(text.to_string()));
    }
    Ok(result["result"]["value"].clone())
}
