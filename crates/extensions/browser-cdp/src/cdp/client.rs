//! CDP WebSocket client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use super::error::CdpError;
use super::protocol::{BrowserVersion, CdpEvent, CdpRequest, CdpResponse, PageInfo, TargetInfo};
use super::session::PageSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Key for events that carry no session id.
const BROWSER_EVENTS: &str = "";

/// Pending request waiting for response.
struct PendingRequest {
    tx: oneshot::Sender<Result<Value, CdpError>>,
}

/// The socket shared by the client and every session attached through it.
pub(crate) struct Wire {
    ws_tx: tokio::sync::Mutex<WsSink>,
    request_id: AtomicU64,
    pending: Mutex<HashMap<u64, PendingRequest>>,
    event_handlers: RwLock<HashMap<String, mpsc::UnboundedSender<CdpEvent>>>,
}

impl Wire {
    /// Send a command and wait for its response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(|s| s.to_string()),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, PendingRequest { tx });

        {
            let mut ws = self.ws_tx.lock().await;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(REQUEST_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }

    /// Route events for `session_id` to a fresh channel.
    pub(crate) fn subscribe(&self, session_id: &str) -> mpsc::UnboundedReceiver<CdpEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.event_handlers.write().insert(session_id.to_string(), tx);
        rx
    }

    pub(crate) fn unsubscribe(&self, session_id: &str) {
        self.event_handlers.write().remove(session_id);
    }

    fn dispatch(&self, resp: CdpResponse) {
        if let Some(id) = resp.id {
            let pending_req = self.pending.lock().remove(&id);
            if let Some(req) = pending_req {
                let result = match resp.error {
                    Some(error) => Err(CdpError::Protocol {
                        code: error.code,
                        message: error.message,
                    }),
                    None => Ok(resp.result.unwrap_or(Value::Null)),
                };
                let _ = req.tx.send(result);
            }
        } else if let Some(method) = resp.method {
            let session_id = resp.session_id.unwrap_or_default();
            let handlers = self.event_handlers.read();
            if let Some(tx) = handlers.get(&session_id) {
                let _ = tx.send(CdpEvent {
                    method,
                    params: resp.params.unwrap_or(Value::Null),
                });
            }
        }
    }

    /// Fail everything still waiting; the socket is gone.
    fn close(&self) {
        self.pending.lock().clear();
        self.event_handlers.write().clear();
    }
}

/// Fetch `/json/version` from a DevTools HTTP endpoint.
pub async fn discover(endpoint: &str) -> Result<BrowserVersion, CdpError> {
    let version_url = format!("{}/json/version", endpoint.trim_end_matches('/'));
    debug!("Fetching browser version from {}", version_url);

    reqwest::get(&version_url)
        .await
        .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
        .error_for_status()
        .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
        .json()
        .await
        .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))
}

/// Fetch `/json/list` from a DevTools HTTP endpoint.
pub async fn list_pages(endpoint: &str) -> Result<Vec<PageInfo>, CdpError> {
    let url = format!("{}/json/list", endpoint.trim_end_matches('/'));
    let pages: Vec<PageInfo> = reqwest::get(&url).await?.error_for_status()?.json().await?;
    Ok(pages)
}

/// CDP client for one browser.
///
/// All sessions share the browser WebSocket (flattened session mode).
pub struct CdpClient {
    /// HTTP endpoint for discovery.
    http_endpoint: String,
    browser_ws_url: String,
    wire: Arc<Wire>,
    _recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to the browser behind a DevTools HTTP endpoint.
    ///
    /// ```rust,ignore
    /// let client = CdpClient::connect("http://localhost:9222").await?;
    /// ```
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let http_endpoint = endpoint.trim_end_matches('/').to_string();
        let version = discover(&http_endpoint).await?;
        debug!("Connected to browser: {}", version.browser);

        let browser_ws_url = version.web_socket_debugger_url;
        let (ws_stream, _) = tokio_tungstenite::connect_async(browser_ws_url.as_str())
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let wire = Arc::new(Wire {
            ws_tx: tokio::sync::Mutex::new(ws_sink),
            request_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
            event_handlers: RwLock::new(HashMap::new()),
        });

        let recv_task = {
            let wire = wire.clone();
            tokio::spawn(async move {
                Self::receive_loop(ws_source, &wire).await;
                wire.close();
            })
        };

        debug!("CDP client connected to {}", browser_ws_url);

        Ok(Self {
            http_endpoint,
            browser_ws_url,
            wire,
            _recv_task: recv_task,
        })
    }

    async fn receive_loop(mut ws_source: WsSource, wire: &Wire) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("CDP recv: {}", text);
                    match serde_json::from_str::<CdpResponse>(&text) {
                        Ok(resp) => wire.dispatch(resp),
                        Err(e) => warn!("Failed to parse CDP message: {}", e),
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("WebSocket closed");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    }

    /// Browser-level command.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.wire.call(method, params, None).await
    }

    pub fn browser_ws_url(&self) -> &str {
        &self.browser_ws_url
    }

    /// Browser-level events (target discovery and the like).
    pub fn browser_events(&self) -> mpsc::UnboundedReceiver<CdpEvent> {
        self.wire.subscribe(BROWSER_EVENTS)
    }

    // ========================================================================
    // Target Management
    // ========================================================================

    pub async fn list_pages(&self) -> Result<Vec<PageInfo>, CdpError> {
        list_pages(&self.http_endpoint).await
    }

    pub async fn get_targets(&self) -> Result<Vec<TargetInfo>, CdpError> {
        let result = self.call("Target.getTargets", None).await?;
        let targets: Vec<TargetInfo> = serde_json::from_value(result["targetInfos"].clone())?;
        Ok(targets)
    }

    /// Open `url` in a new tab, or a new window when `new_window` is set.
    pub async fn create_target(&self, url: &str, new_window: bool) -> Result<String, CdpError> {
        let result = self
            .call(
                "Target.createTarget",
                Some(json!({"url": url, "newWindow": new_window})),
            )
            .await?;
        result["targetId"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CdpError::InvalidResponse("Missing targetId".to_string()))
    }

    /// Attach to an existing target.
    pub async fn attach(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({"targetId": target_id, "flatten": true})),
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        Ok(self.session(target_id, &session_id))
    }

    /// Wrap a session the browser already attached (auto-attach).
    pub fn session(&self, target_id: &str, session_id: &str) -> PageSession {
        let events = self.wire.subscribe(session_id);
        PageSession::new(target_id.to_string(), session_id.to_string(), self.wire.clone(), events)
    }

    pub async fn activate_target(&self, target_id: &str) -> Result<(), CdpError> {
        self.call("Target.activateTarget", Some(json!({"targetId": target_id})))
            .await?;
        Ok(())
    }

    pub async fn close_target(&self, target_id: &str) -> Result<(), CdpError> {
        self.call("Target.closeTarget", Some(json!({"targetId": target_id})))
            .await?;
        Ok(())
    }

    /// Browser window holding `target_id`.
    pub async fn window_for_target(&self, target_id: &str) -> Result<i64, CdpError> {
        let result = self
            .call(
                "Browser.getWindowForTarget",
                Some(json!({"targetId": target_id})),
            )
            .await?;
        result["windowId"]
            .as_i64()
            .ok_or_else(|| CdpError::InvalidResponse("Missing windowId".to_string()))
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self._recv_task.abort();
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
