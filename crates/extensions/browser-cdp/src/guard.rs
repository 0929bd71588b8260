//! Frame guard: keeps site pages frameable inside the batch tab.
//!
//! Every session of the tab (and of the out-of-process iframes attached
//! under it) gets the main-world guard script, document response filtering
//! through `Fetch`, and child auto-attach.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cdp::{AttachedToTarget, CdpError, PageSession, RequestPattern, RequestPaused};
use crate::headers::strip_frame_headers;
use crate::scripts::FRAME_GUARD;
use crate::tabs::FrameRegistry;

/// Guard `tab_id` and watch its events until the session goes away.
pub async fn guard_tab(registry: &Arc<FrameRegistry>, tab_id: &str) -> Result<Arc<PageSession>, CdpError> {
    let session = registry.session(tab_id).await?;
    install(&session).await?;
    watch(registry.clone(), tab_id.to_string(), session.clone());
    debug!(tab = tab_id, "frame guard installed");
    Ok(session)
}

async fn install(session: &PageSession) -> Result<(), CdpError> {
    session.add_script_on_new_document(FRAME_GUARD).await?;
    session.enable_fetch(&[RequestPattern::documents()]).await?;
    session.auto_attach().await
}

fn watch(registry: Arc<FrameRegistry>, tab_id: String, session: Arc<PageSession>) {
    let Some(mut events) = session.take_events() else {
        return;
    };
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event.method.as_str() {
                "Fetch.requestPaused" => match serde_json::from_value::<RequestPaused>(event.params) {
                    Ok(paused) => {
                        let headers = paused.response_headers.unwrap_or_default();
                        let stripped = strip_frame_headers(&headers);
                        if stripped.is_some() {
                            debug!(frame = ?paused.frame_id, "framing headers stripped");
                        }
                        if let Err(e) = session
                            .continue_response(&paused.request_id, stripped.as_deref())
                            .await
                        {
                            warn!("Failed to continue {}: {}", paused.request_id, e);
                        }
                    }
                    Err(e) => warn!("Malformed Fetch.requestPaused: {}", e),
                },
                "Target.attachedToTarget" => match serde_json::from_value::<AttachedToTarget>(event.params) {
                    Ok(attached) => {
                        tokio::spawn(adopt(registry.clone(), tab_id.clone(), attached));
                    }
                    Err(e) => warn!("Malformed Target.attachedToTarget: {}", e),
                },
                "Target.detachedFromTarget" => {
                    if let Some(target) = event.params["targetId"].as_str() {
                        registry.forget(target);
                    }
                }
                _ => {}
            }
        }
        debug!(session = session.session_id(), "event stream ended");
    });
}

/// Set up a child target the browser attached and let it run.
async fn adopt(registry: Arc<FrameRegistry>, tab_id: String, attached: AttachedToTarget) {
    let target = attached.target_info;
    let child = Arc::new(registry.client().session(&target.target_id, &attached.session_id));
    if target.is_iframe() {
        let setup = async {
            child.enable_domains().await?;
            install(&child).await
        };
        match setup.await {
            Ok(()) => {
                registry.adopt(&tab_id, child.clone());
                watch(registry.clone(), tab_id, child.clone());
            }
            Err(e) => warn!(frame = %target.target_id, "Failed to guard iframe: {}", e),
        }
    }
    if attached.waiting_for_debugger {
        if let Err(e) = child.run_if_waiting().await {
            warn!(target = %target.target_id, "Failed to resume target: {}", e);
        }
    }
    if !target.is_iframe() {
        child.detach_events();
    }
}
