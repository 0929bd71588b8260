//! Conversation URL capture after a broadcast.
//!
//! Sites only move to a per-conversation URL once they have answered, so the
//! batch page asks every site frame for its location a few times after a send
//! and reports what it heard.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chatcast_protocols::{url_matches_host, SiteResult, WindowMessage};
use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::transport::WindowHost;

/// A site whose frame is polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTarget {
    pub site_name: String,
    pub site_url: String,
}

impl CaptureTarget {
    pub fn new(site_name: impl Into<String>, site_url: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            site_url: site_url.into(),
        }
    }
}

/// Running capture; cancelled on [`CaptureHandle::cancel`] or drop.
pub struct CaptureHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl CaptureHandle {
    pub fn cancel(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }

    /// All polling rounds have reported.
    pub fn is_finished(&self) -> bool {
        // The collector runs until cancelled.
        self.tasks.iter().skip(1).all(|t| t.is_finished())
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Start polling `targets` for their conversation URLs.
///
/// At each of `delays` every iframe is asked for its location (`GET_URL_VIA_POST`,
/// addressed to the first target it belongs to); `collect` later the full
/// per-target result set is handed to `on_captured`, with `None` for targets
/// that have not answered yet.
pub fn start_capture<F, Fut>(
    host: Arc<dyn WindowHost>,
    targets: Vec<CaptureTarget>,
    delays: Vec<Duration>,
    collect: Duration,
    on_captured: F,
) -> CaptureHandle
where
    F: Fn(Vec<SiteResult>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let collected: Arc<Mutex<HashMap<String, String>>> = Arc::new(Mutex::new(HashMap::new()));
    let targets = Arc::new(targets);
    let on_captured = Arc::new(on_captured);
    let mut tasks = Vec::with_capacity(delays.len() + 1);

    let mut rx = host.bus().subscribe();
    let sink = collected.clone();
    tasks.push(tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(WindowMessage::CurrentUrl { site_name, url }) => {
                    if !site_name.is_empty() && !url.is_empty() {
                        sink.lock().insert(site_name, url);
                    }
                }
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    }));

    for delay in delays {
        let host = host.clone();
        let targets = targets.clone();
        let collected = collected.clone();
        let on_captured = on_captured.clone();
        tasks.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            request_urls(host.as_ref(), &targets).await;
            tokio::time::sleep(collect).await;
            let results: Vec<SiteResult> = {
                let urls = collected.lock();
                targets
                    .iter()
                    .map(|t| SiteResult {
                        site_name: t.site_name.clone(),
                        conversation_url: urls.get(&t.site_name).cloned(),
                        response_preview: None,
                    })
                    .collect()
            };
            debug!(
                captured = results.iter().filter(|r| r.conversation_url.is_some()).count(),
                "capture round done"
            );
            on_captured(results).await;
        }));
    }

    CaptureHandle { tasks }
}

async fn request_urls(host: &dyn WindowHost, targets: &[CaptureTarget]) {
    let iframes = match host.iframes().await {
        Ok(iframes) => iframes,
        Err(e) => {
            warn!(error = %e, "cannot list iframes for capture");
            return;
        }
    };
    for iframe in iframes {
        let Some(target) = targets.iter().find(|t| url_matches_host(&iframe.src, &t.site_url)) else {
            continue;
        };
        let message = WindowMessage::GetUrlViaPost {
            site_name: target.site_name.clone(),
        };
        if let Err(e) = host.post(&iframe.frame_id, message).await {
            debug!(site = %target.site_name, error = %e, "url request not delivered");
        }
    }
}

/// Holds the current capture; starting a new one cancels the previous.
#[derive(Default)]
pub struct CaptureSlot {
    current: Mutex<Option<CaptureHandle>>,
}

impl CaptureSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, handle: CaptureHandle) {
        let previous = self.current.lock().replace(handle);
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    pub fn cancel(&self) {
        if let Some(handle) = self.current.lock().take() {
            handle.cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalWindowHost;
    use crate::test_fixtures::{agent, GROK_PAGE, GROK_URL, QWEN_URL};
    use tokio::sync::mpsc;

    fn targets() -> Vec<CaptureTarget> {
        vec![
            CaptureTarget::new("Grok", GROK_URL),
            CaptureTarget::new("Qwen", QWEN_URL),
        ]
    }

    fn host() -> Arc<LocalWindowHost> {
        let host = Arc::new(LocalWindowHost::new());
        let (_, grok) = agent("https://grok.com/c/42", GROK_PAGE);
        host.add_iframe("f-grok", "https://www.grok.com/", grok);
        host
    }

    fn recorder() -> (
        impl Fn(Vec<SiteResult>) -> futures::future::Ready<()> + Send + Sync + 'static,
        mpsc::UnboundedReceiver<Vec<SiteResult>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let callback = move |results: Vec<SiteResult>| {
            let _ = tx.send(results);
            futures::future::ready(())
        };
        (callback, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_rounds_report_all_targets() {
        let host = host();
        let (callback, mut rx) = recorder();
        let _handle = start_capture(
            host.clone(),
            targets(),
            vec![Duration::from_secs(5), Duration::from_secs(12)],
            Duration::from_secs(2),
            callback,
        );

        tokio::time::sleep(Duration::from_millis(6900)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(host.posts().len(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let first = rx.try_recv().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].conversation_url.as_deref(), Some("https://grok.com/c/42"));
        assert_eq!(first[1].site_name, "Qwen");
        assert_eq!(first[1].conversation_url, None);

        tokio::time::sleep(Duration::from_secs(7)).await;
        assert_eq!(rx.try_recv().unwrap().len(), 2);
        assert_eq!(host.posts().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_pending_rounds() {
        let host = host();
        let (callback, mut rx) = recorder();
        let slot = CaptureSlot::new();
        slot.replace(start_capture(
            host.clone(),
            targets(),
            vec![Duration::from_secs(5)],
            Duration::from_secs(2),
            callback,
        ));
        assert!(slot.is_active());

        let (second, mut second_rx) = recorder();
        slot.replace(start_capture(
            host.clone(),
            targets(),
            vec![Duration::from_secs(1)],
            Duration::from_secs(1),
            second,
        ));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
        assert!(second_rx.try_recv().is_ok());
        assert!(!slot.is_active());
        assert_eq!(host.posts().len(), 1);
    }
}
