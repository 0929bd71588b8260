//! [`FrameDriver`] over a live frame.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chatcast_automation::{
    ContentReset, DispatchTarget, DriverError, FrameDriver, SyntheticEvent, ValueSetter,
};
use chatcast_dom::{Document, ElementRef};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::cdp::{CdpError, PageSession};
use crate::scripts;
use crate::snapshot::{document_from_node, frame_document};

/// Extra time granted to the page-side bridge timer before giving up here.
const BRIDGE_GRACE: Duration = Duration::from_secs(1);

/// One frame of a tab, driven through an isolated world.
///
/// An out-of-process iframe has a session of its own (`frame_id` is the
/// session's target); a same-process frame shares its tab's session.
pub struct CdpFrame {
    session: Arc<PageSession>,
    frame_id: String,
    context: Mutex<Option<i64>>,
}

impl CdpFrame {
    pub fn new(session: Arc<PageSession>, frame_id: impl Into<String>) -> Self {
        Self {
            session,
            frame_id: frame_id.into(),
            context: Mutex::new(None),
        }
    }

    pub fn frame_id(&self) -> &str {
        &self.frame_id
    }

    fn owns_session(&self) -> bool {
        self.session.target_id() == self.frame_id
    }

    async fn context(&self) -> Result<i64, CdpError> {
        let mut context = self.context.lock().await;
        if let Some(id) = *context {
            return Ok(id);
        }
        let id = self.session.create_isolated_world(&self.frame_id).await?;
        debug!(frame = %self.frame_id, context = id, "isolated world created");
        *context = Some(id);
        Ok(id)
    }

    async fn forget_context(&self) {
        *self.context.lock().await = None;
    }

    async fn try_call_on(&self, backend_id: i64, function: &str, args: Vec<Value>) -> Result<Value, CdpError> {
        let context = self.context().await?;
        let object = self.session.resolve_node(backend_id, context).await?;
        let result = self.session.call_function_on(&object, function, args).await;
        if let Err(e) = self.session.release_object(&object).await {
            trace!("releasing {} failed: {}", object, e);
        }
        result
    }

    /// Run `function` with `this` bound to the element. A context lost to
    /// navigation is recreated once.
    async fn call_on(&self, element: &ElementRef, function: &str, args: Vec<Value>) -> Result<Value, DriverError> {
        let backend_id = element
            .backend_id
            .ok_or_else(|| DriverError::ElementGone(format!("{} has no backend node", element.node)))?;
        match self.try_call_on(backend_id, function, args.clone()).await {
            Err(e) if e.is_stale_context() => {
                self.forget_context().await;
                Ok(self.try_call_on(backend_id, function, args).await?)
            }
            other => Ok(other?),
        }
    }

    async fn call_in(&self, function: &str, args: Vec<Value>) -> Result<Value, DriverError> {
        let context = self.context().await?;
        match self.session.call_function_in(context, function, args.clone()).await {
            Err(e) if e.is_stale_context() => {
                self.forget_context().await;
                let context = self.context().await?;
                Ok(self.session.call_function_in(context, function, args).await?)
            }
            other => Ok(other?),
        }
    }
}

fn to_spec<T: serde::Serialize>(value: &T) -> Result<Value, DriverError> {
    serde_json::to_value(value).map_err(|e| DriverError::Script(e.to_string()))
}

#[async_trait]
impl FrameDriver for CdpFrame {
    async fn snapshot(&self) -> Result<Document, DriverError> {
        let root = self.session.get_document().await?;
        if self.owns_session() {
            return Ok(document_from_node(&root));
        }
        let frame = frame_document(&root, &self.frame_id)
            .ok_or_else(|| DriverError::Transport(format!("Frame {} is gone", self.frame_id)))?;
        Ok(document_from_node(frame))
    }

    async fn location(&self) -> Result<String, DriverError> {
        let context = self.context().await?;
        let value = match self.session.evaluate_in(context, scripts::LOCATION).await {
            Err(e) if e.is_stale_context() => {
                self.forget_context().await;
                let context = self.context().await?;
                self.session.evaluate_in(context, scripts::LOCATION).await?
            }
            other => other?,
        };
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn focus(&self, element: &ElementRef) -> Result<(), DriverError> {
        self.call_on(element, scripts::FOCUS, vec![]).await?;
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> Result<(), DriverError> {
        trace!(frame = %self.frame_id, node = %element.node, "click");
        self.call_on(element, scripts::CLICK, vec![]).await?;
        Ok(())
    }

    async fn is_disabled(&self, element: &ElementRef) -> Result<bool, DriverError> {
        let value = self.call_on(element, scripts::IS_DISABLED, vec![]).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn set_value(
        &self,
        element: &ElementRef,
        value: &str,
        setter: ValueSetter,
    ) -> Result<(), DriverError> {
        let native = setter == ValueSetter::Native;
        self.call_on(element, scripts::SET_VALUE, vec![json!(value), json!(native)])
            .await?;
        Ok(())
    }

    async fn read_value(&self, element: &ElementRef) -> Result<String, DriverError> {
        let value = self.call_on(element, scripts::READ_VALUE, vec![]).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn dispatch(
        &self,
        target: &DispatchTarget,
        event: &SyntheticEvent,
    ) -> Result<(), DriverError> {
        let spec = to_spec(event)?;
        trace!(frame = %self.frame_id, event = event.name(), "dispatch");
        match target {
            DispatchTarget::Element(element) => {
                self.call_on(element, scripts::DISPATCH, vec![spec]).await?;
            }
            DispatchTarget::ActiveElement => {
                self.call_in(scripts::DISPATCH, vec![spec]).await?;
            }
        }
        Ok(())
    }

    async fn exec_insert_text(&self, element: &ElementRef, text: &str) -> Result<bool, DriverError> {
        let value = self
            .call_on(element, scripts::EXEC_INSERT_TEXT, vec![json!(text)])
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn reset_content(
        &self,
        element: &ElementRef,
        reset: ContentReset,
        text: &str,
    ) -> Result<(), DriverError> {
        self.call_on(element, scripts::RESET_CONTENT, vec![to_spec(&reset)?, json!(text)])
            .await?;
        Ok(())
    }

    async fn quill_bridge(&self, text: &str, timeout: Duration) -> Result<bool, DriverError> {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let call = self.call_in(scripts::QUILL_BRIDGE, vec![json!(text), json!(millis)]);
        match tokio::time::timeout(timeout + BRIDGE_GRACE, call).await {
            Ok(value) => Ok(value?.as_bool().unwrap_or(false)),
            Err(_) => {
                debug!(frame = %self.frame_id, "quill bridge did not answer");
                Ok(false)
            }
        }
    }
}
