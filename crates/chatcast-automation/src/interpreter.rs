//! Sequential execution of declarative steps.

use std::future::Future;
use std::time::Duration;

use chatcast_dom::{find, Document, NodeId};
use chatcast_protocols::{InputType, SelectorList, Step, StepAction};
use tracing::{debug, error, warn};

use crate::driver::{DispatchTarget, FrameDriver, SyntheticEvent};
use crate::editor::{EditorAdapter, DEFAULT_BRIDGE_TIMEOUT};
use crate::error::DriverError;
use crate::keys::KeyStroke;

/// Poll `condition` up to `max_attempts` times, sleeping `interval` after each miss.
pub async fn wait_for<F, Fut>(
    mut condition: F,
    max_attempts: u32,
    interval: Duration,
) -> Result<bool, DriverError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, DriverError>>,
{
    for _ in 0..max_attempts {
        if condition().await? {
            return Ok(true);
        }
        tokio::time::sleep(interval).await;
    }
    Ok(false)
}

/// Run `steps` against `driver`; see [`StepInterpreter::run`].
pub async fn execute_steps(driver: &dyn FrameDriver, steps: &[Step], payload: &str) -> bool {
    StepInterpreter::new(driver).run(steps, payload).await
}

pub struct StepInterpreter<'a> {
    driver: &'a dyn FrameDriver,
    bridge_timeout: Duration,
}

impl<'a> StepInterpreter<'a> {
    pub fn new(driver: &'a dyn FrameDriver) -> Self {
        Self {
            driver,
            bridge_timeout: DEFAULT_BRIDGE_TIMEOUT,
        }
    }

    pub fn with_bridge_timeout(mut self, timeout: Duration) -> Self {
        self.bridge_timeout = timeout;
        self
    }

    /// Execute every step in order. Returns `false` as soon as a step fails.
    pub async fn run(&self, steps: &[Step], payload: &str) -> bool {
        for (index, step) in steps.iter().enumerate() {
            if let Err(e) = self.run_step(step, payload).await {
                error!(index, action = %step.action, "step failed: {}", e);
                return false;
            }
        }
        true
    }

    pub async fn run_step(&self, step: &Step, payload: &str) -> Result<(), DriverError> {
        let attempts = step.max_attempts();
        let interval = step.retry_interval();
        let selector = step.selector.as_ref().filter(|s| !s.is_empty());

        if step.wait_for_element {
            if let Some(sel) = selector {
                self.wait_for_element(sel, attempts, interval).await?;
            }
        }

        if step.action.needs_element() {
            if let Some(sel) = selector {
                if !self.wait_for_element(sel, attempts, interval).await? {
                    warn!(action = %step.action, selector = %sel, "element not found, skipping step");
                    return Ok(());
                }
            }
        }

        debug!(action = %step.action, description = step.description.as_deref().unwrap_or(""), "running step");
        match step.action {
            StepAction::Focus => {
                if let Some((doc, node)) = self.locate(selector).await? {
                    self.driver.focus(&doc.element_ref(node)).await?;
                }
            }
            StepAction::SetValue => {
                if let Some((doc, node)) = self.locate(selector).await? {
                    let adapter = EditorAdapter::new(self.driver).with_bridge_timeout(self.bridge_timeout);
                    if let Err(e) = adapter
                        .commit(&doc, node, step.input_type, step.value_for(payload))
                        .await
                    {
                        warn!("setValue could not commit: {}", e);
                    }
                }
            }
            StepAction::TriggerEvents => {
                if step.events.is_empty() {
                    return Ok(());
                }
                if let Some((doc, node)) = self.locate(selector).await? {
                    self.trigger_events(step, &doc, node).await?;
                }
            }
            StepAction::Click => {
                if let Some((doc, node)) = self.locate(selector).await? {
                    let el = doc.element_ref(node);
                    if step.retry_on_disabled {
                        let driver = self.driver;
                        let enabled = wait_for(
                            || async move { Ok::<_, DriverError>(!driver.is_disabled(&el).await?) },
                            attempts,
                            interval,
                        )
                        .await?;
                        if !enabled {
                            debug!("element still disabled, clicking anyway");
                        }
                    }
                    self.driver.click(&el).await?;
                }
            }
            StepAction::Wait => {
                if let Some(ms) = step.duration.filter(|ms| *ms > 0) {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                }
            }
            StepAction::SendKeys => {
                let Some(keys) = step.keys.as_deref() else {
                    return Ok(());
                };
                if let Some((doc, node)) = self.locate(selector).await? {
                    let target = DispatchTarget::Element(doc.element_ref(node));
                    let stroke = KeyStroke::parse(keys);
                    let chord = stroke.has_modifiers();
                    self.driver
                        .dispatch(&target, &SyntheticEvent::key("keydown", stroke.clone()))
                        .await?;
                    if chord {
                        self.driver
                            .dispatch(&target, &SyntheticEvent::key("keyup", stroke))
                            .await?;
                    }
                }
            }
            StepAction::Paste => {
                let target = match self.locate(selector).await? {
                    Some((doc, node)) => DispatchTarget::Element(doc.element_ref(node)),
                    None => DispatchTarget::ActiveElement,
                };
                let event = SyntheticEvent::PasteText {
                    text: step.value_for(payload).to_string(),
                };
                self.driver.dispatch(&target, &event).await?;
            }
            StepAction::Custom => {
                debug!(custom = step.custom_action.as_deref().unwrap_or(""), "custom step is a no-op");
            }
        }
        Ok(())
    }

    async fn trigger_events(&self, step: &Step, doc: &Document, node: NodeId) -> Result<(), DriverError> {
        let el = doc.element_ref(node);
        let target = DispatchTarget::Element(el);
        for name in &step.events {
            let event = if name == "input" && step.input_type == Some(InputType::Special) {
                let data = self.driver.read_value(&el).await?;
                SyntheticEvent::input("insertText", data)
            } else {
                SyntheticEvent::event(name.as_str())
            };
            self.driver.dispatch(&target, &event).await?;
        }
        Ok(())
    }

    async fn wait_for_element(
        &self,
        selector: &SelectorList,
        attempts: u32,
        interval: Duration,
    ) -> Result<bool, DriverError> {
        wait_for(
            || async move { Ok::<_, DriverError>(self.locate(Some(selector)).await?.is_some()) },
            attempts,
            interval,
        )
        .await
    }

    /// Snapshot the frame and resolve `selector` in it.
    async fn locate(
        &self,
        selector: Option<&SelectorList>,
    ) -> Result<Option<(Document, NodeId)>, DriverError> {
        let Some(selector) = selector else {
            return Ok(None);
        };
        let doc = self.driver.snapshot().await?;
        let root = doc.root();
        Ok(find(&doc, selector, root)?.map(|node| (doc, node)))
    }
}

#[cfg(test)]
#[path = "interpreter_tests.rs"]
mod tests;
