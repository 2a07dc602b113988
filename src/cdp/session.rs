//! Web surface over CDP
//!
//! Implements the driver boundary on top of a [`CdpConnection`]: lookups and
//! reads run as page scripts, pointer and touch input goes through the
//! `Input` domain.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::js;
use super::traits::CdpConnection;
use super::types::{MouseEvent, MouseEventKind, TouchEvent, TouchEventKind};
use crate::driver::{DriverSession, ElementRect, EvaluationResult, LiveElement, SwipeDirection};
use crate::locator::{Locator, Surface};
use crate::{Error, Result};

/// Driver session bound to one page target
#[derive(Debug, Clone)]
pub struct CdpSession {
    connection: Arc<dyn CdpConnection>,
}

impl CdpSession {
    pub fn new(connection: Arc<dyn CdpConnection>) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &Arc<dyn CdpConnection> {
        &self.connection
    }

    fn element(&self, key: String) -> Arc<dyn LiveElement> {
        Arc::new(CdpElement {
            key,
            connection: self.connection.clone(),
        })
    }

    async fn lookup(&self, locator: &Locator, all: bool) -> Result<Value> {
        if locator.surface() != Surface::Web {
            return Err(Error::invalid_locator(format!(
                "{} is not a web locator",
                locator
            )));
        }
        self.connection
            .evaluate(&js::find(locator, all))
            .await
            .map_err(|e| classify_lookup_error(e, locator))
    }
}

#[async_trait]
impl DriverSession for CdpSession {
    fn surface(&self) -> Surface {
        Surface::Web
    }

    #[instrument(skip(self))]
    async fn find_element(&self, locator: &Locator) -> Result<Arc<dyn LiveElement>> {
        match self.lookup(locator, false).await? {
            Value::String(key) => {
                debug!("Registered {} as {}", locator, key);
                Ok(self.element(key))
            }
            _ => Err(Error::not_found(locator.to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<Arc<dyn LiveElement>>> {
        match self.lookup(locator, true).await? {
            Value::Array(keys) => Ok(keys
                .into_iter()
                .filter_map(|k| k.as_str().map(str::to_string))
                .map(|key| self.element(key))
                .collect()),
            other => Err(Error::driver(format!("Unexpected lookup result: {}", other))),
        }
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<EvaluationResult> {
        let value = self
            .connection
            .evaluate(&js::user_script(script, &args))
            .await?;
        Ok(EvaluationResult::from_json(value))
    }

    async fn current_location(&self) -> Result<String> {
        match self.connection.evaluate("window.location.href").await? {
            Value::String(href) => Ok(href),
            other => Err(Error::driver(format!("Unexpected location: {}", other))),
        }
    }
}

/// Live reference to a node in the page registry
#[derive(Debug)]
pub struct CdpElement {
    key: String,
    connection: Arc<dyn CdpConnection>,
}

impl CdpElement {
    async fn run(&self, body: &str) -> Result<Value> {
        self.connection
            .evaluate(&js::on_element(&self.key, body))
            .await
            .map_err(classify_element_error)
    }

    async fn center(&self) -> Result<(f64, f64)> {
        Ok(self.rect().await?.center())
    }

    async fn mouse(&self, kind: MouseEventKind, at: (f64, f64)) -> Result<()> {
        let event = serde_json::to_value(MouseEvent::left(kind, at))?;
        self.connection.send_command("Input.dispatchMouseEvent", event).await?;
        Ok(())
    }

    async fn touch(&self, kind: TouchEventKind, at: (f64, f64)) -> Result<()> {
        let event = serde_json::to_value(TouchEvent::at(kind, at))?;
        self.connection.send_command("Input.dispatchTouchEvent", event).await?;
        Ok(())
    }

    /// Bring the node into the viewport and return its center
    async fn prepare_pointer(&self) -> Result<(f64, f64)> {
        self.run(js::SCROLL_INTO_VIEW).await?;
        self.center().await
    }
}

#[async_trait]
impl LiveElement for CdpElement {
    fn id(&self) -> &str {
        &self.key
    }

    async fn check_attached(&self) -> Result<()> {
        self.run(js::ATTACHED).await.map(|_| ())
    }

    async fn is_displayed(&self) -> Result<bool> {
        Ok(self.run(js::DISPLAYED).await?.as_bool().unwrap_or(false))
    }

    async fn is_enabled(&self) -> Result<bool> {
        Ok(self.run(js::ENABLED).await?.as_bool().unwrap_or(false))
    }

    async fn text(&self) -> Result<String> {
        Ok(self
            .run(js::TEXT)
            .await?
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .run(&js::attribute(name))
            .await?
            .as_str()
            .map(str::to_string))
    }

    async fn rect(&self) -> Result<ElementRect> {
        Ok(serde_json::from_value(self.run(js::RECT).await?)?)
    }

    #[instrument(skip(self), fields(element = %self.key))]
    async fn click(&self) -> Result<()> {
        let at = self.prepare_pointer().await?;
        self.mouse(MouseEventKind::MouseMoved, at).await?;
        self.mouse(MouseEventKind::MousePressed, at).await?;
        self.mouse(MouseEventKind::MouseReleased, at).await
    }

    async fn tap(&self) -> Result<()> {
        let at = self.prepare_pointer().await?;
        self.touch(TouchEventKind::TouchStart, at).await?;
        self.touch(TouchEventKind::TouchEnd, at).await
    }

    async fn send_keys(&self, text: &str) -> Result<()> {
        self.run(js::FOCUS).await?;
        self.connection
            .send_command("Input.insertText", serde_json::json!({ "text": text }))
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.run(js::CLEAR).await.map(|_| ())
    }

    async fn hover(&self) -> Result<()> {
        let at = self.prepare_pointer().await?;
        self.mouse(MouseEventKind::MouseMoved, at).await
    }

    async fn scroll_into_view(&self) -> Result<()> {
        self.run(js::SCROLL_INTO_VIEW).await.map(|_| ())
    }

    async fn swipe(&self, direction: SwipeDirection) -> Result<()> {
        let (x, y) = self.prepare_pointer().await?;
        let rect = self.rect().await?;
        let (dx, dy) = direction.offset();
        let end = (x + dx * rect.width / 2.0, y + dy * rect.height / 2.0);
        self.touch(TouchEventKind::TouchStart, (x, y)).await?;
        self.touch(TouchEventKind::TouchMove, end).await?;
        self.touch(TouchEventKind::TouchEnd, end).await
    }

    async fn drag_to(&self, target: &dyn LiveElement) -> Result<()> {
        let from = self.prepare_pointer().await?;
        let to = target.rect().await?.center();
        self.mouse(MouseEventKind::MouseMoved, from).await?;
        self.mouse(MouseEventKind::MousePressed, from).await?;
        self.mouse(MouseEventKind::MouseMoved, to).await?;
        self.mouse(MouseEventKind::MouseReleased, to).await
    }
}

/// Selector syntax errors are locator defects, not script failures
fn classify_lookup_error(error: Error, locator: &Locator) -> Error {
    match error {
        Error::ScriptExecutionFailed(message)
            if message.contains("SyntaxError") || message.contains("not a valid") =>
        {
            Error::invalid_locator(format!("{}: {}", locator, message))
        }
        other => other,
    }
}

fn classify_element_error(error: Error) -> Error {
    match error {
        Error::ScriptExecutionFailed(message) if message.contains(js::STALE_MARKER) => {
            Error::stale(message)
        }
        other => other,
    }
}
