//! WebDriver-backed surface
//!
//! Attaches to an existing Selenium (web) or Appium (mobile) session and
//! implements the driver boundary on top of it.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::strategy::to_wire;
use super::transport::{HttpTransport, Verb, WireTransport};
use crate::config::Config;
use crate::driver::{DriverSession, ElementRect, EvaluationResult, LiveElement, SwipeDirection};
use crate::locator::{Locator, Surface};
use crate::{Error, Result};

/// W3C web element identifier key
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Pre-W3C key still sent by some Appium drivers
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// Milliseconds a swipe gesture takes
const SWIPE_DURATION_MS: u64 = 300;

#[derive(Debug)]
struct Shared {
    transport: Arc<dyn WireTransport>,
    session_id: String,
    surface: Surface,
}

impl Shared {
    fn path(&self, suffix: &str) -> String {
        format!("/session/{}/{}", self.session_id, suffix)
    }

    async fn get(&self, suffix: &str) -> Result<Value> {
        self.transport.command(Verb::Get, &self.path(suffix), None).await
    }

    async fn post(&self, suffix: &str, body: Value) -> Result<Value> {
        self.transport
            .command(Verb::Post, &self.path(suffix), Some(body))
            .await
    }

    async fn delete(&self, suffix: &str) -> Result<Value> {
        self.transport.command(Verb::Delete, &self.path(suffix), None).await
    }

    /// Run pointer actions, then release whatever is still pressed
    async fn perform_actions(&self, actions: Value) -> Result<()> {
        self.post("actions", json!({ "actions": [actions] })).await?;
        self.delete("actions").await?;
        Ok(())
    }
}

/// Extract an element id from a wire reference
pub fn element_id(reference: &Value) -> Option<String> {
    reference
        .get(ELEMENT_KEY)
        .or_else(|| reference.get(LEGACY_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn element_ref(id: &str) -> Value {
    let mut reference = serde_json::Map::new();
    reference.insert(ELEMENT_KEY.to_string(), Value::from(id));
    reference.insert(LEGACY_ELEMENT_KEY.to_string(), Value::from(id));
    Value::Object(reference)
}

/// Driver session over the WebDriver wire protocol
#[derive(Debug, Clone)]
pub struct WebDriverSession {
    shared: Arc<Shared>,
}

impl WebDriverSession {
    pub fn new<S: Into<String>>(transport: Arc<dyn WireTransport>, session_id: S, surface: Surface) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport,
                session_id: session_id.into(),
                surface,
            }),
        }
    }

    /// Attach to the session named by `config.session_id`
    pub fn attach(config: &Config) -> Result<Self> {
        let session_id = config.session_id.clone().ok_or_else(|| {
            Error::configuration("session_id is required to attach to a WebDriver session")
        })?;
        let transport = HttpTransport::new(&config.webdriver_url, config.call_timeout())?;
        info!(
            "Attaching to {} session {} at {}",
            config.surface, session_id, config.webdriver_url
        );
        Ok(Self::new(Arc::new(transport), session_id, config.surface))
    }

    pub fn session_id(&self) -> &str {
        &self.shared.session_id
    }

    fn element(&self, id: String) -> Arc<dyn LiveElement> {
        Arc::new(WebDriverElement {
            id,
            shared: self.shared.clone(),
        })
    }
}

#[async_trait]
impl DriverSession for WebDriverSession {
    fn surface(&self) -> Surface {
        self.shared.surface
    }

    #[instrument(skip(self))]
    async fn find_element(&self, locator: &Locator) -> Result<Arc<dyn LiveElement>> {
        let wire = to_wire(locator, self.shared.surface)?;
        let reply = self
            .shared
            .post("element", json!({ "using": wire.using, "value": wire.value }))
            .await?;
        let id = element_id(&reply)
            .ok_or_else(|| Error::driver(format!("Reply carries no element reference: {}", reply)))?;
        debug!("{} resolved to element {}", locator, id);
        Ok(self.element(id))
    }

    #[instrument(skip(self))]
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<Arc<dyn LiveElement>>> {
        let wire = to_wire(locator, self.shared.surface)?;
        let reply = self
            .shared
            .post("elements", json!({ "using": wire.using, "value": wire.value }))
            .await?;
        let references = reply.as_array().cloned().unwrap_or_default();
        Ok(references
            .iter()
            .filter_map(element_id)
            .map(|id| self.element(id))
            .collect())
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<EvaluationResult> {
        let reply = self
            .shared
            .post("execute/sync", json!({ "script": script, "args": args }))
            .await?;
        Ok(EvaluationResult::from_json(reply))
    }

    async fn current_location(&self) -> Result<String> {
        if self.shared.surface == Surface::Mobile {
            return Err(Error::unsupported("current location on a mobile surface"));
        }
        match self.shared.get("url").await? {
            Value::String(url) => Ok(url),
            other => Err(Error::driver(format!("Unexpected url reply: {}", other))),
        }
    }
}

/// Live reference to a WebDriver element
#[derive(Debug)]
pub struct WebDriverElement {
    id: String,
    shared: Arc<Shared>,
}

impl WebDriverElement {
    fn path(&self, suffix: &str) -> String {
        format!("element/{}/{}", self.id, suffix)
    }

    async fn read_bool(&self, suffix: &str) -> Result<bool> {
        Ok(self.shared.get(&self.path(suffix)).await?.as_bool().unwrap_or(false))
    }

    fn pointer(kind: &str, steps: Vec<Value>) -> Value {
        json!({
            "type": "pointer",
            "id": format!("{}-1", kind),
            "parameters": { "pointerType": kind },
            "actions": steps,
        })
    }

    fn move_to(id: &str, duration: u64) -> Value {
        json!({ "type": "pointerMove", "duration": duration, "origin": element_ref(id), "x": 0, "y": 0 })
    }

    fn touch_kind(&self) -> &'static str {
        match self.shared.surface {
            Surface::Web => "mouse",
            Surface::Mobile => "touch",
        }
    }
}

#[async_trait]
impl LiveElement for WebDriverElement {
    fn id(&self) -> &str {
        &self.id
    }

    async fn check_attached(&self) -> Result<()> {
        self.shared.get(&self.path("name")).await.map(|_| ())
    }

    async fn is_displayed(&self) -> Result<bool> {
        self.read_bool("displayed").await
    }

    async fn is_enabled(&self) -> Result<bool> {
        self.read_bool("enabled").await
    }

    async fn text(&self) -> Result<String> {
        Ok(self
            .shared
            .get(&self.path("text"))
            .await?
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        let suffix = format!("attribute/{}", urlencoding::encode(name));
        let reply = self.shared.get(&self.path(&suffix)).await?;
        Ok(match reply {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    async fn rect(&self) -> Result<ElementRect> {
        Ok(serde_json::from_value(self.shared.get(&self.path("rect")).await?)?)
    }

    #[instrument(skip(self), fields(element = %self.id))]
    async fn click(&self) -> Result<()> {
        self.shared.post(&self.path("click"), json!({})).await.map(|_| ())
    }

    async fn tap(&self) -> Result<()> {
        if self.shared.surface == Surface::Web {
            return self.click().await;
        }
        let steps = vec![
            Self::move_to(&self.id, 0),
            json!({ "type": "pointerDown", "button": 0 }),
            json!({ "type": "pause", "duration": 50 }),
            json!({ "type": "pointerUp", "button": 0 }),
        ];
        self.shared.perform_actions(Self::pointer("touch", steps)).await
    }

    async fn send_keys(&self, text: &str) -> Result<()> {
        self.shared
            .post(&self.path("value"), json!({ "text": text }))
            .await
            .map(|_| ())
    }

    async fn clear(&self) -> Result<()> {
        self.shared.post(&self.path("clear"), json!({})).await.map(|_| ())
    }

    async fn hover(&self) -> Result<()> {
        if self.shared.surface == Surface::Mobile {
            return Err(Error::unsupported("hover on a mobile surface"));
        }
        let steps = vec![Self::move_to(&self.id, 100)];
        self.shared.perform_actions(Self::pointer("mouse", steps)).await
    }

    async fn scroll_into_view(&self) -> Result<()> {
        if self.shared.surface == Surface::Mobile {
            return Err(Error::unsupported("scroll into view on a mobile surface; swipe instead"));
        }
        self.shared
            .post(
                "execute/sync",
                json!({
                    "script": "arguments[0].scrollIntoView({block: 'center', inline: 'center'});",
                    "args": [element_ref(&self.id)],
                }),
            )
            .await
            .map(|_| ())
    }

    async fn swipe(&self, direction: SwipeDirection) -> Result<()> {
        let rect = self.rect().await?;
        let (dx, dy) = direction.offset();
        let steps = vec![
            Self::move_to(&self.id, 0),
            json!({ "type": "pointerDown", "button": 0 }),
            json!({
                "type": "pointerMove",
                "duration": SWIPE_DURATION_MS,
                "origin": "pointer",
                "x": (dx * rect.width / 2.0).round() as i64,
                "y": (dy * rect.height / 2.0).round() as i64,
            }),
            json!({ "type": "pointerUp", "button": 0 }),
        ];
        let kind = self.touch_kind();
        self.shared.perform_actions(Self::pointer(kind, steps)).await
    }

    async fn drag_to(&self, target: &dyn LiveElement) -> Result<()> {
        let steps = vec![
            Self::move_to(&self.id, 0),
            json!({ "type": "pointerDown", "button": 0 }),
            Self::move_to(target.id(), 250),
            json!({ "type": "pointerUp", "button": 0 }),
        ];
        let kind = self.touch_kind();
        self.shared.perform_actions(Self::pointer(kind, steps)).await
    }
}
