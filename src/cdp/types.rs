//! Wire structures for the slice of the DevTools protocol the web surface
//! speaks: command framing, `Runtime.evaluate`, and input dispatch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outgoing command frame
#[derive(Debug, Serialize)]
pub struct CdpCommand<'a> {
    pub id: u64,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<&'a Value>,
}

/// Incoming frame: a command reply when `id` is set, an event otherwise
#[derive(Debug, Clone, Deserialize)]
pub struct CdpMessage {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<ProtocolError>,
}

/// Error member of a failed reply
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolError {
    pub code: i64,
    pub message: String,
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)
    }
}

/// `Runtime.evaluate` parameters; results always come back by value
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams<'a> {
    pub expression: &'a str,
    pub return_by_value: bool,
    pub await_promise: bool,
}

impl<'a> EvaluateParams<'a> {
    pub fn by_value(expression: &'a str) -> Self {
        Self {
            expression,
            return_by_value: true,
            await_promise: true,
        }
    }
}

/// Evaluation result as serialized by value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvaluatedValue {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThrownException {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub exception: Option<EvaluatedValue>,
}

impl ThrownException {
    /// Thrown error's description, else the summary text
    pub fn message(&self) -> String {
        self.exception
            .as_ref()
            .and_then(|e| e.description.clone())
            .or_else(|| self.text.clone())
            .unwrap_or_else(|| "Uncaught exception".to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateReply {
    #[serde(default)]
    pub result: EvaluatedValue,
    #[serde(default)]
    pub exception_details: Option<ThrownException>,
}

impl EvaluateReply {
    /// Value of the evaluation; `undefined` reads as null
    pub fn into_value(self) -> Result<Value, crate::Error> {
        if let Some(thrown) = self.exception_details {
            return Err(crate::Error::script_execution_failed(thrown.message()));
        }
        Ok(match self.result.kind.as_str() {
            "undefined" => Value::Null,
            _ => self.result.value.unwrap_or(Value::Null),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MouseEventKind {
    MouseMoved,
    MousePressed,
    MouseReleased,
}

/// `Input.dispatchMouseEvent` parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseEvent {
    #[serde(rename = "type")]
    pub kind: MouseEventKind,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_count: Option<u32>,
}

impl MouseEvent {
    /// Left-button event at `(x, y)`; moves carry no button
    pub fn left(kind: MouseEventKind, (x, y): (f64, f64)) -> Self {
        let pressing = kind != MouseEventKind::MouseMoved;
        Self {
            kind,
            x,
            y,
            button: pressing.then_some("left"),
            click_count: pressing.then_some(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TouchEventKind {
    TouchStart,
    TouchMove,
    TouchEnd,
}

/// `Input.dispatchTouchEvent` parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchEvent {
    #[serde(rename = "type")]
    pub kind: TouchEventKind,
    pub touch_points: Vec<TouchPoint>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
}

impl TouchEvent {
    /// Single-finger event; `TouchEnd` lifts every finger
    pub fn at(kind: TouchEventKind, (x, y): (f64, f64)) -> Self {
        let touch_points = match kind {
            TouchEventKind::TouchEnd => Vec::new(),
            _ => vec![TouchPoint { x, y }],
        };
        Self { kind, touch_points }
    }
}

/// Target listed by the DevTools HTTP endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub target_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub web_socket_debugger_url: Option<String>,
}
