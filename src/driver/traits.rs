//! Driver boundary traits
//!
//! This module defines the abstract interfaces a surface driver provides:
//! a session that can look nodes up, and the live per-node references it
//! hands out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::locator::{Locator, Surface};

/// Driver session
///
/// One per test. Implementations must report "nothing matched" as
/// [`crate::Error::NotFound`] and a detached reference as
/// [`crate::Error::Stale`], never as a generic driver error.
#[async_trait]
pub trait DriverSession: Send + Sync + std::fmt::Debug {
    /// Surface this session drives
    fn surface(&self) -> Surface;

    /// Find the first node matching the locator
    async fn find_element(&self, locator: &Locator) -> Result<Arc<dyn LiveElement>, crate::Error>;

    /// Find every node matching the locator (empty when none)
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<Arc<dyn LiveElement>>, crate::Error>;

    /// Execute a script against the surface
    async fn execute_script(
        &self,
        script: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<EvaluationResult, crate::Error>;

    /// Current location (URL) of the surface
    async fn current_location(&self) -> Result<String, crate::Error>;
}

/// Live element reference
///
/// Opaque handle to a node owned by the driver session. Every call made
/// after the node is destroyed or replaced fails with
/// [`crate::Error::Stale`].
#[async_trait]
pub trait LiveElement: Send + Sync + std::fmt::Debug {
    /// Driver-side element ID
    fn id(&self) -> &str;

    /// Cheap read that fails with `Stale` once the node is detached
    async fn check_attached(&self) -> Result<(), crate::Error>;

    /// Visibility flag as reported by the surface
    async fn is_displayed(&self) -> Result<bool, crate::Error>;

    /// Check if element is enabled
    async fn is_enabled(&self) -> Result<bool, crate::Error>;

    /// Get element text
    async fn text(&self) -> Result<String, crate::Error>;

    /// Get element attribute
    async fn attribute(&self, name: &str) -> Result<Option<String>, crate::Error>;

    /// Rendered rectangle
    async fn rect(&self) -> Result<ElementRect, crate::Error>;

    /// Click element
    async fn click(&self) -> Result<(), crate::Error>;

    /// Touch tap; surfaces without touch fall back to a click
    async fn tap(&self) -> Result<(), crate::Error> {
        self.click().await
    }

    /// Type text into element
    async fn send_keys(&self, text: &str) -> Result<(), crate::Error>;

    /// Clear an editable element
    async fn clear(&self) -> Result<(), crate::Error>;

    /// Hover over element
    async fn hover(&self) -> Result<(), crate::Error>;

    /// Scroll element into view
    async fn scroll_into_view(&self) -> Result<(), crate::Error>;

    /// Swipe starting from the element's center
    async fn swipe(&self, direction: SwipeDirection) -> Result<(), crate::Error>;

    /// Press on this element and release over `target`
    async fn drag_to(&self, target: &dyn LiveElement) -> Result<(), crate::Error>;
}

/// Element rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementRect {
    /// Whether anything is actually rendered
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Swipe direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Up,
    Down,
    Left,
    Right,
}

impl SwipeDirection {
    /// Unit offset `(dx, dy)` in screen coordinates
    pub fn offset(&self) -> (f64, f64) {
        match self {
            SwipeDirection::Up => (0.0, -1.0),
            SwipeDirection::Down => (0.0, 1.0),
            SwipeDirection::Left => (-1.0, 0.0),
            SwipeDirection::Right => (1.0, 0.0),
        }
    }
}

impl std::fmt::Display for SwipeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SwipeDirection::Up => "up",
            SwipeDirection::Down => "down",
            SwipeDirection::Left => "left",
            SwipeDirection::Right => "right",
        };
        f.write_str(name)
    }
}

/// Script evaluation result
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationResult {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
    Object(serde_json::Value),
}

impl EvaluationResult {
    /// Convert a raw JSON value returned by a driver
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => EvaluationResult::Null,
            serde_json::Value::Bool(b) => EvaluationResult::Bool(b),
            serde_json::Value::Number(n) => EvaluationResult::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => EvaluationResult::String(s),
            other => EvaluationResult::Object(other),
        }
    }

    /// Cast to a boolean.
    ///
    /// Strings must spell `true`/`false` (any case); numbers are true when
    /// non-zero; null is false. Objects cannot be cast.
    pub fn as_bool(&self) -> Result<bool, crate::Error> {
        match self {
            EvaluationResult::Bool(b) => Ok(*b),
            EvaluationResult::Number(n) => Ok(*n != 0.0),
            EvaluationResult::Null => Ok(false),
            EvaluationResult::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(crate::Error::script_execution_failed(format!(
                    "Script result '{}' is not a boolean",
                    s
                ))),
            },
            EvaluationResult::Object(v) => Err(crate::Error::script_execution_failed(format!(
                "Script result {} is not a boolean",
                v
            ))),
        }
    }
}
