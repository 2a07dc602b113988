//! CDP (Chrome DevTools Protocol) layer traits

use async_trait::async_trait;
use serde_json::Value;

use super::types::{EvaluateParams, EvaluateReply};

/// CDP connection trait
///
/// A command channel to one page target. Implemented over WebSocket for
/// real browsers and by a scripted double in tests.
#[async_trait]
pub trait CdpConnection: Send + Sync + std::fmt::Debug {
    /// Send a CDP command and wait for its result
    async fn send_command(&self, method: &str, params: Value) -> Result<Value, crate::Error>;

    /// Check if connection is active
    fn is_active(&self) -> bool;

    /// Evaluate an expression in the page and return its value as JSON.
    ///
    /// A thrown exception becomes `ScriptExecutionFailed` carrying the
    /// exception's description.
    async fn evaluate(&self, expression: &str) -> Result<Value, crate::Error> {
        let params = serde_json::to_value(EvaluateParams::by_value(expression))?;
        let raw = self.send_command("Runtime.evaluate", params).await?;
        serde_json::from_value::<EvaluateReply>(raw)?.into_value()
    }
}
