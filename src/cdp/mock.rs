//! Mock CDP implementation for testing
//!
//! A connection whose replies come from a handler closure. Every command is
//! recorded so tests can assert on what was sent.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::traits::CdpConnection;
use crate::Error;

type Handler = dyn Fn(&str, &Value) -> Result<Value, Error> + Send + Sync;

/// Mock CDP connection
pub struct MockCdpConnection {
    handler: Box<Handler>,
    commands: Mutex<Vec<(String, Value)>>,
    is_active: Arc<AtomicBool>,
}

impl std::fmt::Debug for MockCdpConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCdpConnection")
            .field("commands", &self.commands().len())
            .finish()
    }
}

impl MockCdpConnection {
    /// Create a connection answering with `handler(method, params)`
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<Value, Error> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            commands: Mutex::new(Vec::new()),
            is_active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Answer every `Runtime.evaluate` with `evaluate(expression)` and every
    /// other command with `{}`
    pub fn evaluating<F>(evaluate: F) -> Self
    where
        F: Fn(&str) -> Result<Value, Error> + Send + Sync + 'static,
    {
        Self::new(move |method, params| match method {
            "Runtime.evaluate" => {
                let expression = params["expression"].as_str().unwrap_or_default();
                evaluate(expression)
            }
            _ => Ok(json!({})),
        })
    }

    /// Commands received so far
    pub fn commands(&self) -> Vec<(String, Value)> {
        self.commands
            .lock()
            .map(|c| c.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Received commands with the given method
    pub fn commands_named(&self, method: &str) -> Vec<Value> {
        self.commands()
            .into_iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p)
            .collect()
    }

    pub fn close(&self) {
        self.is_active.store(false, Ordering::SeqCst);
    }
}

/// `Runtime.evaluate` result carrying `value`
pub fn evaluated(value: Value) -> Value {
    let kind = match &value {
        Value::Null => "object",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        _ => "object",
    };
    json!({ "result": { "type": kind, "value": value } })
}

/// `Runtime.evaluate` result for a thrown error
pub fn thrown(description: &str) -> Value {
    json!({
        "result": { "type": "object", "subtype": "error", "description": description },
        "exceptionDetails": {
            "exceptionId": 1,
            "text": "Uncaught",
            "lineNumber": 0,
            "columnNumber": 0,
            "exception": { "type": "object", "subtype": "error", "description": description }
        }
    })
}

#[async_trait]
impl CdpConnection for MockCdpConnection {
    async fn send_command(&self, method: &str, params: Value) -> Result<Value, Error> {
        if !self.is_active() {
            return Err(Error::transport("CDP connection is not active"));
        }
        match self.commands.lock() {
            Ok(mut commands) => commands.push((method.to_string(), params.clone())),
            Err(poisoned) => poisoned
                .into_inner()
                .push((method.to_string(), params.clone())),
        }
        (self.handler)(method, &params)
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }
}
