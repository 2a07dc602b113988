//! WebDriver wire transport
//!
//! HTTP+JSON command channel to a Selenium or Appium endpoint, with W3C
//! error codes mapped onto the crate's error classes.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{Error, Result};

/// HTTP verb of a WebDriver command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Delete,
}

/// Command channel to a WebDriver endpoint
#[async_trait]
pub trait WireTransport: Send + Sync + std::fmt::Debug {
    /// Send a command and return the `value` member of the reply
    async fn command(&self, verb: Verb, path: &str, body: Option<Value>) -> Result<Value>;
}

/// W3C error payload
#[derive(Debug, Clone, Deserialize)]
pub struct WireError {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

/// Map a W3C error code onto an error class
pub fn map_wire_error(code: &str, message: &str) -> Error {
    let detail = if message.is_empty() {
        code.to_string()
    } else {
        format!("{}: {}", code, message)
    };
    match code {
        "no such element" => Error::not_found(detail),
        "stale element reference" | "detached shadow root" => Error::stale(detail),
        "invalid selector" | "invalid argument" => Error::invalid_locator(detail),
        "javascript error" => Error::script_execution_failed(detail),
        "timeout" | "script timeout" => Error::timeout(detail),
        "unknown command" | "unsupported operation" => Error::unsupported(detail),
        _ => Error::driver(detail),
    }
}

/// Split a reply body into its value or its mapped error
pub fn unwrap_reply(body: Value) -> Result<Value> {
    let value = match body {
        Value::Object(mut map) => map.remove("value").unwrap_or(Value::Null),
        other => other,
    };

    if value.get("error").and_then(Value::as_str).is_some() {
        let error: WireError = serde_json::from_value(value)?;
        return Err(map_wire_error(&error.error, &error.message));
    }
    Ok(value)
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// `call_timeout` bounds every request
    pub fn new<S: Into<String>>(base_url: S, call_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(call_timeout)
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl WireTransport for HttpTransport {
    #[instrument(skip(self, body))]
    async fn command(&self, verb: Verb, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let request = match verb {
            Verb::Get => self.client.get(&url),
            Verb::Post => self.client.post(&url).json(&body.unwrap_or_else(|| Value::Object(Default::default()))),
            Verb::Delete => self.client.delete(&url),
        };

        let response = request.send().await?;
        let status = response.status();
        let reply: Value = response.json().await.map_err(|e| {
            Error::transport(format!("Unreadable reply from {} ({}): {}", url, status, e))
        })?;
        debug!("{:?} {} -> {}", verb, path, status);

        unwrap_reply(reply)
    }
}
