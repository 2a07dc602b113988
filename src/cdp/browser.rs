//! DevTools endpoint discovery
//!
//! Lists page targets of an already running browser and attaches a
//! [`CdpSession`] to one of them. Launching the browser is left to the host.

use std::time::Duration;
use tracing::{debug, info};

use super::connection::CdpWebSocketConnection;
use super::session::CdpSession;
use super::types::TargetInfo;
use crate::{Error, Result};

/// Browser DevTools endpoint
#[derive(Debug, Clone)]
pub struct CdpBrowser {
    /// HTTP endpoint (e.g., "http://localhost:9222")
    endpoint: String,
    command_timeout: Duration,
}

impl CdpBrowser {
    /// Accepts `http://`, `https://`, `ws://` or `wss://` endpoints
    pub fn new<S: Into<String>>(endpoint: S, command_timeout: Duration) -> Self {
        let endpoint = endpoint
            .into()
            .replacen("ws://", "http://", 1)
            .replacen("wss://", "https://", 1)
            .trim_end_matches('/')
            .to_string();
        Self {
            endpoint,
            command_timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// List all targets from browser
    pub async fn targets(&self) -> Result<Vec<TargetInfo>> {
        let url = format!("{}/json/list", self.endpoint);
        debug!("Fetching targets from {}", url);

        let client = reqwest::Client::builder()
            .timeout(self.command_timeout)
            .build()?;
        let targets: Vec<TargetInfo> = client.get(&url).send().await?.error_for_status()?.json().await?;
        Ok(targets)
    }

    /// Attach to the first page whose URL contains `url_filter`, or to the
    /// first page at all
    pub async fn attach(&self, url_filter: Option<&str>) -> Result<CdpSession> {
        let target = self
            .targets()
            .await?
            .into_iter()
            .filter(|t| t.target_type == "page")
            .find(|t| url_filter.map_or(true, |f| t.url.contains(f)))
            .ok_or_else(|| {
                Error::driver(format!(
                    "No page target{} at {}",
                    url_filter.map(|f| format!(" matching '{}'", f)).unwrap_or_default(),
                    self.endpoint
                ))
            })?;

        let ws_url = target.web_socket_debugger_url.ok_or_else(|| {
            Error::driver(format!("Target {} is already attached to a debugger", target.id))
        })?;

        info!("Attaching to page {} ({})", target.id, target.url);
        let connection = CdpWebSocketConnection::connect(ws_url, self.command_timeout).await?;
        Ok(CdpSession::new(connection))
    }
}
