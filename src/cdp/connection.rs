//! CDP WebSocket connection implementation
//!
//! One connection per page target. Commands are correlated with responses
//! by ID; a background task reads the socket and completes pending
//! commands. Events are not consumed by the harness and are dropped.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, instrument, trace, warn};

use super::traits::CdpConnection;
use super::types::{CdpCommand, CdpMessage};
use crate::Error;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingMap = Arc<Mutex<HashMap<u64, PendingCommand>>>;

/// Pending command response
#[derive(Debug)]
struct PendingCommand {
    sender: oneshot::Sender<CdpMessage>,
    method: String,
}

/// CDP WebSocket connection implementation
#[derive(Debug)]
pub struct CdpWebSocketConnection {
    url: String,
    writer: Mutex<SplitSink<WsStream, Message>>,
    pending: PendingMap,
    next_id: AtomicU64,
    is_active: Arc<AtomicBool>,
    command_timeout: Duration,
}

impl CdpWebSocketConnection {
    /// Connect to a page target
    ///
    /// # Arguments
    /// * `url` - WebSocket URL (e.g., "ws://localhost:9222/devtools/page/ABC123")
    /// * `command_timeout` - bound on every command round-trip
    pub async fn connect<S: Into<String>>(url: S, command_timeout: Duration) -> Result<Arc<Self>, Error> {
        let url = url.into();
        info!("Connecting to CDP target {}", url);

        let (stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::transport(format!("Failed to connect to {}: {}", url, e)))?;
        let (writer, reader) = stream.split();

        let connection = Arc::new(Self {
            url,
            writer: Mutex::new(writer),
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            is_active: Arc::new(AtomicBool::new(true)),
            command_timeout,
        });

        tokio::spawn(Self::read_loop(
            reader,
            connection.pending.clone(),
            connection.is_active.clone(),
        ));

        info!("CDP connection established");
        Ok(connection)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Close the socket; pending commands fail with a transport error
    pub async fn close(&self) -> Result<(), Error> {
        info!("Closing CDP connection to {}", self.url);
        self.is_active.store(false, Ordering::SeqCst);
        self.writer
            .lock()
            .await
            .close()
            .await
            .map_err(|e| Error::transport(format!("Failed to close WebSocket: {}", e)))
    }

    async fn read_loop(mut reader: SplitStream<WsStream>, pending: PendingMap, is_active: Arc<AtomicBool>) {
        while let Some(message) = reader.next().await {
            match message {
                Ok(Message::Text(text)) => Self::dispatch(&text, &pending).await,
                Ok(Message::Close(_)) => {
                    info!("WebSocket close frame received");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
            }
        }

        is_active.store(false, Ordering::SeqCst);
        // Dropping the senders wakes every waiter with a closed channel
        pending.lock().await.clear();
        debug!("CDP read loop exited");
    }

    async fn dispatch(text: &str, pending: &PendingMap) {
        let message = match serde_json::from_str::<CdpMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping unreadable CDP frame: {}", e);
                return;
            }
        };

        let Some(id) = message.id else {
            trace!("Ignoring event {}", message.method.as_deref().unwrap_or("?"));
            return;
        };

        match pending.lock().await.remove(&id) {
            Some(command) => {
                debug!("Response for command {} ({})", id, command.method);
                let _ = command.sender.send(message);
            }
            None => warn!("Received response for unknown command ID: {}", id),
        }
    }
}

#[async_trait]
impl CdpConnection for CdpWebSocketConnection {
    #[instrument(skip(self, params))]
    async fn send_command(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, Error> {
        if !self.is_active() {
            return Err(Error::transport("CDP connection is not active"));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let json = serde_json::to_string(&CdpCommand {
            id,
            method,
            params: (!params.is_null()).then_some(&params),
        })?;

        let (sender, receiver) = oneshot::channel();
        self.pending.lock().await.insert(
            id,
            PendingCommand {
                sender,
                method: method.to_string(),
            },
        );

        debug!("Sending CDP command {}: {}", id, method);
        if let Err(e) = self.writer.lock().await.send(Message::Text(json)).await {
            self.pending.lock().await.remove(&id);
            return Err(Error::transport(format!("Failed to send {}: {}", method, e)));
        }

        match tokio::time::timeout(self.command_timeout, receiver).await {
            Ok(Ok(reply)) => match reply.error {
                Some(error) => Err(Error::driver(format!("{} failed: {}", method, error))),
                None => Ok(reply.result),
            },
            Ok(Err(_)) => Err(Error::transport(format!(
                "Connection closed before {} returned",
                method
            ))),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(Error::timeout(format!(
                    "{} timed out after {}ms",
                    method,
                    self.command_timeout.as_millis()
                )))
            }
        }
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }
}
