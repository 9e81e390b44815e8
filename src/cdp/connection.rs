//! CDP WebSocket connection implementation
//!
//! Commands are written through the sink half of the socket; a reader task owns
//! the stream half and routes replies to waiters by id and events to subscribers.

use super::traits::{CdpConnection, CdpError as CdpErrorResponse, CdpEvent, CdpResponse};
use super::types::*;
use crate::Error;
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = Arc<Mutex<SplitSink<WsStream, Message>>>;
type PendingMap = Arc<Mutex<HashMap<u64, PendingCommand>>>;
type Subscribers = Arc<Mutex<Vec<mpsc::UnboundedSender<CdpEvent>>>>;

/// CDP timeout configuration
#[derive(Debug, Clone)]
struct CdpTimeoutConfig {
    /// Default timeout for most commands
    default_timeout: Duration,
    /// Timeout for screenshot commands
    screenshot_timeout: Duration,
    /// Timeout for page navigation commands
    navigation_timeout: Duration,
    /// Timeout for JavaScript execution
    execution_timeout: Duration,
}

impl Default for CdpTimeoutConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
            screenshot_timeout: Duration::from_secs(90),
            navigation_timeout: Duration::from_secs(60),
            execution_timeout: Duration::from_secs(30),
        }
    }
}

impl CdpTimeoutConfig {
    /// Get timeout duration for a specific command method
    fn get_timeout_for_command(&self, method: &str) -> Duration {
        match method {
            "Page.captureScreenshot" => self.screenshot_timeout,
            "Page.navigate" | "Page.reload" | "Page.navigateToHistoryEntry" => {
                self.navigation_timeout
            }
            "Runtime.evaluate" | "Runtime.callFunctionOn" => self.execution_timeout,
            _ => self.default_timeout,
        }
    }
}

/// Pending command response
#[derive(Debug)]
struct PendingCommand {
    /// Response channel sender
    sender: oneshot::Sender<CdpResponse>,
    /// Command method (for logging)
    method: String,
}

/// CDP WebSocket connection implementation
pub struct CdpWebSocketConnection {
    /// WebSocket URL
    url: String,
    /// Write half of the socket
    sink: WsSink,
    /// Next command ID
    next_id: AtomicU64,
    /// Pending commands (ID -> response sender)
    pending_commands: PendingMap,
    /// Event subscribers
    event_subscribers: Subscribers,
    /// Is connection active
    is_active: Arc<AtomicBool>,
    /// Timeout configuration
    timeout_config: CdpTimeoutConfig,
    /// Reader task
    reader: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for CdpWebSocketConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpWebSocketConnection")
            .field("url", &self.url)
            .field("is_active", &self.is_active.load(Ordering::SeqCst))
            .field("timeout_config", &self.timeout_config)
            .finish()
    }
}

impl CdpWebSocketConnection {
    /// Connect to a target
    ///
    /// # Arguments
    /// * `url` - WebSocket URL (e.g., "ws://localhost:9222/devtools/page/ABC123")
    pub async fn new<S: Into<String>>(url: S) -> Result<Arc<Self>, Error> {
        let url = url.into();
        info!("Connecting to WebSocket: {}", url);

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::websocket(format!("Failed to connect to {}: {}", url, e)))?;
        let (sink, stream) = ws_stream.split();

        let connection = Arc::new(Self {
            url,
            sink: Arc::new(Mutex::new(sink)),
            next_id: AtomicU64::new(1),
            pending_commands: Arc::new(Mutex::new(HashMap::new())),
            event_subscribers: Arc::new(Mutex::new(Vec::new())),
            is_active: Arc::new(AtomicBool::new(true)),
            timeout_config: CdpTimeoutConfig::default(),
            reader: std::sync::Mutex::new(None),
        });

        let handle = tokio::spawn(Self::read_loop(
            stream,
            Arc::clone(&connection.sink),
            Arc::clone(&connection.pending_commands),
            Arc::clone(&connection.event_subscribers),
            Arc::clone(&connection.is_active),
        ));
        if let Ok(mut reader) = connection.reader.lock() {
            *reader = Some(handle);
        }

        info!("WebSocket connection established");
        Ok(connection)
    }

    /// The target URL this connection talks to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Reader loop; on exit every waiter is released with a closed channel
    async fn read_loop(
        mut stream: SplitStream<WsStream>,
        sink: WsSink,
        pending_commands: PendingMap,
        event_subscribers: Subscribers,
        is_active: Arc<AtomicBool>,
    ) {
        debug!("CDP reader task started");

        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    Self::handle_message(&text, &pending_commands, &event_subscribers).await;
                }
                Ok(Message::Ping(data)) => {
                    if let Err(e) = sink.lock().await.send(Message::Pong(data)).await {
                        warn!("Failed to send pong: {}", e);
                    }
                }
                Ok(Message::Close(_)) => {
                    info!("WebSocket close frame received");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("WebSocket read error: {}", e);
                    break;
                }
            }
        }

        is_active.store(false, Ordering::SeqCst);

        let mut pending = pending_commands.lock().await;
        if !pending.is_empty() {
            warn!("Connection closed with {} command(s) in flight", pending.len());
        }
        // Dropping the senders wakes every waiter with a closed-channel error
        pending.clear();
        event_subscribers.lock().await.clear();

        debug!("CDP reader task exited");
    }

    /// Route one incoming text frame
    async fn handle_message(text: &str, pending_commands: &PendingMap, event_subscribers: &Subscribers) {
        trace!("Received message: {}", text);

        // Try to parse as response first
        if let Ok(response) = serde_json::from_str::<CdpRpcResponse>(text) {
            Self::handle_response(response, pending_commands).await;
            return;
        }

        // Try to parse as notification/event
        if let Ok(notification) = serde_json::from_str::<CdpNotification>(text) {
            Self::handle_notification(notification, event_subscribers).await;
            return;
        }

        warn!("Unknown message format: {}", text);
    }

    /// Hand a response to its waiter
    async fn handle_response(response: CdpRpcResponse, pending_commands: &PendingMap) {
        let pending_cmd = pending_commands.lock().await.remove(&response.id);

        match pending_cmd {
            Some(pending_cmd) => {
                debug!("Received response for command {}: {}", response.id, pending_cmd.method);

                let cdp_response = CdpResponse {
                    id: response.id,
                    result: Some(response.result),
                    error: response.error.map(|e| CdpErrorResponse {
                        code: e.code,
                        message: e.message,
                        data: e.data,
                    }),
                };

                // The waiter may have timed out already
                let _ = pending_cmd.sender.send(cdp_response);
            }
            None => warn!("Received response for unknown command ID: {}", response.id),
        }
    }

    /// Broadcast an event to all live subscribers
    async fn handle_notification(notification: CdpNotification, event_subscribers: &Subscribers) {
        debug!("Received event: {}", notification.method);

        let event = CdpEvent {
            method: notification.method,
            params: notification.params,
            session_id: notification.session_id,
        };

        let mut subscribers = event_subscribers.lock().await;
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());
    }
}

#[async_trait]
impl CdpConnection for CdpWebSocketConnection {
    /// Send a CDP command and wait for response
    async fn send_command(&self, method: &str, params: serde_json::Value) -> Result<CdpResponse, Error> {
        if !self.is_active.load(Ordering::SeqCst) {
            return Err(Error::websocket("Connection is not active"));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params: if params.is_null() { None } else { Some(params) },
            session_id: None,
        };

        let json = serde_json::to_string(&request)
            .map_err(|e| Error::cdp(format!("Failed to serialize request: {}", e)))?;

        debug!("Sending CDP command {}: {}", id, method);

        let (sender, receiver) = oneshot::channel();
        self.pending_commands.lock().await.insert(
            id,
            PendingCommand {
                sender,
                method: method.to_string(),
            },
        );

        let sent = self.sink.lock().await.send(Message::Text(json)).await;
        if let Err(e) = sent {
            self.pending_commands.lock().await.remove(&id);
            return Err(Error::websocket(format!("Failed to send {}: {}", method, e)));
        }

        let timeout_duration = self.timeout_config.get_timeout_for_command(method);

        match tokio::time::timeout(timeout_duration, receiver).await {
            Ok(Ok(response)) => {
                if let Some(error) = &response.error {
                    return Err(Error::cdp(format!(
                        "{}: {} (code: {}){}",
                        method,
                        error.message,
                        error.code,
                        error.data.as_ref().map_or(String::new(), |d| format!(" {}", d))
                    )));
                }
                Ok(response)
            }
            Ok(Err(_)) => Err(Error::websocket(format!(
                "Connection closed before {} (command {}) completed",
                method, id
            ))),
            Err(_) => {
                self.pending_commands.lock().await.remove(&id);
                Err(Error::timeout(format!(
                    "{} (command {}) timed out after {:?}",
                    method, id, timeout_duration
                )))
            }
        }
    }

    /// Subscribe to CDP events
    async fn listen_events(&self) -> Result<mpsc::Receiver<CdpEvent>, Error> {
        let (sender, receiver) = mpsc::channel(100);
        let (unbounded_sender, mut unbounded_receiver) = mpsc::unbounded_channel();

        self.event_subscribers.lock().await.push(unbounded_sender);

        // Forward events to bounded channel
        tokio::spawn(async move {
            while let Some(event) = unbounded_receiver.recv().await {
                if sender.send(event).await.is_err() {
                    break;
                }
            }
        });

        Ok(receiver)
    }

    /// Close the connection
    async fn close(&self) -> Result<(), Error> {
        if !self.is_active.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        info!("Closing CDP WebSocket connection to {}", self.url);

        let closed = self.sink.lock().await.close().await;

        let reader = self.reader.lock().ok().and_then(|mut r| r.take());
        if let Some(handle) = reader {
            handle.abort();
        }
        self.pending_commands.lock().await.clear();

        closed.map_err(|e| Error::websocket(format!("Failed to close WebSocket: {}", e)))
    }

    /// Check if connection is active
    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }
}
