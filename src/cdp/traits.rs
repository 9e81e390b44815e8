//! CDP (Chrome DevTools Protocol) layer traits
//!
//! This module defines the abstract interfaces for CDP communication.

use super::types::KeyPress;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// CDP event representation
#[derive(Debug, Clone)]
pub struct CdpEvent {
    /// Event method (e.g., "Page.loadEventFired")
    pub method: String,
    /// Event parameters
    pub params: Value,
    /// Session ID (for multi-session targets)
    pub session_id: Option<String>,
}

/// CDP response representation
#[derive(Debug, Clone)]
pub struct CdpResponse {
    /// Response ID (matches request ID)
    pub id: u64,
    /// Response result
    pub result: Option<Value>,
    /// Error if any
    pub error: Option<CdpError>,
}

/// CDP error representation
#[derive(Debug, Clone)]
pub struct CdpError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    pub data: Option<Value>,
}

/// CDP connection trait
///
/// Represents a WebSocket connection to a Chrome DevTools Protocol target.
#[async_trait]
pub trait CdpConnection: Send + Sync + std::fmt::Debug {
    /// Send a CDP command and wait for response
    async fn send_command(
        &self,
        method: &str,
        params: Value,
    ) -> Result<CdpResponse, crate::Error>;

    /// Subscribe to CDP events
    async fn listen_events(&self) -> Result<tokio::sync::mpsc::Receiver<CdpEvent>, crate::Error>;

    /// Close the connection
    async fn close(&self) -> Result<(), crate::Error>;

    /// Check if connection is active
    fn is_active(&self) -> bool;
}

/// CDP client trait
///
/// High-level CDP client for one page target. Input helpers have default
/// implementations on top of `call_method`, so every client (real or mock)
/// emits the same `Input.*` commands.
#[async_trait]
pub trait CdpClient: Send + Sync + std::fmt::Debug {
    /// Get the underlying connection
    fn connection(&self) -> Arc<dyn CdpConnection>;

    /// Navigate to a URL and wait (bounded) for the document to finish loading
    async fn navigate(&self, url: &str) -> Result<NavigationResult, crate::Error>;

    /// Evaluate JavaScript in the page
    async fn evaluate(&self, script: &str, await_promise: bool) -> Result<EvaluationResult, crate::Error>;

    /// Capture a screenshot of the viewport, or of the whole document when `full_page`
    async fn screenshot(&self, format: ScreenshotFormat, full_page: bool) -> Result<Vec<u8>, crate::Error>;

    /// Enable a domain
    async fn enable_domain(&self, domain: &str) -> Result<(), crate::Error>;

    /// Call a raw CDP method (returns JSON Value)
    async fn call_method(&self, method: &str, params: Value) -> Result<Value, crate::Error>;

    /// Subscribe to events (returns a receiver)
    async fn subscribe_events(&self, event_type: &str) -> Result<tokio::sync::mpsc::Receiver<CdpEvent>, crate::Error>;

    /// Left-click at a viewport coordinate (press then release)
    async fn click_at(&self, x: f64, y: f64) -> Result<(), crate::Error> {
        for event_type in ["mousePressed", "mouseReleased"] {
            self.call_method(
                "Input.dispatchMouseEvent",
                json!({
                    "type": event_type,
                    "x": x,
                    "y": y,
                    "button": "left",
                    "buttons": 1,
                    "clickCount": 1,
                }),
            )
            .await?;
        }
        Ok(())
    }

    /// Insert text into the focused element in one step
    async fn insert_text(&self, text: &str) -> Result<(), crate::Error> {
        self.call_method("Input.insertText", json!({ "text": text }))
            .await?;
        Ok(())
    }

    /// Press and release a key
    async fn dispatch_key(&self, key: &KeyPress) -> Result<(), crate::Error> {
        self.call_method("Input.dispatchKeyEvent", key.down_params())
            .await?;
        self.call_method("Input.dispatchKeyEvent", key.up_params())
            .await?;
        Ok(())
    }

    /// Type a single printable character as a full key event
    async fn type_char(&self, ch: char) -> Result<(), crate::Error> {
        self.dispatch_key(&KeyPress::character(ch)).await
    }
}

/// Navigation result
#[derive(Debug, Clone)]
pub struct NavigationResult {
    /// Navigation ID
    pub navigation_id: Option<String>,
    /// URL after navigation
    pub url: String,
    /// Whether the document reached `complete` within the polling window
    pub loaded: bool,
}

/// JavaScript evaluation result
#[derive(Debug, Clone)]
pub enum EvaluationResult {
    /// String value
    String(String),
    /// Number value
    Number(f64),
    /// Boolean value
    Bool(bool),
    /// Null value
    Null,
    /// Object/Array (as JSON)
    Object(Value),
}

impl EvaluationResult {
    /// Borrow the string payload, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EvaluationResult::String(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the result as a boolean (`false` for anything non-boolean)
    pub fn as_bool(&self) -> bool {
        matches!(self, EvaluationResult::Bool(true))
    }

    /// Convert into plain JSON
    pub fn into_value(self) -> Value {
        match self {
            EvaluationResult::String(s) => Value::String(s),
            EvaluationResult::Number(n) => json!(n),
            EvaluationResult::Bool(b) => Value::Bool(b),
            EvaluationResult::Null => Value::Null,
            EvaluationResult::Object(v) => v,
        }
    }
}

/// Screenshot format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenshotFormat {
    /// PNG format
    Png,
    /// JPEG format
    Jpeg(u8), // quality 0-100
    /// WebP format
    WebP(u8), // quality 0-100
}

impl ScreenshotFormat {
    /// Protocol name and file extension
    pub fn extension(&self) -> &'static str {
        match self {
            ScreenshotFormat::Png => "png",
            ScreenshotFormat::Jpeg(_) => "jpeg",
            ScreenshotFormat::WebP(_) => "webp",
        }
    }

    /// Compression quality, when the format has one
    pub fn quality(&self) -> Option<u8> {
        match self {
            ScreenshotFormat::Png => None,
            ScreenshotFormat::Jpeg(q) | ScreenshotFormat::WebP(q) => Some((*q).min(100)),
        }
    }
}

/// CDP browser trait
///
/// Controls browser-level operations via CDP.
#[async_trait]
pub trait CdpBrowser: Send + Sync + std::fmt::Debug {
    /// Create a new CDP client for a page target WebSocket URL
    async fn create_client(&self, target_url: &str) -> Result<Arc<dyn CdpClient>, crate::Error>;

    /// Close every client and, if this handle launched the browser, the process itself
    async fn close(&self) -> Result<(), crate::Error>;

    /// Get browser version
    async fn get_version(&self) -> Result<BrowserVersion, crate::Error>;

    /// List all targets (pages, workers, etc.)
    async fn get_targets(&self) -> Result<Vec<TargetInfo>, crate::Error>;

    /// Create a new page target
    ///
    /// Returns the WebSocket URL of the newly created target.
    async fn create_target(&self, url: &str) -> Result<String, crate::Error>;
}

/// Browser version information
#[derive(Debug, Clone)]
pub struct BrowserVersion {
    /// Protocol version
    pub protocol_version: String,
    /// Product name
    pub product: String,
    /// User agent
    pub user_agent: String,
    /// JavaScript engine version
    pub js_version: String,
}

/// Target information (page, worker, etc.)
#[derive(Debug, Clone)]
pub struct TargetInfo {
    /// Target ID
    pub target_id: String,
    /// Target type
    pub target_type: String,
    /// Target title
    pub title: String,
    /// Target URL
    pub url: String,
    /// Whether target can be attached to
    pub attached: bool,
}

/// Browser launch options
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Run headless
    pub headless: bool,
    /// Window width in pixels
    pub window_width: u32,
    /// Window height in pixels
    pub window_height: u32,
    /// User agent passed on the command line
    pub user_agent: Option<String>,
    /// Chrome executable; searched for when unset
    pub executable_path: Option<String>,
    /// Profile directory; a throwaway one is created when unset
    pub user_data_dir: Option<String>,
    /// Attach to an already running browser instead of launching one
    pub cdp_endpoint: Option<String>,
    /// Remote debugging port (0 picks a free one)
    pub debug_port: u16,
    /// Extra command-line switches
    pub args: Vec<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            user_agent: None,
            executable_path: None,
            user_data_dir: None,
            cdp_endpoint: None,
            debug_port: 0,
            args: Vec::new(),
        }
    }
}

/// Produces a browser handle ready for target creation
#[async_trait]
pub trait BrowserLauncher: Send + Sync + std::fmt::Debug {
    /// Launch (or attach to) a browser
    async fn launch(&self, options: &BrowserOptions) -> Result<Arc<dyn CdpBrowser>, crate::Error>;
}
