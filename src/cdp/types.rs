//! CDP (Chrome DevTools Protocol) type definitions
//!
//! This module defines the core data structures for CDP communication.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// CDP JSON-RPC request
#[derive(Debug, Clone, Serialize)]
pub struct CdpRequest {
    /// Request ID
    pub id: u64,
    /// Method name (e.g., "Page.navigate")
    pub method: String,
    /// Method parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Session ID for multi-session targets
    #[serde(skip_serializing_if = "Option::is_none", rename = "sessionId")]
    pub session_id: Option<String>,
}

/// CDP JSON-RPC notification (event)
#[derive(Debug, Clone, Deserialize)]
pub struct CdpNotification {
    /// Event method (e.g., "Page.loadEventFired")
    pub method: String,
    /// Event parameters
    #[serde(default)]
    pub params: Value,
    /// Session ID for multi-session targets
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

/// CDP JSON-RPC response
#[derive(Debug, Clone, Deserialize)]
pub struct CdpRpcResponse {
    /// Response ID (matches request ID)
    pub id: u64,
    /// Response result
    #[serde(default)]
    pub result: Value,
    /// Error if any
    #[serde(default)]
    pub error: Option<CdpErrorDetail>,
}

/// CDP error detail
#[derive(Debug, Clone, Deserialize)]
pub struct CdpErrorDetail {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    #[serde(default)]
    pub data: Option<Value>,
}

/// Page navigation parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateParams {
    /// URL to navigate to
    pub url: String,
    /// Referrer URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    /// Transition type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_type: Option<String>,
}

/// JavaScript evaluation parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
    /// JavaScript expression to evaluate
    pub expression: String,
    /// Whether to await promise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub await_promise: Option<bool>,
    /// Whether to return as value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_by_value: Option<bool>,
    /// Whether the evaluation counts as a user gesture
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_gesture: Option<bool>,
}

/// Screenshot parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotParams {
    /// Image format
    pub format: String,
    /// JPEG/WebP quality (0-100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    /// Region to capture
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<Clip>,
    /// Render content outside the viewport
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_beyond_viewport: Option<bool>,
}

/// Clip region for screenshot
#[derive(Debug, Clone, Serialize)]
pub struct Clip {
    /// X offset
    pub x: f64,
    /// Y offset
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
    /// Page scale factor
    pub scale: f64,
}

/// Remote object (result of JavaScript evaluation)
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    /// Object type
    #[serde(default)]
    pub r#type: String,
    /// Object subtype
    #[serde(default)]
    pub subtype: Option<String>,
    /// Object value
    #[serde(default)]
    pub value: Option<Value>,
    /// Object description
    #[serde(default)]
    pub description: Option<String>,
    /// Unserializable value
    #[serde(default)]
    pub unserializable_value: Option<String>,
}

/// Exception details
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    /// Exception text
    #[serde(default)]
    pub text: Option<String>,
    /// Exception object
    #[serde(default)]
    pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
    /// Most descriptive message available
    pub fn message(&self) -> String {
        self.exception
            .as_ref()
            .and_then(|e| e.description.clone())
            .or_else(|| self.text.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

/// JavaScript evaluation response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    /// Evaluation result
    #[serde(default)]
    pub result: RemoteObject,
    /// Exception details if evaluation failed
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

/// Modifier bits for `Input.dispatchKeyEvent`
pub const MODIFIER_CTRL: u8 = 2;

/// A key press expressed as `Input.dispatchKeyEvent` parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    /// DOM `key` value
    pub key: String,
    /// DOM `code` value
    pub code: String,
    /// Windows virtual key code
    pub key_code: u32,
    /// Text the key produces, if printable
    pub text: Option<String>,
    /// Modifier bitmask
    pub modifiers: u8,
    /// Editing commands executed with the key
    pub commands: Vec<String>,
}

impl KeyPress {
    /// Enter, which submits forms
    pub fn enter() -> Self {
        Self {
            key: "Enter".to_string(),
            code: "Enter".to_string(),
            key_code: 13,
            text: Some("\r".to_string()),
            modifiers: 0,
            commands: Vec::new(),
        }
    }

    /// Backspace, which deletes the selection
    pub fn backspace() -> Self {
        Self {
            key: "Backspace".to_string(),
            code: "Backspace".to_string(),
            key_code: 8,
            text: None,
            modifiers: 0,
            commands: Vec::new(),
        }
    }

    /// Ctrl+A; the explicit `selectAll` command makes it work headless too
    pub fn select_all() -> Self {
        Self {
            key: "a".to_string(),
            code: "KeyA".to_string(),
            key_code: 65,
            text: None,
            modifiers: MODIFIER_CTRL,
            commands: vec!["selectAll".to_string()],
        }
    }

    /// A printable character
    pub fn character(ch: char) -> Self {
        let upper = ch.to_ascii_uppercase();
        let (code, key_code) = if ch.is_ascii_alphabetic() {
            (format!("Key{}", upper), upper as u32)
        } else if ch.is_ascii_digit() {
            (format!("Digit{}", ch), ch as u32)
        } else if ch == ' ' {
            ("Space".to_string(), 32)
        } else {
            (String::new(), 0)
        };
        Self {
            key: ch.to_string(),
            code,
            key_code,
            text: Some(ch.to_string()),
            modifiers: 0,
            commands: Vec::new(),
        }
    }

    /// Parameters for the key-down half
    pub fn down_params(&self) -> Value {
        let mut params = json!({
            "type": if self.text.is_some() { "keyDown" } else { "rawKeyDown" },
            "key": self.key,
            "code": self.code,
            "windowsVirtualKeyCode": self.key_code,
            "modifiers": self.modifiers,
        });
        if let Some(text) = &self.text {
            params["text"] = json!(text);
            params["unmodifiedText"] = json!(text);
        }
        if !self.commands.is_empty() {
            params["commands"] = json!(self.commands);
        }
        params
    }

    /// Parameters for the key-up half
    pub fn up_params(&self) -> Value {
        json!({
            "type": "keyUp",
            "key": self.key,
            "code": self.code,
            "windowsVirtualKeyCode": self.key_code,
            "modifiers": self.modifiers,
        })
    }
}
