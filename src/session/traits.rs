//! Session management traits
//!
//! The interface interaction tools consume: session lifecycle, page model
//! extraction, index resolution and coordinate-based interactions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::context::SessionContext;
use crate::address::ElementAddress;
use crate::cdp::ScreenshotFormat;
use crate::extract::Extraction;

/// Typing options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeOptions {
    /// Select and delete existing content first
    pub clear: bool,
    /// Press Enter after typing
    pub submit: bool,
}

/// Replaces the field's content without submitting
impl Default for TypeOptions {
    fn default() -> Self {
        Self {
            clear: true,
            submit: false,
        }
    }
}

/// Where the page currently is
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub url: String,
    pub title: String,
}

/// Condition polled by `wait_for`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    /// `document.readyState` is `complete`
    PageLoad,
    /// An element matching the CSS selector is rendered with a non-empty box
    ElementVisible(String),
    /// No element matching the CSS selector is visible
    ElementHidden(String),
}

/// Screenshot options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenshotOptions {
    pub format: ScreenshotFormat,
    /// Capture the whole document instead of the viewport
    pub full_page: bool,
}

impl Default for ScreenshotOptions {
    fn default() -> Self {
        Self {
            format: ScreenshotFormat::Png,
            full_page: false,
        }
    }
}

/// Captured image
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub bytes: Vec<u8>,
    pub format: ScreenshotFormat,
    pub captured_at: DateTime<Utc>,
}

/// Session manager trait
///
/// One engine owns at most one live browser session. Every operation that
/// blocks on the browser takes a deadline and fails with `Error::Timeout`
/// rather than hanging.
#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Start the session unless one is already live
    async fn ensure_active(&self) -> Result<(), crate::Error>;

    /// `ensure_active` with a caller-supplied start deadline
    async fn ensure_active_within(&self, timeout: Duration) -> Result<(), crate::Error>;

    /// Launch, configure and verify a browser session.
    ///
    /// Either the session is fully published or the call fails and nothing
    /// is left running.
    async fn start(&self) -> Result<(), crate::Error>;

    /// `start` bounded by `timeout` instead of the configured start timeout
    async fn start_within(&self, timeout: Duration) -> Result<(), crate::Error>;

    /// Tear the session down. No-op when inactive.
    async fn stop(&self) -> Result<(), crate::Error>;

    fn is_active(&self) -> bool;

    /// The live session, if any
    fn context(&self) -> Option<Arc<SessionContext>>;

    /// Describe the visible page and replace the element address table
    async fn extract(&self, max_length: usize, timeout: Duration) -> Result<Extraction, crate::Error>;

    /// Resolve an index from the most recent extraction
    fn get_element(&self, index: usize) -> Option<ElementAddress>;

    /// Click the center of an extracted element
    async fn click(&self, index: usize, timeout: Duration) -> Result<ElementAddress, crate::Error>;

    /// Focus an extracted element by clicking it, then type into it
    async fn type_text(
        &self,
        index: usize,
        text: &str,
        options: TypeOptions,
        timeout: Duration,
    ) -> Result<ElementAddress, crate::Error>;

    /// Navigate to an absolute URL, starting the session if needed
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<PageInfo, crate::Error>;

    /// Current URL and title
    async fn page_info(&self, timeout: Duration) -> Result<PageInfo, crate::Error>;

    /// Trimmed text of the first element matching `selector`, or of every
    /// match with `multiple`. Waits for the first match to be visible; empty
    /// texts are dropped.
    async fn extract_text(
        &self,
        selector: &str,
        multiple: bool,
        timeout: Duration,
    ) -> Result<Vec<String>, crate::Error>;

    /// Go back one history entry
    async fn go_back(&self, timeout: Duration) -> Result<PageInfo, crate::Error>;

    /// Poll until `condition` holds. `Ok(false)` when the deadline passes first.
    async fn wait_for(&self, condition: WaitCondition, timeout: Duration) -> Result<bool, crate::Error>;

    /// Capture the viewport or the full page
    async fn screenshot(&self, options: ScreenshotOptions, timeout: Duration) -> Result<Screenshot, crate::Error>;

    /// Capture and write `<uuid>.<ext>` into the screenshot directory
    async fn save_screenshot(&self, options: ScreenshotOptions, timeout: Duration) -> Result<PathBuf, crate::Error>;
}
