//! # Chrome DevTools Protocol (CDP) layer
//!
//! The browser-automation collaborator the engine drives: a WebSocket JSON-RPC
//! client for one page target, the DevTools HTTP discovery endpoints, and a
//! launcher that starts a local Chrome with remote debugging enabled.
//!
//! ## Module structure
//! - `traits`: connection, client, browser and launcher traits
//! - `types`: wire types for requests, responses and input events
//! - `connection`: WebSocket connection with id-correlated replies
//! - `client`: typed client (navigation, evaluation, screenshots, input)
//! - `browser`: browser-level operations over the HTTP endpoints
//! - `launcher`: Chrome process launcher
//! - `mock`: in-process fakes for tests
//!
//! ## Example
//! ```rust,no_run
//! use chaser_lens::cdp::{BrowserLauncher, BrowserOptions, ChromeLauncher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let browser = ChromeLauncher::new().launch(&BrowserOptions::default()).await?;
//! let target = browser.create_target("about:blank").await?;
//! let client = browser.create_client(&target).await?;
//! let result = client.navigate("https://example.com").await?;
//! println!("Navigated to: {}", result.url);
//! browser.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod types;
pub mod connection;
pub mod client;
pub mod browser;
pub mod launcher;
pub mod mock;


pub use traits::{
    BrowserLauncher, BrowserOptions, BrowserVersion, CdpBrowser, CdpClient, CdpConnection,
    CdpError, CdpEvent, CdpResponse, EvaluationResult, NavigationResult, ScreenshotFormat,
    TargetInfo,
};
pub use types::KeyPress;

// Re-export implementation structs
pub use connection::CdpWebSocketConnection;
pub use client::CdpClientImpl;
pub use browser::CdpBrowserImpl;
pub use launcher::ChromeLauncher;

// Re-export mocks for downstream tests
pub use mock::{MockBrowserLauncher, MockCdpBrowser, MockCdpClient, RecordedCall};
