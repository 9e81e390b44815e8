//! # Session lifecycle
//!
//! One engine, at most one live browser session. The manager launches and
//! verifies the session atomically, owns the element address table, and
//! drives coordinate-based interactions against it.
//!
//! ## Concurrency
//! - start and stop are serialised by an async mutex
//! - the published session is an `Arc<SessionContext>` behind a sync `RwLock`,
//!   so readers never see a half-started session
//! - every blocking call runs under `SessionContext::run_bounded`
//!
//! ## Module structure
//! - `traits`: the `SessionManager` interface and its option/result types
//! - `context`: the live session handle and the bounded-call helper
//! - `manager`: `SessionManagerImpl`
//! - `element`: click and type at recorded coordinates
//! - `page`: navigation checks, history and wait checks
//!
//! ## Example
//! ```rust,no_run
//! use chaser_lens::session::{SessionManager, SessionManagerImpl};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = SessionManagerImpl::mock();
//! manager.navigate("https://example.com", Duration::from_secs(30)).await?;
//! let page = manager.extract(10_000, Duration::from_secs(10)).await?;
//! println!("{}", page.text);
//! manager.click(0, Duration::from_secs(10)).await?;
//! manager.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod context;
pub mod manager;
pub mod element;
pub mod page;

#[cfg(test)]
mod tests;

pub use context::SessionContext;
pub use manager::SessionManagerImpl;
pub use traits::{
    PageInfo, Screenshot, ScreenshotOptions, SessionManager, TypeOptions, WaitCondition,
};
