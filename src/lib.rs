//! Chaser-Lens: page-model extraction and stable element addressing
//!
//! Turns a live Chrome page into a compact, numbered description of what is
//! on screen, and lets later clicks and keystrokes target those numbers by
//! the coordinates recorded at extraction time.

pub mod error;
pub mod config;

pub mod cdp;
pub mod stealth;
pub mod normalize;
pub mod address;
pub mod extract;
pub mod session;

// Re-exports
pub use address::{ElementAddress, ElementAddressTable, Point};
pub use error::{Error, Result};
pub use extract::{Extraction, PageExtractor};
pub use session::{SessionManager, SessionManagerImpl};

/// Chaser-Lens library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
