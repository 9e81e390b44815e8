//! # Anti-fingerprinting
//!
//! A fixed browser profile (desktop Chrome on Windows) and the injector that
//! installs it into each new page target before the session is published.
//!
//! ## Overrides
//! - `navigator.webdriver` hidden, `AutomationControlled` Blink feature off
//! - platform, languages, hardware concurrency and device memory
//! - plugin and MIME type lists, connection info, screen geometry
//! - User-Agent, locale and timezone at protocol level
//!
//! ## Module structure
//! - `traits`: the `ScriptInjector` seam
//! - `profile`: the fixed profile, its launch flags and init script
//! - `injector`: CDP implementation of `ScriptInjector`
//!
//! ## Example
//! ```rust,no_run
//! use chaser_lens::cdp::CdpClient;
//! use chaser_lens::stealth::{CdpScriptInjector, ScriptInjector, StealthProfile};
//!
//! # async fn example(client: &dyn CdpClient) -> Result<(), Box<dyn std::error::Error>> {
//! let applied = CdpScriptInjector::new()
//!     .apply(client, &StealthProfile::default())
//!     .await?;
//! println!("Applied {} features", applied.features.len());
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod profile;
pub mod injector;


pub use injector::CdpScriptInjector;
pub use profile::{ConnectionProfile, ScreenProfile, StealthProfile, MIME_TYPES, PLUGINS};
pub use traits::{AppliedFeatures, ScriptInjector};
