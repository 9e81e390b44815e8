//! # Page model extraction
//!
//! Turns the rendered page into one line per visible, meaningful element,
//! `<kind id=N>label</kind>`, and publishes each element's on-screen
//! coordinates to the [`ElementAddressTable`](crate::address::ElementAddressTable).
//!
//! ## Module structure
//! - `script`: the in-page traversal
//! - `snapshot`: typed decode of the script result and the viewport test
//! - `classify`: tag blacklist, element kinds and labels
//! - `extractor`: culling, numbering, rendering and publication

pub mod script;
pub mod snapshot;
pub mod classify;
pub mod extractor;


pub use classify::{is_blacklisted, label_for, ElementKind, ElementRecord};
pub use extractor::{build_records, render, Extraction, PageExtractor};
pub use script::{PAGE_SNAPSHOT_SCRIPT, SNAPSHOT_MARKER};
pub use snapshot::{NodeSnapshot, PageSnapshot, Rect, Viewport};
