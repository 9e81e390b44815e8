//! Element address table
//!
//! Maps extraction indices to viewport coordinates. The whole table is
//! swapped by each extraction; there is no merging and no versioning.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A viewport-relative point in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Where an extracted element was on screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElementAddress {
    /// Center of the bounding box; interactions target this point
    pub center: Point,
    /// Top-left corner of the bounding box
    pub origin: Point,
}

impl ElementAddress {
    /// Build from a bounding rectangle
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            center: Point::new(x + width / 2.0, y + height / 2.0),
            origin: Point::new(x, y),
        }
    }
}

/// Index -> coordinates for the most recent extraction
#[derive(Debug, Default)]
pub struct ElementAddressTable {
    entries: RwLock<HashMap<usize, ElementAddress>>,
}

impl ElementAddressTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a half-written map, since
    // writers only ever assign a complete one.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<usize, ElementAddress>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<usize, ElementAddress>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Resolve an index from the current table
    pub fn get_element(&self, index: usize) -> Option<ElementAddress> {
        self.read().get(&index).copied()
    }

    /// Swap in a new table, discarding the previous one entirely
    pub fn replace(&self, table: HashMap<usize, ElementAddress>) {
        *self.write() = table;
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Number of resolvable indices
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
