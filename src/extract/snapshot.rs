//! Typed page snapshot
//!
//! The only place the script's JSON payload is interpreted.

use crate::cdp::EvaluationResult;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Viewport geometry at snapshot time
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub scroll_x: f64,
    #[serde(default)]
    pub scroll_y: f64,
}

impl Viewport {
    /// Whether a viewport-relative rect overlaps the visible area.
    ///
    /// Evaluated in page coordinates against
    /// `[scrollX, scrollX + width] x [scrollY, scrollY + height]`. The test is
    /// strict, so empty rects (e.g. `display: none`) never intersect.
    pub fn intersects(&self, rect: &Rect) -> bool {
        let left = rect.x + self.scroll_x;
        let top = rect.y + self.scroll_y;
        let right = left + rect.width;
        let bottom = top + rect.height;

        left < self.scroll_x + self.width
            && right > self.scroll_x
            && top < self.scroll_y + self.height
            && bottom > self.scroll_y
    }
}

/// Bounding client rect
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One element as reported by the script
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    pub tag: String,
    #[serde(default)]
    pub rect: Rect,
    /// Direct text children only
    #[serde(default)]
    pub own_text: String,
    /// All descendant text; only reported where a label may need it
    #[serde(default)]
    pub deep_text: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default, rename = "type")]
    pub input_type: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Live form value
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub has_click_handler: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

/// Everything one snapshot script run returned
#[derive(Debug, Clone, Deserialize)]
pub struct PageSnapshot {
    pub viewport: Viewport,
    #[serde(default)]
    pub nodes: Vec<NodeSnapshot>,
}

impl PageSnapshot {
    /// Decode the evaluation result of the snapshot script
    pub fn decode(result: EvaluationResult) -> Result<Self> {
        match result {
            EvaluationResult::Object(value) => serde_json::from_value(value).map_err(|e| {
                Error::script_execution_failed(format!("Malformed page snapshot: {}", e))
            }),
            other => Err(Error::script_execution_failed(format!(
                "Page snapshot script returned {:?} instead of an object",
                other
            ))),
        }
    }
}
