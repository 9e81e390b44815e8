//! Page model extractor

use super::classify::{is_blacklisted, label_for, ElementKind, ElementRecord};
use super::script::PAGE_SNAPSHOT_SCRIPT;
use super::snapshot::{PageSnapshot, Viewport};
use crate::address::{ElementAddress, ElementAddressTable};
use crate::normalize::normalize_within;
use crate::session::SessionContext;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Result of one extraction
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Normalized, possibly truncated page model
    pub text: String,
    /// Whether the normalized text exceeded the budget
    pub truncated: bool,
    /// Number of records (and address table entries)
    pub element_count: usize,
    /// Viewport the snapshot was taken in
    pub viewport: Viewport,
}

/// Turns the live page into text plus a fresh address table
#[derive(Debug, Clone)]
pub struct PageExtractor {
    table: Arc<ElementAddressTable>,
}

impl PageExtractor {
    /// Create an extractor publishing into `table`
    pub fn new(table: Arc<ElementAddressTable>) -> Self {
        Self { table }
    }

    /// The table this extractor replaces
    pub fn table(&self) -> &Arc<ElementAddressTable> {
        &self.table
    }

    /// Snapshot the page, then publish records and addresses.
    ///
    /// Script failures and timeouts leave the current table untouched.
    #[instrument(skip(self, ctx), fields(session = %ctx.id()))]
    pub async fn extract(
        &self,
        ctx: &SessionContext,
        max_length: usize,
        timeout: Duration,
    ) -> Result<Extraction> {
        let client = ctx.client();
        let result = ctx
            .run_bounded("extract", timeout, client.evaluate(PAGE_SNAPSHOT_SCRIPT, false))
            .await?;
        let snapshot = PageSnapshot::decode(result)?;
        if ctx.is_cancelled() {
            return Err(Error::cancelled(format!("extract aborted: session {} stopped", ctx.id())));
        }

        let extraction = self.apply(&snapshot, max_length);
        // A stop that raced the publish must not leave addresses behind
        if ctx.is_cancelled() {
            self.table.clear();
            return Err(Error::cancelled(format!("extract aborted: session {} stopped", ctx.id())));
        }
        Ok(extraction)
    }

    /// Publish a decoded snapshot
    pub fn apply(&self, snapshot: &PageSnapshot, max_length: usize) -> Extraction {
        let records = build_records(snapshot);

        let addresses: HashMap<usize, ElementAddress> =
            records.iter().map(|r| (r.index, r.address)).collect();
        // Addresses cover every record, including ones the budget cuts from the text
        self.table.replace(addresses);

        let rendered = render(&records);
        let (text, truncated) = normalize_within(&rendered, max_length);

        info!(
            "Extracted {} element(s) from {} node(s), {} bytes{}",
            records.len(),
            snapshot.nodes.len(),
            text.len(),
            if truncated { " (truncated)" } else { "" }
        );
        debug!("Page model:\n{}", text);

        Extraction {
            text,
            truncated,
            element_count: records.len(),
            viewport: snapshot.viewport,
        }
    }
}

/// Cull, classify and label nodes in document order, numbering the survivors
pub fn build_records(snapshot: &PageSnapshot) -> Vec<ElementRecord> {
    let viewport = &snapshot.viewport;
    let mut records = Vec::new();

    for node in &snapshot.nodes {
        if is_blacklisted(&node.tag) || !viewport.intersects(&node.rect) {
            continue;
        }

        let kind = ElementKind::classify(node);
        let label = label_for(kind, node);
        if label.is_empty() && !kind.is_interactive() {
            continue;
        }

        let rect = &node.rect;
        records.push(ElementRecord {
            index: records.len(),
            kind,
            label,
            address: ElementAddress::from_rect(rect.x, rect.y, rect.width, rect.height),
        });
    }

    records
}

/// One line per record
pub fn render(records: &[ElementRecord]) -> String {
    records
        .iter()
        .map(ElementRecord::render)
        .collect::<Vec<_>>()
        .join("\n")
}
