//! Page utilities
//!
//! Navigation checks, history, readiness and wait checks. None of these touch
//! the element address table.

use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::traits::{PageInfo, WaitCondition};
use crate::cdp::{CdpClient, EvaluationResult};
use crate::{Error, Result};

/// Delay between readiness and wait checks
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

const NAVIGABLE_SCHEMES: &[&str] = &["http", "https", "about", "data", "file"];

/// Parse and vet a navigation target
pub fn validate_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| Error::navigation_failed(format!("Invalid URL '{}': {}", raw, e)))?;
    if !NAVIGABLE_SCHEMES.contains(&url.scheme()) {
        return Err(Error::navigation_failed(format!(
            "Unsupported URL scheme '{}' in '{}'",
            url.scheme(),
            raw
        )));
    }
    Ok(url)
}

/// Read `location.href` and `document.title`
pub async fn read_page_info(client: &dyn CdpClient) -> Result<PageInfo> {
    let title = client.evaluate("document.title", false).await?;
    let url = client.evaluate("location.href", false).await?;
    Ok(PageInfo {
        url: url.as_str().unwrap_or_default().to_string(),
        title: title.as_str().unwrap_or_default().to_string(),
    })
}

/// Poll `document.readyState` until `complete`. Unbounded; run under a deadline.
pub async fn wait_ready(client: &dyn CdpClient) -> Result<()> {
    loop {
        let state = client.evaluate("document.readyState", false).await?;
        if state.as_str() == Some("complete") {
            return Ok(());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Step back one entry in the tab's navigation history.
///
/// Fails at the oldest entry instead of silently staying put.
pub async fn history_back(client: &dyn CdpClient) -> Result<()> {
    let history = client
        .call_method("Page.getNavigationHistory", json!({}))
        .await?;
    let current = history
        .get("currentIndex")
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::cdp("No currentIndex in navigation history"))?;
    if current == 0 {
        return Err(Error::navigation_failed("No previous page in history"));
    }

    let entry_id = history
        .get("entries")
        .and_then(|entries| entries.get(current as usize - 1))
        .and_then(|entry| entry.get("id"))
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::navigation_failed("No previous page in history"))?;
    debug!("Going back from history entry {} to id {}", current, entry_id);

    client
        .call_method("Page.navigateToHistoryEntry", json!({ "entryId": entry_id }))
        .await?;
    // Give the navigation a tick to start before checking readiness
    tokio::time::sleep(POLL_INTERVAL).await;
    wait_ready(client).await
}

/// JS string literal for a selector
fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

fn text_script(selector: &str, multiple: bool) -> String {
    let matches = if multiple {
        format!("Array.from(document.querySelectorAll({}))", js_string(selector))
    } else {
        format!("[document.querySelector({})].filter(Boolean)", js_string(selector))
    };
    format!(
        "{}.map(el => (el.textContent || '').trim()).filter(text => text.length > 0)",
        matches
    )
}

/// Wait for `selector` to be visible, then read trimmed `textContent`.
/// Unbounded; run under a deadline.
pub async fn element_texts(client: &dyn CdpClient, selector: &str, multiple: bool) -> Result<Vec<String>> {
    poll_condition(client, &WaitCondition::ElementVisible(selector.to_string())).await?;

    let result = client.evaluate(&text_script(selector, multiple), false).await?;
    match result {
        EvaluationResult::Null => Ok(Vec::new()),
        EvaluationResult::Object(value) => serde_json::from_value(value)
            .map_err(|e| Error::script_execution_failed(format!("Unexpected text result: {}", e))),
        other => Err(Error::script_execution_failed(format!(
            "Unexpected text result: {:?}",
            other
        ))),
    }
}

fn visibility_check(selector: &str) -> String {
    format!(
        r#"(function() {{
  const el = document.querySelector({});
  if (!el) return false;
  const rect = el.getBoundingClientRect();
  const style = window.getComputedStyle(el);
  return rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden' && style.display !== 'none';
}})()"#,
        js_string(selector)
    )
}

impl WaitCondition {
    /// Expression evaluated on every poll
    pub fn check_script(&self) -> String {
        match self {
            WaitCondition::PageLoad => "document.readyState".to_string(),
            WaitCondition::ElementVisible(selector) | WaitCondition::ElementHidden(selector) => {
                visibility_check(selector)
            }
        }
    }

    /// Interpret one check result
    pub fn is_met(&self, result: &EvaluationResult) -> bool {
        match self {
            WaitCondition::PageLoad => result.as_str() == Some("complete"),
            WaitCondition::ElementVisible(_) => result.as_bool(),
            WaitCondition::ElementHidden(_) => !result.as_bool(),
        }
    }
}

/// Poll until the condition holds. Unbounded; run under a deadline.
pub async fn poll_condition(client: &dyn CdpClient, condition: &WaitCondition) -> Result<()> {
    let script = condition.check_script();
    let mut attempts: u64 = 0;
    loop {
        attempts += 1;
        let result = client.evaluate(&script, false).await?;
        if condition.is_met(&result) {
            debug!("{:?} met after {} check(s)", condition, attempts);
            return Ok(());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
