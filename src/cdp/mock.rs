//! Mock CDP implementation for testing
//!
//! In-process fakes for the connection, client, browser and launcher traits.
//! The client answers scripts from a table of substring responders, records
//! every command it receives, and can be told to fail or stall.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cdp::traits::*;
use crate::Error;

/// 1x1 transparent PNG
const MOCK_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock CDP connection
#[derive(Debug)]
pub struct MockCdpConnection {
    is_active: AtomicBool,
    next_id: AtomicU64,
}

impl MockCdpConnection {
    /// Create a new mock CDP connection
    pub fn new() -> Self {
        Self {
            is_active: AtomicBool::new(true),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for MockCdpConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CdpConnection for MockCdpConnection {
    async fn send_command(&self, method: &str, _params: Value) -> Result<CdpResponse, Error> {
        if !self.is_active.load(Ordering::SeqCst) {
            return Err(Error::websocket("Connection is not active"));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let result = match method {
            "Page.navigate" => json!({
                "frameId": uuid::Uuid::new_v4().to_string(),
                "loaderId": uuid::Uuid::new_v4().to_string(),
            }),
            "Page.captureScreenshot" => json!({ "data": MOCK_PNG_BASE64 }),
            "Page.getLayoutMetrics" => json!({
                "cssContentSize": { "x": 0, "y": 0, "width": 1920, "height": 3000 }
            }),
            "Page.getNavigationHistory" => json!({
                "currentIndex": 0,
                "entries": [{ "id": 1, "url": "about:blank", "title": "" }]
            }),
            _ => json!({}),
        };

        Ok(CdpResponse {
            id,
            result: Some(result),
            error: None,
        })
    }

    async fn listen_events(&self) -> Result<tokio::sync::mpsc::Receiver<CdpEvent>, Error> {
        let (_tx, rx) = tokio::sync::mpsc::channel(100);
        Ok(rx)
    }

    async fn close(&self) -> Result<(), Error> {
        self.is_active.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }
}

/// A command received by [`MockCdpClient`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// CDP method (evaluations are recorded as `Runtime.evaluate`)
    pub method: String,
    /// Parameters as sent
    pub params: Value,
}

/// Mock CDP client
#[derive(Debug)]
pub struct MockCdpClient {
    connection: Arc<MockCdpConnection>,
    url: Mutex<String>,
    title: Mutex<String>,
    /// (script fragment, JSON result); later entries win
    responders: Mutex<Vec<(String, Value)>>,
    /// CDP method -> result, ahead of the connection's defaults
    method_results: Mutex<HashMap<String, Value>>,
    /// Method or script fragment -> error message
    failures: Mutex<HashMap<String, String>>,
    latency: Mutex<Option<Duration>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockCdpClient {
    /// Create a new mock CDP client showing an empty page
    pub fn new() -> Self {
        let client = Self {
            connection: Arc::new(MockCdpConnection::new()),
            url: Mutex::new("about:blank".to_string()),
            title: Mutex::new("Test Page".to_string()),
            responders: Mutex::new(Vec::new()),
            method_results: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            latency: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        };
        client.set_page_snapshot(json!({
            "viewport": { "width": 1920, "height": 1080, "scrollX": 0, "scrollY": 0 },
            "nodes": []
        }));
        client
    }

    /// Answer the page-snapshot script with `snapshot`
    pub fn set_page_snapshot(&self, snapshot: Value) {
        self.respond_to(crate::extract::SNAPSHOT_MARKER, snapshot);
    }

    /// Answer any evaluated script containing `fragment` with `result`
    pub fn respond_to(&self, fragment: &str, result: Value) {
        lock(&self.responders).push((fragment.to_string(), result));
    }

    /// Answer `call_method(method, ..)` with `result`
    pub fn respond_to_method(&self, method: &str, result: Value) {
        lock(&self.method_results).insert(method.to_string(), result);
    }

    /// Set the document title
    pub fn set_title(&self, title: &str) {
        *lock(&self.title) = title.to_string();
    }

    /// Make a CDP method, or any script containing the fragment, fail
    pub fn fail_on(&self, method_or_fragment: &str, message: &str) {
        lock(&self.failures).insert(method_or_fragment.to_string(), message.to_string());
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        lock(&self.failures).clear();
    }

    /// Delay every command by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        *lock(&self.latency) = latency;
    }

    /// Everything received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Parameters of every call to `method`
    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.method == method)
            .map(|c| c.params.clone())
            .collect()
    }

    /// Evaluated expressions, in order
    pub fn evaluated_scripts(&self) -> Vec<String> {
        self.calls_to("Runtime.evaluate")
            .iter()
            .filter_map(|p| p.get("expression").and_then(|e| e.as_str()).map(str::to_string))
            .collect()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Current URL
    pub fn current_url(&self) -> String {
        lock(&self.url).clone()
    }

    fn record(&self, method: &str, params: Value) {
        lock(&self.calls).push(RecordedCall {
            method: method.to_string(),
            params,
        });
    }

    fn failure_for(&self, method: &str, script: Option<&str>) -> Option<String> {
        let failures = lock(&self.failures);
        if let Some(message) = failures.get(method) {
            return Some(message.clone());
        }
        let script = script?;
        failures
            .iter()
            .find(|(fragment, _)| script.contains(fragment.as_str()))
            .map(|(_, message)| message.clone())
    }

    async fn simulate_latency(&self) {
        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn scripted_result(&self, script: &str) -> Option<Value> {
        lock(&self.responders)
            .iter()
            .rev()
            .find(|(fragment, _)| script.contains(fragment.as_str()))
            .map(|(_, result)| result.clone())
    }
}

impl Default for MockCdpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn to_evaluation_result(value: Value) -> EvaluationResult {
    match value {
        Value::Null => EvaluationResult::Null,
        Value::Bool(b) => EvaluationResult::Bool(b),
        Value::Number(n) => EvaluationResult::Number(n.as_f64().unwrap_or(0.0)),
        Value::String(s) => EvaluationResult::String(s),
        other => EvaluationResult::Object(other),
    }
}

#[async_trait]
impl CdpClient for MockCdpClient {
    fn connection(&self) -> Arc<dyn CdpConnection> {
        self.connection.clone()
    }

    async fn navigate(&self, url: &str) -> Result<NavigationResult, Error> {
        self.record("Page.navigate", json!({ "url": url }));
        self.simulate_latency().await;
        if let Some(message) = self.failure_for("Page.navigate", None) {
            return Err(Error::navigation_failed(message));
        }

        *lock(&self.url) = url.to_string();
        Ok(NavigationResult {
            navigation_id: Some(uuid::Uuid::new_v4().to_string()),
            url: url.to_string(),
            loaded: true,
        })
    }

    async fn evaluate(&self, script: &str, await_promise: bool) -> Result<EvaluationResult, Error> {
        self.record(
            "Runtime.evaluate",
            json!({ "expression": script, "awaitPromise": await_promise }),
        );
        self.simulate_latency().await;
        if let Some(message) = self.failure_for("Runtime.evaluate", Some(script)) {
            return Err(Error::script_execution_failed(message));
        }

        if let Some(result) = self.scripted_result(script) {
            return Ok(to_evaluation_result(result));
        }

        let result = if script.contains("document.readyState") {
            EvaluationResult::String("complete".to_string())
        } else if script.contains("document.title") {
            EvaluationResult::String(lock(&self.title).clone())
        } else if script.contains("location.href") {
            EvaluationResult::String(self.current_url())
        } else {
            EvaluationResult::Null
        };
        Ok(result)
    }

    async fn screenshot(&self, format: ScreenshotFormat, full_page: bool) -> Result<Vec<u8>, Error> {
        let params = json!({ "format": format.extension(), "fullPage": full_page });
        let result = self.call_method("Page.captureScreenshot", params).await?;
        let data = result
            .get("data")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::cdp("No data in screenshot result"))?;
        BASE64
            .decode(data)
            .map_err(|e| Error::cdp(format!("Failed to decode screenshot: {}", e)))
    }

    async fn enable_domain(&self, domain: &str) -> Result<(), Error> {
        self.call_method(&format!("{}.enable", domain), json!({}))
            .await?;
        Ok(())
    }

    async fn call_method(&self, method: &str, params: Value) -> Result<Value, Error> {
        self.record(method, params.clone());
        self.simulate_latency().await;
        if let Some(message) = self.failure_for(method, None) {
            return Err(Error::cdp(message));
        }

        let scripted = lock(&self.method_results).get(method).cloned();
        if let Some(result) = scripted {
            return Ok(result);
        }

        let response = self.connection.send_command(method, params).await?;
        response.result.ok_or_else(|| Error::cdp("No result in response"))
    }

    async fn subscribe_events(&self, _event_type: &str) -> Result<tokio::sync::mpsc::Receiver<CdpEvent>, Error> {
        self.connection.listen_events().await
    }
}

/// Mock CDP browser handing out one shared client
#[derive(Debug)]
pub struct MockCdpBrowser {
    client: Arc<MockCdpClient>,
    closed: AtomicBool,
    targets_created: AtomicUsize,
}

impl MockCdpBrowser {
    /// Create a new mock browser around `client`
    pub fn new(client: Arc<MockCdpClient>) -> Self {
        Self {
            client,
            closed: AtomicBool::new(false),
            targets_created: AtomicUsize::new(0),
        }
    }

    /// The client every target resolves to
    pub fn client(&self) -> Arc<MockCdpClient> {
        Arc::clone(&self.client)
    }

    /// Whether `close()` has run
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of targets created
    pub fn targets_created(&self) -> usize {
        self.targets_created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CdpBrowser for MockCdpBrowser {
    async fn create_client(&self, _target_url: &str) -> Result<Arc<dyn CdpClient>, Error> {
        if self.is_closed() {
            return Err(Error::websocket("Browser is closed"));
        }
        Ok(self.client.clone())
    }

    async fn close(&self) -> Result<(), Error> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn get_version(&self) -> Result<BrowserVersion, Error> {
        Ok(BrowserVersion {
            protocol_version: "1.3".to_string(),
            product: "MockChrome/120.0.0.0".to_string(),
            user_agent: crate::config::DEFAULT_USER_AGENT.to_string(),
            js_version: "12.0".to_string(),
        })
    }

    async fn get_targets(&self) -> Result<Vec<TargetInfo>, Error> {
        Ok(vec![TargetInfo {
            target_id: "mock-target".to_string(),
            target_type: "page".to_string(),
            title: lock(&self.client.title).clone(),
            url: self.client.current_url(),
            attached: true,
        }])
    }

    async fn create_target(&self, _url: &str) -> Result<String, Error> {
        if self.is_closed() {
            return Err(Error::http("Browser is closed"));
        }
        let n = self.targets_created.fetch_add(1, Ordering::SeqCst);
        Ok(format!("ws://mock/devtools/page/{}", n))
    }
}

/// Mock launcher producing [`MockCdpBrowser`]s over a shared client
#[derive(Debug)]
pub struct MockBrowserLauncher {
    client: Arc<MockCdpClient>,
    browsers: Mutex<Vec<Arc<MockCdpBrowser>>>,
    failure: Mutex<Option<String>>,
    delay: Mutex<Option<Duration>>,
    last_options: Mutex<Option<BrowserOptions>>,
}

impl MockBrowserLauncher {
    /// Create a launcher with a fresh client
    pub fn new() -> Self {
        Self::with_client(Arc::new(MockCdpClient::new()))
    }

    /// Create a launcher whose browsers all serve `client`
    pub fn with_client(client: Arc<MockCdpClient>) -> Self {
        Self {
            client,
            browsers: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            delay: Mutex::new(None),
            last_options: Mutex::new(None),
        }
    }

    /// The shared client
    pub fn client(&self) -> Arc<MockCdpClient> {
        Arc::clone(&self.client)
    }

    /// Make subsequent launches fail (or succeed again with `None`)
    pub fn set_failure(&self, message: Option<&str>) {
        *lock(&self.failure) = message.map(str::to_string);
    }

    /// Delay every launch
    pub fn set_delay(&self, delay: Option<Duration>) {
        *lock(&self.delay) = delay;
    }

    /// Number of successful launches
    pub fn launch_count(&self) -> usize {
        lock(&self.browsers).len()
    }

    /// Options passed to the most recent launch attempt
    pub fn last_options(&self) -> Option<BrowserOptions> {
        lock(&self.last_options).clone()
    }

    /// The most recently launched browser
    pub fn last_browser(&self) -> Option<Arc<MockCdpBrowser>> {
        lock(&self.browsers).last().cloned()
    }
}

impl Default for MockBrowserLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserLauncher for MockBrowserLauncher {
    async fn launch(&self, options: &BrowserOptions) -> Result<Arc<dyn CdpBrowser>, Error> {
        *lock(&self.last_options) = Some(options.clone());
        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = lock(&self.failure).clone() {
            return Err(Error::browser_launch(message));
        }

        let browser = Arc::new(MockCdpBrowser::new(self.client()));
        lock(&self.browsers).push(Arc::clone(&browser));
        Ok(browser)
    }
}
