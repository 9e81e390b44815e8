//! CDP browser control implementation
//!
//! Browser-level operations over the DevTools HTTP endpoints. A handle either
//! attaches to an existing browser or owns the process it launched.

use super::client::CdpClientImpl;
use super::connection::CdpWebSocketConnection;
use super::traits::*;
use crate::Error;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::process::Child;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// A browser process started by this crate
#[derive(Debug)]
pub(crate) struct BrowserProcess {
    pub(crate) child: Child,
    /// Throwaway profile; removed when the handle drops
    pub(crate) profile_dir: Option<TempDir>,
}

/// CDP browser implementation
#[derive(Debug)]
pub struct CdpBrowserImpl {
    /// Browser endpoint (e.g., "ws://localhost:9222")
    endpoint: String,
    /// HTTP client for the discovery endpoints
    http: reqwest::Client,
    /// Active connections (target_id -> connection)
    connections: Mutex<HashMap<String, Arc<dyn CdpConnection>>>,
    /// Owned process, when launched rather than attached
    process: Mutex<Option<BrowserProcess>>,
}

impl CdpBrowserImpl {
    /// Attach to a browser
    ///
    /// # Arguments
    /// * `endpoint` - Browser endpoint (e.g., "ws://localhost:9222" or "http://127.0.0.1:9222")
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        let endpoint = endpoint.into();
        debug!("Creating CDP browser controller for endpoint: {}", endpoint);
        Self {
            endpoint,
            http: reqwest::Client::new(),
            connections: Mutex::new(HashMap::new()),
            process: Mutex::new(None),
        }
    }

    /// Take ownership of a launched process
    pub(crate) fn with_process<S: Into<String>>(endpoint: S, process: BrowserProcess) -> Self {
        let browser = Self::new(endpoint);
        Self {
            process: Mutex::new(Some(process)),
            ..browser
        }
    }

    /// The endpoint this handle talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// HTTP form of the endpoint, without a trailing slash
    fn http_endpoint(&self) -> String {
        self.endpoint
            .replace("ws://", "http://")
            .replace("wss://", "https://")
            .trim_end_matches('/')
            .to_string()
    }

    /// GET a discovery endpoint as JSON
    async fn get_json(&self, path: &str) -> Result<serde_json::Value, Error> {
        let url = format!("{}{}", self.http_endpoint(), path);
        debug!("Fetching {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Failed to reach browser at {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::http(format!("{} returned {}", url, response.status())));
        }

        Ok(response.json().await?)
    }

    /// Kill the owned process, if any
    async fn kill_process(&self) -> Result<(), Error> {
        let Some(mut process) = self.process.lock().await.take() else {
            return Ok(());
        };

        info!("Terminating launched browser process");
        if let Err(e) = process.child.kill().await {
            warn!("Failed to kill browser process: {}", e);
            return Err(Error::Io(e));
        }
        drop(process.profile_dir.take());
        Ok(())
    }
}

fn str_field(value: &serde_json::Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string()
}

#[async_trait]
impl CdpBrowser for CdpBrowserImpl {
    /// Create a new CDP client for a browser context
    async fn create_client(&self, target_url: &str) -> Result<Arc<dyn CdpClient>, Error> {
        info!("Creating CDP client for target: {}", target_url);

        let connection = CdpWebSocketConnection::new(target_url).await?;

        let target_id = target_url
            .rsplit('/')
            .next()
            .unwrap_or("unknown")
            .to_string();

        self.connections
            .lock()
            .await
            .insert(target_id, Arc::clone(&connection) as Arc<dyn CdpConnection>);

        let client = Arc::new(CdpClientImpl::new(connection));

        // Page and Runtime are always needed; other domains are enabled by callers
        client.enable_domain("Page").await?;
        client.enable_domain("Runtime").await?;

        Ok(client)
    }

    /// Close the browser
    async fn close(&self) -> Result<(), Error> {
        info!("Closing browser at endpoint {}", self.endpoint);

        let connections: Vec<_> = self.connections.lock().await.drain().collect();
        let mut failed = 0;

        for (target_id, connection) in connections {
            if let Err(e) = connection.close().await {
                warn!("Failed to close connection to {}: {}", target_id, e);
                failed += 1;
            }
        }

        if failed > 0 {
            warn!("{} connection(s) failed to close cleanly", failed);
        }

        self.kill_process().await
    }

    /// Get browser version
    async fn get_version(&self) -> Result<BrowserVersion, Error> {
        let version_json = self.get_json("/json/version").await?;

        Ok(BrowserVersion {
            protocol_version: str_field(&version_json, "Protocol-Version"),
            product: str_field(&version_json, "Browser"),
            user_agent: str_field(&version_json, "User-Agent"),
            js_version: str_field(&version_json, "V8-Version"),
        })
    }

    /// List all targets (pages, workers, etc.)
    async fn get_targets(&self) -> Result<Vec<TargetInfo>, Error> {
        let targets_json = self.get_json("/json/list").await?;

        let targets = targets_json
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|target| {
                        Some(TargetInfo {
                            target_id: target.get("id")?.as_str()?.to_string(),
                            target_type: target.get("type")?.as_str()?.to_string(),
                            title: target
                                .get("title")
                                .and_then(|v| v.as_str())
                                .unwrap_or("")
                                .to_string(),
                            url: target.get("url")?.as_str()?.to_string(),
                            attached: target
                                .get("attached")
                                .and_then(|v| v.as_bool())
                                .unwrap_or(false),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(targets)
    }

    /// Create a new page via the `/json/new` HTTP endpoint
    async fn create_target(&self, url: &str) -> Result<String, Error> {
        let new_url = format!("{}/json/new?{}", self.http_endpoint(), url);
        debug!("Creating new page via HTTP API: {}", new_url);

        let response = self.http.put(&new_url).send().await.map_err(|e| {
            Error::http(format!(
                "Failed to reach CDP endpoint at {}: {} (is Chrome running with --remote-debugging-port?)",
                self.endpoint, e
            ))
        })?;

        let response_text = response.text().await?;

        let target_json: serde_json::Value = serde_json::from_str(&response_text).map_err(|e| {
            Error::cdp(format!(
                "Failed to parse new target response: {} (response was: {})",
                e, response_text
            ))
        })?;

        let ws_url = target_json
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::cdp("No webSocketDebuggerUrl in new target response"))?;

        debug!("Created new target with WebSocket URL: {}", ws_url);
        Ok(ws_url.to_string())
    }
}
