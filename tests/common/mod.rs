//! Common test utilities
//!
//! Page fixtures plus a launcher that wires sessions to the mock Chrome
//! server over a real WebSocket.

#![allow(dead_code)]

use async_trait::async_trait;
use chaser_lens::cdp::{
    BrowserLauncher, BrowserOptions, BrowserVersion, CdpBrowser, CdpClient, CdpClientImpl,
    CdpWebSocketConnection, TargetInfo,
};
use chaser_lens::config::Config;
use chaser_lens::Error;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Bounding rect
pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Value {
    json!({ "x": x, "y": y, "width": width, "height": height })
}

/// Snapshot payload for a 1280x720 viewport
pub fn page(nodes: Value) -> Value {
    scrolled_page(0.0, nodes)
}

/// Snapshot payload with the document scrolled down by `scroll_y`
pub fn scrolled_page(scroll_y: f64, nodes: Value) -> Value {
    json!({
        "viewport": { "width": 1280, "height": 720, "scrollX": 0, "scrollY": scroll_y },
        "nodes": nodes
    })
}

/// body > div > button "Submit"
pub fn submit_page() -> Value {
    page(json!([
        { "tag": "body", "rect": rect(0.0, 0.0, 1280.0, 720.0) },
        { "tag": "div", "rect": rect(0.0, 0.0, 1280.0, 100.0) },
        { "tag": "button", "rect": rect(100.0, 40.0, 80.0, 30.0), "ownText": "Submit", "deepText": "Submit" }
    ]))
}

/// Heading, two inputs and a sign-in button
pub fn login_page() -> Value {
    page(json!([
        { "tag": "h1", "rect": rect(40.0, 20.0, 400.0, 40.0), "ownText": "Welcome back" },
        {
            "tag": "input", "rect": rect(40.0, 100.0, 300.0, 30.0),
            "type": "email", "placeholder": "Email", "value": "", "name": "email"
        },
        {
            "tag": "input", "rect": rect(40.0, 150.0, 300.0, 30.0),
            "type": "password", "placeholder": "Password", "value": "hunter2", "name": "password"
        },
        { "tag": "button", "rect": rect(40.0, 200.0, 120.0, 36.0), "ownText": "Sign in", "deepText": "Sign in" }
    ]))
}

/// Config for tests: no stealth, short timeouts
pub fn test_config() -> Config {
    Config {
        stealth_enabled: false,
        start_timeout_ms: 5000,
        default_timeout_ms: 2000,
        ..Config::default()
    }
}

/// Browser whose targets all live on one mock server
#[derive(Debug)]
pub struct WireBrowser {
    endpoint: String,
    closed: AtomicBool,
    targets: AtomicUsize,
}

impl WireBrowser {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            closed: AtomicBool::new(false),
            targets: AtomicUsize::new(0),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CdpBrowser for WireBrowser {
    async fn create_client(&self, target_url: &str) -> Result<Arc<dyn CdpClient>, Error> {
        let connection = CdpWebSocketConnection::new(target_url).await?;
        let client = CdpClientImpl::new(connection);
        client.enable_domain("Page").await?;
        client.enable_domain("Runtime").await?;
        Ok(Arc::new(client))
    }

    async fn close(&self) -> Result<(), Error> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn get_version(&self) -> Result<BrowserVersion, Error> {
        Ok(BrowserVersion {
            protocol_version: "1.3".to_string(),
            product: "MockChrome/120.0.0.0".to_string(),
            user_agent: "Mozilla/5.0 (Test)".to_string(),
            js_version: "12.0".to_string(),
        })
    }

    async fn get_targets(&self) -> Result<Vec<TargetInfo>, Error> {
        Ok(Vec::new())
    }

    async fn create_target(&self, _url: &str) -> Result<String, Error> {
        let n = self.targets.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}/devtools/page/target-{}", self.endpoint, n))
    }
}

/// Launcher handing out [`WireBrowser`]s
#[derive(Debug)]
pub struct WireLauncher {
    endpoint: String,
    last: std::sync::Mutex<Option<Arc<WireBrowser>>>,
}

impl WireLauncher {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            last: std::sync::Mutex::new(None),
        }
    }

    pub fn last_browser(&self) -> Option<Arc<WireBrowser>> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserLauncher for WireLauncher {
    async fn launch(&self, _options: &BrowserOptions) -> Result<Arc<dyn CdpBrowser>, Error> {
        let browser = Arc::new(WireBrowser::new(self.endpoint.clone()));
        *self.last.lock().unwrap() = Some(Arc::clone(&browser));
        Ok(browser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_are_well_formed() {
        for fixture in [submit_page(), login_page(), scrolled_page(300.0, json!([]))] {
            assert!(fixture["viewport"]["width"].is_number());
            assert!(fixture["nodes"].is_array());
        }
    }

    #[tokio::test]
    async fn test_wire_browser_targets() {
        let browser = WireBrowser::new("ws://127.0.0.1:9".to_string());
        let first = browser.create_target("about:blank").await.unwrap();
        let second = browser.create_target("about:blank").await.unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("ws://127.0.0.1:9/devtools/page/"));

        browser.close().await.unwrap();
        assert!(browser.is_closed());
    }
}
