//! Session manager implementation
//!
//! Owns the single browser session and the element address table shared by
//! extraction and interactions.

use async_trait::async_trait;
use serde_json::json;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::context::SessionContext;
use super::element::{click_element, type_into};
use super::page::{element_texts, history_back, poll_condition, read_page_info, validate_url};
use super::traits::*;
use crate::address::{ElementAddress, ElementAddressTable};
use crate::cdp::{BrowserLauncher, CdpBrowser, CdpClient, MockBrowserLauncher};
use crate::config::Config;
use crate::extract::{Extraction, PageExtractor};
use crate::stealth::{CdpScriptInjector, ScriptInjector, StealthProfile};
use crate::{Error, Result};

/// Session manager implementation
pub struct SessionManagerImpl {
    config: Config,
    launcher: Arc<dyn BrowserLauncher>,
    injector: Arc<dyn ScriptInjector>,
    profile: StealthProfile,
    table: Arc<ElementAddressTable>,
    extractor: PageExtractor,
    /// Serialises start and stop
    lifecycle: Mutex<()>,
    session: RwLock<Option<Arc<SessionContext>>>,
}

impl SessionManagerImpl {
    /// Create a new session manager
    pub fn new(config: Config, launcher: Arc<dyn BrowserLauncher>) -> Self {
        let table = Arc::new(ElementAddressTable::new());
        Self {
            profile: StealthProfile::from_config(&config),
            config,
            launcher,
            injector: Arc::new(CdpScriptInjector::new()),
            extractor: PageExtractor::new(Arc::clone(&table)),
            table,
            lifecycle: Mutex::new(()),
            session: RwLock::new(None),
        }
    }

    /// Create a session manager over a mock launcher for testing
    pub fn mock() -> Self {
        Self::new(Config::default(), Arc::new(MockBrowserLauncher::new()))
    }

    /// Replace the stealth injector
    pub fn with_injector(mut self, injector: Arc<dyn ScriptInjector>) -> Self {
        self.injector = injector;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The table extraction publishes into
    pub fn table(&self) -> &Arc<ElementAddressTable> {
        &self.table
    }

    fn read_session(&self) -> RwLockReadGuard<'_, Option<Arc<SessionContext>>> {
        self.session.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, Option<Arc<SessionContext>>> {
        self.session.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn active_context(&self) -> Result<Arc<SessionContext>> {
        self.read_session().clone().ok_or(Error::SessionNotActive)
    }

    fn resolve(&self, index: usize) -> Result<ElementAddress> {
        self.table.get_element(index).ok_or_else(|| {
            debug!("Element {} not in the current address table", index);
            Error::stale_element(index)
        })
    }

    /// Everything between a launched browser and a publishable session
    async fn prepare(&self, browser: &Arc<dyn CdpBrowser>) -> Result<Arc<dyn CdpClient>> {
        let target = browser.create_target("about:blank").await?;
        let client = browser.create_client(&target).await?;

        client
            .call_method(
                "Emulation.setDeviceMetricsOverride",
                json!({
                    "width": self.config.viewport_width,
                    "height": self.config.viewport_height,
                    "deviceScaleFactor": 1,
                    "mobile": false,
                }),
            )
            .await?;

        if self.config.stealth_enabled {
            let applied = self.injector.apply(client.as_ref(), &self.profile).await?;
            debug!("Stealth applied: {:?}", applied.features);
        }

        // Responsiveness check
        client.navigate("about:blank").await?;
        let title = client.evaluate("document.title", false).await?;
        debug!("Verification navigation done, title {:?}", title.as_str());

        Ok(client)
    }

    async fn discard(&self, browser: &Arc<dyn CdpBrowser>) {
        if let Err(e) = browser.close().await {
            warn!("Failed to close browser after aborted start: {}", e);
        }
    }
}

/// Everything except deadlines surfaces as a start failure
fn start_error(error: Error) -> Error {
    match error {
        Error::Timeout(_) | Error::SessionStart(_) => error,
        other => Error::session_start(other.to_string()),
    }
}

#[async_trait]
impl SessionManager for SessionManagerImpl {
    async fn ensure_active(&self) -> Result<()> {
        self.ensure_active_within(self.config.start_timeout()).await
    }

    async fn ensure_active_within(&self, timeout: Duration) -> Result<()> {
        if self.is_active() {
            return Ok(());
        }
        self.start_within(timeout).await
    }

    async fn start(&self) -> Result<()> {
        self.start_within(self.config.start_timeout()).await
    }

    #[instrument(skip(self))]
    async fn start_within(&self, budget: Duration) -> Result<()> {
        let _lifecycle = self.lifecycle.lock().await;
        if self.is_active() {
            return Ok(());
        }

        let deadline = Instant::now() + budget;
        info!("Starting browser session (budget {:?})", budget);

        let mut options = self.config.browser_options();
        if self.config.stealth_enabled {
            options.args.extend(self.profile.launch_args());
        }

        // A launch abandoned at the deadline drops its child process with it
        let browser = match timeout_at(deadline, self.launcher.launch(&options)).await {
            Ok(Ok(browser)) => browser,
            Ok(Err(e)) => return Err(start_error(e)),
            Err(_) => return Err(Error::timeout(format!("Browser launch exceeded {:?}", budget))),
        };

        let client = match timeout_at(deadline, self.prepare(&browser)).await {
            Ok(Ok(client)) => client,
            Ok(Err(e)) => {
                self.discard(&browser).await;
                return Err(start_error(e));
            }
            Err(_) => {
                self.discard(&browser).await;
                return Err(Error::timeout(format!("Session start exceeded {:?}", budget)));
            }
        };

        let ctx = Arc::new(SessionContext::new(client, browser));
        info!("Browser session {} started", ctx.id());
        *self.write_session() = Some(ctx);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock().await;
        let taken = self.write_session().take();
        let ctx = match taken {
            Some(ctx) => ctx,
            None => return Ok(()),
        };

        ctx.cancel();
        self.table.clear();

        if let Err(e) = ctx.browser().close().await {
            warn!("Failed to close browser for session {}: {}", ctx.id(), e);
        }
        info!("Browser session {} stopped", ctx.id());
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.read_session().is_some()
    }

    fn context(&self) -> Option<Arc<SessionContext>> {
        self.read_session().clone()
    }

    async fn extract(&self, max_length: usize, timeout: Duration) -> Result<Extraction> {
        let ctx = self.active_context()?;
        self.extractor.extract(&ctx, max_length, timeout).await
    }

    fn get_element(&self, index: usize) -> Option<ElementAddress> {
        self.table.get_element(index)
    }

    #[instrument(skip(self))]
    async fn click(&self, index: usize, timeout: Duration) -> Result<ElementAddress> {
        let ctx = self.active_context()?;
        let address = self.resolve(index)?;
        let client = ctx.client();

        ctx.run_bounded("click", timeout, click_element(client.as_ref(), &address))
            .await?;
        info!("Clicked element {}", index);
        Ok(address)
    }

    #[instrument(skip(self, text), fields(len = text.len()))]
    async fn type_text(
        &self,
        index: usize,
        text: &str,
        options: TypeOptions,
        timeout: Duration,
    ) -> Result<ElementAddress> {
        let ctx = self.active_context()?;
        let address = self.resolve(index)?;
        let client = ctx.client();

        ctx.run_bounded(
            "type",
            timeout,
            type_into(client.as_ref(), &address, text, options, self.config.typing_delay_ms),
        )
        .await?;
        info!("Typed into element {}", index);
        Ok(address)
    }

    #[instrument(skip(self))]
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<PageInfo> {
        let url = validate_url(url)?;
        self.ensure_active().await?;
        let ctx = self.active_context()?;
        let client = ctx.client();

        let info = ctx
            .run_bounded("navigate", timeout, async {
                let result = client.navigate(url.as_str()).await?;
                if !result.loaded {
                    debug!("{} still loading after navigation", result.url);
                }
                read_page_info(client.as_ref()).await
            })
            .await?;
        info!("Navigated to {} ({:?})", info.url, info.title);
        Ok(info)
    }

    async fn page_info(&self, timeout: Duration) -> Result<PageInfo> {
        let ctx = self.active_context()?;
        let client = ctx.client();
        ctx.run_bounded("page_info", timeout, read_page_info(client.as_ref()))
            .await
    }

    #[instrument(skip(self))]
    async fn extract_text(&self, selector: &str, multiple: bool, timeout: Duration) -> Result<Vec<String>> {
        let ctx = self.active_context()?;
        let client = ctx.client();

        let texts = ctx
            .run_bounded("extract_text", timeout, element_texts(client.as_ref(), selector, multiple))
            .await?;
        debug!("{} text(s) for {:?}", texts.len(), selector);
        Ok(texts)
    }

    #[instrument(skip(self))]
    async fn go_back(&self, timeout: Duration) -> Result<PageInfo> {
        let ctx = self.active_context()?;
        let client = ctx.client();

        let info = ctx
            .run_bounded("go_back", timeout, async {
                history_back(client.as_ref()).await?;
                read_page_info(client.as_ref()).await
            })
            .await?;
        info!("Went back to {}", info.url);
        Ok(info)
    }

    #[instrument(skip(self))]
    async fn wait_for(&self, condition: WaitCondition, timeout: Duration) -> Result<bool> {
        let ctx = self.active_context()?;
        let client = ctx.client();

        match ctx
            .run_bounded("wait_for", timeout, poll_condition(client.as_ref(), &condition))
            .await
        {
            Ok(()) => Ok(true),
            Err(e) if e.is_timeout() => {
                info!("{:?} not met within {:?}", condition, timeout);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn screenshot(&self, options: ScreenshotOptions, timeout: Duration) -> Result<Screenshot> {
        let ctx = self.active_context()?;
        let client = ctx.client();

        let bytes = ctx
            .run_bounded(
                "screenshot",
                timeout,
                client.screenshot(options.format, options.full_page),
            )
            .await?;
        debug!("Captured {} byte {} screenshot", bytes.len(), options.format.extension());
        Ok(Screenshot {
            bytes,
            format: options.format,
            captured_at: chrono::Utc::now(),
        })
    }

    async fn save_screenshot(&self, options: ScreenshotOptions, timeout: Duration) -> Result<PathBuf> {
        let shot = self.screenshot(options, timeout).await?;

        let dir = self.config.screenshot_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("{}.{}", Uuid::new_v4(), shot.format.extension()));
        tokio::fs::write(&path, &shot.bytes).await?;

        info!("Screenshot saved to {}", path.display());
        Ok(path)
    }
}
