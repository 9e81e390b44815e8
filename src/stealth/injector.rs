//! Script injector implementation
//!
//! Installs the profile through CDP: protocol-level overrides first, then the
//! property overrides as a new-document script.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use super::profile::StealthProfile;
use super::traits::*;
use crate::cdp::CdpClient;
use crate::Error;

/// Script injector over a page's [`CdpClient`]
#[derive(Debug, Default, Clone, Copy)]
pub struct CdpScriptInjector;

impl CdpScriptInjector {
    /// Create a new script injector
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ScriptInjector for CdpScriptInjector {
    async fn inject_init_script(&self, client: &dyn CdpClient, script: &str) -> Result<(), Error> {
        debug!("Injecting init script: {} bytes", script.len());

        let result = client
            .call_method(
                "Page.addScriptToEvaluateOnNewDocument",
                json!({ "source": script }),
            )
            .await
            .map_err(|e| Error::internal(format!("Page.addScriptToEvaluateOnNewDocument failed: {}", e)))?;
        if let Some(identifier) = result.get("identifier") {
            debug!("Init script added with identifier: {}", identifier);
        }

        // The current document predates the registration
        if let Err(e) = client.evaluate(script, false).await {
            warn!("Immediate init script evaluation failed (non-critical): {}", e);
        }

        Ok(())
    }

    async fn set_user_agent(&self, client: &dyn CdpClient, profile: &StealthProfile) -> Result<(), Error> {
        client.enable_domain("Network").await?;
        client
            .call_method(
                "Network.setUserAgentOverride",
                json!({
                    "userAgent": profile.user_agent,
                    "acceptLanguage": profile.accept_language(),
                    "platform": profile.platform,
                }),
            )
            .await?;
        Ok(())
    }

    async fn apply(&self, client: &dyn CdpClient, profile: &StealthProfile) -> Result<AppliedFeatures, Error> {
        let mut applied = AppliedFeatures::default();

        // User-Agent first, so the verification navigation already carries it
        self.set_user_agent(client, profile).await?;
        applied.push("user_agent");

        client
            .call_method("Emulation.setLocaleOverride", json!({ "locale": profile.locale }))
            .await?;
        applied.push("locale");

        client
            .call_method(
                "Emulation.setTimezoneOverride",
                json!({ "timezoneId": profile.timezone }),
            )
            .await?;
        applied.push("timezone");

        self.inject_init_script(client, &profile.init_script()).await?;
        applied.push("navigator");
        applied.push("screen");
        if profile.hide_webdriver {
            applied.push("webdriver");
        }

        debug!("Stealth features applied: {:?}", applied.features);
        Ok(applied)
    }
}
