//! Stealth traits
//!
//! The seam between the session manager and whatever installs the
//! anti-fingerprinting overrides into a fresh page target.

use async_trait::async_trait;

use super::profile::StealthProfile;
use crate::cdp::CdpClient;

/// Applies a [`StealthProfile`] to one page target
#[async_trait]
pub trait ScriptInjector: Send + Sync + std::fmt::Debug {
    /// Install a script into every future document, and run it once now
    async fn inject_init_script(&self, client: &dyn CdpClient, script: &str) -> Result<(), crate::Error>;

    /// Override the User-Agent, `Accept-Language` and platform at protocol level
    async fn set_user_agent(&self, client: &dyn CdpClient, profile: &StealthProfile) -> Result<(), crate::Error>;

    /// Apply every override in the profile. Runs once per new context.
    async fn apply(&self, client: &dyn CdpClient, profile: &StealthProfile) -> Result<AppliedFeatures, crate::Error>;
}

/// Applied features
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppliedFeatures {
    pub features: Vec<String>,
}

impl AppliedFeatures {
    pub fn push(&mut self, feature: &str) {
        self.features.push(feature.to_string());
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}
