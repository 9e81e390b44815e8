//! Configuration management for Chaser-Lens

use crate::cdp::BrowserOptions;
use crate::{Error, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Chrome 120 on Windows 10, the most common desktop fingerprint
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const ENV_PREFIX: &str = "CHASER_LENS_";

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chrome executable path
    pub chrome_path: Option<String>,

    /// Chrome data directory
    pub chrome_data_dir: Option<String>,

    /// Existing CDP endpoint; when set no browser process is launched
    pub cdp_endpoint: Option<String>,

    /// Remote debugging port for a launched browser (0 picks a free one)
    pub debug_port: u16,

    /// Run without a visible window
    pub headless: bool,

    /// Viewport width in CSS pixels
    pub viewport_width: u32,

    /// Viewport height in CSS pixels
    pub viewport_height: u32,

    /// User agent presented to pages
    pub user_agent: String,

    /// Locale presented to pages
    pub locale: String,

    /// IANA timezone presented to pages
    pub timezone: String,

    /// Apply anti-automation overrides to new contexts
    pub stealth_enabled: bool,

    /// Budget for launching and verifying a session, in milliseconds
    pub start_timeout_ms: u64,

    /// Default timeout for page operations, in milliseconds
    pub default_timeout_ms: u64,

    /// Default byte budget for extraction output
    pub max_content_length: usize,

    /// Where screenshots are written
    pub screenshot_dir: Option<String>,

    /// Per-keystroke delay range in milliseconds; `None` inserts text in one step
    pub typing_delay_ms: Option<(u64, u64)>,

    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chrome_path: None,
            chrome_data_dir: None,
            cdp_endpoint: None,
            debug_port: 0,
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            locale: "en-US".to_string(),
            timezone: "America/New_York".to_string(),
            stealth_enabled: true,
            start_timeout_ms: 30000,
            default_timeout_ms: 10000,
            max_content_length: 500000,
            screenshot_dir: None,
            typing_delay_ms: None,
            log_level: "info".to_string(),
        }
    }
}

fn var(name: &str) -> Option<String> {
    env::var(format!("{}{}", ENV_PREFIX, name)).ok()
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::configuration(format!("Invalid {}{}", ENV_PREFIX, name))),
        None => Ok(None),
    }
}

/// Parse a `min-max` millisecond range such as `50-150`
fn parse_delay_range(raw: &str) -> Result<(u64, u64)> {
    let invalid = || Error::configuration(format!("Invalid typing delay range: {}", raw));
    let (min, max) = raw.split_once('-').ok_or_else(invalid)?;
    let min: u64 = min.trim().parse().map_err(|_| invalid())?;
    let max: u64 = max.trim().parse().map_err(|_| invalid())?;
    if min > max {
        return Err(invalid());
    }
    Ok((min, max))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = var("CHROME_PATH") {
            config.chrome_path = Some(path);
        }

        if let Some(dir) = var("DATA_DIR") {
            config.chrome_data_dir = Some(dir);
        }

        if let Some(endpoint) = var("CDP_ENDPOINT") {
            config.cdp_endpoint = Some(endpoint);
        }

        if let Some(port) = parse_var("DEBUG_PORT")? {
            config.debug_port = port;
        }

        if let Some(headless) = parse_var("HEADLESS")? {
            config.headless = headless;
        }

        if let Some(width) = parse_var("VIEWPORT_WIDTH")? {
            config.viewport_width = width;
        }

        if let Some(height) = parse_var("VIEWPORT_HEIGHT")? {
            config.viewport_height = height;
        }

        if let Some(user_agent) = var("USER_AGENT") {
            config.user_agent = user_agent;
        }

        if let Some(locale) = var("LOCALE") {
            config.locale = locale;
        }

        if let Some(timezone) = var("TIMEZONE") {
            config.timezone = timezone;
        }

        if let Some(stealth) = parse_var("STEALTH")? {
            config.stealth_enabled = stealth;
        }

        if let Some(timeout) = parse_var("START_TIMEOUT")? {
            config.start_timeout_ms = timeout;
        }

        if let Some(timeout) = parse_var("DEFAULT_TIMEOUT")? {
            config.default_timeout_ms = timeout;
        }

        if let Some(max_len) = parse_var("MAX_CONTENT_LENGTH")? {
            config.max_content_length = max_len;
        }

        if let Some(dir) = var("SCREENSHOT_DIR") {
            config.screenshot_dir = Some(dir);
        }

        if let Some(range) = var("TYPING_DELAY") {
            config.typing_delay_ms = Some(parse_delay_range(&range)?);
        }

        if let Some(log_level) = var("LOG_LEVEL") {
            config.log_level = log_level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::configuration(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(Error::configuration("Viewport dimensions must be non-zero"));
        }
        if self.start_timeout_ms == 0 || self.default_timeout_ms == 0 {
            return Err(Error::configuration("Timeouts must be non-zero"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(Error::configuration("User agent must not be empty"));
        }
        if let Some((min, max)) = self.typing_delay_ms {
            if min > max {
                return Err(Error::configuration("Typing delay minimum exceeds maximum"));
            }
        }
        Ok(())
    }

    /// Budget for `start()`
    pub fn start_timeout(&self) -> Duration {
        Duration::from_millis(self.start_timeout_ms)
    }

    /// Budget for page operations when the caller does not pass one
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Directory screenshots are written to
    pub fn screenshot_dir(&self) -> PathBuf {
        match &self.screenshot_dir {
            Some(dir) => PathBuf::from(dir),
            None => env::temp_dir().join("chaser-lens").join("screenshots"),
        }
    }

    /// Launch options for the browser collaborator
    pub fn browser_options(&self) -> BrowserOptions {
        BrowserOptions {
            headless: self.headless,
            window_width: self.viewport_width,
            window_height: self.viewport_height,
            user_agent: Some(self.user_agent.clone()),
            executable_path: self.chrome_path.clone(),
            user_data_dir: self.chrome_data_dir.clone(),
            cdp_endpoint: self.cdp_endpoint.clone(),
            debug_port: self.debug_port,
            args: vec![],
        }
    }
}
