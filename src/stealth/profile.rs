//! Fixed anti-fingerprinting profile
//!
//! One documented configuration applied to every new browser context: the
//! desktop Chrome on Windows fingerprint the engine presents to pages.

use crate::config::{Config, DEFAULT_USER_AGENT};
use serde::Serialize;
use serde_json::json;

/// Plugin names reported through `navigator.plugins`
pub const PLUGINS: &[(&str, &str)] = &[
    ("PDF Viewer", "internal-pdf-viewer"),
    ("Chrome PDF Viewer", "internal-pdf-viewer"),
    ("Chromium PDF Viewer", "internal-pdf-viewer"),
    ("Microsoft Edge PDF Viewer", "internal-pdf-viewer"),
    ("WebKit built-in PDF", "internal-pdf-viewer"),
];

/// MIME types reported through `navigator.mimeTypes`
pub const MIME_TYPES: &[(&str, &str)] = &[
    ("application/pdf", "pdf"),
    ("text/pdf", "pdf"),
    ("application/x-google-chrome-pdf", "pdf"),
    ("application/x-nacl", ""),
];

/// Screen geometry reported to scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScreenProfile {
    pub width: u32,
    pub height: u32,
    pub avail_width: u32,
    pub avail_height: u32,
}

impl ScreenProfile {
    /// Full-width screen with a 40px taskbar
    pub fn desktop(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            avail_width: width,
            avail_height: height.saturating_sub(40),
        }
    }
}

/// `navigator.connection` values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionProfile {
    pub effective_type: String,
    pub rtt: u32,
    pub downlink: f64,
}

impl Default for ConnectionProfile {
    fn default() -> Self {
        Self {
            effective_type: "4g".to_string(),
            rtt: 50,
            downlink: 10.0,
        }
    }
}

/// Everything the engine spoofs
#[derive(Debug, Clone, PartialEq)]
pub struct StealthProfile {
    pub user_agent: String,
    pub platform: String,
    pub languages: Vec<String>,
    pub locale: String,
    pub timezone: String,
    pub hardware_concurrency: u32,
    pub device_memory: u32,
    pub screen: ScreenProfile,
    pub connection: ConnectionProfile,
    /// Report `navigator.webdriver` as undefined
    pub hide_webdriver: bool,
}

impl Default for StealthProfile {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            platform: "Win32".to_string(),
            languages: vec!["en-US".to_string(), "en".to_string()],
            locale: "en-US".to_string(),
            timezone: "America/New_York".to_string(),
            hardware_concurrency: 8,
            device_memory: 8,
            screen: ScreenProfile::desktop(1920, 1080),
            connection: ConnectionProfile::default(),
            hide_webdriver: true,
        }
    }
}

/// `en-US` -> `["en-US", "en"]`
fn languages_for(locale: &str) -> Vec<String> {
    let mut languages = vec![locale.to_string()];
    if let Some((primary, _)) = locale.split_once('-') {
        if !primary.is_empty() {
            languages.push(primary.to_string());
        }
    }
    languages
}

impl StealthProfile {
    /// Default profile with the configured UA, locale, timezone and viewport
    pub fn from_config(config: &Config) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            languages: languages_for(&config.locale),
            locale: config.locale.clone(),
            timezone: config.timezone.clone(),
            screen: ScreenProfile::desktop(config.viewport_width, config.viewport_height),
            ..Default::default()
        }
    }

    /// `Accept-Language` header value, e.g. `en-US,en;q=0.9`
    pub fn accept_language(&self) -> String {
        self.languages
            .iter()
            .enumerate()
            .map(|(i, lang)| {
                if i == 0 {
                    lang.clone()
                } else {
                    let q = (10 - i.min(9)) as f64 / 10.0;
                    format!("{};q={:.1}", lang, q)
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Chrome switches that hide automation before any script runs
    pub fn launch_args(&self) -> Vec<String> {
        vec![
            "--disable-blink-features=AutomationControlled".to_string(),
            format!("--lang={}", self.languages.join(",")),
            format!("--accept-lang={}", self.accept_language()),
            "--disable-dev-shm-usage".to_string(),
            "--disable-background-timer-throttling".to_string(),
            "--disable-backgrounding-occluded-windows".to_string(),
            "--disable-renderer-backgrounding".to_string(),
            "--force-color-profile=srgb".to_string(),
            "--metrics-recording-only".to_string(),
        ]
    }

    /// Property overrides installed into every document before page scripts run
    pub fn init_script(&self) -> String {
        let plugins: Vec<_> = PLUGINS
            .iter()
            .map(|(name, filename)| json!({ "name": name, "filename": filename, "description": "Portable Document Format" }))
            .collect();
        let mime_types: Vec<_> = MIME_TYPES
            .iter()
            .map(|(kind, suffixes)| json!({ "type": kind, "suffixes": suffixes, "description": "Portable Document Format" }))
            .collect();
        let connection = json!({
            "effectiveType": self.connection.effective_type,
            "rtt": self.connection.rtt,
            "downlink": self.connection.downlink,
            "onchange": null,
        });

        let webdriver = if self.hide_webdriver {
            "Object.defineProperty(Navigator.prototype, 'webdriver', { get: () => undefined });"
        } else {
            ""
        };

        format!(
            r#"(function() {{
  const define = (target, prop, value) => {{
    try {{ Object.defineProperty(target, prop, {{ get: () => value, configurable: true }}); }} catch (e) {{}}
  }};
  {webdriver}
  define(navigator, 'platform', {platform});
  define(navigator, 'language', {language});
  define(navigator, 'languages', Object.freeze({languages}));
  define(navigator, 'hardwareConcurrency', {cores});
  define(navigator, 'deviceMemory', {memory});
  define(navigator, 'plugins', {plugins});
  define(navigator, 'mimeTypes', {mime_types});
  define(navigator, 'connection', {connection});
  define(screen, 'width', {width});
  define(screen, 'height', {height});
  define(screen, 'availWidth', {avail_width});
  define(screen, 'availHeight', {avail_height});
  if (!window.chrome) {{ window.chrome = {{ runtime: {{}} }}; }}
}})();"#,
            webdriver = webdriver,
            platform = json!(self.platform),
            language = json!(self.languages.first().unwrap_or(&self.locale)),
            languages = json!(self.languages),
            cores = self.hardware_concurrency,
            memory = self.device_memory,
            plugins = json!(plugins),
            mime_types = json!(mime_types),
            connection = connection,
            width = self.screen.width,
            height = self.screen.height,
            avail_width = self.screen.avail_width,
            avail_height = self.screen.avail_height,
        )
    }
}
