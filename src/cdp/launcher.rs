//! Chrome process launcher
//!
//! Attaches to a configured CDP endpoint, or starts a local Chrome with remote
//! debugging enabled and waits for its DevTools endpoint to answer.

use super::browser::{BrowserProcess, CdpBrowserImpl};
use super::traits::{BrowserLauncher, BrowserOptions, CdpBrowser};
use crate::Error;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// DevTools endpoint polls after spawn (50 x 200ms)
const ENDPOINT_POLL_ATTEMPTS: u32 = 50;
const ENDPOINT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Launches Chrome, or attaches when an endpoint is configured
#[derive(Debug, Default, Clone)]
pub struct ChromeLauncher;

impl ChromeLauncher {
    /// Create a launcher
    pub fn new() -> Self {
        Self
    }

    /// Locate a Chrome or Chromium executable
    pub fn find_chrome() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        let paths: &[&str] = &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        ];

        #[cfg(target_os = "windows")]
        let paths: &[&str] = &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ];

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        let paths: &[&str] = &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ];

        if let Some(found) = paths.iter().map(PathBuf::from).find(|p| p.exists()) {
            return Some(found);
        }

        // Fall back to the PATH
        let names = ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser", "chrome"];
        let search = std::env::var_os("PATH")?;
        std::env::split_paths(&search)
            .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
            .find(|candidate| candidate.is_file())
    }

    /// Command-line switches for a launched browser
    pub fn command_args(options: &BrowserOptions, port: u16, profile_dir: &str) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", port),
            format!("--user-data-dir={}", profile_dir),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-background-networking".to_string(),
            "--disable-sync".to_string(),
            "--disable-translate".to_string(),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            format!("--window-size={},{}", options.window_width, options.window_height),
        ];

        if options.headless {
            args.push("--headless=new".to_string());
        }

        if let Some(user_agent) = &options.user_agent {
            args.push(format!("--user-agent={}", user_agent));
        }

        args.extend(options.args.iter().cloned());
        args
    }

    /// Pick the configured port, or ask the OS for a free one
    fn resolve_port(requested: u16) -> Result<u16, Error> {
        if requested != 0 {
            return Ok(requested);
        }
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        Ok(listener.local_addr()?.port())
    }

    /// Attach to an existing endpoint after checking it answers
    async fn attach(endpoint: &str) -> Result<Arc<dyn CdpBrowser>, Error> {
        info!("Attaching to existing browser at {}", endpoint);
        let browser = CdpBrowserImpl::new(endpoint);
        let version = browser.get_version().await.map_err(|e| {
            Error::browser_launch(format!("CDP endpoint {} is not reachable: {}", endpoint, e))
        })?;
        info!("Attached to {}", version.product);
        Ok(Arc::new(browser))
    }

    /// Spawn a browser process and wait for its endpoint
    async fn spawn(options: &BrowserOptions) -> Result<Arc<dyn CdpBrowser>, Error> {
        let chrome_path = match &options.executable_path {
            Some(path) => PathBuf::from(path),
            None => Self::find_chrome()
                .ok_or_else(|| Error::browser_launch("No Chrome or Chromium executable found"))?,
        };

        let (profile_path, profile_dir) = match &options.user_data_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                (dir.clone(), None)
            }
            None => {
                let temp = tempfile::Builder::new().prefix("chaser-lens-").tempdir()?;
                (temp.path().display().to_string(), Some(temp))
            }
        };

        let port = Self::resolve_port(options.debug_port)?;
        let args = Self::command_args(options, port, &profile_path);

        info!("Launching {} on debug port {}", chrome_path.display(), port);
        debug!("Chrome arguments: {:?}", args);

        let mut child = Command::new(&chrome_path)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::browser_launch(format!("Failed to spawn {}: {}", chrome_path.display(), e))
            })?;

        let endpoint = format!("http://127.0.0.1:{}", port);
        let browser = CdpBrowserImpl::new(endpoint.as_str());

        for attempt in 0..ENDPOINT_POLL_ATTEMPTS {
            if let Some(status) = child.try_wait()? {
                return Err(Error::browser_launch(format!(
                    "Chrome exited before its endpoint came up: {}",
                    status
                )));
            }

            if let Ok(version) = browser.get_version().await {
                info!("Chrome ready after {} attempt(s): {}", attempt + 1, version.product);
                return Ok(Arc::new(CdpBrowserImpl::with_process(
                    endpoint,
                    BrowserProcess { child, profile_dir },
                )));
            }

            tokio::time::sleep(ENDPOINT_POLL_INTERVAL).await;
        }

        // kill_on_drop reaps the child when it goes out of scope
        Err(Error::browser_launch(format!(
            "DevTools endpoint at {} did not respond within {:?}",
            endpoint,
            ENDPOINT_POLL_INTERVAL * ENDPOINT_POLL_ATTEMPTS
        )))
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self, options: &BrowserOptions) -> Result<Arc<dyn CdpBrowser>, Error> {
        match &options.cdp_endpoint {
            Some(endpoint) => Self::attach(endpoint).await,
            None => Self::spawn(options).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_args_headless_with_extras() {
        let options = BrowserOptions {
            user_agent: Some("TestAgent/1.0".to_string()),
            args: vec!["--lang=en-US".to_string()],
            ..Default::default()
        };
        let args = ChromeLauncher::command_args(&options, 9333, "/tmp/profile");

        assert!(args.contains(&"--remote-debugging-port=9333".to_string()));
        assert!(args.contains(&"--user-data-dir=/tmp/profile".to_string()));
        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--window-size=1920,1080".to_string()));
        assert!(args.contains(&"--user-agent=TestAgent/1.0".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("--lang=en-US"));
    }

    #[test]
    fn test_command_args_headed() {
        let options = BrowserOptions {
            headless: false,
            ..Default::default()
        };
        let args = ChromeLauncher::command_args(&options, 9222, "/tmp/p");
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
    }

    #[test]
    fn test_resolve_port() {
        assert_eq!(ChromeLauncher::resolve_port(9222).unwrap(), 9222);
        assert_ne!(ChromeLauncher::resolve_port(0).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_executable_is_launch_error() {
        let options = BrowserOptions {
            executable_path: Some("/nonexistent/chrome-binary".to_string()),
            ..Default::default()
        };
        let result = ChromeLauncher::new().launch(&options).await;
        assert!(matches!(result, Err(Error::BrowserLaunch(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_launch_error() {
        let options = BrowserOptions {
            cdp_endpoint: Some("http://127.0.0.1:1".to_string()),
            ..Default::default()
        };
        let result = ChromeLauncher::new().launch(&options).await;
        assert!(matches!(result, Err(Error::BrowserLaunch(_))));
    }
}
