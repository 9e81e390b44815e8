//! Live session handle
//!
//! Everything one started browser session owns, plus the helper that bounds
//! every blocking call made through it.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cdp::{CdpBrowser, CdpClient};
use crate::{Error, Result};

/// One fully started session. Only ever published once start-up succeeded.
#[derive(Debug)]
pub struct SessionContext {
    id: Uuid,
    client: Arc<dyn CdpClient>,
    browser: Arc<dyn CdpBrowser>,
    cancel: CancellationToken,
    started_at: DateTime<Utc>,
}

impl SessionContext {
    /// Create a new session context
    pub fn new(client: Arc<dyn CdpClient>, browser: Arc<dyn CdpBrowser>) -> Self {
        Self {
            id: Uuid::new_v4(),
            client,
            browser,
            cancel: CancellationToken::new(),
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Client for the session's page target
    pub fn client(&self) -> Arc<dyn CdpClient> {
        Arc::clone(&self.client)
    }

    pub fn browser(&self) -> Arc<dyn CdpBrowser> {
        Arc::clone(&self.browser)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Token cancelled when the session stops
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Run `fut` under a child cancellation scope and a deadline.
    ///
    /// Yields `Error::Cancelled` if the session stops first and
    /// `Error::Timeout` once `timeout` elapses. Either way `fut` is dropped,
    /// which abandons the browser call; the session itself stays up.
    pub async fn run_bounded<T, F>(&self, label: &str, timeout: Duration, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let scope = self.cancel.child_token();
        tokio::select! {
            biased;
            _ = scope.cancelled() => {
                Err(Error::cancelled(format!("{} aborted: session {} stopped", label, self.id)))
            }
            outcome = tokio::time::timeout(timeout, fut) => match outcome {
                Ok(result) => result,
                Err(_) => Err(Error::timeout(format!("{} exceeded {:?}", label, timeout))),
            },
        }
    }
}
