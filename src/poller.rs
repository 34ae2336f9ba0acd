//! Polling one account for its freshest code.
//!
//! The poller is the failure boundary: every error from the mailbox is logged
//! and folded into the returned [`AccountResult`], so one broken account can
//! never affect another.

use crate::config::Config;
use crate::error::{Error, FailureKind, Result};
use crate::extractor::CodeExtractor;
use crate::mailbox::{fetch_recent, MailboxConnector, MailboxSession};
use crate::model::{Account, AccountResult, ExtractedCode};
use futures::StreamExt;
use std::sync::Arc;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, instrument, warn};

/// Drives a single account through the mailbox and the code extractor.
#[derive(Debug)]
pub struct AccountPoller<C> {
    config: Arc<Config>,
    connector: C,
    extractor: CodeExtractor,
}

impl<C: MailboxConnector> AccountPoller<C> {
    /// Creates a poller using the sender filter, window, code length and timeouts in `config`.
    #[must_use]
    pub fn new(config: Arc<Config>, connector: C) -> Self {
        let extractor = CodeExtractor::n_digit(config.code_digits);
        Self {
            config,
            connector,
            extractor,
        }
    }

    /// Polls `account` and returns the code from the newest message in the scan
    /// window that contains one. Never fails; problems are reported as an absent
    /// result carrying the [`FailureKind`].
    #[instrument(
        name = "AccountPoller::poll",
        skip_all,
        fields(email = %account.address(), sender = %self.config.sender_filter)
    )]
    pub async fn poll(&self, account: &Account) -> AccountResult {
        match self.try_poll(account).await {
            Ok(code) => {
                info!(code = %code.code, timestamp = %code.timestamp, "Code found");
                AccountResult::found(account.address(), code)
            }
            Err(err) => {
                let kind = err.kind();
                match kind {
                    FailureKind::NoMatch => debug!("No code in recent messages"),
                    _ => warn!(error = %err, kind = %kind, "Account poll failed"),
                }
                AccountResult::absent(account.address(), kind)
            }
        }
    }

    async fn try_poll(&self, account: &Account) -> Result<ExtractedCode> {
        let budget = self.config.timeouts.account;
        let poll_timeout = || Error::PollTimeout {
            email: account.address().to_string(),
            timeout: budget,
        };

        // One deadline covers connect and scan together; logout is bounded separately.
        let deadline = Instant::now() + budget;

        let mut session = timeout_at(deadline, self.connector.connect_and_select(account))
            .await
            .map_err(|_| poll_timeout())??;

        let outcome = timeout_at(deadline, self.scan(&mut session))
            .await
            .unwrap_or_else(|_| Err(poll_timeout()));

        // Logout on every path once a session exists; its failure does not change the result.
        let logout_limit = self.config.timeouts.logout;
        match timeout(logout_limit, session.logout()).await {
            Ok(Ok(())) => debug!("Logged out"),
            Ok(Err(e)) => debug!(error = %e, "Logout failed"),
            Err(_) => debug!(
                timeout_secs = logout_limit.as_secs(),
                "Logout timed out"
            ),
        }

        outcome
    }

    async fn scan(&self, session: &mut C::Session) -> Result<ExtractedCode> {
        let ids = session.search_sender(&self.config.sender_filter).await?;

        debug!(matched = ids.len(), "Sender search complete");

        if ids.is_empty() {
            return Err(Error::NoMatch);
        }

        let mut recent = fetch_recent(session, &ids, self.config.scan_window);
        while let Some(message) = recent.next().await {
            let message = message?;
            if let Some(code) = self.extractor.extract(&message.body) {
                return Ok(ExtractedCode {
                    code: code.to_string(),
                    timestamp: message.timestamp,
                });
            }
            debug!(uid = message.uid, "Message has no code");
        }

        Err(Error::NoMatch)
    }
}
