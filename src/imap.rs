//! IMAP implementation of the mailbox seam.
//!
//! [`ImapConnector`] opens a TLS session per account, logs in and selects the
//! configured mailbox. Every IMAP round trip is bounded by its own timeout from
//! [`TimeoutConfig`].
//!
//! # Example
//!
//! ```no_run
//! use otp_inbox::imap::ImapConnector;
//! use otp_inbox::mailbox::{fetch_recent, MailboxConnector, MailboxSession};
//! use otp_inbox::Config;
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! # async fn example() -> otp_inbox::Result<()> {
//! let config = Arc::new(
//!     Config::builder()
//!         .account("user@gmail.com", "app-password")
//!         .build()?,
//! );
//! let connector = ImapConnector::new(Arc::clone(&config));
//!
//! let mut session = connector.connect_and_select(&config.accounts()[0]).await?;
//! let ids = session.search_sender("ticketmaster.com").await?;
//! let mut recent = fetch_recent(&mut session, &ids, 10);
//! while let Some(message) = recent.next().await {
//!     println!("{}", message?.timestamp);
//! }
//! drop(recent);
//! session.logout().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::{Config, TimeoutConfig};
use crate::connection;
use crate::error::{Error, Result};
use crate::mailbox::{MailboxConnector, MailboxSession};
use crate::model::{Account, CandidateMessage};
use crate::parser;
use crate::session::{self, ImapSession};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, instrument};

/// Connects to IMAP servers on behalf of configured accounts.
#[derive(Debug, Clone)]
pub struct ImapConnector {
    config: Arc<Config>,
}

impl ImapConnector {
    /// Creates a connector using the host, port, mailbox and timeouts in `config`.
    #[must_use]
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MailboxConnector for ImapConnector {
    type Session = ImapMailbox;

    #[instrument(
        name = "ImapConnector::connect_and_select",
        skip_all,
        fields(
            email = %account.address(),
            imap_host = %self.config.imap_host_for(account)
        )
    )]
    async fn connect_and_select(&self, account: &Account) -> Result<ImapMailbox> {
        let config = &self.config;
        let timeouts = config.timeouts;
        let imap_host = config.imap_host_for(account);
        let target_addr = config.server_address_for(account);

        let tls_stream = timeout(
            timeouts.connect,
            connection::establish_tls_connection(&imap_host, &target_addr),
        )
        .await
        .map_err(|_| Error::ConnectTimeout {
            target: target_addr.clone(),
            timeout: timeouts.connect,
        })??;

        debug!("TLS connection established");

        let mut session = timeout(
            timeouts.auth,
            session::authenticate(tls_stream, account.address(), account.password()),
        )
        .await
        .map_err(|_| Error::AuthTimeout {
            email: account.address().to_string(),
            timeout: timeouts.auth,
        })??;

        debug!("Authenticated");

        timeout(
            timeouts.select,
            session::select_mailbox(&mut session, &config.mailbox),
        )
        .await
        .map_err(|_| Error::SelectTimeout {
            mailbox: config.mailbox.clone(),
            timeout: timeouts.select,
        })??;

        debug!(mailbox = %config.mailbox, "Selected mailbox");

        Ok(ImapMailbox {
            session: Box::new(session),
            timeouts,
            email: account.address().to_string(),
        })
    }
}

/// An authenticated IMAP session with the mailbox selected.
pub struct ImapMailbox {
    session: Box<ImapSession>,
    timeouts: TimeoutConfig,
    email: String,
}

#[async_trait]
impl MailboxSession for ImapMailbox {
    async fn search_sender(&mut self, sender: &str) -> Result<Vec<u32>> {
        let limit = self.timeouts.search;
        timeout(limit, session::search_sender(&mut self.session, sender))
            .await
            .map_err(|_| Error::SearchTimeout { timeout: limit })?
    }

    async fn fetch_message(&mut self, uid: u32) -> Result<CandidateMessage> {
        let limit = self.timeouts.fetch;
        let raw = timeout(limit, session::fetch_raw(&mut self.session, uid))
            .await
            .map_err(|_| Error::FetchTimeout {
                uid,
                timeout: limit,
            })??;

        parser::parse_candidate(uid, &raw)
    }

    async fn logout(&mut self) -> Result<()> {
        let limit = self.timeouts.logout;
        timeout(limit, session::logout(&mut self.session))
            .await
            .map_err(|_| Error::LogoutTimeout { timeout: limit })?
    }
}

impl std::fmt::Debug for ImapMailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImapMailbox")
            .field("email", &self.email)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}
