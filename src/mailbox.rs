//! The seam between the poller and a mail server.
//!
//! [`MailboxConnector`] opens one [`MailboxSession`] per account per poll. The
//! production implementation is [`ImapConnector`](crate::imap::ImapConnector);
//! tests substitute scripted in-memory mailboxes.

use crate::error::Result;
use crate::model::{Account, CandidateMessage};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

/// Opens authenticated sessions with the primary mailbox selected.
#[async_trait]
pub trait MailboxConnector: Send + Sync {
    /// Session type produced by this connector.
    type Session: MailboxSession;

    /// Connects, authenticates with the account's credential and selects the mailbox.
    ///
    /// # Errors
    ///
    /// Returns an authentication error for a rejected credential and a connection
    /// error for network, TLS or protocol failures.
    async fn connect_and_select(&self, account: &Account) -> Result<Self::Session>;
}

/// An open session on one account's mailbox.
#[async_trait]
pub trait MailboxSession: Send {
    /// Identifiers of every message whose `From` header contains `sender`,
    /// in ascending (oldest first) mailbox order.
    ///
    /// # Errors
    ///
    /// Returns an error if the search command fails.
    async fn search_sender(&mut self, sender: &str) -> Result<Vec<u32>>;

    /// Retrieves and parses one message.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the fetch fails and a parse error if the
    /// message or its `Date` header is malformed.
    async fn fetch_message(&mut self, uid: u32) -> Result<CandidateMessage>;

    /// Ends the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the logout command fails.
    async fn logout(&mut self) -> Result<()>;
}

/// Lazily fetches the last `limit` of `ids`, newest first.
///
/// Nothing is fetched until the stream is polled, and each message is fetched
/// only when the consumer asks for it, so stopping early leaves older messages
/// untouched. Calling this again yields a fresh stream over the same window.
pub fn fetch_recent<'a, S>(
    session: &'a mut S,
    ids: &[u32],
    limit: usize,
) -> BoxStream<'a, Result<CandidateMessage>>
where
    S: MailboxSession + ?Sized,
{
    let window: Vec<u32> = ids.iter().rev().take(limit).copied().collect();

    stream::unfold(
        (session, window.into_iter()),
        |(session, mut remaining)| async move {
            let uid = remaining.next()?;
            let message = session.fetch_message(uid).await;
            Some((message, (session, remaining)))
        },
    )
    .boxed()
}
