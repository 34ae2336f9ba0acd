//! Internal IMAP session commands.
//!
//! Thin wrappers around async-imap that attach error context. Timeouts are
//! applied by the caller in [`crate::imap`].

use crate::connection::TlsStream;
use crate::error::{Error, Result};
use async_imap::Session;
use futures::StreamExt;
use tracing::{debug, instrument};

/// Type alias for IMAP session over TLS.
pub(crate) type ImapSession = Session<TlsStream>;

/// Authenticates to IMAP server and returns a session.
#[instrument(name = "session::authenticate", skip_all, fields(email = %email))]
pub(crate) async fn authenticate(
    tls_stream: TlsStream,
    email: &str,
    password: &str,
) -> Result<ImapSession> {
    let client = async_imap::Client::new(tls_stream);

    debug!("Authenticating to IMAP server");

    client
        .login(email, password)
        .await
        .map_err(|e| Error::ImapLogin {
            email: email.to_string(),
            source: e.0,
        })
}

/// Selects a mailbox (typically "INBOX").
#[instrument(name = "session::select", skip(session), fields(mailbox = %mailbox))]
pub(crate) async fn select_mailbox(session: &mut ImapSession, mailbox: &str) -> Result<()> {
    debug!("Selecting mailbox");

    session
        .select(mailbox)
        .await
        .map_err(|source| Error::SelectMailbox {
            mailbox: mailbox.to_string(),
            source,
        })?;

    Ok(())
}

/// Builds the search query. The sender has already been validated to contain no
/// quote, backslash or line break.
fn sender_query(sender: &str) -> String {
    format!("FROM \"{sender}\"")
}

/// Returns the UIDs of messages whose `From` contains `sender`, ascending.
#[instrument(name = "session::search_sender", skip(session), fields(sender = %sender))]
pub(crate) async fn search_sender(session: &mut ImapSession, sender: &str) -> Result<Vec<u32>> {
    let uids = session
        .uid_search(sender_query(sender))
        .await
        .map_err(|source| Error::ImapSearch {
            sender: sender.to_string(),
            source,
        })?;

    // The server hands back a set; UID order is arrival order.
    let mut uids: Vec<u32> = uids.into_iter().collect();
    uids.sort_unstable();

    debug!(uid_count = uids.len(), "Found sender messages");

    Ok(uids)
}

/// Fetches the full raw message without setting `\Seen`.
#[instrument(name = "session::fetch_raw", skip(session))]
pub(crate) async fn fetch_raw(session: &mut ImapSession, uid: u32) -> Result<Vec<u8>> {
    let uid_set = uid.to_string();

    let mut stream = session
        .uid_fetch(&uid_set, "BODY.PEEK[]")
        .await
        .map_err(|source| Error::ImapFetch { uid, source })?
        .boxed();

    // Drain the whole response so the session is ready for the next command.
    let mut raw = None;
    while let Some(item) = stream.next().await {
        let fetch = item.map_err(|source| Error::ImapFetch { uid, source })?;
        if raw.is_none() {
            raw = fetch.body().map(<[u8]>::to_vec);
        }
    }

    raw.ok_or(Error::MessageMissing { uid })
}

/// Logs out from IMAP session.
#[instrument(name = "session::logout", skip(session))]
pub(crate) async fn logout(session: &mut ImapSession) -> Result<()> {
    debug!("Logging out");

    session
        .logout()
        .await
        .map_err(|source| Error::ImapLogout { source })?;

    Ok(())
}
