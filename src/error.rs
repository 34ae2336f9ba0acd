//! Error types for the otp-inbox crate.
//!
//! All errors implement [`std::error::Error`] and provide context about what went wrong.
//! Every error raised while polling a mailbox maps onto one of four [`FailureKind`]s;
//! the account poller converts them into data so they never reach the aggregator.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or polling mailboxes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration / validation errors (startup only)
    // ─────────────────────────────────────────────────────────────────────────
    /// Invalid email address format.
    #[error("invalid email format: {email}")]
    InvalidEmailFormat {
        /// The invalid email address.
        email: String,
    },

    /// Invalid configuration provided.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Configuration file could not be read.
    #[error("failed to read configuration file {path}")]
    ConfigRead {
        /// Path of the configuration file.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for the expected schema.
    #[error("failed to parse configuration file {path}")]
    ConfigParse {
        /// Path of the configuration file.
        path: String,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// Invalid DNS name for TLS.
    #[error("invalid DNS name for host '{host}'")]
    InvalidDnsName {
        /// The invalid hostname.
        host: String,
        /// The underlying DNS name error.
        #[source]
        source: rustls::client::InvalidDnsNameError,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Network / connection errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to establish TCP connection.
    #[error("failed to connect to {target}")]
    TcpConnect {
        /// The target address that failed.
        target: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to establish TLS connection.
    #[error("failed to establish TLS connection to {target}")]
    TlsConnect {
        /// The target address that failed.
        target: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Timeout errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Connection timeout.
    #[error("connection timeout to {target} after {timeout:?}")]
    ConnectTimeout {
        /// The target address.
        target: String,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Authentication timeout.
    #[error("authentication timeout for {email} after {timeout:?}")]
    AuthTimeout {
        /// The email address used for authentication.
        email: String,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Mailbox selection timeout.
    #[error("mailbox selection timeout for '{mailbox}' after {timeout:?}")]
    SelectTimeout {
        /// The mailbox name.
        mailbox: String,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Sender search timeout.
    #[error("search timeout after {timeout:?}")]
    SearchTimeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Message fetch timeout.
    #[error("message fetch timeout for UID {uid} after {timeout:?}")]
    FetchTimeout {
        /// The UID being fetched.
        uid: u32,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// The whole account poll exceeded its budget.
    #[error("poll of {email} timed out after {timeout:?}")]
    PollTimeout {
        /// The account being polled.
        email: String,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Logout timeout (not critical).
    #[error("logout timeout after {timeout:?}")]
    LogoutTimeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // IMAP protocol errors
    // ─────────────────────────────────────────────────────────────────────────
    /// IMAP login failed.
    #[error("IMAP login failed for {email}")]
    ImapLogin {
        /// The email address used for login.
        email: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// Failed to select mailbox.
    #[error("failed to select mailbox '{mailbox}'")]
    SelectMailbox {
        /// The mailbox name.
        mailbox: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// IMAP search failed.
    #[error("IMAP search for sender '{sender}' failed")]
    ImapSearch {
        /// The sender filter used in the search.
        sender: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// IMAP fetch failed.
    #[error("IMAP fetch failed for UID {uid}")]
    ImapFetch {
        /// The UID that failed.
        uid: u32,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// The server answered a fetch without returning the message.
    #[error("server returned no message for UID {uid}")]
    MessageMissing {
        /// The UID that was requested.
        uid: u32,
    },

    /// IMAP logout failed.
    #[error("IMAP logout failed")]
    ImapLogout {
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Email parsing errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to parse email message.
    #[error("failed to parse email UID {uid}")]
    ParseEmail {
        /// UID of the message.
        uid: u32,
        /// The underlying parse error.
        #[source]
        source: mailparse::MailParseError,
    },

    /// Failed to extract email body.
    #[error("failed to extract body of email UID {uid}")]
    ExtractBody {
        /// UID of the message.
        uid: u32,
        /// The underlying parse error.
        #[source]
        source: mailparse::MailParseError,
    },

    /// Message has no usable Date header.
    #[error("email UID {uid} has an invalid Date header: {reason}")]
    InvalidDate {
        /// UID of the message.
        uid: u32,
        /// Why the header was rejected.
        reason: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Search result errors
    // ─────────────────────────────────────────────────────────────────────────
    /// No message from the sender carried a code.
    #[error("no matching email found")]
    NoMatch,
}

impl Error {
    /// Maps this error onto the failure kind reported for an account.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::ImapLogin { .. } => FailureKind::Authentication,

            Error::ParseEmail { .. } | Error::ExtractBody { .. } | Error::InvalidDate { .. } => {
                FailureKind::Parse
            }

            Error::NoMatch => FailureKind::NoMatch,

            Error::InvalidEmailFormat { .. }
            | Error::InvalidConfig { .. }
            | Error::ConfigRead { .. }
            | Error::ConfigParse { .. }
            | Error::InvalidDnsName { .. }
            | Error::TcpConnect { .. }
            | Error::TlsConnect { .. }
            | Error::ConnectTimeout { .. }
            | Error::AuthTimeout { .. }
            | Error::SelectTimeout { .. }
            | Error::SearchTimeout { .. }
            | Error::FetchTimeout { .. }
            | Error::PollTimeout { .. }
            | Error::LogoutTimeout { .. }
            | Error::SelectMailbox { .. }
            | Error::ImapSearch { .. }
            | Error::ImapFetch { .. }
            | Error::MessageMissing { .. }
            | Error::ImapLogout { .. } => FailureKind::Connection,
        }
    }
}

/// Why an account produced no code in a polling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The server rejected the account's credential.
    Authentication,
    /// Network, TLS, protocol or timeout failure.
    Connection,
    /// A message or its Date header could not be parsed.
    Parse,
    /// No message from the sender, or none carried a code.
    NoMatch,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Authentication => write!(f, "authentication"),
            FailureKind::Connection => write!(f, "connection"),
            FailureKind::Parse => write!(f, "parse"),
            FailureKind::NoMatch => write!(f, "no_match"),
        }
    }
}
