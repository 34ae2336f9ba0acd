//! Values produced and consumed by a polling pass.
//!
//! Everything here is rebuilt from scratch on every poll and never mutated
//! after it is handed back to a caller.

use crate::error::{Error, FailureKind, Result};
use chrono::{DateTime, Local};
use email_address::EmailAddress;
use secrecy::{ExposeSecret, SecretString};

/// One configured mailbox: an address plus the credential used to log in.
///
/// The credential is stored as a [`SecretString`] and is redacted from `Debug`.
#[derive(Clone)]
pub struct Account {
    address: EmailAddress,
    password: SecretString,
}

impl Account {
    /// Creates an account after validating the address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEmailFormat`] if `address` is not a valid email address.
    ///
    /// # Example
    ///
    /// ```
    /// use otp_inbox::Account;
    ///
    /// let account = Account::new("user@gmail.com", "app-password").unwrap();
    /// assert_eq!(account.address(), "user@gmail.com");
    /// assert!(Account::new("not-an-address", "x").is_err());
    /// ```
    pub fn new(address: &str, password: impl Into<String>) -> Result<Self> {
        let address =
            EmailAddress::parse_with_options(address, email_address::Options::default())
                .map_err(|_| Error::InvalidEmailFormat {
                    email: address.to_string(),
                })?;

        Ok(Self {
            address,
            password: SecretString::from(password.into()),
        })
    }

    /// Returns the account's email address.
    #[must_use]
    pub fn address(&self) -> &str {
        self.address.as_str()
    }

    /// Returns the credential. Only pass this to authentication.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address.as_str())
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A message retrieved from a mailbox during one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMessage {
    /// Server UID of the message.
    pub uid: u32,
    /// Parsed `Date` header in local time.
    pub timestamp: DateTime<Local>,
    /// Decoded plain-text body.
    pub body: String,
}

/// A verification code and the timestamp of the message it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCode {
    /// The digits of the code.
    pub code: String,
    /// Timestamp of the source message.
    pub timestamp: DateTime<Local>,
}

/// Outcome of polling one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountResult {
    /// Address of the polled account.
    pub address: String,
    /// The code found, or why there is none.
    pub outcome: std::result::Result<ExtractedCode, FailureKind>,
}

impl AccountResult {
    /// Result carrying a code.
    #[must_use]
    pub fn found(address: impl Into<String>, code: ExtractedCode) -> Self {
        Self {
            address: address.into(),
            outcome: Ok(code),
        }
    }

    /// Result with no code.
    #[must_use]
    pub fn absent(address: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            address: address.into(),
            outcome: Err(kind),
        }
    }

    /// The extracted code, if any.
    #[must_use]
    pub fn extracted(&self) -> Option<&ExtractedCode> {
        self.outcome.as_ref().ok()
    }

    /// The code digits, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.extracted().map(|c| c.code.as_str())
    }

    /// Timestamp of the code's message, if any.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Local>> {
        self.extracted().map(|c| c.timestamp)
    }

    /// Why no code was found, if that is the case.
    #[must_use]
    pub fn failure(&self) -> Option<FailureKind> {
        self.outcome.as_ref().err().copied()
    }
}

/// The freshest usable code across all accounts, with its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestCode {
    /// Address of the account the code was found in.
    pub address: String,
    /// The code itself.
    pub code: ExtractedCode,
}

/// Every account's result from one pass, newest first, plus the best code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateView {
    /// The single `now` used to judge freshness for this view.
    pub polled_at: DateTime<Local>,
    /// One entry per account, sorted by timestamp descending, absent last.
    pub entries: Vec<AccountResult>,
    /// Freshest code that is still within the TTL.
    pub best: Option<BestCode>,
}
