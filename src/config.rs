//! Configuration for the mailbox poller.
//!
//! A [`Config`] is an immutable value: build it once at startup with
//! [`Config::builder`] or [`Config::load`] and share it behind an `Arc`.
//!
//! ```
//! use otp_inbox::Config;
//!
//! let config = Config::builder()
//!     .account("user@gmail.com", "app-password")
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.sender_filter, "ticketmaster.com");
//! assert_eq!(config.code_ttl.as_secs(), 300);
//! ```

use crate::error::{Error, Result};
use crate::known_servers;
use crate::model::Account;
use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Sender substring used when none is configured.
pub const DEFAULT_SENDER_FILTER: &str = "ticketmaster.com";
/// Code lifetime used when none is configured.
pub const DEFAULT_CODE_TTL: Duration = Duration::from_secs(300);
/// How many of the newest sender-matched messages are scanned.
pub const DEFAULT_SCAN_WINDOW: usize = 10;
/// Length of a verification code.
pub const DEFAULT_CODE_DIGITS: usize = 6;
/// Configuration file read when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "otp-inbox.toml";
/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "OTP_INBOX_CONFIG";

/// Immutable poller configuration.
#[derive(Debug, Clone)]
pub struct Config {
    accounts: Vec<Account>,
    /// Substring matched against the `From` header.
    pub sender_filter: String,
    /// How long a code stays usable after its message's Date.
    pub code_ttl: Duration,
    /// Number of newest sender-matched messages scanned per account.
    pub scan_window: usize,
    /// Length of the numeric code to extract.
    pub code_digits: usize,
    /// IMAP server hostname (discovered per account domain if not set).
    pub imap_host: Option<String>,
    /// IMAP server port (default: 993 for IMAPS).
    pub imap_port: u16,
    /// Mailbox to select (default: `INBOX`).
    pub mailbox: String,
    /// Timeout configuration.
    pub timeouts: TimeoutConfig,
    /// HTTP front-end settings.
    pub server: ServerConfig,
}

impl Config {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// The configured accounts, in configuration order.
    #[must_use]
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Returns the IMAP host for an account, either explicitly configured or derived
    /// from its email domain.
    #[must_use]
    pub fn imap_host_for(&self, account: &Account) -> String {
        match &self.imap_host {
            Some(host) => host.clone(),
            None => known_servers::discover_imap_host(account.address()),
        }
    }

    /// Returns the IMAP server address for an account as "host:port".
    #[must_use]
    pub fn server_address_for(&self, account: &Account) -> String {
        format!("{}:{}", self.imap_host_for(account), self.imap_port)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the resulting
    /// configuration is invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|source| Error::ConfigParse {
            path: path.display().to_string(),
            source,
        })?;

        file.into_config()
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid or the configuration is invalid.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(contents).map_err(|source| Error::ConfigParse {
            path: "<inline>".into(),
            source,
        })?;
        file.into_config()
    }

    /// Resolves the config file path from a CLI argument, then `OTP_INBOX_CONFIG`,
    /// then the default file name.
    #[must_use]
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var(CONFIG_PATH_ENV) {
            return PathBuf::from(p);
        }
        PathBuf::from(DEFAULT_CONFIG_PATH)
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Timeout for establishing TCP/TLS connection.
    pub connect: Duration,
    /// Timeout for IMAP authentication.
    pub auth: Duration,
    /// Timeout for selecting a mailbox.
    pub select: Duration,
    /// Timeout for the sender search.
    pub search: Duration,
    /// Timeout for fetching one message.
    pub fetch: Duration,
    /// Timeout for logout operation.
    pub logout: Duration,
    /// Upper bound on searching and scanning one account.
    pub account: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(15),
            auth: Duration::from_secs(15),
            select: Duration::from_secs(10),
            search: Duration::from_secs(10),
            fetch: Duration::from_secs(15),
            logout: Duration::from_secs(5),
            account: Duration::from_secs(45),
        }
    }
}

/// Log output format of the binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// HTTP front-end settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    pub listen_addr: SocketAddr,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            log_format: LogFormat::default(),
        }
    }
}

/// Builder for [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    accounts: Vec<(String, String)>,
    sender_filter: Option<String>,
    code_ttl: Option<Duration>,
    scan_window: Option<usize>,
    code_digits: Option<usize>,
    imap_host: Option<String>,
    imap_port: Option<u16>,
    mailbox: Option<String>,
    timeouts: Option<TimeoutConfig>,
    server: Option<ServerConfig>,
}

impl ConfigBuilder {
    /// Appends an account. Order is preserved.
    #[must_use]
    pub fn account(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.accounts.push((email.into(), password.into()));
        self
    }

    /// Appends several accounts.
    #[must_use]
    pub fn accounts<I, E, P>(mut self, accounts: I) -> Self
    where
        I: IntoIterator<Item = (E, P)>,
        E: Into<String>,
        P: Into<String>,
    {
        self.accounts
            .extend(accounts.into_iter().map(|(e, p)| (e.into(), p.into())));
        self
    }

    /// Sets the substring matched against the `From` header.
    #[must_use]
    pub fn sender_filter(mut self, sender: impl Into<String>) -> Self {
        self.sender_filter = Some(sender.into());
        self
    }

    /// Sets how long a code stays usable.
    #[must_use]
    pub fn code_ttl(mut self, ttl: Duration) -> Self {
        self.code_ttl = Some(ttl);
        self
    }

    /// Sets how many of the newest matching messages are scanned.
    #[must_use]
    pub fn scan_window(mut self, window: usize) -> Self {
        self.scan_window = Some(window);
        self
    }

    /// Sets the code length.
    #[must_use]
    pub fn code_digits(mut self, digits: usize) -> Self {
        self.code_digits = Some(digits);
        self
    }

    /// Sets the IMAP server hostname explicitly for every account.
    #[must_use]
    pub fn imap_host(mut self, host: impl Into<String>) -> Self {
        self.imap_host = Some(host.into());
        self
    }

    /// Sets the IMAP server port.
    #[must_use]
    pub fn imap_port(mut self, port: u16) -> Self {
        self.imap_port = Some(port);
        self
    }

    /// Sets the mailbox to select.
    #[must_use]
    pub fn mailbox(mut self, mailbox: impl Into<String>) -> Self {
        self.mailbox = Some(mailbox.into());
        self
    }

    /// Sets timeout configuration.
    #[must_use]
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts
            .get_or_insert_with(TimeoutConfig::default)
            .connect = timeout;
        self
    }

    /// Sets the per-account poll budget.
    #[must_use]
    pub fn account_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts
            .get_or_insert_with(TimeoutConfig::default)
            .account = timeout;
        self
    }

    /// Sets the HTTP front-end settings.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no accounts, an address is invalid or duplicated,
    /// or a numeric setting is zero.
    pub fn build(self) -> Result<Config> {
        if self.accounts.is_empty() {
            return Err(invalid("at least one account is required"));
        }

        let mut seen = HashSet::new();
        let mut accounts = Vec::with_capacity(self.accounts.len());
        for (email, password) in self.accounts {
            let account = Account::new(&email, password)?;
            if !seen.insert(account.address().to_ascii_lowercase()) {
                return Err(invalid(format!("duplicate account {email}")));
            }
            accounts.push(account);
        }

        let sender_filter = self
            .sender_filter
            .unwrap_or_else(|| DEFAULT_SENDER_FILTER.to_string());
        validate_sender_filter(&sender_filter)?;

        let scan_window = self.scan_window.unwrap_or(DEFAULT_SCAN_WINDOW);
        if scan_window == 0 {
            return Err(invalid("scan_window must be greater than 0"));
        }

        let code_digits = self.code_digits.unwrap_or(DEFAULT_CODE_DIGITS);
        if code_digits == 0 {
            return Err(invalid("code_digits must be greater than 0"));
        }

        let mailbox = self.mailbox.unwrap_or_else(|| "INBOX".to_string());
        if mailbox.trim().is_empty() {
            return Err(invalid("mailbox must not be empty"));
        }

        Ok(Config {
            accounts,
            sender_filter,
            code_ttl: self.code_ttl.unwrap_or(DEFAULT_CODE_TTL),
            scan_window,
            code_digits,
            imap_host: self.imap_host,
            imap_port: self.imap_port.unwrap_or(993),
            mailbox,
            timeouts: self.timeouts.unwrap_or_default(),
            server: self.server.unwrap_or_default(),
        })
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidConfig {
        message: message.into(),
    }
}

/// The sender filter is embedded in a quoted IMAP SEARCH string.
fn validate_sender_filter(sender: &str) -> Result<()> {
    if sender.trim().is_empty() {
        return Err(invalid("sender_filter must not be empty"));
    }
    if sender.contains(['"', '\\', '\r', '\n']) {
        return Err(invalid(
            "sender_filter must not contain quotes, backslashes or line breaks",
        ));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// TOML file schema
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    accounts: Vec<FileAccount>,
    sender_filter: Option<String>,
    code_ttl_secs: Option<u64>,
    scan_window: Option<usize>,
    code_digits: Option<usize>,
    mailbox: Option<String>,
    #[serde(default)]
    imap: FileImap,
    #[serde(default)]
    timeouts: FileTimeouts,
    #[serde(default)]
    server: FileServer,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileAccount {
    email: String,
    password: Option<String>,
    password_env: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileImap {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileTimeouts {
    connect_secs: Option<u64>,
    auth_secs: Option<u64>,
    select_secs: Option<u64>,
    search_secs: Option<u64>,
    fetch_secs: Option<u64>,
    logout_secs: Option<u64>,
    account_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileServer {
    listen_addr: Option<SocketAddr>,
    log_format: Option<LogFormat>,
}

impl FileAccount {
    /// Inline password wins over `password_env`.
    fn resolve_password(&self) -> Result<String> {
        match (&self.password, &self.password_env) {
            (Some(password), _) => Ok(password.clone()),
            (None, Some(var)) => std::env::var(var).map_err(|_| {
                invalid(format!(
                    "environment variable {var} for account {} is not set",
                    self.email
                ))
            }),
            (None, None) => Err(invalid(format!(
                "account {} needs password or password_env",
                self.email
            ))),
        }
    }
}

impl FileTimeouts {
    fn into_timeouts(self) -> TimeoutConfig {
        let defaults = TimeoutConfig::default();
        let secs = |value: Option<u64>, default: Duration| {
            value.map_or(default, Duration::from_secs)
        };
        TimeoutConfig {
            connect: secs(self.connect_secs, defaults.connect),
            auth: secs(self.auth_secs, defaults.auth),
            select: secs(self.select_secs, defaults.select),
            search: secs(self.search_secs, defaults.search),
            fetch: secs(self.fetch_secs, defaults.fetch),
            logout: secs(self.logout_secs, defaults.logout),
            account: secs(self.account_secs, defaults.account),
        }
    }
}

impl FileConfig {
    fn into_config(self) -> Result<Config> {
        let mut builder = Config::builder();

        for account in &self.accounts {
            builder = builder.account(account.email.clone(), account.resolve_password()?);
        }
        if let Some(sender) = self.sender_filter {
            builder = builder.sender_filter(sender);
        }
        if let Some(ttl) = self.code_ttl_secs {
            builder = builder.code_ttl(Duration::from_secs(ttl));
        }
        if let Some(window) = self.scan_window {
            builder = builder.scan_window(window);
        }
        if let Some(digits) = self.code_digits {
            builder = builder.code_digits(digits);
        }
        if let Some(mailbox) = self.mailbox {
            builder = builder.mailbox(mailbox);
        }
        if let Some(host) = self.imap.host {
            builder = builder.imap_host(host);
        }
        if let Some(port) = self.imap.port {
            builder = builder.imap_port(port);
        }

        let server_defaults = ServerConfig::default();
        builder
            .timeouts(self.timeouts.into_timeouts())
            .server(ServerConfig {
                listen_addr: self.server.listen_addr.unwrap_or(server_defaults.listen_addr),
                log_format: self.server.log_format.unwrap_or(server_defaults.log_format),
            })
            .build()
    }
}
