//! IMAP host discovery from an account's email domain.
//!
//! ```
//! use otp_inbox::known_servers::discover_imap_host;
//!
//! assert_eq!(discover_imap_host("user@gmail.com"), "imap.gmail.com");
//! assert_eq!(discover_imap_host("user@example.org"), "imap.example.org");
//! ```

/// Domains whose IMAP host is not simply `imap.<domain>`.
const KNOWN_SERVERS: &[(&str, &str)] = &[
    ("gmail.com", "imap.gmail.com"),
    ("googlemail.com", "imap.gmail.com"),
    ("yahoo.com", "imap.mail.yahoo.com"),
    ("hotmail.com", "outlook.office365.com"),
    ("outlook.com", "outlook.office365.com"),
    ("live.com", "outlook.office365.com"),
    ("msn.com", "outlook.office365.com"),
    ("aol.com", "imap.aol.com"),
    ("icloud.com", "imap.mail.me.com"),
    ("me.com", "imap.mail.me.com"),
    ("mac.com", "imap.mail.me.com"),
    ("yandex.com", "imap.yandex.com"),
    ("gmx.com", "imap.gmx.com"),
    ("gmx.net", "imap.gmx.net"),
    ("zoho.com", "imap.zoho.com"),
    ("fastmail.com", "imap.fastmail.com"),
];

/// Returns the IMAP host for `email`, falling back to `imap.<domain>`.
///
/// Domain matching is case-insensitive.
#[must_use]
pub fn discover_imap_host(email: &str) -> String {
    let domain = email
        .rsplit_once('@')
        .map_or(email, |(_, domain)| domain)
        .to_ascii_lowercase();

    KNOWN_SERVERS
        .iter()
        .find(|(known, _)| *known == domain)
        .map_or_else(|| format!("imap.{domain}"), |(_, host)| (*host).to_string())
}
