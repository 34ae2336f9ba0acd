//! Integration tests for otp-inbox.
//!
//! These tests require a real IMAP account and are disabled by default.
//! To run them:
//!
//! ```bash
//! # Set environment variables (or put them in .env)
//! export OTP_INBOX_TEST_EMAIL="your@email.com"
//! export OTP_INBOX_TEST_PASSWORD="your-app-password"
//!
//! # Optional: sender to search for (defaults to ticketmaster.com)
//! export OTP_INBOX_TEST_SENDER="example.com"
//!
//! # Run with the integration-tests feature
//! cargo test --features integration-tests -- --ignored
//! ```

#![cfg(feature = "integration-tests")]

use futures::StreamExt;
use otp_inbox::mailbox::{fetch_recent, MailboxConnector, MailboxSession};
use otp_inbox::{AccountPoller, Aggregator, Config, FailureKind, ImapConnector};
use std::env;
use std::sync::Arc;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Test Configuration Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn get_test_credentials() -> Option<(String, String)> {
    dotenvy::dotenv().ok();
    let email = env::var("OTP_INBOX_TEST_EMAIL").ok()?;
    let password = env::var("OTP_INBOX_TEST_PASSWORD").ok()?;
    Some((email, password))
}

fn get_test_config() -> Option<Arc<Config>> {
    let (email, password) = get_test_credentials()?;

    let mut builder = Config::builder().account(email, password);
    if let Ok(sender) = env::var("OTP_INBOX_TEST_SENDER") {
        builder = builder.sender_filter(sender);
    }

    builder.build().ok().map(Arc::new)
}

fn get_test_config_with_bad_password() -> Option<Arc<Config>> {
    let (email, _) = get_test_credentials()?;

    Config::builder()
        .account(email, "definitely-not-the-password")
        .account_timeout(Duration::from_secs(20))
        .build()
        .ok()
        .map(Arc::new)
}

// ─────────────────────────────────────────────────────────────────────────────
// Mailbox Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
#[ignore = "requires real IMAP server"]
async fn test_connect_search_and_logout() {
    let config = get_test_config().expect("Test config from environment variables");
    let connector = ImapConnector::new(Arc::clone(&config));
    let account = &config.accounts()[0];

    let mut session = connector
        .connect_and_select(account)
        .await
        .expect("Failed to connect");

    let uids = session
        .search_sender(&config.sender_filter)
        .await
        .expect("Failed to search");
    assert!(uids.windows(2).all(|w| w[0] <= w[1]), "UIDs are ascending");

    session.logout().await.expect("Failed to logout");
}

#[tokio::test]
#[ignore = "requires real IMAP server"]
async fn test_fetch_recent_parses_messages() {
    let config = get_test_config().expect("Test config from environment variables");
    let connector = ImapConnector::new(Arc::clone(&config));
    let account = &config.accounts()[0];

    let mut session = connector
        .connect_and_select(account)
        .await
        .expect("Failed to connect");
    let uids = session
        .search_sender(&config.sender_filter)
        .await
        .expect("Failed to search");

    let messages: Vec<_> = fetch_recent(&mut session, &uids, 3).collect().await;
    assert!(messages.len() <= 3);
    for message in messages {
        let message = message.expect("Failed to fetch");
        assert!(uids.contains(&message.uid));
    }

    session.logout().await.expect("Failed to logout");
}

#[tokio::test]
#[ignore = "requires real IMAP server"]
async fn test_connector_debug_hides_password() {
    let (_, password) = get_test_credentials().expect("Test credentials");
    let config = get_test_config().expect("Test config from environment variables");
    let connector = ImapConnector::new(Arc::clone(&config));

    let session = connector
        .connect_and_select(&config.accounts()[0])
        .await
        .expect("Failed to connect");

    let debug_str = format!("{session:?} {:?}", config.accounts()[0]);
    assert!(!debug_str.contains(&password));
}

// ─────────────────────────────────────────────────────────────────────────────
// Poller and Aggregator Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
#[ignore = "requires real IMAP server"]
async fn test_poll_reports_code_or_no_match() {
    let config = get_test_config().expect("Test config from environment variables");
    let poller = AccountPoller::new(Arc::clone(&config), ImapConnector::new(Arc::clone(&config)));

    let result = poller.poll(&config.accounts()[0]).await;

    match result.outcome {
        Ok(code) => {
            assert_eq!(code.code.len(), config.code_digits);
            assert!(code.code.chars().all(|c| c.is_ascii_digit()));
        }
        Err(kind) => assert_eq!(kind, FailureKind::NoMatch),
    }
}

#[tokio::test]
#[ignore = "requires real IMAP server"]
async fn test_poll_bad_password_is_authentication_failure() {
    let config = get_test_config_with_bad_password().expect("Test config from environment variables");
    let poller = AccountPoller::new(Arc::clone(&config), ImapConnector::new(Arc::clone(&config)));

    let result = poller.poll(&config.accounts()[0]).await;

    assert_eq!(result.failure(), Some(FailureKind::Authentication));
}

#[tokio::test]
#[ignore = "requires real IMAP server"]
async fn test_listing_covers_every_account() {
    let config = get_test_config().expect("Test config from environment variables");
    let aggregator = Aggregator::new(Arc::clone(&config), ImapConnector::new(Arc::clone(&config)));

    let view = aggregator.listing().await;

    assert_eq!(view.entries.len(), config.accounts().len());
    if let Some(best) = view.best {
        assert!(view.entries.iter().any(|e| e.address == best.address));
    }
}
