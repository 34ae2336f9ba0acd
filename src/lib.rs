//! # otp-inbox
//!
//! Polls a fixed set of IMAP mailboxes for messages from a known sender, extracts
//! the one-time verification code from each, and reports the freshest one.
//!
//! This crate provides:
//! - A pure [`extractor`] for word-bounded numeric codes
//! - An [`AccountPoller`] that finds the newest message in a bounded window that
//!   carries a code, converting every failure into data
//! - An [`Aggregator`] that polls all accounts concurrently and produces a sorted
//!   listing plus the single best code still within its time-to-live
//! - An [`http`] front end serving an HTML dashboard and a JSON endpoint
//!
//! ## Quick Start
//!
//! ```no_run
//! use otp_inbox::{Aggregator, Config, ImapConnector};
//! use std::sync::Arc;
//!
//! # async fn example() -> otp_inbox::Result<()> {
//! let config = Arc::new(
//!     Config::builder()
//!         .account("first@gmail.com", "app-password-1")
//!         .account("second@gmail.com", "app-password-2")
//!         .sender_filter("ticketmaster.com")
//!         .build()?,
//! );
//!
//! let aggregator = Aggregator::new(Arc::clone(&config), ImapConnector::new(config));
//!
//! for entry in aggregator.listing().await.entries {
//!     println!("{}: {:?}", entry.address, entry.code());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure isolation
//!
//! Nothing raised while polling an account escapes the poller. Each
//! [`AccountResult`] carries either the code or the [`FailureKind`] that
//! explains its absence, so a caller always receives a complete view even when
//! every mailbox is unreachable.
//!
//! ## Testing without a server
//!
//! The poller and aggregator are generic over [`mailbox::MailboxConnector`];
//! supply an in-memory implementation to exercise them without IMAP.
//!
//! ## Observability
//!
//! The crate uses `tracing` for instrumentation.
//!
//! ### Span Naming Convention
//!
//! - `Aggregator::listing` / `Aggregator::best_code` - One aggregate pass
//! - `AccountPoller::poll` - One account
//! - `ImapConnector::connect_and_select` - Connect, login, select
//! - `session::search_sender`, `session::fetch_raw`, `session::logout` - IMAP commands
//! - `connection::establish_tls` - TLS connection
//!
//! ### Standard Fields
//!
//! - `email` - Account address (credentials are never recorded)
//! - `imap_host` - IMAP server hostname
//! - `sender` - Sender filter
//! - `uid` - Message UID

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod aggregator;
pub mod config;
pub mod error;
pub mod extractor;
pub mod freshness;
pub mod http;
pub mod imap;
pub mod known_servers;
pub mod mailbox;
pub mod model;
pub mod parser;
pub mod poller;

// Internal modules
mod connection;
mod session;

// Re-exports for ergonomic API
pub use aggregator::Aggregator;
pub use config::{Config, ConfigBuilder, LogFormat, ServerConfig, TimeoutConfig};
pub use error::{Error, FailureKind, Result};
pub use imap::ImapConnector;
pub use model::{Account, AccountResult, AggregateView, BestCode, CandidateMessage, ExtractedCode};
pub use poller::AccountPoller;
