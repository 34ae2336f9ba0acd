//! Cross-account merge and ranking.
//!
//! Both modes re-poll every configured account from scratch. Accounts are
//! polled concurrently within the caller's task and their results collected
//! in configuration order before any sorting or selection happens.
//!
//! # Example
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
//!         .build()?,
//! );
//! let aggregator = Aggregator::new(Arc::clone(&config), ImapConnector::new(config));
//!
//! if let Some(best) = aggregator.best_code().await {
//!     println!("{} from {}", best.code.code, best.address);
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::freshness::FreshnessFilter;
use crate::mailbox::MailboxConnector;
use crate::model::{AccountResult, AggregateView, BestCode};
use crate::poller::AccountPoller;
use chrono::{DateTime, Local};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, instrument};

/// Runs the account poller across all accounts and ranks the results.
#[derive(Debug)]
pub struct Aggregator<C> {
    config: Arc<Config>,
    poller: AccountPoller<C>,
    freshness: FreshnessFilter,
}

impl<C: MailboxConnector> Aggregator<C> {
    /// Creates an aggregator over the accounts in `config`.
    #[must_use]
    pub fn new(config: Arc<Config>, connector: C) -> Self {
        Self {
            poller: AccountPoller::new(Arc::clone(&config), connector),
            freshness: FreshnessFilter::new(config.code_ttl),
            config,
        }
    }

    /// The configuration this aggregator polls with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Polls every account and returns all results, newest first, together with
    /// the best current code judged against a single `now`.
    #[instrument(
        name = "Aggregator::listing",
        skip(self),
        fields(accounts = self.config.accounts().len())
    )]
    pub async fn listing(&self) -> AggregateView {
        let results = self.poll_all().await;
        let polled_at = Local::now();
        let best = select_best(&results, &self.freshness, polled_at);
        let entries = sort_listing(results);

        info!(
            with_code = entries.iter().filter(|e| e.code().is_some()).count(),
            has_best = best.is_some(),
            "Listing built"
        );

        AggregateView {
            polled_at,
            entries,
            best,
        }
    }

    /// Polls every account and returns the freshest code still within the TTL.
    #[instrument(
        name = "Aggregator::best_code",
        skip(self),
        fields(accounts = self.config.accounts().len())
    )]
    pub async fn best_code(&self) -> Option<BestCode> {
        let results = self.poll_all().await;
        let best = select_best(&results, &self.freshness, Local::now());

        match &best {
            Some(b) => info!(email = %b.address, timestamp = %b.code.timestamp, "Best code selected"),
            None => info!("No valid code"),
        }

        best
    }

    /// One result per account, in configuration order.
    async fn poll_all(&self) -> Vec<AccountResult> {
        join_all(
            self.config
                .accounts()
                .iter()
                .map(|account| self.poller.poll(account)),
        )
        .await
    }
}

/// Sorts by timestamp descending; accounts without a code go last. The sort is
/// stable, so ties keep configuration order.
#[must_use]
pub fn sort_listing(mut results: Vec<AccountResult>) -> Vec<AccountResult> {
    // `None` orders below every `Some`, so a descending sort puts absent entries last.
    results.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
    results
}

/// Picks the fresh result with the latest timestamp. On a tie the earliest entry wins.
#[must_use]
pub fn select_best(
    results: &[AccountResult],
    freshness: &FreshnessFilter,
    now: DateTime<Local>,
) -> Option<BestCode> {
    let mut best: Option<&AccountResult> = None;

    for result in results {
        let Some(timestamp) = result.timestamp() else {
            continue;
        };
        if !freshness.is_fresh(Some(timestamp), now) {
            continue;
        }
        let newer = match best {
            Some(current) => current.timestamp() < Some(timestamp),
            None => true,
        };
        if newer {
            best = Some(result);
        }
    }

    best.and_then(|result| {
        result.extracted().map(|code| BestCode {
            address: result.address.clone(),
            code: code.clone(),
        })
    })
}
