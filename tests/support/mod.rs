//! Scripted in-memory mailboxes for driving the poller and aggregator.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Local};
use otp_inbox::mailbox::{MailboxConnector, MailboxSession};
use otp_inbox::{Account, CandidateMessage, Config, Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SENDER: &str = "ticketmaster.com";

/// One message in a scripted mailbox.
#[derive(Debug, Clone)]
pub struct Scripted {
    pub from: String,
    pub timestamp: DateTime<Local>,
    pub body: String,
    /// Fetching this message fails with a parse error.
    pub malformed: bool,
    /// Fetching this message never completes.
    pub hangs: bool,
}

impl Scripted {
    pub fn from_sender(timestamp: DateTime<Local>, body: &str) -> Self {
        Self {
            from: format!("Vendor <noreply@{SENDER}>"),
            timestamp,
            body: body.to_string(),
            malformed: false,
            hangs: false,
        }
    }

    pub fn from_other(timestamp: DateTime<Local>, body: &str) -> Self {
        Self {
            from: "friend@example.org".into(),
            ..Self::from_sender(timestamp, body)
        }
    }

    #[must_use]
    pub fn malformed(mut self) -> Self {
        self.malformed = true;
        self
    }

    #[must_use]
    pub fn hangs(mut self) -> Self {
        self.hangs = true;
        self
    }
}

/// How a scripted account behaves on connect.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Connects and serves these messages, oldest first.
    Serve(Vec<Scripted>),
    /// Login is rejected.
    RejectLogin,
    /// TCP connect is refused.
    Unreachable,
    /// Connect never completes.
    Hang,
    /// Connects, but the sender search never completes.
    HangOnSearch,
    /// Waits this long on connect, then behaves as the inner script.
    Delayed(Duration, Box<Behavior>),
}

/// What happened during polling, shared across every session a connector opens.
#[derive(Debug, Default)]
pub struct Journal {
    pub fetched: Vec<(String, u32)>,
    pub logouts: Vec<String>,
    pub connects: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ScriptedConnector {
    accounts: Arc<HashMap<String, Behavior>>,
    pub journal: Arc<Mutex<Journal>>,
}

impl ScriptedConnector {
    pub fn new<I, S>(accounts: I) -> Self
    where
        I: IntoIterator<Item = (S, Behavior)>,
        S: Into<String>,
    {
        Self {
            accounts: Arc::new(
                accounts
                    .into_iter()
                    .map(|(address, behavior)| (address.into(), behavior))
                    .collect(),
            ),
            journal: Arc::new(Mutex::new(Journal::default())),
        }
    }

    pub fn fetched_uids(&self, address: &str) -> Vec<u32> {
        self.journal
            .lock()
            .unwrap()
            .fetched
            .iter()
            .filter(|(a, _)| a == address)
            .map(|(_, uid)| *uid)
            .collect()
    }

    pub fn logouts(&self, address: &str) -> usize {
        self.journal
            .lock()
            .unwrap()
            .logouts
            .iter()
            .filter(|a| *a == address)
            .count()
    }
}

#[async_trait]
impl MailboxConnector for ScriptedConnector {
    type Session = ScriptedSession;

    async fn connect_and_select(&self, account: &Account) -> Result<ScriptedSession> {
        let address = account.address().to_string();
        self.journal.lock().unwrap().connects.push(address.clone());

        let mut behavior = self.accounts.get(&address);
        while let Some(Behavior::Delayed(delay, inner)) = behavior {
            tokio::time::sleep(*delay).await;
            behavior = Some(&**inner);
        }

        match behavior {
            Some(Behavior::Serve(messages)) => Ok(ScriptedSession {
                address,
                messages: messages.clone(),
                search_hangs: false,
                journal: Arc::clone(&self.journal),
            }),
            Some(Behavior::HangOnSearch) => Ok(ScriptedSession {
                address,
                messages: Vec::new(),
                search_hangs: true,
                journal: Arc::clone(&self.journal),
            }),
            Some(Behavior::RejectLogin) => Err(Error::ImapLogin {
                email: address,
                source: async_imap::error::Error::No(
                    "[AUTHENTICATIONFAILED] Invalid credentials".into(),
                ),
            }),
            Some(Behavior::Hang) => std::future::pending().await,
            Some(Behavior::Unreachable | Behavior::Delayed(..)) | None => Err(Error::TcpConnect {
                target: "imap.example.com:993".into(),
                source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
            }),
        }
    }
}

#[derive(Debug)]
pub struct ScriptedSession {
    address: String,
    messages: Vec<Scripted>,
    search_hangs: bool,
    journal: Arc<Mutex<Journal>>,
}

impl ScriptedSession {
    /// UIDs start at 1 in mailbox order.
    fn message(&self, uid: u32) -> Option<&Scripted> {
        let index = usize::try_from(uid).ok()?.checked_sub(1)?;
        self.messages.get(index)
    }
}

#[async_trait]
impl MailboxSession for ScriptedSession {
    async fn search_sender(&mut self, sender: &str) -> Result<Vec<u32>> {
        if self.search_hangs {
            std::future::pending::<()>().await;
        }
        Ok((1..)
            .zip(&self.messages)
            .filter(|(_, m)| m.from.contains(sender))
            .map(|(uid, _)| uid)
            .collect())
    }

    async fn fetch_message(&mut self, uid: u32) -> Result<CandidateMessage> {
        self.journal
            .lock()
            .unwrap()
            .fetched
            .push((self.address.clone(), uid));

        let message = self
            .message(uid)
            .cloned()
            .ok_or(Error::MessageMissing { uid })?;

        if message.hangs {
            std::future::pending::<()>().await;
        }
        if message.malformed {
            return Err(Error::InvalidDate {
                uid,
                reason: "missing Date header".into(),
            });
        }

        Ok(CandidateMessage {
            uid,
            timestamp: message.timestamp,
            body: message.body,
        })
    }

    async fn logout(&mut self) -> Result<()> {
        self.journal
            .lock()
            .unwrap()
            .logouts
            .push(self.address.clone());
        Ok(())
    }
}

pub fn ago(secs: i64) -> DateTime<Local> {
    Local::now() - ChronoDuration::seconds(secs)
}

/// Config over the given addresses with the default sender, TTL and window.
pub fn config_for(addresses: &[&str]) -> Arc<Config> {
    let mut builder = Config::builder()
        .sender_filter(SENDER)
        .account_timeout(Duration::from_secs(5));
    for address in addresses {
        builder = builder.account(*address, "app-password");
    }
    Arc::new(builder.build().expect("valid test config"))
}
