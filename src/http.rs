//! HTTP front end: an HTML dashboard and a JSON endpoint for automation.
//!
//! Every request triggers a fresh poll of all accounts. Absent codes and
//! timestamps are rendered with placeholders here; the core only ever reports
//! them as `None`.
//!
//! - `GET /`: table of every account, newest code first
//! - `GET /latest-code`: the freshest code still within the TTL
//! - `GET /health`: liveness and account count

use crate::aggregator::Aggregator;
use crate::mailbox::MailboxConnector;
use crate::model::{AggregateView, BestCode};
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;

/// Shown in the code column when an account has no code.
pub const CODE_PLACEHOLDER: &str = "------";
/// Shown in the time column when an account has no code.
pub const TIME_PLACEHOLDER: &str = "\u{2014}";
/// Body of `/latest-code` when no account holds a fresh code.
pub const NO_CODE_MESSAGE: &str = "No valid codes found";

const DASHBOARD_TIME_FORMAT: &str = "%Y-%m-%d %I:%M:%S %p";
const API_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Build the axum router with all routes.
pub fn build_router<C>(aggregator: Arc<Aggregator<C>>) -> Router
where
    C: MailboxConnector + 'static,
{
    Router::new()
        .route("/", get(dashboard_handler::<C>))
        .route("/latest-code", get(latest_code_handler::<C>))
        .route("/health", get(health_handler::<C>))
        .with_state(aggregator)
}

/// JSON body of `GET /latest-code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LatestCodeResponse {
    /// A fresh code was found.
    Found {
        /// Account the code was found in.
        email: String,
        /// The code digits.
        code: String,
        /// Local time of the source message, `%Y-%m-%d %H:%M:%S`.
        timestamp: String,
    },
    /// No account holds a fresh code.
    Missing {
        /// Human-readable explanation.
        message: String,
    },
}

impl From<Option<BestCode>> for LatestCodeResponse {
    fn from(best: Option<BestCode>) -> Self {
        match best {
            Some(best) => LatestCodeResponse::Found {
                email: best.address,
                timestamp: best.code.timestamp.format(API_TIME_FORMAT).to_string(),
                code: best.code.code,
            },
            None => LatestCodeResponse::Missing {
                message: NO_CODE_MESSAGE.to_string(),
            },
        }
    }
}

async fn dashboard_handler<C: MailboxConnector>(
    State(aggregator): State<Arc<Aggregator<C>>>,
) -> impl IntoResponse {
    let view = aggregator.listing().await;
    Html(render_dashboard(&view))
}

async fn latest_code_handler<C: MailboxConnector>(
    State(aggregator): State<Arc<Aggregator<C>>>,
) -> impl IntoResponse {
    let best = aggregator.best_code().await;
    Json(LatestCodeResponse::from(best))
}

async fn health_handler<C: MailboxConnector>(
    State(aggregator): State<Arc<Aggregator<C>>>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "accounts": aggregator.config().accounts().len(),
    }))
}

/// Renders the listing as a standalone HTML page.
#[must_use]
pub fn render_dashboard(view: &AggregateView) -> String {
    let mut rows = String::new();
    for entry in &view.entries {
        let code = entry.code().unwrap_or(CODE_PLACEHOLDER);
        let time = entry.timestamp().map_or_else(
            || TIME_PLACEHOLDER.to_string(),
            |ts| ts.format(DASHBOARD_TIME_FORMAT).to_string(),
        );
        let class = if entry.code().is_some() { "found" } else { "absent" };
        rows.push_str(&format!(
            "      <tr class=\"{class}\"><td>{}</td><td class=\"code\">{}</td><td>{}</td></tr>\n",
            escape_html(&entry.address),
            escape_html(code),
            escape_html(&time),
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Verification codes</title>
  <style>
    body {{ font-family: sans-serif; margin: 2rem; }}
    table {{ border-collapse: collapse; }}
    th, td {{ padding: 0.4rem 1rem; border-bottom: 1px solid #ddd; text-align: left; }}
    td.code {{ font-family: monospace; font-size: 1.2rem; }}
    tr.absent td {{ color: #999; }}
  </style>
</head>
<body>
  <h1>Verification codes</h1>
  <p>Polled at {polled_at}</p>
  <table>
    <thead>
      <tr><th>Inbox</th><th>Code</th><th>Received</th></tr>
    </thead>
    <tbody>
{rows}    </tbody>
  </table>
</body>
</html>
"#,
        polled_at = view.polled_at.format(DASHBOARD_TIME_FORMAT),
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
