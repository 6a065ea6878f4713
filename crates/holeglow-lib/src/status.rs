//! Pi-hole status API client: trait + blocking HTTP backend.
//!
//! Two calls make up a status poll: the basic call (blocking state and
//! blocklist size) and the `summaryRaw` call (today's query statistics).
//! Any transport failure, non-200 response or malformed body becomes a
//! [`StatusError`]; callers treat it as "no status this cycle".

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::snapshot::{BlockerState, StatusReport};

/// Per-request timeout for status API calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

// ── Error type ──

#[derive(Debug, Clone, PartialEq)]
pub enum StatusError {
    /// HTTP client could not be constructed.
    Client(String),
    /// Connection refused, DNS failure, etc.
    Connect(String),
    Timeout,
    /// Server answered with a non-200 status code.
    Http(u16),
    /// Body was not the expected JSON object.
    Malformed(String),
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusError::Client(e) => write!(f, "HTTP client error: {e}"),
            StatusError::Connect(e) => write!(f, "Cannot connect to status API: {e}"),
            StatusError::Timeout => write!(f, "Status API request timed out"),
            StatusError::Http(code) => write!(f, "Status API returned HTTP {code}"),
            StatusError::Malformed(e) => write!(f, "Malformed status API response: {e}"),
        }
    }
}

impl std::error::Error for StatusError {}

impl From<reqwest::Error> for StatusError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StatusError::Timeout
        } else if let Some(code) = e.status() {
            StatusError::Http(code.as_u16())
        } else if e.is_decode() {
            StatusError::Malformed(e.to_string())
        } else {
            StatusError::Connect(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, StatusError>;

// ── Trait ──

/// Source of ad-blocker status.
pub trait StatusSource {
    /// Fetch status and today's statistics.
    fn fetch(&self) -> Result<StatusReport>;

    /// Check that the API answers with HTTP 200.
    fn ping(&self) -> Result<()>;
}

// ── Response parsing ──

/// Lenient numeric fields: numbers, numeric strings ("1,234"), null or missing.
mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn number(v: &Value) -> Option<f64> {
        match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace(',', "").parse().ok(),
            Value::Null => Some(0.0),
            _ => None,
        }
    }

    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        let v = Value::deserialize(d)?;
        number(&v)
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n as u64)
            .ok_or_else(|| D::Error::custom(format!("expected a count, got {v}")))
    }

    pub fn percent<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        let v = Value::deserialize(d)?;
        number(&v)
            .filter(|n| n.is_finite())
            .ok_or_else(|| D::Error::custom(format!("expected a percentage, got {v}")))
    }
}

#[derive(Debug, Deserialize)]
struct BasicResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    domains_being_blocked: u64,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default, deserialize_with = "lenient::count")]
    dns_queries_today: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    ads_blocked_today: u64,
    #[serde(default, deserialize_with = "lenient::percent")]
    ads_percentage_today: f64,
    #[serde(default, deserialize_with = "lenient::count")]
    unique_clients: u64,
}

/// Parse a body that must be a JSON object.
///
/// Pi-hole answers `[]` when the API token is missing or wrong, which
/// would otherwise deserialize as an all-default struct.
fn parse_object<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| StatusError::Malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(StatusError::Malformed(format!(
            "expected a JSON object, got {} (is the API token set?)",
            json_kind(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| StatusError::Malformed(e.to_string()))
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Combine the basic and summary bodies into a report.
pub fn parse_report(basic: &str, summary: &str) -> Result<StatusReport> {
    let basic: BasicResponse = parse_object(basic)?;
    let summary: SummaryResponse = parse_object(summary)?;
    Ok(StatusReport {
        state: basic
            .status
            .as_deref()
            .map(BlockerState::from_status)
            .unwrap_or(BlockerState::Unknown),
        domains_blocked: basic.domains_being_blocked,
        queries_today: summary.dns_queries_today,
        blocked_today: summary.ads_blocked_today,
        percent_blocked: summary.ads_percentage_today,
        clients: summary.unique_clients,
    })
}

// ── HTTP backend ──

/// Blocking client for the Pi-hole `api.php` endpoint.
#[derive(Debug, Clone)]
pub struct PiholeClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_token: String,
}

impl PiholeClient {
    pub fn new(base_url: &str, api_token: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StatusError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim().to_string(),
            api_token: api_token.trim().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request URL with the given query parameters (plus `auth`
    /// when a token is configured).
    fn url(&self, params: &[&str]) -> String {
        let auth = (!self.api_token.is_empty()).then(|| format!("auth={}", self.api_token));
        let query: Vec<&str> = params
            .iter()
            .copied()
            .chain(auth.as_deref())
            .collect();
        if query.is_empty() {
            return self.base_url.clone();
        }
        let sep = if self.base_url.contains('?') { '&' } else { '?' };
        format!("{}{sep}{}", self.base_url, query.join("&"))
    }

    fn get(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(StatusError::Http(status.as_u16()));
        }
        Ok(resp.text()?)
    }
}

impl StatusSource for PiholeClient {
    fn fetch(&self) -> Result<StatusReport> {
        let basic = self.get(&self.url(&[]))?;
        let summary = self.get(&self.url(&["summaryRaw"]))?;
        parse_report(&basic, &summary)
    }

    fn ping(&self) -> Result<()> {
        self.get(&self.url(&[])).map(|_| ())
    }
}

// ── Scripted source for testing ──

/// Scripted status source for unit and integration tests.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Returns queued results in order; the last one repeats forever.
    pub struct ScriptedStatus {
        responses: RefCell<VecDeque<Result<StatusReport>>>,
        pub fetches: std::cell::Cell<usize>,
    }

    impl ScriptedStatus {
        pub fn sequence(responses: Vec<Result<StatusReport>>) -> Self {
            assert!(!responses.is_empty(), "script needs at least one response");
            Self {
                responses: RefCell::new(responses.into()),
                fetches: std::cell::Cell::new(0),
            }
        }

        pub fn always(response: Result<StatusReport>) -> Self {
            Self::sequence(vec![response])
        }
    }

    impl StatusSource for ScriptedStatus {
        fn fetch(&self) -> Result<StatusReport> {
            self.fetches.set(self.fetches.get() + 1);
            let mut queue = self.responses.borrow_mut();
            if queue.len() > 1 {
                queue.pop_front().unwrap_or(Err(StatusError::Timeout))
            } else {
                queue.front().cloned().unwrap_or(Err(StatusError::Timeout))
            }
        }

        fn ping(&self) -> Result<()> {
            self.responses
                .borrow()
                .front()
                .cloned()
                .unwrap_or(Err(StatusError::Timeout))
                .map(|_| ())
        }
    }
}
