//! Domain primitives: TimeMs, UserId, Symbol, Side.

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Get the underlying milliseconds value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Returns true if the timestamp is representable as a chrono instant.
    ///
    /// Timestamps outside chrono's range cannot be bucketed to a calendar
    /// day and are rejected at row validation.
    pub fn is_representable(&self) -> bool {
        DateTime::from_timestamp_millis(self.0).is_some()
    }

    /// The calendar date of this instant in the given timezone.
    ///
    /// Returns `None` for timestamps outside chrono's representable range;
    /// validated executions never hit that path.
    pub fn date_in(&self, tz: Tz) -> Option<NaiveDate> {
        DateTime::from_timestamp_millis(self.0).map(|utc| utc.with_timezone(&tz).date_naive())
    }
}

/// Journal user identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Create a UserId from a string.
    pub fn new(id: String) -> Self {
        UserId(id)
    }

    /// Get the user id as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ticker symbol (e.g., "AAPL", "BTC").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    /// Create a Symbol from a string.
    pub fn new(symbol: String) -> Self {
        Symbol(symbol)
    }

    /// Get the symbol as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade side: Buy or Sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy side (adds long exposure).
    Buy,
    /// Sell side (adds short exposure).
    Sell,
}

impl Side {
    /// Get the signed multiplier for this side (+1 for Buy, -1 for Sell).
    pub fn sign(&self) -> i32 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}
