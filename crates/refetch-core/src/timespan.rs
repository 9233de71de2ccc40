// ── Time-span normalization ──
//
// Intervals are written either as raw milliseconds or as `"<amount> <unit>"`
// expressions ("2 sec", "1 min"). Everything is normalized to milliseconds;
// a non-positive or NaN result means "timer disabled".

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const SECOND: f64 = 1_000.0;
const MINUTE: f64 = 60.0 * SECOND;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;
const WEEK: f64 = 7.0 * DAY;
const MONTH: f64 = 30.44 * DAY;
const YEAR: f64 = 365.0 * DAY;

/// A human-friendly duration: raw milliseconds or an `"<amount> <unit>"` expression.
///
/// Recognized units: `ms`, `sec`, `min`, `h`, `d`, `we` (week),
/// `mo` (month, 30.44 days), `y` (year, 365 days).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeSpan {
    Millis(f64),
    Expr(String),
}

impl TimeSpan {
    /// Normalize to milliseconds. May be `NaN` for a malformed amount.
    pub fn as_millis(&self) -> f64 {
        match self {
            Self::Millis(ms) => *ms,
            Self::Expr(expr) => normalize(expr),
        }
    }

    /// The span as a timer period, or `None` when the timer should be disabled
    /// (`NaN`, zero, negative, or unrepresentable).
    pub fn as_duration(&self) -> Option<Duration> {
        let ms = self.as_millis();
        if ms.is_nan() || ms <= 0.0 {
            return None;
        }
        Duration::try_from_secs_f64(ms / SECOND).ok()
    }
}

/// Convert an `"<amount> <unit>"` expression into milliseconds.
///
/// An unknown (or missing) unit returns the amount unconverted; an amount
/// that is not a number yields `NaN`.
pub fn normalize(expr: &str) -> f64 {
    let mut parts = expr.split_whitespace();
    let amount = parts
        .next()
        .and_then(|a| a.parse::<f64>().ok())
        .unwrap_or(f64::NAN);

    let factor = match parts.next() {
        Some("ms") => 1.0,
        Some("sec") => SECOND,
        Some("min") => MINUTE,
        Some("h") => HOUR,
        Some("d") => DAY,
        Some("we") => WEEK,
        Some("mo") => MONTH,
        Some("y") => YEAR,
        _ => 1.0,
    };

    amount * factor
}

impl FromStr for TimeSpan {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::Expr(s.to_owned()))
    }
}

impl From<&str> for TimeSpan {
    fn from(s: &str) -> Self {
        Self::Expr(s.to_owned())
    }
}

impl From<String> for TimeSpan {
    fn from(s: String) -> Self {
        Self::Expr(s)
    }
}

impl From<f64> for TimeSpan {
    fn from(ms: f64) -> Self {
        Self::Millis(ms)
    }
}

impl From<Duration> for TimeSpan {
    fn from(d: Duration) -> Self {
        Self::Millis(d.as_secs_f64() * SECOND)
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Millis(ms) => write!(f, "{ms} ms"),
            Self::Expr(expr) => f.write_str(expr),
        }
    }
}
