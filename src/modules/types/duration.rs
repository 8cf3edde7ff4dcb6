//! Duration literals (`1h30m`, `500ms`, ...)

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::primitive::{Kind, PrimitiveError};

/// Regex pattern for a complete duration literal
static DURATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+(ms|s|m|h))+$").unwrap());

/// Regex pattern for one `<integer><unit>` pair
static DURATION_PART: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)(ms|s|m|h)").unwrap());

const MILLIS_PER_SECOND: u64 = 1_000;
const MILLIS_PER_MINUTE: u64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: u64 = 60 * MILLIS_PER_MINUTE;

/// A validated, millisecond-precision duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(std::time::Duration);

impl Duration {
    pub const fn from_secs(secs: u64) -> Self {
        Self(std::time::Duration::from_secs(secs))
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self(std::time::Duration::from_millis(millis))
    }

    /// Parse a duration literal such as `1h30m` or `250ms`
    pub fn parse(raw: &str) -> Result<Self, PrimitiveError> {
        if !DURATION_PATTERN.is_match(raw) {
            return Err(PrimitiveError::pattern(Kind::Duration, raw));
        }

        let mut total: u64 = 0;
        for cap in DURATION_PART.captures_iter(raw) {
            let amount: u64 = cap[1]
                .parse()
                .map_err(|_| PrimitiveError::range(Kind::Duration, raw))?;
            let unit = match &cap[2] {
                "ms" => 1,
                "s" => MILLIS_PER_SECOND,
                "m" => MILLIS_PER_MINUTE,
                _ => MILLIS_PER_HOUR,
            };
            total = amount
                .checked_mul(unit)
                .and_then(|millis| total.checked_add(millis))
                .ok_or_else(|| PrimitiveError::range(Kind::Duration, raw))?;
        }

        Ok(Self::from_millis(total))
    }

    pub fn as_std(&self) -> std::time::Duration {
        self.0
    }

    pub fn as_millis(&self) -> u64 {
        // Parsed durations are built from u64 milliseconds, so this never truncates.
        self.0.as_millis() as u64
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<Duration> for std::time::Duration {
    fn from(value: Duration) -> Self {
        value.0
    }
}

impl fmt::Display for Duration {
    /// Normalized form: largest units first, zero parts omitted, `0s` for zero
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut millis = self.as_millis();
        if millis == 0 {
            return f.write_str("0s");
        }
        for (unit, size) in [
            ("h", MILLIS_PER_HOUR),
            ("m", MILLIS_PER_MINUTE),
            ("s", MILLIS_PER_SECOND),
            ("ms", 1),
        ] {
            let amount = millis / size;
            if amount > 0 {
                write!(f, "{}{}", amount, unit)?;
                millis %= size;
            }
        }
        Ok(())
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
