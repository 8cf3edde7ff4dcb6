//! HTTP status codes and status code ranges

use serde::{Serialize, Serializer};
use std::fmt;

use crate::primitive::{Kind, PrimitiveError};

/// An HTTP status code (100-599)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const FORBIDDEN: StatusCode = StatusCode(403);

    pub fn parse(raw: &str) -> Result<Self, PrimitiveError> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PrimitiveError::pattern(Kind::StatusCode, raw));
        }
        match raw.parse::<i64>() {
            Ok(code) => Self::from_int(code),
            Err(_) => Err(PrimitiveError::range(Kind::StatusCode, raw)),
        }
    }

    pub fn from_int(code: i64) -> Result<Self, PrimitiveError> {
        if (100..=599).contains(&code) {
            Ok(Self(code as u16))
        } else {
            Err(PrimitiveError::range(Kind::StatusCode, code.to_string()))
        }
    }

    pub fn get(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single status code or an inclusive `low-high` range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCodeRange {
    pub low: StatusCode,
    pub high: StatusCode,
}

impl StatusCodeRange {
    pub fn parse(raw: &str) -> Result<Self, PrimitiveError> {
        let (low, high) = match raw.split_once('-') {
            Some((low, high)) => (Self::bound(raw, low)?, Self::bound(raw, high)?),
            None => {
                let code = Self::bound(raw, raw)?;
                (code, code)
            }
        };
        if low > high {
            return Err(PrimitiveError::range(Kind::StatusCodeRange, raw));
        }
        Ok(Self { low, high })
    }

    pub fn from_int(code: i64) -> Result<Self, PrimitiveError> {
        let code = StatusCode::from_int(code)
            .map_err(|_| PrimitiveError::range(Kind::StatusCodeRange, code.to_string()))?;
        Ok(Self {
            low: code,
            high: code,
        })
    }

    fn bound(raw: &str, part: &str) -> Result<StatusCode, PrimitiveError> {
        StatusCode::parse(part).map_err(|e| match e {
            PrimitiveError::Range { .. } => PrimitiveError::range(Kind::StatusCodeRange, raw),
            PrimitiveError::Pattern { .. } => PrimitiveError::pattern(Kind::StatusCodeRange, raw),
        })
    }

    pub fn contains(&self, code: u16) -> bool {
        (self.low.get()..=self.high.get()).contains(&code)
    }
}

impl fmt::Display for StatusCodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.low == self.high {
            write!(f, "{}", self.low)
        } else {
            write!(f, "{}-{}", self.low, self.high)
        }
    }
}

impl Serialize for StatusCodeRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.low == self.high {
            self.low.serialize(serializer)
        } else {
            serializer.collect_str(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code() {
        assert_eq!(StatusCode::parse("404").unwrap().get(), 404);
        assert!(matches!(StatusCode::parse("99"), Err(PrimitiveError::Range { .. })));
        assert!(matches!(StatusCode::from_int(600), Err(PrimitiveError::Range { .. })));
        assert!(matches!(StatusCode::parse("4xx"), Err(PrimitiveError::Pattern { .. })));
    }

    #[test]
    fn test_status_code_range() {
        let range = StatusCodeRange::parse("200-299").unwrap();
        assert!(range.contains(204));
        assert!(!range.contains(301));
        assert_eq!(range.to_string(), "200-299");

        let single = StatusCodeRange::parse("404").unwrap();
        assert_eq!(single.low, single.high);
        assert_eq!(serde_json::to_string(&single).unwrap(), "404");
        assert_eq!(serde_json::to_string(&range).unwrap(), "\"200-299\"");
    }

    #[test]
    fn test_status_code_range_order() {
        let err = StatusCodeRange::parse("500-400").unwrap_err();
        assert!(matches!(err, PrimitiveError::Range { kind: Kind::StatusCodeRange, .. }));
        assert!(StatusCodeRange::parse("200-").is_err());
        assert!(StatusCodeRange::parse("200-300-400").is_err());
    }
}
