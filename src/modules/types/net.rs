//! Network scalar types: CIDRs, ports and stream port pairs

use ipnet::IpNet;
use serde::{Serialize, Serializer};
use std::fmt;
use std::net::IpAddr;

use crate::primitive::{Kind, PrimitiveError};

/// An IPv4/IPv6 network. Bare addresses are stored as host networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cidr(IpNet);

impl Cidr {
    pub fn parse(raw: &str) -> Result<Self, PrimitiveError> {
        let Some((addr, prefix)) = raw.split_once('/') else {
            let addr: IpAddr = raw
                .parse()
                .map_err(|_| PrimitiveError::pattern(Kind::Cidr, raw))?;
            return Ok(Self(IpNet::from(addr)));
        };

        // The address family decides which prefix lengths are legal.
        let addr: IpAddr = addr
            .parse()
            .map_err(|_| PrimitiveError::pattern(Kind::Cidr, raw))?;
        if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PrimitiveError::pattern(Kind::Cidr, raw));
        }
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| PrimitiveError::range(Kind::Cidr, raw))?;

        IpNet::new(addr, prefix)
            .map(Self)
            .map_err(|_| PrimitiveError::range(Kind::Cidr, raw))
    }

    pub fn net(&self) -> &IpNet {
        &self.0
    }

    pub fn contains(&self, addr: &IpAddr) -> bool {
        self.0.contains(addr)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Cidr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A TCP/UDP port number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Port(u16);

impl Port {
    pub const fn new(port: u16) -> Self {
        Self(port)
    }

    /// Parse the string form of a port
    pub fn parse(raw: &str) -> Result<Self, PrimitiveError> {
        let digits = raw.strip_prefix('-').unwrap_or(raw);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PrimitiveError::pattern(Kind::Port, raw));
        }
        match raw.parse::<i64>() {
            Ok(value) => Self::from_int(value),
            Err(_) => Err(PrimitiveError::range(Kind::Port, raw)),
        }
    }

    /// Range-check an integer port; out of range is an error, never a clamp
    pub fn from_int(value: i64) -> Result<Self, PrimitiveError> {
        u16::try_from(value)
            .map(Self)
            .map_err(|_| PrimitiveError::range(Kind::Port, value.to_string()))
    }

    pub fn get(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `[listening:]target` port pair of a stream route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamPort {
    pub listening: Port,
    pub target: Port,
}

impl StreamPort {
    pub fn parse(raw: &str) -> Result<Self, PrimitiveError> {
        let parts: Vec<&str> = raw.split(':').collect();
        let (listening, target) = match parts.as_slice() {
            [target] => (Port::new(0), Self::part(raw, target)?),
            [listening, target] => (Self::part(raw, listening)?, Self::part(raw, target)?),
            _ => return Err(PrimitiveError::pattern(Kind::StreamPort, raw)),
        };
        Ok(Self { listening, target })
    }

    fn part(raw: &str, part: &str) -> Result<Port, PrimitiveError> {
        Port::parse(part).map_err(|e| match e {
            PrimitiveError::Range { .. } => PrimitiveError::range(Kind::StreamPort, raw),
            PrimitiveError::Pattern { .. } => PrimitiveError::pattern(Kind::StreamPort, raw),
        })
    }
}

impl fmt::Display for StreamPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.listening, self.target)
    }
}

impl Serialize for StreamPort {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cidr_bare_addresses() {
        assert_eq!(Cidr::parse("127.0.0.1").unwrap().to_string(), "127.0.0.1/32");
        assert_eq!(Cidr::parse("::1").unwrap().to_string(), "::1/128");
    }

    #[test]
    fn test_cidr_prefix_depends_on_family() {
        assert!(Cidr::parse("10.0.0.0/8").is_ok());
        assert!(Cidr::parse("fd00::/64").is_ok());
        assert!(Cidr::parse("fd00::/120").is_ok());
        assert!(matches!(
            Cidr::parse("10.0.0.0/33"),
            Err(PrimitiveError::Range { .. })
        ));
        assert!(matches!(
            Cidr::parse("10.0.0.0/abc"),
            Err(PrimitiveError::Pattern { .. })
        ));
        assert!(Cidr::parse("10.0.0/8").is_err());
    }

    #[test]
    fn test_cidr_contains() {
        let cidr = Cidr::parse("192.168.0.0/16").unwrap();
        assert!(cidr.contains(&"192.168.4.2".parse().unwrap()));
        assert!(!cidr.contains(&"10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn test_port_bounds() {
        assert_eq!(Port::parse("0").unwrap().get(), 0);
        assert_eq!(Port::parse("65535").unwrap().get(), 65535);
        assert!(matches!(Port::parse("65536"), Err(PrimitiveError::Range { .. })));
        assert!(matches!(Port::parse("-1"), Err(PrimitiveError::Range { .. })));
        assert!(matches!(Port::parse("http"), Err(PrimitiveError::Pattern { .. })));
        assert!(matches!(Port::from_int(70000), Err(PrimitiveError::Range { .. })));
    }

    #[test]
    fn test_stream_port() {
        let port = StreamPort::parse("2222:22").unwrap();
        assert_eq!(port.listening.get(), 2222);
        assert_eq!(port.target.get(), 22);
        assert_eq!(StreamPort::parse("53").unwrap().to_string(), "0:53");
        assert!(matches!(
            StreamPort::parse("1:99999"),
            Err(PrimitiveError::Range { kind: Kind::StreamPort, .. })
        ));
        assert!(StreamPort::parse("1:2:3").is_err());
    }
}
