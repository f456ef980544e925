//! Source address canonicalisation
//!
//! Equivalent spellings of one network address collapse to a single identity
//! before any check looks at them:
//!
//! - IPv6 loopback `::1` becomes IPv4 loopback `127.0.0.1`
//! - IPv4-mapped IPv6 (`::ffff:a.b.c.d`) becomes the plain IPv4 address
//!
//! The canonical textual form doubles as the rate-limit key, and the
//! big-endian byte encoding is what IP ranges are compared against.
use std::{
    fmt,
    net::{IpAddr, Ipv4Addr},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }

    /// The numeric tag used in storage (4 or 6).
    pub fn as_i64(&self) -> i64 {
        match self {
            IpVersion::V4 => 4,
            IpVersion::V6 => 6,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            4 => Some(IpVersion::V4),
            6 => Some(IpVersion::V6),
            _ => None,
        }
    }
}

/// A canonicalised client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceAddress(IpAddr);

impl SourceAddress {
    pub fn new(addr: IpAddr) -> Self {
        Self(canonicalize(addr))
    }

    /// Parse textual IPv4 or IPv6, then canonicalise.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        text.trim()
            .parse::<IpAddr>()
            .map(Self::new)
            .map_err(|_| ValidationError::InvalidAddress(text.to_string()))
    }

    pub fn ip(&self) -> IpAddr {
        self.0
    }

    pub fn version(&self) -> IpVersion {
        IpVersion::of(&self.0)
    }

    /// Big-endian bytes of the address: 4 bytes for IPv4, 16 for IPv6.
    ///
    /// Byte-wise ordering of two encodings of the same family equals numeric
    /// ordering of the addresses.
    pub fn encoded(&self) -> Vec<u8> {
        encode(&self.0)
    }

    /// Identity used as the rate-limit key.
    pub fn key(&self) -> String {
        self.0.to_string()
    }
}

impl From<IpAddr> for SourceAddress {
    fn from(addr: IpAddr) -> Self {
        Self::new(addr)
    }
}

impl FromStr for SourceAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Collapse equivalent address spellings to one identity.
pub fn canonicalize(addr: IpAddr) -> IpAddr {
    match addr {
        IpAddr::V6(v6) if v6.is_loopback() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        },
        v4 => v4,
    }
}

/// Big-endian byte encoding of an address.
pub fn encode(addr: &IpAddr) -> Vec<u8> {
    match addr {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    }
}

/// Inverse of [`encode`]. Returns `None` for lengths other than 4 or 16.
pub fn decode(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().ok()?;
            Some(IpAddr::from(octets))
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().ok()?;
            Some(IpAddr::from(octets))
        }
        _ => None,
    }
}

/// Numeric value of an address, for in-memory range comparisons.
pub fn as_u128(addr: &IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u32::from(*v4) as u128,
        IpAddr::V6(v6) => u128::from(*v6),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_forms_share_an_identity() {
        let v6 = SourceAddress::parse("::1").unwrap();
        let v4 = SourceAddress::parse("127.0.0.1").unwrap();

        assert_eq!(v6, v4);
        assert_eq!(v6.key(), "127.0.0.1");
        assert_eq!(v6.version(), IpVersion::V4);
    }

    #[test]
    fn test_ipv4_mapped_ipv6_is_canonicalized() {
        let mapped = SourceAddress::parse("::ffff:192.168.1.100").unwrap();
        assert_eq!(mapped.key(), "192.168.1.100");
        assert_eq!(mapped.version(), IpVersion::V4);
    }

    #[test]
    fn test_plain_ipv6_is_preserved() {
        let addr = SourceAddress::parse(" 2001:db8::1 ").unwrap();
        assert_eq!(addr.version(), IpVersion::V6);
        assert_eq!(addr.encoded().len(), 16);
    }

    #[test]
    fn test_invalid_address() {
        assert!(matches!(
            SourceAddress::parse("unknown"),
            Err(ValidationError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_encoding_preserves_order() {
        let low = SourceAddress::parse("10.0.0.9").unwrap();
        let high = SourceAddress::parse("10.0.1.0").unwrap();

        assert!(low.encoded() < high.encoded());
        assert!(as_u128(&low.ip()) < as_u128(&high.ip()));
    }

    #[test]
    fn test_decode_inverts_encode() {
        let addr: IpAddr = "2001:db8::ff".parse().unwrap();
        assert_eq!(decode(&encode(&addr)), Some(addr));
        assert_eq!(decode(&[1, 2, 3]), None);
    }

    #[test]
    fn test_version_tags() {
        assert_eq!(IpVersion::from_i64(IpVersion::V6.as_i64()), Some(IpVersion::V6));
        assert_eq!(IpVersion::from_i64(5), None);
    }
}
