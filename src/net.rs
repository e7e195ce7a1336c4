//! IP subnet parsing and prefix truncation.
//!
//! Plain `std::net` address types with explicit prefix-mask arithmetic:
//! a subnet is an address plus a prefix length, membership is masked
//! equality within the same address family.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::Error;

/// A CIDR network used for value-subnet membership tests.
///
/// Parsed from `"address/prefix"` notation; a bare address is treated as
/// a full-length prefix (/32 or /128).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subnet {
    addr: IpAddr,
    prefix: u8,
}

impl Subnet {
    /// Parses a CIDR literal such as `"192.168.0.0/16"` or `"fd00::/8"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSubnet`] for an unparsable address or a
    /// prefix outside the address family's width. This is the
    /// configuration-time check: a malformed subnet literal must fail
    /// compilation, never an `apply` call.
    pub fn parse(text: &str) -> crate::Result<Self> {
        let (addr_part, prefix_part) = match text.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (text, None),
        };

        let addr: IpAddr = addr_part.trim().parse().map_err(|_| Error::InvalidSubnet {
            subnet: text.to_string(),
            reason: format!("unparsable address '{}'", addr_part.trim()),
        })?;
        let width = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };

        let prefix = match prefix_part {
            Some(part) => part
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|&bits| bits <= width)
                .ok_or_else(|| Error::InvalidSubnet {
                    subnet: text.to_string(),
                    reason: format!("prefix must be an integer in 0..={width}"),
                })?,
            None => width,
        };

        Ok(Self { addr, prefix })
    }

    /// The prefix length in bits.
    #[must_use]
    pub const fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Whether `candidate` falls inside this network.
    ///
    /// Addresses of the other family are never members.
    #[must_use]
    pub fn contains(&self, candidate: &IpAddr) -> bool {
        match (self.addr, candidate) {
            (IpAddr::V4(network), IpAddr::V4(addr)) => {
                match (mask_v4(network, self.prefix), mask_v4(*addr, self.prefix)) {
                    (Some(lhs), Some(rhs)) => lhs == rhs,
                    _ => false,
                }
            }
            (IpAddr::V6(network), IpAddr::V6(addr)) => {
                match (mask_v6(network, self.prefix), mask_v6(*addr, self.prefix)) {
                    (Some(lhs), Some(rhs)) => lhs == rhs,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

/// Zeroes the host bits of an IPv4 address past `bits`.
///
/// Returns `None` when `bits` exceeds the 32-bit address width, letting
/// callers fail open on out-of-range configuration.
#[must_use]
pub fn mask_v4(addr: Ipv4Addr, bits: u8) -> Option<Ipv4Addr> {
    if bits > 32 {
        return None;
    }
    let mask = if bits == 0 { 0 } else { u32::MAX << (32 - bits) };
    Some(Ipv4Addr::from(u32::from(addr) & mask))
}

/// Zeroes the host bits of an IPv6 address past `bits`.
///
/// Returns `None` when `bits` exceeds the 128-bit address width.
#[must_use]
pub fn mask_v6(addr: Ipv6Addr, bits: u8) -> Option<Ipv6Addr> {
    if bits > 128 {
        return None;
    }
    let mask = if bits == 0 {
        0
    } else {
        u128::MAX << (128 - u32::from(bits))
    };
    Some(Ipv6Addr::from(u128::from(addr) & mask))
}
