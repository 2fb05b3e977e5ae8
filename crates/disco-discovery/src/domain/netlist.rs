//! Restrict netlist: the set of networks a session may talk to.
//!
//! Parsed from `"10.0.0.0/8, 192.168.0.0/16"` (comma or whitespace
//! separated). When a session carries a netlist, datagrams from outside it
//! are dropped and nothing is sent outside it.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::domain::NetlistError;

/// One CIDR prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet {
    network: IpAddr,
    prefix_length: u8,
}

impl Subnet {
    /// Create a subnet, rejecting prefixes wider than the address.
    pub fn new(network: IpAddr, prefix_length: u8) -> Result<Self, NetlistError> {
        let network = network.to_canonical();
        if prefix_length > max_prefix(&network) {
            return Err(NetlistError::PrefixTooLong {
                cidr: format!("{network}/{prefix_length}"),
                prefix: prefix_length,
            });
        }
        Ok(Self {
            network,
            prefix_length,
        })
    }

    /// True if `ip` falls inside this prefix.
    ///
    /// IPv4 and IPv6 are disjoint; IPv4-mapped IPv6 addresses count as IPv4.
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, ip.to_canonical()) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                prefix_matches(&net.octets(), &ip.octets(), self.prefix_length)
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                prefix_matches(&net.octets(), &ip.octets(), self.prefix_length)
            }
            _ => false,
        }
    }
}

impl FromStr for Subnet {
    type Err = NetlistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ip, prefix) = s
            .split_once('/')
            .ok_or_else(|| NetlistError::InvalidCidr(s.to_string()))?;
        let ip: IpAddr = ip
            .parse()
            .map_err(|_| NetlistError::InvalidCidr(s.to_string()))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| NetlistError::InvalidCidr(s.to_string()))?;
        Self::new(ip, prefix)
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_length)
    }
}

/// A list of subnets; an address is allowed if any entry contains it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Netlist {
    subnets: Vec<Subnet>,
}

impl Netlist {
    /// Empty list. An empty netlist contains nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subnet.
    pub fn push(&mut self, subnet: Subnet) {
        self.subnets.push(subnet);
    }

    /// True if any entry contains `ip`.
    pub fn contains(&self, ip: IpAddr) -> bool {
        self.subnets.iter().any(|s| s.contains(ip))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.subnets.len()
    }

    /// True if the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.subnets.is_empty()
    }
}

impl FromStr for Netlist {
    type Err = NetlistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let subnets = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|entry| !entry.is_empty())
            .map(Subnet::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { subnets })
    }
}

impl fmt::Display for Netlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, subnet) in self.subnets.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{subnet}")?;
        }
        Ok(())
    }
}

fn max_prefix(ip: &IpAddr) -> u8 {
    match ip {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

/// Compare byte slices up to a prefix length in bits.
fn prefix_matches(a: &[u8], b: &[u8], prefix_bits: u8) -> bool {
    let prefix_bytes = (prefix_bits / 8) as usize;
    let remaining_bits = prefix_bits % 8;

    if a[..prefix_bytes] != b[..prefix_bytes] {
        return false;
    }

    if remaining_bits > 0 {
        let mask_byte = 0xFFu8 << (8 - remaining_bits);
        return (a[prefix_bytes] & mask_byte) == (b[prefix_bytes] & mask_byte);
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_subnet_contains() {
        let subnet: Subnet = "192.168.0.0/16".parse().unwrap();
        assert!(subnet.contains(ip("192.168.44.1")));
        assert!(!subnet.contains(ip("192.169.0.1")));
        assert!(!subnet.contains(ip("::1")));
    }

    #[test]
    fn test_subnet_partial_byte_prefix() {
        let subnet: Subnet = "10.0.0.0/12".parse().unwrap();
        assert!(subnet.contains(ip("10.15.255.255")));
        assert!(!subnet.contains(ip("10.16.0.0")));
    }

    #[test]
    fn test_ipv4_mapped_address_matches_ipv4_subnet() {
        let subnet: Subnet = "127.0.0.0/8".parse().unwrap();
        assert!(subnet.contains(ip("::ffff:127.0.0.1")));
    }

    #[test]
    fn test_netlist_parse_mixed_separators() {
        let list: Netlist = "10.0.0.0/8, 192.168.0.0/16 fd00::/8".parse().unwrap();
        assert_eq!(list.len(), 3);
        assert!(list.contains(ip("10.1.1.1")));
        assert!(list.contains(ip("fd12::1")));
        assert!(!list.contains(ip("8.8.8.8")));
        assert_eq!(list.to_string(), "10.0.0.0/8, 192.168.0.0/16, fd00::/8");
    }

    #[test]
    fn test_netlist_rejects_bad_entries() {
        assert!(matches!(
            "10.0.0.0".parse::<Netlist>(),
            Err(NetlistError::InvalidCidr(_))
        ));
        assert!(matches!(
            "10.0.0.0/33".parse::<Netlist>(),
            Err(NetlistError::PrefixTooLong { prefix: 33, .. })
        ));
    }

    #[test]
    fn test_zero_prefix_contains_family() {
        let list: Netlist = "0.0.0.0/0".parse().unwrap();
        assert!(list.contains(ip("203.0.113.9")));
        assert!(!list.contains(ip("2001:db8::1")));
    }
}
