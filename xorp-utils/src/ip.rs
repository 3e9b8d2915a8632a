//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnetwork::{IpNetworkError, Ipv4Network, Ipv6Network};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// Supported address families.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

// Extension methods for IP addresses of any family.
pub trait IpAddrKind
where
    Self: 'static
        + Send
        + Sync
        + Clone
        + Copy
        + Eq
        + Ord
        + PartialEq
        + PartialOrd
        + std::fmt::Debug
        + std::fmt::Display
        + std::hash::Hash
        + std::str::FromStr
        + Into<IpAddr>
        + Serialize
        + DeserializeOwned,
{
    const LENGTH: usize;

    // Return the address family associated to this address type.
    fn address_family() -> AddressFamily;

    // Return the unspecified address of this family.
    fn unspecified() -> Self;

    // Return whether this is the unspecified address.
    fn is_unspecified(&self) -> bool;
}

// Extension methods for IP networks of any family.
pub trait IpNetworkKind<I: IpAddrKind>
where
    Self: Send
        + Sync
        + Clone
        + Copy
        + Eq
        + Ord
        + PartialEq
        + PartialOrd
        + std::fmt::Debug
        + std::fmt::Display
        + std::hash::Hash
        + std::str::FromStr
        + Serialize
        + DeserializeOwned,
{
    fn new(addr: I, prefix: u8) -> Result<Self, IpNetworkError>;

    fn ip(&self) -> I;

    fn prefix(&self) -> u8;

    fn mask(&self) -> I;

    fn contains(&self, addr: I) -> bool;

    // Return a copy of this network with the host bits of the address
    // cleared.
    fn apply_mask(&self) -> Self;
}

// ===== impl AddressFamily =====

impl AddressFamily {
    pub fn addr_len(&self) -> usize {
        match self {
            AddressFamily::Ipv4 => Ipv4Addr::LENGTH,
            AddressFamily::Ipv6 => Ipv6Addr::LENGTH,
        }
    }

    pub fn max_prefixlen(&self) -> u8 {
        (self.addr_len() * 8) as u8
    }
}

impl std::fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressFamily::Ipv4 => write!(f, "ipv4"),
            AddressFamily::Ipv6 => write!(f, "ipv6"),
        }
    }
}

// ===== impl Ipv4Addr =====

impl IpAddrKind for Ipv4Addr {
    const LENGTH: usize = 4;

    fn address_family() -> AddressFamily {
        AddressFamily::Ipv4
    }

    fn unspecified() -> Self {
        Ipv4Addr::UNSPECIFIED
    }

    fn is_unspecified(&self) -> bool {
        Ipv4Addr::is_unspecified(self)
    }
}

// ===== impl Ipv6Addr =====

impl IpAddrKind for Ipv6Addr {
    const LENGTH: usize = 16;

    fn address_family() -> AddressFamily {
        AddressFamily::Ipv6
    }

    fn unspecified() -> Self {
        Ipv6Addr::UNSPECIFIED
    }

    fn is_unspecified(&self) -> bool {
        Ipv6Addr::is_unspecified(self)
    }
}

// ===== impl Ipv4Network =====

impl IpNetworkKind<Ipv4Addr> for Ipv4Network {
    fn new(addr: Ipv4Addr, prefix: u8) -> Result<Self, IpNetworkError> {
        Ipv4Network::new(addr, prefix)
    }

    fn ip(&self) -> Ipv4Addr {
        Ipv4Network::ip(*self)
    }

    fn prefix(&self) -> u8 {
        Ipv4Network::prefix(*self)
    }

    fn mask(&self) -> Ipv4Addr {
        Ipv4Network::mask(*self)
    }

    fn contains(&self, addr: Ipv4Addr) -> bool {
        Ipv4Network::contains(*self, addr)
    }

    fn apply_mask(&self) -> Self {
        let mask = u32::from(self.mask());
        let addr = Ipv4Addr::from(u32::from(self.ip()) & mask);
        Ipv4Network::new(addr, self.prefix()).unwrap()
    }
}

// ===== impl Ipv6Network =====

impl IpNetworkKind<Ipv6Addr> for Ipv6Network {
    fn new(addr: Ipv6Addr, prefix: u8) -> Result<Self, IpNetworkError> {
        Ipv6Network::new(addr, prefix)
    }

    fn ip(&self) -> Ipv6Addr {
        Ipv6Network::ip(self)
    }

    fn prefix(&self) -> u8 {
        Ipv6Network::prefix(self)
    }

    fn mask(&self) -> Ipv6Addr {
        Ipv6Network::mask(self)
    }

    fn contains(&self, addr: Ipv6Addr) -> bool {
        Ipv6Network::contains(self, addr)
    }

    fn apply_mask(&self) -> Self {
        let mask = u128::from(self.mask());
        let addr = Ipv6Addr::from(u128::from(self.ip()) & mask);
        Ipv6Network::new(addr, self.prefix()).unwrap()
    }
}
