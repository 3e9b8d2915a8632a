//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{Ipv4Addr, Ipv6Addr};

use ipnetwork::{Ipv4Network, Ipv6Network};
use xorp_utils::ip::{AddressFamily, IpAddrKind, IpNetworkKind};

use crate::packet::lsa::LsaVersion;
use crate::spf::SpfVersion;

// OSPF version-specific code.
pub trait Version
where
    Self: 'static
        + Send
        + Sync
        + Clone
        + Default
        + Eq
        + PartialEq
        + std::fmt::Debug
        + LsaVersion<Self>
        + SpfVersion<Self>,
{
    const VERSION: u8;
    const ADDRESS_FAMILY: AddressFamily;

    type IpAddr: IpAddrKind;
    type IpNetwork: IpNetworkKind<Self::IpAddr>;
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Ospfv2();

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Ospfv3();

// ===== impl Ospfv2 =====

impl Version for Ospfv2 {
    const VERSION: u8 = 2;
    const ADDRESS_FAMILY: AddressFamily = AddressFamily::Ipv4;

    type IpAddr = Ipv4Addr;
    type IpNetwork = Ipv4Network;
}

// ===== impl Ospfv3 =====

impl Version for Ospfv3 {
    const VERSION: u8 = 3;
    const ADDRESS_FAMILY: AddressFamily = AddressFamily::Ipv6;

    type IpAddr = Ipv6Addr;
    type IpNetwork = Ipv6Network;
}
