//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use tracing::{debug, debug_span};

use crate::packet::lsa::{LsaHdrVersion, LsaKey};
use crate::peer::{PeerId, fsm};
use crate::version::Version;

// OSPF debug messages.
#[derive(Debug)]
pub enum Debug<'a, V: Version> {
    // Areas
    AreaCreate(Ipv4Addr),
    AreaDestroy(Ipv4Addr),
    // Peers
    PeerCreate(PeerId, &'a str, &'a str),
    PeerDelete(PeerId),
    PeerStateChange(PeerId, &'a fsm::State, &'a fsm::State),
    // LSDB maintenance
    LsaInstall(&'a V::LsaHdr),
    LsaPurge(&'a V::LsaHdr),
    LsaStale(&'a V::LsaHdr),
    LsaDelete(&'a LsaKey<V::LsaType>),
    // SPF
    SpfStart(Ipv4Addr),
    SpfNetworkUnreachableAbr(&'a V::IpNetwork, Ipv4Addr),
    SpfRouterUnreachableAbr(&'a Ipv4Addr, Ipv4Addr),
    SpfUnreachableAsbr(&'a V::IpNetwork, Ipv4Addr),
    // Route updates
    RouteInstall(&'a V::IpNetwork, &'a V::IpAddr, u32),
    RouteUninstall(&'a V::IpNetwork),
}

// ===== impl Debug =====

impl<V> Debug<'_, V>
where
    V: Version,
{
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::AreaCreate(area_id) | Debug::AreaDestroy(area_id) => {
                debug_span!("area", %area_id).in_scope(|| {
                    debug!("{}", self);
                });
            }
            Debug::PeerCreate(peer_id, ifname, vifname) => {
                debug_span!("peer", %peer_id).in_scope(|| {
                    debug!(%ifname, %vifname, "{}", self);
                });
            }
            Debug::PeerDelete(peer_id) => {
                debug_span!("peer", %peer_id).in_scope(|| {
                    debug!("{}", self);
                });
            }
            Debug::PeerStateChange(peer_id, old_state, new_state) => {
                debug_span!("peer", %peer_id).in_scope(|| {
                    debug!(?old_state, ?new_state, "{}", self);
                });
            }
            Debug::LsaInstall(lsa_hdr)
            | Debug::LsaPurge(lsa_hdr)
            | Debug::LsaStale(lsa_hdr) => {
                let lsa_type = lsa_hdr.lsa_type();
                let lsa_id = lsa_hdr.lsa_id();
                let adv_rtr = lsa_hdr.adv_rtr();
                debug!(%lsa_type, %lsa_id, %adv_rtr, "{}", self);
            }
            Debug::LsaDelete(lsa_key) => {
                let lsa_type = lsa_key.lsa_type;
                let lsa_id = lsa_key.lsa_id;
                let adv_rtr = lsa_key.adv_rtr;
                debug!(%lsa_type, %lsa_id, %adv_rtr, "{}", self);
            }
            Debug::SpfStart(area_id) => {
                debug_span!("area", %area_id).in_scope(|| {
                    debug!("{}", self);
                });
            }
            Debug::SpfNetworkUnreachableAbr(prefix, adv_rtr) => {
                debug!(%prefix, %adv_rtr, "{}", self);
            }
            Debug::SpfRouterUnreachableAbr(router_id, adv_rtr) => {
                debug!(%router_id, %adv_rtr, "{}", self);
            }
            Debug::SpfUnreachableAsbr(prefix, adv_rtr) => {
                debug!(%prefix, %adv_rtr, "{}", self);
            }
            Debug::RouteInstall(prefix, nexthop, metric) => {
                debug!(%prefix, %nexthop, %metric, "{}", self);
            }
            Debug::RouteUninstall(prefix) => {
                debug!(%prefix, "{}", self);
            }
        }
    }
}

impl<V> std::fmt::Display for Debug<'_, V>
where
    V: Version,
{
    // Display debug message.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::AreaCreate(..) => {
                write!(f, "area created")
            }
            Debug::AreaDestroy(..) => {
                write!(f, "area destroyed")
            }
            Debug::PeerCreate(..) => {
                write!(f, "peer created")
            }
            Debug::PeerDelete(..) => {
                write!(f, "peer deleted")
            }
            Debug::PeerStateChange(..) => {
                write!(f, "peer state change")
            }
            Debug::LsaInstall(..) => {
                write!(f, "installing LSA")
            }
            Debug::LsaPurge(..) => {
                write!(f, "purging LSA")
            }
            Debug::LsaStale(..) => {
                write!(f, "discarding LSA that isn't more recent")
            }
            Debug::LsaDelete(..) => {
                write!(f, "deleting LSA")
            }
            Debug::SpfStart(..) => {
                write!(f, "starting SPF calculation")
            }
            Debug::SpfNetworkUnreachableAbr(..) => {
                write!(f, "ignoring summary network (unreachable ABR)")
            }
            Debug::SpfRouterUnreachableAbr(..) => {
                write!(f, "ignoring summary router (unreachable ABR)")
            }
            Debug::SpfUnreachableAsbr(..) => {
                write!(f, "ignoring external network (unreachable ASBR)")
            }
            Debug::RouteInstall(..) => {
                write!(f, "installing route")
            }
            Debug::RouteUninstall(..) => {
                write!(f, "uninstalling route")
            }
        }
    }
}
