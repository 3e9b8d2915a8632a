//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::area::{AreaRouter, AreaType};
use crate::debug::Debug;
use crate::error::Error;
use crate::output::IoSink;
use crate::packet::lsa::Lsa;
use crate::version::Version;

// Peer identifier, allocated sequentially per peer manager.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct PeerId(pub u32);

// OSPF interface type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum InterfaceType {
    Broadcast,
    NonBroadcast,
    PointToMultipoint,
    PointToPoint,
}

// Peer Finite State Machine.
pub mod fsm {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
    #[derive(Deserialize, Serialize)]
    pub enum State {
        #[default]
        Down,
        Up,
    }
}

// OSPF peer.
//
// A peer binds an interface/vif pair to an area; its state gates whether
// LSAs received through it may enter the area's LSDB.
#[derive(Debug)]
pub struct Peer<V: Version> {
    pub id: PeerId,
    pub ifname: String,
    pub vifname: String,
    pub src: V::IpAddr,
    pub prefix_len: u8,
    pub mtu: u16,
    pub iface_type: InterfaceType,
    pub area_id: Ipv4Addr,
    pub state: fsm::State,
}

// Owner of the set of peers and areas.
#[derive(Debug)]
pub struct PeerManager<V: Version> {
    // Router-ID of this router.
    router_id: Ipv4Addr,
    // Areas, keyed by Area ID.
    areas: BTreeMap<Ipv4Addr, AreaRouter<V>>,
    // Peers, keyed by peer ID.
    peers: BTreeMap<PeerId, Peer<V>>,
    // Next peer ID to be allocated.
    next_peer_id: u32,
}

// ===== impl PeerManager =====

impl<V> PeerManager<V>
where
    V: Version,
{
    pub fn new(router_id: Ipv4Addr) -> Self {
        Self {
            router_id,
            areas: Default::default(),
            peers: Default::default(),
            next_peer_id: 1,
        }
    }

    pub fn router_id(&self) -> Ipv4Addr {
        self.router_id
    }

    // Updates the Router-ID of this router and of all attached areas.
    pub fn set_router_id(&mut self, router_id: Ipv4Addr) {
        self.router_id = router_id;
        for area in self.areas.values_mut() {
            area.set_router_id(router_id);
        }
    }

    // Creates an area router for the provided area.
    pub fn create_area_router(
        &mut self,
        area_id: Ipv4Addr,
        area_type: AreaType,
    ) -> Result<(), Error<V>> {
        if self.areas.contains_key(&area_id) {
            return Err(Error::AreaAlreadyExists(area_id));
        }

        let area = AreaRouter::new(area_id, area_type, self.router_id);
        self.areas.insert(area_id, area);
        Ok(())
    }

    // Destroys the area router for the provided area, withdrawing every
    // route it installed. All attached peers must have been deleted first.
    pub fn destroy_area_router(
        &mut self,
        area_id: Ipv4Addr,
        sink: &mut dyn IoSink<V>,
    ) -> Result<(), Error<V>> {
        if !self.areas.contains_key(&area_id) {
            return Err(Error::AreaNotFound(area_id));
        }
        if self.peers.values().any(|peer| peer.area_id == area_id) {
            return Err(Error::AreaBusy(area_id));
        }

        let mut area = self.areas.remove(&area_id).unwrap();
        area.flush_routes(sink);
        Debug::<V>::AreaDestroy(area_id).log();
        Ok(())
    }

    pub fn get_area_router(
        &self,
        area_id: &Ipv4Addr,
    ) -> Option<&AreaRouter<V>> {
        self.areas.get(area_id)
    }

    pub fn get_area_router_mut(
        &mut self,
        area_id: &Ipv4Addr,
    ) -> Option<&mut AreaRouter<V>> {
        self.areas.get_mut(area_id)
    }

    // Creates a peer in the Down state. The referenced area must exist.
    pub fn create_peer(
        &mut self,
        ifname: &str,
        vifname: &str,
        src: V::IpAddr,
        prefix_len: u8,
        mtu: u16,
        iface_type: InterfaceType,
        area_id: Ipv4Addr,
    ) -> Result<PeerId, Error<V>> {
        if !self.areas.contains_key(&area_id) {
            return Err(Error::AreaNotFound(area_id));
        }

        let id = PeerId(self.next_peer_id);
        self.next_peer_id += 1;

        Debug::<V>::PeerCreate(id, ifname, vifname).log();
        let peer = Peer {
            id,
            ifname: ifname.to_owned(),
            vifname: vifname.to_owned(),
            src,
            prefix_len,
            mtu,
            iface_type,
            area_id,
            state: fsm::State::Down,
        };
        self.peers.insert(id, peer);
        Ok(id)
    }

    // Brings the peer up or takes it down. LSAs already in the LSDB are
    // retained when the peer goes down.
    pub fn set_state_peer(
        &mut self,
        peer_id: PeerId,
        enable: bool,
    ) -> Result<(), Error<V>> {
        let peer = self
            .peers
            .get_mut(&peer_id)
            .ok_or(Error::PeerNotFound(peer_id))?;

        let new_state = if enable {
            fsm::State::Up
        } else {
            fsm::State::Down
        };
        if peer.state != new_state {
            Debug::<V>::PeerStateChange(peer_id, &peer.state, &new_state)
                .log();
            peer.state = new_state;
        }
        Ok(())
    }

    // Deletes the peer. The peer must be down.
    pub fn delete_peer(&mut self, peer_id: PeerId) -> Result<(), Error<V>> {
        let peer = self
            .peers
            .get(&peer_id)
            .ok_or(Error::PeerNotFound(peer_id))?;
        if peer.state == fsm::State::Up {
            return Err(Error::PeerBusy(peer_id));
        }

        Debug::<V>::PeerDelete(peer_id).log();
        self.peers.remove(&peer_id);
        Ok(())
    }

    pub fn get_peer(&self, peer_id: PeerId) -> Option<&Peer<V>> {
        self.peers.get(&peer_id)
    }

    // Admits an LSA received through the provided peer into its area's
    // LSDB. The peer must be up.
    pub fn admit_lsa(
        &mut self,
        peer_id: PeerId,
        lsa: Arc<Lsa<V>>,
    ) -> Result<(), Error<V>> {
        let peer = self
            .peers
            .get(&peer_id)
            .ok_or(Error::PeerNotFound(peer_id))?;
        if peer.state != fsm::State::Up {
            return Err(Error::PeerDown(peer_id));
        }

        let area = self
            .areas
            .get_mut(&peer.area_id)
            .ok_or(Error::AreaNotFound(peer.area_id))?;
        area.admit_lsa(lsa)
    }
}

// ===== impl PeerId =====

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
