//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

use itertools::Itertools;

use crate::debug::Debug;
use crate::error::Error;
use crate::lsdb::{self, LsaEntryFlags, Lsdb};
use crate::output::IoSink;
use crate::packet::lsa::{Lsa, LsaHdrVersion, LsaKey, LsaVersion};
use crate::route::{self, RouteNet, RouteRtr};
use crate::spf::{self, Spt};
use crate::version::Version;

// OSPF area type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AreaType {
    Normal,
    Stub,
    Nssa,
}

// Per-area router: owns the area's LSDB and derives the routing table from
// it.
#[derive(Debug)]
pub struct AreaRouter<V: Version> {
    // Area ID.
    area_id: Ipv4Addr,
    // Area type.
    area_type: AreaType,
    // Router-ID of this router.
    router_id: Ipv4Addr,
    // LSDB of area and AS-scope LSAs.
    lsdb: Lsdb<V>,
    // Key of this router's own Router-LSA.
    self_lsa_key: Option<LsaKey<V::LsaType>>,
    // Shortest-path tree from the last recomputation.
    spt: Spt<V>,
    // Table of all routers in the area.
    routers: BTreeMap<Ipv4Addr, RouteRtr<V>>,
    // Routing table snapshot from the last recomputation.
    rib: BTreeMap<V::IpNetwork, RouteNet<V>>,
    // Set on any LSDB mutation, cleared on recomputation.
    dirty: bool,
}

// ===== impl AreaRouter =====

impl<V> AreaRouter<V>
where
    V: Version,
{
    pub(crate) fn new(
        area_id: Ipv4Addr,
        area_type: AreaType,
        router_id: Ipv4Addr,
    ) -> Self {
        Debug::<V>::AreaCreate(area_id).log();

        Self {
            area_id,
            area_type,
            router_id,
            lsdb: Default::default(),
            self_lsa_key: None,
            spt: Default::default(),
            routers: Default::default(),
            rib: Default::default(),
            dirty: false,
        }
    }

    pub fn area_id(&self) -> Ipv4Addr {
        self.area_id
    }

    pub fn area_type(&self) -> AreaType {
        self.area_type
    }

    // Returns whether this is the backbone area.
    pub fn is_backbone(&self) -> bool {
        self.area_id == Ipv4Addr::UNSPECIFIED
    }

    pub fn lsdb(&self) -> &Lsdb<V> {
        &self.lsdb
    }

    pub fn routing_table(&self) -> &BTreeMap<V::IpNetwork, RouteNet<V>> {
        &self.rib
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn set_router_id(&mut self, router_id: Ipv4Addr) {
        self.router_id = router_id;
    }

    // Installs or overwrites this router's own Router-LSA.
    pub fn replace_self_router_lsa(
        &mut self,
        lsa: Arc<Lsa<V>>,
    ) -> Result<(), Error<V>> {
        if lsa.hdr.lsa_type() != V::type_router() {
            return Err(Error::LsaWrongType(lsa.hdr.lsa_type()));
        }
        if lsa.hdr.adv_rtr() != self.router_id {
            return Err(Error::LsaNotSelfOriginated(lsa.hdr.adv_rtr()));
        }

        // A zeroed checksum on an outbound self-originated LSA means it
        // hasn't been encoded yet.
        let lsa = if lsa.hdr.cksum() == 0 {
            let mut lsa = (*lsa).clone();
            lsa.encode();
            Arc::new(lsa)
        } else {
            lsa
        };

        // Replace the previous instance, which may be stored under a
        // different key.
        if let Some(old_key) = self.self_lsa_key.take()
            && old_key != lsa.hdr.key()
        {
            self.lsdb.delete(&old_key);
        }

        Debug::<V>::LsaInstall(&lsa.hdr).log();
        self.self_lsa_key = Some(lsa.hdr.key());
        self.lsdb.install(lsa, LsaEntryFlags::SELF_ORIGINATED);
        self.dirty = true;

        Ok(())
    }

    // Adds the received LSA to the LSDB, replacing an older instance if one
    // is present. A stale arrival is dropped silently; a MaxAge arrival
    // purges the stored instance.
    pub fn admit_lsa(&mut self, lsa: Arc<Lsa<V>>) -> Result<(), Error<V>> {
        lsa.validate().map_err(Error::LsaInvalid)?;

        let key = lsa.hdr.key();
        if lsa.hdr.is_maxage() {
            if self.lsdb.delete(&key).is_some() {
                Debug::<V>::LsaPurge(&lsa.hdr).log();
                self.dirty = true;
            }
            return Ok(());
        }

        if let Some(old) = self.lsdb.get(&key) {
            match lsdb::lsa_compare::<V>(&lsa.hdr, &old.data.hdr) {
                Ordering::Greater => (),
                Ordering::Less | Ordering::Equal => {
                    // The stored instance is as recent or more recent; this
                    // isn't an error from the peer's perspective.
                    Debug::<V>::LsaStale(&lsa.hdr).log();
                    return Ok(());
                }
            }

            // A newer instance with unchanged contents doesn't require a
            // routing table recomputation.
            if lsdb::lsa_same_contents(&old.data, &lsa) {
                self.lsdb.install(lsa, LsaEntryFlags::RECEIVED);
                return Ok(());
            }
        }

        Debug::<V>::LsaInstall(&lsa.hdr).log();
        self.lsdb.install(lsa, LsaEntryFlags::RECEIVED);
        self.dirty = true;

        Ok(())
    }

    // Removes the LSA corresponding to the provided key from the LSDB.
    // Deleting an absent key is a no-op.
    pub fn delete_lsa(&mut self, key: &LsaKey<V::LsaType>) {
        if self.lsdb.delete(key).is_some() {
            Debug::<V>::LsaDelete(key).log();
            if self.self_lsa_key == Some(*key) {
                self.self_lsa_key = None;
            }
            self.dirty = true;
        }
    }

    // Rebuilds the SPT and the routing table from the current LSDB contents
    // and pushes the resulting changes to the I/O sink.
    pub fn recompute_routing_table(&mut self, sink: &mut dyn IoSink<V>) {
        Debug::<V>::SpfStart(self.area_id).log();

        let (spt, mut routers) = match spf::run(self.router_id, &self.lsdb) {
            Ok((spt, routers)) => (spt, routers),
            Err(error) => {
                // Without a reachable root there are no reachable
                // destinations; the table drains below.
                error.log();
                (Default::default(), Default::default())
            }
        };

        let old_rib = std::mem::take(&mut self.rib);
        let mut rib =
            route::build(self.router_id, &self.lsdb, &spt, &mut routers);
        route::update_sink(&mut rib, old_rib, sink);

        self.spt = spt;
        self.routers = routers;
        self.rib = rib;
        self.dirty = false;
    }

    // Withdraws every route this area installed. Used when the area is
    // destroyed.
    pub(crate) fn flush_routes(&mut self, sink: &mut dyn IoSink<V>) {
        route::flush_sink(&mut self.rib, sink);
        self.spt.clear();
        self.routers.clear();
    }

    // Formats the link state database for debugging.
    pub fn print_link_state_database(&self) -> String {
        let header = format!(
            "LSDB of area {} ({} LSAs)",
            self.area_id,
            self.lsdb.len()
        );
        std::iter::once(header)
            .chain(self.lsdb.iter().map(|(_, lse)| {
                let hdr = &lse.data.hdr;
                format!(
                    "  type {} lsa-id {} adv-rtr {} seq 0x{:08x} age {} cksum 0x{:04x} len {}",
                    hdr.lsa_type(),
                    hdr.lsa_id(),
                    hdr.adv_rtr(),
                    hdr.seq_no(),
                    lse.data.age(),
                    hdr.cksum(),
                    hdr.length(),
                )
            }))
            .join("\n")
    }
}
