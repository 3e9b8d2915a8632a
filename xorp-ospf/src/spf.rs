//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use derive_new::new;

use crate::error::Error;
use crate::lsdb::Lsdb;
use crate::packet::lsa::LsaKey;
use crate::route::{Nexthops, PathType, RouteRtr};
use crate::version::Version;

// Shortest-path tree.
pub type Spt<V: Version> = BTreeMap<V::VertexId, Vertex<V>>;

#[derive(Debug, new)]
pub struct Vertex<V: Version> {
    pub id: V::VertexId,
    pub lsa: V::VertexLsa,
    pub distance: u16,
    pub hops: u16,
    #[new(default)]
    pub nexthops: Nexthops<V::IpAddr>,
}

#[derive(Debug, new)]
pub struct SpfLink<'a, V: Version> {
    pub parent: Option<&'a V::LsaRouterLink>,
    pub id: V::VertexId,
    pub lsa: V::VertexLsa,
    pub cost: u16,
}

#[derive(Debug)]
pub struct SpfIntraAreaNetwork<'a, V: Version> {
    pub vertex: &'a Vertex<V>,
    pub prefix: V::IpNetwork,
    pub prefix_options: V::PrefixOptions,
    pub metric: u16,
}

#[derive(Debug)]
pub struct SpfInterAreaNetwork<V: Version> {
    pub adv_rtr: Ipv4Addr,
    pub prefix: V::IpNetwork,
    pub prefix_options: V::PrefixOptions,
    pub metric: u32,
}

#[derive(Debug)]
pub struct SpfInterAreaRouter<V: Version> {
    pub adv_rtr: Ipv4Addr,
    pub router_id: Ipv4Addr,
    pub options: V::PacketOptions,
    pub flags: V::LsaRouterFlags,
    pub metric: u32,
}

#[derive(Debug)]
pub struct SpfExternalNetwork<V: Version> {
    pub adv_rtr: Ipv4Addr,
    pub e_bit: bool,
    pub prefix: V::IpNetwork,
    pub prefix_options: V::PrefixOptions,
    pub metric: u32,
    pub fwd_addr: Option<V::IpAddr>,
    pub tag: Option<u32>,
}

// OSPF version-specific code.
pub trait SpfVersion<V: Version> {
    type VertexId: VertexIdVersion;
    type VertexLsa: VertexLsaVersion<V>;

    // Compute the set of nexthops that should be used to reach the given
    // destination.
    fn calc_nexthops(
        router_id: Ipv4Addr,
        parent: &Vertex<V>,
        parent_link: Option<&V::LsaRouterLink>,
        dest_id: V::VertexId,
        dest_lsa: &V::VertexLsa,
        lsdb: &Lsdb<V>,
    ) -> Result<Nexthops<V::IpAddr>, Error<V>>;

    // Find SPF vertex.
    fn vertex_lsa_find(id: V::VertexId, lsdb: &Lsdb<V>)
    -> Option<V::VertexLsa>;

    // Return iterator over all links of the provided SPF vertex.
    fn vertex_lsa_links<'a>(
        vertex_lsa: &'a Self::VertexLsa,
        lsdb: &'a Lsdb<V>,
    ) -> Box<dyn Iterator<Item = SpfLink<'a, V>> + 'a>;

    // Return iterator over all intra-area networks.
    fn intra_area_networks<'a>(
        spt: &'a Spt<V>,
        lsdb: &'a Lsdb<V>,
    ) -> Box<dyn Iterator<Item = SpfIntraAreaNetwork<'a, V>> + 'a>;

    // Return iterator over all inter-area networks.
    fn inter_area_networks<'a>(
        lsdb: &'a Lsdb<V>,
    ) -> Box<dyn Iterator<Item = SpfInterAreaNetwork<V>> + 'a>;

    // Return iterator over all inter-area routers.
    fn inter_area_routers<'a>(
        lsdb: &'a Lsdb<V>,
    ) -> Box<dyn Iterator<Item = SpfInterAreaRouter<V>> + 'a>;

    // Return iterator over all AS external networks.
    fn external_networks<'a>(
        lsdb: &'a Lsdb<V>,
    ) -> Box<dyn Iterator<Item = SpfExternalNetwork<V>> + 'a>;
}

// OSPF version-specific code.
//
// NOTE: network vertices should be ordered before router vertices in order
// for the SPF algorithm to find all equal-cost paths.
pub trait VertexIdVersion
where
    Self: Send
        + Sync
        + Clone
        + Copy
        + std::fmt::Debug
        + Eq
        + Ord
        + PartialEq
        + PartialOrd,
{
    // Create root SPF vertex.
    fn new_root(router_id: Ipv4Addr) -> Self;
}

// OSPF version-specific code.
pub trait VertexLsaVersion<V: Version>
where
    Self: Send + Sync + std::fmt::Debug,
{
    // Return whether this is a router vertex.
    fn is_router(&self) -> bool;

    // Return the Router-ID of this router vertex.
    fn router_id(&self) -> Ipv4Addr;

    // Return the options of this router vertex.
    fn router_options(&self) -> V::PacketOptions;

    // Return the flags of this router vertex.
    fn router_flags(&self) -> V::LsaRouterFlags;

    // Return the Link State Origin of this vertex.
    fn origin(&self) -> LsaKey<V::LsaType>;
}

// ===== global functions =====

// This is the SPF main function.
//
// Builds the shortest-path tree rooted at this router and the table of all
// settled routers in the area.
pub(crate) fn run<V>(
    router_id: Ipv4Addr,
    lsdb: &Lsdb<V>,
) -> Result<(Spt<V>, BTreeMap<Ipv4Addr, RouteRtr<V>>), Error<V>>
where
    V: Version,
{
    // Get root vertex.
    let root_vid = V::VertexId::new_root(router_id);
    let root_vlsa = V::vertex_lsa_find(root_vid, lsdb)
        .ok_or(Error::SpfRootNotFound(router_id))?;
    let root_v = Vertex::<V>::new(root_vid, root_vlsa, 0, 0);

    // Initialize SPT and candidate list.
    let mut spt = BTreeMap::new();
    let mut routers = BTreeMap::new();
    let mut cand_list = BTreeMap::new();
    cand_list.insert((root_v.distance, root_v.id), root_v);

    // Main SPF loop.
    while let Some(((_, vertex_id), vertex)) = cand_list.pop_first() {
        // Add vertex to SPT.
        spt.insert(vertex.id, vertex);
        let vertex = spt.get(&vertex_id).unwrap();

        if vertex.lsa.is_router() {
            // Add "router" routing table entry.
            let route = RouteRtr::new(
                PathType::IntraArea,
                vertex.lsa.router_options(),
                vertex.lsa.router_flags(),
                vertex.distance.into(),
                vertex.nexthops.clone(),
            );
            routers.insert(vertex.lsa.router_id(), route);
        }

        // Iterate over all links described by the vertex's LSA.
        for link in V::vertex_lsa_links(&vertex.lsa, lsdb) {
            // Check if the LSAs are mutually linked.
            if !V::vertex_lsa_links(&link.lsa, lsdb)
                .any(|link| link.id == vertex.id)
            {
                continue;
            }

            // Check if the link's vertex is already on the shortest-path
            // tree.
            if spt.get(&link.id).is_some() {
                continue;
            }

            // Calculate distance to the link's vertex.
            let distance = vertex.distance.saturating_add(link.cost);

            // Increment number of hops to the root.
            let mut hops = vertex.hops;
            if link.lsa.is_router() {
                hops = hops.saturating_add(1);
            }

            // Check if this vertex is already present on the candidate list.
            if let Some((cand_key, _)) =
                cand_list.iter().find(|(_, cand_v)| cand_v.id == link.id)
            {
                let cand_key = *cand_key;
                match distance.cmp(&cand_key.0) {
                    Ordering::Less => {
                        // Remove vertex since its key has changed. It will be
                        // re-added with the correct key below.
                        cand_list.remove(&cand_key);
                    }
                    Ordering::Equal => {
                        // Equal-cost path: its nexthops merge below. Each
                        // nexthop records the LSA its first hop was learned
                        // from, and the smallest (advertising router,
                        // link-state ID) pair is the one reported to the
                        // sink.
                    }
                    Ordering::Greater => {
                        // Ignore higher cost path.
                        continue;
                    }
                }
            }
            let cand_v =
                cand_list.entry((distance, link.id)).or_insert_with(|| {
                    Vertex::new(link.id, link.lsa, distance, hops)
                });

            // Update vertex's nexthops.
            match calc_nexthops(
                router_id,
                vertex,
                link.parent,
                link.id,
                &cand_v.lsa,
                lsdb,
            ) {
                Ok(nexthops) => cand_v.nexthops.extend(nexthops),
                Err(error) => error.log(),
            }
        }
    }

    Ok((spt, routers))
}

// ===== helper functions =====

// Computes the set of nexthops that should be used to reach the given
// destination.
fn calc_nexthops<V>(
    router_id: Ipv4Addr,
    parent: &Vertex<V>,
    parent_link: Option<&V::LsaRouterLink>,
    dest_id: V::VertexId,
    dest_lsa: &V::VertexLsa,
    lsdb: &Lsdb<V>,
) -> Result<Nexthops<V::IpAddr>, Error<V>>
where
    V: Version,
{
    if parent.hops == 0 {
        // The parent vertex is the root or a network that directly connects
        // the calculating router to the destination router.
        V::calc_nexthops(router_id, parent, parent_link, dest_id, dest_lsa, lsdb)
    } else {
        // If there is at least one intervening router in the current shortest
        // path between the destination and the root, the destination simply
        // inherits the set of next hops from the parent.
        Ok(parent.nexthops.clone())
    }
}
