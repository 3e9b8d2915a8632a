//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cmp::Ordering;
use std::collections::{BTreeMap, btree_map};
use std::net::Ipv4Addr;

use bitflags::bitflags;
use derive_new::new;
use xorp_utils::ip::{IpAddrKind, IpNetworkKind};

use crate::debug::Debug;
use crate::error::Error;
use crate::lsdb::{LSA_INFINITY, Lsdb};
use crate::output::IoSink;
use crate::packet::lsa::{LsaKey, LsaRouterFlagsVersion};
use crate::spf::{Spt, VertexLsaVersion};
use crate::version::Version;

// Network routing table entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RouteNet<V: Version> {
    pub prefix_options: V::PrefixOptions,
    pub origin: Option<LsaKey<V::LsaType>>,
    pub path_type: PathType,
    pub metric: u32,
    pub type2_metric: Option<u32>,
    pub tag: Option<u32>,
    pub nexthops: Nexthops<V::IpAddr>,
    pub flags: RouteNetFlags,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct RouteNetFlags: u8 {
        const CONNECTED = 0x01;
        const INSTALLED = 0x02;
        const DISCARD = 0x04;
    }
}

// Router routing table entry.
#[derive(Clone, Debug, Eq, PartialEq, new)]
pub struct RouteRtr<V: Version> {
    pub path_type: PathType,
    pub options: V::PacketOptions,
    pub flags: V::LsaRouterFlags,
    pub metric: u32,
    pub nexthops: Nexthops<V::IpAddr>,
}

// OSPF path types in decreasing order of preference.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum PathType {
    IntraArea,
    InterArea,
    Type1External,
    Type2External,
}

// Route nexthop.
#[derive(Clone, Copy, Debug, Eq, new, PartialEq)]
pub struct Nexthop<I: IpAddrKind> {
    // Nexthop address (`None` for connected routes).
    pub addr: Option<I>,
    // Router-ID of the remote neighbor (`None` for connected routes).
    pub nbr_router_id: Option<Ipv4Addr>,
    // Advertising router of the LSA the first hop was learned from.
    pub adv_rtr: Ipv4Addr,
    // Link-state ID of the LSA the first hop was learned from.
    pub lsa_id: Ipv4Addr,
}

// Ordered list of nexthops, keyed by nexthop address.
pub type Nexthops<I: IpAddrKind> = BTreeMap<Option<I>, Nexthop<I>>;

// ===== impl RouteNet =====

impl<V> RouteNet<V>
where
    V: Version,
{
    pub(crate) fn metric(&self) -> u32 {
        match self.path_type {
            PathType::IntraArea | PathType::InterArea => self.metric,
            PathType::Type1External => self.metric,
            PathType::Type2External => self.type2_metric.unwrap(),
        }
    }

    // Returns the nexthop address reported through the I/O sink.
    //
    // On equal-cost ties the first hop learned from the LSA with the
    // numerically smallest advertising router, then link-state ID, wins.
    pub(crate) fn sink_nexthop(&self) -> Option<V::IpAddr> {
        self.nexthops
            .values()
            .filter(|nexthop| nexthop.addr.is_some())
            .min_by_key(|nexthop| (nexthop.adv_rtr, nexthop.lsa_id))
            .and_then(|nexthop| nexthop.addr)
    }
}

// ===== global functions =====

// Computes the entire routing table from the SPT and the LSDB.
pub(crate) fn build<V>(
    router_id: Ipv4Addr,
    lsdb: &Lsdb<V>,
    spt: &Spt<V>,
    routers: &mut BTreeMap<Ipv4Addr, RouteRtr<V>>,
) -> BTreeMap<V::IpNetwork, RouteNet<V>>
where
    V: Version,
{
    let mut rib = BTreeMap::new();

    // Compute intra-area routes.
    update_rib_intra_area(&mut rib, spt, lsdb);

    // Compute inter-area routes.
    update_rib_inter_area_networks(&mut rib, router_id, routers, lsdb);
    update_rib_inter_area_routers(router_id, routers, lsdb);

    // Compute external routes.
    update_rib_external(&mut rib, router_id, routers, lsdb);

    rib
}

// Diffs the newly built routing table against the previously installed one
// and pushes the changes to the I/O sink. All deletions are reported before
// all additions.
pub(crate) fn update_sink<V>(
    rib: &mut BTreeMap<V::IpNetwork, RouteNet<V>>,
    mut old_rib: BTreeMap<V::IpNetwork, RouteNet<V>>,
    sink: &mut dyn IoSink<V>,
) where
    V: Version,
{
    let mut deletes = vec![];
    let mut adds = vec![];

    for (prefix, route) in rib.iter_mut() {
        // Connected routes and routes without a usable nexthop stay out of
        // the sink. The list of nexthops might be empty in the case of
        // nexthop computation errors (e.g. missing Link-LSAs).
        let installable = !route.flags.contains(RouteNetFlags::CONNECTED)
            && route.sink_nexthop().is_some();

        let old_route = old_rib.remove(prefix);
        let old_installed = old_route
            .as_ref()
            .map(|old_route| old_route.flags.contains(RouteNetFlags::INSTALLED))
            .unwrap_or(false);

        if !installable {
            // Withdraw the previously installed instance (if any).
            if old_installed {
                deletes.push(*prefix);
            }
            continue;
        }

        if let Some(old_route) = &old_route
            && old_installed
        {
            // Skip reinstalling the route if it hasn't changed.
            if old_route.metric() == route.metric()
                && old_route.tag == route.tag
                && old_route.nexthops == route.nexthops
                && old_route.flags.contains(RouteNetFlags::DISCARD)
                    == route.flags.contains(RouteNetFlags::DISCARD)
            {
                route.flags.insert(RouteNetFlags::INSTALLED);
                continue;
            }

            // The entry changed: the old tuple goes away, the new one is
            // added.
            deletes.push(*prefix);
        }

        route.flags.insert(RouteNetFlags::INSTALLED);
        adds.push((
            *prefix,
            route.sink_nexthop().unwrap(),
            route.metric(),
            route.flags.contains(RouteNetFlags::DISCARD),
            route.nexthops.len() > 1,
        ));
    }

    // Withdraw routes that are no longer present at all.
    for (prefix, _) in old_rib
        .into_iter()
        .filter(|(_, route)| route.flags.contains(RouteNetFlags::INSTALLED))
    {
        deletes.push(prefix);
    }

    for prefix in deletes {
        Debug::<V>::RouteUninstall(&prefix).log();
        if !sink.delete_route(prefix) {
            Error::<V>::RouteUninstallError(prefix).log();
        }
    }
    for (prefix, nexthop, metric, is_discard, is_equal_cost) in adds {
        Debug::<V>::RouteInstall(&prefix, &nexthop, metric).log();
        if !sink.add_route(prefix, nexthop, metric, is_discard, is_equal_cost)
        {
            Error::<V>::RouteInstallError(prefix).log();
        }
    }
}

// Withdraws every installed route from the I/O sink.
pub(crate) fn flush_sink<V>(
    rib: &mut BTreeMap<V::IpNetwork, RouteNet<V>>,
    sink: &mut dyn IoSink<V>,
) where
    V: Version,
{
    for (prefix, route) in rib
        .iter()
        .filter(|(_, route)| route.flags.contains(RouteNetFlags::INSTALLED))
    {
        Debug::<V>::RouteUninstall(prefix).log();
        if !sink.delete_route(*prefix) {
            Error::<V>::RouteUninstallError(*prefix).log();
        }
    }
    rib.clear();
}

// ===== helper functions =====

// Computes intra-area routes.
fn update_rib_intra_area<V>(
    rib: &mut BTreeMap<V::IpNetwork, RouteNet<V>>,
    spt: &Spt<V>,
    lsdb: &Lsdb<V>,
) where
    V: Version,
{
    // Iterate over all stub networks and their corresponding vertices.
    for stub in V::intra_area_networks(spt, lsdb) {
        // Calculate stub metric.
        let metric = stub.vertex.distance.saturating_add(stub.metric) as u32;

        // Compare this distance to the current best cost to the stub
        // network. If the calculated distance is larger, go on to examine
        // the next stub network link in the LSA.
        if let Some(best_route) = rib.get(&stub.prefix)
            && metric > best_route.metric
        {
            continue;
        }

        // Get LS Origin.
        let origin = stub.vertex.lsa.origin();

        // If the newly added vertex is a transit network, the routing table
        // entry for the network is located. If the routing table entry
        // already exists, multiple vertices have mapped to the same IP
        // network. For example, this can occur when a new Designated Router
        // is being established. In this case, the current routing table
        // entry should be overwritten if and only if the newly found path is
        // just as short and the current routing table entry's Link State
        // Origin has a smaller Link State ID than the newly added vertex'
        // LSA.
        if !stub.vertex.lsa.is_router() {
            if let btree_map::Entry::Occupied(o) = rib.entry(stub.prefix) {
                let curr_route = o.get();
                if metric > curr_route.metric
                    || origin.lsa_id < curr_route.origin.unwrap().lsa_id
                {
                    continue;
                }
                o.remove();
            }
        }

        // Create new intra-area route.
        let mut flags = RouteNetFlags::empty();
        if stub.vertex.hops == 0 {
            flags.insert(RouteNetFlags::CONNECTED);
        }
        let new_route = RouteNet {
            prefix_options: stub.prefix_options,
            path_type: PathType::IntraArea,
            origin: Some(origin),
            metric,
            type2_metric: None,
            tag: None,
            nexthops: stub.vertex.nexthops.clone(),
            flags,
        };

        // Try to add or update stub route in the RIB.
        route_update(rib, stub.prefix, new_route);
    }
}

// Computes inter-area "network" routes.
fn update_rib_inter_area_networks<V>(
    rib: &mut BTreeMap<V::IpNetwork, RouteNet<V>>,
    router_id: Ipv4Addr,
    routers: &BTreeMap<Ipv4Addr, RouteRtr<V>>,
    lsdb: &Lsdb<V>,
) where
    V: Version,
{
    // Examine all Type-3 Summary/Inter-Area-Prefix LSAs.
    for lsa in V::inter_area_networks(lsdb)
        // Filter out unreachable LSAs.
        .filter(|lsa| lsa.metric < LSA_INFINITY)
        // Filter out LSAs originated by the calculating router itself.
        .filter(|lsa| lsa.adv_rtr != router_id)
    {
        // Look up the routing table entry for the advertising border router.
        let route_br = match routers
            .get(&lsa.adv_rtr)
            .filter(|route| route.flags.is_abr())
        {
            Some(route_br) => route_br,
            None => {
                // If no such entry exists for router BR, do nothing with this
                // LSA and consider the next in the list.
                Debug::<V>::SpfNetworkUnreachableAbr(&lsa.prefix, lsa.adv_rtr)
                    .log();
                continue;
            }
        };

        // The inter-area path cost is the distance to BR plus the cost
        // specified in the LSA.
        let metric = route_br.metric + lsa.metric;

        // Create new inter-area route.
        let new_route = RouteNet {
            prefix_options: lsa.prefix_options,
            path_type: PathType::InterArea,
            origin: None,
            metric,
            type2_metric: None,
            tag: None,
            nexthops: route_br.nexthops.clone(),
            flags: RouteNetFlags::empty(),
        };

        // Try to add or update summary route in the RIB.
        route_update(rib, lsa.prefix, new_route);
    }
}

// Computes inter-area "router" routes.
fn update_rib_inter_area_routers<V>(
    router_id: Ipv4Addr,
    routers: &mut BTreeMap<Ipv4Addr, RouteRtr<V>>,
    lsdb: &Lsdb<V>,
) where
    V: Version,
{
    let mut new_routes = vec![];

    // Examine all Type-4 Summary/Inter-Area-Router LSAs.
    for lsa in V::inter_area_routers(lsdb)
        // Filter out unreachable LSAs.
        .filter(|lsa| lsa.metric < LSA_INFINITY)
        // Filter out LSAs originated by the calculating router itself.
        .filter(|lsa| lsa.adv_rtr != router_id)
    {
        // Look up the routing table entry for the advertising border router.
        let route_br = match routers
            .get(&lsa.adv_rtr)
            .filter(|route| route.flags.is_abr())
        {
            Some(route_br) => route_br,
            None => {
                // If no such entry exists for router BR, do nothing with this
                // LSA and consider the next in the list.
                Debug::<V>::SpfRouterUnreachableAbr(&lsa.router_id, lsa.adv_rtr)
                    .log();
                continue;
            }
        };

        // The inter-area path cost is the distance to BR plus the cost
        // specified in the LSA.
        let metric = route_br.metric + lsa.metric;

        // Create new inter-area route.
        let new_route = RouteRtr::<V> {
            path_type: PathType::InterArea,
            options: lsa.options,
            flags: lsa.flags,
            metric,
            nexthops: route_br.nexthops.clone(),
        };
        new_routes.push((lsa.router_id, new_route));
    }

    for (router_id, new_route) in new_routes {
        match routers.entry(router_id) {
            btree_map::Entry::Occupied(mut o) => {
                // Intra-area entries are always preferred over inter-area
                // ones; among inter-area entries, lower cost wins.
                let curr_route = o.get();
                if new_route.path_type < curr_route.path_type
                    || (new_route.path_type == curr_route.path_type
                        && new_route.metric < curr_route.metric)
                {
                    o.insert(new_route);
                }
            }
            btree_map::Entry::Vacant(v) => {
                v.insert(new_route);
            }
        }
    }
}

// Computes AS external routes.
fn update_rib_external<V>(
    rib: &mut BTreeMap<V::IpNetwork, RouteNet<V>>,
    router_id: Ipv4Addr,
    routers: &BTreeMap<Ipv4Addr, RouteRtr<V>>,
    lsdb: &Lsdb<V>,
) where
    V: Version,
{
    let mut new_routes = vec![];

    // Examine all AS-external-LSAs.
    for lsa in V::external_networks(lsdb)
        // Filter out unreachable LSAs.
        .filter(|lsa| lsa.metric < LSA_INFINITY)
        // Filter out LSAs originated by the calculating router itself.
        .filter(|lsa| lsa.adv_rtr != router_id)
    {
        // Look up the routing table entry for the AS boundary router (ASBR)
        // that originated the LSA.
        let route_asbr = match routers
            .get(&lsa.adv_rtr)
            .filter(|route| route.flags.is_asbr())
        {
            Some(route_asbr) => route_asbr,
            None => {
                // If no entry exists for router ASBR, do nothing with this
                // LSA and consider the next in the list.
                Debug::<V>::SpfUnreachableAsbr(&lsa.prefix, lsa.adv_rtr).log();
                continue;
            }
        };

        // If the forwarding address is set, the route must be resolved
        // through it; otherwise packets are forwarded toward the ASBR
        // itself.
        let nexthops = match lsa.fwd_addr {
            Some(fwd_addr) => match resolve_fwd_addr(rib, fwd_addr) {
                Some(nexthops) => nexthops,
                None => route_asbr.nexthops.clone(),
            },
            None => route_asbr.nexthops.clone(),
        };

        // Get path type and metric.
        let (path_type, metric, type2_metric) = match lsa.e_bit {
            true => {
                (PathType::Type2External, route_asbr.metric, Some(lsa.metric))
            }
            false => (
                PathType::Type1External,
                route_asbr.metric + lsa.metric,
                None,
            ),
        };

        // Create new external route.
        let new_route = RouteNet {
            prefix_options: lsa.prefix_options,
            path_type,
            origin: None,
            metric,
            type2_metric,
            tag: lsa.tag,
            nexthops,
            flags: RouteNetFlags::empty(),
        };
        new_routes.push((lsa.prefix, new_route));
    }

    // Try to add or update the external routes in the RIB.
    for (prefix, new_route) in new_routes {
        route_update(rib, prefix, new_route);
    }
}

// Resolves an AS-external forwarding address through the intra-area and
// inter-area routes computed so far.
//
// When the forwarding address belongs to a directly attached network, the
// forwarding address itself is the nexthop; otherwise the nexthops of the
// route toward it are inherited. An unresolvable forwarding address returns
// `None`.
fn resolve_fwd_addr<V>(
    rib: &BTreeMap<V::IpNetwork, RouteNet<V>>,
    fwd_addr: V::IpAddr,
) -> Option<Nexthops<V::IpAddr>>
where
    V: Version,
{
    let (_, route) = rib
        .iter()
        .filter(|(_, route)| {
            matches!(
                route.path_type,
                PathType::IntraArea | PathType::InterArea
            )
        })
        .filter(|(prefix, _)| prefix.contains(fwd_addr))
        .max_by_key(|(prefix, _)| prefix.prefix())?;

    if route.flags.contains(RouteNetFlags::CONNECTED) {
        let (adv_rtr, lsa_id) = match route.origin {
            Some(origin) => (origin.adv_rtr, origin.lsa_id),
            None => (Ipv4Addr::UNSPECIFIED, Ipv4Addr::UNSPECIFIED),
        };
        let nexthop = Nexthop::new(Some(fwd_addr), None, adv_rtr, lsa_id);
        Some(std::iter::once((nexthop.addr, nexthop)).collect())
    } else {
        Some(route.nexthops.clone())
    }
}

fn route_update<V>(
    rib: &mut BTreeMap<V::IpNetwork, RouteNet<V>>,
    prefix: V::IpNetwork,
    route: RouteNet<V>,
) where
    V: Version,
{
    match rib.entry(prefix) {
        btree_map::Entry::Occupied(o) => {
            let curr_route = o.into_mut();

            match route_compare(&route, curr_route) {
                Ordering::Less => {
                    // Overwrite the current routing table entry.
                    *curr_route = route;
                }
                Ordering::Equal => {
                    // Merge nexthops.
                    curr_route.nexthops.extend(route.nexthops);
                }
                Ordering::Greater => {
                    // Ignore less preferred route.
                }
            }
        }
        btree_map::Entry::Vacant(v) => {
            v.insert(route);
        }
    }
}

fn route_compare<V>(a: &RouteNet<V>, b: &RouteNet<V>) -> Ordering
where
    V: Version,
{
    let cmp = a.path_type.cmp(&b.path_type);
    if cmp != Ordering::Equal {
        return cmp;
    }

    match a.path_type {
        PathType::IntraArea | PathType::InterArea => a.metric.cmp(&b.metric),
        PathType::Type1External => a.metric.cmp(&b.metric),
        PathType::Type2External => {
            let cmp = a.type2_metric.cmp(&b.type2_metric);
            if cmp != Ordering::Equal {
                return cmp;
            }

            // Equal type-2 metrics fall back to the distance to the ASBR.
            a.metric.cmp(&b.metric)
        }
    }
}
