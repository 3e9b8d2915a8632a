//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use enum_as_inner::EnumAsInner;

use crate::error::Error;
use crate::lsdb::Lsdb;
use crate::ospfv3::packet::Options;
use crate::ospfv3::packet::lsa::{
    LsaAsExternal, LsaAsExternalFlags, LsaFunctionCode, LsaInterAreaPrefix,
    LsaInterAreaRouter, LsaIntraAreaPrefix, LsaLink, LsaNetwork, LsaRouter,
    LsaRouterFlags, LsaRouterLink, LsaRouterLinkType, LsaType,
};
use crate::packet::lsa::{Lsa, LsaHdrVersion, LsaKey};
use crate::route::{Nexthop, Nexthops};
use crate::spf::{
    SpfExternalNetwork, SpfInterAreaNetwork, SpfInterAreaRouter,
    SpfIntraAreaNetwork, SpfLink, SpfVersion, Spt, Vertex, VertexIdVersion,
    VertexLsaVersion,
};
use crate::version::Ospfv3;

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum VertexId {
    Network {
        router_id: Ipv4Addr,
        iface_id: u32,
    },
    Router {
        router_id: Ipv4Addr,
    },
}

#[derive(Debug, Eq, PartialEq, EnumAsInner)]
pub enum VertexLsa {
    Network(Arc<Lsa<Ospfv3>>),
    Router(Arc<Lsa<Ospfv3>>),
}

// ===== impl VertexId =====

impl VertexIdVersion for VertexId {
    fn new_root(router_id: Ipv4Addr) -> Self {
        VertexId::Router { router_id }
    }
}

// ===== impl VertexLsa =====

impl VertexLsaVersion<Ospfv3> for VertexLsa {
    fn is_router(&self) -> bool {
        matches!(self, VertexLsa::Router(_))
    }

    fn router_id(&self) -> Ipv4Addr {
        let lsa = self.as_router().unwrap();
        lsa.hdr.adv_rtr
    }

    fn router_options(&self) -> Options {
        let lsa = self.as_router().unwrap();
        let lsa_body = lsa.body.as_router().unwrap();
        lsa_body.options
    }

    fn router_flags(&self) -> LsaRouterFlags {
        let lsa = self.as_router().unwrap();
        let lsa_body = lsa.body.as_router().unwrap();
        lsa_body.flags
    }

    fn origin(&self) -> LsaKey<LsaType> {
        let lsa = match self {
            VertexLsa::Network(lsa) => lsa,
            VertexLsa::Router(lsa) => lsa,
        };
        lsa.hdr.key()
    }
}

// ===== impl Ospfv3 =====

impl SpfVersion<Self> for Ospfv3 {
    type VertexId = VertexId;
    type VertexLsa = VertexLsa;

    fn calc_nexthops(
        _router_id: Ipv4Addr,
        _parent: &Vertex<Self>,
        _parent_link: Option<&LsaRouterLink>,
        dest_id: VertexId,
        dest_lsa: &VertexLsa,
        lsdb: &Lsdb<Self>,
    ) -> Result<Nexthops<Ipv6Addr>, Error<Self>> {
        let mut nexthops = Nexthops::new();

        match dest_lsa {
            VertexLsa::Network(dest_lsa) => {
                // The destination is a directly connected network.
                nexthops.insert(
                    None,
                    Nexthop::new(
                        None,
                        None,
                        dest_lsa.hdr.adv_rtr,
                        dest_lsa.hdr.lsa_id,
                    ),
                );
            }
            VertexLsa::Router(dest_lsa) => {
                // The nexthop address is the neighbor's link-local address,
                // learned from its Link-LSA.
                let nbr_router_id = dest_lsa.hdr.adv_rtr;
                let linklocal = linklocal_addr(lsdb, nbr_router_id)
                    .ok_or(Error::SpfNexthopCalcError(dest_id))?;
                nexthops.insert(
                    Some(linklocal),
                    Nexthop::new(
                        Some(linklocal),
                        Some(nbr_router_id),
                        dest_lsa.hdr.adv_rtr,
                        dest_lsa.hdr.lsa_id,
                    ),
                );
            }
        }

        Ok(nexthops)
    }

    fn vertex_lsa_find(id: VertexId, lsdb: &Lsdb<Self>) -> Option<VertexLsa> {
        match id {
            VertexId::Network {
                router_id,
                iface_id,
            } => {
                let lsa_key = LsaKey::new(
                    LsaNetwork::lsa_type(),
                    router_id,
                    Ipv4Addr::from(iface_id),
                );
                lsdb.get(&lsa_key)
                    .filter(|lse| !lse.data.hdr.is_maxage())
                    .map(|lse| VertexLsa::Network(lse.data.clone()))
            }
            VertexId::Router { router_id } => {
                // In OSPFv3 a router may originate multiple Router-LSAs with
                // arbitrary LSA-IDs; they're treated as a single aggregate.
                lsdb.iter_by_type(LsaRouter::lsa_type())
                    .map(|(_, lse)| &lse.data)
                    .find(|lsa| lsa.hdr.adv_rtr == router_id)
                    .filter(|lsa| !lsa.hdr.is_maxage())
                    .map(|lsa| VertexLsa::Router(lsa.clone()))
            }
        }
    }

    fn vertex_lsa_links<'a>(
        vertex_lsa: &'a VertexLsa,
        lsdb: &'a Lsdb<Ospfv3>,
    ) -> Box<dyn Iterator<Item = SpfLink<'a, Ospfv3>> + 'a> {
        match vertex_lsa {
            VertexLsa::Network(lsa) => {
                let lsa_body = lsa.body.as_network().unwrap();
                let iter = lsa_body.attached_rtrs.iter().filter_map(
                    move |router_id| {
                        let link_vid = VertexId::Router {
                            router_id: *router_id,
                        };
                        Ospfv3::vertex_lsa_find(link_vid, lsdb).map(
                            |link_vlsa| {
                                SpfLink::new(None, link_vid, link_vlsa, 0)
                            },
                        )
                    },
                );
                Box::new(iter)
            }
            VertexLsa::Router(lsa) => {
                let lsa_body = lsa.body.as_router().unwrap();
                let iter = lsa_body
                    .links
                    .iter()
                    .filter_map(|link| match link.link_type {
                        // Virtual links traverse the transit area like
                        // point-to-point links.
                        LsaRouterLinkType::PointToPoint
                        | LsaRouterLinkType::VirtualLink => {
                            let link_vid = VertexId::Router {
                                router_id: link.nbr_router_id,
                            };
                            Some((link, link_vid, link.metric))
                        }
                        LsaRouterLinkType::TransitNetwork => {
                            let link_vid = VertexId::Network {
                                router_id: link.nbr_router_id,
                                iface_id: link.nbr_iface_id,
                            };
                            Some((link, link_vid, link.metric))
                        }
                    })
                    .filter_map(move |(link, link_vid, cost)| {
                        Ospfv3::vertex_lsa_find(link_vid, lsdb).map(
                            |link_vlsa| {
                                SpfLink::new(
                                    Some(link),
                                    link_vid,
                                    link_vlsa,
                                    cost,
                                )
                            },
                        )
                    });
                Box::new(iter)
            }
        }
    }

    fn intra_area_networks<'a>(
        spt: &'a Spt<Self>,
        lsdb: &'a Lsdb<Self>,
    ) -> Box<dyn Iterator<Item = SpfIntraAreaNetwork<'a, Self>> + 'a> {
        let iter = lsdb
            .iter_by_type(LsaIntraAreaPrefix::lsa_type())
            .map(|(_, lse)| &lse.data)
            .filter(|lsa| !lsa.hdr.is_maxage())
            .filter_map(move |lsa| {
                let lsa_body = lsa.body.as_intra_area_prefix().unwrap();

                // Locate the vertex the prefixes are attached to.
                let vertex_id = match lsa_body
                    .ref_lsa_type
                    .function_code()?
                {
                    LsaFunctionCode::Router => VertexId::Router {
                        router_id: lsa_body.ref_adv_rtr,
                    },
                    LsaFunctionCode::Network => VertexId::Network {
                        router_id: lsa_body.ref_adv_rtr,
                        iface_id: u32::from(lsa_body.ref_lsa_id),
                    },
                    _ => return None,
                };
                let vertex = spt.get(&vertex_id)?;

                Some(lsa_body.prefixes.iter().map(move |prefix| {
                    SpfIntraAreaNetwork {
                        vertex,
                        prefix: prefix.value,
                        prefix_options: prefix.options,
                        metric: prefix.metric,
                    }
                }))
            })
            .flatten();
        Box::new(iter)
    }

    fn inter_area_networks<'a>(
        lsdb: &'a Lsdb<Self>,
    ) -> Box<dyn Iterator<Item = SpfInterAreaNetwork<Self>> + 'a> {
        let iter = lsdb
            .iter_by_type(LsaInterAreaPrefix::lsa_type())
            .map(|(_, lse)| &lse.data)
            .filter(|lsa| !lsa.hdr.is_maxage())
            .map(|lsa| {
                let lsa_body = lsa.body.as_inter_area_prefix().unwrap();
                SpfInterAreaNetwork {
                    adv_rtr: lsa.hdr.adv_rtr,
                    prefix: lsa_body.prefix,
                    prefix_options: lsa_body.prefix_options,
                    metric: lsa_body.metric,
                }
            });
        Box::new(iter)
    }

    fn inter_area_routers<'a>(
        lsdb: &'a Lsdb<Self>,
    ) -> Box<dyn Iterator<Item = SpfInterAreaRouter<Self>> + 'a> {
        let iter = lsdb
            .iter_by_type(LsaInterAreaRouter::lsa_type())
            .map(|(_, lse)| &lse.data)
            .filter(|lsa| !lsa.hdr.is_maxage())
            .map(|lsa| {
                let lsa_body = lsa.body.as_inter_area_router().unwrap();
                SpfInterAreaRouter {
                    adv_rtr: lsa.hdr.adv_rtr,
                    router_id: lsa_body.router_id,
                    options: lsa_body.options,
                    flags: LsaRouterFlags::E,
                    metric: lsa_body.metric,
                }
            });
        Box::new(iter)
    }

    fn external_networks<'a>(
        lsdb: &'a Lsdb<Self>,
    ) -> Box<dyn Iterator<Item = SpfExternalNetwork<Self>> + 'a> {
        let iter = lsdb
            .iter_by_type(LsaAsExternal::lsa_type())
            .map(|(_, lse)| &lse.data)
            .filter(|lsa| !lsa.hdr.is_maxage())
            .map(|lsa| {
                let lsa_body = lsa.body.as_as_external().unwrap();
                SpfExternalNetwork {
                    adv_rtr: lsa.hdr.adv_rtr,
                    e_bit: lsa_body.flags.contains(LsaAsExternalFlags::E),
                    prefix: lsa_body.prefix,
                    prefix_options: lsa_body.prefix_options,
                    metric: lsa_body.metric,
                    fwd_addr: lsa_body.fwd_addr,
                    tag: lsa_body.tag,
                }
            });
        Box::new(iter)
    }
}

// ===== helper functions =====

// Finds the link-local address advertised by the given router in its
// Link-LSA.
fn linklocal_addr(lsdb: &Lsdb<Ospfv3>, router_id: Ipv4Addr) -> Option<Ipv6Addr> {
    lsdb.iter_by_type(LsaLink::lsa_type())
        .map(|(_, lse)| &lse.data)
        .filter(|lsa| !lsa.hdr.is_maxage())
        .find(|lsa| lsa.hdr.adv_rtr == router_id)
        .map(|lsa| lsa.body.as_link().unwrap().linklocal)
}
