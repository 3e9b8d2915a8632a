//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::sync::Arc;

use enum_as_inner::EnumAsInner;
use ipnetwork::Ipv4Network;
use xorp_utils::ip::IpNetworkKind;

use crate::error::Error;
use crate::lsdb::Lsdb;
use crate::ospfv2::packet::Options;
use crate::ospfv2::packet::lsa::{
    LsaAsExternalFlags, LsaRouterFlags, LsaRouterLink, LsaRouterLinkType,
    LsaType, LsaTypeCode,
};
use crate::packet::lsa::{Lsa, LsaHdrVersion, LsaKey};
use crate::route::{Nexthop, Nexthops};
use crate::spf::{
    SpfExternalNetwork, SpfInterAreaNetwork, SpfInterAreaRouter,
    SpfIntraAreaNetwork, SpfLink, SpfVersion, Spt, Vertex, VertexIdVersion,
    VertexLsaVersion,
};
use crate::version::Ospfv2;

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum VertexId {
    Network { dr_addr: Ipv4Addr },
    Router { router_id: Ipv4Addr },
}

#[derive(Debug, Eq, PartialEq, EnumAsInner)]
pub enum VertexLsa {
    Network(Arc<Lsa<Ospfv2>>),
    Router(Arc<Lsa<Ospfv2>>),
}

// ===== impl VertexId =====

impl VertexIdVersion for VertexId {
    fn new_root(router_id: Ipv4Addr) -> Self {
        VertexId::Router { router_id }
    }
}

// ===== impl VertexLsa =====

impl VertexLsaVersion<Ospfv2> for VertexLsa {
    fn is_router(&self) -> bool {
        matches!(self, VertexLsa::Router(_))
    }

    fn router_id(&self) -> Ipv4Addr {
        let lsa = self.as_router().unwrap();
        lsa.hdr.adv_rtr
    }

    fn router_options(&self) -> Options {
        let lsa = self.as_router().unwrap();
        lsa.hdr.options
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

// ===== impl Ospfv2 =====

impl SpfVersion<Self> for Ospfv2 {
    type VertexId = VertexId;
    type VertexLsa = VertexLsa;

    fn calc_nexthops(
        router_id: Ipv4Addr,
        parent: &Vertex<Self>,
        _parent_link: Option<&LsaRouterLink>,
        dest_id: VertexId,
        dest_lsa: &VertexLsa,
        _lsdb: &Lsdb<Self>,
    ) -> Result<Nexthops<Ipv4Addr>, Error<Self>> {
        let mut nexthops = Nexthops::new();

        match &parent.lsa {
            // The parent vertex is the root.
            VertexLsa::Router(_parent_lsa) => {
                match dest_lsa {
                    VertexLsa::Router(dest_lsa) => {
                        // The destination is a directly connected router.
                        // Its Router-LSA link pointing back to the
                        // calculating router provides the neighbor's
                        // interface address.
                        let nbr_router_id = dest_lsa.hdr.adv_rtr;
                        nexthops.extend(
                            dest_lsa
                                .body
                                .as_router()
                                .unwrap()
                                .links
                                .iter()
                                .filter(|link| {
                                    matches!(
                                        link.link_type,
                                        LsaRouterLinkType::PointToPoint
                                            | LsaRouterLinkType::VirtualLink
                                    )
                                })
                                .filter(|link| link.link_id == router_id)
                                .map(|link| {
                                    let nexthop_addr = link.link_data;
                                    (
                                        Some(nexthop_addr),
                                        Nexthop::new(
                                            Some(nexthop_addr),
                                            Some(nbr_router_id),
                                            dest_lsa.hdr.adv_rtr,
                                            dest_lsa.hdr.lsa_id,
                                        ),
                                    )
                                }),
                        );
                        if nexthops.is_empty() {
                            return Err(Error::SpfNexthopCalcError(dest_id));
                        }
                    }
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
                }
            }
            // The parent vertex is a network that directly connects the
            // calculating router to the destination router.
            VertexLsa::Network(parent_lsa) => {
                // The list of next hops is then determined by examining the
                // destination's router-LSA. For each link in the router-LSA
                // that points back to the parent network, the link's Link
                // Data field provides the IP address of a next hop router.
                let lsa_body = parent_lsa.body.as_network().unwrap();
                let parent_network = Ipv4Network::with_netmask(
                    parent_lsa.hdr.lsa_id,
                    lsa_body.mask,
                )
                .map_err(|_| Error::SpfNexthopCalcError(dest_id))?;
                let dest_lsa = dest_lsa
                    .as_router()
                    .ok_or(Error::SpfNexthopCalcError(dest_id))?;
                let dest_link = dest_lsa
                    .body
                    .as_router()
                    .unwrap()
                    .links
                    .iter()
                    .filter(|link| {
                        link.link_type == LsaRouterLinkType::TransitNetwork
                    })
                    .find(|link| parent_network.contains(link.link_data))
                    .ok_or(Error::SpfNexthopCalcError(dest_id))?;

                // Get nexthop address.
                let nbr_router_id = dest_lsa.hdr.adv_rtr;
                let nexthop_addr = dest_link.link_data;

                // Add nexthop.
                nexthops.insert(
                    Some(nexthop_addr),
                    Nexthop::new(
                        Some(nexthop_addr),
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
            VertexId::Network { dr_addr } => {
                // SPF needs to find a Network-LSA knowing only its LS-ID but
                // not its advertising router.
                lsdb.iter_by_type(LsaTypeCode::Network.into())
                    .map(|(_, lse)| &lse.data)
                    .find(|lsa| lsa.hdr.lsa_id == dr_addr)
                    .filter(|lsa| !lsa.hdr.is_maxage())
                    .map(|lsa| VertexLsa::Network(lsa.clone()))
            }
            VertexId::Router { router_id } => {
                let lsa_key = LsaKey::new(
                    LsaTypeCode::Router.into(),
                    router_id,
                    router_id,
                );
                lsdb.get(&lsa_key)
                    .filter(|lse| !lse.data.hdr.is_maxage())
                    .map(|lse| VertexLsa::Router(lse.data.clone()))
            }
        }
    }

    fn vertex_lsa_links<'a>(
        vertex_lsa: &'a VertexLsa,
        lsdb: &'a Lsdb<Ospfv2>,
    ) -> Box<dyn Iterator<Item = SpfLink<'a, Ospfv2>> + 'a> {
        match vertex_lsa {
            VertexLsa::Network(lsa) => {
                let lsa_body = lsa.body.as_network().unwrap();
                let iter = lsa_body.attached_rtrs.iter().filter_map(
                    move |router_id| {
                        let link_vid = VertexId::Router {
                            router_id: *router_id,
                        };
                        Ospfv2::vertex_lsa_find(link_vid, lsdb).map(
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
                                router_id: link.link_id,
                            };
                            Some((link, link_vid, link.metric))
                        }
                        LsaRouterLinkType::TransitNetwork => {
                            let link_vid = VertexId::Network {
                                dr_addr: link.link_id,
                            };
                            Some((link, link_vid, link.metric))
                        }
                        LsaRouterLinkType::StubNetwork => None,
                    })
                    .filter_map(move |(link, link_vid, cost)| {
                        Ospfv2::vertex_lsa_find(link_vid, lsdb).map(
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
        _lsdb: &'a Lsdb<Self>,
    ) -> Box<dyn Iterator<Item = SpfIntraAreaNetwork<'a, Self>> + 'a> {
        let mut stubs = vec![];

        for vertex in spt.values() {
            match &vertex.lsa {
                VertexLsa::Network(lsa) => {
                    let lsa_body = lsa.body.as_network().unwrap();
                    let Ok(prefix) = Ipv4Network::with_netmask(
                        lsa.hdr.lsa_id,
                        lsa_body.mask,
                    ) else {
                        continue;
                    };
                    let prefix = prefix.apply_mask();

                    stubs.push(SpfIntraAreaNetwork {
                        vertex,
                        prefix,
                        prefix_options: Default::default(),
                        metric: 0,
                    });
                }
                VertexLsa::Router(lsa) => {
                    let lsa_body = lsa.body.as_router().unwrap();
                    stubs.extend(
                        lsa_body
                            .links
                            .iter()
                            .filter(|link| {
                                link.link_type
                                    == LsaRouterLinkType::StubNetwork
                            })
                            .filter_map(|link| {
                                let prefix = Ipv4Network::with_netmask(
                                    link.link_id,
                                    link.link_data,
                                )
                                .ok()?;
                                let prefix = prefix.apply_mask();

                                Some(SpfIntraAreaNetwork {
                                    vertex,
                                    prefix,
                                    prefix_options: Default::default(),
                                    metric: link.metric,
                                })
                            }),
                    )
                }
            }
        }

        Box::new(stubs.into_iter())
    }

    fn inter_area_networks<'a>(
        lsdb: &'a Lsdb<Self>,
    ) -> Box<dyn Iterator<Item = SpfInterAreaNetwork<Self>> + 'a> {
        let iter = lsdb
            .iter_by_type(LsaTypeCode::SummaryNetwork.into())
            .map(|(_, lse)| &lse.data)
            .filter(|lsa| !lsa.hdr.is_maxage())
            .filter_map(|lsa| {
                let lsa_body = lsa.body.as_summary_network().unwrap();
                let prefix =
                    Ipv4Network::with_netmask(lsa.hdr.lsa_id, lsa_body.mask)
                        .ok()?;

                Some(SpfInterAreaNetwork {
                    adv_rtr: lsa.hdr.adv_rtr,
                    prefix: prefix.apply_mask(),
                    prefix_options: Default::default(),
                    metric: lsa_body.metric,
                })
            });
        Box::new(iter)
    }

    fn inter_area_routers<'a>(
        lsdb: &'a Lsdb<Self>,
    ) -> Box<dyn Iterator<Item = SpfInterAreaRouter<Self>> + 'a> {
        let iter = lsdb
            .iter_by_type(LsaTypeCode::SummaryRouter.into())
            .map(|(_, lse)| &lse.data)
            .filter(|lsa| !lsa.hdr.is_maxage())
            .map(|lsa| {
                let lsa_body = lsa.body.as_summary_router().unwrap();
                SpfInterAreaRouter {
                    adv_rtr: lsa.hdr.adv_rtr,
                    router_id: lsa.hdr.lsa_id,
                    options: lsa.hdr.options,
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
            .iter_by_type(LsaTypeCode::AsExternal.into())
            .map(|(_, lse)| &lse.data)
            .filter(|lsa| !lsa.hdr.is_maxage())
            .filter_map(|lsa| {
                let lsa_body = lsa.body.as_as_external().unwrap();
                let prefix =
                    Ipv4Network::with_netmask(lsa.hdr.lsa_id, lsa_body.mask)
                        .ok()?;

                Some(SpfExternalNetwork {
                    adv_rtr: lsa.hdr.adv_rtr,
                    e_bit: lsa_body.flags.contains(LsaAsExternalFlags::E),
                    prefix: prefix.apply_mask(),
                    prefix_options: Default::default(),
                    metric: lsa_body.metric,
                    fwd_addr: lsa_body.fwd_addr,
                    tag: Some(lsa_body.tag),
                })
            });
        Box::new(iter)
    }
}
