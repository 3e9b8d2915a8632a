//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use ipnetwork::Ipv4Network;
use xorp_ospf::area::AreaType;
use xorp_ospf::error::Error;
use xorp_ospf::lsdb::LSA_INIT_SEQ_NO;
use xorp_ospf::ospfv2::packet::Options;
use xorp_ospf::ospfv2::packet::lsa::{
    LsaAsExternal, LsaAsExternalFlags, LsaBody, LsaNetwork, LsaRouter,
    LsaRouterFlags, LsaRouterLink, LsaRouterLinkType,
};
use xorp_ospf::output::{DebugIo, IoSink};
use xorp_ospf::packet::lsa::{Lsa, LsaHdrVersion};
use xorp_ospf::peer::{InterfaceType, PeerManager};
use xorp_ospf::replay::{
    self, LsdbDump, ReplayError, TLV_AREA, TLV_CURRENT_VERSION, TLV_LSA,
    TLV_OSPF_VERSION, TLV_SYSTEM_INFO, TLV_VERSION,
};
use xorp_ospf::version::Ospfv2;

//
// Helper functions.
//

fn addr(s: &str) -> Ipv4Addr {
    Ipv4Addr::from_str(s).unwrap()
}

fn prefix(s: &str) -> Ipv4Network {
    Ipv4Network::from_str(s).unwrap()
}

fn p2p(id: &str, data: &str, metric: u16) -> LsaRouterLink {
    LsaRouterLink::new(
        LsaRouterLinkType::PointToPoint,
        addr(id),
        addr(data),
        metric,
    )
}

fn transit(id: &str, data: &str, metric: u16) -> LsaRouterLink {
    LsaRouterLink::new(
        LsaRouterLinkType::TransitNetwork,
        addr(id),
        addr(data),
        metric,
    )
}

fn stub(id: &str, mask: &str, metric: u16) -> LsaRouterLink {
    LsaRouterLink::new(
        LsaRouterLinkType::StubNetwork,
        addr(id),
        addr(mask),
        metric,
    )
}

fn router_lsa(
    adv_rtr: &str,
    flags: LsaRouterFlags,
    links: Vec<LsaRouterLink>,
) -> Arc<Lsa<Ospfv2>> {
    let body = LsaBody::Router(LsaRouter { flags, links });
    Arc::new(Lsa::new(
        0,
        Some(Options::E),
        addr(adv_rtr),
        addr(adv_rtr),
        LSA_INIT_SEQ_NO,
        body,
    ))
}

fn network_lsa(
    lsa_id: &str,
    adv_rtr: &str,
    mask: &str,
    attached: &[&str],
) -> Arc<Lsa<Ospfv2>> {
    let body = LsaBody::Network(LsaNetwork {
        mask: addr(mask),
        attached_rtrs: attached.iter().map(|rtr| addr(rtr)).collect(),
    });
    Arc::new(Lsa::new(
        0,
        Some(Options::E),
        addr(lsa_id),
        addr(adv_rtr),
        LSA_INIT_SEQ_NO,
        body,
    ))
}

// Sink wrapper recording the order of route update callbacks.
#[derive(Debug, Default)]
struct RecordingIo {
    inner: DebugIo<Ospfv2>,
    log: Vec<RouteUpdate>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum RouteUpdate {
    Add(Ipv4Network),
    Delete(Ipv4Network),
}

impl RecordingIo {
    fn new() -> Self {
        Default::default()
    }

    fn clear_log(&mut self) {
        self.log.clear();
    }
}

impl IoSink<Ospfv2> for RecordingIo {
    fn add_route(
        &mut self,
        prefix: Ipv4Network,
        nexthop: Ipv4Addr,
        metric: u32,
        is_discard: bool,
        is_equal_cost: bool,
    ) -> bool {
        self.log.push(RouteUpdate::Add(prefix));
        self.inner
            .add_route(prefix, nexthop, metric, is_discard, is_equal_cost)
    }

    fn delete_route(&mut self, prefix: Ipv4Network) -> bool {
        self.log.push(RouteUpdate::Delete(prefix));
        self.inner.delete_route(prefix)
    }
}

//
// Test scenarios.
//

// Point-to-point topology with a stub network behind the neighbor
// (RFC 2328, Figure 2, seen from RT6).
#[test]
fn routing1() {
    let mut io = DebugIo::new();
    let mut pm = PeerManager::<Ospfv2>::new(addr("0.0.0.6"));
    let area_id = addr("128.16.64.16");

    pm.create_area_router(area_id, AreaType::Normal).unwrap();
    let peer_id = pm
        .create_peer(
            "eth0",
            "vif0",
            addr("192.150.187.78"),
            16,
            1500,
            InterfaceType::Broadcast,
            area_id,
        )
        .unwrap();
    pm.set_state_peer(peer_id, true).unwrap();

    let area = pm.get_area_router_mut(&area_id).unwrap();
    area.replace_self_router_lsa(router_lsa(
        "0.0.0.6",
        LsaRouterFlags::empty(),
        vec![
            p2p("0.0.0.3", "0.0.0.4", 6),
            p2p("0.0.0.5", "0.0.0.6", 6),
            p2p("0.0.0.10", "0.0.0.11", 7),
        ],
    ))
    .unwrap();

    let rt3 = router_lsa(
        "0.0.0.3",
        LsaRouterFlags::empty(),
        vec![
            p2p("0.0.0.6", "0.0.0.7", 8),
            stub("0.4.0.0", "255.255.0.0", 2),
        ],
    );
    area.admit_lsa(rt3.clone()).unwrap();
    area.recompute_routing_table(&mut io);

    assert_eq!(io.routing_table_size(), 1);
    assert!(io.routing_table_verify(
        prefix("0.4.0.0/16"),
        addr("0.0.0.7"),
        8,
        false,
        false,
    ));

    // Deleting the peer Router-LSA and recomputing empties the table.
    area.delete_lsa(&rt3.hdr.key());
    area.recompute_routing_table(&mut io);
    assert_eq!(io.routing_table_size(), 0);

    pm.set_state_peer(peer_id, false).unwrap();
    pm.delete_peer(peer_id).unwrap();
    pm.destroy_area_router(area_id, &mut io).unwrap();
    assert_eq!(io.routing_table_size(), 0);
}

// Broadcast topology with two host routes behind the DR; the Network-LSA is
// the binding glue and removing it invalidates both routes.
#[test]
fn routing2() {
    let mut io = DebugIo::new();
    let rid = "10.0.8.161";
    let prid = "172.16.1.2";
    let mut pm = PeerManager::<Ospfv2>::new(addr(rid));
    let area_id = addr("0.0.0.0");

    pm.create_area_router(area_id, AreaType::Normal).unwrap();
    let area = pm.get_area_router_mut(&area_id).unwrap();

    area.replace_self_router_lsa(router_lsa(
        rid,
        LsaRouterFlags::empty(),
        vec![transit(prid, "172.16.1.1", 1)],
    ))
    .unwrap();

    area.admit_lsa(router_lsa(
        prid,
        LsaRouterFlags::empty(),
        vec![
            transit(prid, prid, 1),
            stub("172.16.2.1", "255.255.255.255", 1),
            stub("172.16.1.100", "255.255.255.255", 1),
        ],
    ))
    .unwrap();

    let nlsa = network_lsa(prid, prid, "255.255.255.252", &[prid, rid]);
    area.admit_lsa(nlsa.clone()).unwrap();
    area.recompute_routing_table(&mut io);

    assert_eq!(io.routing_table_size(), 2);
    assert!(io.routing_table_verify(
        prefix("172.16.1.100/32"),
        addr(prid),
        2,
        false,
        false,
    ));
    assert!(io.routing_table_verify(
        prefix("172.16.2.1/32"),
        addr(prid),
        2,
        false,
        false,
    ));

    // Removing the Network-LSA severs the bidirectional connectivity.
    area.delete_lsa(&nlsa.hdr.key());
    area.recompute_routing_table(&mut io);
    assert_eq!(io.routing_table_size(), 0);

    // Re-adding it restores both routes.
    area.admit_lsa(nlsa.clone()).unwrap();
    area.recompute_routing_table(&mut io);
    assert_eq!(io.routing_table_size(), 2);
    assert!(io.routing_table_verify(
        prefix("172.16.1.100/32"),
        addr(prid),
        2,
        false,
        false,
    ));
    assert!(io.routing_table_verify(
        prefix("172.16.2.1/32"),
        addr(prid),
        2,
        false,
        false,
    ));

    area.delete_lsa(&nlsa.hdr.key());
    area.recompute_routing_table(&mut io);
    assert_eq!(io.routing_table_size(), 0);
}

// An AS-external route through an ASBR on a shared transit network. The
// ASBR's host route supports the computation without being installed.
#[test]
fn routing4() {
    let mut io = DebugIo::new();
    let rid = "10.0.1.1";
    let prid = "10.0.1.6";
    let mut pm = PeerManager::<Ospfv2>::new(addr(rid));
    let area_id = addr("0.0.0.0");

    pm.create_area_router(area_id, AreaType::Normal).unwrap();
    let area = pm.get_area_router_mut(&area_id).unwrap();

    area.replace_self_router_lsa(router_lsa(
        rid,
        LsaRouterFlags::empty(),
        vec![transit(rid, rid, 1)],
    ))
    .unwrap();

    area.admit_lsa(router_lsa(
        prid,
        LsaRouterFlags::E | LsaRouterFlags::B,
        vec![transit(rid, prid, 1)],
    ))
    .unwrap();

    area.admit_lsa(network_lsa(rid, rid, "255.255.0.0", &[rid, prid]))
        .unwrap();

    let body = LsaBody::AsExternal(LsaAsExternal {
        mask: addr("255.255.0.0"),
        flags: LsaAsExternalFlags::empty(),
        metric: 1,
        fwd_addr: Some(addr(prid)),
        tag: 0,
    });
    area.admit_lsa(Arc::new(Lsa::new(
        0,
        Some(Options::E),
        addr("10.20.0.0"),
        addr(prid),
        LSA_INIT_SEQ_NO,
        body,
    )))
    .unwrap();

    area.recompute_routing_table(&mut io);

    assert_eq!(io.routing_table_size(), 1);
    assert!(io.routing_table_verify(
        prefix("10.20.0.0/16"),
        addr(prid),
        2,
        false,
        false,
    ));
}

// An AS-External-LSA whose ASBR is not settled yields no external route.
#[test]
fn external_unreachable_asbr() {
    let mut io = DebugIo::new();
    let rid = "10.0.1.1";
    let mut pm = PeerManager::<Ospfv2>::new(addr(rid));
    let area_id = addr("0.0.0.0");

    pm.create_area_router(area_id, AreaType::Normal).unwrap();
    let area = pm.get_area_router_mut(&area_id).unwrap();

    area.replace_self_router_lsa(router_lsa(
        rid,
        LsaRouterFlags::empty(),
        vec![transit(rid, rid, 1)],
    ))
    .unwrap();

    let body = LsaBody::AsExternal(LsaAsExternal {
        mask: addr("255.255.0.0"),
        flags: LsaAsExternalFlags::empty(),
        metric: 1,
        fwd_addr: None,
        tag: 0,
    });
    area.admit_lsa(Arc::new(Lsa::new(
        0,
        Some(Options::E),
        addr("10.20.0.0"),
        addr("10.0.1.6"),
        LSA_INIT_SEQ_NO,
        body,
    )))
    .unwrap();

    area.recompute_routing_table(&mut io);
    assert_eq!(io.routing_table_size(), 0);
}

// Two equal-cost paths through different neighbors: the reported nexthop is
// the one learned from the LSA with the numerically smaller advertising
// router, not the numerically smaller nexthop address.
#[test]
fn equal_cost_tie_break() {
    let mut io = DebugIo::new();
    let mut pm = PeerManager::<Ospfv2>::new(addr("0.0.0.1"));
    let area_id = addr("0.0.0.1");

    pm.create_area_router(area_id, AreaType::Normal).unwrap();
    let area = pm.get_area_router_mut(&area_id).unwrap();

    area.replace_self_router_lsa(router_lsa(
        "0.0.0.1",
        LsaRouterFlags::empty(),
        vec![
            p2p("0.0.0.2", "0.0.0.10", 5),
            p2p("0.0.0.3", "0.0.0.11", 5),
        ],
    ))
    .unwrap();

    // The smaller advertising router answers with the numerically larger
    // interface address, so address ordering would pick the wrong hop.
    area.admit_lsa(router_lsa(
        "0.0.0.2",
        LsaRouterFlags::empty(),
        vec![
            p2p("0.0.0.1", "0.0.0.99", 5),
            p2p("0.0.0.4", "0.0.0.12", 5),
            stub("10.9.0.0", "255.255.0.0", 5),
        ],
    ))
    .unwrap();
    area.admit_lsa(router_lsa(
        "0.0.0.3",
        LsaRouterFlags::empty(),
        vec![
            p2p("0.0.0.1", "0.0.0.44", 5),
            p2p("0.0.0.4", "0.0.0.13", 5),
            stub("10.9.0.0", "255.255.0.0", 5),
        ],
    ))
    .unwrap();
    // A common router behind both neighbors, so its vertex merges two
    // equal-cost paths on the candidate list.
    area.admit_lsa(router_lsa(
        "0.0.0.4",
        LsaRouterFlags::empty(),
        vec![
            p2p("0.0.0.2", "0.0.0.14", 5),
            p2p("0.0.0.3", "0.0.0.15", 5),
            stub("10.8.0.0", "255.255.0.0", 1),
        ],
    ))
    .unwrap();

    area.recompute_routing_table(&mut io);
    assert_eq!(io.routing_table_size(), 2);

    // The stub advertised by both neighbors at equal cost.
    assert!(io.routing_table_verify(
        prefix("10.9.0.0/16"),
        addr("0.0.0.99"),
        10,
        false,
        true,
    ));
    // The stub behind the merged candidate vertex.
    assert!(io.routing_table_verify(
        prefix("10.8.0.0/16"),
        addr("0.0.0.99"),
        11,
        false,
        true,
    ));
}

// Two successive recomputes over the same LSDB yield identical routing
// tables and no sink callbacks on the second run.
#[test]
fn spt_determinism() {
    let mut io = RecordingIo::new();
    let mut pm = PeerManager::<Ospfv2>::new(addr("0.0.0.6"));
    let area_id = addr("0.0.0.1");

    pm.create_area_router(area_id, AreaType::Normal).unwrap();
    let area = pm.get_area_router_mut(&area_id).unwrap();

    area.replace_self_router_lsa(router_lsa(
        "0.0.0.6",
        LsaRouterFlags::empty(),
        vec![p2p("0.0.0.3", "0.0.0.4", 6)],
    ))
    .unwrap();
    area.admit_lsa(router_lsa(
        "0.0.0.3",
        LsaRouterFlags::empty(),
        vec![
            p2p("0.0.0.6", "0.0.0.7", 8),
            stub("0.4.0.0", "255.255.0.0", 2),
        ],
    ))
    .unwrap();

    area.recompute_routing_table(&mut io);
    assert_eq!(io.inner.routing_table_size(), 1);

    io.clear_log();
    area.recompute_routing_table(&mut io);
    assert!(io.log.is_empty());
    assert_eq!(io.inner.routing_table_size(), 1);
}

// Within a single recompute, all deletions are pushed before all additions.
#[test]
fn diff_ordering() {
    let mut io = RecordingIo::new();
    let mut pm = PeerManager::<Ospfv2>::new(addr("0.0.0.6"));
    let area_id = addr("0.0.0.1");

    pm.create_area_router(area_id, AreaType::Normal).unwrap();
    let area = pm.get_area_router_mut(&area_id).unwrap();

    area.replace_self_router_lsa(router_lsa(
        "0.0.0.6",
        LsaRouterFlags::empty(),
        vec![p2p("0.0.0.3", "0.0.0.4", 6)],
    ))
    .unwrap();
    area.admit_lsa(router_lsa(
        "0.0.0.3",
        LsaRouterFlags::empty(),
        vec![
            p2p("0.0.0.6", "0.0.0.7", 8),
            stub("0.4.0.0", "255.255.0.0", 2),
            stub("0.5.0.0", "255.255.0.0", 2),
        ],
    ))
    .unwrap();
    area.recompute_routing_table(&mut io);
    assert_eq!(io.inner.routing_table_size(), 2);

    // Replace the peer LSA: one stub changes metric, one disappears, a new
    // one shows up.
    let mut newer = (*router_lsa(
        "0.0.0.3",
        LsaRouterFlags::empty(),
        vec![
            p2p("0.0.0.6", "0.0.0.7", 8),
            stub("0.4.0.0", "255.255.0.0", 5),
            stub("0.6.0.0", "255.255.0.0", 2),
        ],
    ))
    .clone();
    newer.hdr.seq_no = LSA_INIT_SEQ_NO + 1;
    newer.encode();
    area.admit_lsa(Arc::new(newer)).unwrap();

    io.clear_log();
    area.recompute_routing_table(&mut io);

    let first_add = io
        .log
        .iter()
        .position(|update| matches!(update, RouteUpdate::Add(..)))
        .unwrap();
    assert!(
        io.log[..first_add]
            .iter()
            .all(|update| matches!(update, RouteUpdate::Delete(..)))
    );
    assert!(
        io.log[first_add..]
            .iter()
            .all(|update| matches!(update, RouteUpdate::Add(..)))
    );

    // 0.4.0.0/16 changed (delete + add), 0.5.0.0/16 went away, 0.6.0.0/16
    // is new.
    assert!(io.log.contains(&RouteUpdate::Delete(prefix("0.4.0.0/16"))));
    assert!(io.log.contains(&RouteUpdate::Delete(prefix("0.5.0.0/16"))));
    assert!(io.log.contains(&RouteUpdate::Add(prefix("0.4.0.0/16"))));
    assert!(io.log.contains(&RouteUpdate::Add(prefix("0.6.0.0/16"))));
    assert_eq!(io.log.len(), 4);
}

// Full lifecycle: the area's routes are drained when it is destroyed.
#[test]
fn lifecycle() {
    let mut io = DebugIo::new();
    let mut pm = PeerManager::<Ospfv2>::new(addr("0.0.0.6"));
    let area_id = addr("0.0.0.1");

    pm.create_area_router(area_id, AreaType::Normal).unwrap();
    let peer_id = pm
        .create_peer(
            "eth0",
            "vif0",
            addr("192.0.2.1"),
            24,
            1500,
            InterfaceType::Broadcast,
            area_id,
        )
        .unwrap();
    pm.set_state_peer(peer_id, true).unwrap();

    let area = pm.get_area_router_mut(&area_id).unwrap();
    area.replace_self_router_lsa(router_lsa(
        "0.0.0.6",
        LsaRouterFlags::empty(),
        vec![p2p("0.0.0.3", "0.0.0.4", 6)],
    ))
    .unwrap();
    area.admit_lsa(router_lsa(
        "0.0.0.3",
        LsaRouterFlags::empty(),
        vec![
            p2p("0.0.0.6", "0.0.0.7", 8),
            stub("0.4.0.0", "255.255.0.0", 2),
        ],
    ))
    .unwrap();
    area.recompute_routing_table(&mut io);
    assert_eq!(io.routing_table_size(), 1);

    // Tearing down out of order is refused.
    assert!(matches!(
        pm.delete_peer(peer_id),
        Err(Error::PeerBusy(..))
    ));
    assert!(matches!(
        pm.destroy_area_router(area_id, &mut io),
        Err(Error::AreaBusy(..))
    ));

    // Ordered teardown drains the sink.
    pm.set_state_peer(peer_id, false).unwrap();
    pm.delete_peer(peer_id).unwrap();
    pm.destroy_area_router(area_id, &mut io).unwrap();
    assert_eq!(io.routing_table_size(), 0);
}

// LSAs are only admitted through peers that are up.
#[test]
fn peer_gating() {
    let mut pm = PeerManager::<Ospfv2>::new(addr("0.0.0.6"));
    let area_id = addr("0.0.0.1");

    pm.create_area_router(area_id, AreaType::Normal).unwrap();
    let peer_id = pm
        .create_peer(
            "eth0",
            "vif0",
            addr("192.0.2.1"),
            24,
            1500,
            InterfaceType::Broadcast,
            area_id,
        )
        .unwrap();

    let lsa = router_lsa(
        "0.0.0.3",
        LsaRouterFlags::empty(),
        vec![p2p("0.0.0.6", "0.0.0.7", 8)],
    );

    assert!(matches!(
        pm.admit_lsa(peer_id, lsa.clone()),
        Err(Error::PeerDown(..))
    ));
    assert_eq!(
        pm.get_area_router(&area_id).unwrap().lsdb().len(),
        0
    );

    pm.set_state_peer(peer_id, true).unwrap();
    pm.admit_lsa(peer_id, lsa).unwrap();
    assert_eq!(
        pm.get_area_router(&area_id).unwrap().lsdb().len(),
        1
    );
}

// Admitting an older instance of a stored LSA is a no-op and produces no
// recompute deltas.
#[test]
fn stale_admit() {
    let mut io = RecordingIo::new();
    let mut pm = PeerManager::<Ospfv2>::new(addr("0.0.0.6"));
    let area_id = addr("0.0.0.1");

    pm.create_area_router(area_id, AreaType::Normal).unwrap();
    let area = pm.get_area_router_mut(&area_id).unwrap();

    area.replace_self_router_lsa(router_lsa(
        "0.0.0.6",
        LsaRouterFlags::empty(),
        vec![p2p("0.0.0.3", "0.0.0.4", 6)],
    ))
    .unwrap();

    let older = router_lsa(
        "0.0.0.3",
        LsaRouterFlags::empty(),
        vec![
            p2p("0.0.0.6", "0.0.0.7", 8),
            stub("0.4.0.0", "255.255.0.0", 2),
        ],
    );
    let mut newer = (*older).clone();
    newer.hdr.seq_no = LSA_INIT_SEQ_NO + 1;
    newer.encode();
    let newer = Arc::new(newer);

    area.admit_lsa(newer.clone()).unwrap();
    area.recompute_routing_table(&mut io);
    assert_eq!(io.inner.routing_table_size(), 1);

    // The older instance is dropped silently.
    area.admit_lsa(older).unwrap();
    assert!(!area.is_dirty());
    assert_eq!(
        area.lsdb().get(&newer.hdr.key()).unwrap().data.hdr.seq_no,
        newer.hdr.seq_no,
    );

    io.clear_log();
    area.recompute_routing_table(&mut io);
    assert!(io.log.is_empty());
    assert_eq!(io.inner.routing_table_size(), 1);
}

// A MaxAge arrival purges the stored instance.
#[test]
fn maxage_purge() {
    let mut io = DebugIo::new();
    let mut pm = PeerManager::<Ospfv2>::new(addr("0.0.0.6"));
    let area_id = addr("0.0.0.1");

    pm.create_area_router(area_id, AreaType::Normal).unwrap();
    let area = pm.get_area_router_mut(&area_id).unwrap();

    area.replace_self_router_lsa(router_lsa(
        "0.0.0.6",
        LsaRouterFlags::empty(),
        vec![p2p("0.0.0.3", "0.0.0.4", 6)],
    ))
    .unwrap();

    let lsa = router_lsa(
        "0.0.0.3",
        LsaRouterFlags::empty(),
        vec![
            p2p("0.0.0.6", "0.0.0.7", 8),
            stub("0.4.0.0", "255.255.0.0", 2),
        ],
    );
    area.admit_lsa(lsa.clone()).unwrap();
    area.recompute_routing_table(&mut io);
    assert_eq!(io.routing_table_size(), 1);

    let mut flushed = (*lsa).clone();
    flushed.hdr.seq_no = LSA_INIT_SEQ_NO + 1;
    flushed.encode();
    flushed.set_maxage();
    area.admit_lsa(Arc::new(flushed)).unwrap();
    assert_eq!(area.lsdb().len(), 1);

    area.recompute_routing_table(&mut io);
    assert_eq!(io.routing_table_size(), 0);
}

//
// LSDB dump replay.
//

fn put_record(buf: &mut BytesMut, tlv_type: u32, value: &[u8]) {
    buf.put_u32(tlv_type);
    buf.put_u32(value.len() as u32);
    buf.put_slice(value);
}

fn build_dump() -> Bytes {
    let rt6 = router_lsa(
        "0.0.0.6",
        LsaRouterFlags::empty(),
        vec![p2p("0.0.0.3", "0.0.0.4", 6)],
    );
    let rt3 = router_lsa(
        "0.0.0.3",
        LsaRouterFlags::empty(),
        vec![
            p2p("0.0.0.6", "0.0.0.7", 8),
            stub("0.4.0.0", "255.255.0.0", 2),
        ],
    );

    let mut buf = BytesMut::new();
    put_record(&mut buf, TLV_VERSION, &TLV_CURRENT_VERSION.to_be_bytes());
    put_record(&mut buf, TLV_SYSTEM_INFO, b"test build\0");
    put_record(&mut buf, TLV_OSPF_VERSION, &2u32.to_be_bytes());
    put_record(&mut buf, TLV_AREA, &u32::from(addr("0.0.0.0")).to_be_bytes());
    put_record(&mut buf, TLV_LSA, &rt6.raw);
    put_record(&mut buf, TLV_LSA, &rt3.raw);
    buf.freeze()
}

// A replayed dump produces the same routing table on two independent runs.
#[test]
fn replay_deterministic() {
    let dump = LsdbDump::<Ospfv2>::decode(build_dump()).unwrap();
    assert_eq!(dump.system_info, "test build");
    assert_eq!(dump.area_id, addr("0.0.0.0"));
    assert_eq!(dump.lsas.len(), 1);

    let mut io1 = DebugIo::new();
    let pm = replay::replay(&dump, &mut io1).unwrap();
    assert_eq!(pm.router_id(), addr("0.0.0.6"));
    assert_eq!(io1.routing_table_size(), 1);
    assert!(io1.routing_table_verify(
        prefix("0.4.0.0/16"),
        addr("0.0.0.7"),
        8,
        false,
        false,
    ));

    let mut io2 = DebugIo::new();
    replay::replay(&dump, &mut io2).unwrap();
    assert!(io1.routing_table().eq(io2.routing_table()));
}

// Dumps are also loadable from a file.
#[test]
fn replay_from_file() {
    let path = std::env::temp_dir()
        .join(format!("xorp-ospf-replay-{}.dump", std::process::id()));
    std::fs::write(&path, build_dump()).unwrap();

    let dump = LsdbDump::<Ospfv2>::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let mut io = DebugIo::new();
    replay::replay(&dump, &mut io).unwrap();
    assert_eq!(io.routing_table_size(), 1);
}

#[test]
fn replay_malformed_dumps() {
    // OSPF version mismatch.
    let mut buf = BytesMut::new();
    put_record(&mut buf, TLV_VERSION, &TLV_CURRENT_VERSION.to_be_bytes());
    put_record(&mut buf, TLV_SYSTEM_INFO, b"test build\0");
    put_record(&mut buf, TLV_OSPF_VERSION, &3u32.to_be_bytes());
    assert!(matches!(
        LsdbDump::<Ospfv2>::decode(buf.freeze()),
        Err(ReplayError::OspfVersionMismatch { .. })
    ));

    // Truncated record.
    let dump = build_dump();
    let truncated = dump.slice(0..dump.len() - 4);
    assert!(matches!(
        LsdbDump::<Ospfv2>::decode(truncated),
        Err(ReplayError::Truncated)
    ));

    // Records out of order.
    let mut buf = BytesMut::new();
    put_record(&mut buf, TLV_SYSTEM_INFO, b"test build\0");
    assert!(matches!(
        LsdbDump::<Ospfv2>::decode(buf.freeze()),
        Err(ReplayError::UnexpectedRecord { .. })
    ));
}
