//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

// Scenario checks for the OSPF area-router core, runnable outside the cargo
// test harness. Each scenario builds a small topology LSA by LSA, triggers a
// routing table recomputation and verifies the routes pushed into the I/O
// sink.

use std::net::Ipv4Addr;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use clap::{App, Arg};
use ipnetwork::Ipv4Network;
use tracing::info;
use tracing_subscriber::EnvFilter;
use xorp_ospf::area::{AreaRouter, AreaType};
use xorp_ospf::lsdb::LSA_INIT_SEQ_NO;
use xorp_ospf::ospfv2::packet::Options;
use xorp_ospf::ospfv2::packet::lsa::{
    LsaAsExternal, LsaAsExternalFlags, LsaBody, LsaNetwork, LsaRouter,
    LsaRouterFlags, LsaRouterLink, LsaRouterLinkType,
};
use xorp_ospf::output::DebugIo;
use xorp_ospf::packet::lsa::{Lsa, LsaHdrVersion};
use xorp_ospf::peer::{InterfaceType, PeerManager};
use xorp_ospf::replay::{self, LsdbDump};
use xorp_ospf::version::Ospfv2;

fn addr(s: &str) -> Ipv4Addr {
    Ipv4Addr::from_str(s).unwrap()
}

fn prefix(s: &str) -> Ipv4Network {
    Ipv4Network::from_str(s).unwrap()
}

fn p2p(id: Ipv4Addr, data: Ipv4Addr, metric: u16) -> LsaRouterLink {
    LsaRouterLink::new(LsaRouterLinkType::PointToPoint, id, data, metric)
}

fn transit(id: Ipv4Addr, data: Ipv4Addr, metric: u16) -> LsaRouterLink {
    LsaRouterLink::new(LsaRouterLinkType::TransitNetwork, id, data, metric)
}

fn stub(id: Ipv4Addr, mask: Ipv4Addr, metric: u16) -> LsaRouterLink {
    LsaRouterLink::new(LsaRouterLinkType::StubNetwork, id, mask, metric)
}

fn router_lsa(
    adv_rtr: Ipv4Addr,
    flags: LsaRouterFlags,
    links: Vec<LsaRouterLink>,
) -> Arc<Lsa<Ospfv2>> {
    let body = LsaBody::Router(LsaRouter { flags, links });
    Arc::new(Lsa::new(
        0,
        Some(Options::E),
        adv_rtr,
        adv_rtr,
        LSA_INIT_SEQ_NO,
        body,
    ))
}

fn network_lsa(
    lsa_id: Ipv4Addr,
    adv_rtr: Ipv4Addr,
    mask: Ipv4Addr,
    attached: &[Ipv4Addr],
) -> Arc<Lsa<Ospfv2>> {
    let body = LsaBody::Network(LsaNetwork {
        mask,
        attached_rtrs: attached.iter().copied().collect(),
    });
    Arc::new(Lsa::new(
        0,
        Some(Options::E),
        lsa_id,
        adv_rtr,
        LSA_INIT_SEQ_NO,
        body,
    ))
}

fn external_lsa(
    lsa_id: Ipv4Addr,
    adv_rtr: Ipv4Addr,
    mask: Ipv4Addr,
    metric: u32,
    fwd_addr: Option<Ipv4Addr>,
) -> Arc<Lsa<Ospfv2>> {
    let body = LsaBody::AsExternal(LsaAsExternal {
        mask,
        flags: LsaAsExternalFlags::empty(),
        metric,
        fwd_addr,
        tag: 0,
    });
    Arc::new(Lsa::new(
        0,
        Some(Options::E),
        lsa_id,
        adv_rtr,
        LSA_INIT_SEQ_NO,
        body,
    ))
}

fn dump_lsdb(verbose: bool, area: &AreaRouter<Ospfv2>) {
    if verbose {
        println!("{}", area.print_link_state_database());
    }
}

fn verify_routes(io: &DebugIo<Ospfv2>, routes: usize) -> bool {
    if io.routing_table_size() != routes {
        eprintln!(
            "expecting {} routes, got {}",
            routes,
            io.routing_table_size()
        );
        return false;
    }
    true
}

// Point-to-point topology with a stub network behind the neighbor.
fn routing1(verbose: bool) -> bool {
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

    // This router's Router-LSA: p2p links to RT3, RT5 and RT10.
    area.replace_self_router_lsa(router_lsa(
        addr("0.0.0.6"),
        LsaRouterFlags::empty(),
        vec![
            p2p(addr("0.0.0.3"), addr("0.0.0.4"), 6),
            p2p(addr("0.0.0.5"), addr("0.0.0.6"), 6),
            p2p(addr("0.0.0.10"), addr("0.0.0.11"), 7),
        ],
    ))
    .unwrap();

    // RT3: p2p link back plus a stub network.
    let rt3 = router_lsa(
        addr("0.0.0.3"),
        LsaRouterFlags::empty(),
        vec![
            p2p(addr("0.0.0.6"), addr("0.0.0.7"), 8),
            stub(addr("0.4.0.0"), addr("255.255.0.0"), 2),
        ],
    );
    area.admit_lsa(rt3.clone()).unwrap();

    dump_lsdb(verbose, area);
    area.recompute_routing_table(&mut io);

    if !verify_routes(&io, 1) {
        return false;
    }
    if !io.routing_table_verify(
        prefix("0.4.0.0/16"),
        addr("0.0.0.7"),
        8,
        false,
        false,
    ) {
        eprintln!("mismatch in routing table");
        return false;
    }

    // Now delete the routes.
    area.delete_lsa(&rt3.hdr.key());
    dump_lsdb(verbose, area);
    area.recompute_routing_table(&mut io);

    pm.set_state_peer(peer_id, false).unwrap();
    pm.delete_peer(peer_id).unwrap();
    pm.destroy_area_router(area_id, &mut io).unwrap();

    verify_routes(&io, 0)
}

// Broadcast topology with two host routes behind the DR.
fn routing2(verbose: bool) -> bool {
    let mut io = DebugIo::new();
    let rid = addr("10.0.8.161");
    let prid = addr("172.16.1.2");
    let mut pm = PeerManager::<Ospfv2>::new(rid);
    let area_id = addr("0.0.0.0");

    pm.create_area_router(area_id, AreaType::Normal).unwrap();
    let peer_id = pm
        .create_peer(
            "eth0",
            "vif0",
            addr("172.16.1.1"),
            30,
            1500,
            InterfaceType::Broadcast,
            area_id,
        )
        .unwrap();
    pm.set_state_peer(peer_id, true).unwrap();

    let area = pm.get_area_router_mut(&area_id).unwrap();

    // This router's Router-LSA.
    area.replace_self_router_lsa(router_lsa(
        rid,
        LsaRouterFlags::empty(),
        vec![transit(prid, addr("172.16.1.1"), 1)],
    ))
    .unwrap();

    // The peer's Router-LSA.
    area.admit_lsa(router_lsa(
        prid,
        LsaRouterFlags::empty(),
        vec![
            transit(prid, prid, 1),
            stub(addr("172.16.2.1"), addr("255.255.255.255"), 1),
            stub(addr("172.16.1.100"), addr("255.255.255.255"), 1),
        ],
    ))
    .unwrap();

    // The Network-LSA that acts as the binding glue.
    let nlsa = network_lsa(prid, prid, addr("255.255.255.252"), &[prid, rid]);
    area.admit_lsa(nlsa.clone()).unwrap();

    dump_lsdb(verbose, area);
    area.recompute_routing_table(&mut io);

    let verify_both = |io: &DebugIo<Ospfv2>| {
        io.routing_table_verify(
            prefix("172.16.1.100/32"),
            prid,
            2,
            false,
            false,
        ) && io.routing_table_verify(
            prefix("172.16.2.1/32"),
            prid,
            2,
            false,
            false,
        )
    };
    if !verify_routes(&io, 2) || !verify_both(&io) {
        eprintln!("mismatch in routing table");
        return false;
    }

    // Removing the Network-LSA invalidates both routes.
    area.delete_lsa(&nlsa.hdr.key());
    dump_lsdb(verbose, area);
    area.recompute_routing_table(&mut io);
    if !verify_routes(&io, 0) {
        return false;
    }

    // Re-adding it restores them.
    area.admit_lsa(nlsa.clone()).unwrap();
    dump_lsdb(verbose, area);
    area.recompute_routing_table(&mut io);
    if !verify_routes(&io, 2) || !verify_both(&io) {
        eprintln!("mismatch in routing table");
        return false;
    }

    area.delete_lsa(&nlsa.hdr.key());
    dump_lsdb(verbose, area);
    area.recompute_routing_table(&mut io);
    if !verify_routes(&io, 0) {
        return false;
    }

    pm.set_state_peer(peer_id, false).unwrap();
    pm.delete_peer(peer_id).unwrap();
    pm.destroy_area_router(area_id, &mut io).unwrap();

    verify_routes(&io, 0)
}

// Replays a captured LSDB dump and checks that two independent runs converge
// to the same routing table.
fn routing3(verbose: bool, fname: Option<&str>) -> bool {
    let Some(fname) = fname else {
        eprintln!("no filename supplied");
        return true;
    };

    let dump = match LsdbDump::<Ospfv2>::load(fname) {
        Ok(dump) => dump,
        Err(error) => {
            eprintln!("failed to load {}: {}", fname, error);
            return false;
        }
    };
    info!(system_info = %dump.system_info, area_id = %dump.area_id,
        lsas = dump.lsas.len(), "loaded LSDB dump");

    let mut io1 = DebugIo::new();
    let pm = match replay::replay(&dump, &mut io1) {
        Ok(pm) => pm,
        Err(error) => {
            eprintln!("replay failed: {}", error);
            return false;
        }
    };
    dump_lsdb(verbose, pm.get_area_router(&dump.area_id).unwrap());

    let mut io2 = DebugIo::new();
    if replay::replay(&dump, &mut io2).is_err() {
        eprintln!("second replay failed");
        return false;
    }

    if !io1
        .routing_table()
        .eq(io2.routing_table())
    {
        eprintln!("replay isn't deterministic");
        return false;
    }
    true
}

// External route through a peer with the E and B bits set.
fn routing4(verbose: bool) -> bool {
    let mut io = DebugIo::new();
    let rid = addr("10.0.1.1");
    let prid = addr("10.0.1.6");
    let mut pm = PeerManager::<Ospfv2>::new(rid);
    let area_id = addr("0.0.0.0");

    pm.create_area_router(area_id, AreaType::Normal).unwrap();
    let area = pm.get_area_router_mut(&area_id).unwrap();

    // This router's Router-LSA.
    area.replace_self_router_lsa(router_lsa(
        rid,
        LsaRouterFlags::empty(),
        vec![transit(rid, rid, 1)],
    ))
    .unwrap();

    // The peer's Router-LSA, with the E and B bits set.
    area.admit_lsa(router_lsa(
        prid,
        LsaRouterFlags::E | LsaRouterFlags::B,
        vec![transit(rid, prid, 1)],
    ))
    .unwrap();

    // The Network-LSA that acts as the binding glue.
    area.admit_lsa(network_lsa(
        rid,
        rid,
        addr("255.255.0.0"),
        &[rid, prid],
    ))
    .unwrap();

    // The AS-External-LSA from the peer.
    area.admit_lsa(external_lsa(
        addr("10.20.0.0"),
        prid,
        addr("255.255.0.0"),
        1,
        Some(prid),
    ))
    .unwrap();

    dump_lsdb(verbose, area);
    area.recompute_routing_table(&mut io);

    if !verify_routes(&io, 1) {
        return false;
    }
    if !io.routing_table_verify(prefix("10.20.0.0/16"), prid, 2, false, false)
    {
        eprintln!("mismatch in routing table");
        return false;
    }
    true
}

// Create and tear down the whole object hierarchy; the sink must end empty.
fn lifecycle(_verbose: bool) -> bool {
    let mut io = DebugIo::new();
    let mut pm = PeerManager::<Ospfv2>::new(addr("192.0.2.1"));
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

    // Deleting an enabled peer must fail.
    if pm.delete_peer(peer_id).is_ok() {
        eprintln!("deleted an enabled peer");
        return false;
    }
    // So must destroying an area with peers attached.
    if pm.destroy_area_router(area_id, &mut io).is_ok() {
        eprintln!("destroyed a busy area");
        return false;
    }

    pm.set_state_peer(peer_id, false).unwrap();
    pm.delete_peer(peer_id).unwrap();
    pm.destroy_area_router(area_id, &mut io).unwrap();

    verify_routes(&io, 0)
}

// A stale arrival must not disturb the database or the routing table.
fn stale(verbose: bool) -> bool {
    let mut io = DebugIo::new();
    let rid = addr("0.0.0.6");
    let mut pm = PeerManager::<Ospfv2>::new(rid);
    let area_id = addr("0.0.0.1");

    pm.create_area_router(area_id, AreaType::Normal).unwrap();
    let area = pm.get_area_router_mut(&area_id).unwrap();

    area.replace_self_router_lsa(router_lsa(
        rid,
        LsaRouterFlags::empty(),
        vec![p2p(addr("0.0.0.3"), addr("0.0.0.4"), 6)],
    ))
    .unwrap();

    let older = router_lsa(
        addr("0.0.0.3"),
        LsaRouterFlags::empty(),
        vec![
            p2p(rid, addr("0.0.0.7"), 8),
            stub(addr("0.4.0.0"), addr("255.255.0.0"), 2),
        ],
    );
    let mut newer = (*older).clone();
    newer.hdr.seq_no = LSA_INIT_SEQ_NO + 1;
    newer.encode();

    area.admit_lsa(Arc::new(newer)).unwrap();
    dump_lsdb(verbose, area);
    area.recompute_routing_table(&mut io);
    if !verify_routes(&io, 1) {
        return false;
    }

    // The older instance is dropped silently and nothing becomes dirty.
    area.admit_lsa(older).unwrap();
    if area.is_dirty() {
        eprintln!("stale admit marked the area dirty");
        return false;
    }
    area.recompute_routing_table(&mut io);

    verify_routes(&io, 1)
}

fn main() -> ExitCode {
    let matches = App::new("routing-test")
        .about("OSPF area-router scenario checks")
        .arg(
            Arg::with_name("test")
                .short("t")
                .long("test")
                .takes_value(true)
                .help("run only the specified scenario"),
        )
        .arg(
            Arg::with_name("filename")
                .short("f")
                .long("filename")
                .takes_value(true)
                .help("LSA database dump for the replay scenario"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("print the link state database"),
        )
        .get_matches();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let selected = matches.value_of("test");
    let fname = matches.value_of("filename").map(str::to_owned);
    let verbose = matches.is_present("verbose");

    let scenarios: Vec<(&str, Box<dyn Fn() -> bool>)> = vec![
        ("r1v2", Box::new(move || routing1(verbose))),
        ("r2", Box::new(move || routing2(verbose))),
        ("r3v2", Box::new(move || routing3(verbose, fname.as_deref()))),
        ("r4", Box::new(move || routing4(verbose))),
        ("lifecycle", Box::new(move || lifecycle(verbose))),
        ("stale", Box::new(move || stale(verbose))),
    ];

    if let Some(name) = selected
        && !scenarios.iter().any(|(sname, _)| *sname == name)
    {
        eprintln!("no scenario with name {} found", name);
        return ExitCode::FAILURE;
    }

    let mut failures = 0;
    for (name, scenario) in &scenarios {
        if let Some(selected) = selected
            && selected != *name
        {
            continue;
        }

        if scenario() {
            println!("PASS {}", name);
        } else {
            println!("FAIL {}", name);
            failures += 1;
        }
    }

    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
