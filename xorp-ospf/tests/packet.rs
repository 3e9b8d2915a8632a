//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use ipnetwork::Ipv6Network;
use maplit::btreeset;
use xorp_ospf::lsdb::LSA_INIT_SEQ_NO;
use xorp_ospf::packet::error::{DecodeError, LsaValidationError};
use xorp_ospf::packet::lsa::Lsa;
use xorp_ospf::version::{Ospfv2, Ospfv3, Version};
use xorp_ospf::{ospfv2, ospfv3};

//
// Helper functions.
//

fn addr(s: &str) -> Ipv4Addr {
    Ipv4Addr::from_str(s).unwrap()
}

// Checks that decoding the LSA's wire form yields the LSA back, raw bytes
// included, and that re-encoding the decoded instance leaves the wire form
// untouched.
fn test_lsa_round_trip<V: Version>(lsa: &Lsa<V>)
where
    <V as xorp_ospf::packet::lsa::LsaVersion<V>>::LsaHdr: PartialEq,
    <V as xorp_ospf::packet::lsa::LsaVersion<V>>::LsaBody: PartialEq,
{
    let mut buf = lsa.raw.clone();
    let decoded = Lsa::<V>::decode(&mut buf).unwrap();
    assert_eq!(*lsa, decoded);
    assert_eq!(lsa.raw, decoded.raw);
    decoded.validate().unwrap();

    let mut reencoded = decoded.clone();
    reencoded.encode();
    assert_eq!(lsa.raw, reencoded.raw);
}

fn lsa_v2(
    lsa_id: &str,
    adv_rtr: &str,
    body: ospfv2::packet::lsa::LsaBody,
) -> Lsa<Ospfv2> {
    Lsa::new(
        0,
        Some(ospfv2::packet::Options::E),
        addr(lsa_id),
        addr(adv_rtr),
        LSA_INIT_SEQ_NO,
        body,
    )
}

fn lsa_v3(
    lsa_id: &str,
    adv_rtr: &str,
    body: ospfv3::packet::lsa::LsaBody,
) -> Lsa<Ospfv3> {
    Lsa::new(0, None, addr(lsa_id), addr(adv_rtr), LSA_INIT_SEQ_NO, body)
}

//
// OSPFv2 LSAs.
//

#[test]
fn ospfv2_router_lsa() {
    use xorp_ospf::ospfv2::packet::lsa::{
        LsaBody, LsaRouter, LsaRouterFlags, LsaRouterLink, LsaRouterLinkType,
    };

    let lsa = lsa_v2(
        "1.1.1.1",
        "1.1.1.1",
        LsaBody::Router(LsaRouter {
            flags: LsaRouterFlags::B | LsaRouterFlags::E,
            links: vec![
                LsaRouterLink::new(
                    LsaRouterLinkType::PointToPoint,
                    addr("2.2.2.2"),
                    addr("10.0.0.1"),
                    10,
                ),
                LsaRouterLink::new(
                    LsaRouterLinkType::StubNetwork,
                    addr("10.0.1.0"),
                    addr("255.255.255.0"),
                    3,
                ),
            ],
        }),
    );
    test_lsa_round_trip(&lsa);

    // The body encoding carries no checksum, so it can be checked literally.
    #[rustfmt::skip]
    let body = vec![
        0x03, 0x00, 0x00, 0x02,
        0x02, 0x02, 0x02, 0x02, 0x0a, 0x00, 0x00, 0x01, 0x01, 0x00, 0x00,
        0x0a,
        0x0a, 0x00, 0x01, 0x00, 0xff, 0xff, 0xff, 0x00, 0x03, 0x00, 0x00,
        0x03,
    ];
    assert_eq!(&lsa.raw[20..], &body[..]);
    assert_eq!(lsa.hdr.length, 20 + body.len() as u16);
}

#[test]
fn ospfv2_network_lsa() {
    use xorp_ospf::ospfv2::packet::lsa::{LsaBody, LsaNetwork};

    let lsa = lsa_v2(
        "10.0.0.1",
        "1.1.1.1",
        LsaBody::Network(LsaNetwork {
            mask: addr("255.255.255.0"),
            attached_rtrs: btreeset![addr("1.1.1.1"), addr("2.2.2.2")],
        }),
    );
    test_lsa_round_trip(&lsa);
}

#[test]
fn ospfv2_summary_lsas() {
    use xorp_ospf::ospfv2::packet::lsa::{LsaBody, LsaSummary};

    let summary = LsaSummary {
        mask: addr("255.255.0.0"),
        metric: 20,
    };
    let lsa = lsa_v2(
        "172.16.0.0",
        "1.1.1.1",
        LsaBody::SummaryNetwork(summary.clone()),
    );
    test_lsa_round_trip(&lsa);

    let lsa = lsa_v2("3.3.3.3", "1.1.1.1", LsaBody::SummaryRouter(summary));
    test_lsa_round_trip(&lsa);
}

#[test]
fn ospfv2_as_external_lsa() {
    use xorp_ospf::ospfv2::packet::lsa::{LsaAsExternal, LsaAsExternalFlags, LsaBody};

    let lsa = lsa_v2(
        "10.20.0.0",
        "1.1.1.1",
        LsaBody::AsExternal(LsaAsExternal {
            mask: addr("255.255.0.0"),
            flags: LsaAsExternalFlags::E,
            metric: 100,
            fwd_addr: Some(addr("10.0.1.6")),
            tag: 42,
        }),
    );
    test_lsa_round_trip(&lsa);

    // An unspecified forwarding address decodes as absent.
    let lsa = lsa_v2(
        "10.30.0.0",
        "1.1.1.1",
        LsaBody::AsExternal(LsaAsExternal {
            mask: addr("255.255.0.0"),
            flags: LsaAsExternalFlags::empty(),
            metric: 1,
            fwd_addr: None,
            tag: 0,
        }),
    );
    test_lsa_round_trip(&lsa);
}

#[test]
fn ospfv2_unknown_lsa() {
    use xorp_ospf::ospfv2::packet::lsa::LsaBody;

    // Type 9 (opaque) isn't recognized; the payload must be retained
    // byte-exactly. The zeroed checksum is accepted in testing mode.
    #[rustfmt::skip]
    let bytes = vec![
        // header
        0x00, 0x01, 0x42, 0x09, 0x01, 0x00, 0x00, 0x05, 0x01, 0x01, 0x01,
        0x01, 0x80, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x18,
        // body
        0xde, 0xad, 0xbe, 0xef,
    ];

    let mut buf = Bytes::copy_from_slice(&bytes);
    let lsa = Lsa::<Ospfv2>::decode(&mut buf).unwrap();
    assert_eq!(lsa.raw, Bytes::copy_from_slice(&bytes));
    match &lsa.body {
        LsaBody::Unknown(unknown) => {
            assert_eq!(
                unknown.data,
                Bytes::copy_from_slice(&[0xde, 0xad, 0xbe, 0xef])
            );
        }
        _ => panic!("expected an unknown LSA body"),
    }
}

#[test]
fn ospfv2_decode_errors() {
    use xorp_ospf::ospfv2::packet::lsa::{LsaBody, LsaSummary};

    let lsa = lsa_v2(
        "172.16.0.0",
        "1.1.1.1",
        LsaBody::SummaryNetwork(LsaSummary {
            mask: addr("255.255.0.0"),
            metric: 20,
        }),
    );

    // Truncated buffer.
    let mut buf = lsa.raw.slice(0..10);
    assert!(matches!(
        Lsa::<Ospfv2>::decode(&mut buf),
        Err(DecodeError::InvalidLength(..))
    ));

    // Body shorter than the advertised length.
    let mut buf = lsa.raw.slice(0..(lsa.hdr.length as usize - 4));
    assert!(matches!(
        Lsa::<Ospfv2>::decode(&mut buf),
        Err(DecodeError::InvalidLsaLength)
    ));
}

#[test]
fn ospfv2_checksum_validation() {
    use xorp_ospf::ospfv2::packet::lsa::{LsaBody, LsaSummary};

    let lsa = lsa_v2(
        "172.16.0.0",
        "1.1.1.1",
        LsaBody::SummaryNetwork(LsaSummary {
            mask: addr("255.255.0.0"),
            metric: 20,
        }),
    );
    lsa.validate().unwrap();

    // Corrupt one body byte without updating the checksum.
    let mut bytes = lsa.raw.to_vec();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    let mut buf = Bytes::from(bytes);
    let corrupted = Lsa::<Ospfv2>::decode(&mut buf).unwrap();
    assert!(matches!(
        corrupted.validate(),
        Err(LsaValidationError::InvalidChecksum)
    ));
}

#[test]
fn ospfv2_router_lsa_id_mismatch() {
    use xorp_ospf::ospfv2::packet::lsa::{LsaBody, LsaRouter, LsaRouterFlags};

    // A Router-LSA whose LSA-ID differs from the advertising router is
    // rejected.
    let lsa = lsa_v2(
        "1.1.1.1",
        "2.2.2.2",
        LsaBody::Router(LsaRouter {
            flags: LsaRouterFlags::empty(),
            links: vec![],
        }),
    );
    assert!(matches!(
        lsa.validate(),
        Err(LsaValidationError::Ospfv2RouterLsaIdMismatch)
    ));
}

//
// OSPFv3 LSAs.
//

#[test]
fn ospfv3_router_lsa() {
    use xorp_ospf::ospfv3::packet::Options;
    use xorp_ospf::ospfv3::packet::lsa::{
        LsaBody, LsaRouter, LsaRouterFlags, LsaRouterLink, LsaRouterLinkType,
    };

    let lsa = lsa_v3(
        "0.0.0.1",
        "1.1.1.1",
        LsaBody::Router(LsaRouter::new(
            LsaRouterFlags::B,
            Options::R | Options::V6,
            vec![
                LsaRouterLink::new(
                    LsaRouterLinkType::PointToPoint,
                    10,
                    1,
                    2,
                    addr("2.2.2.2"),
                ),
                LsaRouterLink::new(
                    LsaRouterLinkType::TransitNetwork,
                    1,
                    3,
                    7,
                    addr("3.3.3.3"),
                ),
            ],
        )),
    );
    test_lsa_round_trip(&lsa);
}

#[test]
fn ospfv3_network_lsa() {
    use xorp_ospf::ospfv3::packet::Options;
    use xorp_ospf::ospfv3::packet::lsa::{LsaBody, LsaNetwork};

    let lsa = lsa_v3(
        "0.0.0.7",
        "1.1.1.1",
        LsaBody::Network(LsaNetwork::new(
            Options::R | Options::V6,
            btreeset![addr("1.1.1.1"), addr("2.2.2.2")],
        )),
    );
    test_lsa_round_trip(&lsa);
}

#[test]
fn ospfv3_inter_area_lsas() {
    use xorp_ospf::ospfv3::packet::Options;
    use xorp_ospf::ospfv3::packet::lsa::{
        LsaBody, LsaInterAreaPrefix, LsaInterAreaRouter, PrefixOptions,
    };

    let lsa = lsa_v3(
        "0.0.0.1",
        "1.1.1.1",
        LsaBody::InterAreaPrefix(LsaInterAreaPrefix::new(
            20,
            PrefixOptions::empty(),
            Ipv6Network::from_str("2001:db8:1::/64").unwrap(),
        )),
    );
    test_lsa_round_trip(&lsa);

    let lsa = lsa_v3(
        "0.0.0.2",
        "1.1.1.1",
        LsaBody::InterAreaRouter(LsaInterAreaRouter::new(
            Options::R | Options::V6,
            30,
            addr("4.4.4.4"),
        )),
    );
    test_lsa_round_trip(&lsa);
}

#[test]
fn ospfv3_as_external_lsa() {
    use xorp_ospf::ospfv3::packet::lsa::{
        LsaAsExternal, LsaAsExternalFlags, LsaBody, PrefixOptions,
    };

    // With forwarding address and tag.
    let lsa = lsa_v3(
        "0.0.0.1",
        "1.1.1.1",
        LsaBody::AsExternal(LsaAsExternal::new(
            LsaAsExternalFlags::E
                | LsaAsExternalFlags::F
                | LsaAsExternalFlags::T,
            100,
            PrefixOptions::empty(),
            Ipv6Network::from_str("2001:db8:2::/48").unwrap(),
            Some("2001:db8::1".parse().unwrap()),
            Some(42),
            None,
            None,
        )),
    );
    test_lsa_round_trip(&lsa);

    // Bare minimum.
    let lsa = lsa_v3(
        "0.0.0.2",
        "1.1.1.1",
        LsaBody::AsExternal(LsaAsExternal::new(
            LsaAsExternalFlags::empty(),
            1,
            PrefixOptions::empty(),
            Ipv6Network::from_str("2001:db8:3::/48").unwrap(),
            None,
            None,
            None,
            None,
        )),
    );
    test_lsa_round_trip(&lsa);
}

#[test]
fn ospfv3_link_lsa() {
    use xorp_ospf::ospfv3::packet::Options;
    use xorp_ospf::ospfv3::packet::lsa::{
        LsaBody, LsaLink, LsaLinkPrefix, PrefixOptions,
    };

    let lsa = lsa_v3(
        "0.0.0.3",
        "1.1.1.1",
        LsaBody::Link(LsaLink::new(
            1,
            Options::R | Options::V6,
            "fe80::1".parse().unwrap(),
            vec![LsaLinkPrefix::new(
                PrefixOptions::empty(),
                Ipv6Network::from_str("2001:db8:4::/64").unwrap(),
            )],
        )),
    );
    test_lsa_round_trip(&lsa);
}

#[test]
fn ospfv3_intra_area_prefix_lsa() {
    use xorp_ospf::ospfv3::packet::lsa::{
        LsaBody, LsaIntraAreaPrefix, LsaIntraAreaPrefixEntry, LsaRouter,
        PrefixOptions,
    };

    let lsa = lsa_v3(
        "0.0.0.4",
        "1.1.1.1",
        LsaBody::IntraAreaPrefix(LsaIntraAreaPrefix::new(
            LsaRouter::lsa_type(),
            addr("0.0.0.0"),
            addr("1.1.1.1"),
            vec![
                LsaIntraAreaPrefixEntry::new(
                    PrefixOptions::empty(),
                    Ipv6Network::from_str("2001:db8:5::/64").unwrap(),
                    10,
                ),
                LsaIntraAreaPrefixEntry::new(
                    PrefixOptions::empty(),
                    Ipv6Network::from_str("2001:db8:6::1/128").unwrap(),
                    0,
                ),
            ],
        )),
    );
    test_lsa_round_trip(&lsa);
}

#[test]
fn ospfv3_unknown_lsa() {
    use xorp_ospf::ospfv3::packet::lsa::LsaBody;

    // U-bit set with an unrecognized function code; the payload must be
    // retained byte-exactly.
    #[rustfmt::skip]
    let bytes = vec![
        // header
        0x00, 0x01, 0xc0, 0x42, 0x00, 0x00, 0x00, 0x05, 0x01, 0x01, 0x01,
        0x01, 0x80, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x18,
        // body
        0xca, 0xfe, 0xba, 0xbe,
    ];

    let mut buf = Bytes::copy_from_slice(&bytes);
    let lsa = Lsa::<Ospfv3>::decode(&mut buf).unwrap();
    assert_eq!(lsa.raw, Bytes::copy_from_slice(&bytes));
    assert!(matches!(&lsa.body, LsaBody::Unknown(..)));
}

//
// Shared behavior.
//

#[test]
fn lsa_shared_handles() {
    use xorp_ospf::ospfv2::packet::lsa::{LsaBody, LsaSummary};

    // Readers holding a handle keep seeing the old instance after a
    // replacement.
    let lsa = Arc::new(lsa_v2(
        "172.16.0.0",
        "1.1.1.1",
        LsaBody::SummaryNetwork(LsaSummary {
            mask: addr("255.255.0.0"),
            metric: 20,
        }),
    ));
    let reader = lsa.clone();
    drop(lsa);
    assert_eq!(reader.hdr.seq_no, LSA_INIT_SEQ_NO);
}
