//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::net::{Ipv4Addr, Ipv6Addr};

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use derive_new::new;
use enum_as_inner::EnumAsInner;
use ipnetwork::Ipv6Network;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use xorp_utils::bytes::{BytesExt, BytesMutExt};
use xorp_utils::ip::IpAddrKind;

use crate::ospfv3::packet::Options;
use crate::packet::error::{DecodeError, DecodeResult, LsaValidationError};
#[cfg(feature = "testing")]
use crate::packet::lsa::serde_lsa_age_filter;
use crate::packet::lsa::{
    LsaBodyVersion, LsaHdrVersion, LsaRouterFlagsVersion, LsaScope,
    LsaTypeVersion, LsaVersion, PrefixOptionsVersion,
};
use crate::version::Ospfv3;

// The PrefixOptions Field.
//
// IANA registry:
// https://www.iana.org/assignments/ospfv3-parameters/ospfv3-parameters.xhtml#ospfv3-parameters-4
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct PrefixOptions: u8 {
        const NU = 0x01;
        const LA = 0x02;
        const P = 0x08;
        const DN = 0x10;
        const N = 0x20;
    }
}

// OSPFv3 LSA type.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct LsaType(pub u16);

// OSPFv3 LSA scope.
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum LsaScopeCode {
    Link = 0x0000,
    Area = 0x2000,
    As = 0x4000,
    Reserved = 0x6000,
}

// OSPFv3 LSA function code (legacy LSA types only).
//
// IANA registry:
// https://www.iana.org/assignments/ospfv3-parameters/ospfv3-parameters.xhtml#ospfv3-parameters-3
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum LsaFunctionCode {
    Router = 1,
    Network = 2,
    InterAreaPrefix = 3,
    InterAreaRouter = 4,
    AsExternal = 5,
    Link = 8,
    IntraAreaPrefix = 9,
}

// OSPFv3 LSA.
#[derive(Clone, Debug, Eq, PartialEq, EnumAsInner)]
#[derive(Deserialize, Serialize)]
pub enum LsaBody {
    Router(LsaRouter),
    Network(LsaNetwork),
    InterAreaPrefix(LsaInterAreaPrefix),
    InterAreaRouter(LsaInterAreaRouter),
    AsExternal(LsaAsExternal),
    Link(LsaLink),
    IntraAreaPrefix(LsaIntraAreaPrefix),
    Unknown(LsaUnknown),
}

//
// OSPFv3 LSA header.
//
// Encoding format:
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |           LS Age              |           LS Type             |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                       Link State ID                           |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                    Advertising Router                         |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                    LS Sequence Number                         |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |        LS Checksum            |             Length            |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaHdr {
    #[cfg_attr(
        feature = "testing",
        serde(default, skip_serializing_if = "serde_lsa_age_filter")
    )]
    pub age: u16,
    pub lsa_type: LsaType,
    pub lsa_id: Ipv4Addr,
    pub adv_rtr: Ipv4Addr,
    #[cfg_attr(feature = "testing", serde(skip_serializing))]
    pub seq_no: u32,
    #[cfg_attr(feature = "testing", serde(default, skip_serializing))]
    pub cksum: u16,
    pub length: u16,
}

//
// OSPFv3 Router-LSA.
//
// Encoding format (LSA body):
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+--+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |  0  |Nt|x|V|E|B|            Options                            |
// +-+-+-+--+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |     Type       |       0       |          Metric               |
// +-+-+-+--+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                      Interface ID                              |
// +-+-+-+--+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                   Neighbor Interface ID                        |
// +-+-+-+--+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                    Neighbor Router ID                          |
// +-+-+-+--+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                             ...                                |
//
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaRouter {
    pub flags: LsaRouterFlags,
    pub options: Options,
    pub links: Vec<LsaRouterLink>,
}

// OSPFv3 Router Properties Registry.
//
// IANA registry:
// https://www.iana.org/assignments/ospfv3-parameters/ospfv3-parameters.xhtml#ospfv3-parameters-7
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct LsaRouterFlags: u8 {
        const B = 0x01;
        const E = 0x02;
        const V = 0x04;
        const NT = 0x10;
    }
}

// OSPFv3 Router LSA Link Types.
//
// IANA registry:
// https://www.iana.org/assignments/ospfv3-parameters/ospfv3-parameters.xhtml#ospfv3-parameters-6
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum LsaRouterLinkType {
    PointToPoint = 0x01,
    TransitNetwork = 0x02,
    VirtualLink = 0x04,
}

#[derive(Clone, Debug, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct LsaRouterLink {
    pub link_type: LsaRouterLinkType,
    pub metric: u16,
    pub iface_id: u32,
    pub nbr_iface_id: u32,
    pub nbr_router_id: Ipv4Addr,
}

//
// OSPFv3 Network-LSA.
//
// Encoding format (LSA body):
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |      0        |              Options                          |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                       Attached Router                         |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                             ...                               |
//
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaNetwork {
    pub options: Options,
    pub attached_rtrs: BTreeSet<Ipv4Addr>,
}

//
// OSPFv3 Inter-Area-Prefix LSA.
//
// Encoding format (LSA body):
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |      0        |                  Metric                       |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// | PrefixLength  | PrefixOptions |              0                |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                        Address Prefix                         |
// |                             ...                               |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaInterAreaPrefix {
    pub metric: u32,
    pub prefix_options: PrefixOptions,
    pub prefix: Ipv6Network,
}

//
// OSPFv3 Inter-Area-Router LSA.
//
// Encoding format (LSA body):
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |      0        |                 Options                       |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |      0        |                 Metric                        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                    Destination Router ID                      |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaInterAreaRouter {
    pub options: Options,
    pub metric: u32,
    pub router_id: Ipv4Addr,
}

//
// OSPFv3 AS-External-LSA.
//
// Encoding format (LSA body):
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |         |E|F|T|                Metric                         |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// | PrefixLength  | PrefixOptions |     Referenced LS Type        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                        Address Prefix                         |
// |                             ...                               |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                Forwarding Address (Optional)                  |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |              External Route Tag (Optional)                    |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |               Referenced Link State ID (Optional)             |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaAsExternal {
    pub flags: LsaAsExternalFlags,
    pub metric: u32,
    pub prefix_options: PrefixOptions,
    pub prefix: Ipv6Network,
    pub fwd_addr: Option<Ipv6Addr>,
    pub tag: Option<u32>,
    pub ref_lsa_type: Option<LsaType>,
    pub ref_lsa_id: Option<Ipv4Addr>,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct LsaAsExternalFlags: u8 {
        const T = 0x01;
        const F = 0x02;
        const E = 0x04;
    }
}

//
// OSPFv3 Link-LSA.
//
// Encoding format (LSA body):
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// | Rtr Priority  |                Options                        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                                                               |
// +-                Link-local Interface Address                 -+
// |                              ...                              |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                         # prefixes                            |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// | PrefixLength  | PrefixOptions |             0                 |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                        Address Prefix                         |
// |                             ...                               |
//
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaLink {
    pub priority: u8,
    pub options: Options,
    pub linklocal: Ipv6Addr,
    pub prefixes: Vec<LsaLinkPrefix>,
}

#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaLinkPrefix {
    pub options: PrefixOptions,
    pub value: Ipv6Network,
}

//
// OSPFv3 Intra-Area-Prefix LSA.
//
// Encoding format (LSA body):
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |         # Prefixes            |     Referenced LS Type        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                  Referenced Link State ID                     |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                Referenced Advertising Router                  |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// | PrefixLength  | PrefixOptions |          Metric               |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                        Address Prefix                         |
// |                             ...                               |
//
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaIntraAreaPrefix {
    pub ref_lsa_type: LsaType,
    pub ref_lsa_id: Ipv4Addr,
    pub ref_adv_rtr: Ipv4Addr,
    pub prefixes: Vec<LsaIntraAreaPrefixEntry>,
}

#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaIntraAreaPrefixEntry {
    pub options: PrefixOptions,
    pub value: Ipv6Network,
    pub metric: u16,
}

//
// OSPFv3 Unknown LSA.
//
// The body is retained undecoded so that unknown types round-trip
// byte-exactly.
//
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaUnknown {
    pub data: Bytes,
}

// ===== impl PrefixOptions =====

impl PrefixOptionsVersion for PrefixOptions {}

// ===== impl LsaType =====

impl LsaType {
    pub const U_BIT_MASK: u16 = 0x8000;
    pub const SCOPE_MASK: u16 = 0x6000;
    pub const FUNCTION_CODE_MASK: u16 = 0x1fff;

    pub(crate) fn u_bit(&self) -> bool {
        self.0 & Self::U_BIT_MASK != 0
    }

    pub(crate) fn scope_code(&self) -> LsaScopeCode {
        LsaScopeCode::from_u16(self.0 & Self::SCOPE_MASK).unwrap()
    }

    pub(crate) fn function_code(&self) -> Option<LsaFunctionCode> {
        LsaFunctionCode::from_u16(self.0 & Self::FUNCTION_CODE_MASK)
    }
}

impl LsaTypeVersion for LsaType {
    fn scope(&self) -> LsaScope {
        match self.scope_code() {
            LsaScopeCode::Link => LsaScope::Link,
            LsaScopeCode::Area => LsaScope::Area,
            LsaScopeCode::As => LsaScope::As,
            LsaScopeCode::Reserved => LsaScope::Unknown,
        }
    }
}

impl std::fmt::Display for LsaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<LsaType> for u16 {
    fn from(lsa_type: LsaType) -> u16 {
        lsa_type.0
    }
}

// ===== impl LsaHdr =====

impl LsaHdrVersion<Ospfv3> for LsaHdr {
    const LENGTH: u16 = 20;

    fn new(
        age: u16,
        _options: Option<Options>,
        lsa_type: LsaType,
        lsa_id: Ipv4Addr,
        adv_rtr: Ipv4Addr,
        seq_no: u32,
    ) -> Self {
        LsaHdr {
            age,
            lsa_type,
            lsa_id,
            adv_rtr,
            seq_no,
            cksum: 0,
            length: 0,
        }
    }

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let age = buf.get_u16();
        let lsa_type = LsaType(buf.get_u16());
        let lsa_id = buf.get_ipv4();
        let adv_rtr = buf.get_ipv4();
        let seq_no = buf.get_u32();
        let cksum = buf.get_u16();
        let length = buf.get_u16();

        Ok(LsaHdr {
            age,
            lsa_type,
            lsa_id,
            adv_rtr,
            seq_no,
            cksum,
            length,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(self.age);
        buf.put_u16(self.lsa_type.0);
        buf.put_ipv4(&self.lsa_id);
        buf.put_ipv4(&self.adv_rtr);
        buf.put_u32(self.seq_no);
        buf.put_u16(self.cksum);
        buf.put_u16(self.length);
    }

    fn age(&self) -> u16 {
        self.age
    }

    fn set_age(&mut self, age: u16) {
        self.age = age;
    }

    fn options(&self) -> Option<Options> {
        None
    }

    fn lsa_type(&self) -> LsaType {
        self.lsa_type
    }

    fn lsa_id(&self) -> Ipv4Addr {
        self.lsa_id
    }

    fn adv_rtr(&self) -> Ipv4Addr {
        self.adv_rtr
    }

    fn seq_no(&self) -> u32 {
        self.seq_no
    }

    fn set_cksum(&mut self, value: u16) {
        self.cksum = value;
    }

    fn cksum(&self) -> u16 {
        self.cksum
    }

    fn length(&self) -> u16 {
        self.length
    }

    fn set_length(&mut self, length: u16) {
        self.length = length;
    }
}

// ===== impl LsaBody =====

impl LsaBodyVersion<Ospfv3> for LsaBody {
    fn decode(
        lsa_type: LsaType,
        _lsa_id: Ipv4Addr,
        buf: &mut Bytes,
    ) -> DecodeResult<Self> {
        let lsa = match (lsa_type.u_bit(), lsa_type.function_code()) {
            (false, Some(LsaFunctionCode::Router)) => {
                LsaBody::Router(LsaRouter::decode(buf)?)
            }
            (false, Some(LsaFunctionCode::Network)) => {
                LsaBody::Network(LsaNetwork::decode(buf)?)
            }
            (false, Some(LsaFunctionCode::InterAreaPrefix)) => {
                LsaBody::InterAreaPrefix(LsaInterAreaPrefix::decode(buf)?)
            }
            (false, Some(LsaFunctionCode::InterAreaRouter)) => {
                LsaBody::InterAreaRouter(LsaInterAreaRouter::decode(buf)?)
            }
            (false, Some(LsaFunctionCode::AsExternal)) => {
                LsaBody::AsExternal(LsaAsExternal::decode(buf)?)
            }
            (false, Some(LsaFunctionCode::Link)) => {
                LsaBody::Link(LsaLink::decode(buf)?)
            }
            (false, Some(LsaFunctionCode::IntraAreaPrefix)) => {
                LsaBody::IntraAreaPrefix(LsaIntraAreaPrefix::decode(buf)?)
            }
            _ => LsaBody::Unknown(LsaUnknown::decode(buf)?),
        };

        Ok(lsa)
    }

    fn encode(&self, buf: &mut BytesMut) {
        match self {
            LsaBody::Router(lsa) => lsa.encode(buf),
            LsaBody::Network(lsa) => lsa.encode(buf),
            LsaBody::InterAreaPrefix(lsa) => lsa.encode(buf),
            LsaBody::InterAreaRouter(lsa) => lsa.encode(buf),
            LsaBody::AsExternal(lsa) => lsa.encode(buf),
            LsaBody::Link(lsa) => lsa.encode(buf),
            LsaBody::IntraAreaPrefix(lsa) => lsa.encode(buf),
            LsaBody::Unknown(lsa) => lsa.encode(buf),
        }
    }

    fn lsa_type(&self) -> LsaType {
        match self {
            LsaBody::Router(_) => LsaRouter::lsa_type(),
            LsaBody::Network(_) => LsaNetwork::lsa_type(),
            LsaBody::InterAreaPrefix(_) => LsaInterAreaPrefix::lsa_type(),
            LsaBody::InterAreaRouter(_) => LsaInterAreaRouter::lsa_type(),
            LsaBody::AsExternal(_) => LsaAsExternal::lsa_type(),
            LsaBody::Link(_) => LsaLink::lsa_type(),
            LsaBody::IntraAreaPrefix(_) => LsaIntraAreaPrefix::lsa_type(),
            LsaBody::Unknown(_) => unreachable!(),
        }
    }

    fn is_unknown(&self) -> bool {
        matches!(self, LsaBody::Unknown(_))
    }

    fn validate(&self, _hdr: &LsaHdr) -> Result<(), LsaValidationError> {
        Ok(())
    }
}

// ===== impl LsaRouter =====

impl LsaRouter {
    pub const BASE_LENGTH: u16 = 4;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        // Validate minimum LSA length.
        if buf.remaining() < Self::BASE_LENGTH as usize {
            return Err(DecodeError::InvalidLsaLength);
        }
        let flags = LsaRouterFlags::from_bits_truncate(buf.get_u8());
        let options = Options::decode(buf);

        let mut links = vec![];
        let links_cnt = buf.remaining() / LsaRouterLink::LENGTH as usize;
        for _ in 0..links_cnt {
            let link_type = buf.get_u8();
            let link_type = LsaRouterLinkType::from_u8(link_type)
                .ok_or(DecodeError::UnknownRouterLinkType(link_type))?;
            let _ = buf.get_u8();
            let metric = buf.get_u16();
            let iface_id = buf.get_u32();
            let nbr_iface_id = buf.get_u32();
            let nbr_router_id = buf.get_ipv4();

            let link = LsaRouterLink::new(
                link_type,
                metric,
                iface_id,
                nbr_iface_id,
                nbr_router_id,
            );
            links.push(link);
        }

        Ok(LsaRouter::new(flags, options, links))
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.flags.bits());
        self.options.encode(buf);
        for link in &self.links {
            buf.put_u8(link.link_type as u8);
            buf.put_u8(0);
            buf.put_u16(link.metric);
            buf.put_u32(link.iface_id);
            buf.put_u32(link.nbr_iface_id);
            buf.put_ipv4(&link.nbr_router_id);
        }
    }

    pub const fn lsa_type() -> LsaType {
        LsaType(LsaScopeCode::Area as u16 | LsaFunctionCode::Router as u16)
    }
}

// ===== impl LsaRouterLink =====

impl LsaRouterLink {
    pub const LENGTH: u16 = 16;
}

// ===== impl LsaRouterFlags =====

impl LsaRouterFlagsVersion for LsaRouterFlags {
    fn is_abr(&self) -> bool {
        self.contains(LsaRouterFlags::B)
    }

    fn is_asbr(&self) -> bool {
        self.contains(LsaRouterFlags::E)
    }
}

// ===== impl LsaNetwork =====

impl LsaNetwork {
    pub const BASE_LENGTH: u16 = 4;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        // Validate minimum LSA length.
        if buf.remaining() < Self::BASE_LENGTH as usize {
            return Err(DecodeError::InvalidLsaLength);
        }
        let _ = buf.get_u8();
        let options = Options::decode(buf);

        let mut attached_rtrs = BTreeSet::new();
        let rtrs_cnt = buf.remaining() / 4;
        for _ in 0..rtrs_cnt {
            let rtr = buf.get_ipv4();
            attached_rtrs.insert(rtr);
        }

        Ok(LsaNetwork::new(options, attached_rtrs))
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(0);
        self.options.encode(buf);
        for rtr in &self.attached_rtrs {
            buf.put_ipv4(rtr);
        }
    }

    pub const fn lsa_type() -> LsaType {
        LsaType(LsaScopeCode::Area as u16 | LsaFunctionCode::Network as u16)
    }
}

// ===== impl LsaInterAreaPrefix =====

impl LsaInterAreaPrefix {
    pub const BASE_LENGTH: u16 = 8;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        // Validate minimum LSA length.
        if buf.remaining() < Self::BASE_LENGTH as usize {
            return Err(DecodeError::InvalidLsaLength);
        }
        let _ = buf.get_u8();
        let metric = buf.get_u24();
        let plen = buf.get_u8();
        let prefix_options = PrefixOptions::from_bits_truncate(buf.get_u8());
        let _ = buf.get_u16();
        let prefix = decode_prefix(plen, buf)?;

        Ok(LsaInterAreaPrefix::new(metric, prefix_options, prefix))
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(0);
        buf.put_u24(self.metric);
        buf.put_u8(self.prefix.prefix());
        buf.put_u8(self.prefix_options.bits());
        buf.put_u16(0);
        encode_prefix(&self.prefix, buf);
    }

    pub const fn lsa_type() -> LsaType {
        LsaType(
            LsaScopeCode::Area as u16 | LsaFunctionCode::InterAreaPrefix as u16,
        )
    }
}

// ===== impl LsaInterAreaRouter =====

impl LsaInterAreaRouter {
    pub const BASE_LENGTH: u16 = 12;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        // Validate minimum LSA length.
        if buf.remaining() < Self::BASE_LENGTH as usize {
            return Err(DecodeError::InvalidLsaLength);
        }
        let _ = buf.get_u8();
        let options = Options::decode(buf);
        let _ = buf.get_u8();
        let metric = buf.get_u24();
        let router_id = buf.get_ipv4();

        Ok(LsaInterAreaRouter::new(options, metric, router_id))
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(0);
        self.options.encode(buf);
        buf.put_u8(0);
        buf.put_u24(self.metric);
        buf.put_ipv4(&self.router_id);
    }

    pub const fn lsa_type() -> LsaType {
        LsaType(
            LsaScopeCode::Area as u16 | LsaFunctionCode::InterAreaRouter as u16,
        )
    }
}

// ===== impl LsaAsExternal =====

impl LsaAsExternal {
    pub const BASE_LENGTH: u16 = 8;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        // Validate minimum LSA length.
        if buf.remaining() < Self::BASE_LENGTH as usize {
            return Err(DecodeError::InvalidLsaLength);
        }
        let flags = LsaAsExternalFlags::from_bits_truncate(buf.get_u8());
        let metric = buf.get_u24();
        let plen = buf.get_u8();
        let prefix_options = PrefixOptions::from_bits_truncate(buf.get_u8());
        let ref_lsa_type = buf.get_u16();
        let ref_lsa_type = if ref_lsa_type != 0 {
            Some(LsaType(ref_lsa_type))
        } else {
            None
        };
        let prefix = decode_prefix(plen, buf)?;
        let fwd_addr = if flags.contains(LsaAsExternalFlags::F) {
            Some(buf.try_get_ipv6().map_err(|_| DecodeError::InvalidLsaLength)?)
        } else {
            None
        };
        let tag = if flags.contains(LsaAsExternalFlags::T) {
            Some(buf.try_get_u32().map_err(|_| DecodeError::InvalidLsaLength)?)
        } else {
            None
        };
        let ref_lsa_id = if ref_lsa_type.is_some() {
            Some(buf.try_get_ipv4().map_err(|_| DecodeError::InvalidLsaLength)?)
        } else {
            None
        };

        Ok(LsaAsExternal::new(
            flags,
            metric,
            prefix_options,
            prefix,
            fwd_addr,
            tag,
            ref_lsa_type,
            ref_lsa_id,
        ))
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.flags.bits());
        buf.put_u24(self.metric);
        buf.put_u8(self.prefix.prefix());
        buf.put_u8(self.prefix_options.bits());
        buf.put_u16(self.ref_lsa_type.map(|t| t.0).unwrap_or(0));
        encode_prefix(&self.prefix, buf);
        if let Some(fwd_addr) = &self.fwd_addr {
            buf.put_ipv6(fwd_addr);
        }
        if let Some(tag) = self.tag {
            buf.put_u32(tag);
        }
        if let Some(ref_lsa_id) = &self.ref_lsa_id {
            buf.put_ipv4(ref_lsa_id);
        }
    }

    pub const fn lsa_type() -> LsaType {
        LsaType(LsaScopeCode::As as u16 | LsaFunctionCode::AsExternal as u16)
    }
}

// ===== impl LsaLink =====

impl LsaLink {
    pub const BASE_LENGTH: u16 = 24;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        // Validate minimum LSA length.
        if buf.remaining() < Self::BASE_LENGTH as usize {
            return Err(DecodeError::InvalidLsaLength);
        }
        let priority = buf.get_u8();
        let options = Options::decode(buf);
        let linklocal = buf.get_ipv6();

        let mut prefixes = vec![];
        let prefixes_cnt = buf.get_u32();
        for _ in 0..prefixes_cnt {
            if buf.remaining() < 4 {
                return Err(DecodeError::InvalidLsaLength);
            }
            let plen = buf.get_u8();
            let prefix_options =
                PrefixOptions::from_bits_truncate(buf.get_u8());
            let _ = buf.get_u16();
            let prefix = decode_prefix(plen, buf)?;
            let prefix = LsaLinkPrefix::new(prefix_options, prefix);
            prefixes.push(prefix);
        }

        Ok(LsaLink::new(priority, options, linklocal, prefixes))
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.priority);
        self.options.encode(buf);
        buf.put_ipv6(&self.linklocal);
        buf.put_u32(self.prefixes.len() as u32);
        for prefix in &self.prefixes {
            buf.put_u8(prefix.value.prefix());
            buf.put_u8(prefix.options.bits());
            buf.put_u16(0);
            encode_prefix(&prefix.value, buf);
        }
    }

    pub const fn lsa_type() -> LsaType {
        LsaType(LsaScopeCode::Link as u16 | LsaFunctionCode::Link as u16)
    }
}

// ===== impl LsaIntraAreaPrefix =====

impl LsaIntraAreaPrefix {
    pub const BASE_LENGTH: u16 = 12;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        // Validate minimum LSA length.
        if buf.remaining() < Self::BASE_LENGTH as usize {
            return Err(DecodeError::InvalidLsaLength);
        }
        let prefixes_cnt = buf.get_u16();
        let ref_lsa_type = LsaType(buf.get_u16());
        let ref_lsa_id = buf.get_ipv4();
        let ref_adv_rtr = buf.get_ipv4();

        let mut prefixes = vec![];
        for _ in 0..prefixes_cnt {
            if buf.remaining() < 4 {
                return Err(DecodeError::InvalidLsaLength);
            }
            let plen = buf.get_u8();
            let prefix_options =
                PrefixOptions::from_bits_truncate(buf.get_u8());
            let metric = buf.get_u16();
            let prefix = decode_prefix(plen, buf)?;
            let prefix =
                LsaIntraAreaPrefixEntry::new(prefix_options, prefix, metric);
            prefixes.push(prefix);
        }

        Ok(LsaIntraAreaPrefix::new(
            ref_lsa_type,
            ref_lsa_id,
            ref_adv_rtr,
            prefixes,
        ))
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(self.prefixes.len() as u16);
        buf.put_u16(self.ref_lsa_type.0);
        buf.put_ipv4(&self.ref_lsa_id);
        buf.put_ipv4(&self.ref_adv_rtr);
        for prefix in &self.prefixes {
            buf.put_u8(prefix.value.prefix());
            buf.put_u8(prefix.options.bits());
            buf.put_u16(prefix.metric);
            encode_prefix(&prefix.value, buf);
        }
    }

    pub const fn lsa_type() -> LsaType {
        LsaType(
            LsaScopeCode::Area as u16 | LsaFunctionCode::IntraAreaPrefix as u16,
        )
    }
}

// ===== impl LsaUnknown =====

impl LsaUnknown {
    pub(crate) fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let data = buf.copy_to_bytes(buf.remaining());
        Ok(LsaUnknown { data })
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(&self.data);
    }
}

// ===== impl Ospfv3 =====

impl LsaVersion<Self> for Ospfv3 {
    type LsaType = LsaType;
    type LsaHdr = LsaHdr;
    type LsaBody = LsaBody;
    type LsaRouterFlags = LsaRouterFlags;
    type LsaRouterLink = LsaRouterLink;
    type PacketOptions = Options;
    type PrefixOptions = PrefixOptions;

    fn type_router() -> LsaType {
        LsaRouter::lsa_type()
    }

    fn type3_summary() -> LsaType {
        LsaInterAreaPrefix::lsa_type()
    }

    fn type4_summary() -> LsaType {
        LsaInterAreaRouter::lsa_type()
    }
}

// ===== global functions =====

// Calculate the number of bytes required to encode a prefix.
fn prefix_wire_len(len: u8) -> usize {
    (len as usize).div_ceil(32) * 4
}

fn decode_prefix(plen: u8, buf: &mut Bytes) -> DecodeResult<Ipv6Network> {
    let plen_wire = prefix_wire_len(plen);
    if buf.remaining() < plen_wire {
        return Err(DecodeError::InvalidLsaLength);
    }
    let mut prefix_bytes = [0; Ipv6Addr::LENGTH];
    buf.copy_to_slice(&mut prefix_bytes[..plen_wire]);
    let prefix = Ipv6Addr::from(prefix_bytes);
    Ipv6Network::new(prefix, plen).map_err(|_| DecodeError::InvalidIpPrefix)
}

fn encode_prefix(prefix: &Ipv6Network, buf: &mut BytesMut) {
    let prefix_bytes = prefix.ip().octets();
    let plen_wire = prefix_wire_len(prefix.prefix());
    buf.put(&prefix_bytes[0..plen_wire]);
}
