//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::Arc;

use bytes::{Buf, Bytes};

use crate::area::AreaType;
use crate::error::Error;
use crate::output::IoSink;
use crate::packet::error::{DecodeError, LsaValidationError};
use crate::packet::lsa::{Lsa, LsaHdrVersion};
use crate::peer::PeerManager;
use crate::version::Version;

// LSDB dump record types.
//
// A dump is a stream of (u32 type, u32 length, payload) records in network
// byte order: a file-format version, a build-info string, the OSPF version,
// the Area ID, then one LSA record per database entry. The first LSA is the
// dumping router's own Router-LSA.
pub const TLV_VERSION: u32 = 1;
pub const TLV_SYSTEM_INFO: u32 = 2;
pub const TLV_OSPF_VERSION: u32 = 3;
pub const TLV_AREA: u32 = 4;
pub const TLV_LSA: u32 = 5;

// Supported dump file-format version.
pub const TLV_CURRENT_VERSION: u32 = 1;

// LSDB dump read errors.
#[derive(Debug)]
pub enum ReplayError {
    IoError(std::io::Error),
    Truncated,
    UnexpectedRecord { expected: u32, actual: u32 },
    UnsupportedFileVersion(u32),
    OspfVersionMismatch { expected: u8, actual: u32 },
    InvalidRecordLength(u32),
    LsaDecodeError(DecodeError),
    LsaValidationError(LsaValidationError),
}

// Parsed LSDB dump.
#[derive(Debug)]
pub struct LsdbDump<V: Version> {
    // Build information recorded by the dumping system.
    pub system_info: String,
    // Area ID.
    pub area_id: Ipv4Addr,
    // The dumping router's own Router-LSA.
    pub router_lsa: Arc<Lsa<V>>,
    // The remaining LSAs of the area.
    pub lsas: Vec<Arc<Lsa<V>>>,
}

// ===== impl LsdbDump =====

impl<V> LsdbDump<V>
where
    V: Version,
{
    // Reads an LSDB dump from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReplayError> {
        let data = std::fs::read(path).map_err(ReplayError::IoError)?;
        Self::decode(Bytes::from(data))
    }

    // Decodes an LSDB dump from a bytes buffer.
    pub fn decode(mut buf: Bytes) -> Result<Self, ReplayError> {
        // File-format version.
        let mut value = read_record(&mut buf, TLV_VERSION)?;
        if value.len() < 4 {
            return Err(ReplayError::InvalidRecordLength(value.len() as u32));
        }
        let file_version = value.get_u32();
        if file_version != TLV_CURRENT_VERSION {
            return Err(ReplayError::UnsupportedFileVersion(file_version));
        }

        // Build information (NUL-terminated).
        let value = read_record(&mut buf, TLV_SYSTEM_INFO)?;
        let system_info = value
            .split(|byte| *byte == 0)
            .next()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();

        // OSPF version.
        let mut value = read_record(&mut buf, TLV_OSPF_VERSION)?;
        if value.len() < 4 {
            return Err(ReplayError::InvalidRecordLength(value.len() as u32));
        }
        let ospf_version = value.get_u32();
        if ospf_version != V::VERSION as u32 {
            return Err(ReplayError::OspfVersionMismatch {
                expected: V::VERSION,
                actual: ospf_version,
            });
        }

        // Area ID.
        let mut value = read_record(&mut buf, TLV_AREA)?;
        if value.len() < 4 {
            return Err(ReplayError::InvalidRecordLength(value.len() as u32));
        }
        let area_id = Ipv4Addr::from(value.get_u32());

        // The first LSA is the dumping router's own Router-LSA.
        let value = read_record(&mut buf, TLV_LSA)?;
        let router_lsa = decode_lsa::<V>(value)?;

        // Keep reading LSAs until we run out or hit an unknown record.
        let mut lsas = vec![];
        while let Some((tlv_type, value)) = read_next_record(&mut buf)? {
            if tlv_type != TLV_LSA {
                break;
            }
            lsas.push(decode_lsa::<V>(value)?);
        }

        Ok(LsdbDump {
            system_info,
            area_id,
            router_lsa,
            lsas,
        })
    }
}

// ===== impl ReplayError =====

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplayError::IoError(..) => {
                write!(f, "failed to read dump file")
            }
            ReplayError::Truncated => {
                write!(f, "truncated dump file")
            }
            ReplayError::UnexpectedRecord { expected, actual } => {
                write!(
                    f,
                    "unexpected record type: expected {}, got {}",
                    expected, actual
                )
            }
            ReplayError::UnsupportedFileVersion(version) => {
                write!(f, "unsupported dump file version: {}", version)
            }
            ReplayError::OspfVersionMismatch { expected, actual } => {
                write!(
                    f,
                    "OSPF version mismatch: expected {}, got {}",
                    expected, actual
                )
            }
            ReplayError::InvalidRecordLength(length) => {
                write!(f, "invalid record length: {}", length)
            }
            ReplayError::LsaDecodeError(..) => {
                write!(f, "failed to decode LSA record")
            }
            ReplayError::LsaValidationError(..) => {
                write!(f, "invalid LSA record")
            }
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReplayError::IoError(error) => Some(error),
            ReplayError::LsaDecodeError(error) => Some(error),
            ReplayError::LsaValidationError(error) => Some(error),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReplayError {
    fn from(error: std::io::Error) -> ReplayError {
        ReplayError::IoError(error)
    }
}

// ===== global functions =====

// Rebuilds a peer manager and area router from the dump and recomputes the
// routing table into the provided sink.
//
// The dumping router's Router-ID is taken from its Router-LSA.
pub fn replay<V>(
    dump: &LsdbDump<V>,
    sink: &mut dyn IoSink<V>,
) -> Result<PeerManager<V>, Error<V>>
where
    V: Version,
{
    let router_id = dump.router_lsa.hdr.adv_rtr();
    let mut pm = PeerManager::new(router_id);
    pm.create_area_router(dump.area_id, AreaType::Normal)?;

    let area = pm.get_area_router_mut(&dump.area_id).unwrap();
    area.replace_self_router_lsa(dump.router_lsa.clone())?;
    for lsa in &dump.lsas {
        area.admit_lsa(lsa.clone())?;
    }
    area.recompute_routing_table(sink);

    Ok(pm)
}

// ===== helper functions =====

// Reads the next record, expecting the provided type. A missing record is an
// error.
fn read_record(buf: &mut Bytes, expected: u32) -> Result<Bytes, ReplayError> {
    match read_next_record(buf)? {
        Some((tlv_type, value)) if tlv_type == expected => Ok(value),
        Some((tlv_type, _)) => Err(ReplayError::UnexpectedRecord {
            expected,
            actual: tlv_type,
        }),
        None => Err(ReplayError::Truncated),
    }
}

// Reads the next (type, length, value) record. EOF yields `None`.
fn read_next_record(
    buf: &mut Bytes,
) -> Result<Option<(u32, Bytes)>, ReplayError> {
    if !buf.has_remaining() {
        return Ok(None);
    }
    if buf.remaining() < 8 {
        return Err(ReplayError::Truncated);
    }

    let tlv_type = buf.get_u32();
    let length = buf.get_u32();
    if length as usize > buf.remaining() {
        return Err(ReplayError::Truncated);
    }

    let value = buf.copy_to_bytes(length as usize);
    Ok(Some((tlv_type, value)))
}

// Decodes and validates an LSA record.
fn decode_lsa<V>(mut value: Bytes) -> Result<Arc<Lsa<V>>, ReplayError>
where
    V: Version,
{
    if value.len() > Lsa::<V>::MAX_LENGTH {
        return Err(ReplayError::InvalidRecordLength(value.len() as u32));
    }

    let lsa = Lsa::decode(&mut value).map_err(ReplayError::LsaDecodeError)?;
    lsa.validate().map_err(ReplayError::LsaValidationError)?;
    Ok(Arc::new(lsa))
}
