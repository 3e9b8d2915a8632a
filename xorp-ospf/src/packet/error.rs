//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use serde::{Deserialize, Serialize};

// Type aliases.
pub type DecodeResult<T> = Result<T, DecodeError>;

// OSPF LSA decode errors.
#[derive(Debug, Deserialize, Serialize)]
pub enum DecodeError {
    InvalidLength(u16),
    InvalidLsaLength,
    UnknownRouterLinkType(u8),
    InvalidIpPrefix,
}

// OSPF LSA validation errors.
//
// A decodable LSA may still be unfit for the database (bad checksum, bad age
// or sequence number, inconsistent header); these errors leave the database
// unchanged.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub enum LsaValidationError {
    InvalidChecksum,
    InvalidLsaAge,
    InvalidLsaSeqNo,
    Ospfv2RouterLsaIdMismatch,
}

// ===== impl DecodeError =====

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::InvalidLength(length) => {
                write!(f, "invalid LSA buffer length: {}", length)
            }
            DecodeError::InvalidLsaLength => {
                write!(f, "invalid LSA length")
            }
            DecodeError::UnknownRouterLinkType(link_type) => {
                write!(f, "unknown link type: {}", link_type)
            }
            DecodeError::InvalidIpPrefix => {
                write!(f, "invalid IP prefix")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

// ===== impl LsaValidationError =====

impl std::fmt::Display for LsaValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LsaValidationError::InvalidChecksum => {
                write!(f, "invalid LSA checksum")
            }
            LsaValidationError::InvalidLsaAge => {
                write!(f, "invalid LSA age")
            }
            LsaValidationError::InvalidLsaSeqNo => {
                write!(f, "invalid LSA sequence number")
            }
            LsaValidationError::Ospfv2RouterLsaIdMismatch => {
                write!(
                    f,
                    "Router-LSA's advertising router and LSA-ID are not equal"
                )
            }
        }
    }
}

impl std::error::Error for LsaValidationError {}
