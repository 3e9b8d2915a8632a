//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod lsa;

use bitflags::bitflags;
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use xorp_utils::bytes::{BytesExt, BytesMutExt};

use crate::packet::OptionsVersion;

// OSPFv3 Options field.
//
// The on-wire field is 24 bits long; all assigned bits fit in the lower 16.
//
// IANA registry:
// https://www.iana.org/assignments/ospfv3-parameters/ospfv3-parameters.xhtml#ospfv3-parameters-1
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct Options: u16 {
        const V6 = 0x0001;
        const E = 0x0002;
        const N = 0x0008;
        const R = 0x0010;
        const DC = 0x0020;
        const AF = 0x0100;
        const L = 0x0200;
        const AT = 0x0400;
    }
}

// ===== impl Options =====

impl Options {
    pub(crate) fn decode(buf: &mut Bytes) -> Self {
        Options::from_bits_truncate(buf.get_u24() as u16)
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.put_u24(self.bits() as u32);
    }
}

impl OptionsVersion for Options {}
