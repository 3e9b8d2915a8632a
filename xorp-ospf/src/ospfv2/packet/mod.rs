//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod lsa;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::packet::OptionsVersion;

// OSPFv2 Options field.
//
// IANA registry:
// https://www.iana.org/assignments/ospfv2-parameters/ospfv2-parameters.xhtml#ospfv2-parameters-2
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct Options: u8 {
        const E = 0x02;
        const MC = 0x04;
        const NP = 0x08;
        const L = 0x10;
        const DC = 0x20;
        const O = 0x40;
    }
}

// ===== impl Options =====

impl OptionsVersion for Options {}
