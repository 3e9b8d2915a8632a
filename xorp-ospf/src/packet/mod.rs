//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod error;
pub mod lsa;

use serde::Serialize;
use serde::de::DeserializeOwned;

// OSPF version-specific code.
//
// The Options field appears in the OSPFv2 LSA header and in several OSPFv3
// LSA bodies; its width and bit assignments are version-specific.
pub trait OptionsVersion
where
    Self: Send
        + Sync
        + Clone
        + Copy
        + Default
        + Eq
        + PartialEq
        + std::fmt::Debug
        + Serialize
        + DeserializeOwned,
{
}
