//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![cfg_attr(
    feature = "testing",
    allow(dead_code, unused_variables, unused_imports)
)]
#![allow(type_alias_bounds)]

pub mod area;
pub mod debug;
pub mod error;
pub mod lsdb;
pub mod ospfv2;
pub mod ospfv3;
pub mod output;
pub mod packet;
pub mod peer;
pub mod replay;
pub mod route;
pub mod spf;
pub mod version;
