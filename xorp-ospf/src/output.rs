//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;

use derive_new::new;

use crate::version::Version;

// Route update sink.
//
// The routing table builder pushes route deltas into this interface; the
// production implementation forwards them to the RIB, while tests use
// `DebugIo` to capture them.
pub trait IoSink<V: Version> {
    // Install or overwrite a route. Returns whether the sink accepted it.
    fn add_route(
        &mut self,
        prefix: V::IpNetwork,
        nexthop: V::IpAddr,
        metric: u32,
        is_discard: bool,
        is_equal_cost: bool,
    ) -> bool;

    // Withdraw a route. Returns whether the route was present.
    fn delete_route(&mut self, prefix: V::IpNetwork) -> bool;
}

// Map-backed sink with a queryable routing table.
#[derive(Debug)]
pub struct DebugIo<V: Version> {
    table: BTreeMap<V::IpNetwork, DebugIoEntry<V>>,
}

#[derive(Clone, Debug, Eq, PartialEq, new)]
pub struct DebugIoEntry<V: Version> {
    pub nexthop: V::IpAddr,
    pub metric: u32,
    pub is_discard: bool,
    pub is_equal_cost: bool,
}

// ===== impl DebugIo =====

impl<V> DebugIo<V>
where
    V: Version,
{
    pub fn new() -> Self {
        Self {
            table: Default::default(),
        }
    }

    pub fn routing_table_size(&self) -> usize {
        self.table.len()
    }

    // Checks whether the routing table contains exactly the provided entry.
    pub fn routing_table_verify(
        &self,
        prefix: V::IpNetwork,
        nexthop: V::IpAddr,
        metric: u32,
        is_discard: bool,
        is_equal_cost: bool,
    ) -> bool {
        self.table.get(&prefix)
            == Some(&DebugIoEntry::new(
                nexthop,
                metric,
                is_discard,
                is_equal_cost,
            ))
    }

    pub fn routing_table(
        &self,
    ) -> impl Iterator<Item = (&V::IpNetwork, &DebugIoEntry<V>)> + '_ {
        self.table.iter()
    }
}

impl<V> Default for DebugIo<V>
where
    V: Version,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> IoSink<V> for DebugIo<V>
where
    V: Version,
{
    fn add_route(
        &mut self,
        prefix: V::IpNetwork,
        nexthop: V::IpAddr,
        metric: u32,
        is_discard: bool,
        is_equal_cost: bool,
    ) -> bool {
        self.table.insert(
            prefix,
            DebugIoEntry::new(nexthop, metric, is_discard, is_equal_cost),
        );
        true
    }

    fn delete_route(&mut self, prefix: V::IpNetwork) -> bool {
        self.table.remove(&prefix).is_some()
    }
}
