//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::net::Ipv4Addr;
use std::sync::Arc;

use bitflags::bitflags;

use crate::packet::lsa::{Lsa, LsaHdrVersion, LsaKey};
use crate::version::Version;

// Architectural Constants.
pub const LSA_REFRESH_TIME: u16 = 1800;
pub const LSA_MAX_AGE: u16 = 3600;
pub const LSA_MAX_AGE_DIFF: u16 = 900;
pub const LSA_INFINITY: u32 = 0x00ffffff;
pub const LSA_INIT_SEQ_NO: u32 = 0x80000001;
pub const LSA_MAX_SEQ_NO: u32 = 0x7fffffff;
pub const LSA_RESERVED_SEQ_NO: u32 = 0x80000000;
pub const MAX_LINK_METRIC: u16 = 0xffff;

// LSDB entry.
#[derive(Clone, Debug)]
pub struct LsaEntry<V: Version> {
    // LSA data.
    pub data: Arc<Lsa<V>>,
    // LSA entry flags.
    pub flags: LsaEntryFlags,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct LsaEntryFlags: u8 {
        const RECEIVED = 0x01;
        const SELF_ORIGINATED = 0x02;
    }
}

// Link-State Database.
//
// LSAs are keyed by (type, advertising router, LSA-ID); the key order makes
// per-type iteration a contiguous range.
#[derive(Debug)]
pub struct Lsdb<V: Version> {
    tree: BTreeMap<LsaKey<V::LsaType>, LsaEntry<V>>,
}

// ===== impl LsaEntry =====

impl<V> LsaEntry<V>
where
    V: Version,
{
    pub(crate) fn new(data: Arc<Lsa<V>>, flags: LsaEntryFlags) -> LsaEntry<V> {
        LsaEntry { data, flags }
    }
}

// ===== impl Lsdb =====

impl<V> Lsdb<V>
where
    V: Version,
{
    // Adds the provided LSA to the LSDB, replacing any existing instance.
    pub(crate) fn install(
        &mut self,
        data: Arc<Lsa<V>>,
        flags: LsaEntryFlags,
    ) -> Option<LsaEntry<V>> {
        let key = data.hdr.key();
        self.tree.insert(key, LsaEntry::new(data, flags))
    }

    // Removes the LSA corresponding to the provided key, if present.
    pub(crate) fn delete(
        &mut self,
        key: &LsaKey<V::LsaType>,
    ) -> Option<LsaEntry<V>> {
        self.tree.remove(key)
    }

    pub fn get(&self, key: &LsaKey<V::LsaType>) -> Option<&LsaEntry<V>> {
        self.tree.get(key)
    }

    pub fn iter(
        &self,
    ) -> btree_map::Iter<'_, LsaKey<V::LsaType>, LsaEntry<V>> {
        self.tree.iter()
    }

    // Returns an iterator over all LSAs of the given type.
    pub fn iter_by_type(
        &self,
        lsa_type: V::LsaType,
    ) -> impl Iterator<Item = (&LsaKey<V::LsaType>, &LsaEntry<V>)> + '_ {
        let start = LsaKey::new(
            lsa_type,
            Ipv4Addr::UNSPECIFIED,
            Ipv4Addr::UNSPECIFIED,
        );
        let end = LsaKey::new(
            lsa_type,
            Ipv4Addr::BROADCAST,
            Ipv4Addr::BROADCAST,
        );
        self.tree.range(start..=end)
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

impl<V> Default for Lsdb<V>
where
    V: Version,
{
    fn default() -> Lsdb<V> {
        Lsdb {
            tree: Default::default(),
        }
    }
}

// ===== global functions =====

// Compares which LSA is more recent according to the rules specified in
// Section 13.1 of RFC 2328.
//
// Returns:
// - Ordering::Greater when `a` is more recent
// - Ordering::Less when `b` is more recent
// - Ordering::Equal when the two LSAs are considered to be identical
pub(crate) fn lsa_compare<V>(a: &V::LsaHdr, b: &V::LsaHdr) -> Ordering
where
    V: Version,
{
    let a_seq_no = a.seq_no() as i32;
    let b_seq_no = b.seq_no() as i32;
    let cmp = a_seq_no.cmp(&b_seq_no);
    if cmp != Ordering::Equal {
        return cmp;
    }

    let cmp = a.cksum().cmp(&b.cksum());
    if cmp != Ordering::Equal {
        return cmp;
    }

    if a.is_maxage() && !b.is_maxage() {
        return Ordering::Greater;
    } else if !a.is_maxage() && b.is_maxage() {
        return Ordering::Less;
    }

    if a.age().abs_diff(b.age()) > LSA_MAX_AGE_DIFF {
        return b.age().cmp(&a.age());
    }

    Ordering::Equal
}

// Compares two LSAs according to the rules specified in Section 13.2 of RFC
// 2328. Its purpose is to determine if the contents of the LSAs are
// identical.
pub(crate) fn lsa_same_contents<V>(a: &Lsa<V>, b: &Lsa<V>) -> bool
where
    V: Version,
{
    if a.hdr.options() != b.hdr.options() {
        return false;
    }

    if a.hdr.is_maxage() ^ b.hdr.is_maxage() {
        return false;
    }

    if a.hdr.length() != b.hdr.length() {
        return false;
    }

    let hdr_length = V::LsaHdr::LENGTH as usize;
    a.raw[hdr_length..] == b.raw[hdr_length..]
}
