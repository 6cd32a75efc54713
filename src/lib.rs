//! dense-hashmap: open-addressing associative containers with dense,
//! insertion-ordered storage and fingerprint-filtered probing.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one probing/storage engine, four container shapes layered on
//!   top so each piece can be reasoned about independently.
//! - Layers:
//!   - BucketTable<I> (private): the sparse side. Parallel fingerprint
//!     and redirect arrays, linear probing with a three-tier filter
//!     (fingerprint byte, stored hash fragment, key equality), and
//!     tombstone-free deletion by backward shift.
//!   - DenseMap<K, V, S, I>: pairs the bucket table with a dense entry
//!     vector; at most one entry per key, try-emplace insertion.
//!   - DenseMultiMap<K, V, S, I>: dense slots hold a key plus a list of
//!     values, so duplicate keys share one bucket slot.
//!   - DenseSet / DenseMultiSet: keys-only wrappers over the maps. The
//!     variant is chosen at the type level, never per call.
//!
//! Constraints
//! - Bucket counts are powers of two, at least 1024 once allocated; the
//!   table grows past 0.8 load and an explicit rebalance can shrink it
//!   below 0.4.
//! - Rebalancing reinserts from stored hash fragments and never re-hashes
//!   keys; `K: Hash` runs only on insert, lookup, and the cursor paths
//!   that say so.
//! - The dense index width is a type parameter: `u32` (default) halves
//!   the redirect footprint and caps the element count, `u64` lifts the
//!   cap. The widths cannot be mixed after construction.
//! - Erasing swaps the dense tail into the freed slot, so dense order is
//!   insertion order only until the first erase.
//!
//! Cursor policy
//! - `find`/`insert` return cursors that cache the dense index, the
//!   bucket slot, and the table generation. Structural rebalances bump
//!   the generation; cursor operations on an older cursor report
//!   `CursorError::Stale` instead of touching the wrong slot, and
//!   `revalidate` repairs the cursor with one fresh probe.
//! - Erasing an unrelated entry can move the dense tail under a live
//!   cursor. That movement is documented, not detected; see `cursor`.
//!
//! Hashing
//! - `DigestState` is the default `BuildHasher`: a multiply-fold mixer
//!   seeded per instance. Any `BuildHasher` drops in through the `S`
//!   parameter.
//! - Borrowed lookups go through the `Equivalent` trait, so a map keyed
//!   by `String` answers `&str` queries without allocating. A query type
//!   without an `Equivalent` impl is rejected at compile time.
//! - `FloatBits` wraps floats into hashable, totally-compared keys by
//!   their bit patterns.
//!
//! Notes and non-goals
//! - Single-threaded containers; share them the way you would share a
//!   `Vec`.
//! - No entry API and no in-place key mutation; keys are immutable after
//!   insert.
//! - Capacity exhaustion of the narrow index width is an error
//!   (`CapacityError`), not a panic, except in `Extend`.

mod bucket;
pub mod cursor;
pub mod digest;
pub mod index;
pub mod map;
mod map_proptest;
pub mod multi_map;
pub mod multi_set;
pub mod set;

// Public surface
pub use cursor::{Cursor, CursorError, MultiCursor};
pub use digest::{DigestState, FloatBits};
pub use index::{CapacityError, DenseIndex};
pub use map::DenseMap;
pub use multi_map::DenseMultiMap;
pub use multi_set::DenseMultiSet;
pub use set::DenseSet;

// Borrowed-lookup trait, re-exported so downstream impls do not need a
// direct dependency.
pub use equivalent::Equivalent;

/// `DenseMap` with the wide (`u64`) dense index.
pub type DenseMapWide<K, V, S = DigestState> = DenseMap<K, V, S, u64>;
/// `DenseSet` with the wide (`u64`) dense index.
pub type DenseSetWide<K, S = DigestState> = DenseSet<K, S, u64>;
/// `DenseMultiMap` with the wide (`u64`) dense index.
pub type DenseMultiMapWide<K, V, S = DigestState> = DenseMultiMap<K, V, S, u64>;
/// `DenseMultiSet` with the wide (`u64`) dense index.
pub type DenseMultiSetWide<K, S = DigestState> = DenseMultiSet<K, S, u64>;
