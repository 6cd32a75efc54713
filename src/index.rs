//! Index-width policy: narrow (u32) or wide (u64) dense indices.
//!
//! Every cross-reference between the bucket table and the dense store is a
//! plain integer of this width, chosen once per container as a type
//! parameter. Narrow halves the per-bucket metadata (one fragment plus one
//! index per slot) at the cost of an element ceiling; wide lifts the ceiling
//! for tables that may exceed four billion entries.

use core::fmt;

/// Width policy for dense indices and stored digest fragments.
///
/// Implemented for `u32` (narrow, the default) and `u64` (wide). The
/// associated limits gate insertion and bucket growth so a narrow table can
/// never produce an unrepresentable index or a bucket count whose home slots
/// disagree between full digests and stored fragments.
pub trait DenseIndex: Copy + Eq + fmt::Debug {
    /// Inserting is rejected once the dense store holds this many entries.
    const MAX_ELEMENTS: usize;
    /// Bucket counts never exceed this, keeping `fragment & mask` equal to
    /// `digest & mask` for every table size.
    const MAX_BUCKETS: u64;

    fn from_usize(i: usize) -> Self;
    fn to_usize(self) -> usize;
    /// Truncate a 64-bit digest to the stored fragment width.
    fn fragment(digest: u64) -> Self;
}

impl DenseIndex for u32 {
    const MAX_ELEMENTS: usize = (u32::MAX - 1) as usize;
    const MAX_BUCKETS: u64 = 1 << 32;

    #[inline]
    fn from_usize(i: usize) -> Self {
        debug_assert!(i <= Self::MAX_ELEMENTS);
        i as u32
    }

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }

    #[inline]
    fn fragment(digest: u64) -> Self {
        digest as u32
    }
}

impl DenseIndex for u64 {
    const MAX_ELEMENTS: usize = usize::MAX;
    const MAX_BUCKETS: u64 = u64::MAX;

    #[inline]
    fn from_usize(i: usize) -> Self {
        i as u64
    }

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }

    #[inline]
    fn fragment(digest: u64) -> Self {
        digest
    }
}

/// The dense store reached the index ceiling of the chosen width.
///
/// Only reachable with narrow indices; construct the container with the wide
/// width if this is expected. The failed operation leaves the table
/// unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CapacityError;

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dense store reached the index ceiling of its width")
    }
}

impl std::error::Error for CapacityError {}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: narrow limits stay below the representable range so every
    /// live dense index fits in a u32.
    #[test]
    fn narrow_limits() {
        assert!(u32::MAX_ELEMENTS < u32::MAX as usize);
        assert_eq!(u32::from_usize(7).to_usize(), 7);
        assert_eq!(<u32 as DenseIndex>::fragment(0xABCD_EF01_2345_6789), 0x2345_6789);
    }

    /// Invariant: wide indices round-trip the full usize range in use and
    /// keep the whole digest as fragment.
    #[test]
    fn wide_round_trip() {
        assert_eq!(u64::from_usize(123_456).to_usize(), 123_456);
        let d = 0xABCD_EF01_2345_6789u64;
        assert_eq!(<u64 as DenseIndex>::fragment(d), d);
    }
}
