//! Bucket table: fingerprint-filtered linear probing over parallel arrays.
//!
//! Two arrays, one slot each per bucket: a control byte (`0` = empty,
//! otherwise a 7-bit hash fragment with the top bit forced on) and a
//! redirect pair of (stored digest fragment, dense index). The table never
//! holds entry data; a probe hit redirects into the container's dense store.
//!
//! Probing is a three-tier filter, cheapest first: the control byte, then
//! the stored digest fragment, then a caller-supplied equality closure that
//! reaches into the dense store. Equality therefore only runs when a
//! collision is already highly likely.
//!
//! Deletion is tombstone-free: the freed slot is repaired by backward-shift
//! compaction, sliding displaced successors one slot toward home until a
//! slot with zero displacement (or an empty slot) stops the walk. Rebalance
//! rebuilds the arrays at a new power-of-two size from stored fragments
//! alone; keys are never re-hashed, and the generation counter is bumped so
//! cached bucket indices can be recognized as stale.

use crate::digest::mix;
use crate::index::DenseIndex;

/// Minimum and permanent floor for allocated bucket counts.
pub(crate) const MIN_BUCKETS: usize = 1024;
/// Grow (double) when occupancy exceeds this after an insert.
pub(crate) const MAX_LOAD: f64 = 0.8;
/// Shrink (halve) on explicit rebalance when occupancy is below this.
pub(crate) const MIN_LOAD: f64 = 0.4;

const VALID_BIT: u8 = 0x80;
const FP_SECRET: u64 = 0x9ddf_ea08_eb38_2d69;

/// Control byte for a digest: 7 mixed hash bits with the valid bit forced
/// on, so `0` unambiguously means empty.
#[inline]
fn fingerprint(digest: u64) -> u8 {
    mix(digest, FP_SECRET) as u8 | VALID_BIT
}

#[derive(Clone, Copy, Debug)]
struct Redirect<I> {
    fragment: I,
    dense: I,
}

/// Outcome of probing for a digest: either a verified hit or the empty slot
/// where an insert for this digest belongs.
pub(crate) enum Probe<I> {
    Hit { bucket: usize, dense: I },
    Miss { bucket: usize },
}

#[derive(Clone, Debug)]
pub(crate) struct BucketTable<I> {
    fingerprints: Vec<u8>,
    redirects: Vec<Redirect<I>>,
    generation: u64,
}

impl<I: DenseIndex> BucketTable<I> {
    /// An unallocated table; the first insert allocates at `MIN_BUCKETS`.
    pub(crate) fn unallocated() -> Self {
        Self {
            fingerprints: Vec::new(),
            redirects: Vec::new(),
            generation: 0,
        }
    }

    /// Allocate `buckets` slots. Callers pass a power of two >= MIN_BUCKETS.
    pub(crate) fn allocate(&mut self, buckets: usize) {
        debug_assert!(buckets.is_power_of_two() && buckets >= MIN_BUCKETS);
        self.fingerprints = vec![0; buckets];
        self.redirects = vec![
            Redirect {
                fragment: I::from_usize(0),
                dense: I::from_usize(0),
            };
            buckets
        ];
    }

    pub(crate) fn is_allocated(&self) -> bool {
        !self.fingerprints.is_empty()
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.fingerprints.len()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    fn mask(&self) -> usize {
        self.fingerprints.len() - 1
    }

    /// Probe distance of the occupant of `bucket` from its home slot.
    #[inline]
    fn displacement(&self, bucket: usize) -> usize {
        let home = self.redirects[bucket].fragment.to_usize() & self.mask();
        bucket.wrapping_sub(home) & self.mask()
    }

    /// Linear probe from the digest's home slot. `eq` is only consulted
    /// after both the fingerprint and the stored fragment match.
    #[inline]
    pub(crate) fn probe(&self, digest: u64, mut eq: impl FnMut(I) -> bool) -> Probe<I> {
        let mask = self.mask();
        let fp = fingerprint(digest);
        let fragment = I::fragment(digest);
        let mut bucket = (digest as usize) & mask;
        while self.fingerprints[bucket] != 0 {
            if self.fingerprints[bucket] == fp {
                let r = self.redirects[bucket];
                if r.fragment == fragment && eq(r.dense) {
                    return Probe::Hit {
                        bucket,
                        dense: r.dense,
                    };
                }
            }
            bucket = (bucket + 1) & mask;
        }
        Probe::Miss { bucket }
    }

    /// Write a new slot at the empty position a probe miss reported.
    pub(crate) fn occupy(&mut self, bucket: usize, digest: u64, dense: I) {
        debug_assert_eq!(self.fingerprints[bucket], 0);
        self.fingerprints[bucket] = fingerprint(digest);
        self.redirects[bucket] = Redirect {
            fragment: I::fragment(digest),
            dense,
        };
    }

    /// Dense index stored at an occupied bucket.
    pub(crate) fn dense_at(&self, bucket: usize) -> I {
        debug_assert_ne!(self.fingerprints[bucket], 0);
        self.redirects[bucket].dense
    }

    /// Whether `bucket` is occupied and redirects to `dense`. Used to vet a
    /// cursor's cached bucket before trusting it.
    pub(crate) fn slot_matches(&self, bucket: usize, dense: I) -> bool {
        bucket < self.fingerprints.len()
            && self.fingerprints[bucket] != 0
            && self.redirects[bucket].dense == dense
    }

    /// Locate the slot that redirects to `dense`, probing from the digest's
    /// home. The entry is known to be present, so empty slots are crossed
    /// rather than treated as termination.
    pub(crate) fn locate_dense(&self, digest: u64, dense: I) -> usize {
        let mask = self.mask();
        let fp = fingerprint(digest);
        let fragment = I::fragment(digest);
        let mut bucket = (digest as usize) & mask;
        for _ in 0..=mask {
            if self.fingerprints[bucket] == fp {
                let r = self.redirects[bucket];
                if r.fragment == fragment && r.dense == dense {
                    return bucket;
                }
            }
            bucket = (bucket + 1) & mask;
        }
        unreachable!("dense index absent from bucket table");
    }

    /// Repoint an occupied slot at a new dense index (after a swap-with-last
    /// in the dense store).
    pub(crate) fn repoint(&mut self, bucket: usize, dense: I) {
        debug_assert_ne!(self.fingerprints[bucket], 0);
        self.redirects[bucket].dense = dense;
    }

    /// Free `bucket` and restore the probing invariant by backward-shift
    /// compaction: each displaced successor slides one slot back, the hole
    /// travels forward, and the walk stops at a home-positioned or empty
    /// slot. No tombstones.
    pub(crate) fn free_and_shift(&mut self, bucket: usize) {
        let mask = self.mask();
        self.fingerprints[bucket] = 0;
        let mut hole = bucket;
        let mut next = (bucket + 1) & mask;
        while self.fingerprints[next] != 0 && self.displacement(next) > 0 {
            self.fingerprints[hole] = self.fingerprints[next];
            self.redirects[hole] = self.redirects[next];
            self.fingerprints[next] = 0;
            hole = next;
            next = (next + 1) & mask;
        }
    }

    /// Rebuild at `new_buckets` slots, reinserting every occupied slot by
    /// its stored fragment. Keys are never re-hashed. Bumps the generation,
    /// invalidating all cached bucket indices.
    pub(crate) fn rebalance(&mut self, new_buckets: usize) {
        debug_assert!(new_buckets.is_power_of_two() && new_buckets >= MIN_BUCKETS);
        let mut fingerprints = vec![0u8; new_buckets];
        let mut redirects = vec![
            Redirect {
                fragment: I::from_usize(0),
                dense: I::from_usize(0),
            };
            new_buckets
        ];
        let new_mask = new_buckets - 1;
        for bucket in 0..self.fingerprints.len() {
            if self.fingerprints[bucket] == 0 {
                continue;
            }
            let r = self.redirects[bucket];
            let mut slot = r.fragment.to_usize() & new_mask;
            while fingerprints[slot] != 0 {
                slot = (slot + 1) & new_mask;
            }
            fingerprints[slot] = self.fingerprints[bucket];
            redirects[slot] = r;
        }
        self.fingerprints = fingerprints;
        self.redirects = redirects;
        self.generation += 1;
    }

    /// Double the table after an insert pushed occupancy past `MAX_LOAD`.
    /// Returns false when growth is capped by the index width (the narrow
    /// table then runs at a higher load; its element ceiling keeps probing
    /// bounded).
    pub(crate) fn maybe_grow(&mut self, occupied: usize) -> bool {
        let buckets = self.bucket_count();
        if (occupied as f64) / (buckets as f64) <= MAX_LOAD {
            return false;
        }
        let doubled = buckets as u64 * 2;
        if doubled > I::MAX_BUCKETS {
            return false;
        }
        self.rebalance(doubled as usize);
        true
    }

    /// Bucket count an explicit rebalance should target for `occupied`
    /// slots: double at high load, halve at low load (never below the
    /// floor), otherwise rebuild in place.
    pub(crate) fn force_target(&self, occupied: usize) -> usize {
        let buckets = self.bucket_count();
        let load = occupied as f64 / buckets as f64;
        if load >= MAX_LOAD && (buckets as u64 * 2) <= I::MAX_BUCKETS {
            buckets * 2
        } else if load < MIN_LOAD && buckets > MIN_BUCKETS {
            buckets / 2
        } else {
            buckets
        }
    }

    /// Smallest legal bucket count keeping `occupied` slots at or under
    /// `MAX_LOAD`. Integer form of ceil(occupied / 0.8), exact for counts
    /// past the f64 mantissa.
    pub(crate) fn fitting_buckets(occupied: usize) -> usize {
        let need = occupied + occupied.div_ceil(4);
        need.next_power_of_two().max(MIN_BUCKETS)
    }

    /// Zero all control bytes, retaining capacity. Redirect contents become
    /// irrelevant once their fingerprints are cleared.
    pub(crate) fn fast_clear(&mut self) {
        self.fingerprints.fill(0);
        self.generation += 1;
    }

    /// Release both arrays, returning to the unallocated state.
    pub(crate) fn reset(&mut self) {
        self.fingerprints = Vec::new();
        self.redirects = Vec::new();
        self.generation += 1;
    }
}
