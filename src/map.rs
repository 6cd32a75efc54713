//! DenseMap: single-valued map over the bucket/probing engine.
//!
//! Layout is two cooperating structures: the bucket table (probing
//! metadata, see `bucket`) and the dense store, a plain `Vec` of entries in
//! insertion order. Bucket slots redirect into the dense store by integer
//! index; no pointers cross the boundary, so entries can be relocated on
//! delete without fixups.
//!
//! Deletion swaps the victim with the dense tail and pops, then repairs the
//! bucket table by backward-shift compaction. Finding the tail's bucket
//! slot re-hashes the tail key and re-probes from its home; that is an
//! O(bucket count) worst case kept deliberately, because caching it would
//! change the cursor-invalidation contract.

use core::fmt;
use core::hash::{BuildHasher, Hash};

use equivalent::Equivalent;

use crate::bucket::{BucketTable, Probe, MIN_BUCKETS};
use crate::cursor::{Cursor, CursorError, RawCursor};
use crate::digest::DigestState;
use crate::index::{CapacityError, DenseIndex};

#[derive(Clone, Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
}

/// Open-addressing map with fingerprint-filtered probing and dense,
/// insertion-ordered storage.
///
/// `S` is the hasher seam (`BuildHasher`); `I` the index width: `u32`
/// (narrow, default, with an element ceiling) or `u64` (wide). Insert has
/// try-emplace semantics: an existing key is returned unchanged, never
/// overwritten. Keys are immutable once stored; values are mutable in
/// place.
///
/// Single-threaded by design: no internal synchronization, and a rebalance
/// triggered inside `insert` completes before `insert` returns.
#[derive(Clone)]
pub struct DenseMap<K, V, S = DigestState, I = u32> {
    buckets: BucketTable<I>,
    entries: Vec<Entry<K, V>>,
    hasher: S,
}

impl<K, V, S: Default, I: DenseIndex> DenseMap<K, V, S, I> {
    /// An empty map. Nothing is allocated until the first insert.
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// A map with `buckets` bucket slots pre-allocated, rounded up to a
    /// power of two and the 1024-slot floor. Sizing past the expected
    /// element count divided by the 0.8 load bound avoids rebalances.
    pub fn with_capacity(buckets: usize) -> Self {
        Self::with_capacity_and_hasher(buckets, S::default())
    }
}

impl<K, V, S: Default, I: DenseIndex> Default for DenseMap<K, V, S, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, I: DenseIndex> DenseMap<K, V, S, I> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            buckets: BucketTable::unallocated(),
            entries: Vec::new(),
            hasher,
        }
    }

    pub fn with_capacity_and_hasher(buckets: usize, hasher: S) -> Self {
        let mut table = BucketTable::unallocated();
        table.allocate(buckets.next_power_of_two().max(MIN_BUCKETS));
        Self {
            buckets: table,
            entries: Vec::new(),
            hasher,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Allocated bucket slots; zero before the first insert.
    pub fn bucket_count(&self) -> usize {
        self.buckets.bucket_count()
    }

    /// Structural generation, bumped by every rebalance and clear. Cursors
    /// captured under an older generation report `CursorError::Stale`.
    pub fn generation(&self) -> u64 {
        self.buckets.generation()
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Drop all entries and release both backing arrays.
    pub fn clear(&mut self) {
        self.entries = Vec::new();
        self.buckets.reset();
    }

    /// Drop all entries but retain capacity: bucket metadata is zeroed in
    /// place and the dense store keeps its allocation, so refilling avoids
    /// reallocation.
    pub fn fast_clear(&mut self) {
        self.entries.clear();
        self.buckets.fast_clear();
    }

    /// Iterate entries in dense-storage order. The order is stable only
    /// until the next structural mutation.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.entries.iter(),
        }
    }

    /// Like `iter`, with mutable access to values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.entries.iter_mut(),
        }
    }
}

impl<K, V, S, I> DenseMap<K, V, S, I>
where
    K: Hash + Eq,
    S: BuildHasher,
    I: DenseIndex,
{
    #[inline]
    fn digest<Q: ?Sized + Hash>(&self, q: &Q) -> u64 {
        self.hasher.hash_one(q)
    }

    /// Find an entry. Accepts any query type the equality seam declares
    /// equivalent to `K` (for example `&str` against `String` keys) as long
    /// as it hashes identically. Returns the end cursor on a miss.
    pub fn find<Q>(&self, q: &Q) -> Cursor<I>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        if self.entries.is_empty() {
            return Cursor::end();
        }
        let digest = self.digest(q);
        let entries = &self.entries;
        match self
            .buckets
            .probe(digest, |d| q.equivalent(&entries[d.to_usize()].key))
        {
            Probe::Hit { bucket, dense } => {
                Cursor::live(dense, bucket, self.buckets.generation())
            }
            Probe::Miss { .. } => Cursor::end(),
        }
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        !self.find(q).is_end()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let raw = self.find(q).raw()?;
        Some(&self.entries[raw.dense.to_usize()].value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let raw = self.find(q).raw()?;
        Some(&mut self.entries[raw.dense.to_usize()].value)
    }

    /// Insert with try-emplace semantics: if the key is present, the
    /// existing entry is returned unchanged with `false` and `value` is
    /// dropped; otherwise the new entry's cursor is returned with `true`.
    ///
    /// A rebalance triggered by crossing the load bound completes before
    /// this returns. Fails only when the narrow index width is exhausted.
    pub fn insert(&mut self, key: K, value: V) -> Result<(Cursor<I>, bool), CapacityError> {
        if !self.buckets.is_allocated() {
            self.buckets.allocate(MIN_BUCKETS);
        }
        let digest = self.digest(&key);
        let entries = &self.entries;
        let miss_bucket = match self
            .buckets
            .probe(digest, |d| entries[d.to_usize()].key == key)
        {
            Probe::Hit { bucket, dense } => {
                return Ok((Cursor::live(dense, bucket, self.buckets.generation()), false));
            }
            Probe::Miss { bucket } => bucket,
        };
        if self.entries.len() >= I::MAX_ELEMENTS {
            return Err(CapacityError);
        }
        let dense = I::from_usize(self.entries.len());
        self.entries.push(Entry { key, value });
        self.buckets.occupy(miss_bucket, digest, dense);
        let bucket = if self.buckets.maybe_grow(self.entries.len()) {
            self.buckets.locate_dense(digest, dense)
        } else {
            miss_bucket
        };
        Ok((Cursor::live(dense, bucket, self.buckets.generation()), true))
    }

    /// Find `key` or insert `default()`, returning the value in place. The
    /// closure runs only when an insertion actually happens.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> Result<&mut V, CapacityError>
    where
        F: FnOnce() -> V,
    {
        if !self.buckets.is_allocated() {
            self.buckets.allocate(MIN_BUCKETS);
        }
        let digest = self.digest(&key);
        let entries = &self.entries;
        let dense = match self
            .buckets
            .probe(digest, |d| entries[d.to_usize()].key == key)
        {
            Probe::Hit { dense, .. } => dense.to_usize(),
            Probe::Miss { bucket } => {
                if self.entries.len() >= I::MAX_ELEMENTS {
                    return Err(CapacityError);
                }
                let dense = I::from_usize(self.entries.len());
                self.entries.push(Entry {
                    key,
                    value: default(),
                });
                self.buckets.occupy(bucket, digest, dense);
                self.buckets.maybe_grow(self.entries.len());
                dense.to_usize()
            }
        };
        Ok(&mut self.entries[dense].value)
    }

    /// Remove the entry for a key. Returns the number removed (0 or 1); a
    /// miss is not an error. Erasing invalidates the cursor of the removed
    /// entry and any cursor that pointed at the dense tail (see the cursor
    /// module docs).
    pub fn erase<Q>(&mut self, q: &Q) -> usize
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        if self.entries.is_empty() {
            return 0;
        }
        let digest = self.digest(q);
        let entries = &self.entries;
        match self
            .buckets
            .probe(digest, |d| q.equivalent(&entries[d.to_usize()].key))
        {
            Probe::Hit { bucket, .. } => {
                self.remove_at_bucket(bucket);
                1
            }
            Probe::Miss { .. } => 0,
        }
    }

    /// Alias of `erase`: single-valued maps hold at most one entry per key.
    pub fn erase_all<Q>(&mut self, q: &Q) -> usize
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.erase(q)
    }

    /// Remove exactly the entry a cursor denotes, without re-hashing its
    /// key. Refused with an explicit error for end, stale, or no longer
    /// live cursors.
    pub fn erase_at(&mut self, cursor: &Cursor<I>) -> Result<(K, V), CursorError> {
        let raw = cursor.raw().ok_or(CursorError::End)?;
        if raw.generation != self.buckets.generation() {
            return Err(CursorError::Stale);
        }
        if raw.dense.to_usize() >= self.entries.len()
            || !self.buckets.slot_matches(raw.bucket, raw.dense)
        {
            return Err(CursorError::Invalidated);
        }
        Ok(self.remove_at_bucket(raw.bucket))
    }

    /// Dereference a cursor. End and stale cursors are refused; whether the
    /// denoted entry is still the one captured is subject to the tail-swap
    /// caveat in the cursor module docs.
    pub fn get_at(&self, cursor: &Cursor<I>) -> Result<(&K, &V), CursorError> {
        let raw = self.vet(cursor)?;
        let e = &self.entries[raw.dense.to_usize()];
        Ok((&e.key, &e.value))
    }

    /// Mutable access to the value a cursor denotes.
    pub fn value_mut_at(&mut self, cursor: &Cursor<I>) -> Result<&mut V, CursorError> {
        let raw = self.vet(cursor)?;
        Ok(&mut self.entries[raw.dense.to_usize()].value)
    }

    /// Refresh a stale cursor: the dense index survives rebalance, so the
    /// key still stored there is re-hashed and re-probed to recover the
    /// bucket slot and current generation.
    pub fn revalidate(&self, cursor: &mut Cursor<I>) -> Result<(), CursorError> {
        let raw = cursor.raw().ok_or(CursorError::End)?;
        let dense = raw.dense.to_usize();
        if dense >= self.entries.len() {
            return Err(CursorError::Invalidated);
        }
        let digest = self.digest(&self.entries[dense].key);
        match self.buckets.probe(digest, |d| d == raw.dense) {
            Probe::Hit { bucket, .. } => {
                cursor.set(RawCursor {
                    dense: raw.dense,
                    bucket,
                    generation: self.buckets.generation(),
                });
                Ok(())
            }
            Probe::Miss { .. } => Err(CursorError::Invalidated),
        }
    }

    /// Explicitly rebalance: double at load >= 0.8, halve at load < 0.4
    /// (never below the floor), otherwise rebuild in place. Always bumps
    /// the generation.
    pub fn force_rehash(&mut self) {
        if !self.buckets.is_allocated() {
            return;
        }
        let target = self.buckets.force_target(self.entries.len());
        self.buckets.rebalance(target);
    }

    /// Best-effort capacity trim: shrink the dense store and rebalance the
    /// bucket table down to the smallest size keeping load within bounds.
    pub fn shrink_to_fit(&mut self) {
        self.entries.shrink_to_fit();
        if !self.buckets.is_allocated() {
            return;
        }
        let target = BucketTable::<I>::fitting_buckets(self.entries.len());
        if target < self.buckets.bucket_count() {
            self.buckets.rebalance(target);
        }
    }

    fn vet(&self, cursor: &Cursor<I>) -> Result<RawCursor<I>, CursorError> {
        let raw = cursor.raw().ok_or(CursorError::End)?;
        if raw.generation != self.buckets.generation() {
            return Err(CursorError::Stale);
        }
        if raw.dense.to_usize() >= self.entries.len() {
            return Err(CursorError::Invalidated);
        }
        Ok(raw)
    }

    /// Full slot-removal protocol: repoint the slot of the dense tail (by
    /// re-hashing the tail key), swap-with-last and pop, then free the
    /// victim slot with backward-shift compaction.
    fn remove_at_bucket(&mut self, bucket: usize) -> (K, V) {
        let dense = self.buckets.dense_at(bucket).to_usize();
        let last = self.entries.len() - 1;
        if dense != last {
            let tail_digest = self.digest(&self.entries[last].key);
            let tail_bucket = self.buckets.locate_dense(tail_digest, I::from_usize(last));
            self.buckets.repoint(tail_bucket, I::from_usize(dense));
            self.entries.swap(dense, last);
        }
        self.buckets.free_and_shift(bucket);
        match self.entries.pop() {
            Some(e) => (e.key, e.value),
            None => unreachable!("dense store empty during removal"),
        }
    }
}

impl<K, V, S, I> fmt::Debug for DenseMap<K, V, S, I>
where
    K: fmt::Debug,
    V: fmt::Debug,
    I: DenseIndex,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over `(&K, &V)` in dense-storage order.
pub struct Iter<'a, K, V> {
    it: core::slice::Iter<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|e| (&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in dense-storage order.
pub struct IterMut<'a, K, V> {
    it: core::slice::IterMut<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|e| (&e.key, &mut e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// Owning iterator over `(K, V)` in dense-storage order.
pub struct IntoIter<K, V> {
    it: std::vec::IntoIter<Entry<K, V>>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|e| (e.key, e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V, S, I: DenseIndex> IntoIterator for DenseMap<K, V, S, I> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            it: self.entries.into_iter(),
        }
    }
}

impl<'a, K, V, S, I: DenseIndex> IntoIterator for &'a DenseMap<K, V, S, I> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S, I: DenseIndex> IntoIterator for &'a mut DenseMap<K, V, S, I> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

impl<K, V, S, I> Extend<(K, V)> for DenseMap<K, V, S, I>
where
    K: Hash + Eq,
    S: BuildHasher,
    I: DenseIndex,
{
    /// Inserts with try-emplace semantics; pairs for already-present keys
    /// are dropped.
    ///
    /// # Panics
    /// When the narrow index width is exhausted (`Extend` has no error
    /// channel).
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            if self.insert(k, v).is_err() {
                panic!("dense store index width exhausted during extend");
            }
        }
    }
}

impl<K, V, S, I> FromIterator<(K, V)> for DenseMap<K, V, S, I>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    I: DenseIndex,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::MAX_LOAD;
    use std::cell::Cell;
    use std::collections::BTreeSet;

    /// BuildHasher sending every key to the same home slot, to exercise
    /// displacement chains deterministically.
    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> ConstHasher {
            ConstHasher
        }
    }
    impl core::hash::Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        }
    }

    /// Invariant: insert has try-emplace semantics; a duplicate returns the
    /// existing entry unchanged and drops the new value.
    #[test]
    fn insert_keeps_existing_value() {
        let mut m: DenseMap<String, i32> = DenseMap::new();
        let (c1, fresh) = m.insert("dup".to_string(), 1).unwrap();
        assert!(fresh);
        let (c2, fresh) = m.insert("dup".to_string(), 2).unwrap();
        assert!(!fresh);
        assert_eq!(c1, c2);
        assert_eq!(m.get("dup"), Some(&1));
        assert_eq!(m.len(), 1);
    }

    /// Invariant: `find(k).is_end() == !contains_key(k)` for present and
    /// absent keys.
    #[test]
    fn find_contains_parity() {
        let mut m: DenseMap<String, i32> = DenseMap::new();
        for (i, k) in ["a", "b", "c"].iter().enumerate() {
            m.insert((*k).to_string(), i as i32).unwrap();
        }
        for k in ["a", "b", "c"] {
            assert!(!m.find(k).is_end());
            assert!(m.contains_key(k));
        }
        for k in ["x", "y", "z"] {
            assert!(m.find(k).is_end());
            assert!(!m.contains_key(k));
        }
    }

    /// Invariant: heterogeneous lookup works when the query type declares
    /// equivalence (store `String`, query `&str`); it is the same entry.
    #[test]
    fn borrowed_lookup_with_str() {
        let mut m: DenseMap<String, i32> = DenseMap::new();
        m.insert("hello".to_string(), 1).unwrap();
        assert!(m.contains_key("hello"));
        assert!(!m.contains_key("world"));
        assert_eq!(m.find("hello"), m.find(&"hello".to_string()));
    }

    /// Invariant: cursor access resolves to the entry, value mutation in
    /// place is observed by lookup, and dereferencing the end cursor is an
    /// explicit error.
    #[test]
    fn cursor_access_and_mutation() {
        let mut m: DenseMap<String, i32> = DenseMap::new();
        let (c, _) = m.insert("k1".to_string(), 10).unwrap();
        assert_eq!(m.get_at(&c), Ok((&"k1".to_string(), &10)));
        *m.value_mut_at(&c).unwrap() += 5;
        assert_eq!(m.get("k1"), Some(&15));

        let end: Cursor<u32> = Cursor::end();
        assert_eq!(m.get_at(&end), Err(CursorError::End));
        assert_eq!(m.erase_at(&end), Err(CursorError::End));
    }

    /// Invariant: a rebalance makes previously captured cursors stale, and
    /// revalidation restores them to the same entry.
    #[test]
    fn rebalance_staleness_and_revalidate() {
        let mut m: DenseMap<String, i32> = DenseMap::new();
        let (mut c, _) = m.insert("k".to_string(), 7).unwrap();
        m.force_rehash();
        assert_eq!(m.get_at(&c), Err(CursorError::Stale));
        assert_eq!(m.erase_at(&c), Err(CursorError::Stale));

        m.revalidate(&mut c).unwrap();
        assert_eq!(m.get_at(&c), Ok((&"k".to_string(), &7)));
        assert_eq!(m.erase_at(&c), Ok(("k".to_string(), 7)));
        assert!(m.is_empty());
    }

    /// Invariant: erasing a displaced chain's head leaves every other
    /// colliding key findable (backward-shift compaction, exercised under a
    /// constant hasher so all keys share one home slot).
    #[test]
    fn erase_in_collision_chain_keeps_survivors() {
        let mut m: DenseMap<u32, u32, ConstBuildHasher> =
            DenseMap::with_hasher(ConstBuildHasher);
        for k in 0..8u32 {
            m.insert(k, k * 10).unwrap();
        }
        // Erase a non-tail chain member with displaced successors.
        assert_eq!(m.erase(&0), 1);
        assert_eq!(m.get(&0), None);
        for k in 1..8u32 {
            assert_eq!(m.get(&k), Some(&(k * 10)), "survivor {k} lost");
        }
        // And again from the middle.
        assert_eq!(m.erase(&4), 1);
        for k in (1..8u32).filter(|&k| k != 4) {
            assert_eq!(m.get(&k), Some(&(k * 10)));
        }
        assert_eq!(m.len(), 6);
    }

    /// Invariant: erase_at removes exactly the denoted entry; the cursor is
    /// refused afterwards.
    #[test]
    fn erase_at_removes_exactly_one() {
        let mut m: DenseMap<String, i32> = DenseMap::new();
        m.insert("a".to_string(), 1).unwrap();
        let (c, _) = m.insert("b".to_string(), 2).unwrap();
        m.insert("c".to_string(), 3).unwrap();

        assert_eq!(m.erase_at(&c), Ok(("b".to_string(), 2)));
        assert_eq!(m.len(), 2);
        assert!(!m.contains_key("b"));
        assert!(m.contains_key("a") && m.contains_key("c"));
        assert_eq!(m.erase_at(&c), Err(CursorError::Invalidated));
    }

    /// Invariant: `get_or_insert_with` runs the closure only on actual
    /// insertion and resolves to the stored value otherwise.
    #[test]
    fn get_or_insert_with_is_lazy() {
        let mut m: DenseMap<String, String> = DenseMap::new();
        let calls = Cell::new(0);

        let v = m
            .get_or_insert_with("k".to_string(), || {
                calls.set(calls.get() + 1);
                "v".to_string()
            })
            .unwrap();
        assert_eq!(v, "v");
        assert_eq!(calls.get(), 1);

        let v = m
            .get_or_insert_with("k".to_string(), || {
                calls.set(calls.get() + 1);
                "v2".to_string()
            })
            .unwrap();
        assert_eq!(v, "v");
        assert_eq!(calls.get(), 1, "closure must not run for a present key");
    }

    /// Invariant: load never exceeds the bound right after an insert, and
    /// the table grows past the floor once enough entries arrive.
    #[test]
    fn load_bound_holds_across_growth() {
        let mut m: DenseMap<u64, u64> = DenseMap::new();
        for i in 0..10_000u64 {
            m.insert(i, i).unwrap();
            let load = m.len() as f64 / m.bucket_count() as f64;
            assert!(load <= MAX_LOAD, "load {load} after {i} inserts");
        }
        assert!(m.bucket_count() > 1024);
        assert_eq!(m.len(), 10_000);
    }

    /// Invariant: a forced rehash does not change the observable set of
    /// pairs, though iteration order may.
    #[test]
    fn rehash_is_observably_stable() {
        let mut m: DenseMap<u64, u64> = DenseMap::new();
        for i in 0..2_000u64 {
            m.insert(i, i * 3).unwrap();
        }
        let before: BTreeSet<(u64, u64)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        let gen = m.generation();
        m.force_rehash();
        assert_ne!(m.generation(), gen);
        let after: BTreeSet<(u64, u64)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(before, after);
    }

    /// Invariant: shrink_to_fit trims an oversized bucket table without
    /// losing entries and never drops below the floor.
    #[test]
    fn shrink_to_fit_trims_buckets() {
        let mut m: DenseMap<u64, u64> = DenseMap::with_capacity(1 << 16);
        assert_eq!(m.bucket_count(), 1 << 16);
        for i in 0..100u64 {
            m.insert(i, i).unwrap();
        }
        m.shrink_to_fit();
        assert_eq!(m.bucket_count(), 1024);
        for i in 0..100u64 {
            assert_eq!(m.get(&i), Some(&i));
        }
    }

    /// Invariant: clear releases the bucket table entirely; fast_clear
    /// empties the map while retaining bucket capacity.
    #[test]
    fn clear_and_fast_clear() {
        let mut m: DenseMap<u64, u64> = DenseMap::new();
        for i in 0..3_000u64 {
            m.insert(i, i).unwrap();
        }
        let buckets = m.bucket_count();

        m.fast_clear();
        assert!(m.is_empty());
        assert_eq!(m.bucket_count(), buckets);
        m.insert(1, 1).unwrap();
        assert_eq!(m.get(&1), Some(&1));

        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.bucket_count(), 0);
        m.insert(2, 2).unwrap();
        assert_eq!(m.bucket_count(), 1024);
    }

    /// Invariant: iteration yields each live entry exactly once, and
    /// iter_mut updates are seen by later lookups.
    #[test]
    fn iteration_and_mutation() {
        let mut m: DenseMap<String, i32> = DenseMap::new();
        for (i, k) in ["k1", "k2", "k3"].iter().enumerate() {
            m.insert((*k).to_string(), i as i32).unwrap();
        }
        let seen: BTreeSet<String> = m.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(seen.len(), 3);

        for (_, v) in m.iter_mut() {
            *v += 10;
        }
        assert_eq!(m.get("k1"), Some(&10));
        assert_eq!(m.get("k2"), Some(&11));
        assert_eq!(m.get("k3"), Some(&12));
    }

    /// Invariant: FromIterator/Extend build the same map as repeated
    /// insert, keeping the first value per key.
    #[test]
    fn from_iterator_round_trip() {
        let m: DenseMap<u32, u32> =
            vec![(1, 10), (2, 20), (1, 99)].into_iter().collect();
        assert_eq!(m.len(), 2);
        assert_eq!(m.get(&1), Some(&10));
        assert_eq!(m.get(&2), Some(&20));

        let owned: Vec<(u32, u32)> = m.into_iter().collect();
        assert_eq!(owned.len(), 2);
    }

    /// Invariant: wide-index maps behave identically for ordinary sizes.
    #[test]
    fn wide_index_parity() {
        let mut m: DenseMap<u64, u64, DigestState, u64> = DenseMap::new();
        for i in 0..1_000u64 {
            m.insert(i, i + 1).unwrap();
        }
        assert_eq!(m.len(), 1_000);
        assert_eq!(m.get(&999), Some(&1_000));
        assert_eq!(m.erase(&999), 1);
        assert_eq!(m.get(&999), None);
    }
}
