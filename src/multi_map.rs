//! DenseMultiMap: multiple entries per key over the same engine.
//!
//! Each dense slot owns one key plus a small ordered list of the values
//! inserted under it. The key lives outside the list, so duplicate checks
//! during probing compare a single field and never walk the list. The
//! bucket table sees one slot per distinct key; a separate counter tracks
//! the true element count including duplicates.
//!
//! Erasing a single entry whose key still has other entries is a fast
//! path: the list shrinks in place and the bucket table is not touched.
//! Only when the last entry of a key goes does the full slot-removal
//! protocol (swap-with-last, backward-shift) run.

use core::fmt;
use core::hash::{BuildHasher, Hash};

use equivalent::Equivalent;

use crate::bucket::{BucketTable, Probe, MIN_BUCKETS};
use crate::cursor::{CursorError, MultiCursor, RawCursor};
use crate::digest::DigestState;
use crate::index::{CapacityError, DenseIndex};

#[derive(Clone, Debug)]
struct MultiEntry<K, V> {
    key: K,
    values: Vec<V>,
}

/// Open-addressing multimap: any number of entries per key, stored as a
/// per-key list in a dense slot. Insertion always appends; `erase`/
/// `erase_all` remove every entry of a key, `erase_at` exactly one.
#[derive(Clone)]
pub struct DenseMultiMap<K, V, S = DigestState, I = u32> {
    buckets: BucketTable<I>,
    entries: Vec<MultiEntry<K, V>>,
    len: usize,
    hasher: S,
}

impl<K, V, S: Default, I: DenseIndex> DenseMultiMap<K, V, S, I> {
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// See `DenseMap::with_capacity` for the rounding rules.
    pub fn with_capacity(buckets: usize) -> Self {
        Self::with_capacity_and_hasher(buckets, S::default())
    }
}

impl<K, V, S: Default, I: DenseIndex> Default for DenseMultiMap<K, V, S, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, I: DenseIndex> DenseMultiMap<K, V, S, I> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            buckets: BucketTable::unallocated(),
            entries: Vec::new(),
            len: 0,
            hasher,
        }
    }

    pub fn with_capacity_and_hasher(buckets: usize, hasher: S) -> Self {
        let mut table = BucketTable::unallocated();
        table.allocate(buckets.next_power_of_two().max(MIN_BUCKETS));
        Self {
            buckets: table,
            entries: Vec::new(),
            len: 0,
            hasher,
        }
    }

    /// Number of live entries, duplicates counted individually.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct keys (equals the occupied bucket slots).
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.bucket_count()
    }

    pub fn generation(&self) -> u64 {
        self.buckets.generation()
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn clear(&mut self) {
        self.entries = Vec::new();
        self.len = 0;
        self.buckets.reset();
    }

    pub fn fast_clear(&mut self) {
        self.entries.clear();
        self.len = 0;
        self.buckets.fast_clear();
    }

    /// Iterate `(&K, &V)` in storage order: dense slots in order, each
    /// key's list in insertion order. Keys with multiple entries repeat.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            outer: self.entries.iter(),
            current: None,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            outer: self.entries.iter_mut(),
            current: None,
        }
    }

    /// Iterate distinct keys in storage order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            it: self.entries.iter(),
        }
    }
}

impl<K, V, S, I> DenseMultiMap<K, V, S, I>
where
    K: Hash + Eq,
    S: BuildHasher,
    I: DenseIndex,
{
    #[inline]
    fn digest<Q: ?Sized + Hash>(&self, q: &Q) -> u64 {
        self.hasher.hash_one(q)
    }

    /// Append an entry. A present key gains a list member (no bucket-table
    /// write, no rebalance); a fresh key occupies a new slot. Returns a
    /// cursor to the appended entry.
    pub fn insert(&mut self, key: K, value: V) -> Result<MultiCursor<I>, CapacityError> {
        if !self.buckets.is_allocated() {
            self.buckets.allocate(MIN_BUCKETS);
        }
        let digest = self.digest(&key);
        let entries = &self.entries;
        match self
            .buckets
            .probe(digest, |d| entries[d.to_usize()].key == key)
        {
            Probe::Hit { bucket, dense } => {
                let values = &mut self.entries[dense.to_usize()].values;
                values.push(value);
                let list = values.len() - 1;
                self.len += 1;
                Ok(MultiCursor::live(
                    dense,
                    bucket,
                    self.buckets.generation(),
                    list,
                ))
            }
            Probe::Miss { bucket } => {
                if self.entries.len() >= I::MAX_ELEMENTS {
                    return Err(CapacityError);
                }
                let dense = I::from_usize(self.entries.len());
                self.entries.push(MultiEntry {
                    key,
                    values: vec![value],
                });
                self.buckets.occupy(bucket, digest, dense);
                self.len += 1;
                let bucket = if self.buckets.maybe_grow(self.entries.len()) {
                    self.buckets.locate_dense(digest, dense)
                } else {
                    bucket
                };
                Ok(MultiCursor::live(dense, bucket, self.buckets.generation(), 0))
            }
        }
    }

    /// Find a key's first entry. End cursor on a miss.
    pub fn find<Q>(&self, q: &Q) -> MultiCursor<I>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        if self.entries.is_empty() {
            return MultiCursor::end();
        }
        let digest = self.digest(q);
        let entries = &self.entries;
        match self
            .buckets
            .probe(digest, |d| q.equivalent(&entries[d.to_usize()].key))
        {
            Probe::Hit { bucket, dense } => {
                MultiCursor::live(dense, bucket, self.buckets.generation(), 0)
            }
            Probe::Miss { .. } => MultiCursor::end(),
        }
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        !self.find(q).is_end()
    }

    /// Number of entries stored under a key.
    pub fn count<Q>(&self, q: &Q) -> usize
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.values(q).map_or(0, <[V]>::len)
    }

    /// The values stored under a key, in insertion order.
    pub fn values<Q>(&self, q: &Q) -> Option<&[V]>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let (raw, _) = self.find(q).raw()?;
        Some(&self.entries[raw.dense.to_usize()].values)
    }

    pub fn values_mut<Q>(&mut self, q: &Q) -> Option<&mut [V]>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let (raw, _) = self.find(q).raw()?;
        Some(&mut self.entries[raw.dense.to_usize()].values)
    }

    /// Remove every entry stored under a key; returns how many went.
    pub fn erase_all<Q>(&mut self, q: &Q) -> usize
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
                let entry = self.remove_at_bucket(bucket);
                let n = entry.values.len();
                self.len -= n;
                n
            }
            Probe::Miss { .. } => 0,
        }
    }

    /// Alias of `erase_all`: erasing by key removes every entry sharing it.
    pub fn erase<Q>(&mut self, q: &Q) -> usize
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.erase_all(q)
    }

    /// Remove exactly the entry a cursor denotes. While the key keeps other
    /// entries this shrinks the list in place and leaves the bucket table
    /// (and generation) untouched; later list positions shift down by one.
    pub fn erase_at(&mut self, cursor: &MultiCursor<I>) -> Result<V, CursorError> {
        let (raw, list) = cursor.raw().ok_or(CursorError::End)?;
        if raw.generation != self.buckets.generation() {
            return Err(CursorError::Stale);
        }
        let dense = raw.dense.to_usize();
        if dense >= self.entries.len() || !self.buckets.slot_matches(raw.bucket, raw.dense) {
            return Err(CursorError::Invalidated);
        }
        let list_len = self.entries[dense].values.len();
        if list >= list_len {
            return Err(CursorError::Invalidated);
        }
        self.len -= 1;
        if list_len > 1 {
            return Ok(self.entries[dense].values.remove(list));
        }
        let entry = self.remove_at_bucket(raw.bucket);
        let mut values = entry.values;
        match values.pop() {
            Some(v) => Ok(v),
            None => unreachable!("per-key list empty at removal"),
        }
    }

    /// Dereference a cursor to the key and the denoted list member.
    pub fn get_at(&self, cursor: &MultiCursor<I>) -> Result<(&K, &V), CursorError> {
        let (raw, list) = self.vet(cursor)?;
        let entry = &self.entries[raw.dense.to_usize()];
        Ok((&entry.key, &entry.values[list]))
    }

    pub fn value_mut_at(&mut self, cursor: &MultiCursor<I>) -> Result<&mut V, CursorError> {
        let (raw, list) = self.vet(cursor)?;
        Ok(&mut self.entries[raw.dense.to_usize()].values[list])
    }

    /// Refresh a stale cursor after a rebalance; see `DenseMap::revalidate`.
    pub fn revalidate(&self, cursor: &mut MultiCursor<I>) -> Result<(), CursorError> {
        let (raw, list) = cursor.raw().ok_or(CursorError::End)?;
        let dense = raw.dense.to_usize();
        if dense >= self.entries.len() || list >= self.entries[dense].values.len() {
            return Err(CursorError::Invalidated);
        }
        let digest = self.digest(&self.entries[dense].key);
        match self.buckets.probe(digest, |d| d == raw.dense) {
            Probe::Hit { bucket, .. } => {
                cursor.set(
                    RawCursor {
                        dense: raw.dense,
                        bucket,
                        generation: self.buckets.generation(),
                    },
                    list,
                );
                Ok(())
            }
            Probe::Miss { .. } => Err(CursorError::Invalidated),
        }
    }

    /// Explicit rebalance over occupied slots (distinct keys); see
    /// `DenseMap::force_rehash`.
    pub fn force_rehash(&mut self) {
        if !self.buckets.is_allocated() {
            return;
        }
        let target = self.buckets.force_target(self.entries.len());
        self.buckets.rebalance(target);
    }

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

    fn vet(&self, cursor: &MultiCursor<I>) -> Result<(RawCursor<I>, usize), CursorError> {
        let (raw, list) = cursor.raw().ok_or(CursorError::End)?;
        if raw.generation != self.buckets.generation() {
            return Err(CursorError::Stale);
        }
        let dense = raw.dense.to_usize();
        if dense >= self.entries.len() || list >= self.entries[dense].values.len() {
            return Err(CursorError::Invalidated);
        }
        Ok((raw, list))
    }

    fn remove_at_bucket(&mut self, bucket: usize) -> MultiEntry<K, V> {
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
            Some(e) => e,
            None => unreachable!("dense store empty during removal"),
        }
    }
}

impl<K, V, S, I> fmt::Debug for DenseMultiMap<K, V, S, I>
where
    K: fmt::Debug,
    V: fmt::Debug,
    I: DenseIndex,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over `(&K, &V)` in storage order, flattening per-key lists.
pub struct Iter<'a, K, V> {
    outer: core::slice::Iter<'a, MultiEntry<K, V>>,
    current: Option<(&'a K, core::slice::Iter<'a, V>)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((k, it)) = &mut self.current {
                if let Some(v) = it.next() {
                    return Some((k, v));
                }
            }
            let e = self.outer.next()?;
            self.current = Some((&e.key, e.values.iter()));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // Every remaining slot holds at least one value; list lengths are
        // unknown without walking, so no upper bound.
        let current = self.current.as_ref().map_or(0, |(_, it)| it.len());
        (current + self.outer.len(), None)
    }
}

/// Iterator over `(&K, &mut V)` in storage order.
pub struct IterMut<'a, K, V> {
    outer: core::slice::IterMut<'a, MultiEntry<K, V>>,
    current: Option<(&'a K, core::slice::IterMut<'a, V>)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((k, it)) = &mut self.current {
                if let Some(v) = it.next() {
                    return Some((k, v));
                }
            }
            let e = self.outer.next()?;
            self.current = Some((&e.key, e.values.iter_mut()));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let current = self.current.as_ref().map_or(0, |(_, it)| it.len());
        (current + self.outer.len(), None)
    }
}

/// Iterator over distinct keys in storage order.
pub struct Keys<'a, K, V> {
    it: core::slice::Iter<'a, MultiEntry<K, V>>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|e| &e.key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<'a, K, V, S, I: DenseIndex> IntoIterator for &'a DenseMultiMap<K, V, S, I> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S, I: DenseIndex> IntoIterator for &'a mut DenseMultiMap<K, V, S, I> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

impl<K, V, S, I> Extend<(K, V)> for DenseMultiMap<K, V, S, I>
where
    K: Hash + Eq,
    S: BuildHasher,
    I: DenseIndex,
{
    /// # Panics
    /// When the narrow index width is exhausted.
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            if self.insert(k, v).is_err() {
                panic!("dense store index width exhausted during extend");
            }
        }
    }
}

impl<K, V, S, I> FromIterator<(K, V)> for DenseMultiMap<K, V, S, I>
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
