//! DenseMultiSet: counted keys over the multimap engine.

use core::fmt;
use core::hash::{BuildHasher, Hash};

use equivalent::Equivalent;

use crate::cursor::{CursorError, MultiCursor};
use crate::digest::DigestState;
use crate::index::{CapacityError, DenseIndex};
use crate::multi_map::DenseMultiMap;

/// Open-addressing multiset: keys may repeat, each occurrence counted. A
/// thin wrapper over `DenseMultiMap<K, ()>`, selecting the variant at the
/// type level.
#[derive(Clone)]
pub struct DenseMultiSet<K, S = DigestState, I = u32> {
    inner: DenseMultiMap<K, (), S, I>,
}

impl<K, S: Default, I: DenseIndex> DenseMultiSet<K, S, I> {
    pub fn new() -> Self {
        Self {
            inner: DenseMultiMap::new(),
        }
    }

    /// See `DenseMap::with_capacity` for the rounding rules.
    pub fn with_capacity(buckets: usize) -> Self {
        Self {
            inner: DenseMultiMap::with_capacity(buckets),
        }
    }
}

impl<K, S: Default, I: DenseIndex> Default for DenseMultiSet<K, S, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S, I: DenseIndex> DenseMultiSet<K, S, I> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            inner: DenseMultiMap::with_hasher(hasher),
        }
    }

    pub fn with_capacity_and_hasher(buckets: usize, hasher: S) -> Self {
        Self {
            inner: DenseMultiMap::with_capacity_and_hasher(buckets, hasher),
        }
    }

    /// Number of occurrences, duplicates counted individually.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.inner.key_count()
    }

    pub fn bucket_count(&self) -> usize {
        self.inner.bucket_count()
    }

    pub fn generation(&self) -> u64 {
        self.inner.generation()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn fast_clear(&mut self) {
        self.inner.fast_clear();
    }

    /// Iterate keys in storage order; a key with n occurrences appears n
    /// times in a row.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            it: self.inner.iter(),
        }
    }

    /// Iterate distinct keys in storage order.
    pub fn keys(&self) -> crate::multi_map::Keys<'_, K, ()> {
        self.inner.keys()
    }
}

impl<K, S, I> DenseMultiSet<K, S, I>
where
    K: Hash + Eq,
    S: BuildHasher,
    I: DenseIndex,
{
    /// Add an occurrence of a key; duplicates always succeed.
    pub fn insert(&mut self, key: K) -> Result<MultiCursor<I>, CapacityError> {
        self.inner.insert(key, ())
    }

    /// Find a key's first occurrence. End cursor on a miss.
    pub fn find<Q>(&self, q: &Q) -> MultiCursor<I>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.inner.find(q)
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.inner.contains_key(q)
    }

    /// Number of occurrences of a key.
    pub fn count<Q>(&self, q: &Q) -> usize
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.inner.count(q)
    }

    /// Remove every occurrence of a key; returns how many went.
    pub fn erase<Q>(&mut self, q: &Q) -> usize
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.inner.erase_all(q)
    }

    /// Alias of `erase`.
    pub fn erase_all<Q>(&mut self, q: &Q) -> usize
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.inner.erase_all(q)
    }

    /// Remove a single occurrence of a key; `false` if absent.
    pub fn erase_one<Q>(&mut self, q: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let cursor = self.inner.find(q);
        self.inner.erase_at(&cursor).is_ok()
    }

    /// Remove exactly the occurrence a cursor denotes.
    pub fn erase_at(&mut self, cursor: &MultiCursor<I>) -> Result<(), CursorError> {
        self.inner.erase_at(cursor)
    }

    /// Dereference a cursor to its key.
    pub fn get_at(&self, cursor: &MultiCursor<I>) -> Result<&K, CursorError> {
        self.inner.get_at(cursor).map(|(k, _)| k)
    }

    pub fn revalidate(&self, cursor: &mut MultiCursor<I>) -> Result<(), CursorError> {
        self.inner.revalidate(cursor)
    }

    pub fn force_rehash(&mut self) {
        self.inner.force_rehash();
    }

    pub fn shrink_to_fit(&mut self) {
        self.inner.shrink_to_fit();
    }
}

impl<K: fmt::Debug, S, I: DenseIndex> fmt::Debug for DenseMultiSet<K, S, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Iterator over `&K`, repeating each key once per occurrence.
pub struct Iter<'a, K> {
    it: crate::multi_map::Iter<'a, K, ()>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, K, S, I: DenseIndex> IntoIterator for &'a DenseMultiSet<K, S, I> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

impl<K, S, I> Extend<K> for DenseMultiSet<K, S, I>
where
    K: Hash + Eq,
    S: BuildHasher,
    I: DenseIndex,
{
    /// # Panics
    /// When the narrow index width is exhausted.
    fn extend<T: IntoIterator<Item = K>>(&mut self, iter: T) {
        self.inner.extend(iter.into_iter().map(|k| (k, ())));
    }
}

impl<K, S, I> FromIterator<K> for DenseMultiSet<K, S, I>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    I: DenseIndex,
{
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        let mut set = Self::with_hasher(S::default());
        set.extend(iter);
        set
    }
}
