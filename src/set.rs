//! DenseSet: keys-only view over the same engine as `DenseMap`.

use core::fmt;
use core::hash::{BuildHasher, Hash};

use equivalent::Equivalent;

use crate::cursor::{Cursor, CursorError};
use crate::digest::DigestState;
use crate::index::{CapacityError, DenseIndex};
use crate::map::DenseMap;

/// Open-addressing set with fingerprint-filtered probing and dense,
/// insertion-ordered storage. A thin wrapper over `DenseMap<K, ()>`, which
/// is also how the variant is selected: at the type level, not per call.
#[derive(Clone)]
pub struct DenseSet<K, S = DigestState, I = u32> {
    inner: DenseMap<K, (), S, I>,
}

impl<K, S: Default, I: DenseIndex> DenseSet<K, S, I> {
    pub fn new() -> Self {
        Self {
            inner: DenseMap::new(),
        }
    }

    /// See `DenseMap::with_capacity` for the rounding rules.
    pub fn with_capacity(buckets: usize) -> Self {
        Self {
            inner: DenseMap::with_capacity(buckets),
        }
    }
}

impl<K, S: Default, I: DenseIndex> Default for DenseSet<K, S, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S, I: DenseIndex> DenseSet<K, S, I> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            inner: DenseMap::with_hasher(hasher),
        }
    }

    pub fn with_capacity_and_hasher(buckets: usize, hasher: S) -> Self {
        Self {
            inner: DenseMap::with_capacity_and_hasher(buckets, hasher),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
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

    /// Iterate keys in dense-storage order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            it: self.inner.iter(),
        }
    }
}

impl<K, S, I> DenseSet<K, S, I>
where
    K: Hash + Eq,
    S: BuildHasher,
    I: DenseIndex,
{
    /// Insert a key. Returns `false` as the second element when the key was
    /// already present (the stored key is kept, try-emplace style).
    pub fn insert(&mut self, key: K) -> Result<(Cursor<I>, bool), CapacityError> {
        self.inner.insert(key, ())
    }

    pub fn find<Q>(&self, q: &Q) -> Cursor<I>
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

    /// Remove a key; returns the number removed (0 or 1).
    pub fn erase<Q>(&mut self, q: &Q) -> usize
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.inner.erase(q)
    }

    /// Alias of `erase`; sets hold at most one entry per key.
    pub fn erase_all<Q>(&mut self, q: &Q) -> usize
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.inner.erase(q)
    }

    /// Remove exactly the key a cursor denotes.
    pub fn erase_at(&mut self, cursor: &Cursor<I>) -> Result<K, CursorError> {
        self.inner.erase_at(cursor).map(|(k, ())| k)
    }

    /// Dereference a cursor to its key.
    pub fn get_at(&self, cursor: &Cursor<I>) -> Result<&K, CursorError> {
        self.inner.get_at(cursor).map(|(k, _)| k)
    }

    pub fn revalidate(&self, cursor: &mut Cursor<I>) -> Result<(), CursorError> {
        self.inner.revalidate(cursor)
    }

    pub fn force_rehash(&mut self) {
        self.inner.force_rehash();
    }

    pub fn shrink_to_fit(&mut self) {
        self.inner.shrink_to_fit();
    }
}

impl<K: fmt::Debug, S, I: DenseIndex> fmt::Debug for DenseSet<K, S, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Iterator over `&K` in dense-storage order.
pub struct Iter<'a, K> {
    it: crate::map::Iter<'a, K, ()>,
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

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<'a, K, S, I: DenseIndex> IntoIterator for &'a DenseSet<K, S, I> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

impl<K, S, I> Extend<K> for DenseSet<K, S, I>
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

impl<K, S, I> FromIterator<K> for DenseSet<K, S, I>
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
