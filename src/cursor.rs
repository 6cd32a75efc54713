//! Cursors: cheap capability objects for re-visiting a found entry.
//!
//! A cursor captures a dense index, the bucket slot that redirected to it,
//! and the table's structural generation at capture time. While the
//! generation still matches, the cached bucket is trusted and cursor-based
//! erase skips re-hashing entirely. Any rebalance bumps the generation;
//! cursor operations then report `CursorError::Stale` instead of guessing,
//! and `revalidate` re-derives the bucket with a fresh probe (dense indices
//! survive rebalance untouched).
//!
//! One documented trap is inherited from the deletion design and is *not*
//! detected: erasing an unrelated entry swaps the dense tail into the freed
//! slot, so a cursor that pointed at the tail now silently denotes the
//! swapped-in entry. Callers who erase between capturing and using a cursor
//! must re-derive it by key.

use core::fmt;

use crate::index::DenseIndex;

/// Why a cursor operation was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorError {
    /// The cursor is the end marker and denotes no entry.
    End,
    /// Captured before a rebalance; the cached bucket index can no longer
    /// be trusted. Revalidate or re-derive by key.
    Stale,
    /// The cursor no longer denotes a live entry (it was erased, or the
    /// table was cleared).
    Invalidated,
}

impl fmt::Display for CursorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorError::End => f.write_str("cursor denotes no entry"),
            CursorError::Stale => f.write_str("cursor predates a rebalance; revalidate first"),
            CursorError::Invalidated => f.write_str("cursor no longer denotes a live entry"),
        }
    }
}

impl std::error::Error for CursorError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RawCursor<I> {
    pub(crate) dense: I,
    pub(crate) bucket: usize,
    pub(crate) generation: u64,
}

/// Cursor into a `DenseMap` or `DenseSet`.
///
/// Obtained from `find` and `insert`; the end cursor marks a lookup miss.
/// All dereferencing goes through the owning container (`get_at`,
/// `value_mut_at`, `erase_at`), which checks liveness and staleness and
/// reports misuse as a `CursorError`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor<I = u32> {
    pos: Option<RawCursor<I>>,
}

impl<I: DenseIndex> Cursor<I> {
    /// The end marker: denotes no entry.
    pub fn end() -> Self {
        Self { pos: None }
    }

    pub fn is_end(&self) -> bool {
        self.pos.is_none()
    }

    /// Position in the dense store, if the cursor denotes an entry. Stays
    /// meaningful across rebalances but not across deletions.
    pub fn dense_index(&self) -> Option<usize> {
        self.pos.map(|p| p.dense.to_usize())
    }

    pub(crate) fn live(dense: I, bucket: usize, generation: u64) -> Self {
        Self {
            pos: Some(RawCursor {
                dense,
                bucket,
                generation,
            }),
        }
    }

    pub(crate) fn raw(&self) -> Option<RawCursor<I>> {
        self.pos
    }

    pub(crate) fn set(&mut self, raw: RawCursor<I>) {
        self.pos = Some(raw);
    }
}

/// Cursor into a `DenseMultiMap` or `DenseMultiSet`.
///
/// Adds the position inside the per-key entry list. Erasing an earlier list
/// member shifts later positions down by one; as with the tail-swap trap,
/// that movement is documented rather than detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MultiCursor<I = u32> {
    pos: Option<(RawCursor<I>, usize)>,
}

impl<I: DenseIndex> MultiCursor<I> {
    pub fn end() -> Self {
        Self { pos: None }
    }

    pub fn is_end(&self) -> bool {
        self.pos.is_none()
    }

    pub fn dense_index(&self) -> Option<usize> {
        self.pos.map(|(p, _)| p.dense.to_usize())
    }

    /// Position inside the denoted key's entry list.
    pub fn list_index(&self) -> Option<usize> {
        self.pos.map(|(_, i)| i)
    }

    pub(crate) fn live(dense: I, bucket: usize, generation: u64, list: usize) -> Self {
        Self {
            pos: Some((
                RawCursor {
                    dense,
                    bucket,
                    generation,
                },
                list,
            )),
        }
    }

    pub(crate) fn raw(&self) -> Option<(RawCursor<I>, usize)> {
        self.pos
    }

    pub(crate) fn set(&mut self, raw: RawCursor<I>, list: usize) {
        self.pos = Some((raw, list));
    }
}
