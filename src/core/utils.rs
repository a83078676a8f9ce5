//! Utility types and traits.

use core::hash::Hash;

/// A trait represents a lightweight index.
///
/// The internal can be arbitrary, but it should be able to convert to a raw and
/// *unique* [`usize`] index. Dense tables such as
/// [`UnionFind`](crate::core::union_find::UnionFind) are indexed by it.
///
/// This trait has no nothing to do with [`ArenaPtr`](super::storage::ArenaPtr),
/// but a more general abstraction for types that can be used as an index.
pub trait Idx: Copy + Ord + Hash {
    /// Get the raw [`usize`] from the index.
    fn index(self) -> usize;
}

impl Idx for usize {
    fn index(self) -> usize { self }
}

impl Idx for u32 {
    fn index(self) -> usize { self as usize }
}
