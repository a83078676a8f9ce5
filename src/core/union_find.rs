//! # Union-find Data Structure
//!
//! Union-find data structure is common in compilers. This one is dense: the
//! values are [`Idx`] types, and the sets live in a vector indexed by the raw
//! index of the values, which suits arena pointers and component numbers.

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::marker::PhantomData;

use crate::core::utils::Idx;

/// An entry in the union-find data structure.
#[derive(Debug, Clone, Copy)]
struct UnionFindEntry {
    /// The raw index of the parent of the entry.
    parent: usize,
    /// The rank of the entry.
    ///
    /// We use [`u8`] to represent the rank. With union-by-rank method, a root
    /// with rank r has at least 2^r nodes, which is sufficient for most cases.
    rank: u8,
}

/// A union-find data structure over [`Idx`] values.
///
/// The representative of a set is reported as the raw index of its root.
///
/// # Examples
///
/// ```
/// use logic_dfg::core::union_find::UnionFind;
///
/// let mut union_find = UnionFind::<usize>::default();
///
/// union_find.insert(1);
/// union_find.insert(2);
/// assert_ne!(union_find.find(1), union_find.find(2));
///
/// union_find.union(1, 2);
/// assert_eq!(union_find.find(1), union_find.find(2));
/// ```
pub struct UnionFind<T> {
    /// The entries indexed by the raw index of the values, [`None`] if the
    /// value was never inserted.
    entries: Vec<Option<UnionFindEntry>>,
    _phantom: PhantomData<fn(T)>,
}

impl<T> Default for UnionFind<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            _phantom: PhantomData,
        }
    }
}

impl<T: Idx> UnionFind<T> {
    /// Create a union-find with room for values with raw index below
    /// `capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            _phantom: PhantomData,
        }
    }

    /// Inserts a value as a new disjoint set.
    ///
    /// # Returns
    ///
    /// `true` if the value is inserted, `false` if the value already exists.
    pub fn insert(&mut self, value: T) -> bool {
        let index = value.index();
        if index >= self.entries.len() {
            self.entries.resize(index + 1, None);
        }
        match self.entries[index] {
            Some(_) => false,
            None => {
                self.entries[index] = Some(UnionFindEntry {
                    parent: index,
                    rank: 0,
                });
                true
            }
        }
    }

    /// Check if the value has been inserted.
    pub fn contains(&self, value: T) -> bool { self.entry(value.index()).is_some() }

    fn entry(&self, index: usize) -> Option<UnionFindEntry> {
        self.entries.get(index).copied().flatten()
    }

    fn entry_mut(&mut self, index: usize) -> &mut UnionFindEntry {
        self.entries[index]
            .as_mut()
            .unwrap_or_else(|| unreachable!())
    }

    /// Finds the raw index of the representative (or the root) of the set
    /// the value belongs to, without compressing the path.
    ///
    /// # Returns
    ///
    /// [`None`] if the value does not exist in the union-find.
    #[must_use = "`find` does not compress the path, its result should be used."]
    pub fn find(&self, value: T) -> Option<usize> {
        let mut index = value.index();
        loop {
            let entry = self.entry(index)?;
            if entry.parent == index {
                return Some(index);
            }
            index = entry.parent;
        }
    }

    /// Finds the raw index of the representative of the set the value belongs
    /// to and compresses the path.
    pub fn find_and_compress(&mut self, value: T) -> Option<usize> {
        let root = self.find(value)?;
        // point every entry on the path directly at the root
        let mut index = value.index();
        while index != root {
            let entry = self.entry_mut(index);
            index = entry.parent;
            entry.parent = root;
        }
        Some(root)
    }

    /// Unions two sets that the given values belong to.
    ///
    /// If the ranks of two sets are the same, the parent will be the first set.
    ///
    /// # Returns
    ///
    /// The raw index of the root of the merged set. [`None`] if any of the
    /// values does not exist in the union-find.
    pub fn union(&mut self, a: T, b: T) -> Option<usize> {
        let mut a = self.find_and_compress(a)?;
        let mut b = self.find_and_compress(b)?;

        if a != b {
            let a_rank = self.entry_mut(a).rank;
            let b_rank = self.entry_mut(b).rank;

            match a_rank.cmp(&b_rank) {
                // keep `a` as the larger rank
                Ordering::Less => core::mem::swap(&mut a, &mut b),
                Ordering::Equal => {
                    let entry = self.entry_mut(a);
                    entry.rank = entry.rank.saturating_add(1);
                }
                Ordering::Greater => {}
            }

            self.entry_mut(b).parent = a;
        }

        Some(a)
    }

    /// Check if two values belong to the same set.
    pub fn same_set(&mut self, a: T, b: T) -> bool {
        match (self.find_and_compress(a), self.find_and_compress(b)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}
