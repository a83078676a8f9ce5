//! Storage Infrastructure
//!
//! This module provides [`Arena`] and [`ArenaPtr`] as storage infrastructure.
//! [`GenericArena`] and [`GenericPtr`] are the basic generational arena and
//! pointer used to build the storage of graphs and vertices.
//!
//! Arena pointers are lightweight handles. A pointer stays valid until its
//! entry is deallocated; after that, every dereference through the stale
//! pointer fails, even if the slot has been reused by a later allocation,
//! because each slot carries a generation counter that is bumped on reuse.
//!
//! # See also
//!
//! - [Linked List](crate::core::linked_list)
//! - [Union-Find](crate::core::union_find)

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::{fmt, mem};

use crate::core::utils::Idx;

/// A trait for indexing into an arena.
pub trait ArenaPtr: Copy + Eq + Hash {
    /// The arena type, which should support the pointer type.
    type Arena: Arena<Self>;

    /// The internal data.
    type Data;

    /// Try to dereference the pointer with an arena.
    ///
    /// # Returns
    ///
    /// - `Some(&Self::Data)`: A reference to the data in the arena.
    /// - `None`: The pointer is invalid.
    fn try_deref(self, arena: &Self::Arena) -> Option<&Self::Data> { arena.try_deref(self) }

    /// Try to mutably dereference the pointer with an arena.
    ///
    /// # Returns
    ///
    /// - `Some(&mut Self::Data)`: A mutable reference to the data in the arena.
    /// - `None`: The pointer is invalid.
    fn try_deref_mut(self, arena: &mut Self::Arena) -> Option<&mut Self::Data> {
        arena.try_deref_mut(self)
    }
}

/// A trait for an arena that can store data and allocate pointers.
///
/// # Type Parameters
///
/// - `Ptr`: The pointer type that is supported by the arena. The data type is
///   inferred from the pointer type by using [`ArenaPtr::Data`].
pub trait Arena<Ptr>
where
    Ptr: ArenaPtr<Arena = Self>,
{
    /// Construct data with the allocated pointer and store it into the arena.
    ///
    /// This allows the stored data to know its own pointer.
    fn alloc_with<F>(&mut self, f: F) -> Ptr
    where
        F: FnOnce(Ptr) -> Ptr::Data;

    /// Store data into the arena and return the allocated pointer.
    fn alloc(&mut self, data: Ptr::Data) -> Ptr { self.alloc_with(|_| data) }

    /// Deallocate the data of the pointer from the arena.
    ///
    /// # Returns
    ///
    /// - `Some(Ptr::Data)`: The data of the deallocated pointer.
    /// - `None`: The pointer is invalid.
    fn try_dealloc(&mut self, ptr: Ptr) -> Option<Ptr::Data>;

    /// Try to dereference a pointer.
    fn try_deref(&self, ptr: Ptr) -> Option<&Ptr::Data>;

    /// Try to mutably dereference a pointer.
    fn try_deref_mut(&mut self, ptr: Ptr) -> Option<&mut Ptr::Data>;
}

/// A generational arena pointer.
///
/// The pointer can only be allocated by [`GenericArena`]. One should not create
/// a pointer manually.
///
/// The pointer is a raw index into the arena plus the generation of the slot
/// at allocation time. Two pointers to the same slot but different
/// generations never compare equal.
///
/// The pointer implements [`Ord`] to allow sorting. The order is based on the
/// raw index first, i.e., the position of the data in the arena.
///
/// # Type Parameters
///
/// - `Data`: The type of the stored data, which is the same as the data type in
///   the arena.
pub struct GenericPtr<Data> {
    /// The raw index of the pointer.
    index: usize,
    /// The generation of the slot when the pointer was allocated.
    generation: u32,
    _phantom: PhantomData<fn() -> Data>,
}

impl<Data> GenericPtr<Data> {
    fn new(index: usize, generation: u32) -> Self {
        Self {
            index,
            generation,
            _phantom: PhantomData,
        }
    }

    /// The generation of the slot this pointer refers to.
    pub fn generation(self) -> u32 { self.generation }
}

impl<Data> Idx for GenericPtr<Data> {
    fn index(self) -> usize { self.index }
}

impl<Data> Clone for GenericPtr<Data> {
    fn clone(&self) -> Self { *self }
}

impl<Data> Copy for GenericPtr<Data> {}

impl<Data> Hash for GenericPtr<Data> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<Data> PartialEq for GenericPtr<Data> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<Data> Eq for GenericPtr<Data> {}

impl<Data> PartialOrd for GenericPtr<Data> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl<Data> Ord for GenericPtr<Data> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index
            .cmp(&other.index)
            .then(self.generation.cmp(&other.generation))
    }
}

impl<Data> fmt::Debug for GenericPtr<Data> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "*{}@{}", self.index, self.generation)
    }
}

impl<Data> fmt::Display for GenericPtr<Data> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "*{}", self.index) }
}

/// An entry in a generic arena.
pub enum GenericEntry<Data> {
    /// The entry is vacant.
    ///
    /// The free list is not ordered by its index, but by the order of
    /// de-allocation, the last deallocated entry will be the first entry in
    /// the free list.
    Vacant {
        /// The index of the next vacant entry.
        next: Option<usize>,
        /// The generation of the last data stored in this entry.
        generation: u32,
    },
    /// The entry is occupied.
    Occupied {
        /// The generation of the stored data.
        generation: u32,
        /// The stored data.
        data: Data,
    },
}

/// A generational arena.
///
/// # Type Parameters
///
/// - `Data`: The type of the stored data. All allocated pointers will have this
///   as the data type.
///
/// # Examples
///
/// ```
/// use logic_dfg::core::storage::{Arena, ArenaPtr, GenericArena};
///
/// let mut arena = GenericArena::default();
///
/// let one = arena.alloc(1);
/// let two = arena.alloc(2);
/// assert_ne!(one, two);
///
/// assert_eq!(one.try_deref(&arena), Some(&1));
/// assert_eq!(arena.try_dealloc(one), Some(1));
///
/// // the slot of `one` is reused, but `one` stays dead
/// let three = arena.alloc(3);
/// assert_eq!(one.try_deref(&arena), None);
/// assert_eq!(three.try_deref(&arena), Some(&3));
/// ```
pub struct GenericArena<Data> {
    /// The entries in the arena.
    entries: Vec<GenericEntry<Data>>,
    /// The head of the free list.
    ///
    /// This is the index of the first vacant entry, also the last deallocated
    /// entry.
    free_head: Option<usize>,
    /// Number of occupied entries.
    len: usize,
}

impl<Data> Default for GenericArena<Data> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            free_head: None,
            len: 0,
        }
    }
}

impl<Data> GenericArena<Data> {
    /// Reserve additional capacity.
    pub fn reserve(&mut self, additional: usize) { self.entries.reserve(additional) }

    /// Create a new arena with a specific capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free_head: None,
            len: 0,
        }
    }

    /// Number of live entries in the arena.
    pub fn len(&self) -> usize { self.len }

    /// Check if the arena holds no live entries.
    pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Iterate over the stored data.
    pub fn iter(&self) -> impl Iterator<Item = &Data> {
        self.entries.iter().filter_map(|entry| match entry {
            GenericEntry::Occupied { data, .. } => Some(data),
            GenericEntry::Vacant { .. } => None,
        })
    }

    /// Iterate over the pointers of all live entries, in index order.
    pub fn ptrs(&self) -> impl Iterator<Item = GenericPtr<Data>> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match entry {
                GenericEntry::Occupied { generation, .. } => {
                    Some(GenericPtr::new(index, *generation))
                }
                GenericEntry::Vacant { .. } => None,
            })
    }
}

impl<Data> ArenaPtr for GenericPtr<Data> {
    type Arena = GenericArena<Data>;
    type Data = Data;
}

impl<Data> Arena<GenericPtr<Data>> for GenericArena<Data> {
    fn alloc_with<F>(&mut self, f: F) -> GenericPtr<Data>
    where
        F: FnOnce(GenericPtr<Data>) -> Data,
    {
        self.len += 1;
        match self.free_head.take() {
            Some(index) => {
                let entry = &mut self.entries[index];
                let (next, generation) = match entry {
                    GenericEntry::Vacant { next, generation } => {
                        (*next, generation.wrapping_add(1))
                    }
                    // we have a `free_head`, this entry should be vacant
                    GenericEntry::Occupied { .. } => unreachable!(),
                };
                self.free_head = next;
                let ptr = GenericPtr::new(index, generation);
                *entry = GenericEntry::Occupied {
                    generation,
                    data: f(ptr),
                };
                ptr
            }
            None => {
                let index = self.entries.len();
                let ptr = GenericPtr::new(index, 0);
                self.entries.push(GenericEntry::Occupied {
                    generation: 0,
                    data: f(ptr),
                });
                ptr
            }
        }
    }

    fn try_dealloc(&mut self, ptr: GenericPtr<Data>) -> Option<Data> {
        match self.entries.get(ptr.index()) {
            Some(GenericEntry::Occupied { generation, .. }) if *generation == ptr.generation => {}
            _ => return None,
        }
        let old_entry = mem::replace(
            &mut self.entries[ptr.index()],
            GenericEntry::Vacant {
                next: self.free_head,
                generation: ptr.generation,
            },
        );
        self.free_head = Some(ptr.index());
        self.len -= 1;
        match old_entry {
            GenericEntry::Occupied { data, .. } => Some(data),
            GenericEntry::Vacant { .. } => unreachable!(),
        }
    }

    fn try_deref(&self, ptr: GenericPtr<Data>) -> Option<&Data> {
        match self.entries.get(ptr.index())? {
            GenericEntry::Occupied { generation, data } if *generation == ptr.generation => {
                Some(data)
            }
            _ => None,
        }
    }

    fn try_deref_mut(&mut self, ptr: GenericPtr<Data>) -> Option<&mut Data> {
        match self.entries.get_mut(ptr.index())? {
            GenericEntry::Occupied { generation, data } if *generation == ptr.generation => {
                Some(data)
            }
            _ => None,
        }
    }
}
