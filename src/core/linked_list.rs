//! Intrusive Doubly-Linked Lists
//!
//! The list nodes live in an [`Arena`](crate::core::storage::Arena) and carry
//! their own [`Links`], while the [`LinkedList`] itself only stores the head,
//! the tail and the length. Insertion, removal and splicing are O(1), and a
//! node can be unlinked while iterating as long as the successor was fetched
//! before.

use core::fmt;

use crate::core::storage::ArenaPtr;

/// The links of a node in a [`LinkedList`].
pub struct Links<P> {
    prev: Option<P>,
    next: Option<P>,
}

impl<P> Default for Links<P> {
    fn default() -> Self {
        Self {
            prev: None,
            next: None,
        }
    }
}

impl<P: Copy> Links<P> {
    /// The previous node.
    pub fn prev(&self) -> Option<P> { self.prev }

    /// The next node.
    pub fn next(&self) -> Option<P> { self.next }

    fn is_detached(&self) -> bool { self.prev.is_none() && self.next.is_none() }
}

impl<P: fmt::Debug> fmt::Debug for Links<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Links({:?} <-> {:?})", self.prev, self.next)
    }
}

/// A pointer whose data can be threaded through a [`LinkedList`].
pub trait LinkedListNode: ArenaPtr {
    /// The links stored in the node data.
    fn links(data: &Self::Data) -> &Links<Self>;

    /// The links stored in the node data, mutably.
    fn links_mut(data: &mut Self::Data) -> &mut Links<Self>;
}

/// An intrusive doubly-linked list of arena nodes.
///
/// A node must be in at most one list at a time.
pub struct LinkedList<P> {
    head: Option<P>,
    tail: Option<P>,
    len: usize,
}

impl<P> Default for LinkedList<P> {
    fn default() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
        }
    }
}

impl<P: LinkedListNode> LinkedList<P> {
    /// The first node of the list.
    pub fn front(&self) -> Option<P> { self.head }

    /// The last node of the list.
    pub fn back(&self) -> Option<P> { self.tail }

    /// Number of nodes in the list.
    pub fn len(&self) -> usize { self.len }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool { self.len == 0 }

    /// The node after `node`.
    pub fn next(arena: &P::Arena, node: P) -> Option<P> { Self::links(arena, node).next }

    /// The node before `node`.
    pub fn prev(arena: &P::Arena, node: P) -> Option<P> { Self::links(arena, node).prev }

    fn links(arena: &P::Arena, node: P) -> &Links<P> {
        P::links(
            node.try_deref(arena)
                .unwrap_or_else(|| panic!("dangling node in linked list")),
        )
    }

    fn links_mut(arena: &mut P::Arena, node: P) -> &mut Links<P> {
        P::links_mut(
            node.try_deref_mut(arena)
                .unwrap_or_else(|| panic!("dangling node in linked list")),
        )
    }

    /// Append a detached node at the end of the list.
    pub fn push_back(&mut self, arena: &mut P::Arena, node: P) {
        debug_assert!(
            Self::links(arena, node).is_detached() && self.head != Some(node),
            "node is already linked"
        );
        match self.tail {
            Some(tail) => {
                Self::links_mut(arena, tail).next = Some(node);
                Self::links_mut(arena, node).prev = Some(tail);
            }
            None => self.head = Some(node),
        }
        self.tail = Some(node);
        self.len += 1;
    }

    /// Unlink a node of this list, leaving it detached.
    pub fn unlink(&mut self, arena: &mut P::Arena, node: P) {
        let links = Self::links_mut(arena, node);
        let prev = links.prev.take();
        let next = links.next.take();
        match prev {
            Some(prev) => Self::links_mut(arena, prev).next = next,
            None => {
                debug_assert!(self.head == Some(node), "node is not in this list");
                self.head = next;
            }
        }
        match next {
            Some(next) => Self::links_mut(arena, next).prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
    }

    /// Move all nodes of `other` to the end of this list, leaving `other`
    /// empty.
    pub fn append(&mut self, arena: &mut P::Arena, other: &mut Self) {
        let Some(other_head) = other.head.take() else {
            return;
        };
        match self.tail {
            Some(tail) => {
                Self::links_mut(arena, tail).next = Some(other_head);
                Self::links_mut(arena, other_head).prev = Some(tail);
            }
            None => self.head = Some(other_head),
        }
        self.tail = other.tail.take();
        self.len += core::mem::take(&mut other.len);
    }

    /// Iterate over the nodes from front to back.
    pub fn iter<'a>(&self, arena: &'a P::Arena) -> Iter<'a, P> {
        Iter {
            arena,
            next: self.head,
        }
    }
}

/// An iterator over the nodes of a [`LinkedList`].
pub struct Iter<'a, P: ArenaPtr> {
    arena: &'a P::Arena,
    next: Option<P>,
}

impl<'a, P: LinkedListNode> Iterator for Iter<'a, P> {
    type Item = P;

    fn next(&mut self) -> Option<P> {
        let node = self.next?;
        self.next = LinkedList::<P>::next(self.arena, node);
        Some(node)
    }
}
