//! Operand edges.
//!
//! An edge is owned by its sink: the operand slots live inside the sink
//! vertex, inline for fixed-arity kinds and in a vector for variables. The
//! source keeps the handles of the edges reading it in its sink list, and
//! each slot remembers its position there, so unlinking is O(1).

use alloc::vec::Vec;
use core::fmt;

use arrayvec::ArrayVec;

use super::types::{Arity, MAX_FIXED_ARITY};
use super::{Context, Vertex};

/// An operand edge, identified by its sink vertex and operand index.
///
/// The sink of an edge never changes, the source can be rewired with
/// [`Edge::relink_source`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    sink: Vertex,
    index: u32,
}

impl Edge {
    pub(super) fn new(sink: Vertex, index: usize) -> Self {
        Self {
            sink,
            index: index as u32,
        }
    }

    /// The vertex owning this edge.
    pub fn sink(self) -> Vertex { self.sink }

    /// The operand index of this edge in its sink.
    pub fn index(self) -> usize { self.index as usize }

    /// The vertex driving this edge, if any.
    pub fn source(self, ctx: &Context) -> Option<Vertex> { ctx.slot(self).source }

    /// Detach the edge from its source. No-op if the edge has no source.
    pub fn unlink_source(self, ctx: &mut Context) { ctx.unlink_edge(self) }

    /// Make `source` drive this edge, detaching it from its previous source.
    pub fn relink_source(self, ctx: &mut Context, source: Vertex) {
        ctx.relink_edge(self, source)
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}.{}", self.sink, self.index)
    }
}

/// An operand slot.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct EdgeSlot {
    pub(super) source: Option<Vertex>,
    /// Position of the edge in the sink list of `source`.
    pub(super) sink_pos: u32,
}

/// The operand slots of a vertex.
pub(super) enum Sources {
    Fixed(ArrayVec<EdgeSlot, MAX_FIXED_ARITY>),
    Variadic(Vec<EdgeSlot>),
}

impl Sources {
    pub(super) fn new(arity: Arity) -> Self {
        match arity {
            Arity::Fixed(n) => Sources::Fixed((0..n).map(|_| EdgeSlot::default()).collect()),
            Arity::Variadic => Sources::Variadic(Vec::new()),
        }
    }

    pub(super) fn len(&self) -> usize { self.as_slice().len() }

    pub(super) fn as_slice(&self) -> &[EdgeSlot] {
        match self {
            Sources::Fixed(slots) => slots,
            Sources::Variadic(slots) => slots,
        }
    }

    pub(super) fn as_mut_slice(&mut self) -> &mut [EdgeSlot] {
        match self {
            Sources::Fixed(slots) => slots,
            Sources::Variadic(slots) => slots,
        }
    }

    /// The growable slots of a variadic vertex.
    pub(super) fn as_mut_vec(&mut self) -> &mut Vec<EdgeSlot> {
        match self {
            Sources::Variadic(slots) => slots,
            Sources::Fixed(_) => panic!("fixed-arity operands cannot grow"),
        }
    }
}
