//! Vertices.

use alloc::borrow::Cow;
use alloc::vec::Vec;
use core::fmt;

use super::context::VertexArena;
use super::edge::Sources;
use super::types::VertexClass;
use super::{Bits, Context, DType, Edge, Graph, VarId, VertexType};
use crate::core::linked_list::{LinkedListNode, Links};
use crate::core::storage::{ArenaPtr, GenericPtr};
use crate::core::utils::Idx;
use crate::Result;

/// A source location, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Loc {
    /// Index of the source file.
    pub file: u32,
    /// Line number.
    pub line: u32,
}

impl Loc {
    /// Create a location.
    pub fn new(file: u32, line: u32) -> Self { Self { file, line } }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// The payload of a constant vertex.
#[derive(Debug)]
pub struct Const {
    pub(super) value: Bits,
}

impl Const {
    /// The value of the constant.
    pub fn value(&self) -> &Bits { &self.value }
}

/// The payload of a variable vertex.
#[derive(Debug)]
pub struct Var {
    pub(super) var: VarId,
    /// One offset per driver: the lsb for packed variables, the element
    /// index for arrays.
    pub(super) driver_offsets: Vec<u32>,
    pub(super) has_mod_refs: bool,
}

impl Var {
    /// The referenced variable.
    pub fn var(&self) -> VarId { self.var }

    /// The offsets of the drivers, in operand order.
    pub fn driver_offsets(&self) -> &[u32] { &self.driver_offsets }

    /// Whether the variable is also referenced outside of this graph.
    pub fn has_mod_refs(&self) -> bool { self.has_mod_refs }
}

pub(super) enum Payload {
    None,
    Const(Const),
    Var(Var),
}

/// A kind class that also carries a payload, see [`Vertex::cast`].
pub trait VertexPayload: VertexClass {
    /// Get the payload out of the vertex data.
    fn project(data: &VertexData) -> Option<&Self>;
}

impl VertexClass for Const {
    fn test(ty: VertexType) -> bool { ty.is_const() }
}

impl VertexPayload for Const {
    fn project(data: &VertexData) -> Option<&Self> {
        match &data.payload {
            Payload::Const(payload) => Some(payload),
            _ => None,
        }
    }
}

impl VertexClass for Var {
    fn test(ty: VertexType) -> bool { ty.is_var() }
}

impl VertexPayload for Var {
    fn project(data: &VertexData) -> Option<&Self> {
        match &data.payload {
            Payload::Var(payload) => Some(payload),
            _ => None,
        }
    }
}

/// The data of a vertex, stored in the [`Context`].
pub struct VertexData {
    pub(super) ty: VertexType,
    pub(super) payload: Payload,
    pub(super) dtype: DType,
    pub(super) loc: Loc,
    pub(super) sources: Sources,
    /// The edges reading this vertex.
    pub(super) sinks: Vec<Edge>,
    pub(super) graph: Option<Graph>,
    /// Links in the bucket of `graph`.
    pub(super) links: Links<Vertex>,
    /// The user data epoch this vertex was last stamped with, zero if none.
    pub(super) user_stamp: u32,
}

impl VertexData {
    pub(super) fn new(ty: VertexType, payload: Payload, dtype: DType, loc: Loc) -> Self {
        Self {
            ty,
            payload,
            dtype,
            loc,
            sources: Sources::new(ty.arity()),
            sinks: Vec::new(),
            graph: None,
            links: Links::default(),
            user_stamp: 0,
        }
    }
}

/// A handle to a vertex in a [`Context`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vertex(pub(super) GenericPtr<VertexData>);

impl ArenaPtr for Vertex {
    type Arena = VertexArena;
    type Data = VertexData;
}

impl LinkedListNode for Vertex {
    fn links(data: &VertexData) -> &Links<Self> { &data.links }

    fn links_mut(data: &mut VertexData) -> &mut Links<Self> { &mut data.links }
}

impl Idx for Vertex {
    fn index(self) -> usize { self.0.index() }
}

impl fmt::Debug for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "v{}", self.0.index()) }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "v{}", self.0.index()) }
}

impl Vertex {
    /// The kind of the vertex.
    pub fn ty(self, ctx: &Context) -> VertexType { ctx.vertex(self).ty }

    /// The name of the kind of the vertex.
    pub fn type_name(self, ctx: &Context) -> &'static str { self.ty(ctx).name() }

    /// The result type.
    pub fn dtype(self, ctx: &Context) -> DType { ctx.vertex(self).dtype }

    /// Change the result type.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedType`](crate::Error::UnsupportedType) if `dtype`
    /// has no bits, the vertex keeps its type then.
    pub fn set_dtype(self, ctx: &mut Context, dtype: DType) -> Result<()> {
        ctx.vertex_mut(self).dtype = dtype.check()?;
        Ok(())
    }

    /// The width of a packed result type.
    ///
    /// # Panics
    ///
    /// Panics if the result type is an array.
    pub fn width(self, ctx: &Context) -> u32 { self.dtype(ctx).width() }

    /// The source location the vertex was created for.
    pub fn loc(self, ctx: &Context) -> Loc { ctx.vertex(self).loc }

    /// The graph the vertex belongs to.
    pub fn graph(self, ctx: &Context) -> Option<Graph> { ctx.vertex(self).graph }

    /// Check if the vertex kind belongs to the class `T`.
    pub fn is<T: VertexClass>(self, ctx: &Context) -> bool { T::test(self.ty(ctx)) }

    /// Get the payload if the vertex belongs to the class `T`.
    pub fn cast<T: VertexPayload>(self, ctx: &Context) -> Option<&T> {
        T::project(ctx.vertex(self))
    }

    /// Get the payload of a vertex known to belong to the class `T`.
    ///
    /// # Panics
    ///
    /// Panics if the vertex does not belong to the class.
    pub fn as_<T: VertexPayload>(self, ctx: &Context) -> &T {
        T::project(ctx.vertex(self)).unwrap_or_else(|| {
            panic!(
                "{:?} of type {} cannot be cast to {}",
                self,
                self.type_name(ctx),
                core::any::type_name::<T>()
            )
        })
    }

    fn var_mut(self, ctx: &mut Context) -> &mut Var {
        match &mut ctx.vertex_mut(self).payload {
            Payload::Var(var) => var,
            _ => panic!("{:?} is not a variable", self),
        }
    }

    /// Number of operands.
    pub fn arity(self, ctx: &Context) -> usize { ctx.vertex(self).sources.len() }

    /// The vertex driving operand `index`.
    pub fn source(self, ctx: &Context, index: usize) -> Option<Vertex> {
        self.source_edge(ctx, index).source(ctx)
    }

    /// The edge of operand `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below the arity.
    pub fn source_edge(self, ctx: &Context, index: usize) -> Edge {
        let arity = self.arity(ctx);
        assert!(index < arity, "operand {} of {:?} with arity {}", index, self, arity);
        Edge::new(self, index)
    }

    /// Iterate over the operands, [`None`] for unconnected ones.
    pub fn sources(self, ctx: &Context) -> impl Iterator<Item = Option<Vertex>> + '_ {
        ctx.vertex(self)
            .sources
            .as_slice()
            .iter()
            .map(|slot| slot.source)
    }

    /// Iterate over the operand edges.
    pub fn source_edges(self, ctx: &Context) -> impl Iterator<Item = Edge> {
        (0..self.arity(ctx)).map(move |index| Edge::new(self, index))
    }

    /// Make `source` drive operand `index`.
    pub fn relink_source(self, ctx: &mut Context, index: usize, source: Vertex) {
        self.source_edge(ctx, index).relink_source(ctx, source)
    }

    /// Disconnect operand `index`.
    pub fn unlink_source(self, ctx: &mut Context, index: usize) {
        self.source_edge(ctx, index).unlink_source(ctx)
    }

    /// Call `f` with every connected operand.
    pub fn for_each_source(self, ctx: &Context, mut f: impl FnMut(Vertex)) {
        self.sources(ctx).flatten().for_each(&mut f)
    }

    /// Call `f` with every operand edge and its index.
    pub fn for_each_source_edge(self, ctx: &Context, mut f: impl FnMut(Edge, usize)) {
        for edge in self.source_edges(ctx) {
            f(edge, edge.index())
        }
    }

    /// The edges reading this vertex, in no particular order.
    pub fn sinks(self, ctx: &Context) -> &[Edge] { &ctx.vertex(self).sinks }

    /// Call `f` with the sink vertex of every edge reading this vertex.
    pub fn for_each_sink(self, ctx: &Context, mut f: impl FnMut(Vertex)) {
        for edge in self.sinks(ctx) {
            f(edge.sink())
        }
    }

    /// Call `f` with every edge reading this vertex.
    ///
    /// `f` may unlink or relink the edge it is given, or delete its sink, but
    /// must not touch the other sinks of this vertex.
    pub fn for_each_sink_edge(self, ctx: &mut Context, mut f: impl FnMut(&mut Context, Edge)) {
        let mut index = self.sinks(ctx).len();
        while index > 0 {
            index -= 1;
            // the current edge may have been swapped out by `f`
            let Some(&edge) = self.sinks(ctx).get(index) else {
                continue;
            };
            f(ctx, edge);
        }
    }

    /// Find a sink vertex satisfying `pred`.
    pub fn find_sink(self, ctx: &Context, mut pred: impl FnMut(Vertex) -> bool) -> Option<Vertex> {
        self.sinks(ctx)
            .iter()
            .map(|edge| edge.sink())
            .find(|sink| pred(*sink))
    }

    /// Find an operand edge satisfying `pred`, given the edge and its index.
    pub fn find_source_edge(
        self,
        ctx: &Context,
        mut pred: impl FnMut(Edge, usize) -> bool,
    ) -> Option<Edge> {
        self.source_edges(ctx).find(|edge| pred(*edge, edge.index()))
    }

    /// Check if anything reads this vertex.
    pub fn has_sinks(self, ctx: &Context) -> bool { !ctx.vertex(self).sinks.is_empty() }

    /// Check if at least two edges read this vertex.
    pub fn has_multiple_sinks(self, ctx: &Context) -> bool { ctx.vertex(self).sinks.len() >= 2 }

    /// Number of edges reading this vertex.
    pub fn fanout(self, ctx: &Context) -> usize { ctx.vertex(self).sinks.len() }

    /// Append a driver to a variable vertex.
    ///
    /// `offset` is the lsb of the driven slice for packed variables, or the
    /// element index for arrays.
    ///
    /// # Panics
    ///
    /// Panics if the vertex is not a variable, or `offset` is past its last
    /// bit or element.
    pub fn add_driver(self, ctx: &mut Context, offset: u32, source: Vertex) -> Edge {
        let dtype = self.dtype(ctx);
        let extent = match dtype {
            DType::Packed { width } => width,
            DType::Array { len, .. } => len,
        };
        assert!(offset < extent, "driver offset {} out of range for {}", offset, dtype);
        self.var_mut(ctx).driver_offsets.push(offset);
        let slots = ctx.vertex_mut(self).sources.as_mut_vec();
        let edge = Edge::new(self, slots.len());
        slots.push(Default::default());
        ctx.link_edge(edge, source);
        edge
    }

    /// Mark a variable as referenced outside of its graph.
    pub fn set_has_mod_refs(self, ctx: &mut Context) { self.var_mut(ctx).has_mod_refs = true; }

    /// Redirect every edge reading this vertex to read `other` instead.
    ///
    /// The operands of this vertex are left alone.
    pub fn replace_with(self, ctx: &mut Context, other: Vertex) {
        if self == other {
            return;
        }
        let moved = core::mem::take(&mut ctx.vertex_mut(self).sinks);
        let base = ctx.vertex(other).sinks.len();
        for (offset, edge) in moved.iter().enumerate() {
            let slot = ctx.slot_mut(*edge);
            slot.source = Some(other);
            slot.sink_pos = (base + offset) as u32;
        }
        ctx.vertex_mut(other).sinks.extend(moved);
    }

    /// Remove the vertex from its graph and free it.
    ///
    /// # Panics
    ///
    /// Panics if anything still reads the vertex.
    pub fn unlink_delete(self, ctx: &mut Context) { ctx.free_vertex(self) }

    /// Check if this is a constant with all bits zero.
    pub fn is_zero(self, ctx: &Context) -> bool {
        self.cast::<Const>(ctx)
            .is_some_and(|payload| payload.value.is_zero())
    }

    /// Check if this is a constant with all bits one.
    pub fn is_ones(self, ctx: &Context) -> bool {
        self.cast::<Const>(ctx)
            .is_some_and(|payload| payload.value.is_ones())
    }

    /// Check if the value should be emitted as an inline expression rather
    /// than through a temporary when lowering.
    pub fn inlined(self, ctx: &Context) -> bool {
        if !self.has_multiple_sinks(ctx) {
            return true;
        }
        match self.ty(ctx) {
            VertexType::Const | VertexType::VarPacked | VertexType::VarArray => true,
            VertexType::ArraySel => self
                .source(ctx, 1)
                .is_some_and(|bit| bit.ty(ctx).is_const()),
            _ => false,
        }
    }

    /// A human readable name of operand `index`.
    ///
    /// Variables name their drivers by the part they drive, `[msb:lsb]` for
    /// packed variables and `[index]` for arrays.
    pub fn src_name(self, ctx: &Context, index: usize) -> Cow<'static, str> {
        let data = ctx.vertex(self);
        match &data.payload {
            Payload::Var(var) => {
                let offset = var.driver_offsets[index];
                let Some(source) = data.sources.as_slice()[index].source else {
                    return Cow::Owned(format!("[{}]", offset));
                };
                match (data.dtype, source.dtype(ctx)) {
                    (DType::Packed { .. }, DType::Packed { width }) => {
                        let msb = (u64::from(offset) + u64::from(width)).saturating_sub(1);
                        Cow::Owned(format!("[{}:{}]", msb, offset))
                    }
                    _ => Cow::Owned(format!("[{}]", offset)),
                }
            }
            _ => Cow::Borrowed(data.ty.operand_names()[index]),
        }
    }
}
