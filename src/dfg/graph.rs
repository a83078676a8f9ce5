//! Graphs.
//!
//! A graph is a set of vertices of one [`Context`], kept in three buckets
//! (variables, constants, operators) so that passes looking at one kind of
//! vertex do not have to skip over the others. The buckets have no other
//! meaning.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use super::view::GraphView;
use super::vertex::{Const, Payload, Var, VertexData};
use super::{Bits, Context, DType, Loc, VarId, Vertex, VertexType};
use crate::core::graph::adapters::Reverse;
use crate::core::graph::traversal;
use crate::core::linked_list::LinkedList;
use crate::core::storage::{Arena, GenericPtr};
use crate::core::utils::Idx;
use crate::Result;

/// The data of a graph, stored in the [`Context`].
pub struct GraphData {
    name: String,
    vars: LinkedList<Vertex>,
    consts: LinkedList<Vertex>,
    ops: LinkedList<Vertex>,
    /// The last user data epoch handed out.
    pub(super) user_count: u32,
    /// The epoch in use, zero if none.
    pub(super) user_current: u32,
}

impl GraphData {
    fn buckets(&self) -> [&LinkedList<Vertex>; 3] { [&self.vars, &self.consts, &self.ops] }

    fn bucket_mut(&mut self, ty: VertexType) -> &mut LinkedList<Vertex> {
        if ty.is_var() {
            &mut self.vars
        } else if ty.is_const() {
            &mut self.consts
        } else {
            &mut self.ops
        }
    }
}

/// A handle to a graph in a [`Context`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Graph(pub(super) GenericPtr<GraphData>);

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "g{}", self.0.index()) }
}

impl Graph {
    /// Create an empty graph.
    pub fn new(ctx: &mut Context, name: impl Into<String>) -> Self {
        Graph(ctx.graphs.alloc(GraphData {
            name: name.into(),
            vars: LinkedList::default(),
            consts: LinkedList::default(),
            ops: LinkedList::default(),
            user_count: 0,
            user_current: 0,
        }))
    }

    /// The debug name of the graph.
    pub fn name(self, ctx: &Context) -> &str { &ctx.graph_data(self).name }

    /// The name of the parent scope.
    pub fn scope(self, ctx: &Context) -> &str { ctx.scope() }

    /// Number of vertices.
    pub fn size(self, ctx: &Context) -> usize {
        let data = ctx.graph_data(self);
        data.vars.len() + data.consts.len() + data.ops.len()
    }

    /// Check if the graph has no vertices.
    pub fn is_empty(self, ctx: &Context) -> bool { self.size(ctx) == 0 }

    /// Iterate over the vertices: variables, then constants, then operators.
    pub fn vertices(self, ctx: &Context) -> impl Iterator<Item = Vertex> + '_ {
        let data = ctx.graph_data(self);
        let arena = &ctx.vertices;
        data.vars
            .iter(arena)
            .chain(data.consts.iter(arena))
            .chain(data.ops.iter(arena))
    }

    /// Iterate over the variable vertices.
    pub fn var_vertices(self, ctx: &Context) -> impl Iterator<Item = Vertex> + '_ {
        ctx.graph_data(self).vars.iter(&ctx.vertices)
    }

    /// Iterate over the constant vertices.
    pub fn const_vertices(self, ctx: &Context) -> impl Iterator<Item = Vertex> + '_ {
        ctx.graph_data(self).consts.iter(&ctx.vertices)
    }

    /// Iterate over the operator vertices.
    pub fn op_vertices(self, ctx: &Context) -> impl Iterator<Item = Vertex> + '_ {
        ctx.graph_data(self).ops.iter(&ctx.vertices)
    }

    /// Call `f` with every vertex, in the order of [`Graph::vertices`].
    ///
    /// `f` may delete the vertex it is given, but must not add or remove any
    /// other vertex of the graph.
    pub fn for_each_vertex(self, ctx: &mut Context, mut f: impl FnMut(&mut Context, Vertex)) {
        for bucket in 0..3 {
            let mut cursor = ctx.graph_data(self).buckets()[bucket].front();
            while let Some(vertex) = cursor {
                cursor = LinkedList::next(&ctx.vertices, vertex);
                f(ctx, vertex);
            }
        }
    }

    /// Like [`Graph::for_each_vertex`], but backwards: operators from last
    /// to first, then constants, then variables.
    pub fn for_each_vertex_in_reverse(
        self,
        ctx: &mut Context,
        mut f: impl FnMut(&mut Context, Vertex),
    ) {
        for bucket in (0..3).rev() {
            let mut cursor = ctx.graph_data(self).buckets()[bucket].back();
            while let Some(vertex) = cursor {
                cursor = LinkedList::prev(&ctx.vertices, vertex);
                f(ctx, vertex);
            }
        }
    }

    /// Find the first vertex satisfying `pred`.
    pub fn find_vertex(
        self,
        ctx: &Context,
        mut pred: impl FnMut(&Context, Vertex) -> bool,
    ) -> Option<Vertex> {
        self.vertices(ctx).find(|vertex| pred(ctx, *vertex))
    }

    /// Apply `f` to every vertex until a whole pass reports no change.
    ///
    /// Passes alternate between forward and reverse order, `f` returns
    /// whether it changed anything.
    pub fn run_to_fixed_point(
        self,
        ctx: &mut Context,
        mut f: impl FnMut(&mut Context, Vertex) -> bool,
    ) {
        let mut forward = true;
        loop {
            let mut changed = false;
            let mut apply = |ctx: &mut Context, vertex| changed |= f(ctx, vertex);
            if forward {
                self.for_each_vertex(ctx, &mut apply);
            } else {
                self.for_each_vertex_in_reverse(ctx, &mut apply);
            }
            if !changed {
                break;
            }
            forward = !forward;
        }
    }

    /// Insert a detached vertex into the graph.
    pub(super) fn add_vertex(self, ctx: &mut Context, vertex: Vertex) {
        let data = ctx.vertices.try_deref_mut(vertex);
        let data = data.unwrap_or_else(|| panic!("stale vertex handle {:?}", vertex));
        debug_assert!(data.graph.is_none(), "{:?} is already in a graph", vertex);
        data.graph = Some(self);
        data.user_stamp = 0;
        let ty = data.ty;
        let graph = ctx
            .graphs
            .try_deref_mut(self.0)
            .unwrap_or_else(|| panic!("stale graph handle {:?}", self));
        graph.bucket_mut(ty).push_back(&mut ctx.vertices, vertex);
    }

    /// Remove a vertex from the graph, leaving it detached.
    pub(super) fn remove_vertex(self, ctx: &mut Context, vertex: Vertex) {
        let data = ctx.vertex_mut(vertex);
        assert_eq!(data.graph, Some(self), "{:?} is not in {:?}", vertex, self);
        data.graph = None;
        data.user_stamp = 0;
        let ty = data.ty;
        let graph = ctx
            .graphs
            .try_deref_mut(self.0)
            .unwrap_or_else(|| panic!("stale graph handle {:?}", self));
        graph.bucket_mut(ty).unlink(&mut ctx.vertices, vertex);
    }

    /// Move a vertex of another graph into this one.
    pub(super) fn move_vertex(self, ctx: &mut Context, vertex: Vertex) {
        if let Some(from) = ctx.vertex(vertex).graph {
            from.remove_vertex(ctx, vertex);
        }
        self.add_vertex(ctx, vertex);
    }

    fn alloc_vertex(
        self,
        ctx: &mut Context,
        ty: VertexType,
        payload: Payload,
        dtype: DType,
        loc: Loc,
    ) -> Vertex {
        let vertex = ctx.vertices.alloc(VertexData::new(ty, payload, dtype, loc));
        self.add_vertex(ctx, vertex);
        vertex
    }

    /// Create a constant vertex.
    pub fn add_const(self, ctx: &mut Context, loc: Loc, value: Bits) -> Vertex {
        let dtype = DType::packed(value.width());
        self.alloc_vertex(ctx, VertexType::Const, Payload::Const(Const { value }), dtype, loc)
    }

    /// Create a variable vertex without drivers.
    ///
    /// The kind is [`VertexType::VarArray`] for unpacked arrays and
    /// [`VertexType::VarPacked`] otherwise.
    pub fn add_var(self, ctx: &mut Context, loc: Loc, var: VarId) -> Vertex {
        let dtype = ctx.var_dtype(var);
        let ty = match dtype {
            DType::Packed { .. } => VertexType::VarPacked,
            DType::Array { .. } => VertexType::VarArray,
        };
        let payload = Payload::Var(Var {
            var,
            driver_offsets: Vec::new(),
            has_mod_refs: false,
        });
        self.alloc_vertex(ctx, ty, payload, dtype, loc)
    }

    /// Create an operator vertex with unconnected operands.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedType`](crate::Error::UnsupportedType) if `dtype`
    /// has no bits, see [`DType::check`].
    ///
    /// # Panics
    ///
    /// Panics if `ty` is not an operator.
    pub fn add_op(
        self,
        ctx: &mut Context,
        ty: VertexType,
        loc: Loc,
        dtype: DType,
    ) -> Result<Vertex> {
        assert!(ty.is_operator(), "{} is not an operator", ty.name());
        let dtype = dtype.check()?;
        Ok(self.alloc_vertex(ctx, ty, Payload::None, dtype, loc))
    }

    /// Create an operator vertex and connect all of its operands.
    ///
    /// # Errors
    ///
    /// Same as [`Graph::add_op`], nothing is created then.
    ///
    /// # Panics
    ///
    /// Panics if `ty` is not an operator or the number of sources does not
    /// match its arity.
    pub fn add_op_with(
        self,
        ctx: &mut Context,
        ty: VertexType,
        loc: Loc,
        dtype: DType,
        sources: &[Vertex],
    ) -> Result<Vertex> {
        let vertex = self.add_op(ctx, ty, loc, dtype)?;
        assert_eq!(
            vertex.arity(ctx),
            sources.len(),
            "wrong number of operands for {}",
            ty.name()
        );
        for (index, source) in sources.iter().enumerate() {
            vertex.relink_source(ctx, index, *source);
        }
        Ok(vertex)
    }

    /// Move every vertex of `other` into this graph, leaving `other` empty.
    pub fn add_graph(self, ctx: &mut Context, other: Graph) {
        assert_ne!(self, other, "cannot add a graph to itself");
        let moved: Vec<Vertex> = other.vertices(ctx).collect();
        for vertex in &moved {
            let data = ctx.vertex_mut(*vertex);
            data.graph = Some(self);
            data.user_stamp = 0;
        }
        let from = ctx.graph_data_mut(other);
        let mut vars = core::mem::take(&mut from.vars);
        let mut consts = core::mem::take(&mut from.consts);
        let mut ops = core::mem::take(&mut from.ops);
        let into = ctx
            .graphs
            .try_deref_mut(self.0)
            .unwrap_or_else(|| panic!("stale graph handle {:?}", self));
        into.vars.append(&mut ctx.vertices, &mut vars);
        into.consts.append(&mut ctx.vertices, &mut consts);
        into.ops.append(&mut ctx.vertices, &mut ops);
    }

    /// Delete the graph together with all of its vertices.
    ///
    /// Edges from other graphs reading the deleted vertices are left
    /// unconnected.
    pub fn remove(self, ctx: &mut Context) {
        let vertices: Vec<Vertex> = self.vertices(ctx).collect();
        for vertex in &vertices {
            for edge in vertex.source_edges(ctx).collect::<Vec<_>>() {
                edge.unlink_source(ctx);
            }
        }
        for vertex in &vertices {
            while let Some(&edge) = vertex.sinks(ctx).last() {
                edge.unlink_source(ctx);
            }
            ctx.free_vertex(*vertex);
        }
        ctx.graphs.try_dealloc(self.0);
    }

    /// A view implementing the [`crate::core::graph`] traits.
    pub fn view(self, ctx: &Context) -> GraphView<'_> { GraphView::new(ctx, self) }

    /// Check if the graph has no combinational cycle.
    pub fn is_acyclic(self, ctx: &Context) -> bool { !traversal::is_cyclic(&self.view(ctx)) }

    /// Order the vertices so that every vertex comes after its operands, or
    /// before them if `reverse` is set.
    ///
    /// # Returns
    ///
    /// [`None`] if the graph has a cycle.
    pub fn topological_order(self, ctx: &Context, reverse: bool) -> Option<Vec<Vertex>> {
        let view = self.view(ctx);
        if reverse {
            traversal::topological_order(&Reverse::new(&view))
        } else {
            traversal::topological_order(&view)
        }
    }
}
