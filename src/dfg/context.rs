//! The storage shared by all graphs of one scope.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use super::edge::EdgeSlot;
use super::graph::GraphData;
use super::vertex::{Payload, VertexData};
use super::{DType, Edge, Graph, SourceType, Vertex};
use crate::core::storage::{Arena, GenericArena};
use crate::core::utils::Idx;
use crate::Result;

/// A variable of the parent scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(u32);

impl Idx for VarId {
    fn index(self) -> usize { self.0 as usize }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "var{}", self.0) }
}

struct VarInfo {
    name: String,
    dtype: DType,
}

/// The arena vertices are allocated in.
#[derive(Default)]
pub struct VertexArena(GenericArena<VertexData>);

impl Arena<Vertex> for VertexArena {
    fn alloc_with<F>(&mut self, f: F) -> Vertex
    where
        F: FnOnce(Vertex) -> VertexData,
    {
        Vertex(self.0.alloc_with(|ptr| f(Vertex(ptr))))
    }

    fn try_dealloc(&mut self, ptr: Vertex) -> Option<VertexData> { self.0.try_dealloc(ptr.0) }

    fn try_deref(&self, ptr: Vertex) -> Option<&VertexData> { self.0.try_deref(ptr.0) }

    fn try_deref_mut(&mut self, ptr: Vertex) -> Option<&mut VertexData> {
        self.0.try_deref_mut(ptr.0)
    }
}

/// The owner of all graphs, vertices and variables of one parent scope.
///
/// [`Graph`], [`Vertex`] and [`Edge`] are plain handles into a context, which
/// is why vertices can move between graphs of the same context without
/// touching any edge. A context is the unit of mutation: it is `Send`, and
/// independent contexts can be processed on different threads, but one
/// context has no internal synchronization.
pub struct Context {
    scope: String,
    pub(super) vertices: VertexArena,
    pub(super) graphs: GenericArena<GraphData>,
    vars: Vec<VarInfo>,
}

impl Context {
    /// Create an empty context for the named parent scope.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            vertices: VertexArena::default(),
            graphs: GenericArena::default(),
            vars: Vec::new(),
        }
    }

    /// The name of the parent scope.
    pub fn scope(&self) -> &str { &self.scope }

    /// Declare a variable of the scope.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedType`](crate::Error::UnsupportedType) if the type
    /// cannot be represented in a graph.
    pub fn declare_var(&mut self, name: impl Into<String>, ty: &SourceType) -> Result<VarId> {
        let dtype = DType::from_source(ty)?;
        let id = VarId(self.vars.len() as u32);
        self.vars.push(VarInfo {
            name: name.into(),
            dtype,
        });
        Ok(id)
    }

    fn var(&self, var: VarId) -> &VarInfo {
        self.vars
            .get(var.index())
            .unwrap_or_else(|| panic!("{} is not declared in scope {}", var, self.scope))
    }

    /// The name of a variable.
    pub fn var_name(&self, var: VarId) -> &str { &self.var(var).name }

    /// The type of a variable.
    pub fn var_dtype(&self, var: VarId) -> DType { self.var(var).dtype }

    /// Number of live vertices over all graphs.
    pub fn num_vertices(&self) -> usize { self.vertices.0.len() }

    /// Iterate over the live graphs.
    pub fn graphs(&self) -> impl Iterator<Item = Graph> + '_ { self.graphs.ptrs().map(Graph) }

    pub(super) fn vertex(&self, vertex: Vertex) -> &VertexData {
        self.vertices
            .try_deref(vertex)
            .unwrap_or_else(|| panic!("stale vertex handle {:?}", vertex))
    }

    pub(super) fn vertex_mut(&mut self, vertex: Vertex) -> &mut VertexData {
        self.vertices
            .try_deref_mut(vertex)
            .unwrap_or_else(|| panic!("stale vertex handle {:?}", vertex))
    }

    /// Check if the handle refers to a live vertex.
    pub fn contains_vertex(&self, vertex: Vertex) -> bool {
        self.vertices.try_deref(vertex).is_some()
    }

    pub(super) fn graph_data(&self, graph: Graph) -> &GraphData {
        self.graphs
            .try_deref(graph.0)
            .unwrap_or_else(|| panic!("stale graph handle {:?}", graph))
    }

    pub(super) fn graph_data_mut(&mut self, graph: Graph) -> &mut GraphData {
        self.graphs
            .try_deref_mut(graph.0)
            .unwrap_or_else(|| panic!("stale graph handle {:?}", graph))
    }

    pub(super) fn slot(&self, edge: Edge) -> &EdgeSlot {
        let sink = self.vertex(edge.sink());
        sink.sources
            .as_slice()
            .get(edge.index())
            .unwrap_or_else(|| panic!("edge {:?} out of range", edge))
    }

    pub(super) fn slot_mut(&mut self, edge: Edge) -> &mut EdgeSlot {
        let sink = self.vertex_mut(edge.sink());
        sink.sources
            .as_mut_slice()
            .get_mut(edge.index())
            .unwrap_or_else(|| panic!("edge {:?} out of range", edge))
    }

    /// Remove the edge from the sink list of its source.
    pub(super) fn unlink_edge(&mut self, edge: Edge) {
        let slot = self.slot_mut(edge);
        let Some(source) = slot.source.take() else {
            return;
        };
        let pos = slot.sink_pos as usize;
        let sinks = &mut self.vertex_mut(source).sinks;
        let removed = sinks.swap_remove(pos);
        debug_assert_eq!(removed, edge, "corrupted sink list");
        if let Some(&moved) = sinks.get(pos) {
            self.slot_mut(moved).sink_pos = pos as u32;
        }
    }

    /// Attach a detached edge to the sink list of `source`.
    pub(super) fn link_edge(&mut self, edge: Edge, source: Vertex) {
        let sinks = &mut self.vertex_mut(source).sinks;
        let pos = sinks.len() as u32;
        sinks.push(edge);
        let slot = self.slot_mut(edge);
        debug_assert!(slot.source.is_none(), "edge is already linked");
        slot.source = Some(source);
        slot.sink_pos = pos;
    }

    pub(super) fn relink_edge(&mut self, edge: Edge, source: Vertex) {
        self.unlink_edge(edge);
        self.link_edge(edge, source);
    }

    /// Free a vertex that has no sinks, unlinking its operands and removing
    /// it from its graph.
    pub(super) fn free_vertex(&mut self, vertex: Vertex) {
        assert!(
            self.vertex(vertex).sinks.is_empty(),
            "deleting {:?} which still has {} sinks",
            vertex,
            self.vertex(vertex).sinks.len()
        );
        if let Some(graph) = self.vertex(vertex).graph {
            graph.remove_vertex(self, vertex);
        }
        for index in 0..self.vertex(vertex).sources.len() {
            self.unlink_edge(Edge::new(vertex, index));
        }
        self.vertices.try_dealloc(vertex);
    }

    /// Drop the unlinked driver slots of a variable vertex, keeping the
    /// offsets in step and renumbering the remaining edges.
    pub(super) fn compact_var_drivers(&mut self, vertex: Vertex) {
        let data = self.vertex_mut(vertex);
        let offsets = match &mut data.payload {
            Payload::Var(var) => &mut var.driver_offsets,
            _ => panic!("{:?} is not a variable", vertex),
        };
        let slots = data.sources.as_mut_vec();
        let mut kept = 0;
        for index in 0..slots.len() {
            if slots[index].source.is_some() {
                slots.swap(kept, index);
                offsets.swap(kept, index);
                kept += 1;
            }
        }
        slots.truncate(kept);
        offsets.truncate(kept);

        // the sink lists still refer to the old indices
        for index in 0..kept {
            let slot = self.vertex(vertex).sources.as_slice()[index];
            if let Some(source) = slot.source {
                self.vertex_mut(source).sinks[slot.sink_pos as usize] = Edge::new(vertex, index);
            }
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("scope", &self.scope)
            .field("graphs", &self.graphs.len())
            .field("vertices", &self.num_vertices())
            .field("vars", &self.vars.len())
            .finish()
    }
}
