//! A read-only view of a graph for the generic algorithms in
//! [`crate::core::graph`].

use super::{Context, Graph, Vertex};
use crate::core::graph;

/// A graph together with its context.
///
/// Successors are the sinks of a vertex and predecessors are its operands,
/// so edges point in the direction data flows. Only vertices of the graph
/// itself are reported.
#[derive(Clone, Copy)]
pub struct GraphView<'a> {
    ctx: &'a Context,
    graph: Graph,
}

impl<'a> GraphView<'a> {
    /// Create a view.
    pub fn new(ctx: &'a Context, graph: Graph) -> Self { Self { ctx, graph } }

    fn contains(&self, vertex: Vertex) -> bool { vertex.graph(self.ctx) == Some(self.graph) }
}

impl graph::Graph for GraphView<'_> {
    type Node = Vertex;

    fn is_empty(&self) -> bool { self.graph.is_empty(self.ctx) }
}

impl graph::Nodes for GraphView<'_> {
    fn nodes(&self) -> impl IntoIterator<Item = Vertex> { self.graph.vertices(self.ctx) }
}

impl graph::Succs for GraphView<'_> {
    fn succs(&self, node: Vertex) -> impl IntoIterator<Item = Vertex> {
        node.sinks(self.ctx)
            .iter()
            .map(|edge| edge.sink())
            .filter(|sink| self.contains(*sink))
    }
}

impl graph::Preds for GraphView<'_> {
    fn preds(&self, node: Vertex) -> impl IntoIterator<Item = Vertex> {
        node.sources(self.ctx)
            .flatten()
            .filter(|source| self.contains(*source))
    }
}

impl graph::Adjacent for GraphView<'_> {
    fn adjacent(&self, node: Vertex) -> impl IntoIterator<Item = Vertex> {
        use graph::{Preds, Succs};

        self.preds(node).into_iter().chain(self.succs(node))
    }
}
