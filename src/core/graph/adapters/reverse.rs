//! Adapter to reverse graphs.

use crate::core::graph::{Adjacent, Graph, Nodes, Preds, Succs};

/// An adapter for the graph to reverse the edges.
///
/// Walking the successors of a reversed data-flow graph visits the operand
/// cone of a vertex instead of its consumers.
///
/// # Lifetimes
///
/// - `g`: The lifetime of the original graph.
///
/// # Type Parameters
///
/// - `G`: The original graph type.
pub struct Reverse<'g, G> {
    graph: &'g G,
}

impl<'g, G> Reverse<'g, G> {
    /// Create a new reverse adapter for the given graph.
    pub fn new(graph: &'g G) -> Self { Self { graph } }
}

impl<'g, G> Graph for Reverse<'g, G>
where
    G: Graph,
{
    type Node = G::Node;

    fn is_empty(&self) -> bool { self.graph.is_empty() }
}

impl<'g, G> Nodes for Reverse<'g, G>
where
    G: Nodes,
{
    fn nodes(&self) -> impl IntoIterator<Item = Self::Node> { self.graph.nodes() }
}

impl<'g, G> Preds for Reverse<'g, G>
where
    G: Succs,
{
    fn preds(&self, node: Self::Node) -> impl IntoIterator<Item = Self::Node> {
        self.graph.succs(node)
    }
}

impl<'g, G> Succs for Reverse<'g, G>
where
    G: Preds,
{
    fn succs(&self, node: Self::Node) -> impl IntoIterator<Item = Self::Node> {
        self.graph.preds(node)
    }
}

impl<'g, G> Adjacent for Reverse<'g, G>
where
    G: Adjacent,
{
    fn adjacent(&self, node: Self::Node) -> impl IntoIterator<Item = Self::Node> {
        self.graph.adjacent(node)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::core::graph::test_graph::TestGraph;
    use crate::core::graph::traversal::Dfs;

    #[test]
    fn test_reverse() {
        let graph = TestGraph::new(4, &[(0, 1), (1, 2), (3, 2)]);
        let reverse = Reverse::new(&graph);

        let mut dfs = Dfs::default();
        let mut reached: Vec<_> = dfs.preorder_iter_from(&reverse, [2]).collect();
        reached.sort_unstable();
        assert_eq!(reached, vec![0, 1, 2, 3]);

        let preds: Vec<_> = reverse.preds(1).into_iter().collect();
        assert_eq!(preds, vec![2]);
    }
}
