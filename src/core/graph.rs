//! Graph Data Structure
//!
//! The traits here describe the shape of a graph without owning it, so the
//! algorithms in [`traversal`] and [`scc`] work on any view that can answer
//! the adjacency queries, including the data-flow graphs in
//! [`dfg`](crate::dfg).

use core::hash::Hash;

pub mod adapters;
pub mod scc;
pub mod traversal;

/// A graph.
pub trait Graph {
    /// The type of nodes in the graph.
    ///
    /// Nodes should just be a lightweight handle/key to the actual data.
    /// Typically, the node can be an [`Idx`](crate::core::utils::Idx) or an
    /// [`ArenaPtr`](crate::core::storage::ArenaPtr).
    type Node: Copy + Eq + Hash;

    /// Check if the graph is empty.
    fn is_empty(&self) -> bool;
}

/// A graph that can enumerate all of its nodes.
pub trait Nodes: Graph {
    /// Get an iterator over all nodes of the graph.
    ///
    /// The order must be deterministic for an unchanged graph.
    fn nodes(&self) -> impl IntoIterator<Item = Self::Node>;
}

/// A directed graph with predecessors (incoming edges).
pub trait Preds: Graph {
    /// Get an iterator over the predecessors of a node.
    fn preds(&self, node: Self::Node) -> impl IntoIterator<Item = Self::Node>;
}

/// A directed graph with successors (outgoing edges).
pub trait Succs: Graph {
    /// Get an iterator over the successors of a node.
    fn succs(&self, node: Self::Node) -> impl IntoIterator<Item = Self::Node>;
}

/// A graph that can iterate over all adjacent nodes, typically used for
/// undirected graphs.
pub trait Adjacent: Graph {
    /// Get an iterator over all adjacent nodes of a node.
    fn adjacent(&self, node: Self::Node) -> impl IntoIterator<Item = Self::Node>;
}

#[cfg(test)]
pub(crate) mod test_graph {
    use alloc::vec::Vec;

    use super::*;
    use crate::HashMap;

    /// A small adjacency-list graph over `usize` nodes for unit tests.
    pub struct TestGraph {
        nodes: Vec<usize>,
        succs: HashMap<usize, Vec<usize>>,
        preds: HashMap<usize, Vec<usize>>,
    }

    impl TestGraph {
        pub fn new(nodes: usize, edges: &[(usize, usize)]) -> Self {
            let mut succs: HashMap<usize, Vec<usize>> = HashMap::default();
            let mut preds: HashMap<usize, Vec<usize>> = HashMap::default();
            for &(from, to) in edges {
                succs.entry(from).or_default().push(to);
                preds.entry(to).or_default().push(from);
            }
            Self {
                nodes: (0..nodes).collect(),
                succs,
                preds,
            }
        }
    }

    impl Graph for TestGraph {
        type Node = usize;

        fn is_empty(&self) -> bool { self.nodes.is_empty() }
    }

    impl Nodes for TestGraph {
        fn nodes(&self) -> impl IntoIterator<Item = usize> { self.nodes.iter().copied() }
    }

    impl Succs for TestGraph {
        fn succs(&self, node: usize) -> impl IntoIterator<Item = usize> {
            self.succs
                .get(&node)
                .into_iter()
                .flat_map(|v| v.iter().copied())
        }
    }

    impl Preds for TestGraph {
        fn preds(&self, node: usize) -> impl IntoIterator<Item = usize> {
            self.preds
                .get(&node)
                .into_iter()
                .flat_map(|v| v.iter().copied())
        }
    }
}
