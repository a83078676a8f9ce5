//! Strongly Connected Components
//!
//! An iterative rendition of Tarjan's algorithm, so deep graphs do not
//! exhaust the call stack.

use alloc::vec::Vec;

use crate::core::graph::{Graph, Nodes, Succs};
use crate::{HashMap, HashSet};

/// A frame of the explicit depth-first search stack.
struct Frame<N> {
    node: N,
    /// Successors are collected on entry, the graph is only borrowed while
    /// doing so.
    succs: Vec<N>,
    next: usize,
}

/// The state of Tarjan's algorithm.
///
/// The state can be kept across several [`Tarjan::run`] calls, nodes settled
/// by an earlier run are never reported again.
pub struct Tarjan<N> {
    index: HashMap<N, usize>,
    lowlink: HashMap<N, usize>,
    on_stack: HashSet<N>,
    stack: Vec<N>,
    frames: Vec<Frame<N>>,
}

impl<N> Default for Tarjan<N> {
    fn default() -> Self {
        Self {
            index: HashMap::default(),
            lowlink: HashMap::default(),
            on_stack: HashSet::default(),
            stack: Vec::new(),
            frames: Vec::new(),
        }
    }
}

impl<N> Tarjan<N>
where
    N: Copy + Eq + core::hash::Hash,
{
    /// Check if the node has been reached by a previous run.
    pub fn visited(&self, node: N) -> bool { self.index.contains_key(&node) }

    fn enter<G>(&mut self, graph: &G, node: N)
    where
        G: Graph<Node = N> + Succs,
    {
        let index = self.index.len();
        self.index.insert(node, index);
        self.lowlink.insert(node, index);
        self.on_stack.insert(node);
        self.stack.push(node);
        self.frames.push(Frame {
            node,
            succs: graph.succs(node).into_iter().collect(),
            next: 0,
        });
    }

    fn lower(&mut self, node: N, to: usize) {
        if let Some(lowlink) = self.lowlink.get_mut(&node) {
            *lowlink = (*lowlink).min(to);
        }
    }

    /// Run the algorithm from the given roots.
    ///
    /// The components are reported in reverse topological order of the
    /// condensation: a component comes after every component reachable from
    /// it. The members of a component are in discovery order.
    pub fn run<G>(&mut self, graph: &G, roots: impl IntoIterator<Item = N>) -> Vec<Vec<N>>
    where
        G: Graph<Node = N> + Succs,
    {
        let mut components = Vec::new();

        for root in roots {
            if self.visited(root) {
                continue;
            }
            self.enter(graph, root);

            while let Some(frame) = self.frames.last_mut() {
                let node = frame.node;
                if frame.next < frame.succs.len() {
                    let succ = frame.succs[frame.next];
                    frame.next += 1;
                    if !self.visited(succ) {
                        self.enter(graph, succ);
                    } else if self.on_stack.contains(&succ) {
                        let index = self.index[&succ];
                        self.lower(node, index);
                    }
                    continue;
                }

                self.frames.pop();
                let lowlink = self.lowlink[&node];
                if lowlink == self.index[&node] {
                    let mut component = Vec::new();
                    while let Some(member) = self.stack.pop() {
                        self.on_stack.remove(&member);
                        component.push(member);
                        if member == node {
                            break;
                        }
                    }
                    component.reverse();
                    components.push(component);
                }
                if let Some(parent) = self.frames.last() {
                    let parent = parent.node;
                    self.lower(parent, lowlink);
                }
            }
        }

        components
    }
}

/// Compute the strongly connected components of the whole graph.
///
/// See [`Tarjan::run`] for the order of the result.
pub fn strongly_connected_components<G>(graph: &G) -> Vec<Vec<G::Node>>
where
    G: Graph + Nodes + Succs,
{
    Tarjan::default().run(graph, graph.nodes())
}

/// Check if a component returned by [`Tarjan::run`] forms a cycle, i.e. it
/// has more than one member or its only member is its own successor.
pub fn is_cyclic_component<G>(graph: &G, component: &[G::Node]) -> bool
where
    G: Graph + Succs,
{
    match component {
        [] => false,
        [node] => graph.succs(*node).into_iter().any(|succ| succ == *node),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::test_graph::TestGraph;

    #[test]
    fn test_scc() {
        // 0 -> {1 <-> 2} -> 3, 4 self loop
        let graph = TestGraph::new(5, &[(0, 1), (1, 2), (2, 1), (2, 3), (4, 4)]);
        let components = strongly_connected_components(&graph);

        assert_eq!(components, vec![vec![3], vec![1, 2], vec![0], vec![4]]);
        assert!(!is_cyclic_component(&graph, &components[0]));
        assert!(is_cyclic_component(&graph, &components[1]));
        assert!(!is_cyclic_component(&graph, &components[2]));
        assert!(is_cyclic_component(&graph, &components[3]));
    }

    #[test]
    fn test_scc_incremental() {
        let graph = TestGraph::new(4, &[(0, 1), (1, 0), (2, 0), (3, 3)]);
        let mut tarjan = Tarjan::default();

        assert_eq!(tarjan.run(&graph, [0]), vec![vec![0, 1]]);
        // settled nodes are not reported twice
        assert_eq!(tarjan.run(&graph, [2, 1]), vec![vec![2]]);
        assert!(tarjan.visited(1));
        assert!(!tarjan.visited(3));
    }

    #[test]
    fn test_scc_long_chain() {
        let edges: Vec<_> = (0..10_000).map(|i| (i, i + 1)).collect();
        let graph = TestGraph::new(10_001, &edges);
        let components = strongly_connected_components(&graph);
        assert_eq!(components.len(), 10_001);
        assert_eq!(components[0], vec![10_000]);
    }
}
