//! Utilities for Graph Traversal

use alloc::vec::Vec;

use crate::core::graph::{Graph, Nodes, Succs};
use crate::HashSet;

/// An event in a graph traversal.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub enum DfsEvent {
    /// Entering a node.
    Enter,
    /// Leaving a node.
    Leave,
}

/// A depth-first search state.
///
/// # Type Parameters
///
/// - `N`: The type of nodes in the graph.
pub struct Dfs<N> {
    /// The stack of depth-first search events.
    stack: Vec<(DfsEvent, N)>,
    /// The set of visited nodes.
    visited: HashSet<N>,
}

impl<N> Default for Dfs<N> {
    fn default() -> Self {
        Self {
            stack: Vec::new(),
            visited: HashSet::default(),
        }
    }
}

impl<N> Dfs<N> {
    /// Clear the state.
    pub fn clear(&mut self) {
        self.stack.clear();
        self.visited.clear();
    }

    /// Start a depth-first search from every node of the graph.
    ///
    /// Roots are taken in the order of [`Nodes::nodes`], each root only
    /// starts a new tree if it was not reached before. For dedicated
    /// pre-order or post-order traversing, check
    /// [`preorder_iter`](Self::preorder_iter) and
    /// [`postorder_iter`](Self::postorder_iter).
    ///
    /// # Returns
    ///
    /// A [`DfsIter`] that yields events, visiting information and nodes.
    pub fn iter<'a, G>(&'a mut self, graph: &'a G) -> DfsIter<'a, G>
    where
        G: Graph<Node = N> + Nodes + Succs,
    {
        let mut roots: Vec<N> = graph.nodes().into_iter().collect();
        // the stack pops from the back
        roots.reverse();
        self.iter_from(graph, roots)
    }

    /// Start a depth-first search on the whole graph and yield nodes in a
    /// pre-order.
    pub fn preorder_iter<'a, G>(&'a mut self, graph: &'a G) -> DfsPreorderIter<'a, G>
    where
        G: Graph<Node = N> + Nodes + Succs,
    {
        DfsPreorderIter(self.iter(graph))
    }

    /// Start a depth-first search on the whole graph and yield nodes in a
    /// post-order.
    pub fn postorder_iter<'a, G>(&'a mut self, graph: &'a G) -> DfsPostorderIter<'a, G>
    where
        G: Graph<Node = N> + Nodes + Succs,
    {
        DfsPostorderIter(self.iter(graph))
    }

    /// Start a depth-first search from certain nodes on the graph.
    ///
    /// The nodes are pushed onto the stack in the given order, so the last
    /// one is explored first.
    ///
    /// # Returns
    ///
    /// A [`DfsIter`] that yields events, with given nodes as the starting
    /// points.
    pub fn iter_from<'a, G>(
        &'a mut self,
        graph: &'a G,
        nodes: impl IntoIterator<Item = N>,
    ) -> DfsIter<'a, G>
    where
        G: Graph<Node = N> + Succs,
    {
        self.clear();
        self.stack
            .extend(nodes.into_iter().map(|node| (DfsEvent::Enter, node)));
        DfsIter { graph, state: self }
    }

    /// Start a depth-first search from certain nodes on the graph and yield
    /// nodes in a pre-order.
    pub fn preorder_iter_from<'a, G>(
        &'a mut self,
        graph: &'a G,
        nodes: impl IntoIterator<Item = N>,
    ) -> DfsPreorderIter<'a, G>
    where
        G: Graph<Node = N> + Succs,
    {
        DfsPreorderIter(self.iter_from(graph, nodes))
    }

    /// Start a depth-first search from certain nodes on the graph and yield
    /// nodes in a post-order.
    pub fn postorder_iter_from<'a, G>(
        &'a mut self,
        graph: &'a G,
        nodes: impl IntoIterator<Item = N>,
    ) -> DfsPostorderIter<'a, G>
    where
        G: Graph<Node = N> + Succs,
    {
        DfsPostorderIter(self.iter_from(graph, nodes))
    }
}

/// An iterator for depth-first search.
///
/// The item yielded by the iterator is a tuple of `(event, node, first_visit)`.
/// The `event` is the event of the depth-first search, `node` is the node being
/// visited, and `first_visit` indicates whether the node is visited for the
/// first time.
///
/// - `Enter` & `true`: The node is visited for the first time.
/// - `Enter` & `false`: The node is visited before but entered again.
/// - `Leave` & `false`: All the children of the node are visited.
pub struct DfsIter<'a, G: Graph> {
    /// The graph being traversed.
    graph: &'a G,
    /// The depth-first search state.
    state: &'a mut Dfs<G::Node>,
}

impl<'a, G> Iterator for DfsIter<'a, G>
where
    G: Graph + Succs,
{
    type Item = (DfsEvent, G::Node, bool);

    fn next(&mut self) -> Option<Self::Item> {
        let (event, node) = self.state.stack.pop()?;

        match event {
            DfsEvent::Enter => {
                if self.state.visited.insert(node) {
                    // tree edge
                    self.state.stack.push((DfsEvent::Leave, node));
                    self.state.stack.extend(
                        self.graph
                            .succs(node)
                            .into_iter()
                            .map(|succ| (DfsEvent::Enter, succ)),
                    );
                    Some((DfsEvent::Enter, node, true))
                } else {
                    // Forward, cross or back-edge. Blackened nodes are not
                    // recorded here, see `is_cyclic` for telling them apart.
                    Some((DfsEvent::Enter, node, false))
                }
            }
            // `Leave` event cannot be the second time we visit a node.
            DfsEvent::Leave => Some((DfsEvent::Leave, node, false)),
        }
    }
}

/// Detect if the graph is cyclic.
///
/// This is based on the depth-first search techniques described in
/// *Introduction to Algorithms*, which utilizes the white-grey-black coloring
/// scheme. If we enter a node that is already visited but not settled
/// (blackened), then we have detected a back-edge, which indicates a cycle in
/// the graph. Every node is a root, so cycles unreachable from any particular
/// node are found as well.
pub fn is_cyclic<G>(graph: &G) -> bool
where
    G: Graph + Nodes + Succs,
{
    let mut settled: HashSet<_> = HashSet::default();
    let mut dfs = Dfs::default();
    for (event, node, first_visit) in dfs.iter(graph) {
        match event {
            DfsEvent::Enter if !first_visit && !settled.contains(&node) => {
                // grey node, back-edge
                return true;
            }
            DfsEvent::Enter => {}
            DfsEvent::Leave => {
                settled.insert(node);
            }
        }
    }
    false
}

/// Order the nodes so that every node comes after all of its predecessors.
///
/// Ties are broken by [`Nodes::nodes`] order, the result is deterministic.
///
/// # Returns
///
/// [`None`] if the graph is cyclic.
pub fn topological_order<G>(graph: &G) -> Option<Vec<G::Node>>
where
    G: Graph + Nodes + Succs,
{
    let mut settled: HashSet<_> = HashSet::default();
    let mut postorder = Vec::new();
    let mut dfs = Dfs::default();
    for (event, node, first_visit) in dfs.iter(graph) {
        match event {
            DfsEvent::Enter if !first_visit && !settled.contains(&node) => return None,
            DfsEvent::Enter => {}
            DfsEvent::Leave => {
                settled.insert(node);
                postorder.push(node);
            }
        }
    }
    postorder.reverse();
    Some(postorder)
}

/// A depth-first search iterator that yields nodes in a pre-order.
pub struct DfsPreorderIter<'a, G: Graph>(DfsIter<'a, G>);

impl<'a, G> Iterator for DfsPreorderIter<'a, G>
where
    G: Graph + Succs,
{
    type Item = G::Node;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.0.next()? {
                (DfsEvent::Enter, node, true) => return Some(node),
                _ => continue,
            }
        }
    }
}

/// A depth-first search iterator that yields nodes in a post-order.
pub struct DfsPostorderIter<'a, G: Graph>(DfsIter<'a, G>);

impl<'a, G> Iterator for DfsPostorderIter<'a, G>
where
    G: Graph + Succs,
{
    type Item = G::Node;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.0.next()? {
                (DfsEvent::Leave, node, _) => return Some(node),
                _ => continue,
            }
        }
    }
}
