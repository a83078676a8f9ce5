//! Per-vertex scratch data.
//!
//! Algorithms often need to attach a value to every vertex they touch. The
//! values live in a side table owned by the algorithm, [`UserData`], and each
//! vertex carries a stamp telling which epoch last wrote it. Epochs are
//! handed out per graph by [`Context::user_data_in_use`], one at a time, so a
//! stale value from an earlier pass is never mistaken for a current one.

use core::fmt;

use super::{Context, Graph, Vertex};
use crate::core::storage::Arena;
use crate::HashMap;

/// Scratch data of one epoch of a graph.
pub struct UserData<T> {
    graph: Graph,
    epoch: u32,
    slots: HashMap<Vertex, T>,
}

impl<T> UserData<T> {
    /// The graph the data belongs to.
    pub fn graph(&self) -> Graph { self.graph }

    /// The epoch of the data, never zero.
    pub fn epoch(&self) -> u32 { self.epoch }

    /// Check if the vertex has been written in this epoch.
    pub fn is_current(&self, ctx: &Context, vertex: Vertex) -> bool {
        let data = ctx.vertex(vertex);
        data.graph == Some(self.graph) && data.user_stamp == self.epoch
    }

    /// Get the value of a vertex written in this epoch, if any.
    pub fn try_get(&self, ctx: &Context, vertex: Vertex) -> Option<&T> {
        if self.is_current(ctx, vertex) {
            self.slots.get(&vertex)
        } else {
            None
        }
    }

    /// Get the value of a vertex that must have been written in this epoch.
    ///
    /// # Panics
    ///
    /// Panics if the vertex has not been written in this epoch.
    pub fn get(&self, ctx: &Context, vertex: Vertex) -> &T {
        self.try_get(ctx, vertex)
            .unwrap_or_else(|| panic!("user data of {:?} is not current", vertex))
    }

    /// Mutable version of [`UserData::get`].
    pub fn get_mut(&mut self, ctx: &Context, vertex: Vertex) -> &mut T {
        let current = self.is_current(ctx, vertex);
        match self.slots.get_mut(&vertex) {
            Some(value) if current => value,
            _ => panic!("user data of {:?} is not current", vertex),
        }
    }

    /// Write the value of a vertex and stamp it with this epoch.
    ///
    /// # Panics
    ///
    /// Panics if the vertex is not in the graph of this data.
    pub fn set(&mut self, ctx: &mut Context, vertex: Vertex, value: T) {
        let data = ctx.vertex_mut(vertex);
        assert_eq!(
            data.graph,
            Some(self.graph),
            "{:?} is not in the graph of the user data",
            vertex
        );
        data.user_stamp = self.epoch;
        self.slots.insert(vertex, value);
    }

    /// Get the value of a vertex, resetting it to the default first if it was
    /// not written in this epoch.
    pub fn get_or_default(&mut self, ctx: &mut Context, vertex: Vertex) -> &mut T
    where
        T: Default,
    {
        if !self.is_current(ctx, vertex) {
            self.set(ctx, vertex, T::default());
        }
        self.get_mut(ctx, vertex)
    }
}

impl<T: fmt::Debug> fmt::Debug for UserData<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserData")
            .field("graph", &self.graph)
            .field("epoch", &self.epoch)
            .field("slots", &self.slots)
            .finish()
    }
}

/// Ends the epoch in use of a graph when dropped.
struct EpochGuard<'a> {
    ctx: &'a mut Context,
    graph: Graph,
}

impl Drop for EpochGuard<'_> {
    fn drop(&mut self) {
        // `f` may have removed the graph
        if let Some(data) = self.ctx.graphs.try_deref_mut(self.graph.0) {
            data.user_current = 0;
            log::trace!("user data epoch of {:?} released", self.graph);
        }
    }
}

impl Context {
    /// Run `f` with a fresh epoch of scratch data for `graph`.
    ///
    /// All values written in earlier epochs read as not current. The epoch
    /// ends when `f` returns, and also when it panics, so a caught panic
    /// does not leave the graph locked.
    ///
    /// # Panics
    ///
    /// Panics if an epoch of the graph is already in use, or if the graph
    /// ran out of epochs. A panic of `f` is propagated after the epoch is
    /// released.
    pub fn user_data_in_use<T, R>(
        &mut self,
        graph: Graph,
        f: impl FnOnce(&mut Context, &mut UserData<T>) -> R,
    ) -> R {
        let data = self.graph_data_mut(graph);
        assert_eq!(data.user_current, 0, "user data of {:?} is already in use", graph);
        let epoch = match data.user_count.checked_add(1) {
            Some(epoch) => epoch,
            None => panic!("user data epochs of {:?} exhausted", graph),
        };
        data.user_count = epoch;
        data.user_current = epoch;
        log::trace!("user data epoch {} of {:?} acquired", epoch, graph);

        let mut user = UserData {
            graph,
            epoch,
            slots: HashMap::default(),
        };
        let mut guard = EpochGuard { ctx: self, graph };
        f(&mut *guard.ctx, &mut user)
    }

    /// Check if an epoch of scratch data is in use for the graph.
    pub fn user_data_active(&self, graph: Graph) -> bool {
        self.graph_data(graph).user_current != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfg::{Bits, DType, Loc, VertexType};

    #[test]
    fn test_epochs() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let c = g.add_const(&mut ctx, Loc::default(), Bits::zero(1));
        let n = g
            .add_op_with(&mut ctx, VertexType::Not, Loc::default(), DType::packed(1), &[c])
            .unwrap();

        let first = ctx.user_data_in_use(g, |ctx, user: &mut UserData<u32>| {
            assert!(ctx.user_data_active(g));
            assert_eq!(user.try_get(ctx, c), None);
            user.set(ctx, c, 1);
            *user.get_or_default(ctx, n) += 5;
            *user.get_or_default(ctx, n) += 5;
            assert_eq!(*user.get(ctx, c), 1);
            assert_eq!(*user.get(ctx, n), 10);
            user.epoch()
        });
        assert!(!ctx.user_data_active(g));

        ctx.user_data_in_use(g, |ctx, user: &mut UserData<u32>| {
            assert!(user.epoch() > first);
            assert!(!user.is_current(ctx, c));
            assert_eq!(*user.get_or_default(ctx, c), 0);
        });
    }

    #[test]
    fn test_moved_vertex_is_stale() {
        let mut ctx = Context::new("top");
        let a = Graph::new(&mut ctx, "a");
        let b = Graph::new(&mut ctx, "b");
        let c = a.add_const(&mut ctx, Loc::default(), Bits::zero(1));

        ctx.user_data_in_use(a, |ctx, user: &mut UserData<bool>| {
            user.set(ctx, c, true);
            b.add_graph(ctx, a);
            assert!(!user.is_current(ctx, c));
        });
    }

    #[test]
    #[should_panic(expected = "already in use")]
    fn test_nested_epoch() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        ctx.user_data_in_use(g, |ctx, _: &mut UserData<()>| {
            ctx.user_data_in_use(g, |_, _: &mut UserData<()>| {});
        });
    }

    #[test]
    #[should_panic(expected = "is not current")]
    fn test_stale_read() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let c = g.add_const(&mut ctx, Loc::default(), Bits::zero(1));
        ctx.user_data_in_use(g, |ctx, user: &mut UserData<u8>| user.set(ctx, c, 1));
        ctx.user_data_in_use(g, |ctx, user: &mut UserData<u8>| {
            user.get(ctx, c);
        });
    }

    #[test]
    fn test_independent_graphs() {
        let mut ctx = Context::new("top");
        let a = Graph::new(&mut ctx, "a");
        let b = Graph::new(&mut ctx, "b");
        let c = b.add_const(&mut ctx, Loc::default(), Bits::zero(1));

        // epochs of different graphs may be held at the same time
        ctx.user_data_in_use(a, |ctx, _: &mut UserData<()>| {
            ctx.user_data_in_use(b, |ctx, user: &mut UserData<u8>| {
                user.set(ctx, c, 3);
                assert_eq!(user.try_get(ctx, c), Some(&3));
            });
        });
    }
}
