//! Splitting graphs into independent pieces.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use super::{Context, Graph, Vertex};
use crate::core::graph::scc::{is_cyclic_component, strongly_connected_components};
use crate::core::graph::Adjacent;
use crate::core::union_find::UnionFind;
use crate::{HashMap, HashSet};

fn component_name(ctx: &Context, graph: Graph, label: &str, index: usize) -> String {
    let name = graph.name(ctx);
    if label.is_empty() {
        format!("{}-component-{}", name, index)
    } else {
        format!("{}-{}-component-{}", name, label, index)
    }
}

impl Graph {
    /// Split the graph into its weakly connected components.
    ///
    /// Components without any variable compute nothing observable and are
    /// deleted. The others are returned as new graphs, in the order their
    /// first vertex appears in this graph, named
    /// `{name}-{label}-component-{index}`. This graph is left empty.
    pub fn split_into_components(self, ctx: &mut Context, label: &str) -> Vec<Graph> {
        let vertices: Vec<Vertex> = self.vertices(ctx).collect();

        let mut sets = UnionFind::with_capacity(vertices.len());
        for vertex in &vertices {
            sets.insert(*vertex);
        }
        for vertex in &vertices {
            for source in vertex.sources(ctx).flatten() {
                if source.graph(ctx) == Some(self) {
                    sets.union(*vertex, source);
                }
            }
        }

        let live: HashSet<usize> = self
            .var_vertices(ctx)
            .filter_map(|var| sets.find(var))
            .collect();

        let mut components: HashMap<usize, Graph> = HashMap::default();
        let mut graphs = Vec::new();
        let mut dead = Vec::new();
        for vertex in &vertices {
            let root = sets.find_and_compress(*vertex).unwrap_or_else(|| unreachable!());
            if !live.contains(&root) {
                dead.push(*vertex);
                continue;
            }
            let graph = match components.get(&root) {
                Some(graph) => *graph,
                None => {
                    let name = component_name(ctx, self, label, graphs.len());
                    let graph = Graph::new(ctx, name);
                    components.insert(root, graph);
                    graphs.push(graph);
                    graph
                }
            };
            graph.move_vertex(ctx, *vertex);
        }

        // dead islands only read each other
        for vertex in &dead {
            for edge in vertex.source_edges(ctx).collect::<Vec<_>>() {
                edge.unlink_source(ctx);
            }
        }
        for vertex in &dead {
            vertex.unlink_delete(ctx);
        }

        log::debug!(
            "split {} into {} components, pruned {} dead vertices",
            self.name(ctx),
            graphs.len(),
            dead.len()
        );
        graphs
    }

    /// Move every combinational cycle out of the graph.
    ///
    /// Each strongly connected component with a cycle is grown through the
    /// operators around it until variables or constants are reached, and
    /// overlapping regions are merged. Every region becomes a new graph named
    /// `{name}-{label}-component-{index}`. Variables and constants on the
    /// border of a region are cloned into it instead of being shared, and
    /// cloned variables are marked as referenced from elsewhere. What is left
    /// of this graph is acyclic.
    pub fn extract_cyclic_components(self, ctx: &mut Context, label: &str) -> Vec<Graph> {
        // component ids of vertices: 0 for acyclic logic staying here
        let mut ids: HashMap<Vertex, usize> = HashMap::default();
        let mut num_ids = 0;
        {
            let view = self.view(ctx);
            for component in strongly_connected_components(&view) {
                if !is_cyclic_component(&view, &component) {
                    continue;
                }
                num_ids += 1;
                for vertex in component {
                    ids.insert(vertex, num_ids);
                }
            }
        }
        if num_ids == 0 {
            return Vec::new();
        }
        let num_cycles = num_ids;

        // grow the components through operators, merging where they meet
        let mut merged = UnionFind::<usize>::with_capacity(num_ids + 1);
        for id in 1..=num_ids {
            merged.insert(id);
        }
        let seeds: Vec<Vertex> = self
            .vertices(ctx)
            .filter(|vertex| ids.contains_key(vertex))
            .collect();
        {
            let view = self.view(ctx);
            let mut stack = Vec::new();
            let mut visited: HashSet<_> = HashSet::default();
            for seed in seeds {
                let id = ids[&seed];
                stack.push(seed);
                while let Some(vertex) = stack.pop() {
                    if !visited.insert(vertex) {
                        continue;
                    }
                    for next in view.adjacent(vertex) {
                        if !next.ty(ctx).is_operator() {
                            continue;
                        }
                        match ids.get(&next).copied() {
                            Some(other) => {
                                merged.union(id, other);
                            }
                            None => {
                                ids.insert(next, id);
                            }
                        }
                        stack.push(next);
                    }
                }
            }
        }

        // one graph per merged component, numbered by first appearance
        let mut graph_of_root: HashMap<usize, Graph> = HashMap::default();
        let mut graphs = Vec::new();
        for id in 1..=num_ids {
            let root = merged.find_and_compress(id).unwrap_or_else(|| unreachable!());
            if !graph_of_root.contains_key(&root) {
                let name = component_name(ctx, self, label, graphs.len());
                let graph = Graph::new(ctx, name);
                graph_of_root.insert(root, graph);
                graphs.push(graph);
            }
        }
        let mut target: HashMap<Vertex, Graph> = HashMap::default();
        for (vertex, id) in &ids {
            let root = merged.find_and_compress(*id).unwrap_or_else(|| unreachable!());
            target.insert(*vertex, graph_of_root[&root]);
        }

        // cut the edges crossing component borders at variables and constants
        let borders: Vec<Vertex> = self
            .vertices(ctx)
            .filter(|vertex| !vertex.ty(ctx).is_operator())
            .collect();
        let mut clones: HashMap<(Vertex, Option<Graph>), Vertex> = HashMap::default();
        let mut num_clones = 0;
        let mut clone_of = |ctx: &mut Context,
                            target: &mut HashMap<Vertex, Graph>,
                            vertex: Vertex,
                            graph: Option<Graph>| {
            if target.get(&vertex).copied() == graph {
                return vertex;
            }
            if let Some(clone) = clones.get(&(vertex, graph)) {
                return *clone;
            }
            let into = graph.unwrap_or(self);
            let loc = vertex.loc(ctx);
            let clone = match vertex.cast::<super::Var>(ctx) {
                Some(var) => {
                    let var = var.var();
                    let clone = into.add_var(ctx, loc, var);
                    clone.set_has_mod_refs(ctx);
                    vertex.set_has_mod_refs(ctx);
                    clone
                }
                None => {
                    let value = vertex.as_::<super::Const>(ctx).value().clone();
                    into.add_const(ctx, loc, value)
                }
            };
            if let Some(graph) = graph {
                target.insert(clone, graph);
            }
            clones.insert((vertex, graph), clone);
            num_clones += 1;
            clone
        };

        for vertex in borders {
            let home = target.get(&vertex).copied();

            // drivers from another component drive a clone living there
            let mut cut = false;
            for edge in vertex.source_edges(ctx).collect::<Vec<_>>() {
                let Some(source) = edge.source(ctx) else {
                    continue;
                };
                let there = target.get(&source).copied();
                if there == home {
                    continue;
                }
                let offset = vertex.as_::<super::Var>(ctx).driver_offsets()[edge.index()];
                edge.unlink_source(ctx);
                let clone = clone_of(ctx, &mut target, vertex, there);
                clone.add_driver(ctx, offset, source);
                cut = true;
            }
            if cut {
                ctx.compact_var_drivers(vertex);
            }

            // readers in another component read a clone living there
            let sinks: Vec<_> = vertex.sinks(ctx).to_vec();
            for edge in sinks {
                let there = target.get(&edge.sink()).copied();
                if there != home {
                    let clone = clone_of(ctx, &mut target, vertex, there);
                    edge.relink_source(ctx, clone);
                }
            }
        }

        let moved: Vec<(Vertex, Graph)> = self
            .vertices(ctx)
            .filter_map(|vertex| target.get(&vertex).map(|graph| (vertex, *graph)))
            .collect();
        for (vertex, graph) in &moved {
            graph.move_vertex(ctx, *vertex);
        }

        log::debug!(
            "extracted {} cycles of {} into {} components, moved {} vertices, made {} clones",
            num_cycles,
            self.name(ctx),
            graphs.len(),
            moved.len(),
            num_clones
        );
        graphs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfg::{Bits, Const, DType, Loc, SourceType, Var, VertexType};

    fn var(ctx: &mut Context, graph: Graph, name: &str) -> Vertex {
        let var = ctx.declare_var(name, &SourceType::bits(1)).unwrap();
        graph.add_var(ctx, Loc::default(), var)
    }

    fn op(ctx: &mut Context, graph: Graph, ty: VertexType, sources: &[Vertex]) -> Vertex {
        graph
            .add_op_with(ctx, ty, Loc::default(), DType::packed(1), sources)
            .unwrap()
    }

    fn not_cycle(ctx: &mut Context, graph: Graph, len: usize) -> Vec<Vertex> {
        let mut ring = Vec::new();
        for _ in 0..len {
            ring.push(
                graph
                    .add_op(ctx, VertexType::Not, Loc::default(), DType::packed(1))
                    .unwrap(),
            );
        }
        for i in 0..len {
            ring[i].relink_source(ctx, 0, ring[(i + len - 1) % len]);
        }
        ring
    }

    #[test]
    fn test_split() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let x = var(&mut ctx, g, "x");
        let y = var(&mut ctx, g, "y");
        let c = g.add_const(&mut ctx, Loc::default(), Bits::zero(1));
        let dead = g.add_const(&mut ctx, Loc::default(), Bits::ones(1));
        let n = op(&mut ctx, g, VertexType::Not, &[c]);
        let m = op(&mut ctx, g, VertexType::Not, &[dead]);
        let k = op(&mut ctx, g, VertexType::RedOr, &[m]);
        x.add_driver(&mut ctx, 0, n);
        let y_driver = op(&mut ctx, g, VertexType::Not, &[x]);
        y.add_driver(&mut ctx, 0, y_driver);

        let components = g.split_into_components(&mut ctx, "split");
        assert!(g.is_empty(&ctx));
        assert_eq!(components.len(), 1);
        let component = components[0];
        assert_eq!(component.name(&ctx), "g-split-component-0");
        assert_eq!(
            component.vertices(&ctx).collect::<Vec<_>>(),
            vec![x, y, c, n, y_driver]
        );
        for vertex in [dead, m, k] {
            assert!(!ctx.contains_vertex(vertex));
        }
        assert_eq!(ctx.num_vertices(), 5);
    }

    #[test]
    fn test_split_independent() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let x = var(&mut ctx, g, "x");
        let y = var(&mut ctx, g, "y");
        let a = op(&mut ctx, g, VertexType::Not, &[x]);
        let b = op(&mut ctx, g, VertexType::RedXor, &[y]);

        let components = g.split_into_components(&mut ctx, "");
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].name(&ctx), "g-component-0");
        assert_eq!(components[1].name(&ctx), "g-component-1");
        assert_eq!(components[0].vertices(&ctx).collect::<Vec<_>>(), vec![x, a]);
        assert_eq!(components[1].vertices(&ctx).collect::<Vec<_>>(), vec![y, b]);
    }

    #[test]
    fn test_extract_cycle() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let ring = not_cycle(&mut ctx, g, 3);
        let d = var(&mut ctx, g, "d");
        d.add_driver(&mut ctx, 0, ring[2]);
        assert!(!g.is_acyclic(&ctx));

        let components = g.extract_cyclic_components(&mut ctx, "cyc");
        assert_eq!(components.len(), 1);
        let component = components[0];
        assert_eq!(component.name(&ctx), "g-cyc-component-0");
        assert_eq!(component.op_vertices(&ctx).collect::<Vec<_>>(), ring);

        let clones: Vec<_> = component.var_vertices(&ctx).collect();
        assert_eq!(clones.len(), 1);
        let clone = clones[0];
        assert_ne!(clone, d);
        assert_eq!(clone.as_::<Var>(&ctx).var(), d.as_::<Var>(&ctx).var());
        assert!(clone.as_::<Var>(&ctx).has_mod_refs());
        assert_eq!(clone.sources(&ctx).collect::<Vec<_>>(), vec![Some(ring[2])]);
        assert_eq!(clone.as_::<Var>(&ctx).driver_offsets(), &[0]);

        assert_eq!(g.vertices(&ctx).collect::<Vec<_>>(), vec![d]);
        assert!(d.as_::<Var>(&ctx).has_mod_refs());
        assert_eq!(d.arity(&ctx), 0);
        assert!(g.is_acyclic(&ctx));
        assert!(g.extract_cyclic_components(&mut ctx, "cyc").is_empty());
    }

    #[test]
    fn test_extract_self_loop() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let ring = not_cycle(&mut ctx, g, 1);
        let components = g.extract_cyclic_components(&mut ctx, "");
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].name(&ctx), "g-component-0");
        assert_eq!(ring[0].graph(&ctx), Some(components[0]));
        assert!(g.is_empty(&ctx));
    }

    #[test]
    fn test_extract_acyclic() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let x = var(&mut ctx, g, "x");
        let n = op(&mut ctx, g, VertexType::Not, &[x]);
        let y = var(&mut ctx, g, "y");
        y.add_driver(&mut ctx, 0, n);

        assert!(g.extract_cyclic_components(&mut ctx, "cyc").is_empty());
        assert_eq!(g.size(&ctx), 3);
        assert!(!x.as_::<Var>(&ctx).has_mod_refs());
    }

    #[test]
    fn test_extract_merges_through_operators() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let first = not_cycle(&mut ctx, g, 2);
        let second = not_cycle(&mut ctx, g, 1);
        let join = op(&mut ctx, g, VertexType::And, &[first[0], second[0]]);
        let out = var(&mut ctx, g, "out");
        out.add_driver(&mut ctx, 0, join);

        let components = g.extract_cyclic_components(&mut ctx, "cyc");
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].op_vertices(&ctx).count(), 4);
        assert_eq!(components[0].var_vertices(&ctx).count(), 1);
        assert_eq!(g.vertices(&ctx).collect::<Vec<_>>(), vec![out]);
    }

    #[test]
    fn test_extract_separate_cycles() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let wide = ctx.declare_var("x", &SourceType::bits(2)).unwrap();
        let x = g.add_var(&mut ctx, Loc::default(), wide);
        let first = not_cycle(&mut ctx, g, 2);
        let second = not_cycle(&mut ctx, g, 2);
        // both cycles drive the same variable, which separates them
        x.add_driver(&mut ctx, 0, first[0]);
        x.add_driver(&mut ctx, 1, second[0]);

        let components = g.extract_cyclic_components(&mut ctx, "cyc");
        assert_eq!(components.len(), 2);
        for (component, ring) in components.iter().zip([&first, &second]) {
            assert_eq!(component.op_vertices(&ctx).collect::<Vec<_>>(), *ring);
            assert_eq!(component.var_vertices(&ctx).count(), 1);
        }
        assert_eq!(g.vertices(&ctx).collect::<Vec<_>>(), vec![x]);
        assert_eq!(x.arity(&ctx), 0);
    }

    #[test]
    fn test_extract_clones_constants() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let k = g.add_const(&mut ctx, Loc::default(), Bits::ones(1));
        let a = g
            .add_op(&mut ctx, VertexType::Xor, Loc::default(), DType::packed(1))
            .unwrap();
        let b = op(&mut ctx, g, VertexType::Not, &[a]);
        a.relink_source(&mut ctx, 0, k);
        a.relink_source(&mut ctx, 1, b);
        let r = op(&mut ctx, g, VertexType::Not, &[k]);
        let y = var(&mut ctx, g, "y");
        y.add_driver(&mut ctx, 0, r);

        let components = g.extract_cyclic_components(&mut ctx, "cyc");
        assert_eq!(components.len(), 1);
        let consts: Vec<_> = components[0].const_vertices(&ctx).collect();
        assert_eq!(consts.len(), 1);
        assert_ne!(consts[0], k);
        assert_eq!(consts[0].as_::<Const>(&ctx).value(), &Bits::ones(1));
        assert_eq!(a.source(&ctx, 0), Some(consts[0]));

        assert_eq!(k.graph(&ctx), Some(g));
        assert_eq!(k.fanout(&ctx), 1);
        assert_eq!(g.vertices(&ctx).collect::<Vec<_>>(), vec![y, k, r]);
        assert!(g.is_acyclic(&ctx));
    }
}
