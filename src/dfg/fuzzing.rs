//! Fuzzing facilities for data-flow graphs.

use alloc::vec::Vec;

use libfuzzer_sys::arbitrary::{self, Unstructured};
use strum::IntoEnumIterator;

use super::{
    Bits, Context, DType, EqualsCache, Graph, Loc, SourceType, UserData, Vertex, VertexHash,
    VertexType,
};
use crate::HashMap;

const WIDTH: u32 = 4;

/// Generate an arbitrary graph for fuzzing.
///
/// Operators are [`WIDTH`] bits wide, variables twice as wide so that each
/// of their up to two drivers has its own slice. Constants are small, so that
/// structurally equal vertices are common. Operands are picked from all
/// vertices, which makes cycles common as well.
pub fn arbitrary_graph(u: &mut Unstructured) -> arbitrary::Result<(Context, Graph)> {
    let mut ctx = Context::new("fuzz");
    let graph = Graph::new(&mut ctx, "fuzz");

    let num_vars = u.int_in_range(0..=7)?;
    let num_consts = u.int_in_range(0..=3)?;
    let num_ops = u.int_in_range(0..=63)?;

    let mut vertices = Vec::new();
    let mut vars = Vec::new();
    for i in 0..num_vars {
        let var = ctx
            .declare_var(format!("v{}", i), &SourceType::bits(2 * WIDTH))
            .unwrap_or_else(|err| panic!("{}", err));
        let vertex = graph.add_var(&mut ctx, Loc::default(), var);
        vertices.push(vertex);
        vars.push(vertex);
    }
    for _ in 0..num_consts {
        let value = u.int_in_range(0..=3)?;
        vertices.push(graph.add_const(&mut ctx, Loc::default(), Bits::from_u64(WIDTH, value)));
    }

    let kinds: Vec<VertexType> = VertexType::iter().filter(|ty| ty.is_operator()).collect();
    let mut ops = Vec::new();
    for _ in 0..num_ops {
        let ty = *u.choose(&kinds)?;
        let op = graph
            .add_op(&mut ctx, ty, Loc::default(), DType::packed(WIDTH))
            .unwrap_or_else(|err| panic!("{}", err));
        vertices.push(op);
        ops.push(op);
    }

    for op in &ops {
        for index in 0..op.arity(&ctx) {
            if u.ratio(1, 16)? {
                continue;
            }
            let source = *u.choose(&vertices)?;
            op.relink_source(&mut ctx, index, source);
        }
    }
    if !ops.is_empty() {
        for var in &vars {
            let num_drivers = u.int_in_range(0..=2)?;
            for i in 0..num_drivers {
                let driver = *u.choose(&ops)?;
                var.add_driver(&mut ctx, i * WIDTH, driver);
            }
        }
    }

    Ok((ctx, graph))
}

fn edges(ctx: &Context, vertex: Vertex) -> Vec<Option<Vertex>> { vertex.sources(ctx).collect() }

fn check_fanout(ctx: &Context, graph: Graph) {
    for vertex in graph.vertices(ctx) {
        for edge in vertex.sinks(ctx) {
            assert_eq!(edge.source(ctx), Some(vertex));
        }
        for edge in vertex.source_edges(ctx) {
            if let Some(source) = edge.source(ctx) {
                assert!(source.sinks(ctx).contains(&edge));
            }
        }
    }
}

/// Split the graph and check that the pieces are connected, alive, and
/// together hold every vertex reachable from a variable with unchanged
/// operands.
pub fn check_split(ctx: &mut Context, graph: Graph) {
    let before: HashMap<Vertex, Vec<Option<Vertex>>> = graph
        .vertices(ctx)
        .map(|vertex| (vertex, edges(ctx, vertex)))
        .collect();

    let components = graph.split_into_components(ctx, "fuzz");
    assert!(graph.is_empty(ctx));

    let mut kept = 0;
    for component in &components {
        assert!(component.var_vertices(ctx).next().is_some());
        check_fanout(ctx, *component);
        for vertex in component.vertices(ctx) {
            kept += 1;
            assert_eq!(edges(ctx, vertex), before[&vertex]);
            for source in vertex.sources(ctx).flatten() {
                assert_eq!(source.graph(ctx), Some(*component));
            }
        }
    }
    for vertex in before.keys() {
        if !ctx.contains_vertex(*vertex) {
            continue;
        }
        assert!(components.contains(&vertex.graph(ctx).unwrap()));
    }

    let merged = Graph::new(ctx, "merged");
    for component in components {
        merged.add_graph(ctx, component);
        component.remove(ctx);
    }
    assert_eq!(merged.size(ctx), kept);
    assert_eq!(ctx.num_vertices(), kept);
}

/// Extract the cycles of the graph and check that what is left is acyclic.
pub fn check_extract(ctx: &mut Context, graph: Graph) {
    let size = graph.size(ctx);
    let components = graph.extract_cyclic_components(ctx, "fuzz");
    assert!(graph.is_acyclic(ctx));
    check_fanout(ctx, graph);

    let mut total = graph.size(ctx);
    for component in &components {
        assert!(!component.is_empty(ctx));
        assert!(!component.is_acyclic(ctx));
        check_fanout(ctx, *component);
        total += component.size(ctx);
    }
    // only clones are added
    assert!(total >= size);
    assert!(graph.extract_cyclic_components(ctx, "fuzz").is_empty());
}

/// Check that equality is reflexive and symmetric, and that equal vertices
/// hash equally.
pub fn check_equality(ctx: &mut Context, graph: Graph) {
    let vertices: Vec<Vertex> = graph.vertices(ctx).collect();
    let hashes: Vec<VertexHash> =
        ctx.user_data_in_use(graph, |ctx, user: &mut UserData<VertexHash>| {
            vertices
                .iter()
                .map(|vertex| vertex.structural_hash(ctx, user))
                .collect()
        });

    let mut cache = EqualsCache::new();
    for (i, a) in vertices.iter().enumerate() {
        assert!(a.equals(ctx, *a, &mut cache));
        for (j, b) in vertices.iter().enumerate() {
            let equal = a.equals(ctx, *b, &mut cache);
            assert_eq!(equal, b.equals_uncached(ctx, *a), "{:?} {:?}", a, b);
            if equal {
                assert_eq!(hashes[i], hashes[j], "{:?} {:?}", a, b);
            }
        }
    }
}
