//! Dispatch on the kind of a vertex.

use super::{Context, Graph, Vertex, VertexType};

macro_rules! define_visitor {
    ($(
        $variant:ident => $visit:ident, $class:ident, $arity:expr,
            [$($operand:literal),*], $doc:literal;
    )*) => {
        /// A visitor over vertices.
        ///
        /// Every kind has its own handler, which by default forwards to the
        /// handler of its class (`visit_var`, `visit_unary`, ...), which in
        /// turn forwards to [`Visitor::visit`]. Implementors override at
        /// whatever granularity they need.
        pub trait Visitor {
            /// Fallback for vertices without a more specific handler.
            fn visit(&mut self, ctx: &mut Context, vertex: Vertex);

            /// Variables of any kind.
            fn visit_var(&mut self, ctx: &mut Context, vertex: Vertex) { self.visit(ctx, vertex) }

            /// Operators with one operand.
            fn visit_unary(&mut self, ctx: &mut Context, vertex: Vertex) {
                self.visit(ctx, vertex)
            }

            /// Operators with two operands.
            fn visit_binary(&mut self, ctx: &mut Context, vertex: Vertex) {
                self.visit(ctx, vertex)
            }

            /// Operators with three operands.
            fn visit_ternary(&mut self, ctx: &mut Context, vertex: Vertex) {
                self.visit(ctx, vertex)
            }

            /// Operators with four operands.
            fn visit_quaternary(&mut self, ctx: &mut Context, vertex: Vertex) {
                self.visit(ctx, vertex)
            }

            $(
                #[doc = concat!("Handler of [`VertexType::", stringify!($variant), "`].")]
                fn $visit(&mut self, ctx: &mut Context, vertex: Vertex) { self.$class(ctx, vertex) }
            )*

            /// Call the handler of the kind of the vertex.
            fn iterate(&mut self, ctx: &mut Context, vertex: Vertex) {
                match vertex.ty(ctx) {
                    $(VertexType::$variant => self.$visit(ctx, vertex),)*
                }
            }

            /// Visit every vertex of the graph. The visitor may delete the
            /// vertex it is called with.
            fn visit_graph(&mut self, ctx: &mut Context, graph: Graph) {
                graph.for_each_vertex(ctx, |ctx, vertex| self.iterate(ctx, vertex));
            }
        }
    };
}

vertex_type_table!(define_visitor);

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::dfg::{Bits, DType, Loc, SourceType};

    fn op(ctx: &mut Context, g: Graph, ty: VertexType, width: u32, sources: &[Vertex]) -> Vertex {
        g.add_op_with(ctx, ty, Loc::default(), DType::packed(width), sources)
            .unwrap()
    }

    #[derive(Default)]
    struct Classes {
        seen: Vec<(&'static str, Vertex)>,
    }

    impl Visitor for Classes {
        fn visit(&mut self, _: &mut Context, vertex: Vertex) { self.seen.push(("other", vertex)) }

        fn visit_var(&mut self, _: &mut Context, vertex: Vertex) { self.seen.push(("var", vertex)) }

        fn visit_binary(&mut self, _: &mut Context, vertex: Vertex) {
            self.seen.push(("binary", vertex))
        }

        fn visit_add(&mut self, _: &mut Context, vertex: Vertex) { self.seen.push(("add", vertex)) }
    }

    #[test]
    fn test_dispatch() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let var = ctx.declare_var("x", &SourceType::bits(2)).unwrap();
        let x = g.add_var(&mut ctx, Loc::default(), var);
        let c = g.add_const(&mut ctx, Loc::default(), Bits::from_u64(2, 1));
        let add = op(&mut ctx, g, VertexType::Add, 2, &[x, c]);
        let sub = op(&mut ctx, g, VertexType::Sub, 2, &[x, c]);
        let not = op(&mut ctx, g, VertexType::Not, 2, &[add]);

        let mut visitor = Classes::default();
        visitor.visit_graph(&mut ctx, g);
        assert_eq!(
            visitor.seen,
            vec![("var", x), ("other", c), ("add", add), ("binary", sub), ("other", not)]
        );
    }

    struct Prune;

    impl Visitor for Prune {
        fn visit(&mut self, ctx: &mut Context, vertex: Vertex) {
            if !vertex.has_sinks(ctx) {
                vertex.unlink_delete(ctx);
            }
        }
    }

    #[test]
    fn test_delete_in_visitor() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let c = g.add_const(&mut ctx, Loc::default(), Bits::zero(1));
        let n = op(&mut ctx, g, VertexType::Not, 1, &[c]);
        op(&mut ctx, g, VertexType::RedAnd, 1, &[n]);

        Prune.visit_graph(&mut ctx, g);
        // only the unused reduction goes in one forward pass
        assert_eq!(g.vertices(&ctx).collect::<Vec<_>>(), vec![c, n]);
    }
}
