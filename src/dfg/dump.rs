//! Graphviz dumps for debugging.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Write};

use super::{Const, Context, Graph, Var, Vertex};
use crate::core::graph::adapters::Reverse;
use crate::core::graph::traversal::Dfs;
use crate::{HashSet, Result};

fn escape(text: &str) -> Cow<'_, str> {
    if text.contains(['"', '\\']) {
        Cow::Owned(text.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        Cow::Borrowed(text)
    }
}

fn dump_name(name: &str, label: &str) -> String {
    if label.is_empty() {
        String::from(name)
    } else {
        format!("{}-{}", name, label)
    }
}

fn write_vertex(ctx: &Context, vertex: Vertex, out: &mut impl Write) -> fmt::Result {
    if let Some(var) = vertex.cast::<Var>(ctx) {
        let name = ctx.var_name(var.var());
        writeln!(
            out,
            "  {} [label=\"{}\\n{}\", shape=box]",
            vertex,
            escape(name),
            vertex.dtype(ctx)
        )
    } else if let Some(value) = vertex.cast::<Const>(ctx) {
        writeln!(out, "  {} [label=\"{}\", shape=plain]", vertex, value.value())
    } else {
        writeln!(
            out,
            "  {} [label=\"{}\\n{}\", shape=circle]",
            vertex,
            vertex.type_name(ctx),
            vertex.dtype(ctx)
        )
    }
}

/// Write the vertices in `vertices` and the edges between them.
fn write_dot(
    ctx: &Context,
    name: &str,
    vertices: &[Vertex],
    included: impl Fn(Vertex) -> bool,
    out: &mut impl Write,
) -> fmt::Result {
    writeln!(out, "digraph \"{}\" {{", escape(name))?;
    writeln!(out, "  graph [rankdir=LR]")?;
    for vertex in vertices {
        write_vertex(ctx, *vertex, out)?;
    }
    for sink in vertices {
        for (index, source) in sink.sources(ctx).enumerate() {
            let Some(source) = source.filter(|source| included(*source)) else {
                continue;
            };
            writeln!(
                out,
                "  {} -> {} [headlabel=\"{}\"]",
                source,
                sink,
                escape(&sink.src_name(ctx, index))
            )?;
        }
    }
    writeln!(out, "}}")
}

impl Graph {
    /// Write the graph in Graphviz format.
    ///
    /// The digraph is named after the graph, followed by `-{label}` unless
    /// the label is empty. Edges to vertices of other graphs are left out.
    pub fn dump_dot(self, ctx: &Context, out: &mut impl Write, label: &str) -> Result<()> {
        let vertices: Vec<Vertex> = self.vertices(ctx).collect();
        let name = dump_name(self.name(ctx), label);
        write_dot(ctx, &name, &vertices, |v| v.graph(ctx) == Some(self), out)?;
        Ok(())
    }
}

impl Vertex {
    /// The vertices the value of this vertex is computed from, including the
    /// vertex itself, in the order they appear in its graph.
    ///
    /// # Panics
    ///
    /// Panics if the vertex is not in a graph.
    pub fn upstream_cone(self, ctx: &Context) -> Vec<Vertex> {
        let graph = self
            .graph(ctx)
            .unwrap_or_else(|| panic!("{:?} is not in a graph", self));
        let view = graph.view(ctx);
        let reverse = Reverse::new(&view);
        let mut dfs = Dfs::default();
        let cone: HashSet<Vertex> = dfs.preorder_iter_from(&reverse, [self]).collect();
        graph
            .vertices(ctx)
            .filter(|vertex| cone.contains(vertex))
            .collect()
    }

    /// Write the upstream cone of the vertex in Graphviz format, as a
    /// digraph called `name`.
    pub fn dump_dot_cone(self, ctx: &Context, out: &mut impl Write, name: &str) -> Result<()> {
        let cone = self.upstream_cone(ctx);
        let included: HashSet<Vertex> = cone.iter().copied().collect();
        write_dot(ctx, name, &cone, |v| included.contains(&v), out)?;
        Ok(())
    }
}

#[cfg(feature = "std")]
mod file {
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use std::path::{Path, PathBuf};

    use super::dump_name;
    use crate::dfg::{Context, Graph, Var, Vertex};
    use crate::Result;

    static DUMP_COUNT: AtomicUsize = AtomicUsize::new(0);

    /// Where the numbered dumps go.
    #[derive(Debug, Clone)]
    pub struct DumpConfig {
        /// The output directory.
        pub dir: PathBuf,
        /// The prefix of every file name.
        pub prefix: String,
    }

    impl Default for DumpConfig {
        fn default() -> Self {
            Self {
                dir: PathBuf::from("."),
                prefix: String::from("dfg"),
            }
        }
    }

    impl DumpConfig {
        /// Create a config.
        pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
            Self {
                dir: dir.into(),
                prefix: prefix.into(),
            }
        }

        /// The next file name, `{prefix}-{number}-{name}.dot`. Numbers are
        /// shared by the whole process.
        fn next_path(&self, name: &str) -> PathBuf {
            let number = DUMP_COUNT.fetch_add(1, Ordering::Relaxed);
            self.dir
                .join(format!("{}-{:03}-{}.dot", self.prefix, number, name))
        }
    }

    fn write_file(path: &Path, text: &str) -> Result<()> {
        std::fs::write(path, text)?;
        log::trace!("wrote graph dump {}", path.display());
        Ok(())
    }

    impl Graph {
        /// Write the graph in Graphviz format to a file.
        pub fn dump_dot_file(
            self,
            ctx: &Context,
            path: impl AsRef<Path>,
            label: &str,
        ) -> Result<()> {
            let mut text = String::new();
            self.dump_dot(ctx, &mut text, label)?;
            write_file(path.as_ref(), &text)
        }

        /// Write the graph to the next numbered file of `config`.
        pub fn dump_dot_file_prefixed(
            self,
            ctx: &Context,
            config: &DumpConfig,
            label: &str,
        ) -> Result<PathBuf> {
            let path = config.next_path(&dump_name(self.name(ctx), label));
            self.dump_dot_file(ctx, &path, label)?;
            Ok(path)
        }

        /// Write the upstream cone of every driven variable of the graph to
        /// its own numbered file of `config`.
        pub fn dump_dot_all_var_cones_prefixed(
            self,
            ctx: &Context,
            config: &DumpConfig,
            label: &str,
        ) -> Result<Vec<PathBuf>> {
            let driven: Vec<Vertex> = self
                .var_vertices(ctx)
                .filter(|var| var.sources(ctx).any(|source| source.is_some()))
                .collect();
            let mut paths = Vec::with_capacity(driven.len());
            for var in driven {
                let var_name = ctx.var_name(var.as_::<Var>(ctx).var());
                let name = dump_name(&dump_name(self.name(ctx), label), var_name);
                let path = config.next_path(&name);
                var.dump_dot_upstream_cone(ctx, &path, &name)?;
                paths.push(path);
            }
            Ok(paths)
        }
    }

    impl Vertex {
        /// Write the upstream cone of the vertex to a file.
        pub fn dump_dot_upstream_cone(
            self,
            ctx: &Context,
            path: impl AsRef<Path>,
            name: &str,
        ) -> Result<()> {
            let mut text = String::new();
            self.dump_dot_cone(ctx, &mut text, name)?;
            write_file(path.as_ref(), &text)
        }
    }
}

#[cfg(feature = "std")]
pub use file::DumpConfig;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfg::{Bits, DType, Loc, SourceType, VertexType};

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a\"b\\c"), "a\\\"b\\\\c");
    }

    #[test]
    fn test_upstream_cone() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let var = ctx.declare_var("x", &SourceType::bits(1)).unwrap();
        let x = g.add_var(&mut ctx, Loc::default(), var);
        let c = g.add_const(&mut ctx, Loc::default(), Bits::zero(1));
        let bit = DType::packed(1);
        let a = g.add_op_with(&mut ctx, VertexType::Not, Loc::default(), bit, &[c]).unwrap();
        let b = g.add_op_with(&mut ctx, VertexType::Not, Loc::default(), bit, &[x]).unwrap();
        x.add_driver(&mut ctx, 0, a);

        assert_eq!(x.upstream_cone(&ctx), vec![x, c, a]);
        assert_eq!(b.upstream_cone(&ctx), vec![x, c, a, b]);
        assert_eq!(c.upstream_cone(&ctx), vec![c]);
    }
}
