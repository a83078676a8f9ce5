//! # Data-Flow Graph
//!
//! The combinational logic of a module, as a graph of [`Vertex`]es in a
//! [`Context`]. Constants and variable references are the leaves; every
//! other vertex is an operator that owns its operand [`Edge`]s. A vertex
//! knows its operands by position and its users (sinks) as a list of edges,
//! so the two directions can be walked and rewritten in constant time.
//!
//! Vertices are grouped into [`Graph`]s. A graph is free of combinational
//! cycles unless stated otherwise; [`Graph::extract_cyclic_components`] is
//! the way to restore that after a transformation introduced one.
//!
//! All handles ([`Graph`], [`Vertex`], [`Edge`]) are plain copyable indices
//! and every access goes through the [`Context`], which is the only owner
//! of the data. Using a handle after its target was deleted panics.

#[macro_use]
mod types;

mod bits;
mod context;
mod decompose;
mod dtype;
mod dump;
mod edge;
mod equality;
mod graph;
mod user;
mod vertex;
mod view;
mod visitor;

#[cfg(feature = "fuzzing")]
pub mod fuzzing;

pub use bits::Bits;
pub use context::{Context, VarId};
pub use dtype::{DType, SourceType};
#[cfg(feature = "std")]
pub use dump::DumpConfig;
pub use edge::Edge;
pub use equality::{EqualsCache, VertexHash};
pub use graph::Graph;
pub use types::{
    Arity, Binary, Operator, Quaternary, Ternary, Unary, VertexClass, VertexType,
    MAX_FIXED_ARITY,
};
pub use user::UserData;
pub use vertex::{Const, Loc, Var, Vertex, VertexPayload};
pub use view::GraphView;
pub use visitor::Visitor;
