//! Adapters for Graphs.

mod reverse;

pub use reverse::*;
