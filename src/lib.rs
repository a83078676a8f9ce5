//! # Combinational Logic Data-Flow Graph
//!
//! A compact, index-addressable data-flow graph (DFG) for the combinational
//! logic optimizer of a hardware-description-language compiler. Every
//! operation vertex owns its operand edges, which makes local rewriting,
//! structural equivalence (for common-subexpression elimination) and cycle
//! analysis cheap.
//!
//! The crate is split into two parts:
//!
//! - [`core`]: generic infrastructure (arenas, intrusive lists, union-find,
//!   graph traits and traversals) that the data-flow graph is built on.
//! - [`dfg`]: the data-flow graph itself.

#![warn(missing_docs)]
#![no_std]
#![forbid(unsafe_code)]

#[allow(unused_imports)]
#[macro_use]
extern crate alloc;
#[cfg(feature = "std")]
#[macro_use]
extern crate std;

#[cfg(feature = "std")]
use std::collections::{HashMap, HashSet};

#[cfg(not(feature = "std"))]
use hashbrown::{HashMap, HashSet};

pub mod core;
pub mod dfg;
mod error;

pub use error::{Error, Result};
