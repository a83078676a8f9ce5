//! Core Components
//!
//! This module provides the abstract data structures and algorithms the
//! data-flow graph is built on.

pub mod graph;
pub mod linked_list;
pub mod storage;
pub mod union_find;
pub mod utils;
