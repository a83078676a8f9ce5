//! Error type of the crate.
//!
//! Only conditions the caller can reasonably react to are reported through
//! [`Error`]. Broken invariants (stale handles, nested user data epochs,
//! deleting a vertex that is still used, ...) are bugs in the calling pass
//! and panic instead.

use alloc::string::String;

use thiserror::Error;

/// Errors reported by the data-flow graph.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested type cannot be represented by a vertex.
    ///
    /// Logic of this type must stay outside of the graph.
    #[error("unsupported data type: {0}")]
    UnsupportedType(String),

    /// Writing a dump file failed.
    #[cfg(feature = "std")]
    #[error("failed to write graph dump: {0}")]
    Io(#[from] std::io::Error),

    /// Formatting a dump failed.
    #[error("failed to format graph dump")]
    Fmt(#[from] core::fmt::Error),
}

/// Result alias with [`Error`] as the error type.
pub type Result<T> = core::result::Result<T, Error>;
