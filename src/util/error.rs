//! Error types for BVH construction, packing and mesh loading.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for bvh-accel operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Build was asked to partition zero triangles
    #[error("Cannot build a BVH over an empty triangle range [{start}, {end})")]
    EmptyRange { start: usize, end: usize },

    /// Range does not fit the triangle slice
    #[error("Triangle range [{start}, {end}) out of bounds (count: {len})")]
    InvalidRange { start: usize, end: usize, len: usize },

    /// Upload buffer would overflow
    #[error("Too many {what}: {count} exceeds buffer capacity {capacity}")]
    CapacityExceeded {
        what: &'static str,
        count: usize,
        capacity: usize,
    },

    /// Flattened node array is not traversable
    #[error("Invalid BVH structure: {0}")]
    InvalidStructure(String),

    /// Mesh file does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Malformed record in a mesh file
    #[error("Parse error at line {line}: {msg}")]
    Parse { line: usize, msg: String },

    /// Face references a vertex that was never declared
    #[error("Vertex index {index} out of bounds at line {line} (count: {count})")]
    InvalidIndex { line: usize, index: i64, count: usize },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings (de)serialization error
    #[error("Invalid settings: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create a parse error for a given 1-based line.
    pub fn parse(line: usize, msg: impl Into<String>) -> Self {
        Self::Parse { line, msg: msg.into() }
    }
}

/// Result type alias for bvh-accel operations.
pub type Result<T> = std::result::Result<T, Error>;
