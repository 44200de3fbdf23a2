//! Geometry primitives consumed by the BVH builder.

mod triangle;

pub use triangle::*;
