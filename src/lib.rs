//! # bvh-accel
//!
//! Bounding volume hierarchy construction for GPU ray tracing.
//!
//! A triangle soup is partitioned in place by a median split along the
//! longest axis, then lowered breadth-first into a flat node array that a
//! shading stage can walk iteratively without recursion.
//!
//! ## Modules
//!
//! - [`util`] - Bounding boxes, math re-exports, errors
//! - [`geom`] - Triangle primitive and its GPU layout
//! - [`bvh`] - Builder, flattener, upload packing, reference traversal
//! - [`loader`] - `.obj` reader producing triangles
//! - [`settings`] - Build and buffer configuration
//!
//! ## Example
//!
//! ```ignore
//! use bvh_accel::prelude::*;
//!
//! let mut tris = load_obj("bunny.obj", &LoadOptions::default())?;
//! let bvh = build(&mut tris)?;
//! let buffers = bvh.pack(&tris, &Capacity::default())?;
//! queue.write_buffer(&node_buffer, 0, buffers.nodes_bytes());
//! ```

pub mod util;
pub mod geom;
pub mod bvh;
pub mod loader;
pub mod settings;

// Re-export commonly used types
pub use util::{Aabb, Axis, Error, Result};
pub use geom::{GpuTriangle, Triangle};
pub use bvh::{Bvh, BvhNode, FlatNode, SceneBuffers};
pub use settings::Settings;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Aabb, Axis, Error, Result, Vec3};
    pub use crate::geom::{GpuTriangle, Triangle};
    pub use crate::bvh::{
        build, build_range, build_with, flatten, intersect, leaf_ranges, BuildOptions, Bvh,
        BvhNode, BvhStats, Capacity, FlatNode, Hit, Ray, SceneBuffers, LEAF_THRESHOLD,
    };
    pub use crate::loader::{load_obj, parse_obj, LoadOptions};
    pub use crate::settings::Settings;
}
