//! Utility types shared across the crate.
//!
//! - [`Aabb`] / [`Axis`] - Bounding boxes and split axes
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam

mod error;
mod math;

pub use error::*;
pub use math::*;
