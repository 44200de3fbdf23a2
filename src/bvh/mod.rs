//! BVH construction and flattening for GPU ray tracing.
//!
//! ## Architecture
//! ```text
//! &mut [Triangle] → build (median split, in-place reorder) → BvhNode tree
//!                 → flatten (breadth-first) → Vec<FlatNode> → SceneBuffers
//! ```
//!
//! Flat array layout for iterative GPU traversal:
//! - 48-byte nodes matching the shader-side record
//! - Element 0 is always the root
//! - Siblings are adjacent: an internal node's children sit at `left` and `left + 1`

pub mod build;
pub mod flatten;
pub mod gpu_data;
pub mod traverse;

pub use build::{build, build_range, build_with, BuildOptions, Bvh, BvhNode, BvhStats, LEAF_THRESHOLD};
pub use flatten::flatten;
pub use gpu_data::{Capacity, SceneBuffers};
pub use traverse::{intersect, leaf_ranges, Hit, Ray};

use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::util::{Aabb, Vec3};

/// GPU-friendly BVH node (48 bytes, matches the shader struct).
///
/// Internal node: `left` = index of first child in the same array, `count` = 0.
/// Leaf node: `left` = first triangle index, `count` > 0.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FlatNode {
    pub left: u32,
    pub count: u32,
    pub _pad0: u32,
    pub _pad1: u32,
    pub aabb_min: [f32; 3],
    pub _pad2: f32,
    pub aabb_max: [f32; 3],
    pub _pad3: f32,
}

impl FlatNode {
    /// Leaf covering triangles `[first, first + count)`.
    pub fn leaf(bounds: &Aabb, first: u32, count: u32) -> Self {
        debug_assert!(count > 0);
        Self::with_fields(bounds, first, count)
    }

    /// Internal node whose children live at `left` and `left + 1`.
    pub fn internal(bounds: &Aabb, left: u32) -> Self {
        Self::with_fields(bounds, left, 0)
    }

    fn with_fields(bounds: &Aabb, left: u32, count: u32) -> Self {
        Self {
            left,
            count,
            _pad0: 0,
            _pad1: 0,
            aabb_min: bounds.min.to_array(),
            _pad2: 0.0,
            aabb_max: bounds.max.to_array(),
            _pad3: 0.0,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.count > 0
    }

    /// Node bounds as an [`Aabb`].
    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(Vec3::from_array(self.aabb_min), Vec3::from_array(self.aabb_max))
    }

    /// Triangle range of a leaf (empty for internal nodes).
    #[inline]
    pub fn triangles(&self) -> Range<usize> {
        if self.is_leaf() {
            self.left as usize..self.left as usize + self.count as usize
        } else {
            0..0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_node_layout() {
        assert_eq!(std::mem::size_of::<FlatNode>(), 48);
        assert_eq!(std::mem::align_of::<FlatNode>(), 4);
    }

    #[test]
    fn test_flat_node_kinds() {
        let b = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let leaf = FlatNode::leaf(&b, 8, 3);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.triangles(), 8..11);
        assert_eq!(leaf.bounds(), b);

        let inner = FlatNode::internal(&b, 1);
        assert!(!inner.is_leaf());
        assert_eq!(inner.triangles(), 0..0);
        assert_eq!(inner.left, 1);
    }
}
