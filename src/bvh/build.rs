//! Median-split BVH builder.
//!
//! Recursively splits a contiguous triangle range at the centroid median of
//! the longest box axis, sorting the shared triangle slice in place. Leaves
//! reference `[index, index + count)` of the reordered slice.

use std::ops::Range;

use serde::Serialize;

use crate::geom::Triangle;
use crate::util::{Aabb, Error, Result};

use super::FlatNode;

/// Maximum triangles per leaf before forcing a split.
pub const LEAF_THRESHOLD: usize = 4;

/// Largest triangle count whose flattened node indices still fit in `u32`.
pub const MAX_BUILD_TRIANGLES: usize = (u32::MAX / 2) as usize;

/// Tunables for [`build_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Ranges with at most this many triangles become leaves (minimum 1).
    pub leaf_threshold: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            leaf_threshold: LEAF_THRESHOLD,
        }
    }
}

/// Build-time hierarchy node. Each internal node exclusively owns its two subtrees.
#[derive(Debug, Clone, PartialEq)]
pub enum BvhNode {
    Leaf {
        bounds: Aabb,
        /// First triangle in the reordered slice.
        index: usize,
        count: usize,
    },
    Internal {
        bounds: Aabb,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    #[inline]
    pub fn bounds(&self) -> &Aabb {
        match self {
            BvhNode::Leaf { bounds, .. } | BvhNode::Internal { bounds, .. } => bounds,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, BvhNode::Leaf { .. })
    }

    /// Total number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        match self {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Internal { left, right, .. } => 1 + left.node_count() + right.node_count(),
        }
    }

    /// Leaf triangle ranges in left-to-right (in-order) order.
    pub fn leaf_ranges(&self) -> Vec<Range<usize>> {
        let mut out = Vec::new();
        self.collect_leaf_ranges(&mut out);
        out
    }

    fn collect_leaf_ranges(&self, out: &mut Vec<Range<usize>>) {
        match self {
            BvhNode::Leaf { index, count, .. } => out.push(*index..*index + *count),
            BvhNode::Internal { left, right, .. } => {
                left.collect_leaf_ranges(out);
                right.collect_leaf_ranges(out);
            }
        }
    }
}

/// Built BVH: the tree plus the size of the triangle slice it indexes.
///
/// The tree is only meaningful against the exact triangle ordering the build
/// left behind; reorder the slice and every leaf range is stale.
#[derive(Debug, Clone, PartialEq)]
pub struct Bvh {
    pub root: BvhNode,
    pub tri_count: usize,
}

impl Bvh {
    /// Lower the tree into the GPU node array.
    pub fn flatten(&self) -> Vec<FlatNode> {
        super::flatten(&self.root)
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    pub fn stats(&self) -> BvhStats {
        BvhStats::from_tree(&self.root)
    }
}

/// Build BVH over the whole slice with default options.
pub fn build(triangles: &mut [Triangle]) -> Result<Bvh> {
    build_with(triangles, &BuildOptions::default())
}

/// Build BVH over the whole slice, reordering it in place.
///
/// Fails with [`Error::EmptyRange`] on zero triangles.
#[tracing::instrument(skip_all, fields(tri_count = triangles.len()))]
pub fn build_with(triangles: &mut [Triangle], options: &BuildOptions) -> Result<Bvh> {
    if triangles.len() > MAX_BUILD_TRIANGLES {
        return Err(Error::CapacityExceeded {
            what: "triangles",
            count: triangles.len(),
            capacity: MAX_BUILD_TRIANGLES,
        });
    }

    let root = build_range(triangles, 0, triangles.len(), options)?;
    let bvh = Bvh {
        root,
        tri_count: triangles.len(),
    };

    let stats = bvh.stats();
    tracing::debug!(
        nodes = stats.nodes,
        leaves = stats.leaves,
        max_depth = stats.max_depth,
        "BVH built"
    );
    Ok(bvh)
}

/// Build a subtree over `triangles[start..end]`.
///
/// Triangles outside the range are never touched.
pub fn build_range(
    triangles: &mut [Triangle],
    start: usize,
    end: usize,
    options: &BuildOptions,
) -> Result<BvhNode> {
    if start > end || end > triangles.len() {
        return Err(Error::InvalidRange {
            start,
            end,
            len: triangles.len(),
        });
    }
    if start == end {
        return Err(Error::EmptyRange { start, end });
    }

    let threshold = options.leaf_threshold.max(1);
    Ok(split(triangles, start, end, threshold))
}

// Requires end > start. Recursion depth is bounded by log2(count) since
// every split halves the range.
fn split(triangles: &mut [Triangle], start: usize, end: usize, threshold: usize) -> BvhNode {
    let mut bounds = Aabb::EMPTY;
    for tri in &triangles[start..end] {
        bounds.expand(&Aabb::from_triangle(tri));
    }

    let count = end - start;
    if count <= threshold {
        return BvhNode::Leaf {
            bounds,
            index: start,
            count,
        };
    }

    let axis = bounds.longest_axis();
    triangles[start..end].sort_unstable_by(|a, b| a.centroid_on(axis).total_cmp(&b.centroid_on(axis)));

    let mid = start + count / 2;
    let left = split(triangles, start, mid, threshold);
    let right = split(triangles, mid, end, threshold);

    BvhNode::Internal {
        bounds,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Shape summary of a built tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BvhStats {
    pub nodes: usize,
    pub leaves: usize,
    pub internal: usize,
    /// Depth of the deepest leaf (root = 0).
    pub max_depth: usize,
    pub max_leaf_size: usize,
    pub avg_leaf_size: f32,
}

impl BvhStats {
    pub fn from_tree(root: &BvhNode) -> Self {
        let mut stats = Self {
            nodes: 0,
            leaves: 0,
            internal: 0,
            max_depth: 0,
            max_leaf_size: 0,
            avg_leaf_size: 0.0,
        };
        let mut tris = 0usize;
        let mut stack = vec![(root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            stats.nodes += 1;
            stats.max_depth = stats.max_depth.max(depth);
            match node {
                BvhNode::Leaf { count, .. } => {
                    stats.leaves += 1;
                    stats.max_leaf_size = stats.max_leaf_size.max(*count);
                    tris += count;
                }
                BvhNode::Internal { left, right, .. } => {
                    stats.internal += 1;
                    stack.push((right, depth + 1));
                    stack.push((left, depth + 1));
                }
            }
        }
        stats.avg_leaf_size = tris as f32 / stats.leaves as f32;
        stats
    }
}
