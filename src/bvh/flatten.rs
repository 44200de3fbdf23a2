//! Breadth-first lowering of the build tree into a flat node array.
//!
//! Nodes are emitted in FIFO visitation order and every internal node stores
//! the emission index of its left child. Because a node's two children are
//! enqueued back to back, they are always emitted back to back, so the right
//! child is at `left + 1` for any tree shape, balanced or not.

use std::collections::VecDeque;

use super::build::BvhNode;
use super::FlatNode;

/// Flatten a built tree. `result[0]` is the root and `result.len()` equals
/// the tree's node count.
#[tracing::instrument(skip_all)]
pub fn flatten(root: &BvhNode) -> Vec<FlatNode> {
    let mut nodes = Vec::with_capacity(root.node_count());
    let mut queue = VecDeque::from([root]);
    // Emission index the next enqueued node will receive.
    let mut next_slot: u32 = 1;

    while let Some(node) = queue.pop_front() {
        match node {
            BvhNode::Leaf { bounds, index, count } => {
                nodes.push(FlatNode::leaf(bounds, *index as u32, *count as u32));
            }
            BvhNode::Internal { bounds, left, right } => {
                nodes.push(FlatNode::internal(bounds, next_slot));
                queue.push_back(left.as_ref());
                queue.push_back(right.as_ref());
                next_slot += 2;
            }
        }
    }

    tracing::debug!(node_count = nodes.len(), "BVH flattened");
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bvh::build::{build, BvhNode};
    use crate::geom::Triangle;
    use crate::util::{Aabb, Vec3};

    fn leaf(index: usize, count: usize) -> BvhNode {
        BvhNode::Leaf {
            bounds: Aabb::new(Vec3::splat(index as f32), Vec3::splat((index + count) as f32)),
            index,
            count,
        }
    }

    fn internal(left: BvhNode, right: BvhNode) -> BvhNode {
        let bounds = left.bounds().union(right.bounds());
        BvhNode::Internal {
            bounds,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[test]
    fn test_single_leaf() {
        let flat = flatten(&leaf(0, 3));
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].left, 0);
        assert_eq!(flat[0].count, 3);
    }

    #[test]
    fn test_unbalanced_tree_indices() {
        //        0
        //      /   \
        //     1     2(leaf 8..10)
        //    / \
        //   3   4
        //  / \
        // 5   6
        let tree = internal(
            internal(internal(leaf(0, 2), leaf(2, 3)), leaf(5, 3)),
            leaf(8, 2),
        );
        let flat = flatten(&tree);
        assert_eq!(flat.len(), tree.node_count());
        assert_eq!(flat.len(), 7);

        assert_eq!((flat[0].left, flat[0].count), (1, 0));
        assert_eq!((flat[1].left, flat[1].count), (3, 0));
        assert_eq!(flat[2].triangles(), 8..10);
        assert_eq!((flat[3].left, flat[3].count), (5, 0));
        assert_eq!(flat[4].triangles(), 5..8);
        assert_eq!(flat[5].triangles(), 0..2);
        assert_eq!(flat[6].triangles(), 2..5);

        // The complete-binary-tree numbering would put node 3's children at 7 and 8,
        // past the end of a 7-element array.
        for node in flat.iter().filter(|n| !n.is_leaf()) {
            assert!((node.left as usize + 1) < flat.len());
        }
    }

    #[test]
    fn test_children_bounds_match_tree() {
        let tree = internal(leaf(0, 4), internal(leaf(4, 2), leaf(6, 2)));
        let flat = flatten(&tree);
        let root = flat[0];
        let l = flat[root.left as usize];
        let r = flat[root.left as usize + 1];
        assert_eq!(l.bounds(), Aabb::new(Vec3::splat(0.0), Vec3::splat(4.0)));
        assert_eq!(r.bounds(), Aabb::new(Vec3::splat(4.0), Vec3::splat(8.0)));
        assert_eq!(root.bounds(), l.bounds().union(&r.bounds()));
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let mut tris: Vec<Triangle> = (0..37)
            .map(|i| {
                let c = Vec3::new((i * 7 % 13) as f32, (i * 3 % 5) as f32, (i % 4) as f32);
                Triangle::new(c, c + Vec3::X, c + Vec3::Y)
            })
            .collect();
        let bvh = build(&mut tris).unwrap();
        let a = flatten(&bvh.root);
        let b = bvh.flatten();
        assert_eq!(
            bytemuck::cast_slice::<FlatNode, u8>(&a),
            bytemuck::cast_slice::<FlatNode, u8>(&b)
        );
    }
}
