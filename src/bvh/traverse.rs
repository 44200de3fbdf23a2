//! CPU reference traversal of the flattened node array.
//!
//! Walks the array exactly the way the shading stage does: an explicit stack
//! starting at index 0, following `left`/`left + 1` for internal nodes and
//! reading `[left, left + count)` of the triangle array at leaves. Used to
//! validate flattened output and as a CPU fallback for picking.

use std::ops::Range;

use crate::geom::Triangle;
use crate::util::{Aabb, Error, Result, Vec3};

use super::FlatNode;

const HIT_EPSILON: f32 = 1e-7;

/// Ray with normalized direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub inv_direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let direction = direction.normalize();
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
        }
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Slab test. Returns the entry distance if the box is hit before `t_max`.
    #[inline]
    pub fn hit_aabb(&self, aabb: &Aabb, t_max: f32) -> Option<f32> {
        let t1 = (aabb.min - self.origin) * self.inv_direction;
        let t2 = (aabb.max - self.origin) * self.inv_direction;

        let t_near = t1.min(t2);
        let t_far = t1.max(t2);

        let t_enter = t_near.max_element().max(0.0);
        let t_exit = t_far.min_element().min(t_max);

        (t_enter <= t_exit).then_some(t_enter)
    }

    /// Moller-Trumbore. Returns `(t, u, v)` for hits in front of the origin.
    pub fn hit_triangle(&self, tri: &Triangle) -> Option<(f32, f32, f32)> {
        let e1 = tri.v1 - tri.v0;
        let e2 = tri.v2 - tri.v0;
        let p = self.direction.cross(e2);
        let det = e1.dot(p);
        if det.abs() < HIT_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let s = self.origin - tri.v0;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(e1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = e2.dot(q) * inv_det;
        (t > HIT_EPSILON).then_some((t, u, v))
    }
}

/// Closest-hit record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub t: f32,
    /// Index into the (reordered) triangle array.
    pub triangle: usize,
    pub u: f32,
    pub v: f32,
    pub normal: Vec3,
}

/// Leaf triangle ranges reachable from the root, left child before right.
///
/// Fails on child indices that point outside the array or backwards, which
/// the GPU walk would turn into garbage reads or endless loops.
pub fn leaf_ranges(nodes: &[FlatNode]) -> Result<Vec<Range<usize>>> {
    if nodes.is_empty() {
        return Err(Error::invalid("node array is empty"));
    }

    let mut ranges = Vec::new();
    let mut stack = vec![0usize];
    let mut visited = 0usize;

    while let Some(i) = stack.pop() {
        visited += 1;
        if visited > nodes.len() {
            return Err(Error::invalid("node visited more than once"));
        }

        let node = &nodes[i];
        if node.is_leaf() {
            ranges.push(node.triangles());
        } else {
            let left = child_index(nodes, i)?;
            stack.push(left + 1);
            stack.push(left);
        }
    }

    Ok(ranges)
}

/// Find the closest triangle hit by `ray`.
///
/// `triangles` must be the slice reordered by the build that produced `nodes`.
pub fn intersect(nodes: &[FlatNode], triangles: &[Triangle], ray: &Ray) -> Result<Option<Hit>> {
    let Some(root) = nodes.first() else {
        return Ok(None);
    };

    let mut closest: Option<Hit> = None;
    let mut closest_t = f32::INFINITY;
    let mut stack: Vec<usize> = Vec::with_capacity(64);
    if ray.hit_aabb(&root.bounds(), closest_t).is_some() {
        stack.push(0);
    }

    while let Some(i) = stack.pop() {
        let node = &nodes[i];
        if ray.hit_aabb(&node.bounds(), closest_t).is_none() {
            continue;
        }

        if node.is_leaf() {
            let range = node.triangles();
            let Some(tris) = triangles.get(range.clone()) else {
                return Err(Error::invalid(format!(
                    "leaf {i} references triangles {range:?} (count: {})",
                    triangles.len()
                )));
            };
            for (offset, tri) in tris.iter().enumerate() {
                if let Some((t, u, v)) = ray.hit_triangle(tri) {
                    if t < closest_t {
                        closest_t = t;
                        closest = Some(Hit {
                            t,
                            triangle: range.start + offset,
                            u,
                            v,
                            normal: tri.n,
                        });
                    }
                }
            }
        } else {
            let left = child_index(nodes, i)?;
            let near_left = ray.hit_aabb(&nodes[left].bounds(), closest_t);
            let near_right = ray.hit_aabb(&nodes[left + 1].bounds(), closest_t);
            // Push the farther child first so the nearer one is popped next.
            match (near_left, near_right) {
                (Some(l), Some(r)) if l <= r => stack.extend([left + 1, left]),
                (Some(_), Some(_)) => stack.extend([left, left + 1]),
                (Some(_), None) => stack.push(left),
                (None, Some(_)) => stack.push(left + 1),
                (None, None) => {}
            }
        }
    }

    Ok(closest)
}

fn child_index(nodes: &[FlatNode], parent: usize) -> Result<usize> {
    let left = nodes[parent].left as usize;
    if left <= parent || left + 1 >= nodes.len() {
        return Err(Error::invalid(format!(
            "node {parent} has children at {left}/{} (count: {})",
            left + 1,
            nodes.len()
        )));
    }
    Ok(left)
}
