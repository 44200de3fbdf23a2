//! Math type re-exports and the axis-aligned bounding box.
//!
//! Vectors come from `glam`; [`Aabb`] is the box type shared by the
//! builder, the flattener and the reference traversal.

pub use glam::{Vec3, Vec3A, Vec4};

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Coordinate axis used to pick a split direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Component index (0=x, 1=y, 2=z).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Axis-aligned bounding box with single precision.
#[derive(Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Empty bounding box (inverted, so any union replaces it).
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Identity box for union.
    #[inline]
    pub const fn empty() -> Self {
        Self::EMPTY
    }

    /// Create a new bounding box from min and max points.
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a bounding box from a single point.
    #[inline]
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Check if this box contains nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this box to include a point.
    #[inline]
    pub fn expand_by_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Expand this box to the union with `other`.
    #[inline]
    pub fn expand(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Union of two boxes.
    #[inline]
    pub fn union(&self, other: &Aabb) -> Aabb {
        let mut b = *self;
        b.expand(other);
        b
    }

    /// Size along each axis (max - min).
    #[inline]
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get the center of the box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// True if `other` lies entirely inside this box (boundaries included).
    #[inline]
    pub fn contains(&self, other: &Aabb) -> bool {
        other.min.cmpge(self.min).all() && other.max.cmple(self.max).all()
    }

    /// Axis with the greatest extent.
    ///
    /// Exact ties resolve as `x > y ? (x > z ? X : Z) : (y > z ? Y : Z)`,
    /// which is what the GPU-side builder this layout targets expects.
    #[inline]
    pub fn longest_axis(&self) -> Axis {
        let e = self.extent();
        if e.x > e.y {
            if e.x > e.z {
                Axis::X
            } else {
                Axis::Z
            }
        } else if e.y > e.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for Aabb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Aabb({:?} - {:?})", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_empty_is_identity() {
        let b = Aabb::new(Vec3::new(-1.0, 2.0, 0.5), Vec3::new(3.0, 4.0, 0.5));
        let mut e = Aabb::empty();
        assert!(e.is_empty());
        e.expand(&b);
        assert_eq!(e, b);
        assert_eq!(b.union(&Aabb::EMPTY), b);
    }

    #[test]
    fn test_aabb_union_laws() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(-2.0), Vec3::splat(0.5));
        let c = Aabb::new(Vec3::new(5.0, -1.0, 0.0), Vec3::new(6.0, 0.0, 9.0));

        assert_eq!(a.union(&b), b.union(&a));
        assert_eq!(a.union(&b).union(&c), a.union(&b.union(&c)));
        assert_eq!(a.union(&a), a);
    }

    #[test]
    fn test_aabb_points() {
        let mut b = Aabb::EMPTY;
        b.expand_by_point(Vec3::ZERO);
        assert!(!b.is_empty());
        b.expand_by_point(Vec3::ONE);
        assert_eq!(b.center(), Vec3::splat(0.5));
        assert_eq!(b.extent(), Vec3::ONE);
        assert!(b.contains(&Aabb::from_point(Vec3::splat(0.25))));
        assert!(!b.contains(&Aabb::from_point(Vec3::splat(1.5))));
    }

    #[test]
    fn test_longest_axis_ties() {
        let cube = Aabb::new(Vec3::ZERO, Vec3::ONE);
        // all equal: x > y fails, y > z fails -> Z
        assert_eq!(cube.longest_axis(), Axis::Z);

        let xz = Aabb::new(Vec3::ZERO, Vec3::new(2.0, 1.0, 2.0));
        assert_eq!(xz.longest_axis(), Axis::Z);

        let xy = Aabb::new(Vec3::ZERO, Vec3::new(2.0, 2.0, 1.0));
        assert_eq!(xy.longest_axis(), Axis::Y);

        let x = Aabb::new(Vec3::ZERO, Vec3::new(3.0, 2.0, 1.0));
        assert_eq!(x.longest_axis(), Axis::X);
    }

    #[test]
    fn test_aabb_pod() {
        assert_eq!(std::mem::size_of::<Aabb>(), 24);
    }
}
