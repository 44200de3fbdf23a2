//! Triangle primitive and its GPU-side layout.

use bytemuck::{Pod, Zeroable};

use crate::util::{Aabb, Axis, Vec3};

/// CPU-side triangle used during BVH build (before GPU upload).
///
/// The face normal is computed once at construction from the winding
/// order `cross(v1 - v0, v2 - v0)`, so reordering triangles never flips it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub v0: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
    pub n: Vec3,
}

impl Triangle {
    /// Triangle with its face normal derived from winding order.
    ///
    /// Degenerate (zero-area) triangles get a zero normal.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let n = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        Self { v0, v1, v2, n }
    }

    /// Triangle with an explicit normal (normalized here).
    pub fn with_normal(v0: Vec3, v1: Vec3, v2: Vec3, n: Vec3) -> Self {
        Self { v0, v1, v2, n: n.normalize_or_zero() }
    }

    /// Compute AABB of this triangle.
    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.v0.min(self.v1).min(self.v2), self.v0.max(self.v1).max(self.v2))
    }

    /// Centroid of the triangle.
    #[inline]
    pub fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    /// Centroid coordinate along one axis.
    #[inline]
    pub fn centroid_on(&self, axis: Axis) -> f32 {
        let i = axis.index();
        (self.v0[i] + self.v1[i] + self.v2[i]) / 3.0
    }

    /// Convert to GPU-friendly packed format.
    pub fn to_gpu(&self) -> GpuTriangle {
        GpuTriangle {
            v0: self.v0.to_array(),
            _pad0: 0.0,
            v1: self.v1.to_array(),
            _pad1: 0.0,
            v2: self.v2.to_array(),
            _pad2: 0.0,
            n: self.n.to_array(),
            _pad3: 0.0,
        }
    }
}

impl Aabb {
    /// Bounding box of a triangle's three vertices.
    #[inline]
    pub fn from_triangle(t: &Triangle) -> Self {
        t.aabb()
    }
}

/// Triangle primitive for GPU storage (64 bytes, std140/std430 friendly).
/// Each vec3 is padded to 16 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuTriangle {
    pub v0: [f32; 3],
    pub _pad0: f32,
    pub v1: [f32; 3],
    pub _pad1: f32,
    pub v2: [f32; 3],
    pub _pad2: f32,
    pub n: [f32; 3],
    pub _pad3: f32,
}
