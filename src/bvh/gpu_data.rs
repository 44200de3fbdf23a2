//! Serialize BVH + triangles into GPU storage buffers.
//!
//! Buffers on the shading side are allocated with a fixed element count, so
//! packing checks both arrays against a [`Capacity`] and refuses to truncate.

use crate::geom::{GpuTriangle, Triangle};
use crate::util::{Error, Result};

use super::build::Bvh;
use super::FlatNode;

/// Default element capacity of each upload buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Maximum element counts of the upload buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    pub max_triangles: usize,
    pub max_nodes: usize,
}

impl Default for Capacity {
    fn default() -> Self {
        Self {
            max_triangles: DEFAULT_BUFFER_CAPACITY,
            max_nodes: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl Capacity {
    /// No limit beyond what the node encoding can address.
    pub fn unbounded() -> Self {
        Self {
            max_triangles: u32::MAX as usize,
            max_nodes: u32::MAX as usize,
        }
    }

    /// Fail with [`Error::CapacityExceeded`] if either count does not fit.
    pub fn check(&self, tri_count: usize, node_count: usize) -> Result<()> {
        if tri_count > self.max_triangles {
            return Err(Error::CapacityExceeded {
                what: "triangles",
                count: tri_count,
                capacity: self.max_triangles,
            });
        }
        if node_count > self.max_nodes {
            return Err(Error::CapacityExceeded {
                what: "nodes",
                count: node_count,
                capacity: self.max_nodes,
            });
        }
        Ok(())
    }
}

/// Complete scene data ready for GPU upload.
#[derive(Debug, Clone)]
pub struct SceneBuffers {
    /// Flat BVH node array (bytemuck-castable).
    pub nodes: Vec<FlatNode>,
    /// Packed triangle data in BVH leaf order.
    pub triangles: Vec<GpuTriangle>,
    /// Total triangle count.
    pub tri_count: u32,
    /// Total node count.
    pub node_count: u32,
}

impl SceneBuffers {
    /// Pack a flattened node array with the triangle slice its build reordered.
    ///
    /// Every leaf must address triangles inside the slice; a mismatch means
    /// the two arrays did not come from the same build.
    #[tracing::instrument(skip_all, fields(tri_count = triangles.len(), node_count = nodes.len()))]
    pub fn pack(triangles: &[Triangle], nodes: Vec<FlatNode>, capacity: &Capacity) -> Result<Self> {
        if nodes.is_empty() {
            return Err(Error::invalid("node array is empty"));
        }
        capacity.check(triangles.len(), nodes.len())?;

        for (i, node) in nodes.iter().enumerate() {
            if node.is_leaf() {
                if node.triangles().end > triangles.len() {
                    return Err(Error::invalid(format!(
                        "leaf {i} references triangles {:?} (count: {})",
                        node.triangles(),
                        triangles.len()
                    )));
                }
            } else {
                let left = node.left as usize;
                if left <= i || left + 1 >= nodes.len() {
                    return Err(Error::invalid(format!(
                        "node {i} has children at {left}/{} (count: {})",
                        left + 1,
                        nodes.len()
                    )));
                }
            }
        }

        let gpu_tris: Vec<GpuTriangle> = triangles.iter().map(Triangle::to_gpu).collect();

        Ok(Self {
            tri_count: gpu_tris.len() as u32,
            node_count: nodes.len() as u32,
            nodes,
            triangles: gpu_tris,
        })
    }

    /// BVH nodes as bytes.
    pub fn nodes_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.nodes)
    }

    /// Triangle data as bytes.
    pub fn triangles_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangles)
    }
}

impl Bvh {
    /// Flatten and pack together with the triangle slice this build reordered.
    pub fn pack(&self, triangles: &[Triangle], capacity: &Capacity) -> Result<SceneBuffers> {
        if triangles.len() != self.tri_count {
            return Err(Error::invalid(format!(
                "BVH was built over {} triangles, got {}",
                self.tri_count,
                triangles.len()
            )));
        }
        SceneBuffers::pack(triangles, self.flatten(), capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bvh::build::build;
    use crate::util::{Aabb, Vec3};

    fn row(n: usize) -> Vec<Triangle> {
        (0..n)
            .map(|i| {
                let o = Vec3::new(i as f32 * 2.0, 0.0, 0.0);
                Triangle::new(o, o + Vec3::X, o + Vec3::Y)
            })
            .collect()
    }

    #[test]
    fn test_pack_sizes() {
        let mut tris = row(20);
        let bvh = build(&mut tris).unwrap();
        let buffers = bvh.pack(&tris, &Capacity::default()).unwrap();

        assert_eq!(buffers.tri_count, 20);
        assert_eq!(buffers.node_count as usize, bvh.node_count());
        assert_eq!(buffers.nodes_bytes().len(), buffers.nodes.len() * 48);
        assert_eq!(buffers.triangles_bytes().len(), 20 * 64);
        assert_eq!(buffers.triangles[0], tris[0].to_gpu());
    }

    #[test]
    fn test_triangle_capacity_exceeded() {
        let mut tris = row(10);
        let bvh = build(&mut tris).unwrap();
        let cap = Capacity {
            max_triangles: 9,
            max_nodes: 1024,
        };
        let err = bvh.pack(&tris, &cap).unwrap_err();
        assert!(matches!(
            err,
            Error::CapacityExceeded { what: "triangles", count: 10, capacity: 9 }
        ));
    }

    #[test]
    fn test_node_capacity_exceeded() {
        let mut tris = row(10);
        let bvh = build(&mut tris).unwrap();
        let cap = Capacity {
            max_triangles: 1024,
            max_nodes: 2,
        };
        assert!(matches!(
            bvh.pack(&tris, &cap),
            Err(Error::CapacityExceeded { what: "nodes", .. })
        ));
        assert!(bvh.pack(&tris, &Capacity::unbounded()).is_ok());
    }

    #[test]
    fn test_mismatched_arrays() {
        let mut tris = row(10);
        let bvh = build(&mut tris).unwrap();
        assert!(bvh.pack(&tris[..5], &Capacity::default()).is_err());

        let b = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let nodes = vec![FlatNode::leaf(&b, 0, 3)];
        assert!(matches!(
            SceneBuffers::pack(&tris[..2], nodes, &Capacity::default()),
            Err(Error::InvalidStructure(_))
        ));
        assert!(SceneBuffers::pack(&tris, Vec::new(), &Capacity::default()).is_err());
    }
}
