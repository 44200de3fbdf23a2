//! Minimal Wavefront `.obj` reader producing an ordered triangle list.
//!
//! Only `v` and `f` records are read. Faces with more than three corners are
//! fan-triangulated; texture/normal references (`1/2/3`, `1//3`) are ignored
//! and face normals come from winding order.

use std::path::Path;

use crate::geom::Triangle;
use crate::util::{Aabb, Error, Result, Vec3};

/// Loader switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Recenter at the origin and scale so the largest dimension is 2.0.
    pub normalize: bool,
}

/// Read and parse an `.obj` file.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_obj(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Vec<Triangle>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    parse_obj(&text, options)
}

/// Parse `.obj` text into triangles in file order.
pub fn parse_obj(text: &str, options: &LoadOptions) -> Result<Vec<Triangle>> {
    let mut vertices: Vec<Vec3> = Vec::new();
    let mut faces: Vec<[usize; 3]> = Vec::new();

    for (n, line) in text.lines().enumerate() {
        let line_no = n + 1;
        let mut parts = line.split_whitespace();
        let Some(kind) = parts.next() else { continue };

        match kind {
            "v" => {
                let mut xyz = [0.0f32; 3];
                for c in &mut xyz {
                    let tok = parts
                        .next()
                        .ok_or_else(|| Error::parse(line_no, "vertex needs 3 coordinates"))?;
                    *c = tok
                        .parse()
                        .map_err(|_| Error::parse(line_no, format!("invalid coordinate '{tok}'")))?;
                }
                vertices.push(Vec3::from_array(xyz));
            }
            "f" => {
                let corners = parts
                    .map(|tok| resolve_index(tok, vertices.len(), line_no))
                    .collect::<Result<Vec<usize>>>()?;
                if corners.len() < 3 {
                    return Err(Error::parse(line_no, "face needs at least 3 vertices"));
                }
                for i in 1..corners.len() - 1 {
                    faces.push([corners[0], corners[i], corners[i + 1]]);
                }
            }
            _ => {}
        }
    }

    if options.normalize {
        normalize(&mut vertices);
    }

    tracing::debug!(vertices = vertices.len(), triangles = faces.len(), "parsed obj");
    Ok(faces
        .into_iter()
        .map(|[a, b, c]| Triangle::new(vertices[a], vertices[b], vertices[c]))
        .collect())
}

/// Resolve a face corner like `7`, `7/1`, `7//2` or `-1` to a 0-based index.
fn resolve_index(token: &str, count: usize, line: usize) -> Result<usize> {
    let head = token.split('/').next().unwrap_or(token);
    let raw: i64 = head
        .parse()
        .map_err(|_| Error::parse(line, format!("invalid face index '{token}'")))?;

    let resolved = if raw > 0 {
        raw - 1
    } else {
        count as i64 + raw
    };
    if raw == 0 || resolved < 0 || resolved >= count as i64 {
        return Err(Error::InvalidIndex { line, index: raw, count });
    }
    Ok(resolved as usize)
}

fn normalize(vertices: &mut [Vec3]) {
    let mut bounds = Aabb::EMPTY;
    for v in vertices.iter() {
        bounds.expand_by_point(*v);
    }
    if bounds.is_empty() {
        return;
    }

    let center = bounds.center();
    let max_dim = bounds.extent().max_element();
    let scale = if max_dim > 0.0 { 2.0 / max_dim } else { 1.0 };
    for v in vertices.iter_mut() {
        *v = (*v - center) * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
f 1 2 3 4
";

    #[test]
    fn test_quad_fan() {
        let tris = parse_obj(QUAD, &LoadOptions::default()).unwrap();
        assert_eq!(tris.len(), 2);
        assert_eq!(tris[0].v0, Vec3::ZERO);
        assert_eq!(tris[0].v2, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(tris[1].v2, Vec3::new(0.0, 1.0, 0.0));
        assert!(tris.iter().all(|t| t.n == Vec3::Z));
    }

    #[test]
    fn test_slash_and_negative_indices() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/1/1 2//2 3/3\nf -3 -2 -1\n";
        let tris = parse_obj(src, &LoadOptions::default()).unwrap();
        assert_eq!(tris.len(), 2);
        assert_eq!(tris[0], tris[1]);
    }

    #[test]
    fn test_bad_input() {
        let opts = LoadOptions::default();
        assert!(matches!(
            parse_obj("v 0 0 0\nf 1 2 3\n", &opts),
            Err(Error::InvalidIndex { line: 2, index: 2, count: 1 })
        ));
        assert!(matches!(parse_obj("v 0 0\n", &opts), Err(Error::Parse { line: 1, .. })));
        assert!(matches!(parse_obj("v 0 x 0\n", &opts), Err(Error::Parse { line: 1, .. })));
        assert!(matches!(
            parse_obj("v 0 0 0\nv 1 0 0\nf 1 2\n", &opts),
            Err(Error::Parse { line: 3, .. })
        ));
        assert!(matches!(
            parse_obj("v 0 0 0\nf 0 1 1\n", &opts),
            Err(Error::InvalidIndex { index: 0, .. })
        ));
    }

    #[test]
    fn test_empty_text() {
        let tris = parse_obj("# nothing here\n\n", &LoadOptions::default()).unwrap();
        assert!(tris.is_empty());
    }

    #[test]
    fn test_normalize() {
        let src = "v 10 10 10\nv 14 10 10\nv 10 12 10\nf 1 2 3\n";
        let tris = parse_obj(src, &LoadOptions { normalize: true }).unwrap();
        let b = tris[0].aabb();
        assert_eq!(b.min, Vec3::new(-1.0, -0.5, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 0.5, 0.0));
    }

    #[test]
    fn test_missing_file() {
        let err = load_obj("/definitely/not/here.obj", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}
