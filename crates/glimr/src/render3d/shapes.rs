//! # Shapes — Built-In Mesh Generators
//!
//! Plane, cube, UV sphere and light-frustum geometry, written into
//! caller-provided vectors so a caller rebuilding meshes can reuse its
//! allocations. Every builder clears its outputs first, fills normals, UVs,
//! tangents and bitangents, and winds triangles counter-clockwise seen from
//! outside (matching `FrontFace::Ccw` with back-face culling).
//!
//! ## Tangent Frames
//!
//! Tangents follow the UV layout: the tangent points along increasing U, the
//! bitangent along increasing V. [`generate_tangents`] derives them from the
//! triangle UV deltas and orthonormalises against the normal (Gram-Schmidt).
//! The glTF importer uses the same routine for meshes that ship without
//! tangents, and [`generate_normals`] for meshes without normals.
//!
//! ## Comparison
//!
//! - **three.js**: `BoxGeometry`, `PlaneGeometry`, `SphereGeometry` with
//!   configurable subdivisions. Very similar parameters.
//! - **Bevy**: primitive meshes return owned `Mesh` values instead of filling
//!   caller buffers.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use super::vertex::MeshVertex;

/// Subdivided plane on XZ facing +Y, centred at the origin.
///
/// `tile_u` / `tile_v` scale the UVs so a texture repeats across the plane.
#[allow(clippy::too_many_arguments)]
pub fn plane(
    width: f32,
    depth: f32,
    segments_x: u32,
    segments_z: u32,
    tile_u: f32,
    tile_v: f32,
    vertices: &mut Vec<MeshVertex>,
    indices: &mut Vec<u32>,
) {
    vertices.clear();
    indices.clear();
    let sx = segments_x.max(1);
    let sz = segments_z.max(1);

    for j in 0..=sz {
        let fz = j as f32 / sz as f32;
        for i in 0..=sx {
            let fx = i as f32 / sx as f32;
            vertices.push(MeshVertex::new(
                [-width * 0.5 + width * fx, 0.0, -depth * 0.5 + depth * fz],
                [0.0, 1.0, 0.0],
                [fx * tile_u, fz * tile_v],
            ));
        }
    }

    let row = sx + 1;
    for j in 0..sz {
        for i in 0..sx {
            let a = j * row + i;
            let b = a + 1;
            let c = a + row;
            let d = c + 1;
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }

    generate_tangents(vertices, indices);
}

/// Axis-aligned cube spanning `[-size/2, size/2]³`: 24 vertices (four per
/// face so each face keeps its own normal) and 36 indices.
pub fn cube(size: f32, vertices: &mut Vec<MeshVertex>, indices: &mut Vec<u32>) {
    vertices.clear();
    indices.clear();
    let h = size * 0.5;

    // (normal, u direction, v direction); cross(u, v) == normal.
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
    let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    for (normal, u, v) in faces {
        let base = vertices.len() as u32;
        for ((cu, cv), uv) in corners.iter().zip(uvs) {
            let position = (normal + u * *cu + v * *cv) * h;
            vertices.push(MeshVertex::new(position.to_array(), normal.to_array(), uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    generate_tangents(vertices, indices);
}

/// UV sphere with `rings` latitude rows and `sectors` longitude columns.
///
/// Ring 0 is the south pole and the last ring the north pole; the first and
/// last sector coincide to give the UV seam its own vertices.
pub fn sphere(radius: f32, rings: u32, sectors: u32, vertices: &mut Vec<MeshVertex>, indices: &mut Vec<u32>) {
    vertices.clear();
    indices.clear();
    let rings = rings.max(2);
    let sectors = sectors.max(2);
    let r_step = 1.0 / (rings - 1) as f32;
    let s_step = 1.0 / (sectors - 1) as f32;

    for r in 0..rings {
        let rf = r as f32 * r_step;
        for s in 0..sectors {
            let sf = s as f32 * s_step;
            let y = (-PI * 0.5 + PI * rf).sin();
            let x = (2.0 * PI * sf).cos() * (PI * rf).sin();
            let z = (2.0 * PI * sf).sin() * (PI * rf).sin();
            let dir = Vec3::new(x, y, z);
            vertices.push(MeshVertex::new(
                (dir * radius).to_array(),
                dir.normalize_or(Vec3::Y).to_array(),
                [sf, rf],
            ));
        }
    }

    for r in 0..rings - 1 {
        for s in 0..sectors - 1 {
            let i0 = r * sectors + s;
            let i1 = i0 + 1;
            let i2 = (r + 1) * sectors + s + 1;
            let i3 = (r + 1) * sectors + s;
            indices.extend_from_slice(&[i0, i2, i1, i0, i3, i2]);
        }
    }

    generate_tangents(vertices, indices);
}

/// The eight corners of a directional light's orthographic volume in light
/// view space (`±ortho` in X and Y, `-near` to `-far` in Z), as a closed box
/// for debug drawing.
pub fn light_frustum(ortho_size: f32, near: f32, far: f32, vertices: &mut Vec<MeshVertex>, indices: &mut Vec<u32>) {
    vertices.clear();
    indices.clear();
    let o = ortho_size;
    for z in [-near, -far] {
        for (x, y) in [(-o, -o), (o, -o), (o, o), (-o, o)] {
            vertices.push(MeshVertex::new([x, y, z], [0.0; 3], [0.0; 2]));
        }
    }

    // Near 0..4, far 4..8, each ring counter-clockwise from (-o, -o).
    let quads: [[u32; 4]; 6] = [
        [0, 1, 2, 3],
        [4, 5, 6, 7],
        [0, 1, 5, 4],
        [1, 2, 6, 5],
        [2, 3, 7, 6],
        [3, 0, 4, 7],
    ];
    let centroid = vertices.iter().map(|v| Vec3::from(v.position)).sum::<Vec3>() / 8.0;
    for [a, b, c, d] in quads {
        let pa = Vec3::from(vertices[a as usize].position);
        let pb = Vec3::from(vertices[b as usize].position);
        let pc = Vec3::from(vertices[c as usize].position);
        let outward = (pb - pa).cross(pc - pa).dot(pa - centroid) > 0.0;
        if outward {
            indices.extend_from_slice(&[a, b, c, a, c, d]);
        } else {
            indices.extend_from_slice(&[a, c, b, a, d, c]);
        }
    }

    generate_normals(vertices, indices);
    generate_tangents(vertices, indices);
}

/// Smooth per-vertex normals: the normalised sum of adjacent face normals
/// (area weighted). Vertices with no usable face get +Y.
pub fn generate_normals(vertices: &mut [MeshVertex], indices: &[u32]) {
    let mut sums = vec![Vec3::ZERO; vertices.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let pa = Vec3::from(vertices[a].position);
        let face = (Vec3::from(vertices[b].position) - pa).cross(Vec3::from(vertices[c].position) - pa);
        sums[a] += face;
        sums[b] += face;
        sums[c] += face;
    }
    for (v, n) in vertices.iter_mut().zip(sums) {
        v.normal = n.normalize_or(Vec3::Y).to_array();
    }
}

/// Per-vertex tangent and bitangent from UV gradients, orthonormalised
/// against the vertex normal.
pub fn generate_tangents(vertices: &mut [MeshVertex], indices: &[u32]) {
    let mut tangents = vec![Vec3::ZERO; vertices.len()];
    let mut bitangents = vec![Vec3::ZERO; vertices.len()];

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let p0 = Vec3::from(vertices[i0].position);
        let e1 = Vec3::from(vertices[i1].position) - p0;
        let e2 = Vec3::from(vertices[i2].position) - p0;
        let uv0 = Vec2::from(vertices[i0].uv);
        let d1 = Vec2::from(vertices[i1].uv) - uv0;
        let d2 = Vec2::from(vertices[i2].uv) - uv0;

        let det = d1.x * d2.y - d2.x * d1.y;
        if det.abs() < 1e-12 {
            continue;
        }
        let inv = 1.0 / det;
        let t = (e1 * d2.y - e2 * d1.y) * inv;
        let b = (e2 * d1.x - e1 * d2.x) * inv;
        for i in [i0, i1, i2] {
            tangents[i] += t;
            bitangents[i] += b;
        }
    }

    for ((v, t), b) in vertices.iter_mut().zip(tangents).zip(bitangents) {
        let n = Vec3::from(v.normal).normalize_or(Vec3::Y);
        let mut tangent = (t - n * n.dot(t)).normalize_or_zero();
        if tangent == Vec3::ZERO {
            tangent = n.any_orthonormal_vector();
        }
        let mut bitangent = n.cross(tangent);
        if bitangent.dot(b) < 0.0 {
            bitangent = -bitangent;
        }
        v.tangent = tangent.to_array();
        v.bitangent = bitangent.to_array();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(vertices: &[MeshVertex]) -> (Vec3, Vec3) {
        vertices.iter().fold((Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)), |(lo, hi), v| {
            let p = Vec3::from(v.position);
            (lo.min(p), hi.max(p))
        })
    }

    fn face_normal(vertices: &[MeshVertex], tri: &[u32]) -> Vec3 {
        let p = |i: u32| Vec3::from(vertices[i as usize].position);
        (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]))
    }

    #[test]
    fn cube_of_size_two() {
        let (mut v, mut i) = (Vec::new(), Vec::new());
        cube(2.0, &mut v, &mut i);
        assert_eq!(v.len(), 24);
        assert_eq!(i.len(), 36);

        let (lo, hi) = bounds(&v);
        assert_eq!(lo, Vec3::splat(-1.0));
        assert_eq!(hi, Vec3::splat(1.0));

        for face in v.chunks_exact(4) {
            let n = Vec3::from(face[0].normal);
            assert!((n.length() - 1.0).abs() < 1e-6);
            assert!(face.iter().all(|x| Vec3::from(x.normal) == n));
        }
    }

    #[test]
    fn cube_winds_outward() {
        let (mut v, mut i) = (Vec::new(), Vec::new());
        cube(1.0, &mut v, &mut i);
        for tri in i.chunks_exact(3) {
            let n = Vec3::from(v[tri[0] as usize].normal);
            assert!(face_normal(&v, tri).dot(n) > 0.0);
        }
    }

    #[test]
    fn sphere_radius_and_index_count() {
        let (mut v, mut i) = (Vec::new(), Vec::new());
        sphere(1.0, 8, 8, &mut v, &mut i);
        for vertex in &v {
            let len = Vec3::from(vertex.position).length();
            assert!((len - 1.0).abs() < 1e-5, "vertex off the sphere: {len}");
        }
        assert_eq!(i.len(), 7 * 7 * 6);
        assert!(i.iter().all(|&x| (x as usize) < v.len()));
    }

    #[test]
    fn sphere_winds_outward() {
        let (mut v, mut i) = (Vec::new(), Vec::new());
        sphere(1.0, 16, 16, &mut v, &mut i);
        for tri in i.chunks_exact(3) {
            let n = face_normal(&v, tri);
            if n.length_squared() < 1e-10 {
                continue; // collapsed triangles at the poles
            }
            let centre = tri.iter().map(|&k| Vec3::from(v[k as usize].position)).sum::<Vec3>();
            assert!(n.dot(centre) > 0.0);
        }
    }

    #[test]
    fn plane_counts_and_tiling() {
        let (mut v, mut i) = (Vec::new(), Vec::new());
        plane(10.0, 4.0, 5, 2, 3.0, 1.0, &mut v, &mut i);
        assert_eq!(v.len(), 6 * 3);
        assert_eq!(i.len(), 5 * 2 * 6);
        let max_u = v.iter().map(|x| x.uv[0]).fold(0.0, f32::max);
        assert_eq!(max_u, 3.0);
        for tri in i.chunks_exact(3) {
            assert!(face_normal(&v, tri).y > 0.0);
        }
    }

    #[test]
    fn builders_clear_outputs() {
        let (mut v, mut i) = (Vec::new(), Vec::new());
        cube(1.0, &mut v, &mut i);
        sphere(1.0, 4, 4, &mut v, &mut i);
        assert_eq!(v.len(), 16);
        assert_eq!(i.len(), 3 * 3 * 6);
    }

    #[test]
    fn light_frustum_is_closed_outward_box() {
        let (mut v, mut i) = (Vec::new(), Vec::new());
        light_frustum(5.0, 1.0, 20.0, &mut v, &mut i);
        assert_eq!(v.len(), 8);
        assert_eq!(i.len(), 36);
        let centroid = Vec3::new(0.0, 0.0, -10.5);
        for tri in i.chunks_exact(3) {
            let p0 = Vec3::from(v[tri[0] as usize].position);
            assert!(face_normal(&v, tri).dot(p0 - centroid) > 0.0);
        }
    }

    #[test]
    fn tangent_frames_are_orthonormal() {
        let (mut v, mut i) = (Vec::new(), Vec::new());
        cube(1.0, &mut v, &mut i);
        for x in &v {
            let n = Vec3::from(x.normal);
            let t = Vec3::from(x.tangent);
            let b = Vec3::from(x.bitangent);
            assert!((t.length() - 1.0).abs() < 1e-5);
            assert!(t.dot(n).abs() < 1e-5);
            assert!(b.dot(n).abs() < 1e-5);
        }
    }
}
