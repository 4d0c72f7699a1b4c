//! Procedural meshes used by scene documents and tests.

use super::Mesh;
use crate::error::Result;

// UV sphere centered at origin with shared pole vertices.
// stacks: latitude segments (>= 3), slices: longitude segments (>= 3)
pub fn uv_sphere(radius: f32, stacks: u32, slices: u32) -> Result<Mesh> {
    let stacks = stacks.max(3);
    let slices = slices.max(3);
    let mut positions = Vec::with_capacity(((stacks - 1) * slices + 2) as usize);
    let mut faces = Vec::with_capacity((stacks * slices) as usize);

    positions.push([0.0, radius, 0.0]);
    for i in 1..stacks {
        let theta = i as f32 / stacks as f32 * std::f32::consts::PI; // 0..PI
        let (sin_t, cos_t) = theta.sin_cos();
        for j in 0..slices {
            let phi = j as f32 / slices as f32 * std::f32::consts::PI * 2.0; // 0..2PI
            let (sin_p, cos_p) = phi.sin_cos();
            positions.push([radius * sin_t * cos_p, radius * cos_t, radius * sin_t * sin_p]);
        }
    }
    positions.push([0.0, -radius, 0.0]);
    let south = positions.len() as u32 - 1;

    let ring = |i: u32, j: u32| 1 + (i - 1) * slices + j % slices;
    for j in 0..slices {
        faces.push(vec![0, ring(1, j + 1), ring(1, j)]);
    }
    for i in 1..stacks - 1 {
        for j in 0..slices {
            faces.push(vec![ring(i, j), ring(i, j + 1), ring(i + 1, j + 1), ring(i + 1, j)]);
        }
    }
    for j in 0..slices {
        faces.push(vec![ring(stacks - 1, j), ring(stacks - 1, j + 1), south]);
    }

    Mesh::from_polygons(&positions, &faces, true)
}

/// Axis-aligned cube with flat shading, so every corner carries its face normal.
pub fn cube(size: f32) -> Result<Mesh> {
    let h = size * 0.5;
    let positions = [
        [-h, -h, -h], [h, -h, -h], [h, h, -h], [-h, h, -h],
        [-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h],
    ];
    let faces = [
        vec![0, 3, 2, 1],
        vec![4, 5, 6, 7],
        vec![0, 1, 5, 4],
        vec![3, 7, 6, 2],
        vec![0, 4, 7, 3],
        vec![1, 2, 6, 5],
    ];
    Mesh::from_polygons(&positions, &faces, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec3;

    #[test]
    fn sphere_topology() {
        let m = uv_sphere(1.0, 4, 8).unwrap();
        assert_eq!(m.vertex_count(), 3 * 8 + 2);
        assert_eq!(m.polygon_count(), 4 * 8);
        assert_eq!(m.loop_count(), 8 * 3 * 2 + 2 * 8 * 4);
    }

    #[test]
    fn sphere_normals_point_outward() {
        let m = uv_sphere(2.0, 8, 16).unwrap();
        for v in &m.vertices {
            let p = Vec3::from(v.pos).normalize();
            assert!(p.dot(Vec3::from(v.normal)) > 0.9);
        }
    }

    #[test]
    fn cube_has_split_normals() {
        let m = cube(2.0).unwrap();
        assert_eq!(m.vertex_count(), 8);
        assert_eq!(m.loop_count(), 24);
        // Vertex 0 is shared by three faces, each contributing a distinct axis normal.
        let corner: Vec<[f32; 3]> = m.loops.iter().filter(|l| l.vertex == 0).map(|l| l.normal).collect();
        assert_eq!(corner.len(), 3);
        assert!(corner.contains(&[0.0, 0.0, -1.0]));
        assert!(corner.contains(&[0.0, -1.0, 0.0]));
        assert!(corner.contains(&[-1.0, 0.0, 0.0]));
        let vn = Vec3::from(m.vertices[0].normal);
        assert_relative_eq!(vn.length(), 1.0, epsilon = 1e-6);
        assert!(vn.x < 0.0 && vn.y < 0.0 && vn.z < 0.0);
    }
}
