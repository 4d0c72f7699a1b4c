//! Polygon mesh with per-corner (loop) data, triangulation and normals.

pub mod attributes;
pub mod obj;
pub mod primitives;

use std::borrow::Cow;
use std::ops::Range;

use glam::Vec3;

use crate::error::{InkError, Result};
pub use attributes::{ColorLayer, VertexGroup};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
}

/// One polygon corner. Carries its own normal so hard edges survive at shared vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loop {
    pub vertex: u32,
    pub normal: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polygon {
    pub loop_start: u32,
    pub loop_total: u32,
    pub smooth: bool,
}

impl Polygon {
    pub fn loop_indices(&self) -> Range<u32> {
        self.loop_start..self.loop_start + self.loop_total
    }
}

/// Triangle referencing three loops of one polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTriangle {
    pub loops: [u32; 3],
    pub polygon: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub loops: Vec<Loop>,
    pub polygons: Vec<Polygon>,
    /// Cached triangulation; empty until [`Mesh::calc_loop_triangles`] runs.
    pub loop_triangles: Vec<LoopTriangle>,
    /// When set, loop normals are authored data and [`Mesh::calc_normals`] keeps them.
    pub custom_normals: bool,
    pub color_layers: Vec<ColorLayer>,
    pub active_color: Option<usize>,
}

impl Mesh {
    /// Build a mesh from positions and polygon corner lists, then compute normals.
    pub fn from_polygons(positions: &[[f32; 3]], faces: &[Vec<u32>], smooth: bool) -> Result<Self> {
        let vertices = positions.iter().map(|&pos| MeshVertex { pos, normal: [0.0; 3] }).collect();
        let loop_count = faces.iter().map(Vec::len).sum();
        let mut loops = Vec::with_capacity(loop_count);
        let mut polygons = Vec::with_capacity(faces.len());
        for (i, face) in faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(InkError::InvalidMesh(format!("polygon {} has {} corners", i, face.len())));
            }
            polygons.push(Polygon { loop_start: loops.len() as u32, loop_total: face.len() as u32, smooth });
            loops.extend(face.iter().map(|&vertex| Loop { vertex, normal: [0.0; 3] }));
        }
        let mut mesh = Self { vertices, loops, polygons, ..Default::default() };
        mesh.validate()?;
        mesh.calc_normals();
        Ok(mesh)
    }

    pub fn vertex_count(&self) -> usize { self.vertices.len() }
    pub fn loop_count(&self) -> usize { self.loops.len() }
    pub fn polygon_count(&self) -> usize { self.polygons.len() }

    /// Check that every loop, polygon range and cached triangle points at existing data.
    pub fn validate(&self) -> Result<()> {
        let nv = self.vertices.len() as u32;
        let nl = self.loops.len() as u32;
        if let Some((i, l)) = self.loops.iter().enumerate().find(|(_, l)| l.vertex >= nv) {
            return Err(InkError::InvalidMesh(format!("loop {} references vertex {} of {}", i, l.vertex, nv)));
        }
        for (i, p) in self.polygons.iter().enumerate() {
            if p.loop_total < 3 || p.loop_start + p.loop_total > nl {
                return Err(InkError::InvalidMesh(format!("polygon {} has loop range {:?} of {}", i, p.loop_indices(), nl)));
            }
        }
        if let Some(t) = self.loop_triangles.iter().find(|t| t.loops.iter().any(|&l| l >= nl)) {
            return Err(InkError::InvalidMesh(format!("loop triangle {:?} out of range", t.loops)));
        }
        for layer in &self.color_layers {
            if layer.data.len() != self.loops.len() {
                return Err(InkError::InvalidMesh(format!(
                    "color layer '{}' has {} entries for {} loops", layer.name, layer.data.len(), nl
                )));
            }
        }
        Ok(())
    }

    /// Fan-triangulate every polygon into [`Mesh::loop_triangles`].
    pub fn calc_loop_triangles(&mut self) {
        self.loop_triangles = self.fan_triangles();
    }

    /// Cached triangles when present, otherwise a fresh triangulation.
    pub fn triangulated(&self) -> Cow<'_, [LoopTriangle]> {
        if self.loop_triangles.is_empty() {
            Cow::Owned(self.fan_triangles())
        } else {
            Cow::Borrowed(&self.loop_triangles)
        }
    }

    fn fan_triangles(&self) -> Vec<LoopTriangle> {
        let count = self.polygons.iter().map(|p| p.loop_total as usize - 2).sum();
        let mut tris = Vec::with_capacity(count);
        for (pi, p) in self.polygons.iter().enumerate() {
            let first = p.loop_start;
            for k in 1..p.loop_total - 1 {
                tris.push(LoopTriangle { loops: [first, first + k, first + k + 1], polygon: pi as u32 });
            }
        }
        tris
    }

    pub fn triangle_vertices(&self, tri: &LoopTriangle) -> [u32; 3] {
        tri.loops.map(|l| self.loops[l as usize].vertex)
    }

    /// Newell normal of a polygon; its length is twice the polygon area.
    fn polygon_area_normal(&self, p: &Polygon) -> Vec3 {
        let mut n = Vec3::ZERO;
        let range = p.loop_indices();
        for l in range.clone() {
            let next = if l + 1 == range.end { range.start } else { l + 1 };
            let a = Vec3::from(self.vertices[self.loops[l as usize].vertex as usize].pos);
            let b = Vec3::from(self.vertices[self.loops[next as usize].vertex as usize].pos);
            n += Vec3::new((a.y - b.y) * (a.z + b.z), (a.z - b.z) * (a.x + b.x), (a.x - b.x) * (a.y + b.y));
        }
        n
    }

    pub fn polygon_normal(&self, polygon: usize) -> Vec3 {
        self.polygon_area_normal(&self.polygons[polygon]).normalize_or_zero()
    }

    /// Recompute area-weighted vertex normals and, unless the mesh has custom
    /// normals, loop normals (vertex normal on smooth polygons, face normal on flat ones).
    pub fn calc_normals(&mut self) {
        let face_normals: Vec<Vec3> = self.polygons.iter().map(|p| self.polygon_area_normal(p)).collect();
        let mut accum = vec![Vec3::ZERO; self.vertices.len()];
        for (p, fnorm) in self.polygons.iter().zip(&face_normals) {
            for l in p.loop_indices() {
                accum[self.loops[l as usize].vertex as usize] += *fnorm;
            }
        }
        for (v, n) in self.vertices.iter_mut().zip(&accum) {
            v.normal = n.normalize_or_zero().to_array();
        }
        if self.custom_normals {
            return;
        }
        for (p, fnorm) in self.polygons.iter().zip(&face_normals) {
            let flat = fnorm.normalize_or_zero().to_array();
            for l in p.loop_indices() {
                let lp = &mut self.loops[l as usize];
                lp.normal = if p.smooth { self.vertices[lp.vertex as usize].normal } else { flat };
            }
        }
    }

    /// Author split normals, one per loop. They survive later [`Mesh::calc_normals`] calls.
    pub fn set_custom_normals(&mut self, normals: &[[f32; 3]]) -> Result<()> {
        if normals.len() != self.loops.len() {
            return Err(InkError::InvalidMesh(format!(
                "{} custom normals for {} loops", normals.len(), self.loops.len()
            )));
        }
        for (l, n) in self.loops.iter_mut().zip(normals) {
            l.normal = Vec3::from(*n).normalize_or_zero().to_array();
        }
        self.custom_normals = true;
        Ok(())
    }

    pub fn set_smooth(&mut self, smooth: bool) {
        for p in &mut self.polygons {
            p.smooth = smooth;
        }
    }

    /// Replace every polygon with its fan triangles, carrying loop normals and colors along.
    pub fn triangulate(&mut self) {
        let tris = self.fan_triangles();
        let mut loops = Vec::with_capacity(tris.len() * 3);
        let mut polygons = Vec::with_capacity(tris.len());
        let mut layers: Vec<Vec<[f32; 4]>> = self.color_layers.iter().map(|_| Vec::with_capacity(tris.len() * 3)).collect();
        for t in &tris {
            polygons.push(Polygon {
                loop_start: loops.len() as u32,
                loop_total: 3,
                smooth: self.polygons[t.polygon as usize].smooth,
            });
            for &l in &t.loops {
                loops.push(self.loops[l as usize]);
                for (dst, src) in layers.iter_mut().zip(&self.color_layers) {
                    dst.push(src.data[l as usize]);
                }
            }
        }
        for (layer, data) in self.color_layers.iter_mut().zip(layers) {
            layer.data = data;
        }
        self.loops = loops;
        self.polygons = polygons;
        self.loop_triangles.clear();
    }

    /// Add a color layer filled with `fill`; the first layer becomes active.
    pub fn add_color_layer(&mut self, name: &str, fill: [f32; 4]) -> usize {
        self.color_layers.push(ColorLayer::new(name, self.loops.len(), fill));
        let idx = self.color_layers.len() - 1;
        if self.active_color.is_none() {
            self.active_color = Some(idx);
        }
        idx
    }

    pub fn color_layer(&self, name: &str) -> Option<&ColorLayer> {
        self.color_layers.iter().find(|c| c.name == name)
    }

    pub fn color_layer_mut(&mut self, name: &str) -> Result<&mut ColorLayer> {
        self.color_layers
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| InkError::LayerNotFound(name.to_string()))
    }

    pub fn active_color_layer(&self) -> Option<&ColorLayer> {
        self.active_color.and_then(|i| self.color_layers.get(i))
    }

    pub fn set_active_color(&mut self, name: &str) -> Result<()> {
        let idx = self
            .color_layers
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| InkError::LayerNotFound(name.to_string()))?;
        self.active_color = Some(idx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> Mesh {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        Mesh::from_polygons(&positions, &[vec![0, 1, 2, 3]], false).unwrap()
    }

    #[test]
    fn fan_triangulation_counts() {
        let mut m = quad();
        assert!(m.loop_triangles.is_empty());
        assert_eq!(m.triangulated().len(), 2);
        m.calc_loop_triangles();
        assert_eq!(m.loop_triangles[1].loops, [0, 2, 3]);
        assert!(matches!(m.triangulated(), Cow::Borrowed(_)));
    }

    #[test]
    fn flat_quad_normals_point_up() {
        let m = quad();
        assert_relative_eq!(m.polygon_normal(0).z, 1.0);
        for l in &m.loops {
            assert_relative_eq!(l.normal[2], 1.0);
        }
    }

    #[test]
    fn rejects_out_of_range_vertex() {
        let err = Mesh::from_polygons(&[[0.0; 3]; 3], &[vec![0, 1, 7]], true).unwrap_err();
        assert!(matches!(err, InkError::InvalidMesh(_)));
    }

    #[test]
    fn rejects_degenerate_polygon() {
        assert!(Mesh::from_polygons(&[[0.0; 3]; 3], &[vec![0, 1]], true).is_err());
    }

    #[test]
    fn custom_normals_survive_recalc() {
        let mut m = quad();
        m.set_custom_normals(&[[1.0, 0.0, 0.0]; 4]).unwrap();
        m.calc_normals();
        assert_eq!(m.loops[2].normal, [1.0, 0.0, 0.0]);
        assert_relative_eq!(m.vertices[2].normal[2], 1.0);
    }

    #[test]
    fn triangulate_carries_colors() {
        let mut m = quad();
        m.add_color_layer("Col", [0.5; 4]);
        m.color_layer_mut("Col").unwrap().data[3] = [1.0, 0.0, 0.0, 1.0];
        m.triangulate();
        assert_eq!(m.polygon_count(), 2);
        assert_eq!(m.loop_count(), 6);
        let layer = m.color_layer("Col").unwrap();
        assert_eq!(layer.data.len(), 6);
        assert_eq!(layer.data[5], [1.0, 0.0, 0.0, 1.0]);
        m.validate().unwrap();
    }

    #[test]
    fn first_color_layer_becomes_active() {
        let mut m = quad();
        m.add_color_layer("A", [1.0; 4]);
        m.add_color_layer("B", [0.0; 4]);
        assert_eq!(m.active_color_layer().unwrap().name, "A");
        m.set_active_color("B").unwrap();
        assert_eq!(m.active_color_layer().unwrap().name, "B");
        assert!(matches!(m.set_active_color("C"), Err(InkError::LayerNotFound(_))));
    }
}
