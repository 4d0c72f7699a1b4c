//! Silhouette outline: flat position/normal/index buffers extracted from a mesh,
//! later drawn as a normal-inflated shell with front faces culled.
//! See assets/shaders/outline.vert for the vertex stage.

use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::{InkError, Result};
use crate::mesh::Mesh;
use crate::scene::{MeshEvaluator, Object};

/// Scales the user-facing width into an object-space offset.
pub const OUTLINE_WIDTH_SCALE: f32 = 0.1;

/// Which normal feeds the inflation, and whether vertices are emitted per loop or per vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalSampling {
    /// One output vertex per loop with the loop normal; keeps split/custom normals.
    #[default]
    PerLoop,
    /// One output vertex per mesh vertex with the vertex normal; smaller buffers.
    PerVertex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometrySource {
    /// Post-modifier geometry from the evaluator, dropped when the build returns.
    #[default]
    Evaluated,
    /// The object's stored mesh as-is.
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildOptions {
    pub sampling: NormalSampling,
    pub source: GeometrySource,
}

impl From<&OutlineSettings> for BuildOptions {
    fn from(s: &OutlineSettings) -> Self {
        let source = if s.apply_modifiers { GeometrySource::Evaluated } else { GeometrySource::Raw };
        Self { sampling: s.sampling, source }
    }
}

/// Per-scene outline settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineSettings {
    pub enabled: bool,
    pub width: f32,
    pub color: [f32; 4],
    /// Disable to keep custom normals of the stored mesh.
    pub apply_modifiers: bool,
    pub sampling: NormalSampling,
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self { enabled: false, width: 1.0, color: [0.0, 0.0, 0.0, 1.0], apply_modifiers: true, sampling: NormalSampling::PerLoop }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct OutlineVertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutlineBuffers {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<[u32; 3]>,
}

impl OutlineBuffers {
    pub fn vertex_count(&self) -> usize { self.positions.len() }
    pub fn triangle_count(&self) -> usize { self.indices.len() }
    pub fn is_empty(&self) -> bool { self.indices.is_empty() }

    pub fn validate(&self) -> Result<()> {
        if self.normals.len() != self.positions.len() {
            return Err(InkError::InvalidMesh(format!(
                "{} normals for {} positions", self.normals.len(), self.positions.len()
            )));
        }
        let n = self.positions.len() as u32;
        match self.indices.iter().find(|t| t.iter().any(|&i| i >= n)) {
            Some(t) => Err(InkError::InvalidMesh(format!("triangle {:?} out of range ({})", t, n))),
            None => Ok(()),
        }
    }

    /// Interleaved vertex data for GPU upload.
    pub fn interleaved(&self) -> Vec<OutlineVertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .map(|(&pos, &normal)| OutlineVertex { pos, normal })
            .collect()
    }

    pub fn flat_indices(&self) -> &[u32] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Extract outline buffers from `object`, evaluating modifiers first when requested.
pub fn build_outline_buffers(object: &Object, evaluator: &dyn MeshEvaluator, options: BuildOptions) -> Result<OutlineBuffers> {
    let stored = object.mesh_data()?;
    let mesh: Cow<'_, Mesh> = match options.source {
        GeometrySource::Evaluated => Cow::Owned(evaluator.evaluate(object)?),
        GeometrySource::Raw => Cow::Borrowed(stored),
    };
    Ok(extract_buffers(&mesh, options.sampling))
}

pub fn extract_buffers(mesh: &Mesh, sampling: NormalSampling) -> OutlineBuffers {
    let tris = mesh.triangulated();
    match sampling {
        NormalSampling::PerLoop => {
            let mut positions = Vec::with_capacity(mesh.loops.len());
            let mut normals = Vec::with_capacity(mesh.loops.len());
            for l in &mesh.loops {
                positions.push(mesh.vertices[l.vertex as usize].pos);
                normals.push(l.normal);
            }
            let indices = tris.iter().map(|t| t.loops).collect();
            OutlineBuffers { positions, normals, indices }
        }
        NormalSampling::PerVertex => {
            let positions = mesh.vertices.iter().map(|v| v.pos).collect();
            let normals = mesh.vertices.iter().map(|v| v.normal).collect();
            let indices = tris.iter().map(|t| mesh.triangle_vertices(t)).collect();
            OutlineBuffers { positions, normals, indices }
        }
    }
}

/// Uniform block of the outline program.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutlineUniforms {
    pub matrix_world: Mat4,
    pub perspective_matrix: Mat4,
    pub width: f32,
    pub color: [f32; 4],
}

impl OutlineUniforms {
    pub fn mvp(&self) -> Mat4 { self.perspective_matrix * self.matrix_world }

    /// CPU mirror of the vertex stage: inflate in object space, then project.
    pub fn transform_vertex(&self, pos: [f32; 3], normal: [f32; 3]) -> Vec4 {
        let p = Vec3::from(pos) + Vec3::from(normal) * (OUTLINE_WIDTH_SCALE * self.width);
        self.mvp() * p.extend(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;
    use crate::scene::{Modifier, ModifierEvaluator, ObjectKind};
    use approx::assert_relative_eq;

    fn cube_object() -> Object {
        Object::mesh("Cube", primitives::cube(2.0).unwrap())
    }

    #[test]
    fn per_loop_cardinality() {
        let o = cube_object();
        let b = build_outline_buffers(&o, &ModifierEvaluator, BuildOptions::default()).unwrap();
        assert_eq!(b.vertex_count(), 24);
        assert_eq!(b.normals.len(), 24);
        assert_eq!(b.triangle_count(), 12);
        assert!(b.indices.iter().flatten().all(|&i| i < 24));
        b.validate().unwrap();
    }

    #[test]
    fn per_vertex_cardinality() {
        let o = cube_object();
        let opts = BuildOptions { sampling: NormalSampling::PerVertex, source: GeometrySource::Raw };
        let b = build_outline_buffers(&o, &ModifierEvaluator, opts).unwrap();
        assert_eq!(b.vertex_count(), 8);
        assert_eq!(b.triangle_count(), 12);
        assert!(b.indices.iter().flatten().all(|&i| i < 8));
    }

    #[test]
    fn indices_valid_on_sphere_both_modes() {
        let o = Object::mesh("Sphere", primitives::uv_sphere(1.0, 7, 11).unwrap());
        let mesh = o.mesh_data().unwrap();
        for sampling in [NormalSampling::PerLoop, NormalSampling::PerVertex] {
            let b = extract_buffers(mesh, sampling);
            b.validate().unwrap();
            assert_eq!(b.triangle_count(), mesh.triangulated().len());
        }
    }

    #[test]
    fn per_loop_keeps_split_normals() {
        let o = cube_object();
        let b = extract_buffers(o.mesh_data().unwrap(), NormalSampling::PerLoop);
        // Three output vertices share corner 0's position but carry different normals.
        let corner = o.mesh_data().unwrap().vertices[0].pos;
        let normals: Vec<_> = b.positions.iter().zip(&b.normals).filter(|(p, _)| **p == corner).map(|(_, n)| *n).collect();
        assert_eq!(normals.len(), 3);
        assert!(normals[0] != normals[1] && normals[1] != normals[2]);
    }

    #[test]
    fn evaluated_source_applies_modifiers() {
        let mut o = cube_object();
        o.modifiers.push(Modifier::Displace { distance: 1.0 });
        let raw = build_outline_buffers(&o, &ModifierEvaluator, BuildOptions { source: GeometrySource::Raw, ..Default::default() }).unwrap();
        let eval = build_outline_buffers(&o, &ModifierEvaluator, BuildOptions::default()).unwrap();
        assert_ne!(raw.positions, eval.positions);
        assert_eq!(o.mesh_data().unwrap().vertices[0].pos, [-1.0, -1.0, -1.0]);
    }

    #[test]
    fn non_mesh_is_rejected() {
        let o = Object::new("Empty", ObjectKind::Empty);
        assert!(matches!(build_outline_buffers(&o, &ModifierEvaluator, BuildOptions::default()), Err(InkError::NotAMesh(_))));
    }

    #[test]
    fn vertex_stage_inflates_by_tenth_of_width() {
        let u = OutlineUniforms { matrix_world: Mat4::IDENTITY, perspective_matrix: Mat4::IDENTITY, width: 2.0, color: [0.0; 4] };
        let p = u.transform_vertex([1.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        assert_relative_eq!(p.x, 1.2, epsilon = 1e-6);
        assert_relative_eq!(p.w, 1.0);
    }

    #[test]
    fn inflation_happens_before_world_transform() {
        let u = OutlineUniforms {
            matrix_world: Mat4::from_scale(Vec3::splat(10.0)),
            perspective_matrix: Mat4::IDENTITY,
            width: 1.0,
            color: [0.0; 4],
        };
        let p = u.transform_vertex([0.0, 1.0, 0.0], [0.0, 1.0, 0.0]);
        assert_relative_eq!(p.y, 11.0, epsilon = 1e-5);
    }

    #[test]
    fn settings_defaults() {
        let s = OutlineSettings::default();
        assert!(!s.enabled);
        assert_eq!(s.color, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(BuildOptions::from(&s).source, GeometrySource::Evaluated);
    }
}
