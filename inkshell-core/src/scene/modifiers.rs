//! Modifier stack evaluation: produces the post-modifier mesh of an object.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::Object;
use crate::error::Result;
use crate::mesh::Mesh;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Modifier {
    /// Push every vertex along its normal.
    Displace { distance: f32 },
    ShadeFlat,
    ShadeSmooth,
    Triangulate,
}

impl Modifier {
    fn apply(&self, mesh: &mut Mesh) {
        match *self {
            Modifier::Displace { distance } => {
                for v in &mut mesh.vertices {
                    let p = Vec3::from(v.pos) + Vec3::from(v.normal) * distance;
                    v.pos = p.to_array();
                }
            }
            Modifier::ShadeFlat => mesh.set_smooth(false),
            Modifier::ShadeSmooth => mesh.set_smooth(true),
            Modifier::Triangulate => mesh.triangulate(),
        }
        mesh.calc_normals();
    }
}

/// Resolves an object's final geometry. The returned mesh is owned by the caller.
pub trait MeshEvaluator {
    fn evaluate(&self, object: &Object) -> Result<Mesh>;
}

/// Applies the object's modifier stack in order to a copy of its mesh.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModifierEvaluator;

impl MeshEvaluator for ModifierEvaluator {
    fn evaluate(&self, object: &Object) -> Result<Mesh> {
        let mut mesh = object.mesh_data()?.clone();
        for m in &object.modifiers {
            m.apply(&mut mesh);
        }
        mesh.calc_loop_triangles();
        log::debug!(
            "evaluated '{}': {} modifiers, {} loops, {} triangles",
            object.name, object.modifiers.len(), mesh.loop_count(), mesh.loop_triangles.len()
        );
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InkError;
    use crate::mesh::primitives;
    use crate::scene::ObjectKind;
    use approx::assert_relative_eq;

    #[test]
    fn displace_grows_sphere() {
        let mut o = Object::mesh("Sphere", primitives::uv_sphere(1.0, 8, 16).unwrap());
        o.modifiers.push(Modifier::Displace { distance: 0.5 });
        let evaluated = ModifierEvaluator.evaluate(&o).unwrap();
        assert_relative_eq!(Vec3::from(evaluated.vertices[0].pos).length(), 1.5, epsilon = 1e-5);
        // The stored mesh is untouched.
        assert_relative_eq!(Vec3::from(o.mesh_data().unwrap().vertices[0].pos).length(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn shade_smooth_changes_loop_normals() {
        let mut o = Object::mesh("Cube", primitives::cube(2.0).unwrap());
        o.modifiers.push(Modifier::ShadeSmooth);
        let m = ModifierEvaluator.evaluate(&o).unwrap();
        let l = m.loops[0];
        assert_eq!(l.normal, m.vertices[l.vertex as usize].normal);
    }

    #[test]
    fn triangulate_then_cache() {
        let mut o = Object::mesh("Cube", primitives::cube(2.0).unwrap());
        o.modifiers.push(Modifier::Triangulate);
        let m = ModifierEvaluator.evaluate(&o).unwrap();
        assert_eq!(m.polygon_count(), 12);
        assert_eq!(m.loop_triangles.len(), 12);
    }

    #[test]
    fn non_mesh_fails() {
        let o = Object::new("Empty", ObjectKind::Empty);
        assert!(matches!(ModifierEvaluator.evaluate(&o), Err(InkError::NotAMesh(_))));
    }
}
