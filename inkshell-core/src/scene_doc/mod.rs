//! YAML scene documents: objects, outline settings and camera.

pub mod schema;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glam::{EulerRot, Mat4, Quat, Vec3};
use schema::{ObjectData, ObjectDoc, SceneDoc, TransformDoc};

use crate::mesh::{obj, primitives, VertexGroup};
use crate::render::{CameraParams, RenderContext};
use crate::scene::{Object, ObjectKind, Scene, SceneId};

pub fn load_from_yaml_str(s: &str) -> Result<SceneDoc> {
    let doc: SceneDoc = serde_yaml::from_str(s)?;
    Ok(doc)
}

pub fn load_from_json_str(s: &str) -> Result<SceneDoc> {
    let doc: SceneDoc = serde_json::from_str(s)?;
    Ok(doc)
}

/// `.json` files are read as JSON, anything else as YAML.
pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<SceneDoc> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_from_json_str(&data),
        _ => load_from_yaml_str(&data),
    }
    .with_context(|| format!("parsing {}", path.display()))
}

/// A built scene plus the viewer it is looked at from.
pub struct LoadedScene {
    pub scene: Scene,
    pub camera: CameraParams,
    pub view: RenderContext,
}

/// Load a document and build its scene; OBJ paths resolve next to the document.
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<LoadedScene> {
    let doc = load_from_path(path.as_ref())?;
    let base = path.as_ref().parent().map(Path::to_path_buf).unwrap_or_default();
    doc.build(&base)
}

fn matrix(t: &TransformDoc) -> Mat4 {
    let [rx, ry, rz] = t.rotation_deg.map(f32::to_radians);
    Mat4::from_scale_rotation_translation(
        Vec3::from(t.scale),
        Quat::from_euler(EulerRot::XYZ, rx, ry, rz),
        Vec3::from(t.translation),
    )
}

fn build_object(doc: &ObjectDoc, base_dir: &Path) -> Result<Object> {
    let kind = match &doc.data {
        ObjectData::UvSphere { radius, stacks, slices } => ObjectKind::Mesh(primitives::uv_sphere(*radius, *stacks, *slices)?),
        ObjectData::Cube { size } => ObjectKind::Mesh(primitives::cube(*size)?),
        ObjectData::Obj { path } => {
            let full: PathBuf = base_dir.join(path);
            ObjectKind::Mesh(obj::load_from_path(&full).with_context(|| format!("loading {}", full.display()))?)
        }
        ObjectData::Empty => ObjectKind::Empty,
        ObjectData::Camera => ObjectKind::Camera,
        ObjectData::Light => ObjectKind::Light,
    };
    let mut object = Object::new(&doc.name, kind);
    object.matrix_world = matrix(&doc.transform);
    object.modifiers = doc.modifiers.clone();
    for g in &doc.vertex_groups {
        object.add_vertex_group(VertexGroup::from_weights(&g.name, g.weights.iter().map(|(&v, &w)| (v, w))));
    }
    if !doc.color_layers.is_empty() {
        let mesh = object
            .mesh_data_mut()
            .with_context(|| format!("color layers on object '{}'", doc.name))?;
        for c in &doc.color_layers {
            mesh.add_color_layer(&c.name, c.fill);
        }
    }
    Ok(object)
}

impl SceneDoc {
    pub fn build(&self, base_dir: &Path) -> Result<LoadedScene> {
        let mut scene = Scene::new(SceneId(self.id));
        scene.frame = self.frame;
        scene.outline = self.outline;
        for o in &self.objects {
            scene.add_object(build_object(o, base_dir)?);
        }
        if let Some(active) = &self.active {
            scene.set_active(active)?;
        }
        Ok(LoadedScene { scene, camera: self.camera, view: RenderContext::from_camera(&self.camera) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::NormalSampling;
    use crate::scene::Modifier;

    const DOC: &str = r#"
id: 3
active: Ball
outline:
  enabled: true
  width: 2.5
  sampling: per_vertex
objects:
  - name: Ball
    data: { type: uv_sphere, radius: 1.0, stacks: 6, slices: 12 }
    transform: { translation: [0, 1, 0] }
    modifiers:
      - { type: displace, distance: 0.1 }
      - { type: shade_flat }
    vertex_groups:
      - name: Top
        weights: { 0: 1.0, 1: 0.5 }
    color_layers:
      - { name: Col }
  - name: Sun
    data: { type: light }
"#;

    #[test]
    fn parses_and_builds() {
        let doc = load_from_yaml_str(DOC).unwrap();
        assert_eq!(doc.frame, 1);
        assert!(doc.outline.apply_modifiers);
        assert_eq!(doc.outline.sampling, NormalSampling::PerVertex);
        let loaded = doc.build(Path::new(".")).unwrap();
        let scene = loaded.scene;
        assert_eq!(scene.id, SceneId(3));
        let ball = scene.active_object().unwrap();
        assert_eq!(ball.name, "Ball");
        assert_eq!(ball.modifiers[0], Modifier::Displace { distance: 0.1 });
        assert_eq!(ball.vertex_group("Top").unwrap().weight(1).unwrap(), 0.5);
        assert_eq!(ball.matrix_world.w_axis.y, 1.0);
        let layer = ball.mesh_data().unwrap().color_layer("Col").unwrap();
        assert_eq!(layer.data[0], [1.0; 4]);
        assert!(!scene.object("Sun").unwrap().is_mesh());
    }

    #[test]
    fn json_documents() {
        let doc = load_from_json_str(r#"{"active": "C", "objects": [{"name": "C", "data": {"type": "cube", "size": 1.0}}]}"#).unwrap();
        let scene = doc.build(Path::new(".")).unwrap().scene;
        assert_eq!(scene.active_object().unwrap().mesh_data().unwrap().vertex_count(), 8);
        assert!(!scene.outline.enabled);
    }

    #[test]
    fn color_layers_need_a_mesh() {
        let doc = load_from_yaml_str("objects:\n  - name: E\n    data: { type: empty }\n    color_layers: [{ name: Col }]\n").unwrap();
        assert!(doc.build(Path::new(".")).is_err());
    }

    #[test]
    fn unknown_active_object() {
        let doc = load_from_yaml_str("active: Ghost\nobjects: []\n").unwrap();
        assert!(doc.build(Path::new(".")).is_err());
    }
}
