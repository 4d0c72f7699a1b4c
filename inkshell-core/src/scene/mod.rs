//! Scene/object model: the context the outline and paint tools operate on.

pub mod modifiers;

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::error::{InkError, Result};
use crate::mesh::{Mesh, VertexGroup};
use crate::render::outline::OutlineSettings;
pub use modifiers::{MeshEvaluator, Modifier, ModifierEvaluator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneId(pub u32);

#[derive(Debug, Clone)]
pub enum ObjectKind {
    Mesh(Mesh),
    Empty,
    Camera,
    Light,
}

impl ObjectKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ObjectKind::Mesh(_) => "MESH",
            ObjectKind::Empty => "EMPTY",
            ObjectKind::Camera => "CAMERA",
            ObjectKind::Light => "LIGHT",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Object {
    pub name: String,
    pub kind: ObjectKind,
    pub matrix_world: Mat4,
    pub vertex_groups: Vec<VertexGroup>,
    pub active_group: Option<usize>,
    pub modifiers: Vec<Modifier>,
}

impl Object {
    pub fn new(name: &str, kind: ObjectKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            matrix_world: Mat4::IDENTITY,
            vertex_groups: Vec::new(),
            active_group: None,
            modifiers: Vec::new(),
        }
    }

    pub fn mesh(name: &str, mesh: Mesh) -> Self { Self::new(name, ObjectKind::Mesh(mesh)) }

    pub fn is_mesh(&self) -> bool { matches!(self.kind, ObjectKind::Mesh(_)) }

    pub fn mesh_data(&self) -> Result<&Mesh> {
        match &self.kind {
            ObjectKind::Mesh(m) => Ok(m),
            _ => Err(InkError::NotAMesh(self.name.clone())),
        }
    }

    pub fn mesh_data_mut(&mut self) -> Result<&mut Mesh> {
        match &mut self.kind {
            ObjectKind::Mesh(m) => Ok(m),
            _ => Err(InkError::NotAMesh(self.name.clone())),
        }
    }

    /// Add a vertex group; the first group becomes active.
    pub fn add_vertex_group(&mut self, group: VertexGroup) -> usize {
        self.vertex_groups.push(group);
        let idx = self.vertex_groups.len() - 1;
        if self.active_group.is_none() {
            self.active_group = Some(idx);
        }
        idx
    }

    pub fn vertex_group(&self, name: &str) -> Result<&VertexGroup> {
        self.vertex_groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| InkError::GroupNotFound(name.to_string()))
    }

    pub fn active_vertex_group(&self) -> Option<&VertexGroup> {
        self.active_group.and_then(|i| self.vertex_groups.get(i))
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub id: SceneId,
    pub objects: Vec<Object>,
    pub active: Option<usize>,
    pub outline: OutlineSettings,
    pub frame: i32,
}

impl Scene {
    pub fn new(id: SceneId) -> Self {
        Self { id, objects: Vec::new(), active: None, outline: OutlineSettings::default(), frame: 1 }
    }

    pub fn add_object(&mut self, object: Object) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn active_object(&self) -> Option<&Object> {
        self.active.and_then(|i| self.objects.get(i))
    }

    pub fn active_object_mut(&mut self) -> Option<&mut Object> {
        self.active.and_then(|i| self.objects.get_mut(i))
    }

    pub fn set_active(&mut self, name: &str) -> Result<()> {
        let idx = self
            .objects
            .iter()
            .position(|o| o.name == name)
            .ok_or_else(|| InkError::ObjectNotFound(name.to_string()))?;
        self.active = Some(idx);
        Ok(())
    }

    pub fn object(&self, name: &str) -> Result<&Object> {
        self.objects
            .iter()
            .find(|o| o.name == name)
            .ok_or_else(|| InkError::ObjectNotFound(name.to_string()))
    }

    pub fn object_mut(&mut self, name: &str) -> Result<&mut Object> {
        self.objects
            .iter_mut()
            .find(|o| o.name == name)
            .ok_or_else(|| InkError::ObjectNotFound(name.to_string()))
    }
}
