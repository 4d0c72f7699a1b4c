use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::render::{CameraParams, OutlineSettings};
use crate::scene::Modifier;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDoc {
    #[serde(default)]
    pub id: u32,
    #[serde(default = "default_frame")]
    pub frame: i32,
    pub active: Option<String>,
    #[serde(default)]
    pub camera: CameraParams,
    #[serde(default)]
    pub outline: OutlineSettings,
    pub objects: Vec<ObjectDoc>,
}

fn default_frame() -> i32 { 1 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDoc {
    pub name: String,
    pub data: ObjectData,
    #[serde(default)]
    pub transform: TransformDoc,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub vertex_groups: Vec<VertexGroupDoc>,
    #[serde(default)]
    pub color_layers: Vec<ColorLayerDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectData {
    UvSphere { radius: f32, stacks: u32, slices: u32 },
    Cube { size: f32 },
    /// Path relative to the scene document.
    Obj { path: String },
    Empty,
    Camera,
    Light,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformDoc {
    pub translation: [f32; 3],
    /// XYZ Euler angles.
    pub rotation_deg: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for TransformDoc {
    fn default() -> Self {
        Self { translation: [0.0; 3], rotation_deg: [0.0; 3], scale: [1.0; 3] }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexGroupDoc {
    pub name: String,
    #[serde(default)]
    pub weights: BTreeMap<u32, f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorLayerDoc {
    pub name: String,
    #[serde(default = "default_fill")]
    pub fill: [f32; 4],
}

fn default_fill() -> [f32; 4] { [1.0; 4] }
