//! Vertex color tools: copy vertex-group weights into a color channel, or fill channels.
//!
//! Both tools read and write the same explicitly named color layer, so changing the
//! active layer never redirects a write.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{InkError, Result};
use crate::mesh::{Mesh, VertexGroup};
use crate::scene::{Object, ObjectKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    R,
    G,
    B,
    A,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::R, Channel::G, Channel::B, Channel::A];

    pub fn index(self) -> usize {
        match self {
            Channel::R => 0,
            Channel::G => 1,
            Channel::B => 2,
            Channel::A => 3,
        }
    }
}

impl FromStr for Channel {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "r" | "red" => Ok(Channel::R),
            "g" | "green" => Ok(Channel::G),
            "b" | "blue" => Ok(Channel::B),
            "a" | "alpha" => Ok(Channel::A),
            other => Err(format!("unknown color channel '{}'", other)),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(["R", "G", "B", "A"][self.index()])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlendMode {
    #[default]
    Replace,
    Multiply,
}

impl BlendMode {
    pub fn blend(self, old: f32, src: f32) -> f32 {
        match self {
            BlendMode::Replace => src,
            BlendMode::Multiply => old * src,
        }
    }
}

impl FromStr for BlendMode {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "replace" => Ok(BlendMode::Replace),
            "multiply" => Ok(BlendMode::Multiply),
            other => Err(format!("unknown blend mode '{}'", other)),
        }
    }
}

/// Parse a channel mask such as `RGBA`, `RB` or `A`.
pub fn parse_channel_mask(s: &str) -> std::result::Result<[bool; 4], String> {
    let mut mask = [false; 4];
    for c in s.chars() {
        mask[c.to_string().parse::<Channel>()?.index()] = true;
    }
    Ok(mask)
}

/// Blend each loop's vertex weight from `group` into `channel` of the named layer.
///
/// Vertices missing from the group count as weight 0. Returns the number of loops written.
pub fn write_weight_to_channel(mesh: &mut Mesh, layer: &str, group: &VertexGroup, channel: Channel, blend: BlendMode) -> Result<usize> {
    let Mesh { loops, polygons, color_layers, .. } = mesh;
    let target = color_layers
        .iter_mut()
        .find(|c| c.name == layer)
        .ok_or_else(|| InkError::LayerNotFound(layer.to_string()))?;

    let ch = channel.index();
    let mut written = 0;
    let mut missing = 0;
    for poly in polygons.iter() {
        for loop_id in poly.loop_indices() {
            let vertex = loops[loop_id as usize].vertex;
            let weight = group.weight(vertex).unwrap_or_else(|_| {
                missing += 1;
                0.0
            });
            let color = &mut target.data[loop_id as usize];
            color[ch] = blend.blend(color[ch], weight);
            written += 1;
        }
    }
    if missing > 0 {
        log::debug!("{} loops had no weight in group '{}', used 0", missing, group.name);
    }
    Ok(written)
}

/// Blend `fill_color` into every channel enabled in `mask` of the named layer.
pub fn fill_channels(mesh: &mut Mesh, layer: &str, fill_color: [f32; 4], mask: [bool; 4], blend: BlendMode) -> Result<usize> {
    let Mesh { polygons, color_layers, .. } = mesh;
    let target = color_layers
        .iter_mut()
        .find(|c| c.name == layer)
        .ok_or_else(|| InkError::LayerNotFound(layer.to_string()))?;

    let mut written = 0;
    for poly in polygons.iter() {
        for loop_id in poly.loop_indices() {
            let color = &mut target.data[loop_id as usize];
            for c in 0..4 {
                if mask[c] {
                    color[c] = blend.blend(color[c], fill_color[c]);
                }
            }
            written += 1;
        }
    }
    Ok(written)
}

/// "Copy weights to vertex colors" command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightsToColors {
    pub group: String,
    pub layer: String,
    pub channel: Channel,
    pub blend: BlendMode,
}

impl WeightsToColors {
    /// Defaults taken from the object: active vertex group, active color layer, R, replace.
    pub fn invoke(object: &Object) -> Result<Self> {
        let mesh = object.mesh_data()?;
        let group = object
            .active_vertex_group()
            .ok_or_else(|| InkError::GroupNotFound("<active>".into()))?;
        let layer = mesh
            .active_color_layer()
            .ok_or_else(|| InkError::LayerNotFound("<active>".into()))?;
        Ok(Self { group: group.name.clone(), layer: layer.name.clone(), channel: Channel::R, blend: BlendMode::Replace })
    }

    pub fn execute(&self, object: &mut Object) -> Result<usize> {
        let Object { name, kind, vertex_groups, .. } = object;
        let ObjectKind::Mesh(mesh) = kind else {
            return Err(InkError::NotAMesh(name.clone()));
        };
        let group = vertex_groups
            .iter()
            .find(|g| g.name == self.group)
            .ok_or_else(|| InkError::GroupNotFound(self.group.clone()))?;
        let n = write_weight_to_channel(mesh, &self.layer, group, self.channel, self.blend)?;
        log::info!("'{}': group '{}' -> {}.{} ({:?}), {} loops", name, self.group, self.layer, self.channel, self.blend, n);
        Ok(n)
    }
}

/// "Fill vertex colors" command. Without a layer name it targets the active layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillColors {
    pub color: [f32; 4],
    pub channels: [bool; 4],
    pub blend: BlendMode,
    pub layer: Option<String>,
}

impl Default for FillColors {
    fn default() -> Self {
        Self { color: [1.0; 4], channels: [true; 4], blend: BlendMode::Replace, layer: None }
    }
}

impl FillColors {
    pub fn execute(&self, object: &mut Object) -> Result<usize> {
        let name = object.name.clone();
        let mesh = object.mesh_data_mut()?;
        let layer = match &self.layer {
            Some(l) => l.clone(),
            None => mesh
                .active_color_layer()
                .map(|c| c.name.clone())
                .ok_or_else(|| InkError::LayerNotFound("<active>".into()))?,
        };
        let n = fill_channels(mesh, &layer, self.color, self.channels, self.blend)?;
        log::info!("'{}': filled {} {:?} ({:?}), {} loops", name, layer, self.channels, self.blend, n);
        Ok(n)
    }
}
