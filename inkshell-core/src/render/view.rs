//! Viewer state handed to draw callbacks.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Perspective camera as written in scene documents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self { eye: [0.0, 1.5, 6.0], target: [0.0; 3], fov_y_deg: 45.0, aspect: 1.0, near: 0.1, far: 100.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    pub view: Mat4,
    pub projection: Mat4,
}

impl RenderContext {
    pub fn from_camera(c: &CameraParams) -> Self {
        let view = Mat4::look_at_rh(Vec3::from(c.eye), Vec3::from(c.target), Vec3::Y);
        let projection = Mat4::perspective_rh(c.fov_y_deg.to_radians(), c.aspect, c.near, c.far);
        Self { view, projection }
    }

    /// Combined projection * view, the matrix the outline program expects.
    pub fn perspective_matrix(&self) -> Mat4 {
        self.projection * self.view
    }
}

impl Default for RenderContext {
    fn default() -> Self { Self::from_camera(&CameraParams::default()) }
}
