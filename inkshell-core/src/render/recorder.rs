//! CPU renderer that records draw calls instead of rasterizing them.

use serde::Serialize;

use super::outline::{OutlineBuffers, OutlineUniforms};
use super::pass::{ImmediateRenderer, RasterState};
use crate::error::Result;

/// Normalized-device-coordinate bounds of the transformed vertices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NdcBounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawCall {
    pub state: RasterState,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub width: f32,
    pub color: [f32; 4],
    /// `None` when every vertex lies behind the viewer.
    pub bounds: Option<NdcBounds>,
}

#[derive(Debug, Default, Serialize)]
pub struct RecordingRenderer {
    state: RasterState,
    pub calls: Vec<DrawCall>,
    pub state_history: Vec<RasterState>,
}

impl RecordingRenderer {
    pub fn new() -> Self { Self::default() }
}

fn ndc_bounds(buffers: &OutlineBuffers, uniforms: &OutlineUniforms) -> Option<NdcBounds> {
    let mut out: Option<NdcBounds> = None;
    for (&p, &n) in buffers.positions.iter().zip(&buffers.normals) {
        let clip = uniforms.transform_vertex(p, n);
        if clip.w <= f32::EPSILON {
            continue;
        }
        let ndc = (clip.truncate() / clip.w).to_array();
        let b = out.get_or_insert(NdcBounds { min: ndc, max: ndc });
        for k in 0..3 {
            b.min[k] = b.min[k].min(ndc[k]);
            b.max[k] = b.max[k].max(ndc[k]);
        }
    }
    out
}

impl ImmediateRenderer for RecordingRenderer {
    fn name(&self) -> &'static str { "recording" }

    fn raster_state(&self) -> RasterState { self.state }

    fn set_raster_state(&mut self, state: RasterState) {
        self.state = state;
        self.state_history.push(state);
    }

    fn draw_indexed(&mut self, buffers: &OutlineBuffers, uniforms: &OutlineUniforms) -> Result<()> {
        buffers.validate()?;
        self.calls.push(DrawCall {
            state: self.state,
            vertex_count: buffers.vertex_count(),
            triangle_count: buffers.triangle_count(),
            width: uniforms.width,
            color: uniforms.color,
            bounds: ndc_bounds(buffers, uniforms),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::pass::render_outline;
    use approx::assert_relative_eq;
    use glam::Mat4;

    #[test]
    fn bounds_grow_with_width() {
        let buffers = OutlineBuffers {
            positions: vec![[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            indices: vec![[0, 1, 2]],
        };
        let mut u = OutlineUniforms { matrix_world: Mat4::IDENTITY, perspective_matrix: Mat4::IDENTITY, width: 0.0, color: [1.0; 4] };
        let mut r = RecordingRenderer::new();
        render_outline(&mut r, &buffers, &u).unwrap();
        u.width = 5.0;
        render_outline(&mut r, &buffers, &u).unwrap();
        let thin = r.calls[0].bounds.unwrap();
        let thick = r.calls[1].bounds.unwrap();
        assert_relative_eq!(thin.max[0], 1.0);
        assert_relative_eq!(thick.max[0], 1.5);
        assert_relative_eq!(thick.min[0], -1.5);
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let buffers = OutlineBuffers { positions: vec![[0.0; 3]], normals: vec![[0.0; 3]], indices: vec![[0, 1, 2]] };
        let u = OutlineUniforms { matrix_world: Mat4::IDENTITY, perspective_matrix: Mat4::IDENTITY, width: 1.0, color: [1.0; 4] };
        let mut r = RecordingRenderer::new();
        assert!(r.draw_indexed(&buffers, &u).is_err());
    }
}
