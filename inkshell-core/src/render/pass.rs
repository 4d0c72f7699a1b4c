//! Immediate-mode draw passes and the raster state they toggle.

use serde::Serialize;

use super::outline::{OutlineBuffers, OutlineUniforms};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum CullFace {
    Front,
    #[default]
    Back,
}

/// Depth/cull toggles shared by every draw in a rendering context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct RasterState {
    pub depth_test: bool,
    pub cull_enabled: bool,
    pub cull_face: CullFace,
}

impl RasterState {
    /// Inflated shell: only its inside-facing backfaces survive.
    pub const OUTLINE: Self = Self { depth_test: true, cull_enabled: true, cull_face: CullFace::Front };
    pub const SOLID: Self = Self { depth_test: true, cull_enabled: true, cull_face: CullFace::Back };
}

/// Host renderer accepting indexed triangle batches drawn with the outline program.
pub trait ImmediateRenderer {
    fn name(&self) -> &'static str;
    fn raster_state(&self) -> RasterState;
    fn set_raster_state(&mut self, state: RasterState);
    fn draw_indexed(&mut self, buffers: &OutlineBuffers, uniforms: &OutlineUniforms) -> Result<()>;

    fn enable_depth_test(&mut self, enabled: bool) {
        let s = self.raster_state();
        self.set_raster_state(RasterState { depth_test: enabled, ..s });
    }

    fn enable_cull(&mut self, enabled: bool) {
        let s = self.raster_state();
        self.set_raster_state(RasterState { cull_enabled: enabled, ..s });
    }

    fn cull_face(&mut self, face: CullFace) {
        let s = self.raster_state();
        self.set_raster_state(RasterState { cull_face: face, ..s });
    }
}

/// Applies a raster state and resets the renderer to the default state on drop.
struct RasterGuard<'a> {
    renderer: &'a mut dyn ImmediateRenderer,
}

impl<'a> RasterGuard<'a> {
    fn apply(renderer: &'a mut dyn ImmediateRenderer, state: RasterState) -> Self {
        renderer.enable_cull(state.cull_enabled);
        renderer.cull_face(state.cull_face);
        renderer.enable_depth_test(state.depth_test);
        Self { renderer }
    }
}

impl Drop for RasterGuard<'_> {
    fn drop(&mut self) {
        self.renderer.enable_cull(false);
        self.renderer.cull_face(CullFace::Back);
        self.renderer.enable_depth_test(false);
    }
}

/// Draw the outline shell: depth tested, front faces culled, state restored afterwards.
pub fn render_outline(renderer: &mut dyn ImmediateRenderer, buffers: &OutlineBuffers, uniforms: &OutlineUniforms) -> Result<()> {
    if buffers.is_empty() {
        return Ok(());
    }
    let guard = RasterGuard::apply(renderer, RasterState::OUTLINE);
    guard.renderer.draw_indexed(buffers, uniforms)
}

/// Draw the mesh itself with back faces culled and no inflation.
pub fn render_solid(renderer: &mut dyn ImmediateRenderer, buffers: &OutlineBuffers, uniforms: &OutlineUniforms) -> Result<()> {
    if buffers.is_empty() {
        return Ok(());
    }
    let uniforms = OutlineUniforms { width: 0.0, ..*uniforms };
    let guard = RasterGuard::apply(renderer, RasterState::SOLID);
    guard.renderer.draw_indexed(buffers, &uniforms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InkError;
    use crate::render::recorder::RecordingRenderer;
    use glam::Mat4;

    fn triangle() -> OutlineBuffers {
        OutlineBuffers {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            indices: vec![[0, 1, 2]],
        }
    }

    fn uniforms() -> OutlineUniforms {
        OutlineUniforms { matrix_world: Mat4::IDENTITY, perspective_matrix: Mat4::IDENTITY, width: 1.0, color: [0.0, 0.0, 0.0, 1.0] }
    }

    #[test]
    fn outline_draws_with_front_culling_and_restores() {
        let mut r = RecordingRenderer::default();
        render_outline(&mut r, &triangle(), &uniforms()).unwrap();
        assert_eq!(r.calls.len(), 1);
        assert_eq!(r.calls[0].state, RasterState::OUTLINE);
        assert_eq!(r.raster_state(), RasterState::default());
    }

    #[test]
    fn solid_ignores_width() {
        let mut r = RecordingRenderer::default();
        render_solid(&mut r, &triangle(), &uniforms()).unwrap();
        assert_eq!(r.calls[0].state, RasterState::SOLID);
        assert_eq!(r.calls[0].width, 0.0);
    }

    #[test]
    fn empty_buffers_skip_draw() {
        let mut r = RecordingRenderer::default();
        render_outline(&mut r, &OutlineBuffers::default(), &uniforms()).unwrap();
        assert!(r.calls.is_empty());
        assert!(r.state_history.is_empty());
    }

    struct Failing(RasterState);

    impl ImmediateRenderer for Failing {
        fn name(&self) -> &'static str { "failing" }
        fn raster_state(&self) -> RasterState { self.0 }
        fn set_raster_state(&mut self, state: RasterState) { self.0 = state; }
        fn draw_indexed(&mut self, _: &OutlineBuffers, _: &OutlineUniforms) -> Result<()> {
            Err(InkError::InvalidMesh("device lost".into()))
        }
    }

    #[test]
    fn state_restored_when_draw_fails() {
        let mut r = Failing(RasterState::default());
        assert!(render_outline(&mut r, &triangle(), &uniforms()).is_err());
        assert_eq!(r.0, RasterState::default());
    }
}
