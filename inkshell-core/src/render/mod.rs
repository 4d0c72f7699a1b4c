pub mod outline;
pub mod pass;
pub mod recorder;
pub mod view;

#[cfg(feature = "vulkan")]
pub mod vk;

pub use outline::{build_outline_buffers, BuildOptions, GeometrySource, NormalSampling, OutlineBuffers, OutlineSettings, OutlineUniforms};
pub use pass::{render_outline, render_solid, CullFace, ImmediateRenderer, RasterState};
pub use recorder::RecordingRenderer;
pub use view::{CameraParams, RenderContext};
