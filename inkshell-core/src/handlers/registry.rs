//! One outline callback per scene, rebuilt on every trigger.

use std::collections::HashMap;

use glam::Mat4;

use super::{DrawCallback, DrawHandle, DrawHandlers, Trigger};
use crate::error::{InkError, Result};
use crate::render::{build_outline_buffers, render_outline, BuildOptions, ImmediateRenderer, OutlineBuffers, OutlineSettings, OutlineUniforms, RenderContext};
use crate::scene::{MeshEvaluator, Object, Scene, SceneId};

/// Draw callback owning the buffers of one outline build.
pub struct OutlineDraw {
    pub object: String,
    pub buffers: OutlineBuffers,
    pub matrix_world: Mat4,
    pub width: f32,
    pub color: [f32; 4],
}

impl OutlineDraw {
    pub fn new(object: &Object, buffers: OutlineBuffers, settings: &OutlineSettings) -> Self {
        Self {
            object: object.name.clone(),
            buffers,
            matrix_world: object.matrix_world,
            width: settings.width,
            color: settings.color,
        }
    }
}

impl DrawCallback for OutlineDraw {
    fn draw(&self, renderer: &mut dyn ImmediateRenderer, view: &RenderContext) -> Result<()> {
        let uniforms = OutlineUniforms {
            matrix_world: self.matrix_world,
            perspective_matrix: view.perspective_matrix(),
            width: self.width,
            color: self.color,
        };
        render_outline(renderer, &self.buffers, &uniforms)
    }

    fn label(&self) -> &str { &self.object }
}

/// Maps each scene to its single live outline callback.
#[derive(Debug, Default)]
pub struct OutlineRegistry {
    active: HashMap<SceneId, DrawHandle>,
}

impl OutlineRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn handle(&self, scene: SceneId) -> Option<DrawHandle> { self.active.get(&scene).copied() }
    pub fn len(&self) -> usize { self.active.len() }
    pub fn is_empty(&self) -> bool { self.active.is_empty() }

    /// Deregister the scene's callback. A handle the host already dropped is ignored.
    pub fn clear(&mut self, scene: SceneId, handlers: &mut DrawHandlers) -> bool {
        let Some(handle) = self.active.remove(&scene) else { return false; };
        match handlers.remove(handle) {
            Ok(()) => log::debug!("removed outline callback {:?} of scene {:?}", handle, scene),
            Err(InkError::InvalidHandle) => log::debug!("outline callback {:?} of scene {:?} was already gone", handle, scene),
            Err(e) => log::warn!("removing outline callback {:?}: {}", handle, e),
        }
        true
    }

    /// Register `callback` for a scene that has none yet. Returns `None`, adding
    /// nothing, when the scene already owns a callback.
    pub fn register(&mut self, scene: SceneId, handlers: &mut DrawHandlers, callback: Box<dyn DrawCallback>) -> Option<DrawHandle> {
        if self.active.contains_key(&scene) {
            return None;
        }
        let handle = handlers.add(callback);
        self.active.insert(scene, handle);
        Some(handle)
    }

    /// Register `callback` for `scene`, dropping whatever was registered before.
    pub fn replace(&mut self, scene: SceneId, handlers: &mut DrawHandlers, callback: Box<dyn DrawCallback>) -> DrawHandle {
        self.clear(scene, handlers);
        let handle = handlers.add(callback);
        self.active.insert(scene, handle);
        handle
    }
}

/// Rebuild the outline callback of `scene` after a host event.
///
/// Always clears the previous callback first. Returns `Ok(None)` without building
/// anything when the feature is disabled or the active object is not a mesh.
pub fn refresh_outline(
    scene: &Scene,
    trigger: Trigger,
    registry: &mut OutlineRegistry,
    handlers: &mut DrawHandlers,
    evaluator: &dyn MeshEvaluator,
) -> Result<Option<DrawHandle>> {
    registry.clear(scene.id, handlers);

    if !scene.outline.enabled {
        log::debug!("{:?}: outline disabled on scene {:?}", trigger, scene.id);
        return Ok(None);
    }
    let Some(object) = scene.active_object().filter(|o| o.is_mesh()) else {
        log::debug!("{:?}: no active mesh on scene {:?}", trigger, scene.id);
        return Ok(None);
    };

    let buffers = build_outline_buffers(object, evaluator, BuildOptions::from(&scene.outline))?;
    log::info!(
        "{:?}: outline for '{}' ({} vertices, {} triangles, frame {})",
        trigger, object.name, buffers.vertex_count(), buffers.triangle_count(), scene.frame
    );
    let draw = OutlineDraw::new(object, buffers, &scene.outline);
    Ok(Some(registry.replace(scene.id, handlers, Box::new(draw))))
}
