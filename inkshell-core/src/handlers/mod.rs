//! Draw-callback host: handles to callbacks invoked every viewport redraw.

pub mod registry;

use slotmap::SlotMap;

use crate::error::{InkError, Result};
use crate::render::{ImmediateRenderer, RenderContext};
pub use registry::{refresh_outline, OutlineDraw, OutlineRegistry};

slotmap::new_key_type! {
    /// Handle returned when a draw callback is registered.
    pub struct DrawHandle;
}

/// Host lifecycle events that rebuild outline callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    DepsgraphUpdate,
    FrameChange,
}

pub trait DrawCallback {
    fn draw(&self, renderer: &mut dyn ImmediateRenderer, view: &RenderContext) -> Result<()>;
    fn label(&self) -> &str { "draw" }
}

#[derive(Default)]
pub struct DrawHandlers {
    callbacks: SlotMap<DrawHandle, Box<dyn DrawCallback>>,
}

impl DrawHandlers {
    pub fn new() -> Self { Self::default() }

    pub fn add(&mut self, callback: Box<dyn DrawCallback>) -> DrawHandle {
        self.callbacks.insert(callback)
    }

    /// Fails with [`InkError::InvalidHandle`] when the handle was already removed.
    pub fn remove(&mut self, handle: DrawHandle) -> Result<()> {
        self.callbacks.remove(handle).map(|_| ()).ok_or(InkError::InvalidHandle)
    }

    pub fn contains(&self, handle: DrawHandle) -> bool { self.callbacks.contains_key(handle) }
    pub fn len(&self) -> usize { self.callbacks.len() }
    pub fn is_empty(&self) -> bool { self.callbacks.is_empty() }

    /// Run every registered callback; returns how many ran.
    pub fn draw_all(&self, renderer: &mut dyn ImmediateRenderer, view: &RenderContext) -> Result<usize> {
        for (handle, cb) in &self.callbacks {
            log::trace!("draw {:?} ({}) on {}", handle, cb.label(), renderer.name());
            cb.draw(renderer, view)?;
        }
        Ok(self.callbacks.len())
    }
}
