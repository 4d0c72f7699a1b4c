pub mod error;
pub mod mesh;
pub mod scene;
pub mod render;
pub mod handlers;
pub mod paint;
pub mod scene_doc;

pub use error::{InkError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
