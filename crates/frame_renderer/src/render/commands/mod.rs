//! Render commands and their compilation from pass groups

pub mod command;
pub mod compiler;

pub use command::{RenderCommand, RenderCommandBuffer, RenderCommandKind, RenderCommandList};
pub use compiler::{RenderCommandCompiler, ResourceTracker};
