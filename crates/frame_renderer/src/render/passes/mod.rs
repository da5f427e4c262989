//! Render pass compilation
//!
//! A pass compiler turns a [`RenderFrame`] into an ordered list of
//! [`TargetRenderPassGroup`]s. The order of the returned groups is the order
//! they are executed in, so anything a later group samples (shadow maps) must
//! be rendered by an earlier one.

pub mod forward;
pub mod frame;
pub mod pass;

pub use forward::ForwardRenderPassCompiler;
pub use frame::RenderFrame;
pub use pass::{
    CameraRenderPassGroup, RenderPass, RenderPassKind, RenderPassLight, RenderPassObject, RenderTarget,
    TargetRenderPassGroup,
};

/// Policy that groups and sorts a frame's objects into passes
pub trait RenderPassCompiler: Send + Sync {
    /// Compile the frame into target groups in execution order
    fn compile_target_render_pass_groups(&self, frame: &RenderFrame) -> Vec<TargetRenderPassGroup>;
}
