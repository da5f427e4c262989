//! # Rendering Pipeline
//!
//! Frame pipeline that decouples simulation state from graphics-API execution.
//!
//! ## Architecture
//!
//! A frame flows through four stages:
//! - **Snapshot**: the producer fills a [`RenderSnapshot`] with the camera,
//!   lights, render objects and dynamic meshes for one frame
//! - **Pass compilation**: a [`RenderPassCompiler`] groups and sorts the
//!   frame's objects into target groups, camera groups and passes
//! - **Command compilation**: the [`RenderCommandCompiler`] flattens the passes
//!   into a [`RenderCommandBuffer`], inserting resource loads and unloads
//! - **Execution**: the [`RenderCommandProcessor`] replays the buffer against
//!   a [`GraphicsDevice`] on the render thread, eliding redundant state changes
//!
//! The first three stages run on a background task. The [`Renderer`] gates
//! snapshots so at most one is in prep, and hands finished buffers to the
//! render thread through a two-deep [`CommandBufferRing`].

use thiserror::Error;

pub mod api;
pub mod backends;
pub mod commands;
pub mod objects;
pub mod passes;
pub mod processor;
pub mod renderer;
pub mod resources;
pub mod snapshot;
pub mod sync;


pub use api::{BackendResult, GraphicsDevice, UniformValue};
pub use backends::{DeviceCall, RecordingDevice};
pub use commands::{RenderCommand, RenderCommandBuffer, RenderCommandCompiler, RenderCommandKind, RenderCommandList};
pub use objects::{
    AmbientRenderLight, DirectionalRenderLight, PointRenderLight, RenderCamera, RenderDynamicMesh, RenderGeometry,
    RenderObject, RenderSkinnedAnimation, ShadowMap,
};
pub use passes::{ForwardRenderPassCompiler, RenderFrame, RenderPassCompiler, TargetRenderPassGroup};
pub use processor::{ProcessorStats, RenderCommandProcessor};
pub use renderer::Renderer;
pub use resources::{
    RenderMaterial, RenderMaterialBuilder, RenderMesh, RenderShader, RenderTargetGroup, RenderTexture, ResourceId,
};
pub use snapshot::RenderSnapshot;
pub use sync::{CommandBufferRing, RenderPrepGate, RenderPrepPermit};

/// High-level rendering error types
///
/// Errors that can occur while building resources or talking to a device,
/// abstracted from any specific graphics API.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Renderer initialization failed during setup
    ///
    /// Occurs when the worker pool cannot start, the configuration is
    /// invalid, or the processor cannot allocate its scratch objects.
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A rendering operation failed during execution
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Resource creation or management failed
    ///
    /// Returned when resource data is malformed or the device rejects it.
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// Backend-specific error occurred
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
