//! # Frame Renderer
//!
//! A game-engine rendering pipeline that turns per-frame snapshots of scene
//! state into graphics device calls.
//!
//! ## Features
//!
//! - **Snapshot intake**: immutable per-frame scene data with claim-once fields
//! - **Pass compilation**: pluggable grouping and sorting into render passes
//! - **Command compilation**: flat command buffers with automatic resource loading
//! - **Execution**: a processor with a state cache over a `GraphicsDevice`
//! - **Frame pacing**: a one-permit prep gate and a two-deep command buffer ring
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use frame_renderer::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let renderer = Renderer::with_forward_compiler(RendererConfig::default())?;
//!     let mut processor = renderer.create_processor(RecordingDevice::new());
//!
//!     let camera = RenderCamera::from_view_projection(Mat4::identity());
//!     let snapshot = RenderSnapshot::new(Resolution::new(1280, 720), Colour::BLACK, camera);
//!     renderer.process_render_snapshot(snapshot);
//!     renderer.process_render_command_buffer(&mut processor)?;
//!
//!     renderer.shutdown(&mut processor)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod config;
pub mod core;
pub mod foundation;
pub mod render;

/// Common imports for pipeline users
pub mod prelude {
    pub use crate::{
        core::config::{ApplicationConfig, Config, EngineConfig, RendererConfig},
        foundation::math::{BoundingSphere, Colour, Mat4, Mat4Ext, Resolution, Vec3},
        render::{
            AmbientRenderLight, DirectionalRenderLight, GraphicsDevice, PointRenderLight, RecordingDevice,
            RenderCamera, RenderCommandProcessor, RenderError, RenderGeometry, RenderMaterial, RenderMesh,
            RenderObject, RenderResult, RenderShader, RenderSnapshot, RenderTexture, Renderer, ShadowMap,
        },
    };
}
