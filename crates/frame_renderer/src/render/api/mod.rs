//! Public device API
//!
//! The trait a graphics backend implements, the opaque handles it hands back,
//! and the value types that cross the boundary.

pub mod graphics_device;

pub use graphics_device::{
    uniforms, BackendResult, BlendEquation, ClearFlags, DepthFunction, DynamicMeshBufferHandle, GraphicsDevice,
    MeshHandle, ShaderHandle, TargetGroupHandle, TextureHandle, UniformValue,
};
