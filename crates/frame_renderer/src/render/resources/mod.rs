//! Long-lived render resources
//!
//! Resources are created by the asset layer, shared as `Arc`s with snapshots
//! and commands, and given a backend representation by Load commands on the
//! render thread.

pub mod backend_slot;
pub mod formats;
pub mod material;
pub mod mesh;
pub mod shader;
pub mod target_group;
pub mod texture;

pub use backend_slot::{BackendSlot, ResourceId};
pub use formats::{
    BlendMode, FilterMode, ImageFormat, IndexFormat, MeshLayout, PolygonType, TextureDescriptor,
    VertexElement, VertexFormat, WrapMode,
};
pub use material::{MaterialRenderState, RenderMaterial, RenderMaterialBuilder, RenderStateFlags, ShaderVariables};
pub use mesh::RenderMesh;
pub use shader::RenderShader;
pub use target_group::RenderTargetGroup;
pub use texture::RenderTexture;
