//! Graphics device abstraction
//!
//! The command processor is the only caller of this trait. Each method maps
//! onto one primitive graphics-API operation, so a backend implementation is
//! a thin translation layer with no caching or ordering logic of its own.
//!
//! Uniform setters report whether the active program declares the uniform;
//! the processor decides whether a missing uniform matters.

use bitflags::bitflags;

use crate::foundation::math::{Colour, Mat4, Resolution, Vec2, Vec3, Vec4};
use crate::render::objects::RenderDynamicMesh;
use crate::render::resources::{
    IndexFormat, MaterialRenderState, PolygonType, RenderMesh, RenderShader, RenderTargetGroup, RenderTexture,
};
use crate::render::RenderError;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Handle to a compiled shader program stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u64);

/// Handle to a texture stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Handle to static mesh buffers stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// Handle to a framebuffer object stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetGroupHandle(pub u64);

/// Handle to the streaming buffer dynamic meshes are uploaded into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DynamicMeshBufferHandle(pub u64);

bitflags! {
    /// Buffers cleared at the start of a target group
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Colour buffer
        const COLOUR = 1 << 0;
        /// Depth buffer
        const DEPTH = 1 << 1;
    }
}

/// Blend equation used for every pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    /// `source * sf + destination * df`
    Add,
}

/// Depth comparison used for every pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunction {
    /// Pass when the incoming depth is less than or equal to the stored one
    LessOrEqual,
}

/// Value pushed to a named shader uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Integer, also used for sampler units
    Int(i32),
    /// Float
    Float(f32),
    /// 2D vector
    Vec2(Vec2),
    /// 3D vector
    Vec3(Vec3),
    /// 4D vector
    Vec4(Vec4),
    /// Column-major 4x4 matrix
    Mat4(Mat4),
    /// RGBA colour
    Colour(Colour),
}

impl UniformValue {
    /// Raw bytes as they would be uploaded to the GPU
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            UniformValue::Int(value) => bytemuck::bytes_of(value),
            UniformValue::Float(value) => bytemuck::bytes_of(value),
            UniformValue::Vec2(value) => bytemuck::cast_slice(value.as_slice()),
            UniformValue::Vec3(value) => bytemuck::cast_slice(value.as_slice()),
            UniformValue::Vec4(value) => bytemuck::cast_slice(value.as_slice()),
            UniformValue::Mat4(value) => bytemuck::cast_slice(value.as_slice()),
            UniformValue::Colour(value) => bytemuck::bytes_of(value),
        }
    }
}

/// Standard uniform names shared by the processor and shader authors
pub mod uniforms {
    /// Object to world transform
    pub const WORLD_MATRIX: &str = "u_worldMat";
    /// Object to clip transform
    pub const WVP_MATRIX: &str = "u_wvpMat";
    /// Inverse-transpose of the world transform
    pub const NORMAL_MATRIX: &str = "u_normalMat";
    /// Camera view-projection
    pub const VIEW_PROJECTION_MATRIX: &str = "u_vpMat";
    /// Camera world position
    pub const CAMERA_POSITION: &str = "u_cameraPos";
    /// Material emissive colour
    pub const EMISSIVE: &str = "u_emissive";
    /// Material ambient colour
    pub const AMBIENT: &str = "u_ambient";
    /// Material diffuse colour
    pub const DIFFUSE: &str = "u_diffuse";
    /// Material specular colour
    pub const SPECULAR: &str = "u_specular";
    /// Summed ambient light colour
    pub const AMBIENT_LIGHT_COLOUR: &str = "u_ambientLightCol";
    /// Number of active directional lights
    pub const NUM_DIRECTIONAL_LIGHTS: &str = "u_numDirectionalLights";
    /// Number of active point lights
    pub const NUM_POINT_LIGHTS: &str = "u_numPointLights";
    /// Skinning joint matrices
    pub const JOINTS: &str = "u_joints";

    /// Sampler uniform for a material texture unit
    pub fn texture(index: usize) -> String {
        format!("u_texture{index}")
    }

    /// Sampler uniform for a directional light's shadow map
    pub fn shadow_map(index: usize) -> String {
        format!("u_shadowMap{index}")
    }

    /// Field of the directional light array
    pub fn directional_light(index: usize, field: &str) -> String {
        format!("u_directionalLights[{index}].{field}")
    }

    /// Field of the point light array
    pub fn point_light(index: usize, field: &str) -> String {
        format!("u_pointLights[{index}].{field}")
    }
}

/// Primitive operations a graphics backend provides to the command processor.
///
/// Creation calls may fail; everything else is expected to succeed once the
/// handles it receives are live. Handles passed back in are always ones this
/// device returned and has not yet destroyed.
pub trait GraphicsDevice {
    /// Compile and link a shader program
    fn create_shader(&mut self, shader: &RenderShader) -> BackendResult<ShaderHandle>;

    /// Release a shader program
    fn destroy_shader(&mut self, handle: ShaderHandle);

    /// Upload a texture, or allocate storage for an attachment
    fn create_texture(&mut self, texture: &RenderTexture) -> BackendResult<TextureHandle>;

    /// Release a texture
    fn destroy_texture(&mut self, handle: TextureHandle);

    /// Upload static mesh buffers
    fn create_mesh(&mut self, mesh: &RenderMesh) -> BackendResult<MeshHandle>;

    /// Release static mesh buffers
    fn destroy_mesh(&mut self, handle: MeshHandle);

    /// Create a framebuffer from already-loaded attachments
    fn create_target_group(
        &mut self,
        group: &RenderTargetGroup,
        colour: Option<TextureHandle>,
        depth: Option<TextureHandle>,
    ) -> BackendResult<TargetGroupHandle>;

    /// Release a framebuffer
    fn destroy_target_group(&mut self, handle: TargetGroupHandle);

    /// Allocate the streaming buffer used for dynamic meshes
    fn create_dynamic_mesh_buffer(
        &mut self,
        max_vertex_bytes: usize,
        max_index_bytes: usize,
    ) -> BackendResult<DynamicMeshBufferHandle>;

    /// Bind a framebuffer; `None` selects the default framebuffer
    fn bind_framebuffer(&mut self, target: Option<TargetGroupHandle>);

    /// Set the viewport to cover the given resolution
    fn set_viewport(&mut self, resolution: Resolution);

    /// Enable or disable colour and depth writes
    fn set_write_masks(&mut self, colour: bool, depth: bool);

    /// Clear the bound framebuffer
    fn clear(&mut self, colour: Colour, flags: ClearFlags);

    /// Set the fixed-function state shared by all passes
    fn set_fixed_function_state(&mut self, equation: BlendEquation, depth: DepthFunction);

    /// Make a shader program current
    fn bind_shader(&mut self, shader: ShaderHandle);

    /// Apply a material's fixed-function state
    fn apply_render_state(&mut self, state: &MaterialRenderState);

    /// Bind a texture to a texture unit
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    /// Set a uniform on the given program, returning whether it exists
    fn set_uniform(&mut self, shader: ShaderHandle, name: &str, value: &UniformValue) -> bool;

    /// Bind static mesh buffers and their attributes for the given program
    fn bind_mesh(&mut self, shader: ShaderHandle, mesh: MeshHandle);

    /// Stream a dynamic mesh into the scratch buffer and bind its attributes
    fn upload_dynamic_mesh(&mut self, shader: ShaderHandle, buffer: DynamicMeshBufferHandle, mesh: &RenderDynamicMesh);

    /// Draw the bound mesh using its index buffer
    fn draw_indexed(&mut self, polygon_type: PolygonType, index_count: u32, index_format: IndexFormat);

    /// Draw the bound mesh without indices
    fn draw_arrays(&mut self, polygon_type: PolygonType, vertex_count: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_bytes() {
        assert_eq!(UniformValue::Float(1.0).as_bytes().len(), 4);
        assert_eq!(UniformValue::Vec3(Vec3::new(1.0, 2.0, 3.0)).as_bytes().len(), 12);
        assert_eq!(UniformValue::Mat4(Mat4::identity()).as_bytes().len(), 64);
        assert_eq!(UniformValue::Colour(Colour::WHITE).as_bytes().len(), 16);
    }

    #[test]
    fn test_uniform_array_names() {
        assert_eq!(uniforms::directional_light(1, "colour"), "u_directionalLights[1].colour");
        assert_eq!(uniforms::point_light(0, "position"), "u_pointLights[0].position");
        assert_eq!(uniforms::texture(2), "u_texture2");
    }
}
