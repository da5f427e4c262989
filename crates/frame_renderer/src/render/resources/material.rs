//! Materials: a shader plus the state and inputs it is drawn with
//!
//! Materials have no backend object of their own. Applying one binds its
//! shader and textures and pushes its uniforms, so a material is only usable
//! once its shader and every texture it references have been loaded.

use std::collections::BTreeMap;
use std::sync::Arc;

use bitflags::bitflags;

use super::backend_slot::ResourceId;
use super::formats::BlendMode;
use super::shader::RenderShader;
use super::texture::RenderTexture;
use crate::foundation::math::{Colour, Mat4, Vec2, Vec3, Vec4};
use crate::render::api::UniformValue;

bitflags! {
    /// Fixed-function toggles set when a material is applied
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderStateFlags: u32 {
        /// Depth testing against the bound depth buffer
        const DEPTH_TEST = 1 << 0;
        /// Depth buffer writes
        const DEPTH_WRITE = 1 << 1;
        /// Colour buffer writes
        const COLOUR_WRITE = 1 << 2;
        /// Back-face culling
        const FACE_CULLING = 1 << 3;
        /// Alpha blending, also routes the material to the transparent pass
        const TRANSPARENCY = 1 << 4;
    }
}

impl Default for RenderStateFlags {
    fn default() -> Self {
        Self::DEPTH_TEST | Self::DEPTH_WRITE | Self::COLOUR_WRITE | Self::FACE_CULLING
    }
}

/// Render state pushed to the device on material application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialRenderState {
    /// State toggles
    pub flags: RenderStateFlags,
    /// Source blend factor, used with [`RenderStateFlags::TRANSPARENCY`]
    pub source_blend: BlendMode,
    /// Destination blend factor, used with [`RenderStateFlags::TRANSPARENCY`]
    pub destination_blend: BlendMode,
}

impl Default for MaterialRenderState {
    fn default() -> Self {
        Self {
            flags: RenderStateFlags::default(),
            source_blend: BlendMode::One,
            destination_blend: BlendMode::Zero,
        }
    }
}

/// Named custom uniforms applied after the standard material uniforms
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderVariables {
    values: BTreeMap<String, UniformValue>,
}

impl ShaderVariables {
    /// Set a variable, replacing any previous value with the same name
    pub fn set(&mut self, name: impl Into<String>, value: UniformValue) {
        self.values.insert(name.into(), value);
    }

    /// Iterate variables in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no variables
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Immutable material description
#[derive(Debug)]
pub struct RenderMaterial {
    id: ResourceId,
    shader: Arc<RenderShader>,
    textures: Vec<Arc<RenderTexture>>,
    render_state: MaterialRenderState,
    emissive: Colour,
    ambient: Colour,
    diffuse: Colour,
    specular: Colour,
    variables: ShaderVariables,
}

impl RenderMaterial {
    /// Start building a material around a shader
    pub fn builder(shader: Arc<RenderShader>) -> RenderMaterialBuilder {
        RenderMaterialBuilder::new(shader)
    }

    /// Process-unique identity
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Shader used by the material
    pub fn shader(&self) -> &Arc<RenderShader> {
        &self.shader
    }

    /// Textures, bound to consecutive units starting at zero
    pub fn textures(&self) -> &[Arc<RenderTexture>] {
        &self.textures
    }

    /// Fixed-function state
    pub fn render_state(&self) -> &MaterialRenderState {
        &self.render_state
    }

    /// Whether objects using this material belong to the transparent pass
    pub fn is_transparent(&self) -> bool {
        self.render_state.flags.contains(RenderStateFlags::TRANSPARENCY)
    }

    /// Emissive colour
    pub fn emissive(&self) -> Colour {
        self.emissive
    }

    /// Ambient response colour
    pub fn ambient(&self) -> Colour {
        self.ambient
    }

    /// Diffuse colour
    pub fn diffuse(&self) -> Colour {
        self.diffuse
    }

    /// Specular colour
    pub fn specular(&self) -> Colour {
        self.specular
    }

    /// Custom shader variables
    pub fn variables(&self) -> &ShaderVariables {
        &self.variables
    }
}

/// Builder for [`RenderMaterial`]
#[derive(Debug)]
pub struct RenderMaterialBuilder {
    shader: Arc<RenderShader>,
    textures: Vec<Arc<RenderTexture>>,
    render_state: MaterialRenderState,
    emissive: Colour,
    ambient: Colour,
    diffuse: Colour,
    specular: Colour,
    variables: ShaderVariables,
}

impl RenderMaterialBuilder {
    /// Create a builder with opaque defaults and white diffuse
    pub fn new(shader: Arc<RenderShader>) -> Self {
        Self {
            shader,
            textures: Vec::new(),
            render_state: MaterialRenderState::default(),
            emissive: Colour::BLACK,
            ambient: Colour::WHITE,
            diffuse: Colour::WHITE,
            specular: Colour::BLACK,
            variables: ShaderVariables::default(),
        }
    }

    /// Append a texture
    pub fn texture(mut self, texture: Arc<RenderTexture>) -> Self {
        self.textures.push(texture);
        self
    }

    /// Enable alpha blending with the given factors
    pub fn transparent(mut self, source: BlendMode, destination: BlendMode) -> Self {
        self.render_state.flags.insert(RenderStateFlags::TRANSPARENCY);
        self.render_state.flags.remove(RenderStateFlags::DEPTH_WRITE);
        self.render_state.source_blend = source;
        self.render_state.destination_blend = destination;
        self
    }

    /// Replace the state flags wholesale
    pub fn flags(mut self, flags: RenderStateFlags) -> Self {
        self.render_state.flags = flags;
        self
    }

    /// Depth-only state for shadow map rendering
    pub fn depth_only(mut self) -> Self {
        self.render_state.flags = RenderStateFlags::DEPTH_TEST | RenderStateFlags::DEPTH_WRITE;
        self
    }

    /// Set the emissive colour
    pub fn emissive(mut self, colour: Colour) -> Self {
        self.emissive = colour;
        self
    }

    /// Set the ambient colour
    pub fn ambient(mut self, colour: Colour) -> Self {
        self.ambient = colour;
        self
    }

    /// Set the diffuse colour
    pub fn diffuse(mut self, colour: Colour) -> Self {
        self.diffuse = colour;
        self
    }

    /// Set the specular colour
    pub fn specular(mut self, colour: Colour) -> Self {
        self.specular = colour;
        self
    }

    /// Set a float variable
    pub fn float(mut self, name: impl Into<String>, value: f32) -> Self {
        self.variables.set(name, UniformValue::Float(value));
        self
    }

    /// Set a vec2 variable
    pub fn vec2(mut self, name: impl Into<String>, value: Vec2) -> Self {
        self.variables.set(name, UniformValue::Vec2(value));
        self
    }

    /// Set a vec3 variable
    pub fn vec3(mut self, name: impl Into<String>, value: Vec3) -> Self {
        self.variables.set(name, UniformValue::Vec3(value));
        self
    }

    /// Set a vec4 variable
    pub fn vec4(mut self, name: impl Into<String>, value: Vec4) -> Self {
        self.variables.set(name, UniformValue::Vec4(value));
        self
    }

    /// Set a mat4 variable
    pub fn mat4(mut self, name: impl Into<String>, value: Mat4) -> Self {
        self.variables.set(name, UniformValue::Mat4(value));
        self
    }

    /// Set a colour variable
    pub fn colour(mut self, name: impl Into<String>, value: Colour) -> Self {
        self.variables.set(name, UniformValue::Colour(value));
        self
    }

    /// Finish the material
    pub fn build(self) -> Arc<RenderMaterial> {
        Arc::new(RenderMaterial {
            id: ResourceId::next(),
            shader: self.shader,
            textures: self.textures,
            render_state: self.render_state,
            emissive: self.emissive,
            ambient: self.ambient,
            diffuse: self.diffuse,
            specular: self.specular,
            variables: self.variables,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shader() -> Arc<RenderShader> {
        RenderShader::new("test", "uniform mat4 u_wvpMat;", "uniform vec4 u_diffuse;")
    }

    #[test]
    fn test_default_material_is_opaque() {
        let material = RenderMaterial::builder(shader()).build();
        assert!(!material.is_transparent());
        assert!(material.render_state().flags.contains(RenderStateFlags::DEPTH_WRITE));
    }

    #[test]
    fn test_transparent_material_disables_depth_write() {
        let material = RenderMaterial::builder(shader())
            .transparent(BlendMode::SourceAlpha, BlendMode::OneMinusSourceAlpha)
            .build();

        assert!(material.is_transparent());
        assert!(!material.render_state().flags.contains(RenderStateFlags::DEPTH_WRITE));
        assert_eq!(material.render_state().source_blend, BlendMode::SourceAlpha);
    }

    #[test]
    fn test_shader_variables_are_name_ordered() {
        let material = RenderMaterial::builder(shader())
            .float("u_time", 1.0)
            .colour("u_tint", Colour::WHITE)
            .float("u_alpha", 0.5)
            .build();

        let names: Vec<&str> = material.variables().iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["u_alpha", "u_time", "u_tint"]);
    }
}
