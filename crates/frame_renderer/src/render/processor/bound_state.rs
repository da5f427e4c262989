//! Cache of what the processor has bound on the device
//!
//! Every transition that can invalidate a binding is a named method here and
//! documents which fields it clears, so the cache always describes exactly
//! what the device has bound.

use std::sync::Arc;

use crate::foundation::math::Colour;
use crate::render::api::ShaderHandle;
use crate::render::objects::{
    DirectionalRenderLight, PointRenderLight, RenderCamera, RenderDynamicMesh, RenderSkinnedAnimation,
};
use crate::render::resources::{RenderMaterial, RenderMesh, RenderShader};

/// Lights applied to the current pass
#[derive(Debug, Default)]
pub(crate) struct LightSet {
    pub ambient: Option<Colour>,
    pub directional: Vec<DirectionalRenderLight>,
    pub point: Vec<PointRenderLight>,
    /// Set once a material has consumed the lights; the next light starts a new set
    sealed: bool,
}

impl LightSet {
    fn start_light(&mut self) {
        if self.sealed {
            *self = Self::default();
        }
    }

    pub fn set_ambient(&mut self, colour: Colour) {
        self.start_light();
        self.ambient = Some(colour);
    }

    pub fn add_directional(&mut self, light: DirectionalRenderLight) {
        self.start_light();
        self.directional.push(light);
    }

    pub fn add_point(&mut self, light: PointRenderLight) {
        self.start_light();
        self.point.push(light);
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }
}

/// Shader currently bound on the device
#[derive(Debug, Clone)]
pub(crate) struct BoundShader {
    pub shader: Arc<RenderShader>,
    pub handle: ShaderHandle,
}

/// Everything the processor believes is bound
#[derive(Debug, Default)]
pub(crate) struct BoundState {
    pub in_pass: bool,
    pub camera: Option<Box<RenderCamera>>,
    pub lights: LightSet,
    pub material: Option<Arc<RenderMaterial>>,
    pub shader: Option<BoundShader>,
    pub mesh: Option<Arc<RenderMesh>>,
    pub dynamic_mesh: Option<Arc<RenderDynamicMesh>>,
    pub animation: Option<Arc<RenderSkinnedAnimation>>,
}

impl BoundState {
    /// Clear every cached binding, camera and light. Pass membership is kept.
    pub fn reset(&mut self) {
        let in_pass = self.in_pass;
        *self = Self { in_pass, ..Self::default() };
    }

    /// Enter a pass with an empty cache
    pub fn begin_pass(&mut self) {
        *self = Self { in_pass: true, ..Self::default() };
    }

    /// Leave the pass with an empty cache
    pub fn end_pass(&mut self) {
        *self = Self::default();
    }

    /// Clears the material so the next ApplyMaterial reaches the device
    pub fn invalidate_material(&mut self) {
        self.material = None;
    }

    /// Records a new camera. Clears the material.
    pub fn set_camera(&mut self, camera: Box<RenderCamera>) {
        self.camera = Some(camera);
        self.invalidate_material();
    }

    /// Records a new program. Clears mesh, dynamic mesh and animation, whose
    /// attribute bindings belong to the previous program.
    pub fn bind_shader(&mut self, shader: Arc<RenderShader>, handle: ShaderHandle) {
        self.shader = Some(BoundShader { shader, handle });
        self.mesh = None;
        self.dynamic_mesh = None;
        self.animation = None;
    }

    /// Records a static mesh. Clears dynamic mesh and animation.
    pub fn bind_mesh(&mut self, mesh: Arc<RenderMesh>) {
        self.mesh = Some(mesh);
        self.dynamic_mesh = None;
        self.animation = None;
    }

    /// Records a dynamic mesh. Clears static mesh and animation.
    pub fn bind_dynamic_mesh(&mut self, mesh: Arc<RenderDynamicMesh>) {
        self.dynamic_mesh = Some(mesh);
        self.mesh = None;
        self.animation = None;
    }

    /// Whether the shader with the given identity is bound
    pub fn is_shader_bound(&self, shader: &RenderShader) -> bool {
        self.shader.as_ref().is_some_and(|bound| bound.shader.id() == shader.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{BoundingSphere, Vec3};
    use crate::render::resources::MeshLayout;

    #[test]
    fn test_lights_replaced_after_seal() {
        let mut lights = LightSet::default();
        lights.add_point(PointRenderLight::new(Colour::WHITE, Vec3::zeros(), Vec3::x()));
        lights.add_point(PointRenderLight::new(Colour::WHITE, Vec3::zeros(), Vec3::x()));
        assert_eq!(lights.point.len(), 2);

        lights.seal();
        lights.set_ambient(Colour::BLACK);
        assert!(lights.point.is_empty());
        assert_eq!(lights.ambient, Some(Colour::BLACK));
    }

    #[test]
    fn test_shader_bind_clears_geometry() {
        let mut state = BoundState::default();
        let mesh = RenderMesh::new(MeshLayout::static_triangles(), vec![0u8; 36], Vec::new(), BoundingSphere::default())
            .unwrap();
        state.bind_mesh(mesh);
        assert!(state.mesh.is_some());

        state.bind_shader(RenderShader::new("s", "", ""), ShaderHandle(1));
        assert!(state.mesh.is_none());
        assert!(state.dynamic_mesh.is_none());
    }

    #[test]
    fn test_reset_keeps_pass_membership() {
        let mut state = BoundState::default();
        state.begin_pass();
        state.bind_shader(RenderShader::new("s", "", ""), ShaderHandle(1));
        state.reset();
        assert!(state.in_pass);
        assert!(state.shader.is_none());
        state.end_pass();
        assert!(!state.in_pass);
    }
}
