//! Per-frame light values

use std::sync::Arc;

use crate::foundation::math::{Colour, Mat4, Vec3};
use crate::render::resources::{RenderTargetGroup, RenderTexture};
use crate::render::{RenderError, RenderResult};

/// Uniform light applied to every surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientRenderLight {
    /// Light colour
    pub colour: Colour,
}

impl AmbientRenderLight {
    /// Create an ambient light
    pub fn new(colour: Colour) -> Self {
        Self { colour }
    }
}

/// Depth target a directional light renders its shadow casters into
#[derive(Debug, Clone)]
pub struct ShadowMap {
    target_group: Arc<RenderTargetGroup>,
    texture: Arc<RenderTexture>,
    view_projection: Mat4,
    tolerance: f32,
}

impl ShadowMap {
    /// Create a shadow map.
    ///
    /// # Errors
    /// The target group must carry a depth attachment.
    pub fn new(target_group: Arc<RenderTargetGroup>, view_projection: Mat4, tolerance: f32) -> RenderResult<Self> {
        let texture = target_group.depth_target().cloned().ok_or_else(|| {
            RenderError::ResourceCreationFailed("Shadow map target group has no depth attachment".to_string())
        })?;

        Ok(Self { target_group, texture, view_projection, tolerance })
    }

    /// Target group the shadow pass renders into
    pub fn target_group(&self) -> &Arc<RenderTargetGroup> {
        &self.target_group
    }

    /// Depth texture sampled by lit passes
    pub fn texture(&self) -> &Arc<RenderTexture> {
        &self.texture
    }

    /// World to light clip transform
    pub fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    /// Depth bias used when comparing against the map
    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }
}

/// Infinitely distant light
#[derive(Debug, Clone)]
pub struct DirectionalRenderLight {
    /// Light colour
    pub colour: Colour,
    /// Normalised direction the light travels in
    pub direction: Vec3,
    /// Shadow map, when the light casts shadows
    pub shadow_map: Option<ShadowMap>,
}

impl DirectionalRenderLight {
    /// Create a light that casts no shadows
    pub fn new(colour: Colour, direction: Vec3) -> Self {
        Self {
            colour,
            direction: direction.try_normalize(f32::EPSILON).unwrap_or_else(|| -Vec3::y()),
            shadow_map: None,
        }
    }

    /// Attach a shadow map
    pub fn with_shadow_map(mut self, shadow_map: ShadowMap) -> Self {
        self.shadow_map = Some(shadow_map);
        self
    }
}

/// Omni-directional light with distance attenuation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointRenderLight {
    /// Light colour
    pub colour: Colour,
    /// World-space position
    pub position: Vec3,
    /// Constant, linear and quadratic attenuation factors
    pub attenuation: Vec3,
}

impl PointRenderLight {
    /// Create a point light
    pub fn new(colour: Colour, position: Vec3, attenuation: Vec3) -> Self {
        Self { colour, position, attenuation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Resolution;
    use crate::render::resources::{ImageFormat, TextureDescriptor};

    #[test]
    fn test_shadow_map_requires_depth_target() {
        let colour = RenderTexture::attachment(TextureDescriptor::new(Resolution::new(64, 64), ImageFormat::Rgba8888));
        let group = RenderTargetGroup::new(Some(colour), None).unwrap();
        assert!(ShadowMap::new(group, Mat4::identity(), 0.01).is_err());
    }

    #[test]
    fn test_shadow_map_texture_is_depth_attachment() {
        let depth = RenderTexture::attachment(TextureDescriptor::new(Resolution::new(64, 64), ImageFormat::Depth16));
        let group = RenderTargetGroup::new(None, Some(depth.clone())).unwrap();
        let shadow_map = ShadowMap::new(group, Mat4::identity(), 0.01).unwrap();
        assert!(Arc::ptr_eq(shadow_map.texture(), &depth));
    }

    #[test]
    fn test_directional_light_direction_is_normalised() {
        let light = DirectionalRenderLight::new(Colour::WHITE, Vec3::new(0.0, -2.0, 0.0));
        assert_eq!(light.direction, Vec3::new(0.0, -1.0, 0.0));
    }
}
