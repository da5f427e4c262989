//! Render pass groups produced by a pass compiler

use std::sync::Arc;

use crate::foundation::math::{Colour, Mat4, Resolution};
use crate::render::objects::{
    AmbientRenderLight, DirectionalRenderLight, PointRenderLight, RenderCamera, RenderGeometry, RenderObject,
    RenderSkinnedAnimation,
};
use crate::render::resources::{RenderMaterial, RenderTargetGroup};

/// What a pass renders and how it is sorted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPassKind {
    /// Depth-only shadow casters
    Shadow,
    /// Opaque geometry, sorted to minimise state changes
    Opaque,
    /// Blended geometry, sorted back to front
    Transparent,
}

/// A light attached to a pass
#[derive(Debug, Clone)]
pub enum RenderPassLight {
    /// Summed ambient light
    Ambient(AmbientRenderLight),
    /// Directional light, possibly with a shadow map
    Directional(DirectionalRenderLight),
    /// Point light
    Point(PointRenderLight),
}

/// One draw item in a pass
#[derive(Debug, Clone)]
pub struct RenderPassObject {
    /// Material the item is drawn with in this pass
    pub material: Arc<RenderMaterial>,
    /// Geometry
    pub geometry: RenderGeometry,
    /// Object to world transform
    pub world: Mat4,
    /// Skinning pose
    pub skinned_animation: Option<Arc<RenderSkinnedAnimation>>,
    /// View-space depth of the bounding sphere centre for the pass camera
    pub depth: f32,
}

impl RenderPassObject {
    /// Build a pass item from an object drawn with `material`
    pub fn new(object: &RenderObject, material: Arc<RenderMaterial>, camera: &RenderCamera) -> Self {
        Self {
            material,
            geometry: object.geometry().clone(),
            world: *object.world(),
            skinned_animation: object.skinned_animation().cloned(),
            depth: camera.view_depth(&object.bounding_sphere().centre),
        }
    }
}

/// A sorted batch of draws sharing lights
#[derive(Debug, Clone)]
pub struct RenderPass {
    /// Pass kind
    pub kind: RenderPassKind,
    /// Lights applied before the pass's draws
    pub lights: Vec<RenderPassLight>,
    /// Draw items in execution order
    pub objects: Vec<RenderPassObject>,
}

impl RenderPass {
    /// Create a pass and sort its objects for the pass kind.
    ///
    /// Both sorts are stable so equal keys keep snapshot order.
    pub fn new(kind: RenderPassKind, lights: Vec<RenderPassLight>, mut objects: Vec<RenderPassObject>) -> Self {
        match kind {
            RenderPassKind::Shadow | RenderPassKind::Opaque => {
                objects.sort_by_key(|object| {
                    (object.material.shader().id(), object.material.id(), object.geometry.id())
                });
            }
            RenderPassKind::Transparent => {
                objects.sort_by(|a, b| b.depth.total_cmp(&a.depth));
            }
        }

        Self { kind, lights, objects }
    }

    /// Whether the pass has no draws
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Passes rendered from one camera
#[derive(Debug, Clone)]
pub struct CameraRenderPassGroup {
    /// Camera shared by every pass in the group
    pub camera: RenderCamera,
    /// Passes in execution order
    pub passes: Vec<RenderPass>,
}

/// Framebuffer a target group renders into
#[derive(Debug, Clone)]
pub enum RenderTarget {
    /// The default framebuffer
    Default,
    /// An off-screen target group
    TargetGroup(Arc<RenderTargetGroup>),
}

/// Everything rendered into one framebuffer between a Begin and an End
#[derive(Debug, Clone)]
pub struct TargetRenderPassGroup {
    /// Framebuffer
    pub target: RenderTarget,
    /// Viewport size
    pub resolution: Resolution,
    /// Colour the target is cleared to
    pub clear_colour: Colour,
    /// Camera groups in execution order
    pub camera_groups: Vec<CameraRenderPassGroup>,
}

impl TargetRenderPassGroup {
    /// Number of draws across every pass
    pub fn draw_count(&self) -> usize {
        self.camera_groups
            .iter()
            .flat_map(|group| group.passes.iter())
            .map(|pass| pass.objects.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{BoundingSphere, Vec3};
    use crate::render::resources::{MeshLayout, RenderMesh, RenderShader};

    fn object_at_depth(material: &Arc<RenderMaterial>, mesh: &Arc<RenderMesh>, depth: f32) -> RenderPassObject {
        RenderPassObject {
            material: material.clone(),
            geometry: RenderGeometry::Static(mesh.clone()),
            world: Mat4::identity(),
            skinned_animation: None,
            depth,
        }
    }

    #[test]
    fn test_transparent_sort_tolerates_nan_depth() {
        let material = RenderMaterial::builder(RenderShader::new("glass", "", "")).build();
        let mesh = RenderMesh::new(
            MeshLayout::static_triangles(),
            vec![0u8; 36 * 3],
            Vec::new(),
            BoundingSphere::new(Vec3::zeros(), 1.0),
        )
        .unwrap();

        let objects = [1.0, f32::NAN, 5.0, 3.0, f32::NAN]
            .into_iter()
            .map(|depth| object_at_depth(&material, &mesh, depth))
            .collect();
        let pass = RenderPass::new(RenderPassKind::Transparent, Vec::new(), objects);

        assert_eq!(pass.objects.len(), 5);
        let finite: Vec<f32> = pass.objects.iter().map(|o| o.depth).filter(|d| !d.is_nan()).collect();
        assert_eq!(finite, vec![5.0, 3.0, 1.0]);
    }
}
