//! Drawable instances captured into a snapshot

use std::sync::Arc;

use super::dynamic_mesh::RenderDynamicMesh;
use super::skinned_animation::RenderSkinnedAnimation;
use crate::foundation::math::{BoundingSphere, Mat4};
use crate::render::resources::{RenderMaterial, RenderMesh, ResourceId};

/// Geometry drawn by a render object
#[derive(Debug, Clone)]
pub enum RenderGeometry {
    /// A loaded static mesh
    Static(Arc<RenderMesh>),
    /// Geometry streamed this frame
    Dynamic(Arc<RenderDynamicMesh>),
}

impl RenderGeometry {
    /// Identity of the underlying mesh
    pub fn id(&self) -> ResourceId {
        match self {
            RenderGeometry::Static(mesh) => mesh.id(),
            RenderGeometry::Dynamic(mesh) => mesh.id(),
        }
    }

    /// Local-space bounds of the underlying mesh
    pub fn bounding_sphere(&self) -> BoundingSphere {
        match self {
            RenderGeometry::Static(mesh) => mesh.bounding_sphere(),
            RenderGeometry::Dynamic(mesh) => mesh.bounding_sphere(),
        }
    }

    /// Whether both refer to the same mesh instance
    pub fn same_as(&self, other: &RenderGeometry) -> bool {
        match (self, other) {
            (RenderGeometry::Static(a), RenderGeometry::Static(b)) => Arc::ptr_eq(a, b),
            (RenderGeometry::Dynamic(a), RenderGeometry::Dynamic(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// One drawable instance
#[derive(Debug, Clone)]
pub struct RenderObject {
    material: Arc<RenderMaterial>,
    shadow_material: Option<Arc<RenderMaterial>>,
    geometry: RenderGeometry,
    world: Mat4,
    bounding_sphere: BoundingSphere,
    skinned_animation: Option<Arc<RenderSkinnedAnimation>>,
}

impl RenderObject {
    /// Create an instance; the world bounding sphere is derived from the geometry
    pub fn new(material: Arc<RenderMaterial>, geometry: RenderGeometry, world: Mat4) -> Self {
        let bounding_sphere = geometry.bounding_sphere().transformed(&world);
        Self {
            material,
            shadow_material: None,
            geometry,
            world,
            bounding_sphere,
            skinned_animation: None,
        }
    }

    /// Cast shadows using the given depth-only material
    pub fn with_shadow_material(mut self, material: Arc<RenderMaterial>) -> Self {
        self.shadow_material = Some(material);
        self
    }

    /// Attach a skinning pose
    pub fn with_skinned_animation(mut self, animation: Arc<RenderSkinnedAnimation>) -> Self {
        self.skinned_animation = Some(animation);
        self
    }

    /// Material used by lit passes
    pub fn material(&self) -> &Arc<RenderMaterial> {
        &self.material
    }

    /// Material used by shadow passes, if the object casts shadows
    pub fn shadow_material(&self) -> Option<&Arc<RenderMaterial>> {
        self.shadow_material.as_ref()
    }

    /// Geometry
    pub fn geometry(&self) -> &RenderGeometry {
        &self.geometry
    }

    /// Object to world transform
    pub fn world(&self) -> &Mat4 {
        &self.world
    }

    /// World-space bounds
    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.bounding_sphere
    }

    /// Skinning pose
    pub fn skinned_animation(&self) -> Option<&Arc<RenderSkinnedAnimation>> {
        self.skinned_animation.as_ref()
    }
}
