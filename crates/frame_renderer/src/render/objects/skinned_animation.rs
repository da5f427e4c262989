//! Skinning pose for one animated instance

use std::sync::Arc;

use crate::foundation::math::Mat4;
use crate::render::resources::ResourceId;

/// Joint matrices for one frame of a skinned object
#[derive(Debug)]
pub struct RenderSkinnedAnimation {
    id: ResourceId,
    joints: Vec<Mat4>,
}

impl RenderSkinnedAnimation {
    /// Create a pose from joint-space to model-space matrices
    pub fn new(joints: Vec<Mat4>) -> Arc<Self> {
        Arc::new(Self { id: ResourceId::next(), joints })
    }

    /// Process-unique identity
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Joint matrices in skeleton order
    pub fn joints(&self) -> &[Mat4] {
        &self.joints
    }
}
