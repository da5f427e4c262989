//! Off-screen render targets

use std::sync::Arc;

use super::backend_slot::{BackendSlot, ResourceId};
use super::texture::RenderTexture;
use crate::foundation::math::Resolution;
use crate::render::api::TargetGroupHandle;
use crate::render::{RenderError, RenderResult};

/// A colour and/or depth attachment pair that passes can render into
#[derive(Debug)]
pub struct RenderTargetGroup {
    id: ResourceId,
    resolution: Resolution,
    colour_target: Option<Arc<RenderTexture>>,
    depth_target: Option<Arc<RenderTexture>>,
    backend: BackendSlot<TargetGroupHandle>,
}

impl RenderTargetGroup {
    /// Create a target group.
    ///
    /// # Errors
    /// At least one attachment is required and every attachment must match
    /// the group's resolution.
    pub fn new(colour_target: Option<Arc<RenderTexture>>, depth_target: Option<Arc<RenderTexture>>) -> RenderResult<Arc<Self>> {
        let resolution = match (&colour_target, &depth_target) {
            (Some(colour), _) => colour.descriptor().dimensions,
            (None, Some(depth)) => depth.descriptor().dimensions,
            (None, None) => {
                return Err(RenderError::ResourceCreationFailed(
                    "A render target group needs a colour or depth attachment".to_string(),
                ))
            }
        };

        if let Some(depth) = &depth_target {
            if !depth.descriptor().format.is_depth() {
                return Err(RenderError::ResourceCreationFailed(
                    "Depth attachment must use a depth format".to_string(),
                ));
            }
            if depth.descriptor().dimensions != resolution {
                return Err(RenderError::ResourceCreationFailed(format!(
                    "Attachment resolutions differ: {:?} vs {:?}",
                    resolution,
                    depth.descriptor().dimensions
                )));
            }
        }

        Ok(Arc::new(Self {
            id: ResourceId::next(),
            resolution,
            colour_target,
            depth_target,
            backend: BackendSlot::new(),
        }))
    }

    /// Process-unique identity
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Size of the attachments
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Colour attachment
    pub fn colour_target(&self) -> Option<&Arc<RenderTexture>> {
        self.colour_target.as_ref()
    }

    /// Depth attachment
    pub fn depth_target(&self) -> Option<&Arc<RenderTexture>> {
        self.depth_target.as_ref()
    }

    /// All attachments, colour first
    pub fn attachments(&self) -> impl Iterator<Item = &Arc<RenderTexture>> {
        self.colour_target.iter().chain(self.depth_target.iter())
    }

    /// Backend slot written by Load/Unload commands
    pub fn backend(&self) -> &BackendSlot<TargetGroupHandle> {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::resources::formats::{ImageFormat, TextureDescriptor};

    #[test]
    fn test_target_group_requires_attachment() {
        assert!(RenderTargetGroup::new(None, None).is_err());
    }

    #[test]
    fn test_depth_only_target_group() {
        let depth = RenderTexture::attachment(TextureDescriptor::new(Resolution::new(512, 512), ImageFormat::Depth16));
        let group = RenderTargetGroup::new(None, Some(depth)).unwrap();
        assert_eq!(group.resolution(), Resolution::new(512, 512));
        assert_eq!(group.attachments().count(), 1);
    }

    #[test]
    fn test_depth_attachment_must_be_depth_format() {
        let colour = RenderTexture::attachment(TextureDescriptor::new(Resolution::new(8, 8), ImageFormat::Rgba8888));
        assert!(RenderTargetGroup::new(None, Some(colour)).is_err());
    }
}
