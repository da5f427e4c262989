//! Textures and render-target attachments

use std::sync::Arc;

use super::backend_slot::{BackendSlot, ResourceId};
use super::formats::TextureDescriptor;
use crate::render::api::TextureHandle;
use crate::render::{RenderError, RenderResult};

/// A texture resource.
///
/// Textures without pixel data are render-target attachments whose contents
/// are produced on the GPU.
#[derive(Debug)]
pub struct RenderTexture {
    id: ResourceId,
    descriptor: TextureDescriptor,
    data: Option<Arc<[u8]>>,
    backend: BackendSlot<TextureHandle>,
}

impl RenderTexture {
    /// Create a texture from decoded pixel data.
    ///
    /// # Errors
    /// Fails when the data length does not match the descriptor.
    pub fn new(descriptor: TextureDescriptor, data: impl Into<Arc<[u8]>>) -> RenderResult<Arc<Self>> {
        let data = data.into();
        if data.len() != descriptor.data_size() {
            return Err(RenderError::ResourceCreationFailed(format!(
                "Texture data is {} bytes, expected {} for {:?}",
                data.len(),
                descriptor.data_size(),
                descriptor
            )));
        }

        Ok(Arc::new(Self {
            id: ResourceId::next(),
            descriptor,
            data: Some(data),
            backend: BackendSlot::new(),
        }))
    }

    /// Create a texture with no CPU-side contents, for use as a target attachment
    pub fn attachment(descriptor: TextureDescriptor) -> Arc<Self> {
        Arc::new(Self {
            id: ResourceId::next(),
            descriptor,
            data: None,
            backend: BackendSlot::new(),
        })
    }

    /// Process-unique identity
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Immutable description
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    /// Level-0 pixel data, if any
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Backend slot written by Load/Unload commands
    pub fn backend(&self) -> &BackendSlot<TextureHandle> {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Resolution;
    use crate::render::resources::formats::ImageFormat;

    #[test]
    fn test_texture_rejects_wrong_data_size() {
        let descriptor = TextureDescriptor::new(Resolution::new(2, 2), ImageFormat::Rgba8888);
        assert!(RenderTexture::new(descriptor.clone(), vec![0u8; 15]).is_err());
        assert!(RenderTexture::new(descriptor, vec![0u8; 16]).is_ok());
    }

    #[test]
    fn test_attachment_has_no_data() {
        let texture = RenderTexture::attachment(TextureDescriptor::new(Resolution::new(64, 64), ImageFormat::Depth16));
        assert!(texture.data().is_none());
        assert!(!texture.backend().is_loaded());
    }
}
