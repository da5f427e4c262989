//! Shader programs

use std::sync::Arc;

use super::backend_slot::{BackendSlot, ResourceId};
use crate::render::api::ShaderHandle;

/// A vertex/fragment program pair.
///
/// Sources are kept for the lifetime of the resource so the program can be
/// recompiled by a Load command after an Unload.
#[derive(Debug)]
pub struct RenderShader {
    id: ResourceId,
    name: String,
    vertex_source: Arc<str>,
    fragment_source: Arc<str>,
    backend: BackendSlot<ShaderHandle>,
}

impl RenderShader {
    /// Create a shader from its sources
    pub fn new(name: impl Into<String>, vertex_source: impl Into<Arc<str>>, fragment_source: impl Into<Arc<str>>) -> Arc<Self> {
        Arc::new(Self {
            id: ResourceId::next(),
            name: name.into(),
            vertex_source: vertex_source.into(),
            fragment_source: fragment_source.into(),
            backend: BackendSlot::new(),
        })
    }

    /// Process-unique identity
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Debug name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Vertex stage source
    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    /// Fragment stage source
    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    /// Backend slot written by Load/Unload commands
    pub fn backend(&self) -> &BackendSlot<ShaderHandle> {
        &self.backend
    }
}
