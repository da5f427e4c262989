//! Static GPU meshes

use std::sync::Arc;

use super::backend_slot::{BackendSlot, ResourceId};
use super::formats::MeshLayout;
use crate::foundation::math::BoundingSphere;
use crate::render::api::MeshHandle;
use crate::render::{RenderError, RenderResult};

/// Validate raw buffers against a layout and return `(vertices, indices)` counts
pub(crate) fn count_elements(layout: &MeshLayout, vertex_data: &[u8], index_data: &[u8]) -> RenderResult<(u32, u32)> {
    let stride = layout.vertex_format.stride();
    if stride == 0 || vertex_data.len() % stride != 0 {
        return Err(RenderError::ResourceCreationFailed(format!(
            "Vertex data of {} bytes is not a multiple of the {} byte stride",
            vertex_data.len(),
            stride
        )));
    }

    let index_size = layout.index_format.size();
    if index_data.len() % index_size != 0 {
        return Err(RenderError::ResourceCreationFailed(format!(
            "Index data of {} bytes is not a multiple of the {} byte index size",
            index_data.len(),
            index_size
        )));
    }

    let vertices = u32::try_from(vertex_data.len() / stride)
        .map_err(|_| RenderError::ResourceCreationFailed("Too many vertices".to_string()))?;
    let indices = u32::try_from(index_data.len() / index_size)
        .map_err(|_| RenderError::ResourceCreationFailed("Too many indices".to_string()))?;

    Ok((vertices, indices))
}

/// Immutable mesh whose buffers live on the GPU once loaded
#[derive(Debug)]
pub struct RenderMesh {
    id: ResourceId,
    layout: MeshLayout,
    vertex_data: Arc<[u8]>,
    index_data: Arc<[u8]>,
    num_vertices: u32,
    num_indices: u32,
    bounding_sphere: BoundingSphere,
    backend: BackendSlot<MeshHandle>,
}

impl RenderMesh {
    /// Create a mesh from interleaved vertex bytes and index bytes.
    ///
    /// An empty index buffer produces a non-indexed mesh.
    ///
    /// # Errors
    /// Fails when the buffers do not divide evenly by the layout's strides.
    pub fn new(
        layout: MeshLayout,
        vertex_data: impl Into<Arc<[u8]>>,
        index_data: impl Into<Arc<[u8]>>,
        bounding_sphere: BoundingSphere,
    ) -> RenderResult<Arc<Self>> {
        let vertex_data = vertex_data.into();
        let index_data = index_data.into();
        let (num_vertices, num_indices) = count_elements(&layout, &vertex_data, &index_data)?;

        Ok(Arc::new(Self {
            id: ResourceId::next(),
            layout,
            vertex_data,
            index_data,
            num_vertices,
            num_indices,
            bounding_sphere,
            backend: BackendSlot::new(),
        }))
    }

    /// Create a mesh from typed vertices and 16-bit indices
    pub fn from_vertices<V: bytemuck::Pod>(
        layout: MeshLayout,
        vertices: &[V],
        indices: &[u16],
        bounding_sphere: BoundingSphere,
    ) -> RenderResult<Arc<Self>> {
        Self::new(
            layout,
            bytemuck::cast_slice::<V, u8>(vertices),
            bytemuck::cast_slice::<u16, u8>(indices),
            bounding_sphere,
        )
    }

    /// Process-unique identity
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Buffer layout
    pub fn layout(&self) -> &MeshLayout {
        &self.layout
    }

    /// Raw interleaved vertex bytes
    pub fn vertex_data(&self) -> &[u8] {
        &self.vertex_data
    }

    /// Raw index bytes
    pub fn index_data(&self) -> &[u8] {
        &self.index_data
    }

    /// Vertex count
    pub fn num_vertices(&self) -> u32 {
        self.num_vertices
    }

    /// Index count, zero for non-indexed meshes
    pub fn num_indices(&self) -> u32 {
        self.num_indices
    }

    /// Local-space bounds
    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.bounding_sphere
    }

    /// Backend slot written by Load/Unload commands
    pub fn backend(&self) -> &BackendSlot<MeshHandle> {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[repr(C)]
    #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
    struct StaticVertex {
        position: [f32; 4],
        normal: [f32; 3],
        uv: [f32; 2],
    }

    #[test]
    fn test_mesh_counts_from_typed_vertices() {
        let vertex = StaticVertex { position: [0.0; 4], normal: [0.0, 1.0, 0.0], uv: [0.0; 2] };
        let mesh = RenderMesh::from_vertices(
            MeshLayout::static_triangles(),
            &[vertex; 4],
            &[0, 1, 2, 2, 3, 0],
            BoundingSphere::new(Vec3::zeros(), 1.0),
        )
        .unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_indices(), 6);
        assert!(!mesh.backend().is_loaded());
    }

    #[test]
    fn test_mesh_rejects_partial_vertex() {
        let result = RenderMesh::new(MeshLayout::static_triangles(), vec![0u8; 40], Vec::new(), BoundingSphere::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_non_indexed_mesh() {
        let mesh = RenderMesh::new(MeshLayout::static_triangles(), vec![0u8; 36 * 3], Vec::new(), BoundingSphere::default()).unwrap();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_indices(), 0);
    }
}
