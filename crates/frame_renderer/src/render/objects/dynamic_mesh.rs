//! Transient per-frame geometry
//!
//! Dynamic meshes carry their bytes inline and are streamed into a scratch
//! buffer on the render thread every time they are applied. They never get a
//! backend object of their own and live only as long as the command buffer
//! that references them.

use std::sync::Arc;

use crate::foundation::math::BoundingSphere;
use crate::render::resources::mesh::count_elements;
use crate::render::resources::{MeshLayout, ResourceId};
use crate::render::RenderResult;

/// Geometry generated for a single frame (sprites, particles, text)
#[derive(Debug)]
pub struct RenderDynamicMesh {
    id: ResourceId,
    layout: MeshLayout,
    vertex_data: Vec<u8>,
    index_data: Vec<u8>,
    num_vertices: u32,
    num_indices: u32,
    bounding_sphere: BoundingSphere,
}

impl RenderDynamicMesh {
    /// Create a dynamic mesh from raw bytes.
    ///
    /// # Errors
    /// Fails when the buffers do not divide evenly by the layout's strides.
    pub fn new(
        layout: MeshLayout,
        vertex_data: Vec<u8>,
        index_data: Vec<u8>,
        bounding_sphere: BoundingSphere,
    ) -> RenderResult<Arc<Self>> {
        let (num_vertices, num_indices) = count_elements(&layout, &vertex_data, &index_data)?;

        Ok(Arc::new(Self {
            id: ResourceId::next(),
            layout,
            vertex_data,
            index_data,
            num_vertices,
            num_indices,
            bounding_sphere,
        }))
    }

    /// Create a dynamic mesh from typed vertices and 16-bit indices
    pub fn from_vertices<V: bytemuck::Pod>(
        layout: MeshLayout,
        vertices: &[V],
        indices: &[u16],
        bounding_sphere: BoundingSphere,
    ) -> RenderResult<Arc<Self>> {
        Self::new(
            layout,
            bytemuck::cast_slice::<V, u8>(vertices).to_vec(),
            bytemuck::cast_slice::<u16, u8>(indices).to_vec(),
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::resources::{IndexFormat, PolygonType, VertexFormat};

    #[repr(C)]
    #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
    struct SpriteVertex {
        position: [f32; 4],
        uv: [f32; 2],
        colour: [u8; 4],
    }

    #[test]
    fn test_sprite_quad() {
        let layout = MeshLayout {
            vertex_format: VertexFormat::sprite(),
            polygon_type: PolygonType::Triangle,
            index_format: IndexFormat::Short,
        };
        let vertex = SpriteVertex { position: [0.0; 4], uv: [0.0; 2], colour: [255; 4] };
        let mesh = RenderDynamicMesh::from_vertices(layout, &[vertex; 4], &[0, 1, 2, 2, 1, 3], BoundingSphere::default())
            .unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_indices(), 6);
        assert_eq!(mesh.vertex_data().len(), 4 * 28);
    }

    #[test]
    fn test_odd_index_bytes_rejected() {
        let result = RenderDynamicMesh::new(MeshLayout::static_triangles(), vec![0; 36], vec![0; 3], BoundingSphere::default());
        assert!(result.is_err());
    }
}
