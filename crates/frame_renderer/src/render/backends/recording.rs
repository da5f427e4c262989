//! Headless device that records every call
//!
//! Resources are kept in handle maps the way a real backend keeps its GPU
//! objects, so stale or foreign handles are caught immediately. Uniform
//! lookup is approximated by searching the program sources for the base
//! uniform name.

use std::collections::HashSet;

use crate::foundation::collections::{key_to_raw, raw_to_key, HandleMap};
use crate::foundation::math::{Colour, Resolution};
use crate::render::api::{
    BackendResult, BlendEquation, ClearFlags, DepthFunction, DynamicMeshBufferHandle, GraphicsDevice, MeshHandle,
    ShaderHandle, TargetGroupHandle, TextureHandle, UniformValue,
};
use crate::render::objects::RenderDynamicMesh;
use crate::render::resources::{
    IndexFormat, MaterialRenderState, PolygonType, RenderMesh, RenderShader, RenderTargetGroup, RenderTexture,
    ResourceId,
};
use crate::render::RenderError;

/// One call received by a [`RecordingDevice`]
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    /// Shader program created
    CreateShader(ShaderHandle),
    /// Shader program destroyed
    DestroyShader(ShaderHandle),
    /// Texture created
    CreateTexture(TextureHandle),
    /// Texture destroyed
    DestroyTexture(TextureHandle),
    /// Mesh created
    CreateMesh(MeshHandle),
    /// Mesh destroyed
    DestroyMesh(MeshHandle),
    /// Framebuffer created
    CreateTargetGroup(TargetGroupHandle),
    /// Framebuffer destroyed
    DestroyTargetGroup(TargetGroupHandle),
    /// Dynamic mesh buffer created
    CreateDynamicMeshBuffer(DynamicMeshBufferHandle),
    /// Framebuffer bound, `None` for the default one
    BindFramebuffer(Option<TargetGroupHandle>),
    /// Viewport set
    SetViewport(Resolution),
    /// Write masks set
    SetWriteMasks {
        /// Colour writes enabled
        colour: bool,
        /// Depth writes enabled
        depth: bool,
    },
    /// Framebuffer cleared
    Clear(Colour, ClearFlags),
    /// Shared fixed-function state set
    SetFixedFunctionState(BlendEquation, DepthFunction),
    /// Program made current
    BindShader(ShaderHandle),
    /// Material render state applied
    ApplyRenderState(MaterialRenderState),
    /// Texture bound to a unit
    BindTexture {
        /// Texture unit
        unit: u32,
        /// Bound texture
        texture: TextureHandle,
    },
    /// Uniform set
    SetUniform {
        /// Uniform name
        name: String,
        /// Whether the program declares it
        found: bool,
    },
    /// Static mesh bound
    BindMesh(MeshHandle),
    /// Dynamic mesh uploaded
    UploadDynamicMesh {
        /// Vertex bytes uploaded
        vertex_bytes: usize,
        /// Index bytes uploaded
        index_bytes: usize,
    },
    /// Indexed draw
    DrawIndexed {
        /// Primitive topology
        polygon_type: PolygonType,
        /// Indices drawn
        index_count: u32,
    },
    /// Non-indexed draw
    DrawArrays {
        /// Primitive topology
        polygon_type: PolygonType,
        /// Vertices drawn
        vertex_count: u32,
    },
}

#[derive(Debug)]
struct ShaderRecord {
    vertex_source: String,
    fragment_source: String,
}

impl ShaderRecord {
    fn declares(&self, name: &str) -> bool {
        let base = name.split(['[', '.']).next().unwrap_or(name);
        self.vertex_source.contains(base) || self.fragment_source.contains(base)
    }
}

/// A [`GraphicsDevice`] that keeps resources in memory and logs every call
#[derive(Debug, Default)]
pub struct RecordingDevice {
    shaders: HandleMap<ShaderRecord>,
    textures: HandleMap<Resolution>,
    meshes: HandleMap<(u32, u32)>,
    target_groups: HandleMap<Resolution>,
    dynamic_buffers: HandleMap<(usize, usize)>,
    failing: HashSet<ResourceId>,
    calls: Vec<DeviceCall>,
    missing_uniforms: Vec<String>,
}

impl RecordingDevice {
    /// Create an empty device
    pub fn new() -> Self {
        Self::default()
    }

    /// Make creation of the given resource fail
    pub fn fail_resource(&mut self, id: ResourceId) {
        self.failing.insert(id);
    }

    /// Every call received so far
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// Forget the recorded calls
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Uniform names set on programs that do not declare them
    pub fn missing_uniforms(&self) -> &[String] {
        &self.missing_uniforms
    }

    /// Number of live shader programs
    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    /// Number of live textures
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Number of live meshes
    pub fn live_meshes(&self) -> usize {
        self.meshes.len()
    }

    /// Number of live framebuffers
    pub fn live_target_groups(&self) -> usize {
        self.target_groups.len()
    }

    /// Number of draw calls recorded
    pub fn draw_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DeviceCall::DrawIndexed { .. } | DeviceCall::DrawArrays { .. }))
            .count()
    }

    fn check_failure(&self, id: ResourceId, what: &str) -> BackendResult<()> {
        if self.failing.contains(&id) {
            return Err(RenderError::ResourceCreationFailed(format!("{what} {id:?} rejected by device")));
        }
        Ok(())
    }

    fn shader(&self, handle: ShaderHandle) -> &ShaderRecord {
        match self.shaders.get(raw_to_key(handle.0)) {
            Some(record) => record,
            None => panic!("Stale shader handle {handle:?}"),
        }
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_shader(&mut self, shader: &RenderShader) -> BackendResult<ShaderHandle> {
        self.check_failure(shader.id(), "Shader")?;
        let key = self.shaders.insert(ShaderRecord {
            vertex_source: shader.vertex_source().to_owned(),
            fragment_source: shader.fragment_source().to_owned(),
        });
        let handle = ShaderHandle(key_to_raw(key));
        self.calls.push(DeviceCall::CreateShader(handle));
        Ok(handle)
    }

    fn destroy_shader(&mut self, handle: ShaderHandle) {
        assert!(self.shaders.remove(raw_to_key(handle.0)).is_some(), "Stale shader handle {handle:?}");
        self.calls.push(DeviceCall::DestroyShader(handle));
    }

    fn create_texture(&mut self, texture: &RenderTexture) -> BackendResult<TextureHandle> {
        self.check_failure(texture.id(), "Texture")?;
        let key = self.textures.insert(texture.descriptor().dimensions);
        let handle = TextureHandle(key_to_raw(key));
        self.calls.push(DeviceCall::CreateTexture(handle));
        Ok(handle)
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        assert!(self.textures.remove(raw_to_key(handle.0)).is_some(), "Stale texture handle {handle:?}");
        self.calls.push(DeviceCall::DestroyTexture(handle));
    }

    fn create_mesh(&mut self, mesh: &RenderMesh) -> BackendResult<MeshHandle> {
        self.check_failure(mesh.id(), "Mesh")?;
        let key = self.meshes.insert((mesh.num_vertices(), mesh.num_indices()));
        let handle = MeshHandle(key_to_raw(key));
        self.calls.push(DeviceCall::CreateMesh(handle));
        Ok(handle)
    }

    fn destroy_mesh(&mut self, handle: MeshHandle) {
        assert!(self.meshes.remove(raw_to_key(handle.0)).is_some(), "Stale mesh handle {handle:?}");
        self.calls.push(DeviceCall::DestroyMesh(handle));
    }

    fn create_target_group(
        &mut self,
        group: &RenderTargetGroup,
        colour: Option<TextureHandle>,
        depth: Option<TextureHandle>,
    ) -> BackendResult<TargetGroupHandle> {
        self.check_failure(group.id(), "Target group")?;
        for attachment in colour.iter().chain(depth.iter()) {
            assert!(
                self.textures.contains_key(raw_to_key(attachment.0)),
                "Target group attachment {attachment:?} is not a live texture"
            );
        }
        let key = self.target_groups.insert(group.resolution());
        let handle = TargetGroupHandle(key_to_raw(key));
        self.calls.push(DeviceCall::CreateTargetGroup(handle));
        Ok(handle)
    }

    fn destroy_target_group(&mut self, handle: TargetGroupHandle) {
        assert!(
            self.target_groups.remove(raw_to_key(handle.0)).is_some(),
            "Stale target group handle {handle:?}"
        );
        self.calls.push(DeviceCall::DestroyTargetGroup(handle));
    }

    fn create_dynamic_mesh_buffer(
        &mut self,
        max_vertex_bytes: usize,
        max_index_bytes: usize,
    ) -> BackendResult<DynamicMeshBufferHandle> {
        let key = self.dynamic_buffers.insert((max_vertex_bytes, max_index_bytes));
        let handle = DynamicMeshBufferHandle(key_to_raw(key));
        self.calls.push(DeviceCall::CreateDynamicMeshBuffer(handle));
        Ok(handle)
    }

    fn bind_framebuffer(&mut self, target: Option<TargetGroupHandle>) {
        if let Some(handle) = target {
            assert!(
                self.target_groups.contains_key(raw_to_key(handle.0)),
                "Stale target group handle {handle:?}"
            );
        }
        self.calls.push(DeviceCall::BindFramebuffer(target));
    }

    fn set_viewport(&mut self, resolution: Resolution) {
        self.calls.push(DeviceCall::SetViewport(resolution));
    }

    fn set_write_masks(&mut self, colour: bool, depth: bool) {
        self.calls.push(DeviceCall::SetWriteMasks { colour, depth });
    }

    fn clear(&mut self, colour: Colour, flags: ClearFlags) {
        self.calls.push(DeviceCall::Clear(colour, flags));
    }

    fn set_fixed_function_state(&mut self, equation: BlendEquation, depth: DepthFunction) {
        self.calls.push(DeviceCall::SetFixedFunctionState(equation, depth));
    }

    fn bind_shader(&mut self, shader: ShaderHandle) {
        self.shader(shader);
        self.calls.push(DeviceCall::BindShader(shader));
    }

    fn apply_render_state(&mut self, state: &MaterialRenderState) {
        self.calls.push(DeviceCall::ApplyRenderState(*state));
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        assert!(
            self.textures.contains_key(raw_to_key(texture.0)),
            "Stale texture handle {texture:?}"
        );
        self.calls.push(DeviceCall::BindTexture { unit, texture });
    }

    fn set_uniform(&mut self, shader: ShaderHandle, name: &str, _value: &UniformValue) -> bool {
        let found = self.shader(shader).declares(name);
        if !found {
            self.missing_uniforms.push(name.to_owned());
        }
        self.calls.push(DeviceCall::SetUniform {
            name: name.to_owned(),
            found,
        });
        found
    }

    fn bind_mesh(&mut self, shader: ShaderHandle, mesh: MeshHandle) {
        self.shader(shader);
        assert!(self.meshes.contains_key(raw_to_key(mesh.0)), "Stale mesh handle {mesh:?}");
        self.calls.push(DeviceCall::BindMesh(mesh));
    }

    fn upload_dynamic_mesh(&mut self, shader: ShaderHandle, buffer: DynamicMeshBufferHandle, mesh: &RenderDynamicMesh) {
        self.shader(shader);
        let Some(&(max_vertex_bytes, max_index_bytes)) = self.dynamic_buffers.get(raw_to_key(buffer.0)) else {
            panic!("Stale dynamic mesh buffer handle {buffer:?}");
        };
        assert!(
            mesh.vertex_data().len() <= max_vertex_bytes && mesh.index_data().len() <= max_index_bytes,
            "Dynamic mesh does not fit the scratch buffer"
        );
        self.calls.push(DeviceCall::UploadDynamicMesh {
            vertex_bytes: mesh.vertex_data().len(),
            index_bytes: mesh.index_data().len(),
        });
    }

    fn draw_indexed(&mut self, polygon_type: PolygonType, index_count: u32, _index_format: IndexFormat) {
        self.calls.push(DeviceCall::DrawIndexed {
            polygon_type,
            index_count,
        });
    }

    fn draw_arrays(&mut self, polygon_type: PolygonType, vertex_count: u32) {
        self.calls.push(DeviceCall::DrawArrays {
            polygon_type,
            vertex_count,
        });
    }
}
