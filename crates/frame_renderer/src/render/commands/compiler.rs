//! # Render Command Compiler
//!
//! Lowers ordered target render pass groups into one [`RenderCommandBuffer`].
//!
//! ## Buffer layout
//!
//! 1. The snapshot's pre-render list, verbatim.
//! 2. One list per target group: Loads for resources the group uses for the
//!    first time (in first-use order), then Begin, the passes, and End.
//! 3. One list of Unloads for resources nobody but the compiler still holds.
//! 4. The snapshot's post-render list, verbatim.
//!
//! ## Resource lifetime
//!
//! The compiler remembers every resource it has emitted a Load for. Once the
//! tracker holds the only remaining reference, the owner has dropped it and
//! an Unload is emitted. Unloads are ordered target groups, meshes, textures,
//! then shaders, so a target group is always released before its attachments.

use std::collections::HashMap;
use std::sync::Arc;

use super::command::{RenderCommand, RenderCommandBuffer, RenderCommandList};
use crate::render::objects::{RenderDynamicMesh, RenderGeometry};
use crate::render::passes::{RenderPassLight, RenderTarget, TargetRenderPassGroup};
use crate::render::resources::{
    RenderMaterial, RenderMesh, RenderShader, RenderTargetGroup, RenderTexture, ResourceId,
};

/// A resource the compiler has emitted a Load for
#[derive(Debug)]
enum TrackedResource {
    TargetGroup(Arc<RenderTargetGroup>),
    Mesh(Arc<RenderMesh>),
    Texture(Arc<RenderTexture>),
    Shader(Arc<RenderShader>),
}

impl TrackedResource {
    fn strong_count(&self) -> usize {
        match self {
            TrackedResource::TargetGroup(resource) => Arc::strong_count(resource),
            TrackedResource::Mesh(resource) => Arc::strong_count(resource),
            TrackedResource::Texture(resource) => Arc::strong_count(resource),
            TrackedResource::Shader(resource) => Arc::strong_count(resource),
        }
    }

    fn unload_rank(&self) -> u8 {
        match self {
            TrackedResource::TargetGroup(_) => 0,
            TrackedResource::Mesh(_) => 1,
            TrackedResource::Texture(_) => 2,
            TrackedResource::Shader(_) => 3,
        }
    }

    fn into_unload_command(self) -> RenderCommand {
        match self {
            TrackedResource::TargetGroup(target_group) => RenderCommand::UnloadTargetGroup { target_group },
            TrackedResource::Mesh(mesh) => RenderCommand::UnloadMesh { mesh },
            TrackedResource::Texture(texture) => RenderCommand::UnloadTexture { texture },
            TrackedResource::Shader(shader) => RenderCommand::UnloadShader { shader },
        }
    }
}

/// Set of resources with a Load emitted and no Unload yet
#[derive(Debug, Default)]
pub struct ResourceTracker {
    loaded: HashMap<ResourceId, TrackedResource>,
}

impl ResourceTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resources currently considered loaded
    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    /// Whether nothing is loaded
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    /// Whether a Load has been emitted for the resource and no Unload since
    pub fn is_loaded(&self, id: ResourceId) -> bool {
        self.loaded.contains_key(&id)
    }

    fn track_shader(&mut self, shader: &Arc<RenderShader>, loads: &mut RenderCommandList) {
        if !self.loaded.contains_key(&shader.id()) {
            self.loaded.insert(shader.id(), TrackedResource::Shader(shader.clone()));
            loads.push(RenderCommand::LoadShader { shader: shader.clone() });
        }
    }

    fn track_texture(&mut self, texture: &Arc<RenderTexture>, loads: &mut RenderCommandList) {
        if !self.loaded.contains_key(&texture.id()) {
            self.loaded.insert(texture.id(), TrackedResource::Texture(texture.clone()));
            loads.push(RenderCommand::LoadTexture { texture: texture.clone() });
        }
    }

    fn track_mesh(&mut self, mesh: &Arc<RenderMesh>, loads: &mut RenderCommandList) {
        if !self.loaded.contains_key(&mesh.id()) {
            self.loaded.insert(mesh.id(), TrackedResource::Mesh(mesh.clone()));
            loads.push(RenderCommand::LoadMesh { mesh: mesh.clone() });
        }
    }

    fn track_target_group(&mut self, target_group: &Arc<RenderTargetGroup>, loads: &mut RenderCommandList) {
        if self.loaded.contains_key(&target_group.id()) {
            return;
        }
        for attachment in target_group.attachments() {
            self.track_texture(attachment, loads);
        }
        self.loaded
            .insert(target_group.id(), TrackedResource::TargetGroup(target_group.clone()));
        loads.push(RenderCommand::LoadTargetGroup { target_group: target_group.clone() });
    }

    fn track_material(&mut self, material: &RenderMaterial, loads: &mut RenderCommandList) {
        self.track_shader(material.shader(), loads);
        for texture in material.textures() {
            self.track_texture(texture, loads);
        }
    }

    /// Remove every resource the tracker alone still references and return
    /// their Unloads in dependency order
    fn take_expired(&mut self) -> RenderCommandList {
        let mut expired: Vec<(ResourceId, TrackedResource)> = Vec::new();
        let ids: Vec<ResourceId> = self
            .loaded
            .iter()
            .filter(|(_, resource)| resource.strong_count() == 1)
            .map(|(id, _)| *id)
            .collect();

        for id in ids {
            if let Some(resource) = self.loaded.remove(&id) {
                expired.push((id, resource));
            }
        }

        expired.sort_by_key(|(id, resource)| (resource.unload_rank(), *id));
        expired
            .into_iter()
            .map(|(_, resource)| resource.into_unload_command())
            .collect()
    }

    /// Release every tracked resource, in dependency order
    fn take_all(&mut self) -> RenderCommandList {
        let mut all: Vec<(ResourceId, TrackedResource)> = self.loaded.drain().collect();
        all.sort_by_key(|(id, resource)| (resource.unload_rank(), *id));
        all.into_iter().map(|(_, resource)| resource.into_unload_command()).collect()
    }
}

/// Stateful lowering from pass groups to command buffers
#[derive(Debug, Default)]
pub struct RenderCommandCompiler {
    tracker: ResourceTracker,
}

impl RenderCommandCompiler {
    /// Create a compiler with nothing loaded
    pub fn new() -> Self {
        Self::default()
    }

    /// Resources with a Load emitted and no Unload yet
    pub fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    /// Compile one frame
    pub fn compile_render_command_buffer(
        &mut self,
        frame_index: u64,
        target_groups: &[TargetRenderPassGroup],
        dynamic_meshes: Vec<Arc<RenderDynamicMesh>>,
        pre_render_command_list: RenderCommandList,
        post_render_command_list: RenderCommandList,
    ) -> RenderCommandBuffer {
        let mut lists = Vec::with_capacity(target_groups.len() + 3);
        lists.push(pre_render_command_list);

        for group in target_groups {
            lists.push(self.compile_target_group(group));
        }

        let unloads = self.tracker.take_expired();
        if !unloads.is_empty() {
            log::debug!("Frame {}: unloading {} resources", frame_index, unloads.len());
        }
        lists.push(unloads);
        lists.push(post_render_command_list);

        let buffer = RenderCommandBuffer::new(frame_index, lists, dynamic_meshes);
        log::trace!("Frame {}: compiled {} commands", frame_index, buffer.command_count());
        buffer
    }

    /// Compile a buffer that unloads every resource still loaded.
    ///
    /// Used at shutdown so the device can be torn down with nothing live.
    pub fn compile_unload_all(&mut self, frame_index: u64) -> RenderCommandBuffer {
        let unloads = self.tracker.take_all();
        log::debug!("Frame {}: unloading all {} resources", frame_index, unloads.len());
        RenderCommandBuffer::new(frame_index, vec![unloads], Vec::new())
    }

    fn compile_target_group(&mut self, group: &TargetRenderPassGroup) -> RenderCommandList {
        let mut loads = RenderCommandList::new();
        let mut body = RenderCommandList::new();

        match &group.target {
            RenderTarget::Default => body.push(RenderCommand::Begin {
                resolution: group.resolution,
                clear_colour: group.clear_colour,
            }),
            RenderTarget::TargetGroup(target_group) => {
                self.tracker.track_target_group(target_group, &mut loads);
                body.push(RenderCommand::BeginWithTargetGroup {
                    target_group: target_group.clone(),
                    clear_colour: group.clear_colour,
                });
            }
        }

        for camera_group in &group.camera_groups {
            let mut camera_applied = false;

            for pass in camera_group.passes.iter().filter(|pass| !pass.is_empty()) {
                if !camera_applied {
                    body.push(RenderCommand::ApplyCamera {
                        camera: Box::new(camera_group.camera.clone()),
                    });
                    camera_applied = true;
                }

                for light in &pass.lights {
                    body.push(self.light_command(light, &mut loads));
                }

                let mut current_material: Option<&Arc<RenderMaterial>> = None;
                let mut current_geometry: Option<&RenderGeometry> = None;

                for object in &pass.objects {
                    if !current_material.is_some_and(|material| Arc::ptr_eq(material, &object.material)) {
                        self.tracker.track_material(&object.material, &mut loads);
                        body.push(RenderCommand::ApplyMaterial { material: object.material.clone() });
                        current_material = Some(&object.material);
                        // A shader change on the device drops the bound mesh.
                        current_geometry = None;
                    }

                    if !current_geometry.is_some_and(|geometry| geometry.same_as(&object.geometry)) {
                        body.push(match &object.geometry {
                            RenderGeometry::Static(mesh) => {
                                self.tracker.track_mesh(mesh, &mut loads);
                                RenderCommand::ApplyMesh { mesh: mesh.clone() }
                            }
                            RenderGeometry::Dynamic(mesh) => RenderCommand::ApplyDynamicMesh { mesh: mesh.clone() },
                        });
                        current_geometry = Some(&object.geometry);
                    }

                    if let Some(animation) = &object.skinned_animation {
                        body.push(RenderCommand::ApplySkinnedAnimation { animation: animation.clone() });
                    }

                    body.push(RenderCommand::RenderInstance { world: object.world });
                }
            }
        }

        body.push(RenderCommand::End);

        loads.append(&mut body);
        loads
    }

    fn light_command(&mut self, light: &RenderPassLight, loads: &mut RenderCommandList) -> RenderCommand {
        match light {
            RenderPassLight::Ambient(light) => RenderCommand::ApplyAmbientLight { light: *light },
            RenderPassLight::Directional(light) => {
                if let Some(shadow_map) = &light.shadow_map {
                    self.tracker.track_target_group(shadow_map.target_group(), loads);
                }
                RenderCommand::ApplyDirectionalLight { light: light.clone() }
            }
            RenderPassLight::Point(light) => RenderCommand::ApplyPointLight { light: *light },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{BoundingSphere, Colour, Mat4, Resolution};
    use crate::render::commands::RenderCommandKind;
    use crate::render::objects::RenderCamera;
    use crate::render::passes::{CameraRenderPassGroup, RenderPass, RenderPassKind, RenderPassObject};
    use crate::render::resources::MeshLayout;

    fn mesh() -> Arc<RenderMesh> {
        RenderMesh::new(MeshLayout::static_triangles(), vec![0u8; 36 * 3], Vec::new(), BoundingSphere::default())
            .unwrap()
    }

    fn item(material: &Arc<RenderMaterial>, mesh: &Arc<RenderMesh>) -> RenderPassObject {
        RenderPassObject {
            material: material.clone(),
            geometry: RenderGeometry::Static(mesh.clone()),
            world: Mat4::identity(),
            skinned_animation: None,
            depth: 0.0,
        }
    }

    fn main_group(objects: Vec<RenderPassObject>) -> TargetRenderPassGroup {
        TargetRenderPassGroup {
            target: RenderTarget::Default,
            resolution: Resolution::new(640, 480),
            clear_colour: Colour::BLACK,
            camera_groups: vec![CameraRenderPassGroup {
                camera: RenderCamera::new(Mat4::identity(), Mat4::identity()),
                passes: vec![RenderPass::new(RenderPassKind::Opaque, Vec::new(), objects)],
            }],
        }
    }

    fn kinds(buffer: &RenderCommandBuffer) -> Vec<RenderCommandKind> {
        buffer.commands().map(RenderCommand::kind).collect()
    }

    fn compile(compiler: &mut RenderCommandCompiler, groups: &[TargetRenderPassGroup]) -> RenderCommandBuffer {
        compiler.compile_render_command_buffer(0, groups, Vec::new(), RenderCommandList::new(), RenderCommandList::new())
    }

    #[test]
    fn test_shared_material_applied_once() {
        let material = RenderMaterial::builder(RenderShader::new("s", "", "")).build();
        let meshes: Vec<Arc<RenderMesh>> = (0..3).map(|_| mesh()).collect();
        let objects = meshes.iter().map(|mesh| item(&material, mesh)).collect();

        let mut compiler = RenderCommandCompiler::new();
        let buffer = compile(&mut compiler, &[main_group(objects)]);

        let draws: Vec<RenderCommandKind> = kinds(&buffer)
            .into_iter()
            .filter(|kind| !kind.is_load())
            .collect();
        assert_eq!(
            draws,
            vec![
                RenderCommandKind::Begin,
                RenderCommandKind::ApplyCamera,
                RenderCommandKind::ApplyMaterial,
                RenderCommandKind::ApplyMesh,
                RenderCommandKind::RenderInstance,
                RenderCommandKind::ApplyMesh,
                RenderCommandKind::RenderInstance,
                RenderCommandKind::ApplyMesh,
                RenderCommandKind::RenderInstance,
                RenderCommandKind::End,
            ]
        );
    }

    #[test]
    fn test_same_mesh_bound_once() {
        let material = RenderMaterial::builder(RenderShader::new("s", "", "")).build();
        let mesh = mesh();
        let objects = vec![item(&material, &mesh), item(&material, &mesh)];

        let mut compiler = RenderCommandCompiler::new();
        let buffer = compile(&mut compiler, &[main_group(objects)]);
        let apply_meshes = buffer.commands().filter(|command| command.kind() == RenderCommandKind::ApplyMesh).count();
        assert_eq!(apply_meshes, 1);
    }

    #[test]
    fn test_loads_emitted_once_and_before_begin() {
        let material = RenderMaterial::builder(RenderShader::new("s", "", "")).build();
        let mesh = mesh();

        let mut compiler = RenderCommandCompiler::new();
        let first = compile(&mut compiler, &[main_group(vec![item(&material, &mesh)])]);
        assert_eq!(
            &kinds(&first)[..3],
            &[RenderCommandKind::LoadShader, RenderCommandKind::LoadMesh, RenderCommandKind::Begin]
        );

        let second = compile(&mut compiler, &[main_group(vec![item(&material, &mesh)])]);
        assert!(kinds(&second).iter().all(|kind| !kind.is_load()));
        assert_eq!(compiler.tracker().len(), 2);
    }

    #[test]
    fn test_dropped_resources_are_unloaded_in_dependency_order() {
        let shader = RenderShader::new("s", "", "");
        let material = RenderMaterial::builder(shader).build();
        let mesh = mesh();

        let mut compiler = RenderCommandCompiler::new();
        let _ = compile(&mut compiler, &[main_group(vec![item(&material, &mesh)])]);

        drop(material);
        drop(mesh);
        let buffer = compile(&mut compiler, &[main_group(Vec::new())]);
        let unloads: Vec<RenderCommandKind> = kinds(&buffer).into_iter().filter(|kind| kind.is_unload()).collect();

        assert_eq!(unloads, vec![RenderCommandKind::UnloadMesh, RenderCommandKind::UnloadShader]);
        assert!(compiler.tracker().is_empty());
    }

    #[test]
    fn test_empty_group_is_begin_end() {
        let mut compiler = RenderCommandCompiler::new();
        let buffer = compile(&mut compiler, &[main_group(Vec::new())]);
        assert_eq!(kinds(&buffer), vec![RenderCommandKind::Begin, RenderCommandKind::End]);
    }

    #[test]
    fn test_pre_and_post_lists_are_verbatim() {
        let mesh = mesh();
        let mut pre = RenderCommandList::new();
        pre.push(RenderCommand::LoadMesh { mesh: mesh.clone() });
        let mut post = RenderCommandList::new();
        post.push(RenderCommand::UnloadMesh { mesh });

        let mut compiler = RenderCommandCompiler::new();
        let buffer = compiler.compile_render_command_buffer(7, &[main_group(Vec::new())], Vec::new(), pre, post);

        assert_eq!(buffer.frame_index(), 7);
        assert_eq!(
            kinds(&buffer),
            vec![
                RenderCommandKind::LoadMesh,
                RenderCommandKind::Begin,
                RenderCommandKind::End,
                RenderCommandKind::UnloadMesh,
            ]
        );
        // Pre-supplied loads are opaque to the tracker.
        assert!(compiler.tracker().is_empty());
    }

    #[test]
    fn test_unload_all_releases_everything() {
        let material = RenderMaterial::builder(RenderShader::new("s", "", "")).build();
        let mesh = mesh();
        let mut compiler = RenderCommandCompiler::new();
        let _ = compile(&mut compiler, &[main_group(vec![item(&material, &mesh)])]);

        let buffer = compiler.compile_unload_all(1);
        assert_eq!(
            kinds(&buffer),
            vec![RenderCommandKind::UnloadMesh, RenderCommandKind::UnloadShader]
        );
        assert!(compiler.tracker().is_empty());
    }
}
