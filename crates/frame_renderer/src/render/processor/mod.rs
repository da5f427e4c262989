//! # Render Command Processor
//!
//! Replays command buffers against a [`GraphicsDevice`] on the render thread.
//!
//! ## State machine
//!
//! The processor starts uninitialised. The first call to
//! [`RenderCommandProcessor::process`] allocates the texture unit manager and
//! the dynamic mesh scratch buffer. After that it alternates between being
//! between passes and inside a `Begin`/`End` pair:
//!
//! - `Begin`/`BeginWithTargetGroup` open a pass with an empty cache, bind and
//!   clear the target and set the fixed-function state.
//! - `ApplyCamera` and the light commands update the cache and invalidate the
//!   material, because camera and lights reach the shader through it.
//! - `ApplyMaterial` is skipped for the material already bound. A new shader
//!   drops the bound geometry. Textures, uniforms and lights are always pushed.
//! - Geometry, animation and `RenderInstance` require a bound material.
//! - `End` closes the pass and empties the cache.
//! - Loads and Unloads are legal anywhere and empty the cache first.
//!
//! ## Failure semantics
//!
//! Ordering violations and use of unloaded resources are bugs in the command
//! stream and panic. A device failure while loading is logged and leaves the
//! resource unloaded, so the first use of it panics. Missing uniforms are
//! ignored, except for custom material variables which are logged.

mod bound_state;
pub mod texture_units;

use std::sync::Arc;

use bound_state::BoundState;
pub use texture_units::TextureUnitManager;

use crate::core::config::RendererConfig;
use crate::foundation::math::{utils, Colour, Mat4, Resolution};
use crate::render::api::{
    uniforms, BlendEquation, ClearFlags, DepthFunction, DynamicMeshBufferHandle, GraphicsDevice, ShaderHandle,
    TargetGroupHandle, UniformValue,
};
use crate::render::commands::{RenderCommand, RenderCommandBuffer};
use crate::render::objects::{RenderCamera, RenderDynamicMesh, RenderSkinnedAnimation};
use crate::render::resources::{RenderMaterial, RenderMesh, RenderShader, RenderTargetGroup, RenderTexture};
use crate::render::{RenderError, RenderResult};

/// Counters for one processed buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorStats {
    /// Commands executed
    pub commands: usize,
    /// Draw calls issued
    pub draw_calls: usize,
    /// Shader programs bound
    pub shader_binds: usize,
    /// Textures bound to units
    pub texture_binds: usize,
    /// Material applications that reached the device
    pub material_applies: usize,
    /// Material applications skipped by the cache
    pub material_skips: usize,
    /// Static and dynamic mesh binds
    pub mesh_binds: usize,
    /// Backend resources created
    pub loads: usize,
    /// Backend resources destroyed
    pub unloads: usize,
    /// Loads the device rejected
    pub load_failures: usize,
}

/// Objects created on first use
#[derive(Debug)]
struct ProcessorContext {
    texture_units: TextureUnitManager,
    dynamic_mesh_buffer: DynamicMeshBufferHandle,
}

/// Executes command buffers on the render thread
#[derive(Debug)]
pub struct RenderCommandProcessor<D: GraphicsDevice> {
    device: D,
    max_texture_units: u32,
    max_dynamic_vertex_bytes: usize,
    max_dynamic_index_bytes: usize,
    context: Option<ProcessorContext>,
    state: BoundState,
    stats: ProcessorStats,
}

impl<D: GraphicsDevice> RenderCommandProcessor<D> {
    /// Create a processor driving `device`
    pub fn new(device: D, config: &RendererConfig) -> Self {
        Self {
            device,
            max_texture_units: config.max_texture_units,
            max_dynamic_vertex_bytes: config.max_dynamic_vertex_bytes,
            max_dynamic_index_bytes: config.max_dynamic_index_bytes,
            context: None,
            state: BoundState::default(),
            stats: ProcessorStats::default(),
        }
    }

    /// The device being driven
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Mutable access to the device
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Give the device back
    pub fn into_device(self) -> D {
        self.device
    }

    /// Counters for the most recently processed buffer
    pub fn last_stats(&self) -> ProcessorStats {
        self.stats
    }

    /// Whether lazy initialisation has happened
    pub fn is_initialised(&self) -> bool {
        self.context.is_some()
    }

    /// Execute every command of a buffer in order.
    ///
    /// # Errors
    /// Fails only when first-use initialisation cannot allocate device objects.
    ///
    /// # Panics
    /// On any command-ordering contract violation.
    pub fn process(&mut self, buffer: &RenderCommandBuffer) -> RenderResult<ProcessorStats> {
        self.initialise()?;
        self.stats = ProcessorStats::default();

        for command in buffer.commands() {
            log::trace!("Processing {:?}", command.kind());
            self.stats.commands += 1;
            self.execute(command);
        }

        log::debug!("Frame {} processed: {:?}", buffer.frame_index(), self.stats);
        Ok(self.stats)
    }

    fn initialise(&mut self) -> RenderResult<()> {
        if self.context.is_some() {
            return Ok(());
        }

        let dynamic_mesh_buffer = self
            .device
            .create_dynamic_mesh_buffer(self.max_dynamic_vertex_bytes, self.max_dynamic_index_bytes)
            .map_err(|e| RenderError::InitializationFailed(format!("Dynamic mesh buffer: {e}")))?;

        self.context = Some(ProcessorContext {
            texture_units: TextureUnitManager::new(self.max_texture_units),
            dynamic_mesh_buffer,
        });

        log::info!(
            "Render command processor initialised with {} texture units",
            self.max_texture_units
        );
        Ok(())
    }

    fn context_mut(context: &mut Option<ProcessorContext>) -> &mut ProcessorContext {
        match context.as_mut() {
            Some(context) => context,
            None => panic!("Render command processor used before initialisation"),
        }
    }

    fn execute(&mut self, command: &RenderCommand) {
        match command {
            RenderCommand::LoadShader { shader } => self.load_shader(shader),
            RenderCommand::LoadTexture { texture } => self.load_texture(texture),
            RenderCommand::LoadMesh { mesh } => self.load_mesh(mesh),
            RenderCommand::LoadTargetGroup { target_group } => self.load_target_group(target_group),
            RenderCommand::Begin { resolution, clear_colour } => self.begin(None, *resolution, *clear_colour),
            RenderCommand::BeginWithTargetGroup { target_group, clear_colour } => {
                let Some(handle) = target_group.backend().get() else {
                    panic!("BeginWithTargetGroup on a target group that is not loaded");
                };
                self.begin(Some(handle), target_group.resolution(), *clear_colour);
            }
            RenderCommand::ApplyCamera { camera } => self.apply_camera(camera),
            RenderCommand::ApplyAmbientLight { light } => {
                self.assert_in_pass("ApplyAmbientLight");
                self.state.lights.set_ambient(light.colour);
                self.state.invalidate_material();
            }
            RenderCommand::ApplyDirectionalLight { light } => {
                self.assert_in_pass("ApplyDirectionalLight");
                self.state.lights.add_directional(light.clone());
                self.state.invalidate_material();
            }
            RenderCommand::ApplyPointLight { light } => {
                self.assert_in_pass("ApplyPointLight");
                self.state.lights.add_point(*light);
                self.state.invalidate_material();
            }
            RenderCommand::ApplyMaterial { material } => self.apply_material(material),
            RenderCommand::ApplyMesh { mesh } => self.apply_mesh(mesh),
            RenderCommand::ApplyDynamicMesh { mesh } => self.apply_dynamic_mesh(mesh),
            RenderCommand::ApplySkinnedAnimation { animation } => self.apply_skinned_animation(animation),
            RenderCommand::RenderInstance { world } => self.render_instance(world),
            RenderCommand::End => {
                self.assert_in_pass("End");
                self.state.end_pass();
            }
            RenderCommand::UnloadShader { shader } => self.unload_shader(shader),
            RenderCommand::UnloadTexture { texture } => self.unload_texture(texture),
            RenderCommand::UnloadMesh { mesh } => self.unload_mesh(mesh),
            RenderCommand::UnloadTargetGroup { target_group } => self.unload_target_group(target_group),
        }
    }

    fn assert_in_pass(&self, command: &str) {
        assert!(self.state.in_pass, "{command} issued outside of a Begin/End pair");
    }

    /// Resource mutations invalidate every cached binding
    fn reset_cache(&mut self) {
        self.state.reset();
        if let Some(context) = self.context.as_mut() {
            context.texture_units.invalidate();
        }
    }

    fn begin(&mut self, target: Option<TargetGroupHandle>, resolution: Resolution, clear_colour: Colour) {
        assert!(!self.state.in_pass, "Begin issued while a pass is already open");
        self.state.begin_pass();
        Self::context_mut(&mut self.context).texture_units.invalidate();

        self.device.bind_framebuffer(target);
        self.device.set_viewport(resolution);
        self.device.set_write_masks(true, true);
        self.device.clear(clear_colour, ClearFlags::COLOUR | ClearFlags::DEPTH);
        self.device
            .set_fixed_function_state(BlendEquation::Add, DepthFunction::LessOrEqual);
    }

    fn apply_camera(&mut self, camera: &RenderCamera) {
        self.assert_in_pass("ApplyCamera");
        self.state.set_camera(Box::new(camera.clone()));
    }

    fn apply_material(&mut self, material: &Arc<RenderMaterial>) {
        self.assert_in_pass("ApplyMaterial");

        if self
            .state
            .material
            .as_ref()
            .is_some_and(|bound| Arc::ptr_eq(bound, material))
        {
            self.stats.material_skips += 1;
            return;
        }

        let shader = material.shader();
        let Some(shader_handle) = shader.backend().get() else {
            panic!("ApplyMaterial with shader '{}' that is not loaded", shader.name());
        };

        if !self.state.is_shader_bound(shader) {
            self.state.bind_shader(shader.clone(), shader_handle);
            self.device.bind_shader(shader_handle);
            self.stats.shader_binds += 1;
        }

        self.device.apply_render_state(material.render_state());

        let context = Self::context_mut(&mut self.context);
        context.texture_units.begin_material();
        for (index, texture) in material.textures().iter().enumerate() {
            let Some(texture_handle) = texture.backend().get() else {
                panic!("ApplyMaterial with texture {:?} that is not loaded", texture.id());
            };
            let (unit, bound) = context.texture_units.bind(&mut self.device, texture_handle);
            if bound {
                self.stats.texture_binds += 1;
            }
            self.device
                .set_uniform(shader_handle, &uniforms::texture(index), &UniformValue::Int(unit_as_int(unit)));
        }

        if let Some(camera) = &self.state.camera {
            self.device.set_uniform(
                shader_handle,
                uniforms::VIEW_PROJECTION_MATRIX,
                &UniformValue::Mat4(*camera.view_projection()),
            );
            self.device
                .set_uniform(shader_handle, uniforms::CAMERA_POSITION, &UniformValue::Vec3(camera.position()));
        }

        self.device
            .set_uniform(shader_handle, uniforms::EMISSIVE, &UniformValue::Colour(material.emissive()));
        self.device
            .set_uniform(shader_handle, uniforms::AMBIENT, &UniformValue::Colour(material.ambient()));
        self.device
            .set_uniform(shader_handle, uniforms::DIFFUSE, &UniformValue::Colour(material.diffuse()));
        self.device
            .set_uniform(shader_handle, uniforms::SPECULAR, &UniformValue::Colour(material.specular()));

        for (name, value) in material.variables().iter() {
            if !self.device.set_uniform(shader_handle, name, value) {
                log::warn!("Shader '{}' has no uniform '{}'", shader.name(), name);
            }
        }

        // Last, so shadow maps take the units after the material's textures.
        self.apply_lights(shader_handle);

        self.state.material = Some(material.clone());
        self.state.lights.seal();
        self.stats.material_applies += 1;
    }

    fn apply_lights(&mut self, shader: ShaderHandle) {
        let lights = &self.state.lights;
        let context = Self::context_mut(&mut self.context);

        self.device.set_uniform(
            shader,
            uniforms::AMBIENT_LIGHT_COLOUR,
            &UniformValue::Colour(lights.ambient.unwrap_or(Colour::BLACK)),
        );

        for (index, light) in lights.directional.iter().enumerate() {
            self.device.set_uniform(
                shader,
                &uniforms::directional_light(index, "colour"),
                &UniformValue::Colour(light.colour),
            );
            self.device.set_uniform(
                shader,
                &uniforms::directional_light(index, "direction"),
                &UniformValue::Vec3(light.direction),
            );

            if let Some(shadow_map) = &light.shadow_map {
                let Some(texture) = shadow_map.texture().backend().get() else {
                    panic!("Directional light shadow map applied before it was loaded");
                };
                let (unit, bound) = context.texture_units.bind(&mut self.device, texture);
                if bound {
                    self.stats.texture_binds += 1;
                }
                self.device
                    .set_uniform(shader, &uniforms::shadow_map(index), &UniformValue::Int(unit_as_int(unit)));
                self.device.set_uniform(
                    shader,
                    &uniforms::directional_light(index, "lightMat"),
                    &UniformValue::Mat4(*shadow_map.view_projection()),
                );
                self.device.set_uniform(
                    shader,
                    &uniforms::directional_light(index, "shadowTolerance"),
                    &UniformValue::Float(shadow_map.tolerance()),
                );
            }
        }
        self.device.set_uniform(
            shader,
            uniforms::NUM_DIRECTIONAL_LIGHTS,
            &UniformValue::Int(count_as_int(lights.directional.len())),
        );

        for (index, light) in lights.point.iter().enumerate() {
            self.device
                .set_uniform(shader, &uniforms::point_light(index, "colour"), &UniformValue::Colour(light.colour));
            self.device
                .set_uniform(shader, &uniforms::point_light(index, "position"), &UniformValue::Vec3(light.position));
            self.device.set_uniform(
                shader,
                &uniforms::point_light(index, "attenuation"),
                &UniformValue::Vec3(light.attenuation),
            );
        }
        self.device.set_uniform(
            shader,
            uniforms::NUM_POINT_LIGHTS,
            &UniformValue::Int(count_as_int(lights.point.len())),
        );
    }

    fn bound_shader_handle(&self, command: &str) -> ShaderHandle {
        assert!(self.state.material.is_some(), "{command} requires a bound material");
        match &self.state.shader {
            Some(bound) => bound.handle,
            None => panic!("{command} requires a bound shader"),
        }
    }

    fn apply_mesh(&mut self, mesh: &Arc<RenderMesh>) {
        self.assert_in_pass("ApplyMesh");
        let shader = self.bound_shader_handle("ApplyMesh");

        if self.state.mesh.as_ref().is_some_and(|bound| Arc::ptr_eq(bound, mesh)) {
            return;
        }

        let Some(handle) = mesh.backend().get() else {
            panic!("ApplyMesh with mesh {:?} that is not loaded", mesh.id());
        };

        self.device.bind_mesh(shader, handle);
        self.state.bind_mesh(mesh.clone());
        self.stats.mesh_binds += 1;
    }

    fn apply_dynamic_mesh(&mut self, mesh: &Arc<RenderDynamicMesh>) {
        self.assert_in_pass("ApplyDynamicMesh");
        let shader = self.bound_shader_handle("ApplyDynamicMesh");

        if self
            .state
            .dynamic_mesh
            .as_ref()
            .is_some_and(|bound| Arc::ptr_eq(bound, mesh))
        {
            return;
        }

        assert!(
            mesh.vertex_data().len() <= self.max_dynamic_vertex_bytes,
            "Dynamic mesh has {} vertex bytes but the scratch buffer holds {}",
            mesh.vertex_data().len(),
            self.max_dynamic_vertex_bytes
        );
        assert!(
            mesh.index_data().len() <= self.max_dynamic_index_bytes,
            "Dynamic mesh has {} index bytes but the scratch buffer holds {}",
            mesh.index_data().len(),
            self.max_dynamic_index_bytes
        );

        let buffer = Self::context_mut(&mut self.context).dynamic_mesh_buffer;
        self.device.upload_dynamic_mesh(shader, buffer, mesh);
        self.state.bind_dynamic_mesh(mesh.clone());
        self.stats.mesh_binds += 1;
    }

    fn apply_skinned_animation(&mut self, animation: &Arc<RenderSkinnedAnimation>) {
        self.assert_in_pass("ApplySkinnedAnimation");
        let shader = self.bound_shader_handle("ApplySkinnedAnimation");
        assert!(
            self.state.mesh.is_some() || self.state.dynamic_mesh.is_some(),
            "ApplySkinnedAnimation requires a bound mesh"
        );

        if self
            .state
            .animation
            .as_ref()
            .is_some_and(|bound| Arc::ptr_eq(bound, animation))
        {
            return;
        }

        for (index, joint) in animation.joints().iter().enumerate() {
            self.device
                .set_uniform(shader, &format!("{}[{index}]", uniforms::JOINTS), &UniformValue::Mat4(*joint));
        }
        self.state.animation = Some(animation.clone());
    }

    fn render_instance(&mut self, world: &Mat4) {
        self.assert_in_pass("RenderInstance");
        let shader = self.bound_shader_handle("RenderInstance");

        let Some(camera) = &self.state.camera else {
            panic!("RenderInstance requires an applied camera");
        };
        let world_view_projection = camera.view_projection() * world;

        self.device
            .set_uniform(shader, uniforms::WORLD_MATRIX, &UniformValue::Mat4(*world));
        self.device
            .set_uniform(shader, uniforms::WVP_MATRIX, &UniformValue::Mat4(world_view_projection));
        self.device.set_uniform(
            shader,
            uniforms::NORMAL_MATRIX,
            &UniformValue::Mat4(utils::normal_matrix(world)),
        );

        let (layout, num_vertices, num_indices) = match (&self.state.mesh, &self.state.dynamic_mesh) {
            (Some(mesh), None) => (mesh.layout(), mesh.num_vertices(), mesh.num_indices()),
            (None, Some(mesh)) => (mesh.layout(), mesh.num_vertices(), mesh.num_indices()),
            (Some(_), Some(_)) => panic!("RenderInstance with both a mesh and a dynamic mesh bound"),
            (None, None) => panic!("RenderInstance requires a bound mesh"),
        };

        if num_indices > 0 {
            self.device
                .draw_indexed(layout.polygon_type, num_indices, layout.index_format);
        } else {
            self.device.draw_arrays(layout.polygon_type, num_vertices);
        }
        self.stats.draw_calls += 1;
    }

    fn load_shader(&mut self, shader: &RenderShader) {
        self.reset_cache();
        match self.device.create_shader(shader) {
            Ok(handle) => {
                shader.backend().attach(handle);
                self.stats.loads += 1;
            }
            Err(e) => {
                log::error!("Failed to load shader '{}': {}", shader.name(), e);
                self.stats.load_failures += 1;
            }
        }
    }

    fn load_texture(&mut self, texture: &RenderTexture) {
        self.reset_cache();
        match self.device.create_texture(texture) {
            Ok(handle) => {
                texture.backend().attach(handle);
                self.stats.loads += 1;
            }
            Err(e) => {
                log::error!("Failed to load texture {:?}: {}", texture.id(), e);
                self.stats.load_failures += 1;
            }
        }
    }

    fn load_mesh(&mut self, mesh: &RenderMesh) {
        self.reset_cache();
        match self.device.create_mesh(mesh) {
            Ok(handle) => {
                mesh.backend().attach(handle);
                self.stats.loads += 1;
            }
            Err(e) => {
                log::error!("Failed to load mesh {:?}: {}", mesh.id(), e);
                self.stats.load_failures += 1;
            }
        }
    }

    fn load_target_group(&mut self, target_group: &RenderTargetGroup) {
        self.reset_cache();

        let colour = target_group.colour_target().map(|texture| texture.backend().get());
        let depth = target_group.depth_target().map(|texture| texture.backend().get());
        if matches!(colour, Some(None)) || matches!(depth, Some(None)) {
            log::error!(
                "Failed to load target group {:?}: an attachment is not loaded",
                target_group.id()
            );
            self.stats.load_failures += 1;
            return;
        }

        match self
            .device
            .create_target_group(target_group, colour.flatten(), depth.flatten())
        {
            Ok(handle) => {
                target_group.backend().attach(handle);
                self.stats.loads += 1;
            }
            Err(e) => {
                log::error!("Failed to load target group {:?}: {}", target_group.id(), e);
                self.stats.load_failures += 1;
            }
        }
    }

    fn unload_shader(&mut self, shader: &RenderShader) {
        self.reset_cache();
        match shader.backend().detach() {
            Some(handle) => {
                self.device.destroy_shader(handle);
                self.stats.unloads += 1;
            }
            None => log::warn!("Unloading shader '{}' that was never loaded", shader.name()),
        }
    }

    fn unload_texture(&mut self, texture: &RenderTexture) {
        self.reset_cache();
        match texture.backend().detach() {
            Some(handle) => {
                self.device.destroy_texture(handle);
                self.stats.unloads += 1;
            }
            None => log::warn!("Unloading texture {:?} that was never loaded", texture.id()),
        }
    }

    fn unload_mesh(&mut self, mesh: &RenderMesh) {
        self.reset_cache();
        match mesh.backend().detach() {
            Some(handle) => {
                self.device.destroy_mesh(handle);
                self.stats.unloads += 1;
            }
            None => log::warn!("Unloading mesh {:?} that was never loaded", mesh.id()),
        }
    }

    fn unload_target_group(&mut self, target_group: &RenderTargetGroup) {
        self.reset_cache();
        match target_group.backend().detach() {
            Some(handle) => {
                self.device.destroy_target_group(handle);
                self.stats.unloads += 1;
            }
            None => log::warn!("Unloading target group {:?} that was never loaded", target_group.id()),
        }
    }
}

fn unit_as_int(unit: u32) -> i32 {
    i32::try_from(unit).unwrap_or(i32::MAX)
}

fn count_as_int(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::backends::{DeviceCall, RecordingDevice};
    use crate::render::commands::RenderCommandList;
    use crate::render::objects::PointRenderLight;

    fn buffer(commands: Vec<RenderCommand>) -> RenderCommandBuffer {
        RenderCommandBuffer::new(0, vec![commands.into_iter().collect::<RenderCommandList>()], Vec::new())
    }

    fn begin() -> RenderCommand {
        RenderCommand::Begin {
            resolution: Resolution::new(32, 32),
            clear_colour: Colour::BLACK,
        }
    }

    fn point_light(x: f32) -> RenderCommand {
        RenderCommand::ApplyPointLight {
            light: PointRenderLight::new(Colour::WHITE, Vec3::new(x, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)),
        }
    }

    fn uniform_names(device: &RecordingDevice) -> Vec<String> {
        device
            .calls()
            .iter()
            .filter_map(|call| match call {
                DeviceCall::SetUniform { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_initialised_on_first_process_only() {
        let mut processor = RenderCommandProcessor::new(RecordingDevice::new(), &RendererConfig::new());
        assert!(!processor.is_initialised());

        processor.process(&buffer(Vec::new())).unwrap();
        processor.process(&buffer(Vec::new())).unwrap();
        assert!(processor.is_initialised());

        let buffers = processor
            .device()
            .calls()
            .iter()
            .filter(|call| matches!(call, DeviceCall::CreateDynamicMeshBuffer(_)))
            .count();
        assert_eq!(buffers, 1);
    }

    #[test]
    fn test_lights_accumulate_until_material_applied() {
        let shader = RenderShader::new("lit", "", "uniform PointLight u_pointLights[4];");
        let material = RenderMaterial::builder(shader.clone()).build();
        let other = RenderMaterial::builder(shader.clone()).build();

        let mut processor = RenderCommandProcessor::new(RecordingDevice::new(), &RendererConfig::new());
        processor
            .process(&buffer(vec![
                RenderCommand::LoadShader { shader },
                begin(),
                point_light(1.0),
                point_light(2.0),
                RenderCommand::ApplyMaterial { material },
                point_light(3.0),
                RenderCommand::ApplyMaterial { material: other },
                RenderCommand::End,
            ]))
            .unwrap();

        let names = uniform_names(processor.device());
        let second_light = names.iter().filter(|name| *name == "u_pointLights[1].position").count();
        let first_light = names.iter().filter(|name| *name == "u_pointLights[0].position").count();
        assert_eq!(second_light, 1);
        assert_eq!(first_light, 2);
    }

    #[test]
    fn test_missing_custom_variable_is_not_fatal() {
        let shader = RenderShader::new("plain", "", "");
        let material = RenderMaterial::builder(shader.clone()).float("u_time", 1.0).build();

        let mut processor = RenderCommandProcessor::new(RecordingDevice::new(), &RendererConfig::new());
        let stats = processor
            .process(&buffer(vec![
                RenderCommand::LoadShader { shader },
                begin(),
                RenderCommand::ApplyMaterial { material },
                RenderCommand::End,
            ]))
            .unwrap();

        assert_eq!(stats.material_applies, 1);
        assert!(processor.device().missing_uniforms().contains(&"u_time".to_owned()));
    }

    #[test]
    fn test_unload_detaches_backend() {
        let shader = RenderShader::new("s", "", "");
        let mut processor = RenderCommandProcessor::new(RecordingDevice::new(), &RendererConfig::new());
        processor
            .process(&buffer(vec![RenderCommand::LoadShader { shader: shader.clone() }]))
            .unwrap();
        assert!(shader.backend().is_loaded());

        let stats = processor
            .process(&buffer(vec![RenderCommand::UnloadShader { shader: shader.clone() }]))
            .unwrap();
        assert_eq!(stats.unloads, 1);
        assert!(!shader.backend().is_loaded());
        assert_eq!(processor.device().live_shaders(), 0);
    }

    #[test]
    #[should_panic(expected = "Begin issued while a pass is already open")]
    fn test_nested_begin_panics() {
        let mut processor = RenderCommandProcessor::new(RecordingDevice::new(), &RendererConfig::new());
        let _ = processor.process(&buffer(vec![begin(), begin()]));
    }
}
