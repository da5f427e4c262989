//! Headless frame pipeline demo
//!
//! A producer thread builds a snapshot per tick with a drifting field of
//! randomly coloured cubes, a shadow-casting sun and a few point lights. The
//! main thread plays the render thread and replays every command buffer
//! against the recording device, logging per-frame statistics.
//!
//! Usage: `pipeline_demo [config.toml|config.ron] [frames]`

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use frame_renderer::core::config::{ApplicationConfig, Config};
use frame_renderer::foundation::logging;
use frame_renderer::foundation::math::{utils, BoundingSphere, Colour, Mat4, Mat4Ext, Resolution, Vec3};
use frame_renderer::render::resources::{ImageFormat, MeshLayout, RenderTargetGroup, TextureDescriptor};
use frame_renderer::render::{
    AmbientRenderLight, DirectionalRenderLight, PointRenderLight, RecordingDevice, RenderCamera, RenderGeometry,
    RenderCommandProcessor, RenderError, RenderMaterial, RenderMesh, RenderObject, RenderShader, RenderSnapshot,
    RenderTexture, Renderer, ShadowMap,
};
use rand::prelude::*;

const DEFAULT_FRAMES: u64 = 120;
const FRAME_WAIT: Duration = Duration::from_millis(100);
const CUBE_COUNT: usize = 64;
const POINT_LIGHT_COUNT: usize = 3;

const LIT_VERTEX_SHADER: &str = "uniform mat4 u_wvpMat; uniform mat4 u_worldMat; uniform mat4 u_normalMat;";
const LIT_FRAGMENT_SHADER: &str = "uniform sampler2D u_texture0; uniform sampler2D u_shadowMap0; \
    uniform vec4 u_emissive; uniform vec4 u_ambient; uniform vec4 u_diffuse; uniform vec4 u_specular; \
    uniform vec3 u_cameraPos; uniform vec4 u_ambientLightCol; uniform float u_shininess; \
    uniform DirectionalLight u_directionalLights[2]; uniform int u_numDirectionalLights; \
    uniform PointLight u_pointLights[4]; uniform int u_numPointLights;";
const DEPTH_VERTEX_SHADER: &str = "uniform mat4 u_wvpMat;";

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 4],
    normal: [f32; 3],
    uv: [f32; 2],
}

/// Resources shared by every frame the producer builds
struct SceneAssets {
    cube: Arc<RenderMesh>,
    materials: Vec<Arc<RenderMaterial>>,
    shadow_caster: Arc<RenderMaterial>,
    shadow_target: Arc<RenderTargetGroup>,
}

impl SceneAssets {
    fn new(rng: &mut impl Rng) -> Result<Self, Box<dyn std::error::Error>> {
        let lit = RenderShader::new("lit", LIT_VERTEX_SHADER, LIT_FRAGMENT_SHADER);
        let depth = RenderShader::new("depth", DEPTH_VERTEX_SHADER, "");

        let checker: Vec<u8> = (0..16)
            .flat_map(|i| if i % 2 == 0 { [255, 255, 255, 255] } else { [40, 40, 40, 255] })
            .collect();
        let albedo = RenderTexture::new(TextureDescriptor::new(Resolution::new(4, 4), ImageFormat::Rgba8888), checker)?;

        let materials = (0..8)
            .map(|_| {
                RenderMaterial::builder(lit.clone())
                    .texture(albedo.clone())
                    .diffuse(Colour::rgb(rng.gen(), rng.gen(), rng.gen()))
                    .specular(Colour::WHITE)
                    .float("u_shininess", rng.gen_range(8.0..64.0))
                    .build()
            })
            .collect();

        let shadow_depth =
            RenderTexture::attachment(TextureDescriptor::new(Resolution::new(1024, 1024), ImageFormat::Depth32));

        Ok(Self {
            cube: cube_mesh()?,
            materials,
            shadow_caster: RenderMaterial::builder(depth).depth_only().build(),
            shadow_target: RenderTargetGroup::new(None, Some(shadow_depth))?,
        })
    }
}

fn cube_mesh() -> Result<Arc<RenderMesh>, Box<dyn std::error::Error>> {
    let faces = [
        (Vec3::x(), Vec3::y()),
        (-Vec3::x(), Vec3::y()),
        (Vec3::y(), Vec3::z()),
        (-Vec3::y(), Vec3::z()),
        (Vec3::z(), Vec3::y()),
        (-Vec3::z(), Vec3::y()),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices: Vec<u16> = Vec::with_capacity(36);
    for (normal, up) in faces {
        let right = normal.cross(&up);
        let base = u16::try_from(vertices.len())?;
        for (u, v) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            let corner = (normal + right * (u * 2.0 - 1.0) + up * (v * 2.0 - 1.0)) * 0.5;
            vertices.push(Vertex {
                position: [corner.x, corner.y, corner.z, 1.0],
                normal: [normal.x, normal.y, normal.z],
                uv: [u, v],
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    Ok(RenderMesh::from_vertices(
        MeshLayout::static_triangles(),
        &vertices,
        &indices,
        BoundingSphere::new(Vec3::zeros(), 3.0_f32.sqrt() * 0.5),
    )?)
}

/// Simulation side: owns the assets and turns elapsed time into snapshots
struct Producer {
    assets: SceneAssets,
    offsets: Vec<(Vec3, usize)>,
    resolution: Resolution,
}

impl Producer {
    fn new(resolution: Resolution) -> Result<Self, Box<dyn std::error::Error>> {
        let mut rng = StdRng::seed_from_u64(7);
        let assets = SceneAssets::new(&mut rng)?;
        let offsets = (0..CUBE_COUNT)
            .map(|_| {
                let position = Vec3::new(rng.gen_range(-8.0..8.0), rng.gen_range(-2.0..2.0), rng.gen_range(-8.0..8.0));
                (position, rng.gen_range(0..assets.materials.len()))
            })
            .collect();

        Ok(Self {
            assets,
            offsets,
            resolution,
        })
    }

    fn build_snapshot(&self, time: f32) -> Result<RenderSnapshot, Box<dyn std::error::Error>> {
        let eye = Vec3::new(12.0 * time.cos() * 0.2 + 10.0, 6.0, 12.0);
        let camera = RenderCamera::look_at(
            eye,
            Vec3::zeros(),
            Vec3::y(),
            Mat4::perspective(utils::deg_to_rad(60.0), self.resolution.aspect_ratio(), 0.1, 100.0),
        );
        let mut snapshot = RenderSnapshot::new(self.resolution, Colour::rgb(0.05, 0.05, 0.08), camera);

        snapshot.add_ambient_light(AmbientRenderLight::new(Colour::rgb(0.1, 0.1, 0.1)));

        let sun_direction = Vec3::new(-0.3, -1.0, -0.2).normalize();
        let sun_view = Mat4::look_at(-sun_direction * 15.0, Vec3::zeros(), Vec3::y());
        let shadow_map = ShadowMap::new(
            self.assets.shadow_target.clone(),
            Mat4::orthographic(24.0, 24.0, 0.1, 40.0) * sun_view,
            0.005,
        )?;
        snapshot.add_directional_light(
            DirectionalRenderLight::new(Colour::rgb(1.0, 0.95, 0.8), sun_direction).with_shadow_map(shadow_map),
        );

        for i in 0..POINT_LIGHT_COUNT {
            #[allow(clippy::cast_precision_loss)]
            let angle = time + i as f32 * std::f32::consts::TAU / POINT_LIGHT_COUNT as f32;
            snapshot.add_point_light(PointRenderLight::new(
                Colour::rgb(0.8, 0.4, 0.2),
                Vec3::new(angle.cos() * 6.0, 2.0, angle.sin() * 6.0),
                Vec3::new(1.0, 0.09, 0.032),
            ));
        }

        for (i, (offset, material)) in self.offsets.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let bob = (time * 2.0 + i as f32).sin() * 0.5;
            let world = Mat4::new_translation(&(offset + Vec3::new(0.0, bob, 0.0)))
                * Mat4::from_euler_angles(0.0, time + i as f32, 0.0);
            snapshot.add_render_object(
                RenderObject::new(
                    self.assets.materials[*material].clone(),
                    RenderGeometry::Static(self.assets.cube.clone()),
                    world,
                )
                .with_shadow_material(self.assets.shadow_caster.clone()),
            );
        }

        Ok(snapshot)
    }
}

fn load_config(path: Option<&String>) -> Result<ApplicationConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => ApplicationConfig::load_from_file(path)?,
        None => ApplicationConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Render up to `frames` buffers, returning early once the producer has
/// stopped and nothing is left in flight. Returns the number rendered.
fn run_render_loop(
    renderer: &Renderer,
    processor: &mut RenderCommandProcessor<RecordingDevice>,
    frames: u64,
    producer_finished: impl Fn() -> bool,
) -> Result<u64, RenderError> {
    let mut frame = 0;
    while frame < frames {
        match renderer.process_render_command_buffer_timeout(processor, FRAME_WAIT)? {
            Some(stats) => {
                log::info!(
                    "Frame {}: {} commands, {} draws, {} shader binds, {} texture binds, {} material skips",
                    frame,
                    stats.commands,
                    stats.draw_calls,
                    stats.shader_binds,
                    stats.texture_binds,
                    stats.material_skips
                );
                frame += 1;
            }
            None if producer_finished() && !renderer.is_preparing() && renderer.queued_command_buffers() == 0 => break,
            None => {}
        }
    }
    Ok(frame)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let config = load_config(args.get(1))?;
    let frames: u64 = match args.get(2) {
        Some(frames) => frames.parse()?,
        None => DEFAULT_FRAMES,
    };

    logging::init_with_level(&config.engine.log_level);
    log::info!("Starting frame pipeline demo for {} frames", frames);

    let renderer = Arc::new(Renderer::with_forward_compiler(config.renderer.clone())?);
    let mut processor = renderer.create_processor(RecordingDevice::new());

    let tick = config
        .engine
        .target_fps
        .map_or(Duration::ZERO, |fps| Duration::from_secs_f64(1.0 / f64::from(fps.max(1))));

    let producer = {
        let renderer = renderer.clone();
        thread::Builder::new().name("producer".into()).spawn(move || -> Result<(), String> {
            let producer = Producer::new(Resolution::new(1920, 1080)).map_err(|e| e.to_string())?;
            let start = Instant::now();
            for _ in 0..frames {
                let snapshot = producer
                    .build_snapshot(start.elapsed().as_secs_f32())
                    .map_err(|e| e.to_string())?;
                renderer.process_render_snapshot(snapshot);
                thread::sleep(tick);
            }
            Ok(())
        })?
    };

    let start = Instant::now();
    let rendered = run_render_loop(&renderer, &mut processor, frames, || producer.is_finished())?;
    if rendered < frames {
        log::warn!("Producer stopped after {} of {} frames", rendered, frames);
    }

    match producer.join() {
        Ok(result) => result?,
        Err(_) => return Err("Producer thread panicked".into()),
    }

    renderer.shutdown(&mut processor)?;
    let device = processor.device();
    log::info!(
        "Rendered {} frames in {:.2?}: {} draw calls, {} device calls, {} live meshes after shutdown",
        rendered,
        start.elapsed(),
        device.draw_calls(),
        device.calls().len(),
        device.live_meshes()
    );
    if !device.missing_uniforms().is_empty() {
        log::debug!("{} uniform sets missed their program", device.missing_uniforms().len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_renderer::core::config::RendererConfig;

    #[test]
    fn test_render_loop_stops_when_producer_fails() {
        let renderer = Renderer::with_forward_compiler(RendererConfig::new()).unwrap();
        let mut processor = renderer.create_processor(RecordingDevice::new());

        let rendered = run_render_loop(&renderer, &mut processor, 10, || true).unwrap();
        assert_eq!(rendered, 0);
    }

    #[test]
    fn test_render_loop_renders_submitted_frames() {
        let renderer = Renderer::with_forward_compiler(RendererConfig::new()).unwrap();
        let mut processor = renderer.create_processor(RecordingDevice::new());
        let producer = Producer::new(Resolution::new(320, 240)).unwrap();
        renderer.process_render_snapshot(producer.build_snapshot(0.0).unwrap());
        renderer.process_render_snapshot(producer.build_snapshot(0.1).unwrap());

        let rendered = run_render_loop(&renderer, &mut processor, 5, || true).unwrap();
        assert_eq!(rendered, 2);
        assert!(processor.device().draw_calls() > 0);
    }
}
