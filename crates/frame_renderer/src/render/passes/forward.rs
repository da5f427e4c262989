//! Forward rendering pass policy
//!
//! Produces one depth-only target group per shadow-casting directional light,
//! followed by the main framebuffer group with an opaque and a transparent
//! pass. Every light in the frame is attached to both lit passes.

use rayon::prelude::*;

use super::frame::RenderFrame;
use super::pass::{
    CameraRenderPassGroup, RenderPass, RenderPassKind, RenderPassLight, RenderPassObject, RenderTarget,
    TargetRenderPassGroup,
};
use super::RenderPassCompiler;
use crate::foundation::math::Colour;
use crate::render::objects::{DirectionalRenderLight, RenderCamera};

/// Forward renderer pass compiler
#[derive(Debug, Default, Clone, Copy)]
pub struct ForwardRenderPassCompiler;

impl ForwardRenderPassCompiler {
    /// Create the compiler
    pub fn new() -> Self {
        Self
    }

    fn compile_shadow_group(frame: &RenderFrame, light: &DirectionalRenderLight) -> Option<TargetRenderPassGroup> {
        let shadow_map = light.shadow_map.as_ref()?;
        let camera = RenderCamera::from_view_projection(*shadow_map.view_projection());

        let objects: Vec<RenderPassObject> = frame
            .render_objects()
            .iter()
            .filter(|object| !frame.frustum_culling() || camera.frustum().intersects_sphere(&object.bounding_sphere()))
            .filter_map(|object| {
                let material = object.shadow_material()?;
                Some(RenderPassObject::new(object, material.clone(), &camera))
            })
            .collect();

        Some(TargetRenderPassGroup {
            target: RenderTarget::TargetGroup(shadow_map.target_group().clone()),
            resolution: shadow_map.target_group().resolution(),
            clear_colour: Colour::WHITE,
            camera_groups: vec![CameraRenderPassGroup {
                camera,
                passes: vec![RenderPass::new(RenderPassKind::Shadow, Vec::new(), objects)],
            }],
        })
    }

    fn frame_lights(frame: &RenderFrame) -> Vec<RenderPassLight> {
        frame
            .ambient_light()
            .map(|light| RenderPassLight::Ambient(*light))
            .into_iter()
            .chain(frame.directional_lights().iter().cloned().map(RenderPassLight::Directional))
            .chain(frame.point_lights().iter().map(|light| RenderPassLight::Point(*light)))
            .collect()
    }

    fn compile_main_group(frame: &RenderFrame) -> TargetRenderPassGroup {
        let camera = frame.camera();
        let (transparent, opaque): (Vec<RenderPassObject>, Vec<RenderPassObject>) = frame
            .visible_objects()
            .map(|object| RenderPassObject::new(object, object.material().clone(), camera))
            .partition(|object| object.material.is_transparent());

        let lights = Self::frame_lights(frame);

        TargetRenderPassGroup {
            target: RenderTarget::Default,
            resolution: frame.resolution(),
            clear_colour: frame.clear_colour(),
            camera_groups: vec![CameraRenderPassGroup {
                camera: camera.clone(),
                passes: vec![
                    RenderPass::new(RenderPassKind::Opaque, lights.clone(), opaque),
                    RenderPass::new(RenderPassKind::Transparent, lights, transparent),
                ],
            }],
        }
    }
}

impl RenderPassCompiler for ForwardRenderPassCompiler {
    fn compile_target_render_pass_groups(&self, frame: &RenderFrame) -> Vec<TargetRenderPassGroup> {
        let mut groups: Vec<TargetRenderPassGroup> = frame
            .directional_lights()
            .par_iter()
            .filter_map(|light| Self::compile_shadow_group(frame, light))
            .collect();

        groups.push(Self::compile_main_group(frame));

        log::trace!("Compiled {} target render pass groups", groups.len());
        groups
    }
}
