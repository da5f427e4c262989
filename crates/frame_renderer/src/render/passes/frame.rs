//! Culled, per-frame view of a snapshot
//!
//! Building a [`RenderFrame`] is the first prep step: it claims the lights and
//! render objects out of the snapshot, folds ambient lights into one, and
//! records which objects the main camera can see.

use crate::foundation::math::{Colour, Resolution};
use crate::render::objects::{
    AmbientRenderLight, DirectionalRenderLight, PointRenderLight, RenderCamera, RenderObject,
};
use crate::render::snapshot::RenderSnapshot;

/// Everything the pass compiler needs for one frame
#[derive(Debug)]
pub struct RenderFrame {
    resolution: Resolution,
    clear_colour: Colour,
    camera: RenderCamera,
    ambient_light: Option<AmbientRenderLight>,
    directional_lights: Vec<DirectionalRenderLight>,
    point_lights: Vec<PointRenderLight>,
    render_objects: Vec<RenderObject>,
    visible: Vec<usize>,
    frustum_culling: bool,
}

impl RenderFrame {
    /// Build a frame from already-claimed parts
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        resolution: Resolution,
        clear_colour: Colour,
        camera: RenderCamera,
        ambient_lights: &[AmbientRenderLight],
        directional_lights: Vec<DirectionalRenderLight>,
        point_lights: Vec<PointRenderLight>,
        render_objects: Vec<RenderObject>,
        frustum_culling: bool,
    ) -> Self {
        let ambient_light = ambient_lights
            .iter()
            .map(|light| light.colour)
            .reduce(Colour::saturating_add)
            .map(AmbientRenderLight::new);

        let visible: Vec<usize> = render_objects
            .iter()
            .enumerate()
            .filter(|(_, object)| !frustum_culling || camera.frustum().intersects_sphere(&object.bounding_sphere()))
            .map(|(index, _)| index)
            .collect();

        log::trace!(
            "Render frame: {} of {} objects visible, {} directional and {} point lights",
            visible.len(),
            render_objects.len(),
            directional_lights.len(),
            point_lights.len()
        );

        Self {
            resolution,
            clear_colour,
            camera,
            ambient_light,
            directional_lights,
            point_lights,
            render_objects,
            visible,
            frustum_culling,
        }
    }

    /// Claim the lights and objects out of a snapshot and build a frame
    pub fn from_snapshot(snapshot: &mut RenderSnapshot, frustum_culling: bool) -> Self {
        let ambient_lights = snapshot.claim_ambient_lights();
        let directional_lights = snapshot.claim_directional_lights();
        let point_lights = snapshot.claim_point_lights();
        let render_objects = snapshot.claim_render_objects();

        Self::new(
            snapshot.resolution(),
            snapshot.clear_colour(),
            snapshot.camera().clone(),
            &ambient_lights,
            directional_lights,
            point_lights,
            render_objects,
            frustum_culling,
        )
    }

    /// Main framebuffer resolution
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Main framebuffer clear colour
    pub fn clear_colour(&self) -> Colour {
        self.clear_colour
    }

    /// Main camera
    pub fn camera(&self) -> &RenderCamera {
        &self.camera
    }

    /// Sum of every ambient light in the snapshot, if there were any
    pub fn ambient_light(&self) -> Option<&AmbientRenderLight> {
        self.ambient_light.as_ref()
    }

    /// Directional lights in snapshot order
    pub fn directional_lights(&self) -> &[DirectionalRenderLight] {
        &self.directional_lights
    }

    /// Point lights in snapshot order
    pub fn point_lights(&self) -> &[PointRenderLight] {
        &self.point_lights
    }

    /// Every object in the snapshot, visible or not
    pub fn render_objects(&self) -> &[RenderObject] {
        &self.render_objects
    }

    /// Objects inside the main camera's frustum, in snapshot order
    pub fn visible_objects(&self) -> impl Iterator<Item = &RenderObject> {
        self.visible.iter().map(|&index| &self.render_objects[index])
    }

    /// Whether culling was requested for this frame
    pub fn frustum_culling(&self) -> bool {
        self.frustum_culling
    }
}
