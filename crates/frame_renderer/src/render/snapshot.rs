//! # Render Snapshot
//!
//! A snapshot captures everything needed to render one frame. The producer
//! fills it on the simulation side and hands it to
//! [`Renderer::process_render_snapshot`](crate::render::Renderer::process_render_snapshot),
//! after which the prep task claims each sequence out of it exactly once.
//!
//! ## Claim semantics
//!
//! Every sequence is wrapped in a one-shot cell. Claiming moves the contents
//! out and leaves the cell spent; claiming again, or adding to a spent cell,
//! is a programming error and panics. The snapshot itself is not
//! thread-safe: ownership moves with it through the pipeline instead.

use std::sync::Arc;

use crate::foundation::math::{Colour, Resolution};
use crate::render::commands::RenderCommandList;
use crate::render::objects::{
    AmbientRenderLight, DirectionalRenderLight, PointRenderLight, RenderCamera, RenderDynamicMesh, RenderObject,
};

/// Value that can be moved out exactly once
#[derive(Debug)]
struct Claimable<T> {
    name: &'static str,
    value: Option<T>,
}

impl<T: Default> Claimable<T> {
    fn new(name: &'static str) -> Self {
        Self { name, value: Some(T::default()) }
    }
}

impl<T> Claimable<T> {
    fn get_mut(&mut self) -> &mut T {
        match self.value.as_mut() {
            Some(value) => value,
            None => panic!("Snapshot {} modified after being claimed", self.name),
        }
    }

    fn claim(&mut self) -> T {
        match self.value.take() {
            Some(value) => value,
            None => panic!("Snapshot {} claimed more than once", self.name),
        }
    }

    fn is_claimed(&self) -> bool {
        self.value.is_none()
    }
}

/// Everything needed to render one frame
#[derive(Debug)]
pub struct RenderSnapshot {
    resolution: Resolution,
    clear_colour: Colour,
    camera: RenderCamera,
    ambient_lights: Claimable<Vec<AmbientRenderLight>>,
    directional_lights: Claimable<Vec<DirectionalRenderLight>>,
    point_lights: Claimable<Vec<PointRenderLight>>,
    render_objects: Claimable<Vec<RenderObject>>,
    dynamic_meshes: Claimable<Vec<Arc<RenderDynamicMesh>>>,
    pre_render_command_list: Claimable<RenderCommandList>,
    post_render_command_list: Claimable<RenderCommandList>,
}

impl RenderSnapshot {
    /// Create an empty snapshot
    pub fn new(resolution: Resolution, clear_colour: Colour, camera: RenderCamera) -> Self {
        Self {
            resolution,
            clear_colour,
            camera,
            ambient_lights: Claimable::new("ambient lights"),
            directional_lights: Claimable::new("directional lights"),
            point_lights: Claimable::new("point lights"),
            render_objects: Claimable::new("render objects"),
            dynamic_meshes: Claimable::new("dynamic meshes"),
            pre_render_command_list: Claimable::new("pre-render command list"),
            post_render_command_list: Claimable::new("post-render command list"),
        }
    }

    /// Resolution of the main framebuffer
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Colour the main framebuffer is cleared to
    pub fn clear_colour(&self) -> Colour {
        self.clear_colour
    }

    /// Main camera
    pub fn camera(&self) -> &RenderCamera {
        &self.camera
    }

    /// Add an ambient light
    pub fn add_ambient_light(&mut self, light: AmbientRenderLight) {
        self.ambient_lights.get_mut().push(light);
    }

    /// Add a directional light
    pub fn add_directional_light(&mut self, light: DirectionalRenderLight) {
        self.directional_lights.get_mut().push(light);
    }

    /// Add a point light
    pub fn add_point_light(&mut self, light: PointRenderLight) {
        self.point_lights.get_mut().push(light);
    }

    /// Add a drawable instance
    pub fn add_render_object(&mut self, object: RenderObject) {
        self.render_objects.get_mut().push(object);
    }

    /// Keep a dynamic mesh alive until the frame has executed
    pub fn add_dynamic_mesh(&mut self, mesh: Arc<RenderDynamicMesh>) {
        self.dynamic_meshes.get_mut().push(mesh);
    }

    /// Commands executed before anything else this frame
    pub fn pre_render_command_list_mut(&mut self) -> &mut RenderCommandList {
        self.pre_render_command_list.get_mut()
    }

    /// Commands executed after everything else this frame
    pub fn post_render_command_list_mut(&mut self) -> &mut RenderCommandList {
        self.post_render_command_list.get_mut()
    }

    /// Move the ambient lights out
    pub fn claim_ambient_lights(&mut self) -> Vec<AmbientRenderLight> {
        self.ambient_lights.claim()
    }

    /// Move the directional lights out
    pub fn claim_directional_lights(&mut self) -> Vec<DirectionalRenderLight> {
        self.directional_lights.claim()
    }

    /// Move the point lights out
    pub fn claim_point_lights(&mut self) -> Vec<PointRenderLight> {
        self.point_lights.claim()
    }

    /// Move the render objects out
    pub fn claim_render_objects(&mut self) -> Vec<RenderObject> {
        self.render_objects.claim()
    }

    /// Move the dynamic meshes out
    pub fn claim_dynamic_meshes(&mut self) -> Vec<Arc<RenderDynamicMesh>> {
        self.dynamic_meshes.claim()
    }

    /// Move the pre-render command list out
    pub fn claim_pre_render_command_list(&mut self) -> RenderCommandList {
        self.pre_render_command_list.claim()
    }

    /// Move the post-render command list out
    pub fn claim_post_render_command_list(&mut self) -> RenderCommandList {
        self.post_render_command_list.claim()
    }

    /// Whether every sequence has been claimed
    pub fn is_fully_claimed(&self) -> bool {
        self.ambient_lights.is_claimed()
            && self.directional_lights.is_claimed()
            && self.point_lights.is_claimed()
            && self.render_objects.is_claimed()
            && self.dynamic_meshes.is_claimed()
            && self.pre_render_command_list.is_claimed()
            && self.post_render_command_list.is_claimed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4, Vec3};

    fn snapshot() -> RenderSnapshot {
        RenderSnapshot::new(
            Resolution::new(1920, 1080),
            Colour::BLACK,
            RenderCamera::new(Mat4::identity(), Mat4::identity()),
        )
    }

    #[test]
    fn test_claim_moves_contents_out() {
        let mut snapshot = snapshot();
        snapshot.add_point_light(PointRenderLight::new(Colour::WHITE, Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0)));
        snapshot.add_ambient_light(AmbientRenderLight::new(Colour::WHITE));

        assert_eq!(snapshot.claim_point_lights().len(), 1);
        assert_eq!(snapshot.claim_ambient_lights().len(), 1);
        assert!(snapshot.claim_directional_lights().is_empty());
        assert!(!snapshot.is_fully_claimed());
    }

    #[test]
    fn test_claim_every_field_once() {
        let mut snapshot = snapshot();
        snapshot.claim_ambient_lights();
        snapshot.claim_directional_lights();
        snapshot.claim_point_lights();
        snapshot.claim_render_objects();
        snapshot.claim_dynamic_meshes();
        snapshot.claim_pre_render_command_list();
        snapshot.claim_post_render_command_list();
        assert!(snapshot.is_fully_claimed());
    }

    #[test]
    #[should_panic(expected = "render objects claimed more than once")]
    fn test_double_claim_render_objects_panics() {
        let mut snapshot = snapshot();
        snapshot.claim_render_objects();
        snapshot.claim_render_objects();
    }

    #[test]
    #[should_panic(expected = "pre-render command list claimed more than once")]
    fn test_double_claim_command_list_panics() {
        let mut snapshot = snapshot();
        snapshot.claim_pre_render_command_list();
        snapshot.claim_pre_render_command_list();
    }

    #[test]
    #[should_panic(expected = "modified after being claimed")]
    fn test_add_after_claim_panics() {
        let mut snapshot = snapshot();
        snapshot.claim_ambient_lights();
        snapshot.add_ambient_light(AmbientRenderLight::new(Colour::WHITE));
    }
}
