//! Immutable per-frame values produced by the simulation side

pub mod camera;
pub mod dynamic_mesh;
pub mod lights;
pub mod render_object;
pub mod skinned_animation;

pub use camera::{Frustum, RenderCamera};
pub use dynamic_mesh::RenderDynamicMesh;
pub use lights::{AmbientRenderLight, DirectionalRenderLight, PointRenderLight, ShadowMap};
pub use render_object::{RenderGeometry, RenderObject};
pub use skinned_animation::RenderSkinnedAnimation;
