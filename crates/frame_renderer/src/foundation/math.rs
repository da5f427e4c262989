//! Math utilities and types
//!
//! Provides the nalgebra aliases used by every stage of the frame pipeline,
//! plus the small value types (colours, resolutions, bounding spheres) that
//! snapshots and commands carry by value.

use serde::{Deserialize, Serialize};

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Linear RGBA colour with components in `[0, 1]`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Colour {
    /// Red component
    pub r: f32,
    /// Green component
    pub g: f32,
    /// Blue component
    pub b: f32,
    /// Alpha component
    pub a: f32,
}

impl Colour {
    /// Opaque black
    pub const BLACK: Colour = Colour::new(0.0, 0.0, 0.0, 1.0);

    /// Opaque white
    pub const WHITE: Colour = Colour::new(1.0, 1.0, 1.0, 1.0);

    /// Fully transparent black
    pub const TRANSPARENT: Colour = Colour::new(0.0, 0.0, 0.0, 0.0);

    /// Create a colour from its four components
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque colour
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Component-wise sum, used when folding several ambient lights together
    pub fn saturating_add(self, other: Colour) -> Colour {
        Colour::new(
            (self.r + other.r).min(1.0),
            (self.g + other.g).min(1.0),
            (self.b + other.b).min(1.0),
            (self.a + other.a).min(1.0),
        )
    }

    /// Components as an array in RGBA order
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Colour {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Pixel dimensions of a render target or the main framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Resolution {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Resolution {
    /// Zero-sized resolution
    pub const ZERO: Resolution = Resolution::new(0, 0);

    /// Create a new resolution
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height, or 1.0 for degenerate resolutions
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// World-space bounding sphere used for culling and depth sorting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Sphere centre
    pub centre: Vec3,
    /// Sphere radius, never negative
    pub radius: f32,
}

impl BoundingSphere {
    /// Create a new bounding sphere
    pub fn new(centre: Vec3, radius: f32) -> Self {
        Self {
            centre,
            radius: radius.max(0.0),
        }
    }

    /// Transform a local-space sphere into world space.
    ///
    /// The radius is scaled by the largest axis scale of the matrix so the
    /// result always encloses the transformed geometry.
    pub fn transformed(&self, world: &Mat4) -> BoundingSphere {
        let centre = world.transform_point(&Point3::from(self.centre)).coords;
        let scale_x = Vec3::new(world.m11, world.m21, world.m31).magnitude();
        let scale_y = Vec3::new(world.m12, world.m22, world.m32).magnitude();
        let scale_z = Vec3::new(world.m13, world.m23, world.m33).magnitude();
        let max_scale = scale_x.max(scale_y).max(scale_z);

        BoundingSphere::new(centre, self.radius * max_scale)
    }
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::new(Vec3::zeros(), 0.0)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::*;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Inverse-transpose of a world matrix, used to transform normals.
    ///
    /// Singular matrices fall back to identity so a degenerate transform never
    /// aborts a frame; the resulting lighting is simply wrong for that instance.
    pub fn normal_matrix(world: &Mat4) -> Mat4 {
        world
            .try_inverse()
            .map_or_else(Mat4::identity, |inverse| inverse.transpose())
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a right-handed perspective projection matrix
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create a right-handed orthographic projection matrix
    fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Mat4;

    /// Create a right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y, near, far)
    }

    fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Mat4 {
        let half_w = width * 0.5;
        let half_h = height * 0.5;
        Mat4::new_orthographic(-half_w, half_w, -half_h, half_h, near, far)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bounding_sphere_scales_with_largest_axis() {
        let sphere = BoundingSphere::new(Vec3::zeros(), 1.0);
        let world = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0))
            * Mat4::new_nonuniform_scaling(&Vec3::new(1.0, 4.0, 2.0));

        let moved = sphere.transformed(&world);
        assert_relative_eq!(moved.centre, Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(moved.radius, 4.0);
    }

    #[test]
    fn test_normal_matrix_of_singular_is_identity() {
        let singular = Mat4::zeros();
        assert_eq!(utils::normal_matrix(&singular), Mat4::identity());
    }

    #[test]
    fn test_colour_saturating_add() {
        let sum = Colour::rgb(0.6, 0.2, 0.0).saturating_add(Colour::rgb(0.6, 0.2, 0.1));
        assert_relative_eq!(sum.r, 1.0);
        assert_relative_eq!(sum.g, 0.4);
        assert_relative_eq!(sum.b, 0.1);
        assert_relative_eq!(sum.a, 1.0);
    }

    #[test]
    fn test_resolution_aspect() {
        assert_relative_eq!(Resolution::new(1920, 1080).aspect_ratio(), 16.0 / 9.0);
        assert_relative_eq!(Resolution::ZERO.aspect_ratio(), 1.0);
    }
}
