//! Per-frame camera
//!
//! A `RenderCamera` is an immutable value captured into a snapshot. All the
//! matrices the pipeline needs are computed once at construction so the pass
//! compiler and the processor never redo the work.

use crate::foundation::math::{BoundingSphere, Mat4, Mat4Ext, Point3, Vec3, Vec4};

/// A clip-space plane in `n . p + d >= 0` form, normalised so `d` is a distance
#[derive(Debug, Clone, Copy, PartialEq)]
struct Plane {
    normal: Vec3,
    distance: f32,
}

impl Plane {
    fn from_row(row: Vec4) -> Self {
        let normal = Vec3::new(row.x, row.y, row.z);
        let length = normal.magnitude();
        if length <= f32::EPSILON {
            return Self { normal: Vec3::zeros(), distance: 0.0 };
        }
        Self { normal: normal / length, distance: row.w / length }
    }

    fn signed_distance(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// Six planes bounding the volume a view-projection matrix can see
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    /// Extract the planes from a view-projection matrix with a `[-1, 1]` clip depth range
    pub fn from_view_projection(view_projection: &Mat4) -> Self {
        let row = |index: usize| -> Vec4 { view_projection.row(index).transpose() };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_row(r3 + r0),
                Plane::from_row(r3 - r0),
                Plane::from_row(r3 + r1),
                Plane::from_row(r3 - r1),
                Plane::from_row(r3 + r2),
                Plane::from_row(r3 - r2),
            ],
        }
    }

    /// Whether any part of the sphere lies inside the frustum
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.signed_distance(&sphere.centre) >= -sphere.radius)
    }
}

/// Camera state for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCamera {
    world: Mat4,
    view: Mat4,
    projection: Mat4,
    view_projection: Mat4,
    position: Vec3,
    frustum: Frustum,
}

impl RenderCamera {
    /// Create a camera from its world transform and projection.
    ///
    /// A non-invertible world transform yields an identity view.
    pub fn new(world: Mat4, projection: Mat4) -> Self {
        let view = world.try_inverse().unwrap_or_else(Mat4::identity);
        Self::from_parts(world, view, projection)
    }

    /// Create a camera looking from `eye` towards `target`
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3, projection: Mat4) -> Self {
        let view = Mat4::look_at(eye, target, up);
        let world = view.try_inverse().unwrap_or_else(Mat4::identity);
        Self::from_parts(world, view, projection)
    }

    /// Create a camera from a precomputed view-projection, as used for shadow maps.
    ///
    /// The view is identity, so view-space depth is clip-space depth.
    pub fn from_view_projection(view_projection: Mat4) -> Self {
        Self::from_parts(Mat4::identity(), Mat4::identity(), view_projection)
    }

    fn from_parts(world: Mat4, view: Mat4, projection: Mat4) -> Self {
        let view_projection = projection * view;
        Self {
            world,
            view,
            projection,
            view_projection,
            position: world.fixed_view::<3, 1>(0, 3).into_owned(),
            frustum: Frustum::from_view_projection(&view_projection),
        }
    }

    /// Camera to world transform
    pub fn world(&self) -> &Mat4 {
        &self.world
    }

    /// World to view transform
    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    /// View to clip transform
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// World to clip transform
    pub fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    /// World-space position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// View frustum in world space
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Distance in front of the camera along its view axis
    pub fn view_depth(&self, point: &Vec3) -> f32 {
        -self.view.transform_point(&Point3::from(*point)).z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::utils::deg_to_rad;
    use approx::assert_relative_eq;

    fn camera() -> RenderCamera {
        RenderCamera::look_at(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::zeros(),
            Vec3::y(),
            Mat4::perspective(deg_to_rad(60.0), 1.0, 0.1, 100.0),
        )
    }

    #[test]
    fn test_view_depth_increases_away_from_camera() {
        let camera = camera();
        assert_relative_eq!(camera.view_depth(&Vec3::zeros()), 10.0, epsilon = 1e-4);
        assert_relative_eq!(camera.view_depth(&Vec3::new(0.0, 0.0, -5.0)), 15.0, epsilon = 1e-4);
        assert_relative_eq!(camera.position(), Vec3::new(0.0, 0.0, 10.0), epsilon = 1e-4);
    }

    #[test]
    fn test_frustum_culls_spheres_behind_camera() {
        let camera = camera();
        let frustum = camera.frustum();

        assert!(frustum.intersects_sphere(&BoundingSphere::new(Vec3::zeros(), 1.0)));
        assert!(!frustum.intersects_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, 20.0), 1.0)));
        assert!(!frustum.intersects_sphere(&BoundingSphere::new(Vec3::new(100.0, 0.0, 0.0), 1.0)));
    }

    #[test]
    fn test_sphere_straddling_plane_is_visible() {
        let camera = camera();
        assert!(camera
            .frustum()
            .intersects_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, -90.5), 1.0)));
    }
}
