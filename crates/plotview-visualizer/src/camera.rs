//! # Perspective Camera
//!
//! A right-handed perspective camera with its orientation held as both a
//! quaternion and XYZ Euler angles.

use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};

/// Perspective camera positioned in world space.
///
/// Orientation is held both as a quaternion and as XYZ Euler angles; the two
/// are kept in sync by every method that changes orientation. With an
/// identity orientation the camera looks down -Z with +Y up.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub fov: f32, // degrees
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub rotation: Vec3, // radians, XYZ order
    pub quaternion: Quat,
    pub up: Vec3,
    projection: Mat4,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(50.0, 1.0, 0.1, 2000.0)
    }
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            quaternion: Quat::IDENTITY,
            up: Vec3::Y,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Recompute the cached projection from fov, aspect and clip planes.
    ///
    /// Must be called after changing any of those fields.
    pub fn update_projection_matrix(&mut self) {
        self.projection =
            Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far);
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vec3::new(x, y, z);
    }

    pub fn set_rotation(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Vec3::new(x, y, z);
        self.quaternion = Quat::from_euler(EulerRot::XYZ, x, y, z);
    }

    pub fn set_quaternion(&mut self, quaternion: Quat) {
        self.quaternion = quaternion.normalize();
        let (x, y, z) = self.quaternion.to_euler(EulerRot::XYZ);
        self.rotation = Vec3::new(x, y, z);
    }

    /// Zero rotation, identity quaternion and +Y up.
    pub fn reset_orientation(&mut self) {
        self.rotation = Vec3::ZERO;
        self.quaternion = Quat::IDENTITY;
        self.up = Vec3::Y;
    }

    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.quaternion, self.position)
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.world_matrix().inverse()
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }

    /// Direction the camera is facing in world space.
    pub fn forward(&self) -> Vec3 {
        self.quaternion * Vec3::NEG_Z
    }

    /// Rotate the camera so it faces `target`, keeping `up` as the vertical hint.
    pub fn look_at(&mut self, target: Vec3) {
        let mut z = self.position - target;
        if z.length_squared() == 0.0 {
            // Target coincides with the eye, fall back to the default axis.
            z = Vec3::Z;
        }
        z = z.normalize();

        let mut x = self.up.cross(z);
        if x.length_squared() == 0.0 {
            // up and z are parallel, nudge z off the up axis
            if self.up.z.abs() == 1.0 {
                z.x += 0.0001;
            } else {
                z.z += 0.0001;
            }
            z = z.normalize();
            x = self.up.cross(z);
        }
        x = x.normalize();
        let y = z.cross(x);

        self.set_quaternion(Quat::from_mat3(&Mat3::from_cols(x, y, z)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_default_orientation_looks_down_negative_z() {
        let camera = PerspectiveCamera::new(60.0, 4.0 / 3.0, 1.0, 1000.0);
        assert!(approx(camera.forward(), Vec3::NEG_Z));
        assert_eq!(camera.up, Vec3::Y);
    }

    #[test]
    fn test_projection_tracks_aspect() {
        let mut camera = PerspectiveCamera::new(60.0, 1.0, 1.0, 1000.0);
        let square = camera.projection_matrix();
        camera.aspect = 2.0;
        assert_eq!(camera.projection_matrix(), square);
        camera.update_projection_matrix();
        assert_ne!(camera.projection_matrix(), square);
        assert_eq!(
            camera.projection_matrix(),
            Mat4::perspective_rh(60f32.to_radians(), 2.0, 1.0, 1000.0)
        );
    }

    #[test]
    fn test_look_at_faces_target() {
        let mut camera = PerspectiveCamera::default();
        camera.set_position(30.0, 0.0, 0.0);
        camera.look_at(Vec3::ZERO);
        assert!(approx(camera.forward(), Vec3::NEG_X));

        let (x, y, z) = camera.quaternion.to_euler(EulerRot::XYZ);
        assert!(approx(camera.rotation, Vec3::new(x, y, z)));
    }

    #[test]
    fn test_look_at_straight_down_along_up() {
        let mut camera = PerspectiveCamera::default();
        camera.set_position(0.0, 50.0, 0.0);
        camera.look_at(Vec3::ZERO);
        assert!(camera.quaternion.is_finite());
        assert!(camera.forward().dot(Vec3::NEG_Y) > 0.999);
    }

    #[test]
    fn test_view_matrix_moves_eye_to_origin() {
        let mut camera = PerspectiveCamera::default();
        camera.set_position(0.0, 0.0, 50.0);
        let eye = camera.view_matrix().transform_point3(camera.position);
        assert!(approx(eye, Vec3::ZERO));

        let origin = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!(approx(origin, Vec3::new(0.0, 0.0, -50.0)));
    }

    #[test]
    fn test_reset_orientation() {
        let mut camera = PerspectiveCamera::default();
        camera.set_rotation(0.3, -1.2, 0.5);
        camera.up = Vec3::X;
        camera.reset_orientation();
        assert_eq!(camera.rotation, Vec3::ZERO);
        assert_eq!(camera.quaternion, Quat::IDENTITY);
        assert_eq!(camera.up, Vec3::Y);
    }
}
