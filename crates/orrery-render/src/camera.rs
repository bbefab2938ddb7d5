//! Perspective camera with reverse-Z projection.

use glam::{Mat3, Mat4, Quat, Vec2, Vec3};
use orrery_scene::Ray;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Rotation as a unit quaternion; the camera looks down its local -Z.
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    /// Near clip plane distance (always positive).
    pub near: f32,
    /// Far clip plane distance (always positive, > near).
    pub far: f32,
}

impl Camera {
    pub fn perspective(fov_y_degrees: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y: fov_y_degrees.to_radians(),
            aspect_ratio,
            near,
            far,
        }
    }

    /// View matrix (inverse of the camera transform).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    /// Projection with reverse-Z: near maps to depth 1, far to depth 0.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.far, self.near)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Inverse view-projection without translation, for drawing a background
    /// at infinite distance.
    pub fn skybox_matrix(&self) -> Mat4 {
        let view = Mat4::from_quat(self.rotation.inverse());
        (self.projection_matrix() * view).inverse()
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Turns the camera toward `target`, keeping world +Y up. No-op when the
    /// target coincides with the camera position.
    pub fn look_at(&mut self, target: Vec3) {
        let dir = target - self.position;
        if dir.length_squared() < f32::EPSILON {
            return;
        }
        let dir = dir.normalize();
        let up = if dir.y.abs() > 0.999 { Vec3::NEG_Z } else { Vec3::Y };
        let view = Mat4::look_to_rh(self.position, dir, up);
        // The camera rotation is the transpose of the view's rotation block.
        self.rotation = Quat::from_mat3(&Mat3::from_mat4(view).transpose()).normalize();
    }

    /// Update the aspect ratio after a resize. Ignores degenerate sizes.
    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect_ratio = width / height;
        }
    }

    /// World-space ray through a point in normalized device coordinates
    /// (`x, y` in `[-1, 1]`, +Y up).
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection_matrix().inverse();
        let near = inverse.project_point3(ndc.extend(1.0));
        let far = inverse.project_point3(ndc.extend(0.0));
        Ray::new(near, far - near)
    }

    /// Converts a window pixel position to NDC.
    pub fn pixel_to_ndc(x: f64, y: f64, width: u32, height: u32) -> Vec2 {
        let w = width.max(1) as f64;
        let h = height.max(1) as f64;
        Vec2::new((2.0 * x / w - 1.0) as f32, (1.0 - 2.0 * y / h) as f32)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(75.0, 16.0 / 9.0, 0.1, 1000.0)
    }
}
