//! Orbit camera controls: drag to orbit the target, scroll to zoom.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use orrery_config::ControlsConfig;
use orrery_render::Camera;
use winit::event::MouseButton;

use crate::input::PointerState;

/// Keeps the camera off the poles, where `look_at` loses its up vector.
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Camera orbit around a target point, in spherical coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: Vec3,
    /// Azimuth about +Y in radians; 0 places the camera on +Z.
    pub yaw: f32,
    /// Elevation above the target's horizontal plane in radians.
    pub pitch: f32,
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub enable_pan: bool,
    pub rotate_speed: f32,
    /// Fraction of the distance removed per wheel line.
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl OrbitControls {
    /// Controls starting from the camera at `position` looking at `target`.
    pub fn new(config: &ControlsConfig, position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let distance = offset.length();
        let (yaw, pitch) = if distance > f32::EPSILON {
            (
                offset.x.atan2(offset.z),
                (offset.y / distance).clamp(-1.0, 1.0).asin(),
            )
        } else {
            (0.0, 0.0)
        };
        let min_distance = config.min_distance.max(0.0);
        Self {
            target,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            distance: distance.clamp(min_distance, config.max_distance.max(min_distance)),
            min_distance,
            max_distance: config.max_distance.max(min_distance),
            enable_pan: config.enable_pan,
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed.clamp(0.0, 0.99),
            pan_speed: config.pan_speed,
        }
    }

    /// Applies this frame's pointer input. Left drag orbits, right drag pans
    /// (when enabled), the wheel zooms. Returns whether anything changed.
    pub fn handle_pointer(&mut self, pointer: &PointerState) -> bool {
        let mut changed = false;
        let delta = pointer.delta();

        if pointer.is_pressed(MouseButton::Left) && delta != glam::Vec2::ZERO {
            self.yaw -= delta.x * self.rotate_speed;
            self.pitch = (self.pitch + delta.y * self.rotate_speed).clamp(-PITCH_LIMIT, PITCH_LIMIT);
            changed = true;
        }

        if self.enable_pan && pointer.is_pressed(MouseButton::Right) && delta != glam::Vec2::ZERO
        {
            let (right, up) = self.screen_axes();
            let scale = self.pan_speed * self.distance * 0.01;
            self.target += (-right * delta.x + up * delta.y) * scale;
            changed = true;
        }

        let scroll = pointer.scroll();
        if scroll.abs() > 1e-6 {
            self.zoom(scroll);
            changed = true;
        }
        changed
    }

    /// Scroll up (positive) moves toward the target. Clamped to
    /// `[min_distance, max_distance]`.
    pub fn zoom(&mut self, lines: f32) {
        let factor = (1.0 - self.zoom_speed).powf(lines);
        self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
    }

    /// Camera position for the current orbit.
    pub fn position(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target
            + Vec3::new(
                self.distance * cos_pitch * sin_yaw,
                self.distance * sin_pitch,
                self.distance * cos_pitch * cos_yaw,
            )
    }

    /// Moves `camera` onto the orbit and aims it at the target.
    pub fn apply(&self, camera: &mut Camera) {
        camera.position = self.position();
        camera.look_at(self.target);
    }

    fn screen_axes(&self) -> (Vec3, Vec3) {
        let forward = (self.target - self.position()).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        (right, up)
    }
}
