//! First-person viewpoint that the boat controller can also drive in third person.

use engine_core::{Quat, Transform, Vec3};

/// Default look sensitivity in radians per pixel of mouse motion.
pub const BASE_SENSITIVITY: f32 = 0.002;

const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Yaw/pitch camera. Forward is -Z at yaw 0.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera transform (position and rotation).
    pub transform: Transform,
    /// Mouse sensitivity for look controls.
    pub sensitivity: f32,
    pitch: f32,
    yaw: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            sensitivity: BASE_SENSITIVITY,
            pitch: 0.0,
            yaw: 0.0,
        }
    }
}

impl Camera {
    /// Create a new camera at the given position.
    pub fn new(position: Vec3) -> Self {
        Self {
            transform: Transform::from_position(position),
            ..Default::default()
        }
    }

    /// Scale the base sensitivity (1.0 = default).
    pub fn with_sensitivity(mut self, scale: f32) -> Self {
        self.sensitivity = BASE_SENSITIVITY * scale;
        self
    }

    /// Process mouse movement for look controls.
    pub fn process_mouse(&mut self, delta_x: f32, delta_y: f32) {
        let yaw = self.yaw - delta_x * self.sensitivity;
        let pitch = self.pitch - delta_y * self.sensitivity;
        self.set_yaw_pitch(yaw, pitch);
    }

    /// Set yaw and pitch directly (in radians) and rebuild rotation.
    pub fn set_yaw_pitch(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-MAX_PITCH, MAX_PITCH);
        self.transform.rotation = Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch);
    }

    /// Aim at `target` without rolling.
    pub fn look_at(&mut self, target: Vec3) {
        let dir = target - self.transform.position;
        let len = dir.length();
        if len < 1e-5 {
            return;
        }
        let yaw = (-dir.x).atan2(-dir.z);
        let pitch = (dir.y / len).clamp(-1.0, 1.0).asin();
        self.set_yaw_pitch(yaw, pitch);
    }

    /// Move a fraction `t` of the way toward `target`.
    pub fn lerp_toward(&mut self, target: Vec3, t: f32) {
        self.transform.lerp_position(target, t);
    }

    /// Forward and right projected onto the ground plane.
    pub fn flat_axes(&self) -> (Vec3, Vec3) {
        let forward = self.transform.forward();
        let right = self.transform.right();
        (
            Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero(),
            Vec3::new(right.x, 0.0, right.z).normalize_or_zero(),
        )
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
    }

    pub fn forward(&self) -> Vec3 {
        self.transform.forward()
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }
}
