//! Transform component and utilities for spatial positioning.

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec3};

/// A 3D transform representing position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform at the given position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a new transform with position and rotation.
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Position plus yaw (Y), pitch (X) and roll (Z) applied in that order.
    pub fn from_position_euler(position: Vec3, yaw: f32, pitch: f32, roll: f32) -> Self {
        Self::from_position_rotation(position, Quat::from_euler(EulerRot::YXZ, yaw, pitch, roll))
    }

    /// Uniformly scaled copy.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Create the model matrix for this transform.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Get the forward direction (negative Z in right-handed coordinates).
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// Get the right direction (positive X).
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Move a fraction `t` of the way toward `target` (first-order smoothing).
    pub fn lerp_position(&mut self, target: Vec3, t: f32) {
        self.position = self.position.lerp(target, t);
    }

    /// Look at a target position.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = target - self.position;
        if forward.length_squared() > 0.0001 {
            self.rotation = Quat::from_mat4(&Mat4::look_at_rh(self.position, target, up)).inverse();
        }
    }
}

/// Raw transform data for the renderer (instance data).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TransformRaw {
    pub model: [[f32; 4]; 4],
}

impl From<Mat4> for TransformRaw {
    fn from(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
        }
    }
}

impl From<&Transform> for TransformRaw {
    fn from(transform: &Transform) -> Self {
        Self::from(transform.to_matrix())
    }
}

impl From<Transform> for TransformRaw {
    fn from(transform: Transform) -> Self {
        Self::from(&transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_at_points_forward_at_target() {
        let mut t = Transform::from_position(Vec3::new(0.0, 4.0, -8.0));
        let target = Vec3::new(0.0, 2.0, 4.0);
        t.look_at(target, Vec3::Y);
        let expected = (target - t.position).normalize();
        assert!(t.forward().distance(expected) < 1e-4);
    }

    #[test]
    fn look_at_ignores_coincident_target() {
        let mut t = Transform::from_position(Vec3::ONE);
        t.look_at(Vec3::ONE, Vec3::Y);
        assert_eq!(t.rotation, Quat::IDENTITY);
    }

    #[test]
    fn lerp_position_moves_a_tenth() {
        let mut t = Transform::default();
        t.lerp_position(Vec3::new(10.0, 0.0, 0.0), 0.1);
        assert!((t.position.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn euler_yaw_rotates_local_z_toward_x() {
        let t = Transform::from_position_euler(Vec3::ZERO, std::f32::consts::FRAC_PI_2, 0.0, 0.0);
        let z = t.rotation * Vec3::Z;
        assert!(z.distance(Vec3::X) < 1e-5);
    }

    #[test]
    fn raw_matrix_carries_translation() {
        let raw = TransformRaw::from(Transform::from_position(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(raw.model[3], [1.0, 2.0, 3.0, 1.0]);
    }
}
