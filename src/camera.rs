//! Look-at cameras for rune render passes.
//!
//! Every pass consumes exactly one view matrix. The stereo and parallax
//! presentations build theirs by sliding the eye along the horizontal axis
//! while keeping a shared look-at target, which is what produces the
//! per-eye/per-frame disparity.

use glam::{Mat4, Vec3};

/// The shared look-at target for offset cameras, slightly into the scene's
/// depth range.
pub const LOOK_AT_TARGET: Vec3 = Vec3::new(0.0, 0.0, -0.4);

/// A camera described by eye position, look-at target, and up vector.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::ZERO,
            target: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::Y,
        }
    }
}

impl Camera {
    /// The head-on camera; its view matrix is the identity.
    pub fn front() -> Self {
        Self::default()
    }

    /// A camera with the eye shifted horizontally by `x`, looking at the
    /// shared target.
    pub fn offset_x(x: f32) -> Self {
        Self {
            eye: Vec3::new(x, 0.0, 0.0),
            target: LOOK_AT_TARGET,
            up: Vec3::Y,
        }
    }

    /// The view matrix for this camera.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn front_camera_is_identity() {
        let view = Camera::front().view_matrix();
        let identity = Mat4::IDENTITY.to_cols_array();
        for (a, b) in view.to_cols_array().iter().zip(identity) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn offset_eyes_mirror_each_other() {
        let left = Camera::offset_x(-0.03);
        let right = Camera::offset_x(0.03);
        assert_eq!(left.eye.x, -right.eye.x);
        assert_eq!(left.target, right.target);
    }

    #[test]
    fn target_stays_on_the_view_axis() {
        let view = Camera::offset_x(0.03).view_matrix();
        let seen = view.transform_point3(LOOK_AT_TARGET);
        assert!(seen.x.abs() < 1e-6);
        assert!(seen.y.abs() < 1e-6);
        assert!(seen.z < 0.0);
    }
}
