//! Euler-angle camera with FPS and freefly update policies.
//!
//! [`Camera`] is a plain value: updates take the previous camera and the
//! frame's [`CameraInputs`] and return a new one. Angles are in radians.
//!
//! Conventions (right handed, Y up, looking down -Z at yaw = pitch = 0):
//! - world matrix = `T(position) * Ry(yaw) * Rx(pitch)`
//! - view matrix  = inverse of the world matrix
//! - positive yaw turns left, positive pitch looks up

use bitflags::bitflags;
use glam::{Mat3, Mat4, Vec3};

use crate::errors::Result;
use crate::renderer::backend::CubeFace;

/// Radians per pixel of mouse motion.
pub const MOUSE_SENSITIVITY: f32 = 0.002;
/// Units per second.
pub const MOVE_SPEED: f32 = 2.0;
/// Speed multiplier while [`MoveMask::FAST`] is held.
pub const FAST_MULTIPLIER: f32 = 5.0;
/// Pitch is kept strictly inside ±89° so the basis never flips.
pub const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;

bitflags! {
    /// Movement keys held this frame.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MoveMask: u32 {
        const FORWARD      = 1 << 0;
        const BACKWARD     = 1 << 1;
        const STRAFE_LEFT  = 1 << 2;
        const STRAFE_RIGHT = 1 << 3;
        const FAST         = 1 << 4;
        const UP           = 1 << 5;
        const DOWN         = 1 << 6;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraInputs {
    /// Seconds since the previous frame.
    pub delta_time: f32,
    pub mask: MoveMask,
    pub mouse_dx: f32,
    pub mouse_dy: f32,
}

/// Which update policy a camera follows. Chosen per demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraMode {
    /// Movement stays in the horizontal plane.
    #[default]
    Fps,
    /// Movement follows the view direction, plus explicit up/down.
    Freefly,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl Camera {
    #[must_use]
    pub const fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch,
        }
    }

    /// Applies one frame of input according to `mode`.
    #[must_use]
    pub fn update(self, mode: CameraMode, inputs: &CameraInputs) -> Self {
        match mode {
            CameraMode::Fps => self.update_fps(inputs),
            CameraMode::Freefly => self.update_freefly(inputs),
        }
    }

    /// Mouse look plus movement locked to the horizontal plane.
    #[must_use]
    pub fn update_fps(self, inputs: &CameraInputs) -> Self {
        let mut next = self.look(inputs);
        let (sin_yaw, cos_yaw) = next.yaw.sin_cos();
        let forward = Vec3::new(-sin_yaw, 0.0, -cos_yaw);
        let right = Vec3::new(cos_yaw, 0.0, -sin_yaw);
        next.position += planar_motion(inputs.mask, forward, right) * step(inputs);
        next
    }

    /// Mouse look plus movement along the full view basis. Up/down move along
    /// world Y regardless of pitch.
    #[must_use]
    pub fn update_freefly(self, inputs: &CameraInputs) -> Self {
        let mut next = self.look(inputs);
        let mut motion = planar_motion(inputs.mask, next.forward(), next.right());
        if inputs.mask.contains(MoveMask::UP) {
            motion += Vec3::Y;
        }
        if inputs.mask.contains(MoveMask::DOWN) {
            motion -= Vec3::Y;
        }
        next.position += motion * step(inputs);
        next
    }

    fn look(self, inputs: &CameraInputs) -> Self {
        Self {
            position: self.position,
            yaw: self.yaw - inputs.mouse_dx * MOUSE_SENSITIVITY,
            pitch: (self.pitch - inputs.mouse_dy * MOUSE_SENSITIVITY)
                .clamp(-PITCH_LIMIT, PITCH_LIMIT),
        }
    }

    /// Unit view direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(-sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    }

    /// Unit right vector; always horizontal.
    #[must_use]
    pub fn right(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        Vec3::new(cos_yaw, 0.0, -sin_yaw)
    }

    fn rotation(&self) -> Mat4 {
        Mat4::from_rotation_y(self.yaw) * Mat4::from_rotation_x(self.pitch)
    }

    /// Camera-to-world transform.
    #[must_use]
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position) * self.rotation()
    }

    /// World-to-camera transform.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(-self.pitch)
            * Mat4::from_rotation_y(-self.yaw)
            * Mat4::from_translation(-self.position)
    }

    /// Same as [`world_matrix`](Self::world_matrix): the inverse of the view.
    #[must_use]
    pub fn inverse_view_matrix(&self) -> Mat4 {
        self.world_matrix()
    }

    /// View matrix with the translation removed, for drawing the skybox as
    /// if it were infinitely far away.
    #[must_use]
    pub fn view_matrix_no_translation(&self) -> Mat4 {
        Mat4::from_mat3(Mat3::from_mat4(self.view_matrix()))
    }

    /// Orients the camera along cube face `index` (+X, -X, +Y, -Y, +Z, -Z).
    pub fn set_face(&mut self, index: usize) -> Result<()> {
        let face = CubeFace::from_index(index)?;
        (self.yaw, self.pitch) = face_angles(face);
        Ok(())
    }

    /// View matrix for rendering `face` of a cubemap from this camera's
    /// position: the [`set_face`](Self::set_face) view followed by
    /// [`face_roll`].
    #[must_use]
    pub fn face_view_matrix(&self, face: CubeFace) -> Mat4 {
        let mut oriented = *self;
        (oriented.yaw, oriented.pitch) = face_angles(face);
        face_roll(face) * oriented.view_matrix()
    }
}

/// View-space roll that turns the Euler basis of a cube face into the one
/// cube sampling expects. The four side faces are stored with -Y up; the
/// ±Y faces already match.
#[must_use]
pub fn face_roll(face: CubeFace) -> Mat4 {
    match face {
        CubeFace::PositiveY | CubeFace::NegativeY => Mat4::IDENTITY,
        _ => Mat4::from_rotation_z(std::f32::consts::PI),
    }
}

/// `(yaw, pitch)` that makes [`Camera::forward`] point along `face`.
#[must_use]
pub fn face_angles(face: CubeFace) -> (f32, f32) {
    use std::f32::consts::{FRAC_PI_2, PI};
    match face {
        CubeFace::PositiveX => (-FRAC_PI_2, 0.0),
        CubeFace::NegativeX => (FRAC_PI_2, 0.0),
        CubeFace::PositiveY => (0.0, FRAC_PI_2),
        CubeFace::NegativeY => (0.0, -FRAC_PI_2),
        CubeFace::PositiveZ => (PI, 0.0),
        CubeFace::NegativeZ => (0.0, 0.0),
    }
}

fn planar_motion(mask: MoveMask, forward: Vec3, right: Vec3) -> Vec3 {
    let mut motion = Vec3::ZERO;
    if mask.contains(MoveMask::FORWARD) {
        motion += forward;
    }
    if mask.contains(MoveMask::BACKWARD) {
        motion -= forward;
    }
    if mask.contains(MoveMask::STRAFE_RIGHT) {
        motion += right;
    }
    if mask.contains(MoveMask::STRAFE_LEFT) {
        motion -= right;
    }
    motion
}

fn step(inputs: &CameraInputs) -> f32 {
    let speed = if inputs.mask.contains(MoveMask::FAST) {
        MOVE_SPEED * FAST_MULTIPLIER
    } else {
        MOVE_SPEED
    };
    speed * inputs.delta_time
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPSILON
    }

    fn forward_inputs(mask: MoveMask) -> CameraInputs {
        CameraInputs {
            delta_time: 0.5,
            mask,
            mouse_dx: 0.0,
            mouse_dy: 0.0,
        }
    }

    #[test]
    fn fps_forward_moves_down_negative_z() {
        let cam = Camera::default().update_fps(&forward_inputs(MoveMask::FORWARD));
        assert!(approx(cam.position, Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn fps_ignores_pitch_and_vertical_keys() {
        let cam = Camera::new(Vec3::ZERO, 0.0, 0.5)
            .update_fps(&forward_inputs(MoveMask::FORWARD | MoveMask::UP));
        assert_eq!(cam.position.y, 0.0);
    }

    #[test]
    fn freefly_follows_pitch_and_fast_bit() {
        let cam = Camera::new(Vec3::ZERO, 0.0, std::f32::consts::FRAC_PI_4);
        let slow = cam.update_freefly(&forward_inputs(MoveMask::FORWARD));
        let fast = cam.update_freefly(&forward_inputs(MoveMask::FORWARD | MoveMask::FAST));
        assert!(slow.position.y > 0.0);
        assert!(approx(fast.position, slow.position * FAST_MULTIPLIER));
    }

    #[test]
    fn pitch_is_clamped() {
        let inputs = CameraInputs {
            mouse_dy: -1.0e6,
            ..Default::default()
        };
        let cam = Camera::default().update_fps(&inputs);
        assert!((cam.pitch - PITCH_LIMIT).abs() < EPSILON);
    }

    #[test]
    fn view_is_inverse_of_world() {
        let cam = Camera::new(Vec3::new(1.0, 2.0, 3.0), 0.7, -0.3);
        let product = cam.view_matrix() * cam.inverse_view_matrix();
        assert!(product.abs_diff_eq(Mat4::IDENTITY, 1e-4));
        let no_translation = cam.view_matrix_no_translation();
        assert_eq!(no_translation.w_axis, glam::Vec4::W);
    }

    #[test]
    fn face_view_looks_along_face() {
        let cam = Camera::new(Vec3::new(-4.0, 0.0, 0.0), 0.0, 0.0);
        for face in CubeFace::ALL {
            let (yaw, pitch) = face_angles(face);
            let dir = Camera::new(Vec3::ZERO, yaw, pitch).forward();
            let view = cam.face_view_matrix(face);
            let target = cam.position + dir;
            let in_view = view.transform_point3(target);
            assert!(approx(in_view, Vec3::new(0.0, 0.0, -1.0)), "{face:?}");
        }
    }

    #[test]
    fn face_views_use_cube_up_vectors() {
        let cam = Camera::new(Vec3::new(1.0, -2.0, 0.5), 0.3, 0.2);
        let expected = [
            (Vec3::X, Vec3::NEG_Y),
            (Vec3::NEG_X, Vec3::NEG_Y),
            (Vec3::Y, Vec3::Z),
            (Vec3::NEG_Y, Vec3::NEG_Z),
            (Vec3::Z, Vec3::NEG_Y),
            (Vec3::NEG_Z, Vec3::NEG_Y),
        ];
        for (face, (dir, up)) in CubeFace::ALL.into_iter().zip(expected) {
            let reference = Mat4::look_to_rh(cam.position, dir, up);
            assert!(cam.face_view_matrix(face).abs_diff_eq(reference, 1e-5), "{face:?}");
        }
    }
}
