//! Scene Tests
//!
//! Tests for:
//! - LightSet: one upload, per-light partial writes, unchanged edits skipped
//! - Attenuation falloff
//! - Camera updates are pure and deterministic
//! - Cube face orientation for environment capture

use glam::{Vec3, Vec4};

use tavern::errors::TavernError;
use tavern::renderer::Device;
use tavern::renderer::backend::{BufferWrite, CubeFace, HeadlessBackend};
use tavern::scene::camera::{PITCH_LIMIT, face_angles};
use tavern::scene::{
    Camera, CameraInputs, CameraMode, LIGHT_SIZE, Light, LightSet, MAX_LIGHTS, MoveMask,
    attenuation,
};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn approx_vec(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-4
}

fn headless(device: &Device) -> &HeadlessBackend {
    device.backend::<HeadlessBackend>().unwrap()
}

// ============================================================================
// LightSet
// ============================================================================

#[test]
fn light_set_uploads_full_block_once() {
    let mut device = Device::new(HeadlessBackend::default());
    let lights = LightSet::with_default(&mut device, 3);

    let backend = headless(&device);
    assert_eq!(backend.stats().buffers_created, 1);
    assert_eq!(backend.stats().buffer_writes, 0);

    let bytes = backend.buffer_bytes(lights.buffer()).unwrap();
    assert_eq!(bytes.len(), MAX_LIGHTS * LIGHT_SIZE);
    assert_eq!(&bytes[..LIGHT_SIZE], bytemuck::bytes_of(&Light::default()));
    assert_eq!(&bytes[LIGHT_SIZE..2 * LIGHT_SIZE], bytemuck::bytes_of(&Light::disabled()));
    // Slots past the light count stay zeroed.
    assert!(bytes[3 * LIGHT_SIZE..].iter().all(|b| *b == 0));
}

#[test]
fn editing_a_light_rewrites_only_its_slot() {
    let mut device = Device::new(HeadlessBackend::default());
    let mut lights = LightSet::with_default(&mut device, 4);

    let mut light = Light::point(Vec4::new(1.0, 2.0, 3.0, 1.0));
    light.diffuse = [1.0, 0.5, 0.25];
    assert!(lights.edit(&mut device, 2, light).unwrap());

    let backend = headless(&device);
    assert_eq!(
        backend.buffer_writes(),
        &[BufferWrite {
            buffer: lights.buffer(),
            offset: (2 * LIGHT_SIZE) as u64,
            len: LIGHT_SIZE as u64,
        }]
    );
    let bytes = backend.buffer_bytes(lights.buffer()).unwrap();
    assert_eq!(&bytes[2 * LIGHT_SIZE..3 * LIGHT_SIZE], bytemuck::bytes_of(&light));
    assert_eq!(&bytes[..LIGHT_SIZE], bytemuck::bytes_of(&Light::default()));
    assert_eq!(lights.lights()[2], light);
}

#[test]
fn unchanged_light_is_not_written() {
    let mut device = Device::new(HeadlessBackend::default());
    let mut lights = LightSet::with_default(&mut device, 2);

    assert!(!lights.edit(&mut device, 0, Light::default()).unwrap());
    assert_eq!(headless(&device).stats().buffer_writes, 0);
}

#[test]
fn light_index_is_checked() {
    let mut device = Device::new(HeadlessBackend::default());
    let mut lights = LightSet::with_default(&mut device, 2);

    let err = lights.edit(&mut device, 5, Light::default()).unwrap_err();
    assert!(matches!(
        err,
        TavernError::LightIndexOutOfRange { index: 5, count: 2 }
    ));
    assert_eq!(headless(&device).stats().buffer_writes, 0);
}

#[test]
fn light_set_is_capped() {
    let mut device = Device::new(HeadlessBackend::default());
    let lights = LightSet::new(&mut device, vec![Light::default(); MAX_LIGHTS + 3]);
    assert_eq!(lights.len(), MAX_LIGHTS);
    assert_eq!(lights.block().count, MAX_LIGHTS);
}

#[test]
fn attenuation_matches_formula() {
    let coefficients = Vec3::new(1.0, 0.09, 0.032);
    let d = 5.0;
    let expected = 1.0 / (1.0 + 0.09 * d + 0.032 * d * d);
    assert!(approx(attenuation(coefficients, d), expected));
    assert!(approx(attenuation(coefficients, 0.0), 1.0));

    let mut light = Light::default();
    light.attenuation = [1.0, 0.09, 0.032];
    assert!(approx(light.attenuation_at(d), expected));
}

// ============================================================================
// Camera
// ============================================================================

fn inputs(mask: MoveMask, dx: f32, dy: f32) -> CameraInputs {
    CameraInputs {
        delta_time: 1.0 / 60.0,
        mask,
        mouse_dx: dx,
        mouse_dy: dy,
    }
}

#[test]
fn camera_update_is_deterministic() {
    let start = Camera::new(Vec3::new(0.0, 1.0, 4.0), 0.3, -0.2);
    let frame = inputs(MoveMask::FORWARD | MoveMask::STRAFE_LEFT, 12.0, -7.0);

    for mode in [CameraMode::Fps, CameraMode::Freefly] {
        let a = start.update(mode, &frame).update(mode, &frame);
        let b = start.update(mode, &frame).update(mode, &frame);
        assert_eq!(a, b);
    }
}

#[test]
fn camera_without_input_is_unchanged() {
    let start = Camera::new(Vec3::new(2.0, 1.0, -3.0), 1.0, 0.5);
    let idle = inputs(MoveMask::empty(), 0.0, 0.0);
    assert_eq!(start.update(CameraMode::Freefly, &idle), start);
    assert_eq!(start.update(CameraMode::Fps, &idle), start);
}

#[test]
fn pitch_never_reaches_the_pole() {
    let mut camera = Camera::default();
    for _ in 0..100 {
        camera = camera.update(CameraMode::Freefly, &inputs(MoveMask::empty(), 0.0, -10_000.0));
    }
    assert!(camera.pitch <= PITCH_LIMIT);
    assert!(camera.forward().y < 1.0);
}

#[test]
fn fps_camera_stays_on_its_floor() {
    let start = Camera::new(Vec3::new(0.0, 1.0, 0.0), 0.0, 0.8);
    let moved = start.update(CameraMode::Fps, &inputs(MoveMask::FORWARD, 0.0, 0.0));
    assert!(approx(moved.position.y, 1.0));
    assert!(moved.position.z < 0.0);

    let flown = start.update(CameraMode::Freefly, &inputs(MoveMask::FORWARD, 0.0, 0.0));
    assert!(flown.position.y > 1.0);
}

// ============================================================================
// Cube faces
// ============================================================================

#[test]
fn set_face_points_along_each_axis() {
    let expected = [
        Vec3::X,
        Vec3::NEG_X,
        Vec3::Y,
        Vec3::NEG_Y,
        Vec3::Z,
        Vec3::NEG_Z,
    ];
    let mut camera = Camera::new(Vec3::new(-4.0, 0.0, 0.0), 0.7, 0.1);

    for (index, axis) in expected.into_iter().enumerate() {
        camera.set_face(index).unwrap();
        assert!(
            approx_vec(camera.forward(), axis),
            "face {index}: {:?} != {axis:?}",
            camera.forward()
        );
        assert_eq!(camera.position, Vec3::new(-4.0, 0.0, 0.0));
    }
}

#[test]
fn face_index_out_of_range_is_rejected() {
    let mut camera = Camera::default();
    let err = camera.set_face(6).unwrap_err();
    assert!(matches!(err, TavernError::CubeFaceOutOfRange(6)));
    assert_eq!(camera, Camera::default());
}

#[test]
fn face_views_look_down_their_axis() {
    let camera = Camera::new(Vec3::new(1.0, 2.0, 3.0), 0.0, 0.0);
    for face in CubeFace::ALL {
        let mut oriented = camera;
        (oriented.yaw, oriented.pitch) = face_angles(face);
        let view = camera.face_view_matrix(face);
        // A point one unit along the face direction lands on the view axis.
        let ahead = view.transform_point3(camera.position + oriented.forward());
        assert!(approx_vec(ahead, Vec3::new(0.0, 0.0, -1.0)), "{face:?}: {ahead:?}");
    }
}
