//! Recorded Uniform Tests
//!
//! Decodes the uniform blocks of a recorded frame and checks them against
//! the camera and configuration that produced it.
//!
//! Tests for:
//! - Lit draws: light block binding and count, brightness clamp, normal matrix
//! - Skybox draws: view rotation kept, translation dropped
//! - Cube face captures: per-face views from the capture center
//! - Pick draws: the scene camera's view and the encoded id
//! - Composite: exposure, gamma, kernel ratio and stage flags

use bytemuck::pod_read_unaligned;
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

use tavern::app::input::FrameInput;
use tavern::assets::{MemoryAssetSource, ResourceCache};
use tavern::demos::{DemoKind, SPHERE_CENTER, SPHERE_PICK_ID, TAVERN_PICK_ID};
use tavern::renderer::backend::{DrawCall, Frame, HeadlessBackend, RenderTarget};
use tavern::renderer::pipeline::{LIGHT_BLOCK_BINDING, ProgramKind, TargetName};
use tavern::renderer::{Device, RenderSettings};
use tavern::resources::KernelPreset;
use tavern::resources::uniforms::{IdUniforms, PostUniforms, SceneUniforms, SkyUniforms, id_to_color};
use tavern::scene::Camera;
use tavern::scene::tavern::TAVERN_MESH;
use tavern::{Engine, FrameConfig};

const EPSILON: f32 = 1e-4;

const TRIANGLE: &str = "\
v -1 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0.5 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
";

fn approx(a: Mat4, b: Mat4) -> bool {
    a.abs_diff_eq(b, EPSILON)
}

/// A full demo frame with a click, so every pass kind is recorded.
fn full_frame(config: FrameConfig) -> Engine {
    let assets = MemoryAssetSource::new()
        .with_file(TAVERN_MESH, TRIANGLE)
        .with_file("media/sphere.obj", TRIANGLE)
        .with_file("media/rock.obj", TRIANGLE);
    let mut engine = Engine::new(
        Device::new(HeadlessBackend::new(800, 600)),
        ResourceCache::new(assets),
        RenderSettings::default(),
        DemoKind::Full,
    )
    .unwrap();
    engine.config = config;
    engine
        .frame_with_input(&FrameInput {
            just_clicked: true,
            cursor: Vec2::new(10.0, 10.0),
            ..FrameInput::default()
        })
        .unwrap();
    engine
}

fn last_frame(engine: &Engine) -> &Frame {
    engine
        .device
        .backend::<HeadlessBackend>()
        .unwrap()
        .last_frame()
        .unwrap()
}

fn draws_of(engine: &Engine, kind: ProgramKind) -> Vec<(RenderTarget, &DrawCall)> {
    let program = engine.demo().core().programs.get(kind).unwrap();
    last_frame(engine)
        .draws_by_pass()
        .into_iter()
        .flat_map(|(pass, draws)| draws.into_iter().map(move |d| (pass.target, d)))
        .filter(|(_, d)| d.program == program)
        .collect()
}

fn decode<T: bytemuck::Pod>(draw: &DrawCall) -> T {
    assert_eq!(draw.uniforms.len(), size_of::<T>());
    pod_read_unaligned(&draw.uniforms)
}

// ============================================================================
// Lit draws
// ============================================================================

#[test]
fn lit_draws_bind_the_light_block() {
    let config = FrameConfig {
        brightness_clamp: 0.7,
        ..FrameConfig::default()
    };
    let engine = full_frame(config);
    let block = engine.demo().light_block().unwrap();
    assert_eq!(block.count, 8);

    let lit: Vec<_> = last_frame(&engine).draws().filter(|d| d.lights.is_some()).collect();
    assert!(!lit.is_empty());
    for draw in lit {
        let binding = draw.lights.unwrap();
        assert_eq!(binding.binding, LIGHT_BLOCK_BINDING);
        assert_eq!(binding.binding, 1);
        assert_eq!(binding.buffer, block.buffer);

        let scene: SceneUniforms = decode(draw);
        assert_eq!(scene.params.x, 0.7);
        assert_eq!(scene.params.y, 8.0);
        assert!(approx(scene.normal_matrix, scene.model.inverse().transpose()));
    }
}

#[test]
fn scene_pass_views_follow_the_camera() {
    let engine = full_frame(FrameConfig::default());
    let camera = engine.demo().core().camera;

    for (target, draw) in draws_of(&engine, ProgramKind::Phong) {
        if matches!(target, RenderTarget::CubeFace { .. }) {
            continue;
        }
        let scene: SceneUniforms = decode(draw);
        assert!(approx(scene.view, camera.view_matrix()));
        assert!(scene.view_position.truncate().abs_diff_eq(camera.position, EPSILON));
        assert_eq!(scene.view_position.w, 1.0);
    }
}

// ============================================================================
// Skybox
// ============================================================================

#[test]
fn sky_views_drop_translation() {
    let engine = full_frame(FrameConfig::default());
    let camera = engine.demo().core().camera;
    assert_ne!(camera.position, Vec3::ZERO);

    let scene_target = engine.demo().core().targets.id(TargetName::Scene).unwrap();
    let skies = draws_of(&engine, ProgramKind::Skybox);
    // Six capture faces plus the main scene.
    assert_eq!(skies.len(), 7);
    for (target, draw) in skies {
        let sky: SkyUniforms = decode(draw);
        assert_eq!(sky.view.w_axis, Vec4::W);
        if target == RenderTarget::Offscreen(scene_target) {
            assert!(approx(sky.view, camera.view_matrix_no_translation()));
            assert_eq!(Mat3::from_mat4(sky.view), Mat3::from_mat4(camera.view_matrix()));
        }
    }
}

// ============================================================================
// Cube face capture
// ============================================================================

#[test]
fn capture_faces_look_out_from_the_capture_center() {
    let engine = full_frame(FrameConfig::default());
    let center = Camera::new(SPHERE_CENTER, 0.0, 0.0);

    let mut faces = 0;
    for (target, draw) in draws_of(&engine, ProgramKind::Phong) {
        let RenderTarget::CubeFace { face, .. } = target else {
            continue;
        };
        faces += 1;
        let scene: SceneUniforms = decode(draw);
        assert!(approx(scene.view, center.face_view_matrix(face)), "{face:?}");
        assert!(scene.view_position.truncate().abs_diff_eq(SPHERE_CENTER, EPSILON));
    }
    assert_eq!(faces, 6);

    for (target, draw) in draws_of(&engine, ProgramKind::Skybox) {
        let RenderTarget::CubeFace { face, .. } = target else {
            continue;
        };
        let sky: SkyUniforms = decode(draw);
        let rotation = Mat4::from_mat3(Mat3::from_mat4(center.face_view_matrix(face)));
        assert!(approx(sky.view, rotation), "{face:?}");
    }
}

// ============================================================================
// Picking
// ============================================================================

#[test]
fn pick_draws_use_the_scene_view() {
    let engine = full_frame(FrameConfig::default());
    let camera = engine.demo().core().camera;

    let picks = draws_of(&engine, ProgramKind::PickId);
    assert_eq!(picks.len(), 2);
    let colors: Vec<Vec4> = picks
        .iter()
        .map(|(_, draw)| {
            let id: IdUniforms = decode(draw);
            assert!(approx(id.view, camera.view_matrix()));
            id.color
        })
        .collect();
    assert_eq!(colors, vec![id_to_color(TAVERN_PICK_ID), id_to_color(SPHERE_PICK_ID)]);
}

// ============================================================================
// Composite
// ============================================================================

#[test]
fn composite_carries_exposure_gamma_and_flags() {
    let config = FrameConfig {
        exposure: 3.5,
        gamma: 1.8,
        kernel_enabled: true,
        kernel: KernelPreset::Emboss.matrix(),
        kernel_ratio: (640.0, 480.0),
        invert: true,
        ..FrameConfig::default()
    };
    let engine = full_frame(config.clone());

    let composites = draws_of(&engine, ProgramKind::Composite);
    assert_eq!(composites.len(), 1);
    let post: PostUniforms = decode(composites[0].1);

    assert_eq!(post.params, Vec4::new(640.0, 480.0, 3.5, 1.8));
    assert_eq!(post.flags.x, config.post_flags(true).bits());
    assert_eq!(post.kernel_matrix(), KernelPreset::Emboss.matrix());
}
