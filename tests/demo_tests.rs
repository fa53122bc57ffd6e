//! Demo Tests
//!
//! Drives every demo through the [`Engine`] on the headless backend.
//!
//! Tests for:
//! - Every demo builds from in-memory assets and presents a valid frame
//! - Missing assets degrade to fallbacks instead of failing
//! - Asteroid instances keep their seeds and reuse their buffer
//! - Click picking reads the id under the cursor after submission
//! - Switching demos releases the previous demo's GPU resources

use glam::Vec2;

use tavern::app::input::FrameInput;
use tavern::assets::{MemoryAssetSource, ResourceCache};
use tavern::demos::{AsteroidField, Demo, DemoKind, SkyboxDemo};
use tavern::renderer::backend::{HeadlessBackend, RenderTarget};
use tavern::renderer::graph::FrameStage;
use tavern::renderer::pipeline::{FrameConfig, Pass, ProgramKind, TargetName};
use tavern::renderer::{Device, RenderSettings};
use tavern::resources::InstanceParams;
use tavern::scene::tavern::TAVERN_MESH;
use tavern::Engine;

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

fn assets() -> MemoryAssetSource {
    MemoryAssetSource::new()
        .with_file(TAVERN_MESH, TRIANGLE)
        .with_file("media/sphere.obj", TRIANGLE)
        .with_file("media/rock.obj", TRIANGLE)
}

fn engine(kind: DemoKind) -> Engine {
    Engine::new(
        Device::new(HeadlessBackend::new(800, 600)),
        ResourceCache::new(assets()),
        RenderSettings::default(),
        kind,
    )
    .unwrap()
}

fn input(frame: u32) -> FrameInput {
    FrameInput {
        delta_time: 1.0 / 60.0,
        time: frame as f32 / 60.0,
        ..FrameInput::default()
    }
}

fn run_frame(engine: &mut Engine, input: &FrameInput) {
    engine.frame_with_input(input).unwrap();
    engine.begin_overlay().unwrap();
    engine.present();
}

fn headless(device: &Device) -> &HeadlessBackend {
    device.backend::<HeadlessBackend>().unwrap()
}

// ============================================================================
// Every demo
// ============================================================================

#[test]
fn every_demo_presents_to_the_window() {
    for kind in DemoKind::ALL {
        let mut engine = engine(kind);
        run_frame(&mut engine, &input(1));
        run_frame(&mut engine, &input(2));

        assert_eq!(engine.demo().kind(), kind);
        assert_eq!(engine.frame_count(), 2);
        assert_eq!(engine.stage(), Some(FrameStage::DebugUi));

        let backend = headless(&engine.device);
        assert_eq!(backend.stats().frames_submitted, 2, "{}", kind.name());
        assert_eq!(backend.stats().presents, 2, "{}", kind.name());

        let frame = backend.last_frame().unwrap();
        assert_eq!(frame.label, kind.name());
        let last = frame.passes().last().unwrap();
        assert_eq!(last.target, RenderTarget::Default, "{}", kind.name());
    }
}

#[test]
fn demos_build_without_any_assets() {
    for kind in DemoKind::ALL {
        let mut engine = Engine::new(
            Device::new(HeadlessBackend::default()),
            ResourceCache::new(MemoryAssetSource::new()),
            RenderSettings::default(),
            kind,
        )
        .unwrap();
        run_frame(&mut engine, &input(1));
        assert!(!headless(&engine.device).last_frame().unwrap().is_empty());
    }
}

#[test]
fn full_demo_runs_the_whole_chain() {
    let mut engine = engine(DemoKind::Full);
    engine.config.blur_iterations = 4;
    run_frame(&mut engine, &input(1));

    let frame = headless(&engine.device).last_frame().unwrap();
    let labels: Vec<&str> = frame.passes().map(|p| p.label.as_str()).collect();
    assert_eq!(labels.len(), 6 + 1 + 4 + 1);
    assert!(labels[..6].iter().all(|l| l.starts_with("Capture")));
    assert_eq!(labels[6], "Full Scene MRT");
    assert!(labels[7..11].iter().all(|l| l.starts_with("Blur")));
    assert_eq!(labels[11], "Composite");
}

#[test]
fn unsupported_toggles_are_masked() {
    let mut engine = engine(DemoKind::Base);
    engine.config.bloom = true;
    engine.config.dynamic_reflection = true;
    run_frame(&mut engine, &input(1));

    let frame = headless(&engine.device).last_frame().unwrap();
    assert_eq!(frame.passes().count(), 1);
    // The UI-edited configuration itself is left alone.
    assert!(engine.config.bloom);
}

// ============================================================================
// Instancing
// ============================================================================

#[test]
fn asteroid_seeds_survive_frames() {
    let mut device = Device::new(HeadlessBackend::default());
    let mut cache = ResourceCache::new(assets());
    let mut field = AsteroidField::new(&mut device, &mut cache);
    let params = InstanceParams::default();

    field.update(&mut device, &params);
    let first = field.field().seeds().to_vec();
    field.update(&mut device, &params);
    let second = field.field().seeds();

    assert_eq!(first.len(), 500);
    for (a, b) in first.iter().zip(second) {
        assert_eq!(a.displacement, b.displacement);
        assert_eq!(a.scale, b.scale);
        assert_eq!(a.rotation, b.rotation);
        assert_eq!(a.drift, b.drift);
        assert!((b.phase - (a.phase + a.drift)).abs() < 1e-6);
    }
}

#[test]
fn instance_buffer_is_reused_until_outgrown() {
    let mut device = Device::new(HeadlessBackend::default());
    let mut cache = ResourceCache::new(assets());
    let mut field = AsteroidField::new(&mut device, &mut cache);
    let buffers_before = headless(&device).stats().buffers_created;

    let mut params = InstanceParams::default();
    field.update(&mut device, &params);
    field.update(&mut device, &params);
    assert_eq!(headless(&device).stats().buffers_created, buffers_before + 1);
    assert_eq!(field.capacity(), 500);
    let write = headless(&device).buffer_writes().last().copied().unwrap();
    assert_eq!((write.offset, write.len), (0, 500 * 64));

    params.count = 100;
    field.update(&mut device, &params);
    assert_eq!(field.instance_count(), 100);
    assert_eq!(field.capacity(), 500);
    assert_eq!(headless(&device).stats().buffers_created, buffers_before + 1);

    params.count = 800;
    field.update(&mut device, &params);
    assert_eq!(field.capacity(), 800);
    assert_eq!(headless(&device).stats().buffers_created, buffers_before + 2);
    assert_eq!(device.pending_releases(), 1);

    let draw = field.draw().unwrap();
    assert_eq!(draw.instances.unwrap().count, 800);
}

#[test]
fn disabled_ring_is_not_drawn() {
    let mut engine = engine(DemoKind::Full);
    engine.config.instancing_enabled = false;
    engine.config.dynamic_reflection = false;
    run_frame(&mut engine, &input(1));

    let frame = headless(&engine.device).last_frame().unwrap();
    assert!(frame.draws().all(|d| d.instances.is_none()));
}

// ============================================================================
// Picking
// ============================================================================

#[test]
fn click_reads_the_id_under_the_cursor() {
    let mut device = Device::new(HeadlessBackend::default());
    let mut cache = ResourceCache::new(assets());
    let mut demo = SkyboxDemo::new(&mut device, &mut cache, &RenderSettings::default()).unwrap();
    let config = FrameConfig::default();

    demo.core_mut().targets.prepare(&mut device, (800, 600));
    let picking = demo.core().targets.id(TargetName::Picking).unwrap();
    device
        .backend_mut::<HeadlessBackend>()
        .unwrap()
        .set_pixel(picking, 10, 20, [2, 0, 0, 255]);

    let click = FrameInput {
        just_clicked: true,
        cursor: Vec2::new(10.0, 20.0),
        ..FrameInput::default()
    };
    demo.update(&mut device, &click, &config);
    let passes = demo.passes(&config);
    let pick_pass = passes.iter().find_map(|p| match p {
        Pass::Scene(s) if s.label == "Picking" => Some(s),
        _ => None,
    });
    let pick_pass = pick_pass.unwrap();
    assert_eq!(pick_pass.draws.len(), 2);
    assert!(pick_pass.draws.iter().all(|d| d.program == ProgramKind::PickId));

    demo.after_submit(&mut device);
    assert_eq!(demo.picker().last_picked(), Some(2));

    // Background elsewhere; no click means no id pass at all.
    let miss = FrameInput {
        cursor: Vec2::new(300.0, 300.0),
        ..click
    };
    demo.update(&mut device, &miss, &config);
    demo.after_submit(&mut device);
    assert_eq!(demo.picker().last_picked(), Some(0));

    demo.update(&mut device, &FrameInput::default(), &config);
    assert!(!demo.picker().is_requested());
    assert!(demo.passes(&config).iter().all(|p| match p {
        Pass::Scene(s) => s.label != "Picking",
        _ => true,
    }));
}

#[test]
fn engine_renders_pick_pass_on_click() {
    let mut engine = engine(DemoKind::Skybox);
    run_frame(&mut engine, &input(1));

    let click = FrameInput {
        just_clicked: true,
        cursor: Vec2::new(5.0, 5.0),
        ..input(2)
    };
    run_frame(&mut engine, &click);

    let picking = engine.demo().core().targets.id(TargetName::Picking).unwrap();
    let frame = headless(&engine.device).last_frame().unwrap();
    assert!(frame
        .passes()
        .any(|p| p.target == RenderTarget::Offscreen(picking)));
}

// ============================================================================
// Switching
// ============================================================================

#[test]
fn switching_releases_the_previous_demo() -> anyhow::Result<()> {
    let mut engine = engine(DemoKind::Full);
    run_frame(&mut engine, &input(1));

    let blur = engine.demo().core().programs.get(ProgramKind::Blur)?;
    let scene = engine.demo().core().targets.id(TargetName::Scene)?;
    let tavern = engine.cache.load_mesh(&mut engine.device, TAVERN_MESH, 1.0)?;

    engine.switch_demo(DemoKind::Base)?;
    assert_eq!(engine.demo().kind(), DemoKind::Base);
    assert!(engine.device.pending_releases() > 0);

    run_frame(&mut engine, &input(2));
    let backend = headless(&engine.device);
    assert!(backend.is_released(blur));
    assert!(backend.is_released(scene));
    // Cached assets outlive the demo that loaded them.
    assert!(!backend.is_released(tavern.buffer));
    assert_eq!(engine.device.pending_releases(), 0);
    Ok(())
}

#[test]
fn switching_to_the_running_demo_is_a_no_op() {
    let mut engine = engine(DemoKind::Hdr);
    let programs = headless(&engine.device).stats().programs_created;
    engine.switch_demo(DemoKind::Hdr).unwrap();
    assert_eq!(headless(&engine.device).stats().programs_created, programs);
}

#[test]
fn failed_switch_keeps_the_current_demo() {
    let mut engine = Engine::new(
        Device::new(HeadlessBackend::default().with_failing_program("blur")),
        ResourceCache::new(assets()),
        RenderSettings::default(),
        DemoKind::Skybox,
    )
    .unwrap();

    assert!(engine.switch_demo(DemoKind::Bloom).is_err());
    assert_eq!(engine.demo().kind(), DemoKind::Skybox);
    run_frame(&mut engine, &input(1));
}
