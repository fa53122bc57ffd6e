//! Post-Processing Tests
//!
//! Tests for:
//! - Tone mapping runs before gamma correction
//! - Bloom brightness threshold
//! - Blur ping-pong schedule parity
//! - Composite flags follow the frame configuration
//! - The composite stage chain: bloom add, resolve, kernel, invert, greyscale
//! - Kernel presets and pick id encoding

use glam::{Mat3, Vec3, Vec4};

use tavern::renderer::pipeline::FrameConfig;
use tavern::resources::post_process::{
    bloom_threshold, composite, convolve, gamma_correct, greyscale, invert, luminance, resolve,
    tone_map,
};
use tavern::resources::uniforms::{PostFlags, PostUniforms, color_to_id, id_to_color};
use tavern::resources::{KernelPreset, blur_last_written, blur_schedule};

const EPSILON: f32 = 1e-5;

fn approx(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

// ============================================================================
// Tone mapping and gamma
// ============================================================================

#[test]
fn tone_map_is_applied_before_gamma() {
    let hdr = Vec3::new(2.0, 0.5, 0.1);
    let (exposure, gamma) = (1.0, 2.2);

    let resolved = resolve(hdr, Some(exposure), Some(gamma));
    assert!(approx(resolved, gamma_correct(tone_map(hdr, exposure), gamma)));
    assert!(!approx(resolved, tone_map(gamma_correct(hdr, gamma), exposure)));
}

#[test]
fn disabled_stages_pass_color_through() {
    let hdr = Vec3::new(3.0, 0.2, 0.7);
    assert!(approx(resolve(hdr, None, None), hdr));
    assert!(approx(resolve(hdr, Some(1.5), None), tone_map(hdr, 1.5)));
    assert!(approx(resolve(hdr, None, Some(2.2)), gamma_correct(hdr, 2.2)));
}

#[test]
fn tone_map_compresses_into_unit_range() {
    let mapped = tone_map(Vec3::new(0.0, 1.0, 100.0), 1.0);
    assert!(approx(mapped, Vec3::new(0.0, 1.0 - (-1.0f32).exp(), 1.0)));

    let brighter = tone_map(Vec3::splat(0.5), 4.0);
    let darker = tone_map(Vec3::splat(0.5), 0.5);
    assert!(brighter.x > darker.x);
}

// ============================================================================
// Bloom
// ============================================================================

#[test]
fn bright_colors_pass_the_threshold() {
    let bright = Vec3::splat(0.9);
    assert_eq!(bloom_threshold(bright, 0.5), Vec4::new(0.9, 0.9, 0.9, 1.0));
}

#[test]
fn dim_colors_become_opaque_black() {
    assert_eq!(bloom_threshold(Vec3::splat(0.3), 0.5), Vec4::new(0.0, 0.0, 0.0, 1.0));
}

#[test]
fn threshold_uses_perceptual_luminance() {
    // Pure blue is far dimmer than pure green at the same intensity.
    assert!(luminance(Vec3::Z) < 0.5);
    assert!(luminance(Vec3::Y) > 0.5);
    assert_eq!(bloom_threshold(Vec3::Z, 0.5).truncate(), Vec3::ZERO);
    assert_eq!(bloom_threshold(Vec3::Y, 0.5).truncate(), Vec3::Y);
}

// ============================================================================
// Blur schedule
// ============================================================================

#[test]
fn blur_schedule_has_one_step_per_iteration() {
    for n in 0..12 {
        assert_eq!(blur_schedule(n).count(), n as usize);
    }
}

#[test]
fn blur_result_lands_in_iterations_mod_two() {
    for n in 1..12u32 {
        let last = blur_schedule(n).last().unwrap();
        assert_eq!(last.target, blur_last_written(n), "{n} iterations");
        assert_eq!(blur_last_written(n), (n % 2) as usize);
    }
}

#[test]
fn blur_steps_alternate_direction_and_target() {
    let steps: Vec<_> = blur_schedule(4).collect();
    assert_eq!(steps[0].source, None);
    for pair in steps.windows(2) {
        assert_ne!(pair[0].horizontal, pair[1].horizontal);
        assert_eq!(pair[1].source, Some(pair[0].target));
        assert_ne!(pair[0].target, pair[1].target);
    }
}

// ============================================================================
// Composite configuration
// ============================================================================

#[test]
fn post_flags_follow_toggles() {
    let config = FrameConfig {
        kernel_enabled: true,
        invert: true,
        gamma_correct: false,
        ..FrameConfig::default()
    };
    let flags = config.post_flags(true);
    assert!(flags.contains(PostFlags::BLOOM | PostFlags::TONE_MAP | PostFlags::KERNEL));
    assert!(flags.contains(PostFlags::INVERT));
    assert!(!flags.contains(PostFlags::GAMMA));
    assert!(!flags.contains(PostFlags::GREYSCALE));

    // Without a blur chain bloom is never composited.
    assert!(!config.post_flags(false).contains(PostFlags::BLOOM));
}

#[test]
fn kernel_presets_act_on_neighbourhoods() {
    let flat = [Vec3::splat(0.4); 9];
    assert!(approx(convolve(&KernelPreset::Identity.matrix(), &flat), Vec3::splat(0.4)));
    assert!(approx(convolve(&KernelPreset::BoxBlur.matrix(), &flat), Vec3::splat(0.4)));
    // Edge detect A weights sum to one, edge detect B to zero.
    assert!(approx(convolve(&KernelPreset::EdgeDetectA.matrix(), &flat), Vec3::splat(0.4)));
    assert!(approx(convolve(&KernelPreset::EdgeDetectB.matrix(), &flat), Vec3::ZERO));

    let custom = Mat3::from_cols_array(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0]);
    let mut samples = [Vec3::ZERO; 9];
    samples[8] = Vec3::ONE;
    assert!(approx(convolve(&custom, &samples), Vec3::splat(2.0)));
}

#[test]
fn invert_then_greyscale() {
    let color = Vec3::new(0.2, 0.4, 0.9);
    assert!(approx(invert(color), Vec3::new(0.8, 0.6, 0.1)));
    assert!(approx(greyscale(invert(color)), Vec3::splat(0.5)));
}

fn post_uniforms(config: &FrameConfig, with_bloom: bool) -> PostUniforms {
    PostUniforms::new(
        &config.kernel,
        config.kernel_ratio,
        config.exposure,
        config.gamma,
        config.post_flags(with_bloom),
    )
}

#[test]
fn composite_adds_bloom_before_resolving() {
    let config = FrameConfig {
        exposure: 1.5,
        ..FrameConfig::default()
    };
    let scene = [Vec3::new(0.6, 0.3, 0.1); 9];
    let bloom = [Vec3::new(0.4, 0.2, 0.0); 9];

    let with_bloom = composite(&post_uniforms(&config, true), &scene, &bloom);
    assert!(approx(with_bloom, resolve(scene[4] + bloom[4], Some(1.5), Some(config.gamma))));

    // No blur chain: the bloom samples are ignored.
    let without = composite(&post_uniforms(&config, false), &scene, &bloom);
    assert!(approx(without, resolve(scene[4], Some(1.5), Some(config.gamma))));
}

#[test]
fn composite_convolves_resolved_samples() {
    let config = FrameConfig {
        tone_map: false,
        gamma_correct: false,
        kernel_enabled: true,
        kernel: KernelPreset::EdgeDetectB.matrix(),
        ..FrameConfig::default()
    };
    let mut scene = [Vec3::splat(0.25); 9];
    scene[4] = Vec3::splat(0.5);

    // Centre -16 * 0.5 plus eight neighbours at 2 * 0.25.
    let edges = composite(&post_uniforms(&config, false), &scene, &[Vec3::ZERO; 9]);
    assert!(approx(edges, Vec3::splat(-4.0)));

    let inverted = FrameConfig {
        kernel: KernelPreset::Identity.matrix(),
        invert: true,
        greyscale: true,
        ..config
    };
    let samples = [Vec3::new(0.2, 0.4, 0.9); 9];
    let color = composite(&post_uniforms(&inverted, false), &samples, &[Vec3::ZERO; 9]);
    assert!(approx(color, Vec3::splat(0.5)));
}

// ============================================================================
// Picking ids
// ============================================================================

#[test]
fn pick_id_is_little_endian_rgb() {
    assert_eq!(color_to_id([0, 0, 0, 255]), 0);
    assert_eq!(color_to_id([1, 2, 3, 255]), 1 + 2 * 256 + 3 * 65_536);

    let color = id_to_color(258);
    assert!((color.x - 2.0 / 255.0).abs() < EPSILON);
    assert!((color.y - 1.0 / 255.0).abs() < EPSILON);
    assert_eq!(color.w, 1.0);
}
