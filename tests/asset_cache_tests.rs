//! Resource Cache Tests
//!
//! Tests for:
//! - One upload per distinct key (meshes, textures, cubemaps)
//! - Texture keys include the load flags
//! - Failed loads upload nothing and are not cached
//! - Fallback textures and cubemaps
//! - Dropping the cache releases every GPU resource it owns

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

use tavern::assets::{MemoryAssetSource, ResourceCache, TextureFlags};
use tavern::errors::TavernError;
use tavern::renderer::Device;
use tavern::renderer::backend::HeadlessBackend;
use tavern::resources::primitives::create_box;

const TRIANGLE: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
";

fn png(size: u32, color: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(size, size, Rgba(color));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

const FACES: [&str; 6] = [
    "sky/right.png",
    "sky/left.png",
    "sky/top.png",
    "sky/bottom.png",
    "sky/front.png",
    "sky/back.png",
];

fn source() -> MemoryAssetSource {
    let mut source = MemoryAssetSource::new()
        .with_file("tri.obj", TRIANGLE)
        .with_file("wood.png", png(4, [120, 80, 40, 255]))
        .with_file("broken.png", b"definitely not a png".to_vec());
    for face in FACES {
        source.insert(face, png(2, [10, 20, 30, 255]));
    }
    source
}

fn setup() -> (Device, ResourceCache) {
    (
        Device::new(HeadlessBackend::new(800, 600)),
        ResourceCache::new(source()),
    )
}

fn headless(device: &Device) -> &HeadlessBackend {
    device.backend::<HeadlessBackend>().unwrap()
}

// ============================================================================
// Deduplication
// ============================================================================

#[test]
fn mesh_is_uploaded_once() -> anyhow::Result<()> {
    let (mut device, mut cache) = setup();

    let first = cache.load_mesh(&mut device, "tri.obj", 1.0)?;
    let second = cache.load_mesh(&mut device, "tri.obj", 1.0)?;

    assert_eq!(first, second);
    assert_eq!(first.vertex_count, 3);
    assert_eq!(headless(&device).stats().buffers_created, 1);
    assert_eq!(cache.stats().misses, 1);
    assert_eq!(cache.stats().hits, 1);
    Ok(())
}

#[test]
fn mesh_key_ignores_scale() {
    let (mut device, mut cache) = setup();

    let first = cache.load_mesh(&mut device, "tri.obj", 1.0).unwrap();
    let scaled = cache.load_mesh(&mut device, "tri.obj", 3.0).unwrap();

    assert_eq!(first.buffer, scaled.buffer);
    assert_eq!(headless(&device).stats().buffers_created, 1);
}

#[test]
fn texture_is_uploaded_once_per_flags() {
    let (mut device, mut cache) = setup();

    let a = cache.load_texture(&mut device, "wood.png", TextureFlags::FLIP).unwrap();
    let b = cache.load_texture(&mut device, "wood.png", TextureFlags::FLIP).unwrap();
    let c = cache
        .load_texture(&mut device, "wood.png", TextureFlags::FLIP | TextureFlags::GEN_MIPMAPS)
        .unwrap();

    assert_eq!(a, b);
    assert_ne!(a.texture, c.texture);
    assert_eq!((a.width, a.height), (4, 4));
    assert_eq!(headless(&device).stats().textures_created, 2);

    let record = headless(&device).texture(c.texture).unwrap();
    assert_eq!(record.layers[0].len(), 3, "4x4 with mipmaps has three levels");
}

#[test]
fn builtin_mesh_is_built_once() {
    let (mut device, mut cache) = setup();
    let mut builds = 0;

    for _ in 0..3 {
        cache.mesh_from_data(&mut device, "builtin:box", || {
            builds += 1;
            create_box(1.0, 1.0, 1.0)
        });
    }

    assert_eq!(builds, 1);
    assert_eq!(headless(&device).stats().buffers_created, 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn cubemap_is_assembled_once() -> anyhow::Result<()> {
    let (mut device, mut cache) = setup();

    let first = cache.load_cubemap(&mut device, &FACES)?;
    let second = cache.load_cubemap(&mut device, &FACES)?;

    assert_eq!(first, second);
    assert_eq!(first.width, 2);
    let record = headless(&device)
        .texture(first.texture)
        .ok_or_else(|| anyhow::anyhow!("cubemap not recorded"))?;
    assert_eq!(record.layers.len(), 6);
    assert_eq!(headless(&device).stats().textures_created, 1);
    Ok(())
}

// ============================================================================
// Failures and fallbacks
// ============================================================================

#[test]
fn missing_file_uploads_nothing() {
    let (mut device, mut cache) = setup();

    let err = cache.load_mesh(&mut device, "nowhere.obj", 1.0).unwrap_err();
    assert!(matches!(err, TavernError::AssetNotFound(_)));
    assert!(err.is_asset_error());

    assert_eq!(headless(&device).stats().buffers_created, 0);
    assert!(cache.is_empty());
}

#[test]
fn corrupt_image_is_not_cached() {
    let (mut device, mut cache) = setup();

    for _ in 0..2 {
        let err = cache
            .load_texture(&mut device, "broken.png", TextureFlags::empty())
            .unwrap_err();
        assert!(matches!(err, TavernError::ImageDecodeError(_)));
    }
    assert_eq!(cache.stats().misses, 0);
    assert_eq!(headless(&device).stats().textures_created, 0);
}

#[test]
fn fallback_texture_is_shared() {
    let (mut device, mut cache) = setup();

    let a = cache.load_texture_or(&mut device, "a.png", TextureFlags::empty(), [255; 4]);
    let b = cache.load_texture_or(&mut device, "b.png", TextureFlags::empty(), [255; 4]);

    assert_eq!(a.texture, b.texture);
    assert_eq!((a.width, a.height), (1, 1));
    assert_eq!(headless(&device).stats().textures_created, 1);
}

#[test]
fn incomplete_cubemap_falls_back() {
    let (mut device, mut cache) = setup();
    let mut faces = FACES;
    faces[3] = "sky/missing.png";

    assert!(cache.load_cubemap(&mut device, &faces).is_err());
    let fallback = cache.load_cubemap_or(&mut device, &faces, [0, 0, 255, 255]);

    let record = headless(&device).texture(fallback.texture).unwrap();
    assert_eq!(record.layers.len(), 6);
    assert_eq!(record.layers[0][0].bytes, vec![0, 0, 255, 255]);
}

// ============================================================================
// Ownership
// ============================================================================

#[test]
fn dropping_cache_releases_everything() {
    let (mut device, mut cache) = setup();
    let mesh = cache.load_mesh(&mut device, "tri.obj", 1.0).unwrap();
    let texture = cache.load_texture(&mut device, "wood.png", TextureFlags::empty()).unwrap();
    let sky = cache.load_cubemap(&mut device, &FACES).unwrap();
    assert_eq!(headless(&device).live_resources(), 3);

    drop(cache);
    assert_eq!(device.collect_garbage(), 3);

    let backend = headless(&device);
    assert_eq!(backend.live_resources(), 0);
    assert!(backend.is_released(mesh.buffer));
    assert!(backend.is_released(texture.texture));
    assert!(backend.is_released(sky.texture));
}
