//! Resource Cache
//!
//! Deduplicates mesh and texture uploads. Every distinct key is read, decoded
//! and uploaded at most once for the cache's lifetime; repeated requests
//! return the same GPU id and metadata.
//!
//! | Entry | Key |
//! |-------|-----|
//! | Mesh | path |
//! | Texture | (path, [`TextureFlags`]) |
//! | Cubemap | the six face paths |
//! | Built-in mesh / solid texture | caller-chosen name |
//!
//! The cache exclusively owns every handle it returns. Consumers only copy
//! ids out; everything is released when the cache is dropped. There is no
//! eviction: the working set is the fixed set of demo assets.
//!
//! Failed loads are not cached and do not upload anything.

use rustc_hash::FxHashMap;

use super::loaders::{self, TextureFlags};
use super::source::AssetSource;
use crate::errors::{Result, TavernError};
use crate::renderer::backend::{
    BufferDesc, BufferId, BufferUsage, MipLevel, TextureDesc, TextureFormat, TextureId,
    TextureKind, VertexLayout,
};
use crate::renderer::handles::{BufferHandle, TextureHandle};
use crate::renderer::Device;
use crate::resources::geometry::MeshData;

/// What a mesh request returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshAsset {
    pub buffer: BufferId,
    pub vertex_count: u32,
    pub layout: VertexLayout,
}

/// What a texture request returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureAsset {
    pub texture: TextureId,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TextureKey {
    path: String,
    flags: TextureFlags,
}

struct CachedMesh {
    _buffer: BufferHandle,
    asset: MeshAsset,
    scale: f32,
}

struct CachedTexture {
    _texture: TextureHandle,
    asset: TextureAsset,
}

pub struct ResourceCache {
    source: Box<dyn AssetSource>,
    meshes: FxHashMap<String, CachedMesh>,
    textures: FxHashMap<TextureKey, CachedTexture>,
    cubemaps: FxHashMap<String, CachedTexture>,
    stats: CacheStats,
}

impl ResourceCache {
    pub fn new(source: impl AssetSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            meshes: FxHashMap::default(),
            textures: FxHashMap::default(),
            cubemaps: FxHashMap::default(),
            stats: CacheStats::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Number of cached entries of every kind.
    #[must_use]
    pub fn len(&self) -> usize {
        self.meshes.len() + self.textures.len() + self.cubemaps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ========================================================================
    // Meshes
    // ========================================================================

    /// Loads an OBJ file, scaling positions by `scale`, and uploads it once.
    ///
    /// The key is the path alone: a later request with a different scale
    /// gets the mesh as first loaded.
    pub fn load_mesh(&mut self, device: &mut Device, path: &str, scale: f32) -> Result<MeshAsset> {
        if let Some(entry) = self.meshes.get(path) {
            self.stats.hits += 1;
            if (entry.scale - scale).abs() > f32::EPSILON {
                log::debug!(
                    "Mesh '{path}' requested at scale {scale}, cached at {}",
                    entry.scale
                );
            }
            return Ok(entry.asset);
        }

        let bytes = self.source.read_bytes(path)?;
        let mesh = loaders::parse_obj(path, &bytes, scale)?;
        let asset = self.insert_mesh(device, path.to_string(), &mesh, scale);
        log::info!("Loaded mesh '{path}' ({} vertices)", asset.vertex_count);
        Ok(asset)
    }

    /// Uploads procedurally built geometry under `name`, once.
    pub fn mesh_from_data(
        &mut self,
        device: &mut Device,
        name: &str,
        build: impl FnOnce() -> MeshData,
    ) -> MeshAsset {
        if let Some(entry) = self.meshes.get(name) {
            self.stats.hits += 1;
            return entry.asset;
        }
        let mesh = build();
        self.insert_mesh(device, name.to_string(), &mesh, 1.0)
    }

    fn insert_mesh(&mut self, device: &mut Device, key: String, mesh: &MeshData, scale: f32) -> MeshAsset {
        self.stats.misses += 1;
        let bytes = mesh.as_bytes();
        let buffer = device.create_buffer(
            &BufferDesc {
                label: &key,
                usage: BufferUsage::VERTEX,
                size: bytes.len() as u64,
            },
            Some(bytes),
        );
        let asset = MeshAsset {
            buffer: buffer.id(),
            vertex_count: mesh.vertex_count(),
            layout: mesh.layout(),
        };
        self.meshes.insert(
            key,
            CachedMesh {
                _buffer: buffer,
                asset,
                scale,
            },
        );
        asset
    }

    // ========================================================================
    // Textures
    // ========================================================================

    /// Decodes and uploads an image once per distinct `(path, flags)`.
    pub fn load_texture(
        &mut self,
        device: &mut Device,
        path: &str,
        flags: TextureFlags,
    ) -> Result<TextureAsset> {
        let key = TextureKey {
            path: path.to_string(),
            flags,
        };
        if let Some(entry) = self.textures.get(&key) {
            self.stats.hits += 1;
            return Ok(entry.asset);
        }

        let bytes = self.source.read_bytes(path)?;
        let image = loaders::decode_image(path, &bytes, flags)?;
        self.stats.misses += 1;

        let texture = device.create_texture(
            &TextureDesc {
                label: path,
                width: image.width,
                height: image.height,
                format: image.format,
                kind: TextureKind::D2,
                mip_level_count: image.levels.len() as u32,
            },
            &[image.levels],
        );
        let asset = TextureAsset {
            texture: texture.id(),
            width: image.width,
            height: image.height,
        };
        log::info!("Loaded texture '{path}' {}x{} {flags:?}", asset.width, asset.height);
        self.textures.insert(
            key,
            CachedTexture {
                _texture: texture,
                asset,
            },
        );
        Ok(asset)
    }

    /// A 1x1 texture of a single color, used in place of missing images.
    pub fn solid_texture(&mut self, device: &mut Device, rgba: [u8; 4]) -> TextureAsset {
        let key = TextureKey {
            path: format!(
                "solid:#{:02x}{:02x}{:02x}{:02x}",
                rgba[0], rgba[1], rgba[2], rgba[3]
            ),
            flags: TextureFlags::empty(),
        };
        if let Some(entry) = self.textures.get(&key) {
            self.stats.hits += 1;
            return entry.asset;
        }
        self.stats.misses += 1;
        let texture = device.create_texture(
            &TextureDesc {
                label: &key.path,
                width: 1,
                height: 1,
                format: TextureFormat::Rgba8Unorm,
                kind: TextureKind::D2,
                mip_level_count: 1,
            },
            &[vec![MipLevel {
                width: 1,
                height: 1,
                bytes: rgba.to_vec(),
            }]],
        );
        let asset = TextureAsset {
            texture: texture.id(),
            width: 1,
            height: 1,
        };
        self.textures.insert(
            key,
            CachedTexture {
                _texture: texture,
                asset,
            },
        );
        asset
    }

    /// Loads a texture, or logs the failure and returns a solid fallback.
    pub fn load_texture_or(
        &mut self,
        device: &mut Device,
        path: &str,
        flags: TextureFlags,
        fallback: [u8; 4],
    ) -> TextureAsset {
        match self.load_texture(device, path, flags) {
            Ok(asset) => asset,
            Err(e) => {
                log::warn!("{e}; using fallback texture");
                self.solid_texture(device, fallback)
            }
        }
    }

    // ========================================================================
    // Cubemaps
    // ========================================================================

    /// Assembles six images (+X, -X, +Y, -Y, +Z, -Z) into one cubemap.
    pub fn load_cubemap(&mut self, device: &mut Device, faces: &[&str; 6]) -> Result<TextureAsset> {
        let key = faces.join("|");
        if let Some(entry) = self.cubemaps.get(&key) {
            self.stats.hits += 1;
            return Ok(entry.asset);
        }

        let mut read = Vec::with_capacity(6);
        for path in faces {
            read.push((*path, self.source.read_bytes(path)?));
        }
        let read: [(&str, Vec<u8>); 6] = read
            .try_into()
            .map_err(|_| TavernError::CubeMapError("expected six faces".into()))?;
        let (size, layers) = loaders::decode_cubemap(&read)?;
        self.stats.misses += 1;

        let texture = device.create_texture(
            &TextureDesc {
                label: &key,
                width: size,
                height: size,
                format: TextureFormat::Rgba8UnormSrgb,
                kind: TextureKind::Cube,
                mip_level_count: 1,
            },
            &layers,
        );
        let asset = TextureAsset {
            texture: texture.id(),
            width: size,
            height: size,
        };
        log::info!("Loaded cubemap '{}' ({size}px faces)", faces[0]);
        self.cubemaps.insert(
            key,
            CachedTexture {
                _texture: texture,
                asset,
            },
        );
        Ok(asset)
    }

    /// A 1x1-per-face cubemap of a single color.
    pub fn solid_cubemap(&mut self, device: &mut Device, rgba: [u8; 4]) -> TextureAsset {
        let key = format!(
            "solid-cube:#{:02x}{:02x}{:02x}{:02x}",
            rgba[0], rgba[1], rgba[2], rgba[3]
        );
        if let Some(entry) = self.cubemaps.get(&key) {
            self.stats.hits += 1;
            return entry.asset;
        }
        self.stats.misses += 1;
        let face = vec![MipLevel {
            width: 1,
            height: 1,
            bytes: rgba.to_vec(),
        }];
        let texture = device.create_texture(
            &TextureDesc {
                label: &key,
                width: 1,
                height: 1,
                format: TextureFormat::Rgba8Unorm,
                kind: TextureKind::Cube,
                mip_level_count: 1,
            },
            &vec![face; 6],
        );
        let asset = TextureAsset {
            texture: texture.id(),
            width: 1,
            height: 1,
        };
        self.cubemaps.insert(
            key,
            CachedTexture {
                _texture: texture,
                asset,
            },
        );
        asset
    }

    /// Loads a cubemap, or logs the failure and returns a solid one.
    pub fn load_cubemap_or(&mut self, device: &mut Device, faces: &[&str; 6], fallback: [u8; 4]) -> TextureAsset {
        match self.load_cubemap(device, faces) {
            Ok(asset) => asset,
            Err(e) => {
                log::warn!("{e}; using fallback cubemap");
                self.solid_cubemap(device, fallback)
            }
        }
    }
}
