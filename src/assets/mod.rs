//! Asset loading and the GPU resource cache.
//!
//! - [`AssetSource`]: where bytes come from (file system or memory)
//! - [`loaders`]: pure parsers (OBJ via `tobj`, images via `image`)
//! - [`ResourceCache`]: one upload per distinct key, owns every handle

pub mod cache;
pub mod loaders;
pub mod source;

pub use cache::{CacheStats, MeshAsset, ResourceCache, TextureAsset};
pub use loaders::TextureFlags;
pub use source::{AssetSource, FileAssetSource, MemoryAssetSource};
