//! The shared indoor scene: one static mesh, its two textures and the light
//! array every lit pass binds.

use glam::Mat4;

use super::light::LightSet;
use crate::assets::{MeshAsset, ResourceCache, TextureAsset, TextureFlags};
use crate::renderer::Device;
use crate::renderer::backend::TextureId;

pub const TAVERN_MESH: &str = "media/fantasy_game_inn.obj";
pub const TAVERN_DIFFUSE: &str = "media/fantasy_game_inn_diffuse.png";
pub const TAVERN_EMISSIVE: &str = "media/fantasy_game_inn_emissive.png";

pub const DEFAULT_LIGHT_COUNT: usize = super::light::MAX_LIGHTS;

const TEXTURE_FLAGS: TextureFlags = TextureFlags::FLIP.union(TextureFlags::GEN_MIPMAPS);

pub struct TavernScene {
    /// `None` when the mesh could not be loaded; the scene then draws nothing.
    pub mesh: Option<MeshAsset>,
    pub diffuse: TextureAsset,
    pub emissive: TextureAsset,
    lights: LightSet,
}

impl TavernScene {
    /// Loads the tavern through `cache` and uploads the light array once.
    ///
    /// Light 0 is the default light above the origin; the rest start
    /// disabled. Missing assets are logged and replaced, never fatal.
    pub fn new(device: &mut Device, cache: &mut ResourceCache, light_count: usize) -> Self {
        let mesh = match cache.load_mesh(device, TAVERN_MESH, 1.0) {
            Ok(mesh) => Some(mesh),
            Err(e) => {
                log::warn!("Tavern mesh unavailable: {e}");
                None
            }
        };
        let diffuse = cache.load_texture_or(device, TAVERN_DIFFUSE, TEXTURE_FLAGS, [255; 4]);
        let emissive = cache.load_texture_or(device, TAVERN_EMISSIVE, TEXTURE_FLAGS, [0, 0, 0, 255]);
        let lights = LightSet::with_default(device, light_count);
        Self {
            mesh,
            diffuse,
            emissive,
            lights,
        }
    }

    #[inline]
    #[must_use]
    pub fn light_set(&self) -> &LightSet {
        &self.lights
    }

    #[inline]
    #[must_use]
    pub fn light_set_mut(&mut self) -> &mut LightSet {
        &mut self.lights
    }

    #[must_use]
    pub fn textures(&self) -> [TextureId; 2] {
        [self.diffuse.texture, self.emissive.texture]
    }

    #[must_use]
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::IDENTITY
    }
}
