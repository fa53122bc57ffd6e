//! Shader program catalogue.
//!
//! Every program a pass can use is a [`ProgramKind`]. A demo compiles the
//! kinds it needs once, at construction, into a [`ProgramLibrary`]; a compile
//! failure aborts the demo's construction.
//!
//! WGSL sources are assembled from shared chunks at compile time:
//! `scene_common` (scene uniforms, bloom output), `lighting` (light block,
//! Blinn-Phong) and `fullscreen` (full-screen triangle vertex stage).

use std::mem::size_of;

use rustc_hash::FxHashMap;
use smallvec::smallvec;

use crate::errors::{Result, TavernError};
use crate::renderer::Device;
use crate::renderer::backend::{ProgramDesc, ProgramId, TextureSlot, VertexInput};
use crate::renderer::handles::ProgramHandle;
use crate::resources::uniforms::{
    BlurUniforms, IdUniforms, PostUniforms, SceneUniforms, SkyUniforms,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Blinn-Phong over the light block; diffuse + emissive textures.
    /// Writes color and, when the target has one, the bloom attachment.
    Phong,
    /// [`Phong`](Self::Phong) with a per-instance model matrix.
    PhongInstanced,
    /// Phong with a tangent-space normal map (diffuse + normal textures).
    NormalMapped,
    /// Mirror reflection of an environment cubemap.
    Reflective,
    Skybox,
    /// Flat object-id color for picking.
    PickId,
    /// One separable Gaussian step.
    Blur,
    /// Bloom add, tone map, gamma, kernel, invert and greyscale.
    Composite,
}

impl ProgramKind {
    pub const ALL: [Self; 8] = [
        Self::Phong,
        Self::PhongInstanced,
        Self::NormalMapped,
        Self::Reflective,
        Self::Skybox,
        Self::PickId,
        Self::Blur,
        Self::Composite,
    ];

    #[must_use]
    pub fn desc(self) -> ProgramDesc {
        use TextureSlot::{Cube, D2};
        match self {
            Self::Phong => ProgramDesc {
                label: "phong",
                source: concat!(
                    include_str!("shaders/scene_common.wgsl"),
                    include_str!("shaders/lighting.wgsl"),
                    include_str!("shaders/phong.wgsl")
                ),
                vertex: VertexInput::Mesh,
                textures: smallvec![D2, D2],
                uses_lights: true,
                uniform_size: size_of::<SceneUniforms>() as u32,
                color_outputs: 2,
            },
            Self::PhongInstanced => ProgramDesc {
                label: "phong_instanced",
                source: concat!(
                    include_str!("shaders/scene_common.wgsl"),
                    include_str!("shaders/lighting.wgsl"),
                    include_str!("shaders/phong_instanced.wgsl")
                ),
                vertex: VertexInput::MeshInstanced,
                textures: smallvec![D2, D2],
                uses_lights: true,
                uniform_size: size_of::<SceneUniforms>() as u32,
                color_outputs: 2,
            },
            Self::NormalMapped => ProgramDesc {
                label: "normal_mapped",
                source: concat!(
                    include_str!("shaders/scene_common.wgsl"),
                    include_str!("shaders/lighting.wgsl"),
                    include_str!("shaders/normal_mapped.wgsl")
                ),
                vertex: VertexInput::Mesh,
                textures: smallvec![D2, D2],
                uses_lights: true,
                uniform_size: size_of::<SceneUniforms>() as u32,
                color_outputs: 2,
            },
            Self::Reflective => ProgramDesc {
                label: "reflective",
                source: concat!(
                    include_str!("shaders/scene_common.wgsl"),
                    include_str!("shaders/reflective.wgsl")
                ),
                vertex: VertexInput::Mesh,
                textures: smallvec![Cube],
                uses_lights: false,
                uniform_size: size_of::<SceneUniforms>() as u32,
                color_outputs: 2,
            },
            Self::Skybox => ProgramDesc {
                label: "skybox",
                source: include_str!("shaders/skybox.wgsl"),
                vertex: VertexInput::Position,
                textures: smallvec![Cube],
                uses_lights: false,
                uniform_size: size_of::<SkyUniforms>() as u32,
                color_outputs: 2,
            },
            Self::PickId => ProgramDesc {
                label: "pick_id",
                source: include_str!("shaders/pick_id.wgsl"),
                vertex: VertexInput::Position,
                textures: smallvec![],
                uses_lights: false,
                uniform_size: size_of::<IdUniforms>() as u32,
                color_outputs: 1,
            },
            Self::Blur => ProgramDesc {
                label: "blur",
                source: concat!(
                    include_str!("shaders/fullscreen.wgsl"),
                    include_str!("shaders/blur.wgsl")
                ),
                vertex: VertexInput::FullscreenTriangle,
                textures: smallvec![D2],
                uses_lights: false,
                uniform_size: size_of::<BlurUniforms>() as u32,
                color_outputs: 1,
            },
            Self::Composite => ProgramDesc {
                label: "composite",
                source: concat!(
                    include_str!("shaders/fullscreen.wgsl"),
                    include_str!("shaders/composite.wgsl")
                ),
                vertex: VertexInput::FullscreenTriangle,
                textures: smallvec![D2, D2],
                uses_lights: false,
                uniform_size: size_of::<PostUniforms>() as u32,
                color_outputs: 1,
            },
        }
    }
}

/// Compiled programs owned by one demo.
#[derive(Default)]
pub struct ProgramLibrary {
    programs: FxHashMap<ProgramKind, ProgramHandle>,
}

impl ProgramLibrary {
    /// Compiles every kind in `kinds`. The first failure is returned and the
    /// programs compiled so far are released.
    pub fn compile(device: &mut Device, kinds: &[ProgramKind]) -> Result<Self> {
        let mut programs = FxHashMap::default();
        for &kind in kinds {
            if programs.contains_key(&kind) {
                continue;
            }
            let handle = device.create_program(&kind.desc())?;
            programs.insert(kind, handle);
        }
        log::info!("Compiled {} programs", programs.len());
        Ok(Self { programs })
    }

    #[must_use]
    pub fn contains(&self, kind: ProgramKind) -> bool {
        self.programs.contains_key(&kind)
    }

    pub fn get(&self, kind: ProgramKind) -> Result<ProgramId> {
        self.programs
            .get(&kind)
            .map(ProgramHandle::id)
            .ok_or_else(|| TavernError::UnknownResource(format!("program {kind:?} not compiled")))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use wgpu::naga::front::wgsl;
    use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

    use super::*;

    #[test]
    fn every_program_source_validates() {
        for kind in ProgramKind::ALL {
            let desc = kind.desc();
            let module = wgsl::parse_str(desc.source)
                .unwrap_or_else(|e| panic!("{}: {}", desc.label, e.emit_to_string(desc.source)));
            let result = Validator::new(ValidationFlags::all(), Capabilities::all()).validate(&module);
            assert!(result.is_ok(), "{}: {:?}", desc.label, result.err());
        }
    }

    #[test]
    fn declared_uniform_sizes_are_16_byte_aligned() {
        for kind in ProgramKind::ALL {
            let desc = kind.desc();
            assert_eq!(desc.uniform_size % 16, 0, "{}", desc.label);
            let lit = matches!(
                kind,
                ProgramKind::Phong | ProgramKind::PhongInstanced | ProgramKind::NormalMapped
            );
            assert_eq!(desc.uses_lights, lit, "{}", desc.label);
        }
    }
}
