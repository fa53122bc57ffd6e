//! Declarative pass descriptors.
//!
//! A demo's frame is a `Vec<Pass>`. The variants carry only *what* to draw
//! and *where*; target binding, viewports, clears, uniform packing and blur
//! ping-pong bookkeeping are done by the
//! [`PassExecutor`](super::executor::PassExecutor).

use glam::{Mat4, Vec3};
use smallvec::SmallVec;

use super::programs::ProgramKind;
use super::targets::TargetName;
use crate::assets::MeshAsset;
use crate::renderer::backend::{InstanceSource, TextureId};
use crate::resources::uniforms::SceneFlags;

/// Where a draw samples a texture from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSource {
    /// A loaded asset.
    Texture(TextureId),
    /// Color attachment `index` of an offscreen target written earlier this frame.
    Attachment { target: TargetName, index: usize },
    /// Whichever ping-pong target the last blur chain wrote.
    BlurOutput,
}

impl TextureSource {
    #[must_use]
    pub const fn color(target: TargetName) -> Self {
        Self::Attachment { target, index: 0 }
    }
}

/// Where a scene pass renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassTarget {
    /// The window surface.
    Default,
    Offscreen(TargetName),
}

/// How a draw's uniform block is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shading {
    /// [`SceneUniforms`](crate::resources::uniforms::SceneUniforms) with the
    /// light block bound.
    Lit(SceneFlags),
    /// Scene uniforms without lights (reflective surfaces).
    Unlit(SceneFlags),
    /// Sky uniforms; the view is stripped of translation and depth writes are off.
    Sky,
    /// Flat pick id.
    Id(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub program: ProgramKind,
    pub mesh: MeshAsset,
    pub model: Mat4,
    pub textures: SmallVec<[TextureSource; 4]>,
    pub instances: Option<InstanceSource>,
    pub shading: Shading,
}

impl DrawItem {
    #[must_use]
    pub fn new(program: ProgramKind, mesh: MeshAsset, shading: Shading) -> Self {
        Self {
            program,
            mesh,
            model: Mat4::IDENTITY,
            textures: SmallVec::new(),
            instances: None,
            shading,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: Mat4) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn with_textures(mut self, textures: impl IntoIterator<Item = TextureSource>) -> Self {
        self.textures = textures.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_instances(mut self, instances: InstanceSource) -> Self {
        self.instances = Some(instances);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenePass {
    pub label: &'static str,
    pub target: PassTarget,
    pub draws: Vec<DrawItem>,
}

/// Renders `draws` six times into the faces of `target`, from a camera at
/// `center`. Must finish before anything samples `target` this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CubemapCapturePass {
    pub target: TargetName,
    pub center: Vec3,
    pub draws: Vec<DrawItem>,
}

/// Separable Gaussian ping-pong. The iteration count comes from the frame
/// configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BlurPass {
    pub source: TextureSource,
    pub targets: [TargetName; 2],
}

/// Full-screen resolve of the scene (plus optional bloom) into `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositePass {
    pub scene: TextureSource,
    pub bloom: Option<TextureSource>,
    pub target: PassTarget,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pass {
    CubemapCapture(CubemapCapturePass),
    Scene(ScenePass),
    Blur(BlurPass),
    Composite(CompositePass),
}

impl Pass {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CubemapCapture(_) => "CubemapCapture",
            Self::Scene(p) => p.label,
            Self::Blur(_) => "Blur",
            Self::Composite(_) => "Composite",
        }
    }
}
