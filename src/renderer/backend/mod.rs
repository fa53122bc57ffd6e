//! GPU Backends
//!
//! The backend is responsible for only one thing: turning resource requests
//! and recorded [`Frame`]s into work on a graphics API.
//!
//! Resource ids are allocated by the [`Device`](crate::renderer::Device)
//! front end and handed to the backend on creation, so the rest of the crate
//! never sees an API object directly.
//!
//! | Backend | Purpose |
//! |---------|---------|
//! | [`HeadlessBackend`] | Records every call; no GPU. Used by tests |
//! | [`WgpuBackend`] | Renders through `wgpu` into a window surface |

pub mod frame;
pub mod headless;
pub mod webgpu;

use std::any::Any;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::errors::Result;

pub use frame::{
    ClearOp, Command, CubeFace, DrawCall, DrawState, Frame, InstanceSource, LightBinding,
    PassBegin, RenderTarget, VertexSource, Viewport,
};
pub use headless::{BackendStats, BufferWrite, HeadlessBackend};
pub use webgpu::WgpuBackend;

// ─── Resource Ids ───────────────────────────────────────────────────────────

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident, $variant:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Raw index, unique per device.
            #[inline]
            #[must_use]
            pub const fn index(self) -> u32 {
                self.0
            }
        }

        impl From<$name> for ResourceId {
            #[inline]
            fn from(id: $name) -> Self {
                ResourceId::$variant(id)
            }
        }
    };
}

resource_id!(
    /// Vertex, instance or uniform buffer.
    BufferId,
    Buffer
);
resource_id!(
    /// 2D texture or cubemap, including framebuffer attachments.
    TextureId,
    Texture
);
resource_id!(
    /// Offscreen render target.
    FramebufferId,
    Framebuffer
);
resource_id!(
    /// Compiled shader program.
    ProgramId,
    Program
);

/// Any GPU resource, used by the release queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceId {
    Buffer(BufferId),
    Texture(TextureId),
    Framebuffer(FramebufferId),
    Program(ProgramId),
}

// ─── Buffers ────────────────────────────────────────────────────────────────

bitflags! {
    /// How a buffer is bound. Every buffer can be written after creation.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct BufferUsage: u32 {
        const VERTEX   = 1 << 0;
        const INSTANCE = 1 << 1;
        const UNIFORM  = 1 << 2;
    }
}

#[derive(Debug, Clone)]
pub struct BufferDesc<'a> {
    pub label: &'a str,
    pub usage: BufferUsage,
    pub size: u64,
}

// ─── Vertex Layout ──────────────────────────────────────────────────────────

bitflags! {
    /// Attributes a vertex buffer actually carries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct VertexAttributes: u32 {
        const POSITION = 1 << 0;
        const UV       = 1 << 1;
        const NORMAL   = 1 << 2;
        const TANGENT  = 1 << 3;
    }
}

/// Interleaved vertex layout: stride plus the byte offset of each attribute.
///
/// Offsets of attributes absent from `attributes` are meaningless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    pub stride: u32,
    pub attributes: VertexAttributes,
    pub position_offset: u32,
    pub uv_offset: u32,
    pub normal_offset: u32,
    pub tangent_offset: u32,
}

impl VertexLayout {
    /// `position: vec3, uv: vec2, normal: vec3, tangent: vec3`.
    pub const FULL: Self = Self {
        stride: 44,
        attributes: VertexAttributes::all(),
        position_offset: 0,
        uv_offset: 12,
        normal_offset: 20,
        tangent_offset: 32,
    };

    /// `position: vec3` only (skybox cube).
    pub const POSITION_ONLY: Self = Self {
        stride: 12,
        attributes: VertexAttributes::POSITION,
        position_offset: 0,
        uv_offset: 0,
        normal_offset: 0,
        tangent_offset: 0,
    };

    /// The full layout restricted to the attributes actually present.
    #[must_use]
    pub fn full_with(attributes: VertexAttributes) -> Self {
        Self {
            attributes: attributes | VertexAttributes::POSITION,
            ..Self::FULL
        }
    }

    #[inline]
    #[must_use]
    pub fn has(&self, attribute: VertexAttributes) -> bool {
        self.attributes.contains(attribute)
    }
}

// ─── Textures ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Linear 8-bit color.
    Rgba8Unorm,
    /// Gamma-encoded 8-bit color, decoded to linear when sampled.
    Rgba8UnormSrgb,
    /// HDR color for offscreen scene and blur targets.
    Rgba16Float,
    /// Depth attachment.
    Depth32Float,
}

impl TextureFormat {
    #[must_use]
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Rgba8Unorm | Self::Rgba8UnormSrgb | Self::Depth32Float => 4,
            Self::Rgba16Float => 8,
        }
    }

    #[must_use]
    pub const fn is_color(self) -> bool {
        !matches!(self, Self::Depth32Float)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    D2,
    /// Six layers in +X, -X, +Y, -Y, +Z, -Z order.
    Cube,
}

impl TextureKind {
    #[must_use]
    pub const fn layer_count(self) -> u32 {
        match self {
            Self::D2 => 1,
            Self::Cube => 6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextureDesc<'a> {
    pub label: &'a str,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub kind: TextureKind,
    pub mip_level_count: u32,
}

/// One mip level of one layer, tightly packed rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

// ─── Framebuffers ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FramebufferDesc<'a> {
    pub label: &'a str,
    pub width: u32,
    pub height: u32,
    /// Color attachments, bound in order (location 0, 1, ...).
    pub color_formats: SmallVec<[TextureFormat; 2]>,
    pub depth: bool,
    /// `Cube` makes every color attachment a cubemap rendered one face at a time.
    pub kind: TextureKind,
}

/// Why a framebuffer cannot be rendered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncompleteReason {
    ZeroSize,
    TooLarge { limit: u32 },
    MissingAttachment,
    TooManyAttachments { limit: u32 },
    UnsupportedFormat(TextureFormat),
}

/// Result of the one-time completeness check made after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    Complete,
    Incomplete(IncompleteReason),
}

impl FramebufferStatus {
    #[inline]
    #[must_use]
    pub fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Checks a framebuffer description against backend limits.
#[must_use]
pub fn check_framebuffer(desc: &FramebufferDesc, max_dimension: u32, max_attachments: u32) -> FramebufferStatus {
    use FramebufferStatus::Incomplete;

    if desc.width == 0 || desc.height == 0 {
        return Incomplete(IncompleteReason::ZeroSize);
    }
    if desc.width > max_dimension || desc.height > max_dimension {
        return Incomplete(IncompleteReason::TooLarge { limit: max_dimension });
    }
    if desc.color_formats.is_empty() {
        return Incomplete(IncompleteReason::MissingAttachment);
    }
    if desc.color_formats.len() as u32 > max_attachments {
        return Incomplete(IncompleteReason::TooManyAttachments { limit: max_attachments });
    }
    if let Some(&format) = desc.color_formats.iter().find(|f| !f.is_color()) {
        return Incomplete(IncompleteReason::UnsupportedFormat(format));
    }
    FramebufferStatus::Complete
}

// ─── Programs ───────────────────────────────────────────────────────────────

/// Vertex input a program expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexInput {
    /// No vertex buffer; a full-screen triangle is generated from the vertex index.
    FullscreenTriangle,
    /// Interleaved mesh vertices.
    Mesh,
    /// Mesh vertices plus a per-instance `mat4` (four `vec4` slots, divisor 1).
    MeshInstanced,
    /// Positions only.
    Position,
}

/// Texture slot kind, in binding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    D2,
    Cube,
}

/// Everything a backend needs to build a program.
///
/// `source` is WGSL with `vs_main` / `fs_main` entry points. Group 0 holds the
/// uniform block (binding 0) and, if `uses_lights`, the light block
/// (binding 1). Group 1 holds the textures in slot order followed by one
/// sampler.
#[derive(Debug, Clone)]
pub struct ProgramDesc {
    pub label: &'static str,
    pub source: &'static str,
    pub vertex: VertexInput,
    pub textures: SmallVec<[TextureSlot; 4]>,
    pub uses_lights: bool,
    pub uniform_size: u32,
    /// Number of color outputs (2 for scene passes writing a bloom attachment).
    pub color_outputs: u8,
}

// ─── Backend Trait ──────────────────────────────────────────────────────────

/// Capability surface of a graphics API.
///
/// Creation calls never fail except program creation: shader errors are
/// fatal at startup, everything else degrades.
pub trait GpuBackend: Any {
    fn name(&self) -> &'static str;

    fn create_buffer(&mut self, id: BufferId, desc: &BufferDesc, contents: Option<&[u8]>);

    /// Overwrites `bytes.len()` bytes starting at `offset`.
    fn write_buffer(&mut self, id: BufferId, offset: u64, bytes: &[u8]);

    /// `layers[layer][mip]`; an empty slice leaves the texture uninitialized.
    fn create_texture(&mut self, id: TextureId, desc: &TextureDesc, layers: &[Vec<MipLevel>]);

    /// Creates the framebuffer and its color attachments (`color[i]` for
    /// `desc.color_formats[i]`), then reports completeness.
    fn create_framebuffer(
        &mut self,
        id: FramebufferId,
        desc: &FramebufferDesc,
        color: &[TextureId],
    ) -> FramebufferStatus;

    fn create_program(&mut self, id: ProgramId, desc: &ProgramDesc) -> Result<()>;

    fn release(&mut self, resource: ResourceId);

    /// Executes a recorded frame in command order.
    fn submit(&mut self, frame: &Frame);

    /// Finishes the frame and shows it.
    fn present(&mut self);

    /// Reads one pixel of the first color attachment of `framebuffer`.
    fn read_pixel(&mut self, framebuffer: FramebufferId, x: u32, y: u32) -> Option<[u8; 4]>;

    fn surface_size(&self) -> (u32, u32);

    fn resize(&mut self, width: u32, height: u32);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
