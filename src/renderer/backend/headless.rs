//! Headless Backend
//!
//! A backend that performs no GPU work but records everything it is asked to
//! do: call counts, a byte mirror of every buffer, framebuffer statuses and
//! every submitted frame. Tests drive demos and pipelines through it and then
//! inspect the recording via [`Device::backend`](crate::renderer::Device::backend).
//!
//! # Flat shading
//!
//! Submitted frames are also evaluated, with every texture and render target
//! modelled as a single color. Each draw paints its whole target (no depth,
//! last draw wins) from its decoded uniform block:
//!
//! | Program | Output |
//! |---------|--------|
//! | scene programs | the fragment color, plus [`bloom_threshold`] on the bright attachment |
//! | `skybox` | the sampled sky color, black bright pass |
//! | `pick_id` | the encoded id color |
//! | `blur` | the source scaled by the sum of the blur taps |
//! | `composite` | [`composite`] of the scene and bloom inputs |
//!
//! Lighting is not emulated: scene fragments shade to
//! [`with_fragment_color`](HeadlessBackend::with_fragment_color).

use std::any::Any;

use glam::{Vec3, Vec4};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::{SmallVec, smallvec};

use super::{
    BufferDesc, BufferId, FramebufferDesc, FramebufferId, FramebufferStatus, GpuBackend,
    MipLevel, ProgramDesc, ProgramId, ResourceId, TextureDesc, TextureId, check_framebuffer,
};
use super::frame::{Command, DrawCall, Frame, RenderTarget};
use crate::errors::{Result, TavernError};
use crate::resources::post_process::{bloom_threshold, blur_taps, composite};
use crate::resources::uniforms::{BlurUniforms, IdUniforms, PostUniforms, SceneFlags, SceneUniforms};

const OPAQUE_BLACK: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);

/// Call counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackendStats {
    pub buffers_created: u32,
    pub buffer_writes: u32,
    pub textures_created: u32,
    pub framebuffers_created: u32,
    pub programs_created: u32,
    pub releases: u32,
    pub frames_submitted: u32,
    pub draws_submitted: u32,
    pub presents: u32,
}

/// A recorded partial buffer write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferWrite {
    pub buffer: BufferId,
    pub offset: u64,
    pub len: u64,
}

#[derive(Debug, Clone)]
pub struct TextureRecord {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub layers: Vec<Vec<MipLevel>>,
}

#[derive(Debug, Clone)]
pub struct FramebufferRecord {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub color: Vec<TextureId>,
    pub status: FramebufferStatus,
}

pub struct HeadlessBackend {
    stats: BackendStats,
    buffers: FxHashMap<BufferId, Vec<u8>>,
    writes: Vec<BufferWrite>,
    textures: FxHashMap<TextureId, TextureRecord>,
    framebuffers: FxHashMap<FramebufferId, FramebufferRecord>,
    programs: FxHashMap<ProgramId, &'static str>,
    released: FxHashSet<ResourceId>,
    failing_programs: FxHashSet<&'static str>,
    frames: Vec<Frame>,
    pixels: FxHashMap<(FramebufferId, u32, u32), [u8; 4]>,
    colors: FxHashMap<TextureId, Vec4>,
    surface: Vec4,
    fragment_color: Vec3,
    surface_size: (u32, u32),
    max_dimension: u32,
    max_attachments: u32,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl HeadlessBackend {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            stats: BackendStats::default(),
            buffers: FxHashMap::default(),
            writes: Vec::new(),
            textures: FxHashMap::default(),
            framebuffers: FxHashMap::default(),
            programs: FxHashMap::default(),
            released: FxHashSet::default(),
            failing_programs: FxHashSet::default(),
            frames: Vec::new(),
            pixels: FxHashMap::default(),
            colors: FxHashMap::default(),
            surface: Vec4::ZERO,
            fragment_color: Vec3::ONE,
            surface_size: (width, height),
            max_dimension: 8192,
            max_attachments: 8,
        }
    }

    /// Makes creation of the program labelled `label` fail.
    #[must_use]
    pub fn with_failing_program(mut self, label: &'static str) -> Self {
        self.failing_programs.insert(label);
        self
    }

    /// Color every scene fragment shades to (white by default).
    #[must_use]
    pub fn with_fragment_color(mut self, color: Vec3) -> Self {
        self.fragment_color = color;
        self
    }

    /// Fills `texture` with one color for the draws that sample it next.
    pub fn set_texture_color(&mut self, texture: TextureId, color: Vec4) {
        self.colors.insert(texture, color);
    }

    /// Flat color of a texture or attachment. Attachments nothing drew into
    /// are transparent black; uploaded textures report their first texel.
    #[must_use]
    pub fn texture_color(&self, texture: TextureId) -> Vec4 {
        if let Some(color) = self.colors.get(&texture) {
            return *color;
        }
        self.textures
            .get(&texture)
            .and_then(|t| t.layers.first()?.first())
            .filter(|level| level.bytes.len() >= 4)
            .map_or(Vec4::ZERO, |level| {
                Vec4::from_array(std::array::from_fn(|i| f32::from(level.bytes[i]) / 255.0))
            })
    }

    /// Color of the window surface after the last submitted frame.
    #[inline]
    #[must_use]
    pub fn surface_color(&self) -> Vec4 {
        self.surface
    }

    /// Overrides what [`read_pixel`](GpuBackend::read_pixel) returns at one
    /// position.
    pub fn set_pixel(&mut self, framebuffer: FramebufferId, x: u32, y: u32, rgba: [u8; 4]) {
        self.pixels.insert((framebuffer, x, y), rgba);
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> BackendStats {
        self.stats
    }

    /// Current contents of a buffer, `None` if unknown or released.
    #[must_use]
    pub fn buffer_bytes(&self, id: BufferId) -> Option<&[u8]> {
        self.buffers.get(&id).map(Vec::as_slice)
    }

    /// Every partial write since creation, in order.
    #[must_use]
    pub fn buffer_writes(&self) -> &[BufferWrite] {
        &self.writes
    }

    #[must_use]
    pub fn texture(&self, id: TextureId) -> Option<&TextureRecord> {
        self.textures.get(&id)
    }

    #[must_use]
    pub fn framebuffer(&self, id: FramebufferId) -> Option<&FramebufferRecord> {
        self.framebuffers.get(&id)
    }

    #[must_use]
    pub fn is_released(&self, resource: impl Into<ResourceId>) -> bool {
        self.released.contains(&resource.into())
    }

    /// Number of live (created and not yet released) resources.
    #[must_use]
    pub fn live_resources(&self) -> usize {
        self.buffers.len() + self.textures.len() + self.framebuffers.len() + self.programs.len()
    }

    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    #[must_use]
    pub fn last_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn clear_frames(&mut self) {
        self.frames.clear();
    }

    // ========================================================================
    // Flat shading
    // ========================================================================

    fn shade_frame(&mut self, frame: &Frame) {
        let mut outputs: SmallVec<[Option<TextureId>; 2]> = SmallVec::new();
        for command in &frame.commands {
            match command {
                Command::BeginPass(begin) => {
                    outputs = self.outputs(begin.target);
                    if let Some(clear) = begin.clear.color {
                        for &output in &outputs {
                            self.store(output, Vec4::from_array(clear));
                        }
                    }
                }
                Command::Draw(draw) => {
                    let shaded = self.shade(draw);
                    for (&output, color) in outputs.iter().zip(shaded) {
                        if let Some(color) = color {
                            self.store(output, color);
                        }
                    }
                }
                Command::EndPass => outputs.clear(),
            }
        }
    }

    /// Color outputs of a target; `None` is the window surface.
    fn outputs(&self, target: RenderTarget) -> SmallVec<[Option<TextureId>; 2]> {
        match target {
            RenderTarget::Default => smallvec![None],
            RenderTarget::Offscreen(framebuffer) | RenderTarget::CubeFace { framebuffer, .. } => self
                .framebuffers
                .get(&framebuffer)
                .map(|fb| fb.color.iter().copied().map(Some).collect())
                .unwrap_or_default(),
        }
    }

    fn store(&mut self, output: Option<TextureId>, color: Vec4) {
        match output {
            Some(texture) => {
                self.colors.insert(texture, color);
            }
            None => self.surface = color,
        }
    }

    fn sample(&self, draw: &DrawCall, slot: usize) -> Vec3 {
        draw.textures
            .get(slot)
            .map_or(Vec3::ZERO, |t| self.texture_color(*t).truncate())
    }

    /// Color and bright-pass outputs of one draw.
    fn shade(&self, draw: &DrawCall) -> [Option<Vec4>; 2] {
        let Some(&label) = self.programs.get(&draw.program) else {
            return [None, None];
        };
        let shaded = match label {
            "composite" => decode::<PostUniforms>(&draw.uniforms).map(|post| {
                let scene = [self.sample(draw, 0); 9];
                let bloom = [self.sample(draw, 1); 9];
                [Some(composite(&post, &scene, &bloom).extend(1.0)), None]
            }),
            "blur" => decode::<BlurUniforms>(&draw.uniforms).map(|blur| {
                let [a, b] = blur.weights;
                let total: f32 = blur_taps(&[a.x, a.y, a.z, a.w, b.x]).iter().map(|(_, w)| w).sum();
                [Some((self.sample(draw, 0) * total).extend(1.0)), None]
            }),
            "skybox" => Some([Some(self.sample(draw, 0).extend(1.0)), Some(OPAQUE_BLACK)]),
            "pick_id" => decode::<IdUniforms>(&draw.uniforms).map(|id| [Some(id.color), None]),
            _ => decode::<SceneUniforms>(&draw.uniforms).map(|scene| {
                let flags = SceneFlags::from_bits_truncate(scene.flags.x);
                let bright = if flags.contains(SceneFlags::BLOOM_OUTPUT) {
                    bloom_threshold(self.fragment_color, scene.params.x)
                } else {
                    OPAQUE_BLACK
                };
                [Some(self.fragment_color.extend(1.0)), Some(bright)]
            }),
        };
        shaded.unwrap_or_else(|| {
            log::warn!("'{label}' draw with a {}-byte uniform block", draw.uniforms.len());
            [None, None]
        })
    }
}

fn decode<T: bytemuck::Pod>(bytes: &[u8]) -> Option<T> {
    (bytes.len() == std::mem::size_of::<T>()).then(|| bytemuck::pod_read_unaligned(bytes))
}

fn quantize(color: Vec4) -> [u8; 4] {
    color
        .clamp(Vec4::ZERO, Vec4::ONE)
        .to_array()
        .map(|c| (c * 255.0).round() as u8)
}

impl GpuBackend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn create_buffer(&mut self, id: BufferId, desc: &BufferDesc, contents: Option<&[u8]>) {
        self.stats.buffers_created += 1;
        let mut bytes = vec![0u8; desc.size as usize];
        if let Some(contents) = contents {
            let n = contents.len().min(bytes.len());
            bytes[..n].copy_from_slice(&contents[..n]);
        }
        self.buffers.insert(id, bytes);
    }

    fn write_buffer(&mut self, id: BufferId, offset: u64, bytes: &[u8]) {
        self.stats.buffer_writes += 1;
        self.writes.push(BufferWrite {
            buffer: id,
            offset,
            len: bytes.len() as u64,
        });
        let Some(mirror) = self.buffers.get_mut(&id) else {
            log::warn!("write to unknown buffer {id:?}");
            return;
        };
        let start = offset as usize;
        let end = start + bytes.len();
        if end > mirror.len() {
            log::warn!("write past end of buffer {id:?} ({end} > {})", mirror.len());
            return;
        }
        mirror[start..end].copy_from_slice(bytes);
    }

    fn create_texture(&mut self, id: TextureId, desc: &TextureDesc, layers: &[Vec<MipLevel>]) {
        self.stats.textures_created += 1;
        self.textures.insert(
            id,
            TextureRecord {
                label: desc.label.to_string(),
                width: desc.width,
                height: desc.height,
                layers: layers.to_vec(),
            },
        );
    }

    fn create_framebuffer(
        &mut self,
        id: FramebufferId,
        desc: &FramebufferDesc,
        color: &[TextureId],
    ) -> FramebufferStatus {
        self.stats.framebuffers_created += 1;
        let status = check_framebuffer(desc, self.max_dimension, self.max_attachments);
        for &texture in color {
            self.textures.insert(
                texture,
                TextureRecord {
                    label: format!("{} attachment", desc.label),
                    width: desc.width,
                    height: desc.height,
                    layers: Vec::new(),
                },
            );
        }
        self.framebuffers.insert(
            id,
            FramebufferRecord {
                label: desc.label.to_string(),
                width: desc.width,
                height: desc.height,
                color: color.to_vec(),
                status,
            },
        );
        status
    }

    fn create_program(&mut self, id: ProgramId, desc: &ProgramDesc) -> Result<()> {
        let missing_entry = !desc.source.contains("fn vs_main") || !desc.source.contains("fn fs_main");
        if self.failing_programs.contains(desc.label) || missing_entry {
            return Err(TavernError::ShaderCompilation {
                label: desc.label.to_string(),
                message: "entry point vs_main/fs_main not found".to_string(),
            });
        }
        self.stats.programs_created += 1;
        self.programs.insert(id, desc.label);
        Ok(())
    }

    fn release(&mut self, resource: ResourceId) {
        self.stats.releases += 1;
        self.released.insert(resource);
        match resource {
            ResourceId::Buffer(id) => {
                self.buffers.remove(&id);
            }
            ResourceId::Texture(id) => {
                self.textures.remove(&id);
                self.colors.remove(&id);
            }
            ResourceId::Framebuffer(id) => {
                self.framebuffers.remove(&id);
            }
            ResourceId::Program(id) => {
                self.programs.remove(&id);
            }
        }
    }

    fn submit(&mut self, frame: &Frame) {
        self.stats.frames_submitted += 1;
        self.stats.draws_submitted += frame.draws().count() as u32;
        self.shade_frame(frame);
        self.frames.push(frame.clone());
    }

    fn present(&mut self) {
        self.stats.presents += 1;
    }

    fn read_pixel(&mut self, framebuffer: FramebufferId, x: u32, y: u32) -> Option<[u8; 4]> {
        let record = self.framebuffers.get(&framebuffer)?;
        let flat = record
            .color
            .first()
            .and_then(|t| self.colors.get(t))
            .map(|c| quantize(*c));
        Some(
            self.pixels
                .get(&(framebuffer, x, y))
                .copied()
                .or(flat)
                .unwrap_or([0, 0, 0, 255]),
        )
    }

    fn surface_size(&self) -> (u32, u32) {
        self.surface_size
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.surface_size = (width, height);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
