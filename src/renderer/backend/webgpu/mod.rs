//! wgpu Backend
//!
//! Replays recorded [`Frame`]s through `wgpu`:
//!
//! - every draw's uniform block is packed into one per-frame buffer at
//!   aligned offsets and bound with a dynamic offset,
//! - render pipelines are created on first use and cached per
//!   (program, attachments, draw state, vertex layout),
//! - bind groups are cached until a resource they reference is released.
//!
//! The window surface texture is acquired by the first pass that targets it
//! and presented by [`GpuBackend::present`]. Anything drawn through
//! [`WgpuBackend::render_overlay`] in between lands on top of the frame.

mod context;
mod pipelines;
mod resources;

use std::any::Any;
use std::sync::mpsc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

pub use context::WgpuContext;
use pipelines::{GpuProgram, PipelineKey, create_render_pipeline};
use resources::{GpuFramebuffer, GpuTexture};

use super::frame::{ClearOp, DrawCall, Frame, PassBegin, RenderTarget};
use super::{
    BufferDesc, BufferId, BufferUsage, FramebufferDesc, FramebufferId, FramebufferStatus,
    GpuBackend, MipLevel, ProgramDesc, ProgramId, ResourceId, TextureDesc, TextureId, TextureKind,
    VertexInput,
};
use crate::errors::Result;
use crate::renderer::settings::RenderSettings;
use crate::scene::{LIGHT_SIZE, MAX_LIGHTS};

/// Copies of a texture row must be aligned to this many bytes.
const COPY_ROW_ALIGNMENT: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

fn align_to(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

/// Per-frame uniform storage shared by every draw.
struct UniformArena {
    buffer: wgpu::Buffer,
    capacity: u64,
    alignment: u64,
}

impl UniformArena {
    fn new(device: &wgpu::Device, capacity: u64) -> Self {
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment.max(1));
        Self {
            buffer: Self::allocate(device, capacity),
            capacity,
            alignment,
        }
    }

    fn allocate(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniforms"),
            size: capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Grows to hold `size` bytes. Returns `true` if the buffer was replaced.
    fn reserve(&mut self, device: &wgpu::Device, size: u64) -> bool {
        if size <= self.capacity {
            return false;
        }
        self.capacity = size.next_power_of_two();
        self.buffer = Self::allocate(device, self.capacity);
        log::debug!("Frame uniform buffer grown to {} bytes", self.capacity);
        true
    }
}

/// The acquired window image of the frame in flight.
struct SurfaceFrame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// Views and formats a pass renders into.
struct PassAttachments {
    colors: SmallVec<[wgpu::TextureView; 2]>,
    formats: SmallVec<[wgpu::TextureFormat; 2]>,
    depth: Option<wgpu::TextureView>,
    size: (u32, u32),
}

type TextureSet = SmallVec<[TextureId; 4]>;

pub struct WgpuBackend {
    ctx: WgpuContext,
    buffers: FxHashMap<BufferId, wgpu::Buffer>,
    textures: FxHashMap<TextureId, GpuTexture>,
    framebuffers: FxHashMap<FramebufferId, GpuFramebuffer>,
    programs: FxHashMap<ProgramId, GpuProgram>,
    pipelines: FxHashMap<PipelineKey, wgpu::RenderPipeline>,
    uniform_groups: FxHashMap<(ProgramId, Option<BufferId>), wgpu::BindGroup>,
    texture_groups: FxHashMap<(ProgramId, TextureSet), wgpu::BindGroup>,
    uniforms: UniformArena,
    /// Bound in place of the light block for lit programs drawn without lights.
    no_lights: wgpu::Buffer,
    material_sampler: wgpu::Sampler,
    screen_sampler: wgpu::Sampler,
    surface_frame: Option<SurfaceFrame>,
}

impl WgpuBackend {
    /// Creates the GPU context for `window`.
    pub async fn new<W>(window: W, settings: &RenderSettings, width: u32, height: u32) -> Result<Self>
    where
        W: raw_window_handle::HasWindowHandle + raw_window_handle::HasDisplayHandle + Send + Sync + 'static,
    {
        let ctx = WgpuContext::new(window, settings, width, height).await?;
        let device = &ctx.device;

        let uniforms = UniformArena::new(device, 64 * 1024);
        let no_lights = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Empty Light Block"),
            size: (MAX_LIGHTS * LIGHT_SIZE) as u64,
            usage: wgpu::BufferUsages::UNIFORM,
            mapped_at_creation: false,
        });
        let material_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });
        let screen_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Screen Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            ctx,
            buffers: FxHashMap::default(),
            textures: FxHashMap::default(),
            framebuffers: FxHashMap::default(),
            programs: FxHashMap::default(),
            pipelines: FxHashMap::default(),
            uniform_groups: FxHashMap::default(),
            texture_groups: FxHashMap::default(),
            uniforms,
            no_lights,
            material_sampler,
            screen_sampler,
            surface_frame: None,
        })
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> &WgpuContext {
        &self.ctx
    }

    /// Color format overlays must render with.
    #[must_use]
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.ctx.view_format
    }

    /// Records extra work into the window image of the current frame, after
    /// every submitted pass and before present.
    pub fn render_overlay<F>(&mut self, draw: F)
    where
        F: FnOnce(&WgpuContext, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        if !self.acquire_surface() {
            return;
        }
        let Some(frame) = &self.surface_frame else {
            return;
        };
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Overlay") });
        draw(&self.ctx, &mut encoder, &frame.view);
        self.ctx.queue.submit(Some(encoder.finish()));
    }

    /// Acquires the window image for this frame if not already held.
    fn acquire_surface(&mut self) -> bool {
        if self.surface_frame.is_some() {
            return true;
        }
        let texture = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(texture)
            | wgpu::CurrentSurfaceTexture::Suboptimal(texture) => texture,
            wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated => {
                self.ctx.reconfigure();
                return false;
            }
            e => {
                log::error!("Render error: {e:?}");
                return false;
            }
        };
        let view = texture.texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(self.ctx.view_format),
            ..Default::default()
        });
        self.surface_frame = Some(SurfaceFrame { texture, view });
        true
    }

    fn attachments(&mut self, target: RenderTarget) -> Option<PassAttachments> {
        match target {
            RenderTarget::Default => {
                if !self.acquire_surface() {
                    return None;
                }
                let frame = self.surface_frame.as_ref()?;
                Some(PassAttachments {
                    colors: SmallVec::from_elem(frame.view.clone(), 1),
                    formats: SmallVec::from_elem(self.ctx.view_format, 1),
                    depth: Some(self.ctx.depth_texture_view.clone()),
                    size: self.ctx.size(),
                })
            }
            RenderTarget::Offscreen(id) => {
                let fb = self.renderable(id)?;
                let colors = fb
                    .color
                    .iter()
                    .map(|t| self.textures.get(t).map(|t| t.view.clone()))
                    .collect::<Option<_>>()?;
                Some(PassAttachments {
                    colors,
                    formats: fb.formats.clone(),
                    depth: fb.depth.clone(),
                    size: (fb.width, fb.height),
                })
            }
            RenderTarget::CubeFace { framebuffer, face } => {
                let fb = self.renderable(framebuffer)?;
                if fb.kind != TextureKind::Cube {
                    log::warn!("{framebuffer:?} is not a cubemap target");
                    return None;
                }
                let colors = fb
                    .color
                    .iter()
                    .map(|t| self.textures.get(t).map(|t| t.layer_view(face.index() as u32)))
                    .collect::<Option<_>>()?;
                Some(PassAttachments {
                    colors,
                    formats: fb.formats.clone(),
                    depth: fb.depth.clone(),
                    size: (fb.width, fb.height),
                })
            }
        }
    }

    fn renderable(&self, id: FramebufferId) -> Option<&GpuFramebuffer> {
        let fb = self.framebuffers.get(&id)?;
        if fb.status.is_complete() {
            Some(fb)
        } else {
            log::trace!("Skipping pass into incomplete {id:?}");
            None
        }
    }

    fn pipeline_key(&self, draw: &DrawCall, pass: &PassAttachments) -> PipelineKey {
        let mut state = draw.state;
        state.wireframe &= self.ctx.supports_wireframe;
        PipelineKey {
            program: draw.program,
            colors: pass.formats.clone(),
            depth: pass.depth.is_some(),
            state,
            vertex_layout: draw.vertices.map(|v| v.layout),
        }
    }

    /// Builds whatever pipeline and bind groups `draw` needs. Returns `false`
    /// if the draw references something unknown and must be skipped.
    fn prepare_draw(&mut self, draw: &DrawCall, key: &PipelineKey) -> bool {
        let Some(program) = self.programs.get(&draw.program) else {
            log::warn!("Draw with unknown {:?}", draw.program);
            return false;
        };
        let desc = &program.desc;
        if desc.vertex != VertexInput::FullscreenTriangle && draw.vertices.is_none() {
            log::warn!("Program '{}' needs a vertex buffer", desc.label);
            return false;
        }
        if draw.textures.len() != desc.textures.len() {
            log::warn!(
                "Program '{}' expects {} textures, draw binds {}",
                desc.label,
                desc.textures.len(),
                draw.textures.len()
            );
            return false;
        }

        if !self.pipelines.contains_key(key) {
            let pipeline =
                create_render_pipeline(&self.ctx.device, program, key, self.ctx.supports_wireframe);
            self.pipelines.insert(key.clone(), pipeline);
        }

        let light_buffer = if desc.uses_lights {
            draw.lights.map(|l| l.buffer)
        } else {
            None
        };
        let uniform_key = (draw.program, light_buffer);
        if !self.uniform_groups.contains_key(&uniform_key) {
            let lights = match light_buffer {
                Some(id) => match self.buffers.get(&id) {
                    Some(buffer) => buffer,
                    None => return false,
                },
                None => &self.no_lights,
            };
            let mut entries = vec![wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &self.uniforms.buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(u64::from(desc.uniform_size)),
                }),
            }];
            if desc.uses_lights {
                entries.push(wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lights.as_entire_binding(),
                });
            }
            let group = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(desc.label),
                layout: &program.uniform_layout,
                entries: &entries,
            });
            self.uniform_groups.insert(uniform_key, group);
        }

        if let Some(layout) = &program.texture_layout {
            let texture_key = (draw.program, draw.textures.clone());
            if !self.texture_groups.contains_key(&texture_key) {
                let Some(views) = draw
                    .textures
                    .iter()
                    .map(|t| self.textures.get(t).map(|t| &t.view))
                    .collect::<Option<SmallVec<[&wgpu::TextureView; 4]>>>()
                else {
                    log::warn!("Program '{}' samples a released texture", desc.label);
                    return false;
                };
                let sampler = if desc.vertex == VertexInput::FullscreenTriangle {
                    &self.screen_sampler
                } else {
                    &self.material_sampler
                };
                let mut entries: Vec<wgpu::BindGroupEntry> = views
                    .iter()
                    .enumerate()
                    .map(|(i, view)| wgpu::BindGroupEntry {
                        binding: i as u32,
                        resource: wgpu::BindingResource::TextureView(view),
                    })
                    .collect();
                entries.push(wgpu::BindGroupEntry {
                    binding: views.len() as u32,
                    resource: wgpu::BindingResource::Sampler(sampler),
                });
                let group = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(desc.label),
                    layout,
                    entries: &entries,
                });
                self.texture_groups.insert(texture_key, group);
            }
        }
        true
    }

    /// Packs every draw's uniform block and uploads them in one write.
    fn upload_uniforms(&mut self, frame: &Frame) -> Vec<u32> {
        let alignment = self.uniforms.alignment;
        let mut offsets = Vec::new();
        let mut staging: Vec<u8> = Vec::new();
        for draw in frame.draws() {
            let offset = align_to(staging.len() as u64, alignment);
            staging.resize(offset as usize, 0);
            staging.extend_from_slice(&draw.uniforms);
            offsets.push(offset as u32);
        }
        if staging.is_empty() {
            return offsets;
        }
        let size = align_to(staging.len() as u64, alignment) + alignment;
        if self.uniforms.reserve(&self.ctx.device, size) {
            self.uniform_groups.clear();
        }
        self.ctx.queue.write_buffer(&self.uniforms.buffer, 0, &staging);
        offsets
    }

    fn record_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        begin: &PassBegin,
        attachments: &PassAttachments,
        draws: &[(&DrawCall, PipelineKey, u32)],
    ) {
        let ClearOp { color, depth } = begin.clear;
        let color_attachments: SmallVec<[Option<wgpu::RenderPassColorAttachment>; 2]> = attachments
            .colors
            .iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: match color {
                            Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                                r: f64::from(r),
                                g: f64::from(g),
                                b: f64::from(b),
                                a: f64::from(a),
                            }),
                            None => wgpu::LoadOp::Load,
                        },
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })
            })
            .collect();

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&begin.label),
            color_attachments: &color_attachments,
            depth_stencil_attachment: attachments.depth.as_ref().map(|view| {
                wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: if depth {
                            wgpu::LoadOp::Clear(1.0)
                        } else {
                            wgpu::LoadOp::Load
                        },
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }
            }),
            ..Default::default()
        });

        let (width, height) = attachments.size;
        let viewport = begin.viewport;
        let x = viewport.x.min(width.saturating_sub(1));
        let y = viewport.y.min(height.saturating_sub(1));
        pass.set_viewport(
            x as f32,
            y as f32,
            viewport.width.min(width - x).max(1) as f32,
            viewport.height.min(height - y).max(1) as f32,
            0.0,
            1.0,
        );

        for (draw, key, offset) in draws {
            let (Some(pipeline), Some(program)) = (self.pipelines.get(key), self.programs.get(&draw.program))
            else {
                continue;
            };
            let light_buffer = if program.desc.uses_lights {
                draw.lights.map(|l| l.buffer)
            } else {
                None
            };
            let Some(uniform_group) = self.uniform_groups.get(&(draw.program, light_buffer)) else {
                continue;
            };

            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, uniform_group, &[*offset]);
            if program.texture_layout.is_some() {
                let Some(group) = self.texture_groups.get(&(draw.program, draw.textures.clone())) else {
                    continue;
                };
                pass.set_bind_group(1, group, &[]);
            }
            if let Some(vertices) = draw.vertices {
                let Some(buffer) = self.buffers.get(&vertices.buffer) else {
                    continue;
                };
                pass.set_vertex_buffer(0, buffer.slice(..));
            }
            if let Some(instances) = draw.instances {
                let Some(buffer) = self.buffers.get(&instances.buffer) else {
                    continue;
                };
                pass.set_vertex_buffer(1, buffer.slice(..));
            }
            pass.draw(draw.vertex_range.clone(), 0..draw.instance_count());
        }
    }
}

impl GpuBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn create_buffer(&mut self, id: BufferId, desc: &BufferDesc, contents: Option<&[u8]>) {
        let mut usage = wgpu::BufferUsages::COPY_DST;
        if desc.usage.intersects(BufferUsage::VERTEX | BufferUsage::INSTANCE) {
            usage |= wgpu::BufferUsages::VERTEX;
        }
        if desc.usage.contains(BufferUsage::UNIFORM) {
            usage |= wgpu::BufferUsages::UNIFORM;
        }
        let size = align_to(desc.size.max(4), wgpu::COPY_BUFFER_ALIGNMENT);
        let buffer = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(desc.label),
            size,
            usage,
            mapped_at_creation: false,
        });
        if let Some(bytes) = contents {
            self.write_bytes(&buffer, 0, bytes);
        }
        self.buffers.insert(id, buffer);
    }

    fn write_buffer(&mut self, id: BufferId, offset: u64, bytes: &[u8]) {
        let Some(buffer) = self.buffers.get(&id) else {
            log::warn!("write to unknown buffer {id:?}");
            return;
        };
        if offset + bytes.len() as u64 > buffer.size() {
            log::warn!("write past end of buffer {id:?}");
            return;
        }
        self.write_bytes(buffer, offset, bytes);
    }

    fn create_texture(&mut self, id: TextureId, desc: &TextureDesc, layers: &[Vec<MipLevel>]) {
        let texture = GpuTexture::upload(&self.ctx, desc, layers);
        self.textures.insert(id, texture);
    }

    fn create_framebuffer(
        &mut self,
        id: FramebufferId,
        desc: &FramebufferDesc,
        color: &[TextureId],
    ) -> FramebufferStatus {
        let (framebuffer, attachments) = GpuFramebuffer::create(&self.ctx, desc, color);
        let status = framebuffer.status;
        self.textures.extend(attachments);
        self.framebuffers.insert(id, framebuffer);
        status
    }

    fn create_program(&mut self, id: ProgramId, desc: &ProgramDesc) -> Result<()> {
        let program = GpuProgram::compile(&self.ctx.device, desc)?;
        self.programs.insert(id, program);
        Ok(())
    }

    fn release(&mut self, resource: ResourceId) {
        match resource {
            ResourceId::Buffer(id) => {
                self.buffers.remove(&id);
                self.uniform_groups.retain(|(_, lights), _| *lights != Some(id));
            }
            ResourceId::Texture(id) => {
                self.textures.remove(&id);
                self.texture_groups.retain(|(_, set), _| !set.contains(&id));
            }
            ResourceId::Framebuffer(id) => {
                self.framebuffers.remove(&id);
            }
            ResourceId::Program(id) => {
                self.programs.remove(&id);
                self.pipelines.retain(|key, _| key.program != id);
                self.uniform_groups.retain(|(program, _), _| *program != id);
                self.texture_groups.retain(|(program, _), _| *program != id);
            }
        }
    }

    fn submit(&mut self, frame: &Frame) {
        if frame.is_empty() {
            return;
        }
        let offsets = self.upload_uniforms(frame);

        let mut prepared = Vec::new();
        let mut next_draw = 0;
        for (begin, draws) in frame.draws_by_pass() {
            let first = next_draw;
            next_draw += draws.len();
            let Some(attachments) = self.attachments(begin.target) else {
                continue;
            };
            let mut keyed = Vec::with_capacity(draws.len());
            for (i, draw) in draws.into_iter().enumerate() {
                let key = self.pipeline_key(draw, &attachments);
                if self.prepare_draw(draw, &key) {
                    keyed.push((draw, key, offsets[first + i]));
                }
            }
            prepared.push((begin, attachments, keyed));
        }

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(&frame.label),
            });
        for (begin, attachments, draws) in &prepared {
            self.record_pass(&mut encoder, begin, attachments, draws);
        }
        self.ctx.queue.submit(Some(encoder.finish()));
    }

    fn present(&mut self) {
        if let Some(frame) = self.surface_frame.take() {
            frame.texture.present();
        }
    }

    fn read_pixel(&mut self, framebuffer: FramebufferId, x: u32, y: u32) -> Option<[u8; 4]> {
        let fb = self.renderable(framebuffer)?;
        if x >= fb.width || y >= fb.height {
            return None;
        }
        let texture = self.textures.get(fb.color.first()?)?;
        if texture.format.bytes_per_pixel() != 4 {
            log::warn!("read_pixel only supports 8-bit color targets");
            return None;
        }

        let device = &self.ctx.device;
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pixel Readback"),
            size: u64::from(COPY_ROW_ALIGNMENT),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Pixel Readback"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(COPY_ROW_ALIGNMENT),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        self.ctx.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        if let Err(e) = device.poll(wgpu::PollType::wait_indefinitely()) {
            log::warn!("Pixel readback failed: {e}");
            return None;
        }
        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                log::warn!("Pixel readback failed: {e}");
                return None;
            }
            Err(_) => return None,
        }
        let pixel = {
            let data = slice.get_mapped_range();
            [data[0], data[1], data[2], data[3]]
        };
        staging.unmap();
        Some(pixel)
    }

    fn surface_size(&self) -> (u32, u32) {
        self.ctx.size()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.surface_frame = None;
        self.ctx.resize(width, height);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl WgpuBackend {
    /// Queue writes must be a multiple of four bytes; the tail is zero-padded.
    fn write_bytes(&self, buffer: &wgpu::Buffer, offset: u64, bytes: &[u8]) {
        if bytes.len() % 4 == 0 {
            self.ctx.queue.write_buffer(buffer, offset, bytes);
            return;
        }
        let mut padded = bytes.to_vec();
        padded.resize(align_to(bytes.len() as u64, 4) as usize, 0);
        if offset + padded.len() as u64 > buffer.size() {
            log::warn!("unaligned write of {} bytes does not fit its buffer", bytes.len());
            return;
        }
        self.ctx.queue.write_buffer(buffer, offset, &padded);
    }
}
