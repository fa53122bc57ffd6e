//! GPU-side storage of buffers, textures and framebuffers.

use smallvec::SmallVec;

use super::context::WgpuContext;
use crate::renderer::backend::{
    FramebufferDesc, FramebufferStatus, MipLevel, TextureDesc, TextureFormat, TextureId, TextureKind,
    check_framebuffer,
};

pub(super) fn wgpu_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        TextureFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
    }
}

pub(super) struct GpuTexture {
    pub texture: wgpu::Texture,
    /// Sampling view: `D2` or `Cube` according to the texture kind.
    pub view: wgpu::TextureView,
    pub format: TextureFormat,
}

impl GpuTexture {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        format: TextureFormat,
        kind: TextureKind,
        mip_level_count: u32,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: kind.layer_count(),
            },
            mip_level_count: mip_level_count.max(1),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu_format(format),
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(match kind {
                TextureKind::D2 => wgpu::TextureViewDimension::D2,
                TextureKind::Cube => wgpu::TextureViewDimension::Cube,
            }),
            ..Default::default()
        });
        Self { texture, view, format }
    }

    /// Creates a sampled texture and uploads `layers[layer][mip]`.
    pub fn upload(ctx: &WgpuContext, desc: &TextureDesc, layers: &[Vec<MipLevel>]) -> Self {
        let gpu = Self::new(
            &ctx.device,
            desc.label,
            desc.width,
            desc.height,
            desc.format,
            desc.kind,
            desc.mip_level_count,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );

        for (layer, mips) in layers.iter().enumerate() {
            for (mip, level) in mips.iter().enumerate() {
                if level.bytes.is_empty() {
                    continue;
                }
                ctx.queue.write_texture(
                    wgpu::TexelCopyTextureInfo {
                        texture: &gpu.texture,
                        mip_level: mip as u32,
                        origin: wgpu::Origin3d {
                            x: 0,
                            y: 0,
                            z: layer as u32,
                        },
                        aspect: wgpu::TextureAspect::All,
                    },
                    &level.bytes,
                    wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(level.width * desc.format.bytes_per_pixel()),
                        rows_per_image: Some(level.height),
                    },
                    wgpu::Extent3d {
                        width: level.width,
                        height: level.height,
                        depth_or_array_layers: 1,
                    },
                );
            }
        }
        gpu
    }

    /// A 2D view of one array layer, for rendering into a cubemap face.
    pub fn layer_view(&self, layer: u32) -> wgpu::TextureView {
        self.texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Cube Face View"),
            dimension: Some(wgpu::TextureViewDimension::D2),
            base_array_layer: layer,
            array_layer_count: Some(1),
            ..Default::default()
        })
    }
}

pub(super) struct GpuFramebuffer {
    pub color: SmallVec<[TextureId; 2]>,
    pub formats: SmallVec<[wgpu::TextureFormat; 2]>,
    pub depth: Option<wgpu::TextureView>,
    pub kind: TextureKind,
    pub width: u32,
    pub height: u32,
    pub status: FramebufferStatus,
}

impl GpuFramebuffer {
    /// Checks `desc` against the device limits and allocates the attachments.
    ///
    /// An incomplete framebuffer still gets 1x1 stand-in textures so that
    /// later samplers bind something; passes targeting it are skipped.
    pub fn create(
        ctx: &WgpuContext,
        desc: &FramebufferDesc,
        color: &[TextureId],
    ) -> (Self, Vec<(TextureId, GpuTexture)>) {
        let limits = ctx.device.limits();
        let status = check_framebuffer(desc, limits.max_texture_dimension_2d, limits.max_color_attachments);
        let complete = status.is_complete();

        let (width, height) = if complete { (desc.width, desc.height) } else { (1, 1) };
        let usage = wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC;

        let attachments = color
            .iter()
            .zip(&desc.color_formats)
            .enumerate()
            .map(|(i, (&id, &format))| {
                let format = if format.is_color() { format } else { TextureFormat::Rgba8Unorm };
                let label = format!("{} color {i}", desc.label);
                (id, GpuTexture::new(&ctx.device, &label, width, height, format, desc.kind, 1, usage))
            })
            .collect::<Vec<_>>();

        let depth = (complete && desc.depth).then(|| {
            WgpuContext::create_depth_texture(&ctx.device, width, height, &format!("{} depth", desc.label))
        });

        let framebuffer = Self {
            color: color.iter().copied().collect(),
            formats: attachments.iter().map(|(_, t)| wgpu_format(t.format)).collect(),
            depth,
            kind: desc.kind,
            width,
            height,
            status,
        };
        (framebuffer, attachments)
    }
}
