//! Shader programs and the render pipeline cache.
//!
//! A program owns its shader module and bind group layouts. Render
//! pipelines additionally depend on the pass (attachment formats, depth)
//! and the draw (fixed-function state, vertex layout), so they are built
//! lazily on first use and cached by [`PipelineKey`].

use std::borrow::Cow;

use smallvec::SmallVec;

use crate::errors::{Result, TavernError};
use crate::renderer::backend::{
    DrawState, ProgramDesc, ProgramId, TextureSlot, VertexInput, VertexLayout,
};
use crate::renderer::settings::DEPTH_FORMAT;
use crate::scene::{LIGHT_SIZE, MAX_LIGHTS};

/// Shader location of the first instance-matrix column.
const INSTANCE_LOCATION: u32 = 4;
const INSTANCE_STRIDE: u64 = 64;

pub(super) struct GpuProgram {
    pub desc: ProgramDesc,
    pub module: wgpu::ShaderModule,
    pub layout: wgpu::PipelineLayout,
    pub uniform_layout: wgpu::BindGroupLayout,
    pub texture_layout: Option<wgpu::BindGroupLayout>,
}

impl GpuProgram {
    pub fn compile(device: &wgpu::Device, desc: &ProgramDesc) -> Result<Self> {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(desc.source)),
        });

        let info = pollster::block_on(module.get_compilation_info());
        let errors: Vec<String> = info
            .messages
            .iter()
            .filter(|m| m.message_type == wgpu::CompilationMessageType::Error)
            .map(|m| match m.location {
                Some(loc) => format!("{}:{}: {}", loc.line_number, loc.line_position, m.message),
                None => m.message.clone(),
            })
            .collect();
        if !errors.is_empty() {
            return Err(TavernError::ShaderCompilation {
                label: desc.label.to_string(),
                message: errors.join("\n"),
            });
        }

        let mut uniform_entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: wgpu::BufferSize::new(u64::from(desc.uniform_size)),
            },
            count: None,
        }];
        if desc.uses_lights {
            uniform_entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new((MAX_LIGHTS * LIGHT_SIZE) as u64),
                },
                count: None,
            });
        }
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(desc.label),
            entries: &uniform_entries,
        });

        let texture_layout = (!desc.textures.is_empty()).then(|| {
            let mut entries: Vec<wgpu::BindGroupLayoutEntry> = desc
                .textures
                .iter()
                .enumerate()
                .map(|(i, slot)| wgpu::BindGroupLayoutEntry {
                    binding: i as u32,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: match slot {
                            TextureSlot::D2 => wgpu::TextureViewDimension::D2,
                            TextureSlot::Cube => wgpu::TextureViewDimension::Cube,
                        },
                        multisampled: false,
                    },
                    count: None,
                })
                .collect();
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: desc.textures.len() as u32,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(desc.label),
                entries: &entries,
            })
        });

        let layout = match &texture_layout {
            Some(textures) => device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(desc.label),
                bind_group_layouts: &[Some(&uniform_layout), Some(textures)],
                immediate_size: 0,
            }),
            None => device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(desc.label),
                bind_group_layouts: &[Some(&uniform_layout)],
                immediate_size: 0,
            }),
        };

        Ok(Self {
            desc: desc.clone(),
            module,
            layout,
            uniform_layout,
            texture_layout,
        })
    }
}

/// Everything a render pipeline depends on besides the program itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct PipelineKey {
    pub program: ProgramId,
    pub colors: SmallVec<[wgpu::TextureFormat; 2]>,
    pub depth: bool,
    pub state: DrawState,
    pub vertex_layout: Option<VertexLayout>,
}

fn mesh_attributes(layout: &VertexLayout, input: VertexInput) -> Vec<wgpu::VertexAttribute> {
    let mut attributes = vec![wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: u64::from(layout.position_offset),
        shader_location: 0,
    }];
    if input == VertexInput::Position {
        return attributes;
    }
    // Attributes a mesh lacks are zero-filled at their regular offsets.
    attributes.extend([
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: u64::from(layout.uv_offset),
            shader_location: 1,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: u64::from(layout.normal_offset),
            shader_location: 2,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: u64::from(layout.tangent_offset),
            shader_location: 3,
        },
    ]);
    attributes
}

pub(super) fn create_render_pipeline(
    device: &wgpu::Device,
    program: &GpuProgram,
    key: &PipelineKey,
    supports_wireframe: bool,
) -> wgpu::RenderPipeline {
    let desc = &program.desc;

    let vertex_attributes = match (desc.vertex, key.vertex_layout) {
        (VertexInput::FullscreenTriangle, _) | (_, None) => Vec::new(),
        (input, Some(layout)) => mesh_attributes(&layout, input),
    };
    let instance_attributes: Vec<wgpu::VertexAttribute> = (0..4)
        .map(|column| wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x4,
            offset: u64::from(column) * 16,
            shader_location: INSTANCE_LOCATION + column,
        })
        .collect();

    let mut buffers = Vec::with_capacity(2);
    if let (false, Some(layout)) = (vertex_attributes.is_empty(), key.vertex_layout) {
        buffers.push(wgpu::VertexBufferLayout {
            array_stride: u64::from(layout.stride),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &vertex_attributes,
        });
    }
    if desc.vertex == VertexInput::MeshInstanced {
        buffers.push(wgpu::VertexBufferLayout {
            array_stride: INSTANCE_STRIDE,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &instance_attributes,
        });
    }

    // Attachments the shader does not write are masked; outputs without an
    // attachment are dropped.
    let outputs = usize::from(desc.color_outputs);
    let target_count = outputs.max(key.colors.len());
    let targets: Vec<Option<wgpu::ColorTargetState>> = (0..target_count)
        .map(|i| {
            key.colors.get(i).map(|&format| wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: if i < outputs {
                    wgpu::ColorWrites::ALL
                } else {
                    wgpu::ColorWrites::empty()
                },
            })
        })
        .collect();

    let polygon_mode = if key.state.wireframe && supports_wireframe {
        wgpu::PolygonMode::Line
    } else {
        wgpu::PolygonMode::Fill
    };

    log::debug!("Creating pipeline for '{}' ({:?})", desc.label, key.colors);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(&program.layout),
        vertex: wgpu::VertexState {
            module: &program.module,
            entry_point: Some("vs_main"),
            buffers: &buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &program.module,
            entry_point: Some("fs_main"),
            targets: &targets,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode,
            ..Default::default()
        },
        depth_stencil: key.depth.then(|| wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: Some(key.state.depth_write),
            depth_compare: Some(if key.state.depth_test {
                wgpu::CompareFunction::LessEqual
            } else {
                wgpu::CompareFunction::Always
            }),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
