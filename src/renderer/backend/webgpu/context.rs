//! wgpu Context
//!
//! The [`WgpuContext`] holds core GPU handles: device, queue, surface, and config.
//! It is responsible for window surface management and resize handling.

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::errors::{Result, TavernError};
use crate::renderer::settings::{DEPTH_FORMAT, RenderSettings};

/// Core wgpu context holding GPU handles.
///
/// It also manages the depth buffer of the window surface, which is
/// recreated on resize.
pub struct WgpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,

    /// Format the surface is rendered through. Always the non-sRGB variant:
    /// the composite pass applies gamma itself.
    pub view_format: wgpu::TextureFormat,

    /// Depth buffer texture view (recreated on resize)
    pub depth_texture_view: wgpu::TextureView,

    /// `false` when the adapter cannot rasterize lines; wireframe is then ignored.
    pub supports_wireframe: bool,
}

impl WgpuContext {
    pub async fn new<W>(window: W, settings: &RenderSettings, width: u32, height: u32) -> Result<Self>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(|e| TavernError::AdapterRequestFailed(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: settings.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| TavernError::AdapterRequestFailed(e.to_string()))?;

        let info = adapter.get_info();
        log::info!("Using adapter '{}' ({:?})", info.name, info.backend);

        let supports_wireframe = adapter.features().contains(wgpu::Features::POLYGON_MODE_LINE);
        if !supports_wireframe {
            log::warn!("Adapter lacks POLYGON_MODE_LINE; wireframe rendering is disabled");
        }
        let required_features = if supports_wireframe {
            wgpu::Features::POLYGON_MODE_LINE
        } else {
            wgpu::Features::empty()
        };

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features,
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await?;

        let mut config = surface
            .get_default_config(&adapter, width.max(1), height.max(1))
            .ok_or_else(|| {
                TavernError::AdapterRequestFailed("Surface not supported by adapter".to_string())
            })?;

        let view_format = config.format.remove_srgb_suffix();
        if view_format != config.format {
            config.view_formats.push(view_format);
        }
        config.present_mode = if settings.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        surface.configure(&device, &config);

        let depth_texture_view = Self::create_depth_texture(&device, config.width, config.height, "Depth Texture");

        Ok(Self {
            device,
            queue,
            surface,
            config,
            view_format,
            depth_texture_view,
            supports_wireframe,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture_view =
                Self::create_depth_texture(&self.device, width, height, "Depth Texture");
        }
    }

    /// Reapplies the current configuration after the surface was lost.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        label: &str,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Returns the current surface dimensions.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}
