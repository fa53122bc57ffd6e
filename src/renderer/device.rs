//! Device Front End
//!
//! [`Device`] owns the active [`GpuBackend`], allocates resource ids and
//! hands out [`OwnedHandle`]s. It is the only way the rest of the crate talks
//! to the GPU.

use std::rc::Rc;

use smallvec::SmallVec;

use super::backend::{
    BufferDesc, BufferId, FramebufferDesc, FramebufferId, FramebufferStatus, GpuBackend,
    MipLevel, ProgramDesc, ProgramId, TextureDesc, TextureId,
};
use super::backend::frame::Frame;
use super::handles::{
    BufferHandle, FramebufferHandle, OwnedHandle, ProgramHandle, ReleaseQueue, TextureHandle,
};
use crate::errors::Result;

/// An offscreen render target together with its color attachments.
///
/// Dropping it releases the framebuffer and every attachment.
#[derive(Debug)]
pub struct Framebuffer {
    handle: FramebufferHandle,
    attachments: SmallVec<[TextureHandle; 2]>,
    pub width: u32,
    pub height: u32,
    pub status: FramebufferStatus,
}

impl Framebuffer {
    #[inline]
    #[must_use]
    pub fn id(&self) -> FramebufferId {
        self.handle.id()
    }

    /// Texture of color attachment `index`.
    #[must_use]
    pub fn color(&self, index: usize) -> Option<TextureId> {
        self.attachments.get(index).map(OwnedHandle::id)
    }

    #[must_use]
    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }
}

pub struct Device {
    backend: Box<dyn GpuBackend>,
    releases: Rc<ReleaseQueue>,
    next_id: u32,
}

impl Device {
    pub fn new(backend: impl GpuBackend) -> Self {
        log::info!("Device created with {} backend", backend.name());
        Self {
            backend: Box::new(backend),
            releases: Rc::new(ReleaseQueue::default()),
            next_id: 1,
        }
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Downcasts the backend, for backend-specific work (overlay drawing) and tests.
    #[must_use]
    pub fn backend<B: GpuBackend>(&self) -> Option<&B> {
        self.backend.as_any().downcast_ref::<B>()
    }

    #[must_use]
    pub fn backend_mut<B: GpuBackend>(&mut self) -> Option<&mut B> {
        self.backend.as_any_mut().downcast_mut::<B>()
    }

    #[inline]
    #[must_use]
    pub fn surface_size(&self) -> (u32, u32) {
        self.backend.surface_size()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.backend.resize(width, height);
    }

    // ========================================================================
    // Resource creation
    // ========================================================================

    pub fn create_buffer(&mut self, desc: &BufferDesc, contents: Option<&[u8]>) -> BufferHandle {
        let id = BufferId(self.allocate());
        self.backend.create_buffer(id, desc, contents);
        log::debug!("Created buffer '{}' ({} bytes) as {id:?}", desc.label, desc.size);
        OwnedHandle::new(id, self.releases.clone())
    }

    /// Writes `bytes` at `offset`. Only the given range is touched.
    pub fn write_buffer(&mut self, buffer: BufferId, offset: u64, bytes: &[u8]) {
        self.backend.write_buffer(buffer, offset, bytes);
    }

    pub fn create_texture(&mut self, desc: &TextureDesc, layers: &[Vec<MipLevel>]) -> TextureHandle {
        let id = TextureId(self.allocate());
        self.backend.create_texture(id, desc, layers);
        log::debug!(
            "Created texture '{}' {}x{} ({} mips) as {id:?}",
            desc.label,
            desc.width,
            desc.height,
            desc.mip_level_count
        );
        OwnedHandle::new(id, self.releases.clone())
    }

    /// Creates an offscreen target and checks it once for completeness.
    ///
    /// An incomplete target is reported and still returned: sampling it
    /// yields undefined content but nothing aborts.
    pub fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Framebuffer {
        let id = FramebufferId(self.allocate());
        let color_ids: SmallVec<[TextureId; 2]> = desc
            .color_formats
            .iter()
            .map(|_| TextureId(self.allocate()))
            .collect();

        let status = self.backend.create_framebuffer(id, desc, &color_ids);
        match status {
            FramebufferStatus::Complete => {
                log::debug!("Framebuffer '{}' {}x{} complete", desc.label, desc.width, desc.height);
            }
            FramebufferStatus::Incomplete(reason) => {
                log::warn!(
                    "Framebuffer '{}' {}x{} is incomplete ({reason:?}); its output is undefined",
                    desc.label,
                    desc.width,
                    desc.height
                );
            }
        }

        Framebuffer {
            handle: OwnedHandle::new(id, self.releases.clone()),
            attachments: color_ids
                .into_iter()
                .map(|t| OwnedHandle::new(t, self.releases.clone()))
                .collect(),
            width: desc.width,
            height: desc.height,
            status,
        }
    }

    /// Compiles a program. Failure is fatal for the caller's construction.
    pub fn create_program(&mut self, desc: &ProgramDesc) -> Result<ProgramHandle> {
        let id = ProgramId(self.allocate());
        if let Err(e) = self.backend.create_program(id, desc) {
            log::error!("{e}");
            return Err(e);
        }
        log::debug!("Created program '{}' as {id:?}", desc.label);
        Ok(OwnedHandle::new(id, self.releases.clone()))
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Start of a frame: releases everything dropped since the last frame.
    pub fn begin_frame(&mut self) {
        self.collect_garbage();
    }

    pub fn submit(&mut self, frame: &Frame) {
        self.backend.submit(frame);
    }

    pub fn present(&mut self) {
        self.backend.present();
    }

    #[must_use]
    pub fn read_pixel(&mut self, framebuffer: FramebufferId, x: u32, y: u32) -> Option<[u8; 4]> {
        self.backend.read_pixel(framebuffer, x, y)
    }

    /// Releases every resource whose owner has been dropped. Returns how many.
    pub fn collect_garbage(&mut self) -> usize {
        let pending = self.releases.drain();
        let count = pending.len();
        for resource in pending {
            self.backend.release(resource);
        }
        if count > 0 {
            log::debug!("Released {count} GPU resources");
        }
        count
    }

    /// Number of dropped resources not yet released.
    #[must_use]
    pub fn pending_releases(&self) -> usize {
        self.releases.len()
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        self.collect_garbage();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::backend::{
        BufferUsage, HeadlessBackend, IncompleteReason, TextureFormat, TextureKind,
    };
    use smallvec::smallvec;

    fn device() -> Device {
        Device::new(HeadlessBackend::default())
    }

    #[test]
    fn dropped_handles_are_released_on_begin_frame() {
        let mut device = device();
        let buffer = device.create_buffer(
            &BufferDesc {
                label: "b",
                usage: BufferUsage::UNIFORM,
                size: 16,
            },
            None,
        );
        let id = buffer.id();
        drop(buffer);
        assert_eq!(device.pending_releases(), 1);

        device.begin_frame();
        let backend = device.backend::<HeadlessBackend>().unwrap();
        assert!(backend.is_released(id));
        assert_eq!(backend.stats().releases, 1);
    }

    #[test]
    fn incomplete_framebuffer_is_returned_not_fatal() {
        let mut device = device();
        let fb = device.create_framebuffer(&FramebufferDesc {
            label: "broken",
            width: 0,
            height: 600,
            color_formats: smallvec![TextureFormat::Rgba16Float],
            depth: true,
            kind: TextureKind::D2,
        });
        assert_eq!(
            fb.status,
            FramebufferStatus::Incomplete(IncompleteReason::ZeroSize)
        );
        assert!(fb.color(0).is_some());
    }

    #[test]
    fn framebuffer_drop_releases_attachments() {
        let mut device = device();
        let fb = device.create_framebuffer(&FramebufferDesc {
            label: "hdr",
            width: 64,
            height: 64,
            color_formats: smallvec![TextureFormat::Rgba16Float, TextureFormat::Rgba16Float],
            depth: true,
            kind: TextureKind::D2,
        });
        assert!(fb.status.is_complete());
        drop(fb);
        assert_eq!(device.collect_garbage(), 3);
        assert_eq!(device.backend::<HeadlessBackend>().unwrap().live_resources(), 0);
    }
}
