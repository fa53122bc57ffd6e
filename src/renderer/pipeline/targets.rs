//! Offscreen Render Targets
//!
//! A demo declares the offscreen targets its passes use, each under a
//! [`TargetName`]. [`RenderTargets::prepare`] creates them on first use and
//! recreates window-sized ones when the window size changes; every
//! (re)creation checks completeness once and logs the result.

use smallvec::{SmallVec, smallvec};

use crate::errors::{Result, TavernError};
use crate::renderer::Device;
use crate::renderer::Framebuffer;
use crate::renderer::backend::{FramebufferDesc, FramebufferId, TextureFormat, TextureId, TextureKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetName {
    /// HDR scene color (+ bloom attachment when declared with two).
    Scene,
    /// First blur ping-pong target.
    PingPong0,
    /// Second blur ping-pong target.
    PingPong1,
    /// Environment cubemap written by the capture pass.
    Environment,
    /// Object-id buffer for picking.
    Picking,
}

impl TargetName {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Scene => "Scene HDR",
            Self::PingPong0 => "Ping-Pong 0",
            Self::PingPong1 => "Ping-Pong 1",
            Self::Environment => "Environment Cube",
            Self::Picking => "Picking",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSize {
    /// Follows the window.
    Window,
    Fixed(u32, u32),
}

impl TargetSize {
    #[must_use]
    pub fn resolve(self, window: (u32, u32)) -> (u32, u32) {
        match self {
            Self::Window => window,
            Self::Fixed(w, h) => (w, h),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub size: TargetSize,
    pub color: SmallVec<[TextureFormat; 2]>,
    pub depth: bool,
    pub kind: TextureKind,
}

impl TargetSpec {
    /// Window-sized HDR target with `attachments` color attachments and depth.
    #[must_use]
    pub fn hdr(attachments: usize) -> Self {
        Self {
            size: TargetSize::Window,
            color: smallvec![TextureFormat::Rgba16Float; attachments],
            depth: true,
            kind: TextureKind::D2,
        }
    }

    /// Window-sized single HDR attachment without depth.
    #[must_use]
    pub fn ping_pong() -> Self {
        Self {
            size: TargetSize::Window,
            color: smallvec![TextureFormat::Rgba16Float],
            depth: false,
            kind: TextureKind::D2,
        }
    }

    /// `size`² cubemap with depth, rendered one face at a time.
    #[must_use]
    pub fn cubemap(size: u32) -> Self {
        Self {
            size: TargetSize::Fixed(size, size),
            color: smallvec![TextureFormat::Rgba16Float],
            depth: true,
            kind: TextureKind::Cube,
        }
    }

    /// Window-sized 8-bit target for exact id readback.
    #[must_use]
    pub fn picking() -> Self {
        Self {
            size: TargetSize::Window,
            color: smallvec![TextureFormat::Rgba8Unorm],
            depth: true,
            kind: TextureKind::D2,
        }
    }
}

struct TargetSlot {
    name: TargetName,
    spec: TargetSpec,
    framebuffer: Option<Framebuffer>,
}

#[derive(Default)]
pub struct RenderTargets {
    slots: Vec<TargetSlot>,
}

impl RenderTargets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares (or redeclares) a target. Nothing is allocated until
    /// [`prepare`](Self::prepare).
    pub fn declare(&mut self, name: TargetName, spec: TargetSpec) -> &mut Self {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.name == name) {
            if slot.spec != spec {
                slot.spec = spec;
                slot.framebuffer = None;
            }
        } else {
            self.slots.push(TargetSlot {
                name,
                spec,
                framebuffer: None,
            });
        }
        self
    }

    /// Creates missing targets and resizes window-sized ones. Returns how
    /// many framebuffers were (re)created.
    pub fn prepare(&mut self, device: &mut Device, window: (u32, u32)) -> usize {
        let mut created = 0;
        for slot in &mut self.slots {
            let (width, height) = slot.spec.size.resolve(window);
            let stale = slot
                .framebuffer
                .as_ref()
                .is_none_or(|fb| fb.width != width || fb.height != height);
            if !stale {
                continue;
            }
            // Drop the old one first so its ids go back through the release queue.
            slot.framebuffer = None;
            slot.framebuffer = Some(device.create_framebuffer(&FramebufferDesc {
                label: slot.name.label(),
                width,
                height,
                color_formats: slot.spec.color.clone(),
                depth: slot.spec.depth,
                kind: slot.spec.kind,
            }));
            created += 1;
        }
        created
    }

    fn slot(&self, name: TargetName) -> Result<&Framebuffer> {
        self.slots
            .iter()
            .find(|s| s.name == name)
            .and_then(|s| s.framebuffer.as_ref())
            .ok_or_else(|| TavernError::UnknownResource(format!("target {name:?} not prepared")))
    }

    pub fn framebuffer(&self, name: TargetName) -> Result<&Framebuffer> {
        self.slot(name)
    }

    pub fn id(&self, name: TargetName) -> Result<FramebufferId> {
        Ok(self.slot(name)?.id())
    }

    /// Texture of color attachment `index` of `name`.
    pub fn color(&self, name: TargetName, index: usize) -> Result<TextureId> {
        self.slot(name)?.color(index).ok_or_else(|| {
            TavernError::UnknownResource(format!("target {name:?} has no attachment {index}"))
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::backend::HeadlessBackend;

    #[test]
    fn window_targets_follow_resize_and_fixed_do_not() {
        let mut device = Device::new(HeadlessBackend::default());
        let mut targets = RenderTargets::new();
        targets
            .declare(TargetName::Scene, TargetSpec::hdr(2))
            .declare(TargetName::Environment, TargetSpec::cubemap(128));

        assert_eq!(targets.prepare(&mut device, (800, 600)), 2);
        assert_eq!(targets.prepare(&mut device, (800, 600)), 0);

        let old = targets.id(TargetName::Scene).unwrap();
        assert_eq!(targets.prepare(&mut device, (1024, 768)), 1);
        assert_ne!(targets.id(TargetName::Scene).unwrap(), old);
        assert_eq!(targets.framebuffer(TargetName::Environment).unwrap().width, 128);

        // Old framebuffer + two attachments.
        assert_eq!(device.collect_garbage(), 3);
    }

    #[test]
    fn unprepared_target_is_unknown() {
        let targets = RenderTargets::new();
        assert!(matches!(
            targets.color(TargetName::Scene, 0),
            Err(TavernError::UnknownResource(_))
        ));
    }
}
