//! Frame Stage Definitions
//!
//! `FrameStage` defines the fixed stage ordering of one demo frame, and
//! [`FrameTracker`] enforces it while a pipeline executes.

use crate::errors::{Result, TavernError};

/// Frame stage enumeration.
///
/// Defines the execution order of a demo frame. Stages in brackets are
/// optional; a stage may never run after a later one within the same frame.
///
/// # Stage Overview
///
/// | Stage | Purpose | Typical Content |
/// |-------|---------|------------------|
/// | `BeginFrame` | Reset per-frame state, release dropped resources | Garbage collection |
/// | `CaptureEnvironment` | [Optional] six-face cubemap capture | Dynamic reflections |
/// | `RenderScene` | Scene geometry into an offscreen target or the default framebuffer | Tavern, skybox, instances |
/// | `BlurChain` | [Optional] separable Gaussian ping-pong | Bloom |
/// | `Composite` | Resolve offscreen color to the default framebuffer | Tone mapping, gamma, kernels |
/// | `Present` | The final image is complete in the default framebuffer | Submission |
/// | `DebugUi` | Overlay drawn on top of the presented image | egui parameter panels |
///
/// # Example
///
/// ```ignore
/// let mut tracker = FrameTracker::default();
/// tracker.enter(FrameStage::BeginFrame)?;
/// tracker.enter(FrameStage::RenderScene)?;
/// tracker.enter(FrameStage::Composite)?;
/// tracker.enter(FrameStage::Present)?;
/// ```
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
#[repr(u8)]
pub enum FrameStage {
    /// Frame start: resets tracking and drains the release queue.
    BeginFrame = 0,

    /// Environment capture stage.
    ///
    /// All six cube faces are rendered here, before any later stage samples
    /// the environment cubemap.
    CaptureEnvironment = 1,

    /// Scene rendering stage.
    RenderScene = 2,

    /// Ping-pong blur stage used by bloom.
    BlurChain = 3,

    /// Post-process composite stage (tone mapping, gamma, kernels).
    Composite = 4,

    /// Final image handed to the default framebuffer.
    Present = 5,

    /// Debug overlay (executed last).
    DebugUi = 6,
}

impl FrameStage {
    /// Returns the numeric index of the stage (used for ordering).
    #[inline]
    #[must_use]
    pub const fn order(self) -> u8 {
        self as u8
    }

    /// Stage name (for debugging).
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BeginFrame => "BeginFrame",
            Self::CaptureEnvironment => "CaptureEnvironment",
            Self::RenderScene => "RenderScene",
            Self::BlurChain => "BlurChain",
            Self::Composite => "Composite",
            Self::Present => "Present",
            Self::DebugUi => "DebugUi",
        }
    }

    /// Stages that may run several passes in a row.
    #[inline]
    #[must_use]
    pub const fn is_repeatable(self) -> bool {
        matches!(self, Self::RenderScene | Self::Composite)
    }
}

/// Tracks the stage a frame is in and rejects out-of-order transitions.
///
/// A frame always starts with [`FrameStage::BeginFrame`]. After that, stages
/// only move forward; repeatable stages may be entered several times in a row.
#[derive(Debug, Default, Clone)]
pub struct FrameTracker {
    current: Option<FrameStage>,
    visited: u8,
}

impl FrameTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The stage the frame is currently in, `None` before `BeginFrame`.
    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<FrameStage> {
        self.current
    }

    /// Returns `true` if `stage` was entered during this frame.
    #[inline]
    #[must_use]
    pub fn visited(&self, stage: FrameStage) -> bool {
        self.visited & (1 << stage.order()) != 0
    }

    /// Moves the frame into `next`.
    ///
    /// `BeginFrame` is always accepted and resets the tracker.
    pub fn enter(&mut self, next: FrameStage) -> Result<()> {
        if next == FrameStage::BeginFrame {
            self.current = Some(next);
            self.visited = 1 << next.order();
            return Ok(());
        }

        let allowed = match self.current {
            None => false,
            Some(current) if current == next => next.is_repeatable(),
            Some(current) => current < next,
        };

        // The overlay sits on top of a finished image.
        let allowed = allowed && (next != FrameStage::DebugUi || self.visited(FrameStage::Present));

        if !allowed {
            return Err(TavernError::StageOrder {
                from: self.current,
                to: next,
            });
        }

        self.current = Some(next);
        self.visited |= 1 << next.order();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert!(FrameStage::BeginFrame < FrameStage::CaptureEnvironment);
        assert!(FrameStage::CaptureEnvironment < FrameStage::RenderScene);
        assert!(FrameStage::RenderScene < FrameStage::BlurChain);
        assert!(FrameStage::BlurChain < FrameStage::Composite);
        assert!(FrameStage::Composite < FrameStage::Present);
        assert!(FrameStage::Present < FrameStage::DebugUi);
    }

    #[test]
    fn tracker_accepts_full_frame() {
        let mut tracker = FrameTracker::new();
        for stage in [
            FrameStage::BeginFrame,
            FrameStage::CaptureEnvironment,
            FrameStage::RenderScene,
            FrameStage::RenderScene,
            FrameStage::BlurChain,
            FrameStage::Composite,
            FrameStage::Present,
            FrameStage::DebugUi,
        ] {
            tracker.enter(stage).unwrap();
        }
        assert_eq!(tracker.current(), Some(FrameStage::DebugUi));
    }

    #[test]
    fn tracker_allows_skipping_optional_stages() {
        let mut tracker = FrameTracker::new();
        tracker.enter(FrameStage::BeginFrame).unwrap();
        tracker.enter(FrameStage::RenderScene).unwrap();
        tracker.enter(FrameStage::Present).unwrap();
        assert!(!tracker.visited(FrameStage::BlurChain));
    }

    #[test]
    fn tracker_rejects_backwards_transition() {
        let mut tracker = FrameTracker::new();
        tracker.enter(FrameStage::BeginFrame).unwrap();
        tracker.enter(FrameStage::RenderScene).unwrap();
        let err = tracker.enter(FrameStage::CaptureEnvironment).unwrap_err();
        assert!(matches!(err, TavernError::StageOrder { .. }));
    }

    #[test]
    fn tracker_requires_begin_frame() {
        let mut tracker = FrameTracker::new();
        assert!(tracker.enter(FrameStage::RenderScene).is_err());
    }

    #[test]
    fn tracker_rejects_repeated_capture() {
        let mut tracker = FrameTracker::new();
        tracker.enter(FrameStage::BeginFrame).unwrap();
        tracker.enter(FrameStage::CaptureEnvironment).unwrap();
        assert!(tracker.enter(FrameStage::CaptureEnvironment).is_err());
    }

    #[test]
    fn overlay_needs_presented_image() {
        let mut tracker = FrameTracker::new();
        tracker.enter(FrameStage::BeginFrame).unwrap();
        tracker.enter(FrameStage::RenderScene).unwrap();
        assert!(tracker.enter(FrameStage::DebugUi).is_err());
    }

    #[test]
    fn begin_frame_resets_tracking() {
        let mut tracker = FrameTracker::new();
        tracker.enter(FrameStage::BeginFrame).unwrap();
        tracker.enter(FrameStage::Present).unwrap();
        tracker.enter(FrameStage::BeginFrame).unwrap();
        assert!(!tracker.visited(FrameStage::Present));
        tracker.enter(FrameStage::RenderScene).unwrap();
    }
}
