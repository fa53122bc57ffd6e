//! Recorded Frames
//!
//! A [`Frame`] is the ordered command stream one demo produces per frame.
//! Backends replay it in order; nothing is reordered or merged, so pass
//! ordering in the stream is exactly the order the GPU sees.

use std::ops::Range;

use smallvec::SmallVec;

use super::{BufferId, FramebufferId, ProgramId, TextureId, VertexLayout};
use crate::errors::{Result, TavernError};

/// Cubemap face, in graphics-API order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CubeFace {
    PositiveX = 0,
    NegativeX = 1,
    PositiveY = 2,
    NegativeY = 3,
    PositiveZ = 4,
    NegativeZ = 5,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        Self::PositiveX,
        Self::NegativeX,
        Self::PositiveY,
        Self::NegativeY,
        Self::PositiveZ,
        Self::NegativeZ,
    ];

    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(TavernError::CubeFaceOutOfRange(index))
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Where a pass draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// The window surface.
    Default,
    /// An offscreen framebuffer with 2D attachments.
    Offscreen(FramebufferId),
    /// One face of an offscreen cubemap framebuffer.
    CubeFace {
        framebuffer: FramebufferId,
        face: CubeFace,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub const fn sized(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    #[must_use]
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// What is cleared when a pass begins. `None` loads previous contents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearOp {
    pub color: Option<[f32; 4]>,
    pub depth: bool,
}

impl ClearOp {
    pub const BLACK: Self = Self {
        color: Some([0.0, 0.0, 0.0, 1.0]),
        depth: true,
    };
    pub const WHITE: Self = Self {
        color: Some([1.0, 1.0, 1.0, 1.0]),
        depth: true,
    };
    pub const LOAD: Self = Self {
        color: None,
        depth: false,
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassBegin {
    pub label: String,
    pub target: RenderTarget,
    pub viewport: Viewport,
    pub clear: ClearOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexSource {
    pub buffer: BufferId,
    pub layout: VertexLayout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceSource {
    pub buffer: BufferId,
    pub count: u32,
}

/// Uniform buffer bound to the light block binding point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightBinding {
    pub buffer: BufferId,
    pub binding: u32,
}

/// Fixed-function state of a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub wireframe: bool,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_write: true,
            wireframe: false,
        }
    }
}

/// One draw call with its full binding set.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: ProgramId,
    pub vertices: Option<VertexSource>,
    pub instances: Option<InstanceSource>,
    pub vertex_range: Range<u32>,
    /// Packed uniform block (std140-compatible).
    pub uniforms: Vec<u8>,
    pub textures: SmallVec<[TextureId; 4]>,
    pub lights: Option<LightBinding>,
    pub state: DrawState,
}

impl DrawCall {
    #[inline]
    #[must_use]
    pub fn instance_count(&self) -> u32 {
        self.instances.map_or(1, |i| i.count)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BeginPass(PassBegin),
    Draw(DrawCall),
    EndPass,
}

/// Ordered command stream for one frame.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub label: String,
    pub commands: Vec<Command>,
    open_pass: bool,
}

impl Frame {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            commands: Vec::with_capacity(32),
            open_pass: false,
        }
    }

    /// Starts a pass, closing the previous one if it was left open.
    pub fn begin_pass(&mut self, begin: PassBegin) {
        if self.open_pass {
            self.commands.push(Command::EndPass);
        }
        self.commands.push(Command::BeginPass(begin));
        self.open_pass = true;
    }

    pub fn draw(&mut self, draw: DrawCall) {
        debug_assert!(self.open_pass, "draw recorded outside of a pass");
        self.commands.push(Command::Draw(draw));
    }

    pub fn end_pass(&mut self) {
        if self.open_pass {
            self.commands.push(Command::EndPass);
            self.open_pass = false;
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// All pass headers, in order.
    pub fn passes(&self) -> impl Iterator<Item = &PassBegin> {
        self.commands.iter().filter_map(|c| match c {
            Command::BeginPass(p) => Some(p),
            _ => None,
        })
    }

    /// All draws, in order.
    pub fn draws(&self) -> impl Iterator<Item = &DrawCall> {
        self.commands.iter().filter_map(|c| match c {
            Command::Draw(d) => Some(d),
            _ => None,
        })
    }

    /// Pairs every draw with the pass it belongs to.
    #[must_use]
    pub fn draws_by_pass(&self) -> Vec<(&PassBegin, Vec<&DrawCall>)> {
        let mut out: Vec<(&PassBegin, Vec<&DrawCall>)> = Vec::new();
        for command in &self.commands {
            match command {
                Command::BeginPass(p) => out.push((p, Vec::new())),
                Command::Draw(d) => {
                    if let Some((_, draws)) = out.last_mut() {
                        draws.push(d);
                    }
                }
                Command::EndPass => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_face_index_round_trip() {
        for (i, face) in CubeFace::ALL.iter().enumerate() {
            assert_eq!(CubeFace::from_index(i).unwrap(), *face);
            assert_eq!(face.index(), i);
        }
        assert!(CubeFace::from_index(6).is_err());
    }

    #[test]
    fn begin_pass_closes_previous_pass() {
        let mut frame = Frame::new("test");
        let begin = PassBegin {
            label: "a".into(),
            target: RenderTarget::Default,
            viewport: Viewport::sized(4, 4),
            clear: ClearOp::BLACK,
        };
        frame.begin_pass(begin.clone());
        frame.begin_pass(begin);
        frame.end_pass();
        frame.end_pass();
        let ends = frame
            .commands
            .iter()
            .filter(|c| matches!(c, Command::EndPass))
            .count();
        assert_eq!(ends, 2);
        assert_eq!(frame.passes().count(), 2);
    }
}
