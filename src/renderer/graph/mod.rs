//! Frame stage ordering.
//!
//! [`FrameStage`] names the fixed phases of a demo frame; [`FrameTracker`]
//! rejects any attempt to run them out of order.

pub mod stage;

pub use stage::{FrameStage, FrameTracker};
