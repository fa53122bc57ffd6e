//! Utility Module
//!
//! - [`FpsCounter`]: frame rate measurement shown in the UI header

pub mod fps_counter;

pub use fps_counter::FpsCounter;
