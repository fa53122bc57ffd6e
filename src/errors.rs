//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`TavernError`] covers every failure that can surface
//! during construction and setup:
//! - GPU initialization failures
//! - Shader compilation failures (fatal, there is no fallback program)
//! - Asset loading and decoding errors (recoverable, callers may substitute)
//! - Misuse of the frame pipeline (out-of-order stages, bad indices)
//!
//! Framebuffer incompleteness is deliberately *not* an error: it is reported
//! through [`FramebufferStatus`](crate::renderer::backend::FramebufferStatus)
//! and rendering of that target degrades instead of aborting.
//!
//! The steady-state per-frame loop assumes every resource is valid and does
//! not return errors per draw.

use thiserror::Error;

use crate::renderer::graph::FrameStage;

/// The main error type for the tavern demos.
#[derive(Error, Debug)]
pub enum TavernError {
    // ========================================================================
    // GPU & Rendering Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// Window system error.
    #[error("Window system error: {0}")]
    WindowError(#[from] raw_window_handle::HandleError),

    /// The OS refused to create the window.
    #[error("Failed to create window: {0}")]
    WindowCreation(#[from] winit::error::OsError),

    /// Event loop error (winit).
    #[error("Event loop error: {0}")]
    EventLoopError(#[from] winit::error::EventLoopError),

    /// A shader program failed to compile or link.
    #[error("Shader program '{label}' failed to compile: {message}")]
    ShaderCompilation {
        /// Program label
        label: String,
        /// Compiler diagnostics
        message: String,
    },

    /// A resource id was not known to the backend.
    #[error("Unknown GPU resource: {0}")]
    UnknownResource(String),

    // ========================================================================
    // Pipeline Errors
    // ========================================================================
    /// A pass was scheduled in a frame stage that may not follow the current one.
    #[error("Frame stage {to:?} cannot follow {from:?}")]
    StageOrder {
        /// Stage the frame was in
        from: Option<FrameStage>,
        /// Stage that was requested
        to: FrameStage,
    },

    /// Cubemap face index outside `0..6`.
    #[error("Cube face index out of range: {0} (expected 0..6)")]
    CubeFaceOutOfRange(usize),

    // ========================================================================
    // Scene Errors
    // ========================================================================
    /// Light index outside the scene's fixed light count.
    #[error("Light index {index} out of range (scene has {count} lights)")]
    LightIndexOutOfRange {
        /// The requested index
        index: usize,
        /// Number of lights in the scene
        count: usize,
    },

    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// The requested asset was not found.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// The asset exists but could not be parsed.
    #[error("Failed to parse asset '{path}': {message}")]
    AssetParse {
        /// Asset path
        path: String,
        /// Parser diagnostics
        message: String,
    },

    /// Image decoding error.
    #[error("Image decode error: {0}")]
    ImageDecodeError(String),

    /// Cube map validation error.
    #[error("Cube map error: {0}")]
    CubeMapError(String),

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<image::ImageError> for TavernError {
    fn from(err: image::ImageError) -> Self {
        TavernError::ImageDecodeError(err.to_string())
    }
}

impl TavernError {
    /// Returns `true` for asset failures that a caller may recover from by
    /// substituting a fallback resource.
    #[must_use]
    pub fn is_asset_error(&self) -> bool {
        matches!(
            self,
            Self::AssetNotFound(_)
                | Self::AssetParse { .. }
                | Self::ImageDecodeError(_)
                | Self::CubeMapError(_)
        )
    }
}

/// Alias for `Result<T, TavernError>`.
pub type Result<T> = std::result::Result<T, TavernError>;
