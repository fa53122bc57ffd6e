//! Application Layer
//!
//! - [`input`]: platform-agnostic input state and the per-frame [`FrameInput`](input::FrameInput)
//! - [`winit`]: window, event loop and egui overlay on top of [`Engine`](crate::engine::Engine)
//! - [`AppSettings`]: startup configuration of the interactive app

pub mod input;
pub mod winit;

use std::path::PathBuf;

pub use self::winit::App;

use crate::demos::DemoKind;
use crate::renderer::RenderSettings;

/// Startup configuration: window, asset location and the first demo.
///
/// ```rust,ignore
/// let settings = AppSettings {
///     initial_demo: DemoKind::Bloom,
///     ..AppSettings::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub title: String,
    /// Logical window size.
    pub width: u32,
    pub height: u32,
    /// Directory the `media/...` asset paths are resolved against.
    pub asset_root: PathBuf,
    pub initial_demo: DemoKind,
    pub render: RenderSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            title: "Tavern".into(),
            width: 1280,
            height: 720,
            asset_root: PathBuf::from("."),
            initial_demo: DemoKind::default(),
            render: RenderSettings::default(),
        }
    }
}

impl AppSettings {
    /// Reads `[demo] [asset-root]` positional arguments. An unknown demo
    /// name is logged and the default demo is kept.
    #[must_use]
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Self {
        let mut settings = Self::default();
        let mut args = args.into_iter();
        if let Some(name) = args.next() {
            match DemoKind::from_name(&name) {
                Some(kind) => settings.initial_demo = kind,
                None => {
                    let known: Vec<_> = DemoKind::ALL.iter().map(|k| k.name()).collect();
                    log::warn!("Unknown demo '{name}', expected one of {known:?}");
                }
            }
        }
        if let Some(root) = args.next() {
            settings.asset_root = PathBuf::from(root);
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_arguments_pick_demo_and_root() {
        let settings = AppSettings::from_args(["skybox".to_string(), "/data".to_string()]);
        assert_eq!(settings.initial_demo, DemoKind::Skybox);
        assert_eq!(settings.asset_root, PathBuf::from("/data"));

        let fallback = AppSettings::from_args(["deferred".to_string()]);
        assert_eq!(fallback.initial_demo, DemoKind::Full);
    }
}
