//! PlotView Settings Crate
//!
//! Handles viewer configuration: camera, trackball controls, scene styling
//! and renderer options, with JSON/TOML persistence.

pub mod config;
pub mod error;

pub use config::{
    config_dir, CameraSettings, ControlsSettings, RendererSettings, SceneSettings, ViewerConfig,
    CONFIG_FILE_NAME,
};
pub use error::{SettingsError, SettingsResult};
