//! Viewer configuration
//!
//! Provides configuration file handling and validation for the viewer.
//! Supports JSON and TOML file formats stored in the platform config directory.
//!
//! Configuration is organized into sections:
//! - Camera (projection and initial placement)
//! - Controls (trackball tuning and key bindings)
//! - Scene (background, fog, plot and axis line styling, lights)
//! - Renderer (antialiasing, pixel ratio, frame rate)
//!
//! Every default reproduces the stock viewer, so `ViewerConfig::default()`
//! is the configuration used when no file is present.

use crate::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name used inside [`config_dir`]
pub const CONFIG_FILE_NAME: &str = "plotview.toml";

/// Perspective camera settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
    /// Initial camera position
    pub position: [f32; 3],
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov: 60.0,
            near: 1.0,
            far: 1000.0,
            position: [0.0, 0.0, 50.0],
        }
    }
}

/// Trackball controls settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub no_rotate: bool,
    pub no_zoom: bool,
    pub no_pan: bool,
    /// Disable inertia: movement stops as soon as input stops
    pub static_moving: bool,
    pub dynamic_damping_factor: f32,
    /// Key codes that hold rotate, zoom and pan mode respectively
    pub keys: [u32; 3],
    pub min_distance: f32,
    /// Upper bound on camera distance from the target; unbounded when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f32>,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            rotate_speed: 1.0,
            zoom_speed: 1.2,
            pan_speed: 0.8,
            no_rotate: false,
            no_zoom: false,
            no_pan: false,
            static_moving: true,
            dynamic_damping_factor: 0.3,
            keys: [65, 83, 68],
            min_distance: 0.0,
            max_distance: None,
        }
    }
}

/// Scene styling settings
///
/// Colors are `0xRRGGBB`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub background: u32,
    pub fog_color: u32,
    pub fog_density: f32,
    pub plot_line_color: u32,
    pub line_width: f32,
    /// Length of each axis line from the origin
    pub axis_length: f32,
    pub dash_size: f32,
    pub gap_size: f32,
    pub key_light_color: u32,
    pub key_light_position: [f32; 3],
    pub fill_light_color: u32,
    pub fill_light_position: [f32; 3],
    pub ambient_light_color: u32,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            background: 0xcccccc,
            fog_color: 0xcccccc,
            fog_density: 0.002,
            plot_line_color: 0x000000,
            line_width: 10.0,
            axis_length: 100.0,
            dash_size: 10.0,
            gap_size: 10.0,
            key_light_color: 0xffffff,
            key_light_position: [1.0, 1.0, 1.0],
            fill_light_color: 0x002288,
            fill_light_position: [-1.0, -1.0, -1.0],
            ambient_light_color: 0x222222,
        }
    }
}

/// Renderer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    pub antialias: bool,
    /// Overrides the host's device pixel ratio when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_ratio: Option<f32>,
    /// Animation loop frequency in frames per second
    pub frame_rate: u32,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            antialias: true,
            pixel_ratio: None,
            frame_rate: 60,
        }
    }
}

/// Complete viewer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ViewerConfig {
    pub camera: CameraSettings,
    pub controls: ControlsSettings,
    pub scene: SceneSettings,
    pub renderer: RendererSettings,
}

impl ViewerConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            return Err(SettingsError::LoadError(
                "Config file must be .json or .toml".to_string(),
            ));
        };

        config.validate()?;
        tracing::info!("Loaded viewer config from {}", path.display());
        Ok(config)
    }

    /// Load config from `path` if it exists, falling back to defaults
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)?
        } else {
            return Err(SettingsError::SaveError(
                "Config file must be .json or .toml".to_string(),
            ));
        };

        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let camera = &self.camera;
        if !(camera.fov > 0.0 && camera.fov < 180.0) {
            return Err(SettingsError::invalid(
                "camera.fov",
                "must be between 0 and 180 degrees",
            ));
        }
        if !(camera.near > 0.0 && camera.near < camera.far) {
            return Err(SettingsError::invalid(
                "camera.near",
                "must be > 0 and less than camera.far",
            ));
        }

        let controls = &self.controls;
        if controls.rotate_speed < 0.0 || controls.zoom_speed < 0.0 || controls.pan_speed < 0.0 {
            return Err(SettingsError::invalid("controls", "speeds must be >= 0"));
        }
        if !(0.0..=1.0).contains(&controls.dynamic_damping_factor) {
            return Err(SettingsError::invalid(
                "controls.dynamic_damping_factor",
                "must be between 0 and 1",
            ));
        }
        if let Some(max) = controls.max_distance {
            if max < controls.min_distance {
                return Err(SettingsError::invalid(
                    "controls.max_distance",
                    "must be >= controls.min_distance",
                ));
            }
        }

        if self.scene.fog_density < 0.0 {
            return Err(SettingsError::invalid("scene.fog_density", "must be >= 0"));
        }
        if self.scene.axis_length <= 0.0 {
            return Err(SettingsError::invalid("scene.axis_length", "must be > 0"));
        }

        if self.renderer.frame_rate == 0 {
            return Err(SettingsError::invalid("renderer.frame_rate", "must be > 0"));
        }
        if self.renderer.pixel_ratio.is_some_and(|ratio| ratio <= 0.0) {
            return Err(SettingsError::invalid("renderer.pixel_ratio", "must be > 0"));
        }

        Ok(())
    }
}

/// Platform configuration directory for the viewer
pub fn config_dir() -> SettingsResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("plotview"))
        .ok_or_else(|| {
            SettingsError::ConfigDirectory("Could not determine config directory".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_viewer() {
        let config = ViewerConfig::default();
        assert_eq!(config.camera.fov, 60.0);
        assert_eq!(config.camera.position, [0.0, 0.0, 50.0]);
        assert_eq!(config.controls.keys, [65, 83, 68]);
        assert!(config.controls.static_moving);
        assert_eq!(config.scene.fog_density, 0.002);
        assert_eq!(config.scene.fill_light_color, 0x002288);
        assert!(config.renderer.antialias);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_fov() {
        let mut config = ViewerConfig::default();
        config.camera.fov = 180.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("camera.fov"));
    }

    #[test]
    fn test_validate_rejects_inverted_clip_planes() {
        let mut config = ViewerConfig::default();
        config.camera.near = 2000.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_damping_out_of_range() {
        let mut config = ViewerConfig::default();
        config.controls.dynamic_damping_factor = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_frame_rate() {
        let mut config = ViewerConfig::default();
        config.renderer.frame_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ViewerConfig = toml::from_str("[camera]\nfov = 45.0\n").unwrap();
        assert_eq!(config.camera.fov, 45.0);
        assert_eq!(config.camera.far, 1000.0);
        assert_eq!(config.controls, ControlsSettings::default());
    }
}
