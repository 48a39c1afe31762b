//! Editor configuration.
//!
//! All fields have defaults, so a config file only needs the values it
//! overrides:
//!
//! ```toml
//! grid_size = 24.0
//!
//! [splice]
//! policy = "force"
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the splice command treats the port-compatibility rules when it
/// reconnects the dropped node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplicePolicy {
    /// Consult the graph's validator and skip a side whose ports may not be
    /// linked, leaving it disconnected.
    #[default]
    RespectRules,
    /// Create both links unconditionally.
    Force,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpliceConfig {
    pub policy: SplicePolicy,
    /// Name of the port on the dropped node that receives the upstream link.
    pub input_port: String,
    /// Name of the port on the dropped node that feeds the downstream link.
    pub output_port: String,
}

impl Default for SpliceConfig {
    fn default() -> Self {
        Self {
            policy: SplicePolicy::default(),
            input_port: "in-0".to_string(),
            output_port: "out-0".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Grid spacing used to snap dragged nodes. `0` disables snapping.
    pub grid_size: f32,
    /// Maximum screen distance between pointer and link for a link hit.
    pub hover_distance: f32,
    /// Number of segments used to approximate a link curve when hit-testing.
    pub hit_samples: usize,
    /// Minimum horizontal control point offset of link curves.
    pub bezier_min_offset: f32,
    pub pin_hit_radius: f32,
    pub splice: SpliceConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: 0.0,
            hover_distance: 10.0,
            hit_samples: 20,
            bezier_min_offset: 50.0,
            pin_hit_radius: 8.0,
            splice: SpliceConfig::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&source)?;
        log::debug!("Loaded editor config from {}", path.as_ref().display());
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.grid_size >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "grid_size must be >= 0, got {}",
                self.grid_size
            )));
        }
        if !(self.hover_distance >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "hover_distance must be >= 0, got {}",
                self.hover_distance
            )));
        }
        if self.splice.input_port.is_empty() || self.splice.output_port.is_empty() {
            return Err(ConfigError::Invalid("splice port names must not be empty".into()));
        }
        if self.splice.input_port == self.splice.output_port {
            return Err(ConfigError::Invalid(format!(
                "splice input and output port are both '{}'",
                self.splice.input_port
            )));
        }
        Ok(())
    }
}
