//! Processor configuration
//!
//! Loaded once at startup, either from defaults or from a TOML document:
//!
//! ```toml
//! label = "Main View Processor"
//! occlusion_culling = true
//! depth_bias = 0.05
//! ```

use crate::error::GatherResult;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Prefix for every GPU object label created by the processor
    pub label: String,

    /// Global occlusion switch. When false the LOD stage only frustum-culls,
    /// exactly like a shadow pass.
    pub occlusion_culling: bool,

    /// Linear-depth slack added to the Hi-Z depth before the occlusion compare
    pub depth_bias: f32,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            label: "Processor".to_string(),
            occlusion_culling: true,
            depth_bias: 0.0,
        }
    }
}

impl ProcessorConfig {
    /// Parse a TOML document; missing fields keep their defaults
    pub fn from_toml_str(source: &str) -> GatherResult<Self> {
        let config: Self = toml::from_str(source)?;
        log::debug!("[ProcessorConfig::from_toml_str] Parsed config: {:?}", config);
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> GatherResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        log::info!("[ProcessorConfig::load] Loading processor config from {}", path.display());
        Self::from_toml_str(&source)
    }

    /// GPU label for a named sub-object
    pub fn label_for(&self, name: &str) -> String {
        format!("{} {}", self.label, name)
    }
}
