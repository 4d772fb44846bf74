//! Engine configuration
//!
//! Read from TOML. Every key is optional:
//!
//! ```toml
//! [history]
//! max_entries = 50
//!
//! [layout]
//! grid_columns = 4
//! density = "comfortable"
//!
//! [services]
//! palette = ["#6366f1", "#10b981"]
//! ```

use crate::entity_store::DEFAULT_GRID_COLUMNS;
use crate::history::DEFAULT_MAX_ENTRIES;
use crate::layout_store::Density;
use blueprint_core::{EngineError, EngineResult};
use blueprint_ir::PALETTE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "blueprint.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub history: HistoryConfig,
    pub layout: LayoutConfig,
    pub services: ServicesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Past snapshots kept for undo
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Columns of the placement grid for new entities
    pub grid_columns: usize,
    pub density: Density,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            grid_columns: DEFAULT_GRID_COLUMNS,
            density: Density::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Colors handed out to new services, round-robin
    pub palette: Vec<String>,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            palette: PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| EngineError::FileRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Load `path` if given, else `blueprint.toml` in `dir` if present, else defaults
    pub fn discover(path: Option<&Path>, dir: impl AsRef<Path>) -> EngineResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let candidate = dir.as_ref().join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load(candidate)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.history.max_entries == 0 {
            return Err(EngineError::InvalidConfig(
                "history.max_entries must be at least 1".to_string(),
            ));
        }
        if self.layout.grid_columns == 0 {
            return Err(EngineError::InvalidConfig(
                "layout.grid_columns must be at least 1".to_string(),
            ));
        }
        if self.services.palette.is_empty() {
            return Err(EngineError::InvalidConfig(
                "services.palette cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> EngineResult<String> {
        toml::to_string_pretty(self).map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = EngineConfig::from_toml_str(
            r#"
            [layout]
            grid_columns = 6
            density = "spacious"
            "#,
        )
        .unwrap();
        assert_eq!(config.layout.grid_columns, 6);
        assert_eq!(config.layout.density, Density::Spacious);
        assert_eq!(config.history.max_entries, DEFAULT_MAX_ENTRIES);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(EngineConfig::from_toml_str("[history]\nmax_entries = 0").is_err());
        assert!(EngineConfig::from_toml_str("[services]\npalette = []").is_err());
        assert!(EngineConfig::from_toml_str("[layout]\ndensity = \"cozy\"").is_err());
    }

    #[test]
    fn test_discover() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            EngineConfig::discover(None, dir.path()).unwrap(),
            EngineConfig::default()
        );

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[layout]\ngrid_columns = 2\n").unwrap();
        let config = EngineConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config.layout.grid_columns, 2);

        let missing = dir.path().join("missing.toml");
        assert!(EngineConfig::discover(Some(&missing), dir.path()).is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EngineConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }
}
