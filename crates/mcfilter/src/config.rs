//! # Configuration
//!
//! Engine settings are managed by [`confique`], which handles layered loading
//! from a TOML file and environment variables.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `MCFILTER_NUMERIC_TOLERANCE`, `MCFILTER_LOCALE`, etc.
//! 2. **Config file**: the path passed to [`EngineConfig::load`], if it exists.
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `numeric_tolerance` | `1e-5` | Absolute tolerance for numeric `Equal` / `Not Equal` |
//! | `rounding_decimals` | `3` | Decimals model values are rounded to before comparing |
//! | `design_option_primary_tag` | `(primary)` | Suffix stripped from design option names |
//! | `level_sketch_plane_prefix` | `Level : ` | Prefix of sketch planes that reference a level |
//! | `locale` | `en` | Culture used by case-insensitive substring matching |

use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{FilterError, Result};
use crate::matcher::round_to;
use crate::text::Locale;

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EngineConfig {
    #[config(default = 0.00001, env = "MCFILTER_NUMERIC_TOLERANCE")]
    pub numeric_tolerance: f64,

    #[config(default = 3, env = "MCFILTER_ROUNDING_DECIMALS")]
    pub rounding_decimals: u32,

    #[config(default = "(primary)", env = "MCFILTER_DESIGN_OPTION_PRIMARY_TAG")]
    pub design_option_primary_tag: String,

    #[config(default = "Level : ", env = "MCFILTER_LEVEL_SKETCH_PLANE_PREFIX")]
    pub level_sketch_plane_prefix: String,

    #[config(default = "en", env = "MCFILTER_LOCALE")]
    pub locale: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            numeric_tolerance: 1e-5,
            rounding_decimals: 3,
            design_option_primary_tag: "(primary)".to_string(),
            level_sketch_plane_prefix: "Level : ".to_string(),
            locale: "en".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load from the environment and, when given, a TOML file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(path) = path {
            builder = builder.file(path);
        }
        builder
            .load()
            .map_err(|e| FilterError::Config(e.to_string()))
    }

    pub fn locale(&self) -> Locale {
        Locale::from_tag(&self.locale)
    }

    /// Round `value` to `rounding_decimals` places.
    pub fn round(&self, value: f64) -> f64 {
        round_to(value, self.rounding_decimals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.numeric_tolerance, 1e-5);
        assert_eq!(config.rounding_decimals, 3);
        assert_eq!(config.design_option_primary_tag, "(primary)");
        assert_eq!(config.locale(), Locale::Default);
    }

    #[test]
    fn test_rounding() {
        let config = EngineConfig::default();
        assert_eq!(config.round(10.00004), 10.0);
        assert_eq!(config.round(10.0126), 10.013);
        assert_eq!(config.round(-2.0004), -2.0);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcfilter.toml");
        std::fs::write(&path, "numeric_tolerance = 0.001\nlocale = \"tr-TR\"\n").unwrap();

        let config = EngineConfig::load(Some(&path)).unwrap();

        assert_eq!(config.numeric_tolerance, 0.001);
        assert_eq!(config.locale(), Locale::Turkic);
        assert_eq!(config.rounding_decimals, 3);
    }

    #[test]
    fn test_invalid_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcfilter.toml");
        std::fs::write(&path, "rounding_decimals = \"three\"").unwrap();

        let err = EngineConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, FilterError::Config(_)));
    }
}
