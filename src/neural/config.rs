// projeto: rnnwindow
// file: src/neural/config.rs
// TOML configuration for window sizes, strides and model sizes

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::neural::model::{PART1_HIDDEN_UNITS, PART2_HIDDEN_UNITS};
use crate::neural::utils::WindowError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeriesConfig {
    pub window_size: usize,
    /// Features per timestep of the regressor built by `summary`; windowed
    /// series always carry one value per timestep.
    pub step_size: usize,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        SeriesConfig { window_size: 7, step_size: 1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextConfig {
    pub window_size: usize,
    pub step_size: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        TextConfig { window_size: 100, step_size: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub regressor_units: usize,
    pub classifier_units: usize,
    pub seed: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            regressor_units: PART1_HIDDEN_UNITS,
            classifier_units: PART2_HIDDEN_UNITS,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub series: SeriesConfig,
    pub text: TextConfig,
    pub model: ModelConfig,
}

impl AppConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, WindowError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, WindowError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&contents)?;
        info!("⚙️ [Config] Loaded {}", path.as_ref().display());
        Ok(config)
    }

    /// Reads `path` when given, otherwise the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self, WindowError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.series.window_size, 7);
        assert_eq!(config.text.step_size, 5);
        assert_eq!(config.model.regressor_units, 5);
        assert_eq!(config.model.seed, None);
    }

    #[test]
    fn test_partial_sections() {
        let config = AppConfig::from_toml_str(
            r#"
            [text]
            window_size = 50

            [model]
            seed = 42
            "#,
        ).unwrap();
        assert_eq!(config.text.window_size, 50);
        assert_eq!(config.text.step_size, 5);
        assert_eq!(config.model.seed, Some(42));
        assert_eq!(config.model.classifier_units, 200);
        assert_eq!(config.series, SeriesConfig::default());
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let result = AppConfig::from_toml_str("[series]\nwindow_size = \"seven\"");
        assert!(matches!(result, Err(WindowError::Config(_))));
    }

    #[test]
    fn test_missing_path_uses_defaults() {
        let config = AppConfig::load_or_default::<&str>(None).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
