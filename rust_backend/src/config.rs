//! Design and optimizer configuration.
//!
//! A [`PlannerConfig`] is read from TOML (deployment files) or JSON (facility
//! payloads from the design front end):
//!
//! ```toml
//! [design]
//! target_ppfd = 600.0
//! mounting_height = 6.0
//! spectrum_preference = "high-red"
//!
//! [optimizer]
//! grid_resolution = 0.5
//! ```
//!
//! Every field except `design.target_ppfd` has a default. Values are only
//! checked by [`DesignConfig::resolve`] and [`OptimizerSettings::validate`],
//! so a partially filled payload can still be deserialized and inspected.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{LightingError, LightingResult};

/// Spectrum the grower asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpectrumPreference {
    HighBlue,
    HighRed,
    #[default]
    FullSpectrum,
    Custom,
}

/// Facility design record as supplied by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignConfig {
    #[serde(default)]
    pub target_ppfd: Option<f64>,
    /// Feet above the canopy.
    #[serde(default = "default_mounting_height")]
    pub mounting_height: f64,
    #[serde(default)]
    pub spectrum_preference: SpectrumPreference,
    /// Desired min/mean ratio, 0..1.
    #[serde(default = "default_uniformity_target")]
    pub uniformity_target: f64,
}

/// A [`DesignConfig`] whose values have been checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedDesign {
    pub target_ppfd: f64,
    pub mounting_height: f64,
    pub spectrum_preference: SpectrumPreference,
    pub uniformity_target: f64,
}

/// Search parameters for [`crate::services::LayoutOptimizer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    /// Edge length of evaluation cells.
    #[serde(default = "default_grid_resolution")]
    pub grid_resolution: f64,
    #[serde(default = "default_min_mounting_height")]
    pub min_mounting_height: f64,
    #[serde(default = "default_max_mounting_height")]
    pub max_mounting_height: f64,
    /// Accepted relative deviation of the mean from the target.
    #[serde(default = "default_ppfd_tolerance")]
    pub ppfd_tolerance: f64,
    /// Count corrections attempted after the initial spacing plan.
    #[serde(default = "default_refinement_rounds")]
    pub refinement_rounds: usize,
    /// Bisection steps for the height-calibrated candidate.
    #[serde(default = "default_height_iterations")]
    pub height_iterations: usize,
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub design: DesignConfig,
    #[serde(default)]
    pub optimizer: OptimizerSettings,
}

fn default_mounting_height() -> f64 {
    8.0
}

fn default_uniformity_target() -> f64 {
    0.7
}

fn default_grid_resolution() -> f64 {
    1.0
}

fn default_min_mounting_height() -> f64 {
    0.5
}

fn default_max_mounting_height() -> f64 {
    20.0
}

fn default_ppfd_tolerance() -> f64 {
    0.10
}

fn default_refinement_rounds() -> usize {
    4
}

fn default_height_iterations() -> usize {
    40
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            target_ppfd: None,
            mounting_height: default_mounting_height(),
            spectrum_preference: SpectrumPreference::default(),
            uniformity_target: default_uniformity_target(),
        }
    }
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            grid_resolution: default_grid_resolution(),
            min_mounting_height: default_min_mounting_height(),
            max_mounting_height: default_max_mounting_height(),
            ppfd_tolerance: default_ppfd_tolerance(),
            refinement_rounds: default_refinement_rounds(),
            height_iterations: default_height_iterations(),
        }
    }
}

impl DesignConfig {
    pub fn with_target(target_ppfd: f64) -> Self {
        Self {
            target_ppfd: Some(target_ppfd),
            ..Self::default()
        }
    }

    /// Checks the record and fills in its defaults.
    pub fn resolve(&self) -> LightingResult<ResolvedDesign> {
        let target_ppfd = match self.target_ppfd {
            Some(target) if target.is_finite() && target > 0.0 => target,
            Some(target) => {
                return Err(LightingError::configuration(format!(
                    "target_ppfd must be positive, got {}",
                    target
                )))
            }
            None => return Err(LightingError::configuration("target_ppfd is required")),
        };
        if !(self.mounting_height.is_finite() && self.mounting_height > 0.0) {
            return Err(LightingError::configuration(format!(
                "mounting_height must be positive, got {}",
                self.mounting_height
            )));
        }
        if !(0.0..=1.0).contains(&self.uniformity_target) {
            return Err(LightingError::configuration(format!(
                "uniformity_target must be within [0, 1], got {}",
                self.uniformity_target
            )));
        }

        Ok(ResolvedDesign {
            target_ppfd,
            mounting_height: self.mounting_height,
            spectrum_preference: self.spectrum_preference,
            uniformity_target: self.uniformity_target,
        })
    }
}

impl OptimizerSettings {
    pub fn validate(&self) -> LightingResult<()> {
        if !(self.grid_resolution.is_finite() && self.grid_resolution > 0.0) {
            return Err(LightingError::configuration(format!(
                "grid_resolution must be positive, got {}",
                self.grid_resolution
            )));
        }
        if !(self.min_mounting_height > 0.0 && self.min_mounting_height <= self.max_mounting_height)
            || !self.max_mounting_height.is_finite()
        {
            return Err(LightingError::configuration(format!(
                "mounting height bounds must satisfy 0 < min <= max, got [{}, {}]",
                self.min_mounting_height, self.max_mounting_height
            )));
        }
        if !(self.ppfd_tolerance.is_finite() && self.ppfd_tolerance > 0.0) {
            return Err(LightingError::configuration(format!(
                "ppfd_tolerance must be positive, got {}",
                self.ppfd_tolerance
            )));
        }
        Ok(())
    }
}

impl PlannerConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Err(LightingError::ConfigurationError)` if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> LightingResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            LightingError::configuration(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> LightingResult<Self> {
        toml::from_str(content).map_err(|e| {
            LightingError::configuration(format!("Failed to parse config file: {}", e))
        })
    }

    /// Parse a JSON payload, naming the offending field on error.
    pub fn from_json_str(json: &str) -> LightingResult<Self> {
        let deserializer = &mut serde_json::Deserializer::from_str(json);
        serde_path_to_error::deserialize(deserializer).map_err(|e| {
            LightingError::configuration(format!("Invalid config at '{}': {}", e.path(), e.inner()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = PlannerConfig::from_toml_str("[design]\ntarget_ppfd = 600.0\n").unwrap();
        let design = config.design.resolve().unwrap();
        assert_eq!(design.target_ppfd, 600.0);
        assert_eq!(design.mounting_height, 8.0);
        assert_eq!(design.spectrum_preference, SpectrumPreference::FullSpectrum);
        assert_eq!(design.uniformity_target, 0.7);
        assert_eq!(config.optimizer, OptimizerSettings::default());
        assert_eq!(config.optimizer.ppfd_tolerance, 0.10);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[design]
target_ppfd = 900.0
mounting_height = 3.0
spectrum_preference = "high-blue"
uniformity_target = 0.8

[optimizer]
grid_resolution = 0.5
refinement_rounds = 2
"#
        )
        .unwrap();

        let config = PlannerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.design.spectrum_preference, SpectrumPreference::HighBlue);
        assert_eq!(config.optimizer.grid_resolution, 0.5);
        assert_eq!(config.optimizer.refinement_rounds, 2);
        assert_eq!(config.optimizer.max_mounting_height, 20.0);
        assert!(config.optimizer.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = PlannerConfig::from_file("/nonexistent/planner.toml").unwrap_err();
        assert!(matches!(err, LightingError::ConfigurationError(_)));
    }

    #[test]
    fn test_json_error_names_field() {
        let err = PlannerConfig::from_json_str(
            r#"{"design": {"target_ppfd": 400, "spectrum_preference": "ultraviolet"}}"#,
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("design.spectrum_preference"), "{}", message);
    }

    #[test]
    fn test_resolve_rejects_bad_values() {
        assert!(DesignConfig::default().resolve().is_err());
        assert!(DesignConfig::with_target(-5.0).resolve().is_err());

        let mut config = DesignConfig::with_target(400.0);
        config.mounting_height = 0.0;
        assert!(config.resolve().is_err());

        let mut config = DesignConfig::with_target(400.0);
        config.uniformity_target = 1.5;
        assert!(config.resolve().is_err());
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = OptimizerSettings::default();
        settings.min_mounting_height = 10.0;
        settings.max_mounting_height = 5.0;
        assert!(settings.validate().is_err());

        let settings = OptimizerSettings {
            grid_resolution: 0.0,
            ..OptimizerSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
