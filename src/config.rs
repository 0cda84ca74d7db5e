//! Configuration loading using Figment.
//!
//! A configuration file describes one CITS run: the scan frame as reported
//! by the instrument, the local areas the operator wants measured, and
//! optionally a full-frame grid. Configuration is loaded from (in order of
//! precedence):
//! 1. Environment variables prefixed with `SXMCITS_`
//! 2. A TOML configuration file
//!
//! # Environment Variables
//!
//! Nested keys are separated by a double underscore, so field names that
//! contain a single underscore still work:
//!
//! ```text
//! SXMCITS_APPLICATION__LOG_LEVEL=debug
//! SXMCITS_FRAME__ANGLE=12.5
//! SXMCITS_FRAME__TOTAL_LINES=256
//! ```
//!
//! # Example
//!
//! ```toml
//! [application]
//! name = "sxm-cits"
//! log_level = "info"
//!
//! [frame]
//! center_x = 120.0
//! center_y = -40.0
//! range = 500.0
//! angle = 15.0
//! total_lines = 500
//!
//! [[areas]]
//! x_dev = -100.0
//! y_dev = -100.0
//! dx = 5.0
//! dy = 5.0
//! nx = 20
//! ny = 20
//! start_direction = 1
//! ```

use std::path::Path;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::area::{AreaParams, StartDirection};
use crate::error::CitsError;
use crate::frame::ScanFrame;
use crate::plan::{self, MeasurementPlan, DEFAULT_SAFE_MARGIN};
use crate::preview::DEFAULT_AXIS_FRACTION;
use crate::validation::{self, MAX_POINTS_PER_AXIS};

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "SXMCITS_";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File or environment could not be read or parsed
    #[error("Configuration load error: {0}")]
    Load(#[from] figment::Error),
    /// A value parsed but is not acceptable
    #[error("Configuration validation error: {0}")]
    Validation(String),
    /// Rendering back to TOML failed
    #[error("Configuration serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// Frame or plan rejected by the geometry engine
    #[error(transparent)]
    Engine(#[from] CitsError),
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CitsConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Scan frame snapshot
    #[serde(default)]
    pub frame: ScanFrame,
    /// Local areas, visited in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub areas: Vec<AreaParams>,
    /// Full-frame grid, used when `areas` is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<StandardCitsConfig>,
    /// Preview settings
    #[serde(default)]
    pub preview: PreviewConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
        }
    }
}

/// Full-frame CITS grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardCitsConfig {
    /// Points along X
    pub nx: u32,
    /// Points along Y
    pub ny: u32,
    /// `+1` starts at the bottom edge, `-1` at the top
    #[serde(default = "default_direction")]
    pub direction: i32,
    /// Fraction of the range left unmeasured at the edges
    #[serde(default = "default_safe_margin")]
    pub safe_margin: f64,
}

/// Preview settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Axis indicator length as a fraction of the range
    #[serde(default = "default_axis_fraction")]
    pub axis_fraction: f64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            axis_fraction: default_axis_fraction(),
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_name() -> String {
    "sxm-cits".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_direction() -> i32 {
    1
}

fn default_safe_margin() -> f64 {
    DEFAULT_SAFE_MARGIN
}

fn default_axis_fraction() -> f64 {
    DEFAULT_AXIS_FRACTION
}

// ============================================================================
// Configuration Loading and Validation
// ============================================================================

impl CitsConfig {
    /// Load configuration from a TOML file and `SXMCITS_` environment
    /// variables, then validate it.
    ///
    /// # Errors
    ///
    /// Returns a ConfigError if the file cannot be loaded or validation fails.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::read_from(path.as_ref())?;
        config.validate()?;
        tracing::debug!(path = %path.as_ref().display(), "Loaded configuration");
        Ok(config)
    }

    /// Like [`load_from`](Self::load_from) but without validation, for
    /// callers that report problems themselves.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Ok(Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?)
    }

    /// Parse and validate configuration from a TOML string. Environment
    /// variables are not consulted.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = Figment::new().merge(Toml::string(toml)).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration after loading
    ///
    /// Checks:
    /// - Log level is valid (trace, debug, info, warn, error)
    /// - Frame parameters are within instrument ranges
    /// - Every area passes the area validator
    /// - The standard grid, if present, is well formed
    /// - Preview axis fraction is positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        self.frame.check_ranges()?;

        validation::validate_all(&self.areas).map_err(|(index, e)| {
            ConfigError::Validation(format!("areas[{index}]: {e}"))
        })?;

        if let Some(standard) = &self.standard {
            Self::validate_standard(standard)?;
        }

        let fraction = self.preview.axis_fraction;
        if !(fraction.is_finite() && fraction > 0.0) {
            return Err(ConfigError::Validation(format!(
                "Invalid preview.axis_fraction {fraction}. Must be > 0"
            )));
        }

        Ok(())
    }

    fn validate_standard(standard: &StandardCitsConfig) -> Result<(), ConfigError> {
        for (name, count) in [("nx", standard.nx), ("ny", standard.ny)] {
            if !(1..=MAX_POINTS_PER_AXIS).contains(&count) {
                return Err(ConfigError::Validation(format!(
                    "Invalid standard.{name} {count}. Must be 1-{MAX_POINTS_PER_AXIS}"
                )));
            }
        }
        standard_direction(standard.direction)?;
        if !(0.0..1.0).contains(&standard.safe_margin) {
            return Err(ConfigError::Validation(format!(
                "Invalid standard.safe_margin {}. Must be in [0, 1)",
                standard.safe_margin
            )));
        }
        Ok(())
    }

    /// Build the measurement plan this configuration describes.
    ///
    /// Uses the configured areas when there are any, otherwise the standard
    /// full-frame grid. With neither, the plan is empty and an error.
    pub fn build_plan(&self) -> Result<MeasurementPlan, ConfigError> {
        if !self.areas.is_empty() {
            return Ok(plan::compose(&self.frame, &self.areas)?);
        }
        match &self.standard {
            Some(standard) => {
                let direction = standard_direction(standard.direction)?;
                let area = plan::standard_area(
                    &self.frame,
                    standard.nx,
                    standard.ny,
                    direction,
                    standard.safe_margin,
                )?;
                Ok(plan::compose_specs(&self.frame, vec![area])?)
            }
            None => Err(CitsError::EmptyPlan.into()),
        }
    }
}

fn standard_direction(direction: i32) -> Result<StartDirection, ConfigError> {
    StartDirection::try_from(direction).map_err(|_| {
        ConfigError::Validation(format!(
            "Invalid standard.direction {direction}. Must be 1 or -1"
        ))
    })
}
