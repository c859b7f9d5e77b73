//! Application configuration

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use tracing::warn;

use crate::{errors::LocatorError, models::ReferencePoint, report::OutputFormat};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    pub query: QueryConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    /// Number of nearest records reported per reference point
    pub count: usize,
    #[serde(default = "ReferencePoint::defaults")]
    pub references: Vec<ReferencePoint>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

impl AppConfig {
    /// Load configuration from defaults, `config/default`, an optional
    /// explicit file and `VEHLOC__*` environment variables, in that order
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("input.path", "VehiclePositions.dat")?
            .set_default("query.count", 1)?
            .set_default("output.format", "table")?
            .add_source(File::with_name("config/default").required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("VEHLOC")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), LocatorError> {
        self.input.validate()?;
        self.query.validate()?;
        Ok(())
    }
}

impl InputConfig {
    pub fn validate(&self) -> Result<(), LocatorError> {
        if self.path.as_os_str().is_empty() {
            return Err(LocatorError::ConfigurationError {
                message: "Input path cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl QueryConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), LocatorError> {
        self.validate_count()?;
        self.validate_references()?;
        Ok(())
    }

    fn validate_count(&self) -> Result<(), LocatorError> {
        if self.count == 0 {
            return Err(LocatorError::ConfigurationError {
                message: "Nearest record count must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    fn validate_references(&self) -> Result<(), LocatorError> {
        if self.references.is_empty() {
            return Err(LocatorError::ConfigurationError {
                message: "At least one reference point is required".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for reference in &self.references {
            if !reference.latitude.is_finite() || !reference.longitude.is_finite() {
                return Err(LocatorError::ConfigurationError {
                    message: format!(
                        "Reference point {} has non-finite coordinates",
                        reference.position
                    ),
                });
            }
            if !seen.insert(reference.position) {
                warn!("Duplicate reference point position {}", reference.position);
            }
        }
        Ok(())
    }
}
