use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::ConfigError;
use super::oxygen::{add_oxygen, OxygenCoefficients};
use super::table::DataTable;

/// Calibration for the oxygen equation: which voltage channel carries the SBE 43 and its
/// calibration sheet coefficients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OxygenCalibration {
    pub voltage_column: String,
    pub coefficients: OxygenCoefficients,
}

/// Structure representing the calibration configuration used to derive quantities from a
/// decoded table. Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub oxygen: Option<OxygenCalibration>,
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Write the configuration to a YAML file
    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        std::fs::write(config_path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    pub fn has_oxygen(&self) -> bool {
        self.oxygen.is_some()
    }

    /// Apply every configured derived quantity to the table, in turn
    pub fn derive_quantities(&self, table: &mut DataTable) -> Result<(), ConfigError> {
        if let Some(oxygen) = &self.oxygen {
            add_oxygen(table, &oxygen.voltage_column, &oxygen.coefficients)?;
        }
        Ok(())
    }
}
