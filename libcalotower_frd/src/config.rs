use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::constants::DEFAULT_TOWER_LABEL;
use super::error::ConfigError;
use super::frd_format::raw_file_path;

/// Structure representing the application configuration. Contains pathing and orbit information
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Columnar event table exported from NanoAOD
    pub input_path: PathBuf,
    /// Prefix of the CaloTower branches in the event table
    pub tower_label: String,
    /// Injection scheme JSON, fetched ahead of time
    pub filling_scheme_path: PathBuf,
    /// Directory under which the run<run>/ directory is created
    pub output_path: PathBuf,
    pub n_orbits: i32,
    pub file_index: u32,
    /// Log the orbit size every this many orbits
    pub patience: u32,
}

impl Default for Config {
    /// Generate a new Config object. Paths will be empty/invalid
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("None"),
            tower_label: String::from(DEFAULT_TOWER_LABEL),
            filling_scheme_path: PathBuf::from("None"),
            output_path: PathBuf::from("."),
            n_orbits: 10,
            file_index: 0,
            patience: 1,
        }
    }
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
        let yaml_str = serde_yaml::to_string(self)?;
        std::fs::write(config_path, yaml_str)?;
        Ok(())
    }

    /// Number of orbits to write. Negative requests write none.
    pub fn get_n_orbits(&self) -> u32 {
        self.n_orbits.max(0) as u32
    }

    /// Get the path to the output .raw file for a run and lumisection
    pub fn get_raw_file_name(&self, run_number: u32, lumisection: u32) -> PathBuf {
        raw_file_path(&self.output_path, run_number, lumisection, self.file_index)
    }

    /// Check that the input files exist before doing any work
    pub fn check_inputs(&self) -> Result<(), ConfigError> {
        if !self.input_path.exists() {
            return Err(ConfigError::BadFilePath(self.input_path.clone()));
        }
        if !self.filling_scheme_path.exists() {
            return Err(ConfigError::BadFilePath(self.filling_scheme_path.clone()));
        }
        Ok(())
    }

    pub fn get_patience(&self) -> u32 {
        self.patience.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_round_trip() {
        let config = Config {
            input_path: PathBuf::from("/data/nano.yml"),
            n_orbits: 3,
            ..Default::default()
        };
        let file = tempfile::NamedTempFile::new().unwrap();
        config.write_config_file(file.path()).unwrap();
        let read = Config::read_config_file(file.path()).unwrap();
        assert_eq!(read.input_path, config.input_path);
        assert_eq!(read.tower_label, "L1EmulCaloTower");
        assert_eq!(read.n_orbits, 3);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: Config = serde_yaml::from_str("input_path: a.yml\nn_orbits: -4\n").unwrap();
        assert_eq!(config.get_n_orbits(), 0);
        assert_eq!(config.tower_label, DEFAULT_TOWER_LABEL);
        assert_eq!(config.get_patience(), 1);
    }

    #[test]
    fn test_raw_file_name() {
        let config = Config {
            output_path: PathBuf::from("out"),
            file_index: 2,
            ..Default::default()
        };
        assert_eq!(
            config.get_raw_file_name(362000, 5),
            PathBuf::from("out/run362000/run362000_ls0005_index000002.raw")
        );
    }

    #[test]
    fn test_missing_config_file() {
        assert!(matches!(
            Config::read_config_file(Path::new("/no/such/config.yml")),
            Err(ConfigError::BadFilePath(_))
        ));
    }
}
