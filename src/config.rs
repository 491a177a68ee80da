use std::fs;
use chrono::NaiveDate;
use log::LevelFilter;
use serde::Deserialize;
use crate::conditions::IconTable;
use crate::errors::ConfigError;

#[derive(Deserialize)]
pub struct Files {
    pub history_dir: String,
    pub output_dir: String,
}

#[derive(Deserialize)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ForecastParameters {
    pub horizon_days: usize,
    pub detail_days: usize,
    pub min_history_days: usize,
    pub test_fraction: f64,
    pub today: Option<NaiveDate>,
}

impl Default for ForecastParameters {
    fn default() -> Self {
        Self {
            horizon_days: 30,
            detail_days: 7,
            min_history_days: 365,
            test_fraction: 0.2,
            today: None,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ModelParameters {
    pub n_trees: usize,
    pub seed: u64,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
            max_depth: None,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Deserialize)]
pub struct Config {
    pub general: General,
    pub files: Files,
    #[serde(default)]
    pub forecast: ForecastParameters,
    #[serde(default)]
    pub model: ModelParameters,
    #[serde(default)]
    pub conditions: IconTable,
}

/// Loads the configuration file and returns a struct with all configuration items
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, ConfigError> {
    let toml = fs::read_to_string(config_path)?;
    parse_config(&toml)
}

/// Parses and validates a configuration document
///
/// # Arguments
///
/// * 'toml' - the configuration as a toml string
fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(toml)?;

    let forecast = &config.forecast;
    if forecast.horizon_days == 0 {
        return Err(ConfigError::from("forecast.horizon_days must be at least 1"));
    }
    if forecast.detail_days > forecast.horizon_days {
        return Err(ConfigError::from("forecast.detail_days can't exceed forecast.horizon_days"));
    }
    if !(forecast.test_fraction > 0.0 && forecast.test_fraction < 1.0) {
        return Err(ConfigError::from("forecast.test_fraction must be between 0 and 1"));
    }
    if config.model.n_trees == 0 {
        return Err(ConfigError::from("model.n_trees must be at least 1"));
    }

    Ok(config)
}
