use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("ConfigError: {0}")]
pub struct ConfigError(pub String);
impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<&str> for ConfigError {
    fn from(e: &str) -> Self { ConfigError(e.to_string()) }
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("LoggingError::Appender: {0}")]
    Appender(#[from] std::io::Error),
    #[error("LoggingError::Config: {0}")]
    Config(#[from] log4rs::config::runtime::ConfigErrors),
    #[error("LoggingError::Init: {0}")]
    Init(#[from] log::SetLoggerError),
}

#[derive(Error, Debug)]
#[error("InitError: {0}")]
pub struct InitError(pub String);
impl From<ConfigError> for InitError {
    fn from(e: ConfigError) -> Self { InitError(e.to_string()) }
}
impl From<LoggingError> for InitError {
    fn from(e: LoggingError) -> Self { InitError(e.to_string()) }
}

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("HistoryError::File: {0}")]
    File(String),
    #[error("HistoryError::Document: {0}")]
    Document(String),
}
impl From<std::io::Error> for HistoryError {
    fn from(e: std::io::Error) -> Self { HistoryError::File(e.to_string()) }
}
impl From<glob::PatternError> for HistoryError {
    fn from(e: glob::PatternError) -> Self { HistoryError::File(e.to_string()) }
}
impl From<serde_json::Error> for HistoryError {
    fn from(e: serde_json::Error) -> Self { HistoryError::Document(e.to_string()) }
}

#[derive(Error, Debug, PartialEq)]
pub enum FeatureError {
    #[error("insufficient history: {found} observations, at least {required} required")]
    InsufficientHistory { found: usize, required: usize },
    #[error("no usable feature rows left after alignment")]
    NoUsableRows,
}

#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("ModelError::Input: {0}")]
    Input(String),
    #[error("ModelError::NotFitted")]
    NotFitted,
}

#[derive(Error, Debug, PartialEq)]
pub enum EvaluationError {
    #[error("EvaluationError::TooFewRows: {0} rows can't be split into train and test")]
    TooFewRows(usize),
    #[error("EvaluationError::Model: {0}")]
    Model(#[from] ModelError),
}

#[derive(Error, Debug, PartialEq)]
pub enum ForecastError {
    #[error("ForecastError::NoNormals: no climatological normal available for {0}")]
    NoNormals(NaiveDate),
    #[error("ForecastError::Model: {0}")]
    Model(#[from] ModelError),
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("SinkError::Unavailable: {0}")]
    Unavailable(String),
    #[error("SinkError::Document: {0}")]
    Document(String),
}
impl From<std::io::Error> for SinkError {
    fn from(e: std::io::Error) -> Self { SinkError::Unavailable(e.to_string()) }
}
impl From<serde_json::Error> for SinkError {
    fn from(e: serde_json::Error) -> Self { SinkError::Document(e.to_string()) }
}

/// Any failure confined to a single city, the run carries on with the next one
#[derive(Error, Debug, PartialEq)]
pub enum CityError {
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

impl CityError {
    /// Returns true if the city was skipped rather than failed
    pub fn is_skip(&self) -> bool {
        matches!(self, CityError::Feature(FeatureError::InsufficientHistory { .. }))
    }
}
