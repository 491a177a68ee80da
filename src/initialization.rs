use std::env;
use log::info;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;
use crate::config::{load_config, Config, General};
use crate::errors::{InitError, LoggingError};
use crate::estimator::ForestFactory;
use crate::manager_history::JsonHistoryStore;
use crate::manager_results::JsonResultSink;

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const LOG_FILE: &str = "wxcast.log";
const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l:<5} {t} - {m}{n}";

pub struct Mgr {
    pub store: JsonHistoryStore,
    pub sink: JsonResultSink,
    pub factory: ForestFactory,
}

/// Loads configuration, sets up logging and returns the configuration together with
/// the history store, result sink and model factory
///
pub fn init() -> Result<(Config, Mgr), InitError> {
    let config_path = resolve_config_path(env::args().nth(1), env::var("CONFIG_PATH").ok());
    let config = load_config(&config_path)?;

    setup_logging(&config.general)?;

    // Print version
    info!("wxcast version: {}", env!("CARGO_PKG_VERSION"));
    info!("configuration loaded from {}", config_path);

    let mgr = Mgr {
        store: JsonHistoryStore::new(&config.files.history_dir),
        sink: JsonResultSink::new(&config.files.output_dir),
        factory: ForestFactory::new(config.model.clone()),
    };

    info!("reading history from {}, writing results to {}", config.files.history_dir, mgr.sink.output_dir().display());

    Ok((config, mgr))
}

/// Picks the configuration file: command line argument first, then the CONFIG_PATH
/// environment variable, then config.toml in the working directory
///
/// # Arguments
///
/// * 'arg' - first command line argument, if any
/// * 'env_path' - value of CONFIG_PATH, if set
fn resolve_config_path(arg: Option<String>, env_path: Option<String>) -> String {
    arg.or(env_path).unwrap_or(DEFAULT_CONFIG_PATH.to_string())
}

/// Sets up log4rs with a file appender and, if configured, a stdout appender
///
/// # Arguments
///
/// * 'general' - the general section of the configuration
fn setup_logging(general: &General) -> Result<(), LoggingError> {
    let log_file = format!("{}{}", general.log_path, LOG_FILE);
    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(log_file)?;

    let mut builder = LogConfig::builder()
        .appender(Appender::builder().build("file", Box::new(file)));
    let mut root = Root::builder().appender("file");

    if general.log_to_stdout {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();
        builder = builder.appender(Appender::builder().build("stdout", Box::new(stdout)));
        root = root.appender("stdout");
    }

    let config = builder.build(root.build(general.log_level))?;
    log4rs::init_config(config)?;

    Ok(())
}
