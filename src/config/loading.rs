use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, Environment, File, FileFormat};
use log::LevelFilter;
use snafu::{ensure, OptionExt, ResultExt, Snafu};
use url::Url;

use super::models::Settings;

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
pub const ENV_PREFIX: &str = "OSG";

/// Values coming from the command line. `None` leaves the lower layers alone.
#[derive(Debug, Default)]
pub struct Overrides {
    pub getterer_url: Option<String>,
    pub status_token: Option<String>,
    pub ttl: Option<u64>,
    pub padding: Option<usize>,
    pub log_level: Option<String>,
}

/// Imports `.env` files into the environment. Returns the file that was
/// loaded, if any, so it can be logged once logging is up.
pub fn load_dotenv() -> Option<Vec<PathBuf>> {
    // As Rust has no native support for .env files,
    // we use the dotenv_flow crate to import to actual ENV vars.
    dotenv_flow::dotenv_flow().ok()
}

/// Resolves the settings from, lowest priority first: built-in defaults, the
/// YAML file, `OSG_*` environment variables and finally the command line.
/// Call [`load_dotenv`] first for `.env` files to count as environment.
///
/// An explicitly requested config file must exist, the default `config.yaml`
/// is picked up only when present.
pub fn load_config(config_file: Option<&Path>, overrides: &Overrides) -> Result<Settings, ConfigError> {
    let (path, required) = match config_file {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    ensure!(!required || path.exists(), ConfigFileNotFoundSnafu { path: path.clone() });

    build_settings(&path, required, overrides)
}

fn build_settings(path: &Path, required: bool, overrides: &Overrides) -> Result<Settings, ConfigError> {
    let path_display = path.display().to_string();

    let config = Config::builder()
        .set_default("gettererurl", "http://127.0.0.1:54038").context(BuildSnafu)?
        .set_default("statustoken", "").context(BuildSnafu)?
        .set_default("ttl", 10).context(BuildSnafu)?
        .set_default("padding", 2).context(BuildSnafu)?
        .set_default("loglevel", "warn").context(BuildSnafu)?
        .set_default("sentrydsn", "").context(BuildSnafu)?
        .add_source(File::new(&path_display, FileFormat::Yaml).required(required))
        .add_source(Environment::default()
            .prefix(ENV_PREFIX)
            .prefix_separator("_")
            .try_parsing(true))
        .set_override_option("gettererurl", overrides.getterer_url.clone()).context(BuildSnafu)?
        .set_override_option("statustoken", overrides.status_token.clone()).context(BuildSnafu)?
        .set_override_option("ttl", config_int("ttl", overrides.ttl)?).context(BuildSnafu)?
        .set_override_option("padding", config_int("padding", overrides.padding)?).context(BuildSnafu)?
        .set_override_option("loglevel", overrides.log_level.clone()).context(BuildSnafu)?
        .build()
        .context(ReadSnafu { path: path_display.clone() })?;

    let settings: Settings = config.try_deserialize().context(ReadSnafu { path: path_display })?;
    validate(&settings)?;
    Ok(settings)
}

// The config crate stores integers as i64.
fn config_int<T>(key: &str, value: Option<T>) -> Result<Option<i64>, ConfigError>
where
    T: Copy + Display,
    i64: TryFrom<T>,
{
    value
        .map(|v| i64::try_from(v).ok().context(OutOfRangeSnafu { key, value: v.to_string() }))
        .transpose()
}

fn validate(settings: &Settings) -> Result<(), ConfigError> {
    ensure!(settings.ttl > 0, InvalidTtlSnafu);
    Url::parse(&settings.getterer_url).context(InvalidUrlSnafu { url: settings.getterer_url.clone() })?;
    settings.log_level_filter()?;
    Ok(())
}

impl Settings {
    pub fn log_level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level).ok().context(InvalidLogLevelSnafu { level: self.log_level.clone() })
    }
}

/// The effective configuration as sorted `(key, value)` pairs, with the status
/// token masked.
pub fn config_lines(settings: &Settings) -> Vec<(String, String)> {
    let mut shown = settings.clone();
    if !shown.status_token.is_empty() {
        shown.status_token = "********".to_string();
    }

    // serde_json's map is ordered by key.
    let value = serde_json::to_value(&shown).unwrap_or_default();
    value
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .map(|(key, value)| {
                    let value = match value {
                        serde_json::Value::String(s) => s.clone(),
                        serde_json::Value::Null => String::new(),
                        other => other.to_string(),
                    };
                    (key.clone(), value)
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn display_config(settings: &Settings) {
    for (key, value) in config_lines(settings) {
        println!("CONFIG: {} : {}", key, value);
    }
}

// ////// //
// Errors //
// ////// //

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("Config file not found: {}", path.display()))]
    ConfigFileNotFound { path: PathBuf },

    #[snafu(display("Could not set up configuration sources"))]
    Build { source: config::ConfigError },

    #[snafu(display("Config file {path} was found but could not be read"))]
    Read { path: String, source: config::ConfigError },

    #[snafu(display("{key} value {value} is too large"))]
    OutOfRange { key: String, value: String },

    #[snafu(display("ttl must be at least 1 second"))]
    InvalidTtl,

    #[snafu(display("loglevel '{level}' is not one of off/error/warn/info/debug/trace"))]
    InvalidLogLevel { level: String },

    #[snafu(display("gettererurl '{url}' is not a valid URL"))]
    InvalidUrl { url: String, source: url::ParseError },
}
