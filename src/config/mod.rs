//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::cache::CacheConfig;
use crate::domain::keys::{DataType, SubjectKey};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "touchline";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_UPSTREAM_BASE_URL: &str = "https://v3.football.api-sports.io";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TIMEZONE: Tz = Tz::Asia__Seoul;

/// Command-line arguments for the Touchline binary.
#[derive(Debug, Parser)]
#[command(
    name = "touchline",
    version,
    about = "Read-through cache for third-party football data"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "TOUCHLINE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Apply pending database migrations.
    Migrate(MigrateArgs),
    /// Resolve one cache key through the read-through cache and print the payload.
    Get(GetArgs),
    /// Print the days of a month that have at least one tracked match.
    Month(MonthArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,
}

#[derive(Debug, Args, Default, Clone)]
pub struct LookupOverrides {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the upstream API key.
    #[arg(long = "api-key", env = "TOUCHLINE_API_KEY", value_name = "KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Override the upstream provider (apisports|rapidapi).
    #[arg(long = "api-provider", value_name = "PROVIDER")]
    pub api_provider: Option<String>,

    /// Override the upstream base URL.
    #[arg(long = "api-base-url", value_name = "URL")]
    pub api_base_url: Option<String>,

    /// Override the timezone used for seasons and day keys.
    #[arg(long = "timezone", value_name = "TZ")]
    pub timezone: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct GetArgs {
    #[command(flatten)]
    pub overrides: LookupOverrides,

    /// Subject as `kind:id`, e.g. `team:50`, `league:39` or `day:2025-03-01`.
    #[arg(value_name = "SUBJECT")]
    pub subject: SubjectKey,

    /// Payload kind, e.g. `transfers`, `standings` or `match_events`.
    #[arg(value_name = "DATA_TYPE")]
    pub data_type: DataType,

    /// Season year; omitted for season-agnostic payloads.
    #[arg(long, value_name = "YEAR")]
    pub season: Option<i32>,
}

#[derive(Debug, Args, Clone)]
pub struct MonthArgs {
    #[command(flatten)]
    pub overrides: LookupOverrides,

    #[arg(value_name = "YEAR")]
    pub year: i32,

    #[arg(value_name = "MONTH", value_parser = clap::value_parser!(u8).range(1..=12))]
    pub month: u8,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub upstream: UpstreamSettings,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// No URL means the cache lives in process memory only.
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub base_url: Url,
    pub api_key: String,
    pub provider: ApiProvider,
    pub timeout: Duration,
    pub timezone: Tz,
}

/// How the upstream API is reached and authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiProvider {
    /// Direct api-sports.io access with `x-apisports-key`.
    ApiSports,
    /// RapidAPI marketplace with `x-rapidapi-key` and `x-rapidapi-host`.
    RapidApi,
}

impl ApiProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ApiSports => "apisports",
            Self::RapidApi => "rapidapi",
        }
    }
}

impl FromStr for ApiProvider {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "apisports" => Ok(Self::ApiSports),
            "rapidapi" => Ok(Self::RapidApi),
            other => Err(format!(
                "unknown provider `{other}` (expected apisports or rapidapi)"
            )),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix("TOUCHLINE")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("cache.tracked_leagues"),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match &cli.command {
        Command::Migrate(args) => raw.apply_database_override(&args.database),
        Command::Get(args) => raw.apply_lookup_overrides(&args.overrides),
        Command::Month(args) => raw.apply_lookup_overrides(&args.overrides),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    upstream: RawUpstreamSettings,
    cache: CacheConfig,
}

impl RawSettings {
    fn apply_lookup_overrides(&mut self, overrides: &LookupOverrides) {
        self.apply_database_override(&overrides.database);

        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(key) = overrides.api_key.as_ref() {
            self.upstream.api_key = Some(key.clone());
        }
        if let Some(provider) = overrides.api_provider.as_ref() {
            self.upstream.provider = Some(provider.clone());
        }
        if let Some(base_url) = overrides.api_base_url.as_ref() {
            self.upstream.base_url = Some(base_url.clone());
        }
        if let Some(timezone) = overrides.timezone.as_ref() {
            self.upstream.timezone = Some(timezone.clone());
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            database,
            upstream,
            cache,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let database = build_database_settings(database)?;
        let upstream = build_upstream_settings(upstream)?;
        let cache = build_cache_settings(cache)?;

        Ok(Self {
            logging,
            database,
            upstream,
            cache,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = database.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_upstream_settings(upstream: RawUpstreamSettings) -> Result<UpstreamSettings, LoadError> {
    let base_url = upstream
        .base_url
        .as_deref()
        .unwrap_or(DEFAULT_UPSTREAM_BASE_URL);
    let base_url = Url::parse(base_url.trim())
        .map_err(|err| LoadError::invalid("upstream.base_url", format!("failed to parse: {err}")))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "upstream.base_url",
            "scheme must be http or https",
        ));
    }

    let provider = match upstream.provider {
        Some(provider) => ApiProvider::from_str(&provider)
            .map_err(|reason| LoadError::invalid("upstream.provider", reason))?,
        None => ApiProvider::ApiSports,
    };

    let timeout_secs = upstream
        .timeout_seconds
        .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "upstream.timeout_seconds",
            "must be greater than zero",
        ));
    }

    let timezone = match upstream.timezone {
        Some(name) => Tz::from_str(name.trim()).map_err(|err| {
            LoadError::invalid("upstream.timezone", format!("failed to parse: {err}"))
        })?,
        None => DEFAULT_TIMEZONE,
    };

    Ok(UpstreamSettings {
        base_url,
        api_key: upstream.api_key.unwrap_or_default().trim().to_string(),
        provider,
        timeout: Duration::from_secs(timeout_secs),
        timezone,
    })
}

fn build_cache_settings(cache: CacheConfig) -> Result<CacheConfig, LoadError> {
    if cache.batch_size == 0 {
        return Err(LoadError::invalid(
            "cache.batch_size",
            "must be greater than zero",
        ));
    }
    if cache.aggregate_ttl_secs == 0 {
        return Err(LoadError::invalid(
            "cache.aggregate_ttl_secs",
            "must be greater than zero",
        ));
    }
    Ok(cache)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUpstreamSettings {
    base_url: Option<String>,
    api_key: Option<String>,
    provider: Option<String>,
    timeout_seconds: Option<u64>,
    timezone: Option<String>,
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
