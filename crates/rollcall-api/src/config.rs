//! Server configuration read from the environment.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;

use rollcall_core::defaults::{
    CHARTS_FILE, INGEST_CUTOFF, REFRESH_MIN_INTERVAL_SECS, SERVER_HOST, SERVER_PORT,
    SOURCE_TIMEOUT_SECS,
};
use rollcall_core::RecordSource;
use rollcall_store::{CalendarExportSource, HttpRecordSource, IngestOptions, JsonFileRecordSource};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "No record source configured: set RECORD_SOURCE_URL, RECORD_SOURCE_FILE, \
         or CALENDAR_EVENTS_FILE and CALENDAR_REGISTRATIONS_FILE"
    )]
    MissingSource,

    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },

    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Where workshop records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    /// JSON list of records served over HTTP.
    Http { url: String },
    /// JSON list of records on disk.
    File { path: PathBuf },
    /// Raw calendar export, assembled at fetch time.
    Calendar {
        events: PathBuf,
        registrations: PathBuf,
    },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub source: SourceConfig,
    pub charts_file: PathBuf,
    pub refresh_min_interval: Duration,
    pub source_timeout_secs: u64,
    pub ingest_cutoff: NaiveDate,
    pub allowed_origins: Vec<String>,
}

impl ApiConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let source = if let Some(url) = get("RECORD_SOURCE_URL") {
            SourceConfig::Http { url }
        } else if let Some(path) = get("RECORD_SOURCE_FILE") {
            SourceConfig::File { path: path.into() }
        } else {
            match (
                get("CALENDAR_EVENTS_FILE"),
                get("CALENDAR_REGISTRATIONS_FILE"),
            ) {
                (Some(events), Some(registrations)) => SourceConfig::Calendar {
                    events: events.into(),
                    registrations: registrations.into(),
                },
                _ => return Err(ConfigError::MissingSource),
            }
        };

        let ingest_cutoff = get("INGEST_CUTOFF").unwrap_or_else(|| INGEST_CUTOFF.to_string());
        let ingest_cutoff = NaiveDate::parse_from_str(ingest_cutoff.trim(), "%Y-%m-%d")
            .map_err(|_| ConfigError::InvalidValue {
                var: "INGEST_CUTOFF",
                value: ingest_cutoff,
            })?;

        let allowed_origins = get("ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_else(|| vec!["http://localhost:3000".to_string()]);

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| SERVER_HOST.to_string()),
            port: parse_or("PORT", get("PORT"), SERVER_PORT)?,
            source,
            charts_file: get("CHARTS_FILE")
                .unwrap_or_else(|| CHARTS_FILE.to_string())
                .into(),
            refresh_min_interval: Duration::from_secs(parse_or(
                "REFRESH_MIN_INTERVAL_SECS",
                get("REFRESH_MIN_INTERVAL_SECS"),
                REFRESH_MIN_INTERVAL_SECS,
            )?),
            source_timeout_secs: parse_or(
                "RECORD_SOURCE_TIMEOUT_SECS",
                get("RECORD_SOURCE_TIMEOUT_SECS"),
                SOURCE_TIMEOUT_SECS,
            )?,
            ingest_cutoff,
            allowed_origins,
        })
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::Validation("PORT must be non-zero".to_string()));
        }

        if self.source_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "RECORD_SOURCE_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        if let SourceConfig::Http { url } = &self.source {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Validation(format!(
                    "RECORD_SOURCE_URL must start with http:// or https://, got: {}",
                    url
                )));
            }
        }

        Ok(())
    }

    /// Build the configured record source.
    pub fn record_source(&self) -> rollcall_core::Result<Arc<dyn RecordSource>> {
        let source: Arc<dyn RecordSource> = match &self.source {
            SourceConfig::Http { url } => {
                Arc::new(HttpRecordSource::new(url.clone(), self.source_timeout_secs)?)
            }
            SourceConfig::File { path } => Arc::new(JsonFileRecordSource::new(path.clone())),
            SourceConfig::Calendar {
                events,
                registrations,
            } => Arc::new(
                CalendarExportSource::new(events.clone(), registrations.clone()).with_options(
                    IngestOptions {
                        cutoff: self.ingest_cutoff,
                        ..IngestOptions::default()
                    },
                ),
            ),
        };
        Ok(source)
    }
}

fn parse_or<T: std::str::FromStr>(
    var: &'static str,
    value: Option<String>,
    default: T,
) -> ConfigResult<T> {
    match value {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
    }
}
