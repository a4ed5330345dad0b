//! Deserializable logging configuration.
//!
//! ```toml
//! path = "/var/log/gateway/app.log"
//! max_bytes = 52428800   # 50 MiB; 0 disables rotation
//! backup_count = 10      # 0 keeps no backups
//! console = true
//! ```

use {
    crate::{
        builder::LogSinkBuilder,
        error::SinkError,
        rotation::{LogSink, RotationPolicy, DEFAULT_BACKUP_COUNT, DEFAULT_MAX_BYTES},
    },
    serde::Deserialize,
    std::path::PathBuf,
};

/// Where and how a service writes its log lines.
///
/// Size and retention are signed so that a negative value in a config file
/// surfaces as [`SinkError::InvalidConfig`] instead of a parse failure deep
/// inside the deserializer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Active log file. Without one, logging is console-only.
    pub path: Option<PathBuf>,
    /// Size threshold in bytes (default: 100 MiB, `0` disables rotation).
    pub max_bytes: Option<i64>,
    /// Number of backups to keep (default: 5).
    pub backup_count: Option<i64>,
    /// Mirror every line to stdout (default: true).
    pub console: bool,
    /// Unix mode for created log files, e.g. `0o640`.
    pub file_mode: Option<u32>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_bytes: None,
            backup_count: None,
            console: true,
            file_mode: None,
        }
    }
}

impl LogConfig {
    pub fn with_file<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Resolve defaults and reject values that are negative or do not fit
    /// the platform's integer width.
    pub fn validate(&self) -> Result<RotationPolicy, SinkError> {
        let max_bytes = match self.max_bytes {
            None => DEFAULT_MAX_BYTES,
            Some(value) => in_range("max_bytes", value)?,
        };
        let backup_count = match self.backup_count {
            None => DEFAULT_BACKUP_COUNT,
            Some(value) => in_range("backup_count", value)?,
        };
        Ok(RotationPolicy {
            max_bytes,
            backup_count,
        })
    }

    /// Open the configured file sink, or `Ok(None)` when no path is set.
    pub fn build_sink(&self) -> Result<Option<LogSink>, SinkError> {
        let policy = self.validate()?;
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let mut builder = LogSinkBuilder::new(path)
            .max_bytes(policy.max_bytes)
            .backup_count(policy.backup_count);
        if let Some(mode) = self.file_mode {
            builder = builder.file_mode(mode);
        }
        builder.build().map(Some)
    }
}

fn in_range<T: TryFrom<i64>>(field: &'static str, value: i64) -> Result<T, SinkError> {
    T::try_from(value).map_err(|_| SinkError::InvalidConfig { field, value })
}
