//! Logging configuration.

use crate::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// The global logging configuration.
///
/// Stdout and file output are configured independently; either may be disabled by leaving it
/// unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// The maximum level emitted by any output.
    #[serde(with = "level_filter")]
    pub global_level: LevelFilter,
    /// Stdout output, if enabled.
    pub stdout_logs: Option<StdoutLogConfig>,
    /// Rolling file output, if enabled.
    pub file_logs: Option<FileLogConfig>,
}

impl LogConfig {
    /// Creates a [LogConfig] logging to stdout at the level matching `verbosity`.
    ///
    /// `0` disables logging; `1` through `5` map to `ERROR` through `TRACE`.
    pub fn from_verbosity(verbosity: u8) -> Self {
        let global_level = match verbosity {
            0 => LevelFilter::OFF,
            1 => LevelFilter::ERROR,
            2 => LevelFilter::WARN,
            3 => LevelFilter::INFO,
            4 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        };
        Self { global_level, ..Default::default() }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global_level: LevelFilter::INFO,
            stdout_logs: Some(StdoutLogConfig::default()),
            file_logs: None,
        }
    }
}

/// Stdout log output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdoutLogConfig {
    /// The line format.
    pub format: LogFormat,
}

/// Rolling file log output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLogConfig {
    /// The directory the log files are written to.
    pub directory_path: PathBuf,
    /// The line format.
    pub format: LogFormat,
    /// How often a new file is started.
    pub rotation: LogRotation,
}

/// The rotation interval of file logs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// A new file every minute.
    Minutely,
    /// A new file every hour.
    Hourly,
    /// A new file every day.
    #[default]
    Daily,
    /// A single file.
    Never,
}

mod level_filter {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use tracing_subscriber::filter::LevelFilter;

    pub(super) fn serialize<S: Serializer>(
        level: &LevelFilter,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(level)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<LevelFilter, D::Error> {
        let level = String::deserialize(deserializer)?;
        level.parse().map_err(D::Error::custom)
    }
}
