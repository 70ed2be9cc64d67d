//! [tracing_subscriber] utilities.

use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    prelude::__tracing_subscriber_SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

use serde::{Deserialize, Serialize};

use crate::{FileLogConfig, LogConfig, LogRotation};

/// The file name prefix of rolling log files.
const LOG_FILE_PREFIX: &str = "ewm.log";

/// The format of the logs.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Full format (default).
    #[default]
    Full,
    /// JSON format.
    Json,
    /// Pretty format.
    Pretty,
    /// Compact format.
    Compact,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

impl LogFormat {
    fn layer(self) -> BoxedLayer {
        match self {
            Self::Full => tracing_subscriber::fmt::layer().boxed(),
            Self::Json => tracing_subscriber::fmt::layer().json().boxed(),
            Self::Pretty => tracing_subscriber::fmt::layer().pretty().boxed(),
            Self::Compact => tracing_subscriber::fmt::layer().compact().boxed(),
        }
    }

    fn file_layer(self, appender: RollingFileAppender) -> BoxedLayer {
        match self {
            Self::Full => tracing_subscriber::fmt::layer().with_writer(appender).boxed(),
            Self::Json => tracing_subscriber::fmt::layer().json().with_writer(appender).boxed(),
            Self::Pretty => {
                tracing_subscriber::fmt::layer().pretty().with_writer(appender).boxed()
            }
            Self::Compact => {
                tracing_subscriber::fmt::layer().compact().with_writer(appender).boxed()
            }
        }
    }
}

impl FileLogConfig {
    fn appender(&self) -> RollingFileAppender {
        let directory_path = self.directory_path.clone();
        match self.rotation {
            LogRotation::Minutely => rolling::minutely(directory_path, LOG_FILE_PREFIX),
            LogRotation::Hourly => rolling::hourly(directory_path, LOG_FILE_PREFIX),
            LogRotation::Daily => rolling::daily(directory_path, LOG_FILE_PREFIX),
            LogRotation::Never => rolling::never(directory_path, LOG_FILE_PREFIX),
        }
    }
}

impl LogConfig {
    /// Initializes the global tracing subscriber.
    ///
    /// The `global_level` is added as a directive on top of `env_filter`, which defaults to the
    /// `RUST_LOG` environment variable.
    ///
    /// Fails if a global subscriber is already installed.
    pub fn init_tracing_subscriber(
        &self,
        env_filter: Option<EnvFilter>,
    ) -> Result<(), TryInitError> {
        let file_layer =
            self.file_logs.as_ref().map(|logs| logs.format.file_layer(logs.appender()));
        let stdout_layer = self.stdout_logs.as_ref().map(|logs| logs.format.layer());
        let layers: Vec<BoxedLayer> = file_layer.into_iter().chain(stdout_layer).collect();

        let env_filter = env_filter
            .unwrap_or_else(EnvFilter::from_default_env)
            .add_directive(self.global_level.into());

        tracing_subscriber::registry().with(layers).with(env_filter).try_init()?;

        Ok(())
    }
}

/// Installs the default [LogConfig] subscriber for tests, ignoring an already installed one.
pub fn init_test_tracing() {
    let _ = LogConfig::default().init_tracing_subscriber(None::<EnvFilter>);
}
