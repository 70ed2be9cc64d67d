#![doc = "Tracing subscriber configuration shared by the wallet manager crates."]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod config;
pub use config::{FileLogConfig, LogConfig, LogRotation, StdoutLogConfig};

mod tracing;
pub use tracing::{LogFormat, init_test_tracing};
