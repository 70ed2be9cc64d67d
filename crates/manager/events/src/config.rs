//! Configuration of the event queues.

use serde::{Deserialize, Serialize};

/// What a queue does with already queued events when it is shut down.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownPolicy {
    /// Dispatch every event queued before the shutdown, then stop.
    #[default]
    Drain,
    /// Stop after the in-flight dispatch and drop the rest.
    Abandon,
}

/// Configuration shared by the listener and main queues.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventCoreConfig {
    /// The shutdown behaviour of both queues.
    pub shutdown: ShutdownPolicy,
    /// Whether dispatch metrics are described and zeroed on startup.
    pub metrics_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: EventCoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EventCoreConfig::default());
        assert_eq!(config.shutdown, ShutdownPolicy::Drain);
        assert!(!config.metrics_enabled);
    }

    #[test]
    fn test_deserialize() {
        let config: EventCoreConfig =
            serde_json::from_str(r#"{ "shutdown": "abandon", "metrics_enabled": true }"#).unwrap();
        assert_eq!(
            config,
            EventCoreConfig { shutdown: ShutdownPolicy::Abandon, metrics_enabled: true }
        );
    }
}
