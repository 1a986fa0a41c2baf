//! Engine configuration

use std::time::Duration;

/// Configuration for the orchestration engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long completed results stay valid in the cache
    pub cache_ttl: Duration,

    /// Upper bound on one full analysis request; when exceeded the
    /// orchestrator cancels outstanding tasks and emits a terminal error
    pub request_timeout: Duration,

    /// Upper bound on a single research task
    pub task_timeout: Duration,

    /// Capacity of the per-request event channel
    pub event_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(30 * 60),
            request_timeout: Duration::from_secs(240),
            task_timeout: Duration::from_secs(200),
            event_buffer: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.cache_ttl, Duration::from_secs(1800));
        assert!(config.task_timeout < config.request_timeout);
    }
}
