use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TqsError};
use crate::task::TaskPattern;

/// Upper bound on `group_count * group_size`; every lane is an OS thread.
pub const MAX_LANES: usize = 16_384;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_opt(key).and_then(|v| v.parse().ok())
}

/// Run configuration, typically parsed from TOML and overridden by `TQS_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of execution groups. 0 = available parallelism.
    #[serde(default = "default_group_count")]
    pub group_count: usize,
    /// Lanes per group; also the output tile size.
    #[serde(default = "default_group_size")]
    pub group_size: usize,
    /// Inner iterations of every HEAVY task.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Tasks drained per scheduling run.
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
    /// Size of the whole task pool; drained in `queue_size` windows.
    #[serde(default = "default_total_tasks")]
    pub total_tasks: usize,
    /// HEAVY/LIGHT mix of the generated pool.
    #[serde(default)]
    pub pattern: TaskPattern,
}

fn default_group_count() -> usize { 0 }
fn default_group_size() -> usize { 32 }
fn default_iterations() -> u32 { 16 }
fn default_queue_size() -> usize { 320 }
fn default_total_tasks() -> usize { 1600 }

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            group_count: default_group_count(),
            group_size: default_group_size(),
            iterations: default_iterations(),
            queue_size: default_queue_size(),
            total_tasks: default_total_tasks(),
            pattern: TaskPattern::default(),
        }
    }
}

impl RunConfig {
    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Defaults overridden by the environment (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `TQS_*` environment overrides. Unset or unparsable values keep
    /// the current setting.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_parse("TQS_GROUP_COUNT") {
            self.group_count = v;
        }
        if let Some(v) = env_parse("TQS_GROUP_SIZE") {
            self.group_size = v;
        }
        if let Some(v) = env_parse("TQS_ITERATIONS") {
            self.iterations = v;
        }
        if let Some(v) = env_parse("TQS_QUEUE_SIZE") {
            self.queue_size = v;
        }
        if let Some(v) = env_parse("TQS_TOTAL_TASKS") {
            self.total_tasks = v;
        }
        if let Some(v) = env_parse("TQS_PATTERN") {
            self.pattern = v;
        }
        self
    }

    /// Resolve group count (0 means use available parallelism).
    pub fn resolved_group_count(&self) -> usize {
        if self.group_count == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.group_count
        }
    }

    pub fn lanes(&self) -> usize {
        self.resolved_group_count().saturating_mul(self.group_size)
    }

    pub fn validate(&self) -> Result<()> {
        if self.group_size == 0 {
            return Err(TqsError::InvalidConfig("group_size must be at least 1".into()));
        }
        if self.total_tasks > 0 && self.queue_size == 0 {
            return Err(TqsError::InvalidConfig(
                "queue_size must be at least 1 when tasks are queued".into(),
            ));
        }
        if self.total_tasks > u32::MAX as usize {
            return Err(TqsError::InvalidConfig(format!(
                "total_tasks {} exceeds the task id space",
                self.total_tasks
            )));
        }
        let lanes = self.lanes();
        if lanes > MAX_LANES {
            return Err(TqsError::InvalidConfig(format!(
                "{} lanes requested, limit is {}",
                lanes, MAX_LANES
            )));
        }
        Ok(())
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Run config:");
        tracing::info!(
            "  groups:      {} x {} lanes",
            self.resolved_group_count(),
            self.group_size
        );
        tracing::info!("  tasks:       {} total, {} per run", self.total_tasks, self.queue_size);
        tracing::info!("  workload:    pattern={}, iterations={}", self.pattern, self.iterations);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RunConfig::default();
        assert_eq!(config.group_count, 0);
        assert_eq!(config.group_size, 32);
        assert_eq!(config.iterations, 16);
        assert_eq!(config.queue_size, 320);
        assert_eq!(config.total_tasks, 1600);
        assert_eq!(config.pattern, TaskPattern::Alternating);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn resolved_group_count() {
        let mut config = RunConfig::default();
        // 0 means auto-detect
        assert!(config.resolved_group_count() > 0);

        config.group_count = 8;
        assert_eq!(config.resolved_group_count(), 8);
        assert_eq!(config.lanes(), 8 * 32);
    }

    #[test]
    fn parse_partial_toml() {
        let config = RunConfig::from_toml_str(
            r#"
            group_count = 4
            iterations = 1000
            pattern = "all_light"
            "#,
        )
        .unwrap();
        assert_eq!(config.group_count, 4);
        assert_eq!(config.iterations, 1000);
        assert_eq!(config.pattern, TaskPattern::AllLight);
        assert_eq!(config.group_size, 32);
    }

    #[test]
    fn parse_heavy_every_toml() {
        let config = RunConfig::from_toml_str("pattern = { heavy_every = 3 }").unwrap();
        assert_eq!(config.pattern, TaskPattern::HeavyEvery(3));
    }

    #[test]
    fn from_env_reads_overrides() {
        // Only test in this crate that touches TQS_* variables.
        std::env::set_var("TQS_QUEUE_SIZE", "64");
        std::env::set_var("TQS_PATTERN", TaskPattern::HeavyEvery(7).to_string());
        let config = RunConfig::from_env();
        std::env::remove_var("TQS_QUEUE_SIZE");
        std::env::remove_var("TQS_PATTERN");

        assert_eq!(config.queue_size, 64);
        assert_eq!(config.pattern, TaskPattern::HeavyEvery(7));
        assert_eq!(config.group_size, 32);
    }

    #[test]
    fn parse_rejects_bad_toml() {
        assert!(matches!(
            RunConfig::from_toml_str("group_size = \"wide\""),
            Err(TqsError::ConfigParse(_))
        ));
    }

    #[test]
    fn validate_rejects_bad_shapes() {
        let mut config = RunConfig { group_count: 2, ..RunConfig::default() };
        config.group_size = 0;
        assert!(config.validate().is_err());

        let config = RunConfig { group_count: 2, queue_size: 0, ..RunConfig::default() };
        assert!(config.validate().is_err());

        let config = RunConfig {
            group_count: 2,
            queue_size: 0,
            total_tasks: 0,
            ..RunConfig::default()
        };
        assert!(config.validate().is_ok());

        let config = RunConfig {
            group_count: MAX_LANES,
            group_size: 2,
            ..RunConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
