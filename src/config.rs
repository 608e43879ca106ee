//! Application-level configuration loading, including judge and timer settings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CODE_CLASH_BACK_CONFIG_PATH";
/// Default timeout applied to every judge round trip.
const DEFAULT_JUDGE_TIMEOUT_SECS: u64 = 10;
/// Default delay between the end of a match and report generation.
const DEFAULT_REPORT_DELAY_SECS: u64 = 60;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Judge connection settings.
    pub judge: JudgeConfig,
    /// Delay between the end-of-match broadcast and report generation.
    pub report_delay: Duration,
    /// "Time left" offsets, in seconds, at which clients are notified during a
    /// match. Only offsets strictly smaller than the match duration are armed.
    pub milestones_secs: Vec<u64>,
    /// Capacity of each per-room SSE broadcast channel.
    pub sse_capacity: usize,
    /// Optional JSON file used to seed the in-memory problem bank.
    pub problem_bank_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
/// Settings for the external code-grading service.
pub struct JudgeConfig {
    /// Base URL of the judge HTTP API.
    pub base_url: String,
    /// Upper bound on a single judge round trip.
    pub timeout: Duration,
    /// When true, every grading request is answered locally with a canned
    /// all-pass verdict instead of contacting the judge. Operational fallback
    /// for environments without a sandbox; never enabled implicitly.
    pub offline: bool,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            judge: JudgeConfig {
                base_url: "http://localhost:2358".into(),
                timeout: Duration::from_secs(DEFAULT_JUDGE_TIMEOUT_SECS),
                offline: false,
            },
            report_delay: Duration::from_secs(DEFAULT_REPORT_DELAY_SECS),
            milestones_secs: default_milestones(),
            sse_capacity: 16,
            problem_bank_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    judge: Option<RawJudgeConfig>,
    #[serde(default)]
    report_delay_secs: Option<u64>,
    #[serde(default)]
    milestones_secs: Option<Vec<u64>>,
    #[serde(default)]
    sse_capacity: Option<usize>,
    #[serde(default)]
    problem_bank_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
/// JSON representation of the judge settings block.
struct RawJudgeConfig {
    base_url: String,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    offline: bool,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = Self::default();

        let judge = raw
            .judge
            .map(|judge| JudgeConfig {
                base_url: judge.base_url,
                timeout: judge
                    .timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.judge.timeout),
                offline: judge.offline,
            })
            .unwrap_or(defaults.judge);

        Self {
            judge,
            report_delay: raw
                .report_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.report_delay),
            milestones_secs: raw.milestones_secs.unwrap_or(defaults.milestones_secs),
            sse_capacity: raw.sse_capacity.unwrap_or(defaults.sse_capacity),
            problem_bank_path: raw.problem_bank_path,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in "time left" notification offsets, in seconds.
fn default_milestones() -> Vec<u64> {
    vec![3600, 1800, 600, 300, 60, 30, 10]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_config_fills_missing_fields_with_defaults() {
        let raw: RawConfig = serde_json::from_str(r#"{"report_delay_secs": 5}"#).unwrap();
        let config: AppConfig = raw.into();

        assert_eq!(config.report_delay, Duration::from_secs(5));
        assert_eq!(config.judge.timeout, Duration::from_secs(10));
        assert!(!config.judge.offline);
        assert_eq!(config.milestones_secs, default_milestones());
    }

    #[test]
    fn judge_block_overrides_defaults() {
        let raw: RawConfig = serde_json::from_str(
            r#"{"judge": {"base_url": "http://judge:9000", "timeout_secs": 3, "offline": true}}"#,
        )
        .unwrap();
        let config: AppConfig = raw.into();

        assert_eq!(config.judge.base_url, "http://judge:9000");
        assert_eq!(config.judge.timeout, Duration::from_secs(3));
        assert!(config.judge.offline);
    }
}
