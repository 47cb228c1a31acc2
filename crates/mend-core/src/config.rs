//! Environment-style configuration.
//!
//! Every knob has a prefixed `MEND_*` variable and a sensible default;
//! the CLI can override the per-run knobs on top.

use crate::error::ConfigError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Normal polling interval between cycles.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Short backoff applied after a coordinator-level failure.
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(5 * 60);

/// Cap on remediation attempts per cycle.
pub const DEFAULT_MAX_FIXES: usize = 10;

/// Success-rate threshold below which a well-sampled pattern stops
/// retrying.
pub const DEFAULT_RETRY_THRESHOLD: f64 = 0.3;

/// Delay between tracker API calls.
pub const DEFAULT_TRACKER_CALL_DELAY: Duration = Duration::from_secs(2);

/// Credentials and target repository for the issue tracker.
#[derive(Debug, Clone)]
pub struct GithubSettings {
    pub token: String,
    /// `owner/repo`.
    pub repo: String,
}

/// Full loop configuration.
#[derive(Debug, Clone)]
pub struct MendConfig {
    pub interval: Duration,
    pub error_backoff: Duration,
    pub max_fixes: usize,
    pub retry_threshold: f64,
    /// Level 1/2/3 enable switches; Level 3 defaults to off.
    pub levels_enabled: [bool; 3],
    pub attempt_timeout: Duration,
    pub escalation_base_delay: Duration,
    pub safe_mode: bool,
    pub dry_run: bool,
    pub ledger_path: PathBuf,
    pub report_dir: Option<PathBuf>,
    pub log_dir: PathBuf,
    /// Absent when credentials are unset; issue sync becomes a no-op.
    pub github: Option<GithubSettings>,
    pub tracker_call_delay: Duration,
}

impl Default for MendConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            error_backoff: DEFAULT_ERROR_BACKOFF,
            max_fixes: DEFAULT_MAX_FIXES,
            retry_threshold: DEFAULT_RETRY_THRESHOLD,
            levels_enabled: [true, true, false],
            attempt_timeout: Duration::from_secs(120),
            escalation_base_delay: Duration::from_secs(5),
            safe_mode: false,
            dry_run: false,
            ledger_path: PathBuf::from("mend-ledger.json"),
            report_dir: Some(PathBuf::from("mend-reports")),
            log_dir: PathBuf::from("logs"),
            github: None,
            tracker_call_delay: DEFAULT_TRACKER_CALL_DELAY,
        }
    }
}

impl MendConfig {
    /// Load configuration from the environment on top of defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(secs) = env_u64("MEND_INTERVAL_SECS")? {
            cfg.interval = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("MEND_ERROR_BACKOFF_SECS")? {
            cfg.error_backoff = Duration::from_secs(secs);
        }
        if let Some(n) = env_u64("MEND_MAX_FIXES")? {
            cfg.max_fixes = n as usize;
        }
        if let Some(threshold) = env_f64("MEND_RETRY_THRESHOLD")? {
            cfg.retry_threshold = threshold;
        }
        if let Some(enabled) = env_bool("MEND_LEVEL1_ENABLED")? {
            cfg.levels_enabled[0] = enabled;
        }
        if let Some(enabled) = env_bool("MEND_LEVEL2_ENABLED")? {
            cfg.levels_enabled[1] = enabled;
        }
        if let Some(enabled) = env_bool("MEND_LEVEL3_ENABLED")? {
            cfg.levels_enabled[2] = enabled;
        }
        if let Some(secs) = env_u64("MEND_ATTEMPT_TIMEOUT_SECS")? {
            cfg.attempt_timeout = Duration::from_secs(secs);
        }
        if let Some(engaged) = env_bool("MEND_SAFE_MODE")? {
            cfg.safe_mode = engaged;
        }
        if let Some(dry) = env_bool("MEND_DRY_RUN")? {
            cfg.dry_run = dry;
        }
        if let Ok(path) = env::var("MEND_LEDGER_PATH") {
            cfg.ledger_path = PathBuf::from(path);
        }
        if let Ok(dir) = env::var("MEND_REPORT_DIR") {
            cfg.report_dir = if dir.is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }
        if let Ok(dir) = env::var("MEND_LOG_DIR") {
            cfg.log_dir = PathBuf::from(dir);
        }

        cfg.github = match (env::var("MEND_GITHUB_TOKEN"), env::var("MEND_GITHUB_REPO")) {
            (Ok(token), Ok(repo)) if !token.is_empty() && !repo.is_empty() => {
                Some(GithubSettings { token, repo })
            }
            _ => None,
        };

        Ok(cfg)
    }
}

fn env_u64(key: &'static str) -> Result<Option<u64>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(None),
    }
}

fn env_f64(key: &'static str) -> Result<Option<f64>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(None),
    }
}

fn env_bool(key: &'static str) -> Result<Option<bool>, ConfigError> {
    match env::var(key) {
        Ok(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::Invalid { key, value }),
        },
        Err(_) => Ok(None),
    }
}
