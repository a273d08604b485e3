//! Process-level settings read from the environment.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `FATHOM_RETRY_COUNT` | `3` | Retries after the first attempt |
//! | `FATHOM_WAIT_AFTER_FAIL` | `0.3` | Seconds between attempts |
//! | `FATHOM_DEMO_MODE` | off | Highlight elements as they are used |
//! | `FATHOM_SCREENSHOTS_DIR` | `target/fathom/screenshots` | Screenshot output |
//! | `FATHOM_HIGHLIGHT_MS` | `2000` | Highlight duration in demo mode |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::result::{FathomError, FathomResult};

/// Retry count environment variable
pub const RETRY_COUNT_VAR: &str = "FATHOM_RETRY_COUNT";
/// Inter-attempt delay environment variable (seconds)
pub const WAIT_AFTER_FAIL_VAR: &str = "FATHOM_WAIT_AFTER_FAIL";
/// Demo mode environment variable
pub const DEMO_MODE_VAR: &str = "FATHOM_DEMO_MODE";
/// Screenshot directory environment variable
pub const SCREENSHOTS_DIR_VAR: &str = "FATHOM_SCREENSHOTS_DIR";
/// Highlight duration environment variable (milliseconds)
pub const HIGHLIGHT_MS_VAR: &str = "FATHOM_HIGHLIGHT_MS";

/// Default retries after the first attempt
pub const DEFAULT_RETRY_COUNT: usize = 3;
/// Default delay between attempts (300ms)
pub const DEFAULT_WAIT_AFTER_FAIL_MS: u64 = 300;
/// Default highlight duration (2 seconds)
pub const DEFAULT_HIGHLIGHT_MS: u64 = 2000;

/// Settings shared by a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Retries after the first attempt
    pub retry_count: usize,
    /// Delay between attempts
    pub wait_after_fail: Duration,
    /// Highlight elements as actions and assertions complete
    pub demo_mode: bool,
    /// Directory for element screenshots
    pub screenshots_dir: PathBuf,
    /// How long demo-mode highlights stay visible
    pub highlight_duration: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retry_count: DEFAULT_RETRY_COUNT,
            wait_after_fail: Duration::from_millis(DEFAULT_WAIT_AFTER_FAIL_MS),
            demo_mode: false,
            screenshots_dir: PathBuf::from("target/fathom/screenshots"),
            highlight_duration: Duration::from_millis(DEFAULT_HIGHLIGHT_MS),
        }
    }
}

impl Settings {
    /// Create default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the retry count
    #[must_use]
    pub const fn with_retry_count(mut self, retry_count: usize) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Set the delay between attempts
    #[must_use]
    pub const fn with_wait_after_fail(mut self, wait: Duration) -> Self {
        self.wait_after_fail = wait;
        self
    }

    /// Enable or disable demo mode
    #[must_use]
    pub const fn with_demo_mode(mut self, enabled: bool) -> Self {
        self.demo_mode = enabled;
        self
    }

    /// Set the screenshot directory
    #[must_use]
    pub fn with_screenshots_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshots_dir = dir.into();
        self
    }

    /// Set the highlight duration
    #[must_use]
    pub const fn with_highlight_duration(mut self, duration: Duration) -> Self {
        self.highlight_duration = duration;
        self
    }

    /// Read settings from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`FathomError::Config`] if a variable is set but unparsable
    pub fn from_env() -> FathomResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings from the environment, falling back to defaults on error
    #[must_use]
    pub fn from_env_or_default() -> Self {
        Self::from_env().unwrap_or_else(|err| {
            warn!("ignoring invalid environment settings: {err}");
            Self::default()
        })
    }

    /// Read settings through an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Returns [`FathomError::Config`] if a value is present but unparsable
    pub fn from_lookup<F>(lookup: F) -> FathomResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        if let Some(raw) = lookup(RETRY_COUNT_VAR) {
            settings.retry_count = parse(RETRY_COUNT_VAR, &raw)?;
        }
        if let Some(raw) = lookup(WAIT_AFTER_FAIL_VAR) {
            let seconds: f64 = parse(WAIT_AFTER_FAIL_VAR, &raw)?;
            settings.wait_after_fail = Duration::try_from_secs_f64(seconds)
                .map_err(|e| FathomError::config(WAIT_AFTER_FAIL_VAR, e.to_string()))?;
        }
        if let Some(raw) = lookup(DEMO_MODE_VAR) {
            settings.demo_mode = parse_flag(DEMO_MODE_VAR, &raw)?;
        }
        if let Some(raw) = lookup(SCREENSHOTS_DIR_VAR) {
            if !raw.trim().is_empty() {
                settings.screenshots_dir = PathBuf::from(raw.trim());
            }
        }
        if let Some(raw) = lookup(HIGHLIGHT_MS_VAR) {
            settings.highlight_duration = Duration::from_millis(parse(HIGHLIGHT_MS_VAR, &raw)?);
        }
        Ok(settings)
    }

    /// Parse settings from a JSON document; missing fields keep defaults
    ///
    /// # Errors
    ///
    /// Returns [`FathomError::Json`] if the document is malformed
    pub fn from_json(json: &str) -> FathomResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn parse<T>(key: &str, raw: &str) -> FathomResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| FathomError::config(key, format!("{raw:?}: {e}")))
}

fn parse_flag(key: &str, raw: &str) -> FathomResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(FathomError::config(key, format!("{raw:?} is not a flag"))),
    }
}
