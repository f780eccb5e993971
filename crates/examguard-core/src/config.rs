//! Monitor configuration.
//!
//! Configuration is fixed for the lifetime of a session. It is loaded from a
//! TOML file (every key optional, falling back to the defaults below) and
//! validated before a session starts.
//!
//! ```toml
//! exam_duration_secs = 2700
//! max_warnings = 3
//! detection_poll_interval_ms = 500
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default exam length (45 minutes).
pub const DEFAULT_EXAM_DURATION_SECS: u64 = 45 * 60;

/// Default number of counting violations that terminate the session.
pub const DEFAULT_MAX_WARNINGS: u32 = 3;

/// Default presence detector poll period.
pub const DEFAULT_DETECTION_POLL_INTERVAL_MS: u64 = 500;

/// Default delay before the corrective fullscreen request.
pub const DEFAULT_FULLSCREEN_REENTRY_DELAY_MS: u64 = 100;

/// Default number of violations shown in the live status view.
pub const DEFAULT_RECENT_VIOLATIONS_LIMIT: usize = 5;

/// Default number of questions on the answer sheet.
pub const DEFAULT_TOTAL_QUESTIONS: usize = 50;

/// Default broadcast buffer for notifications.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 64;

/// Minimum presence poll period.
pub const MIN_DETECTION_POLL_INTERVAL_MS: u64 = 50;

/// Maximum presence poll period.
pub const MAX_DETECTION_POLL_INTERVAL_MS: u64 = 60_000;

/// Maximum fullscreen re-entry delay.
pub const MAX_FULLSCREEN_REENTRY_DELAY_MS: u64 = 10_000;

/// Maximum number of questions on the answer sheet.
pub const MAX_TOTAL_QUESTIONS: usize = 10_000;

/// Maximum broadcast buffer for notifications.
pub const MAX_NOTIFICATION_CAPACITY: usize = 65_536;

/// Configuration for one monitored exam session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    /// Countdown start value in seconds.
    #[serde(default = "default_exam_duration_secs")]
    pub exam_duration_secs: u64,

    /// Counting violations that terminate the session.
    #[serde(default = "default_max_warnings")]
    pub max_warnings: u32,

    /// Presence detector poll period in milliseconds.
    #[serde(default = "default_detection_poll_interval_ms")]
    pub detection_poll_interval_ms: u64,

    /// Consecutive violating detector results required before a presence
    /// violation is recorded. `1` records on every violating poll.
    #[serde(default = "default_min_consecutive_misses")]
    pub min_consecutive_misses: u32,

    /// Delay before requesting fullscreen re-entry after an exit.
    #[serde(default = "default_fullscreen_reentry_delay_ms")]
    pub fullscreen_reentry_delay_ms: u64,

    /// Number of violations included in the status view.
    #[serde(default = "default_recent_violations_limit")]
    pub recent_violations_limit: usize,

    /// Number of questions on the answer sheet.
    #[serde(default = "default_total_questions")]
    pub total_questions: usize,

    /// Broadcast buffer for notifications.
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,
}

const fn default_exam_duration_secs() -> u64 {
    DEFAULT_EXAM_DURATION_SECS
}

const fn default_max_warnings() -> u32 {
    DEFAULT_MAX_WARNINGS
}

const fn default_detection_poll_interval_ms() -> u64 {
    DEFAULT_DETECTION_POLL_INTERVAL_MS
}

const fn default_min_consecutive_misses() -> u32 {
    1
}

const fn default_fullscreen_reentry_delay_ms() -> u64 {
    DEFAULT_FULLSCREEN_REENTRY_DELAY_MS
}

const fn default_recent_violations_limit() -> usize {
    DEFAULT_RECENT_VIOLATIONS_LIMIT
}

const fn default_total_questions() -> usize {
    DEFAULT_TOTAL_QUESTIONS
}

const fn default_notification_capacity() -> usize {
    DEFAULT_NOTIFICATION_CAPACITY
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            exam_duration_secs: DEFAULT_EXAM_DURATION_SECS,
            max_warnings: DEFAULT_MAX_WARNINGS,
            detection_poll_interval_ms: DEFAULT_DETECTION_POLL_INTERVAL_MS,
            min_consecutive_misses: default_min_consecutive_misses(),
            fullscreen_reentry_delay_ms: DEFAULT_FULLSCREEN_REENTRY_DELAY_MS,
            recent_violations_limit: DEFAULT_RECENT_VIOLATIONS_LIMIT,
            total_questions: DEFAULT_TOTAL_QUESTIONS,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails
    /// validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid, contains unknown keys, or
    /// fails validation.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exam_duration_secs == 0 {
            return Err(ConfigError::Validation(
                "exam_duration_secs must be positive".to_string(),
            ));
        }
        if self.max_warnings == 0 {
            return Err(ConfigError::Validation(
                "max_warnings must be at least 1".to_string(),
            ));
        }
        if !(MIN_DETECTION_POLL_INTERVAL_MS..=MAX_DETECTION_POLL_INTERVAL_MS)
            .contains(&self.detection_poll_interval_ms)
        {
            return Err(ConfigError::Validation(format!(
                "detection_poll_interval_ms must be within \
                 [{MIN_DETECTION_POLL_INTERVAL_MS}, {MAX_DETECTION_POLL_INTERVAL_MS}], got {}",
                self.detection_poll_interval_ms
            )));
        }
        if self.min_consecutive_misses == 0 {
            return Err(ConfigError::Validation(
                "min_consecutive_misses must be at least 1".to_string(),
            ));
        }
        if self.fullscreen_reentry_delay_ms > MAX_FULLSCREEN_REENTRY_DELAY_MS {
            return Err(ConfigError::Validation(format!(
                "fullscreen_reentry_delay_ms exceeds {MAX_FULLSCREEN_REENTRY_DELAY_MS}: {}",
                self.fullscreen_reentry_delay_ms
            )));
        }
        if !(1..=MAX_TOTAL_QUESTIONS).contains(&self.total_questions) {
            return Err(ConfigError::Validation(format!(
                "total_questions must be within [1, {MAX_TOTAL_QUESTIONS}], got {}",
                self.total_questions
            )));
        }
        if !(1..=MAX_NOTIFICATION_CAPACITY).contains(&self.notification_capacity) {
            return Err(ConfigError::Validation(format!(
                "notification_capacity must be within [1, {MAX_NOTIFICATION_CAPACITY}], got {}",
                self.notification_capacity
            )));
        }
        Ok(())
    }

    /// Presence poll period as a [`Duration`].
    #[must_use]
    pub const fn detection_poll_interval(&self) -> Duration {
        Duration::from_millis(self.detection_poll_interval_ms)
    }

    /// Fullscreen re-entry delay as a [`Duration`].
    #[must_use]
    pub const fn fullscreen_reentry_delay(&self) -> Duration {
        Duration::from_millis(self.fullscreen_reentry_delay_ms)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading configuration file.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Validation error.
    #[error("configuration validation failed: {0}")]
    Validation(String),
}
