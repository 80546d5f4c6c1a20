// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validated configuration model.
//!
//! A [`Profile`] is produced by the `resmon-profile` loader and is
//! immutable afterwards. [`ResourceConfig::new`] applies the same static
//! defaults the loader uses, so tests and callers can build a config and
//! override only what they care about.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Fallback for every per-verb timeout the config file leaves unset.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// `MonitorTimes` value meaning "probe forever".
pub const MONITOR_TIMES_UNBOUNDED_SENTINEL: u64 = 9999;

/// Response dispatched when the monitor window triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// Log and keep monitoring as if nothing happened.
    None,
    /// Run the `recover` verb with retries.
    Recover,
    /// Call the alert sink and mark the resource failed.
    #[default]
    Alert,
}

impl FromStr for Action {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Action::None),
            "recover" => Ok(Action::Recover),
            "alert" => Ok(Action::Alert),
            _ => Err(()),
        }
    }
}

/// Log verbosity from the `[General]` section, 0 (fatal) to 3 (debug).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Fatal,
    #[default]
    Error,
    Info,
    Debug,
}

impl LogLevel {
    pub fn from_number(n: u32) -> Option<Self> {
        match n {
            0 => Some(LogLevel::Fatal),
            1 => Some(LogLevel::Error),
            2 => Some(LogLevel::Info),
            3 => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// Directive for the tracing `EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Fatal | LogLevel::Error => "error",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

/// Sliding window over monitor probe outcomes.
///
/// History retains the last `max` outcomes; the action fires once at
/// least `min` of them are hits. Invariant: `1 <= min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdWindow {
    pub min: u32,
    pub max: u32,
}

impl Default for ThresholdWindow {
    fn default() -> Self {
        Self { min: 1, max: 1 }
    }
}

/// Immutable per-resource configuration.
#[derive(Debug, Clone)]
pub struct ResourceConfig {
    /// Unique within the profile.
    pub name: String,
    /// Executable invoked as `<path> <verb>`.
    pub path: PathBuf,
    /// On first probe = stopped, auto-start instead of remaining stopped.
    pub auto_start: bool,
    /// Probe periodically after start.
    pub monitor: bool,
    pub start_delay: Duration,
    pub monitor_delay: Duration,
    pub start_timeout: Duration,
    pub stop_timeout: Duration,
    pub status_timeout: Duration,
    pub monitor_timeout: Duration,
    pub recover_timeout: Duration,
    pub restart_timeout: Duration,
    /// Max start attempts including the first.
    pub start_retry_times: u32,
    /// Max recover attempts including the first.
    pub recover_retry_times: u32,
    /// Min gap between start attempts, measured from attempt start.
    pub start_retry_interval: Duration,
    /// Min gap between recover attempts, measured from attempt start.
    pub recover_retry_interval: Duration,
    /// Gap between monitor probes; must be >= `monitor_timeout`.
    pub monitor_interval: Duration,
    /// Max number of probes; the sentinel 9999 means unbounded.
    pub monitor_times: u64,
    /// A probe value >= this counts as a hit, range 1..=100.
    pub monitor_threshold: u32,
    pub monitor_threshold_times: ThresholdWindow,
    /// Substituted probe value when the probe itself fails, range 0..=100.
    pub monitor_default: u32,
    pub action: Action,
}

impl ResourceConfig {
    /// Build a config with the loader's static defaults applied.
    ///
    /// `monitor_interval` and `monitor_delay` default to zero; the loader
    /// requires `MonitorInterval` whenever `Monitor=yes`.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            auto_start: false,
            monitor: false,
            start_delay: Duration::ZERO,
            monitor_delay: Duration::ZERO,
            start_timeout: DEFAULT_TIMEOUT,
            stop_timeout: DEFAULT_TIMEOUT,
            status_timeout: DEFAULT_TIMEOUT,
            monitor_timeout: DEFAULT_TIMEOUT,
            recover_timeout: DEFAULT_TIMEOUT,
            restart_timeout: DEFAULT_TIMEOUT.saturating_mul(2),
            start_retry_times: 1,
            recover_retry_times: 1,
            start_retry_interval: DEFAULT_TIMEOUT,
            recover_retry_interval: DEFAULT_TIMEOUT,
            monitor_interval: Duration::ZERO,
            monitor_times: MONITOR_TIMES_UNBOUNDED_SENTINEL,
            monitor_threshold: 50,
            monitor_threshold_times: ThresholdWindow::default(),
            monitor_default: 0,
            action: Action::Alert,
        }
    }

    /// Number of probes the monitor state performs, with the unbounded
    /// sentinel mapped to an effectively infinite count.
    pub fn effective_monitor_times(&self) -> u64 {
        if self.monitor_times == MONITOR_TIMES_UNBOUNDED_SENTINEL {
            u64::MAX
        } else {
            self.monitor_times
        }
    }
}

/// A named bundle of resources supervised by one daemon process.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub log_file: PathBuf,
    pub log_level: LogLevel,
    pub resources: Vec<ResourceConfig>,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
