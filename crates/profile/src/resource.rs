// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `[Resource]` section accumulation and completion.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use resmon_core::{is_valid_ident, Action, ResourceConfig, ThresholdWindow};

use crate::error::ConfigError;
use crate::general::General;

const DEFAULT_RESOURCE_DIR: &str = "/etc/resmon/resource";

/// Accumulates raw `[Resource]` keys, case-insensitively, validating
/// each value as it arrives. Defaults and cross-key validation happen
/// in [`ResourceSection::complete`].
pub(crate) struct ResourceSection {
    file: String,
    start_line: usize,
    seen: HashSet<String>,
    name: Option<String>,
    path: Option<PathBuf>,
    auto_start: Option<bool>,
    monitor: Option<bool>,
    action: Option<Action>,
    threshold_times: Option<ThresholdWindow>,
    // Durations in whole seconds, as written.
    secs: Vec<(&'static str, u64)>,
    counts: Vec<(&'static str, u64)>,
}

/// Duration keys that accept zero.
const INT_KEYS: [&str; 5] = [
    "startdelay",
    "startretryinterval",
    "monitordelay",
    "monitorinterval",
    "monitortimes",
];

/// Keys that must be strictly positive.
const POSITIVE_INT_KEYS: [&str; 9] = [
    "startretrytimes",
    "monitortimeout",
    "recovertimeout",
    "recoverretrytimes",
    "recoverretryinterval",
    "starttimeout",
    "stoptimeout",
    "restarttimeout",
    "statustimeout",
];

impl ResourceSection {
    pub(crate) fn new(file: &str, start_line: usize) -> Self {
        Self {
            file: file.to_string(),
            start_line,
            seen: HashSet::new(),
            name: None,
            path: None,
            auto_start: None,
            monitor: None,
            action: None,
            threshold_times: None,
            secs: Vec::new(),
            counts: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, line: usize, key: &str, value: &str) -> Result<(), ConfigError> {
        let bad_value = || {
            ConfigError::syntax(
                &self.file,
                line,
                format!("'{value}' is not valid for '{key}'"),
            )
        };

        let lower = key.to_ascii_lowercase();
        if !self.seen.insert(lower.clone()) {
            return Err(ConfigError::syntax(
                &self.file,
                line,
                format!("'{key}' is already specified"),
            ));
        }

        if let Some(&canonical) = INT_KEYS.iter().find(|k| **k == lower) {
            let n = value.parse::<u64>().map_err(|_| bad_value())?;
            self.secs.push((canonical, n));
            return Ok(());
        }
        if let Some(&canonical) = POSITIVE_INT_KEYS.iter().find(|k| **k == lower) {
            let n = value.parse::<u64>().map_err(|_| bad_value())?;
            if n == 0 {
                return Err(bad_value());
            }
            self.counts.push((canonical, n));
            return Ok(());
        }

        match lower.as_str() {
            "monitorthreshold" => {
                let n = value.parse::<u64>().map_err(|_| bad_value())?;
                if !(1..=100).contains(&n) {
                    return Err(bad_value());
                }
                self.counts.push(("monitorthreshold", n));
            }
            "monitordefault" => {
                let n = value.parse::<u64>().map_err(|_| bad_value())?;
                if n > 100 {
                    return Err(bad_value());
                }
                self.counts.push(("monitordefault", n));
            }
            "name" => {
                if !is_valid_ident(value) {
                    return Err(ConfigError::syntax(
                        &self.file,
                        line,
                        format!("'{value}' is not a valid name"),
                    ));
                }
                self.name = Some(value.to_string());
            }
            "autostart" | "monitor" => {
                let flag = match value.to_ascii_lowercase().as_str() {
                    "yes" => true,
                    "no" => false,
                    _ => return Err(bad_value()),
                };
                if lower == "autostart" {
                    self.auto_start = Some(flag);
                } else {
                    self.monitor = Some(flag);
                }
            }
            "path" => {
                // Existence and permission checks are left to complete().
                self.path = Some(PathBuf::from(value));
            }
            "action" => {
                self.action = Some(value.parse::<Action>().map_err(|()| bad_value())?);
            }
            "monitorthresholdtimes" => {
                self.threshold_times = Some(parse_threshold_times(value).ok_or_else(bad_value)?);
            }
            _ => {
                return Err(ConfigError::syntax(
                    &self.file,
                    line,
                    format!("'{key}' is not a valid key"),
                ));
            }
        }
        Ok(())
    }

    /// Apply defaults, derive dependent values, and validate.
    pub(crate) fn complete(self, general: &General) -> Result<ResourceConfig, ConfigError> {
        let fail = |message: String| ConfigError::resource(&self.file, self.start_line, message);

        let Some(name) = self.name else {
            return Err(fail("'Name' must be specified".to_string()));
        };

        let secs = |key: &str| self.secs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);
        let count = |key: &str| self.counts.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);
        let timeout = |key: &str| {
            count(key)
                .map(Duration::from_secs)
                .unwrap_or(general.default_timeout)
        };

        let monitor = self.monitor.unwrap_or(false);
        let monitor_interval_secs = secs("monitorinterval");
        if monitor && monitor_interval_secs.is_none() {
            return Err(fail("'MonitorInterval' must be specified".to_string()));
        }

        let start_timeout = timeout("starttimeout");
        let stop_timeout = timeout("stoptimeout");
        let monitor_timeout = timeout("monitortimeout");
        let recover_timeout = timeout("recovertimeout");
        let monitor_interval = Duration::from_secs(monitor_interval_secs.unwrap_or(0));

        let path = self
            .path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESOURCE_DIR).join(&name));
        validate_executable(&path).map_err(|message| fail(message))?;

        let recover_retry_interval = count("recoverretryinterval")
            .map(Duration::from_secs)
            .unwrap_or(recover_timeout);
        if recover_retry_interval < recover_timeout {
            return Err(fail(
                "'RecoverRetryInterval' must not be less than 'RecoverTimeout'".to_string(),
            ));
        }
        if monitor && monitor_interval < monitor_timeout {
            return Err(fail(
                "'MonitorInterval' must not be less than 'MonitorTimeout'".to_string(),
            ));
        }

        Ok(ResourceConfig {
            auto_start: self.auto_start.unwrap_or(false),
            monitor,
            start_delay: Duration::from_secs(secs("startdelay").unwrap_or(0)),
            monitor_delay: secs("monitordelay")
                .map(Duration::from_secs)
                .unwrap_or(monitor_interval),
            start_timeout,
            stop_timeout,
            status_timeout: timeout("statustimeout"),
            monitor_timeout,
            recover_timeout,
            restart_timeout: count("restarttimeout")
                .map(Duration::from_secs)
                .unwrap_or(start_timeout + stop_timeout),
            start_retry_times: count("startretrytimes").unwrap_or(1) as u32,
            recover_retry_times: count("recoverretrytimes").unwrap_or(1) as u32,
            start_retry_interval: secs("startretryinterval")
                .map(Duration::from_secs)
                .unwrap_or(start_timeout),
            recover_retry_interval,
            monitor_interval,
            monitor_times: secs("monitortimes").unwrap_or(9999),
            monitor_threshold: count("monitorthreshold").unwrap_or(50) as u32,
            monitor_threshold_times: self.threshold_times.unwrap_or_default(),
            monitor_default: count("monitordefault").unwrap_or(0) as u32,
            action: self.action.unwrap_or_default(),
            name,
            path,
        })
    }
}

/// `MonitorThresholdTimes` accepts `N` (window of N, all must hit) or
/// `MIN,MAX`.
fn parse_threshold_times(value: &str) -> Option<ThresholdWindow> {
    let parts: Vec<&str> = value.split(',').collect();
    let numbers: Vec<u32> = parts
        .iter()
        .map(|p| p.parse::<u32>().ok().filter(|n| *n > 0))
        .collect::<Option<Vec<_>>>()?;
    let (min, max) = match numbers.as_slice() {
        [n] => (*n, *n),
        [min, max] => (*min, *max),
        _ => return None,
    };
    (max >= min).then_some(ThresholdWindow { min, max })
}

fn validate_executable(path: &std::path::Path) -> Result<(), String> {
    use std::os::unix::fs::PermissionsExt;

    let Ok(meta) = path.metadata() else {
        return Err(format!("path '{}' is not existent", path.display()));
    };
    if !meta.is_file() {
        return Err(format!("path '{}' is not a file", path.display()));
    }
    if meta.permissions().mode() & 0o111 == 0 {
        return Err(format!("file '{}' is not executable", path.display()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
