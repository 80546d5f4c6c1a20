// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `[General]` section accumulation and completion.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use resmon_core::{is_valid_ident, LogLevel};
use tracing::warn;

use crate::error::ConfigError;

const DEFAULT_LOG: &str = "/var/log/resmon.log";
const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Error;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Completed `[General]` section.
pub(crate) struct General {
    pub profile: String,
    pub log_file: PathBuf,
    pub log_level: LogLevel,
    pub default_timeout: Duration,
}

/// Accumulates raw `[General]` keys, case-insensitively.
pub(crate) struct GeneralSection {
    file: String,
    values: HashMap<String, String>,
}

impl GeneralSection {
    pub(crate) fn new(file: &str) -> Self {
        Self {
            file: file.to_string(),
            values: HashMap::new(),
        }
    }

    pub(crate) fn add(&mut self, line: usize, key: &str, value: &str) -> Result<(), ConfigError> {
        let lower = key.to_ascii_lowercase();
        if self.values.contains_key(&lower) {
            return Err(ConfigError::syntax(
                &self.file,
                line,
                format!("'{key}' is already specified"),
            ));
        }
        match lower.as_str() {
            "profile" => {
                if !is_valid_ident(value) {
                    return Err(ConfigError::syntax(
                        &self.file,
                        line,
                        format!("'{value}' is not a valid profile name"),
                    ));
                }
            }
            "logfile" => {} // path validation left to complete()
            "loglevel" => {
                if value.parse::<u32>().ok().and_then(LogLevel::from_number).is_none() {
                    return Err(ConfigError::syntax(
                        &self.file,
                        line,
                        format!("'{value}' is not valid for '{key}'"),
                    ));
                }
            }
            "defaulttimeout" => {
                if !value.parse::<u64>().map(|n| n > 0).unwrap_or(false) {
                    return Err(ConfigError::syntax(
                        &self.file,
                        line,
                        format!("'{value}' is not valid for '{key}'"),
                    ));
                }
            }
            _ => {
                return Err(ConfigError::syntax(
                    &self.file,
                    line,
                    format!("'{key}' is not a valid key"),
                ));
            }
        }
        self.values.insert(lower, value.to_string());
        Ok(())
    }

    /// Apply defaults and validate the log file path.
    pub(crate) fn complete(self, file_stem: &str) -> Result<General, ConfigError> {
        let profile = match self.values.get("profile") {
            Some(name) => name.clone(),
            None => {
                if !is_valid_ident(file_stem) {
                    return Err(ConfigError::General(
                        "'Profile' is not specified while the config filename \
                         could not be a legal profile name"
                            .to_string(),
                    ));
                }
                warn!(profile = %file_stem, "'Profile' is not specified, defaulting to filename");
                file_stem.to_string()
            }
        };

        let log_file = PathBuf::from(
            self.values
                .get("logfile")
                .map(String::as_str)
                .unwrap_or(DEFAULT_LOG),
        );
        if log_file.is_dir() {
            return Err(ConfigError::General(format!(
                "'{}' cannot be a directory",
                log_file.display()
            )));
        }

        // Values were range-checked in add(); re-parse cannot fail.
        let log_level = self
            .values
            .get("loglevel")
            .and_then(|v| v.parse::<u32>().ok())
            .and_then(LogLevel::from_number)
            .unwrap_or(DEFAULT_LOG_LEVEL);
        let default_timeout = self
            .values
            .get("defaulttimeout")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Ok(General {
            profile,
            log_file,
            log_level,
            default_timeout,
        })
    }
}
