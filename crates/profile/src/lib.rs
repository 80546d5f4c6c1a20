// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! resmon-profile: configuration loader.
//!
//! Parses the case-insensitive INI-like profile file (a single
//! `[General]` section plus zero or more `[Resource]` sections) and
//! yields a validated [`Profile`]. All validation happens here; the
//! engine receives only well-formed configs.

mod error;
mod general;
mod resource;
mod scan;

pub use error::ConfigError;

use std::path::Path;

use resmon_core::Profile;
use tracing::warn;

use crate::general::GeneralSection;
use crate::resource::ResourceSection;
use crate::scan::{LineClassifier, Scanned};

/// Load and validate a profile file.
///
/// Fails on the first error, reporting file and line. When `Profile` is
/// not given in `[General]`, the file stem is used, provided it is a
/// legal identifier.
pub fn load(path: impl AsRef<Path>) -> Result<Profile, ConfigError> {
    let path = path.as_ref();
    let file = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        file: file.clone(),
        source,
    })?;

    let classifier = LineClassifier::new();
    let mut general: Option<GeneralSection> = None;
    let mut current: Option<ResourceSection> = None;
    let mut resources: Vec<ResourceSection> = Vec::new();

    for (i, raw) in content.lines().enumerate() {
        let line = i + 1;
        match classifier.classify(raw) {
            Ok(Scanned::Blank) => {}
            Ok(Scanned::Section(name)) => {
                if name.eq_ignore_ascii_case("general") {
                    if let Some(res) = current.take() {
                        resources.push(res);
                    }
                    if general.is_some() {
                        return Err(ConfigError::syntax(
                            &file,
                            line,
                            "[General] section is already defined",
                        ));
                    }
                    general = Some(GeneralSection::new(&file));
                } else if name.eq_ignore_ascii_case("resource") {
                    if let Some(res) = current.take() {
                        resources.push(res);
                    }
                    current = Some(ResourceSection::new(&file, line));
                } else {
                    return Err(ConfigError::syntax(
                        &file,
                        line,
                        format!("illegal section [{name}]"),
                    ));
                }
            }
            Ok(Scanned::KeyValue { key, value }) => {
                if let Some(res) = current.as_mut() {
                    res.add(line, key, value)?;
                } else if let Some(gen) = general.as_mut() {
                    gen.add(line, key, value)?;
                } else {
                    return Err(ConfigError::syntax(
                        &file,
                        line,
                        "expect [General] or [Resource]",
                    ));
                }
            }
            Err(message) => return Err(ConfigError::syntax(&file, line, message)),
        }
    }
    if let Some(res) = current.take() {
        resources.push(res);
    }

    let Some(general) = general else {
        return Err(ConfigError::General(
            "[General] section is not defined".to_string(),
        ));
    };

    let file_stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let general = general.complete(file_stem)?;

    let mut configs = Vec::with_capacity(resources.len());
    let mut names: Vec<String> = Vec::new();
    for res in resources {
        let cfg = res.complete(&general)?;
        if names.iter().any(|n| n == &cfg.name) {
            return Err(ConfigError::DuplicateResource(cfg.name));
        }
        names.push(cfg.name.clone());
        configs.push(cfg);
    }

    if configs.is_empty() {
        warn!(profile = %general.profile, "no resource specified in profile");
    }

    Ok(Profile {
        name: general.profile,
        log_file: general.log_file,
        log_level: general.log_level,
        resources: configs,
    })
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
