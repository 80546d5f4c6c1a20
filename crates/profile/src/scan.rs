// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-level classification of the profile file format.

use regex::Regex;

/// What a single input line turned out to be.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Scanned<'a> {
    /// Empty, whitespace-only, or a `;`/`#` comment.
    Blank,
    /// `[name]`
    Section(&'a str),
    /// `key=value` with no surrounding whitespace.
    KeyValue { key: &'a str, value: &'a str },
}

pub(crate) struct LineClassifier {
    section: Regex,
    equation: Regex,
    leading_space: Regex,
}

impl LineClassifier {
    // The patterns are literals; construction cannot fail.
    #[allow(clippy::unwrap_used)]
    pub(crate) fn new() -> Self {
        Self {
            section: Regex::new(r"^\[(.*)\]\s*$").unwrap(),
            equation: Regex::new(r"^([_a-zA-Z]\w*)=(\S*)\s*$").unwrap(),
            leading_space: Regex::new(r"^\s+\S").unwrap(),
        }
    }

    pub(crate) fn classify<'a>(&self, line: &'a str) -> Result<Scanned<'a>, String> {
        if line.is_empty()
            || line.starts_with(';')
            || line.starts_with('#')
            || line.chars().all(char::is_whitespace)
        {
            return Ok(Scanned::Blank);
        }
        if self.leading_space.is_match(line) {
            return Err("improper space in line".to_string());
        }
        if let Some(caps) = self.section.captures(line) {
            if let Some(name) = caps.get(1) {
                return Ok(Scanned::Section(name.as_str()));
            }
        }
        if let Some(caps) = self.equation.captures(line) {
            if let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) {
                return Ok(Scanned::KeyValue {
                    key: key.as_str(),
                    value: value.as_str(),
                });
            }
        }
        if line.contains('=') {
            Err("improper space in line".to_string())
        } else {
            Err("illegal format".to_string())
        }
    }
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
