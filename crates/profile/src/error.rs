// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration errors, all fatal at load time.

use thiserror::Error;

/// Errors from loading a profile file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{file}:{line}: {message}")]
    Syntax {
        file: String,
        line: usize,
        message: String,
    },

    #[error("in [General] section, {0}")]
    General(String),

    #[error("{file}:{line}: in this resource, {message}")]
    Resource {
        file: String,
        line: usize,
        message: String,
    },

    #[error("multiple resource '{0}' defined")]
    DuplicateResource(String),

    #[error("failed to open '{file}': {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub(crate) fn syntax(file: &str, line: usize, message: impl Into<String>) -> Self {
        ConfigError::Syntax {
            file: file.to_string(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn resource(file: &str, line: usize, message: impl Into<String>) -> Self {
        ConfigError::Resource {
            file: file.to_string(),
            line,
            message: message.into(),
        }
    }
}
