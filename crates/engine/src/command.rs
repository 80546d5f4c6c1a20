// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded, cancellable invocations of a resource script.
//!
//! A [`Command`] represents one invocation capability for a machine
//! state: it owns the message file handed to the script via
//! `RESMOND_MESSAGE_FILE`, shares the machine's command gate (at most
//! one invocation is in flight per resource), and observes the owning
//! state's cancellation token. Every run is capped by a wall-clock
//! timeout; timeout and cancellation both kill the child's entire
//! process group.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::kill::kill_process_group;

/// Always present in a script's environment.
pub const ENV_MESSAGE_FILE: &str = "RESMOND_MESSAGE_FILE";

/// Present during `monitor` runs; the script writes its value here.
pub const ENV_MONITOR_VALUE_FILE: &str = "RESMOND_MONITOR_VALUE_FILE";

/// Exit code reported when the command could not be issued at all.
pub const COMMAND_NOT_ISSUED: i32 = 1;

/// Terminal signal raised when a run is cancelled from outside.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("'{verb}' command is cancelled")]
    Cancelled { verb: String },
}

/// One invocation capability, bound to a machine state.
pub struct Command {
    script: PathBuf,
    ident: String,
    gate: Arc<Mutex<()>>,
    token: CancellationToken,
    message_file: NamedTempFile,
}

impl Command {
    /// Create a command for `script`, writing its message file into
    /// `work_dir`. The file is deleted when the command is dropped.
    pub fn new(
        script: PathBuf,
        ident: String,
        gate: Arc<Mutex<()>>,
        token: CancellationToken,
        work_dir: &Path,
    ) -> std::io::Result<Self> {
        let message_file = tempfile::Builder::new()
            .prefix("msg-")
            .suffix(".tmp")
            .tempfile_in(work_dir)?;
        Ok(Self {
            script,
            ident,
            gate,
            token,
            message_file,
        })
    }

    /// Run `<script> <verb>` and return its exit code.
    ///
    /// Holds the machine's command gate for the whole run. The child is
    /// spawned as a process group leader; on timeout the group is killed
    /// and the (non-zero) exit code of the killed child is returned. On
    /// cancellation the group is killed and [`CommandError::Cancelled`]
    /// propagates so the owning state posts no further transitions.
    pub async fn run(
        &mut self,
        verb: &str,
        timeout: Duration,
        extra_env: &[(&str, &Path)],
    ) -> Result<i32, CommandError> {
        let _guard = tokio::select! {
            guard = self.gate.lock() => guard,
            _ = self.token.cancelled() => return Err(self.cancelled(verb)),
        };
        if self.token.is_cancelled() {
            return Err(self.cancelled(verb));
        }

        debug!("[{}] execute '{}' command", self.ident, verb);
        let mut invocation = tokio::process::Command::new(&self.script);
        invocation
            .arg(verb)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env(ENV_MESSAGE_FILE, self.message_file.path())
            .process_group(0);
        for (key, value) in extra_env {
            invocation.env(key, value);
        }

        let started = Instant::now();
        let mut child = match invocation.spawn() {
            Ok(child) => child,
            Err(err) => {
                error!("[{}] failed to issue '{}' command: {}", self.ident, verb, err);
                return Ok(COMMAND_NOT_ISSUED);
            }
        };
        let pid = child.id();

        let waited = tokio::select! {
            _ = self.token.cancelled() => None,
            result = tokio::time::timeout(timeout, child.wait()) => Some(result),
        };

        let status = match waited {
            None => {
                debug!("[{}] kill pending '{}' command", self.ident, verb);
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                let _ = child.wait().await;
                return Err(self.cancelled(verb));
            }
            Some(Ok(Ok(status))) => status,
            Some(Ok(Err(err))) => {
                error!("[{}] failed to wait on '{}' command: {}", self.ident, verb, err);
                return Ok(COMMAND_NOT_ISSUED);
            }
            Some(Err(_elapsed)) => {
                error!(
                    "[{}] '{}' command timeout ({}s), forcibly kill it",
                    self.ident,
                    verb,
                    timeout.as_secs_f64()
                );
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                match child.wait().await {
                    Ok(status) => status,
                    Err(err) => {
                        error!(
                            "[{}] failed to reap timed out '{}' command: {}",
                            self.ident, verb, err
                        );
                        return Ok(COMMAND_NOT_ISSUED);
                    }
                }
            }
        };

        if self.token.is_cancelled() {
            return Err(self.cancelled(verb));
        }

        let code = exit_code(status);
        debug!(
            "[{}] '{}' command returns {}; spent {:.3}s",
            self.ident,
            verb,
            code,
            started.elapsed().as_secs_f64()
        );
        self.drain_message_file();
        Ok(code)
    }

    fn cancelled(&self, verb: &str) -> CommandError {
        debug!("[{}] '{}' command is cancelled", self.ident, verb);
        CommandError::Cancelled {
            verb: verb.to_string(),
        }
    }

    /// Log whatever the script wrote to the message file, then truncate
    /// it so the next run starts clean.
    fn drain_message_file(&self) {
        let path = self.message_file.path();
        if let Ok(message) = std::fs::read_to_string(path) {
            let message = message.trim();
            if !message.is_empty() {
                debug!("[{}] returned message: {}", self.ident, message);
                let _ = std::fs::File::create(path);
            }
        }
    }
}

/// Exit code of a finished child; signal death maps to the negated
/// signal number, which is non-zero like a failure.
fn exit_code(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.code().unwrap_or_else(|| -status.signal().unwrap_or(1))
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
