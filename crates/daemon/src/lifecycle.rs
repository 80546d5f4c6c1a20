// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: bootstrap and orderly shutdown.
//!
//! Bootstrap order matters: the profile lock is taken first so a losing
//! second daemon cannot disturb the running one's socket, then the
//! stale socket (if any) is replaced, the machines are spawned, and the
//! listener starts accepting. Shutdown walks the same ground backwards:
//! cancel and join every machine, stop the listener, remove the socket
//! and the lock file.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use resmon_core::Profile;
use resmon_engine::{AlertSink, MachineDeps, ResourceMachine};

use crate::dispatch::Dispatcher;
use crate::listener::Listener;

/// Written to the log file before tracing starts; `SHOW_RESOURCE` uses
/// the last marker of the live pid as its session boundary.
pub const STARTUP_MARKER_PREFIX: &str = "--- resmond: starting (pid: ";

/// Full startup marker line for a pid.
pub fn startup_marker(pid: u32) -> String {
    format!("{STARTUP_MARKER_PREFIX}{pid}) ---")
}

/// Append the startup marker to the log file, creating it if needed.
pub fn write_startup_marker(log_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    writeln!(file, "{}", startup_marker(std::process::id()))?;
    Ok(())
}

/// Fatal errors before the daemon is up.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("'{0}' exists and is not a directory")]
    AdminDirObstructed(PathBuf),

    #[error("unable to create administration directory '{0}': {1}")]
    CreateAdminDir(PathBuf, #[source] std::io::Error),

    #[error("unable to open profile lock '{0}': {1}")]
    OpenLock(PathBuf, #[source] std::io::Error),

    #[error("process for profile '{0}' is already running")]
    AlreadyRunning(String),

    #[error("unable to bind socket to '{0}': {1}")]
    Bind(PathBuf, #[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A running daemon: its machines, listener task, and held lock.
pub struct Daemon {
    profile_name: String,
    lock_path: PathBuf,
    socket_path: PathBuf,
    // NOTE(lifetime): held to keep the exclusive flock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    machines: Arc<Vec<ResourceMachine>>,
    listener_task: JoinHandle<()>,
    shutdown: CancellationToken,
}

/// Bring the daemon up for `profile` under `admin_dir`.
pub async fn bootstrap(
    profile: &Profile,
    admin_dir: &Path,
    alert: Arc<dyn AlertSink>,
) -> Result<Daemon, BootstrapError> {
    // 1. Administration directory
    if admin_dir.exists() && !admin_dir.is_dir() {
        return Err(BootstrapError::AdminDirObstructed(admin_dir.to_path_buf()));
    }
    std::fs::create_dir_all(admin_dir)
        .map_err(|err| BootstrapError::CreateAdminDir(admin_dir.to_path_buf(), err))?;

    // 2. Profile lock FIRST - prevents races with a second daemon.
    // Open without truncating so a losing contender does not wipe the
    // running daemon's pid.
    let lock_path = resmon_core::lock_path(admin_dir, &profile.name);
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|err| BootstrapError::OpenLock(lock_path.clone(), err))?;
    lock_file
        .try_lock_exclusive()
        .map_err(|_| BootstrapError::AlreadyRunning(profile.name.clone()))?;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Replace a stale socket and bind.
    let socket_path = resmon_core::socket_path(admin_dir, &profile.name);
    if socket_path.exists() {
        std::fs::remove_file(&socket_path)?;
    }
    let socket = UnixListener::bind(&socket_path)
        .map_err(|err| BootstrapError::Bind(socket_path.clone(), err))?;
    info!(
        "[{}] socket server is bound to {}",
        profile.name,
        socket_path.display()
    );

    // 4. One machine per resource; each probes its status immediately.
    let machines: Arc<Vec<ResourceMachine>> = Arc::new(
        profile
            .resources
            .iter()
            .map(|cfg| {
                ResourceMachine::spawn(
                    &profile.name,
                    cfg.clone(),
                    MachineDeps {
                        work_dir: admin_dir.to_path_buf(),
                        alert: Arc::clone(&alert),
                    },
                )
            })
            .collect(),
    );

    // 5. Control socket listener.
    let shutdown = CancellationToken::new();
    let dispatcher = Arc::new(Dispatcher::new(
        profile.name.clone(),
        profile.log_file.clone(),
        Arc::clone(&machines),
    ));
    let listener_task = tokio::spawn(Listener::new(socket, dispatcher, shutdown.clone()).run());

    info!("[{}] daemon is ready", profile.name);
    Ok(Daemon {
        profile_name: profile.name.clone(),
        lock_path,
        socket_path,
        lock_file,
        machines,
        listener_task,
        shutdown,
    })
}

impl Daemon {
    pub fn machines(&self) -> &Arc<Vec<ResourceMachine>> {
        &self.machines
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Cancel every worker, join them, stop the listener, and remove the
    /// per-profile artifacts.
    pub async fn shutdown(self) {
        debug!("[{}:*] start to terminate everything", self.profile_name);
        for machine in self.machines.iter() {
            machine.cancel();
        }
        for machine in self.machines.iter() {
            machine.join().await;
        }
        self.shutdown.cancel();
        let _ = self.listener_task.await;

        if let Err(err) = std::fs::remove_file(&self.socket_path) {
            warn!("failed to remove socket file: {}", err);
        }
        if let Err(err) = std::fs::remove_file(&self.lock_path) {
            warn!("failed to remove lock file: {}", err);
        }
        info!("[{}:*] daemon terminated", self.profile_name);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
