// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-resource supervision worker.
//!
//! A [`ResourceMachine`] runs one worker task with a wake notifier and a
//! requested-state cell. Writing the cell and notifying queues a
//! transition; the worker leaves the previous state (cancelling its
//! timers and any in-flight command, then awaiting it) before entering
//! the next. Notifications coalesce: only the most recent requested
//! state at dequeue time is honored, which is harmless because the cell
//! is re-read on every iteration.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use resmon_core::{MachineState, ResourceConfig, ResourceState};

use crate::alert::AlertSink;
use crate::command::Command;
use crate::states::{self, StateTask};

/// Collaborators injected into every machine.
pub struct MachineDeps {
    /// Directory for message and monitor-value files.
    pub work_dir: PathBuf,
    /// Sink invoked when a monitor window triggers with `Action=alert`.
    pub alert: Arc<dyn AlertSink>,
}

/// State shared between the machine handle, its worker, and the state
/// tasks the worker spawns. State tasks hold an `Arc` of this, never the
/// machine itself.
pub(crate) struct Shared {
    pub(crate) cfg: ResourceConfig,
    /// Log identity, `profile:resource`.
    pub(crate) ident: String,
    pub(crate) work_dir: PathBuf,
    pub(crate) alert: Arc<dyn AlertSink>,
    /// Serializes command invocations for this resource.
    gate: Arc<tokio::sync::Mutex<()>>,
    requested: Mutex<MachineState>,
    res_state: Mutex<ResourceState>,
    wake: Notify,
}

impl Shared {
    /// Queue a transition. The worker picks up the latest requested
    /// state on its next iteration. `EXIT` is terminal: once requested,
    /// no later transition may supersede it, so cancel + join always
    /// terminates even while state tasks are still posting.
    pub(crate) fn request(&self, next: MachineState) {
        {
            let mut requested = self.requested.lock();
            if *requested == MachineState::Exit && next != MachineState::Exit {
                return;
            }
            *requested = next;
        }
        self.wake.notify_one();
    }

    pub(crate) fn requested(&self) -> MachineState {
        *self.requested.lock()
    }

    pub(crate) fn res_state(&self) -> ResourceState {
        *self.res_state.lock()
    }

    /// Every change to a distinct value emits one informational line.
    pub(crate) fn set_res_state(&self, next: ResourceState) {
        let mut current = self.res_state.lock();
        if *current != next {
            *current = next;
            drop(current);
            info!("[{}] resource is {}", self.ident, next);
        }
    }

    /// New command bound to the given state token.
    pub(crate) fn command(&self, token: &CancellationToken) -> std::io::Result<Command> {
        Command::new(
            self.cfg.path.clone(),
            self.ident.clone(),
            Arc::clone(&self.gate),
            token.clone(),
            &self.work_dir,
        )
    }
}

/// One supervised resource.
pub struct ResourceMachine {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ResourceMachine {
    /// Create the machine and spawn its worker, which immediately enters
    /// `BEGIN` to probe the resource's initial status.
    pub fn spawn(profile: &str, cfg: ResourceConfig, deps: MachineDeps) -> Self {
        let ident = format!("{}:{}", profile, cfg.name);
        let shared = Arc::new(Shared {
            cfg,
            ident,
            work_dir: deps.work_dir,
            alert: deps.alert,
            gate: Arc::new(tokio::sync::Mutex::new(())),
            requested: Mutex::new(MachineState::Begin),
            res_state: Mutex::new(ResourceState::None),
            wake: Notify::new(),
        });
        debug!("[{}] worker is created for resource", shared.ident);
        // First permit drives the initial BEGIN transition.
        shared.wake.notify_one();
        let worker = tokio::spawn(run_worker(Arc::clone(&shared)));
        Self {
            shared,
            worker: Mutex::new(Some(worker)),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.cfg.name
    }

    pub fn ident(&self) -> &str {
        &self.shared.ident
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.shared.cfg
    }

    /// Externally observable resource status.
    pub fn resource_state(&self) -> ResourceState {
        self.shared.res_state()
    }

    /// Current (most recently requested) machine state.
    pub fn machine_state(&self) -> MachineState {
        self.shared.requested()
    }

    /// Queue a transition; callable from any task, never blocks.
    pub fn request(&self, next: MachineState) {
        self.shared.request(next);
    }

    /// Ask the worker to exit after leaving its current state.
    pub fn cancel(&self) {
        self.shared.request(MachineState::Exit);
    }

    /// Wait for the worker to exit. After this returns, no further
    /// transitions or subprocesses are initiated.
    pub async fn join(&self) {
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

async fn run_worker(shared: Arc<Shared>) {
    let mut active: Option<StateTask> = None;
    let mut last: Option<MachineState> = None;
    loop {
        shared.wake.notified().await;
        if let Some(prev) = last {
            debug!("[{}] leave {} state", shared.ident, prev);
            if let Some(task) = active.take() {
                task.leave().await;
            }
        }
        let next = shared.requested();
        debug!("[{}] enter {} state", shared.ident, next);
        last = Some(next);
        match next {
            MachineState::Exit => break,
            MachineState::Idle => {}
            MachineState::Started => {
                shared.set_res_state(ResourceState::Started);
                shared.request(if shared.cfg.monitor {
                    MachineState::Monitor
                } else {
                    MachineState::Idle
                });
            }
            MachineState::Stopped => {
                shared.set_res_state(ResourceState::Stopped);
                shared.request(MachineState::Idle);
            }
            MachineState::Failed => {
                shared.set_res_state(ResourceState::Failed);
                shared.request(MachineState::Idle);
            }
            MachineState::Begin => {
                active = Some(StateTask::spawn(&shared, states::begin));
            }
            MachineState::Start => {
                active = Some(StateTask::spawn(&shared, states::start));
            }
            MachineState::Stop => {
                active = Some(StateTask::spawn(&shared, states::stop));
            }
            MachineState::AutoStart => {
                info!("[{}] resource is to be auto started", shared.ident);
                active = Some(StateTask::spawn(&shared, states::auto_start));
            }
            MachineState::Monitor => {
                active = Some(StateTask::spawn(&shared, crate::monitor::monitor));
            }
            MachineState::Recover => {
                shared.set_res_state(ResourceState::Failed);
                info!("[{}] resource is to be recovered", shared.ident);
                active = Some(StateTask::spawn(&shared, states::recover));
            }
        }
    }
    debug!("[{}] exiting worker, bye", shared.ident);
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
