// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Working states of the supervision machine.
//!
//! Each working state runs as one spawned task bound to a cancellation
//! token. Delays are plain sleeps selected against the token, so
//! `leave` interrupts a state at any await point; an in-flight command
//! observes the same token and raises [`CommandError::Cancelled`],
//! after which the task posts no further transitions.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use resmon_core::{MachineState, ResourceState};

use crate::command::Command;
use crate::machine::Shared;

/// A running state: its cancellation token and task handle.
pub(crate) struct StateTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl StateTask {
    pub(crate) fn spawn<F, Fut>(shared: &Arc<Shared>, state: F) -> Self
    where
        F: FnOnce(Arc<Shared>, CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let handle = tokio::spawn(state(Arc::clone(shared), token.clone()));
        Self { token, handle }
    }

    /// Cancel the state and wait until its task is gone. Once this
    /// returns the state can no longer post transitions.
    pub(crate) async fn leave(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}

/// Sleep that gives up when the state is left. Returns false on
/// cancellation.
pub(crate) async fn sleep_unless_cancelled(delay: Duration, token: &CancellationToken) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

pub(crate) fn new_command(shared: &Shared, token: &CancellationToken) -> Option<Command> {
    match shared.command(token) {
        Ok(command) => Some(command),
        Err(err) => {
            error!("[{}] cannot create message file: {}", shared.ident, err);
            None
        }
    }
}

/// BEGIN: probe once to learn the initial status.
pub(crate) async fn begin(shared: Arc<Shared>, token: CancellationToken) {
    let Some(mut command) = new_command(&shared, &token) else {
        return;
    };
    match command.run("status", shared.cfg.status_timeout, &[]).await {
        Ok(0) => {
            debug!("[{}] resource is already started", shared.ident);
            shared.request(MachineState::Started);
        }
        Ok(_) => {
            debug!("[{}] resource is not started", shared.ident);
            shared.set_res_state(ResourceState::Stopped);
            shared.request(if shared.cfg.auto_start {
                MachineState::AutoStart
            } else {
                MachineState::Stopped
            });
        }
        Err(_) => {}
    }
}

/// START: one attempt, requested over the control plane.
pub(crate) async fn start(shared: Arc<Shared>, token: CancellationToken) {
    let Some(mut command) = new_command(&shared, &token) else {
        return;
    };
    info!("[{}] start resource", shared.ident);
    match command.run("start", shared.cfg.start_timeout, &[]).await {
        Ok(0) => {
            info!("[{}] resource is started successfully", shared.ident);
            shared.request(MachineState::Started);
        }
        Ok(_) => {
            error!("[{}] failed to start resource", shared.ident);
            shared.request(MachineState::Failed);
        }
        Err(_) => {}
    }
}

/// STOP: result is ignored; the resource counts as stopped either way.
pub(crate) async fn stop(shared: Arc<Shared>, token: CancellationToken) {
    let Some(mut command) = new_command(&shared, &token) else {
        return;
    };
    debug!("[{}] stop resource", shared.ident);
    match command.run("stop", shared.cfg.stop_timeout, &[]).await {
        Ok(0) => info!("[{}] resource is stopped successfully", shared.ident),
        Ok(_) => error!("[{}] failed to stop resource", shared.ident),
        Err(_) => return,
    }
    shared.request(MachineState::Stopped);
}

/// AUTOSTART: delayed start with bounded retries.
pub(crate) async fn auto_start(shared: Arc<Shared>, token: CancellationToken) {
    let Some(mut command) = new_command(&shared, &token) else {
        return;
    };
    if !sleep_unless_cancelled(shared.cfg.start_delay, &token).await {
        return;
    }
    let outcome = retry_verb(
        &shared,
        &mut command,
        "start",
        shared.cfg.start_timeout,
        shared.cfg.start_retry_times,
        shared.cfg.start_retry_interval,
        &token,
    )
    .await;
    match outcome {
        RetryOutcome::Succeeded => {
            info!("[{}] resource is started successfully", shared.ident);
            shared.request(MachineState::Started);
        }
        RetryOutcome::Exhausted => {
            error!(
                "[{}] failed to start resource for {} times, resource aborted!",
                shared.ident, shared.cfg.start_retry_times
            );
            shared.request(MachineState::Failed);
        }
        RetryOutcome::Cancelled => {}
    }
}

/// RECOVER: immediate recover attempts with bounded retries. The
/// machine already marked the resource failed on entry.
pub(crate) async fn recover(shared: Arc<Shared>, token: CancellationToken) {
    let Some(mut command) = new_command(&shared, &token) else {
        return;
    };
    let outcome = retry_verb(
        &shared,
        &mut command,
        "recover",
        shared.cfg.recover_timeout,
        shared.cfg.recover_retry_times,
        shared.cfg.recover_retry_interval,
        &token,
    )
    .await;
    match outcome {
        RetryOutcome::Succeeded => {
            info!("[{}] resource is recovered successfully", shared.ident);
            shared.request(MachineState::Started);
        }
        RetryOutcome::Exhausted => {
            error!(
                "[{}] failed to recover resource for {} times, resource aborted!",
                shared.ident, shared.cfg.recover_retry_times
            );
            shared.request(MachineState::Failed);
        }
        RetryOutcome::Cancelled => {}
    }
}

pub(crate) enum RetryOutcome {
    Succeeded,
    Exhausted,
    Cancelled,
}

/// Run `verb` up to `retry_times` attempts (including the first), with
/// at least `retry_interval` between attempt starts.
async fn retry_verb(
    shared: &Shared,
    command: &mut Command,
    verb: &str,
    timeout: Duration,
    retry_times: u32,
    retry_interval: Duration,
    token: &CancellationToken,
) -> RetryOutcome {
    let mut attempt = 1u32;
    loop {
        let attempt_started = Instant::now();
        debug!("[{}] {} resource", shared.ident, verb);
        match command.run(verb, timeout, &[]).await {
            Ok(0) => return RetryOutcome::Succeeded,
            Ok(_) => {}
            Err(_) => return RetryOutcome::Cancelled,
        }
        if attempt >= retry_times {
            return RetryOutcome::Exhausted;
        }
        attempt += 1;
        let delay = retry_interval.saturating_sub(attempt_started.elapsed());
        error!(
            "[{}] failed to {} resource, retry in {:.3}s later",
            shared.ident,
            verb,
            delay.as_secs_f64()
        );
        if !sleep_unless_cancelled(delay, token).await {
            return RetryOutcome::Cancelled;
        }
    }
}
