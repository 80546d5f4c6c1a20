// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MONITOR state: periodic probes with a sliding threshold window.
//!
//! Each probe runs the `monitor` verb with a fresh value file. A probe
//! counts as a hit when its value meets the threshold; a failed probe
//! (non-zero exit, missing or invalid value) substitutes the configured
//! default. Once the window holds enough hits, the configured action
//! fires and monitoring stops.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use resmon_core::{Action, MachineState, ThresholdWindow};

use crate::command::{Command, CommandError, ENV_MONITOR_VALUE_FILE};
use crate::machine::Shared;
use crate::states::{new_command, sleep_unless_cancelled};

pub(crate) async fn monitor(shared: Arc<Shared>, token: CancellationToken) {
    let cfg = &shared.cfg;
    let mut left = if cfg.monitor {
        cfg.effective_monitor_times()
    } else {
        0
    };
    if left == 0 {
        shared.request(MachineState::Idle);
        return;
    }

    info!("[{}] resource is under monitoring", shared.ident);
    let Some(mut command) = new_command(&shared, &token) else {
        return;
    };
    let window = cfg.monitor_threshold_times;
    let mut history: VecDeque<bool> = VecDeque::with_capacity(window.max as usize);

    if !sleep_unless_cancelled(cfg.monitor_delay, &token).await {
        return;
    }
    loop {
        let probe_started = Instant::now();
        debug!("[{}] monitor resource", shared.ident);
        let value = match probe_value(&shared, &mut command).await {
            Ok(Some(value)) => {
                debug!("[{}] received monitor value: {}", shared.ident, value);
                value
            }
            Ok(None) => {
                error!(
                    "[{}] failed to run 'monitor' command, use '{}' by default",
                    shared.ident, cfg.monitor_default
                );
                cfg.monitor_default
            }
            Err(CommandError::Cancelled { .. }) => return,
        };

        let hit = value >= cfg.monitor_threshold;
        if hit {
            error!(
                "[{}] monitor return value ({}) exceeds threshold ({})",
                shared.ident, value, cfg.monitor_threshold
            );
        }
        if let Some(trigger) = record_probe(&mut history, hit, window) {
            error!(
                "[{}] exceeded threshold {} times in the most recent {} monitors",
                shared.ident, trigger.hits, trigger.observed
            );
            dispatch_action(&shared);
            return;
        }

        left -= 1;
        if left == 0 {
            shared.request(MachineState::Idle);
            return;
        }
        let delay = cfg.monitor_interval.saturating_sub(probe_started.elapsed());
        if !sleep_unless_cancelled(delay, &token).await {
            return;
        }
    }
}

/// Run one probe. `Ok(None)` means the probe failed and the default
/// value applies.
async fn probe_value(
    shared: &Shared,
    command: &mut Command,
) -> Result<Option<u32>, CommandError> {
    let value_file = match tempfile::Builder::new()
        .suffix(".tmp")
        .tempfile_in(&shared.work_dir)
    {
        Ok(file) => file,
        Err(err) => {
            error!(
                "[{}] cannot create intermediate file for 'monitor' command: {}",
                shared.ident, err
            );
            return Ok(None);
        }
    };

    let code = command
        .run(
            "monitor",
            shared.cfg.monitor_timeout,
            &[(ENV_MONITOR_VALUE_FILE, value_file.path())],
        )
        .await?;
    if code != 0 {
        return Ok(None);
    }

    let content = std::fs::read_to_string(value_file.path()).unwrap_or_default();
    let first = content.lines().next().unwrap_or("").trim();
    match first.parse::<u32>() {
        Ok(value) if value <= 100 => Ok(Some(value)),
        _ => {
            error!(
                "[{}] 'monitor' receives invalid value '{}'",
                shared.ident,
                if first.is_empty() { "null" } else { first }
            );
            Ok(None)
        }
    }
}

fn dispatch_action(shared: &Shared) {
    match shared.cfg.action {
        Action::Recover => {
            error!("[{}] recovering resource now", shared.ident);
            shared.request(MachineState::Recover);
        }
        Action::Alert => {
            error!("[{}] alerting for resource failure", shared.ident);
            shared
                .alert
                .alert(&shared.ident, "monitor window exceeded threshold");
            shared.request(MachineState::Failed);
        }
        Action::None => {
            error!("[{}] do nothing on resource failure", shared.ident);
            shared.request(MachineState::Started);
        }
    }
}

pub(crate) struct WindowTrigger {
    pub(crate) hits: u32,
    pub(crate) observed: u32,
}

/// Append one outcome to the bounded history; report a trigger once the
/// window holds at least `min` observations and at least `min` hits.
/// The history is cleared on trigger so a later re-entry starts fresh.
pub(crate) fn record_probe(
    history: &mut VecDeque<bool>,
    hit: bool,
    window: ThresholdWindow,
) -> Option<WindowTrigger> {
    history.push_back(hit);
    if history.len() > window.max as usize {
        history.pop_front();
    }
    let observed = history.len() as u32;
    let hits = history.iter().filter(|h| **h).count() as u32;
    if observed >= window.min && hits >= window.min {
        history.clear();
        return Some(WindowTrigger { hits, observed });
    }
    None
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
