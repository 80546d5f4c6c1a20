// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-tree termination.

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tracing::debug;

/// Kill a child and all of its descendants.
///
/// The command runner spawns every script as its own process group
/// leader, so one `killpg` takes down helper processes the script forked
/// as well. Resources commonly spawn helpers; killing only the direct
/// child would leave them running past the timeout.
pub(crate) fn kill_process_group(pid: u32) {
    if let Err(err) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        debug!("process group {} already gone: {}", pid, err);
    }
}
