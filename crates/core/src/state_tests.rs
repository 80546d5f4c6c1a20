// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    started = { ResourceState::Started, "STARTED" },
    stopped = { ResourceState::Stopped, "STOPPED" },
    failed  = { ResourceState::Failed,  "FAILED" },
    none    = { ResourceState::None,    "NONE" },
)]
fn resource_state_display(state: ResourceState, expected: &str) {
    assert_eq!(state.to_string(), expected);
}

#[yare::parameterized(
    begin      = { MachineState::Begin,     "BEGIN" },
    auto_start = { MachineState::AutoStart, "AUTOSTART" },
    monitor    = { MachineState::Monitor,   "MONITOR" },
    exit       = { MachineState::Exit,      "EXIT" },
)]
fn machine_state_display(state: MachineState, expected: &str) {
    assert_eq!(state.to_string(), expected);
}
