// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervision state vocabulary.
//!
//! `ResourceState` is the externally observable status of a resource;
//! `MachineState` is the internal state of its supervision worker. Both
//! render as upper-case names, which is the vocabulary used in log lines
//! and control-plane replies.

use std::fmt;

/// Externally observable status of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    Started,
    Stopped,
    Failed,
    /// Initial status before the first probe completes.
    None,
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceState::Started => "STARTED",
            ResourceState::Stopped => "STOPPED",
            ResourceState::Failed => "FAILED",
            ResourceState::None => "NONE",
        };
        f.write_str(name)
    }
}

/// Internal state of a resource supervision worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    /// Probe the resource once to learn its initial status.
    Begin,
    /// Start requested over the control plane.
    Start,
    /// Stop requested over the control plane.
    Stop,
    Started,
    Stopped,
    /// Start with delay and retries after the initial probe found the
    /// resource stopped.
    AutoStart,
    /// Periodic health probing.
    Monitor,
    /// Recovery attempts after the monitor window triggered.
    Recover,
    Failed,
    /// Parked; waiting for an external transition.
    Idle,
    /// Terminal; the worker exits.
    Exit,
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MachineState::Begin => "BEGIN",
            MachineState::Start => "START",
            MachineState::Stop => "STOP",
            MachineState::Started => "STARTED",
            MachineState::Stopped => "STOPPED",
            MachineState::AutoStart => "AUTOSTART",
            MachineState::Monitor => "MONITOR",
            MachineState::Recover => "RECOVER",
            MachineState::Failed => "FAILED",
            MachineState::Idle => "IDLE",
            MachineState::Exit => "EXIT",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
