// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command dispatcher for the control plane.
//!
//! A command payload is a little-endian u16 verb code followed by an
//! ASCII argument (usually a resource name). The dispatcher runs on the
//! listener's connection tasks and must stay quick: machine mutations
//! are posted, never awaited, and the only I/O is the bounded log-tail
//! read backing `SHOW_RESOURCE`.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};

use resmon_core::{MachineState, ResourceState};
use resmon_engine::ResourceMachine;

use crate::lifecycle::startup_marker;

pub const VERB_SHOW_PROFILE: u16 = 0;
pub const VERB_SHOW_RESOURCE: u16 = 1;
pub const VERB_START_PROFILE: u16 = 2;
pub const VERB_START_RESOURCE: u16 = 3;
pub const VERB_STOP_PROFILE: u16 = 4;
pub const VERB_STOP_RESOURCE: u16 = 5;

const INTERNAL_ERROR: &str = "Internal error!\n";
const NO_SUCH_RESOURCE: &str = "no such resource";

/// Width of the name column in the profile listing.
const NAME_COLUMN: usize = 30;

/// Resolves command payloads against the machines of one profile.
pub struct Dispatcher {
    profile_name: String,
    log_path: PathBuf,
    machines: Arc<Vec<ResourceMachine>>,
}

impl Dispatcher {
    pub fn new(
        profile_name: String,
        log_path: PathBuf,
        machines: Arc<Vec<ResourceMachine>>,
    ) -> Self {
        Self {
            profile_name,
            log_path,
            machines,
        }
    }

    /// Decode one payload and produce the reply text.
    pub fn dispatch(&self, payload: &[u8]) -> String {
        if payload.len() < 2 {
            error!("[{}] invalid payload: too small", self.profile_name);
            return INTERNAL_ERROR.to_string();
        }
        let verb = u16::from_le_bytes([payload[0], payload[1]]);
        let argument = String::from_utf8_lossy(&payload[2..]).into_owned();
        match verb {
            VERB_SHOW_PROFILE => self.show_profile(),
            VERB_SHOW_RESOURCE => self.show_resource(&argument),
            VERB_START_RESOURCE => self.start_resource(&argument),
            VERB_STOP_RESOURCE => self.stop_resource(&argument),
            VERB_START_PROFILE | VERB_STOP_PROFILE => {
                error!("[{}] unsupported command: {}", self.profile_name, verb);
                INTERNAL_ERROR.to_string()
            }
            _ => {
                error!("[{}] unknown command: {}", self.profile_name, verb);
                INTERNAL_ERROR.to_string()
            }
        }
    }

    fn find(&self, name: &str) -> Option<&ResourceMachine> {
        self.machines.iter().find(|machine| machine.name() == name)
    }

    fn show_profile(&self) -> String {
        let mut reply = format!("Profile name: {}\nResources:\n", self.profile_name);
        for machine in self.machines.iter() {
            let action = match machine.machine_state() {
                MachineState::AutoStart => ", being auto-started",
                MachineState::Recover => ", under recovery",
                MachineState::Monitor => ", under monitoring",
                _ => "",
            };
            let head = format!("  [{}] ", machine.name());
            let pad = NAME_COLUMN.saturating_sub(head.len());
            reply.push_str(&format!(
                "{}{}{}{}\n",
                head,
                " ".repeat(pad),
                machine.resource_state(),
                action
            ));
        }
        reply
    }

    fn show_resource(&self, name: &str) -> String {
        let Some(machine) = self.find(name) else {
            return NO_SUCH_RESOURCE.to_string();
        };
        let action = match machine.machine_state() {
            MachineState::AutoStart => " (do auto-starting)",
            MachineState::Recover => " (do recovery)",
            MachineState::Monitor => " (do monitoring)",
            _ => "",
        };
        let mut reply = format!(
            "Profile name:  {}\n\
             Resource name: {}\n\
             \x20   State:  {}\n\
             \x20   Daemon: {}{}\n\
             \x20   Events:\n",
            self.profile_name,
            machine.name(),
            machine.resource_state(),
            machine.machine_state(),
            action
        );
        reply.push_str(&self.events_section(machine.ident()));
        reply
    }

    /// Lines this process logged for one resource since its startup
    /// marker, excluding debug chatter. Best-effort: the log file may
    /// lag behind the non-blocking writer.
    fn events_section(&self, ident: &str) -> String {
        let content = match std::fs::read_to_string(&self.log_path) {
            Ok(content) => content,
            Err(err) => {
                return format!(
                    "    unable to open '{}': {}\n",
                    self.log_path.display(),
                    err
                );
            }
        };
        let marker = startup_marker(std::process::id());
        let session = content
            .rsplit_once(marker.as_str())
            .map(|(_, tail)| tail)
            .unwrap_or(content.as_str());
        let tag = format!("[{ident}]");
        let mut events = String::new();
        for line in session.lines() {
            if !line.contains(&tag) || line.contains("DEBUG") {
                continue;
            }
            events.push_str("    ");
            events.push_str(&line.replace(&format!("{tag} "), ""));
            events.push('\n');
        }
        events
    }

    fn start_resource(&self, name: &str) -> String {
        let Some(machine) = self.find(name) else {
            return NO_SUCH_RESOURCE.to_string();
        };
        if machine.resource_state() == ResourceState::Started {
            return format!("{name} is already started");
        }
        // A start is already underway in these states; leave it alone.
        let busy = matches!(
            machine.machine_state(),
            MachineState::Start
                | MachineState::AutoStart
                | MachineState::Recover
                | MachineState::Monitor
        );
        if !busy {
            info!("[{}] resource is to be started by command", machine.ident());
            machine.request(MachineState::Start);
        }
        "ok".to_string()
    }

    fn stop_resource(&self, name: &str) -> String {
        let Some(machine) = self.find(name) else {
            return NO_SUCH_RESOURCE.to_string();
        };
        if machine.resource_state() == ResourceState::Stopped {
            return format!("{name} is already stopped");
        }
        info!("[{}] resource is to be stopped by command", machine.ident());
        machine.request(MachineState::Stop);
        "ok".to_string()
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
