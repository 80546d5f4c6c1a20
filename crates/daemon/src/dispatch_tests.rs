// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::Path;
use std::time::Duration;

use resmon_core::ResourceConfig;
use resmon_engine::{LogAlertSink, MachineDeps, ResourceMachine};

fn script(dir: &Path, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("r.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn spawn_machine(dir: &Path, body: &str) -> ResourceMachine {
    let path = script(dir, body);
    ResourceMachine::spawn(
        "test",
        ResourceConfig::new("res", path),
        MachineDeps {
            work_dir: dir.to_path_buf(),
            alert: Arc::new(LogAlertSink),
        },
    )
}

async fn wait_resource_state(machine: &ResourceMachine, state: ResourceState) {
    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    while machine.resource_state() != state {
        assert!(
            std::time::Instant::now() < deadline,
            "machine never reached {state}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn payload(verb: u16, argument: &str) -> Vec<u8> {
    let mut bytes = verb.to_le_bytes().to_vec();
    bytes.extend_from_slice(argument.as_bytes());
    bytes
}

fn dispatcher_for(machines: Vec<ResourceMachine>, log_path: PathBuf) -> Dispatcher {
    Dispatcher::new("test".to_string(), log_path, Arc::new(machines))
}

async fn teardown(dispatcher: Dispatcher) {
    for machine in dispatcher.machines.iter() {
        machine.cancel();
    }
    for machine in dispatcher.machines.iter() {
        machine.join().await;
    }
}

#[tokio::test]
async fn undersized_payload_is_an_internal_error() {
    let dispatcher = dispatcher_for(Vec::new(), PathBuf::from("/nonexistent.log"));
    assert_eq!(dispatcher.dispatch(&[0x01]), "Internal error!\n");
}

#[tokio::test]
async fn unknown_verb_is_an_internal_error() {
    let dispatcher = dispatcher_for(Vec::new(), PathBuf::from("/nonexistent.log"));
    assert_eq!(dispatcher.dispatch(&payload(99, "")), "Internal error!\n");
}

#[tokio::test]
async fn reserved_profile_verbs_are_unsupported() {
    let dispatcher = dispatcher_for(Vec::new(), PathBuf::from("/nonexistent.log"));
    assert_eq!(
        dispatcher.dispatch(&payload(VERB_START_PROFILE, "")),
        "Internal error!\n"
    );
    assert_eq!(
        dispatcher.dispatch(&payload(VERB_STOP_PROFILE, "")),
        "Internal error!\n"
    );
}

#[tokio::test]
async fn unknown_resource_names_are_reported() {
    let dispatcher = dispatcher_for(Vec::new(), PathBuf::from("/nonexistent.log"));
    for verb in [VERB_SHOW_RESOURCE, VERB_START_RESOURCE, VERB_STOP_RESOURCE] {
        assert_eq!(dispatcher.dispatch(&payload(verb, "ghost")), "no such resource");
    }
}

#[tokio::test]
async fn start_of_a_started_resource_says_so() {
    let dir = tempfile::tempdir().unwrap();
    let machine = spawn_machine(dir.path(), "exit 0");
    wait_resource_state(&machine, ResourceState::Started).await;

    let dispatcher = dispatcher_for(vec![machine], dir.path().join("resmon.log"));
    assert_eq!(
        dispatcher.dispatch(&payload(VERB_START_RESOURCE, "res")),
        "res is already started"
    );
    teardown(dispatcher).await;
}

#[tokio::test]
async fn stop_of_a_stopped_resource_says_so() {
    let dir = tempfile::tempdir().unwrap();
    let machine = spawn_machine(dir.path(), "exit 1");
    wait_resource_state(&machine, ResourceState::Stopped).await;

    let dispatcher = dispatcher_for(vec![machine], dir.path().join("resmon.log"));
    assert_eq!(
        dispatcher.dispatch(&payload(VERB_STOP_RESOURCE, "res")),
        "res is already stopped"
    );
    teardown(dispatcher).await;
}

#[tokio::test]
async fn start_command_drives_a_stopped_resource_up() {
    let dir = tempfile::tempdir().unwrap();
    let machine = spawn_machine(
        dir.path(),
        "case \"$1\" in status) exit 1 ;; esac\nexit 0",
    );
    wait_resource_state(&machine, ResourceState::Stopped).await;

    let dispatcher = dispatcher_for(vec![machine], dir.path().join("resmon.log"));
    assert_eq!(dispatcher.dispatch(&payload(VERB_START_RESOURCE, "res")), "ok");
    wait_resource_state(&dispatcher.machines[0], ResourceState::Started).await;
    teardown(dispatcher).await;
}

#[tokio::test]
async fn stop_command_drives_a_started_resource_down() {
    let dir = tempfile::tempdir().unwrap();
    let machine = spawn_machine(dir.path(), "exit 0");
    wait_resource_state(&machine, ResourceState::Started).await;

    let dispatcher = dispatcher_for(vec![machine], dir.path().join("resmon.log"));
    assert_eq!(dispatcher.dispatch(&payload(VERB_STOP_RESOURCE, "res")), "ok");
    wait_resource_state(&dispatcher.machines[0], ResourceState::Stopped).await;
    teardown(dispatcher).await;
}

#[tokio::test]
async fn show_profile_lists_every_resource() {
    let dir = tempfile::tempdir().unwrap();
    let machine = spawn_machine(dir.path(), "exit 0");
    wait_resource_state(&machine, ResourceState::Started).await;

    let dispatcher = dispatcher_for(vec![machine], dir.path().join("resmon.log"));
    let reply = dispatcher.dispatch(&payload(VERB_SHOW_PROFILE, ""));
    assert!(reply.starts_with("Profile name: test\nResources:\n"), "{reply}");
    assert!(reply.contains("[res]"), "{reply}");
    assert!(reply.contains("STARTED"), "{reply}");
    teardown(dispatcher).await;
}

#[tokio::test]
async fn show_resource_filters_events_to_this_session() {
    let dir = tempfile::tempdir().unwrap();
    let machine = spawn_machine(dir.path(), "exit 0");
    wait_resource_state(&machine, ResourceState::Started).await;

    let log_path = dir.path().join("resmon.log");
    let marker = startup_marker(std::process::id());
    std::fs::write(
        &log_path,
        format!(
            "old INFO [test:res] resource is STOPPED\n\
             {marker}\n\
             ts  INFO [test:res] resource is STARTED\n\
             ts DEBUG [test:res] enter BEGIN state\n\
             ts  INFO [test:other] resource is STOPPED\n"
        ),
    )
    .unwrap();

    let dispatcher = dispatcher_for(vec![machine], log_path);
    let reply = dispatcher.dispatch(&payload(VERB_SHOW_RESOURCE, "res"));
    assert!(reply.contains("Resource name: res"), "{reply}");
    assert!(reply.contains("    State:  STARTED"), "{reply}");
    assert!(reply.contains("    ts  INFO resource is STARTED\n"), "{reply}");
    // Older sessions, debug lines, and other resources stay out.
    assert!(!reply.contains("old INFO"), "{reply}");
    assert!(!reply.contains("DEBUG"), "{reply}");
    assert!(!reply.contains("test:other"), "{reply}");
    teardown(dispatcher).await;
}
