// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::general::General;
use resmon_core::LogLevel;

fn general() -> General {
    General {
        profile: "test".to_string(),
        log_file: PathBuf::from("/tmp/resmon-test.log"),
        log_level: LogLevel::Error,
        default_timeout: Duration::from_secs(30),
    }
}

fn executable_script(dir: &std::path::Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("ctl.sh");
    std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn section_with(dir: &std::path::Path, pairs: &[(&str, &str)]) -> ResourceSection {
    let script = executable_script(dir);
    let mut section = ResourceSection::new("test.conf", 1);
    section.add(2, "Name", "db").unwrap();
    section.add(3, "Path", script.to_str().unwrap()).unwrap();
    for (i, (key, value)) in pairs.iter().enumerate() {
        section.add(4 + i, key, value).unwrap();
    }
    section
}

#[test]
fn defaults_come_from_general_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = section_with(dir.path(), &[]).complete(&general()).unwrap();
    assert_eq!(cfg.name, "db");
    assert_eq!(cfg.start_timeout, Duration::from_secs(30));
    assert_eq!(cfg.status_timeout, Duration::from_secs(30));
    assert_eq!(cfg.start_retry_interval, cfg.start_timeout);
    assert_eq!(cfg.recover_retry_interval, cfg.recover_timeout);
    assert_eq!(cfg.restart_timeout, Duration::from_secs(60));
    assert!(!cfg.auto_start);
    assert!(!cfg.monitor);
    assert_eq!(cfg.monitor_times, 9999);
}

#[test]
fn name_is_mandatory() {
    let dir = tempfile::tempdir().unwrap();
    let script = executable_script(dir.path());
    let mut section = ResourceSection::new("test.conf", 7);
    section.add(8, "Path", script.to_str().unwrap()).unwrap();
    let err = section.complete(&general()).unwrap_err();
    assert!(err.to_string().contains("'Name' must be specified"), "{err}");
    assert!(err.to_string().contains("test.conf:7"), "{err}");
}

#[test]
fn monitor_requires_interval() {
    let dir = tempfile::tempdir().unwrap();
    let section = section_with(dir.path(), &[("Monitor", "yes")]);
    let err = section.complete(&general()).unwrap_err();
    assert!(
        err.to_string().contains("'MonitorInterval' must be specified"),
        "{err}"
    );
}

#[test]
fn monitor_interval_must_cover_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let section = section_with(
        dir.path(),
        &[
            ("Monitor", "yes"),
            ("MonitorInterval", "5"),
            ("MonitorTimeout", "10"),
        ],
    );
    let err = section.complete(&general()).unwrap_err();
    assert!(
        err.to_string()
            .contains("'MonitorInterval' must not be less than 'MonitorTimeout'"),
        "{err}"
    );
}

#[test]
fn recover_retry_interval_must_cover_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let section = section_with(
        dir.path(),
        &[("RecoverTimeout", "10"), ("RecoverRetryInterval", "5")],
    );
    let err = section.complete(&general()).unwrap_err();
    assert!(
        err.to_string()
            .contains("'RecoverRetryInterval' must not be less than 'RecoverTimeout'"),
        "{err}"
    );
}

#[test]
fn monitor_delay_defaults_to_interval() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = section_with(
        dir.path(),
        &[("Monitor", "yes"), ("MonitorInterval", "60")],
    )
    .complete(&general())
    .unwrap();
    assert_eq!(cfg.monitor_delay, Duration::from_secs(60));
}

#[test]
fn duplicate_key_is_rejected() {
    let mut section = ResourceSection::new("test.conf", 1);
    section.add(2, "Name", "db").unwrap();
    let err = section.add(3, "name", "db2").unwrap_err();
    assert!(err.to_string().contains("already specified"), "{err}");
}

#[test]
fn path_must_be_executable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ctl.sh");
    std::fs::write(&path, "#!/bin/sh\n").unwrap();
    let mut section = ResourceSection::new("test.conf", 1);
    section.add(2, "Name", "db").unwrap();
    section.add(3, "Path", path.to_str().unwrap()).unwrap();
    let err = section.complete(&general()).unwrap_err();
    assert!(err.to_string().contains("is not executable"), "{err}");
}

#[test]
fn missing_path_is_rejected() {
    let mut section = ResourceSection::new("test.conf", 1);
    section.add(2, "Name", "db").unwrap();
    section.add(3, "Path", "/nonexistent/ctl").unwrap();
    let err = section.complete(&general()).unwrap_err();
    assert!(err.to_string().contains("is not existent"), "{err}");
}

#[yare::parameterized(
    zero_timeout   = { "StartTimeout", "0" },
    negative       = { "StartDelay", "-1" },
    not_a_number   = { "MonitorTimes", "lots" },
    threshold_high = { "MonitorThreshold", "101" },
    threshold_zero = { "MonitorThreshold", "0" },
    default_high   = { "MonitorDefault", "101" },
    bad_bool       = { "AutoStart", "maybe" },
    bad_action     = { "Action", "restart" },
    unknown_key    = { "Frobnicate", "1" },
)]
fn invalid_values_are_rejected(key: &str, value: &str) {
    let mut section = ResourceSection::new("test.conf", 1);
    assert!(section.add(2, key, value).is_err());
}

#[yare::parameterized(
    single = { "3",   3, 3 },
    pair   = { "2,5", 2, 5 },
)]
fn threshold_times_accepted(value: &str, min: u32, max: u32) {
    assert_eq!(
        parse_threshold_times(value),
        Some(ThresholdWindow { min, max })
    );
}

#[yare::parameterized(
    inverted = { "5,2" },
    zero     = { "0,2" },
    triple   = { "1,2,3" },
    words    = { "a,b" },
    empty    = { "" },
)]
fn threshold_times_rejected(value: &str) {
    assert_eq!(parse_threshold_times(value), None);
}
