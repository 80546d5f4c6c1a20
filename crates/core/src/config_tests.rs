// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_applies_static_defaults() {
    let cfg = ResourceConfig::new("db", "/usr/local/bin/db-ctl");
    assert!(!cfg.auto_start);
    assert!(!cfg.monitor);
    assert_eq!(cfg.start_timeout, DEFAULT_TIMEOUT);
    assert_eq!(cfg.start_retry_interval, cfg.start_timeout);
    assert_eq!(cfg.recover_retry_interval, cfg.recover_timeout);
    assert_eq!(cfg.restart_timeout, cfg.start_timeout + cfg.stop_timeout);
    assert_eq!(cfg.monitor_threshold, 50);
    assert_eq!(cfg.monitor_threshold_times, ThresholdWindow { min: 1, max: 1 });
    assert_eq!(cfg.action, Action::Alert);
}

#[test]
fn monitor_times_sentinel_is_unbounded() {
    let mut cfg = ResourceConfig::new("db", "/bin/true");
    assert_eq!(cfg.effective_monitor_times(), u64::MAX);
    cfg.monitor_times = 7;
    assert_eq!(cfg.effective_monitor_times(), 7);
}

#[yare::parameterized(
    none    = { "none",    Action::None },
    recover = { "Recover", Action::Recover },
    alert   = { "ALERT",   Action::Alert },
)]
fn action_parses_case_insensitively(input: &str, expected: Action) {
    assert_eq!(input.parse::<Action>(), Ok(expected));
}

#[test]
fn action_rejects_unknown() {
    assert!("restart".parse::<Action>().is_err());
}

#[yare::parameterized(
    fatal = { 0, "error" },
    error = { 1, "error" },
    info  = { 2, "info" },
    debug = { 3, "debug" },
)]
fn log_level_filter(n: u32, filter: &str) {
    assert_eq!(LogLevel::from_number(n).unwrap().as_filter(), filter);
}

#[test]
fn log_level_rejects_out_of_range() {
    assert_eq!(LogLevel::from_number(4), None);
}
