// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pluggable alert hook.
//!
//! When a monitored resource trips its threshold window with
//! `Action=alert`, the engine calls the configured sink and marks the
//! resource failed. Delivery transport is out of scope; the default sink
//! writes a log line.

use tracing::info;

/// Receives alerts raised by monitor windows.
pub trait AlertSink: Send + Sync {
    fn alert(&self, ident: &str, message: &str);
}

/// Default sink: one informational log line per alert.
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn alert(&self, ident: &str, message: &str) {
        info!("[{}] alert for resource failure: {}", ident, message);
    }
}
