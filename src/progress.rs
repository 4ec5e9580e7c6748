// Copyright 2026 Surfacer Contributors
// SPDX-License-Identifier: Apache-2.0

//! Progress event types and broadcast channel for survey telemetry.
//!
//! The survey pipeline emits `ProgressEvent`s as it walks the target list.
//! They flow through a `tokio::sync::broadcast` channel to any subscriber
//! (the CLI progress bar today). When no subscriber exists, events are
//! silently dropped.

use serde::{Deserialize, Serialize};

/// A progress event emitted during a survey run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The run ID this event belongs to.
    pub run_id: String,
    /// Monotonically increasing sequence number.
    pub seq: u64,
    /// The kind of progress event.
    pub event: ProgressEventKind,
}

/// The specific kind of progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEventKind {
    /// The run started walking the target list.
    SurveyStarted { base_url: String, targets: u64 },
    /// One target is being probed.
    TargetStarted { label: String, url: String },
    /// One target finished, successfully or not.
    TargetCompleted {
        label: String,
        status: Option<u16>,
        is_error: bool,
        elapsed_ms: u64,
    },
    /// The whole run finished.
    SurveyCompleted {
        pages: u64,
        failures: u64,
        elapsed_ms: u64,
    },
    /// A non-fatal warning occurred.
    Warning { message: String },
}

/// Sender handle for emitting progress events.
///
/// Backed by a `tokio::sync::broadcast` channel so multiple listeners can
/// subscribe independently. When no listeners exist, `send()` returns an
/// error which we silently ignore.
pub type ProgressSender = tokio::sync::broadcast::Sender<ProgressEvent>;

/// Receiver handle for consuming progress events.
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<ProgressEvent>;

/// Create a new progress broadcast channel with a bounded buffer.
///
/// 256 events covers a survey comfortably: two per target plus run
/// bookkeeping.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(256)
}

/// Convenience helper: emit a progress event, silently ignoring send errors
/// (which occur when no receivers are listening).
pub fn emit(tx: &Option<ProgressSender>, run_id: &str, seq: &mut u64, event: ProgressEventKind) {
    if let Some(ref sender) = tx {
        *seq += 1;
        let _ = sender.send(ProgressEvent {
            run_id: run_id.to_string(),
            seq: *seq,
            event,
        });
    }
}
