// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Diagnostics trail: bounded, append-only in-memory log of recoverable
// events the UI layer never sees as errors (unsupported capabilities,
// camera updates skipped on unattached surfaces, and so on).
//
// Every entry is mirrored to `tracing` so it also lands in the process log.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// A single diagnostics entry.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticEntry {
    pub timestamp: DateTime<Utc>,
    /// Component that recorded the entry (e.g. "capabilities").
    pub component: &'static str,
    pub message: String,
}

/// Cloneable handle to a shared diagnostics ring.
///
/// When full, the oldest entry is dropped.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    entries: Arc<Mutex<VecDeque<DiagnosticEntry>>>,
    capacity: usize,
}

impl Diagnostics {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Append an entry.
    pub fn record(&self, component: &'static str, message: impl Into<String>) {
        let message = message.into();
        info!(component, "{message}");

        let mut entries = self.entries.lock().expect("diagnostics lock poisoned");
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(DiagnosticEntry {
            timestamp: Utc::now(),
            component,
            message,
        });
    }

    /// All retained entries, oldest first.
    pub fn entries(&self) -> Vec<DiagnosticEntry> {
        self.entries
            .lock()
            .expect("diagnostics lock poisoned")
            .iter()
            .cloned()
            .collect()
    }

    /// Retained entries from one component, oldest first.
    pub fn entries_for(&self, component: &str) -> Vec<DiagnosticEntry> {
        self.entries
            .lock()
            .expect("diagnostics lock poisoned")
            .iter()
            .filter(|e| e.component == component)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("diagnostics lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(256)
    }
}
