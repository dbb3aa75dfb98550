// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session scripts: JSON-lines recordings of what the host runtime and the
// UI layer sent during a session.
//
//   {"surface": "automotive", "event": "connecting"}
//   {"surface": "automotive", "control": "recenter"}
//   {"call": {"method": "forceDayMode"}}
//   {"channel": "com.ropacal.app/navigation", "call": {"method": "isAvailable"}}
//
// Blank lines and lines starting with `#` are skipped.

use std::io::BufRead;
use std::path::Path;

use serde::Deserialize;

use ropacal_bridge::MethodCall;
use ropacal_core::error::{Result, RopacalError};
use ropacal_core::types::{LifecycleEvent, SurfaceKind};

/// One recorded input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    Lifecycle {
        surface: SurfaceKind,
        event: LifecycleEvent,
    },
    Control {
        surface: SurfaceKind,
        control: String,
    },
    Call {
        #[serde(default)]
        channel: Option<String>,
        call: MethodCall,
    },
}

/// Which inbound stream a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Surface(SurfaceKind),
    Bridge,
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Surface(kind) => write!(f, "{kind}"),
            Self::Bridge => f.write_str("bridge"),
        }
    }
}

impl ScriptStep {
    pub fn stream(&self) -> Stream {
        match self {
            Self::Lifecycle { surface, .. } | Self::Control { surface, .. } => {
                Stream::Surface(*surface)
            }
            Self::Call { .. } => Stream::Bridge,
        }
    }
}

/// A parsed session script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub steps: Vec<ScriptStep>,
}

impl Script {
    /// Read a script file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Parse a script from any line reader.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut steps = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let step = serde_json::from_str(trimmed).map_err(|e| {
                RopacalError::Config(format!("script line {}: {e}", index + 1))
            })?;
            steps.push(step);
        }
        Ok(Self { steps })
    }

    /// Steps of one stream, in script order.
    pub fn stream(&self, stream: Stream) -> Vec<ScriptStep> {
        self.steps
            .iter()
            .filter(|s| s.stream() == stream)
            .cloned()
            .collect()
    }
}
