// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ropacal: Core types, error definitions and host configuration shared by
// the bridge and the host process.

pub mod config;
pub mod error;
pub mod types;

pub use config::HostConfig;
pub use error::RopacalError;
pub use types::*;
