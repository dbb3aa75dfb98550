// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Ropacal.

use thiserror::Error;

use crate::types::{EngineId, SurfaceKind};

/// Top-level error type for all Ropacal operations.
///
/// "Capability unsupported on this SDK build" is deliberately absent: it is
/// an expected outcome, reported as a value by the capability registry.
#[derive(Debug, Error)]
pub enum RopacalError {
    // -- Bridge protocol --
    #[error("method not implemented: {0}")]
    NotImplemented(String),

    #[error("{code}: {message}")]
    NativeInvocation {
        code: String,
        message: String,
        detail: String,
    },

    // -- Engine host --
    #[error("engine already attached to the {attached} surface, cannot attach {requested}")]
    AttachmentConflict {
        attached: SurfaceKind,
        requested: SurfaceKind,
    },

    #[error("navigation engine has not been created")]
    EngineNotCreated,

    #[error("unknown engine instance: {0}")]
    UnknownEngine(EngineId),

    // -- Surface coordinator --
    #[error("no {0} surface is connected")]
    SurfaceNotConnected(SurfaceKind),

    #[error("a {0} surface is already connected")]
    SurfaceAlreadyConnected(SurfaceKind),

    // -- Native SDK --
    #[error("navigation SDK error: {0}")]
    Sdk(String),

    #[error("maps SDK credential is missing")]
    MissingCredential,

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RopacalError {
    /// Stable error code sent to the UI layer in a bridge error response.
    pub fn bridge_code(&self) -> &str {
        match self {
            Self::NotImplemented(_) => "NOT_IMPLEMENTED",
            Self::NativeInvocation { code, .. } => code,
            Self::AttachmentConflict { .. } => "ATTACHMENT_CONFLICT",
            Self::EngineNotCreated => "ENGINE_NOT_CREATED",
            Self::UnknownEngine(_) => "UNKNOWN_ENGINE",
            Self::SurfaceNotConnected(_) => "SURFACE_NOT_CONNECTED",
            Self::SurfaceAlreadyConnected(_) => "SURFACE_ALREADY_CONNECTED",
            Self::Sdk(_) => "NATIVE_ERROR",
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, RopacalError>;
