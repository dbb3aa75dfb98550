// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine host: sole owner of the shared navigation engine.
//
// State machine:  Uninitialized -> Created -> Running
//
// The engine is created once and never destroyed. Surfaces come and go by
// attaching and detaching; that never touches the run state. Only one
// surface may render the engine at a time, and that is checked here rather
// than assumed from event ordering: the phone and car lifecycle streams are
// not ordered relative to each other.
//
// Threading: `EngineHost` is not synchronised. All calls must come from the
// UI thread (or from whatever single task owns the host).

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use ropacal_core::error::{Result, RopacalError};
use ropacal_core::types::{EngineId, EngineState, SurfaceId, SurfaceKind};

use crate::traits::NavigationSdk;

/// Surfaces that may render the engine at once.
pub const MAX_ATTACHED_SURFACES: usize = 1;

/// The single shared rendering engine.
#[derive(Debug, Clone)]
pub struct EngineInstance {
    id: EngineId,
    name: String,
    state: EngineState,
    attached: Vec<(SurfaceId, SurfaceKind)>,
}

impl EngineInstance {
    pub fn id(&self) -> EngineId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Surfaces currently rendering the engine.
    pub fn attached(&self) -> &[(SurfaceId, SurfaceKind)] {
        &self.attached
    }

    /// The surface rendering the engine, if any.
    pub fn attached_surface(&self) -> Option<(SurfaceId, SurfaceKind)> {
        self.attached.first().copied()
    }

    pub fn is_attached_to(&self, surface: SurfaceId) -> bool {
        self.attached.iter().any(|(s, _)| *s == surface)
    }
}

/// Owner of the engine instance.
pub struct EngineHost {
    sdk: Arc<dyn NavigationSdk>,
    engine: Option<EngineInstance>,
}

impl EngineHost {
    pub fn new(sdk: Arc<dyn NavigationSdk>) -> Self {
        Self { sdk, engine: None }
    }

    /// The engine, if it has been created.
    pub fn engine(&self) -> Option<&EngineInstance> {
        self.engine.as_ref()
    }

    /// Current run state (`Uninitialized` before creation).
    pub fn state(&self) -> EngineState {
        self.engine
            .as_ref()
            .map_or(EngineState::Uninitialized, |e| e.state)
    }

    /// Return the engine, creating it on first use.
    ///
    /// Later calls return the existing instance whatever `name` they pass.
    #[instrument(skip(self))]
    pub fn get_or_create_engine(&mut self, name: &str) -> Result<&EngineInstance> {
        if let Some(ref existing) = self.engine {
            if existing.name != name {
                warn!(
                    existing = %existing.name,
                    requested = name,
                    "engine already exists under another name, reusing it"
                );
            }
        } else {
            let id = EngineId::new();
            self.sdk.create_engine(id, name)?;
            info!(engine = %id, name, "navigation engine created");
            self.engine = Some(EngineInstance {
                id,
                name: name.to_string(),
                state: EngineState::Created,
                attached: Vec::new(),
            });
        }
        self.engine.as_ref().ok_or(RopacalError::EngineNotCreated)
    }

    /// Start the engine. Idempotent: a second call is a no-op.
    #[instrument(skip(self))]
    pub fn run(&mut self, id: EngineId) -> Result<()> {
        let engine = self.engine_mut(id)?;
        if engine.state == EngineState::Running {
            debug!(engine = %id, "engine already running");
            return Ok(());
        }
        self.sdk.run_engine(id)?;
        let engine = self.engine_mut(id)?;
        engine.state = EngineState::Running;
        info!(engine = %id, "navigation engine running");
        Ok(())
    }

    /// Render the engine into `surface`.
    ///
    /// Fails with `AttachmentConflict` when another surface already holds
    /// the engine; the existing attachment is left untouched. Attaching the
    /// surface that already holds it is a no-op.
    #[instrument(skip(self))]
    pub fn attach(&mut self, id: EngineId, surface: SurfaceId, kind: SurfaceKind) -> Result<()> {
        let engine = self.engine_mut(id)?;
        if engine.is_attached_to(surface) {
            debug!(%surface, "surface already attached");
            return Ok(());
        }
        if engine.attached.len() >= MAX_ATTACHED_SURFACES {
            let (_, attached) = engine.attached[0];
            warn!(%attached, requested = %kind, "attachment conflict");
            return Err(RopacalError::AttachmentConflict {
                attached,
                requested: kind,
            });
        }

        self.sdk.attach_view(id, surface, kind)?;
        let engine = self.engine_mut(id)?;
        engine.attached.push((surface, kind));
        info!(%surface, %kind, "surface attached to engine");
        Ok(())
    }

    /// Stop rendering into `surface`. Detaching a surface that is not
    /// attached is a no-op.
    ///
    /// The attachment is released even when the SDK reports a failure, so a
    /// vanished surface can never pin the engine; the SDK error is still
    /// returned.
    #[instrument(skip(self))]
    pub fn detach(&mut self, id: EngineId, surface: SurfaceId) -> Result<()> {
        let engine = self.engine_mut(id)?;
        if !engine.is_attached_to(surface) {
            debug!(%surface, "detach of unattached surface ignored");
            return Ok(());
        }

        let sdk_result = self.sdk.detach_view(id, surface);
        let engine = self.engine_mut(id)?;
        engine.attached.retain(|(s, _)| *s != surface);
        info!(%surface, "surface detached from engine");
        sdk_result
    }

    fn engine_mut(&mut self, id: EngineId) -> Result<&mut EngineInstance> {
        match self.engine.as_mut() {
            None => Err(RopacalError::EngineNotCreated),
            Some(engine) if engine.id != id => Err(RopacalError::UnknownEngine(id)),
            Some(engine) => Ok(engine),
        }
    }
}
