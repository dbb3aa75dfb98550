// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Surface coordinator: turns host-runtime lifecycle events for the phone
// and car displays into engine attach/detach calls and per-surface camera
// configuration.
//
//   connecting          build the shell, register controls, request attach
//   becameActive        (re)attach if needed, apply the surface's profile
//   willResignActive    inactive
//   willEnterForeground inactive
//   enteredBackground   background, release the engine
//   disconnected        release the engine, drop the surface
//
// Camera settings are re-applied from the surface's own profile every time
// it becomes active, so switching displays never carries zoom or
// perspective across.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use ropacal_core::error::{Result, RopacalError};
use ropacal_core::types::{
    CameraConfig, LifecycleEvent, SurfaceId, SurfaceKind, SurfaceProfile, SurfaceState,
};

use crate::diagnostics::Diagnostics;
use crate::engine::EngineHost;
use crate::traits::NavigationSdk;

const COMPONENT: &str = "surfaces";

/// Root of the view hierarchy built for a surface on `connecting`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PresentationShell {
    /// Car display: a map template with template-owned buttons.
    MapTemplate {
        panning_interface: bool,
        leading_buttons: Vec<String>,
    },
    /// Phone: the UI runtime's root view hosting the map.
    HostedUiView,
}

impl PresentationShell {
    fn for_profile(kind: SurfaceKind, profile: &SurfaceProfile) -> Self {
        match kind {
            SurfaceKind::Automotive => Self::MapTemplate {
                panning_interface: profile.panning_interface,
                leading_buttons: profile
                    .custom_controls
                    .iter()
                    .map(|c| c.title.clone())
                    .collect(),
            },
            SurfaceKind::Phone => Self::HostedUiView,
        }
    }
}

/// A connected presentation surface.
#[derive(Debug, Clone)]
pub struct Surface {
    id: SurfaceId,
    kind: SurfaceKind,
    state: SurfaceState,
    profile: SurfaceProfile,
    shell: PresentationShell,
    attached: bool,
    applied_camera: Option<CameraConfig>,
}

impl Surface {
    fn connect(kind: SurfaceKind) -> Self {
        let profile = SurfaceProfile::for_kind(kind);
        let shell = PresentationShell::for_profile(kind, &profile);
        Self {
            id: SurfaceId::new(),
            kind,
            state: SurfaceState::Connecting,
            profile,
            shell,
            attached: false,
            applied_camera: None,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn profile(&self) -> &SurfaceProfile {
        &self.profile
    }

    pub fn shell(&self) -> &PresentationShell {
        &self.shell
    }

    /// Whether this surface currently renders the engine.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Camera last applied while this surface was active.
    pub fn applied_camera(&self) -> Option<CameraConfig> {
        self.applied_camera
    }
}

/// What a lifecycle event did to a surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceTransition {
    pub surface: SurfaceId,
    pub kind: SurfaceKind,
    pub event: LifecycleEvent,
    /// `None` when the event created the surface.
    pub from: Option<SurfaceState>,
    pub to: SurfaceState,
    pub attached: bool,
    /// Camera applied by this event, if any.
    pub camera: Option<CameraConfig>,
}

/// Lifecycle state machine for the phone and car surfaces.
///
/// Threading: same UI-thread precondition as [`EngineHost`].
pub struct SurfaceCoordinator {
    sdk: Arc<dyn NavigationSdk>,
    surfaces: HashMap<SurfaceKind, Surface>,
    active: Option<SurfaceKind>,
    diagnostics: Diagnostics,
}

impl SurfaceCoordinator {
    pub fn new(sdk: Arc<dyn NavigationSdk>, diagnostics: Diagnostics) -> Self {
        Self {
            sdk,
            surfaces: HashMap::new(),
            active: None,
            diagnostics,
        }
    }

    /// The live surface of `kind`, if connected.
    pub fn surface(&self, kind: SurfaceKind) -> Option<&Surface> {
        self.surfaces.get(&kind)
    }

    /// The surface currently in the foreground, if any.
    pub fn active(&self) -> Option<SurfaceKind> {
        self.active
    }

    /// Apply one lifecycle event for the surface of `kind`.
    #[instrument(skip(self, engine))]
    pub fn handle_event(
        &mut self,
        engine: &mut EngineHost,
        kind: SurfaceKind,
        event: LifecycleEvent,
    ) -> Result<SurfaceTransition> {
        match event {
            LifecycleEvent::Connecting => self.on_connecting(engine, kind),
            LifecycleEvent::BecameActive => self.on_became_active(engine, kind),
            LifecycleEvent::WillResignActive | LifecycleEvent::WillEnterForeground => {
                self.move_to(kind, event, SurfaceState::Inactive)
            }
            LifecycleEvent::EnteredBackground => self.on_entered_background(engine, kind),
            LifecycleEvent::Disconnected => self.on_disconnected(engine, kind),
        }
    }

    /// Handle a tap on a surface-owned control.
    ///
    /// Returns `Ok(false)` when the surface is not attached; the tap is
    /// recorded and otherwise ignored.
    pub fn activate_control(&mut self, kind: SurfaceKind, control_id: &str) -> Result<bool> {
        let surface = self
            .surfaces
            .get(&kind)
            .ok_or(RopacalError::SurfaceNotConnected(kind))?;
        let control = surface
            .profile
            .control(control_id)
            .ok_or_else(|| RopacalError::NotImplemented(format!("{kind} control {control_id}")))?;

        if !surface.attached {
            self.diagnostics.record(
                COMPONENT,
                format!("{kind} control {control_id} ignored, surface not attached"),
            );
            return Ok(false);
        }

        let (id, camera) = (surface.id, control.camera);
        self.sdk.follow_my_location(id, camera)?;
        if let Some(surface) = self.surfaces.get_mut(&kind) {
            surface.applied_camera = Some(camera);
        }
        info!(%kind, control_id, zoom = camera.zoom_level, "custom control applied camera");
        Ok(true)
    }

    fn on_connecting(
        &mut self,
        engine: &mut EngineHost,
        kind: SurfaceKind,
    ) -> Result<SurfaceTransition> {
        if self.surfaces.contains_key(&kind) {
            return Err(RopacalError::SurfaceAlreadyConnected(kind));
        }

        let surface = Surface::connect(kind);
        let id = surface.id;
        debug!(%kind, %id, shell = ?surface.shell, "presentation shell built");

        for control in &surface.profile.custom_controls {
            if let Err(e) = self.sdk.register_custom_control(id, control) {
                self.diagnostics.record(
                    COMPONENT,
                    format!("{kind} control {} not registered: {e}", control.id),
                );
            }
        }
        if surface.profile.panning_interface {
            if let Err(e) = self.sdk.show_panning_interface(id, true) {
                self.diagnostics
                    .record(COMPONENT, format!("{kind} panning interface unavailable: {e}"));
            }
        }
        self.surfaces.insert(kind, surface);

        // The surface stays registered even if attachment fails; the next
        // becameActive tries again.
        let engine_id = engine.engine().ok_or(RopacalError::EngineNotCreated)?.id();
        engine.attach(engine_id, id, kind)?;
        let surface = self.surface_mut(kind)?;
        surface.attached = true;
        info!(%kind, %id, "surface connected");

        Ok(transition(surface, LifecycleEvent::Connecting, None, None))
    }

    fn on_became_active(
        &mut self,
        engine: &mut EngineHost,
        kind: SurfaceKind,
    ) -> Result<SurfaceTransition> {
        let surface = self.surface_mut(kind)?;
        let from = surface.state;
        surface.state = SurfaceState::Active;
        let id = surface.id;

        // Only a surface that renders the engine counts as the active one.
        if !self.surface_mut(kind)?.attached {
            let attach = match engine.engine().map(|e| e.id()) {
                Some(engine_id) => engine.attach(engine_id, id, kind),
                None => Err(RopacalError::EngineNotCreated),
            };
            match attach {
                Ok(()) => self.surface_mut(kind)?.attached = true,
                Err(e) => {
                    self.diagnostics.record(
                        COMPONENT,
                        format!("{kind} camera update skipped, surface not attached: {e}"),
                    );
                    let surface = self.surface_mut(kind)?;
                    return Ok(transition(surface, LifecycleEvent::BecameActive, Some(from), None));
                }
            }
        }
        self.active = Some(kind);

        let camera = self.apply_profile(kind)?;
        let surface = self.surface_mut(kind)?;
        Ok(transition(surface, LifecycleEvent::BecameActive, Some(from), camera))
    }

    fn on_entered_background(
        &mut self,
        engine: &mut EngineHost,
        kind: SurfaceKind,
    ) -> Result<SurfaceTransition> {
        let surface = self.surface_mut(kind)?;
        let from = surface.state;
        surface.state = SurfaceState::Background;
        if self.active == Some(kind) {
            self.active = None;
        }
        self.release(engine, kind)?;
        let surface = self.surface_mut(kind)?;
        Ok(transition(surface, LifecycleEvent::EnteredBackground, Some(from), None))
    }

    fn on_disconnected(
        &mut self,
        engine: &mut EngineHost,
        kind: SurfaceKind,
    ) -> Result<SurfaceTransition> {
        let from = self.surface_mut(kind)?.state;
        if self.active == Some(kind) {
            self.active = None;
        }
        self.release(engine, kind)?;
        let mut surface = self
            .surfaces
            .remove(&kind)
            .ok_or(RopacalError::SurfaceNotConnected(kind))?;
        surface.state = SurfaceState::Disconnected;
        info!(%kind, id = %surface.id, "surface disconnected");
        Ok(transition(&surface, LifecycleEvent::Disconnected, Some(from), None))
    }

    fn move_to(
        &mut self,
        kind: SurfaceKind,
        event: LifecycleEvent,
        to: SurfaceState,
    ) -> Result<SurfaceTransition> {
        let surface = self.surface_mut(kind)?;
        let from = surface.state;
        surface.state = to;
        if self.active == Some(kind) {
            self.active = None;
        }
        let surface = self.surface_mut(kind)?;
        Ok(transition(surface, event, Some(from), None))
    }

    /// Detach the surface from the engine if it holds it. SDK failures are
    /// recorded; the engine is released either way.
    fn release(&mut self, engine: &mut EngineHost, kind: SurfaceKind) -> Result<()> {
        let surface = self.surface_mut(kind)?;
        if !surface.attached {
            return Ok(());
        }
        let id = surface.id;
        surface.attached = false;
        let engine_id = engine.engine().ok_or(RopacalError::EngineNotCreated)?.id();
        if let Err(e) = engine.detach(engine_id, id) {
            self.diagnostics
                .record(COMPONENT, format!("{kind} detach reported a native failure: {e}"));
        }
        Ok(())
    }

    /// Push the surface's fixed profile to the SDK. Returns the camera that
    /// was applied, or `None` if the SDK rejected it.
    fn apply_profile(&mut self, kind: SurfaceKind) -> Result<Option<CameraConfig>> {
        let surface = self.surface_mut(kind)?;
        let id = surface.id;
        let profile = surface.profile.clone();

        if let Some(enabled) = profile.compass_enabled {
            if let Err(e) = self.sdk.set_compass_enabled(id, enabled) {
                self.diagnostics
                    .record(COMPONENT, format!("{kind} compass setting failed: {e}"));
            }
        }
        if let Err(e) = self
            .sdk
            .set_recenter_button_enabled(id, profile.native_recenter_enabled)
        {
            self.diagnostics
                .record(COMPONENT, format!("{kind} recenter button setting failed: {e}"));
        }

        match self.sdk.follow_my_location(id, profile.camera) {
            Ok(()) => {
                self.surface_mut(kind)?.applied_camera = Some(profile.camera);
                info!(
                    %kind,
                    zoom = profile.camera.zoom_level,
                    perspective = ?profile.camera.perspective,
                    "surface camera applied"
                );
                Ok(Some(profile.camera))
            }
            Err(e) => {
                self.diagnostics.record(
                    COMPONENT,
                    format!("{kind} camera update failed, retrying on next activation: {e}"),
                );
                Ok(None)
            }
        }
    }

    fn surface_mut(&mut self, kind: SurfaceKind) -> Result<&mut Surface> {
        self.surfaces
            .get_mut(&kind)
            .ok_or(RopacalError::SurfaceNotConnected(kind))
    }
}

fn transition(
    surface: &Surface,
    event: LifecycleEvent,
    from: Option<SurfaceState>,
    camera: Option<CameraConfig>,
) -> SurfaceTransition {
    SurfaceTransition {
        surface: surface.id,
        kind: surface.kind,
        event,
        from,
        to: surface.state,
        attached: surface.attached,
        camera,
    }
}
