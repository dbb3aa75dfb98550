// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub SDK for desktop/CI builds where the vendor navigation SDK is absent.
//
// Every call is recorded so tests and the host binary can see exactly what
// would have reached the native engine. Failures can be injected per
// operation.

use std::collections::HashMap;
use std::sync::Mutex;

use ropacal_core::error::{Result, RopacalError};
use ropacal_core::types::{CameraConfig, CustomControl, EngineId, SurfaceId, SurfaceKind};

use crate::traits::*;

/// A call that reached the stub SDK.
#[derive(Debug, Clone, PartialEq)]
pub enum SdkCall {
    ProvideApiKey,
    CreateEngine { id: EngineId, name: String },
    RunEngine { id: EngineId },
    AttachView { id: EngineId, surface: SurfaceId, kind: SurfaceKind },
    DetachView { id: EngineId, surface: SurfaceId },
    FollowMyLocation { surface: SurfaceId, camera: CameraConfig },
    SetCompassEnabled { surface: SurfaceId, enabled: bool },
    SetRecenterButtonEnabled { surface: SurfaceId, enabled: bool },
    ShowPanningInterface { surface: SurfaceId, enabled: bool },
    RegisterCustomControl { surface: SurfaceId, control_id: String },
    ForceDayMode,
}

impl SdkCall {
    /// Operation name used to key injected failures.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::ProvideApiKey => "provide_api_key",
            Self::CreateEngine { .. } => "create_engine",
            Self::RunEngine { .. } => "run_engine",
            Self::AttachView { .. } => "attach_view",
            Self::DetachView { .. } => "detach_view",
            Self::FollowMyLocation { .. } => "follow_my_location",
            Self::SetCompassEnabled { .. } => "set_compass_enabled",
            Self::SetRecenterButtonEnabled { .. } => "set_recenter_button_enabled",
            Self::ShowPanningInterface { .. } => "show_panning_interface",
            Self::RegisterCustomControl { .. } => "register_custom_control",
            Self::ForceDayMode => "force_day_mode",
        }
    }
}

/// Recording SDK returned on non-mobile platforms.
pub struct StubNavigationSdk {
    version: String,
    entry_points: Vec<EntryPoint>,
    calls: Mutex<Vec<SdkCall>>,
    failures: Mutex<HashMap<&'static str, String>>,
}

impl Default for StubNavigationSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl StubNavigationSdk {
    /// A stub matching the shipping build: no optional entry points.
    pub fn new() -> Self {
        Self::with_entry_points(Vec::new())
    }

    /// A stub declaring the given optional entry points.
    pub fn with_entry_points(entry_points: Vec<EntryPoint>) -> Self {
        Self {
            version: "0.7.0-stub".into(),
            entry_points,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Make every later call to `operation` fail with `detail`.
    pub fn fail_operation(&self, operation: &'static str, detail: impl Into<String>) {
        self.failures
            .lock()
            .expect("stub failures lock poisoned")
            .insert(operation, detail.into());
    }

    /// Stop injecting failures for `operation`.
    pub fn clear_failure(&self, operation: &'static str) {
        self.failures
            .lock()
            .expect("stub failures lock poisoned")
            .remove(operation);
    }

    /// Snapshot of every recorded call, oldest first.
    pub fn calls(&self) -> Vec<SdkCall> {
        self.calls.lock().expect("stub calls lock poisoned").clone()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().expect("stub calls lock poisoned").clear();
    }

    /// Number of recorded calls for one operation.
    pub fn count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .expect("stub calls lock poisoned")
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    /// Last camera applied to `surface`, if any.
    pub fn last_camera(&self, surface: SurfaceId) -> Option<CameraConfig> {
        self.calls
            .lock()
            .expect("stub calls lock poisoned")
            .iter()
            .rev()
            .find_map(|c| match c {
                SdkCall::FollowMyLocation { surface: s, camera } if *s == surface => Some(*camera),
                _ => None,
            })
    }

    /// Record the call, or fail it if a failure was injected.
    fn record(&self, call: SdkCall) -> Result<()> {
        let failure = self
            .failures
            .lock()
            .expect("stub failures lock poisoned")
            .get(call.operation())
            .cloned();
        if let Some(detail) = failure {
            tracing::warn!(operation = call.operation(), "stub SDK injected failure");
            return Err(RopacalError::Sdk(detail));
        }
        tracing::trace!(?call, "stub SDK call");
        self.calls.lock().expect("stub calls lock poisoned").push(call);
        Ok(())
    }
}

impl NavigationSdk for StubNavigationSdk {
    fn sdk_name(&self) -> &str {
        "Navigation SDK (stub)"
    }

    fn sdk_version(&self) -> &str {
        &self.version
    }

    fn entry_points(&self) -> &[EntryPoint] {
        &self.entry_points
    }

    fn provide_api_key(&self, _key: &str) -> Result<()> {
        self.record(SdkCall::ProvideApiKey)
    }
}

impl NativeEngine for StubNavigationSdk {
    fn create_engine(&self, id: EngineId, name: &str) -> Result<()> {
        self.record(SdkCall::CreateEngine {
            id,
            name: name.to_string(),
        })
    }

    fn run_engine(&self, id: EngineId) -> Result<()> {
        self.record(SdkCall::RunEngine { id })
    }

    fn attach_view(&self, id: EngineId, surface: SurfaceId, kind: SurfaceKind) -> Result<()> {
        self.record(SdkCall::AttachView { id, surface, kind })
    }

    fn detach_view(&self, id: EngineId, surface: SurfaceId) -> Result<()> {
        self.record(SdkCall::DetachView { id, surface })
    }
}

impl NativeCamera for StubNavigationSdk {
    fn follow_my_location(&self, surface: SurfaceId, camera: CameraConfig) -> Result<()> {
        self.record(SdkCall::FollowMyLocation { surface, camera })
    }
}

impl NativeChrome for StubNavigationSdk {
    fn set_compass_enabled(&self, surface: SurfaceId, enabled: bool) -> Result<()> {
        self.record(SdkCall::SetCompassEnabled { surface, enabled })
    }

    fn set_recenter_button_enabled(&self, surface: SurfaceId, enabled: bool) -> Result<()> {
        self.record(SdkCall::SetRecenterButtonEnabled { surface, enabled })
    }

    fn show_panning_interface(&self, surface: SurfaceId, enabled: bool) -> Result<()> {
        self.record(SdkCall::ShowPanningInterface { surface, enabled })
    }
}

impl NativeControls for StubNavigationSdk {
    fn register_custom_control(&self, surface: SurfaceId, control: &CustomControl) -> Result<()> {
        self.record(SdkCall::RegisterCustomControl {
            surface,
            control_id: control.id.clone(),
        })
    }
}

impl NativeLighting for StubNavigationSdk {
    fn force_day_mode(&self) -> Result<()> {
        self.record(SdkCall::ForceDayMode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ropacal_core::types::CameraPerspective;

    #[test]
    fn records_calls_in_order() {
        let sdk = StubNavigationSdk::new();
        let engine = EngineId::new();
        sdk.create_engine(engine, "test").unwrap();
        sdk.run_engine(engine).unwrap();

        let calls = sdk.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].operation(), "create_engine");
        assert_eq!(calls[1], SdkCall::RunEngine { id: engine });
    }

    #[test]
    fn injected_failure_is_not_recorded() {
        let sdk = StubNavigationSdk::new();
        sdk.fail_operation("force_day_mode", "obfuscated");
        let err = sdk.force_day_mode().unwrap_err();
        assert!(matches!(err, RopacalError::Sdk(ref d) if d == "obfuscated"));
        assert_eq!(sdk.count("force_day_mode"), 0);

        sdk.clear_failure("force_day_mode");
        sdk.force_day_mode().unwrap();
        assert_eq!(sdk.count("force_day_mode"), 1);
    }

    #[test]
    fn last_camera_is_per_surface() {
        let sdk = StubNavigationSdk::new();
        let car = SurfaceId::new();
        let phone = SurfaceId::new();
        let tilted = |zoom_level| CameraConfig {
            perspective: CameraPerspective::Tilted,
            zoom_level,
        };
        sdk.follow_my_location(car, tilted(13.0)).unwrap();
        sdk.follow_my_location(phone, tilted(15.0)).unwrap();

        assert_eq!(sdk.last_camera(car).unwrap().zoom_level, 13.0);
        assert_eq!(sdk.last_camera(phone).unwrap().zoom_level, 15.0);
        assert!(sdk.last_camera(SurfaceId::new()).is_none());
    }

    #[test]
    fn shipping_stub_declares_no_optional_entry_points() {
        assert!(StubNavigationSdk::new().entry_points().is_empty());
        let full = StubNavigationSdk::with_entry_points(vec![EntryPoint::ForceDayMode]);
        assert_eq!(full.entry_points(), &[EntryPoint::ForceDayMode]);
    }
}
