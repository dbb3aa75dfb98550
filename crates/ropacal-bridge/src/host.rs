// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Navigation host: wires the engine host, surface coordinator, capability
// registry and bridge channel together behind the two inbound streams the
// native side receives: bridge calls from the UI layer and lifecycle events
// from the host runtime.
//
// There is no internal locking. Whoever owns the host must deliver both
// streams from one thread (the UI thread on device, a single event loop
// task in the host binary).

use std::sync::Arc;

use tracing::{info, instrument, warn};

use ropacal_core::config::HostConfig;
use ropacal_core::error::{Result, RopacalError};
use ropacal_core::types::{EngineState, LifecycleEvent, SurfaceKind};

use crate::capabilities::CapabilityRegistry;
use crate::channel::{BridgeChannel, BridgeResponse, InvocationContext, MethodCall};
use crate::diagnostics::Diagnostics;
use crate::engine::{EngineHost, EngineInstance};
use crate::surface::{Surface, SurfaceCoordinator, SurfaceTransition};
use crate::traits::NavigationSdk;

/// The native side of the app, ready to serve both surfaces.
pub struct NavigationHost {
    channel: BridgeChannel,
    engine: EngineHost,
    coordinator: SurfaceCoordinator,
    diagnostics: Diagnostics,
}

impl NavigationHost {
    /// Provision the SDK, create and run the engine, and register the
    /// capability handlers on the bridge channel.
    ///
    /// Fails with `MissingCredential` when no maps key is configured: no
    /// surface may connect before the SDK has its credential.
    #[instrument(skip_all, fields(channel = %config.channel_name))]
    pub fn new(config: HostConfig, sdk: Arc<dyn NavigationSdk>) -> Result<Self> {
        config.validate()?;
        let key = config
            .maps_api_key
            .as_deref()
            .ok_or(RopacalError::MissingCredential)?;
        sdk.provide_api_key(key)?;
        info!(sdk = sdk.sdk_name(), version = sdk.sdk_version(), "navigation SDK provisioned");

        let diagnostics = Diagnostics::new(config.diagnostics_capacity);

        let mut engine = EngineHost::new(Arc::clone(&sdk));
        let engine_id = engine.get_or_create_engine(&config.engine_name)?.id();
        engine.run(engine_id)?;

        let registry = Arc::new(CapabilityRegistry::for_sdk(
            Arc::clone(&sdk),
            diagnostics.clone(),
        ));
        let mut channel = BridgeChannel::new(config.channel_name.clone());
        channel.set_method_call_handler(registry.clone() as Arc<dyn crate::channel::MethodCallHandler>);

        let coordinator = SurfaceCoordinator::new(sdk, diagnostics.clone());

        info!(capabilities = ?registry.capabilities(), "navigation host ready");
        Ok(Self {
            channel,
            engine,
            coordinator,
            diagnostics,
        })
    }

    /// Answer a bridge call on the host's own channel.
    pub fn invoke(&self, call: &MethodCall) -> BridgeResponse {
        self.channel.invoke(call, &self.invocation_context())
    }

    /// Answer a bridge call addressed to `channel`. Calls for any other
    /// channel than ours answer `NotImplemented`.
    pub fn invoke_on(&self, channel: &str, call: &MethodCall) -> BridgeResponse {
        if channel != self.channel.name() {
            warn!(channel, method = %call.method, "call for unknown channel");
            return BridgeResponse::NotImplemented;
        }
        self.invoke(call)
    }

    /// Apply a lifecycle event from the host runtime.
    pub fn on_lifecycle(
        &mut self,
        kind: SurfaceKind,
        event: LifecycleEvent,
    ) -> Result<SurfaceTransition> {
        self.coordinator.handle_event(&mut self.engine, kind, event)
    }

    /// Forward a tap on a surface-owned control.
    pub fn activate_control(&mut self, kind: SurfaceKind, control_id: &str) -> Result<bool> {
        self.coordinator.activate_control(kind, control_id)
    }

    /// Whether the shared engine is running.
    pub fn is_running(&self) -> bool {
        self.engine.state() == EngineState::Running
    }

    pub fn channel_name(&self) -> &str {
        self.channel.name()
    }

    pub fn engine(&self) -> Option<&EngineInstance> {
        self.engine.engine()
    }

    pub fn surface(&self, kind: SurfaceKind) -> Option<&Surface> {
        self.coordinator.surface(kind)
    }

    pub fn active_surface(&self) -> Option<SurfaceKind> {
        self.coordinator.active()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn invocation_context(&self) -> InvocationContext {
        InvocationContext {
            engine_state: self.engine.state(),
            attached_surface: self.engine.engine().and_then(|e| e.attached_surface()),
        }
    }
}

impl std::fmt::Debug for NavigationHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationHost")
            .field("channel", &self.channel.name())
            .field("engine_state", &self.engine.state())
            .field("active_surface", &self.coordinator.active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{FORCE_DAY_MODE, IS_AVAILABLE};
    use crate::stub::StubNavigationSdk;
    use crate::traits::EntryPoint;
    use serde_json::{Value, json};

    fn config() -> HostConfig {
        HostConfig {
            maps_api_key: Some("test-key".into()),
            ..Default::default()
        }
    }

    fn host_with(sdk: Arc<StubNavigationSdk>) -> NavigationHost {
        NavigationHost::new(config(), sdk).unwrap()
    }

    #[test]
    fn startup_provisions_then_runs_engine() {
        let sdk = Arc::new(StubNavigationSdk::new());
        let host = host_with(sdk.clone());
        assert!(host.is_running());
        let ops: Vec<&str> = sdk.calls().iter().map(|c| c.operation()).collect();
        assert_eq!(ops, vec!["provide_api_key", "create_engine", "run_engine"]);
    }

    #[test]
    fn startup_without_credential_fails() {
        let err = NavigationHost::new(HostConfig::default(), Arc::new(StubNavigationSdk::new()))
            .unwrap_err();
        assert!(matches!(err, RopacalError::MissingCredential));
    }

    #[test]
    fn is_available_answers_true() {
        let host = host_with(Arc::new(StubNavigationSdk::new()));
        assert_eq!(
            host.invoke(&MethodCall::new(IS_AVAILABLE)),
            BridgeResponse::Success(json!(true))
        );
    }

    #[test]
    fn force_day_mode_on_shipping_build_answers_false_and_logs() {
        let host = host_with(Arc::new(StubNavigationSdk::new()));
        let resp = host.invoke(&MethodCall::new(FORCE_DAY_MODE));
        assert_eq!(resp, BridgeResponse::Success(Value::Bool(false)));

        let entries = host.diagnostics().entries_for("capabilities");
        assert_eq!(entries.len(), 1);
        assert!(entries[0].message.contains(FORCE_DAY_MODE));
    }

    #[test]
    fn force_day_mode_with_entry_point_needs_an_attached_surface() {
        let sdk = Arc::new(StubNavigationSdk::with_entry_points(vec![
            EntryPoint::ForceDayMode,
        ]));
        let mut host = host_with(sdk.clone());
        let call = MethodCall::new(FORCE_DAY_MODE);
        assert_eq!(host.invoke(&call), BridgeResponse::Success(json!(false)));

        host.on_lifecycle(SurfaceKind::Phone, LifecycleEvent::Connecting)
            .unwrap();
        assert_eq!(host.invoke(&call), BridgeResponse::Success(json!(true)));
        assert_eq!(sdk.count("force_day_mode"), 1);
    }

    #[test]
    fn native_failure_reaches_the_ui_as_structured_error() {
        let sdk = Arc::new(StubNavigationSdk::with_entry_points(vec![
            EntryPoint::ForceDayMode,
        ]));
        let mut host = host_with(sdk.clone());
        host.on_lifecycle(SurfaceKind::Phone, LifecycleEvent::Connecting)
            .unwrap();
        sdk.fail_operation("force_day_mode", "ClassCastException");

        match host.invoke(&MethodCall::new(FORCE_DAY_MODE)) {
            BridgeResponse::Error(err) => {
                assert_eq!(err.code, "FORCE_DAY_MODE_ERROR");
                assert!(err.detail.unwrap().contains("ClassCastException"));
                assert!(!err.message.contains("ClassCastException"));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_method_is_not_implemented() {
        let host = host_with(Arc::new(StubNavigationSdk::new()));
        let resp = host.invoke(&MethodCall::new("unknownThing").with_arguments(json!([1, 2, 3])));
        assert_eq!(resp, BridgeResponse::NotImplemented);
    }

    #[test]
    fn foreign_channel_is_not_implemented() {
        let host = host_with(Arc::new(StubNavigationSdk::new()));
        assert_eq!(
            host.invoke_on("com.other/channel", &MethodCall::new(IS_AVAILABLE)),
            BridgeResponse::NotImplemented
        );
        assert_eq!(
            host.invoke_on("com.ropacal.app/navigation", &MethodCall::new(IS_AVAILABLE)),
            BridgeResponse::Success(json!(true))
        );
    }

    #[test]
    fn car_session_without_phone_leaves_engine_running_unattached() {
        let mut host = host_with(Arc::new(StubNavigationSdk::new()));
        host.on_lifecycle(SurfaceKind::Automotive, LifecycleEvent::Connecting)
            .unwrap();
        host.on_lifecycle(SurfaceKind::Automotive, LifecycleEvent::BecameActive)
            .unwrap();
        assert_eq!(host.active_surface(), Some(SurfaceKind::Automotive));
        host.on_lifecycle(SurfaceKind::Automotive, LifecycleEvent::Disconnected)
            .unwrap();

        let engine = host.engine().unwrap();
        assert_eq!(engine.state(), EngineState::Running);
        assert!(engine.attached().is_empty());
        assert!(host.surface(SurfaceKind::Phone).is_none());
        assert!(host.surface(SurfaceKind::Automotive).is_none());
    }

    #[test]
    fn car_and_phone_round_trip_keeps_cameras_apart() {
        let sdk = Arc::new(StubNavigationSdk::new());
        let mut host = host_with(sdk.clone());

        let car = host
            .on_lifecycle(SurfaceKind::Automotive, LifecycleEvent::Connecting)
            .unwrap()
            .surface;
        host.on_lifecycle(SurfaceKind::Automotive, LifecycleEvent::BecameActive)
            .unwrap();
        host.on_lifecycle(SurfaceKind::Automotive, LifecycleEvent::EnteredBackground)
            .unwrap();

        let phone = host
            .on_lifecycle(SurfaceKind::Phone, LifecycleEvent::Connecting)
            .unwrap()
            .surface;
        host.on_lifecycle(SurfaceKind::Phone, LifecycleEvent::BecameActive)
            .unwrap();
        assert_eq!(sdk.last_camera(phone).unwrap().zoom_level, 15.0);
        host.on_lifecycle(SurfaceKind::Phone, LifecycleEvent::EnteredBackground)
            .unwrap();

        let back = host
            .on_lifecycle(SurfaceKind::Automotive, LifecycleEvent::BecameActive)
            .unwrap();
        assert_eq!(back.camera.unwrap().zoom_level, 13.0);
        assert_eq!(sdk.last_camera(car).unwrap().zoom_level, 13.0);
        assert_eq!(
            host.surface(SurfaceKind::Phone).unwrap().applied_camera().unwrap().zoom_level,
            15.0
        );
    }
}
