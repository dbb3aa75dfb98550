// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability registry: which native features the UI layer can actually
// invoke on this SDK build, and what to answer when it cannot.
//
// Availability is decided once, when the registry is built, from the entry
// points the SDK binding declares. A capability the build cannot reach is
// permanently `Unavailable`; invoking it answers with the capability's
// fallback value so the UI layer switches to its own implementation.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info};

use ropacal_core::error::{Result, RopacalError};
use ropacal_core::types::EngineState;

use crate::channel::{InvocationContext, MethodCall, MethodCallHandler};
use crate::diagnostics::Diagnostics;
use crate::traits::{EntryPoint, NavigationSdk};

/// Bridge method: is the native bridge present at all.
pub const IS_AVAILABLE: &str = "isAvailable";

/// Bridge method: force day lighting on the map.
pub const FORCE_DAY_MODE: &str = "forceDayMode";

const COMPONENT: &str = "capabilities";

/// Whether a capability can be invoked on this build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable(String),
}

/// Runtime precondition checked on every invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    None,
    /// The engine must be running and rendering into some surface.
    AttachedSurface,
}

/// Result of invoking a capability that exists.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityOutcome {
    /// The native handler ran.
    Completed(Value),
    /// The capability cannot run here; the caller should fall back.
    Unsupported { reason: String },
}

type Handler = Box<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// A named native feature exposed over the bridge.
pub struct Capability {
    id: String,
    availability: Availability,
    requirement: Requirement,
    unsupported_value: Value,
    error_code: String,
    handler: Handler,
}

impl Capability {
    pub fn new(
        id: impl Into<String>,
        availability: Availability,
        handler: impl Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        let id = id.into();
        let error_code = format!("{}_ERROR", screaming_snake(&id));
        Self {
            id,
            availability,
            requirement: Requirement::None,
            unsupported_value: Value::Bool(false),
            error_code,
            handler: Box::new(handler),
        }
    }

    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requirement = requirement;
        self
    }

    /// Value answered when the capability is unsupported (default `false`).
    pub fn unsupported_value(mut self, value: Value) -> Self {
        self.unsupported_value = value;
        self
    }

    pub fn error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = code.into();
        self
    }

    /// Reason this capability cannot run under `ctx`, if any.
    fn blocked_reason(&self, ctx: &InvocationContext) -> Option<String> {
        if let Availability::Unavailable(reason) = &self.availability {
            return Some(reason.clone());
        }
        match self.requirement {
            Requirement::None => None,
            Requirement::AttachedSurface if ctx.engine_state != EngineState::Running => {
                Some(format!("navigation engine is {:?}, not running", ctx.engine_state))
            }
            Requirement::AttachedSurface if ctx.attached_surface.is_none() => {
                Some("no surface is attached to the navigation engine".into())
            }
            Requirement::AttachedSurface => None,
        }
    }
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability")
            .field("id", &self.id)
            .field("availability", &self.availability)
            .field("requirement", &self.requirement)
            .finish_non_exhaustive()
    }
}

/// Static table of capabilities, built once per engine initialisation.
#[derive(Debug)]
pub struct CapabilityRegistry {
    capabilities: HashMap<String, Capability>,
    diagnostics: Diagnostics,
}

impl CapabilityRegistry {
    /// An empty registry.
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            capabilities: HashMap::new(),
            diagnostics,
        }
    }

    /// The registry for the app's documented bridge methods on `sdk`.
    pub fn for_sdk(sdk: Arc<dyn NavigationSdk>, diagnostics: Diagnostics) -> Self {
        let mut registry = Self::new(diagnostics);

        registry.register(Capability::new(IS_AVAILABLE, Availability::Available, |_| {
            Ok(Value::Bool(true))
        }));

        let day_mode = if sdk.entry_points().contains(&EntryPoint::ForceDayMode) {
            Availability::Available
        } else {
            Availability::Unavailable(format!(
                "ForceNightMode API is not exposed by {} {}",
                sdk.sdk_name(),
                sdk.sdk_version()
            ))
        };
        let lighting = Arc::clone(&sdk);
        registry.register(
            Capability::new(FORCE_DAY_MODE, day_mode, move |_| {
                lighting.force_day_mode()?;
                Ok(Value::Bool(true))
            })
            .requires(Requirement::AttachedSurface)
            .unsupported_value(Value::Bool(false))
            .error_code("FORCE_DAY_MODE_ERROR"),
        );

        for cap in registry.capabilities.values() {
            debug!(id = %cap.id, availability = ?cap.availability, "capability registered");
        }
        registry
    }

    /// Add or replace a capability.
    pub fn register(&mut self, capability: Capability) {
        self.capabilities.insert(capability.id.clone(), capability);
    }

    /// Whether `id` exists and is available on this build.
    pub fn is_available(&self, id: &str) -> bool {
        matches!(self.availability(id), Some(Availability::Available))
    }

    pub fn availability(&self, id: &str) -> Option<&Availability> {
        self.capabilities.get(id).map(|c| &c.availability)
    }

    /// Registered capability ids, sorted.
    pub fn capabilities(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.capabilities.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Invoke a capability.
    ///
    /// Unknown ids are `Err(NotImplemented)`. Unavailable capabilities and
    /// unmet preconditions are `Ok(Unsupported)`. Native failures are
    /// `Err(NativeInvocation)` with the capability's error code.
    pub fn invoke(
        &self,
        id: &str,
        args: &Value,
        ctx: &InvocationContext,
    ) -> Result<CapabilityOutcome> {
        let cap = self
            .capabilities
            .get(id)
            .ok_or_else(|| RopacalError::NotImplemented(id.to_string()))?;

        if let Some(reason) = cap.blocked_reason(ctx) {
            self.diagnostics
                .record(COMPONENT, format!("{id} unsupported, UI layer falls back: {reason}"));
            return Ok(CapabilityOutcome::Unsupported { reason });
        }

        match (cap.handler)(args) {
            Ok(value) => {
                info!(id, "capability executed");
                Ok(CapabilityOutcome::Completed(value))
            }
            Err(err) => {
                error!(id, error = %err, "capability failed");
                Err(native_error(cap, err))
            }
        }
    }
}

impl MethodCallHandler for CapabilityRegistry {
    fn on_method_call(&self, call: &MethodCall, ctx: &InvocationContext) -> Result<Value> {
        match self.invoke(&call.method, &call.arguments, ctx)? {
            CapabilityOutcome::Completed(value) => Ok(value),
            CapabilityOutcome::Unsupported { .. } => Ok(self
                .capabilities
                .get(&call.method)
                .map_or(Value::Bool(false), |cap| cap.unsupported_value.clone())),
        }
    }
}

/// Wrap a native failure in the capability's error code, keeping the
/// original diagnostic in `detail`.
fn native_error(cap: &Capability, err: RopacalError) -> RopacalError {
    match err {
        RopacalError::NativeInvocation { .. } => err,
        other => RopacalError::NativeInvocation {
            code: cap.error_code.clone(),
            message: format!("{} could not be applied", cap.id),
            detail: other.to_string(),
        },
    }
}

/// "forceDayMode" -> "FORCE_DAY_MODE".
fn screaming_snake(id: &str) -> String {
    let mut out = String::with_capacity(id.len() + 4);
    for (i, ch) in id.chars().enumerate() {
        if ch.is_ascii_uppercase() && i > 0 {
            out.push('_');
        }
        out.push(ch.to_ascii_uppercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubNavigationSdk;
    use ropacal_core::types::{SurfaceId, SurfaceKind};
    use serde_json::json;

    fn attached() -> InvocationContext {
        InvocationContext {
            engine_state: EngineState::Running,
            attached_surface: Some((SurfaceId::new(), SurfaceKind::Phone)),
        }
    }

    fn registry_for(sdk: Arc<StubNavigationSdk>) -> (CapabilityRegistry, Diagnostics) {
        let diag = Diagnostics::new(16);
        (CapabilityRegistry::for_sdk(sdk, diag.clone()), diag)
    }

    #[test]
    fn is_available_always_answers_true() {
        let (reg, _) = registry_for(Arc::new(StubNavigationSdk::new()));
        assert!(reg.is_available(IS_AVAILABLE));
        let out = reg
            .invoke(IS_AVAILABLE, &Value::Null, &InvocationContext::detached())
            .unwrap();
        assert_eq!(out, CapabilityOutcome::Completed(json!(true)));
    }

    #[test]
    fn day_mode_without_entry_point_is_permanently_unsupported() {
        let sdk = Arc::new(StubNavigationSdk::new());
        let (reg, diag) = registry_for(Arc::clone(&sdk));
        assert!(!reg.is_available(FORCE_DAY_MODE));
        assert!(matches!(
            reg.availability(FORCE_DAY_MODE),
            Some(Availability::Unavailable(reason)) if reason.contains("ForceNightMode")
        ));

        for _ in 0..3 {
            let out = reg.invoke(FORCE_DAY_MODE, &json!({}), &attached()).unwrap();
            assert!(matches!(out, CapabilityOutcome::Unsupported { .. }));
        }
        // The SDK is never touched.
        assert_eq!(sdk.count("force_day_mode"), 0);
        assert_eq!(diag.entries_for("capabilities").len(), 3);
    }

    #[test]
    fn day_mode_with_entry_point_runs_the_sdk() {
        let sdk = Arc::new(StubNavigationSdk::with_entry_points(vec![
            EntryPoint::ForceDayMode,
        ]));
        let (reg, _) = registry_for(Arc::clone(&sdk));
        assert!(reg.is_available(FORCE_DAY_MODE));

        let out = reg.invoke(FORCE_DAY_MODE, &Value::Null, &attached()).unwrap();
        assert_eq!(out, CapabilityOutcome::Completed(json!(true)));
        assert_eq!(sdk.count("force_day_mode"), 1);
    }

    #[test]
    fn day_mode_needs_an_attached_surface() {
        let sdk = Arc::new(StubNavigationSdk::with_entry_points(vec![
            EntryPoint::ForceDayMode,
        ]));
        let (reg, _) = registry_for(Arc::clone(&sdk));
        let out = reg
            .invoke(FORCE_DAY_MODE, &Value::Null, &InvocationContext::detached())
            .unwrap();
        assert!(matches!(out, CapabilityOutcome::Unsupported { .. }));
        assert_eq!(sdk.count("force_day_mode"), 0);
    }

    #[test]
    fn day_mode_needs_a_running_engine() {
        let sdk = Arc::new(StubNavigationSdk::with_entry_points(vec![
            EntryPoint::ForceDayMode,
        ]));
        let (reg, diag) = registry_for(Arc::clone(&sdk));
        let ctx = InvocationContext {
            engine_state: EngineState::Created,
            ..attached()
        };
        match reg.invoke(FORCE_DAY_MODE, &Value::Null, &ctx).unwrap() {
            CapabilityOutcome::Unsupported { reason } => assert!(reason.contains("Created")),
            other => panic!("expected unsupported, got {other:?}"),
        }
        assert_eq!(sdk.count("force_day_mode"), 0);
        assert_eq!(diag.entries_for("capabilities").len(), 1);
    }

    #[test]
    fn custom_fallback_value_is_answered_when_unsupported() {
        let mut reg = CapabilityRegistry::new(Diagnostics::new(4));
        reg.register(
            Capability::new(
                "routePreview",
                Availability::Unavailable("no preview API".into()),
                |_| Ok(json!("shown")),
            )
            .unsupported_value(Value::Null),
        );
        let value = reg
            .on_method_call(&MethodCall::new("routePreview"), &attached())
            .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn native_failure_maps_to_capability_error_code() {
        let sdk = Arc::new(StubNavigationSdk::with_entry_points(vec![
            EntryPoint::ForceDayMode,
        ]));
        sdk.fail_operation("force_day_mode", "NoSuchMethodError: a.b.c");
        let (reg, _) = registry_for(Arc::clone(&sdk));

        let err = reg.invoke(FORCE_DAY_MODE, &Value::Null, &attached()).unwrap_err();
        match err {
            RopacalError::NativeInvocation { code, detail, .. } => {
                assert_eq!(code, "FORCE_DAY_MODE_ERROR");
                assert!(detail.contains("NoSuchMethodError"));
            }
            other => panic!("expected native invocation error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_capability_is_not_implemented() {
        let (reg, _) = registry_for(Arc::new(StubNavigationSdk::new()));
        let err = reg
            .invoke("unknownThing", &Value::Null, &attached())
            .unwrap_err();
        assert!(matches!(err, RopacalError::NotImplemented(ref m) if m == "unknownThing"));
    }

    #[test]
    fn handler_answers_fallback_value_when_unsupported() {
        let (reg, _) = registry_for(Arc::new(StubNavigationSdk::new()));
        let value = reg
            .on_method_call(&MethodCall::new(FORCE_DAY_MODE), &attached())
            .unwrap();
        assert_eq!(value, json!(false));
    }

    #[test]
    fn custom_capability_uses_derived_error_code() {
        let mut reg = CapabilityRegistry::new(Diagnostics::new(4));
        reg.register(Capability::new("setVoiceGuidance", Availability::Available, |_| {
            Err(RopacalError::Sdk("audio session busy".into()))
        }));
        let err = reg
            .invoke("setVoiceGuidance", &Value::Null, &InvocationContext::detached())
            .unwrap_err();
        assert_eq!(err.bridge_code(), "SET_VOICE_GUIDANCE_ERROR");
        assert_eq!(reg.capabilities(), vec!["setVoiceGuidance"]);
    }
}
