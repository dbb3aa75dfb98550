// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge channel: the named request/response transport between the UI layer
// and the native host.
//
// Wire shapes (JSON):
//   request   {"method": "forceDayMode", "arguments": <any>}
//   response  {"success": <any>} | "notImplemented"
//             | {"error": {"code": "...", "message": "...", "detail": "..."}}
//
// The channel never raises. Whatever the handler does (returns, fails,
// panics), the caller gets exactly one response value.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use ropacal_core::error::{Result, RopacalError};
use ropacal_core::types::{EngineState, SurfaceId, SurfaceKind};

/// One method invocation from the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    /// A call without arguments.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: Value::Null,
        }
    }

    pub fn with_arguments(mut self, arguments: Value) -> Self {
        self.arguments = arguments;
        self
    }
}

/// Structured failure sent back to the UI layer.
///
/// `message` is safe to surface; `detail` carries the raw native diagnostic
/// for logs only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeError {
    pub code: String,
    pub message: String,
    pub detail: Option<String>,
}

impl From<&RopacalError> for BridgeError {
    fn from(err: &RopacalError) -> Self {
        match err {
            RopacalError::NativeInvocation {
                code,
                message,
                detail,
            } => Self {
                code: code.clone(),
                message: message.clone(),
                detail: Some(detail.clone()),
            },
            other => Self {
                code: other.bridge_code().to_string(),
                message: other.to_string(),
                detail: Some(format!("{other:?}")),
            },
        }
    }
}

/// The single response to a [`MethodCall`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BridgeResponse {
    Success(Value),
    /// No such method exists at all.
    NotImplemented,
    Error(BridgeError),
}

impl BridgeResponse {
    /// Convert a handler result into a response.
    pub fn from_result(result: Result<Value>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(RopacalError::NotImplemented(_)) => Self::NotImplemented,
            Err(err) => Self::Error(BridgeError::from(&err)),
        }
    }
}

/// Engine/surface state visible to handlers at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvocationContext {
    pub engine_state: EngineState,
    /// The surface currently rendering the engine, if any.
    pub attached_surface: Option<(SurfaceId, SurfaceKind)>,
}

impl InvocationContext {
    /// Context with no engine and nothing attached.
    pub fn detached() -> Self {
        Self {
            engine_state: EngineState::Uninitialized,
            attached_surface: None,
        }
    }
}

/// The handler set registered on a channel.
///
/// Return `Err(RopacalError::NotImplemented)` for methods the handler does
/// not know.
pub trait MethodCallHandler: Send + Sync {
    fn on_method_call(&self, call: &MethodCall, ctx: &InvocationContext) -> Result<Value>;
}

/// A named bridge channel with at most one handler set.
pub struct BridgeChannel {
    name: String,
    handler: Option<Arc<dyn MethodCallHandler>>,
}

impl BridgeChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handler: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Register the handler set, replacing any previous one in a single swap.
    pub fn set_method_call_handler(&mut self, handler: Arc<dyn MethodCallHandler>) {
        if self.handler.replace(handler).is_some() {
            debug!(channel = %self.name, "replaced method call handler");
        }
    }

    /// Remove the handler set; later calls answer `NotImplemented`.
    pub fn clear_method_call_handler(&mut self) {
        self.handler = None;
    }

    /// Dispatch one call and produce its response.
    pub fn invoke(&self, call: &MethodCall, ctx: &InvocationContext) -> BridgeResponse {
        let Some(handler) = self.handler.as_ref() else {
            warn!(channel = %self.name, method = %call.method, "no handler registered");
            return BridgeResponse::NotImplemented;
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| handler.on_method_call(call, ctx)));
        let response = match outcome {
            Ok(result) => BridgeResponse::from_result(result),
            Err(payload) => {
                let detail = panic_message(payload.as_ref());
                error!(
                    channel = %self.name,
                    method = %call.method,
                    %detail,
                    "method handler panicked"
                );
                BridgeResponse::Error(BridgeError {
                    code: "HANDLER_PANIC".into(),
                    message: format!("native handler for {} failed", call.method),
                    detail: Some(detail),
                })
            }
        };

        debug!(channel = %self.name, method = %call.method, ?response, "bridge call answered");
        response
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    impl MethodCallHandler for Echo {
        fn on_method_call(&self, call: &MethodCall, _ctx: &InvocationContext) -> Result<Value> {
            match call.method.as_str() {
                "echo" => Ok(call.arguments.clone()),
                "fail" => Err(RopacalError::NativeInvocation {
                    code: "ECHO_ERROR".into(),
                    message: "echo failed".into(),
                    detail: "java.lang.IllegalStateException".into(),
                }),
                "panic" => panic!("handler blew up"),
                other => Err(RopacalError::NotImplemented(other.into())),
            }
        }
    }

    struct Constant(bool);

    impl MethodCallHandler for Constant {
        fn on_method_call(&self, _call: &MethodCall, _ctx: &InvocationContext) -> Result<Value> {
            Ok(Value::Bool(self.0))
        }
    }

    fn channel() -> BridgeChannel {
        let mut ch = BridgeChannel::new("test/channel");
        ch.set_method_call_handler(Arc::new(Echo));
        ch
    }

    #[test]
    fn success_carries_handler_value() {
        let resp = channel().invoke(
            &MethodCall::new("echo").with_arguments(json!({"a": 1})),
            &InvocationContext::detached(),
        );
        assert_eq!(resp, BridgeResponse::Success(json!({"a": 1})));
    }

    #[test]
    fn unknown_method_is_not_implemented_for_any_payload() {
        let ch = channel();
        for args in [Value::Null, json!(42), json!({"x": [1, 2]}), json!("s")] {
            let resp = ch.invoke(
                &MethodCall::new("unknownThing").with_arguments(args),
                &InvocationContext::detached(),
            );
            assert_eq!(resp, BridgeResponse::NotImplemented);
        }
    }

    #[test]
    fn handler_failure_becomes_structured_error() {
        let resp = channel().invoke(&MethodCall::new("fail"), &InvocationContext::detached());
        match resp {
            BridgeResponse::Error(err) => {
                assert_eq!(err.code, "ECHO_ERROR");
                assert_eq!(err.message, "echo failed");
                assert_eq!(err.detail.as_deref(), Some("java.lang.IllegalStateException"));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn handler_panic_is_contained() {
        let resp = channel().invoke(&MethodCall::new("panic"), &InvocationContext::detached());
        match resp {
            BridgeResponse::Error(err) => {
                assert_eq!(err.code, "HANDLER_PANIC");
                assert_eq!(err.detail.as_deref(), Some("handler blew up"));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn no_handler_means_not_implemented() {
        let ch = BridgeChannel::new("empty");
        assert!(!ch.has_handler());
        let resp = ch.invoke(&MethodCall::new("isAvailable"), &InvocationContext::detached());
        assert_eq!(resp, BridgeResponse::NotImplemented);
    }

    #[test]
    fn reregistration_replaces_the_whole_handler_set() {
        let mut ch = BridgeChannel::new("swap");
        ch.set_method_call_handler(Arc::new(Constant(true)));
        ch.set_method_call_handler(Arc::new(Constant(false)));
        let resp = ch.invoke(&MethodCall::new("anything"), &InvocationContext::detached());
        assert_eq!(resp, BridgeResponse::Success(Value::Bool(false)));

        ch.clear_method_call_handler();
        let resp = ch.invoke(&MethodCall::new("anything"), &InvocationContext::detached());
        assert_eq!(resp, BridgeResponse::NotImplemented);
    }

    #[test]
    fn wire_format_matches_the_ui_protocol() {
        assert_eq!(
            serde_json::to_value(BridgeResponse::Success(json!(true))).unwrap(),
            json!({"success": true})
        );
        assert_eq!(
            serde_json::to_value(BridgeResponse::NotImplemented).unwrap(),
            json!("notImplemented")
        );
        let call: MethodCall = serde_json::from_str(r#"{"method":"isAvailable"}"#).unwrap();
        assert_eq!(call, MethodCall::new("isAvailable"));
    }
}
