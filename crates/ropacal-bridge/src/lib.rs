// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ropacal: native side of the navigation app.
//
// Hosts one navigation engine for both the phone screen and the car head
// unit, and answers the UI layer's bridge calls:
//
//   UI layer -> BridgeChannel -> CapabilityRegistry -> NavigationSdk
//   host runtime -> SurfaceCoordinator -> EngineHost -> NavigationSdk
//
// The vendor SDK is reached only through the traits in `traits`. Device
// embedders implement them over the vendor bindings; desktop and CI builds
// use the recording `stub` implementation.

pub mod capabilities;
pub mod channel;
pub mod diagnostics;
pub mod engine;
pub mod host;
#[cfg(any(test, not(any(target_os = "ios", target_os = "android"))))]
pub mod stub;
pub mod surface;
pub mod traits;

pub use capabilities::{CapabilityRegistry, FORCE_DAY_MODE, IS_AVAILABLE};
pub use channel::{BridgeChannel, BridgeError, BridgeResponse, MethodCall};
pub use diagnostics::Diagnostics;
pub use engine::{EngineHost, EngineInstance};
pub use host::NavigationHost;
pub use surface::{SurfaceCoordinator, SurfaceTransition};
pub use traits::NavigationSdk;

/// SDK handle for desktop builds, which never link the vendor navigation SDK.
///
/// Not available on iOS or Android: device builds construct their own
/// `NavigationSdk` implementation and pass it to [`NavigationHost::new`].
#[cfg(not(any(target_os = "ios", target_os = "android")))]
pub fn desktop_sdk() -> std::sync::Arc<stub::StubNavigationSdk> {
    tracing::warn!("vendor navigation SDK not linked, using stub SDK");
    std::sync::Arc::new(stub::StubNavigationSdk::new())
}
