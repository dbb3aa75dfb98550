// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the navigation SDK.
//
// The navigation/rendering engine is a closed vendor SDK. These traits are
// the only surface the host touches; the iOS and Android embedders implement
// them over the vendor bindings, and `stub::StubNavigationSdk` implements
// them for desktop and CI.

use ropacal_core::error::Result;
use ropacal_core::types::{CameraConfig, CustomControl, EngineId, SurfaceId, SurfaceKind};

/// SDK entry points whose presence varies between vendor builds.
///
/// The binding declares these up front. Nothing in the host probes the SDK
/// at runtime to find out what it can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    /// Override the automatic day/night map lighting.
    ForceDayMode,
}

/// Unified SDK handle that groups every native capability the host uses.
///
/// Implementations must be callable from the UI thread only; `Send + Sync`
/// is required so the handle can be shared between the engine host, the
/// surface coordinator and the capability registry.
pub trait NavigationSdk:
    NativeEngine + NativeCamera + NativeChrome + NativeControls + NativeLighting + Send + Sync
{
    /// Vendor SDK name (e.g. "Google Navigation SDK").
    fn sdk_name(&self) -> &str;

    /// Vendor SDK version string.
    fn sdk_version(&self) -> &str;

    /// Entry points reachable in this build.
    fn entry_points(&self) -> &[EntryPoint];

    /// Hand the maps credential to the SDK. Called once before any engine exists.
    fn provide_api_key(&self, key: &str) -> Result<()>;
}

/// Engine creation and view attachment.
pub trait NativeEngine {
    /// Create the rendering engine.
    fn create_engine(&self, id: EngineId, name: &str) -> Result<()>;

    /// Start the engine's run loop.
    fn run_engine(&self, id: EngineId) -> Result<()>;

    /// Render the engine into the given surface's view hierarchy.
    fn attach_view(&self, id: EngineId, surface: SurfaceId, kind: SurfaceKind) -> Result<()>;

    /// Stop rendering into the given surface.
    fn detach_view(&self, id: EngineId, surface: SurfaceId) -> Result<()>;
}

/// Camera control on an attached surface.
pub trait NativeCamera {
    /// Follow the user's location with the given perspective and zoom.
    fn follow_my_location(&self, surface: SurfaceId, camera: CameraConfig) -> Result<()>;
}

/// SDK-provided overlays ("chrome") on the map view.
pub trait NativeChrome {
    fn set_compass_enabled(&self, surface: SurfaceId, enabled: bool) -> Result<()>;

    fn set_recenter_button_enabled(&self, surface: SurfaceId, enabled: bool) -> Result<()>;

    /// Show the map template's panning interface (car displays only).
    fn show_panning_interface(&self, surface: SurfaceId, enabled: bool) -> Result<()>;
}

/// Surface-owned controls placed on the map template.
pub trait NativeControls {
    fn register_custom_control(&self, surface: SurfaceId, control: &CustomControl) -> Result<()>;
}

/// Map lighting overrides.
pub trait NativeLighting {
    /// Force day lighting. Only called when the build declares
    /// [`EntryPoint::ForceDayMode`].
    fn force_day_mode(&self) -> Result<()>;
}
