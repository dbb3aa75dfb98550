// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Ropacal navigation host.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for the shared navigation engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineId(pub Uuid);

impl EngineId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EngineId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EngineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for one presentation surface session.
///
/// A new id is minted every time the host runtime connects a scene, so a
/// reconnected car display is a different surface from the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(pub Uuid);

impl SurfaceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the engine output can be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SurfaceKind {
    /// The handheld phone screen.
    Phone,
    /// The car head-unit display (CarPlay / Android Auto).
    Automotive,
}

impl SurfaceKind {
    pub const ALL: [SurfaceKind; 2] = [SurfaceKind::Phone, SurfaceKind::Automotive];
}

impl std::fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Phone => f.write_str("phone"),
            Self::Automotive => f.write_str("automotive"),
        }
    }
}

/// Lifecycle states of a presentation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SurfaceState {
    /// Scene connected, view hierarchy built, not yet in the foreground.
    Connecting,
    /// Foreground and interactive.
    Active,
    /// Foreground but not receiving events (e.g. a system overlay is up).
    Inactive,
    /// Moved off-screen by the host runtime.
    Background,
    /// Released by the host runtime. Terminal.
    Disconnected,
}

/// Run-state of the navigation engine. There is no destroyed state: the
/// engine lives as long as the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EngineState {
    Uninitialized,
    Created,
    Running,
}

/// Lifecycle signals delivered by the host runtime for one surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleEvent {
    Connecting,
    BecameActive,
    WillResignActive,
    WillEnterForeground,
    EnteredBackground,
    Disconnected,
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::BecameActive => "becameActive",
            Self::WillResignActive => "willResignActive",
            Self::WillEnterForeground => "willEnterForeground",
            Self::EnteredBackground => "enteredBackground",
            Self::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

/// Map camera perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CameraPerspective {
    /// 3D perspective following the vehicle heading.
    Tilted,
    /// Flat overhead view.
    TopDown,
}

/// Camera settings applied when the engine follows the user's location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub perspective: CameraPerspective,
    pub zoom_level: f32,
}

/// Car display: balanced overview.
pub const AUTOMOTIVE_ZOOM_LEVEL: f32 = 13.0;

/// Phone: closer street-level view.
pub const PHONE_ZOOM_LEVEL: f32 = 15.0;

/// A control owned by the surface rather than by the navigation SDK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomControl {
    /// Identifier used when the host runtime reports a tap.
    pub id: String,
    /// Button title shown on the surface.
    pub title: String,
    /// Camera the engine follows when the control is activated.
    pub camera: CameraConfig,
}

/// Identifier of the custom re-center control on the car display.
pub const RECENTER_CONTROL_ID: &str = "recenter";

/// Fixed per-kind display configuration.
///
/// Values are constants of the surface kind, never computed at runtime, so a
/// surface always comes up looking the same.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceProfile {
    pub camera: CameraConfig,
    /// `Some(enabled)` forces the compass overlay; `None` leaves it to the UI layer.
    pub compass_enabled: Option<bool>,
    /// Whether the SDK's own re-center button is shown.
    pub native_recenter_enabled: bool,
    /// Whether the map template exposes the panning interface.
    pub panning_interface: bool,
    /// Controls placed in the leading navigation bar.
    pub custom_controls: Vec<CustomControl>,
}

impl SurfaceProfile {
    /// The display profile for a given surface kind.
    pub fn for_kind(kind: SurfaceKind) -> Self {
        match kind {
            SurfaceKind::Automotive => {
                let camera = CameraConfig {
                    perspective: CameraPerspective::Tilted,
                    zoom_level: AUTOMOTIVE_ZOOM_LEVEL,
                };
                Self {
                    camera,
                    compass_enabled: Some(false),
                    native_recenter_enabled: false,
                    panning_interface: true,
                    custom_controls: vec![CustomControl {
                        id: RECENTER_CONTROL_ID.into(),
                        title: "Re-center".into(),
                        camera,
                    }],
                }
            }
            SurfaceKind::Phone => Self {
                camera: CameraConfig {
                    perspective: CameraPerspective::Tilted,
                    zoom_level: PHONE_ZOOM_LEVEL,
                },
                compass_enabled: None,
                native_recenter_enabled: true,
                panning_interface: false,
                custom_controls: Vec::new(),
            },
        }
    }

    /// Look up a custom control by id.
    pub fn control(&self, id: &str) -> Option<&CustomControl> {
        self.custom_controls.iter().find(|c| c.id == id)
    }
}
