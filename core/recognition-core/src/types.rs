//! Core types shared with host applications.
//!
//! **FFI Support:** These types carry UniFFI derives so Swift/Kotlin hosts can
//! render session state without re-declaring it.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// Session State
// ═══════════════════════════════════════════════════════════════════════════════

/// Lifecycle state of a recognition session.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, uniffi::Enum,
)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Undefined,
    Unavailable,
    Preparing,
    Active,
    Inactive,
}

impl SessionState {
    /// The engine is running and delivering tracking updates.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active)
    }

    /// The engine finished preparation, whether or not it is currently running.
    pub fn is_available(&self) -> bool {
        matches!(self, SessionState::Active | SessionState::Inactive)
    }

    /// Desired loading indicator visibility on entering this state.
    /// `None` leaves the indicator as it is.
    pub fn loading_indicator(&self) -> Option<bool> {
        match self {
            SessionState::Undefined | SessionState::Preparing => Some(true),
            SessionState::Active | SessionState::Unavailable => Some(false),
            SessionState::Inactive => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Undefined => "undefined",
            SessionState::Unavailable => "unavailable",
            SessionState::Preparing => "preparing",
            SessionState::Active => "active",
            SessionState::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Camera orientation handed to the engine at preparation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Detection Types
// ═══════════════════════════════════════════════════════════════════════════════

/// A recognized object, projected from the first result of a tracking snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct TrackableObject {
    pub identifier: String,
    pub name: String,
}

impl TrackableObject {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Diagnostics
// ═══════════════════════════════════════════════════════════════════════════════

/// Point-in-time view of a session, as seen from the session thread.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, uniffi::Record)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub state: SessionState,
    pub gate_open: bool,
    pub toggle_enabled: bool,
    pub loading: bool,
    pub flash_on: bool,
    pub view_visible: bool,
    /// Engine commands that failed and were swallowed.
    pub command_failures: u32,
    /// Objects handed off for presentation.
    pub handoffs: u32,
}
