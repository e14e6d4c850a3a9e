//! Recognition engine interface.
//!
//! The engine itself (camera capture, feature matching, tracking) is owned by a
//! vendor SDK. This module describes the capability set the session controller
//! consumes, plus the per-frame tracking snapshot the engine reports.
//!
//! Engine callbacks may fire on any thread. They never touch session state
//! directly: [`EngineDelegate`] forwards them into the session mailbox, where
//! they are processed in order on the session thread.

use serde::{Deserialize, Serialize};

use crate::session::{EventSink, LifecycleEvent, SessionEvent};
use crate::types::Orientation;

/// Commands the controller can issue to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineCommand {
    Prepare,
    Start,
    Stop,
    Pause,
    Resume,
    SetContinuousAutofocus,
    SetFlash,
}

impl EngineCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineCommand::Prepare => "prepare",
            EngineCommand::Start => "start",
            EngineCommand::Stop => "stop",
            EngineCommand::Pause => "pause",
            EngineCommand::Resume => "resume",
            EngineCommand::SetContinuousAutofocus => "set_continuous_autofocus",
            EngineCommand::SetFlash => "set_flash",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "prepare" => Some(EngineCommand::Prepare),
            "start" => Some(EngineCommand::Start),
            "stop" => Some(EngineCommand::Stop),
            "pause" => Some(EngineCommand::Pause),
            "resume" => Some(EngineCommand::Resume),
            "set_continuous_autofocus" => Some(EngineCommand::SetContinuousAutofocus),
            "set_flash" => Some(EngineCommand::SetFlash),
            _ => None,
        }
    }
}

impl std::fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("engine preparation failed: {0}")]
    PreparationFailed(String),

    #[error("engine {command} failed: {details}")]
    CommandFailed {
        command: EngineCommand,
        details: String,
    },
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tracking Snapshot
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything the engine tracked in one frame, in the engine's native order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackingSnapshot {
    #[serde(default)]
    pub results: Vec<TrackedResult>,
}

impl TrackingSnapshot {
    pub fn new(results: Vec<TrackedResult>) -> Self {
        Self { results }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// One tracked result. Results without an underlying trackable reference
/// (e.g. extended tracking of a lost target) carry `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackedResult {
    #[serde(default)]
    pub trackable: Option<Trackable>,
}

impl TrackedResult {
    pub fn with_trackable(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            trackable: Some(Trackable {
                identifier: identifier.into(),
                name: name.into(),
            }),
        }
    }

    pub fn untracked() -> Self {
        Self { trackable: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trackable {
    pub identifier: String,
    pub name: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Engine Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// Capability set of an external recognition engine.
///
/// Implementors should:
/// - Return from every command promptly; only `prepare` completes later
/// - Report preparation results exactly once through the delegate
/// - Deliver tracking updates through the delegate from any thread
pub trait RecognitionEngine: Send {
    /// Begin asynchronous preparation. An `Err` means preparation could not be
    /// started at all and is treated like a failed preparation.
    fn prepare(&mut self, orientation: Orientation, delegate: EngineDelegate)
        -> Result<(), EngineError>;

    fn start(&mut self) -> Result<(), EngineError>;

    fn stop(&mut self) -> Result<(), EngineError>;

    fn pause(&mut self) -> Result<(), EngineError>;

    fn resume(&mut self) -> Result<(), EngineError>;

    fn set_continuous_autofocus(&mut self, enabled: bool);

    /// Request a torch state; returns the state the device actually ended up in.
    fn set_flash(&mut self, on: bool) -> bool;
}

/// Callback target handed to the engine at preparation time.
///
/// Cheap to clone and safe to call from any thread. Callbacks that arrive after
/// the session has shut down are dropped.
#[derive(Debug, Clone)]
pub struct EngineDelegate {
    sink: EventSink,
}

impl EngineDelegate {
    pub fn new(sink: EventSink) -> Self {
        Self { sink }
    }

    pub fn on_prepare_finished(&self) {
        self.deliver(LifecycleEvent::PrepareSucceeded.into());
    }

    pub fn on_prepare_failed(&self, error: EngineError) {
        self.deliver(
            LifecycleEvent::PrepareFailed {
                reason: error.to_string(),
            }
            .into(),
        );
    }

    pub fn on_tracking_update(&self, snapshot: TrackingSnapshot) {
        self.deliver(SessionEvent::TrackingUpdate(snapshot));
    }

    fn deliver(&self, event: SessionEvent) {
        if self.sink.send(event).is_err() {
            tracing::debug!("Session closed; dropping engine callback");
        }
    }
}
