//! Host bindings: a recognition session exported as a UniFFI object.
//!
//! Swift/Kotlin hosts implement [`EngineBridge`] around their vendor engine and
//! [`HostBridge`] around their view controller, then drive a
//! [`RecognitionSession`]. Engine completions, tracking frames and OS
//! notifications come back in through the session's methods, so everything
//! still lands on the single session thread.
//!
//! ```swift
//! let session = try RecognitionSession(configPath: nil, engine: engine, host: host)
//! try session.viewReady()
//! // vendor callback:
//! try session.enginePrepared()
//! ```

use std::path::Path;
use std::sync::{Arc, Mutex};

use url::Url;

use crate::config::{load_session_config, SessionConfig};
use crate::engine::{
    EngineCommand, EngineDelegate, EngineError, RecognitionEngine, Trackable, TrackedResult,
    TrackingSnapshot,
};
use crate::error::RecognitionFfiError;
use crate::host::{LifecycleObservers, LifecycleSink, NavigationHandoff, SessionSurface};
use crate::session::{Collaborators, LifecycleEvent, SessionEvent, SessionHandle, SessionRuntime};
use crate::types::{Orientation, SessionSnapshot, TrackableObject};

// ═══════════════════════════════════════════════════════════════════════════════
// Host-implemented interfaces
// ═══════════════════════════════════════════════════════════════════════════════

/// The vendor recognition engine, as seen from the host.
///
/// Commands return `false` when the engine reports failure. Preparation
/// finishes later with [`RecognitionSession::engine_prepared`] or
/// [`RecognitionSession::engine_preparation_failed`].
#[uniffi::export(callback_interface)]
pub trait EngineBridge: Send + Sync {
    /// `false` means preparation could not be started at all.
    fn prepare(&self, orientation: Orientation) -> bool;

    fn start(&self) -> bool;

    fn stop(&self) -> bool;

    fn pause(&self) -> bool;

    fn resume(&self) -> bool;

    fn set_continuous_autofocus(&self, enabled: bool);

    /// Returns the torch state the device ended up in.
    fn set_flash(&self, on: bool) -> bool;
}

/// UI, navigation and OS notification hooks of the hosting view controller.
///
/// Called on the session thread. While observers are registered the host
/// forwards background/foreground notifications to
/// [`RecognitionSession::app_will_background`] and
/// [`RecognitionSession::app_did_foreground`].
#[uniffi::export(callback_interface)]
pub trait HostBridge: Send + Sync {
    fn set_loading(&self, visible: bool);

    fn set_toggle_enabled(&self, enabled: bool);

    fn set_recognition_indicator(&self, on: bool);

    fn set_flash_indicator(&self, on: bool);

    fn present(&self, object: TrackableObject, target: String);

    fn present_info(&self);

    fn register_lifecycle_observers(&self);

    fn unregister_lifecycle_observers(&self);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Adapters onto the collaborator traits
// ═══════════════════════════════════════════════════════════════════════════════

struct BridgedEngine {
    bridge: Box<dyn EngineBridge>,
}

impl BridgedEngine {
    fn command(succeeded: bool, command: EngineCommand) -> Result<(), EngineError> {
        if succeeded {
            Ok(())
        } else {
            Err(EngineError::CommandFailed {
                command,
                details: "host engine reported failure".to_string(),
            })
        }
    }
}

impl RecognitionEngine for BridgedEngine {
    // The host reports completion through the session object, which feeds the
    // same mailbox as the delegate.
    fn prepare(
        &mut self,
        orientation: Orientation,
        _delegate: EngineDelegate,
    ) -> Result<(), EngineError> {
        if self.bridge.prepare(orientation) {
            Ok(())
        } else {
            Err(EngineError::PreparationFailed(
                "host engine refused to prepare".to_string(),
            ))
        }
    }

    fn start(&mut self) -> Result<(), EngineError> {
        Self::command(self.bridge.start(), EngineCommand::Start)
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        Self::command(self.bridge.stop(), EngineCommand::Stop)
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        Self::command(self.bridge.pause(), EngineCommand::Pause)
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        Self::command(self.bridge.resume(), EngineCommand::Resume)
    }

    fn set_continuous_autofocus(&mut self, enabled: bool) {
        self.bridge.set_continuous_autofocus(enabled);
    }

    fn set_flash(&mut self, on: bool) -> bool {
        self.bridge.set_flash(on)
    }
}

#[derive(Clone)]
struct BridgedHost {
    bridge: Arc<dyn HostBridge>,
}

impl SessionSurface for BridgedHost {
    fn set_loading(&mut self, visible: bool) {
        self.bridge.set_loading(visible);
    }

    fn set_toggle_enabled(&mut self, enabled: bool) {
        self.bridge.set_toggle_enabled(enabled);
    }

    fn set_recognition_indicator(&mut self, on: bool) {
        self.bridge.set_recognition_indicator(on);
    }

    fn set_flash_indicator(&mut self, on: bool) {
        self.bridge.set_flash_indicator(on);
    }
}

impl NavigationHandoff for BridgedHost {
    fn present(&mut self, object: &TrackableObject, target: &Url) {
        self.bridge.present(object.clone(), target.to_string());
    }

    fn present_info(&mut self) {
        self.bridge.present_info();
    }
}

impl LifecycleObservers for BridgedHost {
    // Notifications come back through RecognitionSession rather than the sink.
    fn register(&mut self, _sink: LifecycleSink) {
        self.bridge.register_lifecycle_observers();
    }

    fn unregister(&mut self) {
        self.bridge.unregister_lifecycle_observers();
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Exported session
// ═══════════════════════════════════════════════════════════════════════════════

/// A running recognition session for Swift/Kotlin hosts.
#[derive(uniffi::Object)]
pub struct RecognitionSession {
    handle: SessionHandle,
    runtime: Mutex<Option<SessionRuntime>>,
}

impl RecognitionSession {
    /// Starts a session from an already loaded configuration.
    pub fn with_config(
        config: SessionConfig,
        engine: Box<dyn EngineBridge>,
        host: Box<dyn HostBridge>,
    ) -> crate::Result<Self> {
        let host = BridgedHost {
            bridge: Arc::from(host),
        };
        let runtime = SessionRuntime::spawn(
            config,
            Collaborators {
                engine: Box::new(BridgedEngine { bridge: engine }),
                surface: Box::new(host.clone()),
                handoff: Box::new(host.clone()),
                lifecycle: Box::new(host),
            },
        )?;

        Ok(Self {
            handle: runtime.handle(),
            runtime: Mutex::new(Some(runtime)),
        })
    }

    fn send(&self, event: impl Into<SessionEvent>) -> Result<(), RecognitionFfiError> {
        self.handle.send(event).map_err(RecognitionFfiError::from)
    }
}

#[uniffi::export]
impl RecognitionSession {
    /// Loads the session config (default location when `config_path` is
    /// `None`) and starts the session thread.
    #[uniffi::constructor]
    pub fn new(
        config_path: Option<String>,
        engine: Box<dyn EngineBridge>,
        host: Box<dyn HostBridge>,
    ) -> Result<Self, RecognitionFfiError> {
        let config = load_session_config(config_path.as_deref().map(Path::new))?;
        Ok(Self::with_config(config, engine, host)?)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // View lifecycle
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn view_ready(&self) -> Result<(), RecognitionFfiError> {
        self.send(LifecycleEvent::ViewReady)
    }

    pub fn view_will_appear(&self) -> Result<(), RecognitionFfiError> {
        self.send(LifecycleEvent::ViewWillAppear)
    }

    pub fn view_did_appear(&self) -> Result<(), RecognitionFfiError> {
        self.send(LifecycleEvent::ViewDidAppear)
    }

    pub fn view_did_disappear(&self) -> Result<(), RecognitionFfiError> {
        self.send(LifecycleEvent::ViewDidDisappear)
    }

    pub fn app_will_background(&self) -> Result<(), RecognitionFfiError> {
        self.send(LifecycleEvent::AppWillBackground)
    }

    pub fn app_did_foreground(&self) -> Result<(), RecognitionFfiError> {
        self.send(LifecycleEvent::AppDidForeground)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Engine callbacks
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn engine_prepared(&self) -> Result<(), RecognitionFfiError> {
        self.send(LifecycleEvent::PrepareSucceeded)
    }

    pub fn engine_preparation_failed(
        &self,
        reason: String,
    ) -> Result<(), RecognitionFfiError> {
        self.send(LifecycleEvent::PrepareFailed { reason })
    }

    /// One frame of tracking results in engine order; `None` marks a result
    /// without a trackable.
    pub fn tracking_update(
        &self,
        results: Vec<Option<TrackableObject>>,
    ) -> Result<(), RecognitionFfiError> {
        let results = results
            .into_iter()
            .map(|object| TrackedResult {
                trackable: object.map(|object| Trackable {
                    identifier: object.identifier,
                    name: object.name,
                }),
            })
            .collect();
        self.send(SessionEvent::TrackingUpdate(TrackingSnapshot::new(results)))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // User actions
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn toggle_recognition(&self) -> Result<(), RecognitionFfiError> {
        self.send(SessionEvent::ToggleRecognition)
    }

    pub fn toggle_flash(&self) -> Result<(), RecognitionFfiError> {
        self.send(SessionEvent::ToggleFlash)
    }

    pub fn present_info(&self) -> Result<(), RecognitionFfiError> {
        self.send(SessionEvent::PresentInfo)
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot, RecognitionFfiError> {
        self.handle.snapshot().map_err(RecognitionFfiError::from)
    }

    /// Tears the session down and joins its thread. Later calls fail with a
    /// closed-session error.
    pub fn shutdown(&self) {
        let runtime = self
            .runtime
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(runtime) = runtime {
            runtime.shutdown();
        }
    }
}
