//! Simulated collaborators for driving sessions without a camera or host UI.
//!
//! Each type is a cheap, cloneable handle around shared state: give one clone
//! to the session and keep another to inspect what the session did or to fire
//! callbacks into it. Used by tests and by the `session-replay` tool.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use url::Url;

use crate::engine::{
    EngineCommand, EngineDelegate, EngineError, RecognitionEngine, TrackingSnapshot,
};
use crate::host::{LifecycleObservers, LifecycleSink, NavigationHandoff, SessionSurface};
use crate::types::{Orientation, TrackableObject};

fn lock<T>(shared: &Mutex<T>) -> MutexGuard<'_, T> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Engine
// ═══════════════════════════════════════════════════════════════════════════════

/// How the simulated engine answers `prepare`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareBehavior {
    /// Report success through the delegate immediately.
    Succeed,
    /// Report failure through the delegate immediately.
    Fail(String),
    /// Refuse synchronously from `prepare` itself.
    Reject(String),
    /// Wait for [`SimulatedEngine::complete_preparation`] or [`SimulatedEngine::fail_preparation`].
    Pending,
}

#[derive(Debug)]
struct EngineState {
    behavior: PrepareBehavior,
    commands: Vec<EngineCommand>,
    failing: HashSet<EngineCommand>,
    delegate: Option<EngineDelegate>,
    orientation: Option<Orientation>,
    autofocus: bool,
    flash: bool,
    torch_available: bool,
}

#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    shared: Arc<Mutex<EngineState>>,
}

impl SimulatedEngine {
    pub fn new(behavior: PrepareBehavior) -> Self {
        Self {
            shared: Arc::new(Mutex::new(EngineState {
                behavior,
                commands: Vec::new(),
                failing: HashSet::new(),
                delegate: None,
                orientation: None,
                autofocus: false,
                flash: false,
                torch_available: true,
            })),
        }
    }

    /// Makes every future `command` call fail.
    pub fn fail_command(&self, command: EngineCommand) {
        lock(&self.shared).failing.insert(command);
    }

    pub fn set_torch_available(&self, available: bool) {
        lock(&self.shared).torch_available = available;
    }

    /// Commands received so far, in order.
    pub fn commands(&self) -> Vec<EngineCommand> {
        lock(&self.shared).commands.clone()
    }

    pub fn orientation(&self) -> Option<Orientation> {
        lock(&self.shared).orientation
    }

    pub fn autofocus_enabled(&self) -> bool {
        lock(&self.shared).autofocus
    }

    pub fn flash_on(&self) -> bool {
        lock(&self.shared).flash
    }

    /// Reports a finished preparation. Returns false if `prepare` was never called.
    pub fn complete_preparation(&self) -> bool {
        match self.delegate() {
            Some(delegate) => {
                delegate.on_prepare_finished();
                true
            }
            None => false,
        }
    }

    pub fn fail_preparation(&self, reason: impl Into<String>) -> bool {
        match self.delegate() {
            Some(delegate) => {
                delegate.on_prepare_failed(EngineError::PreparationFailed(reason.into()));
                true
            }
            None => false,
        }
    }

    /// Emits a tracking update as if a frame had been processed.
    pub fn emit_tracking(&self, snapshot: TrackingSnapshot) -> bool {
        match self.delegate() {
            Some(delegate) => {
                delegate.on_tracking_update(snapshot);
                true
            }
            None => false,
        }
    }

    fn delegate(&self) -> Option<EngineDelegate> {
        lock(&self.shared).delegate.clone()
    }

    fn run(&self, command: EngineCommand) -> Result<(), EngineError> {
        let mut state = lock(&self.shared);
        state.commands.push(command);
        if state.failing.contains(&command) {
            return Err(EngineError::CommandFailed {
                command,
                details: "simulated failure".to_string(),
            });
        }
        Ok(())
    }
}

impl RecognitionEngine for SimulatedEngine {
    fn prepare(
        &mut self,
        orientation: Orientation,
        delegate: EngineDelegate,
    ) -> Result<(), EngineError> {
        let behavior = {
            let mut state = lock(&self.shared);
            state.commands.push(EngineCommand::Prepare);
            state.orientation = Some(orientation);
            state.delegate = Some(delegate.clone());
            state.behavior.clone()
        };

        match behavior {
            PrepareBehavior::Succeed => delegate.on_prepare_finished(),
            PrepareBehavior::Fail(reason) => {
                delegate.on_prepare_failed(EngineError::PreparationFailed(reason))
            }
            PrepareBehavior::Reject(reason) => return Err(EngineError::PreparationFailed(reason)),
            PrepareBehavior::Pending => {}
        }
        Ok(())
    }

    fn start(&mut self) -> Result<(), EngineError> {
        self.run(EngineCommand::Start)
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        self.run(EngineCommand::Stop)
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        self.run(EngineCommand::Pause)
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        self.run(EngineCommand::Resume)
    }

    fn set_continuous_autofocus(&mut self, enabled: bool) {
        let mut state = lock(&self.shared);
        state.commands.push(EngineCommand::SetContinuousAutofocus);
        state.autofocus = enabled;
    }

    fn set_flash(&mut self, on: bool) -> bool {
        let mut state = lock(&self.shared);
        state.commands.push(EngineCommand::SetFlash);
        state.flash = on && state.torch_available;
        state.flash
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Host Collaborators
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct SurfaceState {
    loading: Option<bool>,
    toggle_enabled: Option<bool>,
    recognition_indicator: bool,
    flash_indicator: bool,
}

/// Remembers the last value pushed to each UI element.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    shared: Arc<Mutex<SurfaceState>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loading(&self) -> Option<bool> {
        lock(&self.shared).loading
    }

    pub fn toggle_enabled(&self) -> Option<bool> {
        lock(&self.shared).toggle_enabled
    }

    pub fn recognition_indicator(&self) -> bool {
        lock(&self.shared).recognition_indicator
    }

    pub fn flash_indicator(&self) -> bool {
        lock(&self.shared).flash_indicator
    }
}

impl SessionSurface for RecordingSurface {
    fn set_loading(&mut self, visible: bool) {
        lock(&self.shared).loading = Some(visible);
    }

    fn set_toggle_enabled(&mut self, enabled: bool) {
        lock(&self.shared).toggle_enabled = Some(enabled);
    }

    fn set_recognition_indicator(&mut self, on: bool) {
        lock(&self.shared).recognition_indicator = on;
    }

    fn set_flash_indicator(&mut self, on: bool) {
        lock(&self.shared).flash_indicator = on;
    }
}

#[derive(Debug, Default)]
struct HandoffState {
    presented: Vec<(TrackableObject, String)>,
    info_presentations: u32,
}

/// Records presentations instead of showing them.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandoff {
    shared: Arc<Mutex<HandoffState>>,
}

impl RecordingHandoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presented objects with their target URLs, in order.
    pub fn presented(&self) -> Vec<(TrackableObject, String)> {
        lock(&self.shared).presented.clone()
    }

    pub fn info_presentations(&self) -> u32 {
        lock(&self.shared).info_presentations
    }
}

impl NavigationHandoff for RecordingHandoff {
    fn present(&mut self, object: &TrackableObject, target: &Url) {
        lock(&self.shared)
            .presented
            .push((object.clone(), target.to_string()));
    }

    fn present_info(&mut self) {
        lock(&self.shared).info_presentations += 1;
    }
}

#[derive(Debug, Default)]
struct LifecycleState {
    sink: Option<LifecycleSink>,
    registrations: u32,
    unregistrations: u32,
}

/// Stands in for OS foreground/background notifications.
#[derive(Debug, Clone, Default)]
pub struct RecordingLifecycle {
    shared: Arc<Mutex<LifecycleState>>,
}

impl RecordingLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self) -> bool {
        lock(&self.shared).sink.is_some()
    }

    pub fn registrations(&self) -> u32 {
        lock(&self.shared).registrations
    }

    pub fn unregistrations(&self) -> u32 {
        lock(&self.shared).unregistrations
    }

    /// Posts a will-enter-background notification. Returns false if nobody is registered.
    pub fn background(&self) -> bool {
        match self.sink() {
            Some(sink) => {
                sink.will_enter_background();
                true
            }
            None => false,
        }
    }

    pub fn foreground(&self) -> bool {
        match self.sink() {
            Some(sink) => {
                sink.did_become_foreground();
                true
            }
            None => false,
        }
    }

    fn sink(&self) -> Option<LifecycleSink> {
        lock(&self.shared).sink.clone()
    }
}

impl LifecycleObservers for RecordingLifecycle {
    fn register(&mut self, sink: LifecycleSink) {
        let mut state = lock(&self.shared);
        state.sink = Some(sink);
        state.registrations += 1;
    }

    fn unregister(&mut self) {
        let mut state = lock(&self.shared);
        state.sink = None;
        state.unregistrations += 1;
    }
}
