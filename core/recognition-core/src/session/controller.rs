//! SessionController - owns all mutable session state.
//!
//! The controller is the single writer for the session state, the detection
//! gate and the UI flags. It is driven one event at a time, either directly
//! (tests, embedding hosts with their own main loop) or by [`super::SessionRuntime`].
//!
//! Engine command failures are logged and counted, never retried, and never
//! roll back a transition. A failed preparation is the only engine failure that
//! changes state.

use tracing::{debug, info, trace, warn};

use super::event::{EventSink, LifecycleEvent, SessionEvent};
use super::gate::DetectionGate;
use super::resolver::TrackableResolver;
use super::transition::{next_transition, Command, ViewPresence};
use crate::config::SessionConfig;
use crate::engine::{
    EngineCommand, EngineDelegate, EngineError, RecognitionEngine, TrackingSnapshot,
};
use crate::error::Result;
use crate::host::{LifecycleObservers, LifecycleSink, NavigationHandoff, SessionSurface};
use crate::types::{SessionSnapshot, SessionState};

/// External collaborators injected into a session.
pub struct Collaborators {
    pub engine: Box<dyn RecognitionEngine>,
    pub surface: Box<dyn SessionSurface>,
    pub handoff: Box<dyn NavigationHandoff>,
    pub lifecycle: Box<dyn LifecycleObservers>,
}

pub struct SessionController {
    session_id: String,
    config: SessionConfig,
    state: SessionState,
    view: ViewPresence,
    gate: DetectionGate,
    resolver: TrackableResolver,
    sink: EventSink,
    engine: Box<dyn RecognitionEngine>,
    surface: Box<dyn SessionSurface>,
    handoff: Box<dyn NavigationHandoff>,
    lifecycle: Box<dyn LifecycleObservers>,
    loading: bool,
    toggle_enabled: bool,
    flash_on: bool,
    command_failures: u32,
    handoffs: u32,
    torn_down: bool,
}

impl SessionController {
    /// Creates a controller in `Undefined`.
    ///
    /// `sink` must feed the mailbox this controller is drained from; it is
    /// handed to the engine and lifecycle observers so their callbacks come
    /// back through the same queue.
    pub fn new(
        config: SessionConfig,
        collaborators: Collaborators,
        sink: EventSink,
    ) -> Result<Self> {
        let resolver = TrackableResolver::new(&config.navigation)?;
        let Collaborators {
            engine,
            surface,
            handoff,
            lifecycle,
        } = collaborators;

        let mut controller = Self {
            session_id: ulid::Ulid::new().to_string(),
            config,
            state: SessionState::Undefined,
            view: ViewPresence::default(),
            gate: DetectionGate::new(),
            resolver,
            sink,
            engine,
            surface,
            handoff,
            lifecycle,
            loading: false,
            toggle_enabled: false,
            flash_on: false,
            command_failures: 0,
            handoffs: 0,
            torn_down: false,
        };
        controller.apply_state_effects(SessionState::Undefined);
        Ok(controller)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_toggle_enabled(&self) -> bool {
        self.toggle_enabled
    }

    pub fn is_gate_open(&self) -> bool {
        self.gate.is_open()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            state: self.state,
            gate_open: self.gate.is_open(),
            toggle_enabled: self.toggle_enabled,
            loading: self.loading,
            flash_on: self.flash_on,
            view_visible: self.view.visible,
            command_failures: self.command_failures,
            handoffs: self.handoffs,
        }
    }

    /// Processes one event. Events after teardown are ignored.
    pub fn handle(&mut self, event: SessionEvent) {
        let _span = tracing::info_span!(
            "session_event",
            session_id = %self.session_id,
            event = event.name()
        )
        .entered();

        if self.torn_down {
            debug!("Session torn down; ignoring event");
            return;
        }

        match event {
            SessionEvent::Lifecycle(event) => self.handle_lifecycle(&event),
            SessionEvent::TrackingUpdate(snapshot) => self.handle_tracking_update(&snapshot),
            SessionEvent::ToggleRecognition => self.toggle_recognition(),
            SessionEvent::ToggleFlash => self.toggle_flash(),
            SessionEvent::PresentInfo => self.present_info(),
        }
    }

    /// Stops the engine and unregisters observers. Idempotent.
    pub fn teardown(&mut self) {
        self.handle(LifecycleEvent::Teardown.into());
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────────

    fn handle_lifecycle(&mut self, event: &LifecycleEvent) {
        let transition = next_transition(self.state, self.view, event);

        if !transition.changes_state(self.state) && transition.commands.is_empty() {
            debug!(state = %self.state, "Lifecycle event has no effect in this state");
        }
        if let LifecycleEvent::PrepareFailed { reason } = event {
            if self.state == SessionState::Preparing {
                warn!(reason = %reason, "Engine preparation failed; recognition unavailable");
            }
        }

        let mut follow_up = None;
        for command in &transition.commands {
            if let Some(event) = self.execute(*command) {
                follow_up = Some(event);
            }
        }

        self.update_view_presence(event);
        if matches!(event, LifecycleEvent::Teardown) {
            self.torn_down = true;
            info!("Session torn down");
            if transition.next == self.state {
                // Already inactive; the toggle still has to go dark.
                self.apply_state_effects(self.state);
            }
        }
        self.enter(transition.next);

        if let Some(event) = follow_up {
            self.handle_lifecycle(&event);
        }
    }

    /// Runs one command; returns an event to process once the current transition lands.
    fn execute(&mut self, command: Command) -> Option<LifecycleEvent> {
        match command {
            Command::RegisterObservers => {
                self.lifecycle.register(LifecycleSink::new(self.sink.clone()));
            }
            Command::UnregisterObservers => self.lifecycle.unregister(),
            Command::Prepare => {
                let delegate = EngineDelegate::new(self.sink.clone());
                if let Err(err) = self.engine.prepare(self.config.orientation, delegate) {
                    return Some(LifecycleEvent::PrepareFailed {
                        reason: err.to_string(),
                    });
                }
                debug!(orientation = ?self.config.orientation, "Engine preparation started");
            }
            Command::Start => {
                let result = self.engine.start();
                self.observe(EngineCommand::Start, result);
            }
            Command::Stop => {
                let result = self.engine.stop();
                self.observe(EngineCommand::Stop, result);
            }
            Command::Pause => {
                let result = self.engine.pause();
                self.observe(EngineCommand::Pause, result);
            }
            Command::Resume => {
                let result = self.engine.resume();
                self.observe(EngineCommand::Resume, result);
            }
            Command::EnableContinuousAutofocus => {
                if self.config.continuous_autofocus {
                    self.engine.set_continuous_autofocus(true);
                }
            }
            Command::CloseGate => self.close_gate(),
        }
        None
    }

    fn observe(&mut self, command: EngineCommand, result: std::result::Result<(), EngineError>) {
        if let Err(err) = result {
            self.command_failures = self.command_failures.saturating_add(1);
            warn!(
                command = %command,
                error = %err,
                failures = self.command_failures,
                "Engine command failed; continuing without retry"
            );
        }
    }

    fn update_view_presence(&mut self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::ViewWillAppear => self.view.visible = true,
            LifecycleEvent::ViewDidAppear => {
                self.view.visible = true;
                self.view.has_appeared = true;
            }
            LifecycleEvent::ViewDidDisappear => self.view.visible = false,
            _ => {}
        }
    }

    fn enter(&mut self, next: SessionState) {
        if next == self.state {
            return;
        }
        info!(from = %self.state, to = %next, "Session state changed");
        self.state = next;
        self.apply_state_effects(next);
    }

    fn apply_state_effects(&mut self, state: SessionState) {
        if let Some(loading) = state.loading_indicator() {
            self.loading = loading;
            self.surface.set_loading(loading);
        }
        self.toggle_enabled = state.is_available() && !self.torn_down;
        self.surface.set_toggle_enabled(self.toggle_enabled);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Detection pipeline
    // ─────────────────────────────────────────────────────────────────────────────

    fn handle_tracking_update(&mut self, snapshot: &TrackingSnapshot) {
        if !self.state.is_active() {
            trace!(state = %self.state, "Tracking update outside an active session");
            return;
        }
        if !self.gate.is_open() {
            return;
        }

        let Some(object) = self.resolver.resolve(snapshot) else {
            trace!(results = snapshot.results.len(), "No trackable in first result");
            return;
        };
        let Some(target) = self.resolver.navigation_target(&object) else {
            debug!(identifier = %object.identifier, "Recognized object has no navigation target");
            return;
        };

        // Close before handing off so a callback racing the presentation is a no-op.
        self.close_gate();
        self.handoffs = self.handoffs.saturating_add(1);
        info!(
            identifier = %object.identifier,
            name = %object.name,
            target = %target,
            "Handing off recognized object"
        );
        self.handoff.present(&object, &target);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // User actions
    // ─────────────────────────────────────────────────────────────────────────────

    fn toggle_recognition(&mut self) {
        match self.gate.toggle(self.state.is_available()) {
            Some(open) => {
                info!(open, "Recognition toggled");
                self.surface.set_recognition_indicator(open);
            }
            None => debug!(state = %self.state, "Toggle ignored; recognition unavailable"),
        }
    }

    fn toggle_flash(&mut self) {
        if !self.state.is_available() {
            debug!(state = %self.state, "Flash toggle ignored; recognition unavailable");
            return;
        }
        let requested = !self.flash_on;
        self.flash_on = self.engine.set_flash(requested);
        if self.flash_on != requested {
            debug!(requested, actual = self.flash_on, "Engine did not apply flash request");
        }
        self.surface.set_flash_indicator(self.flash_on);
    }

    fn present_info(&mut self) {
        self.close_gate();
        self.handoff.present_info();
    }

    fn close_gate(&mut self) {
        if self.gate.close() {
            self.surface.set_recognition_indicator(false);
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if !self.torn_down {
            debug!(session_id = %self.session_id, "Session dropped without teardown");
            self.teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NavigationConfig;
    use crate::engine::TrackedResult;
    use crate::session::SessionMessage;
    use crate::sim::{
        PrepareBehavior, RecordingHandoff, RecordingLifecycle, RecordingSurface, SimulatedEngine,
    };
    use crate::types::TrackableObject;
    use std::sync::mpsc::Receiver;

    struct Fixture {
        controller: SessionController,
        rx: Receiver<SessionMessage>,
        engine: SimulatedEngine,
        surface: RecordingSurface,
        handoff: RecordingHandoff,
        lifecycle: RecordingLifecycle,
    }

    impl Fixture {
        fn new(behavior: PrepareBehavior) -> Self {
            let config = SessionConfig {
                navigation: NavigationConfig {
                    base_url: Some("https://example.com/objects/".to_string()),
                    ..NavigationConfig::default()
                },
                ..SessionConfig::default()
            };
            let engine = SimulatedEngine::new(behavior);
            let surface = RecordingSurface::new();
            let handoff = RecordingHandoff::new();
            let lifecycle = RecordingLifecycle::new();
            let (sink, rx) = EventSink::channel();
            let controller = SessionController::new(
                config,
                Collaborators {
                    engine: Box::new(engine.clone()),
                    surface: Box::new(surface.clone()),
                    handoff: Box::new(handoff.clone()),
                    lifecycle: Box::new(lifecycle.clone()),
                },
                sink,
            )
            .unwrap();
            Self {
                controller,
                rx,
                engine,
                surface,
                handoff,
                lifecycle,
            }
        }

        fn active() -> Self {
            let mut fixture = Self::new(PrepareBehavior::Succeed);
            fixture.send(LifecycleEvent::ViewReady);
            fixture.send(LifecycleEvent::ViewWillAppear);
            fixture.send(LifecycleEvent::ViewDidAppear);
            fixture.pump();
            assert_eq!(fixture.controller.state(), SessionState::Active);
            fixture
        }

        fn send(&mut self, event: impl Into<SessionEvent>) {
            self.controller.handle(event.into());
        }

        /// Drains callbacks queued by collaborators, as the session thread would.
        fn pump(&mut self) {
            while let Ok(SessionMessage::Event(event)) = self.rx.try_recv() {
                self.controller.handle(event);
            }
        }
    }

    fn card_snapshot() -> TrackingSnapshot {
        TrackingSnapshot::new(vec![TrackedResult::with_trackable("obj1", "card")])
    }

    #[test]
    fn test_new_controller_is_undefined_and_loading() {
        let fixture = Fixture::new(PrepareBehavior::Pending);
        assert_eq!(fixture.controller.state(), SessionState::Undefined);
        assert!(!fixture.controller.is_toggle_enabled());
        assert!(!fixture.controller.is_gate_open());
        assert_eq!(fixture.surface.loading(), Some(true));
        assert_eq!(fixture.surface.toggle_enabled(), Some(false));
    }

    #[test]
    fn test_view_ready_prepares_and_registers_observers() {
        let mut fixture = Fixture::new(PrepareBehavior::Pending);
        fixture.send(LifecycleEvent::ViewReady);

        assert_eq!(fixture.controller.state(), SessionState::Preparing);
        assert_eq!(fixture.engine.commands(), vec![EngineCommand::Prepare]);
        assert!(fixture.lifecycle.is_registered());
        assert_eq!(fixture.surface.loading(), Some(true));
    }

    #[test]
    fn test_preparation_success_activates_session() {
        let mut fixture = Fixture::new(PrepareBehavior::Pending);
        fixture.send(LifecycleEvent::ViewReady);
        assert!(fixture.engine.complete_preparation());
        fixture.pump();

        assert_eq!(fixture.controller.state(), SessionState::Active);
        assert_eq!(fixture.surface.loading(), Some(false));
        assert_eq!(fixture.surface.toggle_enabled(), Some(true));
        assert!(fixture.engine.autofocus_enabled());
        assert_eq!(
            fixture.engine.commands(),
            vec![
                EngineCommand::Prepare,
                EngineCommand::Start,
                EngineCommand::SetContinuousAutofocus
            ]
        );
    }

    #[test]
    fn test_preparation_failure_is_permanent() {
        let mut fixture = Fixture::new(PrepareBehavior::Fail("missing license".into()));
        fixture.send(LifecycleEvent::ViewReady);
        fixture.pump();

        assert_eq!(fixture.controller.state(), SessionState::Unavailable);
        assert_eq!(fixture.surface.loading(), Some(false));
        assert!(!fixture.controller.is_toggle_enabled());

        fixture.send(SessionEvent::ToggleRecognition);
        fixture.send(SessionEvent::TrackingUpdate(card_snapshot()));
        fixture.send(LifecycleEvent::AppDidForeground);
        fixture.send(LifecycleEvent::ViewWillAppear);
        assert_eq!(fixture.controller.state(), SessionState::Unavailable);
        assert!(!fixture.controller.is_gate_open());
        assert!(fixture.handoff.presented().is_empty());
    }

    #[test]
    fn test_rejected_prepare_call_marks_unavailable() {
        let mut fixture = Fixture::new(PrepareBehavior::Reject("no camera".into()));
        fixture.send(LifecycleEvent::ViewReady);

        assert_eq!(fixture.controller.state(), SessionState::Unavailable);
        assert_eq!(fixture.surface.loading(), Some(false));
    }

    #[test]
    fn test_start_failure_is_counted_not_fatal() {
        let mut fixture = Fixture::new(PrepareBehavior::Succeed);
        fixture.engine.fail_command(EngineCommand::Start);
        fixture.send(LifecycleEvent::ViewReady);
        fixture.pump();

        assert_eq!(fixture.controller.state(), SessionState::Active);
        assert_eq!(fixture.controller.snapshot().command_failures, 1);
    }

    #[test]
    fn test_toggle_ignored_while_unavailable() {
        let mut fixture = Fixture::new(PrepareBehavior::Pending);
        fixture.send(SessionEvent::ToggleRecognition);
        assert!(!fixture.controller.is_gate_open());

        fixture.send(LifecycleEvent::ViewReady);
        fixture.send(SessionEvent::ToggleRecognition);
        assert!(!fixture.controller.is_gate_open());
        assert!(!fixture.surface.recognition_indicator());
    }

    #[test]
    fn test_open_gate_hands_off_once() {
        let mut fixture = Fixture::active();
        fixture.send(SessionEvent::ToggleRecognition);
        assert!(fixture.controller.is_gate_open());
        assert!(fixture.surface.recognition_indicator());

        fixture.send(SessionEvent::TrackingUpdate(card_snapshot()));
        fixture.send(SessionEvent::TrackingUpdate(card_snapshot()));

        let presented = fixture.handoff.presented();
        assert_eq!(presented.len(), 1);
        assert_eq!(presented[0].0, TrackableObject::new("obj1", "card"));
        assert_eq!(presented[0].1, "https://example.com/objects/obj1");
        assert!(!fixture.controller.is_gate_open());
        assert!(!fixture.surface.recognition_indicator());
        assert_eq!(fixture.controller.snapshot().handoffs, 1);
    }

    #[test]
    fn test_closed_gate_ignores_detections() {
        let mut fixture = Fixture::active();
        fixture.send(SessionEvent::TrackingUpdate(card_snapshot()));
        assert!(fixture.handoff.presented().is_empty());
    }

    #[test]
    fn test_unpresentable_detection_keeps_gate_open() {
        let mut fixture = Fixture::active();
        fixture.send(SessionEvent::ToggleRecognition);
        fixture.send(SessionEvent::TrackingUpdate(TrackingSnapshot::new(vec![
            TrackedResult::untracked(),
            TrackedResult::with_trackable("obj2", "poster"),
        ])));

        assert!(fixture.handoff.presented().is_empty());
        assert!(fixture.controller.is_gate_open());
    }

    #[test]
    fn test_background_and_foreground_round_trip() {
        let mut fixture = Fixture::active();
        assert!(fixture.lifecycle.background());
        fixture.pump();
        assert_eq!(fixture.controller.state(), SessionState::Inactive);
        assert!(fixture.controller.is_toggle_enabled());

        assert!(fixture.lifecycle.foreground());
        fixture.pump();
        assert_eq!(fixture.controller.state(), SessionState::Active);

        let commands = fixture.engine.commands();
        assert_eq!(
            &commands[commands.len() - 2..],
            &[EngineCommand::Pause, EngineCommand::Resume]
        );
    }

    #[test]
    fn test_disappear_pauses_and_switches_toggle_off() {
        let mut fixture = Fixture::active();
        fixture.send(SessionEvent::ToggleRecognition);
        fixture.send(LifecycleEvent::ViewDidDisappear);

        assert_eq!(fixture.controller.state(), SessionState::Inactive);
        assert!(!fixture.controller.is_gate_open());
        assert!(!fixture.surface.recognition_indicator());
        assert_eq!(fixture.engine.commands().last(), Some(&EngineCommand::Pause));

        // Foregrounding while the view is hidden must not resume.
        fixture.send(LifecycleEvent::AppDidForeground);
        assert_eq!(fixture.controller.state(), SessionState::Inactive);

        fixture.send(LifecycleEvent::ViewWillAppear);
        assert_eq!(fixture.controller.state(), SessionState::Active);
        assert_eq!(fixture.engine.commands().last(), Some(&EngineCommand::Resume));
    }

    #[test]
    fn test_detection_ignored_while_inactive() {
        let mut fixture = Fixture::active();
        fixture.send(SessionEvent::ToggleRecognition);
        fixture.send(LifecycleEvent::AppWillBackground);
        fixture.send(SessionEvent::TrackingUpdate(card_snapshot()));

        assert!(fixture.handoff.presented().is_empty());
        assert!(fixture.controller.is_gate_open());
    }

    #[test]
    fn test_present_info_closes_gate_first() {
        let mut fixture = Fixture::active();
        fixture.send(SessionEvent::ToggleRecognition);
        fixture.send(SessionEvent::PresentInfo);

        assert_eq!(fixture.handoff.info_presentations(), 1);
        assert!(!fixture.controller.is_gate_open());
    }

    #[test]
    fn test_flash_toggle_follows_engine() {
        let mut fixture = Fixture::active();
        fixture.send(SessionEvent::ToggleFlash);
        assert!(fixture.controller.snapshot().flash_on);
        assert!(fixture.surface.flash_indicator());

        fixture.send(SessionEvent::ToggleFlash);
        assert!(!fixture.controller.snapshot().flash_on);
    }

    #[test]
    fn test_flash_without_torch_stays_off() {
        let mut fixture = Fixture::active();
        fixture.engine.set_torch_available(false);
        fixture.send(SessionEvent::ToggleFlash);
        assert!(!fixture.controller.snapshot().flash_on);
        assert!(!fixture.surface.flash_indicator());
    }

    #[test]
    fn test_flash_ignored_while_unavailable() {
        let mut fixture = Fixture::new(PrepareBehavior::Pending);
        fixture.send(SessionEvent::ToggleFlash);
        assert!(!fixture.engine.commands().contains(&EngineCommand::SetFlash));
    }

    #[test]
    fn test_teardown_stops_and_unregisters() {
        let mut fixture = Fixture::active();
        fixture.send(SessionEvent::ToggleRecognition);
        fixture.controller.teardown();

        assert!(fixture.controller.is_torn_down());
        assert_eq!(fixture.controller.state(), SessionState::Inactive);
        assert!(!fixture.controller.is_gate_open());
        assert!(!fixture.lifecycle.is_registered());
        assert_eq!(fixture.engine.commands().last(), Some(&EngineCommand::Stop));

        fixture.controller.teardown();
        let stops = fixture
            .engine
            .commands()
            .iter()
            .filter(|c| **c == EngineCommand::Stop)
            .count();
        assert_eq!(stops, 1);
    }

    #[test]
    fn test_drop_mid_preparation_tears_down() {
        let mut fixture = Fixture::new(PrepareBehavior::Pending);
        fixture.send(LifecycleEvent::ViewReady);
        let engine = fixture.engine.clone();
        let lifecycle = fixture.lifecycle.clone();
        drop(fixture);

        assert_eq!(engine.commands().last(), Some(&EngineCommand::Stop));
        assert!(!lifecycle.is_registered());
        assert_eq!(lifecycle.unregistrations(), 1);
    }

    #[test]
    fn test_toggle_enabled_tracks_availability() {
        let mut fixture = Fixture::new(PrepareBehavior::Succeed);
        let events = [
            LifecycleEvent::ViewReady,
            LifecycleEvent::ViewDidAppear,
            LifecycleEvent::AppWillBackground,
            LifecycleEvent::AppDidForeground,
            LifecycleEvent::ViewDidDisappear,
            LifecycleEvent::ViewWillAppear,
        ];
        for event in events {
            fixture.send(event);
            fixture.pump();
            let state = fixture.controller.state();
            assert_eq!(fixture.controller.is_toggle_enabled(), state.is_available());
            assert_eq!(fixture.surface.toggle_enabled(), Some(state.is_available()));
        }

        fixture.send(LifecycleEvent::Teardown);
        assert_eq!(fixture.controller.state(), SessionState::Inactive);
        assert!(!fixture.controller.is_toggle_enabled());
        assert_eq!(fixture.surface.toggle_enabled(), Some(false));
    }

    #[test]
    fn test_teardown_after_failed_preparation_keeps_toggle_disabled() {
        let mut fixture = Fixture::new(PrepareBehavior::Reject("no camera".into()));
        fixture.send(LifecycleEvent::ViewReady);
        assert_eq!(fixture.controller.state(), SessionState::Unavailable);
        assert_eq!(fixture.surface.toggle_enabled(), Some(false));

        fixture.controller.teardown();

        assert_eq!(fixture.controller.state(), SessionState::Inactive);
        assert!(!fixture.controller.is_toggle_enabled());
        assert!(!fixture.controller.snapshot().toggle_enabled);
        assert_eq!(fixture.surface.toggle_enabled(), Some(false));
    }

    #[test]
    fn test_teardown_while_inactive_disables_toggle() {
        let mut fixture = Fixture::active();
        fixture.send(LifecycleEvent::AppWillBackground);
        assert!(fixture.controller.is_toggle_enabled());

        fixture.controller.teardown();

        assert_eq!(fixture.controller.state(), SessionState::Inactive);
        assert_eq!(fixture.surface.toggle_enabled(), Some(false));
    }
}
