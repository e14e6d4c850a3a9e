//! End-to-end session scenarios driven through the session thread.

use recognition_core::sim::{
    PrepareBehavior, RecordingHandoff, RecordingLifecycle, RecordingSurface, SimulatedEngine,
};
use recognition_core::{
    Collaborators, EngineCommand, NavigationConfig, SessionConfig, SessionHandle, SessionRuntime,
    SessionState, TrackableObject, TrackedResult, TrackingSnapshot,
};

struct Harness {
    runtime: SessionRuntime,
    engine: SimulatedEngine,
    surface: RecordingSurface,
    handoff: RecordingHandoff,
    lifecycle: RecordingLifecycle,
}

impl Harness {
    fn spawn(behavior: PrepareBehavior) -> Self {
        let config = SessionConfig {
            navigation: NavigationConfig {
                base_url: Some("https://objects.example.com/".to_string()),
                ..NavigationConfig::default()
            },
            ..SessionConfig::default()
        };
        let engine = SimulatedEngine::new(behavior);
        let surface = RecordingSurface::new();
        let handoff = RecordingHandoff::new();
        let lifecycle = RecordingLifecycle::new();
        let runtime = SessionRuntime::spawn(
            config,
            Collaborators {
                engine: Box::new(engine.clone()),
                surface: Box::new(surface.clone()),
                handoff: Box::new(handoff.clone()),
                lifecycle: Box::new(lifecycle.clone()),
            },
        )
        .expect("spawn session");

        Self {
            runtime,
            engine,
            surface,
            handoff,
            lifecycle,
        }
    }

    fn session(&self) -> SessionHandle {
        self.runtime.handle()
    }

    fn state(&self) -> SessionState {
        self.session().snapshot().expect("snapshot").state
    }

    /// Brings the session to `Active` with the view on screen.
    fn activate(&self) {
        let session = self.session();
        session.view_ready().unwrap();
        session.view_will_appear().unwrap();
        session.view_did_appear().unwrap();
        session.snapshot().unwrap();
        assert!(self.engine.complete_preparation());
        assert_eq!(self.state(), SessionState::Active);
    }
}

fn card() -> TrackingSnapshot {
    TrackingSnapshot::new(vec![TrackedResult::with_trackable("obj1", "card")])
}

#[test]
fn scenario_a_preparation_success_activates() {
    let harness = Harness::spawn(PrepareBehavior::Pending);
    assert_eq!(harness.state(), SessionState::Undefined);

    harness.session().view_ready().unwrap();
    assert_eq!(harness.state(), SessionState::Preparing);
    assert_eq!(harness.surface.loading(), Some(true));

    assert!(harness.engine.complete_preparation());
    let snapshot = harness.session().snapshot().unwrap();
    assert_eq!(snapshot.state, SessionState::Active);
    assert!(!snapshot.loading);
    assert!(snapshot.toggle_enabled);
    assert_eq!(harness.surface.loading(), Some(false));
    assert_eq!(harness.surface.toggle_enabled(), Some(true));
}

#[test]
fn scenario_b_detection_hands_off_once() {
    let harness = Harness::spawn(PrepareBehavior::Pending);
    harness.activate();
    let session = harness.session();

    session.toggle_recognition().unwrap();
    assert!(session.snapshot().unwrap().gate_open);

    assert!(harness.engine.emit_tracking(card()));
    assert!(harness.engine.emit_tracking(card()));

    let snapshot = session.snapshot().unwrap();
    assert!(!snapshot.gate_open);
    assert_eq!(snapshot.handoffs, 1);

    let presented = harness.handoff.presented();
    assert_eq!(presented.len(), 1);
    assert_eq!(presented[0].0, TrackableObject::new("obj1", "card"));
    assert_eq!(presented[0].1, "https://objects.example.com/obj1");
}

#[test]
fn scenario_c_background_pauses_and_foreground_resumes() {
    let harness = Harness::spawn(PrepareBehavior::Pending);
    harness.activate();

    assert!(harness.lifecycle.background());
    assert_eq!(harness.state(), SessionState::Inactive);
    assert_eq!(harness.engine.commands().last(), Some(&EngineCommand::Pause));

    assert!(harness.lifecycle.foreground());
    assert_eq!(harness.state(), SessionState::Active);
    assert_eq!(harness.engine.commands().last(), Some(&EngineCommand::Resume));
}

#[test]
fn scenario_d_preparation_failure_is_terminal() {
    let harness = Harness::spawn(PrepareBehavior::Pending);
    let session = harness.session();
    session.view_ready().unwrap();
    session.snapshot().unwrap();
    assert!(harness.engine.fail_preparation("dataset missing"));

    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.state, SessionState::Unavailable);
    assert!(!snapshot.toggle_enabled);
    assert!(!snapshot.loading);

    session.toggle_recognition().unwrap();
    assert!(harness.engine.emit_tracking(card()));
    assert!(harness.engine.emit_tracking(card()));
    assert!(harness.engine.complete_preparation());

    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.state, SessionState::Unavailable);
    assert!(!snapshot.gate_open);
    assert!(harness.handoff.presented().is_empty());
    assert_eq!(harness.engine.commands(), vec![EngineCommand::Prepare]);
}

#[test]
fn command_failures_are_observed_but_swallowed() {
    let harness = Harness::spawn(PrepareBehavior::Pending);
    harness.engine.fail_command(EngineCommand::Pause);
    harness.engine.fail_command(EngineCommand::Resume);
    harness.activate();

    assert!(harness.lifecycle.background());
    assert_eq!(harness.state(), SessionState::Inactive);
    assert!(harness.lifecycle.foreground());

    let snapshot = harness.session().snapshot().unwrap();
    assert_eq!(snapshot.state, SessionState::Active);
    assert_eq!(snapshot.command_failures, 2);
}

#[test]
fn info_surface_closes_gate_before_detection() {
    let harness = Harness::spawn(PrepareBehavior::Pending);
    harness.activate();
    let session = harness.session();

    session.toggle_recognition().unwrap();
    session.present_info().unwrap();
    assert!(harness.engine.emit_tracking(card()));

    let snapshot = session.snapshot().unwrap();
    assert!(!snapshot.gate_open);
    assert_eq!(snapshot.handoffs, 0);
    assert_eq!(harness.handoff.info_presentations(), 1);
}

#[test]
fn shutdown_mid_preparation_stops_engine_and_observers() {
    let harness = Harness::spawn(PrepareBehavior::Pending);
    harness.session().view_ready().unwrap();
    harness.session().snapshot().unwrap();
    assert!(harness.lifecycle.is_registered());

    let Harness {
        runtime,
        engine,
        lifecycle,
        ..
    } = harness;
    runtime.shutdown();

    assert_eq!(
        engine.commands(),
        vec![EngineCommand::Prepare, EngineCommand::Stop]
    );
    assert!(!lifecycle.is_registered());
    assert_eq!(lifecycle.unregistrations(), 1);
}
