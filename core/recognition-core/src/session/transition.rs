//! Maps lifecycle events to state transitions and engine commands.
//! Pure: the controller executes the returned commands. Unlisted combinations keep the state.

use super::event::LifecycleEvent;
use crate::types::SessionState;

/// What the controller knows about its presentation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewPresence {
    pub visible: bool,
    /// Set once the surface has completed its first appearance.
    pub has_appeared: bool,
}

/// Side effects requested by a transition, executed in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    RegisterObservers,
    UnregisterObservers,
    Prepare,
    Start,
    Stop,
    Pause,
    Resume,
    EnableContinuousAutofocus,
    /// Switch the recognition toggle off and close the detection gate.
    CloseGate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: SessionState,
    pub commands: Vec<Command>,
}

impl Transition {
    fn to(next: SessionState, commands: &[Command]) -> Self {
        Self {
            next,
            commands: commands.to_vec(),
        }
    }

    fn stay(current: SessionState) -> Self {
        Self::to(current, &[])
    }

    pub fn changes_state(&self, current: SessionState) -> bool {
        self.next != current
    }
}

pub fn next_transition(
    current: SessionState,
    view: ViewPresence,
    event: &LifecycleEvent,
) -> Transition {
    use Command::*;
    use SessionState::*;

    match (current, event) {
        (Undefined, LifecycleEvent::ViewReady) => {
            Transition::to(Preparing, &[RegisterObservers, Prepare])
        }
        (Preparing, LifecycleEvent::PrepareSucceeded) => {
            Transition::to(Active, &[Start, EnableContinuousAutofocus])
        }
        (Preparing, LifecycleEvent::PrepareFailed { .. }) => Transition::to(Unavailable, &[]),
        (Active, LifecycleEvent::AppWillBackground) => Transition::to(Inactive, &[Pause]),
        (Inactive, LifecycleEvent::AppDidForeground) if view.visible => {
            Transition::to(Active, &[Resume])
        }
        (Active, LifecycleEvent::ViewDidDisappear) => Transition::to(Inactive, &[Pause, CloseGate]),
        (_, LifecycleEvent::ViewDidDisappear) => Transition::to(current, &[CloseGate]),
        (Inactive, LifecycleEvent::ViewWillAppear) if view.has_appeared => {
            Transition::to(Active, &[Resume])
        }
        (_, LifecycleEvent::Teardown) => {
            Transition::to(Inactive, &[CloseGate, Stop, UnregisterObservers])
        }
        _ => Transition::stay(current),
    }
}
