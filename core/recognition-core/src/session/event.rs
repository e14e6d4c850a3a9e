//! Inbound events and the session mailbox they travel through.

use std::sync::mpsc;

use crate::engine::TrackingSnapshot;
use crate::error::{RecognitionError, Result};
use crate::types::SessionSnapshot;

/// Events that drive the lifecycle transition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The presentation surface finished loading.
    ViewReady,
    ViewWillAppear,
    ViewDidAppear,
    ViewDidDisappear,
    AppWillBackground,
    AppDidForeground,
    PrepareSucceeded,
    PrepareFailed { reason: String },
    Teardown,
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::ViewReady => "view_ready",
            LifecycleEvent::ViewWillAppear => "view_will_appear",
            LifecycleEvent::ViewDidAppear => "view_did_appear",
            LifecycleEvent::ViewDidDisappear => "view_did_disappear",
            LifecycleEvent::AppWillBackground => "app_will_background",
            LifecycleEvent::AppDidForeground => "app_did_foreground",
            LifecycleEvent::PrepareSucceeded => "prepare_succeeded",
            LifecycleEvent::PrepareFailed { .. } => "prepare_failed",
            LifecycleEvent::Teardown => "teardown",
        }
    }
}

/// Every kind of input the session reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Lifecycle(LifecycleEvent),
    TrackingUpdate(TrackingSnapshot),
    ToggleRecognition,
    ToggleFlash,
    PresentInfo,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Lifecycle(event) => event.name(),
            SessionEvent::TrackingUpdate(_) => "tracking_update",
            SessionEvent::ToggleRecognition => "toggle_recognition",
            SessionEvent::ToggleFlash => "toggle_flash",
            SessionEvent::PresentInfo => "present_info",
        }
    }
}

impl From<LifecycleEvent> for SessionEvent {
    fn from(event: LifecycleEvent) -> Self {
        SessionEvent::Lifecycle(event)
    }
}

/// Messages processed by the session thread, one at a time.
#[derive(Debug)]
pub enum SessionMessage {
    Event(SessionEvent),
    Snapshot {
        reply: mpsc::Sender<SessionSnapshot>,
    },
    /// Tear down and stop processing.
    Shutdown,
}

/// Sending half of the session mailbox.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<SessionMessage>,
}

impl EventSink {
    /// Creates a mailbox. The receiver belongs to whoever owns the controller.
    pub fn channel() -> (Self, mpsc::Receiver<SessionMessage>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, event: SessionEvent) -> Result<()> {
        self.send_message(SessionMessage::Event(event))
    }

    pub fn send_message(&self, message: SessionMessage) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| RecognitionError::SessionClosed)
    }
}
