//! Session thread: the single serialized context that owns a controller.
//!
//! Every input (engine callbacks, lifecycle notifications, user actions) is a
//! [`SessionMessage`] on one channel. The thread drains it in order, so the
//! controller needs no locks. The loop exits on teardown or shutdown; dropping
//! the [`SessionRuntime`] shuts it down and joins the thread.

use std::sync::mpsc;
use std::thread::{self, JoinHandle, ThreadId};

use tracing::{info, warn};

use super::controller::{Collaborators, SessionController};
use super::event::{EventSink, LifecycleEvent, SessionEvent, SessionMessage};
use crate::config::SessionConfig;
use crate::error::{RecognitionError, Result};
use crate::types::SessionSnapshot;

const THREAD_NAME: &str = "recognition-session";

/// Cloneable, thread-safe entry point into a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    sink: EventSink,
    session_thread: ThreadId,
}

impl SessionHandle {
    pub fn send(&self, event: impl Into<SessionEvent>) -> Result<()> {
        self.sink.send(event.into())
    }

    pub fn view_ready(&self) -> Result<()> {
        self.send(LifecycleEvent::ViewReady)
    }

    pub fn view_will_appear(&self) -> Result<()> {
        self.send(LifecycleEvent::ViewWillAppear)
    }

    pub fn view_did_appear(&self) -> Result<()> {
        self.send(LifecycleEvent::ViewDidAppear)
    }

    pub fn view_did_disappear(&self) -> Result<()> {
        self.send(LifecycleEvent::ViewDidDisappear)
    }

    pub fn toggle_recognition(&self) -> Result<()> {
        self.send(SessionEvent::ToggleRecognition)
    }

    pub fn toggle_flash(&self) -> Result<()> {
        self.send(SessionEvent::ToggleFlash)
    }

    pub fn present_info(&self) -> Result<()> {
        self.send(SessionEvent::PresentInfo)
    }

    pub fn teardown(&self) -> Result<()> {
        self.send(LifecycleEvent::Teardown)
    }

    /// Waits until every message sent before this call has been processed.
    ///
    /// Fails with [`RecognitionError::SnapshotOnSessionThread`] when called
    /// from a collaborator callback, which could never see its own reply.
    pub fn snapshot(&self) -> Result<SessionSnapshot> {
        if thread::current().id() == self.session_thread {
            return Err(RecognitionError::SnapshotOnSessionThread);
        }
        let (reply, rx) = mpsc::channel();
        self.sink.send_message(SessionMessage::Snapshot { reply })?;
        rx.recv().map_err(|_| RecognitionError::SessionClosed)
    }
}

pub struct SessionRuntime {
    handle: SessionHandle,
    thread: Option<JoinHandle<()>>,
}

impl SessionRuntime {
    /// Builds the controller and starts its thread. The session stays in
    /// `Undefined` until the host reports `ViewReady`.
    pub fn spawn(config: SessionConfig, collaborators: Collaborators) -> Result<Self> {
        let (sink, rx) = EventSink::channel();
        let controller = SessionController::new(config, collaborators, sink.clone())?;
        let thread = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run_session(controller, rx))
            .map_err(RecognitionError::SpawnFailed)?;

        Ok(Self {
            handle: SessionHandle {
                sink,
                session_thread: thread.thread().id(),
            },
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Tears the session down and waits for the thread to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        // The thread may already have exited after an explicit teardown.
        let _ = self.handle.sink.send_message(SessionMessage::Shutdown);
        if thread.join().is_err() {
            warn!("Session thread panicked");
        }
    }
}

impl Drop for SessionRuntime {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_session(mut controller: SessionController, rx: mpsc::Receiver<SessionMessage>) {
    info!(session_id = %controller.session_id(), "Session thread started");

    while let Ok(message) = rx.recv() {
        match message {
            SessionMessage::Event(event) => {
                controller.handle(event);
                if controller.is_torn_down() {
                    break;
                }
            }
            SessionMessage::Snapshot { reply } => {
                let _ = reply.send(controller.snapshot());
            }
            SessionMessage::Shutdown => break,
        }
    }

    controller.teardown();
    info!(session_id = %controller.session_id(), "Session thread stopped");
}
