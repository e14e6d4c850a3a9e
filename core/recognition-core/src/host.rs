//! Host-side collaborators: UI surface, navigation handoff, lifecycle observers.
//!
//! All trait methods are called on the session thread, one at a time. An
//! implementation may enqueue events through a [`crate::SessionHandle`], but must
//! not wait on the session: `SessionHandle::snapshot` called from here returns
//! [`crate::RecognitionError::SnapshotOnSessionThread`].

use url::Url;

use crate::session::{EventSink, LifecycleEvent};
use crate::types::TrackableObject;

/// UI elements the controller drives.
pub trait SessionSurface: Send {
    fn set_loading(&mut self, visible: bool);

    /// Whether the recognition toggle accepts taps.
    fn set_toggle_enabled(&mut self, enabled: bool);

    /// Whether the recognition toggle shows as switched on.
    fn set_recognition_indicator(&mut self, on: bool);

    fn set_flash_indicator(&mut self, on: bool);
}

/// Presents recognized objects and informational surfaces to the user.
pub trait NavigationHandoff: Send {
    fn present(&mut self, object: &TrackableObject, target: &Url);

    fn present_info(&mut self);
}

/// Subscription to app foreground/background notifications.
pub trait LifecycleObservers: Send {
    fn register(&mut self, sink: LifecycleSink);

    /// Must be safe to call when nothing is registered.
    fn unregister(&mut self);
}

/// Receiver half handed to [`LifecycleObservers::register`].
#[derive(Debug, Clone)]
pub struct LifecycleSink {
    sink: EventSink,
}

impl LifecycleSink {
    pub fn new(sink: EventSink) -> Self {
        Self { sink }
    }

    pub fn will_enter_background(&self) {
        self.deliver(LifecycleEvent::AppWillBackground);
    }

    pub fn did_become_foreground(&self) {
        self.deliver(LifecycleEvent::AppDidForeground);
    }

    fn deliver(&self, event: LifecycleEvent) {
        if self.sink.send(event.into()).is_err() {
            tracing::debug!("Session closed; dropping lifecycle notification");
        }
    }
}
