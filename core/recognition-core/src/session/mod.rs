//! Recognition session lifecycle.
//!
//! # Architecture: single serialized context
//!
//! ```text
//! Engine callbacks ─┐
//! OS lifecycle ─────┼─→ EventSink → mailbox → SessionController → engine commands
//! User actions ─────┘                              │                UI flags
//!                                                  └─→ NavigationHandoff
//! ```
//!
//! Callbacks can fire on any thread; they only enqueue. The controller runs on
//! one thread and is the only writer of session state and the detection gate.
//!
//! # Module Structure
//!
//! - [`transition`]: pure `(state, view, event) -> (state, commands)` table
//! - [`gate`]: the "act on the next detection?" flag
//! - [`resolver`]: snapshot → first trackable → navigation target
//! - [`controller`]: executes transitions and the detection pipeline
//! - [`runtime`]: session thread and its cloneable handle

pub mod controller;
mod event;
pub mod gate;
pub mod resolver;
pub mod runtime;
pub mod transition;

pub use controller::{Collaborators, SessionController};
pub use event::{EventSink, LifecycleEvent, SessionEvent, SessionMessage};
pub use gate::DetectionGate;
pub use resolver::TrackableResolver;
pub use runtime::{SessionHandle, SessionRuntime};
pub use transition::{next_transition, Command, Transition, ViewPresence};
