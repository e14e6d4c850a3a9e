//! # recognition-core
//!
//! Lifecycle controller for camera-based object recognition sessions. Sits
//! between a host application, a vendor recognition engine and the user:
//! prepares and runs the engine, follows foreground/background transitions,
//! and hands a recognized object to the host at most once per time the user
//! switches recognition on.
//!
//! ## Design Principles
//!
//! - **Single writer**: one session thread owns all state; everything else enqueues.
//! - **Pure transitions**: the lifecycle table is a function returning commands.
//! - **Injected collaborators**: engine, UI surface, navigation and OS
//!   notifications are traits supplied by the host.
//! - **Observed failures**: engine command failures are logged and counted,
//!   never retried.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use recognition_core::{Collaborators, SessionConfig, SessionRuntime};
//!
//! let runtime = SessionRuntime::spawn(SessionConfig::default(), collaborators)?;
//! let session = runtime.handle();
//! session.view_ready()?;
//! session.toggle_recognition()?;
//! ```

// UniFFI scaffolding for Swift/Kotlin host bindings (see `ffi`)
uniffi::setup_scaffolding!();

pub mod config;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod host;
pub mod session;
pub mod sim;
pub mod types;

pub use config::{load_session_config, NavigationConfig, SessionConfig};
pub use engine::{
    EngineCommand, EngineDelegate, EngineError, RecognitionEngine, Trackable, TrackedResult,
    TrackingSnapshot,
};
pub use error::{RecognitionError, RecognitionFfiError, Result};
pub use ffi::{EngineBridge, HostBridge, RecognitionSession};
pub use host::{LifecycleObservers, LifecycleSink, NavigationHandoff, SessionSurface};
pub use session::{
    Collaborators, LifecycleEvent, SessionController, SessionEvent, SessionHandle, SessionRuntime,
    TrackableResolver,
};
pub use types::*;
