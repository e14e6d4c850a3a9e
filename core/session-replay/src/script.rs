//! Replay scripts: one JSON object per line, each naming a step.
//!
//! ```text
//! # comments and blank lines are skipped
//! {"step": "view_ready"}
//! {"step": "complete_preparation"}
//! {"step": "toggle_recognition"}
//! {"step": "tracking_update", "results": [{"trackable": {"identifier": "obj1", "name": "card"}}]}
//! ```

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use recognition_core::sim::{
    PrepareBehavior, RecordingHandoff, RecordingLifecycle, RecordingSurface, SimulatedEngine,
};
use recognition_core::{
    Collaborators, EngineCommand, RecognitionError, SessionConfig, SessionRuntime,
    SessionSnapshot, TrackedResult, TrackingSnapshot,
};

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Script line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown engine command: {0}")]
    UnknownCommand(String),

    #[error("Failed to write transcript: {0}")]
    Output(#[source] serde_json::Error),

    #[error(transparent)]
    Session(#[from] RecognitionError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    ViewReady,
    ViewWillAppear,
    ViewDidAppear,
    ViewDidDisappear,
    AppWillBackground,
    AppDidForeground,
    CompletePreparation,
    FailPreparation {
        #[serde(default)]
        reason: Option<String>,
    },
    TrackingUpdate {
        #[serde(default)]
        results: Vec<TrackedResult>,
    },
    ToggleRecognition,
    ToggleFlash,
    PresentInfo,
    Teardown,
}

impl ScriptStep {
    pub fn name(&self) -> &'static str {
        match self {
            ScriptStep::ViewReady => "view_ready",
            ScriptStep::ViewWillAppear => "view_will_appear",
            ScriptStep::ViewDidAppear => "view_did_appear",
            ScriptStep::ViewDidDisappear => "view_did_disappear",
            ScriptStep::AppWillBackground => "app_will_background",
            ScriptStep::AppDidForeground => "app_did_foreground",
            ScriptStep::CompletePreparation => "complete_preparation",
            ScriptStep::FailPreparation { .. } => "fail_preparation",
            ScriptStep::TrackingUpdate { .. } => "tracking_update",
            ScriptStep::ToggleRecognition => "toggle_recognition",
            ScriptStep::ToggleFlash => "toggle_flash",
            ScriptStep::PresentInfo => "present_info",
            ScriptStep::Teardown => "teardown",
        }
    }
}

/// Parses a script, returning each step with its 1-based line number.
pub fn parse_script(content: &str) -> Result<Vec<(usize, ScriptStep)>, ReplayError> {
    let mut steps = Vec::new();
    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step = serde_json::from_str(line).map_err(|source| ReplayError::Parse {
            line: index + 1,
            source,
        })?;
        steps.push((index + 1, step));
    }
    Ok(steps)
}

#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub prepare: PrepareBehavior,
    pub failing_commands: Vec<EngineCommand>,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            prepare: PrepareBehavior::Pending,
            failing_commands: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TranscriptLine<'a> {
    line: usize,
    step: &'a str,
    /// False when the step had nobody to deliver to (e.g. no engine delegate yet).
    delivered: bool,
    at: DateTime<Utc>,
    snapshot: &'a SessionSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentedTarget {
    pub identifier: String,
    pub name: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub final_snapshot: Option<SessionSnapshot>,
    pub presented: Vec<PresentedTarget>,
    pub info_presentations: u32,
    pub engine_commands: Vec<EngineCommand>,
}

/// Runs `steps` against a fresh session with simulated collaborators, writing
/// one transcript line per step to `out`.
pub fn run_script(
    steps: &[(usize, ScriptStep)],
    config: SessionConfig,
    options: &ReplayOptions,
    out: &mut impl Write,
) -> Result<ReplaySummary, ReplayError> {
    let engine = SimulatedEngine::new(options.prepare.clone());
    for command in &options.failing_commands {
        engine.fail_command(*command);
    }
    let handoff = RecordingHandoff::new();
    let lifecycle = RecordingLifecycle::new();

    let runtime = SessionRuntime::spawn(
        config,
        Collaborators {
            engine: Box::new(engine.clone()),
            surface: Box::new(RecordingSurface::new()),
            handoff: Box::new(handoff.clone()),
            lifecycle: Box::new(lifecycle.clone()),
        },
    )?;
    let session = runtime.handle();
    let mut final_snapshot = None;

    for (line, step) in steps {
        let delivered = match step {
            ScriptStep::ViewReady => session.view_ready().map(|_| true)?,
            ScriptStep::ViewWillAppear => session.view_will_appear().map(|_| true)?,
            ScriptStep::ViewDidAppear => session.view_did_appear().map(|_| true)?,
            ScriptStep::ViewDidDisappear => session.view_did_disappear().map(|_| true)?,
            ScriptStep::AppWillBackground => lifecycle.background(),
            ScriptStep::AppDidForeground => lifecycle.foreground(),
            ScriptStep::CompletePreparation => engine.complete_preparation(),
            ScriptStep::FailPreparation { reason } => engine.fail_preparation(
                reason
                    .clone()
                    .unwrap_or_else(|| "scripted failure".to_string()),
            ),
            ScriptStep::TrackingUpdate { results } => {
                engine.emit_tracking(TrackingSnapshot::new(results.clone()))
            }
            ScriptStep::ToggleRecognition => session.toggle_recognition().map(|_| true)?,
            ScriptStep::ToggleFlash => session.toggle_flash().map(|_| true)?,
            ScriptStep::PresentInfo => session.present_info().map(|_| true)?,
            ScriptStep::Teardown => session.teardown().map(|_| true)?,
        };

        if !delivered {
            tracing::warn!(line, step = step.name(), "Step had no receiver; skipped");
        }

        // Teardown ends the session thread, so there is nothing left to ask.
        let snapshot = match session.snapshot() {
            Ok(snapshot) => snapshot,
            Err(RecognitionError::SessionClosed) => {
                tracing::info!(line, "Session closed; stopping replay");
                break;
            }
            Err(err) => return Err(err.into()),
        };
        let transcript = TranscriptLine {
            line: *line,
            step: step.name(),
            delivered,
            at: Utc::now(),
            snapshot: &snapshot,
        };
        serde_json::to_writer(&mut *out, &transcript).map_err(ReplayError::Output)?;
        out.write_all(b"\n")?;
        final_snapshot = Some(snapshot);
    }

    runtime.shutdown();

    Ok(ReplaySummary {
        final_snapshot,
        presented: handoff
            .presented()
            .into_iter()
            .map(|(object, target)| PresentedTarget {
                identifier: object.identifier,
                name: object.name,
                target,
            })
            .collect(),
        info_presentations: handoff.info_presentations(),
        engine_commands: engine.commands(),
    })
}
