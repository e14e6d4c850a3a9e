//! session-replay: drive a recognition session from a script.
//!
//! Uses the simulated engine and host collaborators from `recognition-core`,
//! so lifecycle and detection behavior can be exercised without a device.
//!
//! ## Subcommands
//!
//! - `run`: replay a JSON-lines script, printing one transcript line per step
//! - `check-config`: print the effective session configuration

mod logging;
mod script;

use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};

use recognition_core::sim::PrepareBehavior;
use recognition_core::{load_session_config, EngineCommand, TrackableResolver};

use script::{parse_script, run_script, ReplayError, ReplayOptions};

#[derive(Parser)]
#[command(name = "session-replay")]
#[command(about = "Replay recognition session scripts against a simulated engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a script (JSON lines, one step per line)
    Run {
        /// Script file to replay
        #[arg(long, value_name = "PATH")]
        script: PathBuf,

        /// Session config (TOML); defaults to the user config location
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// How the simulated engine answers prepare
        #[arg(long, value_enum, default_value_t = PrepareMode::Pending)]
        prepare: PrepareMode,

        /// Engine command that should fail (repeatable)
        #[arg(long = "fail-command", value_name = "COMMAND")]
        fail_commands: Vec<String>,
    },

    /// Print the effective session configuration
    CheckConfig {
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PrepareMode {
    /// Wait for a `complete_preparation` or `fail_preparation` step
    Pending,
    Succeed,
    Fail,
    /// Refuse synchronously from prepare
    Reject,
}

impl PrepareMode {
    fn behavior(self) -> PrepareBehavior {
        match self {
            PrepareMode::Pending => PrepareBehavior::Pending,
            PrepareMode::Succeed => PrepareBehavior::Succeed,
            PrepareMode::Fail => PrepareBehavior::Fail("simulated preparation failure".into()),
            PrepareMode::Reject => PrepareBehavior::Reject("simulated engine refusal".into()),
        }
    }
}

fn main() {
    logging::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            script,
            config,
            prepare,
            fail_commands,
        } => run(&script, config.as_deref(), prepare, &fail_commands),
        Commands::CheckConfig { config } => check_config(config.as_deref()),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "session-replay failed");
        std::process::exit(1);
    }
}

fn run(
    script_path: &Path,
    config_path: Option<&Path>,
    prepare: PrepareMode,
    fail_commands: &[String],
) -> Result<(), ReplayError> {
    let config = load_session_config(config_path)?;
    let content = fs_err::read_to_string(script_path)?;
    let steps = parse_script(&content)?;

    let failing_commands = fail_commands
        .iter()
        .map(|name| {
            EngineCommand::parse(name).ok_or_else(|| ReplayError::UnknownCommand(name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let options = ReplayOptions {
        prepare: prepare.behavior(),
        failing_commands,
    };

    tracing::info!(
        script = %script_path.display(),
        steps = steps.len(),
        prepare = ?prepare,
        "Replaying session script"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = run_script(&steps, config, &options, &mut out)?;
    serde_json::to_writer_pretty(&mut out, &serde_json::json!({ "summary": summary }))
        .map_err(ReplayError::Output)?;
    out.write_all(b"\n")?;
    Ok(())
}

fn check_config(config_path: Option<&Path>) -> Result<(), ReplayError> {
    let config = load_session_config(config_path)?;
    // Surface a bad base URL here rather than at the first replay.
    TrackableResolver::new(&config.navigation)?;
    let rendered = serde_json::to_string_pretty(&config).map_err(ReplayError::Output)?;
    println!("{}", rendered);
    Ok(())
}
