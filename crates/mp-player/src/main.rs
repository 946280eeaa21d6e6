//! macroplay
//!
//! Validates automation scripts and replays them against a logging executor.

mod dry_run;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dry_run::{FileMatcher, LoggingExecutor};
use mp_config::{load_settings, load_settings_or_default, PlayerSettings};
use mp_core::{CommandKind, DataSourceProvider, MemoryDataSource};
use mp_engine::{Engine, EngineState, ScriptRunner, TemplateLocator};
use mp_script::{ScriptDocument, ScriptFile};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Settings file read when `--settings` is not given
const DEFAULT_SETTINGS: &str = "macroplay.yaml";

#[derive(Parser)]
#[command(name = "macroplay")]
#[command(about = "Validate and replay automation scripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a script and print its listing
    Check {
        /// Script file (YAML or JSON)
        script: PathBuf,

        /// Data source file mapping field names to values
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Replay a script, logging every action
    Run {
        /// Script file (YAML or JSON)
        script: PathBuf,

        /// Data source file mapping field names to values
        #[arg(long)]
        data: Option<PathBuf>,

        /// Player settings file
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Start immediately instead of waiting for the start delay
        #[arg(long)]
        no_delay: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { script, data } => {
            let source = load_source(data.as_deref())?;
            let (file, doc) = load_script(&script, &source)?;
            println!(
                "{}: {} commands",
                file.display_name(&script.display().to_string()),
                doc.len()
            );
            print!("{}", listing(&doc));
        }
        Commands::Run {
            script,
            data,
            settings,
            no_delay,
        } => {
            let settings = match settings {
                Some(path) => load_settings(&path)
                    .with_context(|| format!("loading settings {}", path.display()))?,
                None => load_settings_or_default(DEFAULT_SETTINGS)?,
            };
            let source = load_source(data.as_deref())?;
            let (_, doc) = load_script(&script, &source)?;
            replay(doc, source, &settings, no_delay).await?;
        }
    }

    Ok(())
}

fn load_source(path: Option<&Path>) -> Result<MemoryDataSource> {
    match path {
        Some(path) => MemoryDataSource::load(path)
            .with_context(|| format!("loading data source {}", path.display())),
        None => Ok(MemoryDataSource::new()),
    }
}

fn load_script(path: &Path, source: &dyn DataSourceProvider) -> Result<(ScriptFile, ScriptDocument)> {
    let file = ScriptFile::load(path).with_context(|| format!("loading script {}", path.display()))?;
    let doc = file
        .to_document(source)
        .with_context(|| format!("invalid script {}", path.display()))?;
    Ok((file, doc))
}

async fn replay(
    doc: ScriptDocument,
    source: MemoryDataSource,
    settings: &PlayerSettings,
    no_delay: bool,
) -> Result<()> {
    let executor = Arc::new(LoggingExecutor::new());
    let locator = Arc::new(TemplateLocator::new(FileMatcher::new(&settings.elements_dir)));

    let mut engine = Engine::new(executor.clone(), locator, Arc::new(source));
    engine.apply_settings(settings)?;

    let start_delay = if no_delay {
        Default::default()
    } else {
        settings.start_delay_duration()?
    };

    let runner = ScriptRunner::spawn(engine, doc, start_delay);
    info!(run_id = %runner.run_id(), "Run started, press Ctrl-C to stop");

    let stop = runner.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Stop requested");
            stop.stop();
        }
    });

    let outcome = runner.join().await?;
    println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    info!(actions = executor.actions(), "Replay finished");

    if outcome.report.state == EngineState::Errored {
        bail!(
            "run failed: {}",
            outcome.report.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

/// Numbered listing with loop and block bodies indented
fn listing(doc: &ScriptDocument) -> String {
    let mut out = String::new();
    let mut depth = 0usize;

    for (index, (_, command)) in doc.iter().enumerate() {
        if matches!(command.kind, CommandKind::CycleEnd | CommandKind::BlockEnd) {
            depth = depth.saturating_sub(1);
        }

        out.push_str(&format!("{:>4}  {}{}", index, "  ".repeat(depth), command.kind));
        if !command.description.is_empty() {
            out.push_str(&format!("  # {}", command.description));
        }
        out.push('\n');

        if command.kind.opens_cycle() || matches!(command.kind, CommandKind::Block(_)) {
            depth += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_core::Command;

    fn doc(commands: Vec<Command>) -> ScriptDocument {
        let mut doc = ScriptDocument::new();
        for command in commands {
            doc.insert_after_pointer(command).unwrap();
        }
        doc
    }

    #[test]
    fn test_listing_indents_bodies() {
        let doc = doc(vec![
            Command::new(CommandKind::Cycle(2)),
            Command::new(CommandKind::WriteText("hi".into())).with_description("greet"),
            Command::new(CommandKind::CycleEnd),
            Command::new(CommandKind::Stop),
        ]);

        let lines: Vec<String> = listing(&doc).lines().map(str::to_string).collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("   1    "));
        assert!(lines[1].ends_with("# greet"));
        assert!(lines[2].starts_with("   2  "));
        assert!(!lines[2].starts_with("   2    "));
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "macroplay",
            "run",
            "form.yaml",
            "--data",
            "people.yaml",
            "--no-delay",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                script,
                data,
                settings,
                no_delay,
            } => {
                assert_eq!(script, PathBuf::from("form.yaml"));
                assert_eq!(data, Some(PathBuf::from("people.yaml")));
                assert!(settings.is_none());
                assert!(no_delay);
            }
            Commands::Check { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn test_load_script_rejects_unknown_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.yaml");
        std::fs::write(
            &path,
            "sequence:\n  - kind: write_field_value\n    parameters: {field: age}\n",
        )
        .unwrap();

        assert!(load_script(&path, &MemoryDataSource::new()).is_err());

        let source = MemoryDataSource::new().with_field("age", [1, 2]);
        let (_, doc) = load_script(&path, &source).unwrap();
        assert_eq!(doc.len(), 1);
    }
}
