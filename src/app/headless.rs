//! `migrator run`: drives one migration end to end without a UI.

use crate::app::cli::RunArgs;
use crate::app::report;
use crate::collaborators::MigrationServices;
use crate::config::MigrationConfig;
use crate::domain::{EngineError, MigrationState, MigrationSummary};
use crate::engine::{CancelOutcome, MigrationEngine, MigrationHandle};
use crate::notifications::progress_channel;
use crate::paths;
use crate::scripted::{Scenario, ScriptedCollaborators};
use crate::state_machine::EngineSnapshot;
use crate::structured_logger::StructuredLogger;
use anyhow::{Context, Result};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Final state of a headless run.
pub struct RunOutcome {
    pub summary: MigrationSummary,
    pub log_path: PathBuf,
}

pub async fn run(args: RunArgs) -> Result<ExitCode> {
    let outcome = execute(&args).await?;

    if args.json {
        let json = serde_json::to_string_pretty(&outcome.summary)
            .context("Failed to serialize migration summary")?;
        println!("{json}");
    } else {
        println!();
        print!("{}", report::format_summary(&outcome.summary));
        println!("\nStructured log: {}", outcome.log_path.display());
    }

    if outcome.summary.state == MigrationState::Completed {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

pub async fn execute(args: &RunArgs) -> Result<RunOutcome> {
    let config = load_config(args.config.as_deref())?;
    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::happy_path(),
    };

    let session_id = uuid::Uuid::new_v4().to_string();
    let logs_dir = match &args.log_dir {
        Some(root) => paths::session_logs_dir_in(root, &session_id)?,
        None => paths::session_logs_dir(&session_id)?,
    };
    let logger = Arc::new(
        StructuredLogger::new(&session_id, &logs_dir)
            .with_context(|| format!("Failed to open structured log in {}", logs_dir.display()))?,
    );
    let log_path = logger.path().clone();
    tracing::info!(session = %session_id, log = %log_path.display(), "starting migration run");

    let (notifier, inbox) = progress_channel();
    let collaborators = Arc::new(ScriptedCollaborators::new(scenario, Some(notifier)));
    let (handle, task) = MigrationEngine::spawn(
        MigrationServices::from_single(collaborators),
        inbox,
        config,
        logger,
    );
    let printer = (!args.json).then(|| spawn_progress_printer(handle.subscribe()));

    drive(&handle, handle.start()).await?;
    let after_assessment = handle.snapshot();
    if !args.json {
        if let Some(assessment) = &after_assessment.migration_assessment {
            print!(
                "{}",
                report::format_assessment(assessment, &after_assessment.validation_results)
            );
        }
    }

    let ready = after_assessment.migration_state == MigrationState::AssessmentCompleted
        && after_assessment
            .migration_assessment
            .as_ref()
            .is_some_and(|a| a.can_migrate);
    if ready {
        if args.yes || confirm("Proceed with the migration? [y/N] ").await? {
            drive(&handle, handle.proceed()).await?;
        } else {
            handle.cancel().await?;
            eprintln!("Migration cancelled; nothing was changed.");
        }
    }

    let summary = handle.summary().await?;
    drop(handle);
    task.await.context("Migration engine task panicked")?;
    if let Some(printer) = printer {
        printer.await.context("Progress printer task panicked")?;
    }

    Ok(RunOutcome { summary, log_path })
}

fn load_config(path: Option<&Path>) -> Result<MigrationConfig> {
    if let Some(path) = path {
        return MigrationConfig::load(path);
    }
    match paths::user_config_path() {
        Ok(user) if user.exists() => MigrationConfig::load(&user),
        _ => Ok(MigrationConfig::default_config()),
    }
}

/// Awaits an engine call while turning Ctrl-C into cancel, then confirm.
async fn drive<F>(handle: &MigrationHandle, call: F) -> Result<()>
where
    F: Future<Output = Result<(), EngineError>>,
{
    tokio::pin!(call);
    let mut confirmation: Option<JoinHandle<()>> = None;

    let result = loop {
        tokio::select! {
            result = &mut call => break result,
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                if let Some(task) = on_interrupt(handle).await? {
                    confirmation = Some(task);
                }
            }
        }
    };

    if let Some(task) = confirmation {
        task.await.context("Rollback confirmation task panicked")?;
    }
    result.map_err(anyhow::Error::from)
}

async fn on_interrupt(handle: &MigrationHandle) -> Result<Option<JoinHandle<()>>> {
    if handle.snapshot().showing_rollback_confirmation {
        eprintln!("Rollback confirmed.");
        let handle = handle.clone();
        // Resolves only once the rollback has finished.
        let task = tokio::spawn(async move {
            if let Err(err) = handle.confirm_rollback().await {
                tracing::warn!("rollback confirmation rejected: {err}");
            }
        });
        return Ok(Some(task));
    }

    match handle.cancel().await? {
        CancelOutcome::Reset => eprintln!("Cancelled; nothing was changed."),
        CancelOutcome::ConfirmationRequested => {
            eprintln!("Cancelling now requires rolling back. Press Ctrl-C again to confirm.")
        }
        CancelOutcome::NoOp => {}
    }
    Ok(None)
}

async fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{prompt}");
    std::io::stderr().flush().context("Failed to flush prompt")?;

    let mut line = String::new();
    let mut stdin = tokio::io::BufReader::new(tokio::io::stdin());
    stdin
        .read_line(&mut line)
        .await
        .context("Failed to read confirmation from stdin")?;
    Ok(is_affirmative(&line))
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Prints a line whenever the phase, status or whole percentage changes.
fn spawn_progress_printer(mut snapshots: watch::Receiver<EngineSnapshot>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_line = String::new();
        let mut rolling_back = false;
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();

            let now_rolling_back = snapshot.migration_state == MigrationState::RollingBack;
            if now_rolling_back && !rolling_back {
                println!("Rolling back to legacy data...");
            }
            rolling_back = now_rolling_back;

            let line = report::progress_line(&snapshot);
            if line != last_line {
                println!("{line}");
                last_line = line;
            }
        }
    })
}

#[cfg(test)]
#[path = "tests/headless_tests.rs"]
mod tests;
