//! Reconciles a hand-edited agenda file back into the database.
//!
//! The default is a dry run that only reports. `--apply` shows the same
//! report, asks for confirmation and then writes through the collision
//! guard. Per-task failures are reported and do not change the exit code.

use crate::{
    db::tasks::Tasks,
    libs::{
        config::Config,
        error::ReconcileError,
        messages::Message,
        reconciler::{read_agenda, Mode, ReconcileReport, Reconciler},
        view::View,
    },
    msg_error, msg_info, msg_success, msg_warning,
};
use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Agenda file; defaults to the configured agenda file
    path: Option<PathBuf>,
    /// Write the detected changes to the database
    #[arg(long)]
    apply: bool,
    /// Skip confirmation when applying
    #[arg(short, long)]
    yes: bool,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

pub async fn cmd(args: SyncArgs) -> Result<()> {
    let config = Config::read()?;
    let path = match args.path {
        Some(path) => path,
        None => config.agenda_file()?,
    };
    let mut tasks = Tasks::open(&config.database_file()?)?;

    if !args.json {
        msg_info!(Message::SyncReading(path.display().to_string()));
    }
    let contents = read_agenda(&path)?;

    let mut reconciler = Reconciler::new(&mut tasks);
    let preview = reconciler.reconcile(&contents, Mode::DryRun).map_err(aborted)?;

    if !args.apply {
        output(&preview, args.json)?;
        if !args.json {
            if preview.has_changes() {
                msg_info!(Message::SyncDryRunHint, true);
            } else {
                msg_success!(Message::SyncUpToDate);
            }
        }
        return Ok(());
    }

    if !preview.has_changes() {
        output(&preview, args.json)?;
        if !args.json {
            msg_success!(Message::SyncUpToDate);
        }
        return Ok(());
    }

    if !args.yes {
        View::report(&preview)?;
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::ConfirmApplyChanges(preview.changes.len()).to_string())
            .default(true)
            .interact()?;
        if !confirmed {
            msg_info!(Message::OperationCancelled);
            return Ok(());
        }
    }

    let report = reconciler.reconcile(&contents, Mode::Apply).map_err(aborted)?;
    output(&report, args.json)?;
    if args.json {
        return Ok(());
    }

    let message = Message::SyncApplied(report.applied.len(), report.skipped.len(), report.failed.len());
    if report.skipped.is_empty() && report.failed.is_empty() {
        msg_success!(message, true);
    } else {
        msg_warning!(message, true);
    }
    Ok(())
}

fn aborted(err: ReconcileError) -> ReconcileError {
    if matches!(err, ReconcileError::Store(_)) {
        msg_error!(Message::SyncAborted);
    }
    err
}

fn output(report: &ReconcileReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        Ok(())
    } else {
        View::report(report)
    }
}
