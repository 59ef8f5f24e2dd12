use super::diff::ChangeRecord;
use super::messages::Message;
use super::normalizer::Fingerprint;
use super::parser::ParseWarning;
use super::reconciler::{FailedChange, Mode, ReconcileReport, ReportSummary, SkippedChange};
use super::matcher::UnmatchedEntry;
use super::task::Task;
use crate::msg_print;
use anyhow::Result;
use chrono::NaiveDateTime;
use prettytable::{row, Table};

fn due(due_dt: &Option<NaiveDateTime>) -> String {
    due_dt.map(|dt| dt.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_else(|| "-".to_string())
}

pub struct View {}

impl View {
    pub fn tasks(tasks: &[Task]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ID", "STATUS", "DUE", "TITLE", "TYPE", "TAGS"]);
        for task in tasks {
            table.add_row(row![
                task.id.unwrap_or(0),
                task.status,
                due(&task.due_dt),
                task.title,
                task.task_type.as_deref().unwrap_or("-"),
                task.tags.as_deref().unwrap_or("-")
            ]);
        }
        table.printstd();

        Ok(())
    }

    pub fn task(task: &Task) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ID", task.id.unwrap_or(0)]);
        table.add_row(row!["TITLE", task.title]);
        table.add_row(row!["STATUS", task.status]);
        table.add_row(row!["DUE", due(&task.due_dt)]);
        table.add_row(row!["TYPE", task.task_type.as_deref().unwrap_or("-")]);
        table.add_row(row!["TAGS", task.tags.as_deref().unwrap_or("-")]);
        table.add_row(row!["SOURCE", task.source.as_deref().unwrap_or("-")]);
        table.add_row(row!["BODY", task.body.as_deref().unwrap_or("-")]);
        table.add_row(row!["CREATED", task.created_at.as_deref().unwrap_or("-")]);
        table.add_row(row!["UPDATED", task.updated_at.as_deref().unwrap_or("-")]);
        table.add_row(row!["FINGERPRINT", Fingerprint::of_task(task).short()]);
        table.printstd();

        Ok(())
    }

    pub fn changes(changes: &[ChangeRecord]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["TASK", "FIELD", "OLD", "NEW"]);
        for change in changes {
            table.add_row(row![change.task_id, change.field(), change.old_value(), change.new_value()]);
        }
        table.printstd();

        Ok(())
    }

    pub fn skipped(skipped: &[SkippedChange]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["TASK", "FIELD", "NEW", "COLLIDES WITH"]);
        for item in skipped {
            table.add_row(row![
                item.change.task_id,
                item.change.field(),
                item.change.new_value(),
                item.colliding_task_id
            ]);
        }
        table.printstd();

        Ok(())
    }

    pub fn failed(failed: &[FailedChange]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["TASK", "FIELD", "REASON"]);
        for item in failed {
            table.add_row(row![item.change.task_id, item.change.field(), item.reason]);
        }
        table.printstd();

        Ok(())
    }

    pub fn unmatched_entries(entries: &[UnmatchedEntry]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["LINE", "DATE", "TITLE", "REASON"]);
        for item in entries {
            table.add_row(row![
                item.entry.line,
                item.entry.section_date.format("%Y-%m-%d"),
                item.entry.raw_title,
                item.reason
            ]);
        }
        table.printstd();

        Ok(())
    }

    pub fn warnings(warnings: &[ParseWarning]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["LINE", "WARNING", "TEXT"]);
        for warning in warnings {
            table.add_row(row![warning.line, warning.kind, warning.text]);
        }
        table.printstd();

        Ok(())
    }

    pub fn summary(summary: &ReportSummary) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ENTRIES", "MATCHED", "CHANGES", "APPLIED", "SKIPPED", "FAILED", "UNMATCHED ENTRIES", "UNMATCHED TASKS", "WARNINGS"]);
        table.add_row(row![
            summary.entries,
            summary.matched,
            summary.changes,
            summary.applied,
            summary.skipped,
            summary.failed,
            summary.unmatched_entries,
            summary.unmatched_tasks,
            summary.warnings
        ]);
        table.printstd();

        Ok(())
    }

    /// Prints every non-empty section of a reconciliation report.
    pub fn report(report: &ReconcileReport) -> Result<()> {
        if !report.warnings.is_empty() {
            msg_print!(Message::SyncWarningsHeader, true);
            Self::warnings(&report.warnings)?;
        }

        match report.mode {
            Mode::DryRun => {
                if report.has_changes() {
                    msg_print!(Message::SyncChangesHeader, true);
                    Self::changes(&report.changes)?;
                }
            }
            Mode::Apply => {
                if !report.applied.is_empty() {
                    msg_print!(Message::SyncAppliedHeader, true);
                    Self::changes(&report.applied)?;
                }
                if !report.skipped.is_empty() {
                    msg_print!(Message::SyncSkippedHeader, true);
                    Self::skipped(&report.skipped)?;
                }
                if !report.failed.is_empty() {
                    msg_print!(Message::SyncFailedHeader, true);
                    Self::failed(&report.failed)?;
                }
            }
        }

        if !report.unmatched_entries.is_empty() {
            msg_print!(Message::SyncUnmatchedEntriesHeader, true);
            Self::unmatched_entries(&report.unmatched_entries)?;
        }
        if !report.unmatched_tasks.is_empty() {
            msg_print!(Message::SyncUnmatchedTasksHeader, true);
            Self::tasks(&report.unmatched_tasks)?;
        }

        msg_print!(Message::SyncSummaryHeader, true);
        Self::summary(&report.summary())
    }
}
