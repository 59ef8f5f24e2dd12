//! Text for every [`Message`] variant. All user-visible wording lives here.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            // === CONFIG MESSAGES ===
            Message::ConfigWizardHeader => "Agenda configuration".to_string(),
            Message::ConfigSaved(path) => format!("Configuration saved to {}", path),
            Message::ConfigDeleted => "Configuration removed".to_string(),
            Message::ConfigNotFound => "No configuration file to remove".to_string(),
            Message::PromptAgendaPath => "Agenda Markdown file".to_string(),
            Message::PromptDatabasePath => "Task database file".to_string(),
            Message::PromptDaysBack => "Days before today to render".to_string(),
            Message::PromptDaysAhead => "Days after today to render".to_string(),

            // === DATABASE MESSAGES ===
            Message::DatabaseReady(path) => format!("Database ready at {}", path),
            Message::DatabaseUpToDate => "Database schema is up to date".to_string(),
            Message::MigrationFailed(version, name) => format!("Migration v{} ({}) failed", version, name),

            // === TASK MESSAGES ===
            Message::TaskCreated(id, title) => format!("Task {} created: {}", id, title),
            Message::TaskDuplicate(id, title) => format!("Task {} already tracks \"{}\" for that due date", id, title),
            Message::TaskDuplicateHint => "Use --force to create it anyway".to_string(),
            Message::TaskUpdated(id) => format!("Task {} updated", id),
            Message::TaskNotFound(id) => format!("Task {} not found", id),
            Message::TaskWouldDuplicate(id, other) => {
                format!("Task {} not updated: the change would make it a duplicate of task {}", id, other)
            }
            Message::TaskStatusChanged(id, status) => format!("Task {} is now {}", id, status),
            Message::TaskDeleted(id) => format!("Task {} deleted", id),
            Message::TasksHeader => "Tasks:".to_string(),
            Message::TaskHeader(id) => format!("Task {}:", id),
            Message::TasksNotFound => "No tasks found".to_string(),
            Message::TasksToBeDeleted => "Tasks to be deleted:".to_string(),
            Message::ConfirmDeleteTasks(count) => format!("Delete {} task(s)?", count),
            Message::NoChangesDetected => "Nothing to change".to_string(),
            Message::InvalidDate(text) => format!("Cannot understand date '{}'", text),

            // === RENDER MESSAGES ===
            Message::AgendaRendered(path, count) => format!("Rendered {} task(s) to {}", count, path),
            Message::NoTasksToRender => "No dated tasks in the render window".to_string(),

            // === SYNC MESSAGES ===
            Message::SyncReading(path) => format!("Reconciling {}", path),
            Message::SyncWarningsHeader => "Lines skipped while parsing:".to_string(),
            Message::SyncChangesHeader => "Changes found in the agenda:".to_string(),
            Message::SyncAppliedHeader => "Applied changes:".to_string(),
            Message::SyncSkippedHeader => "Skipped (would duplicate another task):".to_string(),
            Message::SyncFailedHeader => "Failed changes:".to_string(),
            Message::SyncUnmatchedEntriesHeader => "Agenda lines without a task:".to_string(),
            Message::SyncUnmatchedTasksHeader => "Tasks missing from the agenda:".to_string(),
            Message::SyncSummaryHeader => "Summary:".to_string(),
            Message::SyncUpToDate => "Agenda and database already agree".to_string(),
            Message::SyncDryRunHint => "Dry run only; pass --apply to write these changes".to_string(),
            Message::ConfirmApplyChanges(count) => format!("Apply {} change(s) to the database?", count),
            Message::SyncApplied(applied, skipped, failed) => {
                format!("{} applied, {} skipped, {} failed", applied, skipped, failed)
            }

            Message::SyncAborted => "Could not load tasks from the database; nothing was written".to_string(),

            // === GENERIC MESSAGES ===
            Message::OperationCancelled => "Operation cancelled".to_string(),
        };

        write!(f, "{}", text)
    }
}
