#[derive(Debug, Clone)]
pub enum Message {
    // === CONFIG MESSAGES ===
    ConfigWizardHeader,
    ConfigSaved(String), // path
    ConfigDeleted,
    ConfigNotFound,
    PromptAgendaPath,
    PromptDatabasePath,
    PromptDaysBack,
    PromptDaysAhead,

    // === DATABASE MESSAGES ===
    DatabaseReady(String), // path
    DatabaseUpToDate,
    MigrationFailed(u32, String), // version, name

    // === TASK MESSAGES ===
    TaskCreated(i32, String),           // id, title
    TaskDuplicate(i32, String),         // existing id, title
    TaskDuplicateHint,
    TaskUpdated(i32),
    TaskNotFound(i32),
    TaskWouldDuplicate(i32, i32),       // id, colliding id
    TaskStatusChanged(i32, String),     // id, status
    TaskDeleted(i32),
    TasksHeader,
    TaskHeader(i32),
    TasksNotFound,
    TasksToBeDeleted,
    ConfirmDeleteTasks(usize),
    NoChangesDetected,
    InvalidDate(String),

    // === RENDER MESSAGES ===
    AgendaRendered(String, usize), // path, task count
    NoTasksToRender,

    // === SYNC MESSAGES ===
    SyncReading(String), // path
    SyncWarningsHeader,
    SyncChangesHeader,
    SyncAppliedHeader,
    SyncSkippedHeader,
    SyncFailedHeader,
    SyncUnmatchedEntriesHeader,
    SyncUnmatchedTasksHeader,
    SyncSummaryHeader,
    SyncUpToDate,
    SyncDryRunHint,
    ConfirmApplyChanges(usize),
    SyncApplied(usize, usize, usize), // applied, skipped, failed
    SyncAborted,

    // === GENERIC MESSAGES ===
    OperationCancelled,
}
