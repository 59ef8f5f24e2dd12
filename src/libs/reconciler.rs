//! Reconciliation of a hand-edited agenda file against the task store.
//!
//! A run moves through `Parsed -> Matched -> Diffed` and then either stops
//! at `Reported` (dry run) or continues through `Applying -> Applied`. The
//! only fatal outcomes are an unreadable file and a store that cannot
//! produce its snapshot; both happen before any write. Everything that
//! concerns a single line or task ends up in the [`ReconcileReport`].

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use super::diff::{diff_pairs, patch_for, ChangeRecord};
use super::error::ReconcileError;
use super::guard::GuardOutcome;
use super::matcher::{match_entries, MatchMethod, MatchedPair, UnmatchedEntry};
use super::parser::{parse_agenda, ParseWarning, ParsedAgenda};
use super::store::TaskStore;
use super::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    DryRun,
    Apply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Parsed,
    Matched,
    Diffed,
    Reported,
    Applying,
    Applied,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Idle => "idle",
            Phase::Parsed => "parsed",
            Phase::Matched => "matched",
            Phase::Diffed => "diffed",
            Phase::Reported => "reported",
            Phase::Applying => "applying",
            Phase::Applied => "applied",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairSummary {
    pub line: usize,
    pub task_id: i32,
    pub method: MatchMethod,
}

impl From<&MatchedPair> for PairSummary {
    fn from(pair: &MatchedPair) -> Self {
        PairSummary {
            line: pair.entry.line,
            task_id: pair.task_id(),
            method: pair.method,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedChange {
    #[serde(flatten)]
    pub change: ChangeRecord,
    pub colliding_task_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedChange {
    #[serde(flatten)]
    pub change: ChangeRecord,
    pub reason: String,
}

/// Outcome of one run. No report is produced when the agenda file cannot
/// be read or the store snapshot cannot be loaded; those end the run with
/// a [`ReconcileError`] before anything is written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub mode: Mode,
    pub phase: Phase,
    pub entries: usize,
    pub warnings: Vec<ParseWarning>,
    pub matched: Vec<PairSummary>,
    /// Every change the file implies, in file order.
    pub changes: Vec<ChangeRecord>,
    pub applied: Vec<ChangeRecord>,
    pub skipped: Vec<SkippedChange>,
    pub failed: Vec<FailedChange>,
    pub unmatched_entries: Vec<UnmatchedEntry>,
    pub unmatched_tasks: Vec<Task>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub entries: usize,
    pub warnings: usize,
    pub matched: usize,
    pub changes: usize,
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
    pub unmatched_entries: usize,
    pub unmatched_tasks: usize,
}

impl ReconcileReport {
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            entries: self.entries,
            warnings: self.warnings.len(),
            matched: self.matched.len(),
            changes: self.changes.len(),
            applied: self.applied.len(),
            skipped: self.skipped.len(),
            failed: self.failed.len(),
            unmatched_entries: self.unmatched_entries.len(),
            unmatched_tasks: self.unmatched_tasks.len(),
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Reads an agenda file as UTF-8. A leading byte order mark is dropped.
pub fn read_agenda(path: &Path) -> Result<String, ReconcileError> {
    let bytes = fs::read(path).map_err(|source| ReconcileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|_| ReconcileError::Encoding {
        path: path.to_path_buf(),
    })?;

    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

pub struct Reconciler<'a, S: TaskStore> {
    store: &'a mut S,
    phase: Phase,
}

impl<'a, S: TaskStore> Reconciler<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self {
            store,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn reconcile_file(&mut self, path: &Path, mode: Mode) -> Result<ReconcileReport, ReconcileError> {
        let contents = read_agenda(path)?;
        self.reconcile(&contents, mode)
    }

    pub fn reconcile(&mut self, contents: &str, mode: Mode) -> Result<ReconcileReport, ReconcileError> {
        self.phase = Phase::Idle;

        let parsed = parse_agenda(contents);
        self.advance(Phase::Parsed);

        let snapshot = self.store.snapshot()?;
        let scope = ParsedAgenda::section_dates(contents);
        let outcome = match_entries(&parsed.entries, &snapshot, &scope);
        self.advance(Phase::Matched);

        let changes = diff_pairs(&outcome.pairs);
        self.advance(Phase::Diffed);

        let mut report = ReconcileReport {
            mode,
            phase: self.phase,
            entries: parsed.entries.len(),
            warnings: parsed.warnings,
            matched: outcome.pairs.iter().map(PairSummary::from).collect(),
            changes,
            applied: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            unmatched_entries: outcome.unmatched_entries,
            unmatched_tasks: outcome.unmatched_tasks,
        };

        match mode {
            Mode::DryRun => self.advance(Phase::Reported),
            Mode::Apply => {
                self.advance(Phase::Applying);
                self.apply(&mut report);
                self.advance(Phase::Applied);
            }
        }

        report.phase = self.phase;
        Ok(report)
    }

    fn advance(&mut self, phase: Phase) {
        tracing::debug!(from = %self.phase, to = %phase, "reconcile phase");
        self.phase = phase;
    }

    /// Applies the report's changes task by task in ascending id order.
    fn apply(&mut self, report: &mut ReconcileReport) {
        let mut by_task: BTreeMap<i32, Vec<ChangeRecord>> = BTreeMap::new();
        for record in &report.changes {
            by_task.entry(record.task_id).or_default().push(record.clone());
        }

        for (task_id, records) in by_task {
            let patch = patch_for(&records);
            match self.store.apply_guarded(task_id, &patch) {
                Ok(GuardOutcome::Applied { .. }) => {
                    tracing::debug!(task_id, fields = records.len(), "applied");
                    report.applied.extend(records);
                }
                Ok(GuardOutcome::Collision { other_id }) => {
                    tracing::info!(task_id, other_id, "skipped: change would duplicate another task");
                    report.skipped.extend(records.into_iter().map(|change| SkippedChange {
                        change,
                        colliding_task_id: other_id,
                    }));
                }
                Err(err) => {
                    tracing::warn!(task_id, error = %err, "apply failed");
                    let reason = err.to_string();
                    report.failed.extend(records.into_iter().map(|change| FailedChange {
                        change,
                        reason: reason.clone(),
                    }));
                }
            }
        }
    }
}
