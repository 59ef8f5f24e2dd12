//! Field-level differences between matched agenda entries and tasks.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

use super::matcher::MatchedPair;
use super::normalizer::normalize_title;
use super::task::{TaskPatch, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Status,
    Title,
    DueDt,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Status => "status",
            Field::Title => "title",
            Field::DueDt => "due_dt",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum Change {
    Status { old: TaskStatus, new: TaskStatus },
    Title { old: String, new: String },
    DueDt { old: Option<NaiveDateTime>, new: Option<NaiveDateTime> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRecord {
    pub task_id: i32,
    #[serde(flatten)]
    pub change: Change,
}

fn format_due(due: &Option<NaiveDateTime>) -> String {
    match due {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

impl ChangeRecord {
    pub fn field(&self) -> Field {
        match self.change {
            Change::Status { .. } => Field::Status,
            Change::Title { .. } => Field::Title,
            Change::DueDt { .. } => Field::DueDt,
        }
    }

    pub fn old_value(&self) -> String {
        match &self.change {
            Change::Status { old, .. } => old.to_string(),
            Change::Title { old, .. } => old.clone(),
            Change::DueDt { old, .. } => format_due(old),
        }
    }

    pub fn new_value(&self) -> String {
        match &self.change {
            Change::Status { new, .. } => new.to_string(),
            Change::Title { new, .. } => new.clone(),
            Change::DueDt { new, .. } => format_due(new),
        }
    }
}

/// Zero to three change records for one pair, in status, title, due order.
pub fn diff_pair(pair: &MatchedPair) -> Vec<ChangeRecord> {
    let task_id = pair.task_id();
    let mut changes = Vec::new();

    if pair.entry.status != pair.task.status {
        changes.push(ChangeRecord {
            task_id,
            change: Change::Status {
                old: pair.task.status,
                new: pair.entry.status,
            },
        });
    }

    if pair.entry.normalized_title() != normalize_title(&pair.task.title) {
        changes.push(ChangeRecord {
            task_id,
            change: Change::Title {
                old: pair.task.title.clone(),
                new: pair.entry.raw_title.clone(),
            },
        });
    }

    let due = pair.entry.due_key();
    if !due.matches_stored(pair.task.due_dt) {
        changes.push(ChangeRecord {
            task_id,
            change: Change::DueDt {
                old: pair.task.due_dt,
                new: due.to_stored(),
            },
        });
    }

    changes
}

pub fn diff_pairs(pairs: &[MatchedPair]) -> Vec<ChangeRecord> {
    pairs.iter().flat_map(diff_pair).collect()
}

/// Folds one task's change records into a single patch.
pub fn patch_for(changes: &[ChangeRecord]) -> TaskPatch {
    let mut patch = TaskPatch::default();
    for record in changes {
        match &record.change {
            Change::Status { new, .. } => patch.status = Some(*new),
            Change::Title { new, .. } => patch.title = Some(new.clone()),
            Change::DueDt { new, .. } => patch.due_dt = Some(*new),
        }
    }
    patch
}
