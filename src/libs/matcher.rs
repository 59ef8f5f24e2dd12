//! Pairs parsed agenda entries with stored tasks.
//!
//! Entries are processed in file order and each side is claimed at most once:
//!
//! 1. exact fingerprint match against unclaimed tasks;
//! 2. for all-day entries, equal normalized title against unclaimed tasks
//!    due at midnight on the section date, or failing that, tasks with no
//!    due date; more than one candidate is ambiguous and nothing is matched;
//! 3. the entry's `^task-<id>` anchor, if it names an unclaimed task.
//!
//! A task anchored by one line is never offered to a different line in
//! step 2.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use super::normalizer::{is_all_day, normalize_title, Fingerprint, NormalizedTitle};
use super::parser::ParsedEntry;
use super::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchMethod {
    #[serde(rename = "fingerprint")]
    Fingerprint,
    #[serde(rename = "title+date")]
    TitleDate,
    #[serde(rename = "anchor")]
    Anchor,
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchMethod::Fingerprint => "fingerprint",
            MatchMethod::TitleDate => "title+date",
            MatchMethod::Anchor => "anchor",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedPair {
    pub entry: ParsedEntry,
    /// Snapshot of the task at match time.
    pub task: Task,
    pub method: MatchMethod,
}

impl MatchedPair {
    pub fn task_id(&self) -> i32 {
        self.task.id.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "task_ids", rename_all = "snake_case")]
pub enum UnmatchedReason {
    NoCandidate,
    Ambiguous(Vec<i32>),
}

impl fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedReason::NoCandidate => write!(f, "no matching task"),
            UnmatchedReason::Ambiguous(ids) => {
                let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                write!(f, "ambiguous: tasks {}", ids.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedEntry {
    pub entry: ParsedEntry,
    pub reason: UnmatchedReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchOutcome {
    /// In file order.
    pub pairs: Vec<MatchedPair>,
    pub unmatched_entries: Vec<UnmatchedEntry>,
    /// Unclaimed tasks due on one of the in-scope dates, by id.
    pub unmatched_tasks: Vec<Task>,
}

/// Lookup tables over one store snapshot. Every list is sorted by task id.
struct TaskIndex<'a> {
    tasks: Vec<&'a Task>,
    by_fingerprint: HashMap<Fingerprint, Vec<usize>>,
    by_title: HashMap<NormalizedTitle, Vec<usize>>,
    by_id: HashMap<i32, usize>,
}

impl<'a> TaskIndex<'a> {
    fn new(snapshot: &'a [Task]) -> Self {
        let mut tasks: Vec<&Task> = snapshot.iter().filter(|t| t.id.is_some()).collect();
        tasks.sort_by_key(|t| t.id);

        let mut by_fingerprint: HashMap<Fingerprint, Vec<usize>> = HashMap::new();
        let mut by_title: HashMap<NormalizedTitle, Vec<usize>> = HashMap::new();
        let mut by_id = HashMap::new();
        for (idx, task) in tasks.iter().enumerate() {
            by_fingerprint.entry(Fingerprint::of_task(task)).or_default().push(idx);
            by_title.entry(normalize_title(&task.title)).or_default().push(idx);
            by_id.insert(task.id.unwrap_or_default(), idx);
        }

        Self {
            tasks,
            by_fingerprint,
            by_title,
            by_id,
        }
    }

    fn id_of(&self, idx: usize) -> i32 {
        self.tasks[idx].id.unwrap_or_default()
    }
}

/// Runs the matching passes over `entries` (file order) and `snapshot`.
///
/// `scope` lists the dates the agenda file covers; unclaimed tasks due on
/// other dates are not reported.
pub fn match_entries(entries: &[ParsedEntry], snapshot: &[Task], scope: &[NaiveDate]) -> MatchOutcome {
    let index = TaskIndex::new(snapshot);
    let mut claimed = vec![false; index.tasks.len()];
    let mut outcome = MatchOutcome::default();

    let mut reserved: HashMap<i32, usize> = HashMap::new();
    for (entry_idx, entry) in entries.iter().enumerate() {
        if let Some(anchor) = entry.anchor {
            reserved.entry(anchor).or_insert(entry_idx);
        }
    }

    for (entry_idx, entry) in entries.iter().enumerate() {
        let mut reason = UnmatchedReason::NoCandidate;

        let by_fingerprint = index
            .by_fingerprint
            .get(&entry.fingerprint())
            .and_then(|candidates| candidates.iter().copied().find(|&idx| !claimed[idx]));

        let found = match by_fingerprint {
            Some(idx) => Some((idx, MatchMethod::Fingerprint)),
            None if entry.is_all_day() => {
                let offered = |idx: &usize| {
                    !claimed[*idx] && reserved.get(&index.id_of(*idx)).map_or(true, |&owner| owner == entry_idx)
                };
                let titled: Vec<usize> = index
                    .by_title
                    .get(&entry.normalized_title())
                    .map(|candidates| candidates.iter().copied().filter(offered).collect())
                    .unwrap_or_default();

                let on_date: Vec<usize> = titled
                    .iter()
                    .copied()
                    .filter(|&idx| {
                        index.tasks[idx]
                            .due_dt
                            .is_some_and(|due| is_all_day(&due) && due.date() == entry.section_date)
                    })
                    .collect();
                let tier = if on_date.is_empty() {
                    titled.into_iter().filter(|&idx| index.tasks[idx].due_dt.is_none()).collect()
                } else {
                    on_date
                };

                match tier.as_slice() {
                    [idx] => Some((*idx, MatchMethod::TitleDate)),
                    [] => None,
                    many => {
                        reason = UnmatchedReason::Ambiguous(many.iter().map(|&idx| index.id_of(idx)).collect());
                        None
                    }
                }
            }
            None => None,
        };

        let found = found.or_else(|| {
            entry
                .anchor
                .and_then(|anchor| index.by_id.get(&anchor).copied())
                .filter(|&idx| !claimed[idx])
                .map(|idx| (idx, MatchMethod::Anchor))
        });

        match found {
            Some((idx, method)) => {
                claimed[idx] = true;
                tracing::debug!(line = entry.line, task_id = index.id_of(idx), %method, "matched agenda entry");
                outcome.pairs.push(MatchedPair {
                    entry: entry.clone(),
                    task: index.tasks[idx].clone(),
                    method,
                });
            }
            None => {
                tracing::debug!(line = entry.line, %reason, "agenda entry left unmatched");
                outcome.unmatched_entries.push(UnmatchedEntry {
                    entry: entry.clone(),
                    reason,
                });
            }
        }
    }

    for (idx, task) in index.tasks.iter().enumerate() {
        let in_scope = task.due_dt.is_some_and(|due| scope.contains(&due.date()));
        if !claimed[idx] && in_scope {
            outcome.unmatched_tasks.push((*task).clone());
        }
    }

    outcome
}
