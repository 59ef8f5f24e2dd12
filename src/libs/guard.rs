//! Collision guard: keeps two live tasks from sharing a fingerprint.
//!
//! The functions here are pure. Stores call them inside the same
//! transaction that performs the update, so the check always sees the
//! state the update is applied to.

use serde::Serialize;

use super::normalizer::Fingerprint;
use super::task::{Task, TaskPatch};

/// Result of a guarded update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GuardOutcome {
    /// The patch was written; carries the task as stored afterwards.
    Applied { task: Task },
    /// Another live task already owns the post-change fingerprint.
    Collision { other_id: i32 },
}

/// Fingerprint `task` would have once `patch` is applied.
pub fn post_change_fingerprint(task: &Task, patch: &TaskPatch) -> Fingerprint {
    Fingerprint::of_task(&patch.apply_to(task))
}

/// Lowest id among `live` tasks, other than `task_id`, that own `fingerprint`.
pub fn find_collision(task_id: i32, fingerprint: &Fingerprint, live: &[Task]) -> Option<i32> {
    live.iter()
        .filter_map(|t| t.id.map(|id| (id, t)))
        .filter(|(id, t)| *id != task_id && Fingerprint::of_task(t) == *fingerprint)
        .map(|(id, _)| id)
        .min()
}

/// Colliding task id for `patch` on `task`, if any. Patches that leave the
/// title and due date alone never collide.
pub fn check(task: &Task, patch: &TaskPatch, live: &[Task]) -> Option<i32> {
    if !patch.changes_identity() {
        return None;
    }
    let task_id = task.id.unwrap_or_default();
    let fingerprint = post_change_fingerprint(task, patch);
    let collision = find_collision(task_id, &fingerprint, live);
    if let Some(other_id) = collision {
        tracing::debug!(task_id, other_id, fingerprint = fingerprint.short(), "collision guard rejected patch");
    }
    collision
}
