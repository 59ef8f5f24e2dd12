//! The task store surface consumed by the reconciliation engine.

use super::error::StoreError;
use super::guard::GuardOutcome;
use super::normalizer::{Fingerprint, NormalizedTitle};
use super::task::{Task, TaskPatch};

/// Persistence seen from the reconciler. Only live (not deleted) tasks are
/// visible through any of these calls.
pub trait TaskStore {
    /// Every live task.
    fn snapshot(&self) -> Result<Vec<Task>, StoreError>;

    fn get(&self, id: i32) -> Result<Task, StoreError>;

    fn find_by_fingerprint(&self, fingerprint: &Fingerprint) -> Result<Option<Task>, StoreError> {
        Ok(self
            .snapshot()?
            .into_iter()
            .find(|task| Fingerprint::of_task(task) == *fingerprint))
    }

    fn find_by_title(&self, title: &NormalizedTitle) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .snapshot()?
            .into_iter()
            .filter(|task| super::normalizer::normalize_title(&task.title) == *title)
            .collect())
    }

    /// Reads the current task, runs the collision guard against current
    /// state and writes the patch, as one atomic step.
    fn apply_guarded(&mut self, id: i32, patch: &TaskPatch) -> Result<GuardOutcome, StoreError>;
}
