#[cfg(test)]
mod tests {
    use agenda::libs::diff::Field;
    use agenda::libs::error::{ReconcileError, StoreError};
    use agenda::libs::guard::{self, GuardOutcome};
    use agenda::libs::reconciler::{Mode, Phase, Reconciler};
    use agenda::libs::store::TaskStore;
    use agenda::libs::task::{Task, TaskPatch, TaskStatus};
    use chrono::{NaiveDate, NaiveDateTime};
    use std::path::Path;

    #[derive(Default)]
    struct MemoryStore {
        tasks: Vec<Task>,
        fail_on: Option<i32>,
        writes: usize,
    }

    impl MemoryStore {
        fn with(tasks: Vec<Task>) -> Self {
            Self {
                tasks,
                ..Default::default()
            }
        }
    }

    impl TaskStore for MemoryStore {
        fn snapshot(&self) -> Result<Vec<Task>, StoreError> {
            Ok(self.tasks.clone())
        }

        fn get(&self, id: i32) -> Result<Task, StoreError> {
            self.tasks.iter().find(|t| t.id == Some(id)).cloned().ok_or(StoreError::NotFound(id))
        }

        fn apply_guarded(&mut self, id: i32, patch: &TaskPatch) -> Result<GuardOutcome, StoreError> {
            if self.fail_on == Some(id) {
                return Err(StoreError::Corrupt("store offline".to_string()));
            }
            let current = self.get(id)?;
            if let Some(other_id) = guard::check(&current, patch, &self.tasks) {
                return Ok(GuardOutcome::Collision { other_id });
            }
            let next = patch.apply_to(&current);
            for task in self.tasks.iter_mut().filter(|t| t.id == Some(id)) {
                *task = next.clone();
            }
            self.writes += 1;
            Ok(GuardOutcome::Applied { task: next })
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    fn stored(id: i32, title: &str, due: Option<NaiveDateTime>) -> Task {
        let mut task = Task::new(title, due);
        task.id = Some(id);
        task
    }

    const AGENDA: &str = "## 2024-06-01 (Sat)
- [x] 10:30 Renew passport #admin
- [ ] 14:00 Dentist appointment ^task-3
---
## 2024-06-02 (Sun)
- [ ] Plan trip
- [?] Mystery line
";

    fn store() -> MemoryStore {
        MemoryStore::with(vec![
            stored(1, "renew passport", Some(at(2024, 6, 1, 10, 30))),
            stored(3, "Dentist", Some(at(2024, 6, 1, 9, 0))),
            stored(4, "Plan trip", None),
        ])
    }

    #[test]
    fn test_dry_run_reports_without_writing() {
        let mut store = store();
        let report = Reconciler::new(&mut store).reconcile(AGENDA, Mode::DryRun).unwrap();

        assert_eq!(report.phase, Phase::Reported);
        assert_eq!(report.entries, 3);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.changes.len(), 4);
        assert!(report.applied.is_empty());
        assert_eq!(store.writes, 0);
    }

    #[test]
    fn test_dry_run_is_deterministic() {
        let mut store = store();
        let first = Reconciler::new(&mut store).reconcile(AGENDA, Mode::DryRun).unwrap();
        let second = Reconciler::new(&mut store).reconcile(AGENDA, Mode::DryRun).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_apply_converges() {
        let mut store = store();
        let applied = Reconciler::new(&mut store).reconcile(AGENDA, Mode::Apply).unwrap();
        assert_eq!(applied.phase, Phase::Applied);
        assert_eq!(applied.applied.len(), 4);
        assert_eq!(store.writes, 3);

        let again = Reconciler::new(&mut store).reconcile(AGENDA, Mode::DryRun).unwrap();
        assert!(!again.has_changes());
        assert_eq!(again.matched.len(), 3);

        let dentist = store.get(3).unwrap();
        assert_eq!(dentist.title, "Dentist appointment");
        assert_eq!(dentist.due_dt, Some(at(2024, 6, 1, 14, 0)));
        assert_eq!(store.get(1).unwrap().status, TaskStatus::Done);
        assert_eq!(store.get(4).unwrap().due_dt, Some(at(2024, 6, 2, 0, 0)));
    }

    #[test]
    fn test_store_failure_is_isolated() {
        let mut store = store();
        store.fail_on = Some(3);
        let report = Reconciler::new(&mut store).reconcile(AGENDA, Mode::Apply).unwrap();

        assert_eq!(report.failed.len(), 2);
        assert!(report.failed.iter().all(|f| f.change.task_id == 3));
        assert!(report.failed[0].reason.contains("store offline"));
        assert_eq!(report.applied.len(), 2);
        assert_eq!(store.get(1).unwrap().status, TaskStatus::Done);
    }

    #[test]
    fn test_collision_skips_whole_task() {
        let due = Some(at(2024, 6, 3, 0, 0));
        let mut store = MemoryStore::with(vec![stored(1, "Call mother", due), stored(2, "call Mom", due)]);
        let agenda = "## 2024-06-03 (Mon)\n- [ ] call Mom ^task-2\n- [x] Call mom ^task-1\n";

        let report = Reconciler::new(&mut store).reconcile(agenda, Mode::Apply).unwrap();

        assert_eq!(report.skipped.len(), 2);
        assert!(report.skipped.iter().all(|s| s.colliding_task_id == 2 && s.change.task_id == 1));
        let fields: Vec<Field> = report.skipped.iter().map(|s| s.change.field()).collect();
        assert_eq!(fields, vec![Field::Status, Field::Title]);
        assert!(report.applied.is_empty());

        let a = store.get(1).unwrap();
        assert_eq!(a.title, "Call mother");
        assert_eq!(a.status, TaskStatus::Todo);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let mut store = store();
        let err = Reconciler::new(&mut store)
            .reconcile_file(Path::new("/nonexistent/agenda.md"), Mode::Apply)
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Read { .. }));
        assert_eq!(store.writes, 0);
    }
}
