#[cfg(test)]
mod tests {
    use agenda::db::tasks::{InsertOutcome, Tasks};
    use agenda::libs::diff::{Change, Field};
    use agenda::libs::error::{ReconcileError, StoreError};
    use agenda::libs::guard::GuardOutcome;
    use agenda::libs::matcher::{MatchMethod, UnmatchedReason};
    use agenda::libs::parser::WarningKind;
    use agenda::libs::reconciler::{Mode, Phase, Reconciler};
    use agenda::libs::store::TaskStore;
    use agenda::libs::task::{Task, TaskPatch, TaskStatus};
    use chrono::{NaiveDate, NaiveDateTime};
    use std::path::PathBuf;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct ReconcileTestContext {
        temp_dir: TempDir,
        tasks: Tasks,
    }

    impl TestContext for ReconcileTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            std::env::set_var("HOME", temp_dir.path());
            std::env::set_var("LOCALAPPDATA", temp_dir.path());
            let tasks = Tasks::open(&temp_dir.path().join("agenda.db")).unwrap();
            ReconcileTestContext { temp_dir, tasks }
        }
    }

    impl ReconcileTestContext {
        fn add(&mut self, task: Task) -> i32 {
            match self.tasks.insert(&task, false).unwrap() {
                InsertOutcome::Created(created) => created.id.unwrap(),
                InsertOutcome::Duplicate(existing) => panic!("unexpected duplicate of {:?}", existing.id),
            }
        }

        fn agenda(&self, contents: &[u8]) -> PathBuf {
            let path = self.temp_dir.path().join("agenda.md");
            std::fs::write(&path, contents).unwrap();
            path
        }
    }

    /// Store that refuses writes to one task, or every read.
    struct FailingStore<'a> {
        inner: &'a mut Tasks,
        fail_on: i32,
        offline: bool,
    }

    impl TaskStore for FailingStore<'_> {
        fn snapshot(&self) -> Result<Vec<Task>, StoreError> {
            if self.offline {
                return Err(StoreError::Corrupt("database is locked".to_string()));
            }
            self.inner.snapshot()
        }

        fn get(&self, id: i32) -> Result<Task, StoreError> {
            self.inner.get(id)
        }

        fn apply_guarded(&mut self, id: i32, patch: &TaskPatch) -> Result<GuardOutcome, StoreError> {
            if id == self.fail_on {
                return Err(StoreError::Corrupt("disk full".to_string()));
            }
            self.inner.apply_guarded(id, patch)
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    #[test_context(ReconcileTestContext)]
    #[test]
    fn test_checked_line_changes_only_status(ctx: &mut ReconcileTestContext) {
        let id = ctx.add(Task::new("renew passport", Some(at(2024, 6, 1, 10, 30))));
        let agenda = "## 2024-06-01\n- [x] 10:30 Renew passport #admin\n";

        let report = Reconciler::new(&mut ctx.tasks).reconcile(agenda, Mode::DryRun).unwrap();

        assert_eq!(report.matched.len(), 1);
        assert_eq!(report.matched[0].method, MatchMethod::Fingerprint);
        assert_eq!(report.changes.len(), 1);
        assert_eq!(report.changes[0].task_id, id);
        assert_eq!(
            report.changes[0].change,
            Change::Status {
                old: TaskStatus::Todo,
                new: TaskStatus::Done
            }
        );
    }

    #[test_context(ReconcileTestContext)]
    #[test]
    fn test_all_day_line_matches_midnight_task(ctx: &mut ReconcileTestContext) {
        let id = ctx.add(Task::new("Team sync", Some(at(2024, 6, 2, 0, 0))));
        let agenda = "## 2024-06-02\n- [ ] Team sync\n";

        let report = Reconciler::new(&mut ctx.tasks).reconcile(agenda, Mode::DryRun).unwrap();

        assert_eq!(report.matched.len(), 1);
        assert_eq!(report.matched[0].task_id, id);
        assert_eq!(report.matched[0].method, MatchMethod::TitleDate);
        assert!(report.changes.is_empty());
        assert!(report.unmatched_tasks.is_empty());
    }

    #[test_context(ReconcileTestContext)]
    #[test]
    fn test_rename_onto_other_task_is_skipped(ctx: &mut ReconcileTestContext) {
        let due = Some(at(2024, 6, 3, 0, 0));
        let a = ctx.add(Task::new("Call mother", due));
        let b = ctx.add(Task::new("call Mom", due));
        let agenda = format!("## 2024-06-03\n- [ ] call Mom ^task-{}\n- [x] Call mom ^task-{}\n", b, a);

        let report = Reconciler::new(&mut ctx.tasks).reconcile(&agenda, Mode::Apply).unwrap();

        assert_eq!(report.phase, Phase::Applied);
        assert!(report.applied.is_empty());
        assert_eq!(report.skipped.len(), 2);
        for skipped in &report.skipped {
            assert_eq!(skipped.change.task_id, a);
            assert_eq!(skipped.colliding_task_id, b);
        }
        assert!(report.skipped.iter().any(|s| s.change.field() == Field::Title));

        let stored = ctx.tasks.get(a).unwrap();
        assert_eq!(stored.title, "Call mother");
        assert_eq!(stored.status, TaskStatus::Todo);
        assert_eq!(ctx.tasks.get(b).unwrap().title, "call Mom");
    }

    #[test_context(ReconcileTestContext)]
    #[test]
    fn test_two_anchors_renamed_to_same_identity(ctx: &mut ReconcileTestContext) {
        let a = ctx.add(Task::new("Draft memo", Some(at(2024, 6, 5, 9, 0))));
        let b = ctx.add(Task::new("Write memo", Some(at(2024, 6, 5, 11, 0))));
        let agenda = format!(
            "## 2024-06-05\n- [ ] 10:00 Final memo ^task-{}\n- [ ] 10:00 Final memo ^task-{}\n",
            a, b
        );

        let first = Reconciler::new(&mut ctx.tasks).reconcile(&agenda, Mode::Apply).unwrap();

        assert_eq!(first.matched.len(), 2);
        assert!(first.applied.iter().all(|c| c.task_id == a));
        assert_eq!(first.applied.len(), 2);
        assert_eq!(first.skipped.len(), 2);
        for skipped in &first.skipped {
            assert_eq!(skipped.change.task_id, b);
            assert_eq!(skipped.colliding_task_id, a);
        }
        assert_eq!(ctx.tasks.get(a).unwrap().title, "Final memo");
        assert_eq!(ctx.tasks.get(a).unwrap().due_dt, Some(at(2024, 6, 5, 10, 0)));

        let second = Reconciler::new(&mut ctx.tasks).reconcile(&agenda, Mode::Apply).unwrap();

        assert!(second.applied.is_empty());
        assert_eq!(second.skipped, first.skipped);
        let stored = ctx.tasks.get(b).unwrap();
        assert_eq!(stored.title, "Write memo");
        assert_eq!(stored.due_dt, Some(at(2024, 6, 5, 11, 0)));
    }

    #[test_context(ReconcileTestContext)]
    #[test]
    fn test_unknown_marker_becomes_warning(ctx: &mut ReconcileTestContext) {
        ctx.add(Task::new("Pay rent", Some(at(2024, 6, 1, 0, 0))));
        let agenda = "## 2024-06-01\n- [?] Mystery line\n- [ ] Pay rent\n";

        let report = Reconciler::new(&mut ctx.tasks).reconcile(agenda, Mode::DryRun).unwrap();

        assert_eq!(report.entries, 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].line, 2);
        assert!(matches!(report.warnings[0].kind, WarningKind::UnknownMarker(_)));
        assert_eq!(report.matched.len(), 1);
        assert!(report.unmatched_entries.is_empty());
    }

    #[test_context(ReconcileTestContext)]
    #[test]
    fn test_unmatched_sides_are_reported(ctx: &mut ReconcileTestContext) {
        let missing = ctx.add(Task::new("Buy milk", Some(at(2024, 6, 1, 9, 0))));
        ctx.add(Task::new("Out of scope", Some(at(2024, 7, 1, 9, 0))));
        let first = ctx.add(Task::new("Standup", None));
        let second = ctx.add(Task::new("standup", None));
        let agenda = "## 2024-06-01\n- [ ] Brand new idea\n- [ ] Standup\n";

        let report = Reconciler::new(&mut ctx.tasks).reconcile(agenda, Mode::Apply).unwrap();

        assert_eq!(report.unmatched_entries.len(), 2);
        assert_eq!(report.unmatched_entries[0].reason, UnmatchedReason::NoCandidate);
        assert_eq!(report.unmatched_entries[1].reason, UnmatchedReason::Ambiguous(vec![first, second]));

        let unmatched: Vec<Option<i32>> = report.unmatched_tasks.iter().map(|t| t.id).collect();
        assert_eq!(unmatched, vec![Some(missing)]);

        // Unmatched lines never create tasks
        assert_eq!(ctx.tasks.snapshot().unwrap().len(), 4);
    }

    #[test_context(ReconcileTestContext)]
    #[test]
    fn test_dry_run_is_deterministic_and_read_only(ctx: &mut ReconcileTestContext) {
        ctx.add(Task::new("Dentist", Some(at(2024, 6, 1, 9, 0))));
        ctx.add(Task::new("Plan trip", None));
        let agenda = "## 2024-06-01\n- [ ] 14:00 Dentist\n---\n## 2024-06-02\n- [c] Plan trip\n";
        let before = ctx.tasks.snapshot().unwrap();

        let first = Reconciler::new(&mut ctx.tasks).reconcile(agenda, Mode::DryRun).unwrap();
        let second = Reconciler::new(&mut ctx.tasks).reconcile(agenda, Mode::DryRun).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.phase, Phase::Reported);
        assert!(first.has_changes());
        assert_eq!(ctx.tasks.snapshot().unwrap(), before);
    }

    #[test_context(ReconcileTestContext)]
    #[test]
    fn test_second_run_after_apply_is_clean(ctx: &mut ReconcileTestContext) {
        let dentist = ctx.add(Task::new("Dentist", Some(at(2024, 6, 1, 9, 0))));
        let trip = ctx.add(Task::new("Plan trip", None));
        let agenda = format!(
            "## 2024-06-01\n- [x] 14:00 Dentist appointment ^task-{}\n---\n## 2024-06-02\n- [c] Plan trip\n",
            dentist
        );

        let applied = Reconciler::new(&mut ctx.tasks).reconcile(&agenda, Mode::Apply).unwrap();
        assert!(applied.failed.is_empty());
        assert!(applied.skipped.is_empty());
        assert_eq!(applied.applied.len(), applied.changes.len());

        let stored = ctx.tasks.get(dentist).unwrap();
        assert_eq!(stored.title, "Dentist appointment");
        assert_eq!(stored.due_dt, Some(at(2024, 6, 1, 14, 0)));
        assert_eq!(stored.status, TaskStatus::Done);
        let trip = ctx.tasks.get(trip).unwrap();
        assert_eq!(trip.status, TaskStatus::Cancelled);
        assert_eq!(trip.due_dt, Some(at(2024, 6, 2, 0, 0)));

        let again = Reconciler::new(&mut ctx.tasks).reconcile(&agenda, Mode::Apply).unwrap();
        assert!(!again.has_changes());
        assert!(again.applied.is_empty());
        assert_eq!(again.matched.len(), 2);
    }

    #[test_context(ReconcileTestContext)]
    #[test]
    fn test_failed_write_does_not_stop_other_tasks(ctx: &mut ReconcileTestContext) {
        let first = ctx.add(Task::new("Water plants", Some(at(2024, 6, 1, 8, 0))));
        let second = ctx.add(Task::new("Feed cat", Some(at(2024, 6, 1, 9, 0))));
        let agenda = "## 2024-06-01\n- [x] 08:00 Water plants\n- [x] 09:00 Feed cat\n";

        let mut store = FailingStore {
            inner: &mut ctx.tasks,
            fail_on: first,
            offline: false,
        };
        let report = Reconciler::new(&mut store).reconcile(agenda, Mode::Apply).unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].change.task_id, first);
        assert!(report.failed[0].reason.contains("disk full"));
        assert_eq!(report.applied.len(), 1);
        assert_eq!(report.applied[0].task_id, second);

        assert_eq!(ctx.tasks.get(first).unwrap().status, TaskStatus::Todo);
        assert_eq!(ctx.tasks.get(second).unwrap().status, TaskStatus::Done);
    }

    #[test_context(ReconcileTestContext)]
    #[test]
    fn test_unavailable_snapshot_is_fatal(ctx: &mut ReconcileTestContext) {
        let id = ctx.add(Task::new("Water plants", Some(at(2024, 6, 1, 8, 0))));
        let agenda = "## 2024-06-01\n- [x] 08:00 Water plants\n";

        let mut store = FailingStore {
            inner: &mut ctx.tasks,
            fail_on: 0,
            offline: true,
        };
        let mut reconciler = Reconciler::new(&mut store);
        let result = reconciler.reconcile(agenda, Mode::Apply);

        assert!(matches!(result, Err(ReconcileError::Store(StoreError::Corrupt(_)))));
        assert_eq!(reconciler.phase(), Phase::Parsed);
        assert_eq!(ctx.tasks.get(id).unwrap().status, TaskStatus::Todo);
    }

    #[test_context(ReconcileTestContext)]
    #[test]
    fn test_unreadable_files_are_fatal(ctx: &mut ReconcileTestContext) {
        let missing = ctx.temp_dir.path().join("nope.md");
        let result = Reconciler::new(&mut ctx.tasks).reconcile_file(&missing, Mode::Apply);
        assert!(matches!(result, Err(ReconcileError::Read { .. })));

        let binary = ctx.agenda(&[b'#', b'#', b' ', 0xff, 0xfe, b'\n']);
        let result = Reconciler::new(&mut ctx.tasks).reconcile_file(&binary, Mode::Apply);
        assert!(matches!(result, Err(ReconcileError::Encoding { .. })));
    }

    #[test_context(ReconcileTestContext)]
    #[test]
    fn test_reconcile_file_strips_bom(ctx: &mut ReconcileTestContext) {
        ctx.add(Task::new("renew passport", Some(at(2024, 6, 1, 10, 30))));
        let path = ctx.agenda("\u{feff}## 2024-06-01\n- [x] 10:30 Renew passport\n".as_bytes());

        let report = Reconciler::new(&mut ctx.tasks).reconcile_file(&path, Mode::DryRun).unwrap();

        assert_eq!(report.entries, 1);
        assert_eq!(report.changes.len(), 1);
        assert!(report.warnings.is_empty());
    }
}
