#[cfg(test)]
mod tests {
    use agenda::libs::task::{SortField, Task, TaskPatch, TaskQuery, TaskStatus};
    use chrono::NaiveDate;

    #[test]
    fn test_status_markers() {
        for status in [TaskStatus::Todo, TaskStatus::Done, TaskStatus::Cancelled] {
            assert_eq!(TaskStatus::from_marker(status.marker()), Some(status));
        }
        assert_eq!(TaskStatus::from_marker('?'), None);
        assert_eq!(TaskStatus::from_marker('X'), None);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("done".parse::<TaskStatus>(), Ok(TaskStatus::Done));
        assert_eq!(" Cancelled ".parse::<TaskStatus>(), Ok(TaskStatus::Cancelled));
        assert!("later".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_patch_apply() {
        let due = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let task = Task::new("Renew passport", Some(due));
        let patch = TaskPatch {
            title: Some("Renew passport today".to_string()),
            due_dt: Some(None),
            status: Some(TaskStatus::Done),
            ..Default::default()
        };
        assert!(patch.changes_identity());

        let next = patch.apply_to(&task);
        assert_eq!(next.title, "Renew passport today");
        assert_eq!(next.due_dt, None);
        assert_eq!(next.status, TaskStatus::Done);
    }

    #[test]
    fn test_tag_list() {
        let mut task = Task::new("Write report", None);
        task.tags = Some("#work, urgent,,".to_string());
        assert_eq!(task.tag_list(), vec!["work".to_string(), "urgent".to_string()]);
    }

    #[test]
    fn test_sort_direction_defaults() {
        let query = TaskQuery::default();
        assert_eq!(query.sort, SortField::DueDt);
        assert!(query.is_ascending());

        let newest_first = TaskQuery {
            sort: SortField::Id,
            ..Default::default()
        };
        assert!(!newest_first.is_ascending());

        let oldest_first = TaskQuery {
            sort: SortField::Id,
            ascending: Some(true),
            ..Default::default()
        };
        assert!(oldest_first.is_ascending());
    }
}
