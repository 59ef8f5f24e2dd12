#[cfg(test)]
mod tests {
    use agenda::libs::diff::diff_pairs;
    use agenda::libs::matcher::match_entries;
    use agenda::libs::parser::{parse_agenda, ParsedAgenda};
    use agenda::libs::renderer::{d_day_label, render_agenda, render_line, render_window};
    use agenda::libs::task::{Task, TaskStatus};
    use chrono::{NaiveDate, NaiveDateTime};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, 0).unwrap()
    }

    fn stored(id: i32, title: &str, due: Option<NaiveDateTime>) -> Task {
        let mut task = Task::new(title, due);
        task.id = Some(id);
        task
    }

    #[test]
    fn test_d_day_labels() {
        let today = date(2024, 6, 1);
        assert_eq!(d_day_label(today, today), "D-Day");
        assert_eq!(d_day_label(date(2024, 6, 4), today), "D-3");
        assert_eq!(d_day_label(date(2024, 5, 25), today), "D+7");
    }

    #[test]
    fn test_render_line_shape() {
        let mut task = stored(12, "Standup", Some(at(2024, 6, 1, 9, 0))).with_type("meeting");
        task.tags = Some("team, daily sync".to_string());

        assert_eq!(
            render_line(&task, at(2024, 6, 1, 9, 0), date(2024, 6, 1)),
            "- [ ] 09:00 Standup (D-Day) #meeting #team #daily-sync ^task-12"
        );
    }

    #[test]
    fn test_midnight_renders_without_time() {
        let task = stored(3, "Renew passport", Some(at(2024, 6, 2, 0, 0))).with_status(TaskStatus::Done);
        assert_eq!(
            render_line(&task, at(2024, 6, 2, 0, 0), date(2024, 6, 1)),
            "- [x] Renew passport (D-1) ^task-3"
        );
    }

    #[test]
    fn test_render_line_escapes_title_markup() {
        let task = stored(8, "Fix issue #42", Some(at(2024, 6, 1, 10, 0)));
        assert_eq!(
            render_line(&task, at(2024, 6, 1, 10, 0), date(2024, 6, 1)),
            "- [ ] 10:00 Fix issue \\#42 (D-Day) ^task-8"
        );

        let all_day = stored(9, "10:30 standup", Some(at(2024, 6, 1, 0, 0)));
        assert_eq!(
            render_line(&all_day, at(2024, 6, 1, 0, 0), date(2024, 6, 1)),
            "- [ ] \\10:30 standup (D-Day) ^task-9"
        );
    }

    #[test]
    fn test_render_agenda_groups_and_orders() {
        let tasks = vec![
            stored(5, "Late", Some(at(2024, 6, 2, 18, 0))),
            stored(4, "Early", Some(at(2024, 6, 2, 8, 0))),
            stored(2, "Yesterday", Some(at(2024, 6, 1, 0, 0))),
            stored(9, "Someday", None),
        ];
        let text = render_agenda(&tasks, date(2024, 6, 2));

        assert_eq!(
            text,
            "## 2024-06-01 (Sat)\n- [ ] Yesterday (D+1) ^task-2\n\n---\n## 2024-06-02 (Sun)\n- [ ] 08:00 Early (D-Day) ^task-4\n- [ ] 18:00 Late (D-Day) ^task-5\n"
        );
    }

    #[test]
    fn test_render_window() {
        let tasks = vec![
            stored(1, "Old", Some(at(2024, 5, 1, 9, 0))),
            stored(2, "Near", Some(at(2024, 6, 3, 9, 0))),
            stored(3, "Far", Some(at(2024, 9, 1, 9, 0))),
        ];
        let text = render_window(&tasks, date(2024, 6, 1), 7, 30);
        assert!(text.contains("Near"));
        assert!(!text.contains("Old"));
        assert!(!text.contains("Far"));
    }

    #[test]
    fn test_rendered_agenda_reconciles_clean() {
        let mut cancelled = stored(7, "Old plan", Some(at(2024, 6, 1, 0, 0))).with_status(TaskStatus::Cancelled);
        cancelled.tags = Some("archive".to_string());
        let tasks = vec![
            stored(1, "Renew passport", Some(at(2024, 6, 1, 10, 30))).with_type("admin"),
            stored(2, "Team sync", Some(at(2024, 6, 2, 0, 0))),
            stored(3, "**Project** review, please!", Some(at(2024, 6, 2, 15, 0))),
            cancelled,
        ];
        let text = render_agenda(&tasks, date(2024, 6, 1));
        let parsed = parse_agenda(&text);
        let outcome = match_entries(&parsed.entries, &tasks, &ParsedAgenda::section_dates(&text));

        assert!(parsed.warnings.is_empty());
        assert_eq!(outcome.pairs.len(), 4);
        assert!(outcome.unmatched_entries.is_empty());
        assert!(outcome.unmatched_tasks.is_empty());
        assert!(diff_pairs(&outcome.pairs).is_empty());
    }
}
