//! Forward rendering: tasks to an agenda file.
//!
//! The output is the dialect [`super::parser`] reads. Rendering a store and
//! reconciling the result against the same store yields no changes.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

use super::normalizer::is_all_day;
use super::parser::{escape_title, ANCHOR_PREFIX};
use super::task::Task;

pub const SECTION_SEPARATOR: &str = "---";

/// `D-Day`, `D-n` (n days left) or `D+n` (n days overdue).
pub fn d_day_label(due: NaiveDate, today: NaiveDate) -> String {
    let days = (due - today).num_days();
    match days {
        0 => "D-Day".to_string(),
        d if d > 0 => format!("D-{}", d),
        d => format!("D+{}", -d),
    }
}

fn tag_token(tag: &str) -> String {
    let cleaned: String = tag
        .trim()
        .trim_start_matches('#')
        .chars()
        .map(|c| if c.is_whitespace() || c == '(' || c == ')' || c == '#' { '-' } else { c })
        .collect();
    format!("#{}", cleaned)
}

/// One checklist line for a task with a due date.
pub fn render_line(task: &Task, due: NaiveDateTime, today: NaiveDate) -> String {
    let mut line = format!("- [{}] ", task.status.marker());
    if !is_all_day(&due) {
        line.push_str(&due.format("%H:%M ").to_string());
    }
    line.push_str(&escape_title(task.title.trim()));
    line.push_str(&format!(" ({})", d_day_label(due.date(), today)));

    let mut tokens: Vec<String> = Vec::new();
    if let Some(task_type) = task.task_type.as_deref().filter(|t| !t.trim().is_empty()) {
        tokens.push(tag_token(task_type));
    }
    for tag in task.tag_list() {
        let token = tag_token(&tag);
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    for token in tokens {
        line.push(' ');
        line.push_str(&token);
    }

    if let Some(id) = task.id {
        line.push_str(&format!(" {}{}", ANCHOR_PREFIX, id));
    }
    line
}

/// Groups dated tasks by calendar day, each day ordered by due time then id.
pub fn group_by_date(tasks: &[Task]) -> BTreeMap<NaiveDate, Vec<(&Task, NaiveDateTime)>> {
    let mut grouped: BTreeMap<NaiveDate, Vec<(&Task, NaiveDateTime)>> = BTreeMap::new();
    for task in tasks {
        if let Some(due) = task.due_dt {
            grouped.entry(due.date()).or_default().push((task, due));
        }
    }
    for day in grouped.values_mut() {
        day.sort_by_key(|(task, due)| (*due, task.id));
    }
    grouped
}

/// Renders every dated task. Tasks without a due date are left out.
pub fn render_agenda(tasks: &[Task], today: NaiveDate) -> String {
    let sections: Vec<String> = group_by_date(tasks)
        .into_iter()
        .map(|(date, day)| {
            let mut section = format!("## {}\n", date.format("%Y-%m-%d (%a)"));
            for (task, due) in day {
                section.push_str(&render_line(task, due, today));
                section.push('\n');
            }
            section
        })
        .collect();

    sections.join(&format!("\n{}\n", SECTION_SEPARATOR))
}

/// Renders the tasks due between `today - days_back` and `today + days_ahead`.
pub fn render_window(tasks: &[Task], today: NaiveDate, days_back: u32, days_ahead: u32) -> String {
    let from = today - chrono::Duration::days(i64::from(days_back));
    let to = today + chrono::Duration::days(i64::from(days_ahead));
    let in_window: Vec<Task> = tasks
        .iter()
        .filter(|t| t.due_dt.is_some_and(|due| due.date() >= from && due.date() <= to))
        .cloned()
        .collect();
    render_agenda(&in_window, today)
}
