//! Parser for hand-edited agenda files.
//!
//! An agenda file is a sequence of date sections:
//!
//! ```text
//! ## 2024-06-01 (Sat)
//! - [ ] 09:00 Standup (D-Day) #meeting ^task-12
//! - [x] Renew passport #admin
//! ---
//! ```
//!
//! Parsing is tolerant: a bad header or a malformed checklist line produces a
//! [`ParseWarning`] and the parser moves on. Everything after the title
//! (tags, D-day annotations, the cancelled marker, block anchors) is stripped
//! by a small set of named patterns rather than a strict grammar.

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::iter::Enumerate;
use std::str::Lines;
use std::sync::OnceLock;

use super::normalizer::{normalize_title, DueKey, Fingerprint, NormalizedTitle};
use super::task::TaskStatus;

/// Prefix of the block anchor written after every rendered line.
pub const ANCHOR_PREFIX: &str = "^task-";

fn checklist_regex() -> &'static Regex {
    static CHECKLIST_RE: OnceLock<Regex> = OnceLock::new();
    CHECKLIST_RE.get_or_init(|| Regex::new(r"^-\s*\[([^\]]*)\](.*)$").expect("checklist regex must compile"))
}

fn time_prefix_regex() -> &'static Regex {
    static TIME_PREFIX_RE: OnceLock<Regex> = OnceLock::new();
    TIME_PREFIX_RE.get_or_init(|| Regex::new(r"^(\d{1,2}):(\d{2})(?:\s+|$)").expect("time prefix regex must compile"))
}

fn anchor_regex() -> &'static Regex {
    static ANCHOR_RE: OnceLock<Regex> = OnceLock::new();
    ANCHOR_RE.get_or_init(|| Regex::new(r"(?:^|\s)\^task-(\d+)\s*$").expect("anchor regex must compile"))
}

fn d_day_regex() -> &'static Regex {
    static D_DAY_RE: OnceLock<Regex> = OnceLock::new();
    D_DAY_RE.get_or_init(|| {
        Regex::new(r"(?i)(?:^|\s)\((?:D-Day|D[-+]\d+)(?:\s+[^)]*)?\)").expect("d-day regex must compile")
    })
}

fn cancelled_regex() -> &'static Regex {
    static CANCELLED_RE: OnceLock<Regex> = OnceLock::new();
    CANCELLED_RE.get_or_init(|| Regex::new(r"(?i)(?:^|\s)\(cancelled\)").expect("cancelled regex must compile"))
}

/// A parenthesized group the parser would read as an annotation.
fn annotation_group_regex() -> &'static Regex {
    static ANNOTATION_RE: OnceLock<Regex> = OnceLock::new();
    ANNOTATION_RE.get_or_init(|| {
        Regex::new(r"(?i)^\((?:D-Day|D[-+]\d+|cancelled)(?:\s+[^)]*)?\)").expect("annotation regex must compile")
    })
}

fn tag_regex() -> &'static Regex {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    TAG_RE.get_or_init(|| Regex::new(r"(?:^|\s)#([^\s#()]+)").expect("tag regex must compile"))
}

/// One checklist line of the agenda file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedEntry {
    /// 1-based line number in the file.
    pub line: usize,
    pub section_date: NaiveDate,
    pub status_marker: char,
    pub status: TaskStatus,
    pub time_of_day: Option<NaiveTime>,
    pub raw_title: String,
    pub tags: Vec<String>,
    /// Task id from a trailing `^task-<id>` block anchor.
    pub anchor: Option<i32>,
}

impl ParsedEntry {
    /// Effective due date: the section date plus the time, or an all-day key.
    pub fn due_key(&self) -> DueKey {
        match self.time_of_day {
            Some(time) => DueKey::At(self.section_date.and_time(time)),
            None => DueKey::AllDay(self.section_date),
        }
    }

    pub fn is_all_day(&self) -> bool {
        self.time_of_day.is_none()
    }

    pub fn normalized_title(&self) -> NormalizedTitle {
        normalize_title(&self.raw_title)
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(&self.normalized_title(), self.due_key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum WarningKind {
    /// `## ...` header whose date does not parse; its entries are skipped.
    InvalidSectionDate(String),
    /// Checkbox content other than ` `, `x` or `c`.
    UnknownMarker(String),
    /// `HH:MM` prefix that is not a time of day; the entry is read as all-day.
    InvalidTime(String),
    /// Nothing left of the title after annotations are stripped.
    EmptyTitle,
    /// Checklist line before the first section or after a separator.
    OutsideSection,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::InvalidSectionDate(date) => write!(f, "unparsable section date '{}'", date),
            WarningKind::UnknownMarker(marker) => write!(f, "unknown status marker '[{}]'", marker),
            WarningKind::InvalidTime(time) => write!(f, "invalid time '{}', treated as all-day", time),
            WarningKind::EmptyTitle => write!(f, "checklist line has no title"),
            WarningKind::OutsideSection => write!(f, "checklist line outside a date section"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub line: usize,
    pub kind: WarningKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseEvent {
    Entry(ParsedEntry),
    Warning(ParseWarning),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    None,
    Date(NaiveDate),
    Invalid,
    Closed,
}

/// Lazy, restartable pass over an agenda file. Clone it to parse again.
#[derive(Debug, Clone)]
pub struct AgendaParser<'a> {
    lines: Enumerate<Lines<'a>>,
    section: Section,
    pending: Option<ParseEvent>,
}

impl<'a> AgendaParser<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
            section: Section::None,
            pending: None,
        }
    }

    fn warning(line: usize, kind: WarningKind, text: &str) -> ParseEvent {
        ParseEvent::Warning(ParseWarning {
            line,
            kind,
            text: text.to_string(),
        })
    }

    fn header(&mut self, line_no: usize, line: &str) -> Option<ParseEvent> {
        let rest = line.trim_start_matches('#').trim();
        let date_str = rest.split_whitespace().next().unwrap_or_default();
        match NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
            Ok(date) => {
                self.section = Section::Date(date);
                None
            }
            Err(_) => {
                self.section = Section::Invalid;
                Some(Self::warning(line_no, WarningKind::InvalidSectionDate(date_str.to_string()), line))
            }
        }
    }

    fn checklist(&mut self, line_no: usize, line: &str, marker: &str, rest: &str) -> Option<ParseEvent> {
        let section_date = match self.section {
            Section::Date(date) => date,
            Section::Invalid => return None,
            Section::None | Section::Closed => return Some(Self::warning(line_no, WarningKind::OutsideSection, line)),
        };

        let mut marker_chars = marker.chars();
        let status_marker = match (marker_chars.next(), marker_chars.next()) {
            (Some(c), None) => c,
            _ => return Some(Self::warning(line_no, WarningKind::UnknownMarker(marker.to_string()), line)),
        };
        let Some(status) = TaskStatus::from_marker(status_marker) else {
            return Some(Self::warning(line_no, WarningKind::UnknownMarker(marker.to_string()), line));
        };

        let mut rest = rest.trim();
        let mut time_of_day = None;
        let mut time_warning = None;
        if let Some(caps) = time_prefix_regex().captures(rest) {
            let hour: u32 = caps[1].parse().unwrap_or(u32::MAX);
            let minute: u32 = caps[2].parse().unwrap_or(u32::MAX);
            match NaiveTime::from_hms_opt(hour, minute, 0) {
                Some(time) => time_of_day = Some(time),
                None => {
                    let raw = format!("{}:{}", &caps[1], &caps[2]);
                    time_warning = Some(Self::warning(line_no, WarningKind::InvalidTime(raw), line));
                }
            }
            rest = rest[caps[0].len()..].trim();
        }

        let (raw_title, tags, anchor) = strip_annotations(rest);
        if raw_title.is_empty() {
            return Some(Self::warning(line_no, WarningKind::EmptyTitle, line));
        }

        let entry = ParseEvent::Entry(ParsedEntry {
            line: line_no,
            section_date,
            status_marker,
            status,
            time_of_day,
            raw_title,
            tags,
            anchor,
        });

        match time_warning {
            Some(warning) => {
                self.pending = Some(entry);
                Some(warning)
            }
            None => Some(entry),
        }
    }
}

impl<'a> Iterator for AgendaParser<'a> {
    type Item = ParseEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.pending.take() {
            return Some(event);
        }

        #[allow(clippy::while_let_on_iterator)]
        while let Some((idx, raw_line)) = self.lines.next() {
            let line_no = idx + 1;
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with("##") && !line.starts_with("###") {
                if let Some(event) = self.header(line_no, line) {
                    return Some(event);
                }
                continue;
            }

            if line.len() >= 3 && line.chars().all(|c| c == '-') {
                self.section = match self.section {
                    Section::Date(_) | Section::Invalid => Section::Closed,
                    other => other,
                };
                continue;
            }

            if let Some(caps) = checklist_regex().captures(line) {
                let marker = caps.get(1).map_or("", |m| m.as_str());
                let rest = caps.get(2).map_or("", |m| m.as_str());
                if let Some(event) = self.checklist(line_no, line, marker, rest) {
                    return Some(event);
                }
            }
        }

        None
    }
}

/// Splits a line remainder into title, tags and block anchor.
pub fn strip_annotations(segment: &str) -> (String, Vec<String>, Option<i32>) {
    let mut work = segment.to_string();

    let mut anchor = None;
    if let Some(caps) = anchor_regex().captures(&work) {
        anchor = caps[1].parse::<i32>().ok();
        let start = caps.get(0).map_or(work.len(), |m| m.start());
        work.truncate(start);
    }

    work = d_day_regex().replace_all(&work, " ").into_owned();
    work = cancelled_regex().replace_all(&work, " ").into_owned();

    let mut tags: Vec<String> = Vec::new();
    for caps in tag_regex().captures_iter(&work) {
        let tag = caps[1].to_string();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    work = tag_regex().replace_all(&work, " ").into_owned();

    let title = unescape_title(&work.split_whitespace().collect::<Vec<_>>().join(" "));
    (title, tags, anchor)
}

/// Escapes a title so that parsing the rendered line gives it back
/// unchanged. Backslashes, every `#` and any `(` that opens an
/// annotation-like group get a leading backslash, as does a leading
/// `HH:MM` that would otherwise be read as the time of day.
pub fn escape_title(title: &str) -> String {
    let mut escaped = String::with_capacity(title.len() + 1);
    if time_prefix_regex().is_match(title) {
        escaped.push('\\');
    }
    for (idx, c) in title.char_indices() {
        match c {
            '\\' | '#' => escaped.push('\\'),
            '(' if annotation_group_regex().is_match(&title[idx..]) => escaped.push('\\'),
            _ => {}
        }
        escaped.push(c);
    }
    escaped
}

fn unescape_title(text: &str) -> String {
    let text = match text.strip_prefix('\\') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => text,
    };
    let mut title = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if matches!(next, '\\' | '#' | '(') {
                    title.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        title.push(c);
    }
    title
}

/// Every entry and warning of one file, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedAgenda {
    pub entries: Vec<ParsedEntry>,
    pub warnings: Vec<ParseWarning>,
}

impl ParsedAgenda {
    /// Dates that have a valid section header, whether or not it has entries.
    pub fn section_dates(text: &str) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        for line in text.lines().map(str::trim) {
            if line.starts_with("##") && !line.starts_with("###") {
                let rest = line.trim_start_matches('#').trim();
                let date_str = rest.split_whitespace().next().unwrap_or_default();
                if let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
                    if !dates.contains(&date) {
                        dates.push(date);
                    }
                }
            }
        }
        dates
    }
}

pub fn parse_agenda(text: &str) -> ParsedAgenda {
    let mut parsed = ParsedAgenda::default();
    for event in AgendaParser::new(text) {
        match event {
            ParseEvent::Entry(entry) => parsed.entries.push(entry),
            ParseEvent::Warning(warning) => {
                tracing::warn!(line = warning.line, "{}", warning.kind);
                parsed.warnings.push(warning);
            }
        }
    }
    parsed
}
