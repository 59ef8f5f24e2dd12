//! Title canonicalization and task fingerprints.
//!
//! A fingerprint is the identity used for "same task" reasoning in both
//! directions (rendering and reconciliation). It is always derived from the
//! current title and due date and is never persisted.
//!
//! ## All-day policy
//!
//! The store has no "all-day" flag. A stored due date at exactly
//! [`ALL_DAY_TIME`] is read as an all-day task when comparing against the
//! agenda file. An agenda entry without an explicit time is keyed by its
//! date alone ([`DueKey::AllDay`]), so it never shares a fingerprint with a
//! stored task and reaches it through the title+date fallback instead.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

use super::task::Task;

/// Time-of-day that marks a stored due date as all-day.
pub const ALL_DAY_TIME: NaiveTime = NaiveTime::MIN;

/// Marker hashed in place of a due date when a task has none.
pub const NO_DUE_DATE: &str = "NO_DUE_DATE";

/// Punctuation dropped from titles before comparison.
const DECORATIVE_CHARS: &[char] = &[
    '.', ',', ';', '!', '?', '\'', '"', '`', '\u{2019}', '\u{2018}', '\u{201C}', '\u{201D}', '(', ')', '*', '[', ']',
    '{', '}', '~',
];

/// Leading list markers that may survive a copy/paste into a title.
const LIST_MARKERS: &[&str] = &["-", "+", "\u{2022}", ">"];

pub fn is_all_day(due: &NaiveDateTime) -> bool {
    due.time() == ALL_DAY_TIME
}

/// A title in canonical form. Only [`normalize_title`] builds one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormalizedTitle(String);

impl NormalizedTitle {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NormalizedTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lower-cases, drops decorative punctuation, collapses whitespace and strips
/// leading list markers. Idempotent.
pub fn normalize_title(text: &str) -> NormalizedTitle {
    let lowered = text.to_lowercase();
    let cleaned: String = lowered.chars().filter(|c| !DECORATIVE_CHARS.contains(c)).collect();
    let mut words: Vec<&str> = cleaned.split_whitespace().collect();

    while let Some(first) = words.first() {
        if LIST_MARKERS.contains(first) {
            words.remove(0);
        } else {
            break;
        }
    }

    NormalizedTitle(words.join(" "))
}

/// Due date as it participates in identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DueKey {
    None,
    AllDay(NaiveDate),
    At(NaiveDateTime),
}

impl DueKey {
    /// Key for a stored due date. Stored values are always exact timestamps.
    pub fn from_stored(due: Option<NaiveDateTime>) -> Self {
        match due {
            Some(dt) => DueKey::At(dt),
            None => DueKey::None,
        }
    }

    /// Value written to the store for this key. All-day keys store midnight.
    pub fn to_stored(&self) -> Option<NaiveDateTime> {
        match self {
            DueKey::None => None,
            DueKey::AllDay(date) => Some(date.and_time(ALL_DAY_TIME)),
            DueKey::At(dt) => Some(*dt),
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            DueKey::None => None,
            DueKey::AllDay(date) => Some(*date),
            DueKey::At(dt) => Some(dt.date()),
        }
    }

    /// Compares against a stored due date, reading stored midnight as all-day.
    pub fn matches_stored(&self, stored: Option<NaiveDateTime>) -> bool {
        match (self, stored) {
            (DueKey::None, None) => true,
            (DueKey::AllDay(date), Some(dt)) => is_all_day(&dt) && dt.date() == *date,
            (DueKey::At(at), Some(dt)) => *at == dt,
            _ => false,
        }
    }

    fn encode(&self) -> String {
        match self {
            DueKey::None => NO_DUE_DATE.to_string(),
            DueKey::AllDay(date) => date.format("%Y-%m-%d").to_string(),
            DueKey::At(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

/// SHA-256 over `title:<normalized>::due:<key>`, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(title: &NormalizedTitle, due: DueKey) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(format!("title:{}::due:{}", title.as_str(), due.encode()).as_bytes());
        Fingerprint(format!("{:x}", hasher.finalize()))
    }

    pub fn of_task(task: &Task) -> Self {
        Self::new(&normalize_title(&task.title), DueKey::from_stored(task.due_dt))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First twelve hex digits, for tables.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
