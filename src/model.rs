//! Entity model — subjects, meetings, lectures, and change reports.
//!
//! A `Subject` is the unit of snapshotting: it is serialized to JSON and
//! stored under `subject_<course_id>` between runs. Equality everywhere is
//! full structural field comparison; a "changed" lecture is a replacement
//! value, never a field-level patch.

use serde::{Deserialize, Serialize};

/// A leaf resource within a meeting (file, link, or assignment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lecture {
    /// Display title of the resource.
    pub title: String,
    /// Link to the resource, relative to the learning subsystem base URL.
    pub href: String,
    /// Due date as shown by the portal, if any.
    pub due: Option<String>,
    /// Status label as shown by the portal (e.g. "open", "closed").
    pub status: Option<String>,
}

/// An ordered class session within a subject.
///
/// Lecture order is significant and assumed append-only across runs:
/// the diff engine matches lectures by index, not by identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    /// Name of the subject this meeting belongs to.
    pub subject: String,
    /// Meeting title (e.g. "Week 3 — Recursion").
    pub title: String,
    /// Ordered lecture resources.
    pub lectures: Vec<Lecture>,
}

/// A course — the top-level snapshot unit.
///
/// `course_id` is immutable and is the sole storage key. Meeting order is
/// significant and assumed append-only across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Stable course identifier used as the storage key.
    pub course_id: String,
    /// Display name.
    pub name: String,
    /// Display course code (may differ from `course_id`).
    pub code: String,
    /// Ordered meetings.
    pub meetings: Vec<Meeting>,
}

/// Payload dispatched when a subject changed: the subject's identity plus
/// only the new/changed meetings (each carrying only new/changed lectures).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectChange {
    pub course_id: String,
    pub name: String,
    pub code: String,
    pub meetings: Vec<Meeting>,
}

impl SubjectChange {
    /// Build a change report from a subject's identity and its diffed meetings.
    pub fn new(subject: &Subject, meetings: Vec<Meeting>) -> Self {
        Self {
            course_id: subject.course_id.clone(),
            name: subject.name.clone(),
            code: subject.code.clone(),
            meetings,
        }
    }
}

/// Storage key for a subject snapshot.
pub fn subject_key(course_id: &str) -> String {
    format!("subject_{course_id}")
}

/// Audit-trail key for a raw page capture: run timestamp plus the last
/// four characters of the source URL.
pub fn audit_key(run_timestamp: &str, url: &str) -> String {
    let chars: Vec<char> = url.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{run_timestamp}_{tail}")
}
