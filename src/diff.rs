//! Hierarchical diff between two subject snapshots.
//!
//! Matching is positional and append-only: meetings and lectures are
//! compared index-by-index, and items past the old length are wholly new.
//! An upstream removal or reorder shifts every later comparison and shows
//! up as pairwise "changed" entries — a documented limitation of the
//! source data contract, which only ever appends.

use crate::model::{Lecture, Meeting, Subject};

/// Compute the changed portion of `new` relative to `old`.
///
/// Returns only new or changed meetings, in ascending index order. A
/// changed meeting carries the new subject/title but only its new/changed
/// lectures, keeping notification payloads small. A wholly-new meeting
/// (index beyond the old meeting count) is carried verbatim.
pub fn diff_subjects(old: &Subject, new: &Subject) -> Vec<Meeting> {
    let mut changed = Vec::new();

    for (i, meeting) in new.meetings.iter().enumerate() {
        match old.meetings.get(i) {
            // No prior counterpart — the whole meeting is new.
            None => changed.push(meeting.clone()),
            Some(prev) => {
                let lectures = diff_lectures(prev, meeting);
                let header_equal =
                    prev.subject == meeting.subject && prev.title == meeting.title;
                if header_equal && lectures.is_empty() {
                    continue;
                }
                changed.push(Meeting {
                    subject: meeting.subject.clone(),
                    title: meeting.title.clone(),
                    lectures,
                });
            }
        }
    }

    changed
}

/// Compute the new/changed lectures of `new` relative to `old`.
///
/// Lectures past the old lecture count are new and emitted verbatim; a
/// lecture within the shared range is emitted whenever it is not
/// field-equal to its positional counterpart. Unchanged lectures are
/// omitted.
pub fn diff_lectures(old: &Meeting, new: &Meeting) -> Vec<Lecture> {
    new.lectures
        .iter()
        .enumerate()
        .filter_map(|(i, lecture)| match old.lectures.get(i) {
            None => Some(lecture.clone()),
            Some(prev) if prev != lecture => Some(lecture.clone()),
            Some(_) => None,
        })
        .collect()
}
