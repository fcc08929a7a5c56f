//! Bulk listing collector (fetch path).
//!
//! Parses the learning subsystem's "my subjects" listing: one card per
//! subject, each card holding its meetings and their lecture lists.

use super::{parse_lectures, text_of, SliceRange};
use crate::model::{Meeting, Subject};
use scraper::{Html, Selector};

const SUBJECT_CARD: &str = "div.subject-card";
const SUBJECT_NAME: &str = ".subject-name";
const SUBJECT_CODE: &str = ".subject-code";
const MEETING: &str = "div.meeting";
const MEETING_TITLE: &str = ".meeting-title";

/// Parse a bulk subject listing into subjects, optionally keeping only a
/// slice of the parsed list.
///
/// A card without a `data-course-id` attribute cannot be keyed for
/// storage and is skipped; the rest of the listing still parses.
pub fn collect_subjects(html: &str, range: Option<SliceRange>) -> Vec<Subject> {
    let document = Html::parse_document(html);

    let Ok(card_sel) = Selector::parse(SUBJECT_CARD) else {
        return Vec::new();
    };
    let Ok(meeting_sel) = Selector::parse(MEETING) else {
        return Vec::new();
    };

    let mut subjects = Vec::new();
    for card in document.select(&card_sel) {
        let Some(course_id) = card.value().attr("data-course-id") else {
            tracing::warn!("skipping subject card without data-course-id");
            continue;
        };

        let name = text_of(card, SUBJECT_NAME).unwrap_or_default();
        let code = text_of(card, SUBJECT_CODE).unwrap_or_default();

        let meetings: Vec<Meeting> = card
            .select(&meeting_sel)
            .map(|el| Meeting {
                subject: name.clone(),
                title: text_of(el, MEETING_TITLE).unwrap_or_default(),
                lectures: parse_lectures(el),
            })
            .collect();

        subjects.push(Subject {
            course_id: course_id.to_string(),
            name,
            code,
            meetings,
        });
    }

    match range {
        Some(range) => range.apply(subjects),
        None => subjects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <div class="subject-card" data-course-id="CS101">
            <h2 class="subject-name">Intro to CS</h2>
            <span class="subject-code">CS101-A</span>
            <div class="meeting">
              <h3 class="meeting-title">Week 1</h3>
              <ul class="lectures">
                <li class="lecture">
                  <a href="/lecture/1">Slides</a>
                  <span class="due">2026-02-01</span>
                  <span class="status">open</span>
                </li>
                <li class="lecture"><a href="/lecture/2">Lab</a></li>
              </ul>
            </div>
            <div class="meeting">
              <h3 class="meeting-title">Week 2</h3>
              <ul class="lectures">
                <li class="lecture"><a href="/lecture/3">Quiz</a></li>
              </ul>
            </div>
          </div>
          <div class="subject-card" data-course-id="MA201">
            <h2 class="subject-name">Linear Algebra</h2>
            <span class="subject-code">MA201-B</span>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_collect_subjects_full_listing() {
        let subjects = collect_subjects(LISTING, None);
        assert_eq!(subjects.len(), 2);

        let cs = &subjects[0];
        assert_eq!(cs.course_id, "CS101");
        assert_eq!(cs.name, "Intro to CS");
        assert_eq!(cs.code, "CS101-A");
        assert_eq!(cs.meetings.len(), 2);
        assert_eq!(cs.meetings[0].subject, "Intro to CS");
        assert_eq!(cs.meetings[0].title, "Week 1");
        assert_eq!(cs.meetings[0].lectures.len(), 2);

        let slides = &cs.meetings[0].lectures[0];
        assert_eq!(slides.title, "Slides");
        assert_eq!(slides.href, "/lecture/1");
        assert_eq!(slides.due.as_deref(), Some("2026-02-01"));
        assert_eq!(slides.status.as_deref(), Some("open"));

        let lab = &cs.meetings[0].lectures[1];
        assert_eq!(lab.due, None);
        assert_eq!(lab.status, None);

        assert_eq!(subjects[1].course_id, "MA201");
        assert!(subjects[1].meetings.is_empty());
    }

    #[test]
    fn test_slice_range_selects_portion() {
        let subjects = collect_subjects(LISTING, Some(SliceRange::new(1, 2)));
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].course_id, "MA201");
    }

    #[test]
    fn test_card_without_course_id_is_skipped() {
        let html = r#"
            <div class="subject-card">
              <h2 class="subject-name">Orphan</h2>
            </div>
            <div class="subject-card" data-course-id="PH100">
              <h2 class="subject-name">Physics</h2>
            </div>
        "#;
        let subjects = collect_subjects(html, None);
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].course_id, "PH100");
    }

    #[test]
    fn test_malformed_lecture_does_not_abort_siblings() {
        let html = r#"
            <div class="subject-card" data-course-id="CS101">
              <h2 class="subject-name">Intro to CS</h2>
              <div class="meeting">
                <h3 class="meeting-title">Week 1</h3>
                <li class="lecture"><span>no link here</span></li>
                <li class="lecture"><a href="/lecture/9">Survivor</a></li>
              </div>
            </div>
        "#;
        let subjects = collect_subjects(html, None);
        assert_eq!(subjects[0].meetings[0].lectures.len(), 1);
        assert_eq!(subjects[0].meetings[0].lectures[0].title, "Survivor");
    }

    #[test]
    fn test_empty_document_parses_to_empty_list() {
        assert!(collect_subjects("<html></html>", None).is_empty());
    }
}
