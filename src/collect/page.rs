//! Single-page collector (browser path).
//!
//! Parses one rendered lecture page into its meeting sections. The page
//! names its subject once in the heading; every section inherits it.

use super::{parse_lectures, text_of};
use crate::model::Meeting;
use scraper::{Html, Selector};

const PAGE_SUBJECT: &str = "h1.course-title";
const MEETING_SECTION: &str = "div.meeting-section";
const SECTION_TITLE: &str = ".section-title";

/// Parse a rendered lecture page into meetings with lectures.
pub fn collect_meetings(html: &str) -> Vec<Meeting> {
    let document = Html::parse_document(html);

    let Ok(section_sel) = Selector::parse(MEETING_SECTION) else {
        return Vec::new();
    };

    let subject = text_of(document.root_element(), PAGE_SUBJECT).unwrap_or_default();

    document
        .select(&section_sel)
        .map(|section| Meeting {
            subject: subject.clone(),
            title: text_of(section, SECTION_TITLE).unwrap_or_default(),
            lectures: parse_lectures(section),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <h1 class="course-title">Intro to CS</h1>
          <div class="meeting-section">
            <h3 class="section-title">Week 1</h3>
            <ul class="lectures">
              <li class="lecture">
                <a href="/lecture/1">Slides</a>
                <span class="status">open</span>
              </li>
            </ul>
          </div>
          <div class="meeting-section">
            <h3 class="section-title">Week 2</h3>
            <ul class="lectures">
              <li class="lecture"><a href="/lecture/2">Lab</a></li>
              <li class="lecture"><a href="/lecture/3">Quiz</a></li>
            </ul>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_collect_meetings_from_page() {
        let meetings = collect_meetings(PAGE);
        assert_eq!(meetings.len(), 2);
        assert_eq!(meetings[0].subject, "Intro to CS");
        assert_eq!(meetings[0].title, "Week 1");
        assert_eq!(meetings[0].lectures.len(), 1);
        assert_eq!(meetings[1].lectures.len(), 2);
        assert_eq!(meetings[1].lectures[1].href, "/lecture/3");
    }

    #[test]
    fn test_page_without_sections_is_empty() {
        assert!(collect_meetings("<html><body><p>nothing</p></body></html>").is_empty());
    }
}
