//! Content collectors — turn raw portal markup into entities.
//!
//! Two variants share the lecture parsing: `bulk` parses the learning
//! subsystem's full subject listing (fetch path), `page` parses a single
//! lecture page (browser path). Both are best-effort per item: a
//! malformed fragment is skipped with a warning and its siblings parse on.

pub mod bulk;
pub mod page;

use crate::model::Lecture;
use scraper::{ElementRef, Selector};

pub use bulk::collect_subjects;
pub use page::collect_meetings;

const LECTURE_ITEM: &str = "li.lecture";
const LECTURE_LINK: &str = "a";
const LECTURE_DUE: &str = "span.due";
const LECTURE_STATUS: &str = "span.status";

/// Half-open index range `[start, end)` selecting which portion of a bulk
/// listing to keep. Out-of-range bounds clamp to the parsed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceRange {
    pub start: usize,
    pub end: usize,
}

impl SliceRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Apply the range to a parsed list.
    pub fn apply<T>(self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.start)
            .take(self.end.saturating_sub(self.start))
            .collect()
    }
}

/// Collect the text content of the first element matching `selector`
/// inside `scope`, trimmed.
fn text_of(scope: ElementRef<'_>, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    scope
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

/// Parse the lecture list under a meeting element.
///
/// A lecture without a link is malformed and skipped; due date and status
/// are optional portal decorations.
fn parse_lectures(scope: ElementRef<'_>) -> Vec<Lecture> {
    let Ok(item_sel) = Selector::parse(LECTURE_ITEM) else {
        return Vec::new();
    };
    let Ok(link_sel) = Selector::parse(LECTURE_LINK) else {
        return Vec::new();
    };

    let mut lectures = Vec::new();
    for item in scope.select(&item_sel) {
        let Some(link) = item.select(&link_sel).next() else {
            tracing::warn!("skipping lecture fragment without a link");
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            tracing::warn!("skipping lecture fragment without an href");
            continue;
        };

        lectures.push(Lecture {
            title: link.text().collect::<String>().trim().to_string(),
            href: href.to_string(),
            due: text_of(item, LECTURE_DUE).filter(|s| !s.is_empty()),
            status: text_of(item, LECTURE_STATUS).filter(|s| !s.is_empty()),
        });
    }
    lectures
}
