//! Orchestrator — acquisition, collection, diff, persist, notify.
//!
//! One run: collect cookies, fetch the bulk listing, parse it into
//! subjects, then process every subject concurrently. Per-subject
//! failures are caught where they happen, logged, and reported on the
//! error channel; they never abort sibling subjects. The fan-in point
//! only ever observes a settled outcome per subject.

use crate::acquire::fetch::PortalFetcher;
use crate::collect::{collect_subjects, SliceRange};
use crate::diff::diff_subjects;
use crate::model::{subject_key, Subject, SubjectChange};
use crate::notify::Notifier;
use crate::store::SnapshotStore;
use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Where inside a subject's processing a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading the previous snapshot from the store.
    Lookup,
    /// Decoding the previous snapshot.
    Decode,
    /// Writing the new snapshot.
    Persist,
}

/// Settled outcome of processing one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectOutcome {
    /// No prior snapshot existed; the new one was stored.
    FirstSeen,
    /// Prior and new snapshots are identical (or the diff was skipped
    /// because one side had no meetings).
    Unchanged,
    /// Changes were found and a notification dispatched.
    Updated { changed_meetings: usize },
    /// Something failed; siblings were unaffected. When the stage is
    /// `Lookup` or `Decode`, the new snapshot was still persisted.
    Failed { stage: Stage, reason: String },
}

/// Aggregate report of one run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// (course_id, outcome) per processed subject, in listing order.
    pub outcomes: Vec<(String, SubjectOutcome)>,
}

impl RunReport {
    pub fn count(&self, matches: impl Fn(&SubjectOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| matches(o)).count()
    }
}

/// The acquisition-diff-notify worker.
pub struct Worker {
    fetcher: Arc<dyn PortalFetcher>,
    store: Arc<dyn SnapshotStore>,
    notifier: Arc<dyn Notifier>,
}

impl Worker {
    pub fn new(
        fetcher: Arc<dyn PortalFetcher>,
        store: Arc<dyn SnapshotStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            fetcher,
            store,
            notifier,
        }
    }

    /// Execute one full run. Acquisition failures propagate to the
    /// caller; per-subject failures are absorbed into the report.
    pub async fn run(&self, range: Option<SliceRange>) -> Result<RunReport> {
        self.fetcher
            .collect_cookies()
            .await
            .context("cookie collection failed")?;
        let content = self
            .fetcher
            .fetch_subjects_content()
            .await
            .context("subject listing fetch failed")?;

        let subjects = collect_subjects(&content, range);
        info!(count = subjects.len(), "collected subjects from listing");

        let tasks = subjects.into_iter().map(|s| self.process_subject(s));
        let outcomes = join_all(tasks).await;

        let report = RunReport { outcomes };
        info!(
            updated = report.count(|o| matches!(o, SubjectOutcome::Updated { .. })),
            unchanged = report.count(|o| matches!(o, SubjectOutcome::Unchanged)),
            first_seen = report.count(|o| matches!(o, SubjectOutcome::FirstSeen)),
            failed = report.count(|o| matches!(o, SubjectOutcome::Failed { .. })),
            "run finished"
        );
        Ok(report)
    }

    /// Process one subject end-to-end. Never fails: every failure is
    /// caught here, logged, reported on the error channel, and folded
    /// into the outcome.
    async fn process_subject(&self, subject: Subject) -> (String, SubjectOutcome) {
        let course_id = subject.course_id.clone();
        let key = subject_key(&course_id);

        // 1. Load the previous snapshot. A failed lookup or decode is
        // reported and then treated as "no prior snapshot" — the diff is
        // skipped but persistence still proceeds.
        let mut failure: Option<(Stage, String)> = None;
        let previous: Option<Subject> = match self.store.get(&key) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(previous) => Some(previous),
                Err(e) => {
                    self.report_error(
                        Stage::Decode,
                        &course_id,
                        format!("failed to decode snapshot for {course_id}: {e}"),
                        &mut failure,
                    )
                    .await;
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                self.report_error(
                    Stage::Lookup,
                    &course_id,
                    format!("failed to load snapshot for {course_id}: {e}"),
                    &mut failure,
                )
                .await;
                None
            }
        };

        // 2. Diff and notify. Only meaningful when both sides have
        // meetings; notification delivery is fire-and-forget.
        let mut outcome = match &previous {
            None => SubjectOutcome::FirstSeen,
            Some(previous) => {
                if previous.meetings.is_empty() || subject.meetings.is_empty() {
                    SubjectOutcome::Unchanged
                } else {
                    let changed = diff_subjects(previous, &subject);
                    if changed.is_empty() {
                        SubjectOutcome::Unchanged
                    } else {
                        let count = changed.len();
                        info!(course_id = %course_id, changed = count, "subject changed");
                        let change = SubjectChange::new(&subject, changed);
                        if let Err(e) = self.notifier.notify(&change).await {
                            warn!(course_id = %course_id, "change notification failed: {e}");
                        }
                        SubjectOutcome::Updated {
                            changed_meetings: count,
                        }
                    }
                }
            }
        };

        // 3. Persist the new snapshot unconditionally.
        let persisted = match serde_json::to_string(&subject) {
            Ok(json) => self.store.put(&key, &json),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = persisted {
            self.report_error(
                Stage::Persist,
                &course_id,
                format!("failed to persist snapshot for {course_id}: {e}"),
                &mut failure,
            )
            .await;
        }

        if let Some((stage, reason)) = failure {
            outcome = SubjectOutcome::Failed { stage, reason };
        }
        (course_id, outcome)
    }

    /// Log a per-subject failure and push it onto the error channel.
    /// Persist failures take precedence in the recorded outcome.
    async fn report_error(
        &self,
        stage: Stage,
        course_id: &str,
        message: String,
        failure: &mut Option<(Stage, String)>,
    ) {
        error!(course_id = %course_id, ?stage, "{message}");
        if let Err(e) = self.notifier.error(&message).await {
            warn!(course_id = %course_id, "error notification failed: {e}");
        }
        if failure.is_none() || stage == Stage::Persist {
            *failure = Some((stage, message));
        }
    }
}
