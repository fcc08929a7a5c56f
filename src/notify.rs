//! Change and error notifications over a webhook.
//!
//! Fire-and-forget from the pipeline's perspective: a delivery failure is
//! logged by the caller and never retried.

use crate::model::SubjectChange;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Serialize;

/// Notification sink for subject changes and pipeline errors.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Dispatch a "subject changed" notification carrying the diff.
    async fn notify(&self, change: &SubjectChange) -> Result<()>;
    /// Dispatch an error report.
    async fn error(&self, message: &str) -> Result<()>;
}

#[derive(Serialize)]
struct ChangeEvent<'a> {
    event: &'static str,
    subject: &'a SubjectChange,
}

#[derive(Serialize)]
struct ErrorEvent<'a> {
    event: &'static str,
    message: &'a str,
}

/// Webhook-backed notifier posting JSON events.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    async fn post<T: Serialize + Sync>(&self, payload: &T) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .context("webhook request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("webhook rejected event: {status}");
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, change: &SubjectChange) -> Result<()> {
        self.post(&ChangeEvent {
            event: "subject_changed",
            subject: change,
        })
        .await
    }

    async fn error(&self, message: &str) -> Result<()> {
        self.post(&ErrorEvent {
            event: "error",
            message,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Meeting, Subject};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn change() -> SubjectChange {
        let subject = Subject {
            course_id: "CS101".into(),
            name: "Intro to CS".into(),
            code: "CS101-A".into(),
            meetings: vec![],
        };
        SubjectChange::new(
            &subject,
            vec![Meeting {
                subject: "Intro to CS".into(),
                title: "Week 3".into(),
                lectures: vec![],
            }],
        )
    }

    #[tokio::test]
    async fn test_notify_posts_change_event() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(serde_json::json!({
                "event": "subject_changed",
                "subject": { "course_id": "CS101" }
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(format!("{}/hook", server.uri()));
        notifier.notify(&change()).await.unwrap();
    }

    #[tokio::test]
    async fn test_error_posts_error_event() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(serde_json::json!({ "event": "error" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(format!("{}/hook", server.uri()));
        notifier.error("lookup failed for CS101").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_event_surfaces_as_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(format!("{}/hook", server.uri()));
        assert!(notifier.error("boom").await.is_err());
    }
}
