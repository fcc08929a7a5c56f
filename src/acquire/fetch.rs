//! HTTP-driven acquisition — no browser involved.
//!
//! A cookie jar stands in for the browser session: `collect_cookies`
//! establishes (or refreshes) the portal session, after which the bulk
//! subject listing can be fetched directly. The ordering is part of the
//! pipeline protocol and is enforced by the orchestrator, not here.
//! Attempt-once: no retries at this layer.

use crate::config::Config;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The fetch-path acquisition contract used by the orchestrator.
#[async_trait]
pub trait PortalFetcher: Send + Sync {
    /// Establish or refresh session cookies against the portal.
    async fn collect_cookies(&self) -> Result<()>;
    /// Retrieve the bulk subject listing. Requires cookies.
    async fn fetch_subjects_content(&self) -> Result<String>;
}

/// Cookie-session HTTP client against the portal.
pub struct FetchSession {
    client: reqwest::Client,
    config: Config,
}

impl FetchSession {
    pub fn new(config: Config) -> Result<Self> {
        let jar = Arc::new(reqwest::cookie::Jar::default());
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .cookie_provider(jar)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl PortalFetcher for FetchSession {
    async fn collect_cookies(&self) -> Result<()> {
        let login_url = self.config.login_url();

        // The login page hands out the session cookie; the credential
        // post binds it to an authenticated session.
        let response = self
            .client
            .get(&login_url)
            .send()
            .await
            .context("failed to reach login page")?;
        if !response.status().is_success() {
            bail!("login page returned {}", response.status());
        }

        let response = self
            .client
            .post(&login_url)
            .form(&[
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await
            .context("login submission failed")?;
        if !response.status().is_success() {
            bail!("login submission returned {}", response.status());
        }

        Ok(())
    }

    async fn fetch_subjects_content(&self) -> Result<String> {
        let url = self.config.learn_landing_url();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to fetch subject listing from {url}"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("subject listing returned {status}");
        }

        response
            .text()
            .await
            .context("failed to read subject listing body")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> Config {
        Config::new(
            server.uri(),
            server.uri(),
            "student".into(),
            "hunter2".into(),
            "https://hooks.example.com/lectern".into(),
            PathBuf::from("/tmp/lectern-test.db"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_collect_cookies_visits_then_submits_login() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "session=abc123; Path=/"),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_string_contains("username=student"))
            .and(body_string_contains("password=hunter2"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let session = FetchSession::new(config_for(&server)).unwrap();
        session.collect_cookies().await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_subjects_content_returns_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/my/subjects"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>listing</html>"))
            .mount(&server)
            .await;

        let session = FetchSession::new(config_for(&server)).unwrap();
        let body = session.fetch_subjects_content().await.unwrap();
        assert_eq!(body, "<html>listing</html>");
    }

    #[tokio::test]
    async fn test_non_success_listing_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/my/subjects"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let session = FetchSession::new(config_for(&server)).unwrap();
        let err = session.fetch_subjects_content().await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
