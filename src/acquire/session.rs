//! Browser-driven portal session — a five-state sequential protocol.
//!
//! `Uninitialized → Ready → Authenticated → Bridged → Enumerated →
//! Collected`, each state with a single outgoing transition. No branching,
//! no retries: the first failure is fatal to the run and propagates
//! unmodified. `close()` is the idempotent reset back to `Uninitialized`.

use super::{ClickOptions, PortalBrowser, PortalPage};
use crate::collect::collect_meetings;
use crate::config::Config;
use crate::error::LecternError;
use crate::model::{audit_key, Meeting};
use crate::store::AuditStore;
use anyhow::Result;
use chrono::Utc;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::info;

const USERNAME_FIELD: &str = "input[name='username']";
const PASSWORD_FIELD: &str = "input[name='password']";
const LOGIN_SUBMIT: &str = "button[type='submit']";
/// Portal menu entry that bridges into the learning subsystem.
const BRIDGE_MENU: &str = "a.menu-elearning";
/// "Open learning system" control. Rendered inside a context that
/// intercepts scripted clicks, hence the native click below.
const BRIDGE_OPEN: &str = "button.open-lms";
const LECTURE_PAGE_LINKS: &str = "a.lecture-page-link";

/// Protocol state of a portal session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    Authenticated,
    Bridged,
    Enumerated,
    Collected,
}

impl SessionState {
    fn name(self) -> &'static str {
        match self {
            SessionState::Uninitialized => "Uninitialized",
            SessionState::Ready => "Ready",
            SessionState::Authenticated => "Authenticated",
            SessionState::Bridged => "Bridged",
            SessionState::Enumerated => "Enumerated",
            SessionState::Collected => "Collected",
        }
    }
}

/// A stateful browser session against the portal.
///
/// Owns its page handle for the duration of the run; the browser itself
/// is shared so that the collection step can fan out over fresh pages.
pub struct PortalSession {
    browser: Arc<dyn PortalBrowser>,
    config: Config,
    page: Option<Box<dyn PortalPage>>,
    hrefs: Vec<String>,
    state: SessionState,
}

impl PortalSession {
    pub fn new(browser: Arc<dyn PortalBrowser>, config: Config) -> Self {
        Self {
            browser,
            config,
            page: None,
            hrefs: Vec::new(),
            state: SessionState::Uninitialized,
        }
    }

    /// Current protocol state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Uninitialized → Ready: acquire a working page handle.
    /// Calling this when a page is already held is a no-op.
    pub async fn open(&mut self) -> Result<()> {
        if self.page.is_some() {
            return Ok(());
        }
        self.page = Some(self.browser.first_page().await?);
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Ready → Authenticated: navigate to the login page, fill the
    /// credential fields, submit. There is no verification step; a failed
    /// login surfaces as a later navigation failure.
    pub async fn login(&mut self) -> Result<()> {
        let page = self.page()?;
        self.expect_state(SessionState::Ready)?;

        page.visit(&self.config.login_url()).await?;
        page.insert(USERNAME_FIELD, &self.config.username).await?;
        page.insert(PASSWORD_FIELD, &self.config.password).await?;
        page.click(LOGIN_SUBMIT, ClickOptions::default()).await?;

        self.state = SessionState::Authenticated;
        Ok(())
    }

    /// Authenticated → Bridged: cross into the learning subsystem. The
    /// bridge opens in a new browser context, so the now-stale page is
    /// closed and replaced with a fresh one pointed at the subsystem.
    pub async fn bridge(&mut self) -> Result<()> {
        {
            let page = self.page()?;
            self.expect_state(SessionState::Authenticated)?;

            page.wait_for_network_idle().await?;
            page.click(BRIDGE_MENU, ClickOptions::default()).await?;
            page.click(BRIDGE_OPEN, ClickOptions { native: true }).await?;
        }

        if let Some(stale) = self.page.take() {
            stale.close().await?;
        }
        let fresh = self.browser.new_page().await?;
        fresh.visit(&self.config.learn_landing_url()).await?;
        self.page = Some(fresh);

        self.state = SessionState::Bridged;
        Ok(())
    }

    /// Bridged → Enumerated: extract the href of every lecture page link
    /// on the landing page.
    pub async fn enumerate(&mut self) -> Result<Vec<String>> {
        let page = self.page()?;
        self.expect_state(SessionState::Bridged)?;

        let hrefs = page.attribute_of_all(LECTURE_PAGE_LINKS, "href").await?;
        info!(count = hrefs.len(), "enumerated lecture pages");

        self.hrefs = hrefs.clone();
        self.state = SessionState::Enumerated;
        Ok(hrefs)
    }

    /// Enumerated → Collected: open one page per discovered URL
    /// concurrently, read each page's content, parse its meetings, and
    /// record the raw capture in the audit trail. All tasks must succeed;
    /// a single failure fails the step.
    pub async fn collect(&mut self, audit: &dyn AuditStore) -> Result<Vec<Meeting>> {
        self.page()?;
        self.expect_state(SessionState::Enumerated)?;

        let base = self.config.learn_base_url.trim_end_matches('/').to_string();
        let run_timestamp = Utc::now().format("%Y%m%d%H%M%S").to_string();

        let tasks = self.hrefs.iter().map(|href| {
            let browser = Arc::clone(&self.browser);
            let url = format!("{base}{href}");
            let run_timestamp = run_timestamp.clone();
            async move {
                let page = browser.new_page().await?;
                let collected: Result<Vec<Meeting>> = async {
                    page.visit(&url).await?;
                    let html = page.content().await?;
                    audit.put_capture(&audit_key(&run_timestamp, &url), &html)?;
                    Ok(collect_meetings(&html))
                }
                .await;
                page.close().await?;
                collected
            }
        });

        let per_page = try_join_all(tasks).await?;
        let meetings: Vec<Meeting> = per_page.into_iter().flatten().collect();
        info!(count = meetings.len(), "collected meetings from lecture pages");

        self.state = SessionState::Collected;
        Ok(meetings)
    }

    /// Terminal reset: release the page handle and the browser, enabling
    /// a future run to start clean. Idempotent.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(page) = self.page.take() {
            let _ = page.close().await;
        }
        self.browser.close().await?;
        self.hrefs.clear();
        self.state = SessionState::Uninitialized;
        Ok(())
    }

    /// Drive the whole protocol and return the collected meetings.
    pub async fn run(&mut self, audit: &dyn AuditStore) -> Result<Vec<Meeting>> {
        self.open().await?;
        self.login().await?;
        self.bridge().await?;
        self.enumerate().await?;
        self.collect(audit).await
    }

    fn page(&self) -> Result<&dyn PortalPage> {
        self.page
            .as_deref()
            .ok_or_else(|| LecternError::NotInitialized("page").into())
    }

    fn expect_state(&self, expected: SessionState) -> Result<()> {
        if self.state != expected {
            return Err(LecternError::InvalidState {
                expected: expected.name(),
                actual: self.state.name(),
            }
            .into());
        }
        Ok(())
    }
}
