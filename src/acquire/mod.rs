//! Acquisition — obtaining raw portal content.
//!
//! Two paths: a scripted browser session (`session`, driving pages behind
//! the `PortalBrowser`/`PortalPage` traits, with `chromium` as the
//! concrete driver) and a cookie-session HTTP fetch (`fetch`).

pub mod chromium;
pub mod fetch;
pub mod session;

use anyhow::Result;
use async_trait::async_trait;

/// Options for clicking a page control.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClickOptions {
    /// Dispatch a native input event instead of a scripted `.click()`.
    /// Required for controls rendered inside contexts that intercept
    /// synthetic clicks.
    pub native: bool,
}

/// A running browser that can hand out pages.
#[async_trait]
pub trait PortalBrowser: Send + Sync {
    /// The page the browser opened on launch, or a fresh one if none.
    async fn first_page(&self) -> Result<Box<dyn PortalPage>>;
    /// Open a fresh blank page.
    async fn new_page(&self) -> Result<Box<dyn PortalPage>>;
    /// Release the browser.
    async fn close(&self) -> Result<()>;
}

/// A single driveable page.
#[async_trait]
pub trait PortalPage: Send + Sync {
    /// Navigate to `url` and wait for the load to settle.
    async fn visit(&self, url: &str) -> Result<()>;
    /// Fill the form field matching `selector` with `value`.
    async fn insert(&self, selector: &str, value: &str) -> Result<()>;
    /// Click the control matching `selector`.
    async fn click(&self, selector: &str, options: ClickOptions) -> Result<()>;
    /// Wait until in-flight network activity settles.
    async fn wait_for_network_idle(&self) -> Result<()>;
    /// Collect `attribute` from every element matching `selector`.
    async fn attribute_of_all(&self, selector: &str, attribute: &str) -> Result<Vec<String>>;
    /// The page's rendered markup.
    async fn content(&self) -> Result<String>;
    /// Close the page.
    async fn close(self: Box<Self>) -> Result<()>;
}
