//! Chromium-based portal driver using chromiumoxide.

use super::{ClickOptions, PortalBrowser, PortalPage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;

/// How long to let the network settle in `wait_for_network_idle`.
const NETWORK_IDLE_GRACE: Duration = Duration::from_millis(750);

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. LECTERN_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("LECTERN_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.lectern/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".lectern/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".lectern/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".lectern/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".lectern/chromium/chrome-linux64/chrome"),
                home.join(".lectern/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    if let Ok(path) = which::which("google-chrome") {
        return Some(path);
    }
    if let Ok(path) = which::which("chromium") {
        return Some(path);
    }
    if let Ok(path) = which::which("chromium-browser") {
        return Some(path);
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Headless Chromium behind the `PortalBrowser` trait.
pub struct ChromiumBrowser {
    browser: Browser,
}

impl ChromiumBrowser {
    /// Launch a headless Chromium instance.
    pub async fn launch() -> Result<Self> {
        let chrome_path =
            find_chromium().context("Chromium not found. Set LECTERN_CHROMIUM_PATH.")?;

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        // Drain CDP events so the connection stays alive
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self { browser })
    }
}

#[async_trait]
impl PortalBrowser for ChromiumBrowser {
    async fn first_page(&self) -> Result<Box<dyn PortalPage>> {
        let pages = self.browser.pages().await.unwrap_or_default();
        let page = match pages.into_iter().next() {
            Some(page) => page,
            None => self
                .browser
                .new_page("about:blank")
                .await
                .context("failed to open first page")?,
        };
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn new_page(&self) -> Result<Box<dyn PortalPage>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to open new page")?;
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn close(&self) -> Result<()> {
        // Browser process exits when the Browser value is dropped
        Ok(())
    }
}

/// A single Chromium page behind the `PortalPage` trait.
pub struct ChromiumPage {
    page: Page,
}

#[async_trait]
impl PortalPage for ChromiumPage {
    async fn visit(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("navigation to {url} failed"))?;
        let _ = self.page.wait_for_navigation().await;
        Ok(())
    }

    async fn insert(&self, selector: &str, value: &str) -> Result<()> {
        let script = format!(
            "document.querySelector({selector:?}).value = {value:?}",
        );
        self.page
            .evaluate(script)
            .await
            .with_context(|| format!("failed to fill field {selector}"))?;
        Ok(())
    }

    async fn click(&self, selector: &str, options: ClickOptions) -> Result<()> {
        if options.native {
            // CDP mouse event at the element's coordinates; survives
            // contexts that swallow scripted clicks.
            let element = self
                .page
                .find_element(selector)
                .await
                .with_context(|| format!("control not found: {selector}"))?;
            element
                .click()
                .await
                .with_context(|| format!("native click failed on {selector}"))?;
        } else {
            let script = format!("document.querySelector({selector:?}).click()");
            self.page
                .evaluate(script)
                .await
                .with_context(|| format!("scripted click failed on {selector}"))?;
        }
        Ok(())
    }

    async fn wait_for_network_idle(&self) -> Result<()> {
        // chromiumoxide exposes no networkidle lifecycle directly; wait
        // for any pending navigation and give in-flight requests a grace
        // period to settle.
        let _ = self.page.wait_for_navigation().await;
        tokio::time::sleep(NETWORK_IDLE_GRACE).await;
        Ok(())
    }

    async fn attribute_of_all(&self, selector: &str, attribute: &str) -> Result<Vec<String>> {
        let script = format!(
            "Array.from(document.querySelectorAll({selector:?}))
                .map(el => el.getAttribute({attribute:?}))"
        );
        let result = self
            .page
            .evaluate(script)
            .await
            .with_context(|| format!("failed to read {attribute} from {selector}"))?;

        let values: Vec<Option<String>> = result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert attribute list: {e:?}"))?;

        Ok(values.into_iter().flatten().collect())
    }

    async fn content(&self) -> Result<String> {
        let result = self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await
            .context("failed to get page content")?;

        let html: String = result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert page content: {e:?}"))?;

        Ok(html)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let _ = self.page.close().await;
        Ok(())
    }
}
