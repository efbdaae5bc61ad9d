use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::{Browser, Page};
use extracta_core::config::BrowserKind;
use extracta_core::error::AppError;
use extracta_core::traits::Fetcher;
use tokio::task::JoinHandle;

use crate::browser::{launch, shutdown};

const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Fetcher that renders pages in a headless browser before returning the
/// HTML, for pages that fill their content client-side (the statistics
/// page, the archive).
///
/// A single browser process is shared across all clones of this struct;
/// each [`Fetcher::fetch`] call opens a new tab, waits for the ready
/// selector, grabs the rendered HTML, and closes the tab. Release the
/// process with [`BrowserFetcher::close`] once every clone is dropped.
#[derive(Clone)]
pub struct BrowserFetcher {
    browser: Arc<Browser>,
    handler: Arc<JoinHandle<()>>,
    timeout: Duration,
    ready_selector: Option<String>,
}

impl BrowserFetcher {
    /// Launches a browser with a **30 s** navigation timeout.
    pub async fn new(kind: BrowserKind, headless: bool) -> Result<Self, AppError> {
        Self::with_timeout(kind, headless, Duration::from_secs(30)).await
    }

    pub async fn with_timeout(
        kind: BrowserKind,
        headless: bool,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let (browser, handler) = launch(kind, headless).await?;
        Ok(Self {
            browser: Arc::new(browser),
            handler: Arc::new(handler),
            timeout,
            ready_selector: None,
        })
    }

    /// Wait for an element matching `selector` before reading the page.
    pub fn wait_for(mut self, selector: impl Into<String>) -> Self {
        self.ready_selector = Some(selector.into());
        self
    }

    /// Close the browser process.
    ///
    /// Fails without closing anything if another clone is still alive.
    pub async fn close(self) -> Result<(), AppError> {
        let mut browser = Arc::try_unwrap(self.browser).map_err(|_| {
            AppError::BrowserError("Browser is still shared by another fetcher".into())
        })?;
        shutdown(&mut browser, &self.handler).await
    }

    async fn rendered_html(&self, page: &Page, url: &str) -> Result<String, AppError> {
        page.goto(url)
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to navigate to {url}: {e}")))?;

        let selector = self.ready_selector.as_deref().unwrap_or("body");
        while page.find_element(selector).await.is_err() {
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }

        page.content()
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to read page content: {e}")))
    }
}

impl Fetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to open tab: {e}")))?;

        let result = tokio::time::timeout(self.timeout, self.rendered_html(&page, url)).await;

        // Closed on timeout too, so a hung load does not leave the tab open.
        if let Err(e) = page.close().await {
            tracing::debug!(error = %e, "Failed to close tab");
        }

        match result {
            Ok(inner) => inner,
            Err(_) => Err(AppError::Timeout(self.timeout.as_secs())),
        }
    }
}
