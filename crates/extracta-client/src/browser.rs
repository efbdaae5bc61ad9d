use std::path::{Path, PathBuf};
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use extracta_core::config::BrowserKind;
use extracta_core::error::AppError;
use extracta_core::traits::{BrowserSession, ControlHandle};
use futures::StreamExt;
use tokio::task::JoinHandle;

/// Launch a browser of the given kind and keep its CDP handler polled.
///
/// The returned task ends when the connection closes.
pub(crate) async fn launch(
    kind: BrowserKind,
    headless: bool,
) -> Result<(Browser, JoinHandle<()>), AppError> {
    let mut builder = BrowserConfig::builder()
        .no_sandbox()
        .disable_default_args();

    match find_browser_binary(kind) {
        Some(bin) => {
            tracing::info!(browser = ?kind, "Using browser binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }
        None if kind != BrowserKind::Chrome && kind != BrowserKind::Chromium => {
            return Err(AppError::ConfigError(format!(
                "No {kind:?} binary found; set CHROME_BIN"
            )));
        }
        None => {}
    }

    builder = if headless {
        builder.arg("--headless=new")
    } else {
        builder.with_head()
    };

    let config = builder
        .arg("--disable-gpu")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-extensions")
        .arg("--disable-popup-blocking")
        .arg("--no-first-run")
        .arg("--window-size=1280,1600")
        .build()
        .map_err(|e| AppError::BrowserError(format!("Browser config error: {e}")))?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .map_err(|e| AppError::BrowserError(format!("Failed to launch browser: {e}")))?;

    // The CDP handler must be polled continuously for the connection to work.
    let handle = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                tracing::warn!("Browser CDP handler error: {event:?}");
                break;
            }
        }
    });

    Ok((browser, handle))
}

/// Close the browser, reap the process and stop its handler task.
pub(crate) async fn shutdown(browser: &mut Browser, handler: &JoinHandle<()>) -> Result<(), AppError> {
    let closed = browser
        .close()
        .await
        .map_err(|e| AppError::BrowserError(format!("Failed to close browser: {e}")));
    let _ = browser.wait().await;
    handler.abort();
    closed.map(|_| ())
}

/// Locate the binary for `kind`, honouring a `CHROME_BIN` override.
///
/// Returns `None` when nothing is installed in a well-known place; for
/// Chrome and Chromium `chromiumoxide` then does its own lookup.
pub fn find_browser_binary(kind: BrowserKind) -> Option<PathBuf> {
    if let Ok(p) = std::env::var("CHROME_BIN") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
        tracing::warn!(path = %p, "CHROME_BIN does not exist, ignoring");
    }

    let candidates: &[&str] = match kind {
        BrowserKind::Chrome => &[
            "/usr/bin/google-chrome-stable",
            "/usr/bin/google-chrome",
            "/opt/google/chrome/chrome",
            "C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe",
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        ],
        BrowserKind::Chromium => &[
            // The snap wrapper rejects standard flags, use the real binary.
            "/snap/chromium/current/usr/lib/chromium-browser/chrome",
            "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
        ],
        BrowserKind::Edge => &[
            "/usr/bin/microsoft-edge-stable",
            "/usr/bin/microsoft-edge",
            "/opt/microsoft/msedge/msedge",
            "C:\\Program Files (x86)\\Microsoft\\Edge\\Application\\msedge.exe",
            "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        ],
    };

    candidates.iter().map(PathBuf::from).find(|p| p.exists())
}

/// Script that sets a `<select>` value and fires a bubbling `change`
/// event. Evaluates to `false` when the control does not exist.
fn choose_option_script(control: &ControlHandle, value: &str) -> Result<String, AppError> {
    let selector = serde_json::to_string(&control.selector)?;
    let value = serde_json::to_string(value)?;
    Ok(format!(
        r#"(() => {{
    const el = document.querySelectorAll({selector})[{index}];
    if (!el) return false;
    el.value = {value};
    el.dispatchEvent(new Event("input", {{ bubbles: true }}));
    el.dispatchEvent(new Event("change", {{ bubbles: true }}));
    return true;
}})()"#,
        index = control.index
    ))
}

/// One browser window driven over CDP.
///
/// Owns the browser process; [`BrowserSession::quit`] closes it. All
/// interaction happens on a single tab.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    timeout: Duration,
}

impl ChromiumSession {
    /// Launch the browser and open a blank tab. `timeout` bounds every
    /// page load.
    pub async fn launch(
        kind: BrowserKind,
        headless: bool,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let (browser, handler) = launch(kind, headless).await?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to open tab: {e}")))?;

        Ok(Self {
            browser,
            page,
            handler,
            timeout,
        })
    }
}

impl BrowserSession for ChromiumSession {
    async fn navigate(&self, url: &str) -> Result<(), AppError> {
        let result = tokio::time::timeout(self.timeout, async {
            self.page
                .goto(url)
                .await
                .map_err(|e| AppError::BrowserError(format!("Failed to navigate to {url}: {e}")))?;
            Ok::<(), AppError>(())
        })
        .await;

        match result {
            Ok(inner) => inner,
            Err(_) => Err(AppError::Timeout(self.timeout.as_secs())),
        }
    }

    async fn page_source(&self) -> Result<String, AppError> {
        self.page
            .content()
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to read page content: {e}")))
    }

    async fn choose_option(&self, control: &ControlHandle, value: &str) -> Result<(), AppError> {
        let script = choose_option_script(control, value)?;
        let found: bool = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| AppError::BrowserError(format!("Selection script failed: {e}")))?
            .into_value()?;

        if !found {
            return Err(AppError::ControlNotFound(format!(
                "{}[{}]",
                control.selector, control.index
            )));
        }
        tracing::debug!(selector = %control.selector, index = control.index, %value, "Option chosen");
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        self.page
            .save_screenshot(params, path)
            .await
            .map_err(|e| AppError::BrowserError(format!("Screenshot failed: {e}")))?;
        Ok(())
    }

    async fn quit(mut self) -> Result<(), AppError> {
        shutdown(&mut self.browser, &self.handler).await
    }
}
