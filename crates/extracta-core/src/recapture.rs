//! Reprocessing of failed draws: each one is shown again and captured as a
//! screenshot for manual inspection.

use std::path::PathBuf;

use crate::adapter::PageAdapter;
use crate::error::AppError;
use crate::models::{DateOption, FailedDraw, ScreenshotRecord};
use crate::navigator::{Navigator, NavigatorConfig};
use crate::retry::RetryPolicy;
use crate::traits::BrowserSession;

/// File name of the screenshot for one draw, e.g.
/// `screenshot_2023_2712Mittwoch.png` for `"27.12. (Mittwoch)"`.
pub fn screenshot_name(year: i32, date: &str) -> String {
    let sanitized: String = date.chars().filter(|c| c.is_alphanumeric()).collect();
    format!("screenshot_{year}_{sanitized}.png")
}

/// Outcome of a recapture run.
#[derive(Debug, Clone, Default)]
pub struct RecaptureReport {
    pub records: Vec<ScreenshotRecord>,
    /// Failures that could not be shown again, with the new reason.
    pub unresolved: Vec<FailedDraw>,
    /// Whole-year failures, which have no single draw to show.
    pub skipped: usize,
}

pub struct RecaptureService<'a, B: BrowserSession, A: PageAdapter> {
    browser: &'a B,
    navigator: Navigator<'a, B, A>,
    policy: RetryPolicy,
    screenshot_dir: PathBuf,
}

impl<'a, B: BrowserSession, A: PageAdapter> RecaptureService<'a, B, A> {
    pub fn new(
        browser: &'a B,
        adapter: &'a A,
        navigator_config: NavigatorConfig,
        policy: RetryPolicy,
        screenshot_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            browser,
            navigator: Navigator::new(browser, adapter, navigator_config),
            policy,
            screenshot_dir: screenshot_dir.into(),
        }
    }

    /// Show every failed draw again and screenshot it.
    pub async fn recapture(&self, failures: &[FailedDraw]) -> RecaptureReport {
        let mut report = RecaptureReport::default();

        for failure in failures {
            if failure.is_whole_year() {
                tracing::info!(year = failure.year, "Skipping whole-year failure");
                report.skipped += 1;
                continue;
            }

            let result = self
                .policy
                .run(
                    |_| self.capture(failure),
                    |attempt, e, will_retry| {
                        tracing::warn!(
                            year = failure.year,
                            date = %failure.date,
                            attempt,
                            error = %e,
                            %will_retry,
                            "Recapture attempt failed"
                        );
                    },
                )
                .await;

            match result {
                Ok(record) => {
                    tracing::info!(screenshot = %record.screenshot, "Screenshot saved");
                    report.records.push(record);
                }
                Err(e) => report.unresolved.push(FailedDraw {
                    reason: e.to_string(),
                    ..failure.clone()
                }),
            }
        }

        report
    }

    async fn capture(&self, failure: &FailedDraw) -> Result<ScreenshotRecord, AppError> {
        let option = self.resolve(failure).await?;
        self.navigator.show_draw(failure.year, &option).await?;

        let path = self.screenshot_path(failure);
        self.browser.screenshot(&path).await?;

        Ok(ScreenshotRecord {
            year: failure.year,
            date: failure.date.clone(),
            option_value: option.value,
            screenshot: path.display().to_string(),
        })
    }

    /// The stored option value, or the first option whose label contains
    /// the recorded date.
    async fn resolve(&self, failure: &FailedDraw) -> Result<DateOption, AppError> {
        if let Some(value) = &failure.option_value {
            return Ok(DateOption {
                value: value.clone(),
                label: failure.date.clone(),
            });
        }

        self.navigator
            .find_date_option(failure.year, &failure.date)
            .await?
            .ok_or_else(|| {
                AppError::ControlNotFound(format!(
                    "no date option matching '{}' in {}",
                    failure.date, failure.year
                ))
            })
    }

    fn screenshot_path(&self, failure: &FailedDraw) -> PathBuf {
        self.screenshot_dir.join(screenshot_name(failure.year, &failure.date))
    }
}
