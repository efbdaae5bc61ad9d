//! Archive scraping: every draw of a range of years.
//!
//! Each (year, date) pair is an independent unit of work run under the
//! [`RetryPolicy`]. A unit that keeps failing is recorded as a
//! [`FailedDraw`] and the run moves on; a year whose date list cannot be
//! loaded is skipped as a whole.

use std::fmt;

use crate::adapter::PageAdapter;
use crate::error::AppError;
use crate::extract::FieldExtractor;
use crate::models::{DateOption, Draw, FailedDraw};
use crate::navigator::{Navigator, NavigatorConfig};
use crate::retry::RetryPolicy;
use crate::traits::BrowserSession;

/// Lifecycle of one (year, date) unit, reported as [`HistoryEvent::Unit`].
///
/// Units are not queued: `Pending` is reported once, right before the
/// first attempt, and the scraper keeps no per-unit state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Pending,
    Attempting,
    RetryPending,
    Complete,
    Failed,
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitState::Pending => "pending",
            UnitState::Attempting => "attempting",
            UnitState::RetryPending => "retry_pending",
            UnitState::Complete => "complete",
            UnitState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Events emitted while scraping the archive, for monitoring/logging.
#[derive(Debug, Clone)]
pub enum HistoryEvent<'a> {
    YearStarted {
        year: i32,
    },
    YearLoadFailed {
        year: i32,
        attempt: u32,
        error: &'a str,
        will_retry: bool,
    },
    YearSkipped {
        year: i32,
        reason: &'a str,
    },
    DatesDiscovered {
        year: i32,
        count: usize,
    },
    Unit {
        year: i32,
        date: &'a str,
        state: UnitState,
    },
    AttemptFailed {
        year: i32,
        date: &'a str,
        attempt: u32,
        error: &'a str,
        will_retry: bool,
    },
    YearFinished {
        year: i32,
        draws: usize,
        failures: usize,
    },
}

/// Trait for receiving scrape progress (decoupled logging).
pub trait HistoryReporter: Send + Sync {
    fn report(&self, event: HistoryEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHistoryReporter;

impl HistoryReporter for TracingHistoryReporter {
    fn report(&self, event: HistoryEvent<'_>) {
        match event {
            HistoryEvent::YearStarted { year } => {
                tracing::info!(year, "Scraping year");
            }
            HistoryEvent::YearLoadFailed {
                year,
                attempt,
                error,
                will_retry,
            } => {
                tracing::warn!(year, attempt, %error, %will_retry, "Loading year failed");
            }
            HistoryEvent::YearSkipped { year, reason } => {
                tracing::error!(year, %reason, "Year skipped");
            }
            HistoryEvent::DatesDiscovered { year, count } => {
                tracing::info!(year, count, "Draw dates found");
            }
            HistoryEvent::Unit { year, date, state } => {
                tracing::debug!(year, %date, %state, "Draw");
            }
            HistoryEvent::AttemptFailed {
                year,
                date,
                attempt,
                error,
                will_retry,
            } => {
                tracing::warn!(year, %date, attempt, %error, %will_retry, "Draw attempt failed");
            }
            HistoryEvent::YearFinished {
                year,
                draws,
                failures,
            } => {
                tracing::info!(year, draws, failures, "Year finished");
            }
        }
    }
}

/// Result of scraping one year.
#[derive(Debug, Clone, Default)]
pub struct YearOutcome {
    pub year: i32,
    pub draws: Vec<Draw>,
    pub failures: Vec<FailedDraw>,
    /// The year's date list could not be loaded.
    pub skipped: bool,
}

/// Aggregate of a multi-year run.
#[derive(Debug, Clone, Default)]
pub struct HistoryReport {
    pub draws: Vec<Draw>,
    pub failures: Vec<FailedDraw>,
    pub skipped_years: Vec<i32>,
}

impl HistoryReport {
    pub fn absorb(&mut self, outcome: YearOutcome) {
        if outcome.skipped {
            self.skipped_years.push(outcome.year);
        }
        self.draws.extend(outcome.draws);
        self.failures.extend(outcome.failures);
    }
}

/// Scrapes the archive through one browser session, strictly sequentially.
pub struct HistoryScraper<'a, B: BrowserSession, A: PageAdapter, R: HistoryReporter> {
    navigator: Navigator<'a, B, A>,
    extractor: FieldExtractor<'a, A>,
    policy: RetryPolicy,
    reporter: &'a R,
}

impl<'a, B: BrowserSession, A: PageAdapter, R: HistoryReporter> HistoryScraper<'a, B, A, R> {
    pub fn new(
        browser: &'a B,
        adapter: &'a A,
        navigator_config: NavigatorConfig,
        policy: RetryPolicy,
        reporter: &'a R,
    ) -> Self {
        Self {
            navigator: Navigator::new(browser, adapter, navigator_config),
            extractor: FieldExtractor::new(adapter),
            policy,
            reporter,
        }
    }

    /// Scrape every listed draw of `year`.
    pub async fn scrape_year(&self, year: i32) -> YearOutcome {
        self.reporter.report(HistoryEvent::YearStarted { year });

        let options = self
            .policy
            .run(
                |_| self.load_year(year),
                |attempt, e, will_retry| {
                    self.reporter.report(HistoryEvent::YearLoadFailed {
                        year,
                        attempt,
                        error: &e.to_string(),
                        will_retry,
                    });
                },
            )
            .await;

        let options = match options {
            Ok(options) => options,
            Err(e) => {
                let reason = e.to_string();
                self.reporter.report(HistoryEvent::YearSkipped {
                    year,
                    reason: &reason,
                });
                return YearOutcome {
                    year,
                    draws: Vec::new(),
                    failures: vec![FailedDraw::whole_year(year, reason)],
                    skipped: true,
                };
            }
        };

        self.reporter.report(HistoryEvent::DatesDiscovered {
            year,
            count: options.len(),
        });

        let mut outcome = YearOutcome {
            year,
            ..Default::default()
        };

        for option in &options {
            match self.scrape_unit(year, option).await {
                Ok(draw) => outcome.draws.push(draw),
                Err(e) => outcome.failures.push(FailedDraw {
                    year,
                    date: option.label.clone(),
                    reason: e.to_string(),
                    option_value: Some(option.value.clone()),
                }),
            }
        }

        self.reporter.report(HistoryEvent::YearFinished {
            year,
            draws: outcome.draws.len(),
            failures: outcome.failures.len(),
        });
        outcome
    }

    /// Scrape several years in order; a failing year never stops the run.
    pub async fn scrape_years(&self, years: impl IntoIterator<Item = i32>) -> HistoryReport {
        let mut report = HistoryReport::default();
        for year in years {
            report.absorb(self.scrape_year(year).await);
        }
        report
    }

    /// Open the page, select `year` and list its draw dates.
    pub async fn load_year(&self, year: i32) -> Result<Vec<DateOption>, AppError> {
        self.navigator.open().await?;
        self.navigator.select_year(year).await?;
        self.navigator.date_options().await
    }

    async fn scrape_unit(&self, year: i32, option: &DateOption) -> Result<Draw, AppError> {
        let date = option.label.as_str();
        self.report_unit(year, date, UnitState::Pending);

        let result = self
            .policy
            .run(
                |_| {
                    self.report_unit(year, date, UnitState::Attempting);
                    self.attempt(year, option)
                },
                |attempt, e, will_retry| {
                    self.reporter.report(HistoryEvent::AttemptFailed {
                        year,
                        date,
                        attempt,
                        error: &e.to_string(),
                        will_retry,
                    });
                    if will_retry {
                        self.report_unit(year, date, UnitState::RetryPending);
                    }
                },
            )
            .await;

        let state = if result.is_ok() {
            UnitState::Complete
        } else {
            UnitState::Failed
        };
        self.report_unit(year, date, state);
        result
    }

    /// One attempt: show the draw and require a complete extraction.
    async fn attempt(&self, year: i32, option: &DateOption) -> Result<Draw, AppError> {
        let html = self.navigator.show_draw(year, option).await?;
        let draw = self.extractor.extract_draw(&html, year, &option.label);
        if !draw.is_complete() {
            return Err(AppError::ExtractionIncomplete(format!(
                "only {} numbers for {} {}",
                draw.numbers.len(),
                option.label,
                year
            )));
        }
        Ok(draw)
    }

    fn report_unit(&self, year: i32, date: &str, state: UnitState) {
        self.reporter
            .report(HistoryEvent::Unit { year, date, state });
    }
}
