use chrono::{Datelike, Local};

use crate::adapter::{LatestDrawPage, PageAdapter};
use crate::error::AppError;
use crate::extract::FieldExtractor;
use crate::models::Draw;
use crate::retry::RetryPolicy;
use crate::traits::{DrawStore, Fetcher, PersistOutcome};

/// Result of a latest-draw run.
#[derive(Debug, Clone)]
pub struct LatestOutcome {
    pub draw: Draw,
    /// Which stores received the draw; nothing is written for a known date.
    pub persisted: PersistOutcome,
}

impl LatestOutcome {
    pub fn novel(&self) -> bool {
        self.persisted.any()
    }
}

/// Fetches the current draw and stores it unless its date is already known.
///
/// Generic over the page source and the store, so tests run without
/// network or filesystem.
pub struct LatestDrawService<F: Fetcher, S: DrawStore> {
    fetcher: F,
    store: S,
    adapter: LatestDrawPage,
    policy: RetryPolicy,
}

impl<F: Fetcher, S: DrawStore> LatestDrawService<F, S> {
    /// Transient fetch errors are retried under `policy`; other errors are
    /// returned immediately.
    pub fn new(fetcher: F, store: S, policy: RetryPolicy) -> Self {
        Self {
            fetcher,
            store,
            adapter: LatestDrawPage,
            policy: policy.with_classifier(AppError::is_retryable),
        }
    }

    /// Fetch and extract the current draw without persisting it.
    pub async fn fetch_latest(&self) -> Result<Draw, AppError> {
        let url = self.adapter.url();

        // 1. Fetch
        tracing::info!(%url, "Fetching latest draw");
        let html = self
            .policy
            .run(
                |_| self.fetcher.fetch(url),
                |attempt, e, will_retry| {
                    tracing::warn!(attempt, error = %e, %will_retry, "Fetching latest draw failed");
                },
            )
            .await?;
        tracing::debug!("Fetched {} bytes of HTML", html.len());

        // 2. Extract
        let extractor = FieldExtractor::new(&self.adapter);
        let date = extractor.extract_draw_date(&html).unwrap_or_else(|| {
            let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
            tracing::warn!(%today, "Page shows no draw date, using today");
            today
        });
        let year = date
            .get(..4)
            .and_then(|y| y.parse().ok())
            .unwrap_or_else(|| Local::now().year());
        let draw = extractor.extract_draw(&html, year, &date);

        // 3. Validate
        if !draw.is_complete() {
            return Err(AppError::ExtractionIncomplete(format!(
                "only {} numbers on the latest draw page",
                draw.numbers.len()
            )));
        }
        tracing::info!(date = %draw.date, numbers = ?draw.numbers, bonus = ?draw.bonus_number, "Latest draw extracted");
        Ok(draw)
    }

    /// Fetch the current draw and persist it if its date is new.
    pub async fn run(&self) -> Result<LatestOutcome, AppError> {
        let draw = self.fetch_latest().await?;
        let persisted = self.store.persist(&draw)?;

        if persisted.any() {
            tracing::info!(date = %draw.date, json = persisted.json_written, sheet = persisted.sheet_written, "New draw saved");
        } else {
            tracing::info!(date = %draw.date, "Draw already stored");
        }

        Ok(LatestOutcome { draw, persisted })
    }
}
