use crate::adapter::StatisticsPage;
use crate::error::AppError;
use crate::extract::extract_frequencies;
use crate::models::NumberFrequency;
use crate::retry::RetryPolicy;
use crate::traits::Fetcher;

/// Fetch the statistics page and read how often each number was drawn.
pub async fn fetch_frequencies<F: Fetcher>(
    fetcher: &F,
    page: &StatisticsPage,
    policy: &RetryPolicy,
) -> Result<Vec<NumberFrequency>, AppError> {
    tracing::info!(url = %page.url, "Fetching number statistics");
    let html = policy
        .run(
            |_| fetcher.fetch(page.url),
            |attempt, e, will_retry| {
                tracing::warn!(attempt, error = %e, %will_retry, "Fetching statistics failed");
            },
        )
        .await?;

    let frequencies = extract_frequencies(&html, page)?;
    tracing::info!(numbers = frequencies.len(), "Statistics extracted");
    Ok(frequencies)
}
