pub mod adapter;
pub mod config;
pub mod error;
pub mod extract;
pub mod history;
pub mod latest;
pub mod models;
pub mod navigator;
pub mod recapture;
pub mod retry;
pub mod session;
pub mod stats;
pub mod traits;

#[cfg(test)]
pub(crate) mod testutil;

pub use adapter::{ArchivePage, LatestDrawPage, PageAdapter, StatisticsPage};
pub use config::{BrowserKind, ScraperConfig};
pub use error::AppError;
pub use extract::{FieldExtractor, extract_frequencies};
pub use history::{
    HistoryEvent, HistoryReport, HistoryReporter, HistoryScraper, TracingHistoryReporter,
    UnitState, YearOutcome,
};
pub use latest::{LatestDrawService, LatestOutcome};
pub use models::{DateOption, Draw, FailedDraw, NumberFrequency, ScreenshotRecord, is_novel};
pub use navigator::{Navigator, NavigatorConfig};
pub use recapture::{RecaptureReport, RecaptureService, screenshot_name};
pub use retry::RetryPolicy;
pub use session::{dump_debug_page, finish_session};
pub use stats::fetch_frequencies;
pub use traits::{BrowserSession, ControlHandle, DrawStore, Fetcher, PersistOutcome, PersistSummary};
