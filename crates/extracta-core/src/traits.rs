use std::future::Future;
use std::path::Path;

use crate::error::AppError;
use crate::models::Draw;

/// Fetches HTML content from a URL.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

impl<F: Fetcher> Fetcher for &F {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send {
        (**self).fetch(url)
    }
}

/// Identifies one selection control: the `index`-th element (document order)
/// matching `selector`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlHandle {
    pub selector: String,
    pub index: usize,
}

impl ControlHandle {
    pub fn new(selector: impl Into<String>, index: usize) -> Self {
        Self {
            selector: selector.into(),
            index,
        }
    }
}

/// Capabilities the pipeline needs from a browser backend.
///
/// A session owns one page whose client-side state (selected year and date)
/// is global; callers must drive it sequentially.
pub trait BrowserSession: Send + Sync {
    /// Load `url` in the session's page.
    fn navigate(&self, url: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Current rendered markup of the page.
    fn page_source(&self) -> impl Future<Output = Result<String, AppError>> + Send;

    /// Set the control's value and dispatch a bubbling `change` event so the
    /// page's client-side code reacts to it.
    ///
    /// Fails with [`AppError::ControlNotFound`] if the control does not exist.
    fn choose_option(
        &self,
        control: &ControlHandle,
        value: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Save a PNG screenshot of the viewport.
    fn screenshot(&self, path: &Path) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Release the session.
    fn quit(self) -> impl Future<Output = Result<(), AppError>> + Send
    where
        Self: Sized;
}

/// Which of the two persisted stores a write touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistOutcome {
    pub json_written: bool,
    pub sheet_written: bool,
}

impl PersistOutcome {
    pub fn any(&self) -> bool {
        self.json_written || self.sheet_written
    }
}

/// Result of a batched write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    /// Draws appended to the JSON store.
    pub json_added: usize,
    /// Rows appended to the tabular sheet.
    pub sheet_added: usize,
    /// Draws skipped because their date was already stored in both.
    pub duplicates: usize,
}

/// Deduplicating draw store keyed by date.
pub trait DrawStore: Send + Sync {
    /// Previously persisted draws; empty if nothing was stored yet.
    fn load_existing(&self) -> Result<Vec<Draw>, AppError>;

    /// Append `draw` to every store that does not contain its date yet.
    fn persist(&self, draw: &Draw) -> Result<PersistOutcome, AppError>;

    /// Append all novel draws, rewriting each store at most once.
    fn persist_all(&self, draws: &[Draw]) -> Result<PersistSummary, AppError>;
}
