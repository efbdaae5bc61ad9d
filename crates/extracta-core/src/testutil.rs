//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::history::{HistoryEvent, HistoryReporter};
use crate::models::{Draw, is_novel};
use crate::navigator::NavigatorConfig;
use crate::traits::{BrowserSession, ControlHandle, DrawStore, Fetcher, PersistOutcome, PersistSummary};

/// Navigator timings small enough for unit tests.
pub fn fast_navigator_config() -> NavigatorConfig {
    NavigatorConfig {
        refresh_timeout: Duration::from_millis(200),
        poll_interval: Duration::from_millis(1),
        settle_delay: Duration::ZERO,
    }
}

/// Result region markup in the archive layout: one container with the
/// numbers, a second one with the bonus number.
pub fn archive_html(numbers: &[&str], bonus: Option<&str>) -> String {
    format!(
        "<html><body>{}</body></html>",
        result_region(numbers.iter().copied(), bonus)
    )
}

fn result_region<'s>(numbers: impl Iterator<Item = &'s str>, bonus: Option<&str>) -> String {
    let balls: String = numbers
        .map(|n| format!(r#"<span class="LottoBall">{n}</span>"#))
        .collect();
    let mut html = format!(r#"<div class="DrawNumbersCollection__container">{balls}</div>"#);
    if let Some(b) = bonus {
        html.push_str(&format!(
            r#"<div class="DrawNumbersCollection__container"><span class="LottoBall">{b}</span></div>"#
        ));
    }
    html
}

// ---------------------------------------------------------------------------
// MockBrowser
// ---------------------------------------------------------------------------

/// One draw of the simulated archive.
#[derive(Debug, Clone)]
pub struct MockDraw {
    pub value: String,
    pub label: String,
    pub numbers: Vec<u8>,
    pub bonus: Option<u8>,
}

impl MockDraw {
    pub fn new(value: &str, label: &str, numbers: &[u8], bonus: Option<u8>) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            numbers: numbers.to_vec(),
            bonus,
        }
    }
}

#[derive(Debug, Default)]
struct MockPage {
    years: BTreeMap<i32, Vec<MockDraw>>,
    selected_year: i32,
    selected_date: usize,
    date_hints: bool,
    /// Reads after a selection that still return the previous markup.
    stale_reads: u32,
    pending_stale: u32,
    /// Reads after navigation that return a page without controls.
    blank_reads: u32,
    pending_blank: u32,
    last_html: String,
    /// Reads after a selection whose controls are current but whose result
    /// region still shows the previous draw.
    region_lag: u32,
    pending_lag: u32,
    last_region: String,
    /// Set once a control was changed by script; `selected` attributes are
    /// then no longer rendered, as with a real DOM.
    scripted: bool,
    /// Date value → number of selections that render only two numbers.
    flaky: HashMap<String, u32>,
    rendering_flaky: bool,
    navigations: u32,
    choices: u32,
    screenshots: Vec<PathBuf>,
    quit: bool,
}

impl MockPage {
    fn default_year(&self) -> i32 {
        self.years.keys().next_back().copied().unwrap_or_default()
    }

    fn render(&self, region: &str) -> String {
        let year_options: String = self
            .years
            .keys()
            .rev()
            .map(|y| {
                let selected = if !self.scripted && *y == self.selected_year {
                    " selected"
                } else {
                    ""
                };
                format!(r#"<option value="{y}"{selected}>{y}</option>"#)
            })
            .collect();

        let draws = self.years.get(&self.selected_year).cloned().unwrap_or_default();
        let date_options: String = draws
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let selected = if !self.scripted && i == self.selected_date {
                    " selected"
                } else {
                    ""
                };
                format!(r#"<option value="{}"{selected}>{}</option>"#, d.value, d.label)
            })
            .collect();

        let day_attrs = if self.date_hints {
            r#"id="daySelect-select-2" aria-label="Ziehungsdatum""#
        } else {
            r#"id="select-2""#
        };

        format!(
            r#"<html><body>
<option value="">stray option outside any control</option>
<select id="selectedYear-select-1">{year_options}</select>
<label for="daySelect-select-2">Ziehung vom</label>
<select {day_attrs}><option value="">Bitte wählen</option>{date_options}</select>
{region}
</body></html>"#
        )
    }

    fn current_region(&self) -> String {
        let draws = self.years.get(&self.selected_year);
        match draws.and_then(|d| d.get(self.selected_date)) {
            Some(draw) => {
                let shown = if self.rendering_flaky { 2 } else { draw.numbers.len() };
                let numbers: Vec<String> =
                    draw.numbers.iter().take(shown).map(u8::to_string).collect();
                let bonus = draw.bonus.map(|b| b.to_string());
                result_region(numbers.iter().map(String::as_str), bonus.as_deref())
            }
            None => String::new(),
        }
    }

    fn changed(&mut self) {
        self.scripted = true;
        if !self.last_html.is_empty() {
            self.pending_stale = self.stale_reads;
        }
        if !self.last_region.is_empty() {
            self.pending_lag = self.region_lag;
        }
    }
}

/// Simulated archive page with year and day dropdowns.
///
/// Selections re-render asynchronously: for `stale_reads` reads after a
/// change, the previous markup is returned; for `region_lag` reads, the
/// controls are current but the result region is not.
#[derive(Clone)]
pub struct MockBrowser {
    page: Arc<Mutex<MockPage>>,
}

impl MockBrowser {
    pub fn new(years: Vec<(i32, Vec<MockDraw>)>) -> Self {
        let page = MockPage {
            years: years.into_iter().collect(),
            date_hints: true,
            ..Default::default()
        };
        Self {
            page: Arc::new(Mutex::new(page)),
        }
    }

    pub fn with_stale_reads(self, reads: u32) -> Self {
        self.page.lock().unwrap().stale_reads = reads;
        self
    }

    pub fn with_region_lag(self, reads: u32) -> Self {
        self.page.lock().unwrap().region_lag = reads;
        self
    }

    pub fn with_blank_reads(self, reads: u32) -> Self {
        self.page.lock().unwrap().blank_reads = reads;
        self
    }

    pub fn without_date_hints(self) -> Self {
        self.page.lock().unwrap().date_hints = false;
        self
    }

    /// The next `times` selections of `value` render an incomplete draw.
    pub fn with_flaky_date(self, value: &str, times: u32) -> Self {
        self.page
            .lock()
            .unwrap()
            .flaky
            .insert(value.to_string(), times);
        self
    }

    pub fn navigations(&self) -> u32 {
        self.page.lock().unwrap().navigations
    }

    pub fn choices(&self) -> u32 {
        self.page.lock().unwrap().choices
    }

    pub fn selected_year(&self) -> i32 {
        self.page.lock().unwrap().selected_year
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.page.lock().unwrap().screenshots.clone()
    }

    pub fn is_quit(&self) -> bool {
        self.page.lock().unwrap().quit
    }
}

impl BrowserSession for MockBrowser {
    async fn navigate(&self, _url: &str) -> Result<(), AppError> {
        let mut page = self.page.lock().unwrap();
        page.navigations += 1;
        page.selected_year = page.default_year();
        page.selected_date = 0;
        page.rendering_flaky = false;
        page.pending_stale = 0;
        page.pending_lag = 0;
        page.scripted = false;
        page.pending_blank = page.blank_reads;
        page.last_html.clear();
        page.last_region.clear();
        Ok(())
    }

    async fn page_source(&self) -> Result<String, AppError> {
        let mut page = self.page.lock().unwrap();
        if page.pending_blank > 0 {
            page.pending_blank -= 1;
            return Ok("<html><body><p>Lade…</p></body></html>".to_string());
        }
        if page.pending_stale > 0 {
            page.pending_stale -= 1;
            return Ok(page.last_html.clone());
        }
        let region = if page.pending_lag > 0 {
            page.pending_lag -= 1;
            page.last_region.clone()
        } else {
            let region = page.current_region();
            page.last_region = region.clone();
            region
        };
        let html = page.render(&region);
        page.last_html = html.clone();
        Ok(html)
    }

    async fn choose_option(&self, control: &ControlHandle, value: &str) -> Result<(), AppError> {
        let mut page = self.page.lock().unwrap();
        page.choices += 1;
        match control.index {
            0 => {
                let year: i32 = value
                    .parse()
                    .map_err(|_| AppError::ControlNotFound(format!("year option {value}")))?;
                if !page.years.contains_key(&year) {
                    return Err(AppError::ControlNotFound(format!("year option {value}")));
                }
                page.selected_year = year;
                page.selected_date = 0;
                page.rendering_flaky = false;
            }
            1 => {
                let year = page.selected_year;
                let index = page
                    .years
                    .get(&year)
                    .and_then(|draws| draws.iter().position(|d| d.value == value))
                    .ok_or_else(|| AppError::ControlNotFound(format!("date option {value}")))?;
                page.selected_date = index;
                let flaky = match page.flaky.get_mut(value) {
                    Some(remaining) if *remaining > 0 => {
                        *remaining -= 1;
                        true
                    }
                    _ => false,
                };
                page.rendering_flaky = flaky;
            }
            _ => {
                return Err(AppError::ControlNotFound(format!(
                    "{}[{}]",
                    control.selector, control.index
                )));
            }
        }
        page.changed();
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<(), AppError> {
        self.page
            .lock()
            .unwrap()
            .screenshots
            .push(path.to_path_buf());
        Ok(())
    }

    async fn quit(self) -> Result<(), AppError> {
        self.page.lock().unwrap().quit = true;
        Ok(())
    }
}

/// Two years of archive data: 2024 (three draws) and 2023 (two draws).
pub fn sample_archive() -> MockBrowser {
    MockBrowser::new(vec![
        (
            2024,
            vec![
                MockDraw::new("2024-05-08", "08.05. (Mittwoch)", &[3, 11, 22, 28, 34, 41], Some(7)),
                MockDraw::new("2024-05-04", "04.05. (Samstag)", &[5, 9, 13, 27, 38, 44], Some(2)),
                MockDraw::new("2024-05-01", "01.05. (Mittwoch)", &[1, 2, 3, 4, 5, 6], Some(0)),
            ],
        ),
        (
            2023,
            vec![
                MockDraw::new("2023-12-30", "30.12. (Samstag)", &[6, 12, 19, 33, 40, 48], Some(3)),
                MockDraw::new("2023-12-27", "27.12. (Mittwoch)", &[4, 8, 15, 16, 23, 42], Some(9)),
            ],
        ),
    ])
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that returns a configurable response.
#[derive(Clone)]
pub struct MockFetcher {
    /// Queue of responses. Each call pops the first element.
    /// If empty, returns a default HTML string.
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    calls: Arc<Mutex<u32>>,
}

impl MockFetcher {
    pub fn new(html: &str) -> Self {
        Self::with_responses(vec![Ok(html.to_string())])
    }

    pub fn with_responses(responses: Vec<Result<String, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, _url: &str) -> Result<String, AppError> {
        *self.calls.lock().unwrap() += 1;
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("<html><body>default</body></html>".to_string())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// In-memory draw store recording every persisted draw.
#[derive(Clone, Default)]
pub struct MockStore {
    pub draws: Arc<Mutex<Vec<Draw>>>,
    load_error: Arc<Mutex<Option<AppError>>>,
}

impl MockStore {
    pub fn with_draws(draws: Vec<Draw>) -> Self {
        Self {
            draws: Arc::new(Mutex::new(draws)),
            ..Default::default()
        }
    }

    pub fn with_load_error(error: AppError) -> Self {
        Self {
            load_error: Arc::new(Mutex::new(Some(error))),
            ..Default::default()
        }
    }
}

impl DrawStore for MockStore {
    fn load_existing(&self) -> Result<Vec<Draw>, AppError> {
        if let Some(e) = self.load_error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(self.draws.lock().unwrap().clone())
    }

    fn persist(&self, draw: &Draw) -> Result<PersistOutcome, AppError> {
        let existing = self.load_existing()?;
        if !is_novel(draw, &existing) {
            return Ok(PersistOutcome::default());
        }
        self.draws.lock().unwrap().push(draw.clone());
        Ok(PersistOutcome {
            json_written: true,
            sheet_written: true,
        })
    }

    fn persist_all(&self, batch: &[Draw]) -> Result<PersistSummary, AppError> {
        let mut summary = PersistSummary::default();
        for draw in batch {
            if self.persist(draw)?.any() {
                summary.json_added += 1;
                summary.sheet_added += 1;
            } else {
                summary.duplicates += 1;
            }
        }
        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// Reporter that keeps a textual trace of every event.
#[derive(Default)]
pub struct RecordingReporter {
    pub events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

impl HistoryReporter for RecordingReporter {
    fn report(&self, event: HistoryEvent<'_>) {
        let line = match event {
            HistoryEvent::YearStarted { year } => format!("year_started {year}"),
            HistoryEvent::DatesDiscovered { year, count } => format!("dates {year} {count}"),
            HistoryEvent::YearLoadFailed {
                year, will_retry, ..
            } => format!("year_load_failed {year} retry={will_retry}"),
            HistoryEvent::YearSkipped { year, .. } => format!("year_skipped {year}"),
            HistoryEvent::Unit { year, date, state } => format!("unit {year} {date} {state}"),
            HistoryEvent::AttemptFailed {
                year,
                date,
                attempt,
                will_retry,
                ..
            } => format!("attempt_failed {year} {date} #{attempt} retry={will_retry}"),
            HistoryEvent::YearFinished {
                year,
                draws,
                failures,
            } => format!("year_finished {year} {draws}/{failures}"),
        };
        self.events.lock().unwrap().push(line);
    }
}
