//! Drives the year/date controls of the results page.
//!
//! The page renders asynchronously after every selection, so nothing here
//! trusts a fixed delay: every change is confirmed by polling the rendered
//! markup until it differs from a snapshot taken before the interaction.

use std::collections::HashMap;
use std::time::Duration;

use scraper::Html;
use tokio::time::Instant;

use crate::adapter::PageAdapter;
use crate::error::AppError;
use crate::extract::{FieldExtractor, element_text, select_all};
use crate::models::DateOption;
use crate::traits::{BrowserSession, ControlHandle};

/// Timing of the navigator's bounded waits.
#[derive(Debug, Clone)]
pub struct NavigatorConfig {
    /// Upper bound for any wait on page content.
    pub refresh_timeout: Duration,
    /// Pause between two reads of the page while waiting.
    pub poll_interval: Duration,
    /// Extra pause once a change has been observed.
    pub settle_delay: Duration,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            refresh_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
            settle_delay: Duration::from_millis(500),
        }
    }
}

/// A selection control as found in the rendered markup.
#[derive(Debug, Clone)]
struct Control {
    handle: ControlHandle,
    /// Lower-cased `id`, `name`, `aria-label`, `class` and `<label for>` text.
    descriptor: String,
    /// Value of the option carrying `selected`, else the first non-empty one.
    /// Values chosen by script are not reflected in the markup, so this only
    /// describes a freshly loaded page.
    selected: Option<String>,
    /// All options, unfiltered.
    options: Vec<DateOption>,
}

/// Brings the page into the state where a given year and date are rendered.
pub struct Navigator<'a, B: BrowserSession, A: PageAdapter> {
    browser: &'a B,
    adapter: &'a A,
    extractor: FieldExtractor<'a, A>,
    config: NavigatorConfig,
}

impl<'a, B: BrowserSession, A: PageAdapter> Navigator<'a, B, A> {
    pub fn new(browser: &'a B, adapter: &'a A, config: NavigatorConfig) -> Self {
        Self {
            browser,
            adapter,
            extractor: FieldExtractor::new(adapter),
            config,
        }
    }

    /// Load the adapter's page and wait until its controls are rendered.
    pub async fn open(&self) -> Result<(), AppError> {
        self.browser.navigate(self.adapter.url()).await?;

        if let Some(ready) = self.adapter.ready_selector() {
            self.poll_until("page to render", |html| {
                let doc = Html::parse_document(html);
                (!select_all(doc.root_element(), ready).is_empty()).then_some(())
            })
            .await?;
        }
        Ok(())
    }

    /// Current rendered markup.
    pub async fn page_source(&self) -> Result<String, AppError> {
        self.browser.page_source().await
    }

    /// Text of the result region as currently rendered.
    pub async fn snapshot(&self) -> Result<String, AppError> {
        let html = self.browser.page_source().await?;
        Ok(self.extractor.snapshot(&html))
    }

    /// Select `year` in whichever control offers it.
    ///
    /// The year control is recognised by containing an option whose visible
    /// text equals the year, not by a fixed identifier. Returns `false` when
    /// the year is already selected, which is only reliable right after
    /// [`open`](Self::open). After a change, waits until the date control
    /// lists a different set of options; the result region may still show
    /// the previous year's draw at that point.
    pub async fn select_year(&self, year: i32) -> Result<bool, AppError> {
        let html = self.browser.page_source().await?;
        let controls = self.controls(&html);
        let target = year.to_string();

        let (control, option) = controls
            .iter()
            .find_map(|c| {
                c.options
                    .iter()
                    .find(|o| o.label == target)
                    .map(|o| (c, o))
            })
            .ok_or_else(|| {
                AppError::ControlNotFound(format!("no selection control offers year {year}"))
            })?;

        if control.selected.as_deref() == Some(option.value.as_str()) {
            tracing::debug!(year, "Year already selected");
            return Ok(false);
        }

        let before = self.date_values(&controls);
        self.browser
            .choose_option(&control.handle, &option.value)
            .await?;
        tracing::debug!(year, "Year selected");

        self.poll_until(&format!("date options of {year}"), |html| {
            let now = self.date_values(&self.controls(html));
            match now {
                Some(values) if !values.is_empty() && Some(&values) != before.as_ref() => Some(()),
                _ => None,
            }
        })
        .await?;

        tokio::time::sleep(self.config.settle_delay).await;
        Ok(true)
    }

    /// Selectable draw dates of the currently selected year.
    ///
    /// Options with an empty value or label are ignored.
    pub async fn date_options(&self) -> Result<Vec<DateOption>, AppError> {
        let html = self.browser.page_source().await?;
        let controls = self.controls(&html);
        let control = self
            .date_control(&controls)
            .ok_or_else(|| AppError::ControlNotFound("no date selection control".into()))?;

        let options: Vec<DateOption> = control
            .options
            .iter()
            .filter(|o| !o.value.is_empty() && !o.label.is_empty())
            .cloned()
            .collect();

        if options.is_empty() {
            return Err(AppError::ControlNotFound(
                "date selection control has no options".into(),
            ));
        }
        Ok(options)
    }

    /// Choose `option` in the date control and dispatch the change.
    ///
    /// Does not wait for the result region; pair it with
    /// [`await_refresh`](Self::await_refresh).
    pub async fn select_date(&self, option: &DateOption) -> Result<(), AppError> {
        let html = self.browser.page_source().await?;
        let controls = self.controls(&html);
        let control = self
            .date_control(&controls)
            .ok_or_else(|| AppError::ControlNotFound("no date selection control".into()))?;

        if !control.options.iter().any(|o| o.value == option.value) {
            return Err(AppError::ControlNotFound(format!(
                "date option '{}' ({})",
                option.label, option.value
            )));
        }

        self.browser
            .choose_option(&control.handle, &option.value)
            .await
    }

    /// Wait until the result region is non-empty and differs from
    /// `previous_snapshot`; returns the new snapshot.
    pub async fn await_refresh(&self, previous_snapshot: &str) -> Result<String, AppError> {
        let snapshot = self
            .poll_until("draw refresh", |html| {
                let now = self.extractor.snapshot(html);
                (!now.is_empty() && now != previous_snapshot).then_some(now)
            })
            .await?;

        tokio::time::sleep(self.config.settle_delay).await;
        Ok(snapshot)
    }

    /// Load the page, select `year` and `option`, and return the markup once
    /// the selected draw is rendered.
    ///
    /// The region is snapshotted on the fresh page, before any selection.
    /// A year change is confirmed by the region changing too, after which the
    /// year's first listed date is the one shown. The draw is accepted once
    /// the region differs from the last confirmed snapshot.
    pub async fn show_draw(&self, year: i32, option: &DateOption) -> Result<String, AppError> {
        self.open().await?;

        let html = self.browser.page_source().await?;
        let mut shown = self.extractor.snapshot(&html);
        let mut shown_date = self
            .date_control(&self.controls(&html))
            .and_then(|c| c.selected.clone());

        if self.select_year(year).await? {
            match self.await_refresh(&shown).await {
                Ok(snapshot) => {
                    shown = snapshot;
                    shown_date = self.date_options().await?.first().map(|o| o.value.clone());
                }
                // The region kept the old draw; only the date choice redraws it.
                Err(AppError::TimeoutExceeded { .. }) => {
                    tracing::debug!(year, "Result region unchanged after year switch");
                    shown_date = None;
                }
                Err(e) => return Err(e),
            }
        }

        if shown_date.as_deref() == Some(option.value.as_str()) {
            if shown.is_empty() {
                self.await_refresh("").await?;
            }
        } else {
            self.select_date(option).await?;
            self.await_refresh(&shown).await?;
        }

        self.browser.page_source().await
    }

    /// First date option of `year` whose label contains `date`.
    pub async fn find_date_option(
        &self,
        year: i32,
        date: &str,
    ) -> Result<Option<DateOption>, AppError> {
        self.open().await?;
        self.select_year(year).await?;
        let wanted = date.trim();
        Ok(self
            .date_options()
            .await?
            .into_iter()
            .find(|o| o.label.contains(wanted)))
    }

    /// Poll the page until `probe` yields a value, bounded by the refresh timeout.
    async fn poll_until<T>(
        &self,
        what: &str,
        mut probe: impl FnMut(&str) -> Option<T>,
    ) -> Result<T, AppError> {
        let deadline = Instant::now() + self.config.refresh_timeout;
        loop {
            let html = self.browser.page_source().await?;
            if let Some(value) = probe(&html) {
                return Ok(value);
            }
            if Instant::now() >= deadline {
                let timeout = self.config.refresh_timeout;
                return Err(AppError::TimeoutExceeded {
                    what: what.to_string(),
                    seconds: timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0),
                });
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    fn controls(&self, html: &str) -> Vec<Control> {
        let doc = Html::parse_document(html);
        let root = doc.root_element();

        let labels: HashMap<String, String> = select_all(root, "label[for]")
            .into_iter()
            .filter_map(|label| {
                let target = label.value().attr("for")?;
                Some((target.to_string(), element_text(label)))
            })
            .collect();

        let selector = self.adapter.control_selector();
        select_all(root, selector)
            .into_iter()
            .enumerate()
            .map(|(index, element)| {
                let attrs = element.value();
                let mut descriptor: Vec<&str> = ["id", "name", "aria-label", "class"]
                    .iter()
                    .filter_map(|a| attrs.attr(a))
                    .collect();
                if let Some(text) = attrs.attr("id").and_then(|id| labels.get(id)) {
                    descriptor.push(text);
                }

                let mut marked = None;
                let options: Vec<DateOption> = select_all(element, "option")
                    .into_iter()
                    .map(|option| {
                        let label = element_text(option);
                        let value = option
                            .value()
                            .attr("value")
                            .map(|v| v.trim().to_string())
                            .unwrap_or_else(|| label.clone());
                        if marked.is_none() && option.value().attr("selected").is_some() {
                            marked = Some(value.clone());
                        }
                        DateOption { value, label }
                    })
                    .collect();

                Control {
                    handle: ControlHandle::new(selector, index),
                    descriptor: descriptor.join(" ").to_lowercase(),
                    selected: marked.or_else(|| {
                        options
                            .iter()
                            .find(|o| !o.value.is_empty())
                            .map(|o| o.value.clone())
                    }),
                    options,
                }
            })
            .collect()
    }

    fn date_control<'c>(&self, controls: &'c [Control]) -> Option<&'c Control> {
        let hints = self.adapter.date_control_hints();
        controls
            .iter()
            .find(|c| hints.iter().any(|h| c.descriptor.contains(&h.to_lowercase())))
    }

    fn date_values(&self, controls: &[Control]) -> Option<Vec<String>> {
        self.date_control(controls)
            .map(|c| c.options.iter().map(|o| o.value.clone()).collect())
    }
}
