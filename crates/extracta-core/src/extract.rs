//! Field extraction from rendered markup.
//!
//! Every function here fails soft: a missing container, an unparsable
//! number or a broken payout row makes that field absent instead of
//! aborting the extraction. Completeness is judged by the caller.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Selector};

use crate::adapter::{PageAdapter, StatisticsPage};
use crate::error::AppError;
use crate::models::{BONUS_RANGE, Draw, NUMBER_RANGE, NUMBERS_PER_DRAW, NumberFrequency};

/// Reads draw fields through a [`PageAdapter`].
pub struct FieldExtractor<'a, A: PageAdapter> {
    adapter: &'a A,
}

impl<'a, A: PageAdapter> FieldExtractor<'a, A> {
    pub fn new(adapter: &'a A) -> Self {
        Self { adapter }
    }

    /// Numbers of the primary result container in DOM order.
    ///
    /// Returns an empty vector when the container is absent. Reading stops at
    /// the first item that is not a valid number, so positions never shift.
    pub fn extract_numbers(&self, html: &str) -> Vec<u8> {
        self.numbers_in(&Html::parse_document(html))
    }

    /// Bonus number from the secondary container, if present and valid.
    pub fn extract_bonus(&self, html: &str) -> Option<u8> {
        self.bonus_in(&Html::parse_document(html))
    }

    /// Tier label → amount, skipping rows that lack either cell.
    pub fn extract_payout_table(&self, html: &str) -> BTreeMap<String, String> {
        self.payouts_in(&Html::parse_document(html))
    }

    /// Draw date as rendered by the page, if the adapter knows where it is.
    pub fn extract_draw_date(&self, html: &str) -> Option<String> {
        self.date_in(&Html::parse_document(html))
    }

    /// Assemble a (possibly partial) draw from the rendered page.
    pub fn extract_draw(&self, html: &str, year: i32, date: &str) -> Draw {
        let doc = Html::parse_document(html);
        Draw {
            date: date.to_string(),
            year,
            numbers: self.numbers_in(&doc),
            bonus_number: self.bonus_in(&doc),
            payout_tiers: self.payouts_in(&doc),
        }
    }

    /// Text of the result region: every number item of every result
    /// container, space-separated.
    ///
    /// Compared before and after a selection to detect that the newly
    /// selected draw has actually been rendered.
    pub fn snapshot(&self, html: &str) -> String {
        let doc = Html::parse_document(html);
        select_all(doc.root_element(), self.adapter.numbers_container())
            .into_iter()
            .flat_map(|container| select_all(container, self.adapter.number_item()))
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn numbers_in(&self, doc: &Html) -> Vec<u8> {
        let Some(container) = select_all(doc.root_element(), self.adapter.numbers_container())
            .into_iter()
            .next()
        else {
            return Vec::new();
        };

        select_all(container, self.adapter.number_item())
            .into_iter()
            .map(|item| parse_in_range(&element_text(item), &NUMBER_RANGE))
            .take_while(Option::is_some)
            .flatten()
            .take(NUMBERS_PER_DRAW)
            .collect()
    }

    fn bonus_in(&self, doc: &Html) -> Option<u8> {
        let locator = self.adapter.bonus_locator();
        let container = select_all(doc.root_element(), locator.container)
            .into_iter()
            .nth(locator.nth)?;
        let item = select_all(container, locator.item).into_iter().next()?;
        parse_in_range(&element_text(item), &BONUS_RANGE)
    }

    fn payouts_in(&self, doc: &Html) -> BTreeMap<String, String> {
        let mut tiers = BTreeMap::new();
        for row in select_all(doc.root_element(), self.adapter.payout_row()) {
            let label = select_all(row, self.adapter.payout_label())
                .into_iter()
                .next()
                .map(element_text);
            let amount = select_all(row, self.adapter.payout_amount())
                .into_iter()
                .next()
                .map(element_text);

            match (label, amount) {
                (Some(label), Some(amount)) if !label.is_empty() && !amount.is_empty() => {
                    tiers.insert(label, amount);
                }
                _ => tracing::debug!("Skipping incomplete payout row"),
            }
        }
        tiers
    }

    fn date_in(&self, doc: &Html) -> Option<String> {
        let locator = self.adapter.date_locator()?;
        let element = select_all(doc.root_element(), locator.selector)
            .into_iter()
            .next()?;
        let value = match locator.attribute {
            Some(attr) => element.value().attr(attr)?.trim().to_string(),
            None => element_text(element),
        };
        (!value.is_empty()).then_some(value)
    }
}

/// Parse the statistics page into per-number draw counts, sorted by number.
///
/// Bars that fail to parse are skipped; a page without any bar is an error
/// because it means the layout changed.
pub fn extract_frequencies(
    html: &str,
    page: &StatisticsPage,
) -> Result<Vec<NumberFrequency>, AppError> {
    let doc = Html::parse_document(html);
    let bars = select_all(doc.root_element(), page.bar);
    if bars.is_empty() {
        return Err(AppError::ExtractionIncomplete(format!(
            "no statistics bars matching '{}'",
            page.bar
        )));
    }

    let mut frequencies: Vec<NumberFrequency> = bars
        .into_iter()
        .filter_map(|bar| {
            let number = select_all(bar, page.ball)
                .into_iter()
                .next()
                .and_then(|ball| ball.value().attr("aria-label"))
                .and_then(|label| parse_in_range(label, &NUMBER_RANGE));
            let count = select_all(bar, page.count)
                .into_iter()
                .next()
                .and_then(|c| element_text(c).replace('×', "").trim().parse::<u32>().ok());

            match (number, count) {
                (Some(number), Some(count)) => Some(NumberFrequency { number, count }),
                _ => {
                    tracing::warn!("Skipping unparsable statistics bar");
                    None
                }
            }
        })
        .collect();

    frequencies.sort_by_key(|f| f.number);
    Ok(frequencies)
}

/// Compile a selector, logging and returning `None` if the adapter's CSS is invalid.
pub(crate) fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!(selector = %css, error = ?e, "Invalid selector");
            None
        }
    }
}

/// All descendants of `scope` matching `css`, in document order.
pub(crate) fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match parse_selector(css) {
        Some(selector) => scope.select(&selector).collect(),
        None => Vec::new(),
    }
}

/// Visible text of an element, trimmed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn parse_in_range(text: &str, range: &std::ops::RangeInclusive<u8>) -> Option<u8> {
    text.trim().parse::<u8>().ok().filter(|n| range.contains(n))
}
