use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of balls drawn in "6 aus 49".
pub const NUMBERS_PER_DRAW: usize = 6;

/// Minimum count of numbers for a draw to count as complete.
pub const MIN_COMPLETE_NUMBERS: usize = 3;

/// Valid range of a drawn number.
pub const NUMBER_RANGE: std::ops::RangeInclusive<u8> = 1..=49;

/// Valid range of the bonus number ("Superzahl").
pub const BONUS_RANGE: std::ops::RangeInclusive<u8> = 0..=9;

/// Date marker on a [`FailedDraw`] standing for a whole year that could not be loaded.
pub const WHOLE_YEAR: &str = "*";

/// One lottery drawing.
///
/// `date` is kept exactly as the source page displays it: an ISO date on the
/// current-draw page, a localized `DD.MM. (Weekday)` label in the archive.
/// It is the deduplication key, so no normalization happens here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub date: String,
    pub year: i32,
    /// Drawn numbers in draw order (not sorted).
    pub numbers: Vec<u8>,
    pub bonus_number: Option<u8>,
    /// Tier label → currency-formatted amount.
    #[serde(default)]
    pub payout_tiers: BTreeMap<String, String>,
}

impl Draw {
    /// A draw is complete once at least the first three numbers are known.
    pub fn is_complete(&self) -> bool {
        self.numbers.len() >= MIN_COMPLETE_NUMBERS
    }

    /// Calendar date of the draw, if the label can be interpreted.
    ///
    /// Accepts `YYYY-MM-DD` as well as `DD.MM.` labels (the year then comes
    /// from [`Draw::year`]).
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        parse_draw_date(&self.date, self.year)
    }
}

/// True iff no record in `existing` shares the draw's date.
///
/// Comparison is exact; other fields are ignored.
pub fn is_novel(draw: &Draw, existing: &[Draw]) -> bool {
    existing.iter().all(|d| d.date != draw.date)
}

/// Interpret a draw date label as a calendar date.
pub fn parse_draw_date(label: &str, year: i32) -> Option<NaiveDate> {
    let label = label.trim();
    if let Ok(date) = NaiveDate::parse_from_str(label.get(..10).unwrap_or(label), "%Y-%m-%d") {
        return Some(date);
    }

    // "21.06. (Mittwoch)" → day 21, month 06
    let mut parts = label.split('.');
    let day = parts.next()?.trim().parse::<u32>().ok()?;
    let month = parts.next()?.trim().parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// A (year, date) unit that did not yield a complete draw after retrying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDraw {
    pub year: i32,
    pub date: String,
    pub reason: String,
    /// Internal value of the date option, when it was known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_value: Option<String>,
}

impl FailedDraw {
    /// Failure record for a year whose date list could not be loaded at all.
    pub fn whole_year(year: i32, reason: impl Into<String>) -> Self {
        Self {
            year,
            date: WHOLE_YEAR.to_string(),
            reason: reason.into(),
            option_value: None,
        }
    }

    pub fn is_whole_year(&self) -> bool {
        self.date == WHOLE_YEAR
    }
}

/// One entry of the date selection control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateOption {
    /// Internal option value used for selection.
    pub value: String,
    /// Visible text, e.g. `"21.06. (Mittwoch)"`.
    pub label: String,
}

/// How often a number has been drawn, from the statistics page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFrequency {
    pub number: u8,
    pub count: u32,
}

/// Screenshot taken while reprocessing a failed draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotRecord {
    pub year: i32,
    pub date: String,
    pub option_value: String,
    pub screenshot: String,
}
