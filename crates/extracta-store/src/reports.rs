//! Run reports written next to the dedup store: per-year archives, the
//! aggregate export, failure reports, screenshot manifests and number
//! statistics.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use extracta_core::error::AppError;
use extracta_core::models::{Draw, FailedDraw, NUMBERS_PER_DRAW, NumberFrequency, ScreenshotRecord};
use serde::Serialize;

use crate::store::{ensure_parent, read_optional, sheet_error};

/// Timestamp format used in report file names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

const FAILURE_PREFIX: &str = "failed_draws_";

pub fn timestamp(now: NaiveDateTime) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

fn write_pretty_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    ensure_parent(path)?;
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Sort by year, then by the calendar date parsed from the label.
/// Labels that cannot be parsed go last within their year.
pub fn sort_draws(draws: &mut [Draw]) {
    draws.sort_by_key(|d| {
        let date = d.calendar_date();
        (d.year, date.is_none(), date)
    });
}

/// Write `history/draws_<year>.json`, replacing any previous file.
pub fn write_year_file(history_dir: &Path, year: i32, draws: &[Draw]) -> Result<PathBuf, AppError> {
    let path = history_dir.join(format!("draws_{year}.json"));
    let mut sorted = draws.to_vec();
    sort_draws(&mut sorted);
    write_pretty_json(&path, &sorted)?;
    tracing::info!(year, draws = sorted.len(), path = %path.display(), "Year file written");
    Ok(path)
}

/// Write `all_draws_<timestamp>.csv` with one column per drawn number.
pub fn write_aggregate_export(
    dir: &Path,
    draws: &[Draw],
    now: NaiveDateTime,
) -> Result<PathBuf, AppError> {
    let path = dir.join(format!("all_draws_{}.csv", timestamp(now)));
    ensure_parent(&path)?;

    let mut sorted = draws.to_vec();
    sort_draws(&mut sorted);

    let mut writer = csv::Writer::from_path(&path).map_err(|e| sheet_error(&path, e))?;
    let mut header = vec!["Date".to_string(), "Year".to_string()];
    header.extend((1..=NUMBERS_PER_DRAW).map(|i| format!("Number{i}")));
    header.push("BonusNumber".to_string());
    writer
        .write_record(&header)
        .map_err(|e| sheet_error(&path, e))?;

    for draw in &sorted {
        let mut row = vec![draw.date.clone(), draw.year.to_string()];
        row.extend((0..NUMBERS_PER_DRAW).map(|i| {
            draw.numbers
                .get(i)
                .map(u8::to_string)
                .unwrap_or_default()
        }));
        row.push(draw.bonus_number.map(|b| b.to_string()).unwrap_or_default());
        writer.write_record(&row).map_err(|e| sheet_error(&path, e))?;
    }
    writer.flush()?;

    tracing::info!(draws = sorted.len(), path = %path.display(), "Aggregate export written");
    Ok(path)
}

/// Write `failed_draws_<timestamp>.json`; nothing is written for an empty list.
pub fn write_failure_report(
    dir: &Path,
    failures: &[FailedDraw],
    now: NaiveDateTime,
) -> Result<Option<PathBuf>, AppError> {
    if failures.is_empty() {
        return Ok(None);
    }
    let path = dir.join(format!("{FAILURE_PREFIX}{}.json", timestamp(now)));
    write_pretty_json(&path, failures)?;
    tracing::warn!(failures = failures.len(), path = %path.display(), "Failure report written");
    Ok(Some(path))
}

pub fn read_failure_report(path: &Path) -> Result<Vec<FailedDraw>, AppError> {
    let raw = read_optional(path)?
        .ok_or_else(|| AppError::StoreUnavailable(format!("{} not found", path.display())))?;
    Ok(serde_json::from_str(&raw)?)
}

/// Most recent failure report in `dir`, judged by the timestamp in its name.
///
/// Files whose name does not carry a valid timestamp are ignored. A missing
/// directory yields `None`.
pub fn latest_failure_report(dir: &Path) -> Result<Option<PathBuf>, AppError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(AppError::StoreUnavailable(format!("{}: {e}", dir.display())));
        }
    };

    let mut latest: Option<(NaiveDateTime, PathBuf)> = None;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(stamp) = name
            .to_str()
            .and_then(|n| n.strip_prefix(FAILURE_PREFIX))
            .and_then(|n| n.strip_suffix(".json"))
            .and_then(|ts| NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).ok())
        else {
            continue;
        };
        if latest.as_ref().is_none_or(|(best, _)| stamp > *best) {
            latest = Some((stamp, entry.path()));
        }
    }
    Ok(latest.map(|(_, path)| path))
}

/// Write `screenshots_<timestamp>.json`.
pub fn write_screenshot_manifest(
    dir: &Path,
    records: &[ScreenshotRecord],
    now: NaiveDateTime,
) -> Result<PathBuf, AppError> {
    let path = dir.join(format!("screenshots_{}.json", timestamp(now)));
    write_pretty_json(&path, records)?;
    tracing::info!(screenshots = records.len(), path = %path.display(), "Screenshot manifest written");
    Ok(path)
}

/// Write `frequency.json` and `frequency.csv`; returns both paths.
pub fn write_frequencies(
    dir: &Path,
    frequencies: &[NumberFrequency],
) -> Result<(PathBuf, PathBuf), AppError> {
    let json_path = dir.join("frequency.json");
    write_pretty_json(&json_path, frequencies)?;

    let csv_path = dir.join("frequency.csv");
    let mut writer = csv::Writer::from_path(&csv_path).map_err(|e| sheet_error(&csv_path, e))?;
    writer
        .write_record(["Number", "Count"])
        .map_err(|e| sheet_error(&csv_path, e))?;
    for f in frequencies {
        writer
            .write_record([f.number.to_string(), f.count.to_string()])
            .map_err(|e| sheet_error(&csv_path, e))?;
    }
    writer.flush()?;

    tracing::info!(numbers = frequencies.len(), "Frequency exports written");
    Ok((json_path, csv_path))
}
