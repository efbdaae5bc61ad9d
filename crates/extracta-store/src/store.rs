use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use extracta_core::error::AppError;
use extracta_core::models::{Draw, is_novel};
use extracta_core::traits::{DrawStore, PersistOutcome, PersistSummary};

use crate::config::StoreConfig;

/// Column header of the tabular store.
pub const SHEET_HEADER: [&str; 4] = ["Date", "Numbers", "BonusNumber", "PayoutTiers"];

/// Draw store backed by a JSON file and a CSV sheet, both keyed by date.
///
/// The two files are checked and written independently: a draw missing
/// from only one of them is appended to that one. Each write rewrites the
/// whole file; an interruption between the two writes leaves them out of
/// step until the next run fills the gap.
#[derive(Debug, Clone)]
pub struct FileDrawStore {
    json_path: PathBuf,
    sheet_path: PathBuf,
}

impl FileDrawStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self::with_paths(config.json_path(), config.sheet_path())
    }

    pub fn with_paths(json_path: impl Into<PathBuf>, sheet_path: impl Into<PathBuf>) -> Self {
        Self {
            json_path: json_path.into(),
            sheet_path: sheet_path.into(),
        }
    }

    pub fn json_path(&self) -> &Path {
        &self.json_path
    }

    pub fn sheet_path(&self) -> &Path {
        &self.sheet_path
    }

    /// Rows of the sheet (without header); empty if it does not exist yet.
    pub fn load_sheet(&self) -> Result<Vec<csv::StringRecord>, AppError> {
        let raw = match read_optional(&self.sheet_path)? {
            Some(raw) => raw,
            None => return Ok(Vec::new()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(raw.as_bytes());
        reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| sheet_error(&self.sheet_path, e))
    }

    fn write_json(&self, draws: &[Draw]) -> Result<(), AppError> {
        ensure_parent(&self.json_path)?;
        let json = serde_json::to_string_pretty(draws)?;
        fs::write(&self.json_path, json)?;
        tracing::debug!(path = %self.json_path.display(), draws = draws.len(), "JSON store written");
        Ok(())
    }

    fn write_sheet(&self, rows: &[csv::StringRecord], new: &[&Draw]) -> Result<(), AppError> {
        ensure_parent(&self.sheet_path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.sheet_path)
            .map_err(|e| sheet_error(&self.sheet_path, e))?;

        writer
            .write_record(SHEET_HEADER)
            .map_err(|e| sheet_error(&self.sheet_path, e))?;
        for row in rows {
            writer
                .write_record(row)
                .map_err(|e| sheet_error(&self.sheet_path, e))?;
        }
        for draw in new {
            writer
                .write_record(sheet_row(draw)?)
                .map_err(|e| sheet_error(&self.sheet_path, e))?;
        }
        writer.flush()?;
        tracing::debug!(path = %self.sheet_path.display(), rows = rows.len() + new.len(), "Sheet written");
        Ok(())
    }
}

impl DrawStore for FileDrawStore {
    fn load_existing(&self) -> Result<Vec<Draw>, AppError> {
        match read_optional(&self.json_path)? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    fn persist(&self, draw: &Draw) -> Result<PersistOutcome, AppError> {
        let summary = self.persist_all(std::slice::from_ref(draw))?;
        Ok(PersistOutcome {
            json_written: summary.json_added > 0,
            sheet_written: summary.sheet_added > 0,
        })
    }

    fn persist_all(&self, draws: &[Draw]) -> Result<PersistSummary, AppError> {
        let mut summary = PersistSummary::default();

        // JSON store
        let mut existing = self.load_existing()?;
        let before = existing.len();
        let mut json_new = Vec::new();
        for draw in draws {
            if is_novel(draw, &existing) {
                existing.push(draw.clone());
                json_new.push(draw.date.as_str());
            }
        }
        summary.json_added = existing.len() - before;
        if summary.json_added > 0 {
            self.write_json(&existing)?;
        }

        // Sheet, deduplicated on its first column
        let rows = self.load_sheet()?;
        let mut sheet_dates: HashSet<String> = rows
            .iter()
            .filter_map(|r| r.get(0).map(str::to_string))
            .collect();
        let mut sheet_new: Vec<&Draw> = Vec::new();
        for draw in draws {
            if sheet_dates.insert(draw.date.clone()) {
                sheet_new.push(draw);
            }
        }
        summary.sheet_added = sheet_new.len();
        if !sheet_new.is_empty() {
            self.write_sheet(&rows, &sheet_new)?;
        }

        let added: HashSet<&str> = json_new
            .iter()
            .copied()
            .chain(sheet_new.iter().map(|d| d.date.as_str()))
            .collect();
        summary.duplicates = draws.len() - added.len();

        tracing::info!(
            json_added = summary.json_added,
            sheet_added = summary.sheet_added,
            duplicates = summary.duplicates,
            "Draws persisted"
        );
        Ok(summary)
    }
}

/// One sheet row: date, numbers joined with `", "`, bonus, payout tiers as JSON.
pub fn sheet_row(draw: &Draw) -> Result<[String; 4], AppError> {
    let numbers = draw
        .numbers
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Ok([
        draw.date.clone(),
        numbers,
        draw.bonus_number.map(|b| b.to_string()).unwrap_or_default(),
        serde_json::to_string(&draw.payout_tiers)?,
    ])
}

/// File contents, or `None` if the file (or its directory) does not exist.
pub(crate) fn read_optional(path: &Path) -> Result<Option<String>, AppError> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::StoreUnavailable(format!(
            "{}: {e}",
            path.display()
        ))),
    }
}

pub(crate) fn ensure_parent(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub(crate) fn sheet_error(path: &Path, e: csv::Error) -> AppError {
    AppError::StoreUnavailable(format!("{}: {e}", path.display()))
}
