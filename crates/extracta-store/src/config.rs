use std::path::{Path, PathBuf};

use extracta_core::AppError;

/// Where the persisted stores and run reports live.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Read configuration from environment variables.
    ///
    /// - `EXTRACTA_DATA_DIR` (optional, defaults to `data`)
    pub fn from_env() -> Result<Self, AppError> {
        match std::env::var("EXTRACTA_DATA_DIR") {
            Err(_) => Ok(Self::default()),
            Ok(raw) if raw.trim().is_empty() => Err(AppError::ConfigError(
                "EXTRACTA_DATA_DIR is set but empty".into(),
            )),
            Ok(raw) => Ok(Self::new(raw.trim())),
        }
    }

    /// JSON dedup store.
    pub fn json_path(&self) -> PathBuf {
        self.data_dir.join("draws.json")
    }

    /// Tabular dedup store.
    pub fn sheet_path(&self) -> PathBuf {
        self.data_dir.join("draws.csv")
    }

    /// Per-year archive files.
    pub fn history_dir(&self) -> PathBuf {
        self.data_dir.join("history")
    }

    pub fn screenshot_dir(&self) -> PathBuf {
        self.data_dir.join("screenshots")
    }

    /// Page source dumped when a run aborts.
    pub fn debug_dump_path(&self) -> PathBuf {
        self.data_dir.join("debug_output.html")
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
