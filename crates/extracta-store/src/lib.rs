pub mod config;
pub mod reports;
pub mod store;

pub use config::StoreConfig;
pub use reports::{
    latest_failure_report, read_failure_report, write_aggregate_export,
    write_failure_report, write_frequencies, write_screenshot_manifest, write_year_file,
};
pub use store::FileDrawStore;
