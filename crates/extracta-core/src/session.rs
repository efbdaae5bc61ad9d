//! End of a browser stage: the session is always released, and a failed
//! stage leaves the page it failed on behind for inspection.

use std::fs;
use std::path::Path;

use crate::error::AppError;
use crate::traits::BrowserSession;

/// Save the page source of an aborted run.
pub fn dump_debug_page(path: &Path, html: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, html)?;
    tracing::info!(path = %path.display(), "Page source saved");
    Ok(())
}

/// Quit `session` whatever `result` is. On failure the current page is
/// first written to `dump_path`.
///
/// Problems while dumping or quitting are logged; `result` is returned
/// unchanged.
pub async fn finish_session<B: BrowserSession, T, E>(
    session: B,
    dump_path: &Path,
    result: Result<T, E>,
) -> Result<T, E> {
    if result.is_err() {
        match session.page_source().await {
            Ok(html) => {
                if let Err(e) = dump_debug_page(dump_path, &html) {
                    tracing::warn!(error = %e, "Could not save page source");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Could not read page source"),
        }
    }

    if let Err(e) = session.quit().await {
        tracing::warn!(error = %e, "Browser did not close cleanly");
    }
    result
}
