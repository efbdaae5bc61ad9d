use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::navigator::NavigatorConfig;
use crate::retry::RetryPolicy;

/// Browser driven over the Chrome DevTools Protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrowserKind {
    #[default]
    Chrome,
    Chromium,
    Edge,
}

impl FromStr for BrowserKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" => Ok(Self::Chrome),
            "chromium" => Ok(Self::Chromium),
            "edge" | "msedge" => Ok(Self::Edge),
            "firefox" => Err(AppError::ConfigError(
                "Firefox has no DevTools Protocol backend; use chrome, chromium or edge".into(),
            )),
            other => Err(AppError::ConfigError(format!(
                "Unknown browser '{other}': expected chrome, chromium or edge"
            ))),
        }
    }
}

/// Browser, timing and retry settings of a scrape run.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub browser: BrowserKind,
    pub headless: bool,
    pub navigator: NavigatorConfig,
    /// Bound for a single page load.
    pub page_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::default(),
            headless: true,
            navigator: NavigatorConfig::default(),
            page_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl ScraperConfig {
    /// Read configuration from environment variables.
    ///
    /// - `EXTRACTA_BROWSER` (optional, defaults to `chrome`)
    /// - `EXTRACTA_HEADLESS` (optional, defaults to `true`)
    /// - `EXTRACTA_REFRESH_TIMEOUT_SECS` (optional, defaults to 10)
    /// - `EXTRACTA_POLL_INTERVAL_MS` (optional, defaults to 250)
    /// - `EXTRACTA_SETTLE_DELAY_MS` (optional, defaults to 500)
    /// - `EXTRACTA_PAGE_TIMEOUT_SECS` (optional, defaults to 30)
    /// - `EXTRACTA_MAX_ATTEMPTS` (optional, defaults to 2)
    /// - `EXTRACTA_RETRY_BACKOFF_SECS` (optional, defaults to 2)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ScraperConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let browser = match lookup("EXTRACTA_BROWSER") {
            Some(raw) => raw.parse()?,
            None => defaults.browser,
        };

        let headless = match lookup("EXTRACTA_HEADLESS") {
            None => defaults.headless,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(AppError::ConfigError(format!(
                        "Invalid EXTRACTA_HEADLESS '{raw}': must be true or false"
                    )));
                }
            },
        };

        let refresh_secs = parse_number(&lookup, "EXTRACTA_REFRESH_TIMEOUT_SECS", 10)?;
        let poll_ms = parse_number(&lookup, "EXTRACTA_POLL_INTERVAL_MS", 250)?;
        let settle_ms = parse_number(&lookup, "EXTRACTA_SETTLE_DELAY_MS", 500)?;
        let page_secs = parse_number(&lookup, "EXTRACTA_PAGE_TIMEOUT_SECS", 30)?;
        let max_attempts = parse_number(&lookup, "EXTRACTA_MAX_ATTEMPTS", 2)?;
        let backoff_secs = parse_number(&lookup, "EXTRACTA_RETRY_BACKOFF_SECS", 2)?;

        if refresh_secs == 0 || page_secs == 0 {
            return Err(AppError::ConfigError("timeouts must be at least 1 second".into()));
        }
        if poll_ms == 0 {
            return Err(AppError::ConfigError(
                "EXTRACTA_POLL_INTERVAL_MS must be at least 1".into(),
            ));
        }
        if max_attempts == 0 {
            return Err(AppError::ConfigError(
                "EXTRACTA_MAX_ATTEMPTS must be at least 1".into(),
            ));
        }
        let max_attempts = u32::try_from(max_attempts).map_err(|_| {
            AppError::ConfigError(format!("EXTRACTA_MAX_ATTEMPTS {max_attempts} is too large"))
        })?;

        Ok(Self {
            browser,
            headless,
            navigator: NavigatorConfig {
                refresh_timeout: Duration::from_secs(refresh_secs),
                poll_interval: Duration::from_millis(poll_ms),
                settle_delay: Duration::from_millis(settle_ms),
            },
            page_timeout: Duration::from_secs(page_secs),
            retry: RetryPolicy::new(max_attempts, Duration::from_secs(backoff_secs)),
        })
    }
}

fn parse_number(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, AppError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            AppError::ConfigError(format!(
                "Invalid {key} '{raw}': must be a non-negative integer"
            ))
        }),
    }
}
