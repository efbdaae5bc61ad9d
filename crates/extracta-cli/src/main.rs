use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use extracta_client::{BrowserFetcher, ChromiumSession, ReqwestFetcher};
use extracta_core::{
    ArchivePage, BrowserKind, DrawStore, Fetcher, HistoryReport, HistoryScraper,
    LatestDrawPage, LatestDrawService, PageAdapter, RecaptureService, ScraperConfig,
    StatisticsPage, TracingHistoryReporter, fetch_frequencies, finish_session,
};
use extracta_store::{
    FileDrawStore, StoreConfig, latest_failure_report, read_failure_report,
    write_aggregate_export, write_failure_report, write_frequencies, write_screenshot_manifest,
    write_year_file,
};

/// Year of the first "6 aus 49" draw.
const FIRST_DRAW_YEAR: i32 = 1955;

#[derive(Parser)]
#[command(name = "extracta", version, about = "Lotto 6 aus 49 draw scraper")]
struct Cli {
    /// Directory for the draw stores and run reports
    #[arg(long, global = true, env = "EXTRACTA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Browser to drive: chrome, chromium or edge
    #[arg(long, global = true, env = "EXTRACTA_BROWSER")]
    browser: Option<String>,

    /// Show the browser window instead of running headless
    #[arg(long, global = true, default_value_t = false)]
    headed: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FetchMode {
    /// Plain HTTP request
    Http,
    /// Render in the browser first
    Browser,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the current draw and store it if it is new
    Latest {
        #[arg(long, value_enum, default_value_t = FetchMode::Http)]
        fetch: FetchMode,
    },

    /// Scrape every draw of a range of years from the archive
    History {
        /// First year (inclusive)
        #[arg(long, default_value_t = FIRST_DRAW_YEAR)]
        from: i32,

        /// Last year (inclusive), defaults to the current year
        #[arg(long)]
        to: Option<i32>,
    },

    /// Show the draws of a failure report again and screenshot them
    Recapture {
        /// Failure report to process, defaults to the newest one
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Fetch how often each number has been drawn
    Stats {
        #[arg(long, value_enum, default_value_t = FetchMode::Browser)]
        fetch: FetchMode,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("extracta=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut scraper = ScraperConfig::from_env().context("Invalid scraper configuration")?;
    if let Some(browser) = &cli.browser {
        scraper.browser = browser
            .parse::<BrowserKind>()
            .context("Invalid --browser")?;
    }
    if cli.headed {
        scraper.headless = false;
    }
    let store = match cli.data_dir {
        Some(dir) => StoreConfig::new(dir),
        None => StoreConfig::from_env().context("Invalid store configuration")?,
    };

    match cli.command {
        Commands::Latest { fetch } => cmd_latest(fetch, &scraper, &store).await,
        Commands::History { from, to } => {
            let to = to.unwrap_or_else(|| Local::now().year());
            if from > to {
                bail!("--from {from} is after --to {to}");
            }
            let session = launch_session(&scraper).await?;
            let result = cmd_history(&session, from, to, &scraper, &store).await;
            finish_session(session, &store.debug_dump_path(), result).await
        }
        Commands::Recapture { report } => {
            let report = match report {
                Some(path) => path,
                None => latest_failure_report(store.data_dir())?
                    .context("No failure report found in the data directory")?,
            };
            let session = launch_session(&scraper).await?;
            let result = cmd_recapture(&session, &report, &scraper, &store).await;
            finish_session(session, &store.debug_dump_path(), result).await
        }
        Commands::Stats { fetch } => cmd_stats(fetch, &scraper, &store).await,
    }
}

async fn launch_session(config: &ScraperConfig) -> Result<ChromiumSession> {
    ChromiumSession::launch(config.browser, config.headless, config.page_timeout)
        .await
        .context("Failed to start the browser")
}

async fn launch_fetcher(config: &ScraperConfig) -> Result<BrowserFetcher> {
    BrowserFetcher::with_timeout(config.browser, config.headless, config.page_timeout)
        .await
        .context("Failed to start the browser")
}

/// Close the fetcher's browser on every path.
async fn close_fetcher<T, E>(fetcher: BrowserFetcher, result: Result<T, E>) -> Result<T, E> {
    if let Err(e) = fetcher.close().await {
        tracing::warn!(error = %e, "Browser did not close cleanly");
    }
    result
}

async fn cmd_latest(fetch: FetchMode, scraper: &ScraperConfig, store: &StoreConfig) -> Result<()> {
    match fetch {
        FetchMode::Http => {
            let fetcher = ReqwestFetcher::with_timeout(scraper.page_timeout)
                .context("Failed to create HTTP client")?;
            run_latest(fetcher, scraper, store).await
        }
        FetchMode::Browser => {
            let mut fetcher = launch_fetcher(scraper).await?;
            if let Some(ready) = LatestDrawPage.ready_selector() {
                fetcher = fetcher.wait_for(ready);
            }
            let result = run_latest(&fetcher, scraper, store).await;
            close_fetcher(fetcher, result).await
        }
    }
}

async fn run_latest<F: Fetcher>(
    fetcher: F,
    scraper: &ScraperConfig,
    store: &StoreConfig,
) -> Result<()> {
    let service = LatestDrawService::new(fetcher, FileDrawStore::new(store), scraper.retry.clone());
    let outcome = service.run().await.context("Latest draw failed")?;

    if outcome.novel() {
        tracing::info!(date = %outcome.draw.date, "New draw stored");
    } else {
        tracing::info!(date = %outcome.draw.date, "Draw already stored, nothing to do");
    }
    println!("{}", serde_json::to_string_pretty(&outcome.draw)?);
    Ok(())
}

async fn cmd_history(
    session: &ChromiumSession,
    from: i32,
    to: i32,
    scraper: &ScraperConfig,
    store: &StoreConfig,
) -> Result<()> {
    let reporter = TracingHistoryReporter;
    let history = HistoryScraper::new(
        session,
        &ArchivePage,
        scraper.navigator.clone(),
        scraper.retry.clone(),
        &reporter,
    );

    let mut report = HistoryReport::default();
    for year in from..=to {
        let outcome = history.scrape_year(year).await;
        if !outcome.draws.is_empty() {
            write_year_file(&store.history_dir(), year, &outcome.draws)
                .with_context(|| format!("Failed to write draws of {year}"))?;
        }
        report.absorb(outcome);
    }

    let now = Local::now().naive_local();
    if !report.draws.is_empty() {
        write_aggregate_export(store.data_dir(), &report.draws, now)
            .context("Failed to write aggregate export")?;
    }
    write_failure_report(store.data_dir(), &report.failures, now)
        .context("Failed to write failure report")?;

    let summary = FileDrawStore::new(store)
        .persist_all(&report.draws)
        .context("Failed to update the draw store")?;

    println!(
        "Scraped {} draws from {from} to {to}: {} new, {} already stored, {} failed, {} years skipped",
        report.draws.len(),
        summary.json_added.max(summary.sheet_added),
        summary.duplicates,
        report.failures.iter().filter(|f| !f.is_whole_year()).count(),
        report.skipped_years.len(),
    );
    Ok(())
}

async fn cmd_recapture(
    session: &ChromiumSession,
    report_path: &std::path::Path,
    scraper: &ScraperConfig,
    store: &StoreConfig,
) -> Result<()> {
    let failures = read_failure_report(report_path)
        .with_context(|| format!("Failed to read {}", report_path.display()))?;
    tracing::info!(path = %report_path.display(), failures = failures.len(), "Reprocessing failed draws");

    let service = RecaptureService::new(
        session,
        &ArchivePage,
        scraper.navigator.clone(),
        scraper.retry.clone(),
        store.screenshot_dir(),
    );
    let report = service.recapture(&failures).await;

    for failure in &report.unresolved {
        tracing::warn!(year = failure.year, date = %failure.date, reason = %failure.reason, "Draw still unavailable");
    }
    let manifest =
        write_screenshot_manifest(store.data_dir(), &report.records, Local::now().naive_local())
            .context("Failed to write screenshot manifest")?;

    println!(
        "{} screenshots, {} unresolved, {} whole-year entries skipped; manifest: {}",
        report.records.len(),
        report.unresolved.len(),
        report.skipped,
        manifest.display()
    );
    Ok(())
}

async fn cmd_stats(fetch: FetchMode, scraper: &ScraperConfig, store: &StoreConfig) -> Result<()> {
    let page = StatisticsPage::default();
    let frequencies = match fetch {
        FetchMode::Http => {
            let fetcher = ReqwestFetcher::with_timeout(scraper.page_timeout)
                .context("Failed to create HTTP client")?;
            fetch_frequencies(&fetcher, &page, &scraper.retry).await
        }
        FetchMode::Browser => {
            let fetcher = launch_fetcher(scraper).await?.wait_for(page.bar);
            let result = fetch_frequencies(&fetcher, &page, &scraper.retry).await;
            close_fetcher(fetcher, result).await
        }
    }
    .context("Statistics failed")?;

    let (json, csv) = write_frequencies(store.data_dir(), &frequencies)
        .context("Failed to write frequency exports")?;

    for f in &frequencies {
        println!("{:>2}: {}", f.number, f.count);
    }
    tracing::info!(json = %json.display(), csv = %csv.display(), "Statistics saved");
    Ok(())
}
