/// Smoke-test for `ChromiumSession`.
///
/// Launches a headless browser, opens the results archive, and prints the
/// draw dates listed for the current year.
///
/// Run with:
///   cargo run -p extracta-client --example browser_smoke
use std::time::Duration;

use extracta_client::ChromiumSession;
use extracta_core::{ArchivePage, BrowserKind, BrowserSession, Navigator, NavigatorConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    println!("Launching headless browser…");
    let session = ChromiumSession::launch(BrowserKind::Chrome, true, Duration::from_secs(30)).await?;

    let result = async {
        let navigator = Navigator::new(&session, &ArchivePage, NavigatorConfig::default());
        navigator.open().await?;
        navigator.date_options().await
    }
    .await;
    session.quit().await?;

    let options = result?;
    assert!(!options.is_empty(), "Expected at least one draw date");
    println!("OK: {} draw dates listed", options.len());
    for option in options.iter().take(5) {
        println!("  {} ({})", option.label, option.value);
    }
    Ok(())
}
