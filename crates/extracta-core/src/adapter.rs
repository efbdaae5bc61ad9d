//! Page adapters: every structural selector of the remote pages lives here.
//!
//! Navigation and extraction only talk to the [`PageAdapter`] trait, so a
//! markup change on lotto.de means a new adapter, not edits across the
//! pipeline.

/// Base URL of the "Lotto 6 aus 49" results page.
pub const LOTTO_URL: &str = "https://www.lotto.de/lotto-6aus49/lottozahlen";

/// Frequency statistics page.
pub const STATISTICS_URL: &str = "https://www.lotto.de/lotto-6aus49/statistik/ziehungshaeufigkeit";

/// Where the bonus number sits in the markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonusLocator {
    /// Selector of the containers holding number items.
    pub container: &'static str,
    /// Which matching container (0-based) holds the bonus number.
    pub nth: usize,
    /// Selector of the number item inside that container.
    pub item: &'static str,
}

/// Where the draw date is rendered, if the page shows one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateLocator {
    pub selector: &'static str,
    /// Attribute carrying the date; `None` reads the element text.
    pub attribute: Option<&'static str>,
}

/// Structural knowledge about one version of the results page.
pub trait PageAdapter: Send + Sync {
    /// URL the navigator opens before every selection.
    fn url(&self) -> &str;

    /// Selector matching every selection control on the page.
    fn control_selector(&self) -> &str {
        "select"
    }

    /// Words whose presence in a control's `id`, `name`, `aria-label` or
    /// `class` marks it as the date/day control.
    fn date_control_hints(&self) -> &[&str];

    /// Selector of the primary result container(s).
    fn numbers_container(&self) -> &str;

    /// Selector of a single number inside a result container.
    fn number_item(&self) -> &str;

    fn bonus_locator(&self) -> BonusLocator;

    /// Selector of one payout table row.
    fn payout_row(&self) -> &str;

    /// Selector of the tier label cell inside a payout row.
    fn payout_label(&self) -> &str;

    /// Selector of the amount cell inside a payout row.
    fn payout_amount(&self) -> &str;

    fn date_locator(&self) -> Option<DateLocator> {
        None
    }

    /// Element whose presence signals that client-side rendering finished.
    fn ready_selector(&self) -> Option<&str> {
        None
    }
}

/// The archive layout with year and day dropdowns (rendered client-side).
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchivePage;

impl PageAdapter for ArchivePage {
    fn url(&self) -> &str {
        LOTTO_URL
    }

    fn date_control_hints(&self) -> &[&str] {
        &["day", "date", "datum"]
    }

    fn numbers_container(&self) -> &str {
        ".DrawNumbersCollection__container"
    }

    fn number_item(&self) -> &str {
        ".LottoBall"
    }

    fn bonus_locator(&self) -> BonusLocator {
        BonusLocator {
            container: ".DrawNumbersCollection__container",
            nth: 1,
            item: ".LottoBall",
        }
    }

    fn payout_row(&self) -> &str {
        ".WinningQuotas tbody tr"
    }

    fn payout_label(&self) -> &str {
        "td:nth-child(1)"
    }

    fn payout_amount(&self) -> &str {
        "td:last-child"
    }

    fn ready_selector(&self) -> Option<&str> {
        Some("select")
    }
}

/// The current-draw layout, readable from static markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatestDrawPage;

impl PageAdapter for LatestDrawPage {
    fn url(&self) -> &str {
        LOTTO_URL
    }

    fn date_control_hints(&self) -> &[&str] {
        &[]
    }

    fn numbers_container(&self) -> &str {
        ".lotto-zahlen"
    }

    fn number_item(&self) -> &str {
        ".zahl"
    }

    fn bonus_locator(&self) -> BonusLocator {
        BonusLocator {
            container: ".lotto-superzahl",
            nth: 0,
            item: ".zahl",
        }
    }

    fn payout_row(&self) -> &str {
        ".gewinnquoten .gewinnreihe"
    }

    fn payout_label(&self) -> &str {
        ".klasse"
    }

    fn payout_amount(&self) -> &str {
        ".gewinnbetrag"
    }

    fn date_locator(&self) -> Option<DateLocator> {
        Some(DateLocator {
            selector: "time",
            attribute: Some("datetime"),
        })
    }

    fn ready_selector(&self) -> Option<&str> {
        Some("main.page--lotto6aus49")
    }
}

/// Selectors of the frequency statistics page.
#[derive(Debug, Clone, Copy)]
pub struct StatisticsPage {
    pub url: &'static str,
    pub bar: &'static str,
    /// Ball inside a bar; its `aria-label` holds the number.
    pub ball: &'static str,
    /// Count inside a bar, rendered like `"612×"`.
    pub count: &'static str,
}

impl Default for StatisticsPage {
    fn default() -> Self {
        Self {
            url: STATISTICS_URL,
            bar: ".StatisticsBar",
            ball: ".LottoBall__circle",
            count: ".StatisticsBar__count",
        }
    }
}
