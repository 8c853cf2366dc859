use std::path::PathBuf;
use std::time::Duration;

use crate::acquire::pacing::DelayWindow;

const DEFAULT_API_TIMEOUT_SECS: u64 = 20;
const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 15;
const DEFAULT_NAV_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CARD_WAIT_SECS: u64 = 3;
const DEFAULT_MAX_PAGES: u32 = 3;
const DEFAULT_PAGE_DELAY_MS: (u64, u64) = (3_000, 8_000);
const DEFAULT_SETTLE_DELAY_MS: (u64, u64) = (2_000, 4_000);
const DEFAULT_DEADLINE_SECS: u64 = 600;
const DEFAULT_API_THRESHOLD: u8 = 70;
const DEFAULT_HTML_THRESHOLD: u8 = 80;

#[derive(Clone, Debug)]
pub struct HarvestConfig {
    pub api_timeout: Duration,
    pub page_timeout: Duration,
    pub browser: BrowserSettings,
    pub max_pages: u32,
    pub page_delay: DelayWindow,
    pub seed: Option<u64>,
    pub dispatch_deadline: Duration,
    pub concurrency: usize,
    pub nlp_model: Option<String>,
    pub taxonomy_path: Option<PathBuf>,
    pub api_fuzzy_threshold: u8,
    pub html_fuzzy_threshold: u8,
}

#[derive(Clone, Debug)]
pub struct BrowserSettings {
    pub disabled: bool,
    pub chromium_path: Option<PathBuf>,
    pub nav_timeout: Duration,
    pub card_wait: Duration,
    pub settle_delay: DelayWindow,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            disabled: false,
            chromium_path: None,
            nav_timeout: Duration::from_secs(DEFAULT_NAV_TIMEOUT_SECS),
            card_wait: Duration::from_secs(DEFAULT_CARD_WAIT_SECS),
            settle_delay: DelayWindow::from_millis(DEFAULT_SETTLE_DELAY_MS.0, DEFAULT_SETTLE_DELAY_MS.1),
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            api_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            page_timeout: Duration::from_secs(DEFAULT_PAGE_TIMEOUT_SECS),
            browser: BrowserSettings::default(),
            max_pages: DEFAULT_MAX_PAGES,
            page_delay: DelayWindow::from_millis(DEFAULT_PAGE_DELAY_MS.0, DEFAULT_PAGE_DELAY_MS.1),
            seed: None,
            dispatch_deadline: Duration::from_secs(DEFAULT_DEADLINE_SECS),
            concurrency: 1,
            nlp_model: None,
            taxonomy_path: None,
            api_fuzzy_threshold: DEFAULT_API_THRESHOLD,
            html_fuzzy_threshold: DEFAULT_HTML_THRESHOLD,
        }
    }
}

impl HarvestConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads through `lookup`, so tests never touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let num = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        if let Some(s) = num("HARVEST_API_TIMEOUT_SECS") { cfg.api_timeout = Duration::from_secs(s); }
        if let Some(s) = num("HARVEST_PAGE_TIMEOUT_SECS") { cfg.page_timeout = Duration::from_secs(s); }
        if let Some(s) = num("HARVEST_NAV_TIMEOUT_SECS") { cfg.browser.nav_timeout = Duration::from_secs(s); }
        if let Some(s) = num("HARVEST_CARD_WAIT_SECS") { cfg.browser.card_wait = Duration::from_secs(s); }
        if let Some(n) = num("HARVEST_MAX_PAGES").and_then(|n| u32::try_from(n).ok()) { cfg.max_pages = n.max(1); }

        let page_min = num("HARVEST_PAGE_DELAY_MIN_MS").unwrap_or(DEFAULT_PAGE_DELAY_MS.0);
        let page_max = num("HARVEST_PAGE_DELAY_MAX_MS").unwrap_or(DEFAULT_PAGE_DELAY_MS.1);
        cfg.page_delay = DelayWindow::from_millis(page_min, page_max);

        let settle_min = num("HARVEST_SETTLE_DELAY_MIN_MS").unwrap_or(DEFAULT_SETTLE_DELAY_MS.0);
        let settle_max = num("HARVEST_SETTLE_DELAY_MAX_MS").unwrap_or(DEFAULT_SETTLE_DELAY_MS.1);
        cfg.browser.settle_delay = DelayWindow::from_millis(settle_min, settle_max);

        cfg.seed = num("HARVEST_SEED");
        if let Some(s) = num("HARVEST_DISPATCH_DEADLINE_SECS") { cfg.dispatch_deadline = Duration::from_secs(s); }
        if let Some(n) = num("HARVEST_CONCURRENCY") { cfg.concurrency = (n as usize).max(1); }

        cfg.browser.disabled = matches!(
            lookup("HARVEST_DISABLE_BROWSER").as_deref().map(str::trim),
            Some("1") | Some("true") | Some("yes")
        );
        cfg.browser.chromium_path = lookup("HARVEST_CHROMIUM_PATH").filter(|p| !p.trim().is_empty()).map(PathBuf::from);
        cfg.nlp_model = lookup("HARVEST_NLP_MODEL").filter(|m| !m.trim().is_empty());
        cfg.taxonomy_path = lookup("HARVEST_TAXONOMY_PATH").filter(|p| !p.trim().is_empty()).map(PathBuf::from);

        if let Some(t) = num("HARVEST_API_FUZZY_THRESHOLD") { cfg.api_fuzzy_threshold = t.min(100) as u8; }
        if let Some(t) = num("HARVEST_HTML_FUZZY_THRESHOLD") { cfg.html_fuzzy_threshold = t.min(100) as u8; }
        cfg
    }
}
