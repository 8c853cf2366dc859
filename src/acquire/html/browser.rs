//! Headless Chromium fetch tier.
//!
//! One `BrowserSession` per page fetch. The session owns the Chromium
//! process, its CDP handler task and a throwaway profile directory; all
//! three go away in `release`, or in `Drop` if the fetch was cancelled
//! before it got there.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use rand::rngs::StdRng;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::acquire::pacing::jittered_sleep;
use crate::config::BrowserSettings;
use crate::error::AcquireError;

/// Selectors that mean the board has rendered its listing, most specific first.
pub const CARD_SIGNATURES: &[&str] = &[
    r#"div[data-test="job-card"]"#,
    "article",
    ".job-card",
    r#"div[class*="job"]"#,
    r#"li[class*="job"]"#,
    r#"a[href*="/jobs/p/"]"#,
];

const CARD_POLL: Duration = Duration::from_millis(250);
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Find the Chromium binary: explicit path first, then the usual names on PATH.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return p.exists().then(|| p.to_path_buf());
    }
    for name in ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) { return Some(path); }
    }
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() { return Some(common); }
    }
    None
}

pub struct BrowserSession {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    profile_dir: PathBuf,
}

impl BrowserSession {
    pub async fn launch(chromium: &Path, user_agent: &str, settings: &BrowserSettings) -> Result<Self, AcquireError> {
        let profile_dir = std::env::temp_dir().join(format!("harvest-chromium-{}", uuid::Uuid::new_v4()));
        let config = BrowserConfig::builder()
            .chrome_executable(chromium)
            .user_data_dir(&profile_dir)
            .request_timeout(settings.nav_timeout)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--window-size=1920,1080")
            .arg(format!("--user-agent={user_agent}"))
            .build()
            .map_err(|e| AcquireError::CapabilityUnavailable(format!("browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AcquireError::CapabilityUnavailable(format!("launch chromium: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() { break; }
            }
        });

        Ok(Self { browser: Some(browser), handler: Some(handler), profile_dir })
    }

    /// Navigate, wait for a job-card signature, settle, and return the rendered markup.
    pub async fn render(&self, url: &str, settings: &BrowserSettings, rng: &mut StdRng) -> Result<String, AcquireError> {
        let browser = self.browser.as_ref().ok_or_else(|| AcquireError::CapabilityUnavailable("browser released".into()))?;
        let page = browser.new_page("about:blank").await.map_err(cdp)?;

        match tokio::time::timeout(settings.nav_timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => { let _ = page.close().await; return Err(cdp(e)); }
            Err(_) => { let _ = page.close().await; return Err(AcquireError::Timeout(settings.nav_timeout)); }
        }

        match wait_for_cards(&page, settings.card_wait).await {
            Some(sig) => debug!(url, signature = sig, "job cards rendered"),
            None => debug!(url, "no job-card signature rendered"),
        }
        jittered_sleep(&settings.settle_delay, rng).await;

        let html = page.content().await.map_err(cdp);
        let _ = page.close().await;
        html
    }

    /// Close the browser and reap the process. A browser that will not
    /// close within `CLOSE_GRACE` is killed; reaping is bounded the same way.
    pub async fn release(mut self) {
        if let Some(mut browser) = self.browser.take() {
            let closed = matches!(tokio::time::timeout(CLOSE_GRACE, browser.close()).await, Ok(Ok(_)));
            if !closed {
                debug!("browser did not close cleanly; killing");
                let _ = browser.kill().await;
            }
            if tokio::time::timeout(CLOSE_GRACE, browser.wait()).await.is_err() {
                debug!("browser process not reaped within {:?}", CLOSE_GRACE);
            }
        }
        if let Some(handler) = self.handler.take() { handler.abort(); }
        let _ = std::fs::remove_dir_all(&self.profile_dir);
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() { handler.abort(); }
        // dropping the Browser kills the child process
        if self.browser.take().is_some() {
            let _ = std::fs::remove_dir_all(&self.profile_dir);
        }
    }
}

/// First signature present within `per_signature` of polling, if any.
async fn wait_for_cards(page: &Page, per_signature: Duration) -> Option<&'static str> {
    for &sig in CARD_SIGNATURES {
        let poll = async {
            loop {
                if page.find_element(sig).await.is_ok() { return; }
                tokio::time::sleep(CARD_POLL).await;
            }
        };
        if tokio::time::timeout(per_signature, poll).await.is_ok() { return Some(sig); }
    }
    None
}

fn cdp(e: chromiumoxide::error::CdpError) -> AcquireError { AcquireError::Network(format!("cdp: {e}")) }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::pacing::{rng_for, DelayWindow};

    #[test]
    fn explicit_missing_path_is_not_found() {
        assert!(find_chromium(Some(Path::new("/nonexistent/chrome"))).is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn renders_cards_and_releases() {
        let chromium = find_chromium(None).expect("chromium not found");
        let settings = BrowserSettings { settle_delay: DelayWindow::ZERO, ..BrowserSettings::default() };
        let session = BrowserSession::launch(&chromium, "harvest-test", &settings).await.expect("launch");
        let mut rng = rng_for(Some(1));
        let html = session
            .render("data:text/html,<article class='job'><h2>Rust Engineer</h2></article>", &settings, &mut rng)
            .await
            .expect("render");
        assert!(html.contains("Rust Engineer"));
        let dir = session.profile_dir.clone();
        session.release().await;
        assert!(!dir.exists());
    }
}
