//! Scrape orchestration.
//!
//! [`Scraper`] owns the configuration and a [`SessionLauncher`]. Each code
//! gets its own session, which is closed on every exit path, and every
//! error leaving [`Scraper::scrape_by_code`] is classified.

use std::time::Duration;

use async_trait::async_trait;
use tracing::Instrument;

use crate::config::ScraperConfig;
use crate::driver;
use crate::extractor::extract;
use crate::record::{BatchEntry, ResultRecord, SearchCode};
use crate::result::ScrapeResult;
use crate::surface::{FormSurface, SessionLauncher};

/// Lookup service used by the API and the command line
#[async_trait]
pub trait WaitListLookup: Send + Sync {
    /// Scrape one code; errors are always classified
    async fn scrape_by_code(&self, code: &str) -> ScrapeResult<ResultRecord>;

    /// Pause between consecutive codes of a batch
    fn politeness_delay(&self) -> Duration;

    /// Scrape several codes in order.
    ///
    /// Blank codes are discarded. Every remaining code yields exactly one
    /// entry; a failure never aborts the batch.
    async fn scrape_batch(&self, codes: &[String]) -> Vec<BatchEntry> {
        let codes: Vec<&str> = codes
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();
        let mut entries = Vec::with_capacity(codes.len());
        for (i, code) in codes.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.politeness_delay()).await;
            }
            let outcome = self.scrape_by_code(code).await;
            entries.push(BatchEntry::from_outcome(code, outcome));
        }
        entries
    }
}

/// Wait-list scraper
#[derive(Debug, Clone)]
pub struct Scraper<L> {
    launcher: L,
    config: ScraperConfig,
}

impl<L: SessionLauncher> Scraper<L> {
    /// Create a scraper over `launcher`
    #[must_use]
    pub const fn new(launcher: L, config: ScraperConfig) -> Self {
        Self { launcher, config }
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Session launcher
    #[must_use]
    pub const fn launcher(&self) -> &L {
        &self.launcher
    }

    async fn scrape(&self, code: &SearchCode) -> ScrapeResult<ResultRecord> {
        let mut session = self.launcher.launch().await?;
        let outcome = driver::run(&mut session, code, &self.config).await;
        if let Err(err) = session.close().await {
            tracing::warn!(error = %err, "failed to close browser session");
        }
        extract(code, &outcome?, &self.config.extraction)
    }
}

#[cfg(feature = "browser")]
impl Scraper<crate::browser::ChromiumLauncher> {
    /// Scraper backed by headless Chromium
    #[must_use]
    pub fn chromium(config: ScraperConfig) -> Self {
        let launcher = crate::browser::ChromiumLauncher::new(
            config.browser.clone(),
            config.frame_hint.clone(),
            config.timeouts.action,
        );
        Self::new(launcher, config)
    }
}

#[async_trait]
impl<L: SessionLauncher> WaitListLookup for Scraper<L> {
    async fn scrape_by_code(&self, code: &str) -> ScrapeResult<ResultRecord> {
        let code = SearchCode::parse(code)?;
        let span = tracing::info_span!("scrape", code = %code);
        let outcome = self
            .scrape(&code)
            .instrument(span.clone())
            .await
            .map_err(crate::result::ScrapeError::classify);

        let _entered = span.enter();
        match &outcome {
            Ok(record) => tracing::info!(
                procedure = %record.procedure,
                position = ?record.queue_position,
                "scrape succeeded"
            ),
            Err(err) => tracing::warn!(
                status = err.status_code(),
                error = %err,
                "scrape failed"
            ),
        }
        outcome
    }

    fn politeness_delay(&self) -> Duration {
        self.config.politeness_delay
    }
}
