//! Sisreg: wait-list lookup for the Federal District public health queue
//!
//! Drives the public wait-list page with headless Chromium: switches the
//! form to "search by request code", forces a code into an input the page
//! keeps disabling, submits, and reads the first row of the result table
//! back as a [`ResultRecord`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      SISREG Architecture                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scraper    │    │ Page       │    │ FormSurface│            │
//! │   │ (classify, │───►│ Driver     │───►│ (chromium  │            │
//! │   │  batch)    │    │            │    │  or mock)  │            │
//! │   └─────┬──────┘    └─────┬──────┘    └────────────┘            │
//! │         │                 │ resolver ─ unlocker                 │
//! │         ▼                 ▼                                     │
//! │   ┌────────────┐    ┌────────────┐                              │
//! │   │ Extractor  │◄───│ RawTable   │                              │
//! │   └────────────┘    └────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "browser")]
//! # async fn lookup() -> sisreg::ScrapeResult<()> {
//! use sisreg::{Scraper, ScraperConfig, WaitListLookup};
//!
//! let scraper = Scraper::chromium(ScraperConfig::default());
//! let record = scraper.scrape_by_code("123456").await?;
//! println!("{} at position {:?}", record.procedure, record.queue_position);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod browser;
mod config;
#[allow(clippy::missing_errors_doc)]
pub mod driver;
pub mod extractor;
mod locator;
mod record;
#[allow(clippy::missing_errors_doc)]
pub mod resolver;
mod result;
mod scraper;
pub mod script;
#[allow(clippy::missing_errors_doc)]
pub mod strategy;
mod surface;
#[allow(clippy::missing_errors_doc)]
pub mod unlocker;

pub use browser::BrowserConfig;
#[cfg(feature = "browser")]
pub use browser::{ChromiumLauncher, ChromiumSession};
pub use config::{
    ExtractionPolicy, ScraperConfig, Timeouts, UnlockPolicy, DEFAULT_ACTION_TIMEOUT_MS,
    DEFAULT_FRAME_HINT, DEFAULT_POLITENESS_DELAY_MS, DEFAULT_RESULTS_TIMEOUT_MS,
    DEFAULT_TARGET_URL,
};
pub use locator::{
    code_field_candidates, result_row, search_mode_toggles, submit_candidates, Role, Selector,
};
pub use record::{BatchEntry, RawTable, ResultRecord, SearchCode};
pub use result::{ErrorClass, ScrapeError, ScrapeResult};
pub use scraper::{Scraper, WaitListLookup};
pub use strategy::{AttemptLog, Verdict};
pub use surface::{
    FieldBehavior, FieldState, FormSurface, Journal, LoadSnapshot, MockLauncher, MockPage,
    MockSurface, SessionLauncher,
};
