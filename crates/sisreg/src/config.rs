//! Scraper configuration.
//!
//! All tuning knobs (retry rounds, poll intervals, timeouts, delays) live
//! here and are handed to [`crate::Scraper`] at construction time.

use std::time::Duration;

use crate::browser::BrowserConfig;

/// Wait-list page the scraper drives
pub const DEFAULT_TARGET_URL: &str = "https://www.mpdft.mp.br/acompanhamento-sus-df/lista-de-espera";

/// URL fragment identifying the frame that hosts the search form
pub const DEFAULT_FRAME_HINT: &str = "lista-de-espera";

/// Default action/navigation timeout (45 seconds)
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 45_000;

/// Default wait for the result table (20 seconds)
pub const DEFAULT_RESULTS_TIMEOUT_MS: u64 = 20_000;

/// Default pause between batch items
pub const DEFAULT_POLITENESS_DELAY_MS: u64 = 800;

/// Step timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Bound for navigation, load-state waits and single browser commands
    pub action: Duration,
    /// Bound for each code-input selector to become visible
    pub field_visible: Duration,
    /// Bound for each search-mode toggle attempt
    pub mode_toggle: Duration,
    /// Bound for the role-based submit click
    pub submit_click: Duration,
    /// Bound for the first result row to become visible
    pub results: Duration,
    /// Polling interval for every bounded wait
    pub poll_interval: Duration,
    /// Quiet period that counts as network idle
    pub network_idle: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            action: Duration::from_millis(DEFAULT_ACTION_TIMEOUT_MS),
            field_visible: Duration::from_millis(4_000),
            mode_toggle: Duration::from_millis(2_500),
            submit_click: Duration::from_millis(3_000),
            results: Duration::from_millis(DEFAULT_RESULTS_TIMEOUT_MS),
            poll_interval: Duration::from_millis(100),
            network_idle: Duration::from_millis(500),
        }
    }
}

impl Timeouts {
    /// Set the action/navigation timeout
    #[must_use]
    pub const fn with_action(mut self, timeout: Duration) -> Self {
        self.action = timeout;
        self
    }

    /// Set the result-table wait bound
    #[must_use]
    pub const fn with_results(mut self, timeout: Duration) -> Self {
        self.results = timeout;
        self
    }

    /// Tiny bounds for scripted pages in tests
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            action: Duration::from_millis(50),
            field_visible: Duration::from_millis(5),
            mode_toggle: Duration::from_millis(5),
            submit_click: Duration::from_millis(5),
            results: Duration::from_millis(5),
            poll_interval: Duration::from_millis(1),
            network_idle: Duration::from_millis(2),
        }
    }
}

/// Escalation budget for making the code input hold the code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockPolicy {
    /// Number of strip/fill/type rounds before the last resort
    pub rounds: u32,
    /// Pause between rounds
    pub round_pause: Duration,
    /// Delay between typed characters
    pub keystroke_delay: Duration,
    /// Pause after a verified value before submitting
    pub settle: Duration,
}

impl Default for UnlockPolicy {
    fn default() -> Self {
        Self {
            rounds: 16,
            round_pause: Duration::from_millis(500),
            keystroke_delay: Duration::from_millis(20),
            settle: Duration::from_millis(250),
        }
    }
}

impl UnlockPolicy {
    /// Set the number of rounds
    #[must_use]
    pub const fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    /// No pauses at all
    #[must_use]
    pub const fn instant(rounds: u32) -> Self {
        Self {
            rounds,
            round_pause: Duration::ZERO,
            keystroke_delay: Duration::ZERO,
            settle: Duration::ZERO,
        }
    }
}

/// How the row extractor treats unrecognized headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionPolicy {
    /// Fail when headers exist but none matches a known column
    pub fail_on_header_drift: bool,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self {
            fail_on_header_drift: true,
        }
    }
}

/// Complete scraper configuration
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Page to drive
    pub target_url: String,
    /// Frame URL fragment that hosts the form when it is embedded
    pub frame_hint: String,
    /// Browser launch options
    pub browser: BrowserConfig,
    /// Step timeouts
    pub timeouts: Timeouts,
    /// Field escalation budget
    pub unlock: UnlockPolicy,
    /// Header handling
    pub extraction: ExtractionPolicy,
    /// Pause between consecutive codes of a batch
    pub politeness_delay: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            frame_hint: DEFAULT_FRAME_HINT.to_string(),
            browser: BrowserConfig::default(),
            timeouts: Timeouts::default(),
            unlock: UnlockPolicy::default(),
            extraction: ExtractionPolicy::default(),
            politeness_delay: Duration::from_millis(DEFAULT_POLITENESS_DELAY_MS),
        }
    }
}

impl ScraperConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target URL
    #[must_use]
    pub fn with_target_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = url.into();
        self
    }

    /// Set browser options
    #[must_use]
    pub fn with_browser(mut self, browser: BrowserConfig) -> Self {
        self.browser = browser;
        self
    }

    /// Set step timeouts
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set the field escalation budget
    #[must_use]
    pub const fn with_unlock(mut self, unlock: UnlockPolicy) -> Self {
        self.unlock = unlock;
        self
    }

    /// Set header handling
    #[must_use]
    pub const fn with_extraction(mut self, extraction: ExtractionPolicy) -> Self {
        self.extraction = extraction;
        self
    }

    /// Set the batch politeness delay
    #[must_use]
    pub const fn with_politeness_delay(mut self, delay: Duration) -> Self {
        self.politeness_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_remote_tuning() {
        let config = ScraperConfig::default();
        assert_eq!(config.target_url, DEFAULT_TARGET_URL);
        assert_eq!(config.timeouts.action, Duration::from_secs(45));
        assert_eq!(config.timeouts.results, Duration::from_secs(20));
        assert_eq!(config.timeouts.field_visible, Duration::from_secs(4));
        assert_eq!(config.unlock.rounds, 16);
        assert_eq!(config.politeness_delay, Duration::from_millis(800));
        assert!(config.extraction.fail_on_header_drift);
    }

    #[test]
    fn test_builders() {
        let config = ScraperConfig::new()
            .with_target_url("http://127.0.0.1:9/lista-de-espera")
            .with_politeness_delay(Duration::ZERO)
            .with_unlock(UnlockPolicy::default().with_rounds(12))
            .with_timeouts(Timeouts::default().with_results(Duration::from_secs(5)));
        assert_eq!(config.target_url, "http://127.0.0.1:9/lista-de-espera");
        assert_eq!(config.politeness_delay, Duration::ZERO);
        assert_eq!(config.unlock.rounds, 12);
        assert_eq!(config.timeouts.results, Duration::from_secs(5));
    }

    #[test]
    fn test_instant_policy_has_no_pauses() {
        let unlock = UnlockPolicy::instant(3);
        assert_eq!(unlock.rounds, 3);
        assert_eq!(unlock.round_pause, Duration::ZERO);
        assert_eq!(unlock.keystroke_delay, Duration::ZERO);
    }
}
