//! Result and error types for the scraper.
//!
//! Every failure that leaves [`crate::Scraper`] belongs to one of the
//! [`ErrorClass`] buckets. Backend variants (launch, navigation, script,
//! input) never reach callers directly: [`ScrapeError::classify`] folds them
//! into [`ScrapeError::Upstream`] while keeping the original kind and message.

use thiserror::Error;

/// Result type for scraper operations
pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// Coarse error class, one per HTTP status the API can answer with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Bad caller input or a form the page does not expose (400)
    Input,
    /// The page reports no matching record (404)
    NotFound,
    /// The remote page misbehaved or the session failed (502)
    Upstream,
    /// Results never rendered (504)
    Timeout,
}

impl ErrorClass {
    /// HTTP status code for this class
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Input => 400,
            Self::NotFound => 404,
            Self::Upstream => 502,
            Self::Timeout => 504,
        }
    }
}

/// Errors that can occur while scraping
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Search code was blank after trimming
    #[error("search code is empty")]
    EmptyCode,

    /// No candidate selector produced a visible code input
    #[error("field not located: no code input became visible on the page")]
    FieldNotFound,

    /// The code input could not be verified as holding the code
    #[error("could not populate field: code input never held the requested value")]
    FieldNotPopulated,

    /// The page explicitly reported zero records
    #[error("code {code} has no records")]
    NotFound {
        /// Submitted search code
        code: String,
    },

    /// The result table rendered without a data row
    #[error("code {code} not found or without data")]
    NoData {
        /// Submitted search code
        code: String,
    },

    /// The result table did not render in time
    #[error("timed out after {ms}ms waiting for results")]
    ResultsTimeout {
        /// Wait bound in milliseconds
        ms: u64,
    },

    /// Table headers were present but none matched a known column
    #[error("column layout unrecognized: headers {headers:?}")]
    HeaderDrift {
        /// Captured header texts
        headers: Vec<String>,
    },

    /// Reclassified session failure
    #[error("scraping failed: {kind}: {message}")]
    Upstream {
        /// Kind of the original failure
        kind: String,
        /// Original failure message
        message: String,
    },

    /// Browser executable could not be started
    #[error("failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation or load-state wait failed
    #[error("navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// In-page script evaluation failed
    #[error("script evaluation failed: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Input simulation failed
    #[error("input simulation failed: {message}")]
    Input {
        /// Error message
        message: String,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScrapeError {
    /// Create a script error
    #[must_use]
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }

    /// Create an input simulation error
    #[must_use]
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Short name of the variant, kept when the error is reclassified
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::EmptyCode => "EmptyCode",
            Self::FieldNotFound => "FieldNotFound",
            Self::FieldNotPopulated => "FieldNotPopulated",
            Self::NotFound { .. } => "NotFound",
            Self::NoData { .. } => "NoData",
            Self::ResultsTimeout { .. } => "ResultsTimeout",
            Self::HeaderDrift { .. } => "HeaderDrift",
            Self::Upstream { .. } => "Upstream",
            Self::BrowserLaunch { .. } => "BrowserLaunch",
            Self::Navigation { .. } => "Navigation",
            Self::Script { .. } => "Script",
            Self::Input { .. } => "Input",
            Self::Json(_) => "Json",
        }
    }

    /// Class of this error
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::EmptyCode | Self::FieldNotFound => ErrorClass::Input,
            Self::NotFound { .. } | Self::NoData { .. } => ErrorClass::NotFound,
            Self::ResultsTimeout { .. } => ErrorClass::Timeout,
            Self::FieldNotPopulated
            | Self::HeaderDrift { .. }
            | Self::Upstream { .. }
            | Self::BrowserLaunch { .. }
            | Self::Navigation { .. }
            | Self::Script { .. }
            | Self::Input { .. }
            | Self::Json(_) => ErrorClass::Upstream,
        }
    }

    /// HTTP status code for this error
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.class().status_code()
    }

    /// Whether this error is already one of the caller-facing variants
    #[must_use]
    pub const fn is_classified(&self) -> bool {
        matches!(
            self,
            Self::EmptyCode
                | Self::FieldNotFound
                | Self::FieldNotPopulated
                | Self::NotFound { .. }
                | Self::NoData { .. }
                | Self::ResultsTimeout { .. }
                | Self::HeaderDrift { .. }
                | Self::Upstream { .. }
        )
    }

    /// Fold backend failures into [`ScrapeError::Upstream`].
    ///
    /// Caller-facing variants pass through unchanged.
    #[must_use]
    pub fn classify(self) -> Self {
        if self.is_classified() {
            return self;
        }
        let kind = self.kind().to_string();
        let message = match &self {
            Self::BrowserLaunch { message }
            | Self::Script { message }
            | Self::Input { message } => message.clone(),
            other => other.to_string(),
        };
        Self::Upstream { kind, message }
    }
}
