//! Data model: search codes, captured tables and parsed records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::result::{ScrapeError, ScrapeResult};

/// Caller-supplied wait-list identifier, trimmed, otherwise opaque
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchCode(String);

impl SearchCode {
    /// Trim `raw` and reject it when nothing is left
    pub fn parse(raw: &str) -> ScrapeResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ScrapeError::EmptyCode);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The trimmed code
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SearchCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Header texts and first-row cells as rendered by the page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    /// `thead th` texts, trimmed and upper-cased
    #[serde(default)]
    pub headers: Vec<String>,
    /// First `tbody tr` cell texts, trimmed
    #[serde(default)]
    pub cells: Vec<String>,
}

impl RawTable {
    /// Create a table from header and cell texts
    #[must_use]
    pub fn new<H, C>(headers: H, cells: C) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the first row has no cells
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Parsed outcome of one successful scrape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Echo of the submitted code
    #[serde(rename = "codigo_solicitacao")]
    pub code: String,
    /// Procedure name
    #[serde(rename = "procedimento")]
    pub procedure: String,
    /// Position in the queue
    #[serde(rename = "posicao")]
    pub queue_position: Option<u64>,
    /// Wait time in days
    #[serde(rename = "tempo_espera_dias")]
    pub wait_days: Option<u64>,
    /// Risk classification
    #[serde(rename = "classificacao_risco")]
    pub risk_class: String,
    /// Request date, as rendered
    #[serde(rename = "data_solicitacao")]
    pub requested_on: String,
    /// Reserved, always empty
    pub status: String,
}

/// One entry of a batch response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchEntry {
    /// Successful scrape
    Record(ResultRecord),
    /// Classified failure for one code
    Failure {
        /// The code that failed
        #[serde(rename = "codigo_solicitacao")]
        code: String,
        /// Error detail
        error: String,
    },
}

impl BatchEntry {
    /// Build an entry from a scrape outcome
    #[must_use]
    pub fn from_outcome(code: &str, outcome: ScrapeResult<ResultRecord>) -> Self {
        match outcome {
            Ok(record) => Self::Record(record),
            Err(err) => Self::Failure {
                code: code.to_string(),
                error: err.to_string(),
            },
        }
    }

    /// Code this entry belongs to
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Record(record) => &record.code,
            Self::Failure { code, .. } => code,
        }
    }

    /// Check if the entry is a failure
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}
