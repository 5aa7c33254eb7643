//! Row extraction: captured table → [`ResultRecord`].
//!
//! Columns are found by header text (case and diacritic tolerant) and fall
//! back to fixed positions when the headers are missing or a matched cell
//! is empty.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::config::ExtractionPolicy;
use crate::record::{RawTable, ResultRecord, SearchCode};
use crate::result::{ScrapeError, ScrapeResult};

/// Record fields read from the result row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Procedure name
    Procedure,
    /// Queue position
    QueuePosition,
    /// Wait time in days
    WaitDays,
    /// Risk classification
    RiskClass,
    /// Request date
    RequestedOn,
}

impl Field {
    /// Every field, in record order
    pub const ALL: [Self; 5] = [
        Self::Procedure,
        Self::QueuePosition,
        Self::WaitDays,
        Self::RiskClass,
        Self::RequestedOn,
    ];

    /// Header fragments that identify the column, in priority order
    #[must_use]
    pub const fn fragments(self) -> &'static [&'static str] {
        match self {
            Self::Procedure => &["PROCEDIMENTO"],
            Self::QueuePosition => &["POSIÇÃO", "POSICAO"],
            Self::WaitDays => &["TEMPO DE ESPERA"],
            Self::RiskClass => &["CLASSIFICAÇÃO", "CLASSIFICACAO"],
            Self::RequestedOn => &["DATA DA SOLICITAÇÃO", "DATA DA SOLICITACAO"],
        }
    }

    /// Cell index used when no header identifies the column
    #[must_use]
    pub const fn fallback_index(self) -> usize {
        match self {
            Self::Procedure => 0,
            Self::QueuePosition => 1,
            Self::WaitDays => 2,
            Self::RiskClass => 4,
            Self::RequestedOn => 5,
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::Procedure => 0,
            Self::QueuePosition => 1,
            Self::WaitDays => 2,
            Self::RiskClass => 3,
            Self::RequestedOn => 4,
        }
    }
}

/// Upper-case `text` and drop combining marks (`Posição` → `POSICAO`)
#[must_use]
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_uppercase()
}

/// Header position of each field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderIndex {
    positions: [Option<usize>; 5],
}

impl HeaderIndex {
    /// Match every field against `headers`; the first header containing any
    /// fragment wins
    #[must_use]
    pub fn build(headers: &[String]) -> Self {
        let folded: Vec<String> = headers.iter().map(|h| fold(h)).collect();
        let mut positions = [None; 5];
        for field in Field::ALL {
            let fragments: Vec<String> = field.fragments().iter().map(|f| fold(f)).collect();
            positions[field.slot()] = folded
                .iter()
                .position(|header| fragments.iter().any(|f| header.contains(f.as_str())));
        }
        Self { positions }
    }

    /// Header index of `field`, if any header matched
    #[must_use]
    pub const fn position(&self, field: Field) -> Option<usize> {
        self.positions[field.slot()]
    }

    /// Whether at least one field matched a header
    #[must_use]
    pub fn matched_any(&self) -> bool {
        self.positions.iter().any(Option::is_some)
    }
}

/// Keep the digits of `text` and parse them; `None` when there are none or
/// the number does not fit
#[must_use]
pub fn parse_count(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

fn cell(table: &RawTable, index: &HeaderIndex, field: Field) -> String {
    let matched = index
        .position(field)
        .and_then(|i| table.cells.get(i))
        .filter(|c| !c.is_empty());
    matched
        .or_else(|| table.cells.get(field.fallback_index()))
        .cloned()
        .unwrap_or_default()
}

/// Build a record from the captured table.
///
/// Fails with [`ScrapeError::NoData`] when the row has no cells, and with
/// [`ScrapeError::HeaderDrift`] when the policy forbids guessing positions
/// under headers that match nothing.
pub fn extract(
    code: &SearchCode,
    table: &RawTable,
    policy: &ExtractionPolicy,
) -> ScrapeResult<ResultRecord> {
    if table.is_empty() {
        return Err(ScrapeError::NoData {
            code: code.to_string(),
        });
    }

    let index = HeaderIndex::build(&table.headers);
    let has_headers = table.headers.iter().any(|h| !h.trim().is_empty());
    if has_headers && !index.matched_any() {
        if policy.fail_on_header_drift {
            return Err(ScrapeError::HeaderDrift {
                headers: table.headers.clone(),
            });
        }
        tracing::warn!(headers = ?table.headers, "no header recognized, using positions");
    }

    Ok(ResultRecord {
        code: code.to_string(),
        procedure: cell(table, &index, Field::Procedure),
        queue_position: parse_count(&cell(table, &index, Field::QueuePosition)),
        wait_days: parse_count(&cell(table, &index, Field::WaitDays)),
        risk_class: cell(table, &index, Field::RiskClass),
        requested_on: cell(table, &index, Field::RequestedOn),
        status: String::new(),
    })
}
