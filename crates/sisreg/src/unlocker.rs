//! Field population.
//!
//! The remote form re-disables its code input from its own scripts, so a
//! single fill is not enough. Each round strips the locks and tries the
//! regular fill and then keyboard typing, verifying the underlying value
//! after each. When every round fails, the value is assigned directly as a
//! last resort.

use std::fmt;

use crate::config::ScraperConfig;
use crate::record::SearchCode;
use crate::result::{ScrapeError, ScrapeResult};
use crate::strategy::{first_success, AttemptLog, AttemptOutcome, Verdict};
use crate::surface::FormSurface;

/// Ways to get the code into the input, in escalation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockStrategy {
    /// Regular fill, only when the input reports itself editable
    FillWhenEditable,
    /// Click, select all, delete, then type character by character
    TypeByKeyboard,
    /// Assign the value property and dispatch input/change events
    LastResort,
}

impl fmt::Display for UnlockStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FillWhenEditable => "fill",
            Self::TypeByKeyboard => "type",
            Self::LastResort => "assign",
        })
    }
}

const ROUND_STRATEGIES: [UnlockStrategy; 2] = [
    UnlockStrategy::FillWhenEditable,
    UnlockStrategy::TypeByKeyboard,
];

async fn verify<S: FormSurface + ?Sized>(surface: &S, code: &str) -> ScrapeResult<Verdict<()>> {
    let value = surface.field_value().await?;
    if value.trim() == code {
        Ok(Verdict::Hit(()))
    } else {
        Ok(Verdict::Miss(format!("field holds {value:?}")))
    }
}

async fn attempt<S: FormSurface + ?Sized>(
    surface: &S,
    strategy: UnlockStrategy,
    code: &str,
    config: &ScraperConfig,
) -> ScrapeResult<Verdict<()>> {
    match strategy {
        UnlockStrategy::FillWhenEditable => {
            let state = surface.field_state().await?;
            if !state.editable {
                return Ok(Verdict::Miss(format!(
                    "not editable (enabled: {})",
                    state.enabled
                )));
            }
            surface.fill_field(code).await?;
        }
        UnlockStrategy::TypeByKeyboard => {
            surface.click_field().await?;
            surface.clear_field_by_keyboard().await?;
            for ch in code.chars() {
                surface.type_char(ch).await?;
                if !config.unlock.keystroke_delay.is_zero() {
                    tokio::time::sleep(config.unlock.keystroke_delay).await;
                }
            }
        }
        UnlockStrategy::LastResort => surface.force_value(code).await?,
    }
    verify(surface, code).await
}

/// Make the resolved code input hold `code`.
///
/// Returns the attempt log on success; fails with
/// [`ScrapeError::FieldNotPopulated`] once every round and the last resort
/// are exhausted.
pub async fn populate<S: FormSurface + ?Sized>(
    surface: &S,
    code: &SearchCode,
    config: &ScraperConfig,
) -> ScrapeResult<AttemptLog> {
    let code = code.as_str();
    let mut log = AttemptLog::new("populate-field");

    for round in 1..=config.unlock.rounds {
        if let Err(err) = surface.strip_locks().await {
            log.record(format!("strip#{round}"), AttemptOutcome::Failed(err.to_string()));
        }

        let tried = first_success("populate-field", &ROUND_STRATEGIES, |strategy| {
            attempt(surface, *strategy, code, config)
        })
        .await;
        log.extend(tried.log);

        if tried.value.is_some() {
            tracing::debug!(round, "code field populated");
            settle(config).await;
            return Ok(log);
        }

        if round < config.unlock.rounds && !config.unlock.round_pause.is_zero() {
            tokio::time::sleep(config.unlock.round_pause).await;
        }
    }

    match attempt(surface, UnlockStrategy::LastResort, code, config).await {
        Ok(Verdict::Hit(())) => {
            log.record(UnlockStrategy::LastResort.to_string(), AttemptOutcome::Succeeded);
            tracing::debug!("code field populated by direct assignment");
            settle(config).await;
            Ok(log)
        }
        Ok(Verdict::Miss(reason)) => {
            log.record(UnlockStrategy::LastResort.to_string(), AttemptOutcome::Missed(reason));
            tracing::warn!(attempts = %log.summary(), "code field never held the code");
            Err(ScrapeError::FieldNotPopulated)
        }
        Err(err) => {
            log.record(
                UnlockStrategy::LastResort.to_string(),
                AttemptOutcome::Failed(err.to_string()),
            );
            tracing::warn!(attempts = %log.summary(), "code field never held the code");
            Err(ScrapeError::FieldNotPopulated)
        }
    }
}

async fn settle(config: &ScraperConfig) {
    if !config.unlock.settle.is_zero() {
        tokio::time::sleep(config.unlock.settle).await;
    }
}
