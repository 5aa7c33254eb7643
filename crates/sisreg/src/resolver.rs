//! Field resolution.
//!
//! Puts the form into "search by request code" mode and locates the code
//! input among the ordered candidates in [`crate::locator`].

use crate::config::ScraperConfig;
use crate::locator::{code_field_candidates, search_mode_toggles, Selector};
use crate::result::{ScrapeError, ScrapeResult};
use crate::strategy::{first_success, poll_until, wait_for, AttemptLog, Verdict};
use crate::surface::FormSurface;

/// Switch the form to "search by request code" mode.
///
/// Best effort: each toggle is retried for a short bound, failures are
/// logged and never block the scrape.
pub async fn ensure_search_mode<S: FormSurface + ?Sized>(
    surface: &S,
    config: &ScraperConfig,
) -> AttemptLog {
    let timeouts = config.timeouts;
    let toggles = search_mode_toggles();
    let tried = first_success("search-mode", &toggles, |toggle| async move {
        let clicked = poll_until(timeouts.mode_toggle, timeouts.poll_interval, || {
            surface.click(toggle)
        })
        .await?;
        let verdict = if clicked {
            Verdict::Hit(())
        } else {
            Verdict::Miss(format!(
                "not clickable within {}ms",
                timeouts.mode_toggle.as_millis()
            ))
        };
        Ok::<_, ScrapeError>(verdict)
    })
    .await;

    if !tried.log.succeeded() {
        tracing::warn!(attempts = %tried.log.summary(), "search mode toggle not found, continuing");
    }
    tried.log
}

/// Locate the code input: first candidate to become visible wins.
///
/// The winner is tagged in the page so later steps address it directly.
pub async fn resolve_field<S: FormSurface + ?Sized>(
    surface: &S,
    config: &ScraperConfig,
) -> ScrapeResult<Selector> {
    let timeouts = config.timeouts;
    let candidates = code_field_candidates();
    let tried = first_success("resolve-field", &candidates, |candidate| async move {
        let seen = wait_for(timeouts.field_visible, timeouts.poll_interval, || {
            surface.is_visible(candidate)
        })
        .await?;
        let verdict = match seen {
            Verdict::Hit(()) => {
                if surface.mark_field(candidate).await? {
                    Verdict::Hit(candidate.clone())
                } else {
                    Verdict::Miss("hidden before it could be marked".to_string())
                }
            }
            Verdict::Miss(reason) => Verdict::Miss(reason),
        };
        Ok::<_, ScrapeError>(verdict)
    })
    .await;

    match tried.value {
        Some(selector) => {
            tracing::debug!(selector = %selector, "code field resolved");
            Ok(selector)
        }
        None => {
            tracing::warn!(attempts = %tried.log.summary(), "code field not located");
            Err(ScrapeError::FieldNotFound)
        }
    }
}
