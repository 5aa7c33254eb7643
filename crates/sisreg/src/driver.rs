//! Page driver: one full request/response cycle on an open session.
//!
//! ```text
//! navigate ─► DOM parsed ─► network quiet ─► search mode ─► resolve field
//!     ─► populate ─► submit ─► result row? ─► capture table
//!                                  │
//!                                  └─ timeout ─► "no records" text? ─► NotFound
//!                                                         └─ else ─► ResultsTimeout
//! ```

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::time::Instant;

use crate::config::ScraperConfig;
use crate::locator::{result_row, submit_candidates, Selector};
use crate::record::{RawTable, SearchCode};
use crate::resolver::{ensure_search_mode, resolve_field};
use crate::result::{ScrapeError, ScrapeResult};
use crate::strategy::{first_success, millis, poll_until, Verdict};
use crate::surface::FormSurface;
use crate::unlocker::populate;

/// Zero-record notices the page shows instead of a table
static NO_RECORDS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|[^0-9])0\s+registros?\b|nenhum\s+registro").ok());

/// Whether page text carries a zero-record notice
#[must_use]
pub fn reports_no_records(text: &str) -> bool {
    NO_RECORDS.as_ref().is_some_and(|re| re.is_match(text))
}

struct Bounded {
    selector: Selector,
    bound: Duration,
}

impl fmt::Display for Bounded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}ms)", self.selector, self.bound.as_millis())
    }
}

/// Drive the form for `code` and capture the result table
pub async fn run<S: FormSurface + ?Sized>(
    surface: &mut S,
    code: &SearchCode,
    config: &ScraperConfig,
) -> ScrapeResult<RawTable> {
    surface.navigate(&config.target_url).await?;
    wait_until_loaded(&*surface, config).await?;

    let surface = &*surface;
    ensure_search_mode(surface, config).await;
    resolve_field(surface, config).await?;
    populate(surface, code, config).await?;
    submit(surface, config).await?;
    await_results(surface, code, config).await?;

    let table = surface.capture_table().await?;
    tracing::debug!(
        headers = table.headers.len(),
        cells = table.cells.len(),
        "result table captured"
    );
    Ok(table)
}

/// Wait for the DOM to be parsed, then for resource loading to go quiet
async fn wait_until_loaded<S: FormSurface + ?Sized>(
    surface: &S,
    config: &ScraperConfig,
) -> ScrapeResult<()> {
    let timeouts = config.timeouts;
    let parsed = poll_until(timeouts.action, timeouts.poll_interval, || async move {
        Ok::<_, ScrapeError>(surface.load_snapshot().await?.dom_parsed())
    })
    .await?;
    if !parsed {
        return Err(ScrapeError::Navigation {
            url: config.target_url.clone(),
            message: format!("DOM not ready within {}ms", millis(timeouts.action)),
        });
    }

    let deadline = Instant::now() + timeouts.action;
    let mut seen = surface.load_snapshot().await?.resources;
    let mut quiet_since = Instant::now();
    loop {
        if quiet_since.elapsed() >= timeouts.network_idle {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(ScrapeError::Navigation {
                url: config.target_url.clone(),
                message: format!("network not idle within {}ms", millis(timeouts.action)),
            });
        }
        tokio::time::sleep(timeouts.poll_interval).await;
        let resources = surface.load_snapshot().await?.resources;
        if resources != seen {
            seen = resources;
            quiet_since = Instant::now();
        }
    }
}

/// Click the submit control: accessible name first, text content second
async fn submit<S: FormSurface + ?Sized>(surface: &S, config: &ScraperConfig) -> ScrapeResult<()> {
    let timeouts = config.timeouts;
    let bounds = [timeouts.submit_click, timeouts.action];
    let plan: Vec<Bounded> = submit_candidates()
        .into_iter()
        .zip(bounds)
        .map(|(selector, bound)| Bounded { selector, bound })
        .collect();

    let tried = first_success("submit", &plan, |step| async move {
        let clicked = poll_until(step.bound, timeouts.poll_interval, || {
            surface.click(&step.selector)
        })
        .await?;
        let verdict = if clicked {
            Verdict::Hit(())
        } else {
            Verdict::Miss("not clickable".to_string())
        };
        Ok::<_, ScrapeError>(verdict)
    })
    .await;

    if tried.value.is_some() {
        Ok(())
    } else {
        Err(ScrapeError::input(format!(
            "submit control not clickable: {}",
            tried.log.summary()
        )))
    }
}

/// Wait for the first result row, classifying a timeout by the page text
async fn await_results<S: FormSurface + ?Sized>(
    surface: &S,
    code: &SearchCode,
    config: &ScraperConfig,
) -> ScrapeResult<()> {
    let timeouts = config.timeouts;
    let row = result_row();
    if poll_until(timeouts.results, timeouts.poll_interval, || surface.is_visible(&row)).await? {
        return Ok(());
    }

    let text = surface.page_text().await?;
    if reports_no_records(&text) {
        tracing::info!(code = %code, "page reports no records");
        Err(ScrapeError::NotFound {
            code: code.to_string(),
        })
    } else {
        Err(ScrapeError::ResultsTimeout {
            ms: millis(timeouts.results),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{Timeouts, UnlockPolicy};
    use crate::surface::{MockPage, MockSurface};

    fn config() -> ScraperConfig {
        ScraperConfig::new()
            .with_target_url("http://wait-list.test/lista-de-espera")
            .with_timeouts(Timeouts::instant())
            .with_unlock(UnlockPolicy::instant(2))
    }

    fn code(raw: &str) -> SearchCode {
        SearchCode::parse(raw).unwrap()
    }

    mod no_records_tests {
        use super::*;

        #[test]
        fn test_phrases() {
            assert!(reports_no_records("foram encontrados 0 registros"));
            assert!(reports_no_records("0 registro"));
            assert!(reports_no_records("nenhum registro encontrado"));
            assert!(reports_no_records("NENHUM REGISTRO"));
        }

        #[test]
        fn test_counts_other_than_zero() {
            assert!(!reports_no_records("10 registros encontrados"));
            assert!(!reports_no_records("1 registro"));
            assert!(!reports_no_records(""));
        }
    }

    mod run_tests {
        use super::*;

        #[tokio::test]
        async fn test_full_cycle() {
            let table = RawTable::new(["PROCEDIMENTO"], ["Consulta"]);
            let mut surface =
                MockSurface::new(MockPage::wait_list().with_record("123", table.clone()));
            let captured = run(&mut surface, &code("123"), &config()).await.unwrap();
            assert_eq!(captured, table);
            let history = surface.history();
            assert_eq!(history[0], "navigate:http://wait-list.test/lista-de-espera");
            assert!(history.iter().any(|c| c == "fill_field:123"));
            assert_eq!(history.last().map(String::as_str), Some("capture_table"));
        }

        #[tokio::test]
        async fn test_zero_records_is_not_found() {
            let mut surface = MockSurface::new(
                MockPage::wait_list().with_page_text("Foram encontrados 0 registros"),
            );
            let err = run(&mut surface, &code("555"), &config()).await.unwrap_err();
            assert!(matches!(err, ScrapeError::NotFound { ref code } if code == "555"));
        }

        #[tokio::test]
        async fn test_silent_page_times_out() {
            let mut surface = MockSurface::new(MockPage::wait_list());
            let err = run(&mut surface, &code("555"), &config()).await.unwrap_err();
            assert!(matches!(err, ScrapeError::ResultsTimeout { ms: 5 }));
            assert_eq!(err.status_code(), 504);
        }

        #[tokio::test]
        async fn test_submit_text_fallback() {
            let submit = submit_candidates();
            let page = MockPage::wait_list()
                .hide(&submit[0])
                .show(&submit[1])
                .with_record("9", RawTable::new(["A"], ["b"]));
            let mut surface = MockSurface::new(page);
            run(&mut surface, &code("9"), &config()).await.unwrap();
            assert!(surface.was_called(&format!("click:{}", submit[1])));
        }

        #[tokio::test]
        async fn test_missing_submit_is_input_failure() {
            let page = MockPage::wait_list().hide(&submit_candidates()[0]);
            let mut surface = MockSurface::new(page);
            let err = run(&mut surface, &code("9"), &config()).await.unwrap_err();
            assert!(matches!(err, ScrapeError::Input { .. }));
            assert!(err.to_string().contains("submit control not clickable"));
        }

        #[tokio::test]
        async fn test_navigation_failure_propagates() {
            let page = MockPage::wait_list().with_navigation_failure("net::ERR_TIMED_OUT");
            let mut surface = MockSurface::new(page);
            let err = run(&mut surface, &code("9"), &config()).await.unwrap_err();
            assert!(matches!(err, ScrapeError::Navigation { .. }));
        }
    }
}
