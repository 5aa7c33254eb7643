//! Ordered fallback strategies.
//!
//! The page is heuristic territory: selectors drift, inputs get re-disabled
//! by the front-end framework, buttons change labels. Every cascade in this
//! crate is expressed as an ordered list of strategies handed to
//! [`first_success`], which stops at the first hit and records every miss
//! or failure in an [`AttemptLog`] so nothing is swallowed silently.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::result::ScrapeResult;

/// Outcome of one strategy that ran without a hard error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict<T> {
    /// The strategy achieved its goal
    Hit(T),
    /// The strategy ran but did not achieve its goal
    Miss(String),
}

/// What happened to a single attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Goal achieved
    Succeeded,
    /// Ran, goal not achieved
    Missed(String),
    /// Raised an error
    Failed(String),
}

/// One recorded attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// Strategy label
    pub strategy: String,
    /// What happened
    pub outcome: AttemptOutcome,
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AttemptOutcome::Succeeded => write!(f, "{}: ok", self.strategy),
            AttemptOutcome::Missed(reason) => write!(f, "{}: {reason}", self.strategy),
            AttemptOutcome::Failed(reason) => write!(f, "{}: error: {reason}", self.strategy),
        }
    }
}

/// Attempts made by one cascade, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptLog {
    stage: String,
    attempts: Vec<Attempt>,
}

impl AttemptLog {
    /// Create an empty log for a stage
    #[must_use]
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            attempts: Vec::new(),
        }
    }

    /// Stage name
    #[must_use]
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Recorded attempts
    #[must_use]
    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    /// Whether any attempt succeeded
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| a.outcome == AttemptOutcome::Succeeded)
    }

    /// Record an attempt and emit it as a debug event
    pub fn record(&mut self, strategy: impl Into<String>, outcome: AttemptOutcome) {
        let attempt = Attempt {
            strategy: strategy.into(),
            outcome,
        };
        tracing::debug!(stage = %self.stage, attempt = %attempt, "strategy attempted");
        self.attempts.push(attempt);
    }

    /// Append the attempts of another log
    pub fn extend(&mut self, other: Self) {
        self.attempts.extend(other.attempts);
    }

    /// One-line summary of every attempt
    #[must_use]
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Result of running a cascade
#[derive(Debug)]
pub struct Tried<T> {
    /// Value produced by the winning strategy
    pub value: Option<T>,
    /// Every attempt made
    pub log: AttemptLog,
}

/// Run `strategies` in order until one hits.
///
/// Misses and errors are recorded and the next strategy is tried; nothing
/// is retried here (callers wrap the whole cascade in rounds when needed).
pub async fn first_success<'s, S, T, F, Fut>(
    stage: &str,
    strategies: &'s [S],
    mut run: F,
) -> Tried<T>
where
    S: fmt::Display,
    F: FnMut(&'s S) -> Fut,
    Fut: Future<Output = ScrapeResult<Verdict<T>>>,
{
    let mut log = AttemptLog::new(stage);
    for strategy in strategies {
        match run(strategy).await {
            Ok(Verdict::Hit(value)) => {
                log.record(strategy.to_string(), AttemptOutcome::Succeeded);
                return Tried {
                    value: Some(value),
                    log,
                };
            }
            Ok(Verdict::Miss(reason)) => {
                log.record(strategy.to_string(), AttemptOutcome::Missed(reason));
            }
            Err(err) => {
                log.record(strategy.to_string(), AttemptOutcome::Failed(err.to_string()));
            }
        }
    }
    Tried { value: None, log }
}

/// Poll `probe` until it reports `true` or `timeout` elapses.
///
/// The probe always runs at least once. Errors end the wait immediately.
pub async fn poll_until<F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> ScrapeResult<bool>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ScrapeResult<bool>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if probe().await? {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        tokio::time::sleep(interval).await;
    }
}

/// Poll a visibility-style probe and turn the answer into a [`Verdict`]
pub async fn wait_for<F, Fut>(
    timeout: Duration,
    interval: Duration,
    probe: F,
) -> ScrapeResult<Verdict<()>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ScrapeResult<bool>>,
{
    if poll_until(timeout, interval, probe).await? {
        Ok(Verdict::Hit(()))
    } else {
        Ok(Verdict::Miss(format!(
            "not visible within {}ms",
            timeout.as_millis()
        )))
    }
}

/// Milliseconds of a duration, saturating
#[must_use]
pub fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
