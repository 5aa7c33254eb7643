//! Page surface abstraction.
//!
//! [`FormSurface`] is the narrow set of page operations the resolver,
//! unlocker and page driver need. The CDP backend in [`crate::browser`]
//! implements it against a live Chromium page; [`MockSurface`] implements it
//! against a scripted in-memory page so every cascade can be exercised
//! without a browser.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::Deserialize;

use crate::locator::{
    code_field_candidates, result_row, search_mode_toggles, submit_candidates, Selector,
};
use crate::record::RawTable;
use crate::result::{ScrapeError, ScrapeResult};

/// Document readiness sample
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSnapshot {
    /// `document.readyState`
    pub ready_state: String,
    /// Resource timing entries recorded so far
    pub resources: usize,
}

impl LoadSnapshot {
    /// Whether the DOM has been parsed
    #[must_use]
    pub fn dom_parsed(&self) -> bool {
        self.ready_state != "loading"
    }
}

/// Editability of the code input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct FieldState {
    /// Not disabled
    pub enabled: bool,
    /// Enabled and not read-only
    pub editable: bool,
}

/// Page operations used by the scraping core
#[async_trait]
pub trait FormSurface: Send + Sync {
    /// Navigate to `url`
    async fn navigate(&mut self, url: &str) -> ScrapeResult<()>;

    /// Sample document readiness
    async fn load_snapshot(&self) -> ScrapeResult<LoadSnapshot>;

    /// Whether the first match of `selector` is visible
    async fn is_visible(&self, selector: &Selector) -> ScrapeResult<bool>;

    /// Click the first visible match; `false` when nothing is visible
    async fn click(&self, selector: &Selector) -> ScrapeResult<bool>;

    /// Remember the first visible match as the code input
    async fn mark_field(&self, selector: &Selector) -> ScrapeResult<bool>;

    /// Remove disabled/read-only attributes and properties from the code input
    async fn strip_locks(&self) -> ScrapeResult<()>;

    /// Editability of the code input
    async fn field_state(&self) -> ScrapeResult<FieldState>;

    /// Replace the code input's content through the regular fill path
    async fn fill_field(&self, value: &str) -> ScrapeResult<()>;

    /// Click the code input to focus it
    async fn click_field(&self) -> ScrapeResult<()>;

    /// Select all text in the focused code input and delete it
    async fn clear_field_by_keyboard(&self) -> ScrapeResult<()>;

    /// Type one character into the focused element
    async fn type_char(&self, ch: char) -> ScrapeResult<()>;

    /// Assign the value property directly and dispatch input/change events
    async fn force_value(&self, value: &str) -> ScrapeResult<()>;

    /// Underlying value of the code input
    async fn field_value(&self) -> ScrapeResult<String>;

    /// Visible page text, lower-cased
    async fn page_text(&self) -> ScrapeResult<String>;

    /// Header texts and first-row cells of the result table
    async fn capture_table(&self) -> ScrapeResult<RawTable>;

    /// Release the rendering session
    async fn close(&mut self) -> ScrapeResult<()>;
}

/// Opens one isolated rendering session per scrape
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    /// Session type produced by this launcher
    type Session: FormSurface;

    /// Start a fresh session
    async fn launch(&self) -> ScrapeResult<Self::Session>;
}

// ============================================================================
// Scripted implementation
// ============================================================================

/// How the scripted code input reacts to each population strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldBehavior {
    /// Becomes editable once its locks are stripped
    Editable,
    /// Keeps reporting read-only, but accepts keyboard input
    KeyboardOnly,
    /// Ignores fill and typing; only direct assignment sticks
    ScriptOnly,
    /// Never holds any value
    Frozen,
}

/// Scripted page content
#[derive(Debug, Clone)]
pub struct MockPage {
    /// Labels (`Selector` display strings) of visible elements
    pub visible: HashSet<String>,
    /// Code input behavior
    pub field: FieldBehavior,
    /// Result table per submitted code
    pub tables: HashMap<String, RawTable>,
    /// Page text shown when no table renders
    pub page_text: String,
    /// Navigation failure message
    pub fail_navigation: Option<String>,
}

impl MockPage {
    /// The wait-list form as normally rendered: mode label, code input and
    /// submit button visible, field disabled until unlocked, no records
    #[must_use]
    pub fn wait_list() -> Self {
        let visible = [
            search_mode_toggles()[0].to_string(),
            code_field_candidates()[0].to_string(),
            submit_candidates()[0].to_string(),
        ]
        .into_iter()
        .collect();
        Self {
            visible,
            field: FieldBehavior::Editable,
            tables: HashMap::new(),
            page_text: String::new(),
            fail_navigation: None,
        }
    }

    /// Add a result table for `code`
    #[must_use]
    pub fn with_record(mut self, code: impl Into<String>, table: RawTable) -> Self {
        self.tables.insert(code.into(), table);
        self
    }

    /// Set code input behavior
    #[must_use]
    pub const fn with_field(mut self, field: FieldBehavior) -> Self {
        self.field = field;
        self
    }

    /// Set the page text
    #[must_use]
    pub fn with_page_text(mut self, text: impl Into<String>) -> Self {
        self.page_text = text.into();
        self
    }

    /// Make an element visible
    #[must_use]
    pub fn show(mut self, selector: &Selector) -> Self {
        self.visible.insert(selector.to_string());
        self
    }

    /// Make an element invisible
    #[must_use]
    pub fn hide(mut self, selector: &Selector) -> Self {
        self.visible.remove(&selector.to_string());
        self
    }

    /// Fail navigation with `message`
    #[must_use]
    pub fn with_navigation_failure(mut self, message: impl Into<String>) -> Self {
        self.fail_navigation = Some(message.into());
        self
    }
}

#[derive(Debug, Default)]
struct MockState {
    marked: Option<String>,
    unlocked: bool,
    value: String,
    submitted: Option<String>,
}

/// Shared call journal
pub type Journal = Arc<Mutex<Vec<String>>>;

/// Scripted surface for tests
#[derive(Debug)]
pub struct MockSurface {
    page: MockPage,
    state: Mutex<MockState>,
    journal: Journal,
}

impl MockSurface {
    /// Create a surface over `page`
    #[must_use]
    pub fn new(page: MockPage) -> Self {
        Self::with_journal(page, Journal::default())
    }

    /// Create a surface that appends calls to an existing journal
    #[must_use]
    pub fn with_journal(page: MockPage, journal: Journal) -> Self {
        Self {
            page,
            state: Mutex::new(MockState::default()),
            journal,
        }
    }

    /// Calls made so far
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Check if a method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.history().iter().any(|c| c.starts_with(method))
    }

    /// Current value of the scripted code input
    #[must_use]
    pub fn value(&self) -> String {
        self.state().value.clone()
    }

    fn log(&self, call: impl Into<String>) {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call.into());
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn require_field(&self) -> ScrapeResult<()> {
        if self.state().marked.is_some() {
            Ok(())
        } else {
            Err(ScrapeError::script("Error: code field is gone"))
        }
    }

    fn accepts_keyboard(&self) -> bool {
        matches!(
            self.page.field,
            FieldBehavior::Editable | FieldBehavior::KeyboardOnly
        )
    }
}

#[async_trait]
impl FormSurface for MockSurface {
    async fn navigate(&mut self, url: &str) -> ScrapeResult<()> {
        self.log(format!("navigate:{url}"));
        match &self.page.fail_navigation {
            Some(message) => Err(ScrapeError::Navigation {
                url: url.to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn load_snapshot(&self) -> ScrapeResult<LoadSnapshot> {
        Ok(LoadSnapshot {
            ready_state: "complete".to_string(),
            resources: 3,
        })
    }

    async fn is_visible(&self, selector: &Selector) -> ScrapeResult<bool> {
        if *selector == result_row() {
            let state = self.state();
            return Ok(state
                .submitted
                .as_ref()
                .is_some_and(|code| self.page.tables.contains_key(code)));
        }
        Ok(self.page.visible.contains(&selector.to_string()))
    }

    async fn click(&self, selector: &Selector) -> ScrapeResult<bool> {
        if !self.page.visible.contains(&selector.to_string()) {
            return Ok(false);
        }
        self.log(format!("click:{selector}"));
        if submit_candidates().contains(selector) {
            let mut state = self.state();
            state.submitted = Some(state.value.trim().to_string());
        }
        Ok(true)
    }

    async fn mark_field(&self, selector: &Selector) -> ScrapeResult<bool> {
        if !self.page.visible.contains(&selector.to_string()) {
            return Ok(false);
        }
        self.log(format!("mark_field:{selector}"));
        self.state().marked = Some(selector.to_string());
        Ok(true)
    }

    async fn strip_locks(&self) -> ScrapeResult<()> {
        self.require_field()?;
        self.log("strip_locks");
        if self.page.field == FieldBehavior::Editable {
            self.state().unlocked = true;
        }
        Ok(())
    }

    async fn field_state(&self) -> ScrapeResult<FieldState> {
        self.require_field()?;
        let unlocked = self.state().unlocked;
        Ok(FieldState {
            enabled: unlocked,
            editable: unlocked,
        })
    }

    async fn fill_field(&self, value: &str) -> ScrapeResult<()> {
        self.require_field()?;
        self.log(format!("fill_field:{value}"));
        let mut state = self.state();
        if !state.unlocked {
            return Err(ScrapeError::input("element is not editable"));
        }
        state.value = value.to_string();
        Ok(())
    }

    async fn click_field(&self) -> ScrapeResult<()> {
        self.require_field()?;
        self.log("click_field");
        Ok(())
    }

    async fn clear_field_by_keyboard(&self) -> ScrapeResult<()> {
        self.require_field()?;
        self.log("clear_field_by_keyboard");
        if self.accepts_keyboard() {
            self.state().value.clear();
        }
        Ok(())
    }

    async fn type_char(&self, ch: char) -> ScrapeResult<()> {
        if self.accepts_keyboard() {
            self.state().value.push(ch);
        }
        Ok(())
    }

    async fn force_value(&self, value: &str) -> ScrapeResult<()> {
        self.require_field()?;
        self.log(format!("force_value:{value}"));
        if self.page.field != FieldBehavior::Frozen {
            self.state().value = value.to_string();
        }
        Ok(())
    }

    async fn field_value(&self) -> ScrapeResult<String> {
        Ok(self.state().value.clone())
    }

    async fn page_text(&self) -> ScrapeResult<String> {
        Ok(self.page.page_text.to_lowercase())
    }

    async fn capture_table(&self) -> ScrapeResult<RawTable> {
        self.log("capture_table");
        let state = self.state();
        Ok(state
            .submitted
            .as_ref()
            .and_then(|code| self.page.tables.get(code))
            .cloned()
            .unwrap_or_default())
    }

    async fn close(&mut self) -> ScrapeResult<()> {
        self.log("close");
        Ok(())
    }
}

/// Launcher handing out [`MockSurface`]s over a shared journal
#[derive(Debug, Clone)]
pub struct MockLauncher {
    page: MockPage,
    journal: Journal,
    fail_launch: Option<String>,
}

impl MockLauncher {
    /// Create a launcher whose sessions all show `page`
    #[must_use]
    pub fn new(page: MockPage) -> Self {
        Self {
            page,
            journal: Journal::default(),
            fail_launch: None,
        }
    }

    /// Make every launch fail with `message`
    #[must_use]
    pub fn with_launch_failure(mut self, message: impl Into<String>) -> Self {
        self.fail_launch = Some(message.into());
        self
    }

    /// Calls made by every session so far
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of times `call` appears in the journal
    #[must_use]
    pub fn count(&self, call: &str) -> usize {
        self.history().iter().filter(|c| c.as_str() == call).count()
    }
}

#[async_trait]
impl SessionLauncher for MockLauncher {
    type Session = MockSurface;

    async fn launch(&self) -> ScrapeResult<MockSurface> {
        if let Some(message) = &self.fail_launch {
            return Err(ScrapeError::BrowserLaunch {
                message: message.clone(),
            });
        }
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push("launch".to_string());
        Ok(MockSurface::with_journal(
            self.page.clone(),
            Arc::clone(&self.journal),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_field_requires_marking() {
        let surface = MockSurface::new(MockPage::wait_list());
        assert!(surface.strip_locks().await.is_err());
        assert!(surface.mark_field(&code_field_candidates()[0]).await.unwrap());
        surface.strip_locks().await.unwrap();
        assert!(surface.field_state().await.unwrap().editable);
    }

    #[tokio::test]
    async fn test_mock_submit_records_value() {
        let table = RawTable::new(["PROCEDIMENTO"], ["Consulta"]);
        let surface = MockSurface::new(MockPage::wait_list().with_record("42", table.clone()));
        surface.mark_field(&code_field_candidates()[0]).await.unwrap();
        surface.force_value("42").await.unwrap();
        assert!(!surface.is_visible(&result_row()).await.unwrap());
        assert!(surface.click(&submit_candidates()[0]).await.unwrap());
        assert!(surface.is_visible(&result_row()).await.unwrap());
        assert_eq!(surface.capture_table().await.unwrap(), table);
    }

    #[tokio::test]
    async fn test_mock_hidden_elements_are_not_clickable() {
        let hidden = submit_candidates()[0].clone();
        let surface = MockSurface::new(MockPage::wait_list().hide(&hidden));
        assert!(!surface.click(&hidden).await.unwrap());
        assert!(!surface.was_called("click"));
    }

    #[tokio::test]
    async fn test_mock_launcher_shares_journal() {
        let launcher = MockLauncher::new(MockPage::wait_list());
        let mut first = launcher.launch().await.unwrap();
        first.close().await.unwrap();
        let mut second = launcher.launch().await.unwrap();
        second.close().await.unwrap();
        assert_eq!(launcher.count("launch"), 2);
        assert_eq!(launcher.count("close"), 2);
    }

    #[test]
    fn test_load_snapshot_dom_parsed() {
        let snapshot: LoadSnapshot =
            serde_json::from_str(r#"{"readyState":"loading","resources":0}"#).unwrap();
        assert!(!snapshot.dom_parsed());
        let snapshot: LoadSnapshot =
            serde_json::from_str(r#"{"readyState":"interactive","resources":7}"#).unwrap();
        assert!(snapshot.dom_parsed());
        assert_eq!(snapshot.resources, 7);
    }
}
