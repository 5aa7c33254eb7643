//! Selectors for the elements of the wait-list form.
//!
//! A [`Selector`] renders to a JavaScript expression that evaluates to the
//! first matching element (or `null`) under a `root` document chosen by the
//! page prelude in [`crate::script`]. Like Playwright's `.first`, only the
//! first match is considered; visibility is checked by the caller script.
//!
//! The ordered candidate lists at the bottom of this module are the fallback
//! cascades the resolver and the page driver walk through.

use std::fmt;

/// ARIA role used by role selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Radio button
    Radio,
    /// Push button
    Button,
}

impl Role {
    /// CSS matching elements that carry this role natively or explicitly
    #[must_use]
    pub const fn css(self) -> &'static str {
        match self {
            Self::Radio => r#"input[type="radio"], [role="radio"]"#,
            Self::Button => {
                r#"button, [role="button"], input[type="submit"], input[type="button"]"#
            }
        }
    }

    /// Role name as written in ARIA
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Radio => "radio",
            Self::Button => "button",
        }
    }
}

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// CSS selector (e.g., `input[name*="codigo" i]`)
    Css(String),
    /// Innermost element whose text contains the string, case-insensitive
    Text(String),
    /// Element with a role whose accessible name matches a regex, case-insensitive
    Role {
        /// Role to match
        role: Role,
        /// JavaScript regex source matched against the accessible name
        name: String,
    },
    /// CSS selector filtered by contained text, case-insensitive
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a role selector
    #[must_use]
    pub fn role(role: Role, name: impl Into<String>) -> Self {
        Self::Role {
            role,
            name: name.into(),
        }
    }

    /// Create a CSS selector filtered by text
    #[must_use]
    pub fn css_with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            text: text.into(),
        }
    }

    /// Convert to a JavaScript expression yielding the first match or `null`.
    ///
    /// Expects `root`, `__text` and `__name` in scope (see [`crate::script`]).
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::Css(s) => format!("root.querySelector({})", js_string(s)),
            Self::Text(t) => format!(
                "(() => {{ const needle = {}.toLowerCase(); \
                 const hits = Array.from(root.querySelectorAll('body *')) \
                 .filter(el => !['SCRIPT', 'STYLE', 'NOSCRIPT'].includes(el.tagName) \
                 && __text(el).toLowerCase().includes(needle)); \
                 return hits.find(el => !Array.from(el.children) \
                 .some(c => __text(c).toLowerCase().includes(needle))) || null; }})()",
                js_string(t)
            ),
            Self::Role { role, name } => format!(
                "(Array.from(root.querySelectorAll({})) \
                 .find(el => new RegExp({}, 'i').test(__name(el))) || null)",
                js_string(role.css()),
                js_string(name)
            ),
            Self::CssWithText { css, text } => format!(
                "(Array.from(root.querySelectorAll({})) \
                 .find(el => __text(el).toLowerCase().includes({}.toLowerCase())) || null)",
                js_string(css),
                js_string(text)
            ),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::Text(t) => write!(f, "text={t}"),
            Self::Role { role, name } => write!(f, "role={}[name=/{name}/i]", role.as_str()),
            Self::CssWithText { css, text } => write!(f, "css={css}:has-text({text})"),
        }
    }
}

/// Quote a string as a JavaScript literal
#[must_use]
pub fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Code-input candidates, most specific first
#[must_use]
pub fn code_field_candidates() -> Vec<Selector> {
    vec![
        Selector::css(r#"input[placeholder*="Código" i]"#),
        Selector::css(r#"input[placeholder*="codigo" i]"#),
        Selector::css(r#"input[placeholder*="solic" i]"#),
        Selector::css(r#"input[aria-label*="Código" i]"#),
        Selector::css(r#"[formcontrolname*="codigo" i]"#),
        Selector::css(r#"input[id*="codigo" i]"#),
        Selector::css(r#"input[name*="codigo" i]"#),
        Selector::css(r#"form input[type="text"]"#),
    ]
}

/// Ways to switch the form into "search by request code" mode
#[must_use]
pub fn search_mode_toggles() -> Vec<Selector> {
    vec![
        Selector::text("Código de solicitação"),
        Selector::role(Role::Radio, "Código.*solicita"),
        Selector::css(r#"mat-radio-button, input[type="radio"]"#),
    ]
}

/// Submit control, accessible name first, text content second
#[must_use]
pub fn submit_candidates() -> Vec<Selector> {
    vec![
        Selector::role(Role::Button, "Buscar"),
        Selector::css_with_text("button", "Buscar"),
    ]
}

/// First data row of the result table
#[must_use]
pub fn result_row() -> Selector {
    Selector::css("tbody tr")
}
