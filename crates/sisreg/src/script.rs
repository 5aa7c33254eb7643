//! In-page scripts evaluated by the CDP backend.
//!
//! Every script is a self-contained IIFE. The shared prelude picks the
//! document that hosts the form (the top document, or a same-origin frame
//! whose URL contains the frame hint) and defines the small helpers the
//! [`Selector`] queries rely on.

use crate::locator::{js_string, Selector};

/// Attribute that tags the resolved code input
pub const FIELD_MARKER: &str = "data-sisreg-field";

fn prelude(frame_hint: &str) -> String {
    format!(
        r#"const __hint = {hint};
  const root = (() => {{
    if (location.href.includes(__hint)) return document;
    for (const f of document.querySelectorAll('iframe')) {{
      try {{
        if ((f.src || '').includes(__hint) && f.contentDocument) return f.contentDocument;
      }} catch (_) {{}}
    }}
    return document;
  }})();
  const __text = (el) => String((el && (el.innerText || el.textContent)) || '').replace(/\s+/g, ' ');
  const __name = (el) => {{
    const aria = el.getAttribute('aria-label');
    if (aria) return aria.trim();
    const labelled = el.labels && el.labels.length ? __text(el.labels[0]) : '';
    if (labelled) return labelled.trim();
    const wrapper = el.closest('mat-radio-button, label');
    if (wrapper && wrapper !== el) return __text(wrapper).trim();
    return (__text(el) || el.value || el.getAttribute('title') || '').trim();
  }};
  const __visible = (el) => {{
    if (!el) return false;
    const view = el.ownerDocument.defaultView || window;
    const style = view.getComputedStyle(el);
    if (style.visibility === 'hidden' || style.display === 'none') return false;
    return el.getClientRects().length > 0;
  }};
  const __field = () => root.querySelector('[{marker}]');"#,
        hint = js_string(frame_hint),
        marker = FIELD_MARKER,
    )
}

fn wrap(frame_hint: &str, body: &str) -> String {
    format!("(() => {{\n  {}\n  {}\n}})()", prelude(frame_hint), body)
}

/// `true` when the first match of `selector` is visible
#[must_use]
pub fn is_visible(frame_hint: &str, selector: &Selector) -> String {
    wrap(
        frame_hint,
        &format!("return __visible({});", selector.to_query()),
    )
}

/// Click the first visible match; `false` when there is none.
///
/// Radio buttons that are already checked are left alone.
#[must_use]
pub fn click(frame_hint: &str, selector: &Selector) -> String {
    wrap(
        frame_hint,
        &format!(
            r"const el = {};
  if (!__visible(el)) return false;
  if (el.type === 'radio' && el.checked) return true;
  el.scrollIntoView({{ block: 'center' }});
  el.click();
  return true;",
            selector.to_query()
        ),
    )
}

/// Tag the first visible match as the code input; `false` when there is none
#[must_use]
pub fn mark_field(frame_hint: &str, selector: &Selector) -> String {
    wrap(
        frame_hint,
        &format!(
            r"const el = {};
  if (!__visible(el)) return false;
  root.querySelectorAll('[{marker}]').forEach(e => e.removeAttribute('{marker}'));
  el.setAttribute('{marker}', '1');
  return true;",
            selector.to_query(),
            marker = FIELD_MARKER,
        ),
    )
}

/// Remove every attribute and property that blocks editing
#[must_use]
pub fn strip_locks(frame_hint: &str) -> String {
    wrap(
        frame_hint,
        r"const el = __field();
  if (!el) return false;
  try { el.removeAttribute('disabled'); } catch (_) {}
  try { el.removeAttribute('aria-disabled'); } catch (_) {}
  try { el.removeAttribute('readonly'); } catch (_) {}
  try { el.disabled = false; } catch (_) {}
  try { el.readOnly = false; } catch (_) {}
  return true;",
    )
}

/// `{ enabled, editable }` of the code input
#[must_use]
pub fn field_state(frame_hint: &str) -> String {
    wrap(
        frame_hint,
        r"const el = __field();
  if (!el) return { enabled: false, editable: false };
  const enabled = !el.disabled && !el.closest('fieldset[disabled]');
  return { enabled, editable: enabled && !el.readOnly };",
    )
}

/// Focus the code input and select its content
#[must_use]
pub fn focus_and_select(frame_hint: &str) -> String {
    wrap(
        frame_hint,
        r"const el = __field();
  if (!el) throw new Error('code field is gone');
  el.focus();
  if (typeof el.select === 'function') el.select();
  return true;",
    )
}

/// Scroll to, focus and click the code input
#[must_use]
pub fn click_field(frame_hint: &str) -> String {
    wrap(
        frame_hint,
        r"const el = __field();
  if (!el) throw new Error('code field is gone');
  el.scrollIntoView({ block: 'center' });
  el.focus();
  el.click();
  return true;",
    )
}

/// Current underlying value of the code input
#[must_use]
pub fn field_value(frame_hint: &str) -> String {
    wrap(
        frame_hint,
        r"const el = __field();
  return el && el.value ? String(el.value) : '';",
    )
}

/// Assign the value property directly and announce it with bubbling events
#[must_use]
pub fn force_value(frame_hint: &str, value: &str) -> String {
    wrap(
        frame_hint,
        &format!(
            r"const el = __field();
  if (!el) throw new Error('code field is gone');
  try {{ el.disabled = false; el.readOnly = false; }} catch (_) {{}}
  try {{ el.removeAttribute('disabled'); el.removeAttribute('readonly'); }} catch (_) {{}}
  el.value = {};
  el.dispatchEvent(new Event('input', {{ bubbles: true }}));
  el.dispatchEvent(new Event('change', {{ bubbles: true }}));
  return true;",
            js_string(value)
        ),
    )
}

/// Header texts (trimmed, upper-cased) and first-row cell texts (trimmed)
#[must_use]
pub fn capture_table(frame_hint: &str) -> String {
    wrap(
        frame_hint,
        r"const headers = Array.from(root.querySelectorAll('thead th'))
    .map(th => String(th.innerText || th.textContent || '').trim().toUpperCase());
  const row = root.querySelector('tbody tr');
  const cells = row
    ? Array.from(row.querySelectorAll('td')).map(td => String(td.innerText || td.textContent || '').trim())
    : [];
  return { headers, cells };",
    )
}

/// Document ready state plus the number of resource entries seen so far
#[must_use]
pub fn load_snapshot() -> String {
    r"(() => ({
  readyState: document.readyState,
  resources: performance.getEntriesByType('resource').length
}))()"
        .to_string()
}

/// Lower-cased visible text of the form document
#[must_use]
pub fn page_text(frame_hint: &str) -> String {
    wrap(
        frame_hint,
        r"return String((root.body && (root.body.innerText || root.body.textContent)) || '').toLowerCase();",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::code_field_candidates;

    const HINT: &str = "lista-de-espera";

    #[test]
    fn test_scripts_are_iifes() {
        for script in [
            strip_locks(HINT),
            field_state(HINT),
            field_value(HINT),
            capture_table(HINT),
            page_text(HINT),
        ] {
            assert!(script.starts_with("(() => {"));
            assert!(script.ends_with("})()"));
            assert!(script.contains(r#"const __hint = "lista-de-espera";"#));
        }
    }

    #[test]
    fn test_mark_field_uses_marker() {
        let script = mark_field(HINT, &code_field_candidates()[0]);
        assert!(script.contains(FIELD_MARKER));
        assert!(script.contains("setAttribute"));
        assert!(script.contains("__visible"));
    }

    #[test]
    fn test_strip_locks_covers_attributes_and_properties() {
        let script = strip_locks(HINT);
        for needle in [
            "removeAttribute('disabled')",
            "removeAttribute('aria-disabled')",
            "removeAttribute('readonly')",
            "el.disabled = false",
            "el.readOnly = false",
        ] {
            assert!(script.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn test_force_value_dispatches_events() {
        let script = force_value(HINT, "12\"34");
        assert!(script.contains(r#"el.value = "12\"34";"#));
        assert!(script.contains("new Event('input'"));
        assert!(script.contains("new Event('change'"));
        assert!(script.contains("bubbles: true"));
    }

    #[test]
    fn test_capture_table_upper_cases_headers() {
        let script = capture_table(HINT);
        assert!(script.contains("thead th"));
        assert!(script.contains("toUpperCase"));
        assert!(script.contains("tbody tr"));
    }

    #[test]
    fn test_click_skips_checked_radio() {
        let script = click(HINT, &Selector::css("input[type=radio]"));
        assert!(script.contains("el.checked"));
        assert!(script.contains("el.click()"));
    }
}
