//! In-page JavaScript used through [`crate::driver::PageDriver::evaluate`].

use crate::driver::Probe;
use crate::selectors;

/// Function declaration run against a card element; returns its title text.
pub const CARD_TITLE_FN: &str = r#"function() {
    const el = this.querySelector(".fontHeadlineSmall");
    return el ? el.textContent : "";
}"#;

/// Function declaration that centers an element in the viewport.
pub const SCROLL_INTO_VIEW_FN: &str = r#"function() {
    this.scrollIntoView({ behavior: "smooth", block: "center" });
}"#;

/// `true` once the detail panel's title has non-empty text.
pub const DETAIL_READY: &str = r#"(() => {
    const title = document.querySelector("h1.DUwDvf");
    return !!(title && title.textContent && title.textContent.trim().length > 0);
})()"#;

/// Scroll position and extent of the feed, or `null` if it is gone.
pub const FEED_EXTENT: &str = r#"(() => {
    const el = document.querySelector('div[role="feed"]');
    return el ? { scrollTop: el.scrollTop, scrollHeight: el.scrollHeight } : null;
})()"#;

/// Visible text of the whole document.
pub const BODY_TEXT: &str = r#"(() => document.body ? document.body.innerText : "")()"#;

/// `true` once the document has been parsed.
pub const DOM_READY: &str = r#"document.readyState !== "loading""#;

/// Scrolls the feed down by `step_px`.
#[must_use]
pub fn scroll_feed(step_px: u32) -> String {
    format!(
        r#"(() => {{
    const el = document.querySelector({feed});
    if (el) el.scrollBy(0, {step_px});
}})()"#,
        feed = js_string(selectors::FEED),
    )
}

/// Expression resolving a [`Probe`] against the live document.
#[must_use]
pub fn probe(probe: &Probe) -> String {
    match probe {
        Probe::Text(selector) => format!(
            "(() => {{ const el = document.querySelector({}); return el ? el.innerText : null; }})()",
            js_string(selector)
        ),
        Probe::Href(selector) => format!(
            "(() => {{ const el = document.querySelector({}); return el ? el.href : null; }})()",
            js_string(selector)
        ),
        Probe::JoinedRows(selector) => format!(
            "(() => {{ const rows = Array.from(document.querySelectorAll({})).map((r) => r.innerText); \
             return rows.length ? rows.join(\" | \") : null; }})()",
            js_string(selector)
        ),
        Probe::AriaLabel(selector) => format!(
            "(() => {{ const el = document.querySelector({}); return el ? el.getAttribute(\"aria-label\") : null; }})()",
            js_string(selector)
        ),
        Probe::PriceSymbol => "(() => { const s = Array.from(document.querySelectorAll(\"span\"))\
             .find((s) => /^[$€£]{1,4}$/.test(s.innerText.trim())); return s ? s.innerText : null; })()"
            .to_string(),
    }
}

/// Quotes `s` as a JavaScript string literal.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_owned()).to_string()
}
