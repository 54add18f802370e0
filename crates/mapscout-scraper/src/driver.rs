//! The browser seam.
//!
//! The collection loop, extractor, and enricher only ever talk to a page
//! through [`PageDriver`] and [`DetailView`]. [`crate::chrome::ChromePage`]
//! is the production adapter; tests drive the same code with scripted
//! fakes.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("no element matches {selector}")]
    NotFound { selector: String },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("browser protocol error: {0}")]
    Protocol(String),
}

impl DriverError {
    pub(crate) fn timeout(what: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            what: what.into(),
            timeout_ms: millis(timeout),
        }
    }
}

pub(crate) fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// When a navigation counts as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// The `load` event has fired.
    Load,
    /// The document is parsed (`readyState` is no longer `loading`).
    DomContentLoaded,
}

/// Page-level operations needed by the scraper.
///
/// Element handles are snapshots: after a scroll or re-render they may refer
/// to nodes that no longer exist, and callers must re-query instead of
/// holding them across rounds.
#[async_trait]
pub trait PageDriver: Send + Sync {
    type Element: Send + Sync;
    /// An isolated page opened by [`PageDriver::open_context`].
    type Context: PageDriver;

    async fn navigate(&self, url: &str, wait: WaitPolicy, timeout: Duration)
        -> Result<(), DriverError>;

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Self::Element, DriverError>;

    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Element>, DriverError>;

    /// Evaluates a script expression against the live page and returns its
    /// value as plain JSON (`Null` for `undefined`).
    async fn evaluate(&self, script: &str) -> Result<Value, DriverError>;

    /// Calls `function` (a JS function declaration) with `this` bound to
    /// `element`.
    async fn evaluate_on(&self, element: &Self::Element, function: &str)
        -> Result<Value, DriverError>;

    async fn click(&self, element: &Self::Element) -> Result<(), DriverError>;

    async fn scroll_into_view(&self, element: &Self::Element) -> Result<(), DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    async fn open_context(&self) -> Result<Self::Context, DriverError>;

    async fn close_context(&self, context: Self::Context) -> Result<(), DriverError>;
}

/// One DOM lookup against the active detail panel.
///
/// Selectors are static so probes can key fixture maps in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Probe {
    /// `innerText` of the first match.
    Text(&'static str),
    /// Resolved `href` of the first matching anchor.
    Href(&'static str),
    /// `innerText` of every match joined with `" | "`.
    JoinedRows(&'static str),
    /// `aria-label` attribute of the first match.
    AriaLabel(&'static str),
    /// First `span` whose whole text is one to four currency symbols.
    PriceSymbol,
}

/// Read-only access to the currently active detail panel.
#[async_trait]
pub trait DetailView: Send + Sync {
    /// Returns the raw (unnormalized) text for `probe`, or `None` when
    /// nothing matches.
    async fn lookup(&self, probe: &Probe) -> Result<Option<String>, DriverError>;
}
