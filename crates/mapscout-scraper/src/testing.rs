//! Scripted stand-ins for a browser page, shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::config::CollectorConfig;
use crate::driver::{DetailView, DriverError, PageDriver, Probe, WaitPolicy};
use crate::{scripts, selectors};

/// Collector settings with every delay zeroed.
pub(crate) fn fast_config() -> CollectorConfig {
    CollectorConfig {
        consent_timeout: Duration::ZERO,
        feed_timeout: Duration::ZERO,
        detail_timeout: Duration::ZERO,
        poll_interval: Duration::ZERO,
        card_settle: Duration::ZERO,
        detail_settle: Duration::ZERO,
        scroll_settle: Duration::ZERO,
        enrich_timeout: Duration::from_secs(5),
        ..CollectorConfig::default()
    }
}

/// A result card and the detail panel it opens.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeCard {
    title: String,
    fields: HashMap<Probe, String>,
    broken: HashSet<Probe>,
    fail_click: bool,
}

impl FakeCard {
    /// Card whose detail panel shows the same name as its title.
    pub(crate) fn named(title: &str) -> Self {
        Self::titled(title).with(selectors::NAME[0], title)
    }

    /// Card whose detail panel shows nothing.
    pub(crate) fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    pub(crate) fn with(mut self, probe: Probe, value: &str) -> Self {
        self.fields.insert(probe, value.to_string());
        self
    }

    pub(crate) fn broken(mut self, probe: Probe) -> Self {
        self.broken.insert(probe);
        self
    }

    pub(crate) fn failing_click(mut self) -> Self {
        self.fail_click = true;
        self
    }

    fn lookup(&self, probe: &Probe) -> Result<Option<String>, DriverError> {
        if self.broken.contains(probe) {
            return Err(DriverError::Script(format!("{probe:?} threw")));
        }
        Ok(self.fields.get(probe).cloned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FakeElement {
    Consent,
    Feed,
    Card { snapshot: usize, index: usize },
}

#[derive(Debug, Default)]
struct FakeState {
    scrolls: usize,
    active: Option<(usize, usize)>,
    clicks: usize,
    navigations: Vec<String>,
    consent_clicked: bool,
    contexts_opened: usize,
    contexts_closed: usize,
}

/// A results page.
///
/// `snapshots[n]` is what the feed renders after `n` scrolls; once the list
/// runs out the last snapshot stays and the feed stops growing. An endless
/// page keeps growing on every scroll without rendering anything new.
#[derive(Debug, Default)]
pub(crate) struct FakePage {
    snapshots: Vec<Vec<FakeCard>>,
    endless: bool,
    no_feed: bool,
    consent: bool,
    broken_navigation: bool,
    sites: HashMap<String, String>,
    hanging_sites: HashSet<String>,
    cancel_on_click: Option<(usize, CancellationToken)>,
    state: Mutex<FakeState>,
}

impl FakePage {
    pub(crate) fn new(snapshots: Vec<Vec<FakeCard>>) -> Self {
        Self {
            snapshots,
            ..Self::default()
        }
    }

    pub(crate) fn endless(mut self) -> Self {
        self.endless = true;
        self
    }

    pub(crate) fn without_feed(mut self) -> Self {
        self.no_feed = true;
        self
    }

    pub(crate) fn with_consent(mut self) -> Self {
        self.consent = true;
        self
    }

    pub(crate) fn unreachable(mut self) -> Self {
        self.broken_navigation = true;
        self
    }

    pub(crate) fn with_site(mut self, url: &str, body: &str) -> Self {
        self.sites.insert(url.to_string(), body.to_string());
        self
    }

    /// A site whose navigation never completes.
    pub(crate) fn with_hanging_site(mut self, url: &str) -> Self {
        self.hanging_sites.insert(url.to_string());
        self
    }

    /// Fires `token` right after the `n`th card click.
    pub(crate) fn cancel_after_clicks(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_on_click = Some((n, token));
        self
    }

    pub(crate) fn clicks(&self) -> usize {
        self.state().clicks
    }

    pub(crate) fn scrolls(&self) -> usize {
        self.state().scrolls
    }

    pub(crate) fn navigations(&self) -> Vec<String> {
        self.state().navigations.clone()
    }

    pub(crate) fn consent_clicked(&self) -> bool {
        self.state().consent_clicked
    }

    pub(crate) fn contexts_opened(&self) -> usize {
        self.state().contexts_opened
    }

    pub(crate) fn contexts_closed(&self) -> usize {
        self.state().contexts_closed
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake page state poisoned")
    }

    fn snapshot_index(&self, scrolls: usize) -> usize {
        scrolls.min(self.snapshots.len().saturating_sub(1))
    }

    fn card(&self, snapshot: usize, index: usize) -> Option<&FakeCard> {
        self.snapshots.get(snapshot).and_then(|cards| cards.get(index))
    }

    fn active_card(&self) -> Option<&FakeCard> {
        let active = self.state().active;
        active.and_then(|(snapshot, index)| self.card(snapshot, index))
    }

    fn feed_extent(&self) -> Value {
        if self.no_feed {
            return Value::Null;
        }
        let scrolls = self.state().scrolls;
        let level = if self.endless {
            scrolls
        } else {
            self.snapshot_index(scrolls)
        };
        json!({ "scrollTop": level * 1000, "scrollHeight": (level + 1) * 1000 })
    }
}

#[async_trait]
impl PageDriver for FakePage {
    type Element = FakeElement;
    type Context = FakeSite;

    async fn navigate(&self, url: &str, _wait: WaitPolicy, _timeout: Duration) -> Result<(), DriverError> {
        self.state().navigations.push(url.to_string());
        if self.broken_navigation {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<FakeElement, DriverError> {
        match selector {
            selectors::CONSENT_BUTTON if self.consent && !self.state().consent_clicked => {
                Ok(FakeElement::Consent)
            }
            selectors::FEED if !self.no_feed => Ok(FakeElement::Feed),
            _ => Err(DriverError::timeout(selector, timeout)),
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<FakeElement>, DriverError> {
        if selector != selectors::CARD {
            return Ok(Vec::new());
        }
        let snapshot = self.snapshot_index(self.state().scrolls);
        let count = self.snapshots.get(snapshot).map_or(0, Vec::len);
        Ok((0..count)
            .map(|index| FakeElement::Card { snapshot, index })
            .collect())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, DriverError> {
        if script == scripts::DETAIL_READY {
            let ready = self
                .active_card()
                .and_then(|card| card.fields.get(&selectors::NAME[0]))
                .is_some_and(|name| !name.trim().is_empty());
            return Ok(Value::Bool(ready));
        }
        if script == scripts::FEED_EXTENT {
            return Ok(self.feed_extent());
        }
        if script.contains("scrollBy") {
            self.state().scrolls += 1;
            return Ok(Value::Null);
        }
        Err(DriverError::Script(format!("unexpected script: {script}")))
    }

    async fn evaluate_on(&self, element: &FakeElement, function: &str) -> Result<Value, DriverError> {
        match (element, function) {
            (FakeElement::Card { snapshot, index }, scripts::CARD_TITLE_FN) => self
                .card(*snapshot, *index)
                .map(|card| Value::String(card.title.clone()))
                .ok_or_else(|| DriverError::Script("detached card".to_string())),
            _ => Err(DriverError::Script(format!("unexpected function: {function}"))),
        }
    }

    async fn click(&self, element: &FakeElement) -> Result<(), DriverError> {
        match *element {
            FakeElement::Consent => {
                self.state().consent_clicked = true;
                Ok(())
            }
            FakeElement::Feed => Ok(()),
            FakeElement::Card { snapshot, index } => {
                let card = self
                    .card(snapshot, index)
                    .ok_or_else(|| DriverError::Protocol("detached card".to_string()))?;
                let clicks = {
                    let mut state = self.state();
                    state.clicks += 1;
                    state.clicks
                };
                if let Some((after, token)) = &self.cancel_on_click {
                    if clicks >= *after {
                        token.cancel();
                    }
                }
                if card.fail_click {
                    return Err(DriverError::Protocol("node is detached from document".to_string()));
                }
                self.state().active = Some((snapshot, index));
                Ok(())
            }
        }
    }

    async fn scroll_into_view(&self, _element: &FakeElement) -> Result<(), DriverError> {
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(match self.active_card() {
            Some(card) => format!("https://maps.example/place/{}", card.title.replace(' ', "+")),
            None => "https://maps.example/search".to_string(),
        })
    }

    async fn open_context(&self) -> Result<FakeSite, DriverError> {
        self.state().contexts_opened += 1;
        Ok(FakeSite {
            sites: self.sites.clone(),
            hanging: self.hanging_sites.clone(),
            body: Mutex::new(None),
        })
    }

    async fn close_context(&self, _context: FakeSite) -> Result<(), DriverError> {
        self.state().contexts_closed += 1;
        Ok(())
    }
}

#[async_trait]
impl DetailView for FakePage {
    async fn lookup(&self, probe: &Probe) -> Result<Option<String>, DriverError> {
        match self.active_card() {
            Some(card) => card.lookup(probe),
            None => Ok(None),
        }
    }
}

/// A page opened by [`FakePage::open_context`] that serves canned sites.
#[derive(Debug)]
pub(crate) struct FakeSite {
    sites: HashMap<String, String>,
    hanging: HashSet<String>,
    body: Mutex<Option<String>>,
}

#[async_trait]
impl PageDriver for FakeSite {
    type Element = ();
    type Context = FakeSite;

    async fn navigate(&self, url: &str, _wait: WaitPolicy, _timeout: Duration) -> Result<(), DriverError> {
        if self.hanging.contains(url) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        let body = self.sites.get(url).cloned().ok_or_else(|| DriverError::Navigation {
            url: url.to_string(),
            reason: "net::ERR_CONNECTION_REFUSED".to_string(),
        })?;
        *self.body.lock().expect("fake site poisoned") = Some(body);
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> Result<(), DriverError> {
        Err(DriverError::NotFound {
            selector: selector.to_string(),
        })
    }

    async fn query_all(&self, _selector: &str) -> Result<Vec<()>, DriverError> {
        Ok(Vec::new())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, DriverError> {
        if script != scripts::BODY_TEXT {
            return Err(DriverError::Script(format!("unexpected script: {script}")));
        }
        let body = self.body.lock().expect("fake site poisoned").clone();
        body.map(Value::String)
            .ok_or_else(|| DriverError::Script("no document loaded".to_string()))
    }

    async fn evaluate_on(&self, _element: &(), function: &str) -> Result<Value, DriverError> {
        Err(DriverError::Script(format!("unexpected function: {function}")))
    }

    async fn click(&self, _element: &()) -> Result<(), DriverError> {
        Ok(())
    }

    async fn scroll_into_view(&self, _element: &()) -> Result<(), DriverError> {
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok("about:blank".to_string())
    }

    async fn open_context(&self) -> Result<FakeSite, DriverError> {
        Err(DriverError::Protocol("nested contexts are not supported".to_string()))
    }

    async fn close_context(&self, _context: FakeSite) -> Result<(), DriverError> {
        Ok(())
    }
}

/// Fixed detail panel for extractor tests.
#[derive(Debug, Default)]
pub(crate) struct FixtureView {
    card: FakeCard,
}

impl FixtureView {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, probe: Probe, value: &str) -> Self {
        self.card = self.card.with(probe, value);
        self
    }

    pub(crate) fn failing(mut self, probe: Probe) -> Self {
        self.card = self.card.broken(probe);
        self
    }
}

#[async_trait]
impl DetailView for FixtureView {
    async fn lookup(&self, probe: &Probe) -> Result<Option<String>, DriverError> {
        self.card.lookup(probe)
    }
}
