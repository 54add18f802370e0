use std::time::Duration;

use mapscout_core::AppConfig;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Timing and threshold knobs for one [`crate::Collector`].
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub search_base_url: String,
    pub language: String,
    pub navigation_timeout: Duration,
    pub consent_timeout: Duration,
    pub feed_timeout: Duration,
    pub detail_timeout: Duration,
    pub poll_interval: Duration,
    pub card_settle: Duration,
    pub detail_settle: Duration,
    pub scroll_settle: Duration,
    pub scroll_step_px: u32,
    /// Consecutive rounds without a new place before giving up.
    pub max_stale_rounds: u32,
    /// Consecutive rounds without a new place and without feed growth that
    /// count as the end of the result list.
    pub end_stale_rounds: u32,
    pub enrich_emails: bool,
    pub enrich_timeout: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            search_base_url: "https://www.google.com/maps/search/".to_string(),
            language: "en".to_string(),
            navigation_timeout: Duration::from_secs(60),
            consent_timeout: Duration::from_millis(5_000),
            feed_timeout: Duration::from_millis(15_000),
            detail_timeout: Duration::from_millis(5_000),
            poll_interval: DEFAULT_POLL_INTERVAL,
            card_settle: Duration::from_millis(1_000),
            detail_settle: Duration::from_millis(2_000),
            scroll_settle: Duration::from_millis(2_000),
            scroll_step_px: 1_000,
            max_stale_rounds: 5,
            end_stale_rounds: 2,
            enrich_emails: true,
            enrich_timeout: Duration::from_millis(8_000),
        }
    }
}

impl From<&AppConfig> for CollectorConfig {
    fn from(app: &AppConfig) -> Self {
        Self {
            search_base_url: app.search_base_url.clone(),
            language: app.language.clone(),
            navigation_timeout: Duration::from_secs(app.navigation_timeout_secs),
            consent_timeout: Duration::from_millis(app.consent_timeout_ms),
            feed_timeout: Duration::from_millis(app.feed_timeout_ms),
            detail_timeout: Duration::from_millis(app.detail_timeout_ms),
            poll_interval: DEFAULT_POLL_INTERVAL,
            card_settle: Duration::from_millis(app.card_settle_ms),
            detail_settle: Duration::from_millis(app.detail_settle_ms),
            scroll_settle: Duration::from_millis(app.scroll_settle_ms),
            scroll_step_px: app.scroll_step_px,
            max_stale_rounds: app.max_stale_rounds,
            end_stale_rounds: app.end_stale_rounds,
            enrich_emails: app.enrich_emails,
            enrich_timeout: Duration::from_millis(app.enrich_timeout_ms),
        }
    }
}

impl CollectorConfig {
    /// Search URL for `query`, percent-encoded and pinned to the
    /// configured interface language.
    #[must_use]
    pub fn search_url(&self, query: &str) -> String {
        let base = self.search_base_url.trim_end_matches('/');
        let encoded = utf8_percent_encode(query.trim(), NON_ALPHANUMERIC);
        let language = utf8_percent_encode(&self.language, NON_ALPHANUMERIC);
        format!("{base}/{encoded}?hl={language}")
    }
}
