//! The incremental list/detail collection loop.

use mapscout_core::{clean_text, Place};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::CollectorConfig;
use crate::driver::{DetailView, DriverError, PageDriver, WaitPolicy};
use crate::enrich::enrich_email;
use crate::error::ScraperError;
use crate::extract::extract;
use crate::types::{CardOutcome, CollectionRun, SkipReason, StopReason};
use crate::wait::{or_cancel, poll_until, settle, WaitCondition, WaitError};
use crate::{scripts, selectors};

/// Why a single card stopped before producing an outcome.
enum CardError {
    Cancelled,
    Driver { title: String, source: DriverError },
}

/// The run was cancelled part-way through a round.
struct Interrupted;

/// Drives one results feed on one page.
///
/// The page is borrowed exclusively for the duration of a run: the detail
/// panel is shared UI state, so cards are always visited one at a time.
pub struct Collector<'a, D: ?Sized> {
    driver: &'a D,
    config: &'a CollectorConfig,
}

impl<'a, D> Collector<'a, D>
where
    D: PageDriver + DetailView + ?Sized,
{
    #[must_use]
    pub fn new(driver: &'a D, config: &'a CollectorConfig) -> Self {
        Self { driver, config }
    }

    /// Collects up to `limit` distinct named places for `query`, each tagged
    /// with `city`. Returns whatever was gathered when the run stops.
    pub async fn collect(
        &self,
        query: &str,
        city: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Vec<Place> {
        self.run(query, city, limit, cancel).await.places
    }

    /// Like [`Collector::collect`], but also reports every card outcome and
    /// why the run stopped.
    pub async fn run(
        &self,
        query: &str,
        city: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> CollectionRun {
        let mut run = CollectionRun::new();

        if limit == 0 {
            run.stop = StopReason::LimitReached;
            return run;
        }
        if let Err(stop) = self.open_search(query, cancel).await {
            run.stop = stop;
            return run;
        }

        let mut stale_rounds = 0u32;
        let stop = loop {
            if run.places.len() >= limit {
                break StopReason::LimitReached;
            }
            if stale_rounds >= self.config.max_stale_rounds {
                break StopReason::Stale;
            }
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }

            run.rounds += 1;
            let Ok(added) = self.round(city, limit, &mut run, cancel).await else {
                break StopReason::Cancelled;
            };
            if run.places.len() >= limit {
                break StopReason::LimitReached;
            }

            let Some(grew) = self.scroll_feed(cancel).await else {
                break StopReason::Cancelled;
            };

            if added == 0 {
                stale_rounds += 1;
            } else {
                stale_rounds = 0;
            }
            tracing::debug!(round = run.rounds, added, grew, stale_rounds, "round finished");

            if added == 0 && !grew && stale_rounds >= self.config.end_stale_rounds {
                break StopReason::FeedExhausted;
            }
        };
        run.stop = stop;

        tracing::info!(
            query,
            city,
            captured = run.places.len(),
            rounds = run.rounds,
            failed = run.failures(),
            stop = %run.stop,
            "collection finished"
        );
        run
    }

    async fn open_search(&self, query: &str, cancel: &CancellationToken) -> Result<(), StopReason> {
        let url = self.config.search_url(query);
        let navigated = or_cancel(
            cancel,
            self.driver
                .navigate(&url, WaitPolicy::Load, self.config.navigation_timeout),
        )
        .await;
        match navigated {
            None => return Err(StopReason::Cancelled),
            Some(Err(e)) => {
                tracing::warn!(url, error = %e, "search page did not load");
                return Err(StopReason::NavigationFailed(e.to_string()));
            }
            Some(Ok(())) => {}
        }

        self.dismiss_consent(cancel).await;

        let feed = or_cancel(
            cancel,
            self.driver
                .wait_for_selector(selectors::FEED, self.config.feed_timeout),
        )
        .await;
        match feed {
            None => Err(StopReason::Cancelled),
            Some(Err(e)) => {
                let err = ScraperError::FeedUnavailable {
                    query: query.to_owned(),
                    timeout_ms: crate::driver::millis(self.config.feed_timeout),
                };
                tracing::warn!(error = %err, cause = %e, "no results feed");
                Err(StopReason::FeedUnavailable)
            }
            Some(Ok(_)) => Ok(()),
        }
    }

    async fn dismiss_consent(&self, cancel: &CancellationToken) {
        let button = or_cancel(
            cancel,
            self.driver
                .wait_for_selector(selectors::CONSENT_BUTTON, self.config.consent_timeout),
        )
        .await;
        match button {
            Some(Ok(button)) => match self.driver.click(&button).await {
                Ok(()) => {
                    tracing::debug!("dismissed consent dialog");
                    settle(self.config.card_settle, cancel).await;
                }
                Err(e) => tracing::debug!(error = %e, "consent dialog click failed"),
            },
            Some(Err(e)) => tracing::debug!(error = %e, "no consent dialog"),
            None => {}
        }
    }

    /// Visits every card in the current snapshot. Returns how many places
    /// were captured.
    async fn round(
        &self,
        city: &str,
        limit: usize,
        run: &mut CollectionRun,
        cancel: &CancellationToken,
    ) -> Result<usize, Interrupted> {
        let cards = match self.driver.query_all(selectors::CARD).await {
            Ok(cards) => cards,
            Err(e) => {
                tracing::warn!(round = run.rounds, error = %e, "could not enumerate cards");
                return Ok(0);
            }
        };

        let mut added = 0;
        for card in &cards {
            if run.places.len() >= limit {
                break;
            }
            if cancel.is_cancelled() {
                return Err(Interrupted);
            }

            let outcome = match self.visit(card, city, run, cancel).await {
                Ok(outcome) => outcome,
                Err(CardError::Cancelled) => return Err(Interrupted),
                Err(CardError::Driver { title, source }) => {
                    CardOutcome::Failed(ScraperError::CardProcessing { title, source })
                }
            };

            match &outcome {
                CardOutcome::Captured(place) => {
                    run.registry.insert(place.name.clone());
                    run.places.push(place.clone());
                    added += 1;
                    tracing::info!(
                        city,
                        name = %place.name,
                        captured = run.places.len(),
                        limit,
                        "captured place"
                    );
                }
                CardOutcome::Skipped(reason) => tracing::debug!(?reason, "card skipped"),
                CardOutcome::Failed(e) => tracing::warn!(error = %e, "card failed; skipping"),
            }
            run.outcomes.push(outcome);
        }
        Ok(added)
    }

    async fn visit(
        &self,
        card: &D::Element,
        city: &str,
        run: &CollectionRun,
        cancel: &CancellationToken,
    ) -> Result<CardOutcome, CardError> {
        let raw = self
            .driver
            .evaluate_on(card, scripts::CARD_TITLE_FN)
            .await
            .map_err(|source| CardError::Driver {
                title: String::new(),
                source,
            })?;
        let title = clean_text(raw.as_str().unwrap_or_default());
        if title.is_empty() {
            return Ok(CardOutcome::Skipped(SkipReason::EmptyTitle));
        }
        if run.registry.contains(&title) {
            return Ok(CardOutcome::Skipped(SkipReason::AlreadySeen { title }));
        }

        let failed = |source| CardError::Driver {
            title: title.clone(),
            source,
        };
        self.driver.scroll_into_view(card).await.map_err(failed)?;
        if !settle(self.config.card_settle, cancel).await {
            return Err(CardError::Cancelled);
        }
        self.driver.click(card).await.map_err(failed)?;
        self.await_detail(&title, cancel).await?;
        if !settle(self.config.detail_settle, cancel).await {
            return Err(CardError::Cancelled);
        }
        let url = self.driver.current_url().await.map_err(failed)?;

        let mut place = extract(self.driver, &url, city).await;
        if !place.is_identified() {
            return Ok(CardOutcome::Skipped(SkipReason::UnnamedDetail { title }));
        }
        if run.registry.contains(&place.name) {
            return Ok(CardOutcome::Skipped(SkipReason::DuplicateDetail { name: place.name }));
        }

        if self.config.enrich_emails && place.wants_email() {
            place.email =
                enrich_email(self.driver, &place.website, self.config.enrich_timeout, cancel).await;
        }
        Ok(CardOutcome::Captured(place))
    }

    /// Waits for the detail panel title to render. A timeout is tolerated;
    /// extraction then decides whether the panel is usable.
    async fn await_detail(&self, title: &str, cancel: &CancellationToken) -> Result<(), CardError> {
        let condition = WaitCondition::new(self.config.detail_timeout, self.config.poll_interval);
        let driver = self.driver;
        let ready = poll_until(condition, cancel, || async move {
            match driver.evaluate(scripts::DETAIL_READY).await {
                Ok(Value::Bool(true)) => Some(()),
                _ => None,
            }
        })
        .await;

        match ready {
            Ok(()) => Ok(()),
            Err(WaitError::TimedOut { timeout_ms }) => {
                tracing::debug!(title, timeout_ms, "detail panel title did not render");
                Ok(())
            }
            Err(WaitError::Cancelled) => Err(CardError::Cancelled),
        }
    }

    /// Scrolls the feed one step and reports whether its extent changed.
    /// Returns `None` if cancelled while settling.
    async fn scroll_feed(&self, cancel: &CancellationToken) -> Option<bool> {
        let before = self.feed_extent().await;
        if let Err(e) = self
            .driver
            .evaluate(&scripts::scroll_feed(self.config.scroll_step_px))
            .await
        {
            tracing::debug!(error = %e, "feed scroll failed");
        }
        if !settle(self.config.scroll_settle, cancel).await {
            return None;
        }
        let after = self.feed_extent().await;

        Some(match (before, after) {
            (Some(before), Some(after)) => before != after,
            _ => true,
        })
    }

    async fn feed_extent(&self) -> Option<Value> {
        match self.driver.evaluate(scripts::FEED_EXTENT).await {
            Ok(Value::Null) => None,
            Ok(extent) => Some(extent),
            Err(e) => {
                tracing::debug!(error = %e, "could not read feed extent");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "collect_test.rs"]
mod tests;
