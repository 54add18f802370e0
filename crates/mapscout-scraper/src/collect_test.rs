use tokio_util::sync::CancellationToken;

use super::*;
use crate::selectors;
use crate::testing::{fast_config, FakeCard, FakePage};

async fn run_page(page: &FakePage, limit: usize) -> CollectionRun {
    let config = fast_config();
    Collector::new(page, &config)
        .run("coffee", "Austin", limit, &CancellationToken::new())
        .await
}

fn names(places: &[Place]) -> Vec<&str> {
    places.iter().map(|p| p.name.as_str()).collect()
}

fn sorted_registry(run: &CollectionRun) -> Vec<&str> {
    let mut names: Vec<&str> = run.registry.iter().collect();
    names.sort_unstable();
    names
}

#[tokio::test]
async fn duplicate_render_is_captured_once() {
    let page = FakePage::new(vec![vec![
        FakeCard::named("Cafe A"),
        FakeCard::named("Cafe A"),
        FakeCard::named("Cafe B"),
    ]]);

    let run = run_page(&page, 5).await;

    assert_eq!(names(&run.places), ["Cafe A", "Cafe B"]);
    assert_eq!(sorted_registry(&run), ["Cafe A", "Cafe B"]);
    assert_eq!(run.stop, StopReason::FeedExhausted);
    assert!(run.outcomes.iter().any(|o| matches!(
        o,
        CardOutcome::Skipped(SkipReason::AlreadySeen { title }) if title == "Cafe A"
    )));
    assert_eq!(page.clicks(), 2);
}

#[tokio::test]
async fn places_carry_city_and_detail_url() {
    let page = FakePage::new(vec![vec![FakeCard::named("Cafe A")
        .with(selectors::ADDRESS[0], "12 Main St")
        .with(selectors::REVIEWS[0], "1,234 reviews")]]);

    let run = run_page(&page, 1).await;

    let place = &run.places[0];
    assert_eq!(place.city, "Austin");
    assert_eq!(place.address, "12 Main St");
    assert_eq!(place.review_count, "1234");
    assert_eq!(place.detail_url, "https://maps.example/place/Cafe+A");
    assert_eq!(
        page.navigations(),
        ["https://www.google.com/maps/search/coffee?hl=en"]
    );
}

#[tokio::test]
async fn stops_at_limit_without_visiting_remaining_cards() {
    let page = FakePage::new(vec![vec![
        FakeCard::named("Cafe A"),
        FakeCard::named("Cafe B"),
        FakeCard::named("Cafe C"),
    ]]);

    let run = run_page(&page, 2).await;

    assert_eq!(names(&run.places), ["Cafe A", "Cafe B"]);
    assert_eq!(run.stop, StopReason::LimitReached);
    assert_eq!(page.clicks(), 2);
    assert_eq!(page.scrolls(), 0);
}

#[tokio::test]
async fn zero_limit_never_touches_the_page() {
    let page = FakePage::new(vec![vec![FakeCard::named("Cafe A")]]);

    let run = run_page(&page, 0).await;

    assert!(run.places.is_empty());
    assert_eq!(run.stop, StopReason::LimitReached);
    assert!(page.navigations().is_empty());
}

#[tokio::test]
async fn lazily_rendered_cards_are_picked_up_after_scroll() {
    let page = FakePage::new(vec![
        vec![FakeCard::named("Cafe A")],
        vec![FakeCard::named("Cafe A"), FakeCard::named("Cafe B")],
        vec![FakeCard::named("Cafe B"), FakeCard::named("Cafe C")],
    ]);

    let run = run_page(&page, 10).await;

    assert_eq!(names(&run.places), ["Cafe A", "Cafe B", "Cafe C"]);
    assert_eq!(run.stop, StopReason::FeedExhausted);
}

#[tokio::test]
async fn slow_feed_gives_up_after_stale_rounds() {
    let page = FakePage::new(vec![vec![FakeCard::named("Cafe A")]]).endless();

    let run = run_page(&page, 10).await;

    assert_eq!(names(&run.places), ["Cafe A"]);
    assert_eq!(run.stop, StopReason::Stale);
    // One productive round, then five that found nothing.
    assert_eq!(run.rounds, 6);
}

#[tokio::test]
async fn stale_thresholds_are_configurable() {
    let page = FakePage::new(vec![vec![FakeCard::named("Cafe A")]]).endless();
    let config = CollectorConfig {
        max_stale_rounds: 2,
        ..fast_config()
    };

    let run = Collector::new(&page, &config)
        .run("coffee", "Austin", 10, &CancellationToken::new())
        .await;

    assert_eq!(run.stop, StopReason::Stale);
    assert_eq!(run.rounds, 3);
}

#[tokio::test]
async fn missing_feed_returns_empty() {
    let page = FakePage::new(vec![vec![FakeCard::named("Cafe A")]]).without_feed();

    let run = run_page(&page, 5).await;

    assert!(run.places.is_empty());
    assert_eq!(run.stop, StopReason::FeedUnavailable);
    assert_eq!(run.rounds, 0);
}

#[tokio::test]
async fn failed_navigation_is_reported() {
    let page = FakePage::new(Vec::new()).unreachable();

    let run = run_page(&page, 5).await;

    assert!(run.places.is_empty());
    assert!(matches!(run.stop, StopReason::NavigationFailed(ref reason) if reason.contains("ERR_NAME_NOT_RESOLVED")));
}

#[tokio::test]
async fn consent_dialog_is_dismissed() {
    let page = FakePage::new(vec![vec![FakeCard::named("Cafe A")]]).with_consent();

    let run = run_page(&page, 1).await;

    assert!(page.consent_clicked());
    assert_eq!(names(&run.places), ["Cafe A"]);
}

#[tokio::test]
async fn card_failures_are_skipped_not_fatal() {
    let page = FakePage::new(vec![vec![
        FakeCard::titled("   "),
        FakeCard::named("Cafe A").failing_click(),
        FakeCard::named("Cafe B"),
    ]]);

    let run = run_page(&page, 5).await;

    assert_eq!(names(&run.places), ["Cafe B"]);
    assert!(matches!(run.outcomes[0], CardOutcome::Skipped(SkipReason::EmptyTitle)));
    assert!(matches!(
        &run.outcomes[1],
        CardOutcome::Failed(ScraperError::CardProcessing { title, .. }) if title == "Cafe A"
    ));
    // The broken card is retried on every round until the feed is exhausted.
    assert_eq!(run.failures(), 3);
    assert_eq!(run.stop, StopReason::FeedExhausted);
}

#[tokio::test]
async fn unnamed_and_duplicate_details_are_discarded() {
    let page = FakePage::new(vec![vec![
        FakeCard::named("Cafe A"),
        FakeCard::titled("Ghost"),
        FakeCard::titled("Cafe A (2)").with(selectors::NAME[0], "Cafe A"),
    ]]);

    let run = run_page(&page, 5).await;

    assert_eq!(names(&run.places), ["Cafe A"]);
    assert!(matches!(
        &run.outcomes[1],
        CardOutcome::Skipped(SkipReason::UnnamedDetail { title }) if title == "Ghost"
    ));
    assert!(matches!(
        &run.outcomes[2],
        CardOutcome::Skipped(SkipReason::DuplicateDetail { name }) if name == "Cafe A"
    ));
}

#[tokio::test]
async fn broken_field_lookup_keeps_the_place() {
    let page = FakePage::new(vec![vec![FakeCard::named("Cafe A")
        .with(selectors::PHONE[0], "(512) 555-0100")
        .broken(selectors::ADDRESS[0])]]);

    let run = run_page(&page, 1).await;

    assert_eq!(run.places[0].address, "");
    assert_eq!(run.places[0].phone, "(512) 555-0100");
}

#[tokio::test]
async fn emails_are_enriched_from_own_site_only() {
    let page = FakePage::new(vec![vec![
        FakeCard::named("Cafe A").with(selectors::WEBSITE[0], "https://cafe-a.example"),
        FakeCard::named("Cafe B").with(selectors::WEBSITE[0], "https://www.instagram.com/cafe_b"),
        FakeCard::named("Cafe C"),
    ]])
    .with_site("https://cafe-a.example", "Say hi: hello@cafe-a.example");

    let run = run_page(&page, 3).await;

    assert_eq!(run.places[0].email, "hello@cafe-a.example");
    assert_eq!(run.places[1].email, "");
    assert_eq!(run.places[2].email, "");
    assert_eq!(page.contexts_opened(), 1);
    assert_eq!(page.contexts_closed(), 1);
}

#[tokio::test]
async fn enrichment_can_be_disabled() {
    let page = FakePage::new(vec![vec![
        FakeCard::named("Cafe A").with(selectors::WEBSITE[0], "https://cafe-a.example")
    ]])
    .with_site("https://cafe-a.example", "hello@cafe-a.example");
    let config = CollectorConfig {
        enrich_emails: false,
        ..fast_config()
    };

    let places = Collector::new(&page, &config)
        .collect("coffee", "Austin", 1, &CancellationToken::new())
        .await;

    assert_eq!(places[0].email, "");
    assert_eq!(page.contexts_opened(), 0);
}

#[tokio::test]
async fn cancellation_returns_partial_results() {
    let cancel = CancellationToken::new();
    let page = FakePage::new(vec![vec![
        FakeCard::named("Cafe A"),
        FakeCard::named("Cafe B"),
        FakeCard::named("Cafe C"),
    ]])
    .cancel_after_clicks(2, cancel.clone());
    let config = fast_config();

    let run = Collector::new(&page, &config)
        .run("coffee", "Austin", 10, &cancel)
        .await;

    assert_eq!(names(&run.places), ["Cafe A"]);
    assert_eq!(run.stop, StopReason::Cancelled);
    assert_eq!(page.clicks(), 2);
}

#[tokio::test]
async fn cancelled_before_start_does_nothing() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let page = FakePage::new(vec![vec![FakeCard::named("Cafe A")]]);
    let config = fast_config();

    let run = Collector::new(&page, &config)
        .run("coffee", "Austin", 5, &cancel)
        .await;

    assert!(run.places.is_empty());
    assert_eq!(run.stop, StopReason::Cancelled);
}
