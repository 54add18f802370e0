use std::fmt;

use mapscout_core::Place;

use crate::dedup::DedupRegistry;
use crate::error::ScraperError;

/// What happened to one card visited by the collection loop.
#[derive(Debug)]
pub enum CardOutcome {
    Captured(Place),
    Skipped(SkipReason),
    /// The card failed mid-processing; the run continued without it.
    Failed(ScraperError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The card rendered no title.
    EmptyTitle,
    /// A place with this card title was captured earlier in the run.
    AlreadySeen { title: String },
    /// The detail panel opened but no name could be extracted.
    UnnamedDetail { title: String },
    /// The detail panel showed a name that is already registered.
    DuplicateDetail { name: String },
}

/// Why a collection run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    LimitReached,
    /// Too many consecutive rounds yielded nothing new.
    Stale,
    /// The feed stopped growing and rounds stopped yielding new places.
    FeedExhausted,
    Cancelled,
    FeedUnavailable,
    NavigationFailed(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LimitReached => f.write_str("limit reached"),
            Self::Stale => f.write_str("no new places"),
            Self::FeedExhausted => f.write_str("end of results"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::FeedUnavailable => f.write_str("feed unavailable"),
            Self::NavigationFailed(reason) => write!(f, "navigation failed: {reason}"),
        }
    }
}

/// Full report of one collection run.
#[derive(Debug)]
pub struct CollectionRun {
    /// Captured places in discovery order.
    pub places: Vec<Place>,
    pub registry: DedupRegistry,
    /// Rounds started, including the one that hit the stop condition.
    pub rounds: u32,
    pub outcomes: Vec<CardOutcome>,
    pub stop: StopReason,
}

impl CollectionRun {
    pub(crate) fn new() -> Self {
        Self {
            places: Vec::new(),
            registry: DedupRegistry::new(),
            rounds: 0,
            outcomes: Vec::new(),
            stop: StopReason::Stale,
        }
    }

    /// Number of cards that failed mid-processing.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, CardOutcome::Failed(_)))
            .count()
    }
}
