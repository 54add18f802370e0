use thiserror::Error;

use crate::driver::DriverError;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("feed for \"{query}\" did not render within {timeout_ms}ms")]
    FeedUnavailable { query: String, timeout_ms: u64 },

    #[error("card \"{title}\" could not be processed: {source}")]
    CardProcessing {
        title: String,
        #[source]
        source: DriverError,
    },

    #[error("email lookup on {url} failed: {source}")]
    Enrichment {
        url: String,
        #[source]
        source: DriverError,
    },

    #[error("cancelled")]
    Cancelled,

    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error(transparent)]
    Driver(#[from] DriverError),
}
