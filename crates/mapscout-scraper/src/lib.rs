pub mod chrome;
pub mod collect;
pub mod config;
pub mod dedup;
pub mod driver;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod scripts;
pub mod selectors;
pub mod types;
pub mod wait;

#[cfg(test)]
pub(crate) mod testing;

pub use chrome::{BrowserOptions, ChromePage, ChromeSession};
pub use collect::Collector;
pub use config::CollectorConfig;
pub use dedup::DedupRegistry;
pub use driver::{DetailView, DriverError, PageDriver, Probe, WaitPolicy};
pub use enrich::{enrich_email, first_email, is_social_host, lookup_email};
pub use error::ScraperError;
pub use extract::extract;
pub use types::{CardOutcome, CollectionRun, SkipReason, StopReason};
