//! Best-effort email discovery on a listing's own website.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::driver::{DriverError, PageDriver, WaitPolicy};
use crate::error::ScraperError;
use crate::scripts;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-z]{2,}").expect("valid email regex")
});

const SOCIAL_HOSTS: &[&str] = &[
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "linkedin.com",
    "tiktok.com",
    "youtube.com",
    "pinterest.com",
];

/// Whether `website` points at a social network profile rather than the
/// business's own site.
#[must_use]
pub fn is_social_host(website: &str) -> bool {
    match Url::parse(website) {
        Ok(url) => url.host_str().is_some_and(|host| {
            let host = host.trim_start_matches("www.").to_ascii_lowercase();
            SOCIAL_HOSTS
                .iter()
                .any(|social| host == *social || host.ends_with(&format!(".{social}")))
        }),
        Err(_) => {
            let lower = website.to_ascii_lowercase();
            SOCIAL_HOSTS.iter().any(|social| lower.contains(social))
        }
    }
}

/// First email-shaped substring of `text`.
#[must_use]
pub fn first_email(text: &str) -> Option<String> {
    EMAIL.find(text).map(|m| m.as_str().to_owned())
}

/// Looks up an email on `website` and returns it, or an empty string.
///
/// Never fails: a slow, broken, or hostile site only costs at most
/// `timeout` and is logged at debug. The lookup runs in a separate context
/// so the caller's page keeps its detail panel.
pub async fn enrich_email<D>(
    driver: &D,
    website: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> String
where
    D: PageDriver + ?Sized,
{
    if website.is_empty() || is_social_host(website) {
        return String::new();
    }

    match lookup_email(driver, website, timeout, cancel).await {
        Ok(Some(email)) => email,
        Ok(None) | Err(ScraperError::Cancelled) => String::new(),
        Err(e) => {
            tracing::debug!(website, error = %e, "email lookup failed");
            String::new()
        }
    }
}

/// Opens `website` in a fresh context and scans its text for an email.
///
/// The context is closed on every path once it has been opened, including
/// when `cancel` fires mid-scan.
///
/// # Errors
///
/// [`ScraperError::Enrichment`] when the context cannot be opened, the
/// site does not load, or the deadline passes. [`ScraperError::Cancelled`]
/// when `cancel` fires first.
pub async fn lookup_email<D>(
    driver: &D,
    website: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Option<String>, ScraperError>
where
    D: PageDriver + ?Sized,
{
    let deadline = Instant::now() + timeout;
    let fail = |source: DriverError| ScraperError::Enrichment {
        url: website.to_owned(),
        source,
    };

    let context = tokio::time::timeout_at(deadline, driver.open_context())
        .await
        .map_err(|_| fail(DriverError::timeout("enrichment context", timeout)))?
        .map_err(fail)?;

    let scanned = tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        result = tokio::time::timeout_at(deadline, scan(&context, website, timeout)) => {
            Some(result.unwrap_or_else(|_| Err(DriverError::timeout(website, timeout))))
        }
    };

    if let Err(e) = driver.close_context(context).await {
        tracing::debug!(website, error = %e, "failed to close enrichment context");
    }

    match scanned {
        Some(result) => result.map_err(fail),
        None => Err(ScraperError::Cancelled),
    }
}

async fn scan<C>(context: &C, website: &str, timeout: Duration) -> Result<Option<String>, DriverError>
where
    C: PageDriver + ?Sized,
{
    context
        .navigate(website, WaitPolicy::DomContentLoaded, timeout)
        .await?;
    let body = context.evaluate(scripts::BODY_TEXT).await?;
    Ok(body.as_str().and_then(first_email))
}
