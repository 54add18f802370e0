//! Field extraction from the active detail panel.

use mapscout_core::{clean_text, digits_only, Place};

use crate::driver::{DetailView, Probe};
use crate::selectors;

/// Builds a [`Place`] from whatever the detail panel currently shows.
///
/// Never mutates page state. A lookup that errors counts as "field absent"
/// and the next fallback probe is tried. When no name can be found the
/// returned place is unidentified (see [`Place::is_identified`]) and the
/// caller must discard it.
pub async fn extract<V>(view: &V, current_url: &str, city: &str) -> Place
where
    V: DetailView + ?Sized,
{
    let name = first_match(view, selectors::NAME, clean_text).await;
    if name.is_empty() {
        return Place {
            city: city.to_owned(),
            detail_url: clean_text(current_url),
            ..Place::default()
        };
    }

    Place {
        city: city.to_owned(),
        name,
        category: first_match(view, selectors::CATEGORY, clean_text).await,
        address: first_match(view, selectors::ADDRESS, clean_text).await,
        phone: first_match(view, selectors::PHONE, clean_text).await,
        website: first_match(view, selectors::WEBSITE, clean_text).await,
        email: String::new(),
        rating: first_match(view, selectors::RATING, clean_text).await,
        review_count: first_match(view, selectors::REVIEWS, digits_only).await,
        business_status: first_match(view, selectors::BUSINESS_STATUS, clean_text).await,
        working_hours: first_match(view, selectors::WORKING_HOURS, clean_text).await,
        price_level: first_match(view, selectors::PRICE_LEVEL, clean_text).await,
        detail_url: clean_text(current_url),
    }
}

/// Returns the first non-empty, transformed value among `probes`.
async fn first_match<V>(view: &V, probes: &[Probe], transform: fn(&str) -> String) -> String
where
    V: DetailView + ?Sized,
{
    for probe in probes {
        match view.lookup(probe).await {
            Ok(Some(raw)) => {
                let value = transform(&raw);
                if !value.is_empty() {
                    return value;
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(?probe, error = %e, "detail lookup failed; treating field as absent");
            }
        }
    }
    String::new()
}
