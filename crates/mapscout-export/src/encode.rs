//! Fixed 12-column CSV rows.

use mapscout_core::{clean_text, Place};

pub const HEADER: &str = "City,Name,Category,Address,Phone,Website,Email,Rating,Reviews,Working Hours,Price Level,Google Maps URL";

/// Normalizes `value` and wraps it in double quotes, doubling any quote
/// inside. An empty value becomes `""`.
#[must_use]
pub fn escape_field(value: &str) -> String {
    format!("\"{}\"", clean_text(value).replace('"', "\"\""))
}

/// One row without a trailing newline.
#[must_use]
pub fn encode_row(place: &Place) -> String {
    [
        &place.city,
        &place.name,
        &place.category,
        &place.address,
        &place.phone,
        &place.website,
        &place.email,
        &place.rating,
        &place.review_count,
        &place.working_hours,
        &place.price_level,
        &place.detail_url,
    ]
    .iter()
    .map(|field| escape_field(field))
    .collect::<Vec<_>>()
    .join(",")
}

/// Newline-terminated rows for every identified place, in order.
#[must_use]
pub fn encode_rows(places: &[Place]) -> String {
    places
        .iter()
        .filter(|place| place.is_identified())
        .fold(String::new(), |mut out, place| {
            out.push_str(&encode_row(place));
            out.push('\n');
            out
        })
}
