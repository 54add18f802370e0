use serde::{Deserialize, Serialize};

/// One harvested listing.
///
/// Every optional field is an empty string when absent so the row encoder
/// never has to branch on nullability. `name` is the identity key and is
/// always stored normalized (see [`crate::clean_text`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    /// Caller-supplied partition label; never read from the page.
    pub city: String,
    pub name: String,
    pub category: String,
    pub address: String,
    pub phone: String,
    pub website: String,
    /// Filled only by the email enricher.
    pub email: String,
    pub rating: String,
    /// Digits only, e.g. `"1234"` for "1,234 reviews".
    pub review_count: String,
    pub business_status: String,
    pub working_hours: String,
    pub price_level: String,
    pub detail_url: String,
}

impl Place {
    /// A place without a name was not extracted and must be discarded.
    #[must_use]
    pub fn is_identified(&self) -> bool {
        !self.name.is_empty()
    }

    /// Whether the email enricher has anything to work with.
    #[must_use]
    pub fn wants_email(&self) -> bool {
        self.email.is_empty() && !self.website.is_empty()
    }
}
