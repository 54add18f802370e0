//! DOM selectors for the map search surface.
//!
//! Field lookups are ordered lists: the first probe that yields non-empty
//! text wins. Listing types render different layouts, so title, rating,
//! working hours, and price level each carry a fallback.

use crate::driver::Probe;

pub const CONSENT_BUTTON: &str =
    r#"button[aria-label*="Accept all"], button[aria-label*="Agree"], button[aria-label*="Aceptar"]"#;
pub const FEED: &str = r#"div[role="feed"]"#;
pub const CARD: &str = r#"div[role="article"]"#;
pub const DETAIL_TITLE: &str = "h1.DUwDvf";

pub const NAME: &[Probe] = &[Probe::Text(DETAIL_TITLE), Probe::Text(".lfPIob")];
pub const CATEGORY: &[Probe] = &[Probe::Text(r#"button[jsaction*="pane.rating.category"]"#)];
pub const ADDRESS: &[Probe] = &[Probe::Text(r#"button[data-item-id="address"]"#)];
pub const PHONE: &[Probe] = &[Probe::Text(r#"button[data-item-id^="phone"]"#)];
pub const WEBSITE: &[Probe] = &[Probe::Href(r#"a[data-item-id="authority"]"#)];
pub const RATING: &[Probe] = &[Probe::Text("span.ceNzR"), Probe::Text("div.F7nice span")];
pub const REVIEWS: &[Probe] = &[
    Probe::Text(r#"span[aria-label*="reviews"]"#),
    Probe::Text(r#"button[aria-label*="reviews"]"#),
];
pub const BUSINESS_STATUS: &[Probe] = &[Probe::Text(".Z67o1c")];
pub const WORKING_HOURS: &[Probe] = &[
    Probe::JoinedRows("table.eK0Z0c tr"),
    Probe::AriaLabel("div.t39EBf[aria-label]"),
];
pub const PRICE_LEVEL: &[Probe] = &[
    Probe::PriceSymbol,
    Probe::AriaLabel(r#"span[aria-label^="Price"]"#),
];
