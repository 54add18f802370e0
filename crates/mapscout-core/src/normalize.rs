//! Text cleanup shared by the field extractor and the row encoder.

/// Returns `true` for characters kept by [`clean_text`]: printable ASCII
/// and the Latin-1 letter block (`À`..=`ÿ`).
fn is_kept(c: char) -> bool {
    matches!(c, '\u{20}'..='\u{7E}' | '\u{C0}'..='\u{FF}')
}

/// Normalizes scraped text.
///
/// Whitespace of any kind becomes a single space, characters outside the
/// printable ASCII / Latin-1 range are dropped, and the result is trimmed.
/// Two renders of the same listing that differ only in invisible
/// formatting normalize to the same string.
#[must_use]
pub fn clean_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if !is_kept(c) {
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }

    out
}

/// Keeps ASCII digits only. `"1,234 reviews"` becomes `"1234"`.
#[must_use]
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
