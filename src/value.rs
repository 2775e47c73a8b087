//! Loose numeric-string parsing for calendar values.
//!
//! Provider values arrive as display strings ("3.2K", "-1.5%", "1,250"),
//! sometimes with footnote junk around the number. We only need a magnitude
//! good enough for surprise sign and vs-previous comparison.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Parse a loosely formatted value string into a magnitude.
///
/// Rules: thousands commas are stripped; a trailing `K`/`M` (case-insensitive)
/// multiplies by 1e3/1e6; the first signed decimal number found in what
/// remains is the result. A bare `%` carries no multiplier, so percent
/// values compare as their raw numbers.
pub fn parse_magnitude(raw: &str) -> Option<f64> {
    static RE_NUM: OnceCell<Regex> = OnceCell::new();
    let re = RE_NUM.get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap());

    let mut s = raw.trim().replace(',', "");
    let mut mult = 1.0f64;
    if s.to_ascii_uppercase().ends_with('K') {
        mult = 1_000.0;
        s.truncate(s.len() - 1);
    } else if s.to_ascii_uppercase().ends_with('M') {
        mult = 1_000_000.0;
        s.truncate(s.len() - 1);
    }

    let m = re.find(&s)?;
    m.as_str().parse::<f64>().ok().map(|v| v * mult)
}

/// Difference `actual - forecast`, when both sides parse.
pub fn surprise(actual: Option<&str>, forecast: Option<&str>) -> Option<f64> {
    let a = parse_magnitude(actual?)?;
    let f = parse_magnitude(forecast?)?;
    Some(a - f)
}
