//! Interpretation engine: category keywords + surprise sign → directional
//! bias and a human-readable narrative.
//!
//! The classifier is a fixed lookup table; first matching row wins. A
//! positive surprise on most categories reads hawkish (hotter data, tighter
//! policy likelier); labor-slack categories invert.

use serde::{Deserialize, Serialize};

use crate::calendar::MacroEvent;
use crate::value;

/// Directional bias of a release relative to expectations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Hawkish,
    Dovish,
    Neutral,
}

/// Coarse category bucket, used for nuance lines and downstream filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTag {
    Inflation,
    Growth,
    Labor,
    Rates,
    Other,
}

/// How a positive surprise maps onto direction for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SurprisePolarity {
    HawkishIfPositive,
    DovishIfPositive,
}

/// Keyword rows are matched as case-insensitive substrings against the
/// event's category (falling back to its name). Order matters: the first
/// matching row classifies the event.
const RULES: &[(&[&str], EventTag, SurprisePolarity)] = &[
    (
        &["cpi", "core cpi", "ppi", "inflation"],
        EventTag::Inflation,
        SurprisePolarity::HawkishIfPositive,
    ),
    (
        &["gdp", "growth"],
        EventTag::Growth,
        SurprisePolarity::HawkishIfPositive,
    ),
    (
        &["unemployment", "jobless"],
        EventTag::Labor,
        SurprisePolarity::DovishIfPositive,
    ),
    (
        &["non-farm", "nonfarm", "payroll"],
        EventTag::Labor,
        SurprisePolarity::HawkishIfPositive,
    ),
    (
        &["rate decision", "interest rate", "fomc"],
        EventTag::Rates,
        SurprisePolarity::HawkishIfPositive,
    ),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub direction: Direction,
    /// -1 (dovish), 0 (neutral), +1 (hawkish).
    pub score: i32,
    pub tags: Vec<EventTag>,
    /// Header block: country, name, time, actual/forecast/previous.
    pub summary: String,
    /// Bullet lines: surprise, unit, impact, tilt, notes.
    pub details: Vec<String>,
}

fn classify_category(category: &str) -> (EventTag, SurprisePolarity) {
    for (keywords, tag, polarity) in RULES {
        if keywords.iter().any(|k| category.contains(k)) {
            return (*tag, *polarity);
        }
    }
    (EventTag::Other, SurprisePolarity::HawkishIfPositive)
}

fn direction_for(surprise: Option<f64>, polarity: SurprisePolarity) -> (Direction, i32) {
    let Some(s) = surprise else {
        return (Direction::Neutral, 0);
    };
    if s == 0.0 {
        return (Direction::Neutral, 0);
    }
    let positive_is_hawkish = matches!(polarity, SurprisePolarity::HawkishIfPositive);
    if (s > 0.0) == positive_is_hawkish {
        (Direction::Hawkish, 1)
    } else {
        (Direction::Dovish, -1)
    }
}

fn fmt_value(v: Option<&str>) -> &str {
    match v {
        Some(s) if !s.trim().is_empty() => s,
        _ => "—",
    }
}

/// Classify one event and render its narrative.
pub fn interpret_event(ev: &MacroEvent) -> Interpretation {
    let actual = ev.actual.as_deref().and_then(value::parse_magnitude);
    let previous = ev.previous.as_deref().and_then(value::parse_magnitude);
    let surprise = value::surprise(ev.actual.as_deref(), ev.forecast.as_deref());

    let category = ev
        .category
        .as_deref()
        .unwrap_or(&ev.name)
        .to_ascii_lowercase();
    let (tag, polarity) = classify_category(&category);
    let (direction, score) = direction_for(surprise, polarity);

    let mut nuance: Vec<String> = Vec::new();
    if tag == EventTag::Inflation {
        if let Some(s) = surprise {
            if s != 0.0 {
                let heat = if s > 0.0 { "hotter" } else { "cooler" };
                nuance.push(format!("inflation surprise: {heat}"));
            }
        }
    }
    if let (Some(a), Some(p)) = (actual, previous) {
        let trend = if a > p {
            "rising vs previous"
        } else if a < p {
            "falling vs previous"
        } else {
            "unchanged vs previous"
        };
        nuance.push(trend.to_string());
    }

    let summary = format!(
        "{} — {}\nTime (UTC): {}\nActual: {}  |  Forecast: {}  |  Previous: {}",
        ev.country,
        ev.name,
        ev.release_time_utc.format("%Y-%m-%d %H:%M"),
        fmt_value(ev.actual.as_deref()),
        fmt_value(ev.forecast.as_deref()),
        fmt_value(ev.previous.as_deref()),
    );

    let mut details: Vec<String> = Vec::new();
    if let Some(s) = surprise {
        details.push(format!("Surprise: {s:+.2} (actual - forecast)"));
    }
    if let Some(unit) = ev.unit.as_deref().filter(|u| !u.trim().is_empty()) {
        details.push(format!("Unit: {unit}"));
    }
    if let Some(imp) = ev.importance.filter(|&i| i > 0) {
        details.push(format!("Impact: {imp}/3 (TE)"));
    }
    details.push(format!(
        "Interpretation: {}",
        match direction {
            Direction::Hawkish => "hawkish tilt (tighter conditions likelier)",
            Direction::Dovish => "dovish tilt (easier conditions likelier)",
            Direction::Neutral => "neutral/unclear",
        }
    ));
    if !nuance.is_empty() {
        details.push(format!("Notes: {}", nuance.join("; ")));
    }

    Interpretation {
        direction,
        score,
        tags: vec![tag],
        summary,
        details,
    }
}

/// Render the chat message: summary block plus one bullet per detail line.
pub fn render_message(interp: &Interpretation) -> String {
    let mut msg = interp.summary.clone();
    msg.push('\n');
    for d in &interp.details {
        msg.push_str("• ");
        msg.push_str(d);
        msg.push('\n');
    }
    msg
}
