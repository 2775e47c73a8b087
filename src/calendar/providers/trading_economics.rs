//! Trading Economics calendar adapter.
//!
//! Thin boundary over `GET /calendar`: build the windowed, country-filtered
//! query, then normalize the loosely typed rows into [`MacroEvent`]s.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use metrics::{counter, histogram};
use serde::Deserialize;
use std::time::Duration;

use crate::calendar::types::{CalendarProvider, MacroEvent};

/// Importance value the provider uses for high-impact rows.
const HIGH_IMPACT: u8 = 3;

/// Raw calendar row as the API returns it. Field names are PascalCase and
/// most values are optional display strings.
#[derive(Debug, Deserialize)]
struct CalendarRow {
    #[serde(rename = "Date")]
    date: Option<String>,
    #[serde(rename = "DateUTC")]
    date_utc: Option<String>,
    #[serde(rename = "Country")]
    country: Option<String>,
    #[serde(rename = "Event")]
    event: Option<String>,
    #[serde(rename = "Category")]
    category: Option<String>,
    #[serde(rename = "Actual")]
    actual: Option<String>,
    #[serde(rename = "Forecast")]
    forecast: Option<String>,
    #[serde(rename = "Previous")]
    previous: Option<String>,
    #[serde(rename = "Unit")]
    unit: Option<String>,
    #[serde(rename = "Importance")]
    importance: Option<u8>,
    #[serde(rename = "Source")]
    source: Option<String>,
    #[serde(rename = "SourceURL")]
    source_url: Option<String>,
}

pub struct TradingEconomicsProvider {
    base_url: String,
    client_key: String,
    country: String,
    high_impact_only: bool,
    client: reqwest::Client,
}

impl TradingEconomicsProvider {
    pub fn new(
        base_url: impl Into<String>,
        client_key: impl Into<String>,
        country: impl Into<String>,
        high_impact_only: bool,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("build calendar http client")?;
        Ok(Self {
            base_url: base_url.into(),
            client_key: client_key.into(),
            country: country.into(),
            high_impact_only,
            client,
        })
    }

    fn normalize_row(&self, row: CalendarRow, now: DateTime<Utc>) -> MacroEvent {
        // `Date` is already UTC on this API; `DateUTC` shows up on some
        // plan tiers as the only stamp.
        let raw_date = row
            .date
            .clone()
            .or_else(|| row.date_utc.clone())
            .unwrap_or_default();
        let release_time_utc = parse_release_time(&raw_date).unwrap_or(now);

        let name = row
            .event
            .or_else(|| row.category.clone())
            .unwrap_or_else(|| "Unknown Event".to_string());

        MacroEvent {
            country: row.country.unwrap_or_else(|| self.country.clone()),
            name,
            category: row.category,
            actual: row.actual,
            forecast: row.forecast,
            previous: row.previous,
            unit: row.unit,
            importance: row.importance,
            release_time_utc,
            raw_date,
            source: row.source,
            source_url: row.source_url,
        }
    }
}

#[async_trait]
impl CalendarProvider for TradingEconomicsProvider {
    async fn fetch_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MacroEvent>> {
        let url = format!("{}/calendar", self.base_url);
        let start_s = start.format("%Y-%m-%d").to_string();
        let end_s = end.format("%Y-%m-%d").to_string();

        let mut query: Vec<(&str, String)> = vec![
            ("start", start_s),
            ("end", end_s),
            ("country", self.country.clone()),
            ("c", self.client_key.clone()),
        ];
        if self.high_impact_only {
            query.push(("importance", HIGH_IMPACT.to_string()));
        }

        let t0 = std::time::Instant::now();
        let resp = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .context("calendar GET")?
            .error_for_status()
            .context("calendar non-2xx")?;

        let rows: Vec<CalendarRow> = resp.json().await.context("calendar JSON body")?;
        histogram!("calendar_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("calendar_events_fetched_total").increment(rows.len() as u64);

        let now = Utc::now();
        Ok(rows
            .into_iter()
            .map(|r| self.normalize_row(r, now))
            .collect())
    }

    fn name(&self) -> &'static str {
        "TradingEconomics"
    }
}

/// Parse the provider's datetime strings. Formats observed in the wild vary
/// between ISO with/without seconds, bare dates, and US-style stamps.
/// Returns `None` when nothing matches; callers fall back to "now" so a
/// malformed stamp never drops the row.
pub fn parse_release_time(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim().replace('T', " ").replace('Z', "");
    if s.is_empty() {
        return None;
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&s, fmt) {
            return Some(naive.and_utc());
        }
    }
    // Bare date: midnight UTC.
    if let Ok(d) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_iso_variants() {
        let want = Utc.with_ymd_and_hms(2026, 8, 7, 12, 30, 0).unwrap();
        assert_eq!(parse_release_time("2026-08-07T12:30:00Z"), Some(want));
        assert_eq!(parse_release_time("2026-08-07 12:30:00"), Some(want));
        assert_eq!(parse_release_time("2026-08-07 12:30"), Some(want));
    }

    #[test]
    fn parses_us_style_and_bare_date() {
        assert_eq!(
            parse_release_time("08/07/2026 12:30"),
            Some(Utc.with_ymd_and_hms(2026, 8, 7, 12, 30, 0).unwrap())
        );
        assert_eq!(
            parse_release_time("2026-08-07"),
            Some(Utc.with_ymd_and_hms(2026, 8, 7, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn unparseable_is_none() {
        assert_eq!(parse_release_time(""), None);
        assert_eq!(parse_release_time("next tuesday"), None);
    }

    #[test]
    fn missing_event_name_falls_back() {
        let p = TradingEconomicsProvider::new("http://x", "guest:guest", "United States", true, 5)
            .unwrap();
        let now = Utc::now();
        let row = CalendarRow {
            date: Some("2026-08-07 12:30:00".into()),
            date_utc: None,
            country: None,
            event: None,
            category: Some("Inflation Rate".into()),
            actual: Some("3.4%".into()),
            forecast: None,
            previous: None,
            unit: None,
            importance: Some(3),
            source: None,
            source_url: None,
        };
        let ev = p.normalize_row(row, now);
        assert_eq!(ev.name, "Inflation Rate");
        assert_eq!(ev.country, "United States");
        assert_eq!(ev.dedup_key(), "United States|Inflation Rate|2026-08-07T12:30:00");
    }
}
