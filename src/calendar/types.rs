// src/calendar/types.rs
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

/// One normalized economic-calendar row.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MacroEvent {
    pub country: String,
    pub name: String,
    pub category: Option<String>,
    /// Raw provider strings; see `crate::value` for magnitude parsing.
    pub actual: Option<String>,
    pub forecast: Option<String>,
    pub previous: Option<String>,
    pub unit: Option<String>,
    /// Provider impact rating, 1..=3.
    pub importance: Option<u8>,
    pub release_time_utc: DateTime<Utc>,
    /// Raw provider date string, kept verbatim for the dedup key.
    pub raw_date: String,
    pub source: Option<String>,
    pub source_url: Option<String>,
}

impl MacroEvent {
    /// Stable identity of a release: `country|event-name|ISO-date`.
    /// The date component is the provider's own string with spaces mapped
    /// to `T`, so the key survives re-fetches byte-for-byte.
    pub fn dedup_key(&self) -> String {
        let date_key = self.raw_date.replace(' ', "T");
        format!("{}|{}|{}", self.country, self.name, date_key)
    }

    /// A row is a reportable release once its actual value is non-blank and
    /// its release time is not in the future (one minute of clock-skew
    /// grace, matching the fetch window's upper bound).
    pub fn is_released(&self, now: DateTime<Utc>) -> bool {
        let has_actual = self
            .actual
            .as_deref()
            .is_some_and(|a| !a.trim().is_empty());
        has_actual && self.release_time_utc <= now + Duration::minutes(1)
    }
}

#[async_trait::async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Fetch calendar rows whose release time falls in `[start, end)`.
    async fn fetch_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MacroEvent>>;

    fn name(&self) -> &'static str;
}
