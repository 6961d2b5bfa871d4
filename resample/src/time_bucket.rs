//! Calendar granularities for temporal dimensions.
//!
//! Truncation happens in a caller-chosen calendar (the process's local zone by
//! default) so that day and month boundaries line up with what the chart
//! reader sees. Weeks start on Sunday.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone,
    Timelike, Utc,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TokenError;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBucket {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

impl TimeBucket {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeBucket::Minute => "minute",
            TimeBucket::Hour => "hour",
            TimeBucket::Day => "day",
            TimeBucket::Week => "week",
            TimeBucket::Month => "month",
        }
    }

    /// Picks a granularity from the overall span of the data.
    ///
    /// Thresholds are inclusive and checked coarsest first. An empty input
    /// resolves to `Day`.
    pub fn for_span<I>(timestamps: I) -> TimeBucket
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let mut bounds: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
        for ts in timestamps {
            bounds = Some(match bounds {
                None => (ts, ts),
                Some((lo, hi)) => (lo.min(ts), hi.max(ts)),
            });
        }
        let Some((lo, hi)) = bounds else {
            return TimeBucket::Day;
        };

        let span = hi - lo;
        if span >= Duration::days(120) {
            TimeBucket::Month
        } else if span >= Duration::days(35) {
            TimeBucket::Week
        } else if span >= Duration::days(7) {
            TimeBucket::Day
        } else if span >= Duration::hours(6) {
            TimeBucket::Hour
        } else {
            TimeBucket::Minute
        }
    }

    /// Floors `ts` to the start of its bucket in `ts`'s own time zone.
    ///
    /// Returns `None` only when the boundary cannot be represented in that zone.
    pub fn truncate<Tz: TimeZone>(self, ts: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let local = ts.naive_local();
        let date = local.date();
        let start = match self {
            TimeBucket::Minute => date.and_hms_opt(local.hour(), local.minute(), 0)?,
            TimeBucket::Hour => date.and_hms_opt(local.hour(), 0, 0)?,
            TimeBucket::Day => date.and_hms_opt(0, 0, 0)?,
            TimeBucket::Week => {
                let back = date.weekday().num_days_from_sunday();
                date.checked_sub_days(Days::new(u64::from(back)))?
                    .and_hms_opt(0, 0, 0)?
            }
            TimeBucket::Month => date.with_day(1)?.and_hms_opt(0, 0, 0)?,
        };

        let tz = ts.timezone();
        tz.from_local_datetime(&start)
            .earliest()
            // Midnight can fall in a DST gap; the first representable instant
            // after it is the real start of the bucket.
            .or_else(|| {
                tz.from_local_datetime(&(start + Duration::hours(1)))
                    .earliest()
            })
    }

    pub fn label<Tz>(self, start: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let pattern = match self {
            TimeBucket::Month => "%b %Y",
            TimeBucket::Week | TimeBucket::Day => "%b %-d, %Y",
            TimeBucket::Hour => "%b %-d, %Y %H:00",
            TimeBucket::Minute => "%H:%M",
        };
        start.format(pattern).to_string()
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeBucket {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minute" => Ok(TimeBucket::Minute),
            "hour" => Ok(TimeBucket::Hour),
            "day" => Ok(TimeBucket::Day),
            "week" => Ok(TimeBucket::Week),
            "month" => Ok(TimeBucket::Month),
            _ => Err(TokenError::Bucket(s.to_owned())),
        }
    }
}

/// The calendar used for truncation, labels and zone-less timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Calendar {
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl Calendar {
    /// A fixed calendar `minutes` east of UTC. Out-of-range offsets fall back
    /// to the local calendar.
    pub fn from_offset_minutes(minutes: i32) -> Calendar {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map_or(Calendar::Local, Calendar::Fixed)
    }

    pub fn utc() -> Calendar {
        Calendar::from_offset_minutes(0)
    }

    /// Floors `ts` to `bucket` and returns the bucket start (epoch millis)
    /// together with its display label.
    pub fn floor(&self, ts: DateTime<Utc>, bucket: TimeBucket) -> Option<(i64, String)> {
        match self {
            Calendar::Local => floor_in(&ts.with_timezone(&Local), bucket),
            Calendar::Fixed(offset) => floor_in(&ts.with_timezone(offset), bucket),
        }
    }

    fn assume_local(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        let resolved = match self {
            Calendar::Local => Local.from_local_datetime(&naive).earliest()?.to_utc(),
            Calendar::Fixed(offset) => offset.from_local_datetime(&naive).earliest()?.to_utc(),
        };
        Some(resolved)
    }

    /// Parses a sample timestamp.
    ///
    /// Accepts epoch milliseconds, RFC 3339, zone-less date-times (read in this
    /// calendar) and bare dates (read as UTC midnight).
    pub fn parse_timestamp(&self, value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::Number(n) => {
                let millis = n.as_f64().filter(|m| m.is_finite())?;
                DateTime::from_timestamp_millis(millis.trunc() as i64)
            }
            Value::String(s) => self.parse_str(s.trim()),
            _ => None,
        }
    }

    fn parse_str(&self, s: &str) -> Option<DateTime<Utc>> {
        if s.is_empty() {
            return None;
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Some(ts.to_utc());
        }
        if let Some(naive) = NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        {
            return self.assume_local(naive);
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}

fn floor_in<Tz>(ts: &DateTime<Tz>, bucket: TimeBucket) -> Option<(i64, String)>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let start = bucket.truncate(ts)?;
    Some((start.timestamp_millis(), bucket.label(&start)))
}
