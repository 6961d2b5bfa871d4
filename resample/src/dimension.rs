//! Bucket-key resolution for grouped dimensions.
//!
//! Each dimension kind gets its own [`KeyResolver`]; the engine picks one per
//! call and never branches on the dimension again.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::aggregate::Slot;
use crate::key::{BucketKey, SortValue};
use crate::sample::Sample;
use crate::time_bucket::{Calendar, TimeBucket};

pub const UNCATEGORIZED: &str = "Uncategorized";

const TIME_FIELDS: &[&str] = &["time", "timestamp"];

pub trait KeyResolver {
    /// Places the sample at `position` (0-based) or returns `None` to skip it.
    fn resolve(&self, sample: &Sample, position: usize) -> Option<Slot>;
}

/// The raw time value of a sample: the configured field, then `time`, then
/// `timestamp`.
pub fn time_value<'a>(sample: &'a Sample, field: &str) -> Option<&'a Value> {
    std::iter::once(field)
        .chain(TIME_FIELDS.iter().copied())
        .find_map(|f| sample.get(f))
}

pub struct TemporalResolver {
    /// Parsed timestamps, indexed by sample position.
    timestamps: Vec<Option<DateTime<Utc>>>,
    bucket: TimeBucket,
    calendar: Calendar,
}

impl TemporalResolver {
    pub fn new(timestamps: Vec<Option<DateTime<Utc>>>, bucket: TimeBucket, calendar: Calendar) -> Self {
        TemporalResolver {
            timestamps,
            bucket,
            calendar,
        }
    }
}

impl KeyResolver for TemporalResolver {
    fn resolve(&self, _sample: &Sample, position: usize) -> Option<Slot> {
        let ts = (*self.timestamps.get(position)?)?;
        let (start_ms, label) = self.calendar.floor(ts, self.bucket)?;
        Some(Slot {
            key: BucketKey::Time {
                bucket: self.bucket,
                start_ms,
            },
            sort_value: SortValue::Number(start_ms as f64),
            label,
        })
    }
}

pub struct CategoricalResolver<'a> {
    pub field: &'a str,
}

impl KeyResolver for CategoricalResolver<'_> {
    fn resolve(&self, sample: &Sample, _position: usize) -> Option<Slot> {
        let name = sample
            .text(self.field)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNCATEGORIZED);
        Some(Slot {
            key: BucketKey::Category(name.to_owned()),
            sort_value: SortValue::Text(name.to_owned()),
            label: name.to_owned(),
        })
    }
}

pub struct OrdinalResolver;

impl KeyResolver for OrdinalResolver {
    fn resolve(&self, sample: &Sample, position: usize) -> Option<Slot> {
        let index = sample.batch_index().unwrap_or(position as i64 + 1);
        Some(Slot {
            key: BucketKey::Batch(index),
            sort_value: SortValue::Number(index as f64),
            label: format!("Batch {index}"),
        })
    }
}
