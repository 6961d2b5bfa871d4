use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time_bucket::TimeBucket;

/// Identity of a bucket.
///
/// The string form (`day:<epoch_ms>`, `cat:<name>`, ...) is only rendered when
/// a bucket leaves the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BucketKey {
    Time { bucket: TimeBucket, start_ms: i64 },
    Category(String),
    Bin(usize),
    Batch(i64),
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::Time { bucket, start_ms } => write!(f, "{bucket}:{start_ms}"),
            BucketKey::Category(name) => write!(f, "cat:{name}"),
            BucketKey::Bin(index) => write!(f, "bin:{index}"),
            BucketKey::Batch(index) => write!(f, "batch:{index}"),
        }
    }
}

/// Ordering key of a bucket: numeric where the dimension is numeric,
/// otherwise text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortValue {
    Number(f64),
    Text(String),
}

impl SortValue {
    /// Total order: numbers ascending, then text by code point. A mixed
    /// series puts every number ahead of every string.
    pub fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
            (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            SortValue::Number(n) => Some(*n),
            SortValue::Text(_) => None,
        }
    }
}
