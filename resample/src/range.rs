//! Brush ranges over a bucket series.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sample::as_number;
use crate::series::Bucket;

/// An inclusive `[start, end]` pair of bucket indices, always within bounds
/// and with `start <= end`. Serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexRange(pub usize, pub usize);

impl IndexRange {
    pub fn contains(self, index: usize) -> bool {
        (self.0..=self.1).contains(&index)
    }
}

/// A caller-supplied range before clamping. Indices may be fractional,
/// negative or past the end; the end may be left open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestedRange {
    pub start: f64,
    pub end: Option<f64>,
}

impl RequestedRange {
    pub fn new(start: f64, end: Option<f64>) -> Self {
        RequestedRange { start, end }
    }

    /// Reads a `[start, end]` array. Anything other than a two-element array
    /// is no range at all; a missing or non-numeric start reads as 0 and a
    /// missing end stays open.
    pub fn from_value(value: &Value) -> Option<RequestedRange> {
        match value.as_array()?.as_slice() {
            [start, end] => Some(RequestedRange {
                start: as_number(start).unwrap_or(0.0),
                end: as_number(end),
            }),
            _ => None,
        }
    }
}

impl From<IndexRange> for RequestedRange {
    fn from(range: IndexRange) -> Self {
        RequestedRange {
            start: range.0 as f64,
            end: Some(range.1 as f64),
        }
    }
}

/// Clamps a requested range to `[0, max_index]`, keeping `end >= start`.
///
/// Returns `None` when there is no range or nothing to clamp into.
pub fn clamp_range(requested: Option<&RequestedRange>, max_index: i64) -> Option<IndexRange> {
    let requested = requested?;
    if max_index < 0 {
        return None;
    }
    let start = to_index(requested.start).unwrap_or(0).clamp(0, max_index);
    let end = requested
        .end
        .and_then(to_index)
        .unwrap_or(max_index)
        .max(start)
        .clamp(start, max_index);
    Some(IndexRange(start as usize, end as usize))
}

fn to_index(n: f64) -> Option<i64> {
    // `as` saturates, so huge values land on i64::MIN/MAX and clamp cleanly.
    n.is_finite().then(|| n.trunc() as i64)
}

/// Union of the batch ids of every bucket inside `range`.
pub fn collect_ids(series: &[Bucket], range: IndexRange) -> BTreeSet<String> {
    series
        .iter()
        .enumerate()
        .filter(|(index, _)| range.contains(*index))
        .flat_map(|(_, bucket)| bucket.batch_ids.iter().cloned())
        .collect()
}

/// Outcome of applying an optional brush range to a finished series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrushSelection {
    pub display_range: Option<IndexRange>,
    pub config_range: Option<IndexRange>,
    pub allowed_ids: Option<BTreeSet<String>>,
    pub filter_active: bool,
}

/// Clamps the requested range against `series` and, when it narrows the view,
/// collects the ids it covers.
pub fn select(series: &[Bucket], requested: Option<&RequestedRange>) -> BrushSelection {
    if series.is_empty() {
        return BrushSelection::default();
    }
    let max_index = series.len() as i64 - 1;
    let full = IndexRange(0, series.len() - 1);
    let config_range = clamp_range(requested, max_index);
    let filter_active = config_range.is_some_and(|range| range != full);
    let allowed_ids = config_range
        .filter(|_| filter_active)
        .map(|range| collect_ids(series, range));

    BrushSelection {
        display_range: Some(config_range.unwrap_or(full)),
        config_range,
        allowed_ids,
        filter_active,
    }
}
