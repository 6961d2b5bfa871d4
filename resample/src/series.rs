use std::collections::BTreeSet;

use serde::Serialize;

use crate::key::SortValue;
use crate::range::IndexRange;
use crate::time_bucket::TimeBucket;

/// One aggregated point of a chart series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub key: String,
    pub label: String,
    pub sort_value: SortValue,
    pub value: f64,
    pub batch_ids: BTreeSet<String>,
}

/// The granularity a series was actually built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResolvedBucket {
    Time(TimeBucket),
    Bins(usize),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResampleResult {
    pub series: Vec<Bucket>,
    pub resolved_bucket: Option<ResolvedBucket>,
    pub display_range: Option<IndexRange>,
    pub config_range: Option<IndexRange>,
    pub allowed_ids: Option<BTreeSet<String>>,
    pub filter_active: bool,
    /// Samples dropped because they could not be placed in any bucket.
    pub skipped: usize,
}

impl ResampleResult {
    /// Buckets inside the display range, paired with their index.
    pub fn displayed(&self) -> impl Iterator<Item = (usize, &Bucket)> {
        let range = self.display_range;
        self.series
            .iter()
            .enumerate()
            .filter(move |(index, _)| range.is_some_and(|r| r.contains(*index)))
    }
}
