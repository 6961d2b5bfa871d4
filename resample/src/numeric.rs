//! Histogram bins over a numeric dimension.
//!
//! Bins either come precomputed from the report backend or are derived here
//! as equal-width partitions of the observed `[min, max]`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::aggregate::Accumulator;
use crate::config::{Aggregation, BucketSpec, DEFAULT_BIN_COUNT, MAX_BIN_COUNT};
use crate::key::{BucketKey, SortValue};
use crate::sample::{Sample, deserialize_ids};
use crate::series::Bucket;

/// A bin computed by the backend over the full dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericBin {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub sum: f64,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default, alias = "batchIds", deserialize_with = "deserialize_ids")]
    pub batch_ids: BTreeSet<String>,
}

/// Whether backend bins can stand in for client binning.
///
/// The backend aggregates the binned column itself, so its sums only mean
/// something when the metric is that column. An explicit bin count must also
/// match what was supplied.
pub fn can_reuse(bins: &[NumericBin], field: &str, metric: &str, bucket: BucketSpec) -> bool {
    !bins.is_empty()
        && field == metric
        && bucket.bin_count().is_none_or(|n| n == bins.len())
}

/// Re-finalises backend bins under `aggregation`, keeping their boundaries and
/// membership.
pub fn from_server(bins: &[NumericBin], aggregation: Aggregation) -> Vec<Bucket> {
    let mut ordered: Vec<&NumericBin> = bins.iter().collect();
    ordered.sort_by(|a, b| a.start.total_cmp(&b.start));
    ordered
        .into_iter()
        .enumerate()
        .map(|(index, bin)| Bucket {
            key: BucketKey::Bin(index).to_string(),
            label: format!("{} - {}", bin.start, bin.end),
            sort_value: SortValue::Number(bin.start),
            value: aggregation.apply(
                bin.sum,
                bin.count,
                bin.min.unwrap_or(f64::INFINITY),
                bin.max.unwrap_or(f64::NEG_INFINITY),
            ),
            batch_ids: bin.batch_ids.clone(),
        })
        .collect()
}

/// Client-side binning result.
#[derive(Debug, Clone, PartialEq)]
pub struct Binned {
    pub series: Vec<Bucket>,
    pub bin_count: usize,
    pub skipped: usize,
}

/// Partitions the observed range of `field` into equal-width bins and
/// aggregates `metric` within each.
///
/// Samples without a finite `field` value are skipped. When every value is
/// equal the width is zero and everything lands in the first bin.
pub fn compute(
    samples: &[Sample],
    field: &str,
    metric: &str,
    bucket: BucketSpec,
    aggregation: Aggregation,
) -> Binned {
    let bin_count = bucket
        .bin_count()
        .unwrap_or(DEFAULT_BIN_COUNT)
        .clamp(1, MAX_BIN_COUNT);

    let values: Vec<(f64, &Sample)> = samples
        .iter()
        .filter_map(|s| s.number(field).map(|v| (v, s)))
        .collect();
    let skipped = samples.len() - values.len();

    let Some((min, max)) = values.iter().fold(None, |bounds, &(v, _)| match bounds {
        None => Some((v, v)),
        Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
    }) else {
        return Binned {
            series: Vec::new(),
            bin_count,
            skipped,
        };
    };

    // Halved so the span stays finite even between values near ±f64::MAX.
    let half_span = max / 2.0 - min / 2.0;
    let edge = |index: usize| {
        let offset = half_span * (index as f64 / bin_count as f64);
        min + offset + offset
    };

    let mut bins = vec![Accumulator::default(); bin_count];
    for (value, sample) in &values {
        let index = if half_span > 0.0 {
            let position = (value / 2.0 - min / 2.0) / half_span;
            ((position * bin_count as f64).floor() as usize).min(bin_count - 1)
        } else {
            0
        };
        bins[index].push(sample.number(metric).unwrap_or(0.0), sample.id());
    }

    let series = bins
        .into_iter()
        .enumerate()
        .map(|(index, acc)| {
            let lower = edge(index);
            let upper = if index == bin_count - 1 {
                max
            } else {
                edge(index + 1)
            };
            Bucket {
                key: BucketKey::Bin(index).to_string(),
                label: format!("{lower:.2} - {upper:.2}"),
                sort_value: SortValue::Number(lower),
                value: acc.finish(aggregation),
                batch_ids: acc.batch_ids,
            }
        })
        .collect();

    Binned {
        series,
        bin_count,
        skipped,
    }
}
