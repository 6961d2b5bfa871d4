use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::aggregate::GroupAggregator;
use crate::config::{BucketSpec, Dimension, ResampleConfig, ResampleRequest};
use crate::dimension::{
    CategoricalResolver, KeyResolver, OrdinalResolver, TemporalResolver, time_value,
};
use crate::groups;
use crate::numeric::{self, NumericBin};
use crate::range;
use crate::sample::Sample;
use crate::series::{Bucket, ResampleResult, ResolvedBucket};
use crate::time_bucket::TimeBucket;

/// Aggregates the backend already computed, keyed by dimension name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerAggregates {
    #[serde(alias = "numericBins")]
    pub numeric_bins: HashMap<String, Vec<NumericBin>>,
    /// Raw group entries; malformed ones are dropped when read.
    #[serde(alias = "categoryGroups")]
    pub category_groups: HashMap<String, Vec<Value>>,
}

/// Resamples `samples` according to a loose widget configuration.
///
/// Never fails: unclassifiable samples are skipped and counted, and empty
/// input produces an empty series with no ranges.
pub fn resample(
    samples: &[Sample],
    config: &ResampleConfig,
    server: Option<&ServerAggregates>,
) -> ResampleResult {
    resample_request(samples, &config.normalize(), server)
}

pub fn resample_request(
    samples: &[Sample],
    request: &ResampleRequest,
    server: Option<&ServerAggregates>,
) -> ResampleResult {
    let built = match &request.dimension {
        Dimension::Temporal { field } => temporal(samples, field, request),
        Dimension::Categorical { field } => {
            let precomputed = server
                .and_then(|s| s.category_groups.get(field))
                .filter(|entries| !entries.is_empty());
            match precomputed {
                Some(entries) => Built {
                    series: groups::series(entries),
                    resolved_bucket: None,
                    skipped: 0,
                },
                None => {
                    let resolver = CategoricalResolver {
                        field: field.as_str(),
                    };
                    grouped(samples, &resolver, request, None)
                }
            }
        }
        Dimension::Numeric { field } => {
            let bins = server
                .and_then(|s| s.numeric_bins.get(field))
                .map(Vec::as_slice)
                .unwrap_or_default();
            if numeric::can_reuse(bins, field, &request.metric, request.bucket) {
                Built {
                    series: numeric::from_server(bins, request.aggregation),
                    resolved_bucket: Some(ResolvedBucket::Bins(bins.len())),
                    skipped: 0,
                }
            } else {
                let binned = numeric::compute(
                    samples,
                    field,
                    &request.metric,
                    request.bucket,
                    request.aggregation,
                );
                Built {
                    series: binned.series,
                    resolved_bucket: Some(ResolvedBucket::Bins(binned.bin_count)),
                    skipped: binned.skipped,
                }
            }
        }
        Dimension::Ordinal => grouped(samples, &OrdinalResolver, request, None),
    };

    let selection = range::select(&built.series, request.range.as_ref());
    debug!(
        dimension = ?request.dimension.kind(),
        aggregation = %request.aggregation,
        buckets = built.series.len(),
        skipped = built.skipped,
        filter_active = selection.filter_active,
        "resampled series"
    );

    ResampleResult {
        series: built.series,
        resolved_bucket: built.resolved_bucket,
        display_range: selection.display_range,
        config_range: selection.config_range,
        allowed_ids: selection.allowed_ids,
        filter_active: selection.filter_active,
        skipped: built.skipped,
    }
}

struct Built {
    series: Vec<Bucket>,
    resolved_bucket: Option<ResolvedBucket>,
    skipped: usize,
}

fn temporal(samples: &[Sample], field: &str, request: &ResampleRequest) -> Built {
    let timestamps: Vec<_> = samples
        .iter()
        .map(|s| time_value(s, field).and_then(|v| request.calendar.parse_timestamp(v)))
        .collect();
    let bucket = match request.bucket {
        BucketSpec::Time(bucket) => bucket,
        BucketSpec::Auto | BucketSpec::Bins(_) => {
            TimeBucket::for_span(timestamps.iter().flatten().copied())
        }
    };
    let resolver = TemporalResolver::new(timestamps, bucket, request.calendar);
    grouped(samples, &resolver, request, Some(ResolvedBucket::Time(bucket)))
}

fn grouped(
    samples: &[Sample],
    resolver: &impl KeyResolver,
    request: &ResampleRequest,
    resolved_bucket: Option<ResolvedBucket>,
) -> Built {
    let mut aggregator = GroupAggregator::new();
    let mut skipped = 0;
    for (position, sample) in samples.iter().enumerate() {
        let Some(slot) = resolver.resolve(sample, position) else {
            trace!(position, "sample has no bucket");
            skipped += 1;
            continue;
        };
        let value = sample.number(&request.metric).unwrap_or(0.0);
        aggregator.push(slot, value, sample.id());
    }
    Built {
        series: aggregator.finish(request.aggregation),
        resolved_bucket,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn samples(value: Value) -> Vec<Sample> {
        serde_json::from_value(value).unwrap()
    }

    fn config(value: Value) -> ResampleConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn temporal_days() {
        let input = samples(json!([
            { "id": "a", "time": "2024-01-01T03:00:00Z", "rows": 2 },
            { "id": "b", "time": "2024-01-01T20:00:00Z", "rows": 3 },
            { "id": "c", "time": "2024-01-03T10:00:00Z", "rows": 5 },
            { "id": "d", "time": "not a date", "rows": 100 },
        ]));
        let result = resample(
            &input,
            &config(json!({ "bucket": "day", "timezone": 0 })),
            None,
        );
        assert_eq!(result.resolved_bucket, Some(ResolvedBucket::Time(TimeBucket::Day)));
        assert_eq!(result.skipped, 1);
        let values: Vec<_> = result.series.iter().map(|b| (b.label.as_str(), b.value)).collect();
        assert_eq!(values, [("Jan 1, 2024", 5.0), ("Jan 3, 2024", 5.0)]);
        assert_eq!(result.display_range, Some(range::IndexRange(0, 1)));
    }

    #[test]
    fn bin_count_on_temporal_resolves_automatically() {
        let input = samples(json!([
            { "time": "2024-01-01T00:00" },
            { "time": "2024-01-01T00:05" },
        ]));
        let result = resample(&input, &config(json!({ "bucket": 12, "timezone": 0 })), None);
        assert_eq!(result.resolved_bucket, Some(ResolvedBucket::Time(TimeBucket::Minute)));
        assert_eq!(result.series.len(), 2);
    }

    #[test]
    fn ordinal_uses_batch_index() {
        let input = samples(json!([
            { "batch_index": 2, "batch_id": "x", "rows": 4 },
            { "batch_index": 1, "batch_id": "y", "rows": 1 },
            { "batch_id": "z", "rows": 7 },
        ]));
        let result = resample(&input, &config(json!({ "dimension": "batch_index" })), None);
        let labels: Vec<_> = result.series.iter().map(|b| b.label.as_str()).collect();
        // The third sample has no index and takes its position (3).
        assert_eq!(labels, ["Batch 1", "Batch 2", "Batch 3"]);
        assert_eq!(result.resolved_bucket, None);
    }

    #[test]
    fn precomputed_groups_bypass_samples() {
        let server: ServerAggregates = serde_json::from_value(json!({
            "categoryGroups": {
                "category": [
                    { "key": "cat:B", "label": "B", "value": 9, "batch_ids": ["1"] },
                    { "key": "cat:A", "label": "A", "value": 3, "batch_ids": ["2"] },
                ]
            }
        }))
        .unwrap();
        let input = samples(json!([{ "category": "Z", "rows": 1 }]));
        let result = resample(
            &input,
            &config(json!({ "dimension": "category", "range": [1, 1] })),
            Some(&server),
        );
        let keys: Vec<_> = result.series.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, ["cat:A", "cat:B"]);
        assert!(result.filter_active);
        assert_eq!(
            result.allowed_ids.unwrap().into_iter().collect::<Vec<_>>(),
            ["1"]
        );
    }

    #[test]
    fn groups_for_other_dimensions_are_ignored() {
        let server: ServerAggregates = serde_json::from_value(json!({
            "category_groups": { "region": [{ "key": "r", "value": 1 }] }
        }))
        .unwrap();
        let input = samples(json!([{ "category": "North", "rows": 2 }]));
        let result = resample(&input, &config(json!({ "dimension": "category" })), Some(&server));
        assert_eq!(result.series.len(), 1);
        assert_eq!(result.series[0].key, "cat:North");
    }

    #[test]
    fn server_bins_fall_back_when_metric_differs() {
        let server: ServerAggregates = serde_json::from_value(json!({
            "numeric_bins": {
                "size": [{ "start": 0, "end": 100, "count": 50, "sum": 2500 }]
            }
        }))
        .unwrap();
        let input = samples(json!([
            { "size": 1, "rows": 1 },
            { "size": 3, "rows": 1 },
        ]));

        let reused = resample(
            &input,
            &config(json!({ "dimension": "size", "metric": "size" })),
            Some(&server),
        );
        assert_eq!(reused.series.len(), 1);
        assert_eq!(reused.series[0].value, 2500.0);

        let computed = resample(
            &input,
            &config(json!({ "dimension": "size", "metric": "rows" })),
            Some(&server),
        );
        assert_eq!(computed.series.len(), 10);
        assert_eq!(computed.resolved_bucket, Some(ResolvedBucket::Bins(10)));
    }

    #[test]
    fn empty_input_is_well_formed() {
        for dimension in ["time", "category", "size", ""] {
            let result = resample(
                &[],
                &config(json!({ "dimension": dimension, "range": [0, 3] })),
                None,
            );
            assert!(result.series.is_empty(), "{dimension}");
            assert_eq!(result.display_range, None);
            assert_eq!(result.config_range, None);
            assert_eq!(result.allowed_ids, None);
            assert!(!result.filter_active);
        }
    }
}
