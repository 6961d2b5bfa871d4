use std::collections::{BTreeSet, HashMap};

use crate::config::Aggregation;
use crate::key::{BucketKey, SortValue};
use crate::series::Bucket;

/// Running statistics for one bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    pub sum: f64,
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub batch_ids: BTreeSet<String>,
}

impl Default for Accumulator {
    fn default() -> Self {
        Accumulator {
            sum: 0.0,
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            batch_ids: BTreeSet::new(),
        }
    }
}

impl Accumulator {
    pub fn push(&mut self, value: f64, id: Option<String>) {
        self.sum += value;
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        if let Some(id) = id {
            self.batch_ids.insert(id);
        }
    }

    pub fn finish(&self, aggregation: Aggregation) -> f64 {
        aggregation.apply(self.sum, self.count, self.min, self.max)
    }
}

/// Where a sample lands: its bucket identity, ordering and display label.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub key: BucketKey,
    pub sort_value: SortValue,
    pub label: String,
}

struct Group {
    sort_value: SortValue,
    label: String,
    acc: Accumulator,
}

/// Folds samples into per-key accumulators.
#[derive(Default)]
pub struct GroupAggregator {
    groups: HashMap<BucketKey, Group>,
}

impl GroupAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, slot: Slot, value: f64, id: Option<String>) {
        let Slot {
            key,
            sort_value,
            label,
        } = slot;
        self.groups
            .entry(key)
            .or_insert_with(|| Group {
                sort_value,
                label,
                acc: Accumulator::default(),
            })
            .acc
            .push(value, id);
    }

    /// Finalises every group and returns them in ascending sort order.
    pub fn finish(self, aggregation: Aggregation) -> Vec<Bucket> {
        let aggregation = aggregation.for_groups();
        let mut buckets: Vec<Bucket> = self
            .groups
            .into_iter()
            .map(|(key, group)| Bucket {
                key: key.to_string(),
                label: group.label,
                sort_value: group.sort_value,
                value: group.acc.finish(aggregation),
                batch_ids: group.acc.batch_ids,
            })
            .collect();
        sort_buckets(&mut buckets);
        buckets
    }
}

/// Ascending by sort value, then by key so the order is total.
pub fn sort_buckets(buckets: &mut [Bucket]) {
    buckets.sort_by(|a, b| {
        a.sort_value
            .compare(&b.sort_value)
            .then_with(|| a.key.cmp(&b.key))
    });
}
