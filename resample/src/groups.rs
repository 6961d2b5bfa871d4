//! Category groups precomputed by the report backend.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::aggregate::sort_buckets;
use crate::key::SortValue;
use crate::sample::{as_number, id_string};
use crate::series::Bucket;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    pub key: String,
    pub label: String,
    pub value: f64,
    pub batch_ids: BTreeSet<String>,
    pub sort_value: Option<SortValue>,
}

impl CategoryGroup {
    /// Reads one group entry. Only a non-empty `key` is required; any other
    /// field that is missing or malformed takes its default.
    pub fn from_value(entry: &Value) -> Option<CategoryGroup> {
        let obj = entry.as_object()?;
        let key = obj.get("key").and_then(id_string)?;
        let label = obj
            .get("label")
            .and_then(Value::as_str)
            .map_or_else(|| key.clone(), str::to_owned);
        let value = obj.get("value").and_then(as_number).unwrap_or(0.0);
        let batch_ids = ["batch_ids", "batchIds"]
            .iter()
            .find_map(|field| obj.get(*field).and_then(Value::as_array))
            .map(|ids| ids.iter().filter_map(id_string).collect())
            .unwrap_or_default();
        let sort_value = ["sort_value", "sortValue"]
            .iter()
            .find_map(|field| obj.get(*field))
            .and_then(|v| match v {
                Value::Number(n) => n.as_f64().map(SortValue::Number),
                Value::String(s) => Some(SortValue::Text(s.clone())),
                _ => None,
            });

        Some(CategoryGroup {
            key,
            label,
            value,
            batch_ids,
            sort_value,
        })
    }

    /// The value this group sorts by: its numeric or text `sort_value`, or
    /// else the lower-cased label.
    fn effective_sort_value(&self) -> SortValue {
        self.sort_value
            .clone()
            .unwrap_or_else(|| SortValue::Text(self.label.to_lowercase()))
    }
}

/// Turns precomputed groups into a sorted series, dropping entries without a
/// usable key.
pub fn series(entries: &[Value]) -> Vec<Bucket> {
    let mut buckets: Vec<Bucket> = entries
        .iter()
        .filter_map(CategoryGroup::from_value)
        .map(|group| Bucket {
            sort_value: group.effective_sort_value(),
            key: group.key,
            label: group.label,
            value: group.value,
            batch_ids: group.batch_ids,
        })
        .collect();
    sort_buckets(&mut buckets);
    buckets
}
