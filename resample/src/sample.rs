use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One input record as sent by the report backend.
///
/// Samples are loosely shaped (the numeric dimension can be any column), so the
/// raw JSON object is kept and read through typed accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sample(pub Map<String, Value>);

impl Sample {
    /// Returns the field's value, treating JSON `null` as absent.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(as_number)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Provenance id: `batch_id`, falling back to `id`.
    pub fn id(&self) -> Option<String> {
        ["batch_id", "id"]
            .iter()
            .find_map(|field| self.get(field).and_then(id_string))
    }

    pub fn batch_index(&self) -> Option<i64> {
        self.number("batch_index").map(|n| n.trunc() as i64)
    }
}

impl From<Map<String, Value>> for Sample {
    fn from(map: Map<String, Value>) -> Self {
        Sample(map)
    }
}

/// Reads a sample list out of an arbitrary JSON value.
///
/// Anything that is not an array yields no samples; array entries that are not
/// objects are dropped.
pub fn samples_from_value(value: &Value) -> Vec<Sample> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| item.as_object().cloned().map(Sample))
        .collect()
}

/// Interprets a JSON number or numeric string as a finite `f64`.
pub fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Renders an id value (string or number) to its canonical string form.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Deserializes a list of ids that may mix strings and numbers. Unusable
/// entries are dropped.
pub(crate) fn deserialize_ids<'de, D, C>(deserializer: D) -> Result<C, D::Error>
where
    D: Deserializer<'de>,
    C: FromIterator<String>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw.iter().filter_map(id_string).collect())
}

/// Deserializes a configuration token. Numbers are rendered to text; any
/// other non-string value reads as unset.
pub(crate) fn deserialize_token<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Deserializes a whole number of minutes from a number or numeric string.
pub(crate) fn deserialize_offset<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(as_number)
        .filter(|n| n.abs() <= f64::from(i32::MAX))
        .map(|n| n.trunc() as i32))
}
