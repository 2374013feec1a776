//! Tolerant field deserializers for analysis documents
//!
//! Analysis JSON is model-produced: fields come back `null`, counts come
//! back as `1500.0` or `-1`, lists carry stray `null`s. These helpers read
//! one field each and fall back to the field's default instead of failing
//! the whole section.

use super::records::{as_count, as_flag, as_float};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

fn raw<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
    Value::deserialize(deserializer)
}

/// Text kept verbatim; numbers and flags are stringified, anything else is empty.
pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(scalar_text(raw(deserializer)?).unwrap_or_default())
}

pub fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_text(raw(deserializer)?))
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A list of strings. Nulls and nested values are skipped, a bare string
/// becomes a one-element list.
pub fn text_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match raw(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
        other => scalar_text(other).into_iter().collect(),
    })
}

pub fn count_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let count = as_count(&raw(deserializer)?).unwrap_or(0);
    Ok(u32::try_from(count).unwrap_or(u32::MAX))
}

pub fn count_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(as_count(&raw(deserializer)?).unwrap_or(0))
}

pub fn count_usize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    let count = as_count(&raw(deserializer)?).unwrap_or(0);
    Ok(usize::try_from(count).unwrap_or(usize::MAX))
}

pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(as_float(&raw(deserializer)?).unwrap_or(0.0))
}

/// Sentiment score, clamped to `[-1, 1]`.
pub fn score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(as_float(&raw(deserializer)?).map(|s| s.clamp(-1.0, 1.0)))
}

pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(as_flag(&raw(deserializer)?).unwrap_or(false))
}

/// Any defaultable value, with `null` or a mistyped value read as the default.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(serde_json::from_value(raw(deserializer)?).unwrap_or_default())
}

/// A list of records. Entries that do not read as `T` are dropped one by one.
pub fn entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(list_entries(raw(deserializer)?, "entry"))
}

/// Read each element of an array on its own, keeping those that parse.
pub(super) fn list_entries<T: DeserializeOwned>(value: Value, what: &str) -> Vec<T> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!(what, error = %err, "dropping unreadable list entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Sample {
        #[serde(deserialize_with = "text")]
        name: String,
        #[serde(deserialize_with = "count_u32")]
        count: u32,
        #[serde(deserialize_with = "text_list")]
        tags: Vec<String>,
        #[serde(deserialize_with = "score")]
        score: Option<f64>,
        #[serde(deserialize_with = "flag")]
        done: bool,
    }

    fn sample(value: Value) -> Sample {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn nulls_read_as_defaults() {
        let s = sample(json!({"name": null, "count": null, "tags": null, "score": null, "done": null}));
        assert_eq!(s.name, "");
        assert_eq!(s.count, 0);
        assert!(s.tags.is_empty());
        assert_eq!(s.score, None);
        assert!(!s.done);
    }

    #[test]
    fn counts_round_floats_and_clamp_negatives() {
        assert_eq!(sample(json!({"count": 1500.0})).count, 1500);
        assert_eq!(sample(json!({"count": 2.6})).count, 3);
        assert_eq!(sample(json!({"count": -4})).count, 0);
        assert_eq!(sample(json!({"count": "12"})).count, 12);
    }

    #[test]
    fn text_is_kept_verbatim() {
        assert_eq!(sample(json!({"name": "  Kim Dokja "})).name, "  Kim Dokja ");
        assert_eq!(sample(json!({"name": 7})).name, "7");
        assert_eq!(sample(json!({"name": ["x"]})).name, "");
    }

    #[test]
    fn lists_skip_nulls() {
        let s = sample(json!({"tags": ["a", null, "b", {"x": 1}]}));
        assert_eq!(s.tags, vec!["a", "b"]);
        assert_eq!(sample(json!({"tags": "solo"})).tags, vec!["solo"]);
    }

    #[test]
    fn score_is_clamped() {
        assert_eq!(sample(json!({"score": 4.0})).score, Some(1.0));
        assert_eq!(sample(json!({"score": "-0.5"})).score, Some(-0.5));
    }

    #[test]
    fn list_entries_drop_only_bad_items() {
        let kept: Vec<Sample> = list_entries(json!([{"name": "a"}, "not a record", {"name": "b"}]), "sample");
        let names: Vec<_> = kept.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(list_entries::<Sample>(json!("nope"), "sample").is_empty());
    }
}
