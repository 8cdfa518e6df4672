//! Shallow-merge contract for asset metadata.
//!
//! Every asset kind persists a side record describing cache completeness —
//! page statuses, missing-item lists, last-checked/last-created timestamps —
//! distinct from the asset's primary data. The record is overwritten on every
//! policy check and again after every successful creation, always as a
//! shallow merge onto the last known state so unfinished-item tracking from a
//! prior partial run is never lost.

use serde_json::Value;

use crate::storage::{CacheStore, StorageError};

/// Shallow merge of `updates` onto `old`.
///
/// Semantics are an explicit contract, not incidental object-spread behavior:
/// later keys win, arrays are replaced (never concatenated), and non-object
/// inputs are replaced wholesale by `updates`.
///
/// # Examples
///
/// ```
/// use assetgraph::meta::merge_meta;
/// use serde_json::json;
///
/// let old = json!({"pages": {"1": "done"}, "missing": [5, 6], "checked": 1});
/// let updates = json!({"missing": [6], "created": 2});
/// let merged = merge_meta(&old, &updates);
///
/// assert_eq!(merged["pages"], json!({"1": "done"})); // untouched keys survive
/// assert_eq!(merged["missing"], json!([6]));          // arrays replaced
/// assert_eq!(merged["created"], json!(2));            // new keys added
/// ```
#[must_use]
pub fn merge_meta(old: &Value, updates: &Value) -> Value {
    match (old, updates) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut merged = base.clone();
            for (key, value) in overlay {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => updates.clone(),
    }
}

/// Read a metadata record, tolerating absence and corruption.
///
/// Missing or unparseable records yield `None`; the caller substitutes its
/// type-specific default.
pub async fn read_meta(store: &dyn CacheStore, key: &str) -> Option<Value> {
    match store.read(key).await {
        Ok(text) => serde_json::from_str(&text).ok(),
        Err(_) => None,
    }
}

/// Read-modify-merge-write a metadata record.
///
/// Loads the last known record (or `default` when unreadable), shallow-merges
/// `updates` onto it, persists the result, and returns the merged record.
pub async fn update_meta(
    store: &dyn CacheStore,
    key: &str,
    default: &Value,
    updates: &Value,
) -> Result<Value, StorageError> {
    let current = read_meta(store, key).await.unwrap_or_else(|| default.clone());
    let merged = merge_meta(&current, updates);
    let encoded = merged.to_string();
    store.write(key, &encoded).await?;
    Ok(merged)
}
