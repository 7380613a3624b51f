use crate::record::StoredRecord;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),
}

/// Outcome of an idempotent write. `SkippedStale` is a normal outcome, not
/// an error: an older observation arrived after a newer one already landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    SkippedStale,
}

/// One comparison applied to a named field of a stored record.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Equals(String, Value),
    GreaterOrEqual(String, Value),
    LessOrEqual(String, Value),
    NotEqual(String, Value),
}

impl Filter {
    pub fn matches(&self, record: &StoredRecord) -> bool {
        match self {
            Filter::Equals(field, expected) => {
                field_cmp(record, field, expected) == Some(Ordering::Equal)
            }
            Filter::NotEqual(field, expected) => {
                field_cmp(record, field, expected) != Some(Ordering::Equal)
            }
            Filter::GreaterOrEqual(field, expected) => matches!(
                field_cmp(record, field, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Filter::LessOrEqual(field, expected) => matches!(
                field_cmp(record, field, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

fn field_cmp(
    record: &StoredRecord,
    field: &str,
    expected: &Value,
) -> Option<Ordering> {
    let actual = record.field(field)?;
    match (&actual, expected) {
        (Value::Number(a), Value::Number(b)) => {
            a.as_f64()?.partial_cmp(&b.as_f64()?)
        }
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Durable, idempotent persistence of validated records, keyed by URL.
///
/// `upsert` is the acquisition hot path; the remaining operations are the
/// read/write conveniences consumed by record-management collaborators.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Conditional write: succeeds only when no existing record for the URL
    /// carries an `updated_at` at or past the incoming one. A stale write is
    /// a no-op reported as `SkippedStale` and counted as a duplicate.
    async fn upsert(
        &self,
        record: StoredRecord,
    ) -> Result<UpsertOutcome, StorageError>;

    async fn get(&self, url: &str) -> Result<Option<StoredRecord>, StorageError>;

    /// Records matching every filter, ordered by URL, paged by
    /// `limit`/`offset`.
    async fn list(
        &self,
        filters: &[Filter],
        limit: usize,
        offset: usize,
    ) -> Result<Vec<StoredRecord>, StorageError>;

    /// Partial update of mutable fields; refreshes `updated_at`. Returns
    /// false when no record exists for the URL.
    async fn update(
        &self,
        url: &str,
        fields: &HashMap<String, Value>,
    ) -> Result<bool, StorageError>;

    /// Returns false when no record exists for the URL.
    async fn delete(&self, url: &str) -> Result<bool, StorageError>;

    async fn count(&self) -> Result<usize, StorageError>;
}

pub type SharedListingStore = Arc<dyn ListingStore + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ValidatedRecord;
    use chrono::Utc;
    use serde_json::json;

    fn record(price: f64, source: &str) -> StoredRecord {
        StoredRecord::from_validated(
            ValidatedRecord {
                url: "https://example.com/listing/1".into(),
                source: source.into(),
                price,
                address: "1 Main St".into(),
                description: "Bright corner unit with a large balcony".into(),
                contact: None,
                validated_at: Utc::now(),
            },
            "buyer-leads",
        )
    }

    #[test]
    fn test_numeric_filters() {
        let r = record(250_000.0, "craigslist");

        assert!(Filter::GreaterOrEqual("price".into(), json!(250_000.0)).matches(&r));
        assert!(Filter::GreaterOrEqual("price".into(), json!(200_000)).matches(&r));
        assert!(!Filter::GreaterOrEqual("price".into(), json!(300_000)).matches(&r));
        assert!(Filter::LessOrEqual("price".into(), json!(250_000)).matches(&r));
        assert!(!Filter::LessOrEqual("price".into(), json!(100_000)).matches(&r));
    }

    #[test]
    fn test_string_filters() {
        let r = record(250_000.0, "craigslist");

        assert!(Filter::Equals("source".into(), json!("craigslist")).matches(&r));
        assert!(!Filter::Equals("source".into(), json!("zillow")).matches(&r));
        assert!(Filter::NotEqual("source".into(), json!("zillow")).matches(&r));
    }

    #[test]
    fn test_missing_field_never_equals() {
        let r = record(250_000.0, "craigslist");

        assert!(!Filter::Equals("contact".into(), json!("x")).matches(&r));
        assert!(Filter::NotEqual("contact".into(), json!("x")).matches(&r));
        assert!(!Filter::GreaterOrEqual("contact".into(), json!("x")).matches(&r));
    }

    #[test]
    fn test_mismatched_types_do_not_match_ordered_filters() {
        let r = record(250_000.0, "craigslist");
        assert!(!Filter::GreaterOrEqual("price".into(), json!("250000")).matches(&r));
    }
}
