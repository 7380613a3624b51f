use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Raw scraped listing fields, exactly as a spider or lead agent collected
/// them. No invariants hold yet: any field may be missing, empty, or junk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    fields: HashMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

impl From<HashMap<String, String>> for RawRecord {
    fn from(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }
}

/// A record that passed the validation stage: price is numeric and within
/// range, text is whitespace-normalized, and every configured required
/// field was present and non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRecord {
    pub url: String,
    pub source: String,
    /// Numeric; the raw price string does not survive validation.
    pub price: f64,
    pub address: String,
    pub description: String,
    pub contact: Option<String>,
    pub validated_at: DateTime<Utc>,
}

/// A validated record plus storage metadata. At most one exists per `url`;
/// `updated_at` is monotonically non-decreasing across writes for that key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub url: String,
    pub source: String,
    pub price: f64,
    pub address: String,
    pub description: String,
    pub contact: Option<String>,
    pub validated_at: DateTime<Utc>,
    pub spider_name: String,
    pub updated_at: DateTime<Utc>,
}

impl StoredRecord {
    pub fn from_validated(record: ValidatedRecord, spider_name: &str) -> Self {
        Self {
            url: record.url,
            source: record.source,
            price: record.price,
            address: record.address,
            description: record.description,
            contact: record.contact,
            validated_at: record.validated_at,
            spider_name: spider_name.to_string(),
            updated_at: Utc::now(),
        }
    }

    /// Field access by name, for filter evaluation. Timestamps come back as
    /// RFC 3339 strings, which order lexically the same as chronologically.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "url" => Some(json!(self.url)),
            "source" => Some(json!(self.source)),
            "price" => Some(json!(self.price)),
            "address" => Some(json!(self.address)),
            "description" => Some(json!(self.description)),
            "contact" => self.contact.as_ref().map(|c| json!(c)),
            "spider_name" => Some(json!(self.spider_name)),
            "validated_at" => Some(json!(self.validated_at.to_rfc3339())),
            "updated_at" => Some(json!(self.updated_at.to_rfc3339())),
            _ => None,
        }
    }
}
