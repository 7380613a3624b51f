use crate::record::{RawRecord, ValidatedRecord};
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural and content rules applied to every raw record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    pub required_fields: Vec<String>,
    /// Regex patterns a raw price string must match; first match wins.
    pub valid_price_formats: Vec<String>,
    pub price_min: f64,
    pub price_max: f64,
    pub min_description_length: usize,
    pub max_description_length: usize,
    /// Case-insensitive substrings that disqualify a description.
    pub excluded_terms: Vec<String>,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            required_fields: vec![
                "url".to_string(),
                "source".to_string(),
                "price".to_string(),
                "address".to_string(),
                "description".to_string(),
            ],
            valid_price_formats: vec![
                r"^\$?[0-9][0-9,]*(?:\.[0-9]{1,2})?$".to_string(),
                r"^[0-9]+(?:\.[0-9]+)?$".to_string(),
            ],
            price_min: 10_000.0,
            price_max: 50_000_000.0,
            min_description_length: 30,
            max_description_length: 10_000,
            excluded_terms: vec![
                "wanted".to_string(),
                "looking for".to_string(),
                "test listing".to_string(),
            ],
        }
    }
}

#[derive(Error, Debug)]
pub enum RulesError {
    #[error("invalid price format pattern {pattern:?}: {source}")]
    BadPricePattern {
        pattern: String,
        source: regex::Error,
    },
}

/// Why a record observation was dropped. Terminal for that observation:
/// re-validating the same input would reproduce the same rejection, so
/// rejected records are never queued for another pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationRejection {
    #[error("missing_field:{0}")]
    MissingField(String),
    #[error("invalid_price")]
    InvalidPrice,
    #[error("description_length")]
    DescriptionLength,
    #[error("excluded_term:{0}")]
    ExcludedTerm(String),
}

/// Collapse runs of whitespace (including newlines) into single spaces and
/// trim the ends.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Validation stage with rules compiled once at startup. A bad pattern is a
/// configuration error and halts the owning worker before it processes
/// anything.
#[derive(Debug)]
pub struct Validator {
    rules: ValidationRules,
    price_formats: Vec<Regex>,
}

impl Validator {
    pub fn new(rules: ValidationRules) -> Result<Self, RulesError> {
        let price_formats = rules
            .valid_price_formats
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| RulesError::BadPricePattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            rules,
            price_formats,
        })
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    pub fn validate(
        &self,
        raw: &RawRecord,
    ) -> Result<ValidatedRecord, ValidationRejection> {
        for field in &self.rules.required_fields {
            match raw.get(field) {
                Some(value) if !value.trim().is_empty() => {}
                _ => {
                    return Err(ValidationRejection::MissingField(field.clone()))
                }
            }
        }

        let price = self.parse_price(
            raw.get("price")
                .ok_or_else(|| ValidationRejection::MissingField("price".into()))?,
        )?;

        let description = normalize_text(
            raw.get("description").ok_or_else(|| {
                ValidationRejection::MissingField("description".into())
            })?,
        );
        let length = description.chars().count();
        if length < self.rules.min_description_length
            || length > self.rules.max_description_length
        {
            return Err(ValidationRejection::DescriptionLength);
        }
        let lowered = description.to_lowercase();
        for term in &self.rules.excluded_terms {
            if lowered.contains(&term.to_lowercase()) {
                return Err(ValidationRejection::ExcludedTerm(term.clone()));
            }
        }

        let text_field = |name: &str| {
            raw.get(name)
                .map(normalize_text)
                .ok_or_else(|| ValidationRejection::MissingField(name.into()))
        };

        Ok(ValidatedRecord {
            url: text_field("url")?,
            source: text_field("source")?,
            price,
            address: text_field("address")?,
            description,
            contact: raw
                .get("contact")
                .map(normalize_text)
                .filter(|c| !c.is_empty()),
            validated_at: Utc::now(),
        })
    }

    /// First matching pattern wins, then non-numeric characters are stripped
    /// and the remainder parsed. The numeric value replaces the raw string
    /// in the validated record.
    fn parse_price(&self, raw: &str) -> Result<f64, ValidationRejection> {
        let trimmed = raw.trim();
        if !self.price_formats.iter().any(|re| re.is_match(trimmed)) {
            return Err(ValidationRejection::InvalidPrice);
        }

        let numeric: String = trimmed
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        let value: f64 = numeric
            .parse()
            .map_err(|_| ValidationRejection::InvalidPrice)?;

        if !value.is_finite()
            || value < self.rules.price_min
            || value > self.rules.price_max
        {
            return Err(ValidationRejection::InvalidPrice);
        }
        Ok(value)
    }
}
