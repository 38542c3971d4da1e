use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result, ValueParseError};
use crate::models::Attribute;
use crate::names::{ExactNames, NameNormalizer};
use crate::table::{cell, RawTable};

/// Leading number with optional sign, comma thousands separators and fraction.
static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([-+−]?\d[\d,]*(?:\.\d+)?)").expect("valid regex"));

/// Extract the leading numeric token of a free-text reference value.
///
/// `"8,848 m (29,029 ft)"` gives `8848.0`, `"12,345,678"` gives `12345678.0`.
/// Trailing unit text is ignored.
pub fn parse_reference_value(raw: &str) -> std::result::Result<f64, ValueParseError> {
    let err = || ValueParseError {
        raw: raw.to_string(),
    };
    let token = LEADING_NUMBER
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .ok_or_else(err)?;
    let digits: String = token
        .as_str()
        .chars()
        .filter(|c| *c != ',')
        .map(|c| if c == '−' { '-' } else { c })
        .collect();
    digits.parse::<f64>().map_err(|_| err())
}

/// Which columns of a reference table hold the country name and raw value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSource {
    pub country_column: String,
    pub value_column: String,
}

impl ReferenceSource {
    pub fn altitude() -> Self {
        ReferenceSource {
            country_column: "Country".to_string(),
            value_column: "Elevation".to_string(),
        }
    }

    pub fn population() -> Self {
        ReferenceSource {
            country_column: "Country".to_string(),
            value_column: "Population".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    LastWins,
    Reject,
}

/// Normalized country name → attribute value for one attribute type.
#[derive(Debug, Clone)]
pub struct ResolvedLookup {
    attribute: Attribute,
    entries: HashMap<String, f64>,
    normalizer: Arc<dyn NameNormalizer + Send + Sync>,
    invalid_values: usize,
}

impl ResolvedLookup {
    pub fn attribute(&self) -> Attribute {
        self.attribute
    }

    /// Resolve an observation location through the same policy the lookup was
    /// keyed with.
    pub fn get(&self, location: &str) -> Option<f64> {
        self.entries.get(&self.normalizer.normalize(location)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reference rows excluded because their value could not be parsed.
    pub fn invalid_values(&self) -> usize {
        self.invalid_values
    }
}

#[derive(Debug, Clone)]
pub struct LookupOptions {
    pub normalizer: Arc<dyn NameNormalizer + Send + Sync>,
    pub duplicates: DuplicatePolicy,
}

impl Default for LookupOptions {
    fn default() -> Self {
        LookupOptions {
            normalizer: Arc::new(ExactNames),
            duplicates: DuplicatePolicy::default(),
        }
    }
}

pub fn build_lookup(
    table: &RawTable,
    attribute: Attribute,
    source: &ReferenceSource,
    options: &LookupOptions,
) -> Result<ResolvedLookup> {
    let missing_column = |column: &str| PipelineError::ReferenceLoad {
        attribute,
        reason: format!(
            "missing column {column:?} (found: {:?})",
            table.headers()
        ),
    };
    let country_idx = table
        .column_index(&source.country_column)
        .ok_or_else(|| missing_column(&source.country_column))?;
    let value_idx = table
        .column_index(&source.value_column)
        .ok_or_else(|| missing_column(&source.value_column))?;

    let mut entries = HashMap::new();
    let mut invalid_values = 0usize;

    for row in table.rows() {
        let Some(country) = cell(row, country_idx) else {
            invalid_values += 1;
            continue;
        };
        let parsed = cell(row, value_idx)
            .ok_or_else(|| ValueParseError { raw: String::new() })
            .and_then(parse_reference_value);
        let value = match parsed {
            Ok(value) => value,
            Err(err) => {
                debug!(%attribute, country, %err, "skipping reference value");
                invalid_values += 1;
                continue;
            }
        };

        let key = options.normalizer.normalize(country);
        if let Some(previous) = entries.insert(key, value) {
            match options.duplicates {
                DuplicatePolicy::LastWins => {
                    warn!(%attribute, country, previous, value, "duplicate reference entry, keeping last");
                }
                DuplicatePolicy::Reject => {
                    return Err(PipelineError::ReferenceLoad {
                        attribute,
                        reason: format!("duplicate entry for {country:?}"),
                    });
                }
            }
        }
    }

    info!(
        %attribute,
        entries = entries.len(),
        invalid = invalid_values,
        "built reference lookup"
    );

    Ok(ResolvedLookup {
        attribute,
        entries,
        normalizer: Arc::clone(&options.normalizer),
        invalid_values,
    })
}
