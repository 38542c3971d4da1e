use crate::models::Attribute;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("Observation table has none of the recognized columns (found: {found:?})")]
    NoRecognizedColumns { found: Vec<String> },
    #[error("Observation table is missing required columns: {missing:?}")]
    MissingColumns { missing: Vec<String> },
    #[error("Malformed {attribute} reference: {reason}")]
    ReferenceLoad { attribute: Attribute, reason: String },
    #[error("Location {location} has conflicting {attribute} values ({first} vs {second})")]
    InconsistentAttribute {
        location: String,
        attribute: Attribute,
        first: f64,
        second: f64,
    },
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Wrapped csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Wrapped io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Wrapped json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Schema-level failures of the observation table.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            PipelineError::NoRecognizedColumns { .. } | PipelineError::MissingColumns { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// A single reference value that could not be turned into a number.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("No numeric value in {raw:?}")]
pub struct ValueParseError {
    pub raw: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_errors_are_classified() {
        let err = PipelineError::MissingColumns {
            missing: vec!["date".to_string()],
        };
        assert!(err.is_schema_error());

        let err = PipelineError::ReferenceLoad {
            attribute: Attribute::Population,
            reason: "missing column".to_string(),
        };
        assert!(!err.is_schema_error());
        assert_eq!(
            err.to_string(),
            "Malformed population reference: missing column"
        );
    }
}
