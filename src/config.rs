use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregateOptions, TimeGrouping, VariantGrouping};
use crate::enrich::SizeMetric;
use crate::error::Result;
use crate::names::NameMatching;
use crate::reference::{DuplicatePolicy, LookupOptions, ReferenceSource};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub altitude: ReferenceSource,
    pub population: ReferenceSource,
    pub names: NameMatching,
    pub duplicates: DuplicatePolicy,
    pub variants: VariantGrouping,
    pub time: TimeGrouping,
    pub size_metric: SizeMetric,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            altitude: ReferenceSource::altitude(),
            population: ReferenceSource::population(),
            names: NameMatching::default(),
            duplicates: DuplicatePolicy::default(),
            variants: VariantGrouping::default(),
            time: TimeGrouping::default(),
            size_metric: SizeMetric::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        PipelineConfig::from_toml(&contents)
    }

    pub fn lookup_options(&self) -> LookupOptions {
        LookupOptions {
            normalizer: self.names.normalizer(),
            duplicates: self.duplicates,
        }
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            variants: self.variants,
            time: self.time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::names::MatchPolicy;

    #[test]
    fn empty_file_gives_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.altitude.value_column, "Elevation");
        assert_eq!(config.population.value_column, "Population");
    }

    #[test]
    fn overrides_are_applied() {
        let config = PipelineConfig::from_toml(
            r#"
            duplicates = "reject"
            variants = "merged"
            time = "per_date"
            size_metric = "percent"

            [population]
            country_column = "Country (or dependency)"
            value_column = "Population (2020)"

            [names]
            policy = "canonical"
            aliases = { "Holland" = "Netherlands" }
            "#,
        )
        .unwrap();

        assert_eq!(config.duplicates, DuplicatePolicy::Reject);
        assert_eq!(config.variants, VariantGrouping::Merged);
        assert_eq!(config.time, TimeGrouping::PerDate);
        assert_eq!(config.size_metric, SizeMetric::Percent);
        assert_eq!(config.population.country_column, "Country (or dependency)");
        assert_eq!(config.altitude, ReferenceSource::altitude());
        assert_eq!(config.names.policy, MatchPolicy::Canonical);
        assert_eq!(config.names.aliases["Holland"], "Netherlands");
    }

    #[test]
    fn unknown_enum_value_is_a_config_error() {
        let err = PipelineConfig::from_toml("variants = \"sometimes\"").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
