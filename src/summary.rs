use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::models::Attribute;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Observation lacked (or had an unparsable) required field.
    MissingField,
    /// Reference row whose value held no numeric token.
    InvalidReferenceValue,
    /// Observation location absent from a required lookup.
    UnmatchedLocation,
    /// Population of zero, negative or non-finite.
    InvalidPopulation,
}

/// What each stage excluded, so data loss is visible to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DropSummary {
    pub observations_in: usize,
    pub observations_cleaned: usize,
    pub observations_enriched: usize,
    pub missing_field: usize,
    pub invalid_reference_value: BTreeMap<Attribute, usize>,
    pub unmatched_location: usize,
    pub invalid_population: usize,
    /// Rows kept with `perc_sequences` above 100.
    pub perc_above_hundred: usize,
    pub unmatched_locations: BTreeMap<Attribute, BTreeSet<String>>,
}

impl DropSummary {
    pub fn count(&self, reason: DropReason) -> usize {
        match reason {
            DropReason::MissingField => self.missing_field,
            DropReason::InvalidReferenceValue => self.invalid_reference_value.values().sum(),
            DropReason::UnmatchedLocation => self.unmatched_location,
            DropReason::InvalidPopulation => self.invalid_population,
        }
    }

    /// Observation rows lost between input and enriched output.
    pub fn total_rows_dropped(&self) -> usize {
        self.missing_field + self.unmatched_location + self.invalid_population
    }

    pub fn record_unmatched(&mut self, attribute: Attribute, location: &str) -> bool {
        self.unmatched_locations
            .entry(attribute)
            .or_default()
            .insert(location.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_cover_row_level_drops_only() {
        let mut summary = DropSummary {
            missing_field: 2,
            unmatched_location: 3,
            invalid_population: 1,
            ..Default::default()
        };
        summary
            .invalid_reference_value
            .insert(Attribute::Altitude, 4);

        assert_eq!(summary.total_rows_dropped(), 6);
        assert_eq!(summary.count(DropReason::InvalidReferenceValue), 4);
    }

    #[test]
    fn unmatched_names_are_recorded_once() {
        let mut summary = DropSummary::default();
        assert!(summary.record_unmatched(Attribute::Population, "Atlantis"));
        assert!(!summary.record_unmatched(Attribute::Population, "Atlantis"));
        assert_eq!(summary.unmatched_locations[&Attribute::Population].len(), 1);
    }
}
