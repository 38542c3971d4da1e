use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::{cases_per_100k, Attribute, EnrichedObservation, Observation};
use crate::reference::ResolvedLookup;
use crate::summary::DropSummary;

/// Attach one attribute from `lookup`. Misses stay `None`, never zero.
pub fn attach(table: &[EnrichedObservation], lookup: &ResolvedLookup) -> Vec<EnrichedObservation> {
    let attribute = lookup.attribute();
    table
        .iter()
        .map(|row| {
            let mut row = row.clone();
            row.set_attribute(attribute, lookup.get(&row.location));
            row
        })
        .collect()
}

/// Drop rows lacking a required attribute, then derive incidence where a
/// population is attached.
pub fn finalize(
    table: &[EnrichedObservation],
    required: &[Attribute],
    summary: &mut DropSummary,
) -> Vec<EnrichedObservation> {
    let mut enriched = Vec::with_capacity(table.len());

    for row in table {
        let unmatched: Vec<Attribute> = required
            .iter()
            .copied()
            .filter(|attribute| row.attribute(*attribute).is_none())
            .collect();
        if !unmatched.is_empty() {
            summary.unmatched_location += 1;
            for attribute in unmatched {
                if summary.record_unmatched(attribute, &row.location) {
                    warn!(location = %row.location, %attribute, "no reference match, dropping rows");
                }
            }
            continue;
        }

        let mut row = row.clone();
        if let Some(population) = row.population {
            match cases_per_100k(row.num_sequences, population) {
                Some(rate) => row.cases_per_100k = Some(rate),
                None => {
                    warn!(location = %row.location, population, "unusable population, dropping row");
                    summary.invalid_population += 1;
                    continue;
                }
            }
        }
        enriched.push(row);
    }

    info!(
        input = table.len(),
        kept = enriched.len(),
        "enriched observations"
    );
    enriched
}

/// Attach every lookup and finalize. The required attributes are exactly the
/// ones a lookup was supplied for.
pub fn enrich(
    cleaned: &[Observation],
    lookups: &[&ResolvedLookup],
    summary: &mut DropSummary,
) -> Vec<EnrichedObservation> {
    let base: Vec<EnrichedObservation> = cleaned
        .iter()
        .cloned()
        .map(EnrichedObservation::from)
        .collect();
    let attached = lookups
        .iter()
        .fold(base, |table, lookup| attach(&table, lookup));
    let required: Vec<Attribute> = lookups.iter().map(|l| l.attribute()).collect();

    for lookup in lookups {
        *summary
            .invalid_reference_value
            .entry(lookup.attribute())
            .or_default() += lookup.invalid_values();
    }

    let enriched = finalize(&attached, &required, summary);
    summary.observations_enriched = enriched.len();
    enriched
}

/// Which column drives scatter-map marker sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMetric {
    #[default]
    Count,
    Percent,
}

/// Exponent applied to counts so small countries stay visible next to large ones.
pub const COUNT_SIZE_EXPONENT: f64 = 0.65;

pub fn marker_size(row: &EnrichedObservation, metric: SizeMetric) -> f64 {
    match metric {
        SizeMetric::Percent => row.perc_sequences,
        SizeMetric::Count => (row.num_sequences.max(0) as f64).powf(COUNT_SIZE_EXPONENT),
    }
}
