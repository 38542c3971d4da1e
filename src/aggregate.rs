use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::models::{
    cases_per_100k, AggregatedRecord, Attribute, EnrichedObservation, Observation, ALL_VARIANTS,
};
use crate::names::{ExactNames, NameNormalizer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantGrouping {
    #[default]
    PerVariant,
    /// Every label folded into [`ALL_VARIANTS`].
    Merged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeGrouping {
    #[default]
    Collapsed,
    /// One row per date, for animation frames.
    PerDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateOptions {
    pub variants: VariantGrouping,
    pub time: TimeGrouping,
}

impl AggregateOptions {
    pub fn group_by_variant(group_by_variant: bool) -> Self {
        AggregateOptions {
            variants: if group_by_variant {
                VariantGrouping::PerVariant
            } else {
                VariantGrouping::Merged
            },
            time: TimeGrouping::Collapsed,
        }
    }
}

// Date sorts first so per-date output reads as a sequence of frames. The
// location part is the normalized name.
type GroupKey = (Option<NaiveDate>, String, String);

struct Group {
    location: String,
    num_sequences: i64,
    altitude: Option<f64>,
    population: Option<f64>,
}

fn carry(
    current: Option<f64>,
    incoming: Option<f64>,
    location: &str,
    attribute: Attribute,
) -> Result<Option<f64>> {
    match (current, incoming) {
        (Some(first), Some(second)) if first != second => Err(PipelineError::InconsistentAttribute {
            location: location.to_string(),
            attribute,
            first,
            second,
        }),
        (Some(first), _) => Ok(Some(first)),
        (None, incoming) => Ok(incoming),
    }
}

/// Sum `num_sequences` per group and recompute incidence from the summed count.
///
/// Attributes must be constant within a location; a conflict is an error
/// rather than an arbitrary pick.
pub fn aggregate(
    table: &[EnrichedObservation],
    options: &AggregateOptions,
) -> Result<Vec<AggregatedRecord>> {
    aggregate_by(table, options, &ExactNames)
}

/// Like [`aggregate`], but locations that normalize to the same name share a
/// group. The record keeps the first spelling seen.
pub fn aggregate_by(
    table: &[EnrichedObservation],
    options: &AggregateOptions,
    names: &dyn NameNormalizer,
) -> Result<Vec<AggregatedRecord>> {
    let mut groups: BTreeMap<GroupKey, Group> = BTreeMap::new();

    for row in table {
        let variant = match options.variants {
            VariantGrouping::PerVariant => row.variant.clone(),
            VariantGrouping::Merged => ALL_VARIANTS.to_string(),
        };
        let date = match options.time {
            TimeGrouping::Collapsed => None,
            TimeGrouping::PerDate => Some(row.date),
        };

        let group = groups
            .entry((date, names.normalize(&row.location), variant))
            .or_insert_with(|| Group {
                location: row.location.clone(),
                num_sequences: 0,
                altitude: None,
                population: None,
            });
        group.num_sequences += row.num_sequences;
        group.altitude = carry(group.altitude, row.altitude, &group.location, Attribute::Altitude)?;
        group.population = carry(
            group.population,
            row.population,
            &group.location,
            Attribute::Population,
        )?;
    }

    let records: Vec<AggregatedRecord> = groups
        .into_iter()
        .map(|((date, _, variant), group)| AggregatedRecord {
            location: group.location,
            variant,
            date,
            num_sequences: group.num_sequences,
            altitude: group.altitude,
            population: group.population,
            cases_per_100k: group
                .population
                .and_then(|population| cases_per_100k(group.num_sequences, population)),
        })
        .collect();

    info!(
        input = table.len(),
        groups = records.len(),
        ?options,
        "aggregated observations"
    );
    Ok(records)
}

pub fn filter_variant(table: &[Observation], variant: &str) -> Vec<Observation> {
    table
        .iter()
        .filter(|row| row.variant == variant)
        .cloned()
        .collect()
}

/// Summed `num_sequences` per variant label.
pub fn variant_totals<'a, I>(rows: I) -> BTreeMap<String, i64>
where
    I: IntoIterator<Item = (&'a str, i64)>,
{
    let mut totals = BTreeMap::new();
    for (variant, count) in rows {
        *totals.entry(variant.to_string()).or_insert(0) += count;
    }
    totals
}
