use serde::Serialize;
use tracing::info;

use crate::aggregate::{aggregate_by, AggregateOptions};
use crate::clean::clean;
use crate::config::PipelineConfig;
use crate::enrich::enrich;
use crate::error::Result;
use crate::models::{AggregatedRecord, Attribute, EnrichedObservation, Observation};
use crate::reference::{build_lookup, ResolvedLookup};
use crate::summary::DropSummary;
use crate::table::RawTable;

/// Reference tables for a run. Either may be absent for a single-attribute run.
#[derive(Debug, Clone, Copy, Default)]
pub struct References<'a> {
    pub altitude: Option<&'a RawTable>,
    pub population: Option<&'a RawTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub cleaned: Vec<Observation>,
    pub enriched: Vec<EnrichedObservation>,
    pub aggregated: Vec<AggregatedRecord>,
    pub summary: DropSummary,
}

pub fn resolve(references: References<'_>, config: &PipelineConfig) -> Result<Vec<ResolvedLookup>> {
    let options = config.lookup_options();
    let mut lookups = Vec::new();

    if let Some(table) = references.altitude {
        lookups.push(build_lookup(table, Attribute::Altitude, &config.altitude, &options)?);
    }
    if let Some(table) = references.population {
        lookups.push(build_lookup(
            table,
            Attribute::Population,
            &config.population,
            &options,
        )?);
    }
    Ok(lookups)
}

pub fn run(
    observations: &RawTable,
    references: References<'_>,
    config: &PipelineConfig,
) -> Result<PipelineOutput> {
    run_with(observations, references, config, &config.aggregate_options())
}

pub fn run_with(
    observations: &RawTable,
    references: References<'_>,
    config: &PipelineConfig,
    options: &AggregateOptions,
) -> Result<PipelineOutput> {
    let cleaned = clean(observations)?;
    let lookups = resolve(references, config)?;

    let mut summary = DropSummary {
        observations_in: observations.len(),
        observations_cleaned: cleaned.rows.len(),
        missing_field: cleaned.missing_field,
        perc_above_hundred: cleaned.perc_above_hundred,
        ..Default::default()
    };

    let lookup_refs: Vec<&ResolvedLookup> = lookups.iter().collect();
    let enriched = enrich(&cleaned.rows, &lookup_refs, &mut summary);
    let names = config.names.normalizer();
    let aggregated = aggregate_by(&enriched, options, &*names)?;

    info!(
        input = summary.observations_in,
        enriched = summary.observations_enriched,
        groups = aggregated.len(),
        dropped = summary.total_rows_dropped(),
        "pipeline complete"
    );

    Ok(PipelineOutput {
        cleaned: cleaned.rows,
        enriched,
        aggregated,
        summary,
    })
}
