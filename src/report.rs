use std::fmt::Write;

use crate::aggregate::variant_totals;
use crate::models::AggregatedRecord;
use crate::pipeline::PipelineOutput;
use crate::summary::DropSummary;

pub fn highest_incidence(records: &[AggregatedRecord], limit: usize) -> Vec<&AggregatedRecord> {
    let mut ranked: Vec<&AggregatedRecord> = records
        .iter()
        .filter(|r| r.cases_per_100k.is_some())
        .collect();
    ranked.sort_by(|a, b| {
        b.cases_per_100k
            .partial_cmp(&a.cases_per_100k)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(limit);
    ranked
}

fn write_drops(output: &mut String, summary: &DropSummary) {
    let _ = writeln!(output, "## Data Loss");
    let _ = writeln!(
        output,
        "- {} observations read, {} cleaned, {} enriched",
        summary.observations_in, summary.observations_cleaned, summary.observations_enriched
    );
    let _ = writeln!(output, "- missing required field: {}", summary.missing_field);
    let _ = writeln!(output, "- unmatched country name: {}", summary.unmatched_location);
    let _ = writeln!(output, "- unusable population: {}", summary.invalid_population);
    for (attribute, count) in &summary.invalid_reference_value {
        let _ = writeln!(output, "- unparsable {} reference values: {}", attribute, count);
    }
    if summary.perc_above_hundred > 0 {
        let _ = writeln!(
            output,
            "- rows kept with perc_sequences above 100: {}",
            summary.perc_above_hundred
        );
    }

    for (attribute, names) in &summary.unmatched_locations {
        if names.is_empty() {
            continue;
        }
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let _ = writeln!(output, "- no {} for: {}", attribute, names.join(", "));
    }
}

pub fn build_report(output: &PipelineOutput) -> String {
    let totals = variant_totals(
        output
            .enriched
            .iter()
            .map(|r| (r.variant.as_str(), r.num_sequences)),
    );
    let mut report = String::new();

    let _ = writeln!(report, "# Variant Incidence Report");
    if let (Some(first), Some(last)) = (output.enriched.first(), output.enriched.last()) {
        let _ = writeln!(report, "Observations from {} to {}", first.date, last.date);
    }
    let _ = writeln!(report);
    write_drops(&mut report, &output.summary);

    let _ = writeln!(report);
    let _ = writeln!(report, "## Variant Mix");
    if totals.is_empty() {
        let _ = writeln!(report, "No observations survived enrichment.");
    } else {
        for (variant, total) in &totals {
            let _ = writeln!(report, "- {}: {} sequences", variant, total);
        }
    }

    let _ = writeln!(report);
    let _ = writeln!(report, "## Highest Incidence");
    let ranked = highest_incidence(&output.aggregated, 10);
    if ranked.is_empty() {
        let _ = writeln!(report, "No population data attached.");
    } else {
        for record in ranked {
            let _ = writeln!(
                report,
                "- {} ({}) {:.2} per 100,000 across {} sequences",
                record.location,
                record.variant,
                record.cases_per_100k.unwrap_or_default(),
                record.num_sequences
            );
        }
    }

    report
}
