use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::enrich::{marker_size, SizeMetric};
use crate::error::Result;
use crate::models::{AggregatedRecord, EnrichedObservation};
use crate::pipeline::PipelineOutput;

#[derive(Serialize)]
struct EnrichedRow<'a> {
    location: &'a str,
    variant: &'a str,
    date: NaiveDate,
    num_sequences: i64,
    perc_sequences: f64,
    altitude: Option<f64>,
    population: Option<f64>,
    #[serde(rename = "casesPer100000")]
    cases_per_100k: Option<f64>,
    marker_size: f64,
}

pub fn write_enriched<W: Write>(
    writer: W,
    rows: &[EnrichedObservation],
    metric: SizeMetric,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(EnrichedRow {
            location: &row.location,
            variant: &row.variant,
            date: row.date,
            num_sequences: row.num_sequences,
            perc_sequences: row.perc_sequences,
            altitude: row.altitude,
            population: row.population,
            cases_per_100k: row.cases_per_100k,
            marker_size: marker_size(row, metric),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_aggregated<W: Write>(writer: W, rows: &[AggregatedRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json(path: &Path, output: &PipelineOutput) -> Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enriched() -> EnrichedObservation {
        EnrichedObservation {
            location: "Peru".to_string(),
            variant: "Alpha".to_string(),
            date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            num_sequences: 10,
            perc_sequences: 5.0,
            altitude: None,
            population: Some(5_000_000.0),
            cases_per_100k: Some(0.2),
        }
    }

    #[test]
    fn enriched_csv_has_header_and_blank_unknowns() {
        let mut buf = Vec::new();
        write_enriched(&mut buf, &[enriched()], SizeMetric::Percent).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "location,variant,date,num_sequences,perc_sequences,altitude,population,casesPer100000,marker_size"
        );
        assert_eq!(lines.next().unwrap(), "Peru,Alpha,2021-01-01,10,5.0,,5000000.0,0.2,5.0");
    }

    #[test]
    fn aggregated_csv_leaves_collapsed_date_blank() {
        let record = AggregatedRecord {
            location: "Peru".to_string(),
            variant: "Alpha".to_string(),
            date: None,
            num_sequences: 7,
            altitude: None,
            population: Some(5_000_000.0),
            cases_per_100k: Some(0.14),
        };
        let mut buf = Vec::new();
        write_aggregated(&mut buf, &[record]).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("location,variant,date,num_sequences"));
        assert!(text.contains("Peru,Alpha,,7,,5000000.0,0.14"));
    }
}
