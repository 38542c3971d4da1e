use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::models::Observation;
use crate::table::{cell, RawTable};

pub const LOCATION: &str = "location";
pub const VARIANT: &str = "variant";
pub const DATE: &str = "date";
pub const NUM_SEQUENCES: &str = "num_sequences";
pub const PERC_SEQUENCES: &str = "perc_sequences";

pub const RECOGNIZED_COLUMNS: [&str; 5] = [LOCATION, NUM_SEQUENCES, VARIANT, DATE, PERC_SEQUENCES];

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cleaned {
    pub rows: Vec<Observation>,
    pub missing_field: usize,
    pub perc_above_hundred: usize,
}

struct Columns {
    location: usize,
    variant: usize,
    date: usize,
    num_sequences: usize,
    perc_sequences: usize,
}

impl Columns {
    fn resolve(table: &RawTable) -> Result<Self> {
        let positions: Vec<Option<usize>> = RECOGNIZED_COLUMNS
            .iter()
            .map(|name| table.column_index(name))
            .collect();

        if positions.iter().all(Option::is_none) {
            return Err(PipelineError::NoRecognizedColumns {
                found: table.headers().to_vec(),
            });
        }

        let missing: Vec<String> = RECOGNIZED_COLUMNS
            .iter()
            .zip(&positions)
            .filter(|(_, pos)| pos.is_none())
            .map(|(name, _)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::MissingColumns { missing });
        }

        let at = |name: &str| table.column_index(name).unwrap_or_default();
        Ok(Columns {
            location: at(LOCATION),
            variant: at(VARIANT),
            date: at(DATE),
            num_sequences: at(NUM_SEQUENCES),
            perc_sequences: at(PERC_SEQUENCES),
        })
    }

    fn parse(&self, row: &[Option<String>]) -> Option<Observation> {
        let location = cell(row, self.location)?;
        let variant = cell(row, self.variant)?;
        let date = NaiveDate::parse_from_str(cell(row, self.date)?, DATE_FORMAT).ok()?;
        let num_sequences = parse_count(cell(row, self.num_sequences)?)?;
        let perc_sequences: f64 = cell(row, self.perc_sequences)?.parse().ok()?;
        if perc_sequences.is_nan() {
            return None;
        }

        Some(Observation {
            location: location.to_string(),
            variant: variant.to_string(),
            date,
            num_sequences,
            perc_sequences: perc_sequences.max(0.0),
        })
    }
}

/// Counts sometimes arrive as floats ("12.0"); anything fractional is rejected.
fn parse_count(raw: &str) -> Option<i64> {
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    let value: f64 = raw.parse().ok()?;
    if value.is_finite() && value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}

pub fn clean(table: &RawTable) -> Result<Cleaned> {
    let columns = Columns::resolve(table)?;
    let mut cleaned = Cleaned::default();

    for (index, row) in table.rows().enumerate() {
        match columns.parse(row) {
            Some(obs) => {
                if obs.perc_sequences > 100.0 {
                    cleaned.perc_above_hundred += 1;
                }
                cleaned.rows.push(obs);
            }
            None => {
                debug!(row = index, "dropping observation with missing field");
                cleaned.missing_field += 1;
            }
        }
    }

    // Stable: rows sharing a date keep their input order.
    cleaned.rows.sort_by_key(|obs| obs.date);

    if cleaned.perc_above_hundred > 0 {
        warn!(
            rows = cleaned.perc_above_hundred,
            "perc_sequences above 100 kept as reported"
        );
    }
    info!(
        input = table.len(),
        kept = cleaned.rows.len(),
        dropped = cleaned.missing_field,
        "cleaned observations"
    );

    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(data: &str) -> RawTable {
        RawTable::from_reader(data.as_bytes()).unwrap()
    }

    #[test]
    fn clamps_negative_percentages_only() {
        let cleaned = clean(&table(
            "location,variant,date,num_sequences,perc_sequences\n\
             Peru,Alpha,2021-01-01,10,-1.5\n\
             Peru,Beta,2021-01-01,4,120.0\n",
        ))
        .unwrap();

        assert_eq!(cleaned.rows[0].perc_sequences, 0.0);
        assert_eq!(cleaned.rows[1].perc_sequences, 120.0);
        assert_eq!(cleaned.perc_above_hundred, 1);
        assert!(cleaned.rows.iter().all(|r| r.perc_sequences >= 0.0));
    }

    #[test]
    fn drops_rows_with_missing_or_unparsable_fields() {
        let cleaned = clean(&table(
            "location,variant,date,num_sequences,perc_sequences\n\
             Peru,Alpha,2021-01-01,10,5.0\n\
             ,Alpha,2021-01-01,10,5.0\n\
             Peru,Alpha,not-a-date,10,5.0\n\
             Peru,Alpha,2021-01-01,ten,5.0\n\
             Peru,Alpha,2021-01-01,10,NaN\n\
             Peru,Alpha,2021-01-01,10\n",
        ))
        .unwrap();

        assert_eq!(cleaned.rows.len(), 1);
        assert_eq!(cleaned.missing_field, 5);
    }

    #[test]
    fn extra_columns_are_ignored() {
        let cleaned = clean(&table(
            "date,location,extra,variant,num_sequences,perc_sequences,num_sequences_total\n\
             2021-01-01,Peru,x,Alpha,10,5.0,200\n",
        ))
        .unwrap();

        assert_eq!(cleaned.rows.len(), 1);
        assert_eq!(cleaned.rows[0].location, "Peru");
        assert_eq!(cleaned.rows[0].num_sequences, 10);
    }

    #[test]
    fn sorts_by_date_and_keeps_ties_in_input_order() {
        let cleaned = clean(&table(
            "location,variant,date,num_sequences,perc_sequences\n\
             Chile,Alpha,2021-01-03,1,1.0\n\
             Peru,Beta,2021-01-01,2,1.0\n\
             Chile,Gamma,2021-01-02,3,1.0\n\
             Peru,Alpha,2021-01-01,4,1.0\n",
        ))
        .unwrap();

        let order: Vec<i64> = cleaned.rows.iter().map(|r| r.num_sequences).collect();
        assert_eq!(order, vec![2, 4, 3, 1]);
        assert!(cleaned.rows.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn negative_counts_are_kept() {
        let cleaned = clean(&table(
            "location,variant,date,num_sequences,perc_sequences\n\
             Peru,Alpha,2021-01-02,-3,-1.0\n\
             Peru,Alpha,2021-01-01,12.0,1.0\n",
        ))
        .unwrap();

        assert_eq!(cleaned.rows[0].num_sequences, 12);
        assert_eq!(cleaned.rows[1].num_sequences, -3);
        assert_eq!(cleaned.rows[1].perc_sequences, 0.0);
    }

    #[test]
    fn unrelated_table_is_a_schema_error() {
        let err = clean(&table("Country,Elevation\nNepal,\"2,565 m\"\n")).unwrap_err();
        assert!(matches!(err, PipelineError::NoRecognizedColumns { .. }));
        assert!(err.is_schema_error());
    }

    #[test]
    fn partial_header_names_missing_columns() {
        let err = clean(&table("location,variant,date\nPeru,Alpha,2021-01-01\n")).unwrap_err();
        match err {
            PipelineError::MissingColumns { missing } => {
                assert_eq!(missing, vec![NUM_SEQUENCES, PERC_SEQUENCES]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
