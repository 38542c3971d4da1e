use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Label every variant is folded into when variants are merged.
pub const ALL_VARIANTS: &str = "All Variants";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Altitude,
    Population,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Altitude => write!(f, "altitude"),
            Attribute::Population => write!(f, "population"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub location: String,
    pub variant: String,
    pub date: NaiveDate,
    pub num_sequences: i64,
    pub perc_sequences: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedObservation {
    pub location: String,
    pub variant: String,
    pub date: NaiveDate,
    pub num_sequences: i64,
    pub perc_sequences: f64,
    pub altitude: Option<f64>,
    pub population: Option<f64>,
    #[serde(rename = "casesPer100000")]
    pub cases_per_100k: Option<f64>,
}

impl EnrichedObservation {
    pub fn attribute(&self, attribute: Attribute) -> Option<f64> {
        match attribute {
            Attribute::Altitude => self.altitude,
            Attribute::Population => self.population,
        }
    }

    pub fn set_attribute(&mut self, attribute: Attribute, value: Option<f64>) {
        match attribute {
            Attribute::Altitude => self.altitude = value,
            Attribute::Population => self.population = value,
        }
    }
}

impl From<Observation> for EnrichedObservation {
    fn from(obs: Observation) -> Self {
        EnrichedObservation {
            location: obs.location,
            variant: obs.variant,
            date: obs.date,
            num_sequences: obs.num_sequences,
            perc_sequences: obs.perc_sequences,
            altitude: None,
            population: None,
            cases_per_100k: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecord {
    pub location: String,
    pub variant: String,
    pub date: Option<NaiveDate>,
    pub num_sequences: i64,
    pub altitude: Option<f64>,
    pub population: Option<f64>,
    #[serde(rename = "casesPer100000")]
    pub cases_per_100k: Option<f64>,
}

/// Incidence per 100,000 people. `None` when the population cannot serve as a
/// denominator.
pub fn cases_per_100k(num_sequences: i64, population: f64) -> Option<f64> {
    if !population.is_finite() || population <= 0.0 {
        return None;
    }
    Some(num_sequences as f64 / population * 100_000.0)
}
