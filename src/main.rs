use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use variant_incidence::aggregate::{self, TimeGrouping, VariantGrouping};
use variant_incidence::clean::clean;
use variant_incidence::config::PipelineConfig;
use variant_incidence::enrich::SizeMetric;
use variant_incidence::reference::parse_reference_value;
use variant_incidence::table::RawTable;
use variant_incidence::{export, logging, pipeline, report};

#[derive(Parser)]
#[command(name = "variant-incidence")]
#[command(about = "Per-country variant incidence from sequence counts and country reference data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean, enrich and aggregate observations, writing exports and a report
    Run {
        #[arg(long)]
        observations: PathBuf,
        /// Country altitude table (Country, Elevation)
        #[arg(long)]
        altitude: Option<PathBuf>,
        /// Country population table (Country, Population)
        #[arg(long)]
        population: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Fold all variants into a single category
        #[arg(long)]
        merge_variants: bool,
        /// Keep one aggregated row per date
        #[arg(long)]
        per_date: bool,
        /// Size map markers by perc_sequences instead of counts
        #[arg(long)]
        by_percent: bool,
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,
    },
    /// Print total sequences per variant after cleaning
    Totals {
        #[arg(long)]
        observations: PathBuf,
        #[arg(long)]
        variant: Option<String>,
    },
    /// Show the number extracted from a raw reference value
    ParseValue { raw: String },
}

fn load_table(path: &Path) -> anyhow::Result<RawTable> {
    RawTable::from_path(path).with_context(|| format!("failed to read {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    logging::init_logging("info");
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            observations,
            altitude,
            population,
            config,
            merge_variants,
            per_date,
            by_percent,
            out_dir,
        } => {
            let mut config = match config {
                Some(path) => PipelineConfig::load(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => PipelineConfig::default(),
            };
            if merge_variants {
                config.variants = VariantGrouping::Merged;
            }
            if per_date {
                config.time = TimeGrouping::PerDate;
            }
            if by_percent {
                config.size_metric = SizeMetric::Percent;
            }

            let observations = load_table(&observations)?;
            let altitude = altitude.as_deref().map(load_table).transpose()?;
            let population = population.as_deref().map(load_table).transpose()?;
            let references = pipeline::References {
                altitude: altitude.as_ref(),
                population: population.as_ref(),
            };

            let output = pipeline::run(&observations, references, &config)?;

            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("failed to create {}", out_dir.display()))?;
            export::write_enriched(
                File::create(out_dir.join("enriched.csv"))?,
                &output.enriched,
                config.size_metric,
            )?;
            export::write_aggregated(
                File::create(out_dir.join("aggregated.csv"))?,
                &output.aggregated,
            )?;
            export::write_json(&out_dir.join("output.json"), &output)?;
            std::fs::write(out_dir.join("report.md"), report::build_report(&output))?;

            info!(out_dir = %out_dir.display(), "outputs written");
            println!(
                "{} of {} observations enriched into {} groups ({} dropped). Outputs in {}.",
                output.summary.observations_enriched,
                output.summary.observations_in,
                output.aggregated.len(),
                output.summary.total_rows_dropped(),
                out_dir.display()
            );
        }
        Commands::Totals {
            observations,
            variant,
        } => {
            let cleaned = clean(&load_table(&observations)?)?;
            let rows = match variant.as_deref() {
                Some(variant) => aggregate::filter_variant(&cleaned.rows, variant),
                None => cleaned.rows,
            };
            let totals =
                aggregate::variant_totals(rows.iter().map(|r| (r.variant.as_str(), r.num_sequences)));

            if totals.is_empty() {
                println!("No observations found.");
                return Ok(());
            }
            for (variant, total) in totals {
                println!("- {variant}: {total}");
            }
        }
        Commands::ParseValue { raw } => match parse_reference_value(&raw) {
            Ok(value) => println!("{value}"),
            Err(err) => println!("unknown ({err})"),
        },
    }

    Ok(())
}
