//! Region lookup CLI.
//!
//! Matches points to region boundaries and expands a city filter to every
//! place in the same region.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use geobound::catalog::{load_places, places_in_city};
use geobound::config::Config;
use geobound::models::{MatchResult, Place};
use geobound::GeoService;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "locate")]
#[command(about = "Match places to region boundaries")]
struct Args {
    /// Region boundary CSV (overrides the config file)
    #[arg(short, long, global = true)]
    boundaries: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Scan the catalog on a single thread
    #[arg(long, global = true)]
    sequential: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find the region containing (or nearest to) a point
    Match {
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
    },

    /// Expand one or more cities to every place in the same region
    Expand {
        /// Place catalog CSV
        #[arg(short, long)]
        places: PathBuf,

        /// Target city (repeatable)
        #[arg(long, required = true)]
        city: Vec<String>,
    },

    /// List loaded regions
    Regions,
}

#[derive(Serialize)]
struct ExpandOutput<'a> {
    city: &'a str,
    success: bool,
    seed_regions: Vec<String>,
    count: usize,
    places: Vec<Place>,
}

#[derive(Serialize)]
struct RegionSummary<'a> {
    name: &'a str,
    vertices: usize,
    degenerate: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays valid JSON
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(path) = &args.boundaries {
        config.boundaries.path = Some(path.clone());
    }
    if args.sequential {
        config.matching.parallel = false;
    }

    let service = GeoService::from_config(&config);

    match args.command {
        Command::Match { lon, lat } => {
            let result = service
                .locate(lon, lat)
                .context("Region boundaries are not available")?;
            info!("({}, {}) is {}", lon, lat, describe(&result));
            print_json(&result)?;
        }
        Command::Expand { places, city } => {
            let catalog = load_places(&places)
                .with_context(|| format!("Failed to load places from {}", places.display()))?;
            let outputs = expand_cities(&service, catalog, &city);
            print_json(&outputs)?;
        }
        Command::Regions => {
            let collection = service
                .boundaries()
                .context("Region boundaries are not available")?;
            let summaries: Vec<RegionSummary> = collection
                .iter()
                .map(|r| RegionSummary {
                    name: &r.name,
                    vertices: r.vertices().len(),
                    degenerate: r.is_degenerate(),
                })
                .collect();
            print_json(&summaries)?;
        }
    }

    Ok(())
}

/// Expand each city; several cities share one precomputed region index
fn expand_cities<'a>(
    service: &GeoService,
    catalog: Vec<Place>,
    cities: &'a [String],
) -> Vec<ExpandOutput<'a>> {
    let seeds_for = |catalog: &[Place], city: &str| -> Vec<Place> {
        places_in_city(catalog, city).into_iter().cloned().collect()
    };

    if cities.len() > 1 {
        let indexed = service
            .matcher()
            .zip(service.index_catalog(catalog.clone()));
        if let Some((matcher, index)) = indexed {
            return cities
                .iter()
                .map(|city| {
                    let seeds = seeds_for(index.catalog(), city);
                    let result = if seeds.is_empty() {
                        None
                    } else {
                        Some(index.expand(matcher, &seeds))
                    };
                    to_output(city, seeds, result)
                })
                .collect();
        }
    }

    let expander = service.expander();
    cities
        .iter()
        .map(|city| {
            let seeds = seeds_for(&catalog, city);
            let result = if seeds.is_empty() {
                None
            } else {
                Some(expander.expand(&seeds, &catalog))
            };
            to_output(city, seeds, result)
        })
        .collect()
}

fn to_output(
    city: &str,
    seeds: Vec<Place>,
    result: Option<geobound::ExpansionResult>,
) -> ExpandOutput<'_> {
    match result {
        Some(result) => {
            info!(
                "{}: {} places (success: {})",
                city,
                result.len(),
                result.success
            );
            ExpandOutput {
                city,
                success: result.success,
                seed_regions: result.seed_regions,
                count: result.places.len(),
                places: result.places,
            }
        }
        None => {
            info!("{}: no places with this city name", city);
            ExpandOutput {
                city,
                success: false,
                seed_regions: Vec::new(),
                count: seeds.len(),
                places: seeds,
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn describe(result: &MatchResult) -> String {
    match result {
        MatchResult::ContainedBy { regions } => format!("inside {}", regions.join(", ")),
        MatchResult::NearestTo { region, distance } => {
            format!("nearest to {} ({:.0} m)", region, distance)
        }
    }
}
