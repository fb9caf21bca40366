#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line inspector for an epidemiological corpus.
//!
//! Loads a corpus directory through the same loader and query API the
//! visualization front end uses, then prints summaries, per-year rankings,
//! regional and country series, and timeline entries to the terminal.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use epi_map_corpus_models::region::{AGGREGATE_CODES, Region};
use epi_map_loader::DataStore;
use epi_map_query::Queries;

#[derive(Parser)]
#[command(name = "epi_map", about = "Epidemiological corpus inspector")]
struct Cli {
    /// Corpus directory (datasets resolve via its `data/` subdirectory,
    /// then the directory itself).
    #[arg(long, default_value = ".")]
    corpus: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every static dataset and print table sizes
    Summary,
    /// Top countries by cases for a year
    Year {
        /// Year to inspect
        year: i32,
        /// How many countries to list
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Cases and immunization series for a region (e.g. "Africa", "World")
    Region {
        /// Region name
        name: String,
    },
    /// Cases and immunization series for a country code
    Country {
        /// Country code (e.g. USA)
        code: String,
    },
    /// Narrative timeline entry for a year
    Timeline {
        /// Year to look up
        year: i32,
    },
    /// Country with the most cases in a year
    Highest {
        /// Year to inspect
        year: i32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let store = Arc::new(DataStore::new(&cli.corpus));
    store.load_static().await?;
    log::info!("Static data loaded from {}", cli.corpus);
    let queries = Queries::new(store);

    match cli.command {
        Commands::Summary => summary(&queries).await,
        Commands::Year { year, top } => year_ranking(&queries, year, top).await?,
        Commands::Region { name } => {
            let series = queries.region_series(&name).await;
            if series.is_empty() {
                let known: Vec<String> = Region::ALL.iter().map(ToString::to_string).collect();
                println!("{name}: no data (known regions: {})", known.join(", "));
            } else {
                print_series(&name, &series);
            }
        }
        Commands::Country { code } => {
            let name = queries.country_name(&code).await;
            print_series(&name, &queries.country_series(&code).await);
        }
        Commands::Timeline { year } => {
            let entry = queries.timeline_entry(year).await;
            println!("{year} [{}] {}", entry.category, entry.headline);
            println!("  {}", entry.subtext);
        }
        Commands::Highest { year } => {
            match queries.highest_country_or_region(year, AGGREGATE_CODES).await {
                Some(highest) => {
                    println!("{year}: {} ({}) with {} cases", highest.name, highest.code,
                        highest.cases);
                }
                None => println!("{year}: no data"),
            }
        }
    }

    Ok(())
}

/// Prints the sizes of every loaded static table.
async fn summary(queries: &Queries) {
    let store = queries.store();
    let Some(tables) = store.statics().await else {
        println!("Static data not loaded");
        return;
    };

    println!("Corpus summary");
    println!("  bins:           {}", tables.bins.len());
    println!("  countries:      {}", tables.countries.len());
    println!("  centroids:      {}", tables.centroids.len());
    println!("  global totals:  {}", tables.global_totals.len());
    println!("  regional rows:  {}", tables.regional.len());
    println!(
        "  case counts:    {} years",
        tables.case_counts.len()
    );
    println!(
        "  vaccination:    {} years",
        tables.vaccination.len()
    );
    println!("  timeline:       {}", tables.timeline.len());
}

/// Prints the top `top` countries by actual cases for `year`.
async fn year_ranking(
    queries: &Queries,
    year: i32,
    top: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = queries.store().year(year).await?;

    let mut rows = Vec::new();
    for record in table.records.values() {
        if AGGREGATE_CODES.contains(&record.code.as_str()) {
            continue;
        }
        let cases = queries.actual_cases(&record.code, year).await;
        rows.push((cases, record.code.clone(), record.entity.clone()));
    }
    rows.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    println!(
        "Year {year}: {} countries, {} total cases",
        rows.len(),
        queries.global_cases(year).await
    );
    for (cases, code, entity) in rows.into_iter().take(top) {
        println!("  {cases:>8}  {code:<8} {entity}");
    }

    Ok(())
}

/// Prints a totals-shaped series as one line per year.
fn print_series(label: &str, series: &[epi_map_corpus_models::GlobalTotals]) {
    if series.is_empty() {
        println!("{label}: no data");
        return;
    }

    println!("{label}");
    for totals in series {
        println!(
            "  {}  {:>10.0} cases  {:>5.1}% immunized",
            totals.year, totals.estimated_cases, totals.immunization_rate_pct
        );
    }
}
