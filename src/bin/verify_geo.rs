//! Output verification tool
//!
//! Prints totals, the status distribution, and location samples for named
//! authors from a finished enrichment output document.
//!
//! Usage:
//!   cargo run --bin verify_geo -- --geo public/data/authors_geo.json \
//!     --name Galen --name Plato --name Homer

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use geo_enrich::{PersonGeoRecord, StatusSummary};

#[derive(Parser, Debug)]
#[command(name = "verify_geo")]
#[command(about = "Inspect a finished geo enrichment output document")]
struct Args {
    /// Path to the enrichment output (object keyed by QID)
    #[arg(long, default_value = "public/data/authors_geo.json")]
    geo: PathBuf,

    /// Author names to sample (substring match, case-insensitive)
    #[arg(long, short = 'n')]
    name: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let text = fs::read_to_string(&args.geo)
        .with_context(|| format!("failed to read {}", args.geo.display()))?;
    let records: BTreeMap<String, PersonGeoRecord> =
        serde_json::from_str(&text).context("output document is not valid")?;

    println!("Total authors: {}", records.len());
    println!("Status distribution: {}", StatusSummary::of(records.values()));

    for needle in &args.name {
        let lower = needle.to_lowercase();
        match records
            .iter()
            .find(|(_, r)| r.name.to_lowercase().contains(&lower))
        {
            Some((qid, record)) => {
                println!("\n{} ({}):", record.name, qid);
                println!("  geo_status: {}", record.geo_status);
                println!("  locations: {}", record.locations.len());
                for loc in record.locations.iter().take(3) {
                    println!(
                        "    - {}: {} (coord: {})",
                        loc.source_relation.property(),
                        loc.place_label,
                        loc.coord.is_some()
                    );
                }
            }
            None => println!("\nNo author matching '{needle}'"),
        }
    }

    Ok(())
}
