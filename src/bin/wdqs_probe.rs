//! WDQS connectivity probe
//!
//! Runs the people-locations query for a capped sample of authors, then a
//! coordinate lookup for the places the first query left unresolved.
//! Useful for checking endpoint reachability, headers, and query health
//! before committing to a long enrichment run.
//!
//! Usage:
//!   cargo run --bin wdqs_probe -- --authors public/data/authors.json

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use url::Url;

use geo_enrich::geo::types::{AuthorRow, Entity};
use geo_enrich::wdqs::query::{people_locations_query, place_coords_query};
use geo_enrich::wdqs::types::LocationRow;
use geo_enrich::wdqs::WdqsClient;
use geo_enrich::EnrichConfig;

#[derive(Parser, Debug)]
#[command(name = "wdqs_probe")]
#[command(about = "Probe the WDQS endpoint with the pipeline's query shapes")]
struct Args {
    /// Path to authors.json
    #[arg(long)]
    authors: PathBuf,

    /// Sample size
    #[arg(long, default_value_t = 100)]
    limit: usize,

    /// SPARQL endpoint
    #[arg(long, default_value = geo_enrich::config::DEFAULT_ENDPOINT)]
    endpoint: Url,

    /// User-Agent header
    #[arg(long, env = "WDQS_USER_AGENT", default_value = geo_enrich::config::DEFAULT_USER_AGENT)]
    user_agent: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = EnrichConfig {
        endpoint: args.endpoint.clone(),
        user_agent: args.user_agent.clone(),
        ..EnrichConfig::default()
    };
    let client = WdqsClient::from_config(&config).context("failed to build WDQS client")?;

    let text = fs::read_to_string(&args.authors)
        .with_context(|| format!("failed to read {}", args.authors.display()))?;
    let rows: Vec<AuthorRow> = serde_json::from_str(&text).context("invalid authors document")?;
    let qids: Vec<String> = Entity::from_author_rows(rows)
        .into_iter()
        .map(|e| e.id)
        .take(args.limit)
        .collect();

    println!("Testing with {} authors...", qids.len());

    println!("\n1. People locations query (POST)...");
    let sparql =
        people_locations_query(&qids).context("sample contains no valid QIDs")?;
    println!("   Query length: {}", sparql.len());
    let results = client.execute(&sparql).await?;
    println!("   Results: {}", results.results.bindings.len());

    let mut unresolved: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for row in results
        .results
        .bindings
        .iter()
        .filter_map(LocationRow::from_binding)
    {
        if row.coord.is_none() && seen.insert(row.place_qid.clone()) {
            unresolved.push(row.place_qid);
        }
    }
    println!("   Places without direct coords: {}", unresolved.len());

    if !unresolved.is_empty() {
        unresolved.truncate(50);
        println!("\n2. Place coordinate query (POST)...");
        let sparql = place_coords_query(&unresolved).context("no valid place QIDs")?;
        println!("   Query length: {}", sparql.len());
        let results = client.execute(&sparql).await?;
        println!("   Results: {}", results.results.bindings.len());
    }

    println!("\nDone.");
    Ok(())
}
