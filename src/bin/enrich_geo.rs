//! Geographic enrichment CLI
//!
//! Reads the upstream authors document, enriches every entity with
//! location statements and coordinates from the Wikidata Query Service,
//! and writes a single keyed output document plus per-batch snapshots for
//! resumption.
//!
//! Usage:
//!   cargo run --bin enrich_geo -- \
//!     --authors public/data/authors.json \
//!     --out public/data/authors_geo.json \
//!     --cache cache
//!
//! A rerun with the same cache directory loads completed batches from disk
//! instead of re-querying; delete the cache directory to force a cold run.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use url::Url;

use geo_enrich::geo::types::{AuthorRow, Entity};
use geo_enrich::snapshot::{write_json_atomic, FsSnapshotStore};
use geo_enrich::wdqs::WdqsClient;
use geo_enrich::{EnrichConfig, GeoEnrichmentService, StatusSummary};

/// Resolve Wikidata location statements and coordinates for a list of authors
#[derive(Parser, Debug)]
#[command(name = "enrich_geo")]
#[command(about = "Enrich biographical records with Wikidata geo data")]
struct Args {
    /// Path to authors.json (array of {id, content, start, end, wikipedia_url})
    #[arg(long)]
    authors: PathBuf,

    /// Path for the output document (object keyed by QID)
    #[arg(long)]
    out: PathBuf,

    /// Cache directory for per-batch snapshots
    #[arg(long, default_value = "cache")]
    cache: PathBuf,

    /// Authors per location query
    #[arg(long, default_value_t = 200)]
    batch_size: usize,

    /// Places per coordinate/parent lookup query
    #[arg(long, default_value_t = 50)]
    place_batch_size: usize,

    /// Maximum administrative-parent hops for places without coordinates
    #[arg(long, default_value_t = 3)]
    parent_hops: u32,

    /// Seconds between WDQS calls
    #[arg(long, default_value_t = 0.2)]
    sleep: f64,

    /// Attempts per query before aborting the run
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// SPARQL endpoint
    #[arg(long, default_value = geo_enrich::config::DEFAULT_ENDPOINT)]
    endpoint: Url,

    /// User-Agent header (WDQS fair-use policy wants contact info)
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
        entity_batch_size: args.batch_size,
        place_batch_size: args.place_batch_size,
        max_parent_hops: args.parent_hops,
        call_delay: Duration::from_secs_f64(args.sleep),
        max_retries: args.max_retries,
        request_timeout: Duration::from_secs(120),
        cache_dir: args.cache.clone(),
    };

    let text = fs::read_to_string(&args.authors)
        .with_context(|| format!("failed to read {}", args.authors.display()))?;
    let rows: Vec<AuthorRow> = serde_json::from_str(&text).with_context(|| {
        format!(
            "{} must be a JSON array of author rows",
            args.authors.display()
        )
    })?;
    let entities = Entity::from_author_rows(rows);
    println!("Loaded {} authors", entities.len());

    let client = WdqsClient::from_config(&config).context("failed to build WDQS client")?;
    let snapshots = FsSnapshotStore::new(&config.cache_dir).context("failed to open snapshot store")?;
    let service = GeoEnrichmentService::new(client, Box::new(snapshots), config);

    let records = service.run(&entities).await?;

    write_json_atomic(&args.out, &records)
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    println!("\nWrote {} for {} authors.", args.out.display(), records.len());
    print_summary(&StatusSummary::of(records.values()));

    Ok(())
}

fn print_summary(summary: &StatusSummary) {
    println!("{}", "Status distribution:".bold());
    println!("  {} {}", "ok:".green(), summary.ok);
    println!("  {} {}", "needs_review:".yellow(), summary.needs_review);
    println!("  {} {}", "missing_coordinates:".red(), summary.missing_coordinates);
    println!(
        "  {} {}",
        "missing_wikidata_location:".red(),
        summary.missing_wikidata_location
    );
}
