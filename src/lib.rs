//! geo-enrich - geographic enrichment for biographical entity records
//!
//! Given a list of authors identified by Wikidata QIDs, this crate collects
//! their location statements (work location, residence, birthplace,
//! deathplace) from the Wikidata Query Service, resolves each place to a
//! coordinate - directly, or by walking the administrative "part of"
//! hierarchy when no direct coordinate exists - and classifies the geo-data
//! quality of every record.
//!
//! ## Pipeline
//! authors.json -> batched WDQS queries (snapshotted per batch) ->
//! parent-fallback coordinate resolution -> keyed geo records + summary
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use geo_enrich::wdqs::WdqsClient;
//! use geo_enrich::{EnrichConfig, FsSnapshotStore, GeoEnrichmentService};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = EnrichConfig::default();
//! let client = WdqsClient::from_config(&config)?;
//! let snapshots = FsSnapshotStore::new(config.cache_dir.clone())?;
//! let service = GeoEnrichmentService::new(client, Box::new(snapshots), config);
//! let records = service.run(&[]).await?;
//! assert!(records.is_empty());
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Runtime configuration
pub mod config;

// Wikidata Query Service client, query builders, response model
pub mod wdqs;

// Domain model, caches, resolver, builder, orchestration
pub mod geo;

// Per-batch response snapshots for resumable runs
pub mod snapshot;

// Public re-exports
pub use config::EnrichConfig;
pub use error::{EnrichError, EnrichResult, WdqsError, WdqsResult};
pub use geo::enrichment::{GeoEnrichmentService, StatusSummary};
pub use geo::types::{Coord, Entity, GeoStatus, LocationStatement, PersonGeoRecord};
pub use snapshot::{FsSnapshotStore, SnapshotStore};
