//! Batch orchestration for the enrichment pipeline.
//!
//! Drives the full run: partitions entities into batches, loads or fetches
//! each batch's raw response (snapshotting before consumption, so an
//! interrupted run resumes without re-querying), hands unresolved places to
//! the parent-fallback resolver, and finalizes per-entity records.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::builder::{build_statement, finalize_record, REASON_NO_LOCATIONS_YET};
use super::cache::{CoordCache, ParentCache};
use super::resolver::ParentFallbackResolver;
use super::types::{Entity, GeoStatus, PersonGeoRecord};
use crate::config::EnrichConfig;
use crate::snapshot::SnapshotStore;
use crate::wdqs::query::people_locations_query;
use crate::wdqs::types::{LocationRow, SparqlResults};
use crate::wdqs::WdqsClient;

pub struct GeoEnrichmentService {
    client: WdqsClient,
    snapshots: Box<dyn SnapshotStore>,
    config: EnrichConfig,
}

impl GeoEnrichmentService {
    pub fn new(client: WdqsClient, snapshots: Box<dyn SnapshotStore>, config: EnrichConfig) -> Self {
        Self {
            client,
            snapshots,
            config,
        }
    }

    /// Run the full pipeline over the input entities.
    ///
    /// Every input entity yields exactly one output record, keyed by id,
    /// even when nothing could be resolved for it. Batches are processed in
    /// input order; that order fixes cache population and therefore which
    /// parent is "first found" during fallback resolution.
    pub async fn run(&self, entities: &[Entity]) -> Result<BTreeMap<String, PersonGeoRecord>> {
        let mut records: BTreeMap<String, PersonGeoRecord> = BTreeMap::new();
        let mut qids: Vec<String> = Vec::new();
        for entity in entities {
            if entity.id.trim().is_empty() {
                continue;
            }
            qids.push(entity.id.clone());
            records.insert(entity.id.clone(), seed_record(entity));
        }

        let mut coord_cache = CoordCache::new();
        let mut parent_cache = ParentCache::new();

        let batches: Vec<&[String]> = qids.chunks(self.config.entity_batch_size.max(1)).collect();
        let total = batches.len();
        for (index, batch) in batches.into_iter().enumerate() {
            self.process_batch(index, total, batch, &mut records, &mut coord_cache, &mut parent_cache)
                .await
                .with_context(|| format!("batch {index} failed"))?;
        }

        info!("finalizing geo statuses");
        for record in records.values_mut() {
            finalize_record(record);
        }

        Ok(records)
    }

    async fn process_batch(
        &self,
        index: usize,
        total: usize,
        batch: &[String],
        records: &mut BTreeMap<String, PersonGeoRecord>,
        coords: &mut CoordCache,
        parents: &mut ParentCache,
    ) -> Result<()> {
        let results = match self.snapshots.load(index).context("loading batch snapshot")? {
            Some(cached) => {
                info!(batch = index, "loading cached batch");
                cached
            }
            None => match people_locations_query(batch) {
                Some(sparql) => {
                    info!(batch = index, total, entities = batch.len(), "fetching batch");
                    let results = self.client.execute(&sparql).await?;
                    self.snapshots
                        .store(index, &results)
                        .context("persisting batch snapshot")?;
                    results
                }
                None => {
                    debug!(batch = index, "no valid QIDs in batch, skipping query");
                    SparqlResults::default()
                }
            },
        };

        let mut rows: Vec<LocationRow> = Vec::new();
        let mut unresolved: Vec<String> = Vec::new();
        let mut seen_unresolved: HashSet<String> = HashSet::new();
        let mut skipped = 0usize;

        for binding in &results.results.bindings {
            match LocationRow::from_binding(binding) {
                Some(row) => {
                    match row.coord {
                        Some(coord) => coords.insert(row.place_qid.clone(), coord),
                        None => {
                            if seen_unresolved.insert(row.place_qid.clone()) {
                                unresolved.push(row.place_qid.clone());
                            }
                        }
                    }
                    rows.push(row);
                }
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!(batch = index, skipped, "dropped malformed rows");
        }

        if !unresolved.is_empty() {
            info!(
                batch = index,
                places = unresolved.len(),
                "resolving places without direct coordinates"
            );
        }
        let resolved = ParentFallbackResolver::new(
            &self.client,
            coords,
            parents,
            self.config.max_parent_hops,
            self.config.place_batch_size,
        )
        .resolve(&unresolved)
        .await?;

        for row in &rows {
            if let Some(record) = records.get_mut(&row.person_qid) {
                record.locations.push(build_statement(row, &resolved));
            }
        }

        Ok(())
    }
}

fn seed_record(entity: &Entity) -> PersonGeoRecord {
    PersonGeoRecord {
        id: entity.id.clone(),
        name: entity.name.clone(),
        external_reference_url: entity.external_reference_url.clone(),
        active_range: entity.active_range.clone(),
        geo_status: GeoStatus::MissingWikidataLocation,
        needs_manual_lookup: true,
        locations: Vec::new(),
        unknown_reason: Some(REASON_NO_LOCATIONS_YET.to_string()),
    }
}

/// Per-status record counts for the operator summary.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatusSummary {
    pub ok: usize,
    pub needs_review: usize,
    pub missing_coordinates: usize,
    pub missing_wikidata_location: usize,
}

impl StatusSummary {
    pub fn of<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a PersonGeoRecord>,
    {
        let mut summary = Self::default();
        for record in records {
            match record.geo_status {
                GeoStatus::Ok => summary.ok += 1,
                GeoStatus::NeedsReview => summary.needs_review += 1,
                GeoStatus::MissingCoordinates => summary.missing_coordinates += 1,
                GeoStatus::MissingWikidataLocation => summary.missing_wikidata_location += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.ok + self.needs_review + self.missing_coordinates + self.missing_wikidata_location
    }
}

impl fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ok={} needs_review={} missing_coordinates={} missing_wikidata_location={}",
            self.ok, self.needs_review, self.missing_coordinates, self.missing_wikidata_location
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::types::ActiveRange;

    fn record_with_status(id: &str, status: GeoStatus) -> PersonGeoRecord {
        PersonGeoRecord {
            id: id.to_string(),
            name: id.to_string(),
            external_reference_url: None,
            active_range: ActiveRange::default(),
            geo_status: status,
            needs_manual_lookup: false,
            locations: Vec::new(),
            unknown_reason: None,
        }
    }

    #[test]
    fn test_summary_counts_by_status() {
        let records = vec![
            record_with_status("Q1", GeoStatus::Ok),
            record_with_status("Q2", GeoStatus::Ok),
            record_with_status("Q3", GeoStatus::NeedsReview),
            record_with_status("Q4", GeoStatus::MissingWikidataLocation),
        ];
        let summary = StatusSummary::of(records.iter());
        assert_eq!(summary.ok, 2);
        assert_eq!(summary.needs_review, 1);
        assert_eq!(summary.missing_coordinates, 0);
        assert_eq!(summary.missing_wikidata_location, 1);
        assert_eq!(summary.total(), 4);
    }

    #[test]
    fn test_seed_record_starts_unresolved() {
        let entity = Entity {
            id: "Q859".to_string(),
            name: "Plato".to_string(),
            external_reference_url: None,
            active_range: ActiveRange {
                start: Some(-428),
                end: Some(-348),
            },
        };
        let record = seed_record(&entity);
        assert_eq!(record.geo_status, GeoStatus::MissingWikidataLocation);
        assert!(record.needs_manual_lookup);
        assert!(record.locations.is_empty());
        assert_eq!(record.unknown_reason.as_deref(), Some(REASON_NO_LOCATIONS_YET));
    }
}
