//! Parent-fallback coordinate resolution.
//!
//! A place with no direct coordinate is resolved by walking its P131
//! ancestors breadth-first, up to a hop budget. Administrative hierarchies
//! are neither acyclic nor tree-shaped in practice, so the traversal keeps
//! a visited set; a place is expanded at most once per resolution.
//!
//! When a frontier place has several parents, the first one (in WDQS row
//! order) with a cached coordinate wins. WDQS does not promise an ordering
//! for those rows, so which ancestor is chosen is best-effort: reruns with
//! a warm snapshot cache are deterministic, cold runs are only as stable
//! as the endpoint's row order.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::cache::{CoordCache, ParentCache};
use super::types::{Coord, CoordSource};
use crate::error::WdqsResult;
use crate::wdqs::query::{is_valid_qid, place_coords_query, place_parents_query};
use crate::wdqs::types::{PlaceCoordRow, PlaceParentRow};
use crate::wdqs::WdqsClient;

/// Resolution verdict for one place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub coord: Option<Coord>,
    pub source: CoordSource,
    pub hops: u32,
}

impl Resolution {
    fn exact(coord: Coord) -> Self {
        Self {
            coord: Some(coord),
            source: CoordSource::Exact,
            hops: 0,
        }
    }

    fn via_parent(coord: Coord, hops: u32) -> Self {
        Self {
            coord: Some(coord),
            source: CoordSource::ViaParent,
            hops,
        }
    }

    fn missing() -> Self {
        Self {
            coord: None,
            source: CoordSource::Missing,
            hops: 0,
        }
    }
}

pub struct ParentFallbackResolver<'a> {
    client: &'a WdqsClient,
    coords: &'a mut CoordCache,
    parents: &'a mut ParentCache,
    max_hops: u32,
    place_batch_size: usize,
}

impl<'a> ParentFallbackResolver<'a> {
    pub fn new(
        client: &'a WdqsClient,
        coords: &'a mut CoordCache,
        parents: &'a mut ParentCache,
        max_hops: u32,
        place_batch_size: usize,
    ) -> Self {
        Self {
            client,
            coords,
            parents,
            max_hops,
            place_batch_size: place_batch_size.max(1),
        }
    }

    /// Resolve a batch of places to coordinates, walking parents for those
    /// without a direct one. Input order fixes cache population order, so
    /// callers must pass places in first-seen order for reproducible runs.
    pub async fn resolve(&mut self, place_qids: &[String]) -> WdqsResult<HashMap<String, Resolution>> {
        let mut out: HashMap<String, Resolution> = HashMap::new();
        if place_qids.is_empty() {
            return Ok(out);
        }

        // Direct coordinates for places not looked up yet.
        let unknown: Vec<String> = place_qids
            .iter()
            .filter(|q| !self.coords.known(q.as_str()) && is_valid_qid(q.as_str()))
            .cloned()
            .collect();
        self.fetch_coords(&unknown).await?;

        let mut need_parents: Vec<String> = Vec::new();
        for qid in place_qids {
            match self.coords.get(qid) {
                Some(coord) => {
                    out.insert(qid.clone(), Resolution::exact(coord));
                }
                None => need_parents.push(qid.clone()),
            }
        }

        if need_parents.is_empty() || self.max_hops == 0 {
            for qid in need_parents {
                out.insert(qid, Resolution::missing());
            }
            return Ok(out);
        }

        let mut best: HashMap<String, Resolution> = need_parents
            .iter()
            .map(|q| (q.clone(), Resolution::missing()))
            .collect();
        let mut frontier: Vec<String> = need_parents.clone();
        let mut visited: HashSet<String> = frontier.iter().cloned().collect();

        for hop in 1..=self.max_hops {
            let to_fetch: Vec<String> = frontier
                .iter()
                .filter(|q| !self.parents.known(q.as_str()) && is_valid_qid(q.as_str()))
                .cloned()
                .collect();
            self.fetch_parents(&to_fetch).await?;

            // Next frontier: newly discovered parents, first-seen order.
            let mut next_frontier: Vec<String> = Vec::new();
            let mut seen: HashSet<String> = HashSet::new();
            for qid in &frontier {
                for parent in self.parents.parents(qid) {
                    if !visited.contains(parent) && seen.insert(parent.clone()) {
                        next_frontier.push(parent.clone());
                    }
                }
            }
            visited.extend(next_frontier.iter().cloned());

            if next_frontier.is_empty() {
                debug!(hop, "parent frontier exhausted");
                break;
            }

            let parent_unknown: Vec<String> = next_frontier
                .iter()
                .filter(|q| !self.coords.known(q.as_str()) && is_valid_qid(q.as_str()))
                .cloned()
                .collect();
            self.fetch_coords(&parent_unknown).await?;

            // For each still-unresolved frontier place, the first parent
            // with a coordinate wins, in returned row order.
            for child in &frontier {
                if best.get(child).map_or(false, |r| r.coord.is_some()) {
                    continue;
                }
                for parent in self.parents.parents(child) {
                    if let Some(coord) = self.coords.get(parent) {
                        best.insert(child.clone(), Resolution::via_parent(coord, hop));
                        break;
                    }
                }
            }

            frontier = next_frontier;
        }

        for qid in need_parents {
            let resolution = best.remove(&qid).unwrap_or_else(Resolution::missing);
            out.insert(qid, resolution);
        }
        Ok(out)
    }

    /// Fetch and cache coordinates for the given places, in batches.
    async fn fetch_coords(&mut self, qids: &[String]) -> WdqsResult<()> {
        for batch in qids.chunks(self.place_batch_size) {
            let Some(sparql) = place_coords_query(batch) else {
                continue;
            };
            let results = self.client.execute(&sparql).await?;
            for qid in batch {
                self.coords.mark_missing(qid.clone());
            }
            for row in results
                .results
                .bindings
                .iter()
                .filter_map(PlaceCoordRow::from_binding)
            {
                if let Some(coord) = row.coord {
                    if is_valid_qid(&row.place_qid) {
                        self.coords.insert(row.place_qid, coord);
                    }
                }
            }
        }
        Ok(())
    }

    /// Fetch and cache parent links for the given places, in batches.
    async fn fetch_parents(&mut self, qids: &[String]) -> WdqsResult<()> {
        for batch in qids.chunks(self.place_batch_size) {
            let Some(sparql) = place_parents_query(batch) else {
                continue;
            };
            let results = self.client.execute(&sparql).await?;
            for qid in batch {
                self.parents.mark_fetched(qid.clone());
            }
            for row in results
                .results
                .bindings
                .iter()
                .filter_map(PlaceParentRow::from_binding)
            {
                if is_valid_qid(&row.place_qid) && is_valid_qid(&row.parent_qid) {
                    self.parents.add_parent(row.place_qid, row.parent_qid);
                }
            }
        }
        Ok(())
    }
}
