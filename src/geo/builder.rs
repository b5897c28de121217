//! Location record assembly and status classification.
//!
//! The status of a record is a pure function of its final statement list;
//! nothing mutates it afterwards.

use std::collections::{HashMap, HashSet};

use super::resolver::Resolution;
use super::types::{
    CoordSource, GeoStatus, LocationStatement, PersonGeoRecord, QualifierTime,
};
use crate::wdqs::types::LocationRow;

/// Reason tokens surfaced in `unknown_reason`.
pub const REASON_NO_LOCATIONS_YET: &str = "no_locations_yet";
pub const REASON_NO_PLACES: &str = "no_wikidata_places";
pub const REASON_NO_COORDINATES: &str = "places_without_coordinates";
pub const REASON_PARENT_ONLY: &str = "only_parent_fallback_coordinates";

/// Build a statement from a raw row, attaching the row's direct coordinate
/// or otherwise the resolver's verdict for the place.
pub fn build_statement(row: &LocationRow, resolved: &HashMap<String, Resolution>) -> LocationStatement {
    let (coord, coord_source, parent_hops) = match row.coord {
        Some(c) => (Some(c), CoordSource::Exact, 0),
        None => match resolved.get(&row.place_qid) {
            Some(r) => (r.coord, r.source, r.hops),
            None => (None, CoordSource::Missing, 0),
        },
    };

    LocationStatement {
        source_relation: row.relation,
        place_qid: row.place_qid.clone(),
        place_label: row.place_label.clone(),
        coord,
        coord_source,
        parent_hops,
        time: QualifierTime {
            start: row.qual_start.clone(),
            end: row.qual_end.clone(),
            has_qualifiers: row.qual_start.is_some() || row.qual_end.is_some(),
        },
        rank: row.rank,
    }
}

/// Classify a record from its statements, then collapse exact duplicates.
///
/// The ladder, weakest first: no statements at all; statements but no
/// resolvable coordinate; only ancestor-level coordinates (mappable, but
/// flagged for optional manual correction); at least one exact coordinate.
pub fn finalize_record(record: &mut PersonGeoRecord) {
    if record.locations.is_empty() {
        record.geo_status = GeoStatus::MissingWikidataLocation;
        record.needs_manual_lookup = true;
        record.unknown_reason = Some(REASON_NO_PLACES.to_string());
        return;
    }

    let mappable: Vec<&LocationStatement> = record
        .locations
        .iter()
        .filter(|l| l.coord.is_some())
        .collect();

    if mappable.is_empty() {
        record.geo_status = GeoStatus::MissingCoordinates;
        record.needs_manual_lookup = true;
        record.unknown_reason = Some(REASON_NO_COORDINATES.to_string());
    } else if mappable.iter().all(|l| l.coord_source == CoordSource::ViaParent) {
        record.geo_status = GeoStatus::NeedsReview;
        record.needs_manual_lookup = false;
        record.unknown_reason = Some(REASON_PARENT_ONLY.to_string());
    } else {
        record.geo_status = GeoStatus::Ok;
        record.needs_manual_lookup = false;
        record.unknown_reason = None;
    }

    dedup_locations(&mut record.locations);
}

/// Drop statements that duplicate an earlier one on
/// (relation, place, qualifier start, qualifier end), keeping first-seen
/// order.
pub fn dedup_locations(locations: &mut Vec<LocationStatement>) {
    let mut seen = HashSet::new();
    locations.retain(|l| {
        seen.insert((
            l.source_relation,
            l.place_qid.clone(),
            l.time.start.clone(),
            l.time.end.clone(),
        ))
    });
}
