//! SPARQL JSON results model and row parsing.
//!
//! Raw rows are loosely-shaped maps of named bindings. Each query kind has
//! a typed row with its required fields made explicit; rows missing a
//! required binding are rejected here, at the parsing boundary, instead of
//! surfacing as surprises deeper in the pipeline.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::query::uri_to_qid;
use crate::geo::types::{Coord, Rank, SourceRelation};

/// SPARQL JSON results, reduced to the part we consume. The `head` section
/// is dropped; snapshots persist this same shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SparqlResults {
    #[serde(default)]
    pub results: BindingSet,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BindingSet {
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

/// One result row: variable name to bound value.
pub type Binding = HashMap<String, BoundValue>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundValue {
    pub value: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl BoundValue {
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            value_type: None,
            datatype: None,
            lang: None,
        }
    }
}

/// Fetch a binding's value by variable name.
pub fn binding_value<'a>(row: &'a Binding, key: &str) -> Option<&'a str> {
    row.get(key).map(|v| v.value.as_str())
}

/// Parse a WKT `Point(lon lat)` literal.
///
/// WDQS emits longitude first; the swap to (lat, lon) happens here and
/// nowhere else.
pub fn parse_wkt_point(wkt: &str) -> Option<Coord> {
    let inner = wkt.split_once("Point(")?.1.split_once(')')?.0;
    let mut parts = inner.split_whitespace();
    let lon: f64 = parts.next()?.parse().ok()?;
    let lat: f64 = parts.next()?.parse().ok()?;
    Some(Coord { lat, lon })
}

/// A row of the people-locations query.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRow {
    pub person_qid: String,
    pub relation: SourceRelation,
    pub place_qid: String,
    pub place_label: String,
    pub rank: Rank,
    pub qual_start: Option<String>,
    pub qual_end: Option<String>,
    pub coord: Option<Coord>,
}

impl LocationRow {
    /// Parse one binding row. Returns `None` when a required binding
    /// (person, prop, place) is missing or the property code is not one of
    /// the four location relations.
    pub fn from_binding(row: &Binding) -> Option<Self> {
        let person_uri = binding_value(row, "person")?;
        let relation = SourceRelation::from_property(binding_value(row, "prop")?)?;
        let place_uri = binding_value(row, "place")?;
        let place_qid = uri_to_qid(place_uri).to_string();
        let place_label = binding_value(row, "placeLabel")
            .map(str::to_string)
            .unwrap_or_else(|| place_qid.clone());
        Some(Self {
            person_qid: uri_to_qid(person_uri).to_string(),
            relation,
            place_label,
            rank: Rank::from_uri(binding_value(row, "rank")),
            qual_start: binding_value(row, "startTime").map(str::to_string),
            qual_end: binding_value(row, "endTime").map(str::to_string),
            coord: binding_value(row, "coord").and_then(parse_wkt_point),
            place_qid,
        })
    }
}

/// A row of the place-coordinates query.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceCoordRow {
    pub place_qid: String,
    pub coord: Option<Coord>,
}

impl PlaceCoordRow {
    pub fn from_binding(row: &Binding) -> Option<Self> {
        let place_uri = binding_value(row, "place")?;
        Some(Self {
            place_qid: uri_to_qid(place_uri).to_string(),
            coord: binding_value(row, "coord").and_then(parse_wkt_point),
        })
    }
}

/// A row of the place-parents query. The parent binding is OPTIONAL in the
/// query, so rows for places without parents parse to `None` and are
/// dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceParentRow {
    pub place_qid: String,
    pub parent_qid: String,
}

impl PlaceParentRow {
    pub fn from_binding(row: &Binding) -> Option<Self> {
        let place_uri = binding_value(row, "place")?;
        let parent_uri = binding_value(row, "parent")?;
        Some(Self {
            place_qid: uri_to_qid(place_uri).to_string(),
            parent_qid: uri_to_qid(parent_uri).to_string(),
        })
    }
}
