//! Domain model for geographic enrichment.
//!
//! Input entities are read-only; `LocationStatement`s are created from raw
//! query rows, get a coordinate attached after fallback resolution, and are
//! then frozen into the owning `PersonGeoRecord`.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair.
///
/// Constructed from WKT points, which carry longitude first; the swap
/// happens in `wdqs::types::parse_wkt_point` and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

/// Which biographical relation produced a location statement.
///
/// Birthplace and deathplace are plain facts. Work location and residence
/// are statement-level claims that can carry time qualifiers and a rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRelation {
    WorkLocation,
    Residence,
    BirthPlace,
    DeathPlace,
}

impl SourceRelation {
    /// The Wikidata property code backing this relation.
    pub fn property(&self) -> &'static str {
        match self {
            Self::WorkLocation => "P937",
            Self::Residence => "P551",
            Self::BirthPlace => "P19",
            Self::DeathPlace => "P20",
        }
    }

    pub fn from_property(code: &str) -> Option<Self> {
        match code {
            "P937" => Some(Self::WorkLocation),
            "P551" => Some(Self::Residence),
            "P19" => Some(Self::BirthPlace),
            "P20" => Some(Self::DeathPlace),
            _ => None,
        }
    }

    /// True when statements of this relation can carry qualifiers and a rank.
    pub fn is_qualified(&self) -> bool {
        matches!(self, Self::WorkLocation | Self::Residence)
    }
}

/// Statement rank as reported by wikibase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    Preferred,
    Normal,
    Deprecated,
    Unknown,
}

impl Rank {
    /// Normalize a wikibase rank URI. Absent and unrecognized ranks both
    /// map to `Unknown`.
    pub fn from_uri(uri: Option<&str>) -> Self {
        match uri {
            Some(u) if u.ends_with("PreferredRank") => Self::Preferred,
            Some(u) if u.ends_with("NormalRank") => Self::Normal,
            Some(u) if u.ends_with("DeprecatedRank") => Self::Deprecated,
            _ => Self::Unknown,
        }
    }
}

/// How a statement's coordinate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordSource {
    /// The place itself carries a coordinate (hop 0).
    Exact,
    /// Resolved through an administrative ancestor (hop >= 1).
    ViaParent,
    /// No coordinate found within the hop budget.
    Missing,
}

/// Optional time window attached to a statement.
///
/// Values are raw WDQS timestamps. Wikidata emits proleptic and negative
/// years that calendar types refuse, so they are carried as opaque strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifierTime {
    pub start: Option<String>,
    pub end: Option<String>,
    pub has_qualifiers: bool,
}

/// One enriched location statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationStatement {
    pub source_relation: SourceRelation,
    pub place_qid: String,
    pub place_label: String,
    pub coord: Option<Coord>,
    pub coord_source: CoordSource,
    pub parent_hops: u32,
    pub time: QualifierTime,
    pub rank: Rank,
}

/// Geo-data quality classification for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoStatus {
    Ok,
    NeedsReview,
    MissingCoordinates,
    MissingWikidataLocation,
}

impl GeoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NeedsReview => "needs_review",
            Self::MissingCoordinates => "missing_coordinates",
            Self::MissingWikidataLocation => "missing_wikidata_location",
        }
    }
}

impl std::fmt::Display for GeoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Active years of an entity, as supplied upstream. Either bound may be
/// open; a statement without time qualifiers is treated by the frontend as
/// valid throughout this range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveRange {
    pub start: Option<i32>,
    pub end: Option<i32>,
}

/// Input entity (owned by the upstream collaborator, read-only here).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub external_reference_url: Option<String>,
    pub active_range: ActiveRange,
}

impl Entity {
    /// Convert upstream author rows, dropping rows without a usable id.
    pub fn from_author_rows(rows: Vec<AuthorRow>) -> Vec<Entity> {
        rows.into_iter()
            .filter_map(|row| {
                let id = row.id?;
                if id.trim().is_empty() {
                    return None;
                }
                Some(Entity {
                    name: row.content.unwrap_or_else(|| id.clone()),
                    external_reference_url: row.wikipedia_url,
                    active_range: ActiveRange {
                        start: row.start,
                        end: row.end,
                    },
                    id,
                })
            })
            .collect()
    }
}

/// One element of the upstream authors.json array.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorRow {
    #[serde(default)]
    pub id: Option<String>,
    /// Display name; the upstream tool calls this field `content`.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub start: Option<i32>,
    #[serde(default)]
    pub end: Option<i32>,
    #[serde(default)]
    pub wikipedia_url: Option<String>,
}

/// Final per-entity geo record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonGeoRecord {
    pub id: String,
    pub name: String,
    pub external_reference_url: Option<String>,
    pub active_range: ActiveRange,
    pub geo_status: GeoStatus,
    pub needs_manual_lookup: bool,
    pub locations: Vec<LocationStatement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown_reason: Option<String>,
}
