//! SPARQL query builders.
//!
//! All three query shapes batch-select by QID with a VALUES clause and are
//! sent as POST bodies, so batch size is bounded by fair use rather than
//! URL length. Identifiers that fail QID validation are dropped before the
//! VALUES clause is built; a batch with no valid QIDs builds no query.

use std::sync::OnceLock;

use regex::Regex;

fn qid_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Q[0-9]+$").expect("QID pattern is valid"))
}

/// Check whether a string is a well-formed Wikidata QID.
pub fn is_valid_qid(qid: &str) -> bool {
    qid_regex().is_match(qid.trim())
}

/// Extract the trailing QID from an entity URI like
/// `http://www.wikidata.org/entity/Q42`.
pub fn uri_to_qid(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// Render the valid QIDs of a batch as VALUES terms, one per line.
fn values_terms(qids: &[String]) -> Option<String> {
    let terms: Vec<String> = qids
        .iter()
        .filter(|q| is_valid_qid(q.as_str()))
        .map(|q| format!("wd:{}", q.trim()))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join("\n    "))
    }
}

/// Location statements for a batch of people.
///
/// Work location (P937) and residence (P551) are selected at statement
/// level so the rank and P580/P582 time qualifiers come along; birthplace
/// (P19) and deathplace (P20) are plain truthy facts. Each place brings an
/// optional direct coordinate (P625) and an English label.
pub fn people_locations_query(qids: &[String]) -> Option<String> {
    let values = values_terms(qids)?;
    Some(format!(
        r#"
PREFIX wd: <http://www.wikidata.org/entity/>
PREFIX wdt: <http://www.wikidata.org/prop/direct/>
PREFIX p: <http://www.wikidata.org/prop/>
PREFIX ps: <http://www.wikidata.org/prop/statement/>
PREFIX pq: <http://www.wikidata.org/prop/qualifier/>
PREFIX wikibase: <http://wikiba.se/ontology#>
PREFIX bd: <http://www.bigdata.com/rdf#>

SELECT ?person ?prop ?place ?rank ?startTime ?endTime ?coord ?placeLabel
WHERE {{
  VALUES ?person {{
    {values}
  }}

  {{
    ?person p:P937 ?st .
    ?st ps:P937 ?place .
    BIND("P937" AS ?prop)
    OPTIONAL {{ ?st pq:P580 ?startTime }}
    OPTIONAL {{ ?st pq:P582 ?endTime }}
    OPTIONAL {{ ?st wikibase:rank ?rank }}
  }}
  UNION
  {{
    ?person p:P551 ?st .
    ?st ps:P551 ?place .
    BIND("P551" AS ?prop)
    OPTIONAL {{ ?st pq:P580 ?startTime }}
    OPTIONAL {{ ?st pq:P582 ?endTime }}
    OPTIONAL {{ ?st wikibase:rank ?rank }}
  }}
  UNION
  {{
    ?person wdt:P19 ?place .
    BIND("P19" AS ?prop)
  }}
  UNION
  {{
    ?person wdt:P20 ?place .
    BIND("P20" AS ?prop)
  }}

  OPTIONAL {{ ?place wdt:P625 ?coord }}

  SERVICE wikibase:label {{
    bd:serviceParam wikibase:language "en".
    ?place rdfs:label ?placeLabel .
  }}
}}
"#
    ))
}

/// Direct coordinates (P625) for a batch of places.
pub fn place_coords_query(qids: &[String]) -> Option<String> {
    let values = values_terms(qids)?;
    Some(format!(
        r#"
PREFIX wd: <http://www.wikidata.org/entity/>
PREFIX wdt: <http://www.wikidata.org/prop/direct/>

SELECT ?place ?coord WHERE {{
  VALUES ?place {{
    {values}
  }}
  OPTIONAL {{ ?place wdt:P625 ?coord }}
}}
"#
    ))
}

/// Administrative parents (P131) for a batch of places.
pub fn place_parents_query(qids: &[String]) -> Option<String> {
    let values = values_terms(qids)?;
    Some(format!(
        r#"
PREFIX wd: <http://www.wikidata.org/entity/>
PREFIX wdt: <http://www.wikidata.org/prop/direct/>

SELECT ?place ?parent WHERE {{
  VALUES ?place {{
    {values}
  }}
  OPTIONAL {{ ?place wdt:P131 ?parent }}
}}
"#
    ))
}
