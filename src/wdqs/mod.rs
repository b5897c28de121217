//! Wikidata Query Service (WDQS) integration
//!
//! This module provides:
//! - SPARQL query builders for the location, coordinate, and parent lookups
//! - A typed model of SPARQL JSON results with row-level validation
//! - A rate-limited, retrying client behind a mockable transport trait

pub mod client;
pub mod query;
pub mod retry;
pub mod types;

pub use client::{HttpTransport, SparqlTransport, WdqsClient};
pub use query::{is_valid_qid, uri_to_qid};
pub use retry::RetryPolicy;
pub use types::*;
