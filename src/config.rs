//! Runtime configuration for the enrichment pipeline.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Default WDQS SPARQL endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://query.wikidata.org/sparql";

/// Default User-Agent. WDQS fair-use policy wants contact information;
/// override via `--user-agent` or the `WDQS_USER_AGENT` env var.
pub const DEFAULT_USER_AGENT: &str = "geo-enrich/0.1 (research; contact: ops@example.org)";

/// All knobs recognized by the pipeline, with the defaults the CLI exposes.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// SPARQL endpoint queries are POSTed to.
    pub endpoint: Url,
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Entities per people-locations query. This query is four UNION
    /// branches wide plus a label service, so it is heavier per row than
    /// the place lookups and gets its own cap.
    pub entity_batch_size: usize,
    /// Places per coordinate / parent lookup query.
    pub place_batch_size: usize,
    /// Maximum administrative-parent hops for places without a coordinate.
    pub max_parent_hops: u32,
    /// Minimum spacing between consecutive WDQS calls.
    pub call_delay: Duration,
    /// Attempts per query before the run aborts.
    pub max_retries: u32,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Directory holding per-batch response snapshots.
    pub cache_dir: PathBuf,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            entity_batch_size: 200,
            place_batch_size: 50,
            max_parent_hops: 3,
            call_delay: Duration::from_millis(200),
            max_retries: 3,
            request_timeout: Duration::from_secs(120),
            cache_dir: PathBuf::from("cache"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = EnrichConfig::default();
        assert_eq!(config.entity_batch_size, 200);
        assert_eq!(config.place_batch_size, 50);
        assert_eq!(config.max_parent_hops, 3);
        assert_eq!(config.call_delay, Duration::from_millis(200));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.endpoint.as_str(), DEFAULT_ENDPOINT);
    }
}
