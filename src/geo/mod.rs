//! Geographic enrichment core
//!
//! This module provides:
//! - The domain model for location statements and per-entity geo records
//! - Run-scoped coordinate and parent caches, injected by the orchestrator
//! - The parent-fallback coordinate resolver
//! - The record builder and status classifier
//! - Batch orchestration over the entity list

pub mod builder;
pub mod cache;
pub mod enrichment;
pub mod resolver;
pub mod types;

pub use cache::{CoordCache, ParentCache};
pub use enrichment::{GeoEnrichmentService, StatusSummary};
pub use resolver::{ParentFallbackResolver, Resolution};
pub use types::*;
