//! In-process registry for derived calibration outputs.
//!
//! The periodic batch publishes here; decision cycles read here. Values
//! are `Arc`-wrapped and replaced wholesale on publish, so a reader holds
//! either the complete previous table or the complete new one, never a
//! partially updated mix. Durable persistence belongs to collaborators.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use super::isotonic::IsotonicMapping;
use super::metrics::CalibrationBucket;

/// Key for a published bucket table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketTableKey {
    pub engine: String,
    pub sport: String,
    pub window: String,
}

impl BucketTableKey {
    pub fn new(
        engine: impl Into<String>,
        sport: impl Into<String>,
        window: impl Into<String>,
    ) -> Self {
        Self {
            engine: engine.into(),
            sport: sport.into(),
            window: window.into(),
        }
    }
}

/// Key for a published isotonic mapping
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappingKey {
    pub engine: String,
    pub sport: String,
    pub bet_type: String,
}

impl MappingKey {
    pub fn new(
        engine: impl Into<String>,
        sport: impl Into<String>,
        bet_type: impl Into<String>,
    ) -> Self {
        Self {
            engine: engine.into(),
            sport: sport.into(),
            bet_type: bet_type.into(),
        }
    }
}

/// A bucket table as published by one batch run
#[derive(Debug, Clone)]
pub struct PublishedBuckets {
    pub buckets: Vec<CalibrationBucket>,
    pub sample_count: usize,
    pub published_at: DateTime<Utc>,
}

/// A mapping as published by one batch run
#[derive(Debug, Clone)]
pub struct PublishedMapping {
    pub mapping: IsotonicMapping,
    pub sample_count: usize,
    pub published_at: DateTime<Utc>,
}

/// Read-mostly store of derived calibration state
#[derive(Debug, Default)]
pub struct CalibrationRegistry {
    buckets: DashMap<BucketTableKey, Arc<PublishedBuckets>>,
    mappings: DashMap<MappingKey, Arc<PublishedMapping>>,
}

impl CalibrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the bucket table for a key atomically
    pub fn publish_buckets(
        &self,
        key: BucketTableKey,
        buckets: Vec<CalibrationBucket>,
        sample_count: usize,
    ) {
        debug!(
            engine = %key.engine,
            sport = %key.sport,
            window = %key.window,
            buckets = buckets.len(),
            "publishing bucket table"
        );
        self.buckets.insert(
            key,
            Arc::new(PublishedBuckets {
                buckets,
                sample_count,
                published_at: Utc::now(),
            }),
        );
    }

    /// Replace the mapping for a key atomically
    pub fn publish_mapping(&self, key: MappingKey, mapping: IsotonicMapping, sample_count: usize) {
        debug!(
            engine = %key.engine,
            sport = %key.sport,
            bet_type = %key.bet_type,
            control_points = mapping.len(),
            "publishing isotonic mapping"
        );
        self.mappings.insert(
            key,
            Arc::new(PublishedMapping {
                mapping,
                sample_count,
                published_at: Utc::now(),
            }),
        );
    }

    pub fn buckets(&self, key: &BucketTableKey) -> Option<Arc<PublishedBuckets>> {
        self.buckets.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn mapping(&self, key: &MappingKey) -> Option<Arc<PublishedMapping>> {
        self.mappings.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Calibrate a raw probability through the published mapping for a key
    ///
    /// With no published mapping the raw value passes through unchanged
    /// (cold start behaves as the identity).
    pub fn calibrate(&self, key: &MappingKey, raw: f64) -> f64 {
        match self.mapping(key) {
            Some(published) => published.mapping.apply(raw),
            None => raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::isotonic::MappingPoint;

    fn mapping_with(calibrated: f64) -> IsotonicMapping {
        IsotonicMapping::new(vec![
            MappingPoint {
                raw: 0.0,
                calibrated: 0.0,
            },
            MappingPoint {
                raw: 1.0,
                calibrated,
            },
        ])
    }

    #[test]
    fn test_unpublished_key_is_identity() {
        let registry = CalibrationRegistry::new();
        let key = MappingKey::new("winprob", "nba", "player_prop");
        assert_eq!(registry.calibrate(&key, 0.62), 0.62);
        assert!(registry.mapping(&key).is_none());
    }

    #[test]
    fn test_publish_then_read() {
        let registry = CalibrationRegistry::new();
        let key = MappingKey::new("winprob", "nba", "player_prop");

        registry.publish_mapping(key.clone(), mapping_with(0.8), 120);

        let published = registry.mapping(&key).expect("mapping published");
        assert_eq!(published.sample_count, 120);
        assert!((registry.calibrate(&key, 1.0) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_reader_keeps_old_snapshot_across_republish() {
        let registry = CalibrationRegistry::new();
        let key = MappingKey::new("winprob", "nba", "player_prop");

        registry.publish_mapping(key.clone(), mapping_with(0.5), 50);
        let old = registry.mapping(&key).expect("first publish");

        registry.publish_mapping(key.clone(), mapping_with(0.9), 200);

        // The held Arc still sees the complete old mapping
        assert!((old.mapping.apply(1.0) - 0.5).abs() < 1e-12);
        // A fresh read sees the complete new one
        let new = registry.mapping(&key).expect("second publish");
        assert!((new.mapping.apply(1.0) - 0.9).abs() < 1e-12);
        assert_eq!(new.sample_count, 200);
    }

    #[test]
    fn test_bucket_tables_keyed_independently() {
        let registry = CalibrationRegistry::new();
        let nba = BucketTableKey::new("winprob", "nba", "last_30d");
        let nfl = BucketTableKey::new("winprob", "nfl", "last_30d");

        registry.publish_buckets(nba.clone(), vec![], 0);

        assert!(registry.buckets(&nba).is_some());
        assert!(registry.buckets(&nfl).is_none());
    }
}
