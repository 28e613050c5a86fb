//! Rating storage interface and implementations
//!
//! The store exclusively owns every [`RatingRecord`]. Unseen entities are not
//! an error: [`RatingStore::get`] creates them at the baseline rating, while
//! [`RatingStore::lookup`] is the read that never creates anything.

use crate::error::{RatingError, Result};
use crate::types::{EntityId, RatingRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Lazy, finite sequence of entity ids. Call `all_entities` again to restart.
pub type EntityIter = std::vec::IntoIter<EntityId>;

/// Trait for rating storage operations
pub trait RatingStore: Send + Sync {
    /// Baseline rating given to newly created records
    fn baseline(&self) -> f64;

    /// Get an entity's record, creating it at the baseline if absent
    fn get(&self, entity_id: &EntityId) -> Result<RatingRecord>;

    /// Get an entity's record without creating it
    fn lookup(&self, entity_id: &EntityId) -> Result<Option<RatingRecord>>;

    /// Write a new rating for an entity, appending to its history. The write
    /// counts as activity: it becomes the entity's last-seen time for decay.
    fn set(
        &self,
        entity_id: &EntityId,
        rating: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<RatingRecord>;

    /// Replace several records at once. Every record is validated before any
    /// is written, so either all land or none do.
    fn commit(&self, records: Vec<RatingRecord>) -> Result<()>;

    /// All stored entity ids, in sorted order
    fn all_entities(&self) -> Result<EntityIter>;

    /// Number of stored entities
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Check that `updated` is a legal successor of `existing`
pub fn validate_record(existing: Option<&RatingRecord>, updated: &RatingRecord) -> Result<()> {
    if !updated.rating.is_finite() {
        return Err(RatingError::InvalidRating {
            entity_id: updated.entity_id.to_string(),
            value: updated.rating,
        }
        .into());
    }

    let kept = existing.map(|record| record.history.len()).unwrap_or(0);
    if updated.history.len() < kept {
        return Err(RatingError::InternalError {
            message: format!("History of {} cannot shrink", updated.entity_id),
        }
        .into());
    }

    let start = kept.saturating_sub(1);
    for pair in updated.history[start..].windows(2) {
        if pair[1].timestamp < pair[0].timestamp {
            return Err(RatingError::OutOfOrderMatch {
                entity_id: updated.entity_id.to_string(),
                match_time: pair[1].timestamp,
                last_recorded: pair[0].timestamp,
            }
            .into());
        }
    }

    for point in &updated.history[kept..] {
        if !point.rating.is_finite() {
            return Err(RatingError::InvalidRating {
                entity_id: updated.entity_id.to_string(),
                value: point.rating,
            }
            .into());
        }
    }

    Ok(())
}

/// In-memory rating storage implementation
#[derive(Debug)]
pub struct InMemoryRatingStore {
    records: RwLock<HashMap<EntityId, RatingRecord>>,
    baseline: f64,
}

impl InMemoryRatingStore {
    /// Create a new in-memory store
    pub fn new(baseline: f64) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            baseline,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<EntityId, RatingRecord>>> {
        self.records.read().map_err(|_| {
            RatingError::InternalError {
                message: "Failed to acquire ratings read lock".to_string(),
            }
            .into()
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<EntityId, RatingRecord>>> {
        self.records.write().map_err(|_| {
            RatingError::InternalError {
                message: "Failed to acquire ratings write lock".to_string(),
            }
            .into()
        })
    }
}

impl Default for InMemoryRatingStore {
    fn default() -> Self {
        Self::new(1500.0)
    }
}

impl RatingStore for InMemoryRatingStore {
    fn baseline(&self) -> f64 {
        self.baseline
    }

    fn get(&self, entity_id: &EntityId) -> Result<RatingRecord> {
        if let Some(record) = self.read()?.get(entity_id) {
            return Ok(record.clone());
        }

        let mut records = self.write()?;
        let record = records
            .entry(entity_id.clone())
            .or_insert_with(|| RatingRecord::new(entity_id.clone(), self.baseline));

        Ok(record.clone())
    }

    fn lookup(&self, entity_id: &EntityId) -> Result<Option<RatingRecord>> {
        Ok(self.read()?.get(entity_id).cloned())
    }

    fn set(
        &self,
        entity_id: &EntityId,
        rating: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<RatingRecord> {
        let mut records = self.write()?;

        let existing = records.get(entity_id);
        if let Some(last_recorded) = existing.and_then(|record| record.last_recorded_at()) {
            if timestamp < last_recorded {
                return Err(RatingError::OutOfOrderMatch {
                    entity_id: entity_id.to_string(),
                    match_time: timestamp,
                    last_recorded,
                }
                .into());
            }
        }

        let mut updated = existing
            .cloned()
            .unwrap_or_else(|| RatingRecord::new(entity_id.clone(), self.baseline));
        updated.mark_seen(rating, timestamp);
        validate_record(existing, &updated)?;

        records.insert(entity_id.clone(), updated.clone());
        Ok(updated)
    }

    fn commit(&self, records: Vec<RatingRecord>) -> Result<()> {
        let mut stored = self.write()?;

        for record in &records {
            validate_record(stored.get(&record.entity_id), record)?;
        }

        for record in records {
            stored.insert(record.entity_id.clone(), record);
        }

        Ok(())
    }

    fn all_entities(&self) -> Result<EntityIter> {
        let mut ids: Vec<EntityId> = self.read()?.keys().cloned().collect();
        ids.sort();
        Ok(ids.into_iter())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}

/// Mock rating store for testing: an in-memory store that records commits
#[derive(Debug, Default)]
pub struct MockRatingStore {
    inner: InMemoryRatingStore,
    commit_calls: RwLock<Vec<Vec<RatingRecord>>>,
}

impl MockRatingStore {
    pub fn new(baseline: f64) -> Self {
        Self {
            inner: InMemoryRatingStore::new(baseline),
            commit_calls: RwLock::new(Vec::new()),
        }
    }

    /// Get all commit calls made (for testing)
    pub fn get_commit_calls(&self) -> Vec<Vec<RatingRecord>> {
        self.commit_calls
            .read()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Clear recorded commit calls
    pub fn clear_commit_calls(&self) {
        if let Ok(mut calls) = self.commit_calls.write() {
            calls.clear();
        }
    }

    /// Preset records for testing, bypassing validation
    pub fn preset_records(&self, records: Vec<RatingRecord>) -> Result<()> {
        let mut stored = self.inner.write()?;
        for record in records {
            stored.insert(record.entity_id.clone(), record);
        }
        Ok(())
    }
}

impl RatingStore for MockRatingStore {
    fn baseline(&self) -> f64 {
        self.inner.baseline()
    }

    fn get(&self, entity_id: &EntityId) -> Result<RatingRecord> {
        self.inner.get(entity_id)
    }

    fn lookup(&self, entity_id: &EntityId) -> Result<Option<RatingRecord>> {
        self.inner.lookup(entity_id)
    }

    fn set(
        &self,
        entity_id: &EntityId,
        rating: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<RatingRecord> {
        self.inner.set(entity_id, rating, timestamp)
    }

    fn commit(&self, records: Vec<RatingRecord>) -> Result<()> {
        if let Ok(mut calls) = self.commit_calls.write() {
            calls.push(records.clone());
        }

        self.inner.commit(records)
    }

    fn all_entities(&self) -> Result<EntityIter> {
        self.inner.all_entities()
    }

    fn len(&self) -> Result<usize> {
        self.inner.len()
    }
}
