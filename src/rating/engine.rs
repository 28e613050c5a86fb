//! Rating update engine
//!
//! The engine owns the policies and a handle to the store. Each ingested match
//! goes through one read-decay-compute-commit sequence while the stripes of
//! both participants are held, so updates touching a shared entity are
//! serialized and a rejected match leaves the store exactly as it was.

use crate::config::RatingConfig;
use crate::error::{classify, RatingError, Result};
use crate::metrics::RatingMetrics;
use crate::rating::confidence::ConfidenceEstimator;
use crate::rating::decay::DecayPolicy;
use crate::rating::elo::{expected_pair, rating_delta};
use crate::rating::k_factor::KFactorPolicy;
use crate::rating::locks::EntityLocks;
use crate::rating::statistics::RatingDistribution;
use crate::rating::storage::{EntityIter, InMemoryRatingStore, RatingStore};
use crate::rating::weighting::MatchWeighting;
use crate::types::{EntityId, EntityKind, MatchOutcome, PredictionResult, RatingRecord};
use crate::utils::normalize_tag;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Everything that happened to both sides of one ingested match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingUpdate {
    /// Stored records before the match
    pub before_a: RatingRecord,
    pub before_b: RatingRecord,
    /// Stored records after the match
    pub after_a: RatingRecord,
    pub after_b: RatingRecord,
    /// Ratings the match was computed from, after inactivity decay
    pub pre_match_rating_a: f64,
    pub pre_match_rating_b: f64,
    /// Prediction the engine would have made just before the match
    pub prediction: PredictionResult,
    pub expected_a: f64,
    pub actual_a: f64,
    pub k_a: f64,
    pub k_b: f64,
    /// Tier times stage multiplier applied to both sides
    pub importance: f64,
}

impl RatingUpdate {
    pub fn delta_a(&self) -> f64 {
        self.after_a.rating - self.pre_match_rating_a
    }

    pub fn delta_b(&self) -> f64 {
        self.after_b.rating - self.pre_match_rating_b
    }
}

/// Outcome of a decay sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Records looked at
    pub examined: usize,
    /// Records whose rating moved
    pub settled: usize,
    /// Records with history after the sweep time
    pub skipped: usize,
}

/// A match refused during a replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedMatch {
    /// Position in the replayed sequence
    pub index: usize,
    pub label: String,
    pub reason: String,
    pub message: String,
}

/// Outcome of replaying a sequence of matches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub applied: usize,
    pub rejected: Vec<RejectedMatch>,
}

/// Running counters kept by the engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub matches_ingested: u64,
    pub matches_rejected: u64,
    pub predictions_served: u64,
    pub decay_settlements: u64,
}

/// The rating update engine
pub struct RatingEngine {
    config: RatingConfig,
    store: Arc<dyn RatingStore>,
    k_factor: KFactorPolicy,
    weighting: MatchWeighting,
    decay: DecayPolicy,
    confidence: ConfidenceEstimator,
    locks: EntityLocks,
    stats: RwLock<EngineStats>,
    metrics: Option<RatingMetrics>,
}

impl RatingEngine {
    /// Create an engine over a fresh in-memory store
    pub fn new(config: RatingConfig) -> Result<Self> {
        let store = Arc::new(InMemoryRatingStore::new(config.baseline_rating));
        Self::with_store(config, store)
    }

    /// Create an engine over an existing store
    pub fn with_store(config: RatingConfig, store: Arc<dyn RatingStore>) -> Result<Self> {
        config.validate()?;

        if store.baseline() != config.baseline_rating {
            return Err(RatingError::ConfigurationError {
                message: format!(
                    "Store baseline {} does not match configured baseline {}",
                    store.baseline(),
                    config.baseline_rating
                ),
            }
            .into());
        }

        Ok(Self {
            k_factor: KFactorPolicy::new(config.k_factor.clone())?,
            weighting: MatchWeighting::new(config.weighting.clone())?,
            decay: DecayPolicy::new(config.decay.clone(), config.baseline_rating)?,
            confidence: ConfidenceEstimator::new(config.confidence.clone(), config.scale)?,
            locks: EntityLocks::default(),
            stats: RwLock::new(EngineStats::default()),
            metrics: None,
            store,
            config,
        })
    }

    /// Attach a metrics collector
    pub fn with_metrics(mut self, metrics: RatingMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn RatingStore> {
        self.store.clone()
    }

    pub fn metrics(&self) -> Option<&RatingMetrics> {
        self.metrics.as_ref()
    }

    pub fn stats(&self) -> Result<EngineStats> {
        self.stats.read().map(|stats| stats.clone()).map_err(|_| {
            RatingError::InternalError {
                message: "Failed to acquire engine stats read lock".to_string(),
            }
            .into()
        })
    }

    fn update_stats(&self, update: impl FnOnce(&mut EngineStats)) {
        match self.stats.write() {
            Ok(mut stats) => update(&mut stats),
            Err(_) => warn!("Engine stats lock is poisoned, counters are no longer updated"),
        }
    }

    /// Stored record, or a baseline record that is not persisted
    fn current_record(&self, entity_id: &EntityId) -> Result<RatingRecord> {
        Ok(self
            .store
            .lookup(entity_id)?
            .unwrap_or_else(|| RatingRecord::new(entity_id.clone(), self.config.baseline_rating)))
    }

    fn check_order(record: &RatingRecord, played_at: DateTime<Utc>) -> Result<()> {
        match record.last_recorded_at() {
            Some(last_recorded) if played_at < last_recorded => {
                Err(RatingError::OutOfOrderMatch {
                    entity_id: record.entity_id.to_string(),
                    match_time: played_at,
                    last_recorded,
                }
                .into())
            }
            _ => Ok(()),
        }
    }

    /// Apply one finished match to both participants.
    ///
    /// On any error neither record is changed.
    pub fn ingest(&self, outcome: &MatchOutcome) -> Result<RatingUpdate> {
        match self.apply(outcome) {
            Ok(update) => {
                self.update_stats(|stats| stats.matches_ingested += 1);
                if let Some(metrics) = &self.metrics {
                    metrics.record_ingested(
                        &normalize_tag(&outcome.tier),
                        update.delta_a(),
                        update.delta_b(),
                        self.store.len().unwrap_or(0),
                    );
                }
                Ok(update)
            }
            Err(err) => {
                let reason = classify(&err).map(|e| e.kind()).unwrap_or("internal");
                self.update_stats(|stats| stats.matches_rejected += 1);
                if let Some(metrics) = &self.metrics {
                    metrics.record_rejected(reason);
                }
                debug!("Rejected match {} ({}): {}", outcome.label(), reason, err);
                Err(err)
            }
        }
    }

    fn apply(&self, outcome: &MatchOutcome) -> Result<RatingUpdate> {
        outcome.validate(self.config.allow_draws)?;

        let _guard = self
            .locks
            .lock_pair(&outcome.entity_a, &outcome.entity_b)?;

        let before_a = self.current_record(&outcome.entity_a)?;
        let before_b = self.current_record(&outcome.entity_b)?;
        Self::check_order(&before_a, outcome.played_at)?;
        Self::check_order(&before_b, outcome.played_at)?;

        let rating_a = self.decay.decayed_rating(&before_a, outcome.played_at);
        let rating_b = self.decay.decayed_rating(&before_b, outcome.played_at);
        let prediction = self
            .confidence
            .predict(&before_a, rating_a, &before_b, rating_b);

        let (expected_a, expected_b) = expected_pair(rating_a, rating_b, self.config.scale);
        let actual_a = outcome.result.score();
        let actual_b = outcome.result.reversed().score();

        let importance = self.weighting.multiplier(&outcome.tier, &outcome.stage);
        let k_a = self.k_factor.k_factor(
            before_a.matches_played,
            outcome.experience_a,
            rating_a,
            importance,
        );
        let k_b = self.k_factor.k_factor(
            before_b.matches_played,
            outcome.experience_b,
            rating_b,
            importance,
        );

        let new_a = rating_a + rating_delta(k_a, actual_a, expected_a);
        let new_b = rating_b + rating_delta(k_b, actual_b, expected_b);

        let mut after_a = before_a.clone();
        after_a.record_match(new_a, outcome.played_at, outcome.result);
        let mut after_b = before_b.clone();
        after_b.record_match(new_b, outcome.played_at, outcome.result.reversed());

        self.store
            .commit(vec![after_a.clone(), after_b.clone()])?;

        debug!(
            "Match {}: {} {:.1} -> {:.1} (K {:.1}), {} {:.1} -> {:.1} (K {:.1})",
            outcome.label(),
            outcome.entity_a,
            rating_a,
            new_a,
            k_a,
            outcome.entity_b,
            rating_b,
            new_b,
            k_b
        );

        Ok(RatingUpdate {
            before_a,
            before_b,
            after_a,
            after_b,
            pre_match_rating_a: rating_a,
            pre_match_rating_b: rating_b,
            prediction,
            expected_a,
            actual_a,
            k_a,
            k_b,
            importance,
        })
    }

    /// Predict a pairing from current stored ratings. Never changes state.
    pub fn predict(&self, a: &EntityId, b: &EntityId) -> Result<PredictionResult> {
        self.predict_with(a, b, |record| record.rating)
    }

    /// Predict a pairing as if it were played at `at`, applying pending decay
    pub fn predict_as_of(
        &self,
        a: &EntityId,
        b: &EntityId,
        at: DateTime<Utc>,
    ) -> Result<PredictionResult> {
        self.predict_with(a, b, |record| self.decay.decayed_rating(record, at))
    }

    fn predict_with(
        &self,
        a: &EntityId,
        b: &EntityId,
        rating_of: impl Fn(&RatingRecord) -> f64,
    ) -> Result<PredictionResult> {
        if a == b {
            return Err(RatingError::InvalidMatch {
                reason: format!("Cannot predict {} against itself", a),
            }
            .into());
        }

        let record_a = self.current_record(a)?;
        let record_b = self.current_record(b)?;
        let prediction = self.confidence.predict(
            &record_a,
            rating_of(&record_a),
            &record_b,
            rating_of(&record_b),
        );

        self.update_stats(|stats| stats.predictions_served += 1);
        if let Some(metrics) = &self.metrics {
            metrics.record_prediction();
        }

        Ok(prediction)
    }

    /// Get an entity's record, creating it at the baseline if unseen
    pub fn get_rating(&self, entity_id: &EntityId) -> Result<RatingRecord> {
        self.store.get(entity_id)
    }

    /// All rated entity ids, sorted
    pub fn all_entities(&self) -> Result<EntityIter> {
        self.store.all_entities()
    }

    /// Lazily yield every stored record. Each call starts a fresh pass.
    pub fn export_all(&self) -> Result<impl Iterator<Item = RatingRecord> + '_> {
        let ids = self.store.all_entities()?;

        Ok(ids.filter_map(move |id| match self.store.lookup(&id) {
            Ok(record) => record,
            Err(err) => {
                warn!("Skipping {} during export: {}", id, err);
                None
            }
        }))
    }

    /// Records of one kind (or all), highest rating first
    pub fn leaderboard(&self, kind: Option<EntityKind>, limit: usize) -> Result<Vec<RatingRecord>> {
        let mut records: Vec<RatingRecord> = self
            .export_all()?
            .filter(|record| kind.map_or(true, |kind| record.entity_id.kind == kind))
            .collect();

        records.sort_by(|a, b| {
            b.rating
                .partial_cmp(&a.rating)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });
        records.truncate(limit);

        Ok(records)
    }

    /// Summary statistics of stored ratings; `None` when nothing matches
    pub fn distribution(&self, kind: Option<EntityKind>) -> Result<Option<RatingDistribution>> {
        let ratings: Vec<f64> = self
            .export_all()?
            .filter(|record| kind.map_or(true, |kind| record.entity_id.kind == kind))
            .map(|record| record.rating)
            .collect();

        Ok(RatingDistribution::from_ratings(&ratings))
    }

    /// Settle inactivity decay for every record as of `at`.
    ///
    /// Sweeping twice at the same time changes nothing the second time.
    pub fn sweep_decay(&self, at: DateTime<Utc>) -> Result<SweepReport> {
        let mut report = SweepReport::default();

        for id in self.store.all_entities()? {
            let _guard = self.locks.lock(&id)?;
            let Some(mut record) = self.store.lookup(&id)? else {
                continue;
            };
            report.examined += 1;

            if record.last_recorded_at().is_some_and(|last| last > at) {
                report.skipped += 1;
                continue;
            }

            let before = record.rating;
            if self.decay.settle(&mut record, at) {
                let after = record.rating;
                self.store.commit(vec![record])?;
                report.settled += 1;
                debug!("Decayed {} from {:.1} to {:.1}", id, before, after);
            }
        }

        self.update_stats(|stats| stats.decay_settlements += report.settled as u64);
        if let Some(metrics) = &self.metrics {
            metrics.record_decay_settlements(report.settled as u64);
        }

        info!(
            "Decay sweep at {}: {} examined, {} settled, {} skipped",
            at, report.examined, report.settled, report.skipped
        );

        Ok(report)
    }

    /// Ingest matches in order, collecting rejections instead of stopping
    pub fn replay<I>(&self, matches: I) -> ReplaySummary
    where
        I: IntoIterator<Item = MatchOutcome>,
    {
        let mut summary = ReplaySummary::default();

        for (index, outcome) in matches.into_iter().enumerate() {
            match self.ingest(&outcome) {
                Ok(_) => summary.applied += 1,
                Err(err) => {
                    let reason = classify(&err).map(|e| e.kind()).unwrap_or("internal");
                    warn!("Skipping match {}: {}", outcome.label(), err);
                    summary.rejected.push(RejectedMatch {
                        index,
                        label: outcome.label(),
                        reason: reason.to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            "Replay finished: {} applied, {} rejected",
            summary.applied,
            summary.rejected.len()
        );

        summary
    }
}
