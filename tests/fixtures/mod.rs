//! Test fixtures and store implementations for integration testing

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use dota_elo::error::{RatingError, Result};
use dota_elo::rating::storage::{EntityIter, InMemoryRatingStore, RatingStore};
use dota_elo::types::{EntityId, MatchOutcome, MatchResult, RatingPoint, RatingRecord};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Store that refuses commits while `fail_commits` is set
#[derive(Debug)]
pub struct FailingRatingStore {
    inner: InMemoryRatingStore,
    fail_commits: AtomicBool,
    commit_attempts: AtomicUsize,
}

impl FailingRatingStore {
    pub fn new(baseline: f64) -> Self {
        Self {
            inner: InMemoryRatingStore::new(baseline),
            fail_commits: AtomicBool::new(false),
            commit_attempts: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_commits.store(failing, Ordering::SeqCst);
    }

    pub fn commit_attempts(&self) -> usize {
        self.commit_attempts.load(Ordering::SeqCst)
    }
}

impl RatingStore for FailingRatingStore {
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
        self.commit_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(RatingError::InternalError {
                message: "storage unavailable".to_string(),
            }
            .into());
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

/// Fixed reference time for tests
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 10, 12, 16, 0, 0).unwrap()
}

pub fn day(n: i64) -> DateTime<Utc> {
    t0() + Duration::days(n)
}

pub fn team_win(a: &str, b: &str, at: DateTime<Utc>) -> MatchOutcome {
    MatchOutcome::new(EntityId::team(a), EntityId::team(b), MatchResult::Win, at)
}

/// A record with the given rating and match count, last active at `last_match`
pub fn seasoned_record(
    entity_id: EntityId,
    rating: f64,
    matches: u32,
    last_match: DateTime<Utc>,
) -> RatingRecord {
    let mut record = RatingRecord::new(entity_id, 1500.0);
    record.rating = rating;
    record.matches_played = matches;
    record.wins = matches / 2;
    record.losses = matches - matches / 2;
    record.last_match_at = Some(last_match);
    record.history.push(RatingPoint {
        timestamp: last_match,
        rating,
    });
    record
}

/// A round robin between `teams` teams, one match per day, strongest listed first
pub fn round_robin(teams: &[&str], tier: &str) -> Vec<MatchOutcome> {
    let mut matches = Vec::new();
    let mut n = 0;

    for (i, a) in teams.iter().enumerate() {
        for b in teams.iter().skip(i + 1) {
            matches.push(
                team_win(a, b, day(n))
                    .with_tier(tier)
                    .with_match_id(format!("rr-{}", n)),
            );
            n += 1;
        }
    }

    matches
}

/// Write matches to a temporary JSON-lines feed file
pub fn write_feed(name: &str, matches: &[MatchOutcome], extra_lines: &[&str]) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "dota-elo-{}-{}.jsonl",
        name,
        std::process::id()
    ));
    let mut file = std::fs::File::create(&path).unwrap();

    for outcome in matches {
        writeln!(file, "{}", serde_json::to_string(outcome).unwrap()).unwrap();
    }
    for line in extra_lines {
        writeln!(file, "{}", line).unwrap();
    }

    path
}
