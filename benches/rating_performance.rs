//! Performance benchmarks for rating calculations

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dota_elo::config::RatingConfig;
use dota_elo::rating::elo::expected_score;
use dota_elo::rating::k_factor::KFactorPolicy;
use dota_elo::types::{EntityId, ExperienceLevel, MatchOutcome, MatchResult};
use dota_elo::RatingEngine;

fn league_matches(teams: usize, rounds: usize) -> Vec<MatchOutcome> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut matches = Vec::with_capacity(teams * rounds / 2);

    for round in 0..rounds {
        for i in (0..teams).step_by(2) {
            let a = EntityId::team(format!("{}", i));
            let b = EntityId::team(format!("{}", (i + 1 + round) % teams));
            if a == b {
                continue;
            }
            let result = if (i + round) % 3 == 0 {
                MatchResult::Loss
            } else {
                MatchResult::Win
            };
            matches.push(
                MatchOutcome::new(a, b, result, start + Duration::hours(round as i64))
                    .with_tier("s")
                    .with_stage("group_stage"),
            );
        }
    }

    matches
}

fn bench_rating_calculations(c: &mut Criterion) {
    c.bench_function("expected_score", |b| {
        b.iter(|| expected_score(black_box(1650.0), black_box(1480.0), black_box(400.0)))
    });

    let policy = KFactorPolicy::default();
    c.bench_function("k_factor", |b| {
        b.iter(|| {
            policy.k_factor(
                black_box(42),
                ExperienceLevel::New,
                black_box(1720.0),
                black_box(1.25),
            )
        })
    });
}

fn bench_single_ingest(c: &mut Criterion) {
    let engine = RatingEngine::new(RatingConfig::default()).unwrap();
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut minute = 0i64;

    c.bench_function("single_ingest", |b| {
        b.iter(|| {
            minute += 1;
            let outcome = MatchOutcome::new(
                EntityId::team("a"),
                EntityId::team("b"),
                MatchResult::Win,
                start + Duration::minutes(minute),
            );
            black_box(engine.ingest(&outcome).unwrap())
        })
    });
}

fn bench_replay_and_predict(c: &mut Criterion) {
    let matches = league_matches(64, 50);

    c.bench_function("replay_64_teams_50_rounds", |b| {
        b.iter(|| {
            let engine = RatingEngine::new(RatingConfig::default()).unwrap();
            black_box(engine.replay(matches.clone()))
        })
    });

    let engine = RatingEngine::new(RatingConfig::default()).unwrap();
    engine.replay(matches);
    let (a, b) = (EntityId::team("0"), EntityId::team("17"));

    c.bench_function("predict", |bench| {
        bench.iter(|| black_box(engine.predict(&a, &b).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_rating_calculations,
    bench_single_ingest,
    bench_replay_and_predict
);
criterion_main!(benches);
