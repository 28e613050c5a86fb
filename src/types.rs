//! Common types used throughout the rating engine

use crate::error::RatingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of rated entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Player,
    Team,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Player => write!(f, "player"),
            EntityKind::Team => write!(f, "team"),
        }
    }
}

/// Identifier of a rated player or team.
///
/// The textual form is `<kind>:<id>`, e.g. `team:8599101` or `player:105248644`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityId {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn player(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Player, id)
    }

    pub fn team(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Team, id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for EntityId {
    type Err = RatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| RatingError::InvalidMatch {
                reason: format!("Entity id '{}' is not of the form <kind>:<id>", s),
            })?;

        let kind = match kind.to_ascii_lowercase().as_str() {
            "player" => EntityKind::Player,
            "team" => EntityKind::Team,
            other => {
                return Err(RatingError::InvalidMatch {
                    reason: format!("Unknown entity kind '{}'", other),
                })
            }
        };

        if id.is_empty() {
            return Err(RatingError::InvalidMatch {
                reason: format!("Entity id '{}' has an empty identifier", s),
            });
        }

        Ok(Self::new(kind, id))
    }
}

impl TryFrom<String> for EntityId {
    type Error = RatingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.to_string()
    }
}

/// Result of a match from side A's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MatchResult {
    Win,
    Loss,
    Draw,
}

impl MatchResult {
    /// Actual score for side A
    pub fn score(&self) -> f64 {
        match self {
            MatchResult::Win => 1.0,
            MatchResult::Loss => 0.0,
            MatchResult::Draw => 0.5,
        }
    }

    /// The same result seen from side B
    pub fn reversed(&self) -> Self {
        match self {
            MatchResult::Win => MatchResult::Loss,
            MatchResult::Loss => MatchResult::Win,
            MatchResult::Draw => MatchResult::Draw,
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::Win => write!(f, "win"),
            MatchResult::Loss => write!(f, "loss"),
            MatchResult::Draw => write!(f, "draw"),
        }
    }
}

impl FromStr for MatchResult {
    type Err = RatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "win" => Ok(MatchResult::Win),
            "loss" => Ok(MatchResult::Loss),
            "draw" => Ok(MatchResult::Draw),
            other => Err(RatingError::InvalidMatch {
                reason: format!("Unrecognized result indicator '{}'", other),
            }),
        }
    }
}

impl TryFrom<String> for MatchResult {
    type Error = RatingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MatchResult> for String {
    fn from(value: MatchResult) -> Self {
        value.to_string()
    }
}

/// Upstream hint about an entity's experience at match time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    #[default]
    New,
    Established,
}

/// A finished match as delivered by the match feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Upstream match id, only used for logging
    #[serde(default)]
    pub match_id: Option<String>,
    pub entity_a: EntityId,
    pub entity_b: EntityId,
    pub result: MatchResult,
    pub played_at: DateTime<Utc>,
    /// Tournament tier tag (e.g. "ti", "s", "qualifier")
    #[serde(default)]
    pub tier: String,
    /// Tournament stage tag (e.g. "group_stage", "grand_final")
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub experience_a: ExperienceLevel,
    #[serde(default)]
    pub experience_b: ExperienceLevel,
}

impl MatchOutcome {
    /// Create a match with empty tier/stage tags and `New` experience hints
    pub fn new(
        entity_a: EntityId,
        entity_b: EntityId,
        result: MatchResult,
        played_at: DateTime<Utc>,
    ) -> Self {
        Self {
            match_id: None,
            entity_a,
            entity_b,
            result,
            played_at,
            tier: String::new(),
            stage: String::new(),
            experience_a: ExperienceLevel::New,
            experience_b: ExperienceLevel::New,
        }
    }

    pub fn with_match_id(mut self, match_id: impl Into<String>) -> Self {
        self.match_id = Some(match_id.into());
        self
    }

    pub fn with_tier(mut self, tier: impl Into<String>) -> Self {
        self.tier = tier.into();
        self
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = stage.into();
        self
    }

    pub fn with_experience(mut self, a: ExperienceLevel, b: ExperienceLevel) -> Self {
        self.experience_a = a;
        self.experience_b = b;
        self
    }

    /// Check the shape of the match before any state is touched
    pub fn validate(&self, allow_draws: bool) -> crate::error::Result<()> {
        if self.entity_a == self.entity_b {
            return Err(RatingError::InvalidMatch {
                reason: format!("{} cannot play against itself", self.entity_a),
            }
            .into());
        }

        if self.result == MatchResult::Draw && !allow_draws {
            return Err(RatingError::InvalidMatch {
                reason: "Draws are disabled in the rating configuration".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Label used in logs: the upstream id when present
    pub fn label(&self) -> String {
        match &self.match_id {
            Some(id) => id.clone(),
            None => format!("{} vs {}", self.entity_a, self.entity_b),
        }
    }
}

/// One point of a rating history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingPoint {
    pub timestamp: DateTime<Utc>,
    pub rating: f64,
}

/// Current rating state of a single entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub entity_id: EntityId,
    pub rating: f64,
    /// Rating the entity started from
    pub initial_rating: f64,
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// Timestamp of the last rated match
    pub last_match_at: Option<DateTime<Utc>>,
    /// Time through which inactivity decay has been settled by a sweep
    pub decay_settled_at: Option<DateTime<Utc>>,
    /// Append-only, non-decreasing in timestamp
    pub history: Vec<RatingPoint>,
}

impl RatingRecord {
    /// Create a record for an entity seen for the first time
    pub fn new(entity_id: EntityId, baseline: f64) -> Self {
        Self {
            entity_id,
            rating: baseline,
            initial_rating: baseline,
            matches_played: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            last_match_at: None,
            decay_settled_at: None,
            history: Vec::new(),
        }
    }

    /// Timestamp of the most recent history point (match or decay settlement)
    pub fn last_recorded_at(&self) -> Option<DateTime<Utc>> {
        self.history.last().map(|point| point.timestamp)
    }

    /// Set the rating and append a history point without counting a match
    pub fn push_point(&mut self, rating: f64, timestamp: DateTime<Utc>) {
        self.rating = rating;
        self.history.push(RatingPoint { timestamp, rating });
    }

    /// Set the rating and restart the inactivity clock at `timestamp`
    pub fn mark_seen(&mut self, rating: f64, timestamp: DateTime<Utc>) {
        self.push_point(rating, timestamp);
        self.last_match_at = Some(timestamp);
        self.decay_settled_at = None;
    }

    /// Apply the outcome of a rated match
    pub fn record_match(&mut self, rating: f64, timestamp: DateTime<Utc>, result: MatchResult) {
        self.mark_seen(rating, timestamp);
        self.matches_played += 1;
        match result {
            MatchResult::Win => self.wins += 1,
            MatchResult::Loss => self.losses += 1,
            MatchResult::Draw => self.draws += 1,
        }
    }

    /// Share of rated matches won, 0.0 before the first match
    pub fn win_rate(&self) -> f64 {
        if self.matches_played == 0 {
            return 0.0;
        }
        self.wins as f64 / self.matches_played as f64
    }

    /// Highest rating ever held
    pub fn peak_rating(&self) -> f64 {
        self.history
            .iter()
            .map(|point| point.rating)
            .fold(self.rating, f64::max)
    }

    /// Mean rating change over the last `window` history steps. The first
    /// step is measured from `initial_rating`.
    pub fn recent_form(&self, window: usize) -> f64 {
        if self.history.is_empty() || window == 0 {
            return 0.0;
        }

        let ratings: Vec<f64> = std::iter::once(self.initial_rating)
            .chain(self.history.iter().map(|point| point.rating))
            .collect();
        let start = ratings.len().saturating_sub(window + 1);
        let changes: Vec<f64> = ratings[start..]
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect();

        changes.iter().sum::<f64>() / changes.len() as f64
    }
}

/// Qualitative reading of a win probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    StrongFavoriteA,
    SlightFavoriteA,
    EvenMatch,
    SlightFavoriteB,
    StrongFavoriteB,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::StrongFavoriteA => write!(f, "A strong favorite"),
            Verdict::SlightFavoriteA => write!(f, "A slight favorite"),
            Verdict::EvenMatch => write!(f, "Even match"),
            Verdict::SlightFavoriteB => write!(f, "B slight favorite"),
            Verdict::StrongFavoriteB => write!(f, "B strong favorite"),
        }
    }
}

/// Pre-match prediction for a pairing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub entity_a: EntityId,
    pub entity_b: EntityId,
    pub win_probability_a: f64,
    pub win_probability_b: f64,
    /// Trust in the prediction, in [0, 1]
    pub confidence: f64,
    /// Rating of A minus rating of B
    pub rating_difference: f64,
    pub verdict: Verdict,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_entity_id_parsing() {
        let team: EntityId = "team:8599101".parse().unwrap();
        assert_eq!(team, EntityId::team("8599101"));
        assert_eq!(team.to_string(), "team:8599101");

        let player: EntityId = "Player:42".parse().unwrap();
        assert_eq!(player.kind, EntityKind::Player);

        assert!("coach:1".parse::<EntityId>().is_err());
        assert!("team:".parse::<EntityId>().is_err());
        assert!("8599101".parse::<EntityId>().is_err());
    }

    #[test]
    fn test_result_parsing_rejects_unknown_indicator() {
        assert_eq!("WIN".parse::<MatchResult>().unwrap(), MatchResult::Win);
        assert_eq!(" draw ".parse::<MatchResult>().unwrap(), MatchResult::Draw);

        let err = "radiant".parse::<MatchResult>().unwrap_err();
        assert!(matches!(err, RatingError::InvalidMatch { .. }));
    }

    #[test]
    fn test_match_outcome_json_shape() {
        let json = r#"{
            "entity_a": "team:1",
            "entity_b": "team:2",
            "result": "loss",
            "played_at": "2024-03-01T12:00:00Z",
            "tier": "ti",
            "experience_a": "established"
        }"#;

        let outcome: MatchOutcome = serde_json::from_str(json).unwrap();
        assert_eq!(outcome.result, MatchResult::Loss);
        assert_eq!(outcome.tier, "ti");
        assert_eq!(outcome.stage, "");
        assert_eq!(outcome.experience_a, ExperienceLevel::Established);
        assert_eq!(outcome.experience_b, ExperienceLevel::New);

        let bad = json.replace("\"loss\"", "\"radiant_win\"");
        assert!(serde_json::from_str::<MatchOutcome>(&bad).is_err());
    }

    #[test]
    fn test_validate_self_match_and_draws() {
        let a = EntityId::team("1");
        let self_match = MatchOutcome::new(a.clone(), a.clone(), MatchResult::Win, ts(1));
        assert!(self_match.validate(true).is_err());

        let draw = MatchOutcome::new(a, EntityId::team("2"), MatchResult::Draw, ts(1));
        assert!(draw.validate(false).is_err());
        assert!(draw.validate(true).is_ok());
    }

    #[test]
    fn test_record_match_updates_tallies() {
        let mut record = RatingRecord::new(EntityId::player("7"), 1500.0);
        record.decay_settled_at = Some(ts(1));

        record.record_match(1516.0, ts(2), MatchResult::Win);
        record.record_match(1500.0, ts(3), MatchResult::Loss);

        assert_eq!(record.matches_played, 2);
        assert_eq!(record.wins, 1);
        assert_eq!(record.losses, 1);
        assert_eq!(record.last_match_at, Some(ts(3)));
        assert_eq!(record.last_recorded_at(), Some(ts(3)));
        assert!(record.decay_settled_at.is_none());
        assert_eq!(record.peak_rating(), 1516.0);
        assert_eq!(record.win_rate(), 0.5);
    }

    #[test]
    fn test_recent_form() {
        let mut record = RatingRecord::new(EntityId::team("1"), 1500.0);
        assert_eq!(record.recent_form(10), 0.0);

        record.push_point(1510.0, ts(1));
        record.push_point(1530.0, ts(2));
        record.push_point(1520.0, ts(3));

        // (10 + 20 - 10) / 3, starting from the initial rating
        assert!((record.recent_form(10) - 20.0 / 3.0).abs() < 1e-9);
        // Only the last step
        assert!((record.recent_form(1) + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_recent_form_after_first_match() {
        let mut record = RatingRecord::new(EntityId::player("9"), 1500.0);
        record.record_match(1516.0, ts(1), MatchResult::Win);

        assert_eq!(record.initial_rating, 1500.0);
        assert!((record.recent_form(5) - 16.0).abs() < 1e-9);
    }
}
