//! Core types for the drill scheduler.

use crate::error::{DrillError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Learning phase of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionState {
    New,
    Learning,
    Reviewing,
}

impl Default for QuestionState {
    fn default() -> Self {
        Self::New
    }
}

impl QuestionState {
    pub const ALL: [QuestionState; 3] = [Self::New, Self::Learning, Self::Reviewing];

    /// Single-character storage code.
    pub fn code(self) -> char {
        match self {
            Self::New => 'N',
            Self::Learning => 'L',
            Self::Reviewing => 'R',
        }
    }

    /// Parse a storage code.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'N' => Some(Self::New),
            'L' => Some(Self::Learning),
            'R' => Some(Self::Reviewing),
            _ => None,
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Learning => "Learning",
            Self::Reviewing => "Reviewing",
        }
    }
}

impl fmt::Display for QuestionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for QuestionState {
    type Err = DrillError;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                Self::from_code(c).ok_or_else(|| DrillError::InvalidStateCode(s.to_string()))
            }
            _ => Err(DrillError::InvalidStateCode(s.to_string())),
        }
    }
}

/// Map a stored state code to its display name.
///
/// Unknown codes have no name.
pub fn get_state_name(code: &str) -> Option<&'static str> {
    code.parse::<QuestionState>().ok().map(QuestionState::name)
}

/// Self-reported recall quality for one review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    /// Forgot completely.
    Again,
    /// Recalled with significant difficulty.
    Hard,
    /// Recalled with normal effort.
    Good,
    /// Recalled effortlessly.
    Easy,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Self::Again, Self::Hard, Self::Good, Self::Easy];

    /// Label used on the wire and in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Again => "again",
            Self::Hard => "hard",
            Self::Good => "good",
            Self::Easy => "easy",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = DrillError;

    /// Exact, case-sensitive match on the four labels.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "again" => Ok(Self::Again),
            "hard" => Ok(Self::Hard),
            "good" => Ok(Self::Good),
            "easy" => Ok(Self::Easy),
            _ => Err(DrillError::InvalidRating(s.to_string())),
        }
    }
}

/// Scheduling state of a single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub state: QuestionState,
    /// 1-based step number into `LEARNING_STEPS`.
    pub learning_step: u32,
    #[serde(rename = "interval_ms", with = "duration_ms")]
    pub interval: Duration,
    pub efactor: f64,
    pub times_failed: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_reviewed: Option<DateTime<Utc>>,
}

impl Default for ReviewItem {
    fn default() -> Self {
        Self {
            state: QuestionState::New,
            learning_step: crate::scheduler::LEARNING_STEPS[0],
            interval: crate::scheduler::learning_interval(),
            efactor: crate::scheduler::EFACTOR_DEFAULT,
            times_failed: 0,
            last_reviewed: None,
        }
    }
}

/// `at + interval`, saturating at the latest representable time.
pub(crate) fn add_interval(at: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    at.checked_add_signed(interval)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl ReviewItem {
    /// When the item next comes due, if it has ever been reviewed.
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.last_reviewed
            .map(|reviewed| add_interval(reviewed, self.interval))
    }

    /// Never-reviewed items are always due.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.due_at() {
            Some(due) => due <= now,
            None => true,
        }
    }
}

/// Serialize a `chrono::Duration` as whole milliseconds.
pub mod duration_ms {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_milliseconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = i64::deserialize(deserializer)?;
        Duration::try_milliseconds(ms)
            .ok_or_else(|| serde::de::Error::custom(format!("interval out of range: {ms}ms")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_state_codes() {
        for state in QuestionState::ALL {
            assert_eq!(QuestionState::from_code(state.code()), Some(state));
        }
        assert_eq!(QuestionState::from_code('X'), None);
    }

    #[test]
    fn test_get_state_name() {
        assert_eq!(get_state_name("N"), Some("New"));
        assert_eq!(get_state_name("L"), Some("Learning"));
        assert_eq!(get_state_name("R"), Some("Reviewing"));
        assert_eq!(get_state_name("X"), None);
        assert_eq!(get_state_name(""), None);
        assert_eq!(get_state_name("NL"), None);
    }

    #[test]
    fn test_rating_parse_exact() {
        assert_eq!("again".parse::<Rating>(), Ok(Rating::Again));
        assert_eq!("hard".parse::<Rating>(), Ok(Rating::Hard));
        assert_eq!("good".parse::<Rating>(), Ok(Rating::Good));
        assert_eq!("easy".parse::<Rating>(), Ok(Rating::Easy));
    }

    #[test]
    fn test_rating_parse_rejects_other_labels() {
        for label in ["Good", "EASY", " good", "fine", ""] {
            assert_eq!(
                label.parse::<Rating>(),
                Err(DrillError::InvalidRating(label.to_string()))
            );
        }
    }

    #[test]
    fn test_rating_label_roundtrip() {
        for rating in Rating::ALL {
            assert_eq!(rating.as_str().parse::<Rating>(), Ok(rating));
        }
    }

    #[test]
    fn test_default_item() {
        let item = ReviewItem::default();
        assert_eq!(item.state, QuestionState::New);
        assert_eq!(item.learning_step, 1);
        assert_eq!(item.efactor, 2.5);
        assert_eq!(item.times_failed, 0);
        assert_eq!(item.last_reviewed, None);
        assert_eq!(item.due_at(), None);
    }

    #[test]
    fn test_is_due() {
        let reviewed = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let item = ReviewItem {
            last_reviewed: Some(reviewed),
            interval: Duration::days(2),
            ..Default::default()
        };

        assert!(!item.is_due(reviewed + Duration::days(1)));
        assert!(item.is_due(reviewed + Duration::days(2)));
        assert!(item.is_due(reviewed + Duration::days(3)));
        assert!(ReviewItem::default().is_due(reviewed));
    }

    #[test]
    fn test_item_serializes_interval_as_millis() {
        let item = ReviewItem::default();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["interval_ms"], 86_400_000);
        assert_eq!(json["state"], "new");
        assert!(json.get("last_reviewed").is_none());

        let back: ReviewItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }
}
