use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::format_date_range;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
    #[serde(rename = "endDate")]
    pub end_date: NaiveDate,
    #[serde(rename = "participantCount", default)]
    pub participant_count: u32,
    #[serde(default)]
    pub category: Option<String>,
}

impl ChallengeSummary {
    /// Human label for the challenge window, e.g. "Jan 5 - 11, 2025"
    pub fn date_label(&self) -> String {
        format_date_range(self.start_date, self.end_date)
    }

    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Total length of the challenge in days, inclusive of both ends.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// A user's standing across community challenges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeProgress {
    #[serde(rename = "activeChallengeId", default)]
    pub active_challenge_id: Option<String>,
    #[serde(rename = "daysCompleted", default)]
    pub days_completed: u32,
    #[serde(rename = "currentStreak", default)]
    pub current_streak: u32,
}

/// The challenge attached to the user's workout program, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserChallenge {
    #[serde(rename = "challengeId")]
    pub challenge_id: String,
    pub title: String,
    #[serde(rename = "joinedAt")]
    pub joined_at: DateTime<Utc>,
    #[serde(rename = "currentDay", default)]
    pub current_day: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(start: (i32, u32, u32), end: (i32, u32, u32)) -> ChallengeSummary {
        ChallengeSummary {
            id: "c1".to_string(),
            title: "Step it up".to_string(),
            description: None,
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            participant_count: 12,
            category: None,
        }
    }

    #[test]
    fn test_duration_is_inclusive() {
        assert_eq!(summary((2025, 1, 5), (2025, 1, 11)).duration_days(), 7);
    }

    #[test]
    fn test_is_active_on_edges() {
        let c = summary((2025, 1, 5), (2025, 1, 11));
        assert!(c.is_active_on(NaiveDate::from_ymd_opt(2025, 1, 5).unwrap()));
        assert!(c.is_active_on(NaiveDate::from_ymd_opt(2025, 1, 11).unwrap()));
        assert!(!c.is_active_on(NaiveDate::from_ymd_opt(2025, 1, 12).unwrap()));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{"id":"c9","title":"Hydrate","startDate":"2025-02-01","endDate":"2025-02-28"}"#;
        let c: ChallengeSummary = serde_json::from_str(json).unwrap();
        assert_eq!(c.participant_count, 0);
        assert_eq!(c.date_label(), "Feb 1 - 28, 2025");
    }

    #[test]
    fn test_progress_default_has_no_active_challenge() {
        let progress = ChallengeProgress::default();
        assert!(progress.active_challenge_id.is_none());
        assert_eq!(progress.current_streak, 0);
    }
}
