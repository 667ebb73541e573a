//! Data models for fitness-tracking entities.
//!
//! This module contains the payloads the caches hold:
//!
//! - `ChallengeSummary`, `ChallengeProgress`, `UserChallenge`: community challenges
//! - `FoodDiaryMonth`, `DiaryDay`, `MealEntry`: the meal diary, one document per month
//! - `HealthSnapshot`: calorie goal and calories burned
//! - `ProgramDocument` and friends: the user's workout program

pub mod challenge;
pub mod diary;
pub mod health;
pub mod workout;

pub use challenge::{ChallengeProgress, ChallengeSummary, UserChallenge};
pub use diary::{DiaryDay, FoodDiaryMonth, MealEntry, MealType};
pub use health::HealthSnapshot;
pub use workout::{Exercise, ProgramDocument, ProgramWeek, Workout};
