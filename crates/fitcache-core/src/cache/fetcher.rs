//! Capabilities the caches need from the network layer.
//!
//! `ApiClient` implements all three; tests supply their own doubles.

use async_trait::async_trait;

use crate::api::ApiResult;
use crate::models::{
    ChallengeProgress, ChallengeSummary, FoodDiaryMonth, HealthSnapshot, ProgramDocument,
    UserChallenge,
};

#[async_trait]
pub trait ChallengesFetcher: Send + Sync {
    async fn get_challenges(&self) -> ApiResult<Vec<ChallengeSummary>>;

    async fn get_user_challenge_progress(&self, user_id: &str) -> ApiResult<ChallengeProgress>;

    async fn has_completed_today(&self, user_id: &str) -> ApiResult<bool>;
}

#[async_trait]
pub trait MealFetcher: Send + Sync {
    async fn get_food_diary_month(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> ApiResult<FoodDiaryMonth>;

    async fn get_health_snapshot(&self, user_id: &str) -> ApiResult<HealthSnapshot>;
}

#[async_trait]
pub trait WorkoutFetcher: Send + Sync {
    async fn get_user_program(&self) -> ApiResult<ProgramDocument>;

    /// The challenge attached to the program. `Ok(None)` means the user has none.
    async fn get_user_challenge_or_null(&self) -> ApiResult<Option<UserChallenge>>;
}
