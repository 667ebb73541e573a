//! API client for the fitness backend.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! requests for challenges, the food diary, health numbers and the workout
//! program. It implements the fetcher traits the caches consume.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use reqwest::{header, Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::{ChallengesFetcher, MealFetcher, WorkoutFetcher};
use crate::models::{
    ChallengeProgress, ChallengeSummary, FoodDiaryMonth, HealthSnapshot, MealEntry,
    ProgramDocument, UserChallenge,
};

use super::{ApiError, ApiResult};

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Debug, Deserialize)]
struct CompletedTodayResponse {
    completed: bool,
}

#[derive(Debug, Serialize)]
struct NewMealRequest<'a> {
    date: NaiveDate,
    #[serde(flatten)]
    entry: &'a MealEntry,
}

/// API client for the fitness backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> ApiResult<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::Unauthorized)?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> ApiResult<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, url: &str) -> ApiResult<T> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!(url = url, error = %e, "Failed to parse JSON response");
            ApiError::Serialization(format!("{}: {}", url, e))
        })
    }

    /// Send a request built by `build`, retrying with exponential backoff
    /// while the server answers 429.
    async fn send_with_retry<B>(&self, url: &str, build: B) -> ApiResult<Response>
    where
        B: Fn() -> reqwest::RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = build().headers(self.auth_headers()?).send().await?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            retries += 1;
            if retries > MAX_RATE_LIMIT_RETRIES {
                return Err(ApiError::Unknown(
                    "Rate limited - please wait before retrying".to_string(),
                ));
            }
            warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            backoff_ms *= 2; // Exponential backoff
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.url(path);
        let response = self.send_with_retry(&url, || self.client.get(&url)).await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response, &url).await
    }

    /// GET where 404 or a JSON `null` body mean "nothing there".
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Option<T>> {
        let url = self.url(path);
        let response = self.send_with_retry(&url, || self.client.get(&url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check_response(response).await?;
        Self::parse_json(response, &url).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResult<T> {
        let url = self.url(path);
        let response = self
            .send_with_retry(&url, || self.client.post(&url).json(body))
            .await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response, &url).await
    }

    async fn post_empty(&self, path: &str) -> ApiResult<()> {
        let url = self.url(path);
        let response = self.send_with_retry(&url, || self.client.post(&url)).await?;
        Self::check_response(response).await?;
        Ok(())
    }

    // ===== Writes =====

    /// Log a meal and return the updated month document.
    pub async fn add_meal(
        &self,
        user_id: &str,
        date: NaiveDate,
        entry: &MealEntry,
    ) -> ApiResult<FoodDiaryMonth> {
        let path = format!(
            "/users/{}/diary/{}/{}/meals",
            user_id,
            date.year(),
            date.month()
        );
        let month: FoodDiaryMonth = self.post(&path, &NewMealRequest { date, entry }).await?;
        debug!(user_id, %date, meal = %entry.name, "Meal logged");
        Ok(month)
    }

    pub async fn join_challenge(&self, challenge_id: &str) -> ApiResult<()> {
        self.post_empty(&format!("/challenges/{}/join", challenge_id))
            .await?;
        debug!(challenge_id, "Joined challenge");
        Ok(())
    }
}

#[async_trait]
impl ChallengesFetcher for ApiClient {
    async fn get_challenges(&self) -> ApiResult<Vec<ChallengeSummary>> {
        let challenges: Vec<ChallengeSummary> = self.get("/challenges").await?;
        debug!(count = challenges.len(), "Challenges fetched");
        Ok(challenges)
    }

    async fn get_user_challenge_progress(&self, user_id: &str) -> ApiResult<ChallengeProgress> {
        self.get(&format!("/users/{}/challenges/progress", user_id))
            .await
    }

    async fn has_completed_today(&self, user_id: &str) -> ApiResult<bool> {
        let response: CompletedTodayResponse = self
            .get(&format!("/users/{}/challenges/today", user_id))
            .await?;
        Ok(response.completed)
    }
}

#[async_trait]
impl MealFetcher for ApiClient {
    async fn get_food_diary_month(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> ApiResult<FoodDiaryMonth> {
        let diary: FoodDiaryMonth = self
            .get(&format!("/users/{}/diary/{}/{}", user_id, year, month))
            .await?;
        debug!(year, month, days = diary.days.len(), "Diary month fetched");
        Ok(diary)
    }

    async fn get_health_snapshot(&self, user_id: &str) -> ApiResult<HealthSnapshot> {
        self.get(&format!("/users/{}/health", user_id)).await
    }
}

#[async_trait]
impl WorkoutFetcher for ApiClient {
    async fn get_user_program(&self) -> ApiResult<ProgramDocument> {
        self.get("/me/program").await
    }

    async fn get_user_challenge_or_null(&self) -> ApiResult<Option<UserChallenge>> {
        self.get_optional("/me/challenge").await
    }
}
