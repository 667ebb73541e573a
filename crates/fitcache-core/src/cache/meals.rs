use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{ApiError, ApiResult};
use crate::calc::remaining_calories;
use crate::models::{FoodDiaryMonth, HealthSnapshot};
use crate::utils::month_label;

use super::fetcher::MealFetcher;
use super::store::{Lookup, ReadThroughCache};

/// Calendar month used to key the diary cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    pub fn current() -> Self {
        Self::from_date(Utc::now().date_naive())
    }

    pub fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month)
    }

    pub fn prev(&self) -> Self {
        if self.month <= 1 {
            Self::new(self.year - 1, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }

    pub fn next(&self) -> Self {
        if self.month >= 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    pub fn label(&self) -> String {
        month_label(self.year, self.month)
    }
}

/// A month of the diary with the health numbers fetched alongside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealMonth {
    pub diary: FoodDiaryMonth,
    pub health: HealthSnapshot,
    /// Set when the health call failed; shown non-fatally.
    pub health_error: Option<String>,
}

impl MealMonth {
    pub fn new(diary: FoodDiaryMonth) -> Self {
        Self {
            diary,
            health: HealthSnapshot::default(),
            health_error: None,
        }
    }

    pub fn key(&self) -> MonthKey {
        MonthKey::new(self.diary.year, self.diary.month)
    }

    /// Calories left on `date` given the goal, what was eaten and what was burned.
    pub fn remaining_on(&self, date: NaiveDate) -> i64 {
        let eaten = self.diary.day(date).map(|d| d.total_calories()).unwrap_or(0);
        remaining_calories(
            self.health.goal_calories,
            eaten,
            self.health.calories_burned,
        )
    }
}

/// Food diary documents keyed by month, cached for the process lifetime.
///
/// Each month has its own fetch lock, so loading February never waits on
/// a slow January.
pub struct MealCache {
    inner: ReadThroughCache<MonthKey, MealMonth>,
}

impl Default for MealCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MealCache {
    pub fn new() -> Self {
        Self {
            inner: ReadThroughCache::new("meals"),
        }
    }

    pub fn snapshot_month(&self, year: i32, month: u32) -> Option<Arc<MealMonth>> {
        self.inner.snapshot(&MonthKey::new(year, month))
    }

    /// Prime the cache, e.g. after logging a meal when the new month is known.
    pub fn put_month(&self, entry: MealMonth) -> Arc<MealMonth> {
        self.inner.put(entry.key(), entry)
    }

    pub fn clear_month(&self, year: i32, month: u32) {
        self.inner.clear(&MonthKey::new(year, month));
    }

    pub fn clear(&self) {
        self.inner.clear_all();
    }

    pub fn cached_months(&self) -> usize {
        self.inner.len()
    }

    pub fn age_display(&self, year: i32, month: u32) -> String {
        self.inner.age_display(&MonthKey::new(year, month))
    }

    pub async fn get_or_fetch_month<F>(
        &self,
        fetcher: &F,
        user_id: &str,
        year: i32,
        month: u32,
        force: bool,
    ) -> ApiResult<Arc<MealMonth>>
    where
        F: MealFetcher + ?Sized,
    {
        self.lookup_month(fetcher, user_id, year, month, force)
            .await
            .map(|l| l.value)
    }

    /// The diary call decides success; a failed health call falls back to
    /// the previous value for this month or to zeros.
    pub async fn lookup_month<F>(
        &self,
        fetcher: &F,
        user_id: &str,
        year: i32,
        month: u32,
        force: bool,
    ) -> ApiResult<Lookup<MealMonth>>
    where
        F: MealFetcher + ?Sized,
    {
        let key = MonthKey::new(year, month);
        let inner = &self.inner;
        self.inner
            .lookup(key, force, move || async move {
                let diary = fetcher.get_food_diary_month(user_id, year, month).await?;
                let mut entry = MealMonth::new(diary);

                match fetcher.get_health_snapshot(user_id).await {
                    Ok(health) => entry.health = health,
                    Err(e) => {
                        debug!(error = %e, kind = e.kind(), year, month, "Health snapshot fetch failed, using previous value");
                        if let Some(prev) = inner.snapshot(&key) {
                            entry.health = prev.health;
                        }
                        entry.health_error = Some(e.user_message().to_string());
                    }
                }

                Ok::<_, ApiError>(entry)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DiaryDay, MealEntry, MealType};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeDiary {
        diary_calls: AtomicUsize,
        diary_error: Mutex<Option<ApiError>>,
        health: Mutex<ApiResult<HealthSnapshot>>,
    }

    impl FakeDiary {
        fn new() -> Self {
            Self {
                diary_calls: AtomicUsize::new(0),
                diary_error: Mutex::new(None),
                health: Mutex::new(Ok(HealthSnapshot {
                    goal_calories: 2000,
                    calories_burned: 300,
                })),
            }
        }

        fn calls(&self) -> usize {
            self.diary_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MealFetcher for FakeDiary {
        async fn get_food_diary_month(
            &self,
            _user_id: &str,
            year: i32,
            month: u32,
        ) -> ApiResult<FoodDiaryMonth> {
            self.diary_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.diary_error.lock().unwrap().clone() {
                return Err(err);
            }
            Ok(FoodDiaryMonth {
                year,
                month,
                days: vec![DiaryDay {
                    date: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
                    meals: vec![MealEntry {
                        id: "m1".to_string(),
                        name: "Porridge".to_string(),
                        meal_type: MealType::Breakfast,
                        calories: 400,
                        protein_g: 12.0,
                        carbs_g: 60.0,
                        fat_g: 8.0,
                    }],
                }],
            })
        }

        async fn get_health_snapshot(&self, _user_id: &str) -> ApiResult<HealthSnapshot> {
            self.health.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn test_cold_month_fetches_once_then_hits() {
        let cache = MealCache::new();
        let fetcher = FakeDiary::new();

        let first = cache
            .get_or_fetch_month(&fetcher, "u1", 2025, 1, false)
            .await
            .unwrap();
        let second = cache
            .get_or_fetch_month(&fetcher, "u1", 2025, 1, false)
            .await
            .unwrap();

        assert_eq!(first.diary.year, 2025);
        assert_eq!(first.diary.month, 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_months_are_isolated() {
        let cache = MealCache::new();
        let fetcher = FakeDiary::new();

        cache
            .get_or_fetch_month(&fetcher, "u1", 2025, 1, false)
            .await
            .unwrap();

        assert!(cache.snapshot_month(2025, 1).is_some());
        assert!(cache.snapshot_month(2025, 2).is_none());
        assert_eq!(cache.age_display(2025, 2), "never");
    }

    #[tokio::test]
    async fn test_stale_month_on_error() {
        let cache = MealCache::new();
        let fetcher = FakeDiary::new();
        let primed = cache.put_month(MealMonth::new(FoodDiaryMonth::empty(2025, 3)));

        *fetcher.diary_error.lock().unwrap() = Some(ApiError::Server("down".into()));
        let month = cache
            .get_or_fetch_month(&fetcher, "u1", 2025, 3, true)
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&month, &primed));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_cold_month_error_propagates() {
        let cache = MealCache::new();
        let fetcher = FakeDiary::new();
        *fetcher.diary_error.lock().unwrap() = Some(ApiError::Unauthorized);

        let err = cache
            .get_or_fetch_month(&fetcher, "u1", 2025, 4, false)
            .await
            .unwrap_err();

        assert_eq!(err, ApiError::Unauthorized);
        assert_eq!(cache.cached_months(), 0);
    }

    #[tokio::test]
    async fn test_health_failure_keeps_previous_health() {
        let cache = MealCache::new();
        let fetcher = FakeDiary::new();
        cache
            .get_or_fetch_month(&fetcher, "u1", 2025, 1, false)
            .await
            .unwrap();

        *fetcher.health.lock().unwrap() = Err(ApiError::NoConnectivity("offline".into()));
        let month = cache
            .get_or_fetch_month(&fetcher, "u1", 2025, 1, true)
            .await
            .unwrap();

        assert_eq!(month.health.goal_calories, 2000);
        assert!(month.health_error.is_some());
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_health_failure_on_cold_month_defaults_to_zero() {
        let cache = MealCache::new();
        let fetcher = FakeDiary::new();
        *fetcher.health.lock().unwrap() = Err(ApiError::Server("down".into()));

        let month = cache
            .get_or_fetch_month(&fetcher, "u1", 2025, 6, false)
            .await
            .unwrap();

        assert_eq!(month.health, HealthSnapshot::default());
        assert_eq!(month.diary.days.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_month_and_clear_all() {
        let cache = MealCache::new();
        let fetcher = FakeDiary::new();
        for month in 1..=3 {
            cache
                .get_or_fetch_month(&fetcher, "u1", 2025, month, false)
                .await
                .unwrap();
        }

        cache.clear_month(2025, 2);
        assert!(cache.snapshot_month(2025, 2).is_none());
        assert_eq!(cache.cached_months(), 2);

        cache.clear();
        assert_eq!(cache.cached_months(), 0);

        cache
            .get_or_fetch_month(&fetcher, "u1", 2025, 1, false)
            .await
            .unwrap();
        assert_eq!(fetcher.calls(), 4);
    }

    #[tokio::test]
    async fn test_remaining_calories() {
        let cache = MealCache::new();
        let fetcher = FakeDiary::new();
        let month = cache
            .get_or_fetch_month(&fetcher, "u1", 2025, 1, false)
            .await
            .unwrap();

        let first = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let second = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(month.remaining_on(first), 2000 - 400 + 300);
        assert_eq!(month.remaining_on(second), 2300);
    }

    #[test]
    fn test_remaining_on_huge_day_does_not_overflow() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let meal = |id: &str, calories: u32| MealEntry {
            id: id.to_string(),
            name: id.to_string(),
            meal_type: MealType::Snack,
            calories,
            protein_g: 0.0,
            carbs_g: 0.0,
            fat_g: 0.0,
        };
        let mut month = MealMonth::new(FoodDiaryMonth {
            year: 2025,
            month: 1,
            days: vec![DiaryDay {
                date,
                meals: vec![meal("a", u32::MAX), meal("b", 1)],
            }],
        });
        month.health.goal_calories = 2000;

        assert_eq!(month.remaining_on(date), 2000 - i64::from(u32::MAX));
    }

    #[test]
    fn test_month_key_navigation() {
        let jan = MonthKey::new(2025, 1);
        assert_eq!(jan.prev(), MonthKey::new(2024, 12));
        assert_eq!(jan.next(), MonthKey::new(2025, 2));
        assert_eq!(MonthKey::new(2024, 12).next(), jan);
        assert_eq!(jan.label(), "January 2025");
        assert!(jan.is_valid());
        assert!(!MonthKey::new(2025, 13).is_valid());
    }
}
