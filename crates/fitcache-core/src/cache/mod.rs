//! In-memory caching of network responses.
//!
//! This module provides `ReadThroughCache`, a keyed read-through cache with
//! force-refresh and stale-on-error fallback, and the three domain caches
//! built on it:
//! - `ChallengesCache`: challenge list, user progress, completed-today flag
//! - `MealCache`: food diary documents keyed by month, with health numbers
//! - `WorkoutCache`: the user's program and its attached challenge
//!
//! Nothing is persisted. `AppCaches` bundles one instance of each so the
//! composition root can build them once and clear them on sign-out.

pub mod challenges;
pub mod fetcher;
pub mod meals;
pub mod store;
pub mod workout;

pub use challenges::{ChallengesCache, ChallengesSnapshot};
pub use fetcher::{ChallengesFetcher, MealFetcher, WorkoutFetcher};
pub use meals::{MealCache, MealMonth, MonthKey};
pub use store::{Cached, Lookup, ReadThroughCache, Source};
pub use workout::{WorkoutCache, WorkoutSnapshot};

use tracing::info;

/// One cache per domain, shared by every screen in the process.
#[derive(Default)]
pub struct AppCaches {
    pub challenges: ChallengesCache,
    pub meals: MealCache,
    pub workout: WorkoutCache,
}

impl AppCaches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything, e.g. when the user signs out.
    pub fn clear_all(&self) {
        info!("Clearing all cached data");
        self.challenges.clear();
        self.meals.clear();
        self.workout.clear();
    }

    /// Last-updated labels for the dashboard footer.
    pub fn ages(&self) -> CacheAges {
        let month = MonthKey::current();
        CacheAges {
            challenges: self.challenges.age_display(),
            meals: self.meals.age_display(month.year, month.month),
            workout: self.workout.age_display(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheAges {
    pub challenges: String,
    pub meals: String,
    pub workout: String,
}
