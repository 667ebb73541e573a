use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::api::{ApiError, ApiResult};
use crate::models::{ProgramDocument, UserChallenge};

use super::fetcher::WorkoutFetcher;
use super::store::{Lookup, ReadThroughCache};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutSnapshot {
    pub program: ProgramDocument,
    pub challenge: Option<UserChallenge>,
}

/// The user's workout program, cached for the process lifetime.
pub struct WorkoutCache {
    inner: ReadThroughCache<(), WorkoutSnapshot>,
}

impl Default for WorkoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkoutCache {
    pub fn new() -> Self {
        Self {
            inner: ReadThroughCache::new("workout"),
        }
    }

    pub fn snapshot(&self) -> Option<Arc<WorkoutSnapshot>> {
        self.inner.snapshot(&())
    }

    pub fn put(&self, snapshot: WorkoutSnapshot) -> Arc<WorkoutSnapshot> {
        self.inner.put((), snapshot)
    }

    pub fn clear(&self) {
        self.inner.clear(&());
    }

    pub fn age_display(&self) -> String {
        self.inner.age_display(&())
    }

    pub async fn get_or_fetch<F>(&self, fetcher: &F, force: bool) -> ApiResult<Arc<WorkoutSnapshot>>
    where
        F: WorkoutFetcher + ?Sized,
    {
        self.lookup(fetcher, force).await.map(|l| l.value)
    }

    /// The program call decides success. The attached challenge is best
    /// effort: a failed call keeps whatever challenge was cached before.
    pub async fn lookup<F>(&self, fetcher: &F, force: bool) -> ApiResult<Lookup<WorkoutSnapshot>>
    where
        F: WorkoutFetcher + ?Sized,
    {
        let inner = &self.inner;
        self.inner
            .lookup((), force, move || async move {
                let program = fetcher.get_user_program().await?;

                let challenge = match fetcher.get_user_challenge_or_null().await {
                    Ok(challenge) => challenge,
                    Err(e) => {
                        debug!(error = %e, kind = e.kind(), "User challenge fetch failed, keeping previous value");
                        inner.snapshot(&()).and_then(|prev| prev.challenge.clone())
                    }
                };

                Ok::<_, ApiError>(WorkoutSnapshot { program, challenge })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeProgram {
        program: Mutex<ApiResult<ProgramDocument>>,
        challenge: Mutex<ApiResult<Option<UserChallenge>>>,
        program_calls: AtomicUsize,
    }

    impl FakeProgram {
        fn new() -> Self {
            Self {
                program: Mutex::new(Ok(program("p1"))),
                challenge: Mutex::new(Ok(Some(user_challenge()))),
                program_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl WorkoutFetcher for FakeProgram {
        async fn get_user_program(&self) -> ApiResult<ProgramDocument> {
            self.program_calls.fetch_add(1, Ordering::SeqCst);
            self.program.lock().unwrap().clone()
        }

        async fn get_user_challenge_or_null(&self) -> ApiResult<Option<UserChallenge>> {
            self.challenge.lock().unwrap().clone()
        }
    }

    fn program(id: &str) -> ProgramDocument {
        ProgramDocument {
            id: id.to_string(),
            name: "Couch to 5k".to_string(),
            weeks: Vec::new(),
        }
    }

    fn user_challenge() -> UserChallenge {
        UserChallenge {
            challenge_id: "c1".to_string(),
            title: "30 days of running".to_string(),
            joined_at: Utc::now(),
            current_day: 4,
        }
    }

    #[tokio::test]
    async fn test_fetches_program_and_challenge() {
        let cache = WorkoutCache::new();
        let fetcher = FakeProgram::new();

        let snapshot = cache.get_or_fetch(&fetcher, false).await.unwrap();

        assert_eq!(snapshot.program.id, "p1");
        assert_eq!(snapshot.challenge.as_ref().unwrap().current_day, 4);

        cache.get_or_fetch(&fetcher, false).await.unwrap();
        assert_eq!(fetcher.program_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_challenge_error_keeps_previous_challenge() {
        let cache = WorkoutCache::new();
        let fetcher = FakeProgram::new();
        cache.get_or_fetch(&fetcher, false).await.unwrap();

        *fetcher.program.lock().unwrap() = Ok(program("p2"));
        *fetcher.challenge.lock().unwrap() = Err(ApiError::Server("down".into()));
        let snapshot = cache.get_or_fetch(&fetcher, true).await.unwrap();

        assert_eq!(snapshot.program.id, "p2");
        assert_eq!(snapshot.challenge.as_ref().unwrap().challenge_id, "c1");
    }

    #[tokio::test]
    async fn test_challenge_none_replaces_previous_challenge() {
        let cache = WorkoutCache::new();
        let fetcher = FakeProgram::new();
        cache.get_or_fetch(&fetcher, false).await.unwrap();

        *fetcher.challenge.lock().unwrap() = Ok(None);
        let snapshot = cache.get_or_fetch(&fetcher, true).await.unwrap();

        assert!(snapshot.challenge.is_none());
    }

    #[tokio::test]
    async fn test_program_error_serves_stale_or_propagates() {
        let cache = WorkoutCache::new();
        let fetcher = FakeProgram::new();
        *fetcher.program.lock().unwrap() = Err(ApiError::Serialization("bad json".into()));

        let err = cache.get_or_fetch(&fetcher, false).await.unwrap_err();
        assert_eq!(err, ApiError::Serialization("bad json".into()));

        let primed = cache.put(WorkoutSnapshot {
            program: program("cached"),
            challenge: None,
        });
        let lookup = cache.lookup(&fetcher, true).await.unwrap();
        assert!(lookup.is_stale());
        assert!(Arc::ptr_eq(&lookup.value, &primed));

        cache.clear();
        assert!(cache.snapshot().is_none());
    }
}
