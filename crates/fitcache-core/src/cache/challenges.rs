use std::sync::Arc;

use futures::future;
use serde::Serialize;
use tracing::debug;

use crate::api::{ApiError, ApiResult};
use crate::models::{ChallengeProgress, ChallengeSummary};

use super::fetcher::ChallengesFetcher;
use super::store::{Lookup, ReadThroughCache};

/// Everything the challenges screen shows, combined from three backend calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChallengesSnapshot {
    pub challenges: Vec<ChallengeSummary>,
    pub active_challenge_id: Option<String>,
    pub completed_today: bool,
    pub progress: Option<ChallengeProgress>,
    /// Set when the progress call failed; shown non-fatally.
    pub progress_error: Option<String>,
}

impl ChallengesSnapshot {
    pub fn active_challenge(&self) -> Option<&ChallengeSummary> {
        let id = self.active_challenge_id.as_deref()?;
        self.challenges.iter().find(|c| c.id == id)
    }
}

/// Challenge list plus the user's progress, cached for the process lifetime.
pub struct ChallengesCache {
    inner: ReadThroughCache<(), ChallengesSnapshot>,
}

impl Default for ChallengesCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ChallengesCache {
    pub fn new() -> Self {
        Self {
            inner: ReadThroughCache::new("challenges"),
        }
    }

    pub fn snapshot(&self) -> Option<Arc<ChallengesSnapshot>> {
        self.inner.snapshot(&())
    }

    pub fn put(&self, snapshot: ChallengesSnapshot) -> Arc<ChallengesSnapshot> {
        self.inner.put((), snapshot)
    }

    pub fn clear(&self) {
        self.inner.clear(&());
    }

    pub fn age_display(&self) -> String {
        self.inner.age_display(&())
    }

    pub async fn get_or_fetch<F>(
        &self,
        fetcher: &F,
        user_id: &str,
        force: bool,
    ) -> ApiResult<Arc<ChallengesSnapshot>>
    where
        F: ChallengesFetcher + ?Sized,
    {
        self.lookup(fetcher, user_id, force).await.map(|l| l.value)
    }

    /// The challenge list decides success. Progress and the completed-today
    /// flag fall back to the previous snapshot, or to their defaults on a
    /// cold cache, when their own calls fail.
    pub async fn lookup<F>(
        &self,
        fetcher: &F,
        user_id: &str,
        force: bool,
    ) -> ApiResult<Lookup<ChallengesSnapshot>>
    where
        F: ChallengesFetcher + ?Sized,
    {
        let inner = &self.inner;
        self.inner
            .lookup((), force, move || async move {
                let challenges = fetcher.get_challenges().await?;
                let previous = inner.snapshot(&());

                let (progress, completed) = future::join(
                    fetcher.get_user_challenge_progress(user_id),
                    fetcher.has_completed_today(user_id),
                )
                .await;

                let mut snapshot = ChallengesSnapshot {
                    challenges,
                    ..Default::default()
                };

                match progress {
                    Ok(progress) => {
                        snapshot.active_challenge_id = progress.active_challenge_id.clone();
                        snapshot.progress = Some(progress);
                    }
                    Err(e) => {
                        debug!(error = %e, kind = e.kind(), "Challenge progress fetch failed, using previous value");
                        if let Some(prev) = previous.as_deref() {
                            snapshot.active_challenge_id = prev.active_challenge_id.clone();
                            snapshot.progress = prev.progress.clone();
                        }
                        snapshot.progress_error = Some(e.user_message().to_string());
                    }
                }

                match completed {
                    Ok(done) => snapshot.completed_today = done,
                    Err(e) => {
                        debug!(error = %e, kind = e.kind(), "Completed-today fetch failed, using previous value");
                        snapshot.completed_today =
                            previous.as_deref().map(|p| p.completed_today).unwrap_or(false);
                    }
                }

                Ok::<_, ApiError>(snapshot)
            })
            .await
    }
}
