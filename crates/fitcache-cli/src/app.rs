//! Application state for the fitcache CLI.
//!
//! `App` is the composition root: it owns the configuration, the session,
//! one `ApiClient` and one `AppCaches`, and every command goes through it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use fitcache_core::api::{ApiClient, ApiError};
use fitcache_core::auth::{CredentialStore, Session, SessionData, TokenStore};
use fitcache_core::cache::{
    AppCaches, ChallengesSnapshot, MealMonth, MonthKey, WorkoutSnapshot,
};
use fitcache_core::config::Config;
use fitcache_core::models::MealEntry;

/// Turn an API error into the message a user sees, keeping the detail.
fn friendly(err: ApiError) -> anyhow::Error {
    if err.is_retryable() {
        anyhow::anyhow!(
            "{} ({}) Run the command again to retry.",
            err.user_message(),
            err
        )
    } else {
        anyhow::anyhow!("{} ({})", err.user_message(), err)
    }
}

/// Everything the home screen shows. Each section fails independently.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub month: String,
    pub challenges: Option<ChallengesSnapshot>,
    pub meals: Option<MealMonth>,
    pub workout: Option<WorkoutSnapshot>,
    pub remaining_today: Option<i64>,
    pub errors: Vec<String>,
    pub stale: Vec<&'static str>,
}

pub struct App {
    config: Config,
    config_path: PathBuf,
    session: Session,
    tokens: Box<dyn TokenStore>,
    api: ApiClient,
    caches: AppCaches,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let config_path = Config::config_path()?;
        let data_dir = config.data_dir()?;
        Self::with_storage(config, config_path, data_dir, Box::new(CredentialStore))
    }

    /// Build an app that keeps its config, session and tokens in the given places.
    pub fn with_storage(
        config: Config,
        config_path: PathBuf,
        data_dir: PathBuf,
        tokens: Box<dyn TokenStore>,
    ) -> Result<Self> {
        let mut session = Session::new(data_dir);
        let loaded = session.load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load session");
            false
        });
        if !loaded {
            Self::restore_session(&mut session, &config, tokens.as_ref());
        }

        if let Some(data) = session.data.as_ref() {
            if data.needs_refresh() {
                warn!(
                    user_id = %data.user_id,
                    minutes_left = data.minutes_until_expiry(),
                    "Session expires soon, run `fitcache login` to renew it"
                );
            }
        }

        let mut api = ApiClient::new(config.api_base_url.clone(), config.request_timeout())
            .context("Failed to create API client")?;
        if let Some(token) = session.token() {
            api.set_token(token.to_string());
        }

        Ok(Self {
            config,
            config_path,
            session,
            tokens,
            api,
            caches: AppCaches::new(),
        })
    }

    /// Rebuild the session for the last signed-in user from the token store
    /// when `session.json` is missing or expired.
    fn restore_session(session: &mut Session, config: &Config, tokens: &dyn TokenStore) {
        let Some(user_id) = config.last_user_id.as_deref() else {
            return;
        };
        match tokens.get_token(user_id) {
            Ok(token) => {
                session.update(SessionData::new(token, user_id.to_string(), None));
                if let Err(e) = session.save() {
                    warn!(error = %e, "Failed to save restored session");
                }
                info!(user_id, "Restored session from stored token");
            }
            Err(e) => {
                debug!(user_id, error = %e, "No stored token, starting signed out");
            }
        }
    }

    fn user_id(&self) -> Result<&str> {
        match self.session.user_id() {
            Some(id) if self.session.is_valid() => Ok(id),
            _ => Err(anyhow::anyhow!(
                "Not signed in. Run `fitcache login <user_id>` first."
            )),
        }
    }

    pub fn login(&mut self, user_id: &str, email: Option<String>, token: String) -> Result<()> {
        self.session
            .update(SessionData::new(token.clone(), user_id.to_string(), email));
        self.session.save().context("Failed to save session")?;

        if let Err(e) = self.tokens.store_token(user_id, &token) {
            warn!(error = %e, "Failed to store token in keychain");
        }

        self.config.last_user_id = Some(user_id.to_string());
        if let Err(e) = self.config.save_to(&self.config_path) {
            warn!(error = %e, "Failed to save config");
        }

        self.api = self.api.with_token(token);
        self.caches.clear_all();
        info!(user_id, "Signed in");
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        if let Some(user_id) = self.session.user_id() {
            if let Err(e) = self.tokens.delete(user_id) {
                warn!(error = %e, "Failed to delete token from keychain");
            }
        }
        self.session.clear().context("Failed to clear session")?;

        // Without a last user nothing is restored on the next start
        if self.config.last_user_id.take().is_some() {
            if let Err(e) = self.config.save_to(&self.config_path) {
                warn!(error = %e, "Failed to save config");
            }
        }

        self.caches.clear_all();
        info!("Signed out");
        Ok(())
    }

    pub async fn challenges(&self, force: bool) -> Result<Arc<ChallengesSnapshot>> {
        let user_id = self.user_id()?;
        self.caches
            .challenges
            .get_or_fetch(&self.api, user_id, force)
            .await
            .map_err(friendly)
    }

    /// Join a challenge, then reload the list so progress reflects it.
    pub async fn join_challenge(&self, challenge_id: &str) -> Result<Arc<ChallengesSnapshot>> {
        self.user_id()?;
        self.api
            .join_challenge(challenge_id)
            .await
            .map_err(friendly)?;
        self.caches.challenges.clear();
        self.challenges(false).await
    }

    pub async fn meals(&self, month: MonthKey, force: bool) -> Result<Arc<MealMonth>> {
        if !month.is_valid() {
            anyhow::bail!("Month must be between 1 and 12, got {}", month.month);
        }
        let user_id = self.user_id()?;
        self.caches
            .meals
            .get_or_fetch_month(&self.api, user_id, month.year, month.month, force)
            .await
            .map_err(friendly)
    }

    /// Log a meal and prime the month cache with the document the server returns.
    pub async fn log_meal(&self, date: NaiveDate, entry: MealEntry) -> Result<Arc<MealMonth>> {
        let user_id = self.user_id()?;
        let diary = self
            .api
            .add_meal(user_id, date, &entry)
            .await
            .map_err(friendly)?;

        let mut month = MealMonth::new(diary);
        if let Some(prev) = self.caches.meals.snapshot_month(month.diary.year, month.diary.month) {
            month.health = prev.health;
        }
        Ok(self.caches.meals.put_month(month))
    }

    pub async fn workout(&self, force: bool) -> Result<Arc<WorkoutSnapshot>> {
        self.user_id()?;
        self.caches
            .workout
            .get_or_fetch(&self.api, force)
            .await
            .map_err(friendly)
    }

    /// Load the three home-screen sections concurrently.
    pub async fn dashboard(&self, force: bool) -> Result<Dashboard> {
        let user_id = self.user_id()?;
        let today = Utc::now().date_naive();
        let month = MonthKey::from_date(today);

        let (challenges, meals, workout) = tokio::join!(
            self.caches.challenges.lookup(&self.api, user_id, force),
            self.caches
                .meals
                .lookup_month(&self.api, user_id, month.year, month.month, force),
            self.caches.workout.lookup(&self.api, force),
        );

        let mut dashboard = Dashboard {
            month: month.label(),
            challenges: None,
            meals: None,
            workout: None,
            remaining_today: None,
            errors: Vec::new(),
            stale: Vec::new(),
        };

        match challenges {
            Ok(lookup) => {
                if lookup.is_stale() {
                    dashboard.stale.push("challenges");
                }
                dashboard.challenges = Some((*lookup.value).clone());
            }
            Err(e) => dashboard.errors.push(format!("Challenges: {}", e.user_message())),
        }

        match meals {
            Ok(lookup) => {
                if lookup.is_stale() {
                    dashboard.stale.push("meals");
                }
                dashboard.remaining_today = Some(lookup.value.remaining_on(today));
                dashboard.meals = Some((*lookup.value).clone());
            }
            Err(e) => dashboard.errors.push(format!("Meals: {}", e.user_message())),
        }

        match workout {
            Ok(lookup) => {
                if lookup.is_stale() {
                    dashboard.stale.push("workout");
                }
                dashboard.workout = Some((*lookup.value).clone());
            }
            Err(e) => dashboard.errors.push(format!("Workout: {}", e.user_message())),
        }

        let ages = self.caches.ages();
        info!(
            challenges = %ages.challenges,
            meals = %ages.meals,
            workout = %ages.workout,
            errors = dashboard.errors.len(),
            "Dashboard loaded"
        );
        Ok(dashboard)
    }
}
