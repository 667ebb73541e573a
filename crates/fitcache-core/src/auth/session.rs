use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Identity provider tokens expire after an hour.
const TOKEN_EXPIRY_MINUTES: i64 = 60;

/// Buffer time before expiry to trigger refresh
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(token: String, user_id: String, email: Option<String>) -> Self {
        Self {
            token,
            user_id,
            email,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.created_at + Duration::minutes(TOKEN_EXPIRY_MINUTES)
    }

    /// Check if the session will expire soon and should be refreshed
    pub fn needs_refresh(&self) -> bool {
        let refresh_at = self.created_at
            + Duration::minutes(TOKEN_EXPIRY_MINUTES - TOKEN_REFRESH_BUFFER_MINUTES);
        Utc::now() > refresh_at
    }

    /// Minutes remaining until expiry, for display
    pub fn minutes_until_expiry(&self) -> i64 {
        let expiry = self.created_at + Duration::minutes(TOKEN_EXPIRY_MINUTES);
        (expiry - Utc::now()).num_minutes().max(0)
    }
}

pub struct Session {
    data_dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            data: None,
        }
    }

    /// Load session from disk. Returns false when there is none or it has expired.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if path.exists() {
            let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
            let data: SessionData =
                serde_json::from_str(&contents).context("Failed to parse session file")?;

            if !data.is_expired() {
                self.data = Some(data);
                return Ok(true);
            }
            debug!(user_id = %data.user_id, "Stored session has expired");
        }
        Ok(false)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.token.as_str())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.user_id.as_str())
    }

    /// Check if session is valid (exists and not expired)
    pub fn is_valid(&self) -> bool {
        self.data.as_ref().map(|d| !d.is_expired()).unwrap_or(false)
    }

    fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fitcache-session-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_fresh_session_is_valid() {
        let data = SessionData::new("tok".into(), "u1".into(), None);
        assert!(!data.is_expired());
        assert!(!data.needs_refresh());
        assert!(data.minutes_until_expiry() >= 59);
    }

    #[test]
    fn test_old_session_is_expired() {
        let mut data = SessionData::new("tok".into(), "u1".into(), None);
        data.created_at = Utc::now() - Duration::minutes(57);
        assert!(!data.is_expired());
        assert!(data.needs_refresh());

        data.created_at = Utc::now() - Duration::minutes(61);
        assert!(data.is_expired());
        assert_eq!(data.minutes_until_expiry(), 0);
    }

    #[test]
    fn test_save_load_clear() {
        let dir = temp_dir("roundtrip");
        let mut session = Session::new(dir.clone());
        session.update(SessionData::new("tok".into(), "u1".into(), Some("a@b.c".into())));
        session.save().unwrap();

        let mut loaded = Session::new(dir.clone());
        assert!(loaded.load().unwrap());
        assert_eq!(loaded.user_id(), Some("u1"));
        assert_eq!(loaded.token(), Some("tok"));
        assert!(loaded.is_valid());

        loaded.clear().unwrap();
        let mut again = Session::new(dir.clone());
        assert!(!again.load().unwrap());
        assert!(!again.is_valid());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_expired_session_is_not_loaded() {
        let dir = temp_dir("expired");
        let mut data = SessionData::new("tok".into(), "u1".into(), None);
        data.created_at = Utc::now() - Duration::hours(2);
        let mut session = Session::new(dir.clone());
        session.update(data);
        session.save().unwrap();

        let mut loaded = Session::new(dir.clone());
        assert!(!loaded.load().unwrap());
        assert!(loaded.data.is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
