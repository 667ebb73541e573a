use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "fitcache";

/// Where bearer tokens are kept between runs, one entry per user id.
pub trait TokenStore: Send + Sync {
    fn store_token(&self, user_id: &str, token: &str) -> Result<()>;

    fn get_token(&self, user_id: &str) -> Result<String>;

    fn delete(&self, user_id: &str) -> Result<()>;
}

/// Bearer tokens kept in the OS keychain.
pub struct CredentialStore;

impl TokenStore for CredentialStore {
    fn store_token(&self, user_id: &str, token: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, user_id).context("Failed to create keyring entry")?;
        entry
            .set_password(token)
            .context("Failed to store token in keychain")?;
        Ok(())
    }

    fn get_token(&self, user_id: &str) -> Result<String> {
        let entry = Entry::new(SERVICE_NAME, user_id).context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve token from keychain")
    }

    fn delete(&self, user_id: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, user_id).context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete token from keychain")?;
        Ok(())
    }
}
