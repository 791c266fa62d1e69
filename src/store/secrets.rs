use anyhow::{Result, anyhow};
use keyring::{Entry, Error as KeyringError};

use crate::domain::account::AccountSecret;
use crate::store::repo::SecretStore;

const SERVICE: &str = "inbox1";

/// Passwords in the OS keyring, one entry per account id.
pub struct KeyringSecretStore {
    service: String,
}

impl KeyringSecretStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE.to_string(),
        }
    }

    fn entry(&self, account_id: &str) -> Result<Entry> {
        Entry::new(&self.service, account_id).map_err(|e| anyhow!(e.to_string()))
    }
}

impl Default for KeyringSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for KeyringSecretStore {
    fn set_secret(&self, account_id: &str, secret: &AccountSecret) -> Result<()> {
        self.entry(account_id)?
            .set_password(&secret.password)
            .map_err(|e| anyhow!(e.to_string()))?;
        Ok(())
    }

    fn get_secret(&self, account_id: &str) -> Result<Option<AccountSecret>> {
        match self.entry(account_id)?.get_password() {
            Ok(v) => Ok(Some(AccountSecret::new(v))),
            Err(KeyringError::NoEntry) => Ok(None),
            Err(e) => Err(anyhow!(e.to_string())),
        }
    }

    fn delete_secret(&self, account_id: &str) -> Result<()> {
        match self.entry(account_id)?.delete_credential() {
            Ok(()) | Err(KeyringError::NoEntry) => Ok(()),
            Err(e) => Err(anyhow!(e.to_string())),
        }
    }
}
