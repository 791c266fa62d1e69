use anyhow::Result;

use crate::domain::account::{Account, AccountSecret};
use crate::domain::email::{CachedEmail, EmailSummary};

/// Accounts and their credentials. Saved together, removed together.
pub trait AccountStore: Send + Sync {
    fn init(&self) -> Result<()>;
    fn teardown(&self) -> Result<()>;

    fn save_account(&self, account: &Account, secret: &AccountSecret) -> Result<()>;
    fn get_account(&self, id: &str) -> Result<Option<Account>>;
    fn get_account_secret(&self, id: &str) -> Result<Option<AccountSecret>>;
    fn list_accounts(&self) -> Result<Vec<Account>>;
    fn remove_account(&self, id: &str) -> Result<()>;
}

/// Header-only copies of fetched messages, keyed by account and message id.
pub trait MessageCache: Send + Sync {
    fn init(&self) -> Result<()>;
    fn teardown(&self) -> Result<()>;

    fn upsert_cached_email(&self, email: &CachedEmail) -> Result<()>;
    fn get_cached_email(&self, account_id: &str, id: &str) -> Result<Option<CachedEmail>>;
    fn list_cached_emails(&self) -> Result<Vec<CachedEmail>>;
    fn clear_cache(&self) -> Result<()>;

    /// Stores one fetch result, stopping at the first failure.
    fn cache_summaries(&self, account_id: &str, emails: &[EmailSummary]) -> Result<()> {
        for email in emails {
            self.upsert_cached_email(&CachedEmail::from_summary(account_id, email.clone()))?;
        }
        Ok(())
    }
}

/// Where passwords live, keyed by account id.
pub trait SecretStore: Send + Sync {
    fn set_secret(&self, account_id: &str, secret: &AccountSecret) -> Result<()>;
    fn get_secret(&self, account_id: &str) -> Result<Option<AccountSecret>>;
    fn delete_secret(&self, account_id: &str) -> Result<()>;
}
