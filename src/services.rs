use anyhow::Result;
use std::sync::Arc;

use crate::config::{Config, resolve_db_path};
use crate::domain::account::{Account, AccountSecret};
use crate::domain::email::EmailSummary;
use crate::mail::backend::MailBackend;
use crate::mail::error::MailError;
use crate::mail::fetch::fetch_inbox_summaries;
use crate::mail::imap_client::ImapBackend;
use crate::store::memory::MemoryStore;
use crate::store::repo::{AccountStore, MessageCache};
use crate::store::secrets::KeyringSecretStore;
use crate::store::sqlite::SqliteRepo;

/// Stores and backend shared by the CLI and the terminal UI.
#[derive(Clone)]
pub struct Services {
    pub accounts: Arc<dyn AccountStore>,
    pub cache: Arc<dyn MessageCache>,
    pub backend: Arc<dyn MailBackend>,
}

impl Services {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        cache: Arc<dyn MessageCache>,
        backend: Arc<dyn MailBackend>,
    ) -> Self {
        Self {
            accounts,
            cache,
            backend,
        }
    }

    /// Memory-only stores for `volatile = true`, SQLite + keyring otherwise.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let backend: Arc<dyn MailBackend> = Arc::new(ImapBackend::new(cfg.mailbox.clone()));

        if cfg.volatile {
            log::info!("using volatile in-memory stores");
            let store = Arc::new(MemoryStore::new());
            return Ok(Self::new(store.clone(), store, backend));
        }

        let db_path = resolve_db_path(cfg)?;
        log::info!("opening store at {}", db_path.display());
        let repo = Arc::new(SqliteRepo::open(
            &db_path,
            Box::new(KeyringSecretStore::new()),
        )?);
        Ok(Self::new(repo.clone(), repo, backend))
    }

    pub fn init(&self) -> Result<()> {
        self.accounts.init()?;
        self.cache.init()
    }

    pub fn teardown(&self) -> Result<()> {
        self.cache.teardown()?;
        self.accounts.teardown()
    }

    /// The account plus its secret, or `None` if either half is missing.
    pub fn load_credentials(&self, id: &str) -> Result<Option<(Account, AccountSecret)>> {
        let Some(account) = self.accounts.get_account(id)? else {
            return Ok(None);
        };
        let Some(secret) = self.accounts.get_account_secret(id)? else {
            log::warn!("account {id} has no stored password");
            return Ok(None);
        };
        Ok(Some((account, secret)))
    }

    /// `preferred` if it exists, else the first stored account.
    pub fn pick_account(&self, preferred: Option<&str>) -> Result<Option<Account>> {
        if let Some(id) = preferred
            && let Some(account) = self.accounts.get_account(id)?
        {
            return Ok(Some(account));
        }
        Ok(self.accounts.list_accounts()?.into_iter().next())
    }

    /// One fetch for `account`; the result is also written to the message cache.
    /// A cache failure is logged and does not fail the fetch.
    pub fn sync_inbox(
        &self,
        account: &Account,
        secret: &AccountSecret,
    ) -> Result<Vec<EmailSummary>, MailError> {
        let emails = fetch_inbox_summaries(self.backend.as_ref(), account, secret)?;
        if let Err(e) = self.cache.cache_summaries(&account.id, &emails) {
            log::warn!("could not cache messages of {}: {e:#}", account.id);
        }
        Ok(emails)
    }
}
