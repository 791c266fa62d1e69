use anyhow::{Result, anyhow};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::account::{Account, AccountId, AccountSecret};
use crate::domain::email::{CachedEmail, EmailId};
use crate::store::repo::{AccountStore, MessageCache, SecretStore};

/// Volatile store: nothing survives the process, `teardown` forgets everything.
#[derive(Default)]
pub struct MemoryStore {
    accounts: RwLock<BTreeMap<AccountId, Account>>,
    secrets: RwLock<BTreeMap<AccountId, AccountSecret>>,
    cache: RwLock<BTreeMap<(AccountId, EmailId), CachedEmail>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| anyhow!("memory store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| anyhow!("memory store lock poisoned"))
}

impl AccountStore for MemoryStore {
    fn init(&self) -> Result<()> {
        Ok(())
    }

    fn teardown(&self) -> Result<()> {
        write(&self.accounts)?.clear();
        write(&self.secrets)?.clear();
        Ok(())
    }

    fn save_account(&self, account: &Account, secret: &AccountSecret) -> Result<()> {
        write(&self.accounts)?.insert(account.id.clone(), account.clone());
        self.set_secret(&account.id, secret)
    }

    fn get_account(&self, id: &str) -> Result<Option<Account>> {
        Ok(read(&self.accounts)?.get(id).cloned())
    }

    fn get_account_secret(&self, id: &str) -> Result<Option<AccountSecret>> {
        self.get_secret(id)
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        Ok(read(&self.accounts)?.values().cloned().collect())
    }

    fn remove_account(&self, id: &str) -> Result<()> {
        write(&self.accounts)?.remove(id);
        self.delete_secret(id)
    }
}

impl SecretStore for MemoryStore {
    fn set_secret(&self, account_id: &str, secret: &AccountSecret) -> Result<()> {
        write(&self.secrets)?.insert(account_id.to_string(), secret.clone());
        Ok(())
    }

    fn get_secret(&self, account_id: &str) -> Result<Option<AccountSecret>> {
        Ok(read(&self.secrets)?.get(account_id).cloned())
    }

    fn delete_secret(&self, account_id: &str) -> Result<()> {
        write(&self.secrets)?.remove(account_id);
        Ok(())
    }
}

impl MessageCache for MemoryStore {
    fn init(&self) -> Result<()> {
        Ok(())
    }

    fn teardown(&self) -> Result<()> {
        self.clear_cache()
    }

    fn upsert_cached_email(&self, email: &CachedEmail) -> Result<()> {
        let key = (email.account_id.clone(), email.id.clone());
        write(&self.cache)?.insert(key, email.clone());
        Ok(())
    }

    fn get_cached_email(&self, account_id: &str, id: &str) -> Result<Option<CachedEmail>> {
        let key = (account_id.to_string(), id.to_string());
        Ok(read(&self.cache)?.get(&key).cloned())
    }

    fn list_cached_emails(&self) -> Result<Vec<CachedEmail>> {
        Ok(read(&self.cache)?.values().cloned().collect())
    }

    fn clear_cache(&self) -> Result<()> {
        write(&self.cache)?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{MailProtocol, MailSecurity};
    use crate::domain::email::EmailSummary;

    fn account(id: &str) -> Account {
        Account {
            id: id.into(),
            email: format!("{id}@example.com"),
            protocol: MailProtocol::Imap,
            host: "imap.example.com".into(),
            port: 993,
            username: id.into(),
            security: MailSecurity::Ssl,
        }
    }

    #[test]
    fn save_get_remove_account_and_secret() {
        let store = MemoryStore::new();
        store.save_account(&account("a"), &AccountSecret::new("pw")).unwrap();

        assert_eq!(store.get_account("a").unwrap(), Some(account("a")));
        assert_eq!(
            store.get_account_secret("a").unwrap(),
            Some(AccountSecret::new("pw"))
        );

        store.remove_account("a").unwrap();
        assert_eq!(store.get_account("a").unwrap(), None);
        assert_eq!(store.get_account_secret("a").unwrap(), None);
    }

    #[test]
    fn saving_again_overwrites() {
        let store = MemoryStore::new();
        store.save_account(&account("a"), &AccountSecret::new("one")).unwrap();
        let mut changed = account("a");
        changed.host = "mail.example.org".into();
        store.save_account(&changed, &AccountSecret::new("two")).unwrap();

        assert_eq!(store.list_accounts().unwrap(), vec![changed]);
        assert_eq!(
            store.get_account_secret("a").unwrap().unwrap().password,
            "two"
        );
    }

    #[test]
    fn teardown_forgets_everything() {
        let store = MemoryStore::new();
        store.save_account(&account("a"), &AccountSecret::new("pw")).unwrap();
        let summary = EmailSummary {
            id: "1".into(),
            from: "x".into(),
            subject: "s".into(),
            snippet: String::new(),
            received_at: "Unknown".into(),
            unread: None,
        };
        store
            .upsert_cached_email(&CachedEmail::from_summary("a", summary))
            .unwrap();

        AccountStore::teardown(&store).unwrap();
        MessageCache::teardown(&store).unwrap();

        assert!(store.list_accounts().unwrap().is_empty());
        assert!(store.list_cached_emails().unwrap().is_empty());
        assert!(store.get_secret("a").unwrap().is_none());
    }

    #[test]
    fn same_message_id_in_two_accounts_is_cached_twice() {
        let store = MemoryStore::new();
        let summary = EmailSummary {
            id: "7".into(),
            from: "x".into(),
            subject: "first".into(),
            snippet: String::new(),
            received_at: "Unknown".into(),
            unread: None,
        };
        let other = EmailSummary {
            subject: "second".into(),
            ..summary.clone()
        };
        store.cache_summaries("a", &[summary]).unwrap();
        store.cache_summaries("b", &[other]).unwrap();

        assert_eq!(store.list_cached_emails().unwrap().len(), 2);
        assert_eq!(
            store.get_cached_email("a", "7").unwrap().unwrap().summary.subject,
            "first"
        );
        assert_eq!(
            store.get_cached_email("b", "7").unwrap().unwrap().summary.subject,
            "second"
        );
    }
}
