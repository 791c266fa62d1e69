use anyhow::{Result, anyhow};
use rusqlite::{Connection, params};
use std::sync::{Mutex, MutexGuard};

use crate::domain::account::{Account, AccountSecret};
use crate::domain::email::{CachedEmail, EmailSummary};
use crate::store::repo::{AccountStore, MessageCache, SecretStore};

/// Accounts and cached summaries in SQLite; passwords go to the injected [`SecretStore`].
pub struct SqliteRepo {
    conn: Mutex<Connection>,
    secrets: Box<dyn SecretStore>,
}

impl SqliteRepo {
    pub fn open(path: &std::path::Path, secrets: Box<dyn SecretStore>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
            secrets,
        })
    }

    pub fn open_in_memory(secrets: Box<dyn SecretStore>) -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            secrets,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("sqlite connection lock poisoned"))
    }

    fn migrate(&self) -> Result<()> {
        self.conn()?.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS accounts (
                id          TEXT PRIMARY KEY,
                email       TEXT NOT NULL,
                protocol    TEXT NOT NULL,
                host        TEXT NOT NULL,
                port        INTEGER NOT NULL,
                username    TEXT NOT NULL,
                security    TEXT NOT NULL
            );

            DROP TABLE IF EXISTS emails;

            CREATE TABLE IF NOT EXISTS messages (
                account_id   TEXT NOT NULL,
                id           TEXT NOT NULL,
                sender       TEXT NOT NULL,
                subject      TEXT NOT NULL,
                snippet      TEXT NOT NULL,
                received_at  TEXT NOT NULL,
                unread       INTEGER,
                body         TEXT NOT NULL,
                PRIMARY KEY (account_id, id)
            );
            "#,
        )?;
        Ok(())
    }
}

fn row_to_account(r: &rusqlite::Row<'_>) -> Result<Account> {
    let protocol: String = r.get(2)?;
    let security: String = r.get(6)?;
    Ok(Account {
        id: r.get(0)?,
        email: r.get(1)?,
        protocol: protocol.parse()?,
        host: r.get(3)?,
        port: r.get(4)?,
        username: r.get(5)?,
        security: security.parse()?,
    })
}

fn row_to_cached(r: &rusqlite::Row<'_>) -> Result<CachedEmail> {
    let id: String = r.get(1)?;
    Ok(CachedEmail {
        account_id: r.get(0)?,
        id: id.clone(),
        summary: EmailSummary {
            id,
            from: r.get(2)?,
            subject: r.get(3)?,
            snippet: r.get(4)?,
            received_at: r.get(5)?,
            unread: r.get(6)?,
        },
        body: r.get(7)?,
    })
}

impl AccountStore for SqliteRepo {
    fn init(&self) -> Result<()> {
        self.migrate()
    }

    fn teardown(&self) -> Result<()> {
        self.conn()?.execute_batch("PRAGMA optimize;")?;
        Ok(())
    }

    /// The secret is written first so a keyring failure leaves no password-less row.
    fn save_account(&self, account: &Account, secret: &AccountSecret) -> Result<()> {
        self.secrets.set_secret(&account.id, secret)?;
        self.conn()?.execute(
            r#"
            INSERT INTO accounts (id, email, protocol, host, port, username, security)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
              email=excluded.email,
              protocol=excluded.protocol,
              host=excluded.host,
              port=excluded.port,
              username=excluded.username,
              security=excluded.security
            "#,
            params![
                account.id,
                account.email,
                account.protocol.as_str(),
                account.host,
                account.port,
                account.username,
                account.security.as_str(),
            ],
        )?;
        Ok(())
    }

    fn get_account(&self, id: &str) -> Result<Option<Account>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, email, protocol, host, port, username, security
            FROM accounts WHERE id=?1
            "#,
        )?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(r) => Ok(Some(row_to_account(r)?)),
            None => Ok(None),
        }
    }

    fn get_account_secret(&self, id: &str) -> Result<Option<AccountSecret>> {
        self.secrets.get_secret(id)
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, email, protocol, host, port, username, security
            FROM accounts ORDER BY rowid
            "#,
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(r) = rows.next()? {
            out.push(row_to_account(r)?);
        }
        Ok(out)
    }

    fn remove_account(&self, id: &str) -> Result<()> {
        self.conn()?
            .execute(r#"DELETE FROM accounts WHERE id=?1"#, params![id])?;
        self.secrets.delete_secret(id)
    }
}

impl MessageCache for SqliteRepo {
    fn init(&self) -> Result<()> {
        self.migrate()
    }

    fn teardown(&self) -> Result<()> {
        Ok(())
    }

    fn upsert_cached_email(&self, email: &CachedEmail) -> Result<()> {
        let s = &email.summary;
        self.conn()?.execute(
            r#"
            INSERT INTO messages (account_id, id, sender, subject, snippet, received_at, unread, body)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(account_id, id) DO UPDATE SET
              sender=excluded.sender,
              subject=excluded.subject,
              snippet=excluded.snippet,
              received_at=excluded.received_at,
              unread=excluded.unread,
              body=excluded.body
            "#,
            params![
                email.account_id,
                email.id,
                s.from,
                s.subject,
                s.snippet,
                s.received_at,
                s.unread,
                email.body
            ],
        )?;
        Ok(())
    }

    fn get_cached_email(&self, account_id: &str, id: &str) -> Result<Option<CachedEmail>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT account_id, id, sender, subject, snippet, received_at, unread, body
            FROM messages WHERE account_id=?1 AND id=?2
            "#,
        )?;
        let mut rows = stmt.query(params![account_id, id])?;
        match rows.next()? {
            Some(r) => Ok(Some(row_to_cached(r)?)),
            None => Ok(None),
        }
    }

    fn list_cached_emails(&self) -> Result<Vec<CachedEmail>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT account_id, id, sender, subject, snippet, received_at, unread, body
            FROM messages ORDER BY rowid
            "#,
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(r) = rows.next()? {
            out.push(row_to_cached(r)?);
        }
        Ok(out)
    }

    fn clear_cache(&self) -> Result<()> {
        self.conn()?.execute(r#"DELETE FROM messages"#, [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{MailProtocol, MailSecurity};
    use crate::store::memory::MemoryStore;

    fn repo() -> SqliteRepo {
        let repo = SqliteRepo::open_in_memory(Box::new(MemoryStore::new())).unwrap();
        AccountStore::init(&repo).unwrap();
        repo
    }

    fn account() -> Account {
        Account {
            id: "account-1".into(),
            email: "me@example.com".into(),
            protocol: MailProtocol::Pop3,
            host: "pop.example.com".into(),
            port: 995,
            username: "me".into(),
            security: MailSecurity::Starttls,
        }
    }

    #[test]
    fn accounts_survive_a_round_trip_through_sqlite() {
        let repo = repo();
        repo.save_account(&account(), &AccountSecret::new("pw")).unwrap();

        assert_eq!(repo.get_account("account-1").unwrap(), Some(account()));
        assert_eq!(repo.list_accounts().unwrap(), vec![account()]);
        assert_eq!(
            repo.get_account_secret("account-1").unwrap(),
            Some(AccountSecret::new("pw"))
        );
    }

    #[test]
    fn remove_drops_row_and_secret() {
        let repo = repo();
        repo.save_account(&account(), &AccountSecret::new("pw")).unwrap();
        repo.remove_account("account-1").unwrap();
        assert!(repo.get_account("account-1").unwrap().is_none());
        assert!(repo.get_account_secret("account-1").unwrap().is_none());
    }

    #[test]
    fn init_is_idempotent() {
        let repo = repo();
        MessageCache::init(&repo).unwrap();
        AccountStore::init(&repo).unwrap();
    }

    #[test]
    fn cache_upserts_and_keeps_optional_unread() {
        let repo = repo();
        let mut summary = EmailSummary {
            id: "42".into(),
            from: "A <a@x.com>".into(),
            subject: "Hello".into(),
            snippet: String::new(),
            received_at: "2024-01-01".into(),
            unread: None,
        };
        repo.upsert_cached_email(&CachedEmail::from_summary("account-1", summary.clone()))
            .unwrap();
        assert_eq!(
            repo.get_cached_email("account-1", "42").unwrap().unwrap().summary.unread,
            None
        );

        summary.unread = Some(true);
        summary.subject = "Hello again".into();
        repo.upsert_cached_email(&CachedEmail::from_summary("account-1", summary.clone()))
            .unwrap();

        let all = repo.list_cached_emails().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].summary, summary);

        repo.clear_cache().unwrap();
        assert!(repo.list_cached_emails().unwrap().is_empty());
    }

    struct BrokenKeyring;

    impl SecretStore for BrokenKeyring {
        fn set_secret(&self, _: &str, _: &AccountSecret) -> Result<()> {
            Err(anyhow!("keyring unavailable"))
        }

        fn get_secret(&self, _: &str) -> Result<Option<AccountSecret>> {
            Ok(None)
        }

        fn delete_secret(&self, _: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_secret_write_stores_no_account() {
        let repo = SqliteRepo::open_in_memory(Box::new(BrokenKeyring)).unwrap();
        AccountStore::init(&repo).unwrap();

        let err = repo
            .save_account(&account(), &AccountSecret::new("pw"))
            .unwrap_err();
        assert!(err.to_string().contains("keyring unavailable"));
        assert!(repo.list_accounts().unwrap().is_empty());
    }

    #[test]
    fn cache_keeps_accounts_apart() {
        let repo = repo();
        let summary = EmailSummary {
            id: "1".into(),
            from: "A".into(),
            subject: "for one".into(),
            snippet: String::new(),
            received_at: "Unknown".into(),
            unread: Some(true),
        };
        let other = EmailSummary {
            subject: "for two".into(),
            ..summary.clone()
        };
        repo.cache_summaries("account-1", &[summary]).unwrap();
        repo.cache_summaries("account-2", &[other]).unwrap();

        assert_eq!(repo.list_cached_emails().unwrap().len(), 2);
        let two = repo.get_cached_email("account-2", "1").unwrap().unwrap();
        assert_eq!(two.account_id, "account-2");
        assert_eq!(two.summary.subject, "for two");
    }
}
