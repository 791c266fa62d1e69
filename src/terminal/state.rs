use anyhow::Result;
use ratatui::widgets::ListState;

use crate::domain::account::{Account, AccountSecret};
use crate::domain::email::EmailSummary;
use crate::mail::error::MailError;
use crate::services::Services;
use crate::store::repo::{AccountStore, MessageCache};
use crate::terminal::inbox::{FetchTicket, InboxState};
use crate::terminal::settings::SettingsState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Inbox,
    Accounts,
    Settings,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Inbox, Tab::Accounts, Tab::Settings];

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Inbox => "Inbox",
            Self::Accounts => "Accounts",
            Self::Settings => "Settings",
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }
}

/// A fetch the event loop should run off the UI thread.
#[derive(Debug)]
pub struct FetchJob {
    pub ticket: FetchTicket,
    pub account: Account,
    pub secret: AccountSecret,
}

#[derive(Debug, Default)]
pub struct AccountsState {
    pub items: Vec<Account>,
    pub list_state: ListState,
    pub message: Option<String>,
}

impl AccountsState {
    pub fn selected(&self) -> Option<&Account> {
        self.items.get(self.list_state.selected()?)
    }

    pub fn move_selection(&mut self, delta: i32) {
        if self.items.is_empty() {
            self.list_state.select(None);
            return;
        }
        let cur = self.list_state.selected().unwrap_or(0) as i32;
        let len = self.items.len() as i32;
        self.list_state
            .select(Some((cur + delta).clamp(0, len - 1) as usize));
    }
}

#[derive(Debug, Default)]
pub struct AppState {
    pub tab: Tab,
    pub inbox: InboxState,
    pub accounts: AccountsState,
    pub settings: SettingsState,
    pub active: Option<(Account, AccountSecret)>,
    pub pending_fetch: Option<FetchJob>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the account list and opens `preferred` (or the first account).
    pub fn bootstrap(services: &Services, preferred: Option<&str>) -> Result<Self> {
        let mut state = Self::new();
        state.refresh_accounts(services.accounts.as_ref())?;
        let creds = match services.pick_account(preferred)? {
            Some(account) => services.load_credentials(&account.id)?,
            None => None,
        };
        state.activate(creds);
        Ok(state)
    }

    pub fn has_account(&self) -> bool {
        self.active.is_some()
    }

    pub fn next_tab(&mut self) {
        self.tab = Tab::ALL[(self.tab.index() + 1) % Tab::ALL.len()];
    }

    pub fn prev_tab(&mut self) {
        let len = Tab::ALL.len();
        self.tab = Tab::ALL[(self.tab.index() + len - 1) % len];
    }

    /// Switches the inbox to another account (or none) and reloads it.
    pub fn activate(&mut self, creds: Option<(Account, AccountSecret)>) {
        self.settings
            .load(creds.as_ref().map(|c| &c.0), creds.as_ref().map(|c| &c.1));
        self.active = creds;
        self.inbox.reset();
        self.load_inbox();
    }

    pub fn load_inbox(&mut self) {
        let Some((account, secret)) = &self.active else {
            self.inbox.reset();
            return;
        };
        if let Some(ticket) = self.inbox.begin_load() {
            self.pending_fetch = Some(FetchJob {
                ticket,
                account: account.clone(),
                secret: secret.clone(),
            });
        }
    }

    pub fn apply_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<EmailSummary>, MailError>,
        cache: &dyn MessageCache,
    ) {
        let ok = result.is_ok();
        if !self.inbox.finish_load(ticket, result) || !ok {
            return;
        }
        let Some((account, _)) = &self.active else {
            return;
        };
        if let Err(e) = cache.cache_summaries(&account.id, &self.inbox.emails) {
            log::warn!("could not cache messages of {}: {e:#}", account.id);
        }
    }

    pub fn refresh_accounts(&mut self, store: &dyn AccountStore) -> Result<()> {
        self.accounts.items = store.list_accounts()?;
        let sel = match self.accounts.list_state.selected() {
            _ if self.accounts.items.is_empty() => None,
            Some(i) => Some(i.min(self.accounts.items.len() - 1)),
            None => Some(0),
        };
        self.accounts.list_state.select(sel);
        Ok(())
    }

    /// Store failures end up in the Accounts message instead of the caller.
    fn report(&mut self, action: &str, result: Result<()>) {
        if let Err(e) = result {
            log::warn!("{action} failed: {e:#}");
            self.accounts.message = Some(format!("Could not {action}: {e:#}"));
        }
    }

    pub fn activate_selected_account(&mut self, services: &Services) {
        let result = self.try_activate_selected(services);
        self.report("open account", result);
    }

    fn try_activate_selected(&mut self, services: &Services) -> Result<()> {
        let Some(id) = self.accounts.selected().map(|a| a.id.clone()) else {
            return Ok(());
        };
        match services.load_credentials(&id)? {
            Some(creds) => {
                self.accounts.message = None;
                self.activate(Some(creds));
                self.tab = Tab::Inbox;
            }
            None => {
                self.accounts.message =
                    Some("No password stored for this account. Edit it in Settings.".into());
            }
        }
        Ok(())
    }

    pub fn edit_selected_account(&mut self, services: &Services) {
        let result = self.try_edit_selected(services);
        self.report("load account", result);
    }

    fn try_edit_selected(&mut self, services: &Services) -> Result<()> {
        let Some(account) = self.accounts.selected().cloned() else {
            return Ok(());
        };
        let secret = services.accounts.get_account_secret(&account.id)?;
        self.settings.load(Some(&account), secret.as_ref());
        self.tab = Tab::Settings;
        Ok(())
    }

    pub fn remove_selected_account(&mut self, services: &Services) {
        let result = self.try_remove_selected(services);
        self.report("remove account", result);
    }

    fn try_remove_selected(&mut self, services: &Services) -> Result<()> {
        let Some(id) = self.accounts.selected().map(|a| a.id.clone()) else {
            return Ok(());
        };
        services.accounts.remove_account(&id)?;
        log::info!("removed account {id}");
        self.accounts.message = None;
        self.refresh_accounts(services.accounts.as_ref())?;

        let was_active = self.active.as_ref().is_some_and(|(a, _)| a.id == id);
        if was_active {
            let next = match self.accounts.items.first() {
                Some(a) => services.load_credentials(&a.id)?,
                None => None,
            };
            self.activate(next);
        }
        Ok(())
    }

    /// Saves the Settings form; the saved account becomes the active one.
    /// Failures are shown in the form message.
    pub fn save_settings(&mut self, services: &Services, now_millis: i64) {
        let Some((account, secret)) = self.settings.prepare_save(now_millis) else {
            return;
        };
        if let Err(e) = services.accounts.save_account(&account, &secret) {
            log::warn!("saving account {} failed: {e:#}", account.id);
            self.settings.message = Some(format!("{e:#}"));
            return;
        }
        log::info!("saved account {}", account.id);
        if let Err(e) = self.refresh_accounts(services.accounts.as_ref()) {
            log::warn!("reloading accounts failed: {e:#}");
        }
        self.activate(Some((account.clone(), secret)));
        self.settings.saved(&account);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::backend::MailBackend;
    use crate::store::memory::MemoryStore;
    use crate::terminal::settings::{Field, SAVED_TEXT};
    use serde_json::Value;
    use std::sync::Arc;

    struct NoBackend;

    impl MailBackend for NoBackend {
        fn fetch_unread(&self, _: &crate::domain::account::MailConfig) -> Result<Vec<Value>> {
            Ok(vec![])
        }
    }

    fn services() -> (Services, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let services = Services::new(store.clone(), store.clone(), Arc::new(NoBackend));
        (services, store)
    }

    fn fill_form(state: &mut AppState, host: &str) {
        let s = &mut state.settings;
        s.form.host = host.into();
        s.form.username = "me".into();
        s.form.password = "pw".into();
        s.focus = Field::ALL.len() - 1;
    }

    fn email(id: &str) -> EmailSummary {
        EmailSummary {
            id: id.into(),
            from: "a".into(),
            subject: "s".into(),
            snippet: String::new(),
            received_at: "Unknown".into(),
            unread: None,
        }
    }

    #[test]
    fn bootstrap_without_accounts_has_nothing_to_fetch() {
        let (services, _) = services();
        let state = AppState::bootstrap(&services, None).unwrap();
        assert!(!state.has_account());
        assert!(state.pending_fetch.is_none());
        assert!(state.settings.editing_id.is_none());
    }

    #[test]
    fn saving_settings_activates_and_queues_a_fetch() {
        let (services, store) = services();
        let mut state = AppState::bootstrap(&services, None).unwrap();
        fill_form(&mut state, "imap.x.com");
        state.save_settings(&services, 10);

        assert_eq!(state.settings.message.as_deref(), Some(SAVED_TEXT));
        assert_eq!(state.accounts.items.len(), 1);
        assert_eq!(store.list_accounts().unwrap()[0].id, "account-10");
        let job = state.pending_fetch.take().unwrap();
        assert_eq!(job.account.host, "imap.x.com");
        assert!(state.inbox.loading);
    }

    #[test]
    fn fetch_results_land_in_inbox_and_cache() {
        let (services, store) = services();
        let mut state = AppState::bootstrap(&services, None).unwrap();
        fill_form(&mut state, "imap.x.com");
        state.save_settings(&services, 10);
        let job = state.pending_fetch.take().unwrap();

        state.apply_fetch(job.ticket, Ok(vec![email("1"), email("2")]), store.as_ref());
        assert_eq!(state.inbox.emails.len(), 2);
        assert_eq!(store.list_cached_emails().unwrap().len(), 2);
    }

    #[test]
    fn bootstrap_prefers_configured_account() {
        let (services, _) = services();
        let mut state = AppState::bootstrap(&services, None).unwrap();
        fill_form(&mut state, "one.example.com");
        state.save_settings(&services, 1);
        state.settings.load(None, None);
        fill_form(&mut state, "two.example.com");
        state.save_settings(&services, 2);

        let state = AppState::bootstrap(&services, Some("account-2")).unwrap();
        assert_eq!(state.active.as_ref().unwrap().0.host, "two.example.com");
        let state = AppState::bootstrap(&services, Some("missing")).unwrap();
        assert_eq!(state.active.as_ref().unwrap().0.host, "one.example.com");
    }

    #[test]
    fn removing_the_active_account_clears_the_inbox() {
        let (services, _) = services();
        let mut state = AppState::bootstrap(&services, None).unwrap();
        fill_form(&mut state, "imap.x.com");
        state.save_settings(&services, 10);
        let job = state.pending_fetch.take().unwrap();

        state.remove_selected_account(&services);
        assert!(!state.has_account());
        assert!(state.accounts.items.is_empty());
        state.apply_fetch(job.ticket, Ok(vec![email("1")]), &MemoryStore::new());
        assert!(state.inbox.emails.is_empty());
    }

    #[test]
    fn tabs_wrap_in_both_directions() {
        let mut state = AppState::new();
        state.prev_tab();
        assert_eq!(state.tab, Tab::Settings);
        state.next_tab();
        assert_eq!(state.tab, Tab::Inbox);
    }

    /// Lists and saves like a normal store, but every per-account lookup fails.
    struct LockedKeyring(MemoryStore);

    impl AccountStore for LockedKeyring {
        fn init(&self) -> Result<()> {
            Ok(())
        }

        fn teardown(&self) -> Result<()> {
            Ok(())
        }

        fn save_account(&self, account: &Account, secret: &AccountSecret) -> Result<()> {
            self.0.save_account(account, secret)
        }

        fn get_account(&self, id: &str) -> Result<Option<Account>> {
            self.0.get_account(id)
        }

        fn get_account_secret(&self, _: &str) -> Result<Option<AccountSecret>> {
            Err(anyhow::anyhow!("keyring unavailable"))
        }

        fn list_accounts(&self) -> Result<Vec<Account>> {
            self.0.list_accounts()
        }

        fn remove_account(&self, _: &str) -> Result<()> {
            Err(anyhow::anyhow!("keyring unavailable"))
        }
    }

    #[test]
    fn account_store_failures_become_messages() {
        let store = Arc::new(LockedKeyring(MemoryStore::new()));
        let services = Services::new(store, Arc::new(MemoryStore::new()), Arc::new(NoBackend));
        let mut state = AppState::new();
        fill_form(&mut state, "imap.x.com");
        state.save_settings(&services, 3);
        state.tab = Tab::Accounts;
        assert_eq!(state.accounts.items.len(), 1);

        state.remove_selected_account(&services);
        let msg = state.accounts.message.take().unwrap();
        assert!(msg.contains("keyring unavailable"), "{msg}");
        assert_eq!(state.accounts.items.len(), 1);

        state.edit_selected_account(&services);
        assert!(state.accounts.message.take().is_some());
        assert_eq!(state.tab, Tab::Accounts);

        state.activate_selected_account(&services);
        assert!(state.accounts.message.is_some());
    }
}
