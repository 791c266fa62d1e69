use ratatui::widgets::ListState;

use crate::domain::email::EmailSummary;
use crate::mail::error::MailError;

/// Identifies one fetch so a result for a superseded request can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

#[derive(Debug, Default)]
pub struct InboxState {
    pub emails: Vec<EmailSummary>,
    pub loading: bool,
    pub error: Option<String>,
    pub list_state: ListState,
    generation: u64,
}

impl InboxState {
    pub fn new() -> Self {
        Self::default()
    }

    /// No account to fetch for: show nothing and forget any request in flight.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.emails.clear();
        self.error = None;
        self.loading = false;
        self.list_state.select(None);
    }

    /// Starts a load unless one is already running.
    pub fn begin_load(&mut self) -> Option<FetchTicket> {
        if self.loading {
            log::debug!("inbox load already running; trigger ignored");
            return None;
        }
        self.generation += 1;
        self.loading = true;
        self.error = None;
        Some(FetchTicket(self.generation))
    }

    /// Applies a finished fetch. Returns false when the ticket is stale.
    pub fn finish_load(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<EmailSummary>, MailError>,
    ) -> bool {
        if ticket.0 != self.generation {
            log::debug!("dropping result of superseded inbox load");
            return false;
        }
        match result {
            Ok(emails) => {
                self.emails = emails;
                let sel = if self.emails.is_empty() { None } else { Some(0) };
                self.list_state.select(sel);
            }
            Err(e) => self.error = Some(e.to_string()),
        }
        self.loading = false;
        true
    }

    pub fn empty_state(&self, has_account: bool) -> String {
        if !has_account {
            return "Add an account in Settings to start syncing mail.".to_string();
        }
        if self.loading {
            return "Fetching mail...".to_string();
        }
        if let Some(err) = &self.error {
            return format!("Sync failed: {err}\nPress r to try again.");
        }
        "No messages yet.".to_string()
    }

    pub fn selected(&self) -> Option<&EmailSummary> {
        self.emails.get(self.list_state.selected()?)
    }

    pub fn move_selection(&mut self, delta: i32) {
        if self.emails.is_empty() {
            self.list_state.select(None);
            return;
        }
        let cur = self.list_state.selected().unwrap_or(0) as i32;
        let len = self.emails.len() as i32;
        let next = (cur + delta).clamp(0, len - 1) as usize;
        self.list_state.select(Some(next));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(id: &str) -> EmailSummary {
        EmailSummary {
            id: id.into(),
            from: "a".into(),
            subject: "s".into(),
            snippet: String::new(),
            received_at: "Unknown".into(),
            unread: Some(true),
        }
    }

    #[test]
    fn load_success_replaces_emails_and_clears_loading() {
        let mut inbox = InboxState::new();
        let t = inbox.begin_load().unwrap();
        assert!(inbox.loading);
        assert!(inbox.finish_load(t, Ok(vec![email("1"), email("2")])));
        assert!(!inbox.loading);
        assert_eq!(inbox.emails.len(), 2);
        assert_eq!(inbox.selected().unwrap().id, "1");
    }

    #[test]
    fn failure_keeps_message_and_retry_clears_it() {
        let mut inbox = InboxState::new();
        let t = inbox.begin_load().unwrap();
        inbox.finish_load(t, Err(MailError::Fetch("connection refused".into())));
        assert_eq!(inbox.error.as_deref(), Some("connection refused"));
        assert!(inbox.empty_state(true).starts_with("Sync failed: connection refused"));

        inbox.begin_load().unwrap();
        assert_eq!(inbox.error, None);
        assert_eq!(inbox.empty_state(true), "Fetching mail...");
    }

    #[test]
    fn triggers_while_loading_are_ignored() {
        let mut inbox = InboxState::new();
        let first = inbox.begin_load().unwrap();
        assert!(inbox.begin_load().is_none());
        assert!(inbox.finish_load(first, Ok(vec![])));
        assert!(inbox.begin_load().is_some());
    }

    #[test]
    fn reset_drops_the_in_flight_result() {
        let mut inbox = InboxState::new();
        let t = inbox.begin_load().unwrap();
        inbox.reset();
        assert!(!inbox.finish_load(t, Ok(vec![email("1")])));
        assert!(inbox.emails.is_empty());
        assert_eq!(
            inbox.empty_state(false),
            "Add an account in Settings to start syncing mail."
        );
    }

    #[test]
    fn empty_success_shows_no_messages() {
        let mut inbox = InboxState::new();
        let t = inbox.begin_load().unwrap();
        inbox.finish_load(t, Ok(vec![]));
        assert_eq!(inbox.empty_state(true), "No messages yet.");
        assert!(inbox.selected().is_none());
    }

    #[test]
    fn selection_is_clamped() {
        let mut inbox = InboxState::new();
        let t = inbox.begin_load().unwrap();
        inbox.finish_load(t, Ok(vec![email("1"), email("2")]));
        inbox.move_selection(5);
        assert_eq!(inbox.selected().unwrap().id, "2");
        inbox.move_selection(-9);
        assert_eq!(inbox.selected().unwrap().id, "1");
    }
}
