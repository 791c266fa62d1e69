use serde::{Deserialize, Serialize};

use crate::domain::account::AccountId;

pub type EmailId = String;

/// One message as the inbox renders it, whatever shape the backend sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSummary {
    pub id: EmailId,
    pub from: String,
    pub subject: String,
    pub snippet: String,
    pub received_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unread: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedEmail {
    /// Message ids are only unique per account.
    pub account_id: AccountId,
    pub id: EmailId,
    pub summary: EmailSummary,
    pub body: String,
}

impl CachedEmail {
    /// Header-only entry; the backend does not hand us bodies.
    pub fn from_summary(account_id: &str, summary: EmailSummary) -> Self {
        Self {
            account_id: account_id.to_string(),
            id: summary.id.clone(),
            summary,
            body: String::new(),
        }
    }
}
