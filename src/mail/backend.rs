use anyhow::Result;
use serde_json::Value;

use crate::domain::account::MailConfig;

/// The mail capability the inbox talks to. One call per fetch, no session kept.
///
/// Records come back untyped; see [`crate::mail::normalize`] for the shapes
/// that are understood.
pub trait MailBackend: Send + Sync {
    fn fetch_unread(&self, config: &MailConfig) -> Result<Vec<Value>>;
}
