use crate::domain::account::{Account, AccountSecret, MailConfig, MailProtocol};
use crate::domain::email::EmailSummary;
use crate::mail::backend::MailBackend;
use crate::mail::error::MailError;
use crate::mail::normalize::normalize_all;

/// Fetches the unread inbox of `account` and normalizes every record.
///
/// Configuration problems are reported before the backend is touched. The
/// backend is called exactly once; there is no retry and no partial result.
pub fn fetch_inbox_summaries(
    backend: &dyn MailBackend,
    account: &Account,
    secret: &AccountSecret,
) -> Result<Vec<EmailSummary>, MailError> {
    if account.protocol != MailProtocol::Imap {
        return Err(MailError::UnsupportedProtocol(account.protocol));
    }

    let config = MailConfig::new(account, secret);
    config.validate()?;

    log::info!("fetching inbox for account {}", account.id);
    let records = backend.fetch_unread(&config).map_err(|e| {
        log::warn!("fetch for account {} failed: {e:#}", account.id);
        MailError::Fetch(format!("{e:#}"))
    })?;

    let summaries = normalize_all(records);
    log::info!(
        "account {}: {} message(s) normalized",
        account.id,
        summaries.len()
    );
    Ok(summaries)
}
