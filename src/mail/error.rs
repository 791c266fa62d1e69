use thiserror::Error;

use crate::domain::account::MailProtocol;

/// Errors the inbox surfaces to the user.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("POP3 sync is not supported yet. Use IMAP for now.")]
    UnsupportedProtocol(MailProtocol),

    #[error("{0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Fetch(String),
}

impl MailError {
    /// Raised before any connection attempt.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::UnsupportedProtocol(_) | Self::InvalidConfig(_))
    }
}
