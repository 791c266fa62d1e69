//! Account configuration, credentials and the Settings form that produces them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::mail::error::MailError;

pub type AccountId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailProtocol {
    #[default]
    Imap,
    Pop3,
}

impl MailProtocol {
    pub const ALL: [MailProtocol; 2] = [MailProtocol::Imap, MailProtocol::Pop3];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Imap => "imap",
            Self::Pop3 => "pop3",
        }
    }
}

impl fmt::Display for MailProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MailProtocol {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "imap" => Ok(Self::Imap),
            "pop3" => Ok(Self::Pop3),
            other => Err(anyhow::anyhow!("unknown protocol '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailSecurity {
    /// Implicit TLS from the first byte.
    #[default]
    Ssl,
    Starttls,
    None,
}

impl MailSecurity {
    pub const ALL: [MailSecurity; 3] = [
        MailSecurity::Ssl,
        MailSecurity::Starttls,
        MailSecurity::None,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ssl => "ssl",
            Self::Starttls => "starttls",
            Self::None => "none",
        }
    }
}

impl fmt::Display for MailSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MailSecurity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ssl" | "tls" => Ok(Self::Ssl),
            "starttls" => Ok(Self::Starttls),
            "none" => Ok(Self::None),
            other => Err(anyhow::anyhow!("unknown security mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub protocol: MailProtocol,
    pub host: String,
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub security: MailSecurity,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSecret {
    pub password: String,
}

impl AccountSecret {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }
}

impl fmt::Debug for AccountSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountSecret")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What the mail backend gets to see for one fetch.
#[derive(Clone, PartialEq, Eq)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub security: MailSecurity,
}

impl MailConfig {
    pub fn new(account: &Account, secret: &AccountSecret) -> Self {
        Self {
            host: account.host.clone(),
            port: account.port,
            username: account.username.clone(),
            password: secret.password.clone(),
            security: account.security,
        }
    }

    pub fn validate(&self) -> Result<(), MailError> {
        if self.host.trim().is_empty()
            || self.username.trim().is_empty()
            || self.password.is_empty()
            || self.port == 0
        {
            return Err(MailError::InvalidConfig(
                "Missing required IMAP configuration.".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("security", &self.security)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    EmptyHost,
    InvalidPort,
    EmptyUsername,
    EmptyPassword,
}

impl FormError {
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyHost => "Mail server is required",
            Self::InvalidPort => "Port must be 1-65535",
            Self::EmptyUsername => "Username is required",
            Self::EmptyPassword => "Password is required",
        }
    }

    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyHost => "host",
            Self::InvalidPort => "port",
            Self::EmptyUsername => "username",
            Self::EmptyPassword => "password",
        }
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for FormError {}

/// Raw field values of the Settings form, port still as typed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountForm {
    pub email: String,
    pub protocol: MailProtocol,
    pub host: String,
    pub port: String,
    pub security: MailSecurity,
    pub username: String,
    pub password: String,
}

impl Default for AccountForm {
    fn default() -> Self {
        Self {
            email: String::new(),
            protocol: MailProtocol::Imap,
            host: String::new(),
            port: "993".to_string(),
            security: MailSecurity::Ssl,
            username: String::new(),
            password: String::new(),
        }
    }
}

impl fmt::Debug for AccountForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountForm")
            .field("email", &self.email)
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl AccountForm {
    pub fn from_account(account: &Account, secret: Option<&AccountSecret>) -> Self {
        Self {
            email: account.email.clone(),
            protocol: account.protocol,
            host: account.host.clone(),
            port: account.port.to_string(),
            security: account.security,
            username: account.username.clone(),
            password: secret.map(|s| s.password.clone()).unwrap_or_default(),
        }
    }

    fn port_number(&self) -> Option<u16> {
        match self.port.trim().parse::<u32>() {
            Ok(n) if (1..=65535).contains(&n) => Some(n as u16),
            _ => None,
        }
    }

    /// Reports every problem at once so the form can show them together.
    pub fn validate(&self) -> Result<u16, Vec<FormError>> {
        let mut errors = Vec::new();

        if self.host.trim().is_empty() {
            errors.push(FormError::EmptyHost);
        }
        let port = self.port_number();
        if port.is_none() {
            errors.push(FormError::InvalidPort);
        }
        if self.username.trim().is_empty() {
            errors.push(FormError::EmptyUsername);
        }
        if self.password.is_empty() {
            errors.push(FormError::EmptyPassword);
        }

        match port {
            Some(p) if errors.is_empty() => Ok(p),
            _ => Err(errors),
        }
    }

    pub fn can_save(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn build(
        &self,
        existing_id: Option<&str>,
        now_millis: i64,
    ) -> Result<(Account, AccountSecret), Vec<FormError>> {
        let port = self.validate()?;

        let id = existing_id
            .map(str::to_string)
            .unwrap_or_else(|| format!("account-{now_millis}"));
        let email = if self.email.trim().is_empty() {
            self.username.trim().to_string()
        } else {
            self.email.trim().to_string()
        };

        let account = Account {
            id,
            email,
            protocol: self.protocol,
            host: self.host.trim().to_string(),
            port,
            username: self.username.trim().to_string(),
            security: self.security,
        };
        Ok((account, AccountSecret::new(self.password.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> AccountForm {
        AccountForm {
            host: " imap.example.com ".into(),
            username: " me@example.com ".into(),
            password: " pw ".into(),
            ..AccountForm::default()
        }
    }

    #[test]
    fn empty_form_lists_every_missing_field() {
        let errors = AccountForm::default().validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                FormError::EmptyHost,
                FormError::EmptyUsername,
                FormError::EmptyPassword
            ]
        );
    }

    #[test]
    fn port_must_be_in_range() {
        for bad in ["0", "65536", "abc", "", "-1", "99.5"] {
            let mut form = filled();
            form.port = bad.into();
            assert_eq!(form.validate(), Err(vec![FormError::InvalidPort]), "{bad}");
        }
        let mut form = filled();
        form.port = "65535".into();
        assert!(form.can_save());
    }

    #[test]
    fn whitespace_only_host_is_rejected() {
        let mut form = filled();
        form.host = "   ".into();
        assert!(!form.can_save());
    }

    #[test]
    fn build_trims_and_defaults_email_to_username() {
        let (account, secret) = filled().build(None, 1234).unwrap();
        assert_eq!(account.id, "account-1234");
        assert_eq!(account.email, "me@example.com");
        assert_eq!(account.host, "imap.example.com");
        assert_eq!(account.username, "me@example.com");
        assert_eq!(account.port, 993);
        assert_eq!(secret.password, " pw ");
    }

    #[test]
    fn build_keeps_existing_id() {
        let mut form = filled();
        form.email = "display@example.com".into();
        let (account, _) = form.build(Some("account-1"), 99).unwrap();
        assert_eq!(account.id, "account-1");
        assert_eq!(account.email, "display@example.com");
    }

    #[test]
    fn from_account_round_trips_through_build() {
        let (account, secret) = filled().build(None, 7).unwrap();
        let form = AccountForm::from_account(&account, Some(&secret));
        let (again, _) = form.build(Some(&account.id), 8).unwrap();
        assert_eq!(again, account);
    }

    #[test]
    fn mail_config_rejects_missing_fields() {
        let (account, secret) = filled().build(None, 1).unwrap();
        let mut cfg = MailConfig::new(&account, &secret);
        assert!(cfg.validate().is_ok());
        cfg.port = 0;
        assert!(matches!(cfg.validate(), Err(MailError::InvalidConfig(_))));
    }

    #[test]
    fn whitespace_password_is_accepted_by_form_and_fetch() {
        let mut form = filled();
        form.password = "   ".into();
        let (account, secret) = form.build(None, 1).unwrap();
        assert!(MailConfig::new(&account, &secret).validate().is_ok());

        form.password.clear();
        assert_eq!(form.validate(), Err(vec![FormError::EmptyPassword]));
    }

    #[test]
    fn secrets_stay_out_of_debug_output() {
        let secret = AccountSecret::new("hunter2");
        assert!(!format!("{secret:?}").contains("hunter2"));
    }

    #[test]
    fn protocol_and_security_parse_case_insensitively() {
        assert_eq!("IMAP".parse::<MailProtocol>().unwrap(), MailProtocol::Imap);
        assert_eq!(
            "StartTLS".parse::<MailSecurity>().unwrap(),
            MailSecurity::Starttls
        );
        assert!("smtp".parse::<MailProtocol>().is_err());
    }
}
