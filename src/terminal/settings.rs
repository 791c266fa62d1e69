use crate::domain::account::{
    Account, AccountForm, AccountSecret, FormError, MailProtocol, MailSecurity,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Protocol,
    Security,
    Host,
    Port,
    Username,
    Password,
    Email,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Protocol,
        Field::Security,
        Field::Host,
        Field::Port,
        Field::Username,
        Field::Password,
        Field::Email,
    ];

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Protocol => "Protocol",
            Self::Security => "Security",
            Self::Host => "Mail server",
            Self::Port => "Port",
            Self::Username => "Username",
            Self::Password => "Password",
            Self::Email => "Account email (optional)",
        }
    }

    pub const fn is_choice(&self) -> bool {
        matches!(self, Self::Protocol | Self::Security)
    }
}

pub const HELPER_TEXT: &str = "Enter a host, port, username, and password to enable saving.";
pub const SAVED_TEXT: &str = "Saved. Switch to Inbox to sync.";

#[derive(Debug, Default)]
pub struct SettingsState {
    pub form: AccountForm,
    pub focus: usize,
    /// Id of the account being edited; `None` creates a new one.
    pub editing_id: Option<String>,
    pub message: Option<String>,
}

impl SettingsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, account: Option<&Account>, secret: Option<&AccountSecret>) {
        match account {
            Some(a) => {
                self.form = AccountForm::from_account(a, secret);
                self.editing_id = Some(a.id.clone());
            }
            None => {
                self.form = AccountForm::default();
                self.editing_id = None;
            }
        }
        self.focus = 0;
        self.message = None;
    }

    pub fn focused(&self) -> Field {
        Field::ALL[self.focus]
    }

    pub fn move_focus(&mut self, delta: i32) {
        let len = Field::ALL.len() as i32;
        self.focus = (self.focus as i32 + delta).rem_euclid(len) as usize;
    }

    pub fn cycle_choice(&mut self, delta: i32) {
        match self.focused() {
            Field::Protocol => {
                self.form.protocol = cycle(&MailProtocol::ALL, self.form.protocol, delta)
            }
            Field::Security => {
                self.form.security = cycle(&MailSecurity::ALL, self.form.security, delta)
            }
            _ => {}
        }
    }

    pub fn input_char(&mut self, c: char) {
        if let Some(text) = self.text_field_mut() {
            text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(text) = self.text_field_mut() {
            text.pop();
        }
    }

    fn text_field_mut(&mut self) -> Option<&mut String> {
        match self.focused() {
            Field::Host => Some(&mut self.form.host),
            Field::Port => Some(&mut self.form.port),
            Field::Username => Some(&mut self.form.username),
            Field::Password => Some(&mut self.form.password),
            Field::Email => Some(&mut self.form.email),
            Field::Protocol | Field::Security => None,
        }
    }

    /// Text shown for a field; the password is masked.
    pub fn display_value(&self, field: Field) -> String {
        match field {
            Field::Protocol => self.form.protocol.as_str().to_uppercase(),
            Field::Security => self.form.security.as_str().to_uppercase(),
            Field::Host => self.form.host.clone(),
            Field::Port => self.form.port.clone(),
            Field::Username => self.form.username.clone(),
            Field::Password => "•".repeat(self.form.password.chars().count()),
            Field::Email => self.form.email.clone(),
        }
    }

    /// Builds the account to save, or records why it cannot be saved yet.
    pub fn prepare_save(&mut self, now_millis: i64) -> Option<(Account, AccountSecret)> {
        match self.form.build(self.editing_id.as_deref(), now_millis) {
            Ok(pair) => Some(pair),
            Err(errors) => {
                self.message = Some(join_errors(&errors));
                None
            }
        }
    }

    pub fn saved(&mut self, account: &Account) {
        self.editing_id = Some(account.id.clone());
        self.message = Some(SAVED_TEXT.to_string());
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, delta: i32) -> T {
    let pos = all.iter().position(|x| *x == current).unwrap_or(0) as i32;
    let len = all.len() as i32;
    all[(pos + delta).rem_euclid(len) as usize]
}

fn join_errors(errors: &[FormError]) -> String {
    errors
        .iter()
        .map(FormError::message)
        .collect::<Vec<_>>()
        .join("; ")
}
