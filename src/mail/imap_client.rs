use anyhow::{Result, anyhow};
use chrono::{TimeZone, Utc};
use imap::types::{Fetch, Flag};
use native_tls::TlsConnector;
use serde_json::{Value, json};
use std::io::{Read, Write};
use std::net::TcpStream;

use crate::domain::account::{MailConfig, MailSecurity};
use crate::mail::backend::MailBackend;
use crate::mail::decoders::decode_header_value;

/// Password-authenticated IMAP backend: unread messages of one mailbox, headers only.
pub struct ImapBackend {
    pub mailbox: String,
}

impl ImapBackend {
    pub fn new(mailbox: impl Into<String>) -> Self {
        Self {
            mailbox: mailbox.into(),
        }
    }

    fn with_session<T: Read + Write>(
        &self,
        client: imap::Client<T>,
        config: &MailConfig,
    ) -> Result<Vec<Value>> {
        let mut session = client
            .login(&config.username, &config.password)
            .map_err(|(e, _)| anyhow!("IMAP login failed: {e}"))?;
        let out = unread_records(&mut session, &self.mailbox);
        if let Err(e) = session.logout() {
            log::debug!("logout failed: {e}");
        }
        out
    }
}

impl Default for ImapBackend {
    fn default() -> Self {
        Self::new("INBOX")
    }
}

impl MailBackend for ImapBackend {
    fn fetch_unread(&self, config: &MailConfig) -> Result<Vec<Value>> {
        let addr = (config.host.as_str(), config.port);
        log::info!(
            "connecting to {}:{} ({})",
            config.host,
            config.port,
            config.security
        );

        match config.security {
            MailSecurity::Ssl => {
                let tls = TlsConnector::builder().build()?;
                let client = imap::connect(addr, config.host.as_str(), &tls)?;
                self.with_session(client, config)
            }
            MailSecurity::Starttls => {
                let tls = TlsConnector::builder().build()?;
                let client = imap::connect_starttls(addr, config.host.as_str(), &tls)?;
                self.with_session(client, config)
            }
            MailSecurity::None => {
                log::warn!("connecting to {} without TLS", config.host);
                let mut client = imap::Client::new(TcpStream::connect(addr)?);
                client.read_greeting()?;
                self.with_session(client, config)
            }
        }
    }
}

fn unread_records<T: Read + Write>(
    session: &mut imap::Session<T>,
    mailbox: &str,
) -> Result<Vec<Value>> {
    session.select(mailbox)?;

    let uids: Vec<u32> = session.uid_search("UNSEEN")?.into_iter().collect();
    if uids.is_empty() {
        return Ok(vec![]);
    }

    let set = uids
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let fetches = session.uid_fetch(&set, "(UID FLAGS ENVELOPE)")?;

    let mut out: Vec<Value> = fetches.iter().map(fetch_to_record).collect();
    // newest first
    out.sort_by_key(|r| std::cmp::Reverse(r["id"].as_u64().unwrap_or(0)));
    log::info!("{} unread message(s) in {mailbox}", out.len());
    Ok(out)
}

fn fetch_to_record(f: &Fetch) -> Value {
    let envelope = f.envelope();

    let subject = envelope
        .and_then(|env| env.subject)
        .map(decode_header_value)
        .unwrap_or_default();

    let from = envelope
        .and_then(|env| env.from.as_ref())
        .and_then(|froms| froms.first())
        .map(|addr| {
            let name = addr.name.map(decode_header_value).unwrap_or_default();
            let mailbox = match (addr.mailbox, addr.host) {
                (Some(m), Some(h)) => format!(
                    "{}@{}",
                    String::from_utf8_lossy(m),
                    String::from_utf8_lossy(h)
                ),
                (Some(m), None) => String::from_utf8_lossy(m).into_owned(),
                _ => String::new(),
            };
            format_address(name.trim(), mailbox.trim())
        })
        .unwrap_or_default();

    let date = envelope
        .and_then(|env| env.date)
        .map(|d| utc_timestamp(&String::from_utf8_lossy(d)))
        .unwrap_or_default();

    let unread = !f.flags().iter().any(|flag| *flag == Flag::Seen);

    json!({
        "id": f.uid.unwrap_or(f.message),
        "from": from,
        "subject": subject,
        "date": date,
        "unread": unread,
    })
}

fn format_address(name: &str, mailbox: &str) -> String {
    match (name.is_empty(), mailbox.is_empty()) {
        (false, false) => format!("{name} <{mailbox}>"),
        (true, false) => mailbox.to_string(),
        _ => name.to_string(),
    }
}

/// RFC 2822 date header to `YYYY-MM-DDTHH:MM:SSZ`, empty when unparsable.
fn utc_timestamp(header: &str) -> String {
    mailparse::dateparse(header)
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .map(|d| d.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_prefers_name_and_mailbox_together() {
        assert_eq!(format_address("Ann", "ann@x.com"), "Ann <ann@x.com>");
        assert_eq!(format_address("", "ann@x.com"), "ann@x.com");
        assert_eq!(format_address("Ann", ""), "Ann");
        assert_eq!(format_address("", ""), "");
    }

    #[test]
    fn date_header_becomes_utc_timestamp() {
        assert_eq!(
            utc_timestamp("Tue, 14 Nov 2023 22:13:20 +0000"),
            "2023-11-14T22:13:20Z"
        );
        assert_eq!(
            utc_timestamp("Wed, 15 Nov 2023 01:13:20 +0300"),
            "2023-11-14T22:13:20Z"
        );
    }
}
