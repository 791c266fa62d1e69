//! Turns the loosely shaped records a mail backend returns into [`EmailSummary`].
//!
//! Field names differ between backend versions, so every attribute is looked up
//! in a fixed list of candidate keys. Resolving from anything but the first
//! candidate is logged at debug level: a silent fallback can hide a changed
//! backend contract just as easily as it can absorb a harmless rename.

use chrono::{Local, TimeZone};
use serde_json::{Map, Value};

use crate::domain::email::EmailSummary;

const ID_KEYS: &[&str] = &["id", "uid", "messageId", "message_id", "messageID", "msgid"];
const FROM_KEYS: &[&str] = &["from", "sender", "fromAddress"];
const SUBJECT_KEYS: &[&str] = &["subject", "title", "snippetSubject"];
const SNIPPET_KEYS: &[&str] = &["snippet", "preview", "bodyPreview", "summary"];
const DATE_KEYS: &[&str] = &["receivedAt", "date", "internalDate"];

const NAME_KEYS: &[&str] = &["name", "displayName"];
const ADDRESS_KEYS: &[&str] = &["email", "address"];

pub const UNKNOWN_SENDER: &str = "Unknown sender";
pub const NO_SUBJECT: &str = "(no subject)";
pub const UNKNOWN_DATE: &str = "Unknown";

/// Values below this are epoch seconds, anything else epoch milliseconds.
const MILLIS_THRESHOLD: f64 = 1e12;

/// A raw record decoded once at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum RawMessage {
    Record(Map<String, Value>),
    Unrecognized(Value),
}

impl From<Value> for RawMessage {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => RawMessage::Record(map),
            other => RawMessage::Unrecognized(other),
        }
    }
}

pub fn normalize_all(records: Vec<Value>) -> Vec<EmailSummary> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, value)| to_email_summary(RawMessage::from(value), index))
        .collect()
}

pub fn to_email_summary(raw: RawMessage, index: usize) -> EmailSummary {
    let empty = Map::new();
    let record = match &raw {
        RawMessage::Record(map) => map,
        RawMessage::Unrecognized(value) => {
            log::warn!(
                "record {index}: expected an object, got {}; using defaults",
                kind_of(value)
            );
            &empty
        }
    };

    let id = first_resolved(record, ID_KEYS, "id", scalar_text)
        .unwrap_or_else(|| format!("message-{index}"));
    let from = first_resolved(record, FROM_KEYS, "from", format_from)
        .unwrap_or_else(|| UNKNOWN_SENDER.to_string());
    let subject = first_resolved(record, SUBJECT_KEYS, "subject", non_blank_string)
        .unwrap_or_else(|| NO_SUBJECT.to_string());
    let snippet =
        first_resolved(record, SNIPPET_KEYS, "snippet", non_blank_string).unwrap_or_default();
    let received_at = format_received_at(first_present(record, DATE_KEYS, "receivedAt"));

    EmailSummary {
        id,
        from,
        subject,
        snippet,
        received_at,
        unread: resolve_unread(record),
    }
}

fn first_resolved(
    record: &Map<String, Value>,
    keys: &[&str],
    attribute: &str,
    resolve: impl Fn(&Value) -> Option<String>,
) -> Option<String> {
    for (pos, key) in keys.iter().enumerate() {
        let Some(text) = record.get(*key).and_then(&resolve) else {
            continue;
        };
        if pos > 0 {
            log::debug!("{attribute} resolved from fallback field `{key}`");
        }
        return Some(text);
    }
    None
}

/// First candidate that is present, not null and not an empty string.
fn first_present<'a>(
    record: &'a Map<String, Value>,
    keys: &[&str],
    attribute: &str,
) -> Option<&'a Value> {
    for (pos, key) in keys.iter().enumerate() {
        match record.get(*key) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) if s.is_empty() => continue,
            Some(value) => {
                if pos > 0 {
                    log::debug!("{attribute} resolved from fallback field `{key}`");
                }
                return Some(value);
            }
        }
    }
    None
}

fn non_blank_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => non_blank_string(value),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn format_from(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => non_blank_string(value),
        Value::Array(items) => items.first().and_then(format_from),
        Value::Object(map) => {
            let name = NAME_KEYS.iter().find_map(|k| map.get(*k).and_then(non_blank_string));
            let email = ADDRESS_KEYS
                .iter()
                .find_map(|k| map.get(*k).and_then(non_blank_string));
            match (name, email) {
                (Some(name), Some(email)) => Some(format!("{name} <{email}>")),
                (name, email) => name.or(email),
            }
        }
        _ => None,
    }
}

fn format_received_at(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n
            .as_f64()
            .and_then(epoch_to_local_date)
            .unwrap_or_else(|| UNKNOWN_DATE.to_string()),
        _ => UNKNOWN_DATE.to_string(),
    }
}

fn epoch_to_local_date(raw: f64) -> Option<String> {
    if !raw.is_finite() {
        return None;
    }
    let millis = if raw < MILLIS_THRESHOLD { raw * 1000.0 } else { raw };
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    let date = Local.timestamp_millis_opt(millis as i64).single()?;
    Some(date.format("%Y-%m-%d").to_string())
}

fn resolve_unread(record: &Map<String, Value>) -> Option<bool> {
    if let Some(Value::Bool(b)) = record.get("unread") {
        return Some(*b);
    }
    if let Some(Value::Bool(b)) = record.get("isUnread") {
        log::debug!("unread resolved from fallback field `isUnread`");
        return Some(*b);
    }
    if let Some(Value::Bool(b)) = record.get("isRead") {
        log::debug!("unread resolved from fallback field `isRead`");
        return Some(!b);
    }
    None
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
