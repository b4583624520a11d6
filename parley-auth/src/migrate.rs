// SPDX-License-Identifier: MIT OR Apache-2.0

//! Migration of persisted permission lists into [`AccessControlEntry`] sequences.
//!
//! Older resources stored their permissions as a single string: either a comma-separated list of
//! emails or a JSON document holding such a string or an array of entries. Newer resources
//! store the entries directly. Both shapes deserialize into [`AccessControlInput`].
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::entry::AccessControlEntry;

/// Permission data as found in storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccessControlInput {
    /// Already structured entries.
    Entries(Vec<AccessControlEntry>),

    /// String-encoded legacy data.
    Legacy(String),
}

impl From<Vec<AccessControlEntry>> for AccessControlInput {
    fn from(entries: Vec<AccessControlEntry>) -> Self {
        Self::Entries(entries)
    }
}

impl From<String> for AccessControlInput {
    fn from(value: String) -> Self {
        Self::Legacy(value)
    }
}

impl From<&str> for AccessControlInput {
    fn from(value: &str) -> Self {
        Self::Legacy(value.to_owned())
    }
}

/// Result of interpreting a legacy permission string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LegacyAccessData {
    /// The string held a JSON array of entries.
    Structured(Vec<AccessControlEntry>),

    /// The string held a JSON string which is a comma-separated list of emails.
    CommaSeparated(String),

    /// The string is not JSON (or JSON of an unexpected shape) and is read as a comma-separated
    /// list of emails as-is.
    Unparseable(String),
}

impl LegacyAccessData {
    pub fn parse(input: &str) -> Self {
        match serde_json::from_str::<Value>(input) {
            Ok(Value::Array(items)) => Self::Structured(structured_entries(items)),
            Ok(Value::String(emails)) => Self::CommaSeparated(emails),
            Ok(Value::Null) => Self::Structured(Vec::new()),
            Ok(_) | Err(_) => Self::Unparseable(input.to_owned()),
        }
    }

    pub fn into_entries(self) -> Vec<AccessControlEntry> {
        match self {
            Self::Structured(entries) => entries,
            Self::CommaSeparated(emails) | Self::Unparseable(emails) => {
                parse_comma_separated(&emails)
            }
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Self::Structured(_) => "structured",
            Self::CommaSeparated(_) => "comma_separated",
            Self::Unparseable(_) => "unparseable",
        }
    }
}

/// Turn persisted permission data of any known shape into a list of entries.
///
/// This never fails: data which can't be understood degrades to a best-effort comma-separated
/// reading or to an empty list.
pub fn migrate_access_control_data(input: Option<AccessControlInput>) -> Vec<AccessControlEntry> {
    match input {
        None => Vec::new(),
        Some(AccessControlInput::Entries(entries)) => entries,
        Some(AccessControlInput::Legacy(value)) => {
            if value.trim().is_empty() {
                return Vec::new();
            }

            let parsed = LegacyAccessData::parse(&value);
            debug!(variant = parsed.variant_name(), "migrating legacy access data");
            parsed.into_entries()
        }
    }
}

fn structured_entries(items: Vec<Value>) -> Vec<AccessControlEntry> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("dropping invalid access control entry: {err}");
                None
            }
        })
        .collect()
}

fn parse_comma_separated(emails: &str) -> Vec<AccessControlEntry> {
    emails
        .split(',')
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .filter_map(|email| AccessControlEntry::individual(email).ok())
        .collect()
}
