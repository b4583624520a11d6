// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of identifiers generated by [`unique_id`].
pub const UNIQUE_ID_LEN: usize = 36;

/// Generate a random identifier of [`UNIQUE_ID_LEN`] alphanumeric characters.
pub fn unique_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(UNIQUE_ID_LEN)
        .map(char::from)
        .collect()
}

/// The kind of principal an access control entry refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessType {
    /// Entry value is the email address of a single user.
    Individual,

    /// Entry value is the identifier of a group of users.
    Group,
}

impl Display for AccessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AccessType::Individual => "INDIVIDUAL",
            AccessType::Group => "GROUP",
        };

        write!(f, "{}", s)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum EntryError {
    #[error("access value cannot be empty")]
    EmptyValue,
}

/// A single rule granting access to either an individual or a group.
///
/// Entries are immutable once constructed and their value is never empty. Deserialization
/// enforces the same invariant as [`AccessControlEntry::new`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawEntry")]
pub struct AccessControlEntry {
    id: String,
    value: String,
    #[serde(rename = "type")]
    access_type: AccessType,
}

impl AccessControlEntry {
    /// Create an entry with a freshly generated identifier.
    pub fn new(value: impl Into<String>, access_type: AccessType) -> Result<Self, EntryError> {
        Self::with_id(unique_id(), value, access_type)
    }

    /// Create an entry with a known identifier, for example when restoring persisted state.
    pub fn with_id(
        id: impl Into<String>,
        value: impl Into<String>,
        access_type: AccessType,
    ) -> Result<Self, EntryError> {
        let value = value.into();
        if value.is_empty() {
            return Err(EntryError::EmptyValue);
        }

        Ok(Self {
            id: id.into(),
            value,
            access_type,
        })
    }

    /// Entry granting access to a single user identified by email.
    pub fn individual(email: impl Into<String>) -> Result<Self, EntryError> {
        Self::new(email, AccessType::Individual)
    }

    /// Entry granting access to all members of a group.
    pub fn group(group_id: impl Into<String>) -> Result<Self, EntryError> {
        Self::new(group_id, AccessType::Group)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn access_type(&self) -> AccessType {
        self.access_type
    }

    pub fn is_individual(&self) -> bool {
        matches!(self.access_type, AccessType::Individual)
    }

    pub fn is_group(&self) -> bool {
        matches!(self.access_type, AccessType::Group)
    }
}

#[derive(Deserialize)]
struct RawEntry {
    /// Some legacy records were stored without identifiers.
    #[serde(default)]
    id: Option<String>,
    value: String,
    #[serde(rename = "type")]
    access_type: AccessType,
}

impl TryFrom<RawEntry> for AccessControlEntry {
    type Error = EntryError;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        match raw.id.filter(|id| !id.is_empty()) {
            Some(id) => Self::with_id(id, raw.value, raw.access_type),
            None => Self::new(raw.value, raw.access_type),
        }
    }
}
