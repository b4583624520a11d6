// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

use crate::entry::AccessControlEntry;

/// Permission context of a shared resource as read from storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePermissions {
    pub is_private: bool,

    /// Email of the user who created the resource.
    pub owner_identifier: String,

    pub view_entries: Vec<AccessControlEntry>,

    pub edit_entries: Vec<AccessControlEntry>,
}

impl ResourcePermissions {
    pub fn public(owner_identifier: impl Into<String>) -> Self {
        Self {
            is_private: false,
            owner_identifier: owner_identifier.into(),
            ..Default::default()
        }
    }

    pub fn private(owner_identifier: impl Into<String>) -> Self {
        Self {
            is_private: true,
            owner_identifier: owner_identifier.into(),
            ..Default::default()
        }
    }

    pub fn with_view_entries(mut self, entries: Vec<AccessControlEntry>) -> Self {
        self.view_entries = entries;
        self
    }

    pub fn with_edit_entries(mut self, entries: Vec<AccessControlEntry>) -> Self {
        self.edit_entries = entries;
        self
    }

    /// Group identifiers granted view access.
    pub fn view_groups(&self) -> Vec<&str> {
        group_values(&self.view_entries)
    }

    /// Group identifiers granted edit access.
    pub fn edit_groups(&self) -> Vec<&str> {
        group_values(&self.edit_entries)
    }
}

fn group_values(entries: &[AccessControlEntry]) -> Vec<&str> {
    entries
        .iter()
        .filter(|entry| entry.is_group())
        .map(|entry| entry.value())
        .collect()
}
