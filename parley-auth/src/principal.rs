// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// The authenticated user whose access is being evaluated.
///
/// Constructed once per request from the session, see [`crate::session::SessionUser`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub email: String,
    pub is_admin: bool,
    pub groups: HashSet<String>,
}

impl Principal {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            is_admin: false,
            groups: HashSet::new(),
        }
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_member_of(&self, group_id: &str) -> bool {
        self.groups.contains(group_id)
    }
}
