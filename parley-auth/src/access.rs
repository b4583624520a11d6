// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashSet;
use std::fmt::Display;

use tracing::trace;

use crate::entry::{AccessControlEntry, AccessType};
use crate::principal::Principal;
use crate::resource::ResourcePermissions;

/// Outcome of a view or edit check together with the rule which decided it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessDecision {
    /// Resource is not private and can be viewed by anyone.
    Public,

    /// Principal is an administrator.
    Admin,

    /// Principal created the resource.
    Owner,

    /// Principal is a member of a group listed in the resource's entries.
    Group,

    /// No rule granted access.
    Denied,

    /// No principal was given for a check which requires one.
    Unauthenticated,
}

impl AccessDecision {
    /// Access was granted by any rule.
    pub fn is_granted(&self) -> bool {
        matches!(
            self,
            AccessDecision::Public
                | AccessDecision::Admin
                | AccessDecision::Owner
                | AccessDecision::Group
        )
    }
}

impl Display for AccessDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AccessDecision::Public => "public",
            AccessDecision::Admin => "admin",
            AccessDecision::Owner => "owner",
            AccessDecision::Group => "group",
            AccessDecision::Denied => "denied",
            AccessDecision::Unauthenticated => "unauthenticated",
        };

        write!(f, "{}", s)
    }
}

/// Returns `true` if any entry matches the requester.
///
/// Individual entries match on exact (case-sensitive) email equality, group entries match when
/// the requester is a member of that group.
pub fn has_access(
    entries: &[AccessControlEntry],
    requester_email: &str,
    requester_groups: &HashSet<String>,
) -> bool {
    entries.iter().any(|entry| match entry.access_type() {
        AccessType::Individual => entry.value() == requester_email,
        AccessType::Group => requester_groups.contains(entry.value()),
    })
}

/// Returns `true` if at least one of the allowed groups is one of the user's groups.
///
/// An empty list of allowed groups never grants access.
pub fn has_group_access<S: AsRef<str>>(user_groups: &HashSet<String>, allowed_groups: &[S]) -> bool {
    if allowed_groups.is_empty() {
        return false;
    }

    allowed_groups
        .iter()
        .any(|group_id| user_groups.contains(group_id.as_ref()))
}

/// Decide if the principal may view the resource.
///
/// Public resources are visible to everyone, including unauthenticated callers. Private
/// resources require a principal which is an admin, the owner or a member of a group listed in
/// the view entries.
pub fn view_decision(principal: Option<&Principal>, resource: &ResourcePermissions) -> AccessDecision {
    let decision = if !resource.is_private {
        AccessDecision::Public
    } else {
        match principal {
            Some(principal) => decide(principal, resource, &resource.view_groups()),
            None => AccessDecision::Unauthenticated,
        }
    };

    trace!(
        owner = %resource.owner_identifier,
        is_private = resource.is_private,
        %decision,
        "view access decided"
    );

    decision
}

/// Decide if the principal may edit the resource.
///
/// Unlike viewing this is never short-circuited by the resource being public.
pub fn edit_decision(principal: Option<&Principal>, resource: &ResourcePermissions) -> AccessDecision {
    let decision = match principal {
        Some(principal) => decide(principal, resource, &resource.edit_groups()),
        None => AccessDecision::Unauthenticated,
    };

    trace!(
        owner = %resource.owner_identifier,
        %decision,
        "edit access decided"
    );

    decision
}

pub fn can_view(principal: Option<&Principal>, resource: &ResourcePermissions) -> bool {
    view_decision(principal, resource).is_granted()
}

pub fn can_edit(principal: Option<&Principal>, resource: &ResourcePermissions) -> bool {
    edit_decision(principal, resource).is_granted()
}

fn decide(
    principal: &Principal,
    resource: &ResourcePermissions,
    allowed_groups: &[&str],
) -> AccessDecision {
    if principal.is_admin {
        AccessDecision::Admin
    } else if resource.owner_identifier == principal.email {
        AccessDecision::Owner
    } else if has_group_access(&principal.groups, allowed_groups) {
        AccessDecision::Group
    } else {
        AccessDecision::Denied
    }
}
