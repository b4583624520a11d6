// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access control for shared chat resources.
//!
//! Resources (extensions, prompts, documents) carry an `is_private` flag, an owner and two lists
//! of [`AccessControlEntry`] granting view or edit rights to individuals or groups. The functions
//! in this crate decide whether a [`Principal`] may view or edit such a resource and migrate
//! permission lists persisted in older, string-encoded formats.
//!
//! Principals are derived from identity-provider profiles and JWT session claims, see
//! [`profile`], [`session`] and [`provider`].
mod access;
mod entry;
mod migrate;
mod principal;
pub mod profile;
pub mod provider;
mod resource;
pub mod session;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
pub mod traits;

pub use access::{
    AccessDecision, can_edit, can_view, edit_decision, has_access, has_group_access,
    view_decision,
};
pub use entry::{AccessControlEntry, AccessType, EntryError, unique_id};
pub use migrate::{AccessControlInput, LegacyAccessData, migrate_access_control_data};
pub use principal::Principal;
pub use resource::ResourcePermissions;
