// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of identity-provider profiles to the user record stored in the session.
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::provider::AdminEmails;
use crate::traits::GroupDirectory;

#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("{0} profile does not contain an email address")]
    MissingEmail(&'static str),
}

/// User as known to the application after signing in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: Option<String>,
    pub email: String,

    /// Profile picture as data URI.
    pub image: Option<String>,

    pub is_admin: bool,

    /// Lower-cased identifiers of the groups the user belongs to.
    pub access_groups: Vec<String>,
}

/// Subset of the GitHub user profile.
#[derive(Clone, Debug, Deserialize)]
pub struct GitHubProfile {
    pub id: u64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// Subset of the Azure AD ID token claims.
#[derive(Clone, Debug, Deserialize)]
pub struct AzureAdProfile {
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub preferred_username: Option<String>,
}

/// Credentials submitted to the local development provider. The password is never checked.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LocalCredentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Username used by the local development provider when none was submitted.
pub const DEFAULT_DEV_USERNAME: &str = "dev";

/// Stable user id derived from an email address, hex encoded.
pub fn hashed_user_id(email: &str) -> String {
    blake3::hash(email.as_bytes()).to_hex().to_string()
}

/// Lower-case, trim and drop empty group identifiers.
pub fn normalize_groups<I, S>(groups: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    groups
        .into_iter()
        .map(|group| group.as_ref().trim().to_lowercase())
        .filter(|group| !group.is_empty())
        .collect()
}

/// Turns provider profiles into [`UserProfile`]s, flagging administrators.
#[derive(Clone, Debug)]
pub struct ProfileMapper<'a> {
    admin_emails: &'a AdminEmails,
}

impl<'a> ProfileMapper<'a> {
    pub fn new(admin_emails: &'a AdminEmails) -> Self {
        Self { admin_emails }
    }

    /// GitHub users never belong to access groups.
    pub fn github(
        &self,
        profile: GitHubProfile,
        image: Option<String>,
    ) -> Result<UserProfile, ProfileError> {
        let email = profile
            .email
            .filter(|email| !email.is_empty())
            .ok_or(ProfileError::MissingEmail("github"))?;

        let user = UserProfile {
            id: profile.id.to_string(),
            name: profile.name.or(Some(profile.login)),
            is_admin: self.admin_emails.contains(&email),
            email,
            image,
            access_groups: Vec::new(),
        };

        debug!(id = %user.id, is_admin = user.is_admin, "github profile mapped");
        Ok(user)
    }

    /// Azure AD users are admins if either their email or their preferred username is listed.
    /// Their access groups are looked up in the directory; a failing lookup leaves them without
    /// groups rather than failing the sign-in.
    pub async fn azure_ad<D>(
        &self,
        profile: AzureAdProfile,
        access_token: &str,
        directory: &D,
        image: Option<String>,
    ) -> Result<UserProfile, ProfileError>
    where
        D: GroupDirectory,
    {
        let is_admin = [&profile.email, &profile.preferred_username]
            .into_iter()
            .flatten()
            .any(|email| self.admin_emails.contains(email));

        let email = profile
            .email
            .filter(|email| !email.is_empty())
            .or(profile.preferred_username.filter(|name| !name.is_empty()))
            .ok_or(ProfileError::MissingEmail("azure-ad"))?;

        let access_groups = match directory.member_groups(access_token).await {
            Ok(groups) => normalize_groups(groups),
            Err(err) => {
                error!("failed to fetch user groups: {err}");
                Vec::new()
            }
        };

        let user = UserProfile {
            id: profile.sub,
            name: profile.name,
            email,
            image,
            is_admin,
            access_groups,
        };

        debug!(
            id = %user.id,
            is_admin = user.is_admin,
            groups = user.access_groups.len(),
            "azure ad profile mapped"
        );
        Ok(user)
    }

    /// Accepts any username and makes a `<username>@localhost` user out of it.
    pub fn local_dev(&self, credentials: LocalCredentials) -> UserProfile {
        let username = credentials
            .username
            .filter(|username| !username.is_empty())
            .unwrap_or_else(|| DEFAULT_DEV_USERNAME.to_string());
        let email = format!("{username}@localhost");

        let user = UserProfile {
            id: hashed_user_id(&email),
            name: Some(username),
            is_admin: self.admin_emails.contains(&email),
            email,
            image: None,
            access_groups: Vec::new(),
        };

        debug!(email = %user.email, is_admin = user.is_admin, "local dev user signed in");
        user
    }
}
