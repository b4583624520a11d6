// SPDX-License-Identifier: MIT OR Apache-2.0

//! Claims carried in the JWT session token and the session user derived from them.
use serde::{Deserialize, Serialize};

use crate::principal::Principal;
use crate::profile::UserProfile;

/// Claims of the session token.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_groups: Option<Vec<String>>,
}

impl TokenClaims {
    /// Update the claims after a token was issued or refreshed.
    ///
    /// `user` is only present right after signing in. Later refreshes keep the claims as they
    /// are, so group membership is fixed for the lifetime of the session.
    pub fn apply_user(mut self, user: Option<&UserProfile>) -> Self {
        let Some(user) = user else {
            return self;
        };

        self.sub = Some(user.id.clone());
        self.name = user.name.clone();
        self.email = Some(user.email.clone());
        self.picture = user.image.clone();

        if user.is_admin {
            self.is_admin = Some(true);
        }
        self.access_groups = Some(user.access_groups.clone());

        self
    }
}

/// User attached to the session handed to route handlers and pages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    pub is_admin: bool,
    pub access_groups: Vec<String>,
}

impl SessionUser {
    pub fn from_claims(claims: &TokenClaims) -> Self {
        Self {
            name: claims.name.clone(),
            email: claims.email.clone(),
            image: claims.picture.clone(),
            is_admin: claims.is_admin.unwrap_or(false),
            access_groups: claims.access_groups.clone().unwrap_or_default(),
        }
    }

    /// Principal used for access checks. A session without an email can't be evaluated.
    pub fn principal(&self) -> Option<Principal> {
        let email = self.email.as_ref().filter(|email| !email.is_empty())?;

        Some(
            Principal::new(email.clone())
                .with_admin(self.is_admin)
                .with_groups(self.access_groups.iter().cloned()),
        )
    }
}
