// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity-provider configuration resolved once at startup.
//!
//! Which providers are offered on the sign-in page depends solely on which credentials are
//! present in the environment:
//!
//! | Provider  | Required variables                                                     |
//! |-----------|------------------------------------------------------------------------|
//! | GitHub    | `AUTH_GITHUB_ID`, `AUTH_GITHUB_SECRET`                                 |
//! | Azure AD  | `AZURE_AD_CLIENT_ID`, `AZURE_AD_CLIENT_SECRET`, `AZURE_AD_TENANT_ID`   |
//! | Local dev | `NODE_ENV=development`                                                 |
//!
//! Empty variables count as absent.
use std::collections::HashSet;
use std::fmt::{self, Debug, Display};

use thiserror::Error;
use tracing::{debug, warn};

pub const AUTH_GITHUB_ID: &str = "AUTH_GITHUB_ID";
pub const AUTH_GITHUB_SECRET: &str = "AUTH_GITHUB_SECRET";
pub const AZURE_AD_CLIENT_ID: &str = "AZURE_AD_CLIENT_ID";
pub const AZURE_AD_CLIENT_SECRET: &str = "AZURE_AD_CLIENT_SECRET";
pub const AZURE_AD_TENANT_ID: &str = "AZURE_AD_TENANT_ID";
pub const ADMIN_EMAIL_ADDRESS: &str = "ADMIN_EMAIL_ADDRESS";
pub const NEXTAUTH_SECRET: &str = "NEXTAUTH_SECRET";
pub const NODE_ENV: &str = "NODE_ENV";

/// OAuth scope requested from Azure AD. Group membership is needed to resolve access groups.
pub const AZURE_AD_SCOPE: &str = "openid profile User.Read GroupMember.Read.All";

#[derive(Debug, Error, PartialEq)]
pub enum ProviderConfigError {
    #[error("{provider} is partially configured, missing {}", .missing.join(", "))]
    Incomplete {
        provider: ProviderKind,
        missing: Vec<&'static str>,
    },

    #[error("no identity provider is configured")]
    NoProviders,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderKind {
    GitHub,
    AzureAd,
    LocalDev,
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProviderKind::GitHub => "github",
            ProviderKind::AzureAd => "azure-ad",
            ProviderKind::LocalDev => "localdev",
        };

        write!(f, "{}", s)
    }
}

/// Session persistence strategy. Sessions are encoded as signed JWTs, see
/// [`crate::session::TokenClaims`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionStrategy {
    #[default]
    Jwt,
}

#[derive(Clone, PartialEq, Eq)]
pub struct GitHubCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Debug for GitHubCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AzureAdCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
}

impl AzureAdCredentials {
    pub fn scope(&self) -> &'static str {
        AZURE_AD_SCOPE
    }
}

impl Debug for AzureAdCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureAdCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

/// Set of lower-cased administrator emails.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdminEmails(HashSet<String>);

impl AdminEmails {
    /// Parse a comma-separated list of emails.
    pub fn from_list(list: &str) -> Self {
        Self(
            list.split(',')
                .map(|email| email.trim().to_lowercase())
                .filter(|email| !email.is_empty())
                .collect(),
        )
    }

    /// Case-insensitive membership check.
    pub fn contains(&self, email: &str) -> bool {
        self.0.contains(&email.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Declarative identity-provider configuration.
///
/// Built once at process startup and never mutated afterwards.
#[derive(Clone, Default)]
pub struct ProviderConfig {
    pub github: Option<GitHubCredentials>,
    pub azure_ad: Option<AzureAdCredentials>,

    /// Offer a credentials provider accepting any username, for local development only.
    pub local_dev: bool,

    pub admin_emails: AdminEmails,

    /// Secret used to sign session tokens.
    pub secret: Option<String>,

    pub session_strategy: SessionStrategy,

    /// Providers for which only some of the required variables were present.
    incomplete: Vec<(ProviderKind, Vec<&'static str>)>,
}

impl ProviderConfig {
    /// Resolve the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let mut incomplete = Vec::new();

        let github = match require(&var, &[AUTH_GITHUB_ID, AUTH_GITHUB_SECRET]) {
            Required::All(mut values) => {
                let client_secret = values.remove(1);
                let client_id = values.remove(0);
                Some(GitHubCredentials {
                    client_id,
                    client_secret,
                })
            }
            Required::Partial(missing) => {
                incomplete.push((ProviderKind::GitHub, missing));
                None
            }
            Required::None => None,
        };

        let azure_ad = match require(
            &var,
            &[AZURE_AD_CLIENT_ID, AZURE_AD_CLIENT_SECRET, AZURE_AD_TENANT_ID],
        ) {
            Required::All(mut values) => {
                let tenant_id = values.remove(2);
                let client_secret = values.remove(1);
                let client_id = values.remove(0);
                Some(AzureAdCredentials {
                    client_id,
                    client_secret,
                    tenant_id,
                })
            }
            Required::Partial(missing) => {
                incomplete.push((ProviderKind::AzureAd, missing));
                None
            }
            Required::None => None,
        };

        let config = Self {
            github,
            azure_ad,
            local_dev: var(NODE_ENV).as_deref() == Some("development"),
            admin_emails: var(ADMIN_EMAIL_ADDRESS)
                .map(|list| AdminEmails::from_list(&list))
                .unwrap_or_default(),
            secret: var(NEXTAUTH_SECRET),
            session_strategy: SessionStrategy::Jwt,
            incomplete,
        };

        for (provider, missing) in &config.incomplete {
            warn!(%provider, ?missing, "identity provider disabled, credentials incomplete");
        }

        debug!(
            providers = ?config.providers(),
            admins = config.admin_emails.len(),
            "identity providers configured"
        );

        config
    }

    /// Enabled providers in the order they are presented to users.
    pub fn providers(&self) -> Vec<ProviderKind> {
        let mut providers = Vec::new();
        if self.github.is_some() {
            providers.push(ProviderKind::GitHub);
        }
        if self.azure_ad.is_some() {
            providers.push(ProviderKind::AzureAd);
        }
        if self.local_dev {
            providers.push(ProviderKind::LocalDev);
        }
        providers
    }

    pub fn is_enabled(&self, provider: ProviderKind) -> bool {
        self.providers().contains(&provider)
    }

    /// Strict check for deployments: fails on partially configured providers or when no provider
    /// is available at all.
    pub fn validate(&self) -> Result<(), ProviderConfigError> {
        if let Some((provider, missing)) = self.incomplete.first() {
            return Err(ProviderConfigError::Incomplete {
                provider: *provider,
                missing: missing.clone(),
            });
        }

        if self.providers().is_empty() {
            return Err(ProviderConfigError::NoProviders);
        }

        Ok(())
    }
}

impl Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("github", &self.github)
            .field("azure_ad", &self.azure_ad)
            .field("local_dev", &self.local_dev)
            .field("admin_emails", &self.admin_emails)
            .field("secret", &self.secret.as_ref().map(|_| "[redacted]"))
            .field("session_strategy", &self.session_strategy)
            .finish()
    }
}

enum Required {
    All(Vec<String>),
    Partial(Vec<&'static str>),
    None,
}

fn require<F>(var: &F, keys: &[&'static str]) -> Required
where
    F: Fn(&str) -> Option<String>,
{
    let values: Vec<Option<String>> = keys.iter().map(|key| var(key)).collect();
    let missing: Vec<&'static str> = keys
        .iter()
        .zip(&values)
        .filter(|(_, value)| value.is_none())
        .map(|(key, _)| *key)
        .collect();

    if missing.is_empty() {
        Required::All(values.into_iter().flatten().collect())
    } else if missing.len() == keys.len() {
        Required::None
    } else {
        Required::Partial(missing)
    }
}
