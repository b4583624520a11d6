// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities.
use std::convert::Infallible;

use thiserror::Error;

use crate::traits::GroupDirectory;

pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}

/// Directory returning the same groups for every access token.
#[derive(Clone, Debug, Default)]
pub struct StaticGroupDirectory {
    groups: Vec<String>,
}

impl StaticGroupDirectory {
    pub fn new<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }
}

impl GroupDirectory for StaticGroupDirectory {
    type Error = Infallible;

    async fn member_groups(&self, _access_token: &str) -> Result<Vec<String>, Self::Error> {
        Ok(self.groups.clone())
    }
}

#[derive(Debug, Error)]
#[error("group directory unavailable")]
pub struct DirectoryUnavailable;

/// Directory which fails every lookup.
#[derive(Clone, Debug, Default)]
pub struct FailingGroupDirectory;

impl GroupDirectory for FailingGroupDirectory {
    type Error = DirectoryUnavailable;

    async fn member_groups(&self, _access_token: &str) -> Result<Vec<String>, Self::Error> {
        Err(DirectoryUnavailable)
    }
}
