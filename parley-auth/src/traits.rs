// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error;

/// Interface for looking up the groups a signed-in user transitively belongs to.
///
/// For Azure AD this is backed by the Microsoft Graph `transitiveMemberOf` endpoint, queried with
/// the user's access token.
pub trait GroupDirectory {
    type Error: Error;

    /// Identifiers of all groups the owner of the access token is a member of.
    fn member_groups(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<Vec<String>, Self::Error>>;
}
