// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::{HashMap, HashSet};

use parley_auth::profile::{AzureAdProfile, LocalCredentials, ProfileMapper};
use parley_auth::provider::{ProviderConfig, ProviderKind};
use parley_auth::session::{SessionUser, TokenClaims};
use parley_auth::test_utils::{StaticGroupDirectory, setup_logging};
use parley_auth::{
    AccessControlEntry, AccessControlInput, AccessDecision, Principal, ResourcePermissions,
    can_edit, can_view, edit_decision, has_access, migrate_access_control_data,
};

fn provider_config() -> ProviderConfig {
    let vars = HashMap::from([
        ("AZURE_AD_CLIENT_ID", "client"),
        ("AZURE_AD_CLIENT_SECRET", "secret"),
        ("AZURE_AD_TENANT_ID", "tenant"),
        ("NODE_ENV", "development"),
        ("ADMIN_EMAIL_ADDRESS", "root@localhost"),
    ]);
    ProviderConfig::from_lookup(|key| vars.get(key).map(|value| value.to_string()))
}

#[tokio::test]
async fn signed_in_group_member_can_view_migrated_resource() {
    setup_logging();

    let config = provider_config();
    assert_eq!(
        config.providers(),
        vec![ProviderKind::AzureAd, ProviderKind::LocalDev]
    );

    let mapper = ProfileMapper::new(&config.admin_emails);
    let directory = StaticGroupDirectory::new(["Research"]);
    let user = mapper
        .azure_ad(
            AzureAdProfile {
                sub: "abc".to_string(),
                name: Some("Bob".to_string()),
                email: Some("bob@example.com".to_string()),
                preferred_username: None,
            },
            "access-token",
            &directory,
            None,
        )
        .await
        .unwrap();

    let claims = TokenClaims::default().apply_user(Some(&user));
    let session = SessionUser::from_claims(&claims);
    let bob = session.principal().unwrap();

    // Permissions persisted by an older version as JSON array and as plain email list.
    let view_entries = migrate_access_control_data(Some(AccessControlInput::Legacy(
        r#"[{ "id": "g1", "value": "research", "type": "GROUP" }]"#.to_string(),
    )));
    let edit_entries = migrate_access_control_data(Some("carol@example.com".into()));

    let resource = ResourcePermissions::private("alice@example.com")
        .with_view_entries(view_entries)
        .with_edit_entries(edit_entries);

    assert!(can_view(Some(&bob), &resource));
    assert!(!can_edit(Some(&bob), &resource));

    // Carol is listed individually for editing but the edit check is group based.
    let carol = Principal::new("carol@example.com");
    assert!(has_access(&resource.edit_entries, &carol.email, &carol.groups));
    assert!(!can_edit(Some(&carol), &resource));
}

#[test]
fn local_admin_can_edit_everything() {
    let config = provider_config();
    let mapper = ProfileMapper::new(&config.admin_emails);

    let user = mapper.local_dev(LocalCredentials {
        username: Some("root".to_string()),
        password: None,
    });
    let claims = TokenClaims::default().apply_user(Some(&user));
    let root = SessionUser::from_claims(&claims).principal().unwrap();

    let resource = ResourcePermissions::private("alice@example.com");
    assert!(can_view(Some(&root), &resource));
    assert_eq!(edit_decision(Some(&root), &resource), AccessDecision::Admin);
}

#[test]
fn has_access_is_true_iff_an_entry_matches() {
    let entries = vec![
        AccessControlEntry::individual("a@x.com").unwrap(),
        AccessControlEntry::individual("b@x.com").unwrap(),
        AccessControlEntry::group("g1").unwrap(),
        AccessControlEntry::group("g2").unwrap(),
    ];

    let emails = ["a@x.com", "b@x.com", "c@x.com", "A@x.com", ""];
    let group_sets: Vec<HashSet<String>> = vec![
        HashSet::new(),
        HashSet::from(["g1".to_string()]),
        HashSet::from(["g3".to_string()]),
        HashSet::from(["g2".to_string(), "g3".to_string()]),
    ];

    for email in emails {
        for groups in &group_sets {
            let expected = entries.iter().any(|entry| {
                (entry.is_individual() && entry.value() == email)
                    || (entry.is_group() && groups.contains(entry.value()))
            });
            assert_eq!(has_access(&entries, email, groups), expected);
            assert!(!has_access(&[], email, groups));
        }
    }
}

#[test]
fn evaluator_is_shareable_across_threads() {
    let resource = ResourcePermissions::private("owner@example.com")
        .with_view_entries(vec![AccessControlEntry::group("team").unwrap()]);
    let member = Principal::new("member@example.com").with_groups(["team"]);

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                assert!(can_view(Some(&member), &resource));
                assert!(!can_edit(Some(&member), &resource));
            });
        }
    });
}
