//! Account repository behaviour on every backend.

use sandpool_db::DbError;
use sandpool_types::{Account, AccountStatus, Metadata};
use serde_json::json;

use crate::common::{EPOCH, TestDb, account_ids, backends, seed_accounts};

fn metadata(value: serde_json::Value) -> Metadata {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

#[test]
fn find_by_status_returns_exactly_matching_accounts() {
    for TestDb { name, db, .. } in &backends() {
        seed_accounts(
            db,
            &[
                ("1", AccountStatus::Ready),
                ("2", AccountStatus::NotReady),
                ("3", AccountStatus::Ready),
                ("4", AccountStatus::Leased),
            ],
        );
        let accounts = db.accounts();
        let ready = accounts.find_by_status(AccountStatus::Ready).unwrap();
        assert_eq!(account_ids(&ready), ["1", "3"], "{name}");
        let leased = accounts.find_by_status(AccountStatus::Leased).unwrap();
        assert_eq!(account_ids(&leased), ["4"], "{name}");
        assert_eq!(
            account_ids(&accounts.list_non_ready().unwrap()),
            ["2", "4"],
            "{name}"
        );
        assert_eq!(accounts.list().unwrap().len(), 4, "{name}");
    }
}

#[test]
fn ready_account_is_leased_by_transition() {
    for TestDb { name, db, .. } in &backends() {
        seed_accounts(db, &[("222", AccountStatus::Ready)]);
        let before = db.accounts().get("222").unwrap().unwrap();

        let updated = db
            .accounts()
            .transition_status("222", AccountStatus::Ready, AccountStatus::Leased)
            .unwrap();
        assert_eq!(updated.account_status, AccountStatus::Leased, "{name}");
        assert!(updated.last_modified_on > before.last_modified_on, "{name}");
        assert_eq!(db.accounts().get("222").unwrap(), Some(updated), "{name}");
        assert_eq!(db.accounts().get_first_ready().unwrap(), None, "{name}");
    }
}

#[test]
fn absent_and_wrong_state_transitions_share_an_error() {
    insta::allow_duplicates! {
        for TestDb { name, db, .. } in &backends() {
            let absent = db
                .accounts()
                .transition_status("not-an-acct-id", AccountStatus::NotReady, AccountStatus::Ready)
                .unwrap_err();
            insta::assert_snapshot!(absent, @r#"unable to update account status from "NotReady" to "Ready" for account not-an-acct-id: no account exists with Status="NotReady""#);
            assert_eq!(db.accounts().get("not-an-acct-id").unwrap(), None, "{name}");

            for status in [AccountStatus::NotReady, AccountStatus::Leased] {
                seed_accounts(db, &[("111", status)]);
                let err = db
                    .accounts()
                    .transition_status("111", AccountStatus::Ready, AccountStatus::NotReady)
                    .unwrap_err();
                assert!(matches!(err, DbError::StatusTransition(_)), "{name}");
                assert_eq!(
                    err.to_string(),
                    r#"unable to update account status from "Ready" to "NotReady" for account 111: no account exists with Status="Ready""#
                );
                assert_eq!(
                    db.accounts().get("111").unwrap().unwrap().account_status,
                    status,
                    "{name}"
                );
            }
        }
    }
}

#[test]
fn put_returns_previous_value_unchanged() {
    for TestDb { name, db, .. } in &backends() {
        let original = Account::new("1", AccountStatus::Ready)
            .with_principal_role_arn("arn:aws:iam::1:role/user")
            .with_last_modified_on(EPOCH)
            .with_metadata(metadata(json!({"hello": "world"})));
        assert_eq!(db.accounts().put(&original).unwrap(), None, "{name}");

        let replacement = Account::new("1", AccountStatus::NotReady);
        let previous = db.accounts().put(&replacement).unwrap();
        assert_eq!(previous, Some(original), "{name}");
        assert_eq!(db.accounts().get("1").unwrap(), Some(replacement), "{name}");
    }
}

#[test]
fn metadata_is_replaced_not_merged() {
    for TestDb { name, db, .. } in &backends() {
        let account = Account::new("1", AccountStatus::Ready)
            .with_last_modified_on(EPOCH - 1)
            .with_metadata(metadata(json!({"old": true, "nested": {"keep": "no"}})));
        db.accounts().put(&account).unwrap();

        let next = metadata(json!({"nested": {"fresh": 2}, "list": ["a", 1]}));
        db.accounts().update_metadata("1", next.clone()).unwrap();

        let stored = db.accounts().get("1").unwrap().unwrap();
        assert_eq!(stored.metadata, next, "{name}");
        assert!(stored.last_modified_on > EPOCH - 1, "{name}");

        let err = db.accounts().update_metadata("missing", next).unwrap_err();
        assert!(err.is_account_not_found(), "{name}");
        assert_eq!(db.accounts().get("missing").unwrap(), None, "{name}");
    }
}

#[test]
fn delete_guards_leased_accounts() {
    insta::allow_duplicates! {
        for TestDb { name, db, .. } in &backends() {
            seed_accounts(
                db,
                &[("leased", AccountStatus::Leased), ("free", AccountStatus::NotReady)],
            );

            let err = db.accounts().delete("leased").unwrap_err();
            let DbError::AccountLeased(leased) = &err else {
                panic!("{name}: expected AccountLeased, got {err}");
            };
            assert_eq!(leased.account.id, "leased", "{name}");
            insta::assert_snapshot!(err, @r#"Unable to delete account "leased": account is leased."#);
            assert!(db.accounts().get("leased").unwrap().is_some(), "{name}");

            let err = db.accounts().delete("ghost").unwrap_err();
            insta::assert_snapshot!(err, @r#"No account found with ID "ghost"."#);
            assert_eq!(db.accounts().get("ghost").unwrap(), None, "{name}");

            let deleted = db.accounts().delete("free").unwrap();
            assert_eq!(deleted.id, "free", "{name}");
            assert_eq!(db.accounts().get("free").unwrap(), None, "{name}");
        }
    }
}

#[test]
fn principal_lookup_and_policy_hash() {
    for TestDb { name, db, .. } in &backends() {
        for (id, arn) in [("1", "arn:a"), ("2", "arn:b"), ("3", "arn:a")] {
            let account = Account::new(id, AccountStatus::Leased).with_principal_role_arn(arn);
            db.accounts().put(&account).unwrap();
        }
        let found = db.accounts().find_by_principal("arn:a").unwrap();
        assert_eq!(account_ids(&found), ["1", "3"], "{name}");

        let hashed = db
            .accounts()
            .update_principal_policy_hash("2", None, "sha-1")
            .unwrap();
        assert_eq!(hashed.principal_policy_hash.as_deref(), Some("sha-1"), "{name}");
        let stale = db
            .accounts()
            .update_principal_policy_hash("2", Some("sha-0"), "sha-2")
            .unwrap_err();
        assert!(stale.is_status_transition(), "{name}");
    }
}
