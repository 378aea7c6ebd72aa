//! Lease repository behaviour on every backend.

use sandpool_types::{Lease, LeaseStatus};

use crate::common::{EPOCH, TestDb, backends, lease_keys, seed_leases};

#[test]
fn put_is_an_upsert_per_account_principal_pair() {
    for TestDb { name, db, .. } in &backends() {
        let lease = Lease::new("111", "222", LeaseStatus::Active).created_at(EPOCH);
        assert_eq!(db.leases().put(&lease).unwrap(), None, "{name}");

        let replacement = Lease::new("111", "222", LeaseStatus::FinanceLock).created_at(EPOCH + 1);
        assert_eq!(db.leases().put(&replacement).unwrap(), Some(lease), "{name}");
        assert_eq!(db.leases().list().unwrap(), vec![replacement], "{name}");
    }
}

#[test]
fn lookups_are_complete_and_ordered() {
    for TestDb { name, db, .. } in &backends() {
        seed_leases(
            db,
            &[
                ("a2", "p1", LeaseStatus::Active),
                ("a1", "p3", LeaseStatus::ResetLock),
                ("a1", "p1", LeaseStatus::Active),
                ("a3", "p1", LeaseStatus::Decommissioned),
                ("a1", "p2", LeaseStatus::Active),
            ],
        );
        let leases = db.leases();
        assert_eq!(
            lease_keys(&leases.find_by_account("a1").unwrap()),
            ["a1/p1", "a1/p2", "a1/p3"],
            "{name}"
        );
        assert_eq!(
            lease_keys(&leases.find_by_principal("p1").unwrap()),
            ["a1/p1", "a2/p1", "a3/p1"],
            "{name}"
        );
        assert_eq!(
            lease_keys(&leases.find_by_status(LeaseStatus::Active).unwrap()),
            ["a1/p1", "a1/p2", "a2/p1"],
            "{name}"
        );
        assert!(leases.find_by_principal("nobody").unwrap().is_empty(), "{name}");
        assert!(leases.find_by_account("nothing").unwrap().is_empty(), "{name}");
        assert_eq!(leases.list().unwrap().len(), 5, "{name}");
    }
}

#[test]
fn transition_refreshes_status_timestamp() {
    for TestDb { name, db, .. } in &backends() {
        seed_leases(db, &[("111", "222", LeaseStatus::Active)]);
        let before = db.leases().get("111", "222").unwrap().unwrap();

        let after = db
            .leases()
            .transition_status("111", "222", LeaseStatus::Active, LeaseStatus::ResetLock)
            .unwrap();
        assert_eq!(after.lease_status, LeaseStatus::ResetLock, "{name}");
        assert!(after.last_modified_on > before.last_modified_on, "{name}");
        assert!(after.lease_status_modified_on > before.lease_status_modified_on, "{name}");
        assert_eq!(after.created_on, before.created_on, "{name}");
        assert_eq!(db.leases().get("111", "222").unwrap(), Some(after), "{name}");

        let again = db
            .leases()
            .transition_status("111", "222", LeaseStatus::Active, LeaseStatus::ResetLock)
            .unwrap_err();
        assert!(again.is_status_transition(), "{name}");
    }
}

#[test]
fn transition_of_missing_lease_names_the_key() {
    insta::allow_duplicates! {
        for TestDb { name, db, .. } in &backends() {
            let err = db
                .leases()
                .transition_status(
                    "not-an-acct-id",
                    "not-a-principal-id",
                    LeaseStatus::Active,
                    LeaseStatus::ResetLock,
                )
                .unwrap_err();
            insta::assert_snapshot!(err, @r#"unable to update lease status from "Active" to "ResetLock" for not-an-acct-id/not-a-principal-id: no lease exists with Status="Active""#);
            assert!(db.leases().list().unwrap().is_empty(), "{name}");
        }
    }
}

#[test]
fn transition_from_wrong_status_leaves_lease_alone() {
    for TestDb { name, db, .. } in &backends() {
        for status in [LeaseStatus::FinanceLock, LeaseStatus::Decommissioned] {
            seed_leases(db, &[("111", "222", status)]);
            let err = db
                .leases()
                .transition_status("111", "222", LeaseStatus::Active, status)
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                format!(
                    r#"unable to update lease status from "Active" to "{status}" for 111/222: no lease exists with Status="Active""#
                ),
                "{name}"
            );
            let stored = db.leases().get("111", "222").unwrap().unwrap();
            assert_eq!(stored.lease_status, status, "{name}");
            assert_eq!(stored.lease_status_modified_on, EPOCH - 100, "{name}");
        }
    }
}

#[test]
fn delete_removes_one_pair() {
    for TestDb { name, db, .. } in &backends() {
        seed_leases(
            db,
            &[
                ("a1", "p1", LeaseStatus::Decommissioned),
                ("a1", "p2", LeaseStatus::Active),
            ],
        );
        let removed = db.leases().delete("a1", "p1").unwrap();
        assert_eq!(removed.map(|l| l.principal_id), Some("p1".to_string()), "{name}");
        assert_eq!(db.leases().delete("a1", "p1").unwrap(), None, "{name}");
        assert_eq!(lease_keys(&db.leases().list().unwrap()), ["a1/p2"], "{name}");
    }
}
